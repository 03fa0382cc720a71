//! Campaign execution domain types shared by every crate in the workspace.
//!
//! Wire format follows the CRM REST contract: camelCase fields and
//! SCREAMING_SNAKE_CASE enum values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Campaign ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignType {
    Email,
    SocialMedia,
    Sms,
    Event,
}

impl CampaignType {
    pub fn display_name(&self) -> &'static str {
        match self {
            CampaignType::Email => "Email",
            CampaignType::SocialMedia => "Social Media",
            CampaignType::Sms => "SMS",
            CampaignType::Event => "Event",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub owner_id: String,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub email_subject: Option<String>,
    pub email_content: Option<String>,
    pub social_platform: Option<String>,
    pub social_content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── Contact ───────────────────────────────────────────────────────────────

/// Minimal view of a CRM contact, as much as personalization needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

// ─── Recipient Link ────────────────────────────────────────────────────────

/// Engagement status of one contact within one campaign.
///
/// `Pending..=Converted` form the funnel; `Bounced` and `Unsubscribed` sit
/// outside it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipientStatus {
    Pending,
    Sent,
    Delivered,
    Opened,
    Clicked,
    Converted,
    Bounced,
    Unsubscribed,
}

impl RecipientStatus {
    pub const ALL: [RecipientStatus; 8] = [
        RecipientStatus::Pending,
        RecipientStatus::Sent,
        RecipientStatus::Delivered,
        RecipientStatus::Opened,
        RecipientStatus::Clicked,
        RecipientStatus::Converted,
        RecipientStatus::Bounced,
        RecipientStatus::Unsubscribed,
    ];

    /// Position in the funnel, `None` for the side-terminal states.
    pub fn funnel_rank(&self) -> Option<u8> {
        match self {
            RecipientStatus::Pending => Some(0),
            RecipientStatus::Sent => Some(1),
            RecipientStatus::Delivered => Some(2),
            RecipientStatus::Opened => Some(3),
            RecipientStatus::Clicked => Some(4),
            RecipientStatus::Converted => Some(5),
            RecipientStatus::Bounced | RecipientStatus::Unsubscribed => None,
        }
    }

    /// True when a recipient in this status has necessarily passed `stage`.
    pub fn reached(&self, stage: RecipientStatus) -> bool {
        match (self.funnel_rank(), stage.funnel_rank()) {
            (Some(current), Some(target)) => current >= target,
            _ => *self == stage,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientStatus::Pending => "PENDING",
            RecipientStatus::Sent => "SENT",
            RecipientStatus::Delivered => "DELIVERED",
            RecipientStatus::Opened => "OPENED",
            RecipientStatus::Clicked => "CLICKED",
            RecipientStatus::Converted => "CONVERTED",
            RecipientStatus::Bounced => "BOUNCED",
            RecipientStatus::Unsubscribed => "UNSUBSCRIBED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipientLink {
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
    pub status: RecipientStatus,
    /// Insertion order within the campaign; batches walk links by it.
    pub position: u64,
    pub added_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub converted_at: Option<DateTime<Utc>>,
    pub bounced_at: Option<DateTime<Utc>>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

impl RecipientLink {
    pub fn pending(campaign_id: Uuid, contact_id: Uuid, position: u64, now: DateTime<Utc>) -> Self {
        Self {
            campaign_id,
            contact_id,
            status: RecipientStatus::Pending,
            position,
            added_at: now,
            sent_at: None,
            delivered_at: None,
            opened_at: None,
            clicked_at: None,
            converted_at: None,
            bounced_at: None,
            unsubscribed_at: None,
        }
    }

    /// Move to `status`, stamping its timestamp only on first entry.
    pub fn enter(&mut self, status: RecipientStatus, now: DateTime<Utc>) {
        self.status = status;
        let slot = match status {
            RecipientStatus::Pending => return,
            RecipientStatus::Sent => &mut self.sent_at,
            RecipientStatus::Delivered => &mut self.delivered_at,
            RecipientStatus::Opened => &mut self.opened_at,
            RecipientStatus::Clicked => &mut self.clicked_at,
            RecipientStatus::Converted => &mut self.converted_at,
            RecipientStatus::Bounced => &mut self.bounced_at,
            RecipientStatus::Unsubscribed => &mut self.unsubscribed_at,
        };
        if slot.is_none() {
            *slot = Some(now);
        }
    }
}

// ─── Activity ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Launched,
    Sent,
    Failed,
    Delivered,
    Opened,
    Clicked,
    Converted,
    Bounced,
    Unsubscribed,
    Note,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Launched => "LAUNCHED",
            ActivityType::Sent => "SENT",
            ActivityType::Failed => "FAILED",
            ActivityType::Delivered => "DELIVERED",
            ActivityType::Opened => "OPENED",
            ActivityType::Clicked => "CLICKED",
            ActivityType::Converted => "CONVERTED",
            ActivityType::Bounced => "BOUNCED",
            ActivityType::Unsubscribed => "UNSUBSCRIBED",
            ActivityType::Note => "NOTE",
        }
    }
}

/// Append-only audit record shown on the campaign timeline.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub activity_type: ActivityType,
    pub description: String,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ─── Metrics ───────────────────────────────────────────────────────────────

/// Inclusive funnel totals derived from current recipient statuses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelCounts {
    pub total_sent: u64,
    pub total_delivered: u64,
    pub total_opened: u64,
    pub total_clicked: u64,
    pub total_converted: u64,
    pub total_bounced: u64,
    pub total_unsubscribed: u64,
}

/// Funnel rates in percent, two decimal places.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelRates {
    pub open_rate: f64,
    pub click_rate: f64,
    pub conversion_rate: f64,
    pub bounce_rate: f64,
}

/// Immutable point-in-time rollup. Informational history only; the live
/// view is always recomputed from recipient statuses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub total_sent: u64,
    pub total_delivered: u64,
    pub total_opened: u64,
    pub total_clicked: u64,
    pub total_converted: u64,
    pub total_bounced: u64,
    pub total_unsubscribed: u64,
    pub leads_generated: u64,
    pub revenue: Option<f64>,
    pub cost_per_lead: Option<f64>,
    pub roi: Option<f64>,
    pub metric_date: DateTime<Utc>,
}

impl MetricSnapshot {
    pub fn from_counts(campaign_id: Uuid, counts: &FunnelCounts, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            total_sent: counts.total_sent,
            total_delivered: counts.total_delivered,
            total_opened: counts.total_opened,
            total_clicked: counts.total_clicked,
            total_converted: counts.total_converted,
            total_bounced: counts.total_bounced,
            total_unsubscribed: counts.total_unsubscribed,
            leads_generated: 0,
            revenue: None,
            cost_per_lead: None,
            roi: None,
            metric_date: at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reached_is_inclusive_along_the_funnel() {
        assert!(RecipientStatus::Clicked.reached(RecipientStatus::Opened));
        assert!(RecipientStatus::Clicked.reached(RecipientStatus::Sent));
        assert!(!RecipientStatus::Opened.reached(RecipientStatus::Clicked));
        assert!(!RecipientStatus::Bounced.reached(RecipientStatus::Sent));
        assert!(RecipientStatus::Bounced.reached(RecipientStatus::Bounced));
    }

    #[test]
    fn test_enter_stamps_first_entry_only() {
        let now = Utc::now();
        let mut link = RecipientLink::pending(Uuid::new_v4(), Uuid::new_v4(), 0, now);
        link.enter(RecipientStatus::Opened, now);
        let first = link.opened_at;
        link.enter(RecipientStatus::Opened, now + chrono::Duration::seconds(5));
        assert_eq!(link.opened_at, first);
        assert_eq!(link.status, RecipientStatus::Opened);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&RecipientStatus::Unsubscribed).unwrap();
        assert_eq!(json, "\"UNSUBSCRIBED\"");
        let parsed: CampaignType = serde_json::from_str("\"SOCIAL_MEDIA\"").unwrap();
        assert_eq!(parsed, CampaignType::SocialMedia);
    }
}
