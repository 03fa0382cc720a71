//! Engagement tracking: opens, clicks, conversions, unsubscribes and
//! provider webhook events.
//!
//! Every entry point swallows its own failures. Recipients must always get a
//! pixel, a redirect or a confirmation page, so problems are logged and
//! reported back as a boolean at most.

use std::sync::Arc;

use campaign_core::types::{Activity, ActivityType, RecipientStatus};
use campaign_core::{CampaignError, CampaignResult, EngagementEvent};
use campaign_store::{apply_event, ActivityLog, AppliedTransition, CampaignStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const STATS_ACTIVITY_LIMIT: usize = 50;

/// Event kinds reported by email providers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProviderEventKind {
    Delivered,
    Bounce,
    Unsubscribe,
    Open,
    Click,
}

impl ProviderEventKind {
    fn engagement_event(self) -> EngagementEvent {
        match self {
            ProviderEventKind::Delivered => EngagementEvent::DeliveryReport,
            ProviderEventKind::Bounce => EngagementEvent::BounceReport,
            ProviderEventKind::Unsubscribe => EngagementEvent::UnsubscribeRequest,
            ProviderEventKind::Open => EngagementEvent::OpenHit,
            ProviderEventKind::Click => EngagementEvent::ClickHit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderEvent {
    pub event: ProviderEventKind,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipientStatusCount {
    pub status: RecipientStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStats {
    pub stats: Vec<RecipientStatusCount>,
    pub recent_activities: Vec<Activity>,
}

#[derive(Clone)]
pub struct TrackingGateway {
    store: Arc<dyn CampaignStore>,
    activities: ActivityLog,
}

impl TrackingGateway {
    pub fn new(store: Arc<dyn CampaignStore>) -> Self {
        Self {
            activities: ActivityLog::new(store.clone()),
            store,
        }
    }

    /// Record an open beacon hit. Returns whether the hit was recorded.
    pub fn record_open(&self, campaign_id: Uuid, contact_id: Uuid, user_agent: Option<&str>) -> bool {
        metrics::counter!("tracking.opens").increment(1);
        let result = self.track(
            campaign_id,
            contact_id,
            EngagementEvent::OpenHit,
            "Email opened".to_string(),
            serde_json::json!({
                "contactId": contact_id,
                "userAgent": user_agent,
            }),
        );
        self.settle("open", campaign_id, contact_id, result)
    }

    /// Record a tracked link click. The caller redirects to `url` regardless
    /// of the outcome.
    pub fn record_click(
        &self,
        campaign_id: Uuid,
        contact_id: Uuid,
        url: &str,
        user_agent: Option<&str>,
        referrer: Option<&str>,
    ) -> bool {
        metrics::counter!("tracking.clicks").increment(1);
        let result = self.track(
            campaign_id,
            contact_id,
            EngagementEvent::ClickHit,
            format!("Link clicked: {url}"),
            serde_json::json!({
                "contactId": contact_id,
                "url": url,
                "userAgent": user_agent,
                "referrer": referrer,
            }),
        );
        self.settle("click", campaign_id, contact_id, result)
    }

    pub fn record_conversion(
        &self,
        campaign_id: Uuid,
        contact_id: Uuid,
        value: Option<f64>,
        notes: Option<String>,
    ) -> bool {
        metrics::counter!("tracking.conversions").increment(1);
        let description = notes
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Contact converted".to_string());
        let result = self.track(
            campaign_id,
            contact_id,
            EngagementEvent::Convert,
            description,
            serde_json::json!({
                "contactId": contact_id,
                "value": value.unwrap_or(0.0),
                "notes": notes,
            }),
        );
        self.settle("conversion", campaign_id, contact_id, result)
    }

    /// Unsubscribe a recipient from a campaign. Only a real status change is
    /// written to the activity log.
    pub fn record_unsubscribe(&self, campaign_id: Uuid, contact_id: Uuid) -> bool {
        metrics::counter!("tracking.unsubscribes").increment(1);
        let result = self.apply_quietly(campaign_id, contact_id, EngagementEvent::UnsubscribeRequest);
        self.settle("unsubscribe", campaign_id, contact_id, result)
    }

    /// Apply a batch of provider webhook events. Returns how many referenced
    /// a known recipient and were applied.
    pub fn apply_provider_events(&self, events: &[ProviderEvent]) -> usize {
        let mut accepted = 0;
        for e in events {
            let result = self.apply_quietly(e.campaign_id, e.contact_id, e.event.engagement_event());
            if self.settle("provider_event", e.campaign_id, e.contact_id, result) {
                accepted += 1;
            }
        }
        metrics::counter!("tracking.provider_events").increment(accepted as u64);
        info!(received = events.len(), accepted, "Provider events applied");
        accepted
    }

    /// Recipient status counts plus the most recent activities.
    pub fn stats(&self, campaign_id: Uuid) -> CampaignResult<TrackingStats> {
        let stats = self
            .store
            .status_counts(campaign_id)?
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(status, count)| RecipientStatusCount { status, count })
            .collect();
        Ok(TrackingStats {
            stats,
            recent_activities: self.activities.recent(campaign_id, STATS_ACTIVITY_LIMIT)?,
        })
    }

    /// Apply `event` and append its activity whether or not the status moved.
    fn track(
        &self,
        campaign_id: Uuid,
        contact_id: Uuid,
        event: EngagementEvent,
        description: String,
        mut metadata: serde_json::Value,
    ) -> CampaignResult<AppliedTransition> {
        let applied = apply_event(self.store.as_ref(), campaign_id, contact_id, event, Utc::now())?;
        metadata["stateChanged"] = serde_json::Value::Bool(applied.changed);
        self.activities
            .append(campaign_id, event.activity_type(), description, metadata)?;
        Ok(applied)
    }

    fn apply_quietly(
        &self,
        campaign_id: Uuid,
        contact_id: Uuid,
        event: EngagementEvent,
    ) -> CampaignResult<AppliedTransition> {
        let applied = apply_event(self.store.as_ref(), campaign_id, contact_id, event, Utc::now())?;
        if applied.changed {
            let activity_type = event.activity_type();
            self.activities.append(
                campaign_id,
                activity_type,
                format!("Recipient {}", activity_type.as_str().to_lowercase()),
                serde_json::json!({
                    "contactId": contact_id,
                    "previousStatus": applied.previous,
                }),
            )?;
        }
        Ok(applied)
    }

    fn settle(
        &self,
        kind: &'static str,
        campaign_id: Uuid,
        contact_id: Uuid,
        result: CampaignResult<AppliedTransition>,
    ) -> bool {
        match result {
            Ok(applied) => {
                debug!(
                    kind,
                    campaign_id = %campaign_id,
                    contact_id = %contact_id,
                    status = applied.current.as_str(),
                    changed = applied.changed,
                    "Tracking event recorded"
                );
                true
            }
            Err(CampaignError::NotFound(_)) => {
                warn!(kind, campaign_id = %campaign_id, contact_id = %contact_id, "Tracking hit for unknown recipient");
                false
            }
            Err(e) => {
                metrics::counter!("tracking.errors", "kind" => kind).increment(1);
                warn!(kind, campaign_id = %campaign_id, contact_id = %contact_id, error = %e, "Tracking failed");
                false
            }
        }
    }
}
