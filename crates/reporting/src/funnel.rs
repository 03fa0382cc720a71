//! Funnel arithmetic over current recipient statuses.
//!
//! A recipient's status is the furthest stage it reached, so totals are
//! inclusive: a CLICKED recipient also counts as opened, delivered and sent.

use std::collections::BTreeMap;

use campaign_core::types::{Campaign, FunnelCounts, FunnelRates, RecipientStatus};
use serde::Serialize;
use utoipa::ToSchema;

pub fn funnel_counts(by_status: &BTreeMap<RecipientStatus, u64>) -> FunnelCounts {
    let reached = |stage: RecipientStatus| -> u64 {
        by_status
            .iter()
            .filter(|(status, _)| status.reached(stage))
            .map(|(_, count)| *count)
            .sum()
    };

    FunnelCounts {
        total_sent: reached(RecipientStatus::Sent),
        total_delivered: reached(RecipientStatus::Delivered),
        total_opened: reached(RecipientStatus::Opened),
        total_clicked: reached(RecipientStatus::Clicked),
        total_converted: reached(RecipientStatus::Converted),
        total_bounced: reached(RecipientStatus::Bounced),
        total_unsubscribed: reached(RecipientStatus::Unsubscribed),
    }
}

/// `numerator / denominator` as a percentage with two decimals; 0 when the
/// denominator is 0.
pub fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (numerator as f64 / denominator as f64 * 10_000.0).round() / 100.0
}

pub fn rates(counts: &FunnelCounts) -> FunnelRates {
    FunnelRates {
        open_rate: percentage(counts.total_opened, counts.total_delivered),
        click_rate: percentage(counts.total_clicked, counts.total_opened),
        conversion_rate: percentage(counts.total_converted, counts.total_sent),
        bounce_rate: percentage(counts.total_bounced, counts.total_sent),
    }
}

/// A campaign with its conversion performance over all linked contacts.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPerformance {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub total_contacts: u64,
    pub total_converted: u64,
    pub conversion_rate: f64,
}

impl CampaignPerformance {
    pub fn new(campaign: Campaign, by_status: &BTreeMap<RecipientStatus, u64>) -> Self {
        let total_contacts = by_status.values().sum();
        let total_converted = by_status
            .get(&RecipientStatus::Converted)
            .copied()
            .unwrap_or(0);
        Self {
            campaign,
            total_contacts,
            total_converted,
            conversion_rate: percentage(total_converted, total_contacts),
        }
    }
}

/// Sort by conversion rate, highest first, and keep the top `n`. Ties keep
/// their input order.
pub fn rank_campaigns(mut campaigns: Vec<CampaignPerformance>, n: usize) -> Vec<CampaignPerformance> {
    campaigns.sort_by(|a, b| b.conversion_rate.total_cmp(&a.conversion_rate));
    campaigns.truncate(n);
    campaigns
}
