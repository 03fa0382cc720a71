//! Live and historical campaign metrics read from the campaign store.

use std::collections::BTreeMap;
use std::sync::Arc;

use campaign_core::types::{
    Activity, Campaign, CampaignStatus, FunnelCounts, FunnelRates, MetricSnapshot,
};
use campaign_core::CampaignResult;
use campaign_store::CampaignStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::funnel::{funnel_counts, rank_campaigns, rates, CampaignPerformance};

const TOP_CAMPAIGNS: usize = 5;
const DASHBOARD_ACTIVITIES: usize = 20;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetricsView {
    pub campaign: Campaign,
    pub latest_snapshot: Option<MetricSnapshot>,
    pub all_snapshots: Vec<MetricSnapshot>,
    pub realtime_metrics: FunnelCounts,
    pub calculated_rates: FunnelRates,
}

/// Body of a manual snapshot; omitted totals default to 0.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualSnapshotRequest {
    pub total_sent: Option<u64>,
    pub total_delivered: Option<u64>,
    pub total_opened: Option<u64>,
    pub total_clicked: Option<u64>,
    pub total_converted: Option<u64>,
    pub total_bounced: Option<u64>,
    pub total_unsubscribed: Option<u64>,
    pub leads_generated: Option<u64>,
    pub revenue: Option<f64>,
    pub cost_per_lead: Option<f64>,
    pub roi: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverallMetrics {
    pub total_campaigns: u64,
    pub active_campaigns: u64,
    pub total_contacts: u64,
    pub total_sent: u64,
    pub total_opened: u64,
    pub total_clicked: u64,
    pub total_converted: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: CampaignStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWithCampaign {
    #[serde(flatten)]
    pub activity: Activity,
    pub campaign_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub overall_metrics: OverallMetrics,
    pub status_counts: Vec<StatusCount>,
    pub top_campaigns: Vec<CampaignPerformance>,
    pub recent_activities: Vec<ActivityWithCampaign>,
    pub campaigns: Vec<CampaignPerformance>,
}

/// Derives metrics at query time from recipient statuses. Snapshots are
/// history only and never feed back into live numbers.
#[derive(Clone)]
pub struct MetricsAggregator {
    store: Arc<dyn CampaignStore>,
}

impl MetricsAggregator {
    pub fn new(store: Arc<dyn CampaignStore>) -> Self {
        Self { store }
    }

    pub fn live_metrics(&self, campaign_id: Uuid) -> CampaignResult<FunnelCounts> {
        Ok(funnel_counts(&self.store.status_counts(campaign_id)?))
    }

    pub fn campaign_metrics(&self, campaign: Campaign) -> CampaignResult<CampaignMetricsView> {
        let realtime_metrics = self.live_metrics(campaign.id)?;
        let all_snapshots = self.store.list_snapshots(campaign.id)?;
        Ok(CampaignMetricsView {
            latest_snapshot: all_snapshots.last().cloned(),
            all_snapshots,
            calculated_rates: rates(&realtime_metrics),
            realtime_metrics,
            campaign,
        })
    }

    /// Append a snapshot of the current live metrics.
    pub fn snapshot_live(&self, campaign_id: Uuid) -> CampaignResult<MetricSnapshot> {
        let counts = self.live_metrics(campaign_id)?;
        self.record_snapshot(MetricSnapshot::from_counts(campaign_id, &counts, Utc::now()))
    }

    pub fn record_snapshot(&self, snapshot: MetricSnapshot) -> CampaignResult<MetricSnapshot> {
        self.store.append_snapshot(snapshot.clone())?;
        debug!(
            campaign_id = %snapshot.campaign_id,
            total_sent = snapshot.total_sent,
            "Metric snapshot recorded"
        );
        Ok(snapshot)
    }

    pub fn record_manual_snapshot(
        &self,
        campaign_id: Uuid,
        req: ManualSnapshotRequest,
    ) -> CampaignResult<MetricSnapshot> {
        let snapshot = MetricSnapshot {
            id: Uuid::new_v4(),
            campaign_id,
            total_sent: req.total_sent.unwrap_or(0),
            total_delivered: req.total_delivered.unwrap_or(0),
            total_opened: req.total_opened.unwrap_or(0),
            total_clicked: req.total_clicked.unwrap_or(0),
            total_converted: req.total_converted.unwrap_or(0),
            total_bounced: req.total_bounced.unwrap_or(0),
            total_unsubscribed: req.total_unsubscribed.unwrap_or(0),
            leads_generated: req.leads_generated.unwrap_or(0),
            revenue: Some(req.revenue.unwrap_or(0.0)),
            cost_per_lead: req.cost_per_lead,
            roi: req.roi,
            metric_date: Utc::now(),
        };
        self.record_snapshot(snapshot)
    }

    pub fn dashboard(&self, owner_id: &str) -> CampaignResult<DashboardView> {
        let campaigns = self.store.list_campaigns_for_owner(owner_id)?;

        let mut overall = OverallMetrics {
            total_campaigns: campaigns.len() as u64,
            ..Default::default()
        };
        let mut by_campaign_status: BTreeMap<CampaignStatus, u64> = BTreeMap::new();
        let mut names = BTreeMap::new();
        let mut performance = Vec::with_capacity(campaigns.len());

        for campaign in campaigns {
            if campaign.status == CampaignStatus::Active {
                overall.active_campaigns += 1;
            }
            *by_campaign_status.entry(campaign.status).or_insert(0) += 1;

            let by_status = self.store.status_counts(campaign.id)?;
            let counts = funnel_counts(&by_status);
            overall.total_contacts += by_status.values().sum::<u64>();
            overall.total_sent += counts.total_sent;
            overall.total_opened += counts.total_opened;
            overall.total_clicked += counts.total_clicked;
            overall.total_converted += counts.total_converted;

            names.insert(campaign.id, campaign.name.clone());
            performance.push(CampaignPerformance::new(campaign, &by_status));
        }

        let recent_activities = self
            .store
            .list_activities_for_owner(owner_id, DASHBOARD_ACTIVITIES)?
            .into_iter()
            .map(|activity| ActivityWithCampaign {
                campaign_name: names.get(&activity.campaign_id).cloned().unwrap_or_default(),
                activity,
            })
            .collect();

        Ok(DashboardView {
            overall_metrics: overall,
            status_counts: by_campaign_status
                .into_iter()
                .map(|(status, count)| StatusCount { status, count })
                .collect(),
            top_campaigns: rank_campaigns(performance.clone(), TOP_CAMPAIGNS),
            recent_activities,
            campaigns: performance,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campaign_core::types::{ActivityType, CampaignType, Contact, RecipientStatus};
    use campaign_store::{ActivityLog, InMemoryStore};

    fn seed(store: &InMemoryStore, owner: &str, statuses: &[RecipientStatus]) -> Campaign {
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: format!("campaign-{}", statuses.len()),
            owner_id: owner.into(),
            campaign_type: CampaignType::Email,
            status: CampaignStatus::Draft,
            start_date: None,
            end_date: None,
            budget: None,
            email_subject: None,
            email_content: None,
            social_platform: None,
            social_content: None,
            created_at: now,
            updated_at: now,
        };
        store.insert_campaign(campaign.clone()).unwrap();
        for status in statuses {
            let contact = store
                .upsert_contact(Contact {
                    id: Uuid::new_v4(),
                    ..Default::default()
                })
                .unwrap();
            store.attach_contacts(campaign.id, &[contact.id], now).unwrap();
            if *status != RecipientStatus::Pending {
                store
                    .compare_and_set_status(campaign.id, contact.id, RecipientStatus::Pending, *status, now)
                    .unwrap();
            }
        }
        campaign
    }

    #[test]
    fn test_campaign_metrics_view() {
        let store = Arc::new(InMemoryStore::new());
        let campaign = seed(
            &store,
            "u1",
            &[RecipientStatus::Sent, RecipientStatus::Opened, RecipientStatus::Clicked],
        );
        let aggregator = MetricsAggregator::new(store.clone());
        aggregator.snapshot_live(campaign.id).unwrap();

        let view = aggregator.campaign_metrics(campaign).unwrap();
        assert_eq!(view.realtime_metrics.total_sent, 3);
        assert_eq!(view.realtime_metrics.total_opened, 2);
        assert_eq!(view.calculated_rates.click_rate, 50.0);
        assert_eq!(view.all_snapshots.len(), 1);
        assert_eq!(view.latest_snapshot.unwrap().total_sent, 3);
    }

    #[test]
    fn test_manual_snapshot_defaults() {
        let store = Arc::new(InMemoryStore::new());
        let aggregator = MetricsAggregator::new(store);
        let snapshot = aggregator
            .record_manual_snapshot(
                Uuid::new_v4(),
                ManualSnapshotRequest {
                    leads_generated: Some(12),
                    roi: Some(1.5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(snapshot.total_sent, 0);
        assert_eq!(snapshot.leads_generated, 12);
        assert_eq!(snapshot.revenue, Some(0.0));
        assert_eq!(snapshot.cost_per_lead, None);
    }

    #[test]
    fn test_dashboard_scoped_to_owner() {
        let store = Arc::new(InMemoryStore::new());
        let best = seed(&store, "u1", &[RecipientStatus::Converted, RecipientStatus::Sent]);
        seed(&store, "u1", &[RecipientStatus::Pending]);
        seed(&store, "u2", &[RecipientStatus::Converted]);
        ActivityLog::new(store.clone())
            .append(best.id, ActivityType::Note, "kickoff", serde_json::json!({}))
            .unwrap();

        let dashboard = MetricsAggregator::new(store).dashboard("u1").unwrap();
        assert_eq!(dashboard.overall_metrics.total_campaigns, 2);
        assert_eq!(dashboard.overall_metrics.total_contacts, 3);
        assert_eq!(dashboard.overall_metrics.total_sent, 2);
        assert_eq!(dashboard.overall_metrics.total_converted, 1);
        assert_eq!(dashboard.top_campaigns[0].campaign.id, best.id);
        assert_eq!(dashboard.top_campaigns[0].conversion_rate, 50.0);
        assert_eq!(dashboard.recent_activities.len(), 1);
        assert_eq!(dashboard.recent_activities[0].campaign_name, best.name);
        assert_eq!(dashboard.status_counts.len(), 1);
        assert_eq!(dashboard.status_counts[0].count, 2);
    }
}
