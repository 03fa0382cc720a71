//! Campaign analytics: live funnel metrics derived from recipient statuses,
//! rates, campaign ranking, the owner dashboard, and metric snapshots.

pub mod aggregator;
pub mod funnel;

pub use aggregator::{
    ActivityWithCampaign, CampaignMetricsView, DashboardView, ManualSnapshotRequest,
    MetricsAggregator, OverallMetrics, StatusCount,
};
pub use funnel::{funnel_counts, percentage, rank_campaigns, rates, CampaignPerformance};
