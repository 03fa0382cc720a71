//! Campaign launch and the background worker pool.
//!
//! `launch` validates and activates a campaign synchronously, then hands the
//! batch to a fixed pool of workers through an unbounded in-process queue.
//! Jobs are not durable; a restart drops whatever is still queued.

use std::sync::Arc;

use campaign_channels::ChannelDispatcher;
use campaign_core::types::{ActivityType, CampaignStatus};
use campaign_core::{CampaignError, CampaignResult};
use campaign_reporting::MetricsAggregator;
use campaign_store::{ActivityLog, CampaignStore};
use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::executor::BatchExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchJob {
    pub campaign_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchAccepted {
    pub recipient_count: usize,
}

pub struct CampaignOrchestrator {
    store: Arc<dyn CampaignStore>,
    activities: ActivityLog,
    aggregator: MetricsAggregator,
    queue: mpsc::UnboundedSender<BatchJob>,
}

impl CampaignOrchestrator {
    /// Spawn `worker_count` workers and return the orchestrator feeding them.
    /// Must be called from within a tokio runtime.
    pub fn start(
        store: Arc<dyn CampaignStore>,
        executor: Arc<BatchExecutor>,
        worker_count: usize,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));

        let workers = worker_count.max(1);
        for worker_id in 0..workers {
            tokio::spawn(worker_loop(worker_id, rx.clone(), executor.clone()));
        }
        info!(workers, "Campaign worker pool started");

        Self {
            activities: ActivityLog::new(store.clone()),
            aggregator: MetricsAggregator::new(store.clone()),
            store,
            queue: tx,
        }
    }

    /// Validate, activate and enqueue a campaign. Returns as soon as the job
    /// is queued; sending happens on the worker pool.
    pub fn launch(&self, campaign_id: Uuid, requesting_user: &str) -> CampaignResult<LaunchAccepted> {
        let campaign = self
            .store
            .get_campaign(campaign_id)?
            .filter(|c| c.owner_id == requesting_user)
            .ok_or_else(|| CampaignError::NotFound("Campaign not found".into()))?;

        if campaign.status == CampaignStatus::Active {
            return Err(CampaignError::InvalidState("Campaign is already active".into()));
        }

        let recipient_count = self.store.pending_links(campaign_id)?.len();
        if recipient_count == 0 {
            return Err(CampaignError::NoRecipients(
                "No contacts assigned to this campaign".into(),
            ));
        }

        if !ChannelDispatcher::supports(campaign.campaign_type) {
            return Err(CampaignError::UnsupportedChannel(format!(
                "Campaign type {} is not supported for execution",
                campaign.campaign_type.display_name()
            )));
        }

        if !self.store.activate_campaign(campaign_id, Utc::now())? {
            return Err(CampaignError::InvalidState("Campaign is already active".into()));
        }

        self.aggregator.snapshot_live(campaign_id)?;
        self.activities.append(
            campaign_id,
            ActivityType::Launched,
            format!(
                "Campaign launched: {} to {} contacts",
                campaign.campaign_type.display_name(),
                recipient_count
            ),
            serde_json::json!({
                "campaignType": campaign.campaign_type,
                "recipientCount": recipient_count,
                "launchedBy": requesting_user,
            }),
        )?;

        self.queue
            .send(BatchJob { campaign_id })
            .map_err(|_| CampaignError::Internal(anyhow::anyhow!("campaign worker pool is closed")))?;

        metrics::counter!("campaign.launches", "type" => campaign.campaign_type.display_name())
            .increment(1);
        info!(
            campaign_id = %campaign_id,
            owner_id = %requesting_user,
            recipients = recipient_count,
            "Campaign launched"
        );
        Ok(LaunchAccepted { recipient_count })
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<BatchJob>>>,
    executor: Arc<BatchExecutor>,
) {
    loop {
        let job = queue.lock().await.recv().await;
        let Some(job) = job else {
            info!(worker_id, "Campaign queue closed, worker exiting");
            break;
        };

        info!(worker_id, campaign_id = %job.campaign_id, "Picked up campaign batch");
        let task_executor = executor.clone();
        let handle = tokio::spawn(async move { task_executor.run(job.campaign_id).await });

        if let Err(join_err) = handle.await {
            error!(
                worker_id,
                campaign_id = %job.campaign_id,
                error = %join_err,
                "Campaign batch task aborted"
            );
            executor.record_failure(job.campaign_id, &join_err.to_string());
        }
    }
    warn!(worker_id, "Campaign worker stopped");
}
