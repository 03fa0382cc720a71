//! Background execution of launched campaigns.
//!
//! Email batches walk the campaign's PENDING recipients in insertion order,
//! render and track each message, and dispatch it through the owner's
//! provider chain. Per-recipient failures are recorded and never abort the
//! batch.

use std::sync::Arc;
use std::time::Duration;

use campaign_channels::{ChannelDispatcher, EmailMessage, ProviderChainResolver};
use campaign_core::config::ExecutionConfig;
use campaign_core::types::{ActivityType, Campaign, CampaignType, FunnelCounts, MetricSnapshot};
use campaign_core::{CampaignError, CampaignResult, EngagementEvent};
use campaign_personalization::{inject_tracking, render};
use campaign_reporting::MetricsAggregator;
use campaign_store::{apply_event, ActivityLog, CampaignStore};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipientFailure {
    pub contact_id: Uuid,
    pub email: String,
    pub error: String,
}

/// Outcome of one email batch.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub sent: u64,
    pub failed: u64,
    pub skipped: u64,
    pub skipped_contacts: Vec<Uuid>,
    pub errors: Vec<RecipientFailure>,
    /// Delivered recipients whose SENT status could not be stored, e.g.
    /// because they were detached while the batch was running.
    pub status_errors: Vec<RecipientFailure>,
}

pub struct BatchExecutor {
    store: Arc<dyn CampaignStore>,
    activities: ActivityLog,
    aggregator: MetricsAggregator,
    dispatcher: Arc<ChannelDispatcher>,
    resolver: Arc<ProviderChainResolver>,
    execution: ExecutionConfig,
    default_subject: String,
}

impl BatchExecutor {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        dispatcher: Arc<ChannelDispatcher>,
        resolver: Arc<ProviderChainResolver>,
        execution: ExecutionConfig,
        default_subject: String,
    ) -> Self {
        Self {
            activities: ActivityLog::new(store.clone()),
            aggregator: MetricsAggregator::new(store.clone()),
            store,
            dispatcher,
            resolver,
            execution,
            default_subject,
        }
    }

    pub fn activities(&self) -> &ActivityLog {
        &self.activities
    }

    /// Execute a launched campaign and record the result on its timeline.
    pub async fn run(&self, campaign_id: Uuid) {
        if let Err(e) = self.execute(campaign_id).await {
            self.record_failure(campaign_id, &e.to_string());
        }
    }

    /// Append the activity for a batch that could not complete. The campaign
    /// stays ACTIVE.
    pub fn record_failure(&self, campaign_id: Uuid, reason: &str) {
        metrics::counter!("campaign.batches.failed").increment(1);
        warn!(campaign_id = %campaign_id, reason = %reason, "Campaign execution failed");
        if let Err(e) = self.activities.append(
            campaign_id,
            ActivityType::Sent,
            format!("Campaign execution failed: {reason}"),
            serde_json::json!({ "error": reason }),
        ) {
            warn!(campaign_id = %campaign_id, error = %e, "Failed to record execution failure");
        }
    }

    async fn execute(&self, campaign_id: Uuid) -> CampaignResult<()> {
        let campaign = self
            .store
            .get_campaign(campaign_id)?
            .ok_or_else(|| CampaignError::NotFound(format!("campaign {campaign_id}")))?;

        match campaign.campaign_type {
            CampaignType::Email => {
                self.execute_email_batch(&campaign).await?;
                Ok(())
            }
            CampaignType::SocialMedia => self.execute_social(&campaign).await,
            other => Err(CampaignError::UnsupportedChannel(format!(
                "Campaign type {} is not supported for execution",
                other.display_name()
            ))),
        }
    }

    pub async fn execute_email_batch(&self, campaign: &Campaign) -> CampaignResult<BatchReport> {
        let links = self.store.pending_links(campaign.id)?;
        let chain = self.resolver.resolve(&campaign.owner_id);
        let subject_template = campaign
            .email_subject
            .clone()
            .unwrap_or_else(|| self.default_subject.clone());
        let body_template = campaign.email_content.clone().unwrap_or_default();
        let delay = Duration::from_millis(self.execution.send_delay_ms);

        info!(
            campaign_id = %campaign.id,
            recipients = links.len(),
            "Starting email batch"
        );

        let mut report = BatchReport::default();
        let mut delivered = Vec::new();
        let mut attempted = false;

        for link in &links {
            let contact = self.store.get_contact(link.contact_id)?;
            let Some((contact, email)) = contact
                .and_then(|c| c.email.clone().filter(|e| !e.trim().is_empty()).map(|e| (c, e)))
            else {
                info!(contact_id = %link.contact_id, "Skipping contact without email address");
                report.skipped += 1;
                report.skipped_contacts.push(link.contact_id);
                continue;
            };

            if attempted && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempted = true;

            let body = render(&body_template, &contact);
            let message = EmailMessage {
                to: email.clone(),
                subject: render(&subject_template, &contact),
                html: inject_tracking(
                    &body,
                    campaign.id,
                    contact.id,
                    &self.execution.tracking_base_url,
                ),
                campaign_id: campaign.id,
                contact_id: contact.id,
            };

            let outcome = self.dispatcher.send_email(&message, &chain).await;
            if outcome.ok {
                report.sent += 1;
                delivered.push((contact.id, email));
                continue;
            }

            let error = outcome.error.clone().unwrap_or_else(|| "unknown error".to_string());
            report.failed += 1;
            report.errors.push(RecipientFailure {
                contact_id: contact.id,
                email: email.clone(),
                error: error.clone(),
            });
            self.activities.append(
                campaign.id,
                ActivityType::Failed,
                format!("Failed to send to {email}: {error}"),
                serde_json::json!({
                    "contactId": contact.id,
                    "email": email,
                    "error": error,
                    "provider": outcome.provider_used,
                }),
            )?;
        }

        let now = Utc::now();
        for (contact_id, email) in delivered {
            match apply_event(
                self.store.as_ref(),
                campaign.id,
                contact_id,
                EngagementEvent::SendSucceeded,
                now,
            ) {
                Ok(_) => {}
                Err(e @ (CampaignError::NotFound(_) | CampaignError::InvalidState(_))) => {
                    warn!(
                        campaign_id = %campaign.id,
                        contact_id = %contact_id,
                        error = %e,
                        "Could not mark delivered recipient as sent"
                    );
                    report.status_errors.push(RecipientFailure {
                        contact_id,
                        email,
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let counts = FunnelCounts {
            total_sent: report.sent,
            total_delivered: report.sent,
            ..Default::default()
        };
        self.aggregator
            .record_snapshot(MetricSnapshot::from_counts(campaign.id, &counts, now))?;

        self.activities.append(
            campaign.id,
            ActivityType::Sent,
            format!(
                "Campaign executed successfully. Sent to {} contacts.",
                report.sent
            ),
            serde_json::to_value(&report)?,
        )?;

        metrics::counter!("campaign.emails.sent").increment(report.sent);
        metrics::counter!("campaign.emails.failed").increment(report.failed);
        info!(
            campaign_id = %campaign.id,
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "Email batch completed"
        );
        Ok(report)
    }

    async fn execute_social(&self, campaign: &Campaign) -> CampaignResult<()> {
        let platform = campaign.social_platform.clone().unwrap_or_default();
        let content = campaign.social_content.clone().unwrap_or_default();

        let outcome = self.dispatcher.send_social(&platform, &content).await;
        let description = if outcome.ok {
            format!("Posted to {platform}")
        } else {
            format!(
                "Social media post failed: {}",
                outcome.error.as_deref().unwrap_or("unknown error")
            )
        };

        self.activities.append(
            campaign.id,
            ActivityType::Sent,
            description,
            serde_json::json!({ "platform": platform, "outcome": outcome }),
        )?;
        info!(campaign_id = %campaign.id, platform = %platform, ok = outcome.ok, "Social post completed");
        Ok(())
    }
}
