//! Persistence seam for campaigns, recipients, activities and snapshots.

use std::collections::BTreeMap;

use campaign_core::types::{
    Activity, Campaign, CampaignStatus, Contact, MetricSnapshot, RecipientLink, RecipientStatus,
};
use campaign_core::CampaignResult;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Storage operations the orchestrator, tracking gateway and aggregator
/// rely on. Implementations must make `activate_campaign` and
/// `compare_and_set_status` atomic with respect to concurrent callers.
pub trait CampaignStore: Send + Sync {
    // ─── Campaigns ─────────────────────────────────────────────────────────

    fn insert_campaign(&self, campaign: Campaign) -> CampaignResult<()>;

    fn get_campaign(&self, id: Uuid) -> CampaignResult<Option<Campaign>>;

    /// Campaigns owned by `owner_id`, newest first.
    fn list_campaigns_for_owner(&self, owner_id: &str) -> CampaignResult<Vec<Campaign>>;

    /// Flip the campaign to `ACTIVE` with `start_date = now` unless it is
    /// already active. Returns `false` when another caller got there first.
    fn activate_campaign(&self, id: Uuid, now: DateTime<Utc>) -> CampaignResult<bool>;

    /// Replace a stored campaign only while its status still equals
    /// `expected_status`. Returns `false` when the status moved underneath,
    /// e.g. a launch activated it.
    fn update_campaign(
        &self,
        campaign: Campaign,
        expected_status: CampaignStatus,
    ) -> CampaignResult<bool>;

    // ─── Contacts ──────────────────────────────────────────────────────────

    fn upsert_contact(&self, contact: Contact) -> CampaignResult<Contact>;

    fn get_contact(&self, id: Uuid) -> CampaignResult<Option<Contact>>;

    // ─── Recipient links ───────────────────────────────────────────────────

    /// Link contacts to a campaign as `PENDING`. Contacts already linked are
    /// skipped; returns the number of new links.
    fn attach_contacts(
        &self,
        campaign_id: Uuid,
        contact_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> CampaignResult<usize>;

    fn detach_contact(&self, campaign_id: Uuid, contact_id: Uuid) -> CampaignResult<bool>;

    /// All links of a campaign in insertion order.
    fn list_links(&self, campaign_id: Uuid) -> CampaignResult<Vec<RecipientLink>>;

    fn get_link(&self, campaign_id: Uuid, contact_id: Uuid)
        -> CampaignResult<Option<RecipientLink>>;

    /// Set the link status to `next` only if it still equals `expected`.
    /// The timestamp for `next` is stamped on first entry only.
    fn compare_and_set_status(
        &self,
        campaign_id: Uuid,
        contact_id: Uuid,
        expected: RecipientStatus,
        next: RecipientStatus,
        now: DateTime<Utc>,
    ) -> CampaignResult<bool>;

    // ─── Activities ────────────────────────────────────────────────────────

    fn append_activity(&self, activity: Activity) -> CampaignResult<()>;

    /// Most recent activities of one campaign, newest first.
    fn list_activities(&self, campaign_id: Uuid, limit: usize) -> CampaignResult<Vec<Activity>>;

    // ─── Snapshots ─────────────────────────────────────────────────────────

    fn append_snapshot(&self, snapshot: MetricSnapshot) -> CampaignResult<()>;

    /// Snapshots of one campaign, oldest first.
    fn list_snapshots(&self, campaign_id: Uuid) -> CampaignResult<Vec<MetricSnapshot>>;

    // ─── Provided ──────────────────────────────────────────────────────────

    fn pending_links(&self, campaign_id: Uuid) -> CampaignResult<Vec<RecipientLink>> {
        Ok(self
            .list_links(campaign_id)?
            .into_iter()
            .filter(|l| l.status == RecipientStatus::Pending)
            .collect())
    }

    /// Number of links per current status. Statuses with no links are absent.
    fn status_counts(&self, campaign_id: Uuid) -> CampaignResult<BTreeMap<RecipientStatus, u64>> {
        let mut counts = BTreeMap::new();
        for link in self.list_links(campaign_id)? {
            *counts.entry(link.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn latest_snapshot(&self, campaign_id: Uuid) -> CampaignResult<Option<MetricSnapshot>> {
        Ok(self.list_snapshots(campaign_id)?.pop())
    }

    /// Most recent activities across every campaign of `owner_id`.
    fn list_activities_for_owner(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> CampaignResult<Vec<Activity>> {
        let mut all = Vec::new();
        for campaign in self.list_campaigns_for_owner(owner_id)? {
            all.extend(self.list_activities(campaign.id, limit)?);
        }
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        Ok(all)
    }
}
