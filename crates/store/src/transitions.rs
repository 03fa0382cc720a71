//! Applies engagement events to stored recipient links.

use campaign_core::types::RecipientStatus;
use campaign_core::{transition, CampaignError, CampaignResult, EngagementEvent};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::store::CampaignStore;

/// Conditional writes lost to a concurrent writer are retried from a fresh
/// read this many times.
const MAX_CAS_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedTransition {
    pub previous: RecipientStatus,
    pub current: RecipientStatus,
    pub changed: bool,
}

/// Resolve `event` against the link's current status and persist the result
/// with a compare-and-set. A disallowed event leaves the link untouched and
/// reports `changed = false`.
pub fn apply_event(
    store: &dyn CampaignStore,
    campaign_id: Uuid,
    contact_id: Uuid,
    event: EngagementEvent,
    now: DateTime<Utc>,
) -> CampaignResult<AppliedTransition> {
    for _ in 0..MAX_CAS_ATTEMPTS {
        let link = store.get_link(campaign_id, contact_id)?.ok_or_else(|| {
            CampaignError::NotFound(format!("recipient {contact_id} in campaign {campaign_id}"))
        })?;

        let Some(next) = transition(link.status, event) else {
            debug!(
                campaign_id = %campaign_id,
                contact_id = %contact_id,
                status = link.status.as_str(),
                event = ?event,
                "Engagement event is a no-op"
            );
            return Ok(AppliedTransition {
                previous: link.status,
                current: link.status,
                changed: false,
            });
        };

        if store.compare_and_set_status(campaign_id, contact_id, link.status, next, now)? {
            return Ok(AppliedTransition {
                previous: link.status,
                current: next,
                changed: true,
            });
        }
    }

    Err(CampaignError::InvalidState(format!(
        "recipient {contact_id} status kept changing under {event:?}"
    )))
}
