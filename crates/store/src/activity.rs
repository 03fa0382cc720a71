//! Append-only campaign activity log.

use std::sync::Arc;

use campaign_core::types::{Activity, ActivityType};
use campaign_core::CampaignResult;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::store::CampaignStore;

/// Writes and reads the activity timeline through the shared store.
#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<dyn CampaignStore>,
}

impl ActivityLog {
    pub fn new(store: Arc<dyn CampaignStore>) -> Self {
        Self { store }
    }

    pub fn append(
        &self,
        campaign_id: Uuid,
        activity_type: ActivityType,
        description: impl Into<String>,
        metadata: serde_json::Value,
    ) -> CampaignResult<Activity> {
        let activity = Activity {
            id: Uuid::new_v4(),
            campaign_id,
            activity_type,
            description: description.into(),
            metadata,
            created_at: Utc::now(),
        };
        self.store.append_activity(activity.clone())?;

        metrics::counter!("activity.appended", "type" => activity_type.as_str()).increment(1);
        debug!(
            campaign_id = %campaign_id,
            activity_type = activity_type.as_str(),
            "Activity appended"
        );
        Ok(activity)
    }

    pub fn recent(&self, campaign_id: Uuid, limit: usize) -> CampaignResult<Vec<Activity>> {
        self.store.list_activities(campaign_id, limit)
    }

    pub fn recent_for_owner(&self, owner_id: &str, limit: usize) -> CampaignResult<Vec<Activity>> {
        self.store.list_activities_for_owner(owner_id, limit)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::InMemoryStore;

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let log = ActivityLog::new(Arc::new(InMemoryStore::new()));
        let campaign_id = Uuid::new_v4();
        for i in 0..5 {
            log.append(
                campaign_id,
                ActivityType::Note,
                format!("note {i}"),
                serde_json::json!({}),
            )
            .unwrap();
        }

        let recent = log.recent(campaign_id, 3).unwrap();
        let descriptions: Vec<&str> = recent.iter().map(|a| a.description.as_str()).collect();
        assert_eq!(descriptions, vec!["note 4", "note 3", "note 2"]);
    }

    #[test]
    fn test_unknown_campaign_has_empty_timeline() {
        let log = ActivityLog::new(Arc::new(InMemoryStore::new()));
        assert!(log.recent(Uuid::new_v4(), 10).unwrap().is_empty());
    }
}
