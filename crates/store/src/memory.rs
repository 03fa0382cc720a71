//! In-memory store backed by DashMap.
//!
//! Production: replace with a relational store implementing
//! [`CampaignStore`] with row-level conditional updates.

use std::sync::atomic::{AtomicU64, Ordering};

use campaign_core::types::{
    Activity, Campaign, CampaignStatus, Contact, MetricSnapshot, RecipientLink, RecipientStatus,
};
use campaign_core::{CampaignError, CampaignResult};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::CampaignStore;

/// Thread-safe store for campaigns, the contact directory, recipient links,
/// activities and metric snapshots.
pub struct InMemoryStore {
    campaigns: DashMap<Uuid, Campaign>,
    contacts: DashMap<Uuid, Contact>,
    links: DashMap<(Uuid, Uuid), RecipientLink>,
    activities: DashMap<Uuid, Vec<Activity>>,
    snapshots: DashMap<Uuid, Vec<MetricSnapshot>>,
    next_position: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        info!("Campaign store initialized (in-memory, development mode)");
        Self {
            campaigns: DashMap::new(),
            contacts: DashMap::new(),
            links: DashMap::new(),
            activities: DashMap::new(),
            snapshots: DashMap::new(),
            next_position: AtomicU64::new(0),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignStore for InMemoryStore {
    fn insert_campaign(&self, campaign: Campaign) -> CampaignResult<()> {
        self.campaigns.insert(campaign.id, campaign);
        Ok(())
    }

    fn get_campaign(&self, id: Uuid) -> CampaignResult<Option<Campaign>> {
        Ok(self.campaigns.get(&id).map(|r| r.value().clone()))
    }

    fn list_campaigns_for_owner(&self, owner_id: &str) -> CampaignResult<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| r.value().owner_id == owner_id)
            .map(|r| r.value().clone())
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(campaigns)
    }

    fn activate_campaign(&self, id: Uuid, now: DateTime<Utc>) -> CampaignResult<bool> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CampaignError::NotFound(format!("campaign {id}")))?;
        let campaign = entry.value_mut();
        if campaign.status == CampaignStatus::Active {
            return Ok(false);
        }
        campaign.status = CampaignStatus::Active;
        campaign.start_date = Some(now);
        campaign.updated_at = now;
        Ok(true)
    }

    fn update_campaign(
        &self,
        campaign: Campaign,
        expected_status: CampaignStatus,
    ) -> CampaignResult<bool> {
        let mut entry = self
            .campaigns
            .get_mut(&campaign.id)
            .ok_or_else(|| CampaignError::NotFound(format!("campaign {}", campaign.id)))?;
        if entry.value().status != expected_status {
            return Ok(false);
        }
        *entry.value_mut() = campaign;
        Ok(true)
    }

    fn upsert_contact(&self, contact: Contact) -> CampaignResult<Contact> {
        self.contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    fn get_contact(&self, id: Uuid) -> CampaignResult<Option<Contact>> {
        Ok(self.contacts.get(&id).map(|r| r.value().clone()))
    }

    fn attach_contacts(
        &self,
        campaign_id: Uuid,
        contact_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> CampaignResult<usize> {
        if !self.campaigns.contains_key(&campaign_id) {
            return Err(CampaignError::NotFound(format!("campaign {campaign_id}")));
        }
        if let Some(missing) = contact_ids.iter().find(|id| !self.contacts.contains_key(id)) {
            return Err(CampaignError::Validation(format!("unknown contact {missing}")));
        }

        let mut added = 0;
        for contact_id in contact_ids {
            if let Entry::Vacant(slot) = self.links.entry((campaign_id, *contact_id)) {
                let position = self.next_position.fetch_add(1, Ordering::Relaxed);
                slot.insert(RecipientLink::pending(campaign_id, *contact_id, position, now));
                added += 1;
            }
        }
        debug!(campaign_id = %campaign_id, added, "Contacts attached");
        Ok(added)
    }

    fn detach_contact(&self, campaign_id: Uuid, contact_id: Uuid) -> CampaignResult<bool> {
        Ok(self.links.remove(&(campaign_id, contact_id)).is_some())
    }

    fn list_links(&self, campaign_id: Uuid) -> CampaignResult<Vec<RecipientLink>> {
        let mut links: Vec<RecipientLink> = self
            .links
            .iter()
            .filter(|r| r.key().0 == campaign_id)
            .map(|r| r.value().clone())
            .collect();
        links.sort_by_key(|l| l.position);
        Ok(links)
    }

    fn get_link(
        &self,
        campaign_id: Uuid,
        contact_id: Uuid,
    ) -> CampaignResult<Option<RecipientLink>> {
        Ok(self
            .links
            .get(&(campaign_id, contact_id))
            .map(|r| r.value().clone()))
    }

    fn compare_and_set_status(
        &self,
        campaign_id: Uuid,
        contact_id: Uuid,
        expected: RecipientStatus,
        next: RecipientStatus,
        now: DateTime<Utc>,
    ) -> CampaignResult<bool> {
        let Some(mut entry) = self.links.get_mut(&(campaign_id, contact_id)) else {
            return Ok(false);
        };
        let link = entry.value_mut();
        if link.status != expected {
            return Ok(false);
        }
        link.enter(next, now);
        Ok(true)
    }

    fn append_activity(&self, activity: Activity) -> CampaignResult<()> {
        self.activities
            .entry(activity.campaign_id)
            .or_default()
            .push(activity);
        Ok(())
    }

    fn list_activities(&self, campaign_id: Uuid, limit: usize) -> CampaignResult<Vec<Activity>> {
        Ok(self
            .activities
            .get(&campaign_id)
            .map(|r| r.value().iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn append_snapshot(&self, snapshot: MetricSnapshot) -> CampaignResult<()> {
        self.snapshots
            .entry(snapshot.campaign_id)
            .or_default()
            .push(snapshot);
        Ok(())
    }

    fn list_snapshots(&self, campaign_id: Uuid) -> CampaignResult<Vec<MetricSnapshot>> {
        Ok(self
            .snapshots
            .get(&campaign_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campaign_core::types::CampaignType;
    use std::sync::Arc;

    fn campaign(owner: &str) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            name: "Spring Launch".into(),
            owner_id: owner.into(),
            campaign_type: CampaignType::Email,
            status: CampaignStatus::Draft,
            start_date: None,
            end_date: None,
            budget: None,
            email_subject: Some("Hi".into()),
            email_content: Some("<p>Hello</p>".into()),
            social_platform: None,
            social_content: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn contact(store: &InMemoryStore) -> Uuid {
        let id = Uuid::new_v4();
        store
            .upsert_contact(Contact {
                id,
                email: Some(format!("{id}@example.com")),
                ..Default::default()
            })
            .unwrap();
        id
    }

    #[test]
    fn test_attach_is_idempotent_and_ordered() {
        let store = InMemoryStore::new();
        let c = campaign("u1");
        store.insert_campaign(c.clone()).unwrap();
        let ids: Vec<Uuid> = (0..3).map(|_| contact(&store)).collect();

        assert_eq!(store.attach_contacts(c.id, &ids, Utc::now()).unwrap(), 3);
        assert_eq!(store.attach_contacts(c.id, &ids, Utc::now()).unwrap(), 0);

        let links = store.list_links(c.id).unwrap();
        let order: Vec<Uuid> = links.iter().map(|l| l.contact_id).collect();
        assert_eq!(order, ids);
        assert!(links.iter().all(|l| l.status == RecipientStatus::Pending));
    }

    #[test]
    fn test_attach_rejects_unknown_contact() {
        let store = InMemoryStore::new();
        let c = campaign("u1");
        store.insert_campaign(c.clone()).unwrap();
        let err = store
            .attach_contacts(c.id, &[Uuid::new_v4()], Utc::now())
            .unwrap_err();
        assert!(matches!(err, CampaignError::Validation(_)));
    }

    #[test]
    fn test_activate_only_once() {
        let store = InMemoryStore::new();
        let c = campaign("u1");
        store.insert_campaign(c.clone()).unwrap();
        assert!(store.activate_campaign(c.id, Utc::now()).unwrap());
        assert!(!store.activate_campaign(c.id, Utc::now()).unwrap());
        let stored = store.get_campaign(c.id).unwrap().unwrap();
        assert_eq!(stored.status, CampaignStatus::Active);
        assert!(stored.start_date.is_some());
    }

    #[test]
    fn test_update_campaign_guards_status() {
        let store = InMemoryStore::new();
        let mut c = campaign("u1");
        store.insert_campaign(c.clone()).unwrap();
        store.activate_campaign(c.id, Utc::now()).unwrap();

        c.name = "Renamed".into();
        c.status = CampaignStatus::Paused;
        assert!(!store.update_campaign(c.clone(), CampaignStatus::Draft).unwrap());
        assert!(store.update_campaign(c.clone(), CampaignStatus::Active).unwrap());

        let stored = store.get_campaign(c.id).unwrap().unwrap();
        assert_eq!(stored.status, CampaignStatus::Paused);
        assert_eq!(stored.name, "Renamed");

        let missing = store
            .update_campaign(campaign("u1"), CampaignStatus::Draft)
            .unwrap_err();
        assert!(matches!(missing, CampaignError::NotFound(_)));
    }

    #[test]
    fn test_compare_and_set_status() {
        let store = InMemoryStore::new();
        let c = campaign("u1");
        store.insert_campaign(c.clone()).unwrap();
        let k = contact(&store);
        store.attach_contacts(c.id, &[k], Utc::now()).unwrap();

        let now = Utc::now();
        assert!(store
            .compare_and_set_status(c.id, k, RecipientStatus::Pending, RecipientStatus::Sent, now)
            .unwrap());
        assert!(!store
            .compare_and_set_status(c.id, k, RecipientStatus::Pending, RecipientStatus::Sent, now)
            .unwrap());

        let link = store.get_link(c.id, k).unwrap().unwrap();
        assert_eq!(link.status, RecipientStatus::Sent);
        assert_eq!(link.sent_at, Some(now));
    }

    #[test]
    fn test_concurrent_cas_has_single_winner() {
        let store = Arc::new(InMemoryStore::new());
        let c = campaign("u1");
        store.insert_campaign(c.clone()).unwrap();
        let k = contact(&store);
        store.attach_contacts(c.id, &[k], Utc::now()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .compare_and_set_status(
                            c.id,
                            k,
                            RecipientStatus::Pending,
                            RecipientStatus::Sent,
                            Utc::now(),
                        )
                        .unwrap()
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_status_counts_and_owner_scoping() {
        let store = InMemoryStore::new();
        let mine = campaign("u1");
        let theirs = campaign("u2");
        store.insert_campaign(mine.clone()).unwrap();
        store.insert_campaign(theirs).unwrap();
        let ids: Vec<Uuid> = (0..2).map(|_| contact(&store)).collect();
        store.attach_contacts(mine.id, &ids, Utc::now()).unwrap();
        store
            .compare_and_set_status(
                mine.id,
                ids[0],
                RecipientStatus::Pending,
                RecipientStatus::Sent,
                Utc::now(),
            )
            .unwrap();

        let counts = store.status_counts(mine.id).unwrap();
        assert_eq!(counts.get(&RecipientStatus::Pending), Some(&1));
        assert_eq!(counts.get(&RecipientStatus::Sent), Some(&1));
        assert_eq!(store.list_campaigns_for_owner("u1").unwrap().len(), 1);
        assert_eq!(store.pending_links(mine.id).unwrap().len(), 1);
    }
}
