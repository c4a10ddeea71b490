//! Runtime index of which gangs take part in which campaigns.
//!
//! Fed by campaign overview reads (the member list just loaded) and by
//! membership changes. The dispatcher uses it to find the COMPOSITE tags a
//! gang-level change must reach.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipChange {
    Joined,
    Left,
}

#[derive(Debug, Default)]
struct MembershipMaps {
    by_gang: HashMap<Uuid, BTreeSet<Uuid>>,
    by_campaign: HashMap<Uuid, BTreeSet<Uuid>>,
}

impl MembershipMaps {
    fn link(&mut self, campaign_id: Uuid, gang_id: Uuid) {
        self.by_gang.entry(gang_id).or_default().insert(campaign_id);
        self.by_campaign.entry(campaign_id).or_default().insert(gang_id);
    }

    fn unlink(&mut self, campaign_id: Uuid, gang_id: Uuid) {
        if let Some(campaigns) = self.by_gang.get_mut(&gang_id) {
            campaigns.remove(&campaign_id);
            if campaigns.is_empty() {
                self.by_gang.remove(&gang_id);
            }
        }
        if let Some(gangs) = self.by_campaign.get_mut(&campaign_id) {
            gangs.remove(&gang_id);
            if gangs.is_empty() {
                self.by_campaign.remove(&campaign_id);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CampaignMembershipIndex {
    maps: Arc<RwLock<MembershipMaps>>,
}

impl CampaignMembershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the member set of a campaign with a freshly read one
    pub fn record_campaign(&self, campaign_id: Uuid, gang_ids: impl IntoIterator<Item = Uuid>) {
        let mut maps = self.maps.write();
        let previous = maps.by_campaign.remove(&campaign_id).unwrap_or_default();
        for gang_id in previous {
            if let Some(campaigns) = maps.by_gang.get_mut(&gang_id) {
                campaigns.remove(&campaign_id);
                if campaigns.is_empty() {
                    maps.by_gang.remove(&gang_id);
                }
            }
        }
        for gang_id in gang_ids {
            maps.link(campaign_id, gang_id);
        }
    }

    pub fn apply(&self, campaign_id: Uuid, gang_id: Uuid, change: MembershipChange) {
        let mut maps = self.maps.write();
        match change {
            MembershipChange::Joined => maps.link(campaign_id, gang_id),
            MembershipChange::Left => maps.unlink(campaign_id, gang_id),
        }
    }

    pub fn campaigns_for_gang(&self, gang_id: Uuid) -> BTreeSet<Uuid> {
        self.maps
            .read()
            .by_gang
            .get(&gang_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn gangs_in_campaign(&self, campaign_id: Uuid) -> BTreeSet<Uuid> {
        self.maps
            .read()
            .by_campaign
            .get(&campaign_id)
            .cloned()
            .unwrap_or_default()
    }
}
