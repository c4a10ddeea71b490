//! Campaign overview: the composite page read that embeds member gang ratings.

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::cache::tags::{gang_loadout_tags, gang_rating_tags};
use crate::cache::{CacheTag, Computed, TagSet};
use crate::error::Result;
use crate::models::{Battle, Campaign, CampaignMember, Territory};
use crate::rating::{gang_loadout_rating, ExclusionPolicy, LoadoutLoader};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignOverview {
    pub campaign: Campaign,
    pub members: Vec<CampaignMember>,
    pub territories: Vec<Territory>,
    /// Most recent first
    pub battles: Vec<Battle>,
    /// Rating per member gang under the campaign exclusion policy
    pub ratings: BTreeMap<Uuid, i64>,
}

impl CampaignOverview {
    pub fn member_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.members.iter().map(|m| m.gang_id)
    }
}

/// Read a campaign overview straight from the store.
///
/// Member ratings are computed from each gang's loadout here rather than
/// through the gang rating cache, so the returned tags are exactly the tags of
/// the rows read.
pub async fn load_campaign_overview(
    loader: &LoadoutLoader,
    campaign_id: Uuid,
    battle_limit: u32,
    policy: ExclusionPolicy,
) -> Result<Computed<Option<CampaignOverview>>> {
    let store = loader.store();
    let Some(campaign) = store.campaign(campaign_id).await? else {
        debug!(campaign_id = %campaign_id, "Campaign not found");
        return Ok(Computed::untagged(None));
    };

    let (members, territories, battles) = tokio::try_join!(
        store.campaign_members(campaign_id),
        store.campaign_territories(campaign_id),
        store.campaign_battles(campaign_id, battle_limit),
    )?;

    let loadouts = try_join_all(members.iter().map(|m| loader.gang_loadout(m.gang_id))).await?;

    let mut tags: TagSet = territories
        .iter()
        .map(|t| CacheTag::base_territory(t.territory_id))
        .collect();
    let mut ratings = BTreeMap::new();
    for (member, loadout) in members.iter().zip(&loadouts) {
        match loadout {
            Some(loadout) => {
                ratings.insert(member.gang_id, gang_loadout_rating(loadout, policy));
                tags.extend(gang_loadout_tags(loadout));
            }
            None => {
                ratings.insert(member.gang_id, 0);
                tags.extend(gang_rating_tags(member.gang_id));
            }
        }
    }

    Ok(Computed::new(
        Some(CampaignOverview {
            campaign,
            members,
            territories,
            battles,
            ratings,
        }),
        tags,
    ))
}
