//! # Cache Tag Registry
//!
//! Tags name the dependencies of a cached value. Their string form is
//! `"<class>:<scope>:<id>"`, stable across processes so a shared backend can
//! index them:
//!
//! - **BASE** (`base:fighter:{id}`) - one entity's own record
//! - **SHARED** (`shared:fighter_equipment:{id}`) - a collection or value that
//!   feeds several views; emitted by every mutation that changes its members
//! - **COMPOSITE** (`composite:campaign_overview:{id}`) - a page stitched
//!   together from several SHARED values
//! - **COMPUTED** (`computed:gang_rating:{id}`, `computed:all`) - aggregator
//!   outputs, so aggregation changes can bust them without touching raw reads
//!
//! A cached value carries the union of the tags of everything it read,
//! including collection tags for collections that were empty.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use super::invalidation::{EntityChange, EntityKind};
use crate::rating::{FighterLoadout, GangLoadout, VehicleLoadout};

pub type TagSet = BTreeSet<CacheTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagClass {
    Base,
    Shared,
    Composite,
    Computed,
}

impl TagClass {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Shared => "shared",
            Self::Composite => "composite",
            Self::Computed => "computed",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "base" => Some(Self::Base),
            "shared" => Some(Self::Shared),
            "composite" => Some(Self::Composite),
            "computed" => Some(Self::Computed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheTag(String);

macro_rules! tag_constructors {
    ($($name:ident => ($class:ident, $scope:literal)),* $(,)?) => {
        $(
            pub fn $name(id: Uuid) -> Self {
                Self::new(TagClass::$class, $scope, id)
            }
        )*
    };
}

impl CacheTag {
    pub fn new(class: TagClass, scope: &str, id: Uuid) -> Self {
        Self(format!("{}:{scope}:{id}", class.prefix()))
    }

    /// Class-wide tag carried by every COMPUTED entry
    pub fn all_computed() -> Self {
        Self("computed:all".to_string())
    }

    tag_constructors! {
        base_gang => (Base, "gang"),
        base_fighter => (Base, "fighter"),
        base_vehicle => (Base, "vehicle"),
        base_campaign => (Base, "campaign"),
        base_equipment => (Base, "equipment"),
        base_skill => (Base, "skill"),
        base_effect => (Base, "effect"),
        base_territory => (Base, "territory"),

        shared_gang_rating => (Shared, "gang_rating"),
        shared_gang_fighters => (Shared, "gang_fighters"),
        shared_gang_vehicles => (Shared, "gang_vehicles"),
        shared_fighter_equipment => (Shared, "fighter_equipment"),
        shared_fighter_skills => (Shared, "fighter_skills"),
        shared_fighter_effects => (Shared, "fighter_effects"),
        shared_fighter_vehicles => (Shared, "fighter_vehicles"),
        shared_vehicle_equipment => (Shared, "vehicle_equipment"),
        shared_vehicle_effects => (Shared, "vehicle_effects"),
        shared_campaign_members => (Shared, "campaign_members"),
        shared_campaign_territories => (Shared, "campaign_territories"),
        shared_campaign_battles => (Shared, "campaign_battles"),

        composite_campaign_overview => (Composite, "campaign_overview"),

        computed_gang_rating => (Computed, "gang_rating"),
        computed_fighter_cost => (Computed, "fighter_cost"),
        computed_vehicle_cost => (Computed, "vehicle_cost"),
    }

    pub fn class(&self) -> Option<TagClass> {
        self.0.split(':').next().and_then(TagClass::from_prefix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tags for a gang's rating that hold even when the gang has no rows yet
pub fn gang_rating_tags(gang_id: Uuid) -> TagSet {
    TagSet::from([
        CacheTag::base_gang(gang_id),
        CacheTag::shared_gang_rating(gang_id),
        CacheTag::shared_gang_fighters(gang_id),
        CacheTag::shared_gang_vehicles(gang_id),
        CacheTag::computed_gang_rating(gang_id),
        CacheTag::all_computed(),
    ])
}

/// Tags for a fighter's cost that hold even when the fighter has no rows yet
pub fn fighter_cost_tags(fighter_id: Uuid) -> TagSet {
    TagSet::from([
        CacheTag::base_fighter(fighter_id),
        CacheTag::shared_fighter_equipment(fighter_id),
        CacheTag::shared_fighter_skills(fighter_id),
        CacheTag::shared_fighter_effects(fighter_id),
        CacheTag::shared_fighter_vehicles(fighter_id),
        CacheTag::computed_fighter_cost(fighter_id),
        CacheTag::all_computed(),
    ])
}

pub fn vehicle_cost_tags(vehicle_id: Uuid) -> TagSet {
    TagSet::from([
        CacheTag::base_vehicle(vehicle_id),
        CacheTag::shared_vehicle_equipment(vehicle_id),
        CacheTag::shared_vehicle_effects(vehicle_id),
        CacheTag::computed_vehicle_cost(vehicle_id),
        CacheTag::all_computed(),
    ])
}

pub fn campaign_overview_tags(campaign_id: Uuid) -> TagSet {
    TagSet::from([
        CacheTag::base_campaign(campaign_id),
        CacheTag::shared_campaign_members(campaign_id),
        CacheTag::shared_campaign_territories(campaign_id),
        CacheTag::shared_campaign_battles(campaign_id),
        CacheTag::composite_campaign_overview(campaign_id),
    ])
}

pub fn vehicle_loadout_tags(loadout: &VehicleLoadout) -> TagSet {
    let mut tags = vehicle_cost_tags(loadout.vehicle_id());
    tags.extend(
        loadout
            .equipment
            .iter()
            .map(|e| CacheTag::base_equipment(e.fighter_equipment_id)),
    );
    tags.extend(
        loadout
            .effects
            .iter()
            .map(|e| CacheTag::base_effect(e.fighter_effect_id)),
    );
    tags
}

pub fn fighter_loadout_tags(loadout: &FighterLoadout) -> TagSet {
    let mut tags = fighter_cost_tags(loadout.fighter_id());
    tags.extend(
        loadout
            .equipment
            .iter()
            .map(|e| CacheTag::base_equipment(e.fighter_equipment_id)),
    );
    tags.extend(
        loadout
            .skills
            .iter()
            .map(|s| CacheTag::base_skill(s.fighter_skill_id)),
    );
    tags.extend(
        loadout
            .effects
            .iter()
            .map(|e| CacheTag::base_effect(e.fighter_effect_id)),
    );
    for vehicle in &loadout.vehicles {
        tags.extend(vehicle_loadout_tags(vehicle));
    }
    tags
}

/// Every tag a gang rating read depends on, excluded fighters included: a
/// flag flip on an excluded fighter must still reach the rating.
pub fn gang_loadout_tags(loadout: &GangLoadout) -> TagSet {
    let mut tags = gang_rating_tags(loadout.gang_id());
    for fighter in &loadout.fighters {
        tags.extend(fighter_loadout_tags(fighter));
    }
    for vehicle in &loadout.gang_vehicles {
        tags.extend(vehicle_loadout_tags(vehicle));
    }
    tags
}

fn gang_change_tags(gang_id: Uuid, tags: &mut TagSet) {
    tags.insert(CacheTag::shared_gang_rating(gang_id));
    tags.insert(CacheTag::computed_gang_rating(gang_id));
}

/// Pure mapping from "what changed" to "which tags must be purged".
///
/// Parentage comes from the caller; nothing here consults the store, since the
/// changed row may already be gone. COMPOSITE tags are emitted for the
/// `campaign_ids` carried by the change.
pub fn tags_for_change(change: &EntityChange) -> TagSet {
    let parents = &change.parents;
    let id = change.id;
    let mut tags = TagSet::new();

    match change.kind {
        EntityKind::Gang => {
            tags.extend(gang_rating_tags(id));
            tags.remove(&CacheTag::all_computed());
        }
        EntityKind::Fighter => {
            tags.insert(CacheTag::base_fighter(id));
            tags.insert(CacheTag::computed_fighter_cost(id));
            if let Some(gang_id) = parents.gang_id {
                tags.insert(CacheTag::shared_gang_fighters(gang_id));
            }
        }
        EntityKind::Vehicle => {
            tags.insert(CacheTag::base_vehicle(id));
            tags.insert(CacheTag::computed_vehicle_cost(id));
            if let Some(gang_id) = parents.gang_id {
                tags.insert(CacheTag::shared_gang_vehicles(gang_id));
            }
            if let Some(fighter_id) = parents.fighter_id {
                tags.insert(CacheTag::shared_fighter_vehicles(fighter_id));
                tags.insert(CacheTag::computed_fighter_cost(fighter_id));
            }
        }
        EntityKind::Equipment => {
            tags.insert(CacheTag::base_equipment(id));
            match (parents.vehicle_id, parents.fighter_id) {
                (Some(vehicle_id), _) => {
                    tags.insert(CacheTag::shared_vehicle_equipment(vehicle_id));
                    tags.insert(CacheTag::computed_vehicle_cost(vehicle_id));
                }
                (None, Some(fighter_id)) => {
                    tags.insert(CacheTag::shared_fighter_equipment(fighter_id));
                }
                (None, None) => {}
            }
            if let Some(fighter_id) = parents.fighter_id {
                tags.insert(CacheTag::computed_fighter_cost(fighter_id));
            }
        }
        EntityKind::Skill => {
            tags.insert(CacheTag::base_skill(id));
            if let Some(fighter_id) = parents.fighter_id {
                tags.insert(CacheTag::shared_fighter_skills(fighter_id));
                tags.insert(CacheTag::computed_fighter_cost(fighter_id));
            }
        }
        EntityKind::Effect => {
            tags.insert(CacheTag::base_effect(id));
            match (parents.vehicle_id, parents.fighter_id) {
                (Some(vehicle_id), _) => {
                    tags.insert(CacheTag::shared_vehicle_effects(vehicle_id));
                    tags.insert(CacheTag::computed_vehicle_cost(vehicle_id));
                }
                (None, Some(fighter_id)) => {
                    tags.insert(CacheTag::shared_fighter_effects(fighter_id));
                }
                (None, None) => {}
            }
            if let Some(fighter_id) = parents.fighter_id {
                tags.insert(CacheTag::computed_fighter_cost(fighter_id));
            }
        }
        EntityKind::Campaign => {
            tags.extend(campaign_overview_tags(id));
        }
        EntityKind::CampaignMembership => {
            tags.insert(CacheTag::shared_campaign_members(id));
            tags.insert(CacheTag::composite_campaign_overview(id));
        }
        EntityKind::Territory => {
            tags.insert(CacheTag::base_territory(id));
        }
        EntityKind::Battle => {}
    }

    // Everything under a gang feeds its rating
    if change.kind != EntityKind::CampaignMembership {
        if let Some(gang_id) = parents.gang_id {
            gang_change_tags(gang_id, &mut tags);
        }
    }

    for &campaign_id in &parents.campaign_ids {
        match change.kind {
            EntityKind::Territory => {
                tags.insert(CacheTag::shared_campaign_territories(campaign_id));
            }
            EntityKind::Battle => {
                tags.insert(CacheTag::shared_campaign_battles(campaign_id));
            }
            _ => {}
        }
        tags.insert(CacheTag::composite_campaign_overview(campaign_id));
    }

    tags
}
