//! # Entity Models
//!
//! Row types for every entity the cost aggregator reads, with the SQLx queries
//! that fetch them. Queries are batched by owner id so a whole gang subtree is
//! loaded in a fixed number of round trips.
//!
//! - [`gang::Gang`] - root of the ownership graph
//! - [`fighter::Fighter`] - gang member with lifecycle flags
//! - [`equipment::EquipmentAssignment`] - purchased item on a fighter or vehicle
//! - [`skill::SkillGrant`] - learned skill with a credit delta
//! - [`effect::Effect`] - injury/upgrade with an opaque payload
//! - [`vehicle::Vehicle`] - crewed or gang-stored vehicle
//! - [`campaign`] - campaigns, members, territories and battles

pub mod campaign;
pub mod effect;
pub mod equipment;
pub mod fighter;
pub mod gang;
pub mod skill;
pub mod vehicle;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use campaign::{Battle, Campaign, CampaignMember, Territory};
pub use effect::{Effect, EffectPayload};
pub use equipment::EquipmentAssignment;
pub use fighter::Fighter;
pub use gang::Gang;
pub use skill::SkillGrant;
pub use vehicle::Vehicle;

/// Holder of an equipment assignment or effect. Exactly one of the two owner
/// columns is set on every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Fighter(Uuid),
    Vehicle(Uuid),
}

impl Owner {
    /// Map the `(fighter_id, vehicle_id)` column pair; `None` if both or neither are set
    pub fn from_columns(fighter_id: Option<Uuid>, vehicle_id: Option<Uuid>) -> Option<Self> {
        match (fighter_id, vehicle_id) {
            (Some(f), None) => Some(Self::Fighter(f)),
            (None, Some(v)) => Some(Self::Vehicle(v)),
            _ => None,
        }
    }

    pub fn split(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            Self::Fighter(f) => (Some(f), None),
            Self::Vehicle(v) => (None, Some(v)),
        }
    }
}
