//! # Rating
//!
//! Cost aggregation over a gang's ownership graph.
//!
//! - [`aggregator`] - pure summation over materialised loadouts, no I/O
//! - [`loadout`] - the materialised subtree types the aggregator consumes
//! - [`loader`] - batched fetch of loadouts from an [`EntityStore`](crate::store::EntityStore)
//!
//! Which fighters count toward a rating depends on the read path, so callers
//! pass an [`ExclusionPolicy`] instead of the aggregator hard-coding one.

pub mod aggregator;
pub mod loader;
pub mod loadout;

use serde::{Deserialize, Serialize};

use crate::models::Fighter;

pub use aggregator::{
    compute_fighter_cost, compute_gang_rating, compute_vehicle_cost, fighter_loadout_cost,
    gang_loadout_rating, vehicle_loadout_cost, CostBreakdown,
};
pub use loader::LoadoutLoader;
pub use loadout::{FighterLoadout, GangLoadout, VehicleLoadout};

/// Lifecycle flags that remove a fighter from a gang's rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionPolicy {
    pub killed: bool,
    pub retired: bool,
    pub enslaved: bool,
    pub captured: bool,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::gang_sheet()
    }
}

impl ExclusionPolicy {
    /// Gang sheet read path: captured fighters still count
    pub const fn gang_sheet() -> Self {
        Self {
            killed: true,
            retired: true,
            enslaved: true,
            captured: false,
        }
    }

    /// Campaign read path: captured fighters are excluded too
    pub const fn campaign() -> Self {
        Self {
            killed: true,
            retired: true,
            enslaved: true,
            captured: true,
        }
    }

    /// Count every fighter regardless of flags
    pub const fn none() -> Self {
        Self {
            killed: false,
            retired: false,
            enslaved: false,
            captured: false,
        }
    }

    pub fn excludes(&self, fighter: &Fighter) -> bool {
        (self.killed && fighter.killed)
            || (self.retired && fighter.retired)
            || (self.enslaved && fighter.enslaved)
            || (self.captured && fighter.captured)
    }

    /// Stable short form used in cache keys, e.g. `kre-` for the gang sheet
    pub fn code(&self) -> String {
        [
            (self.killed, 'k'),
            (self.retired, 'r'),
            (self.enslaved, 'e'),
            (self.captured, 'c'),
        ]
        .iter()
        .map(|&(on, c)| if on { c } else { '-' })
        .collect()
    }
}
