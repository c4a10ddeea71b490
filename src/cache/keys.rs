//! Cache key derivation.
//!
//! A key is a pure function of the logical request: the entity id plus every
//! parameter that changes the result.

use std::fmt;
use uuid::Uuid;

use crate::rating::ExclusionPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn gang_rating(gang_id: Uuid, policy: ExclusionPolicy) -> Self {
        Self(format!("gang_rating:{gang_id}:excl={}", policy.code()))
    }

    pub fn fighter_total_cost(fighter_id: Uuid) -> Self {
        Self(format!("fighter_total_cost:{fighter_id}"))
    }

    pub fn fighter_breakdown(fighter_id: Uuid) -> Self {
        Self(format!("fighter_breakdown:{fighter_id}"))
    }

    pub fn campaign_overview(campaign_id: Uuid, battle_limit: u32) -> Self {
        Self(format!("campaign_overview:{campaign_id}:battles={battle_limit}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
