//! # Entity Store
//!
//! Read contract between the cost subsystem and the relational store. Every
//! query is parameterised by owner id(s) and returns rows as they are at call
//! time; nothing here is cached.
//!
//! - [`PgEntityStore`] - PostgreSQL via the [`crate::models`] queries
//! - [`InMemoryEntityStore`] - thread-safe test double with read counters

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Battle, Campaign, CampaignMember, Effect, EquipmentAssignment, Fighter, Gang, SkillGrant,
    Territory, Vehicle,
};

pub use in_memory::{InMemoryEntityStore, StoreTables};
pub use postgres::PgEntityStore;

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn gang(&self, gang_id: Uuid) -> Result<Option<Gang>>;

    async fn gang_ids(&self) -> Result<Vec<Uuid>>;

    async fn fighter(&self, fighter_id: Uuid) -> Result<Option<Fighter>>;

    /// Every fighter of the gang, whatever its lifecycle flags
    async fn fighters_for_gang(&self, gang_id: Uuid) -> Result<Vec<Fighter>>;

    async fn equipment_for_fighters(&self, fighter_ids: &[Uuid])
        -> Result<Vec<EquipmentAssignment>>;

    async fn skills_for_fighters(&self, fighter_ids: &[Uuid]) -> Result<Vec<SkillGrant>>;

    async fn effects_for_fighters(&self, fighter_ids: &[Uuid]) -> Result<Vec<Effect>>;

    /// Vehicles crewed by any of the fighters
    async fn vehicles_for_fighters(&self, fighter_ids: &[Uuid]) -> Result<Vec<Vehicle>>;

    /// Vehicles of the gang with no crew
    async fn gang_stored_vehicles(&self, gang_id: Uuid) -> Result<Vec<Vehicle>>;

    async fn equipment_for_vehicles(&self, vehicle_ids: &[Uuid])
        -> Result<Vec<EquipmentAssignment>>;

    async fn effects_for_vehicles(&self, vehicle_ids: &[Uuid]) -> Result<Vec<Effect>>;

    async fn campaign(&self, campaign_id: Uuid) -> Result<Option<Campaign>>;

    async fn campaign_members(&self, campaign_id: Uuid) -> Result<Vec<CampaignMember>>;

    async fn campaign_territories(&self, campaign_id: Uuid) -> Result<Vec<Territory>>;

    /// Most recent battles first, at most `limit`
    async fn campaign_battles(&self, campaign_id: Uuid, limit: u32) -> Result<Vec<Battle>>;

    /// Overwrite the denormalised rating column; `false` if the gang is gone
    async fn update_gang_rating(&self, gang_id: Uuid, rating: i64) -> Result<bool>;
}
