//! PostgreSQL-backed entity store.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::EntityStore;
use crate::error::Result;
use crate::models::{
    Battle, Campaign, CampaignMember, Effect, EquipmentAssignment, Fighter, Gang, SkillGrant,
    Territory, Vehicle,
};

#[derive(Debug, Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn gang(&self, gang_id: Uuid) -> Result<Option<Gang>> {
        Ok(Gang::find_by_id(&self.pool, gang_id).await?)
    }

    async fn gang_ids(&self) -> Result<Vec<Uuid>> {
        Ok(Gang::list_ids(&self.pool).await?)
    }

    async fn fighter(&self, fighter_id: Uuid) -> Result<Option<Fighter>> {
        Ok(Fighter::find_by_id(&self.pool, fighter_id).await?)
    }

    async fn fighters_for_gang(&self, gang_id: Uuid) -> Result<Vec<Fighter>> {
        Ok(Fighter::list_by_gang(&self.pool, gang_id).await?)
    }

    async fn equipment_for_fighters(
        &self,
        fighter_ids: &[Uuid],
    ) -> Result<Vec<EquipmentAssignment>> {
        Ok(EquipmentAssignment::list_for_fighters(&self.pool, fighter_ids).await?)
    }

    async fn skills_for_fighters(&self, fighter_ids: &[Uuid]) -> Result<Vec<SkillGrant>> {
        Ok(SkillGrant::list_for_fighters(&self.pool, fighter_ids).await?)
    }

    async fn effects_for_fighters(&self, fighter_ids: &[Uuid]) -> Result<Vec<Effect>> {
        Ok(Effect::list_for_fighters(&self.pool, fighter_ids).await?)
    }

    async fn vehicles_for_fighters(&self, fighter_ids: &[Uuid]) -> Result<Vec<Vehicle>> {
        Ok(Vehicle::list_for_fighters(&self.pool, fighter_ids).await?)
    }

    async fn gang_stored_vehicles(&self, gang_id: Uuid) -> Result<Vec<Vehicle>> {
        Ok(Vehicle::list_gang_stored(&self.pool, gang_id).await?)
    }

    async fn equipment_for_vehicles(
        &self,
        vehicle_ids: &[Uuid],
    ) -> Result<Vec<EquipmentAssignment>> {
        Ok(EquipmentAssignment::list_for_vehicles(&self.pool, vehicle_ids).await?)
    }

    async fn effects_for_vehicles(&self, vehicle_ids: &[Uuid]) -> Result<Vec<Effect>> {
        Ok(Effect::list_for_vehicles(&self.pool, vehicle_ids).await?)
    }

    async fn campaign(&self, campaign_id: Uuid) -> Result<Option<Campaign>> {
        Ok(Campaign::find_by_id(&self.pool, campaign_id).await?)
    }

    async fn campaign_members(&self, campaign_id: Uuid) -> Result<Vec<CampaignMember>> {
        Ok(CampaignMember::list_for_campaign(&self.pool, campaign_id).await?)
    }

    async fn campaign_territories(&self, campaign_id: Uuid) -> Result<Vec<Territory>> {
        Ok(Territory::list_for_campaign(&self.pool, campaign_id).await?)
    }

    async fn campaign_battles(&self, campaign_id: Uuid, limit: u32) -> Result<Vec<Battle>> {
        Ok(Battle::list_recent_for_campaign(&self.pool, campaign_id, i64::from(limit)).await?)
    }

    async fn update_gang_rating(&self, gang_id: Uuid, rating: i64) -> Result<bool> {
        Ok(Gang::update_rating(&self.pool, gang_id, rating).await?)
    }
}
