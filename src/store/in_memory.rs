//! In-Memory Entity Store
//!
//! Thread-safe implementation of [`EntityStore`] backed by ordered maps.
//! Used as the test double for the cache layer: it counts reads, can be slowed
//! down to widen race windows, and can be switched "unavailable" to exercise
//! error propagation.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::EntityStore;
use crate::error::{GangkeeperError, Result};
use crate::models::{
    Battle, Campaign, CampaignMember, Effect, EquipmentAssignment, Fighter, Gang, SkillGrant,
    Territory, Vehicle,
};

/// Raw table contents; mutate through [`InMemoryEntityStore::write`]
#[derive(Debug, Clone, Default)]
pub struct StoreTables {
    pub gangs: BTreeMap<Uuid, Gang>,
    pub fighters: BTreeMap<Uuid, Fighter>,
    pub equipment: BTreeMap<Uuid, EquipmentAssignment>,
    pub skills: BTreeMap<Uuid, SkillGrant>,
    pub effects: BTreeMap<Uuid, Effect>,
    pub vehicles: BTreeMap<Uuid, Vehicle>,
    pub campaigns: BTreeMap<Uuid, Campaign>,
    pub members: Vec<CampaignMember>,
    pub territories: BTreeMap<Uuid, Territory>,
    pub battles: BTreeMap<Uuid, Battle>,
}

impl StoreTables {
    pub fn insert_gang(&mut self, gang: Gang) {
        self.gangs.insert(gang.gang_id, gang);
    }

    pub fn insert_fighter(&mut self, fighter: Fighter) {
        self.fighters.insert(fighter.fighter_id, fighter);
    }

    pub fn insert_equipment(&mut self, item: EquipmentAssignment) {
        self.equipment.insert(item.fighter_equipment_id, item);
    }

    pub fn insert_skill(&mut self, skill: SkillGrant) {
        self.skills.insert(skill.fighter_skill_id, skill);
    }

    pub fn insert_effect(&mut self, effect: Effect) {
        self.effects.insert(effect.fighter_effect_id, effect);
    }

    pub fn insert_vehicle(&mut self, vehicle: Vehicle) {
        self.vehicles.insert(vehicle.vehicle_id, vehicle);
    }

    pub fn insert_campaign(&mut self, campaign: Campaign) {
        self.campaigns.insert(campaign.campaign_id, campaign);
    }

    pub fn insert_territory(&mut self, territory: Territory) {
        self.territories.insert(territory.territory_id, territory);
    }

    pub fn insert_battle(&mut self, battle: Battle) {
        self.battles.insert(battle.battle_id, battle);
    }

    /// Add a gang to a campaign; returns `false` if it was already a member
    pub fn add_member(&mut self, campaign_id: Uuid, gang_id: Uuid, role: Option<&str>) -> bool {
        if self
            .members
            .iter()
            .any(|m| m.campaign_id == campaign_id && m.gang_id == gang_id)
        {
            return false;
        }
        let gang_name = self
            .gangs
            .get(&gang_id)
            .map(|g| g.gang_name.clone())
            .unwrap_or_default();
        self.members.push(CampaignMember {
            campaign_id,
            gang_id,
            gang_name,
            role: role.map(str::to_string),
        });
        true
    }

    pub fn remove_member(&mut self, campaign_id: Uuid, gang_id: Uuid) -> bool {
        let before = self.members.len();
        self.members
            .retain(|m| !(m.campaign_id == campaign_id && m.gang_id == gang_id));
        self.members.len() != before
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    tables: Arc<RwLock<StoreTables>>,
    reads: Arc<AtomicU64>,
    read_delay: Arc<RwLock<Option<Duration>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: StoreTables) -> Self {
        Self {
            tables: Arc::new(RwLock::new(tables)),
            ..Self::default()
        }
    }

    /// Apply a mutation; the write is committed when this returns
    pub fn write<R>(&self, mutate: impl FnOnce(&mut StoreTables) -> R) -> R {
        mutate(&mut self.tables.write())
    }

    pub fn read<R>(&self, inspect: impl FnOnce(&StoreTables) -> R) -> R {
        inspect(&self.tables.read())
    }

    /// Number of trait reads served so far
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Delay every trait read, widening concurrent-miss windows in tests
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        *self.read_delay.write() = delay;
    }

    /// Fail every trait read and write with a database error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    async fn before_read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.read_delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GangkeeperError::DatabaseError(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

fn owned_by_fighter(fighter_id: Option<Uuid>, ids: &[Uuid]) -> bool {
    fighter_id.is_some_and(|id| ids.contains(&id))
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn gang(&self, gang_id: Uuid) -> Result<Option<Gang>> {
        self.before_read().await?;
        Ok(self.tables.read().gangs.get(&gang_id).cloned())
    }

    async fn gang_ids(&self) -> Result<Vec<Uuid>> {
        self.before_read().await?;
        Ok(self.tables.read().gangs.keys().copied().collect())
    }

    async fn fighter(&self, fighter_id: Uuid) -> Result<Option<Fighter>> {
        self.before_read().await?;
        Ok(self.tables.read().fighters.get(&fighter_id).cloned())
    }

    async fn fighters_for_gang(&self, gang_id: Uuid) -> Result<Vec<Fighter>> {
        self.before_read().await?;
        Ok(self
            .tables
            .read()
            .fighters
            .values()
            .filter(|f| f.gang_id == gang_id)
            .cloned()
            .collect())
    }

    async fn equipment_for_fighters(
        &self,
        fighter_ids: &[Uuid],
    ) -> Result<Vec<EquipmentAssignment>> {
        self.before_read().await?;
        Ok(self
            .tables
            .read()
            .equipment
            .values()
            .filter(|e| owned_by_fighter(e.fighter_id, fighter_ids))
            .cloned()
            .collect())
    }

    async fn skills_for_fighters(&self, fighter_ids: &[Uuid]) -> Result<Vec<SkillGrant>> {
        self.before_read().await?;
        Ok(self
            .tables
            .read()
            .skills
            .values()
            .filter(|s| fighter_ids.contains(&s.fighter_id))
            .cloned()
            .collect())
    }

    async fn effects_for_fighters(&self, fighter_ids: &[Uuid]) -> Result<Vec<Effect>> {
        self.before_read().await?;
        Ok(self
            .tables
            .read()
            .effects
            .values()
            .filter(|e| owned_by_fighter(e.fighter_id, fighter_ids))
            .cloned()
            .collect())
    }

    async fn vehicles_for_fighters(&self, fighter_ids: &[Uuid]) -> Result<Vec<Vehicle>> {
        self.before_read().await?;
        Ok(self
            .tables
            .read()
            .vehicles
            .values()
            .filter(|v| owned_by_fighter(v.fighter_id, fighter_ids))
            .cloned()
            .collect())
    }

    async fn gang_stored_vehicles(&self, gang_id: Uuid) -> Result<Vec<Vehicle>> {
        self.before_read().await?;
        Ok(self
            .tables
            .read()
            .vehicles
            .values()
            .filter(|v| v.gang_id == gang_id && v.is_gang_stored())
            .cloned()
            .collect())
    }

    async fn equipment_for_vehicles(
        &self,
        vehicle_ids: &[Uuid],
    ) -> Result<Vec<EquipmentAssignment>> {
        self.before_read().await?;
        Ok(self
            .tables
            .read()
            .equipment
            .values()
            .filter(|e| e.vehicle_id.is_some_and(|id| vehicle_ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn effects_for_vehicles(&self, vehicle_ids: &[Uuid]) -> Result<Vec<Effect>> {
        self.before_read().await?;
        Ok(self
            .tables
            .read()
            .effects
            .values()
            .filter(|e| e.vehicle_id.is_some_and(|id| vehicle_ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn campaign(&self, campaign_id: Uuid) -> Result<Option<Campaign>> {
        self.before_read().await?;
        Ok(self.tables.read().campaigns.get(&campaign_id).cloned())
    }

    async fn campaign_members(&self, campaign_id: Uuid) -> Result<Vec<CampaignMember>> {
        self.before_read().await?;
        Ok(self
            .tables
            .read()
            .members
            .iter()
            .filter(|m| m.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn campaign_territories(&self, campaign_id: Uuid) -> Result<Vec<Territory>> {
        self.before_read().await?;
        Ok(self
            .tables
            .read()
            .territories
            .values()
            .filter(|t| t.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn campaign_battles(&self, campaign_id: Uuid, limit: u32) -> Result<Vec<Battle>> {
        self.before_read().await?;
        let mut battles: Vec<Battle> = self
            .tables
            .read()
            .battles
            .values()
            .filter(|b| b.campaign_id == campaign_id)
            .cloned()
            .collect();
        battles.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(a.battle_id.cmp(&b.battle_id))
        });
        battles.truncate(limit as usize);
        Ok(battles)
    }

    async fn update_gang_rating(&self, gang_id: Uuid, rating: i64) -> Result<bool> {
        self.before_read().await?;
        Ok(self
            .tables
            .write()
            .gangs
            .get_mut(&gang_id)
            .map(|g| g.rating = rating)
            .is_some())
    }
}
