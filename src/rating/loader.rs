//! Subtree Loader
//!
//! Fetches a fighter's or a gang's subtree from the [`EntityStore`] with a fixed
//! number of batched queries, independent of fighter count, and assembles the
//! loadouts the aggregator consumes. Used directly for uncached reads and as
//! the compute step behind every cached read.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::loadout::{FighterLoadout, GangLoadout, VehicleLoadout};
use crate::error::Result;
use crate::models::{Fighter, Vehicle};
use crate::store::EntityStore;

fn group_by<T>(rows: Vec<T>, key: impl Fn(&T) -> Option<Uuid>) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for row in rows {
        if let Some(id) = key(&row) {
            grouped.entry(id).or_default().push(row);
        }
    }
    grouped
}

#[derive(Clone)]
pub struct LoadoutLoader {
    store: Arc<dyn EntityStore>,
}

impl std::fmt::Debug for LoadoutLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadoutLoader").finish_non_exhaustive()
    }
}

impl LoadoutLoader {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Load one fighter's subtree; `None` if the fighter no longer exists
    pub async fn fighter_loadout(&self, fighter_id: Uuid) -> Result<Option<FighterLoadout>> {
        let Some(fighter) = self.store.fighter(fighter_id).await? else {
            debug!(fighter_id = %fighter_id, "Fighter not found, contributes nothing");
            return Ok(None);
        };
        let mut loadouts = self.fighter_loadouts(vec![fighter]).await?;
        Ok(loadouts.pop())
    }

    /// Load a gang's subtree: every fighter (flags untouched) plus gang-stored vehicles
    pub async fn gang_loadout(&self, gang_id: Uuid) -> Result<Option<GangLoadout>> {
        let Some(gang) = self.store.gang(gang_id).await? else {
            debug!(gang_id = %gang_id, "Gang not found, rating is zero");
            return Ok(None);
        };

        let (fighters, stored) = tokio::try_join!(
            self.store.fighters_for_gang(gang_id),
            self.store.gang_stored_vehicles(gang_id),
        )?;

        let mut loadout = GangLoadout::new(gang);
        loadout.fighters = self.fighter_loadouts(fighters).await?;
        loadout.gang_vehicles = self.vehicle_loadouts(stored).await?;
        Ok(Some(loadout))
    }

    /// Attach equipment, skills, effects and crewed vehicles to each fighter.
    /// Output order follows input order.
    pub async fn fighter_loadouts(&self, fighters: Vec<Fighter>) -> Result<Vec<FighterLoadout>> {
        if fighters.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = fighters.iter().map(|f| f.fighter_id).collect();

        let (equipment, skills, effects, vehicles) = tokio::try_join!(
            self.store.equipment_for_fighters(&ids),
            self.store.skills_for_fighters(&ids),
            self.store.effects_for_fighters(&ids),
            self.store.vehicles_for_fighters(&ids),
        )?;
        let vehicles = self.vehicle_loadouts(vehicles).await?;

        let mut equipment = group_by(equipment, |e| e.fighter_id);
        let mut skills = group_by(skills, |s| Some(s.fighter_id));
        let mut effects = group_by(effects, |e| e.fighter_id);
        let mut vehicles = group_by(vehicles, |v| v.vehicle.fighter_id);

        Ok(fighters
            .into_iter()
            .map(|fighter| {
                let id = fighter.fighter_id;
                FighterLoadout {
                    fighter,
                    equipment: equipment.remove(&id).unwrap_or_default(),
                    skills: skills.remove(&id).unwrap_or_default(),
                    effects: effects.remove(&id).unwrap_or_default(),
                    vehicles: vehicles.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }

    /// Attach equipment and effects to each vehicle, preserving input order
    pub async fn vehicle_loadouts(&self, vehicles: Vec<Vehicle>) -> Result<Vec<VehicleLoadout>> {
        if vehicles.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = vehicles.iter().map(|v| v.vehicle_id).collect();

        let (equipment, effects) = tokio::try_join!(
            self.store.equipment_for_vehicles(&ids),
            self.store.effects_for_vehicles(&ids),
        )?;
        let mut equipment = group_by(equipment, |e| e.vehicle_id);
        let mut effects = group_by(effects, |e| e.vehicle_id);

        Ok(vehicles
            .into_iter()
            .map(|vehicle| {
                let id = vehicle.vehicle_id;
                VehicleLoadout {
                    vehicle,
                    equipment: equipment.remove(&id).unwrap_or_default(),
                    effects: effects.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EquipmentAssignment, Gang, Owner};
    use crate::rating::aggregator::{compute_gang_rating, fighter_loadout_cost};
    use crate::rating::ExclusionPolicy;
    use crate::store::InMemoryEntityStore;

    #[tokio::test]
    async fn test_gang_loadout_assembles_subtree() {
        let store = InMemoryEntityStore::new();
        let gang = Gang::new("Delaque");
        let a = Fighter::new(gang.gang_id, "Shade", 100);
        let b = Fighter::new(gang.gang_id, "Whisper", 50);
        let crewed = Vehicle::new(gang.gang_id, "Skiff", 60).crewed_by(a.fighter_id);
        let stored = Vehicle::new(gang.gang_id, "Hauler", 30);

        store.write(|t| {
            t.insert_gang(gang.clone());
            t.insert_fighter(a.clone());
            t.insert_fighter(b.clone());
            t.insert_vehicle(crewed.clone());
            t.insert_vehicle(stored.clone());
            t.insert_equipment(EquipmentAssignment::new(
                Owner::Vehicle(crewed.vehicle_id),
                "Ram",
                10,
            ));
            t.insert_equipment(EquipmentAssignment::new(
                Owner::Fighter(b.fighter_id),
                "Web Pistol",
                5,
            ));
        });

        let loader = LoadoutLoader::new(Arc::new(store));
        let loadout = loader.gang_loadout(gang.gang_id).await.unwrap().unwrap();

        assert_eq!(loadout.fighters.len(), 2);
        assert_eq!(loadout.gang_vehicles.len(), 1);
        let rating = compute_gang_rating(
            &loadout.gang,
            &loadout.fighters,
            &loadout.gang_vehicles,
            ExclusionPolicy::gang_sheet(),
        );
        assert_eq!(rating, 100 + 60 + 10 + 50 + 5 + 30);
    }

    #[tokio::test]
    async fn test_missing_entities_load_as_none() {
        let loader = LoadoutLoader::new(Arc::new(InMemoryEntityStore::new()));
        assert!(loader.gang_loadout(Uuid::new_v4()).await.unwrap().is_none());
        assert!(loader.fighter_loadout(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fighter_loadout_ignores_other_fighters_rows() {
        let store = InMemoryEntityStore::new();
        let gang = Gang::new("Goliath");
        let a = Fighter::new(gang.gang_id, "Big", 120);
        let b = Fighter::new(gang.gang_id, "Bigger", 140);
        store.write(|t| {
            t.insert_gang(gang.clone());
            t.insert_fighter(a.clone());
            t.insert_fighter(b.clone());
            t.insert_equipment(EquipmentAssignment::new(
                Owner::Fighter(b.fighter_id),
                "Renderizer",
                50,
            ));
        });

        let loader = LoadoutLoader::new(Arc::new(store));
        let loadout = loader.fighter_loadout(a.fighter_id).await.unwrap().unwrap();
        assert!(loadout.equipment.is_empty());
        assert_eq!(fighter_loadout_cost(&loadout), 120);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let store = InMemoryEntityStore::new();
        store.set_unavailable(true);
        let loader = LoadoutLoader::new(Arc::new(store));
        assert!(loader.gang_loadout(Uuid::new_v4()).await.is_err());
    }
}
