//! Builders that write entity rows into an [`InMemoryEntityStore`].

use chrono::{Duration, Utc};
use gangkeeper_core::models::{
    Battle, Campaign, Effect, EffectPayload, EquipmentAssignment, Fighter, Gang, Owner,
    SkillGrant, Territory, Vehicle,
};
use gangkeeper_core::{InMemoryEntityStore, RatingService};
use uuid::Uuid;

/// An entity store plus helpers to populate it
#[derive(Debug, Clone, Default)]
pub struct World {
    pub store: InMemoryEntityStore,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(&self) -> RatingService {
        super::memory_service(&self.store)
    }

    pub fn gang(&self, name: &str) -> Gang {
        let gang = Gang::new(name);
        self.store.write(|t| t.insert_gang(gang.clone()));
        gang
    }

    pub fn fighter(&self, gang_id: Uuid, name: &str, credits: i64) -> Fighter {
        let fighter = Fighter::new(gang_id, name, credits);
        self.store.write(|t| t.insert_fighter(fighter.clone()));
        fighter
    }

    /// Rewrite a fighter row in place
    pub fn update_fighter(&self, fighter_id: Uuid, change: impl FnOnce(&mut Fighter)) {
        self.store.write(|t| {
            if let Some(fighter) = t.fighters.get_mut(&fighter_id) {
                change(fighter);
            }
        });
    }

    pub fn equipment(&self, owner: Owner, name: &str, cost: i64) -> EquipmentAssignment {
        let item = EquipmentAssignment::new(owner, name, cost);
        self.store.write(|t| t.insert_equipment(item.clone()));
        item
    }

    pub fn remove_equipment(&self, equipment_id: Uuid) {
        self.store.write(|t| t.equipment.remove(&equipment_id));
    }

    pub fn skill(&self, fighter_id: Uuid, name: &str, credits_increase: i64) -> SkillGrant {
        let skill = SkillGrant::new(fighter_id, name, credits_increase);
        self.store.write(|t| t.insert_skill(skill.clone()));
        skill
    }

    pub fn effect(&self, owner: Owner, name: &str, payload: EffectPayload) -> Effect {
        let effect = Effect::new(owner, name, payload);
        self.store.write(|t| t.insert_effect(effect.clone()));
        effect
    }

    pub fn vehicle(&self, gang_id: Uuid, name: &str, cost: i64, crew: Option<Uuid>) -> Vehicle {
        let vehicle = Vehicle::new(gang_id, name, cost);
        let vehicle = match crew {
            Some(fighter_id) => vehicle.crewed_by(fighter_id),
            None => vehicle,
        };
        self.store.write(|t| t.insert_vehicle(vehicle.clone()));
        vehicle
    }

    /// Move a vehicle to another crew member, or into gang storage
    pub fn assign_crew(&self, vehicle_id: Uuid, crew: Option<Uuid>) {
        self.store.write(|t| {
            if let Some(vehicle) = t.vehicles.get_mut(&vehicle_id) {
                vehicle.fighter_id = crew;
            }
        });
    }

    pub fn campaign(&self, name: &str) -> Campaign {
        let campaign = Campaign::new(name);
        self.store.write(|t| t.insert_campaign(campaign.clone()));
        campaign
    }

    pub fn join(&self, campaign_id: Uuid, gang_id: Uuid) {
        self.store.write(|t| t.add_member(campaign_id, gang_id, None));
    }

    pub fn leave(&self, campaign_id: Uuid, gang_id: Uuid) {
        self.store.write(|t| t.remove_member(campaign_id, gang_id));
    }

    pub fn territory(&self, campaign_id: Uuid, name: &str, holder: Option<Uuid>) -> Territory {
        let territory = Territory {
            territory_id: Uuid::new_v4(),
            campaign_id,
            territory_name: name.to_string(),
            gang_id: holder,
        };
        self.store.write(|t| t.insert_territory(territory.clone()));
        territory
    }

    /// Battle fought `minutes_ago` minutes in the past
    pub fn battle(&self, campaign_id: Uuid, winner: Option<Uuid>, minutes_ago: i64) -> Battle {
        let battle = Battle {
            battle_id: Uuid::new_v4(),
            campaign_id,
            attacker_id: winner,
            defender_id: None,
            winner_id: winner,
            scenario: Some("Border Dispute".to_string()),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        };
        self.store.write(|t| t.insert_battle(battle.clone()));
        battle
    }

    /// The worked example: one fighter (100) with a lasgun (15) and a skill
    /// (20), rating 135 under the gang sheet policy
    pub fn worked_example(&self) -> (Gang, Fighter) {
        let gang = self.gang("Goliath Forgeborn");
        let fighter = self.fighter(gang.gang_id, "Krask", 100);
        self.equipment(Owner::Fighter(fighter.fighter_id), "Lasgun", 15);
        self.skill(fighter.fighter_id, "Nerves of Steel", 20);
        (gang, fighter)
    }
}
