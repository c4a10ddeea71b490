//! Materialised subtrees handed to the aggregator.
//!
//! A loadout owns every row the aggregator will read, so aggregation itself
//! never touches the store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Effect, EquipmentAssignment, Fighter, Gang, SkillGrant, Vehicle};

/// A vehicle with its nested equipment and effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleLoadout {
    pub vehicle: Vehicle,
    pub equipment: Vec<EquipmentAssignment>,
    pub effects: Vec<Effect>,
}

impl VehicleLoadout {
    pub fn new(vehicle: Vehicle) -> Self {
        Self {
            vehicle,
            equipment: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn vehicle_id(&self) -> Uuid {
        self.vehicle.vehicle_id
    }
}

/// A fighter with everything that contributes to its cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterLoadout {
    pub fighter: Fighter,
    pub equipment: Vec<EquipmentAssignment>,
    pub skills: Vec<SkillGrant>,
    pub effects: Vec<Effect>,
    /// Vehicles this fighter crews
    pub vehicles: Vec<VehicleLoadout>,
}

impl FighterLoadout {
    pub fn new(fighter: Fighter) -> Self {
        Self {
            fighter,
            equipment: Vec::new(),
            skills: Vec::new(),
            effects: Vec::new(),
            vehicles: Vec::new(),
        }
    }

    pub fn fighter_id(&self) -> Uuid {
        self.fighter.fighter_id
    }
}

/// A gang with every fighter (regardless of flags) and its gang-stored vehicles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GangLoadout {
    pub gang: Gang,
    pub fighters: Vec<FighterLoadout>,
    pub gang_vehicles: Vec<VehicleLoadout>,
}

impl GangLoadout {
    pub fn new(gang: Gang) -> Self {
        Self {
            gang,
            fighters: Vec::new(),
            gang_vehicles: Vec::new(),
        }
    }

    pub fn gang_id(&self) -> Uuid {
        self.gang.gang_id
    }
}
