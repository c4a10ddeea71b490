//! Proptest strategies generating gang loadouts.
//!
//! Values stay far from the `i64` bounds so sums never saturate and plain
//! arithmetic can serve as the oracle.

use gangkeeper_core::models::{
    Effect, EffectPayload, EquipmentAssignment, Fighter, Gang, Owner, SkillGrant, Vehicle,
};
use gangkeeper_core::rating::{FighterLoadout, GangLoadout, VehicleLoadout};
use proptest::prelude::*;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct VehicleShape {
    pub cost: i64,
    pub equipment: Vec<i64>,
    /// `None` is an effect whose payload lacks `credits_increase`
    pub effects: Vec<Option<i64>>,
}

#[derive(Debug, Clone)]
pub struct FighterShape {
    pub credits: i64,
    pub cost_adjustment: i64,
    pub equipment: Vec<i64>,
    pub skills: Vec<i64>,
    pub effects: Vec<Option<i64>>,
    pub vehicles: Vec<VehicleShape>,
    /// killed, retired, enslaved, captured
    pub flags: [bool; 4],
}

#[derive(Debug, Clone)]
pub struct GangShape {
    pub fighters: Vec<FighterShape>,
    pub stored_vehicles: Vec<VehicleShape>,
}

fn cost() -> impl Strategy<Value = i64> {
    -50i64..300
}

fn effect_delta() -> impl Strategy<Value = Option<i64>> {
    proptest::option::weighted(0.8, -100i64..100)
}

pub fn vehicle_shape() -> impl Strategy<Value = VehicleShape> {
    (
        0i64..400,
        prop::collection::vec(cost(), 0..3),
        prop::collection::vec(effect_delta(), 0..3),
    )
        .prop_map(|(cost, equipment, effects)| VehicleShape {
            cost,
            equipment,
            effects,
        })
}

pub fn fighter_shape() -> impl Strategy<Value = FighterShape> {
    (
        0i64..500,
        -100i64..100,
        prop::collection::vec(cost(), 0..5),
        prop::collection::vec(0i64..60, 0..4),
        prop::collection::vec(effect_delta(), 0..3),
        prop::collection::vec(vehicle_shape(), 0..2),
        any::<[bool; 4]>(),
    )
        .prop_map(
            |(credits, cost_adjustment, equipment, skills, effects, vehicles, flags)| FighterShape {
                credits,
                cost_adjustment,
                equipment,
                skills,
                effects,
                vehicles,
                flags,
            },
        )
}

pub fn gang_shape() -> impl Strategy<Value = GangShape> {
    (
        prop::collection::vec(fighter_shape(), 0..8),
        prop::collection::vec(vehicle_shape(), 0..3),
    )
        .prop_map(|(fighters, stored_vehicles)| GangShape {
            fighters,
            stored_vehicles,
        })
}

/// JSON values that carry no usable credit figure
pub fn junk_credits() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        "[a-z]{1,8}".prop_map(Value::from),
        prop::collection::vec(any::<i32>(), 0..3).prop_map(|v| json!(v)),
        any::<i32>().prop_map(|n| json!({ "amount": n })),
    ]
}

fn effect(owner: Owner, delta: Option<i64>) -> Effect {
    let payload = match delta {
        Some(credits) => EffectPayload::with_credits(credits),
        None => EffectPayload::from_value(Some(json!({ "stat": "toughness" }))),
    };
    Effect::new(owner, "Generated effect", payload)
}

impl VehicleShape {
    pub fn expected_cost(&self) -> i64 {
        self.cost + self.equipment.iter().sum::<i64>() + self.effects.iter().flatten().sum::<i64>()
    }

    pub fn build(&self, vehicle: Vehicle) -> VehicleLoadout {
        let owner = Owner::Vehicle(vehicle.vehicle_id);
        let mut loadout = VehicleLoadout::new(vehicle);
        loadout.equipment = self
            .equipment
            .iter()
            .map(|&c| EquipmentAssignment::new(owner, "Generated gear", c))
            .collect();
        loadout.effects = self.effects.iter().map(|&d| effect(owner, d)).collect();
        loadout
    }
}

impl FighterShape {
    pub fn expected_cost(&self) -> i64 {
        self.credits
            + self.cost_adjustment
            + self.equipment.iter().sum::<i64>()
            + self.skills.iter().sum::<i64>()
            + self.effects.iter().flatten().sum::<i64>()
            + self.vehicles.iter().map(VehicleShape::expected_cost).sum::<i64>()
    }

    pub fn build(&self, gang: &Gang) -> FighterLoadout {
        let mut fighter = Fighter::new(gang.gang_id, "Generated fighter", self.credits);
        fighter.cost_adjustment = self.cost_adjustment;
        [fighter.killed, fighter.retired, fighter.enslaved, fighter.captured] = self.flags;

        let fighter_id = fighter.fighter_id;
        let owner = Owner::Fighter(fighter_id);
        let mut loadout = FighterLoadout::new(fighter);
        loadout.equipment = self
            .equipment
            .iter()
            .map(|&c| EquipmentAssignment::new(owner, "Generated gear", c))
            .collect();
        loadout.skills = self
            .skills
            .iter()
            .map(|&c| SkillGrant::new(fighter_id, "Generated skill", c))
            .collect();
        loadout.effects = self.effects.iter().map(|&d| effect(owner, d)).collect();
        loadout.vehicles = self
            .vehicles
            .iter()
            .map(|v| v.build(Vehicle::new(gang.gang_id, "Generated ride", v.cost).crewed_by(fighter_id)))
            .collect();
        loadout
    }
}

impl GangShape {
    pub fn build(&self) -> GangLoadout {
        let gang = Gang::new("Generated gang");
        let mut loadout = GangLoadout::new(gang.clone());
        loadout.fighters = self.fighters.iter().map(|f| f.build(&gang)).collect();
        loadout.gang_vehicles = self
            .stored_vehicles
            .iter()
            .map(|v| v.build(Vehicle::new(gang.gang_id, "Stored ride", v.cost)))
            .collect();
        loadout
    }
}
