//! # Cost Aggregator
//!
//! Pure, deterministic summation over already-fetched rows. Nothing here
//! performs I/O or fails: a missing or malformed effect `credits_increase`
//! contributes 0, and all arithmetic saturates at the `i64` bounds.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::loadout::{FighterLoadout, GangLoadout, VehicleLoadout};
use super::ExclusionPolicy;
use crate::models::{Effect, EquipmentAssignment, Fighter, Gang, SkillGrant, Vehicle};

fn saturating_sum(values: impl IntoIterator<Item = i64>) -> i64 {
    values.into_iter().fold(0i64, i64::saturating_add)
}

fn equipment_total(equipment: &[EquipmentAssignment]) -> i64 {
    saturating_sum(equipment.iter().map(|e| e.purchase_cost))
}

fn skills_total(skills: &[SkillGrant]) -> i64 {
    saturating_sum(skills.iter().map(|s| s.credits_increase))
}

fn effects_total(effects: &[Effect]) -> i64 {
    saturating_sum(effects.iter().map(Effect::credits_delta))
}

/// Base cost plus all equipment (whatever its type) plus effect deltas
pub fn compute_vehicle_cost(
    vehicle: &Vehicle,
    equipment: &[EquipmentAssignment],
    effects: &[Effect],
) -> i64 {
    vehicle
        .cost
        .saturating_add(equipment_total(equipment))
        .saturating_add(effects_total(effects))
}

pub fn vehicle_loadout_cost(loadout: &VehicleLoadout) -> i64 {
    compute_vehicle_cost(&loadout.vehicle, &loadout.equipment, &loadout.effects)
}

/// Total cost of one fighter, including every vehicle it crews.
///
/// Lifecycle flags are ignored here; exclusion is a gang-rating concern.
pub fn compute_fighter_cost(
    fighter: &Fighter,
    equipment: &[EquipmentAssignment],
    skills: &[SkillGrant],
    effects: &[Effect],
    vehicles: &[VehicleLoadout],
) -> i64 {
    fighter
        .credits
        .saturating_add(fighter.cost_adjustment)
        .saturating_add(equipment_total(equipment))
        .saturating_add(skills_total(skills))
        .saturating_add(effects_total(effects))
        .saturating_add(saturating_sum(vehicles.iter().map(vehicle_loadout_cost)))
}

pub fn fighter_loadout_cost(loadout: &FighterLoadout) -> i64 {
    compute_fighter_cost(
        &loadout.fighter,
        &loadout.equipment,
        &loadout.skills,
        &loadout.effects,
        &loadout.vehicles,
    )
}

/// Sum of every fighter the policy keeps plus every gang-stored vehicle.
///
/// Excluded fighters are omitted together with the vehicles they crew.
/// Entries of `gang_vehicles` that have a crew are skipped; crewed vehicles are
/// counted through their fighter.
pub fn compute_gang_rating(
    _gang: &Gang,
    fighters: &[FighterLoadout],
    gang_vehicles: &[VehicleLoadout],
    policy: ExclusionPolicy,
) -> i64 {
    let fighters_total = saturating_sum(
        fighters
            .iter()
            .filter(|f| !policy.excludes(&f.fighter))
            .map(fighter_loadout_cost),
    );
    let stored_total = saturating_sum(
        gang_vehicles
            .iter()
            .filter(|v| v.vehicle.is_gang_stored())
            .map(vehicle_loadout_cost),
    );
    fighters_total.saturating_add(stored_total)
}

pub fn gang_loadout_rating(loadout: &GangLoadout, policy: ExclusionPolicy) -> i64 {
    compute_gang_rating(
        &loadout.gang,
        &loadout.fighters,
        &loadout.gang_vehicles,
        policy,
    )
}

/// Per-component view of a fighter's cost for the fighter detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub fighter_id: Uuid,
    pub base_credits: i64,
    pub cost_adjustment: i64,
    pub equipment: i64,
    pub skills: i64,
    pub effects: i64,
    /// Per crewed vehicle, in loadout order
    pub vehicles: Vec<(Uuid, i64)>,
    pub total: i64,
}

impl CostBreakdown {
    pub fn from_loadout(loadout: &FighterLoadout) -> Self {
        let fighter = &loadout.fighter;
        Self {
            fighter_id: fighter.fighter_id,
            base_credits: fighter.credits,
            cost_adjustment: fighter.cost_adjustment,
            equipment: equipment_total(&loadout.equipment),
            skills: skills_total(&loadout.skills),
            effects: effects_total(&loadout.effects),
            vehicles: loadout
                .vehicles
                .iter()
                .map(|v| (v.vehicle_id(), vehicle_loadout_cost(v)))
                .collect(),
            total: fighter_loadout_cost(loadout),
        }
    }

    pub fn vehicles_total(&self) -> i64 {
        saturating_sum(self.vehicles.iter().map(|&(_, cost)| cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EffectPayload, Owner};
    use serde_json::json;

    fn gang_with_fighter(credits: i64) -> (Gang, FighterLoadout) {
        let gang = Gang::new("Orlocks");
        let fighter = Fighter::new(gang.gang_id, "Dreg", credits);
        (gang, FighterLoadout::new(fighter))
    }

    fn rating(loadout: &GangLoadout, policy: ExclusionPolicy) -> i64 {
        gang_loadout_rating(loadout, policy)
    }

    #[test]
    fn test_worked_example() {
        let (gang, mut f) = gang_with_fighter(100);
        let fid = f.fighter_id();
        f.equipment
            .push(EquipmentAssignment::new(Owner::Fighter(fid), "Lasgun", 25));
        f.skills.push(SkillGrant::new(fid, "Nerves of Steel", 10));
        assert_eq!(fighter_loadout_cost(&f), 135);

        let vehicle = Vehicle::new(gang.gang_id, "Cargo-8 Ridgehauler", 50).crewed_by(fid);
        let mut v = VehicleLoadout::new(vehicle.clone());
        v.equipment.push(EquipmentAssignment::new(
            Owner::Vehicle(vehicle.vehicle_id),
            "Heavy Stubber",
            15,
        ));
        f.vehicles.push(v);
        assert_eq!(fighter_loadout_cost(&f), 200);

        let mut loadout = GangLoadout::new(gang);
        loadout.fighters.push(f);
        assert_eq!(rating(&loadout, ExclusionPolicy::gang_sheet()), 200);

        loadout.fighters[0].fighter.killed = true;
        assert_eq!(rating(&loadout, ExclusionPolicy::gang_sheet()), 0);
    }

    #[test]
    fn test_effect_deltas_and_missing_field() {
        let (_, mut f) = gang_with_fighter(100);
        let owner = Owner::Fighter(f.fighter_id());
        f.effects.push(Effect::new(
            owner,
            "Bionic Arm",
            EffectPayload::from_value(Some(json!({"modifiers": []}))),
        ));
        assert_eq!(fighter_loadout_cost(&f), 100);

        f.effects
            .push(Effect::new(owner, "Head Wound", EffectPayload::with_credits(-50)));
        assert_eq!(fighter_loadout_cost(&f), 50);

        f.effects.push(Effect::new(
            owner,
            "Typo",
            EffectPayload::from_value(Some(json!({"credits_increase": "a lot"}))),
        ));
        assert_eq!(fighter_loadout_cost(&f), 50);
    }

    #[test]
    fn test_gang_stored_vehicles_count_once() {
        let gang = Gang::new("Van Saar");
        let fighter = Fighter::new(gang.gang_id, "Prime", 120);
        let fid = fighter.fighter_id;

        let mut f = FighterLoadout::new(fighter);
        let crewed = Vehicle::new(gang.gang_id, "Quad", 40).crewed_by(fid);
        f.vehicles.push(VehicleLoadout::new(crewed.clone()));

        let stored = Vehicle::new(gang.gang_id, "Wagon", 90);
        let mut loadout = GangLoadout::new(gang);
        loadout.fighters.push(f);
        loadout.gang_vehicles.push(VehicleLoadout::new(stored));
        // a crewed vehicle passed as gang-stored must not be counted twice
        loadout.gang_vehicles.push(VehicleLoadout::new(crewed));

        assert_eq!(rating(&loadout, ExclusionPolicy::gang_sheet()), 120 + 40 + 90);
    }

    #[test]
    fn test_policy_selects_fighters() {
        let gang = Gang::new("Cawdor");
        let mut loadout = GangLoadout::new(gang.clone());
        for (name, credits, flag) in [
            ("a", 10, None),
            ("b", 20, Some("captured")),
            ("c", 40, Some("retired")),
            ("d", 80, Some("enslaved")),
        ] {
            let mut fighter = Fighter::new(gang.gang_id, name, credits);
            match flag {
                Some("captured") => fighter.captured = true,
                Some("retired") => fighter.retired = true,
                Some("enslaved") => fighter.enslaved = true,
                _ => {}
            }
            loadout.fighters.push(FighterLoadout::new(fighter));
        }

        assert_eq!(rating(&loadout, ExclusionPolicy::gang_sheet()), 30);
        assert_eq!(rating(&loadout, ExclusionPolicy::campaign()), 10);
        assert_eq!(rating(&loadout, ExclusionPolicy::none()), 150);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let (_, mut f) = gang_with_fighter(i64::MAX);
        let fid = f.fighter_id();
        f.skills.push(SkillGrant::new(fid, "Overflow", 1));
        assert_eq!(fighter_loadout_cost(&f), i64::MAX);
    }

    #[test]
    fn test_breakdown_matches_total() {
        let (gang, mut f) = gang_with_fighter(65);
        let fid = f.fighter_id();
        f.fighter.cost_adjustment = -5;
        f.equipment
            .push(EquipmentAssignment::new(Owner::Fighter(fid), "Autogun", 15));
        f.skills.push(SkillGrant::new(fid, "Free Skill", 0));
        f.effects.push(Effect::new(
            Owner::Fighter(fid),
            "Promotion",
            EffectPayload::with_credits(20),
        ));
        f.vehicles.push(VehicleLoadout::new(
            Vehicle::new(gang.gang_id, "Bike", 30).crewed_by(fid),
        ));

        let breakdown = CostBreakdown::from_loadout(&f);
        assert_eq!(breakdown.equipment, 15);
        assert_eq!(breakdown.vehicles_total(), 30);
        assert_eq!(breakdown.total, 125);
        assert_eq!(
            breakdown.base_credits
                + breakdown.cost_adjustment
                + breakdown.equipment
                + breakdown.skills
                + breakdown.effects
                + breakdown.vehicles_total(),
            breakdown.total
        );
    }
}
