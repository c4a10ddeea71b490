//! Every mutation followed by its invalidation call is visible on the next read.

mod common;

use common::World;
use gangkeeper_core::cache::MemoryCacheService;
use gangkeeper_core::models::{EffectPayload, Gang, Owner};
use gangkeeper_core::{EntityChange, EntityKind, MembershipChange, ParentIds};
use serde_json::json;

#[tokio::test]
async fn test_worked_example_through_the_service() {
    let world = World::new();
    let service = world.service();
    let (gang, fighter) = world.worked_example();
    let fid = fighter.fighter_id;

    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 135);

    world.effect(
        Owner::Fighter(fid),
        "Bionic Arm",
        EffectPayload::from_value(Some(json!({ "credits_increase": 65 }))),
    );
    service
        .invalidate_effect(uuid::Uuid::new_v4(), ParentIds::fighter(fid, gang.gang_id))
        .await;
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 200);

    // effect without a credit figure
    world.effect(
        Owner::Fighter(fid),
        "Head Wound",
        EffectPayload::from_value(Some(json!({ "stat": "leadership" }))),
    );
    service
        .invalidate_effect(uuid::Uuid::new_v4(), ParentIds::fighter(fid, gang.gang_id))
        .await;
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 200);

    world.update_fighter(fid, |f| f.killed = true);
    service.invalidate_fighter(fid, gang.gang_id).await;
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 0);

    // the fighter's own cost ignores lifecycle flags
    assert_eq!(service.get_fighter_total_cost(fid).await.unwrap(), 200);
}

#[tokio::test]
async fn test_reads_are_served_from_cache_until_invalidated() {
    let world = World::new();
    let service = world.service();
    let (gang, fighter) = world.worked_example();

    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 135);
    world.equipment(Owner::Fighter(fighter.fighter_id), "Frag Grenades", 30);

    // committed but not yet invalidated
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 135);

    service
        .invalidate_equipment(
            uuid::Uuid::new_v4(),
            ParentIds::fighter(fighter.fighter_id, gang.gang_id),
        )
        .await;
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 165);
    assert_eq!(
        service.get_fighter_total_cost(fighter.fighter_id).await.unwrap(),
        165
    );
}

#[tokio::test]
async fn test_equipment_sale_and_skill_grant() {
    let world = World::new();
    let service = world.service();
    let (gang, fighter) = world.worked_example();
    let fid = fighter.fighter_id;
    let sword = world.equipment(Owner::Fighter(fid), "Chainsword", 25);

    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 160);
    let breakdown = service.get_fighter_cost_breakdown(fid).await.unwrap().unwrap();
    assert_eq!(breakdown.equipment, 40);

    world.remove_equipment(sword.fighter_equipment_id);
    service
        .invalidate_equipment(sword.fighter_equipment_id, ParentIds::fighter(fid, gang.gang_id))
        .await;
    let skill = world.skill(fid, "True Grit", 10);
    service
        .invalidate_skill(skill.fighter_skill_id, fid, gang.gang_id)
        .await;

    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 145);
    let breakdown = service.get_fighter_cost_breakdown(fid).await.unwrap().unwrap();
    assert_eq!(breakdown.equipment, 15);
    assert_eq!(breakdown.skills, 30);
    assert_eq!(breakdown.total, 145);
}

#[tokio::test]
async fn test_vehicle_reassignment_updates_both_crews() {
    let world = World::new();
    let service = world.service();
    let gang = world.gang("Road Wardens");
    let driver = world.fighter(gang.gang_id, "Driver", 60);
    let gunner = world.fighter(gang.gang_id, "Gunner", 50);
    let bike = world.vehicle(gang.gang_id, "Wolfquad", 120, Some(driver.fighter_id));
    world.equipment(Owner::Vehicle(bike.vehicle_id), "Ram", 20);

    assert_eq!(service.get_fighter_total_cost(driver.fighter_id).await.unwrap(), 200);
    assert_eq!(service.get_fighter_total_cost(gunner.fighter_id).await.unwrap(), 50);
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 250);

    world.assign_crew(bike.vehicle_id, Some(gunner.fighter_id));
    service
        .invalidate_vehicle(bike.vehicle_id, gang.gang_id, Some(gunner.fighter_id))
        .await;

    assert_eq!(service.get_fighter_total_cost(driver.fighter_id).await.unwrap(), 60);
    assert_eq!(service.get_fighter_total_cost(gunner.fighter_id).await.unwrap(), 190);
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 250);

    // into storage: still counted once, through the gang
    world.assign_crew(bike.vehicle_id, None);
    service
        .invalidate_vehicle(bike.vehicle_id, gang.gang_id, None)
        .await;
    assert_eq!(service.get_fighter_total_cost(gunner.fighter_id).await.unwrap(), 50);
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 250);
}

#[tokio::test]
async fn test_vehicle_effect_reaches_crew_and_gang() {
    let world = World::new();
    let service = world.service();
    let gang = world.gang("Ash Riders");
    let driver = world.fighter(gang.gang_id, "Driver", 60);
    let bike = world.vehicle(gang.gang_id, "Outrider", 100, Some(driver.fighter_id));

    assert_eq!(service.get_fighter_total_cost(driver.fighter_id).await.unwrap(), 160);
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 160);

    let damage = world.effect(
        Owner::Vehicle(bike.vehicle_id),
        "Engine Damage",
        EffectPayload::with_credits(-40),
    );
    service
        .invalidate_effect(
            damage.fighter_effect_id,
            ParentIds::vehicle(bike.vehicle_id, gang.gang_id, Some(driver.fighter_id)),
        )
        .await;

    assert_eq!(service.get_fighter_total_cost(driver.fighter_id).await.unwrap(), 120);
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 120);
}

#[tokio::test]
async fn test_new_fighter_and_stored_vehicle() {
    let world = World::new();
    let service = world.service();
    let (gang, _) = world.worked_example();
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 135);

    let recruit = world.fighter(gang.gang_id, "Juve", 25);
    service.invalidate_fighter(recruit.fighter_id, gang.gang_id).await;
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 160);

    let hauler = world.vehicle(gang.gang_id, "Cargo-8", 90, None);
    service
        .invalidate_vehicle(hauler.vehicle_id, gang.gang_id, None)
        .await;
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 250);
}

#[tokio::test]
async fn test_invalidation_leaves_other_gangs_cached() {
    let world = World::new();
    let service = world.service();
    let (first, fighter) = world.worked_example();
    let (second, _) = world.worked_example();

    service.get_gang_rating(first.gang_id).await.unwrap();
    service.get_gang_rating(second.gang_id).await.unwrap();
    let before = service.cache_stats();

    service.invalidate_fighter(fighter.fighter_id, first.gang_id).await;
    service.get_gang_rating(first.gang_id).await.unwrap();
    service.get_gang_rating(second.gang_id).await.unwrap();

    let after = service.cache_stats();
    assert_eq!(after.misses - before.misses, 1);
    assert_eq!(after.hits - before.hits, 1);
}

#[tokio::test]
async fn test_campaign_overview_tracks_membership_and_ratings() {
    let world = World::new();
    let service = world.service();
    let campaign = world.campaign("Dominion");
    let (first, first_fighter) = world.worked_example();
    let (second, _) = world.worked_example();
    world.join(campaign.campaign_id, first.gang_id);

    let overview = service
        .get_campaign_overview(campaign.campaign_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(overview.members.len(), 1);
    assert_eq!(overview.ratings.get(&first.gang_id), Some(&135));

    world.join(campaign.campaign_id, second.gang_id);
    service
        .invalidate_campaign_membership(campaign.campaign_id, second.gang_id, MembershipChange::Joined)
        .await;
    let overview = service
        .get_campaign_overview(campaign.campaign_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(overview.members.len(), 2);
    assert_eq!(overview.ratings.get(&second.gang_id), Some(&135));

    // a member's rating change reaches the overview through the index
    world.skill(first_fighter.fighter_id, "Iron Jaw", 15);
    service
        .invalidate_skill(uuid::Uuid::new_v4(), first_fighter.fighter_id, first.gang_id)
        .await;
    let overview = service
        .get_campaign_overview(campaign.campaign_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(overview.ratings.get(&first.gang_id), Some(&150));

    world.leave(campaign.campaign_id, first.gang_id);
    service
        .invalidate_campaign_membership(campaign.campaign_id, first.gang_id, MembershipChange::Left)
        .await;
    let overview = service
        .get_campaign_overview(campaign.campaign_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(overview.member_ids().collect::<Vec<_>>(), vec![second.gang_id]);
    assert!(!overview.ratings.contains_key(&first.gang_id));
}

#[tokio::test]
async fn test_campaign_overview_uses_campaign_policy() {
    let world = World::new();
    let service = world.service();
    let campaign = world.campaign("Uprising");
    let (gang, fighter) = world.worked_example();
    world.update_fighter(fighter.fighter_id, |f| f.captured = true);
    world.join(campaign.campaign_id, gang.gang_id);

    // captured fighters stay on the gang sheet but not in campaign ratings
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 135);
    let overview = service
        .get_campaign_overview(campaign.campaign_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(overview.ratings.get(&gang.gang_id), Some(&0));
}

#[tokio::test]
async fn test_territory_and_battle_changes_refresh_overview() {
    let world = World::new();
    let service = world.service();
    let campaign = world.campaign("Ash Wastes");
    let (gang, _) = world.worked_example();
    world.join(campaign.campaign_id, gang.gang_id);
    world.battle(campaign.campaign_id, Some(gang.gang_id), 30);

    let overview = service
        .get_campaign_overview(campaign.campaign_id)
        .await
        .unwrap()
        .unwrap();
    assert!(overview.territories.is_empty());
    assert_eq!(overview.battles.len(), 1);

    let territory = world.territory(campaign.campaign_id, "Old Ruins", Some(gang.gang_id));
    service
        .invalidate(EntityChange::new(
            EntityKind::Territory,
            territory.territory_id,
            ParentIds::campaign(campaign.campaign_id),
        ))
        .await;
    let latest = world.battle(campaign.campaign_id, None, 1);
    service
        .invalidate(EntityChange::new(
            EntityKind::Battle,
            latest.battle_id,
            ParentIds::campaign(campaign.campaign_id),
        ))
        .await;

    let overview = service
        .get_campaign_overview(campaign.campaign_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(overview.territories, vec![territory]);
    assert_eq!(overview.battles.len(), 2);
    assert_eq!(overview.battles[0].battle_id, latest.battle_id);
}

#[tokio::test]
async fn test_unknown_entities_read_as_empty() {
    let world = World::new();
    let service = world.service();
    let missing = uuid::Uuid::new_v4();

    assert_eq!(service.get_gang_rating(missing).await.unwrap(), 0);
    assert_eq!(service.get_fighter_total_cost(missing).await.unwrap(), 0);
    assert!(service.get_fighter_cost_breakdown(missing).await.unwrap().is_none());
    assert!(service.get_campaign_overview(missing).await.unwrap().is_none());

    // creating the gang later is picked up after its invalidation
    world.store.write(|t| {
        t.insert_gang(Gang {
            gang_id: missing,
            ..Gang::new("Late Arrivals")
        })
    });
    world.fighter(missing, "First", 40);
    assert_eq!(service.get_gang_rating(missing).await.unwrap(), 0);

    service.invalidate_gang(missing).await;
    assert_eq!(service.get_gang_rating(missing).await.unwrap(), 40);
}

#[tokio::test]
async fn test_bust_computed_drops_every_aggregate() {
    let world = World::new();
    let service = common::service_with(&world.store, MemoryCacheService::new());
    let (gang, fighter) = world.worked_example();

    service.get_gang_rating(gang.gang_id).await.unwrap();
    service.get_fighter_total_cost(fighter.fighter_id).await.unwrap();
    assert_eq!(service.cache().backend().len(), 2);

    let report = service.bust_computed().await;
    assert!(report.succeeded);
    assert_eq!(report.purged_entries, 2);
    assert!(service.cache().backend().is_empty());
}

#[tokio::test]
async fn test_invalidation_is_idempotent() {
    let world = World::new();
    let service = world.service();
    let (gang, fighter) = world.worked_example();
    service.get_gang_rating(gang.gang_id).await.unwrap();

    let first = service.invalidate_fighter(fighter.fighter_id, gang.gang_id).await;
    let second = service.invalidate_fighter(fighter.fighter_id, gang.gang_id).await;

    assert!(first.succeeded && second.succeeded);
    assert_eq!(first.tags, second.tags);
    assert_eq!(first.purged_entries, 1);
    assert_eq!(second.purged_entries, 0);
}
