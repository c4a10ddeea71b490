//! Concurrent misses for one key share a single computation.

mod common;

use common::World;
use gangkeeper_core::cache::tags::gang_rating_tags;
use gangkeeper_core::cache::{CacheKey, Computed, MemoryCacheService, ReadThroughCache};
use gangkeeper_core::ExclusionPolicy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

#[tokio::test]
async fn test_concurrent_misses_compute_once() {
    let world = World::new();
    let (gang, _) = world.worked_example();
    let service = world.service();

    // reads made by one uncached aggregation
    let baseline = world.store.read_count();
    service.compute_gang_rating_uncached(gang.gang_id).await.unwrap();
    let per_computation = world.store.read_count() - baseline;

    world.store.set_read_delay(Some(Duration::from_millis(20)));
    let before = world.store.read_count();

    let readers: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.get_gang_rating(gang.gang_id).await })
        })
        .collect();
    for reader in readers {
        assert_eq!(reader.await.unwrap().unwrap(), 135);
    }

    let stats = service.cache_stats();
    assert_eq!(stats.computations, 1);
    assert_eq!(world.store.read_count() - before, per_computation);
    assert_eq!(service.cache().in_flight(), 0);
}

#[tokio::test]
async fn test_computation_survives_cancelled_caller() {
    let world = World::new();
    let (gang, _) = world.worked_example();
    let service = world.service();
    world.store.set_read_delay(Some(Duration::from_millis(20)));

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.get_gang_rating(gang.gang_id).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    first.abort();

    // the joined flight still completes and is stored
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 135);
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 135);
    assert_eq!(service.cache_stats().computations, 1);
}

#[tokio::test]
async fn test_reader_after_purge_does_not_join_stale_flight() {
    let cache = ReadThroughCache::new(MemoryCacheService::new());
    let gang_id = Uuid::new_v4();
    let key = CacheKey::gang_rating(gang_id, ExclusionPolicy::gang_sheet());
    let (started_tx, started) = oneshot::channel::<()>();
    let (release, hold) = oneshot::channel::<()>();

    let stale = {
        let cache = cache.clone();
        let key = key.clone();
        tokio::spawn(async move {
            cache
                .get_or_compute(&key, gang_rating_tags(gang_id), move || async move {
                    let _ = started_tx.send(());
                    let _ = hold.await;
                    Ok(Computed::untagged(135i64))
                })
                .await
        })
    };
    started.await.unwrap();
    assert_eq!(cache.in_flight(), 1);

    cache.purge_tags(&gang_rating_tags(gang_id)).await.unwrap();

    let fresh: i64 = cache
        .get_or_compute(&key, gang_rating_tags(gang_id), || async {
            Ok(Computed::untagged(200i64))
        })
        .await
        .unwrap();
    assert_eq!(fresh, 200);

    release.send(()).unwrap();
    assert_eq!(stale.await.unwrap().unwrap(), 135);

    // the stale result was refused; the fresh one stays
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let cached: i64 = cache
        .get_or_compute(&key, gang_rating_tags(gang_id), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Computed::untagged(0i64))
        })
        .await
        .unwrap();
    assert_eq!(cached, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(cache.stats().stale_rejects, 1);
}

#[tokio::test]
async fn test_failed_computation_reaches_all_waiters_and_is_not_cached() {
    let world = World::new();
    let (gang, _) = world.worked_example();
    let service = world.service();
    world.store.set_read_delay(Some(Duration::from_millis(10)));
    world.store.set_unavailable(true);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.get_gang_rating(gang.gang_id).await })
        })
        .collect();
    for reader in readers {
        assert!(reader.await.unwrap().is_err());
    }

    world.store.set_unavailable(false);
    assert_eq!(service.get_gang_rating(gang.gang_id).await.unwrap(), 135);
}
