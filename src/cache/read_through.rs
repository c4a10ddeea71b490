//! # Read-Through Cache Layer
//!
//! `get_or_compute(key, tags, compute)` over any [`CacheService`]:
//!
//! - Hit: the stored JSON is decoded and returned.
//! - Miss: `compute` runs in a spawned task behind a shared future; concurrent
//!   misses for the same key join it instead of computing again. The task
//!   finishes and populates the cache even if every caller goes away.
//! - Lookup failure: the value is computed directly and not stored (bypass).
//! - Insert failure: logged, the computed value is still returned.
//!
//! Entries never expire. Two rules keep a computation that raced an
//! invalidation from serving or storing pre-mutation data:
//!
//! 1. The backend epoch is read before computing and passed as the insert
//!    fence, so the backend refuses the write if any of the entry's tags was
//!    purged in between.
//! 2. A reader never joins a computation that started before the latest purge
//!    issued through this layer.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

use super::errors::CacheResult;
use super::keys::CacheKey;
use super::provider::CacheProvider;
use super::stats::{CacheStats, CacheStatsSnapshot};
use super::tags::TagSet;
use super::traits::{CacheService, InsertOutcome};
use crate::error::{GangkeeperError, Result};
use crate::logging::log_cache_operation;

/// A computed value plus the tags discovered while computing it
#[derive(Debug, Clone, PartialEq)]
pub struct Computed<T> {
    pub value: T,
    pub tags: TagSet,
}

impl<T> Computed<T> {
    pub fn new(value: T, tags: TagSet) -> Self {
        Self { value, tags }
    }

    /// Value whose tags are fully covered by the static tags of the call
    pub fn untagged(value: T) -> Self {
        Self::new(value, TagSet::new())
    }
}

type FlightFuture = Shared<BoxFuture<'static, Result<String>>>;

struct InFlight {
    generation: u64,
    started_at_purge: u64,
    future: FlightFuture,
}

#[derive(Clone)]
pub struct ReadThroughCache<C = CacheProvider> {
    backend: C,
    inflight: Arc<DashMap<String, InFlight>>,
    generations: Arc<AtomicU64>,
    purges: Arc<AtomicU64>,
    stats: Arc<CacheStats>,
}

impl<C: CacheService> std::fmt::Debug for ReadThroughCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("provider", &self.backend.provider_name())
            .field("in_flight", &self.inflight.len())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl<C> ReadThroughCache<C>
where
    C: CacheService + Clone + 'static,
{
    pub fn new(backend: C) -> Self {
        Self {
            backend,
            inflight: Arc::new(DashMap::new()),
            generations: Arc::new(AtomicU64::new(0)),
            purges: Arc::new(AtomicU64::new(0)),
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Computations currently running
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Return the cached value for `key`, or compute, store and return it.
    ///
    /// The stored entry carries `tags` plus whatever tags `compute` reports.
    /// Errors from `compute` reach every waiter and are never cached.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &CacheKey,
        tags: TagSet,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Computed<T>>> + Send + 'static,
    {
        match self.backend.get(key.as_str()).await {
            Ok(Some(payload)) => match serde_json::from_str::<T>(&payload) {
                Ok(value) => {
                    self.stats.record_hit();
                    log_cache_operation("get", key.as_str(), "hit", None);
                    return Ok(value);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Undecodable cache entry, recomputing");
                }
            },
            Ok(None) => {}
            Err(e) => {
                self.stats.record_bypass();
                warn!(
                    key = %key,
                    provider = self.backend.provider_name(),
                    error = %e,
                    "Cache lookup failed, computing without cache"
                );
                return compute().await.map(|computed| computed.value);
            }
        }

        self.stats.record_miss();
        log_cache_operation("get", key.as_str(), "miss", None);

        let payload = self.join_or_start(key, tags, compute).await?;
        Ok(serde_json::from_str(&payload)?)
    }

    fn join_or_start<T, F, Fut>(&self, key: &CacheKey, tags: TagSet, compute: F) -> FlightFuture
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Computed<T>>> + Send + 'static,
    {
        let purge_mark = self.purges.load(Ordering::SeqCst);

        match self.inflight.entry(key.to_string()) {
            Entry::Occupied(entry) if entry.get().started_at_purge == purge_mark => {
                self.stats.record_joined();
                log_cache_operation("single_flight", key.as_str(), "joined", None);
                entry.get().future.clone()
            }
            entry => {
                let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                let future = self.start_flight(key.to_string(), generation, tags, compute);
                let flight = InFlight {
                    generation,
                    started_at_purge: purge_mark,
                    future: future.clone(),
                };
                match entry {
                    Entry::Occupied(mut occupied) => {
                        occupied.insert(flight);
                    }
                    Entry::Vacant(vacant) => {
                        vacant.insert(flight);
                    }
                }
                future
            }
        }
    }

    fn start_flight<T, F, Fut>(
        &self,
        key: String,
        generation: u64,
        tags: TagSet,
        compute: F,
    ) -> FlightFuture
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Computed<T>>> + Send + 'static,
    {
        let backend = self.backend.clone();
        let inflight = Arc::clone(&self.inflight);
        let stats = Arc::clone(&self.stats);
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let result = compute_and_store(&backend, &stats, &task_key, tags, compute).await;
            inflight.remove_if(&task_key, |_, flight| flight.generation == generation);
            result
        });

        async move {
            handle.await.map_err(|e| {
                GangkeeperError::CacheError(format!("computation for {key} did not complete: {e}"))
            })?
        }
        .boxed()
        .shared()
    }

    /// Purge every entry carrying any of `tags`
    pub async fn purge_tags(&self, tags: &TagSet) -> CacheResult<u64> {
        self.purges.fetch_add(1, Ordering::SeqCst);
        self.backend.purge_tags(tags).await
    }

    pub async fn clear(&self) -> CacheResult<()> {
        self.purges.fetch_add(1, Ordering::SeqCst);
        self.backend.clear().await
    }
}

/// Releases the insert fence when the flight ends, including on error or panic
struct FenceGuard<'a, C: CacheService> {
    backend: &'a C,
    fence: u64,
}

impl<C: CacheService> Drop for FenceGuard<'_, C> {
    fn drop(&mut self) {
        self.backend.release_fence(self.fence);
    }
}

async fn compute_and_store<C, T, F, Fut>(
    backend: &C,
    stats: &CacheStats,
    key: &str,
    mut tags: TagSet,
    compute: F,
) -> Result<String>
where
    C: CacheService,
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Computed<T>>>,
{
    let fence_guard = match backend.epoch().await {
        Ok(epoch) => Some(FenceGuard { backend, fence: epoch }),
        Err(e) => {
            warn!(key = key, error = %e, "Cache epoch unavailable, result will not be stored");
            None
        }
    };

    stats.record_computation();
    let computed = compute().await?;
    let payload = serde_json::to_string(&computed.value)?;

    let Some(fence) = fence_guard.as_ref().map(|g| g.fence) else {
        return Ok(payload);
    };

    tags.extend(computed.tags);
    match backend.insert(key, &payload, &tags, fence).await {
        Ok(InsertOutcome::Stored) => {
            log_cache_operation("insert", key, "stored", None);
        }
        Ok(InsertOutcome::RejectedStale) => {
            stats.record_stale_reject();
            log_cache_operation("insert", key, "rejected_stale", Some("tag purged during computation"));
        }
        Err(e) => {
            stats.record_insert_failure();
            warn!(key = key, error = %e, "Cache insert failed, returning uncached value");
        }
    }

    Ok(payload)
}
