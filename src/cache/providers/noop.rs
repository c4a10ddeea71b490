//! No-op cache provider
//!
//! Always misses, always succeeds. Used when caching is disabled or the
//! configured backend is unknown (graceful degradation).

use crate::cache::errors::CacheResult;
use crate::cache::tags::TagSet;
use crate::cache::traits::{CacheService, InsertOutcome};

/// No-op cache service that never caches anything
#[derive(Debug, Clone, Default)]
pub struct NoOpCacheService;

impl NoOpCacheService {
    pub fn new() -> Self {
        Self
    }
}

impl CacheService for NoOpCacheService {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn insert(
        &self,
        _key: &str,
        _value: &str,
        _tags: &TagSet,
        _fence: u64,
    ) -> CacheResult<InsertOutcome> {
        Ok(InsertOutcome::Stored)
    }

    async fn purge_tags(&self, _tags: &TagSet) -> CacheResult<u64> {
        Ok(0)
    }

    async fn epoch(&self) -> CacheResult<u64> {
        Ok(0)
    }

    async fn clear(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}
