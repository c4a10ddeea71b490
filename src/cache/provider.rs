//! Cache provider
//!
//! Enum dispatch over the concrete backends, chosen once from configuration.
//! Construction never fails: an unknown or disabled backend degrades to
//! [`NoOpCacheService`].

use tracing::{info, warn};

use super::errors::CacheResult;
use super::providers::{MemoryCacheService, NoOpCacheService};
use super::tags::TagSet;
use super::traits::{CacheService, InsertOutcome};
use crate::config::CacheConfig;

#[derive(Debug, Clone)]
pub enum CacheProvider {
    /// In-process tag-indexed cache
    Memory(MemoryCacheService),

    /// No-op cache provider (always miss, always succeed)
    NoOp(NoOpCacheService),
}

impl Default for CacheProvider {
    fn default() -> Self {
        Self::memory()
    }
}

impl CacheProvider {
    /// Create a cache provider from configuration with graceful degradation
    pub fn from_config(config: &CacheConfig) -> Self {
        if !config.enabled {
            info!("Cache disabled by configuration, using NoOp provider");
            return Self::no_op();
        }

        match config.backend.as_str() {
            "memory" | "in-memory" => {
                info!(backend = %config.backend, "Using in-memory cache provider");
                Self::memory()
            }
            "noop" => Self::no_op(),
            other => {
                warn!(
                    backend = other,
                    "Unknown cache backend, falling back to NoOp provider"
                );
                Self::no_op()
            }
        }
    }

    pub fn memory() -> Self {
        Self::Memory(MemoryCacheService::new())
    }

    pub fn no_op() -> Self {
        Self::NoOp(NoOpCacheService::new())
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::NoOp(_))
    }
}

impl CacheService for CacheProvider {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            Self::Memory(s) => s.get(key).await,
            Self::NoOp(s) => s.get(key).await,
        }
    }

    async fn insert(
        &self,
        key: &str,
        value: &str,
        tags: &TagSet,
        fence: u64,
    ) -> CacheResult<InsertOutcome> {
        match self {
            Self::Memory(s) => s.insert(key, value, tags, fence).await,
            Self::NoOp(s) => s.insert(key, value, tags, fence).await,
        }
    }

    async fn purge_tags(&self, tags: &TagSet) -> CacheResult<u64> {
        match self {
            Self::Memory(s) => s.purge_tags(tags).await,
            Self::NoOp(s) => s.purge_tags(tags).await,
        }
    }

    async fn epoch(&self) -> CacheResult<u64> {
        match self {
            Self::Memory(s) => s.epoch().await,
            Self::NoOp(s) => s.epoch().await,
        }
    }

    fn release_fence(&self, fence: u64) {
        match self {
            Self::Memory(s) => s.release_fence(fence),
            Self::NoOp(s) => s.release_fence(fence),
        }
    }

    async fn clear(&self) -> CacheResult<()> {
        match self {
            Self::Memory(s) => s.clear().await,
            Self::NoOp(s) => s.clear().await,
        }
    }

    async fn health_check(&self) -> CacheResult<bool> {
        match self {
            Self::Memory(s) => s.health_check().await,
            Self::NoOp(s) => s.health_check().await,
        }
    }

    fn provider_name(&self) -> &'static str {
        match self {
            Self::Memory(s) => s.provider_name(),
            Self::NoOp(s) => s.provider_name(),
        }
    }
}
