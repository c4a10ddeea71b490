//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod builders;
pub mod strategies;

use gangkeeper_core::cache::CacheService;
use gangkeeper_core::config::GangkeeperConfig;
use gangkeeper_core::{CacheProvider, InMemoryEntityStore, RatingService};
use std::sync::Arc;

pub use builders::World;

pub fn test_config() -> GangkeeperConfig {
    GangkeeperConfig::for_environment("test")
}

/// Service over `store` with a fresh in-memory cache
pub fn memory_service(store: &InMemoryEntityStore) -> RatingService {
    RatingService::with_cache(Arc::new(store.clone()), CacheProvider::memory(), &test_config())
}

/// Service over `store` with a caller-supplied cache backend
pub fn service_with<C>(store: &InMemoryEntityStore, backend: C) -> RatingService<C>
where
    C: CacheService + Clone + 'static,
{
    RatingService::with_cache(Arc::new(store.clone()), backend, &test_config())
}
