//! # Derived-Cost Cache
//!
//! Tag-invalidated, no-expiry caching of aggregator outputs and the raw reads
//! they stitch together.
//!
//! ## Architecture
//!
//! ```text
//! ReadThroughCache            <- get_or_compute, single-flight, stale-write fence
//!   └── CacheProvider (enum)  <- enum dispatch, chosen from CacheConfig
//!         ├── Memory(MemoryCacheService)  <- tag-indexed in-process store
//!         └── NoOp(NoOpCacheService)      <- always-miss fallback
//! InvalidationDispatcher      <- EntityChange -> TagSet -> purge with retry
//!   └── CampaignMembershipIndex <- gang -> campaigns, for COMPOSITE tags
//! ```
//!
//! ## Design Decisions
//!
//! - **Enum dispatch** for providers: no vtable, test doubles plug in through
//!   the generic `C: CacheService` parameter
//! - **Graceful degradation**: unknown backend -> NoOp, lookup failure -> bypass
//! - **Best-effort writes**: insert and purge errors are logged, never propagated

pub mod errors;
pub mod invalidation;
pub mod keys;
pub mod membership;
pub mod provider;
pub mod providers;
pub mod read_through;
pub mod stats;
pub mod tags;
pub mod traits;

pub use errors::{CacheError, CacheResult};
pub use invalidation::{
    EntityChange, EntityKind, InvalidationDispatcher, InvalidationReport, ParentIds,
};
pub use keys::CacheKey;
pub use membership::{CampaignMembershipIndex, MembershipChange};
pub use provider::CacheProvider;
pub use providers::{MemoryCacheService, NoOpCacheService};
pub use read_through::{Computed, ReadThroughCache};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use tags::{tags_for_change, CacheTag, TagClass, TagSet};
pub use traits::{CacheService, InsertOutcome};
