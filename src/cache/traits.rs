//! Cache service trait definition

use super::errors::CacheResult;
use super::tags::TagSet;

/// Result of a fenced insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Stored,
    /// One of the entry's tags was purged after the fence epoch; the value
    /// may predate the purge and was discarded
    RejectedStale,
}

/// Tag-indexed key/value store without expiry.
///
/// Implemented by concrete cache providers (in-memory, no-op). Entries live
/// until a purge names one of their tags.
pub trait CacheService: Send + Sync {
    /// Get a value by key. `Ok(Some(value))` on hit, `Ok(None)` on miss.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = CacheResult<Option<String>>> + Send;

    /// Store a value under `key` with its dependency tags.
    ///
    /// `fence` is the [`epoch`](Self::epoch) observed before the value was
    /// computed; the insert is refused if any tag was purged since.
    fn insert(
        &self,
        key: &str,
        value: &str,
        tags: &TagSet,
        fence: u64,
    ) -> impl std::future::Future<Output = CacheResult<InsertOutcome>> + Send;

    /// Remove every entry carrying any of `tags`; returns the number removed
    fn purge_tags(&self, tags: &TagSet)
        -> impl std::future::Future<Output = CacheResult<u64>> + Send;

    /// Monotonic purge counter used to fence inserts.
    ///
    /// The returned fence counts as running until passed to
    /// [`release_fence`](Self::release_fence).
    fn epoch(&self) -> impl std::future::Future<Output = CacheResult<u64>> + Send;

    /// Mark a fence from [`epoch`](Self::epoch) as no longer needed, whether
    /// or not its insert happened. Backends may then forget purge history
    /// that only older fences could observe.
    fn release_fence(&self, _fence: u64) {}

    /// Drop every entry
    fn clear(&self) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Check if the cache backend is healthy
    fn health_check(&self) -> impl std::future::Future<Output = CacheResult<bool>> + Send;

    /// Get the name of the cache provider
    fn provider_name(&self) -> &'static str;
}
