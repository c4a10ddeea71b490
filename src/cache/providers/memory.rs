//! In-memory tag-indexed cache provider
//!
//! Process-local storage with no expiry. Each entry is indexed under every one
//! of its tags; a purge walks the index and removes the entries in one write
//! lock, so a purge is atomic with respect to concurrent inserts.
//!
//! **Important**: this cache is NOT distributed. Each process keeps its own
//! state, so invalidations must run in the process that serves reads.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::cache::errors::CacheResult;
use crate::cache::tags::{CacheTag, TagSet};
use crate::cache::traits::{CacheService, InsertOutcome};

#[derive(Debug)]
struct StoredEntry {
    value: String,
    tags: TagSet,
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, StoredEntry>,
    tag_index: HashMap<CacheTag, HashSet<String>>,
    /// Epoch at which each tag was last purged, kept only while a running
    /// fence predates it
    tag_purged_at: HashMap<CacheTag, u64>,
    /// Fences handed out by `epoch` and not yet released, with their counts
    running_fences: BTreeMap<u64, usize>,
    cleared_at: u64,
    epoch: u64,
}

impl MemoryState {
    fn unindex(&mut self, key: &str, tags: &TagSet) {
        for tag in tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
    }

    /// Forget purge marks no running fence can observe
    fn prune_purge_marks(&mut self) {
        match self.running_fences.first_key_value() {
            Some((&oldest, _)) => self.tag_purged_at.retain(|_, &mut at| at > oldest),
            None => self.tag_purged_at.clear(),
        }
    }

    fn is_stale(&self, tags: &TagSet, fence: u64) -> bool {
        self.cleared_at > fence
            || tags
                .iter()
                .any(|t| self.tag_purged_at.get(t).is_some_and(|&at| at > fence))
    }
}

/// In-memory cache service with a tag index
#[derive(Clone, Default)]
pub struct MemoryCacheService {
    state: Arc<RwLock<MemoryState>>,
}

impl std::fmt::Debug for MemoryCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MemoryCacheService")
            .field("entry_count", &state.entries.len())
            .field("tag_count", &state.tag_index.len())
            .field("epoch", &state.epoch)
            .field("running_fences", &state.running_fences.len())
            .finish()
    }
}

impl MemoryCacheService {
    pub fn new() -> Self {
        debug!("In-memory tag-indexed cache service created");
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.state.read().entries.contains_key(key)
    }

    /// Tags whose purge epoch is still retained for fencing
    pub fn purge_marks(&self) -> usize {
        self.state.read().tag_purged_at.len()
    }

    /// Fences handed out and not yet released
    pub fn running_fences(&self) -> usize {
        self.state.read().running_fences.values().sum()
    }

    /// Tags stored with `key`, if present
    pub fn tags_for(&self, key: &str) -> Option<TagSet> {
        self.state.read().entries.get(key).map(|e| e.tags.clone())
    }
}

impl CacheService for MemoryCacheService {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let result = self.state.read().entries.get(key).map(|e| e.value.clone());

        if result.is_some() {
            debug!(key = key, "Cache HIT (memory)");
        } else {
            debug!(key = key, "Cache MISS (memory)");
        }

        Ok(result)
    }

    async fn insert(
        &self,
        key: &str,
        value: &str,
        tags: &TagSet,
        fence: u64,
    ) -> CacheResult<InsertOutcome> {
        let mut state = self.state.write();

        if state.is_stale(tags, fence) {
            debug!(key = key, fence = fence, epoch = state.epoch, "Rejected stale insert");
            return Ok(InsertOutcome::RejectedStale);
        }

        if let Some(previous) = state.entries.remove(key) {
            state.unindex(key, &previous.tags);
        }
        for tag in tags {
            state
                .tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        state.entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                tags: tags.clone(),
            },
        );

        debug!(key = key, tag_count = tags.len(), "Cache SET (memory)");
        Ok(InsertOutcome::Stored)
    }

    async fn purge_tags(&self, tags: &TagSet) -> CacheResult<u64> {
        let mut state = self.state.write();
        state.epoch += 1;
        let epoch = state.epoch;

        let mut keys = HashSet::new();
        for tag in tags {
            state.tag_purged_at.insert(tag.clone(), epoch);
            if let Some(tagged) = state.tag_index.remove(tag) {
                keys.extend(tagged);
            }
        }

        let mut removed = 0u64;
        for key in keys {
            if let Some(entry) = state.entries.remove(&key) {
                state.unindex(&key, &entry.tags);
                removed += 1;
            }
        }
        state.prune_purge_marks();

        debug!(tag_count = tags.len(), removed = removed, epoch = epoch, "Cache PURGE (memory)");
        Ok(removed)
    }

    async fn epoch(&self) -> CacheResult<u64> {
        let mut state = self.state.write();
        let epoch = state.epoch;
        *state.running_fences.entry(epoch).or_default() += 1;
        Ok(epoch)
    }

    fn release_fence(&self, fence: u64) {
        let mut state = self.state.write();
        if let Some(count) = state.running_fences.get_mut(&fence) {
            *count -= 1;
            if *count == 0 {
                state.running_fences.remove(&fence);
            }
            state.prune_purge_marks();
        }
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut state = self.state.write();
        state.epoch += 1;
        state.cleared_at = state.epoch;
        state.entries.clear();
        state.tag_index.clear();
        state.tag_purged_at.clear();
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
