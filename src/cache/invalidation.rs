//! # Invalidation Dispatcher
//!
//! Turns "entity X changed" into a tag purge:
//!
//! 1. the caller commits its mutation (must happen first, or a racing read
//!    can repopulate the cache from pre-mutation rows)
//! 2. BASE, SHARED and COMPUTED tags come from [`tags_for_change`] using the
//!    parent ids the caller supplies; the store is never re-queried because the
//!    row may already be gone
//! 3. COMPOSITE tags come from every campaign the gang is known to be in
//! 4. the tags are purged, with retry
//!
//! A failed purge never fails the caller's mutation. It is logged at `error`
//! level because without expiry the stale entries would otherwise live forever.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use super::membership::CampaignMembershipIndex;
use super::provider::CacheProvider;
use super::read_through::ReadThroughCache;
use super::tags::{tags_for_change, CacheTag, TagSet};
use super::traits::CacheService;
use crate::config::CacheConfig;
use crate::logging::{log_error, log_invalidation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Gang,
    Fighter,
    Vehicle,
    Equipment,
    Skill,
    Effect,
    Campaign,
    /// `id` is the campaign, `parents.gang_id` the gang that joined or left
    CampaignMembership,
    Territory,
    Battle,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gang => "gang",
            Self::Fighter => "fighter",
            Self::Vehicle => "vehicle",
            Self::Equipment => "equipment",
            Self::Skill => "skill",
            Self::Effect => "effect",
            Self::Campaign => "campaign",
            Self::CampaignMembership => "campaign_membership",
            Self::Territory => "territory",
            Self::Battle => "battle",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owners of the changed entity, as known to the mutating caller.
///
/// For equipment and effects a `vehicle_id` means the row hangs off that
/// vehicle and `fighter_id` is its crew, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentIds {
    pub gang_id: Option<Uuid>,
    pub fighter_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub campaign_ids: BTreeSet<Uuid>,
}

impl ParentIds {
    pub fn gang(gang_id: Uuid) -> Self {
        Self {
            gang_id: Some(gang_id),
            ..Self::default()
        }
    }

    pub fn fighter(fighter_id: Uuid, gang_id: Uuid) -> Self {
        Self {
            fighter_id: Some(fighter_id),
            ..Self::gang(gang_id)
        }
    }

    pub fn vehicle(vehicle_id: Uuid, gang_id: Uuid, crew: Option<Uuid>) -> Self {
        Self {
            vehicle_id: Some(vehicle_id),
            fighter_id: crew,
            ..Self::gang(gang_id)
        }
    }

    pub fn campaign(campaign_id: Uuid) -> Self {
        Self::default().with_campaigns([campaign_id])
    }

    pub fn with_campaigns(mut self, campaign_ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.campaign_ids.extend(campaign_ids);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityChange {
    pub kind: EntityKind,
    pub id: Uuid,
    pub parents: ParentIds,
}

impl EntityChange {
    pub fn new(kind: EntityKind, id: Uuid, parents: ParentIds) -> Self {
        Self { kind, id, parents }
    }

    /// Gang whose rating this change feeds, if any
    pub fn gang_scope(&self) -> Option<Uuid> {
        match self.kind {
            EntityKind::Gang => Some(self.id),
            EntityKind::CampaignMembership => None,
            _ => self.parents.gang_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    pub tags: TagSet,
    pub purged_entries: u64,
    pub attempts: u32,
    pub succeeded: bool,
}

#[derive(Clone)]
pub struct InvalidationDispatcher<C = CacheProvider> {
    cache: ReadThroughCache<C>,
    memberships: CampaignMembershipIndex,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl<C: CacheService> fmt::Debug for InvalidationDispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationDispatcher")
            .field("cache", &self.cache)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_backoff", &self.retry_backoff)
            .finish()
    }
}

impl<C> InvalidationDispatcher<C>
where
    C: CacheService + Clone + 'static,
{
    pub fn new(
        cache: ReadThroughCache<C>,
        memberships: CampaignMembershipIndex,
        config: &CacheConfig,
    ) -> Self {
        Self {
            cache,
            memberships,
            retry_attempts: config.purge_retry_attempts.max(1),
            retry_backoff: config.purge_retry_backoff(),
        }
    }

    pub fn memberships(&self) -> &CampaignMembershipIndex {
        &self.memberships
    }

    /// Tags a change resolves to, COMPOSITE tags from the membership index included
    pub fn resolve(&self, change: &EntityChange) -> TagSet {
        match change.gang_scope() {
            Some(gang_id) => {
                let mut augmented = change.clone();
                augmented
                    .parents
                    .campaign_ids
                    .extend(self.memberships.campaigns_for_gang(gang_id));
                tags_for_change(&augmented)
            }
            None => tags_for_change(change),
        }
    }

    /// Purge everything `change` invalidates. Idempotent; never fails.
    pub async fn invalidate(&self, change: EntityChange) -> InvalidationReport {
        let tags = self.resolve(&change);
        self.purge(tags, change.kind.as_str(), change.id).await
    }

    /// Drop every aggregator output while keeping raw reads
    pub async fn bust_computed(&self) -> InvalidationReport {
        self.purge(TagSet::from([CacheTag::all_computed()]), "computed", Uuid::nil())
            .await
    }

    async fn purge(&self, tags: TagSet, entity_kind: &str, entity_id: Uuid) -> InvalidationReport {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.cache.purge_tags(&tags).await {
                Ok(purged_entries) => {
                    log_invalidation(entity_kind, entity_id, tags.len(), purged_entries, attempt);
                    return InvalidationReport {
                        tags,
                        purged_entries,
                        attempts: attempt,
                        succeeded: true,
                    };
                }
                Err(e) if attempt < self.retry_attempts => {
                    warn!(
                        entity_kind = entity_kind,
                        entity_id = %entity_id,
                        attempt = attempt,
                        error = %e,
                        "Cache purge failed, retrying"
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => {
                    let context = format!(
                        "{entity_kind} {entity_id}: {} tags left unpurged after {attempt} attempts",
                        tags.len()
                    );
                    log_error("invalidation", "purge_tags", &e.to_string(), Some(&context));
                    return InvalidationReport {
                        tags,
                        purged_entries: 0,
                        attempts: attempt,
                        succeeded: false,
                    };
                }
            }
        }
    }
}
