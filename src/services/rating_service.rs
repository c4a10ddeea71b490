//! # Rating Service
//!
//! The API page renderers and mutation handlers call:
//!
//! - cached reads: gang rating, fighter total cost and breakdown, campaign
//!   overview
//! - invalidation entry points, to be called **after** the mutation commits
//! - uncached reads and stored-rating reconciliation
//!
//! The aggregation is the source of truth for ratings. The gang's stored
//! `rating` column is a copy brought in line by
//! [`RatingService::reconcile_stored_rating`].

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::campaign_overview::{load_campaign_overview, CampaignOverview};
use crate::cache::tags::{
    campaign_overview_tags, fighter_cost_tags, fighter_loadout_tags, gang_loadout_tags,
    gang_rating_tags,
};
use crate::cache::{
    CacheKey, CacheProvider, CacheService, CacheStatsSnapshot, CampaignMembershipIndex, Computed,
    EntityChange, EntityKind, InvalidationDispatcher, InvalidationReport, MembershipChange,
    ParentIds, ReadThroughCache,
};
use crate::config::{GangkeeperConfig, RatingConfig};
use crate::error::Result;
use crate::rating::{
    fighter_loadout_cost, gang_loadout_rating, CostBreakdown, ExclusionPolicy, LoadoutLoader,
};
use crate::store::EntityStore;

/// Outcome of comparing a gang's stored rating with a fresh aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingReconciliation {
    pub gang_id: Uuid,
    /// `None` when the gang does not exist
    pub stored: Option<i64>,
    pub computed: i64,
    pub updated: bool,
}

impl RatingReconciliation {
    pub fn is_consistent(&self) -> bool {
        self.stored.map_or(true, |stored| stored == self.computed)
    }
}

#[derive(Clone)]
pub struct RatingService<C = CacheProvider> {
    loader: LoadoutLoader,
    cache: ReadThroughCache<C>,
    dispatcher: InvalidationDispatcher<C>,
    policies: RatingConfig,
    campaign_battle_limit: u32,
}

impl<C: CacheService> std::fmt::Debug for RatingService<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingService")
            .field("cache", &self.cache)
            .field("policies", &self.policies)
            .field("campaign_battle_limit", &self.campaign_battle_limit)
            .finish()
    }
}

impl RatingService<CacheProvider> {
    /// Build with the cache backend named in `config.cache`
    pub fn from_config(store: Arc<dyn EntityStore>, config: &GangkeeperConfig) -> Self {
        config.cache.log_configuration();
        Self::with_cache(store, CacheProvider::from_config(&config.cache), config)
    }
}

impl<C> RatingService<C>
where
    C: CacheService + Clone + 'static,
{
    pub fn with_cache(store: Arc<dyn EntityStore>, backend: C, config: &GangkeeperConfig) -> Self {
        let cache = ReadThroughCache::new(backend);
        let dispatcher =
            InvalidationDispatcher::new(cache.clone(), CampaignMembershipIndex::new(), &config.cache);

        Self {
            loader: LoadoutLoader::new(store),
            cache,
            dispatcher,
            policies: config.rating,
            campaign_battle_limit: config.cache.campaign_battle_limit,
        }
    }

    pub fn cache(&self) -> &ReadThroughCache<C> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    pub fn dispatcher(&self) -> &InvalidationDispatcher<C> {
        &self.dispatcher
    }

    pub fn policies(&self) -> RatingConfig {
        self.policies
    }

    // ---- cached reads ----

    /// Gang sheet rating; 0 for an unknown gang
    pub async fn get_gang_rating(&self, gang_id: Uuid) -> Result<i64> {
        self.get_gang_rating_with(gang_id, self.policies.gang_sheet)
            .await
    }

    pub async fn get_gang_rating_with(&self, gang_id: Uuid, policy: ExclusionPolicy) -> Result<i64> {
        let loader = self.loader.clone();
        self.cache
            .get_or_compute(
                &CacheKey::gang_rating(gang_id, policy),
                gang_rating_tags(gang_id),
                move || async move {
                    Ok(match loader.gang_loadout(gang_id).await? {
                        Some(loadout) => Computed::new(
                            gang_loadout_rating(&loadout, policy),
                            gang_loadout_tags(&loadout),
                        ),
                        None => Computed::untagged(0),
                    })
                },
            )
            .await
    }

    /// Fighter cost including crewed vehicles; 0 for an unknown fighter
    pub async fn get_fighter_total_cost(&self, fighter_id: Uuid) -> Result<i64> {
        let loader = self.loader.clone();
        self.cache
            .get_or_compute(
                &CacheKey::fighter_total_cost(fighter_id),
                fighter_cost_tags(fighter_id),
                move || async move {
                    Ok(match loader.fighter_loadout(fighter_id).await? {
                        Some(loadout) => Computed::new(
                            fighter_loadout_cost(&loadout),
                            fighter_loadout_tags(&loadout),
                        ),
                        None => Computed::untagged(0),
                    })
                },
            )
            .await
    }

    pub async fn get_fighter_cost_breakdown(
        &self,
        fighter_id: Uuid,
    ) -> Result<Option<CostBreakdown>> {
        let loader = self.loader.clone();
        self.cache
            .get_or_compute(
                &CacheKey::fighter_breakdown(fighter_id),
                fighter_cost_tags(fighter_id),
                move || async move {
                    Ok(match loader.fighter_loadout(fighter_id).await? {
                        Some(loadout) => Computed::new(
                            Some(CostBreakdown::from_loadout(&loadout)),
                            fighter_loadout_tags(&loadout),
                        ),
                        None => Computed::untagged(None),
                    })
                },
            )
            .await
    }

    /// Members, territories, recent battles and member ratings of a campaign
    pub async fn get_campaign_overview(
        &self,
        campaign_id: Uuid,
    ) -> Result<Option<CampaignOverview>> {
        let loader = self.loader.clone();
        let memberships = self.dispatcher.memberships().clone();
        let limit = self.campaign_battle_limit;
        let policy = self.policies.campaign;

        let overview: Option<CampaignOverview> = self
            .cache
            .get_or_compute(
                &CacheKey::campaign_overview(campaign_id, limit),
                campaign_overview_tags(campaign_id),
                move || async move {
                    let computed = load_campaign_overview(&loader, campaign_id, limit, policy).await?;
                    if let Some(overview) = &computed.value {
                        memberships.record_campaign(campaign_id, overview.member_ids());
                    }
                    Ok(computed)
                },
            )
            .await?;

        // hits feed the index too
        if let Some(overview) = &overview {
            self.dispatcher
                .memberships()
                .record_campaign(campaign_id, overview.member_ids());
        }
        Ok(overview)
    }

    // ---- invalidation, after the mutation has committed ----

    pub async fn invalidate(&self, change: EntityChange) -> InvalidationReport {
        self.dispatcher.invalidate(change).await
    }

    /// Gang record created, renamed or deleted, or "anything about this gang"
    pub async fn invalidate_gang(&self, gang_id: Uuid) -> InvalidationReport {
        self.invalidate(EntityChange::new(
            EntityKind::Gang,
            gang_id,
            ParentIds::default(),
        ))
        .await
    }

    /// Fighter added, removed, or changed (credits, adjustment, flags)
    pub async fn invalidate_fighter(&self, fighter_id: Uuid, gang_id: Uuid) -> InvalidationReport {
        self.invalidate(EntityChange::new(
            EntityKind::Fighter,
            fighter_id,
            ParentIds::gang(gang_id),
        ))
        .await
    }

    /// Vehicle added, removed, changed or reassigned.
    ///
    /// `fighter_id` is the crew after the change; the previous crew's cached
    /// costs carry the vehicle's own tag and are purged through it.
    pub async fn invalidate_vehicle(
        &self,
        vehicle_id: Uuid,
        gang_id: Uuid,
        fighter_id: Option<Uuid>,
    ) -> InvalidationReport {
        let parents = ParentIds {
            fighter_id,
            ..ParentIds::gang(gang_id)
        };
        self.invalidate(EntityChange::new(EntityKind::Vehicle, vehicle_id, parents))
            .await
    }

    pub async fn invalidate_campaign_membership(
        &self,
        campaign_id: Uuid,
        gang_id: Uuid,
        change: MembershipChange,
    ) -> InvalidationReport {
        self.dispatcher
            .memberships()
            .apply(campaign_id, gang_id, change);
        self.invalidate(EntityChange::new(
            EntityKind::CampaignMembership,
            campaign_id,
            ParentIds::gang(gang_id),
        ))
        .await
    }

    /// Equipment bought, sold or repriced; `parents` names the fighter or
    /// vehicle (and its crew) holding it
    pub async fn invalidate_equipment(
        &self,
        equipment_id: Uuid,
        parents: ParentIds,
    ) -> InvalidationReport {
        self.invalidate(EntityChange::new(EntityKind::Equipment, equipment_id, parents))
            .await
    }

    pub async fn invalidate_skill(
        &self,
        skill_id: Uuid,
        fighter_id: Uuid,
        gang_id: Uuid,
    ) -> InvalidationReport {
        self.invalidate(EntityChange::new(
            EntityKind::Skill,
            skill_id,
            ParentIds::fighter(fighter_id, gang_id),
        ))
        .await
    }

    pub async fn invalidate_effect(&self, effect_id: Uuid, parents: ParentIds) -> InvalidationReport {
        self.invalidate(EntityChange::new(EntityKind::Effect, effect_id, parents))
            .await
    }

    /// Purge every aggregator output, e.g. after the cost rules change
    pub async fn bust_computed(&self) -> InvalidationReport {
        self.dispatcher.bust_computed().await
    }

    // ---- uncached ----

    pub async fn compute_gang_rating_uncached(&self, gang_id: Uuid) -> Result<i64> {
        Ok(self
            .loader
            .gang_loadout(gang_id)
            .await?
            .map_or(0, |loadout| {
                gang_loadout_rating(&loadout, self.policies.gang_sheet)
            }))
    }

    pub async fn compute_fighter_cost_uncached(&self, fighter_id: Uuid) -> Result<i64> {
        Ok(self
            .loader
            .fighter_loadout(fighter_id)
            .await?
            .map_or(0, |loadout| fighter_loadout_cost(&loadout)))
    }

    /// Compare a gang's stored rating column with a fresh aggregation
    pub async fn audit_stored_rating(&self, gang_id: Uuid) -> Result<RatingReconciliation> {
        self.check_stored_rating(gang_id, false).await
    }

    /// Recompute a gang's rating and write it to the stored column if it drifted
    pub async fn reconcile_stored_rating(&self, gang_id: Uuid) -> Result<RatingReconciliation> {
        self.check_stored_rating(gang_id, true).await
    }

    async fn check_stored_rating(&self, gang_id: Uuid, fix: bool) -> Result<RatingReconciliation> {
        let Some(loadout) = self.loader.gang_loadout(gang_id).await? else {
            debug!(gang_id = %gang_id, "Gang not found, nothing to reconcile");
            return Ok(RatingReconciliation {
                gang_id,
                stored: None,
                computed: 0,
                updated: false,
            });
        };

        let stored = loadout.gang.rating;
        let computed = gang_loadout_rating(&loadout, self.policies.gang_sheet);
        let mut updated = false;

        if fix && stored != computed {
            updated = self
                .loader
                .store()
                .update_gang_rating(gang_id, computed)
                .await?;
            if updated {
                info!(
                    gang_id = %gang_id,
                    stored = stored,
                    computed = computed,
                    "Stored gang rating reconciled"
                );
                self.invalidate_gang(gang_id).await;
            }
        }

        Ok(RatingReconciliation {
            gang_id,
            stored: Some(stored),
            computed,
            updated,
        })
    }
}
