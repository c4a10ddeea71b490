use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Campaign groups gangs, territories and battles
/// Maps to `campaigns` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Campaign {
    pub campaign_id: Uuid,
    pub campaign_name: String,
}

/// Gang participating in a campaign
/// Maps to `campaign_gangs` joined with `gangs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CampaignMember {
    pub campaign_id: Uuid,
    pub gang_id: Uuid,
    pub gang_name: String,
    pub role: Option<String>,
}

/// Territory held (or not) within a campaign
/// Maps to `campaign_territories` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Territory {
    pub territory_id: Uuid,
    pub campaign_id: Uuid,
    pub territory_name: String,
    pub gang_id: Option<Uuid>,
}

/// Battle fought between campaign gangs
/// Maps to `campaign_battles` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Battle {
    pub battle_id: Uuid,
    pub campaign_id: Uuid,
    pub attacker_id: Option<Uuid>,
    pub defender_id: Option<Uuid>,
    pub winner_id: Option<Uuid>,
    pub scenario: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(campaign_name: impl Into<String>) -> Self {
        Self {
            campaign_id: Uuid::new_v4(),
            campaign_name: campaign_name.into(),
        }
    }

    /// Insert a campaign row
    pub async fn create(pool: &PgPool, campaign: &Campaign) -> Result<Campaign, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (campaign_id, campaign_name)
            VALUES ($1, $2)
            RETURNING campaign_id, campaign_name
            "#,
        )
        .bind(campaign.campaign_id)
        .bind(&campaign.campaign_name)
        .fetch_one(pool)
        .await
    }

    /// Find a campaign by ID
    pub async fn find_by_id(
        pool: &PgPool,
        campaign_id: Uuid,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(
            r#"
            SELECT campaign_id, campaign_name
            FROM campaigns
            WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .fetch_optional(pool)
        .await
    }

    /// Add a gang to a campaign; re-adding an existing member is a no-op
    pub async fn add_member(
        pool: &PgPool,
        campaign_id: Uuid,
        gang_id: Uuid,
        role: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO campaign_gangs (campaign_id, gang_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (campaign_id, gang_id) DO NOTHING
            "#,
        )
        .bind(campaign_id)
        .bind(gang_id)
        .bind(role)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a gang from a campaign
    pub async fn remove_member(
        pool: &PgPool,
        campaign_id: Uuid,
        gang_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM campaign_gangs
            WHERE campaign_id = $1 AND gang_id = $2
            "#,
        )
        .bind(campaign_id)
        .bind(gang_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl CampaignMember {
    /// Members of a campaign in join order
    pub async fn list_for_campaign(
        pool: &PgPool,
        campaign_id: Uuid,
    ) -> Result<Vec<CampaignMember>, sqlx::Error> {
        sqlx::query_as::<_, CampaignMember>(
            r#"
            SELECT cg.campaign_id, cg.gang_id, g.gang_name, cg.role
            FROM campaign_gangs cg
            JOIN gangs g ON g.gang_id = cg.gang_id
            WHERE cg.campaign_id = $1
            ORDER BY cg.joined_at, cg.gang_id
            "#,
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await
    }
}

impl Territory {
    pub async fn list_for_campaign(
        pool: &PgPool,
        campaign_id: Uuid,
    ) -> Result<Vec<Territory>, sqlx::Error> {
        sqlx::query_as::<_, Territory>(
            r#"
            SELECT territory_id, campaign_id, territory_name, gang_id
            FROM campaign_territories
            WHERE campaign_id = $1
            ORDER BY territory_name, territory_id
            "#,
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await
    }
}

impl Battle {
    /// Most recent battles first
    pub async fn list_recent_for_campaign(
        pool: &PgPool,
        campaign_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Battle>, sqlx::Error> {
        sqlx::query_as::<_, Battle>(
            r#"
            SELECT battle_id, campaign_id, attacker_id, defender_id, winner_id, scenario, created_at
            FROM campaign_battles
            WHERE campaign_id = $1
            ORDER BY created_at DESC, battle_id
            LIMIT $2
            "#,
        )
        .bind(campaign_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
