use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Gang represents the root of the cost ownership graph
/// Maps to `gangs` table
///
/// `rating` is a denormalised copy of the aggregated rating. It is written by
/// rating reconciliation and is never trusted over a fresh aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Gang {
    pub gang_id: Uuid,
    pub gang_name: String,
    pub rating: i64,
}

impl Gang {
    pub fn new(gang_name: impl Into<String>) -> Self {
        Self {
            gang_id: Uuid::new_v4(),
            gang_name: gang_name.into(),
            rating: 0,
        }
    }

    /// Insert a gang row
    pub async fn create(pool: &PgPool, gang: &Gang) -> Result<Gang, sqlx::Error> {
        sqlx::query_as::<_, Gang>(
            r#"
            INSERT INTO gangs (gang_id, gang_name, rating)
            VALUES ($1, $2, $3)
            RETURNING gang_id, gang_name, rating
            "#,
        )
        .bind(gang.gang_id)
        .bind(&gang.gang_name)
        .bind(gang.rating)
        .fetch_one(pool)
        .await
    }

    /// Find a gang by ID
    pub async fn find_by_id(pool: &PgPool, gang_id: Uuid) -> Result<Option<Gang>, sqlx::Error> {
        sqlx::query_as::<_, Gang>(
            r#"
            SELECT gang_id, gang_name, rating
            FROM gangs
            WHERE gang_id = $1
            "#,
        )
        .bind(gang_id)
        .fetch_optional(pool)
        .await
    }

    /// List every gang id, oldest first
    pub async fn list_ids(pool: &PgPool) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT gang_id
            FROM gangs
            ORDER BY created_at, gang_id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Overwrite the denormalised rating column
    pub async fn update_rating(
        pool: &PgPool,
        gang_id: Uuid,
        rating: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE gangs
            SET rating = $2, updated_at = NOW()
            WHERE gang_id = $1
            "#,
        )
        .bind(gang_id)
        .bind(rating)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
