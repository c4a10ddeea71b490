use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Fighter is a gang member whose cost feeds the gang rating
/// Maps to `fighters` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Fighter {
    pub fighter_id: Uuid,
    pub gang_id: Uuid,
    pub fighter_name: String,
    pub credits: i64,
    pub cost_adjustment: i64,
    pub killed: bool,
    pub retired: bool,
    pub enslaved: bool,
    pub captured: bool,
}

impl Fighter {
    pub fn new(gang_id: Uuid, fighter_name: impl Into<String>, credits: i64) -> Self {
        Self {
            fighter_id: Uuid::new_v4(),
            gang_id,
            fighter_name: fighter_name.into(),
            credits,
            cost_adjustment: 0,
            killed: false,
            retired: false,
            enslaved: false,
            captured: false,
        }
    }

    /// Insert a fighter row
    pub async fn create(pool: &PgPool, fighter: &Fighter) -> Result<Fighter, sqlx::Error> {
        sqlx::query_as::<_, Fighter>(
            r#"
            INSERT INTO fighters (fighter_id, gang_id, fighter_name, credits, cost_adjustment,
                                  killed, retired, enslaved, captured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING fighter_id, gang_id, fighter_name, credits, cost_adjustment,
                      killed, retired, enslaved, captured
            "#,
        )
        .bind(fighter.fighter_id)
        .bind(fighter.gang_id)
        .bind(&fighter.fighter_name)
        .bind(fighter.credits)
        .bind(fighter.cost_adjustment)
        .bind(fighter.killed)
        .bind(fighter.retired)
        .bind(fighter.enslaved)
        .bind(fighter.captured)
        .fetch_one(pool)
        .await
    }

    /// Find a fighter by ID
    pub async fn find_by_id(
        pool: &PgPool,
        fighter_id: Uuid,
    ) -> Result<Option<Fighter>, sqlx::Error> {
        sqlx::query_as::<_, Fighter>(
            r#"
            SELECT fighter_id, gang_id, fighter_name, credits, cost_adjustment,
                   killed, retired, enslaved, captured
            FROM fighters
            WHERE fighter_id = $1
            "#,
        )
        .bind(fighter_id)
        .fetch_optional(pool)
        .await
    }

    /// All fighters of a gang regardless of lifecycle flags
    pub async fn list_by_gang(pool: &PgPool, gang_id: Uuid) -> Result<Vec<Fighter>, sqlx::Error> {
        sqlx::query_as::<_, Fighter>(
            r#"
            SELECT fighter_id, gang_id, fighter_name, credits, cost_adjustment,
                   killed, retired, enslaved, captured
            FROM fighters
            WHERE gang_id = $1
            ORDER BY fighter_name, fighter_id
            "#,
        )
        .bind(gang_id)
        .fetch_all(pool)
        .await
    }

    /// Set the killed flag
    pub async fn set_killed(
        pool: &PgPool,
        fighter_id: Uuid,
        killed: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE fighters
            SET killed = $2
            WHERE fighter_id = $1
            "#,
        )
        .bind(fighter_id)
        .bind(killed)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
