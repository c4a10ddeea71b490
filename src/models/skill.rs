use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// SkillGrant is a skill learned by a fighter
/// Maps to `fighter_skills` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SkillGrant {
    pub fighter_skill_id: Uuid,
    pub fighter_id: Uuid,
    pub skill_name: String,
    /// Zero or negative for skills granted for free
    pub credits_increase: i64,
}

impl SkillGrant {
    pub fn new(fighter_id: Uuid, skill_name: impl Into<String>, credits_increase: i64) -> Self {
        Self {
            fighter_skill_id: Uuid::new_v4(),
            fighter_id,
            skill_name: skill_name.into(),
            credits_increase,
        }
    }

    /// Insert a skill grant
    pub async fn create(pool: &PgPool, skill: &SkillGrant) -> Result<SkillGrant, sqlx::Error> {
        sqlx::query_as::<_, SkillGrant>(
            r#"
            INSERT INTO fighter_skills (fighter_skill_id, fighter_id, skill_name, credits_increase)
            VALUES ($1, $2, $3, $4)
            RETURNING fighter_skill_id, fighter_id, skill_name, credits_increase
            "#,
        )
        .bind(skill.fighter_skill_id)
        .bind(skill.fighter_id)
        .bind(&skill.skill_name)
        .bind(skill.credits_increase)
        .fetch_one(pool)
        .await
    }

    /// Skills of any of the given fighters
    pub async fn list_for_fighters(
        pool: &PgPool,
        fighter_ids: &[Uuid],
    ) -> Result<Vec<SkillGrant>, sqlx::Error> {
        if fighter_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, SkillGrant>(
            r#"
            SELECT fighter_skill_id, fighter_id, skill_name, credits_increase
            FROM fighter_skills
            WHERE fighter_id = ANY($1)
            "#,
        )
        .bind(fighter_ids)
        .fetch_all(pool)
        .await
    }
}
