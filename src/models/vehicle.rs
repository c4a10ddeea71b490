use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Vehicle owned by a gang, optionally crewed by one of its fighters
/// Maps to `vehicles` table
///
/// A vehicle with a `fighter_id` is crewed and its cost counts toward that
/// fighter. A vehicle without one is gang-stored and counts toward the gang
/// rating directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub vehicle_id: Uuid,
    pub gang_id: Uuid,
    pub fighter_id: Option<Uuid>,
    pub vehicle_name: String,
    pub cost: i64,
}

impl Vehicle {
    pub fn new(gang_id: Uuid, vehicle_name: impl Into<String>, cost: i64) -> Self {
        Self {
            vehicle_id: Uuid::new_v4(),
            gang_id,
            fighter_id: None,
            vehicle_name: vehicle_name.into(),
            cost,
        }
    }

    pub fn crewed_by(mut self, fighter_id: Uuid) -> Self {
        self.fighter_id = Some(fighter_id);
        self
    }

    pub fn is_gang_stored(&self) -> bool {
        self.fighter_id.is_none()
    }

    /// Insert a vehicle row
    pub async fn create(pool: &PgPool, vehicle: &Vehicle) -> Result<Vehicle, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (vehicle_id, gang_id, fighter_id, vehicle_name, cost)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING vehicle_id, gang_id, fighter_id, vehicle_name, cost
            "#,
        )
        .bind(vehicle.vehicle_id)
        .bind(vehicle.gang_id)
        .bind(vehicle.fighter_id)
        .bind(&vehicle.vehicle_name)
        .bind(vehicle.cost)
        .fetch_one(pool)
        .await
    }

    /// Vehicles crewed by any of the given fighters
    pub async fn list_for_fighters(
        pool: &PgPool,
        fighter_ids: &[Uuid],
    ) -> Result<Vec<Vehicle>, sqlx::Error> {
        if fighter_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT vehicle_id, gang_id, fighter_id, vehicle_name, cost
            FROM vehicles
            WHERE fighter_id = ANY($1)
            "#,
        )
        .bind(fighter_ids)
        .fetch_all(pool)
        .await
    }

    /// Vehicles of a gang that nobody crews
    pub async fn list_gang_stored(
        pool: &PgPool,
        gang_id: Uuid,
    ) -> Result<Vec<Vehicle>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT vehicle_id, gang_id, fighter_id, vehicle_name, cost
            FROM vehicles
            WHERE gang_id = $1 AND fighter_id IS NULL
            "#,
        )
        .bind(gang_id)
        .fetch_all(pool)
        .await
    }

    /// Move a vehicle to another crew member, or back to gang storage
    pub async fn assign_crew(
        pool: &PgPool,
        vehicle_id: Uuid,
        fighter_id: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET fighter_id = $2
            WHERE vehicle_id = $1
            "#,
        )
        .bind(vehicle_id)
        .bind(fighter_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
