use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::Owner;

/// EquipmentAssignment is one purchased item held by a fighter or a vehicle
/// Maps to `fighter_equipment` table
///
/// `purchase_cost` is what was actually paid, which may differ from the
/// catalogue price after discounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EquipmentAssignment {
    pub fighter_equipment_id: Uuid,
    pub fighter_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub equipment_name: String,
    pub purchase_cost: i64,
}

impl EquipmentAssignment {
    pub fn new(owner: Owner, equipment_name: impl Into<String>, purchase_cost: i64) -> Self {
        let (fighter_id, vehicle_id) = owner.split();
        Self {
            fighter_equipment_id: Uuid::new_v4(),
            fighter_id,
            vehicle_id,
            equipment_name: equipment_name.into(),
            purchase_cost,
        }
    }

    pub fn owner(&self) -> Option<Owner> {
        Owner::from_columns(self.fighter_id, self.vehicle_id)
    }

    /// Insert an equipment assignment
    pub async fn create(
        pool: &PgPool,
        item: &EquipmentAssignment,
    ) -> Result<EquipmentAssignment, sqlx::Error> {
        sqlx::query_as::<_, EquipmentAssignment>(
            r#"
            INSERT INTO fighter_equipment (fighter_equipment_id, fighter_id, vehicle_id,
                                           equipment_name, purchase_cost)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING fighter_equipment_id, fighter_id, vehicle_id, equipment_name, purchase_cost
            "#,
        )
        .bind(item.fighter_equipment_id)
        .bind(item.fighter_id)
        .bind(item.vehicle_id)
        .bind(&item.equipment_name)
        .bind(item.purchase_cost)
        .fetch_one(pool)
        .await
    }

    /// Equipment held by any of the given fighters
    pub async fn list_for_fighters(
        pool: &PgPool,
        fighter_ids: &[Uuid],
    ) -> Result<Vec<EquipmentAssignment>, sqlx::Error> {
        if fighter_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, EquipmentAssignment>(
            r#"
            SELECT fighter_equipment_id, fighter_id, vehicle_id, equipment_name, purchase_cost
            FROM fighter_equipment
            WHERE fighter_id = ANY($1)
            "#,
        )
        .bind(fighter_ids)
        .fetch_all(pool)
        .await
    }

    /// Equipment held by any of the given vehicles
    pub async fn list_for_vehicles(
        pool: &PgPool,
        vehicle_ids: &[Uuid],
    ) -> Result<Vec<EquipmentAssignment>, sqlx::Error> {
        if vehicle_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, EquipmentAssignment>(
            r#"
            SELECT fighter_equipment_id, fighter_id, vehicle_id, equipment_name, purchase_cost
            FROM fighter_equipment
            WHERE vehicle_id = ANY($1)
            "#,
        )
        .bind(vehicle_ids)
        .fetch_all(pool)
        .await
    }

    /// Delete an equipment assignment
    pub async fn delete(pool: &PgPool, fighter_equipment_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM fighter_equipment
            WHERE fighter_equipment_id = $1
            "#,
        )
        .bind(fighter_equipment_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
