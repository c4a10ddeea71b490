use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use super::Owner;

const CREDITS_INCREASE: &str = "credits_increase";

/// Typed view over an effect's `type_specific_data` blob.
///
/// Only `credits_increase` matters to cost aggregation. Every other key is
/// carried through untouched in `extra`. A missing, null or unparseable
/// `credits_increase` reads as `None` and contributes nothing; an unparseable
/// one stays in `extra` as entered so it survives a write back.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct EffectPayload {
    pub credits_increase: Option<i64>,
    pub extra: Map<String, Value>,
}

impl EffectPayload {
    pub fn with_credits(credits_increase: i64) -> Self {
        Self {
            credits_increase: Some(credits_increase),
            extra: Map::new(),
        }
    }

    /// Build from an arbitrary JSON value; non-objects become an empty payload
    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Self::from(map),
            _ => Self::default(),
        }
    }

    pub fn credits_delta(&self) -> i64 {
        self.credits_increase.unwrap_or(0)
    }
}

impl From<Map<String, Value>> for EffectPayload {
    fn from(mut map: Map<String, Value>) -> Self {
        let credits_increase = map.get(CREDITS_INCREASE).and_then(coerce_credits);
        if credits_increase.is_some() {
            map.remove(CREDITS_INCREASE);
        }
        Self {
            credits_increase,
            extra: map,
        }
    }
}

impl From<EffectPayload> for Map<String, Value> {
    fn from(payload: EffectPayload) -> Self {
        let mut map = payload.extra;
        if let Some(credits) = payload.credits_increase {
            map.insert(CREDITS_INCREASE.to_string(), Value::from(credits));
        }
        map
    }
}

/// Lenient numeric coercion for data-entry payloads.
///
/// Integers pass through, floats truncate toward zero (saturating), numeric
/// strings are parsed, everything else is `None`.
pub fn coerce_credits(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().and_then(truncate_f64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate_f64))
        }
        _ => None,
    }
}

fn truncate_f64(f: f64) -> Option<i64> {
    // `as` saturates at the i64 bounds
    f.is_finite().then(|| f.trunc() as i64)
}

/// Effect applied to a fighter or a vehicle (injuries, upgrades, ...)
/// Maps to `fighter_effects` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub fighter_effect_id: Uuid,
    pub fighter_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub effect_name: String,
    pub type_specific_data: EffectPayload,
}

impl<'r> FromRow<'r, PgRow> for Effect {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let data: Option<Value> = row.try_get("type_specific_data")?;
        Ok(Self {
            fighter_effect_id: row.try_get("fighter_effect_id")?,
            fighter_id: row.try_get("fighter_id")?,
            vehicle_id: row.try_get("vehicle_id")?,
            effect_name: row.try_get("effect_name")?,
            type_specific_data: EffectPayload::from_value(data),
        })
    }
}

impl Effect {
    pub fn new(owner: Owner, effect_name: impl Into<String>, payload: EffectPayload) -> Self {
        let (fighter_id, vehicle_id) = owner.split();
        Self {
            fighter_effect_id: Uuid::new_v4(),
            fighter_id,
            vehicle_id,
            effect_name: effect_name.into(),
            type_specific_data: payload,
        }
    }

    pub fn owner(&self) -> Option<Owner> {
        Owner::from_columns(self.fighter_id, self.vehicle_id)
    }

    pub fn credits_delta(&self) -> i64 {
        self.type_specific_data.credits_delta()
    }

    /// Insert an effect row
    pub async fn create(pool: &PgPool, effect: &Effect) -> Result<Effect, sqlx::Error> {
        let data = serde_json::to_value(&effect.type_specific_data)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        sqlx::query_as::<_, Effect>(
            r#"
            INSERT INTO fighter_effects (fighter_effect_id, fighter_id, vehicle_id,
                                         effect_name, type_specific_data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING fighter_effect_id, fighter_id, vehicle_id, effect_name, type_specific_data
            "#,
        )
        .bind(effect.fighter_effect_id)
        .bind(effect.fighter_id)
        .bind(effect.vehicle_id)
        .bind(&effect.effect_name)
        .bind(data)
        .fetch_one(pool)
        .await
    }

    /// Effects on any of the given fighters
    pub async fn list_for_fighters(
        pool: &PgPool,
        fighter_ids: &[Uuid],
    ) -> Result<Vec<Effect>, sqlx::Error> {
        if fighter_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Effect>(
            r#"
            SELECT fighter_effect_id, fighter_id, vehicle_id, effect_name, type_specific_data
            FROM fighter_effects
            WHERE fighter_id = ANY($1)
            "#,
        )
        .bind(fighter_ids)
        .fetch_all(pool)
        .await
    }

    /// Effects on any of the given vehicles
    pub async fn list_for_vehicles(
        pool: &PgPool,
        vehicle_ids: &[Uuid],
    ) -> Result<Vec<Effect>, sqlx::Error> {
        if vehicle_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Effect>(
            r#"
            SELECT fighter_effect_id, fighter_id, vehicle_id, effect_name, type_specific_data
            FROM fighter_effects
            WHERE vehicle_id = ANY($1)
            "#,
        )
        .bind(vehicle_ids)
        .fetch_all(pool)
        .await
    }
}
