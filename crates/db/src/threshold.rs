//! `ThresholdOverride` CRUD (§4.6). The Threshold Registry itself — the
//! memoised, per-maintenance lookup that falls back to process defaults —
//! lives in `switchwatch-core`; this module only persists overrides.

use model::{ThresholdKey, ThresholdOverride, ThresholdValue};
use sqlx::PgPool;

use crate::error::{DatabaseError, DatabaseResult};

#[derive(sqlx::FromRow)]
struct ThresholdOverrideRow {
    maintenance_id: String,
    key: String,
    value: sqlx::types::Json<ThresholdValue>,
}

impl From<ThresholdOverrideRow> for ThresholdOverride {
    fn from(row: ThresholdOverrideRow) -> Self {
        ThresholdOverride {
            maintenance_id: row.maintenance_id,
            key: ThresholdKey::new(row.key),
            value: row.value.0,
        }
    }
}

pub async fn list_overrides(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<Vec<ThresholdOverride>> {
    let sql = "SELECT * FROM threshold_overrides WHERE maintenance_id = $1";
    let rows: Vec<ThresholdOverrideRow> = sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn get_override(pool: &PgPool, maintenance_id: &str, key: &ThresholdKey) -> DatabaseResult<Option<ThresholdValue>> {
    let sql = "SELECT * FROM threshold_overrides WHERE maintenance_id = $1 AND key = $2";
    let row: Option<ThresholdOverrideRow> = sqlx::query_as(sql)
        .bind(maintenance_id)
        .bind(&key.0)
        .fetch_optional(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(row.map(|row| row.value.0))
}

pub async fn set_override(pool: &PgPool, maintenance_id: &str, key: &ThresholdKey, value: &ThresholdValue) -> DatabaseResult<()> {
    let sql = "INSERT INTO threshold_overrides (maintenance_id, key, value)
               VALUES ($1, $2, $3)
               ON CONFLICT (maintenance_id, key) DO UPDATE SET value = excluded.value";
    sqlx::query(sql)
        .bind(maintenance_id)
        .bind(&key.0)
        .bind(sqlx::types::Json(value.clone()))
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

pub async fn clear_override(pool: &PgPool, maintenance_id: &str, key: &ThresholdKey) -> DatabaseResult<()> {
    let sql = "DELETE FROM threshold_overrides WHERE maintenance_id = $1 AND key = $2";
    sqlx::query(sql)
        .bind(maintenance_id)
        .bind(&key.0)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}
