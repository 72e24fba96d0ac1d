//! `Maintenance` CRUD (§3). Deletion is explicit-operator-only and cascades
//! via `ON DELETE CASCADE` on every dependent table — the retention
//! sweeper never deletes the row itself (§4.8).

use chrono::Utc;
use model::Maintenance;
use sqlx::PgPool;

use crate::error::{DatabaseError, DatabaseResult};

pub async fn create(pool: &PgPool, id: &str, name: &str) -> DatabaseResult<Maintenance> {
    let sql = "INSERT INTO maintenances (id, name, is_active, active_seconds_accumulated, config_data)
               VALUES ($1, $2, true, 0, '{}'::jsonb) RETURNING *";
    sqlx::query_as(sql)
        .bind(id)
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn find(pool: &PgPool, id: &str) -> DatabaseResult<Option<Maintenance>> {
    let sql = "SELECT * FROM maintenances WHERE id = $1";
    sqlx::query_as(sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn list_active(pool: &PgPool) -> DatabaseResult<Vec<Maintenance>> {
    let sql = "SELECT * FROM maintenances WHERE is_active = true ORDER BY id";
    sqlx::query_as(sql)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn list_all(pool: &PgPool) -> DatabaseResult<Vec<Maintenance>> {
    let sql = "SELECT * FROM maintenances ORDER BY id";
    sqlx::query_as(sql)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

/// Flip `is_active` off and stamp `deactivated_at := now()`, which the
/// retention sweeper's grace-period check (§4.8, P8) reads from.
pub async fn deactivate(pool: &PgPool, id: &str) -> DatabaseResult<()> {
    let now = Utc::now();
    let sql = "UPDATE maintenances
               SET is_active = false, deactivated_at = $2, updated_at = $2
               WHERE id = $1";
    let result = sqlx::query(sql)
        .bind(id)
        .bind(now)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound { kind: "Maintenance", id: id.to_string() });
    }
    Ok(())
}

pub async fn reactivate(pool: &PgPool, id: &str) -> DatabaseResult<()> {
    let now = Utc::now();
    let sql = "UPDATE maintenances
               SET is_active = true, last_activated_at = $2, deactivated_at = NULL, updated_at = $2
               WHERE id = $1";
    let result = sqlx::query(sql)
        .bind(id)
        .bind(now)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound { kind: "Maintenance", id: id.to_string() });
    }
    Ok(())
}

/// Explicit operator delete — cascades every dependent table (§1, §3).
pub async fn delete(pool: &PgPool, id: &str) -> DatabaseResult<()> {
    let sql = "DELETE FROM maintenances WHERE id = $1";
    let result = sqlx::query(sql)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound { kind: "Maintenance", id: id.to_string() });
    }
    Ok(())
}
