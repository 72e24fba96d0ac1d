//! The `CollectionBatch` / `LatestCollectionBatch` tables that back the
//! change-point strategy (§3, §4.1). Per-type typed rows live in
//! `typed_records`; `store` ties the two together transactionally.

use chrono::Utc;
use model::{CollectionBatch, CollectionError, CollectionType, LatestCollectionBatch};
use sqlx::{PgConnection, PgPool};
use std::str::FromStr;

use crate::error::{DatabaseError, DatabaseResult};

fn parse_collection_type(raw: &str) -> DatabaseResult<CollectionType> {
    CollectionType::from_str(raw)
        .map_err(|err| DatabaseError::Internal(format!("malformed collection_type {raw:?}: {err}")))
}

#[derive(sqlx::FromRow)]
struct LatestCollectionBatchRow {
    maintenance_id: String,
    collection_type: String,
    switch_hostname: String,
    batch_id: i64,
    data_hash: String,
    collected_at: chrono::DateTime<Utc>,
    last_checked_at: chrono::DateTime<Utc>,
}

impl LatestCollectionBatchRow {
    fn into_model(self) -> DatabaseResult<LatestCollectionBatch> {
        Ok(LatestCollectionBatch {
            maintenance_id: self.maintenance_id,
            collection_type: parse_collection_type(&self.collection_type)?,
            switch_hostname: self.switch_hostname,
            batch_id: self.batch_id,
            data_hash: self.data_hash,
            collected_at: self.collected_at,
            last_checked_at: self.last_checked_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CollectionBatchRow {
    id: i64,
    maintenance_id: String,
    collection_type: String,
    switch_hostname: String,
    raw_data: String,
    item_count: i32,
    collected_at: chrono::DateTime<Utc>,
}

impl CollectionBatchRow {
    fn into_model(self) -> DatabaseResult<CollectionBatch> {
        Ok(CollectionBatch {
            id: self.id,
            maintenance_id: self.maintenance_id,
            collection_type: parse_collection_type(&self.collection_type)?,
            switch_hostname: self.switch_hostname,
            raw_data: self.raw_data,
            item_count: self.item_count,
            collected_at: self.collected_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CollectionErrorRow {
    id: i64,
    maintenance_id: String,
    collection_type: String,
    switch_hostname: String,
    error_message: String,
    occurred_at: chrono::DateTime<Utc>,
}

impl CollectionErrorRow {
    fn into_model(self) -> DatabaseResult<CollectionError> {
        Ok(CollectionError {
            id: self.id,
            maintenance_id: self.maintenance_id,
            collection_type: parse_collection_type(&self.collection_type)?,
            switch_hostname: self.switch_hostname,
            error_message: self.error_message,
            occurred_at: self.occurred_at,
        })
    }
}

pub async fn find_latest(
    conn: &mut PgConnection,
    maintenance_id: &str,
    collection_type: CollectionType,
    switch_hostname: &str,
) -> DatabaseResult<Option<LatestCollectionBatch>> {
    let sql = "SELECT * FROM latest_collection_batches
               WHERE maintenance_id = $1 AND collection_type = $2 AND switch_hostname = $3";
    let row: Option<LatestCollectionBatchRow> = sqlx::query_as(sql)
        .bind(maintenance_id)
        .bind(collection_type.to_string())
        .bind(switch_hostname)
        .fetch_optional(conn)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    row.map(LatestCollectionBatchRow::into_model).transpose()
}

pub async fn touch_last_checked(
    conn: &mut PgConnection,
    maintenance_id: &str,
    collection_type: CollectionType,
    switch_hostname: &str,
) -> DatabaseResult<()> {
    let sql = "UPDATE latest_collection_batches SET last_checked_at = $4
               WHERE maintenance_id = $1 AND collection_type = $2 AND switch_hostname = $3";
    sqlx::query(sql)
        .bind(maintenance_id)
        .bind(collection_type.to_string())
        .bind(switch_hostname)
        .bind(Utc::now())
        .execute(conn)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

pub async fn insert_batch(
    conn: &mut PgConnection,
    maintenance_id: &str,
    collection_type: CollectionType,
    switch_hostname: &str,
    raw_data: &str,
    item_count: i32,
) -> DatabaseResult<CollectionBatch> {
    let now = Utc::now();
    let sql = "INSERT INTO collection_batches
               (maintenance_id, collection_type, switch_hostname, raw_data, item_count, collected_at)
               VALUES ($1, $2, $3, $4, $5, $6) RETURNING *";
    let row: CollectionBatchRow = sqlx::query_as(sql)
        .bind(maintenance_id)
        .bind(collection_type.to_string())
        .bind(switch_hostname)
        .bind(raw_data)
        .bind(item_count)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    row.into_model()
}

pub async fn upsert_pointer(
    conn: &mut PgConnection,
    maintenance_id: &str,
    collection_type: CollectionType,
    switch_hostname: &str,
    batch_id: i64,
    data_hash: &str,
) -> DatabaseResult<()> {
    let now = Utc::now();
    let sql = "INSERT INTO latest_collection_batches
               (maintenance_id, collection_type, switch_hostname, batch_id, data_hash, collected_at, last_checked_at)
               VALUES ($1, $2, $3, $4, $5, $6, $6)
               ON CONFLICT (maintenance_id, collection_type, switch_hostname) DO UPDATE SET
                 batch_id = excluded.batch_id,
                 data_hash = excluded.data_hash,
                 collected_at = excluded.collected_at,
                 last_checked_at = excluded.last_checked_at";
    sqlx::query(sql)
        .bind(maintenance_id)
        .bind(collection_type.to_string())
        .bind(switch_hostname)
        .bind(batch_id)
        .bind(data_hash)
        .bind(now)
        .execute(conn)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

pub async fn record_error(
    pool: &PgPool,
    maintenance_id: &str,
    collection_type: CollectionType,
    switch_hostname: &str,
    error_message: &str,
) -> DatabaseResult<CollectionError> {
    let sql = "INSERT INTO collection_errors
               (maintenance_id, collection_type, switch_hostname, error_message, occurred_at)
               VALUES ($1, $2, $3, $4, now()) RETURNING *";
    let row: CollectionErrorRow = sqlx::query_as(sql)
        .bind(maintenance_id)
        .bind(collection_type.to_string())
        .bind(switch_hostname)
        .bind(error_message)
        .fetch_one(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    row.into_model()
}

/// §4.8: delete one maintenance's collection history, in the order the
/// sweeper requires — `LatestCollectionBatch` first (it has no cascade of
/// its own), then `CollectionBatch` (whose cascade drops every typed-record
/// table), then `CollectionError`. The `maintenances` row itself is never
/// touched here.
#[derive(Debug, Clone, Copy, Default)]
pub struct PurgeCounts {
    pub latest_pointers: u64,
    pub batches: u64,
    pub errors: u64,
}

pub async fn purge_for_maintenance(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<PurgeCounts> {
    let mut txn = pool.begin().await.map_err(|err| DatabaseError::query("BEGIN", err))?;

    let sql = "DELETE FROM latest_collection_batches WHERE maintenance_id = $1";
    let latest_pointers = sqlx::query(sql)
        .bind(maintenance_id)
        .execute(&mut *txn)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?
        .rows_affected();

    let sql = "DELETE FROM collection_batches WHERE maintenance_id = $1";
    let batches = sqlx::query(sql)
        .bind(maintenance_id)
        .execute(&mut *txn)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?
        .rows_affected();

    let sql = "DELETE FROM collection_errors WHERE maintenance_id = $1";
    let errors = sqlx::query(sql)
        .bind(maintenance_id)
        .execute(&mut *txn)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?
        .rows_affected();

    txn.commit().await.map_err(|err| DatabaseError::query("COMMIT", err))?;
    Ok(PurgeCounts { latest_pointers, batches, errors })
}

pub async fn list_errors(
    pool: &PgPool,
    maintenance_id: &str,
) -> DatabaseResult<Vec<CollectionError>> {
    let sql = "SELECT * FROM collection_errors WHERE maintenance_id = $1 ORDER BY occurred_at DESC";
    let rows: Vec<CollectionErrorRow> = sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    rows.into_iter().map(CollectionErrorRow::into_model).collect()
}

/// Every device with at least one recorded change point, most-recently
/// changed first — the original's `get_all_changes_summary`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChangeSummary {
    pub switch_hostname: String,
    pub change_count: i64,
    pub first_change: chrono::DateTime<Utc>,
    pub last_change: chrono::DateTime<Utc>,
}

pub async fn changes_summary(
    pool: &PgPool,
    maintenance_id: &str,
    collection_type: CollectionType,
) -> DatabaseResult<Vec<ChangeSummary>> {
    let sql = "SELECT switch_hostname, count(*) AS change_count,
                      min(collected_at) AS first_change, max(collected_at) AS last_change
               FROM collection_batches
               WHERE maintenance_id = $1 AND collection_type = $2
               GROUP BY switch_hostname
               ORDER BY max(collected_at) DESC";
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .bind(collection_type.to_string())
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}
