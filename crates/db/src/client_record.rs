//! `ClientRecord` / `LatestClientRecord` (§3): the per-MAC time series fed
//! by the `ClientPing` and `Client` collection types. Unlike the typed
//! record tables, these two collection types never get a `CollectionBatch`
//! row — `client_ingest` (in `switchwatch-core`) merges them and calls
//! straight into this change-point pointer instead.

use chrono::Utc;
use model::{ClientRecord, LatestClientRecord};
use sqlx::PgPool;

use crate::error::{DatabaseError, DatabaseResult};
use crate::store::SaveOutcome;

pub async fn find_latest_pointer(
    pool: &PgPool,
    maintenance_id: &str,
    mac_address: &str,
) -> DatabaseResult<Option<LatestClientRecord>> {
    let sql = "SELECT * FROM latest_client_records WHERE maintenance_id = $1 AND mac_address = $2";
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .bind(mac_address)
        .fetch_optional(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

/// Same change-point shape as `store::save_batch`, specialised to a
/// single `ClientRecord` rather than a per-device batch of typed rows.
pub async fn save(pool: &PgPool, record: &ClientRecord) -> DatabaseResult<SaveOutcome> {
    let data_hash = model::hash::data_hash(std::slice::from_ref(record))
        .map_err(|err| DatabaseError::Internal(err.to_string()))?;

    let mut txn = pool.begin().await.map_err(|err| DatabaseError::query("begin", err))?;

    let sql = "SELECT * FROM latest_client_records WHERE maintenance_id = $1 AND mac_address = $2";
    let latest: Option<LatestClientRecord> = sqlx::query_as(sql)
        .bind(&record.maintenance_id)
        .bind(&record.mac_address)
        .fetch_optional(&mut *txn)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;

    let now = Utc::now();
    if let Some(latest) = &latest {
        if latest.data_hash == data_hash {
            let sql = "UPDATE latest_client_records SET last_checked_at = $3
                       WHERE maintenance_id = $1 AND mac_address = $2";
            sqlx::query(sql)
                .bind(&record.maintenance_id)
                .bind(&record.mac_address)
                .bind(now)
                .execute(&mut *txn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
            txn.commit().await.map_err(|err| DatabaseError::query("commit", err))?;
            return Ok(SaveOutcome::Unchanged);
        }
    }

    let insert_sql = "INSERT INTO client_records
               (maintenance_id, mac_address, switch_hostname, interface_name, vlan_id,
                speed, duplex, link_status, ping_reachable, acl_passes, collected_at)
               VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)";
    sqlx::query(insert_sql)
        .bind(&record.maintenance_id)
        .bind(&record.mac_address)
        .bind(&record.switch_hostname)
        .bind(&record.interface_name)
        .bind(record.vlan_id)
        .bind(&record.speed)
        .bind(&record.duplex)
        .bind(&record.link_status)
        .bind(record.ping_reachable)
        .bind(record.acl_passes)
        .bind(record.collected_at)
        .execute(&mut *txn)
        .await
        .map_err(|err| DatabaseError::query(insert_sql, err))?;

    let upsert_sql = "INSERT INTO latest_client_records
               (maintenance_id, mac_address, data_hash, collected_at, last_checked_at)
               VALUES ($1,$2,$3,$4,$4)
               ON CONFLICT (maintenance_id, mac_address) DO UPDATE SET
                 data_hash = excluded.data_hash,
                 collected_at = excluded.collected_at,
                 last_checked_at = excluded.last_checked_at";
    sqlx::query(upsert_sql)
        .bind(&record.maintenance_id)
        .bind(&record.mac_address)
        .bind(&data_hash)
        .bind(now)
        .execute(&mut *txn)
        .await
        .map_err(|err| DatabaseError::query(upsert_sql, err))?;

    txn.commit().await.map_err(|err| DatabaseError::query("commit", err))?;
    Ok(SaveOutcome::Saved(placeholder_batch(record)))
}

/// `SaveOutcome::Saved` carries a `CollectionBatch` because it is shared
/// with `store::save_batch`; client records have no batch row of their own,
/// so callers that only care about change-vs-unchanged should match on the
/// variant, not this placeholder's fields.
fn placeholder_batch(record: &ClientRecord) -> model::CollectionBatch {
    model::CollectionBatch {
        id: 0,
        maintenance_id: record.maintenance_id.clone(),
        collection_type: model::CollectionType::Client,
        switch_hostname: record.switch_hostname.clone().unwrap_or_default(),
        raw_data: String::new(),
        item_count: 1,
        collected_at: record.collected_at,
    }
}

pub async fn history_for_mac(
    pool: &PgPool,
    maintenance_id: &str,
    mac_address: &str,
) -> DatabaseResult<Vec<ClientRecord>> {
    let sql = "SELECT * FROM client_records
               WHERE maintenance_id = $1 AND mac_address = $2
               ORDER BY collected_at ASC";
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .bind(mac_address)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn latest_for_maintenance(
    pool: &PgPool,
    maintenance_id: &str,
) -> DatabaseResult<Vec<ClientRecord>> {
    let sql = "SELECT DISTINCT ON (mac_address) *
               FROM client_records
               WHERE maintenance_id = $1
               ORDER BY mac_address, collected_at DESC";
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}
