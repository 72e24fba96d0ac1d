//! Read-Model Services (§2 component #10, §6.2): the query surfaces behind
//! the dashboard and case UI. Pass/fail roll-ups and timeseries math belong
//! to the indicator evaluators in `switchwatch-core`; this module supplies
//! the raw rows and pagination they (and the UI directly) need.

use chrono::{DateTime, Utc};
use model::CollectionType;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{DatabaseError, DatabaseResult};
use crate::typed_records;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "collection_type")]
pub enum RawRows {
    Transceiver(Vec<typed_records::transceiver::TransceiverRow>),
    Fan(Vec<typed_records::fan::FanRow>),
    Power(Vec<typed_records::power::PowerRow>),
    PortChannel(Vec<typed_records::port_channel::PortChannelRow>),
    Neighbor(Vec<typed_records::neighbor::NeighborRow>),
    Version(Vec<typed_records::version::VersionRow>),
    Ping(Vec<typed_records::ping::PingRow>),
    InterfaceError(Vec<typed_records::interface_error::InterfaceErrorRow>),
}

/// `GET /indicators/{name}/rawdata`: the latest-per-device rows backing an
/// indicator, for the 8 collection types an indicator is actually defined
/// over (§4.5). Any other `CollectionType` has no standalone indicator and
/// is rejected.
pub async fn rawdata_for_indicator(
    pool: &PgPool,
    maintenance_id: &str,
    collection_type: CollectionType,
) -> DatabaseResult<RawRows> {
    use CollectionType as C;
    let mut conn = pool.acquire().await.map_err(|err| DatabaseError::query("acquire", err))?;
    Ok(match collection_type {
        C::Transceiver => RawRows::Transceiver(typed_records::transceiver::latest_per_device(&mut conn, maintenance_id).await?),
        C::Fan => RawRows::Fan(typed_records::fan::latest_per_device(&mut conn, maintenance_id).await?),
        C::Power => RawRows::Power(typed_records::power::latest_per_device(&mut conn, maintenance_id).await?),
        C::PortChannel => RawRows::PortChannel(typed_records::port_channel::latest_per_device(&mut conn, maintenance_id).await?),
        C::Neighbor => RawRows::Neighbor(typed_records::neighbor::latest_per_device(&mut conn, maintenance_id).await?),
        C::Version => RawRows::Version(typed_records::version::latest_per_device(&mut conn, maintenance_id).await?),
        C::Ping => RawRows::Ping(typed_records::ping::latest_per_device(&mut conn, maintenance_id).await?),
        C::InterfaceError => RawRows::InterfaceError(typed_records::interface_error::latest_per_device(&mut conn, maintenance_id).await?),
        other => {
            return Err(DatabaseError::InvalidArgument(format!(
                "{other} has no standalone indicator"
            )))
        }
    })
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TimeseriesPoint {
    pub batch_id: i64,
    pub collected_at: DateTime<Utc>,
    pub item_count: i32,
}

/// `GET /indicators/{name}/timeseries`: one point per historical batch for
/// a `(maintenance_id, collection_type, switch_hostname)` triple, paginated
/// oldest-first so UI charts can render a left-to-right timeline.
pub async fn timeseries(
    pool: &PgPool,
    maintenance_id: &str,
    collection_type: CollectionType,
    switch_hostname: &str,
    page: i64,
    page_size: i64,
) -> DatabaseResult<Vec<TimeseriesPoint>> {
    let sql = "SELECT id AS batch_id, collected_at, item_count FROM collection_batches
               WHERE maintenance_id = $1 AND collection_type = $2 AND switch_hostname = $3
               ORDER BY collected_at ASC
               LIMIT $4 OFFSET $5";
    let page_size = page_size.max(1);
    let offset = page.max(0) * page_size;
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .bind(collection_type.to_string())
        .bind(switch_hostname)
        .bind(page_size)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct DashboardBatchCounts {
    pub collection_type: String,
    pub device_count: i64,
    pub last_collected_at: Option<DateTime<Utc>>,
}

/// `GET /dashboard/summary`'s coverage panel: how many devices have a
/// `LatestCollectionBatch` per type, and how fresh. The pass/fail part of
/// the summary comes from running each indicator evaluator, not from here.
pub async fn dashboard_coverage(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<Vec<DashboardBatchCounts>> {
    let sql = "SELECT collection_type, count(*) AS device_count, max(collected_at) AS last_collected_at
               FROM latest_collection_batches
               WHERE maintenance_id = $1
               GROUP BY collection_type
               ORDER BY collection_type";
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}
