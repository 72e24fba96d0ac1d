//! Operator-declared expectations (§3): uplink topology, firmware version,
//! port-channel membership, and ARP-source designation. Plain upsert/list/
//! delete CRUD — the indicators that compare these against collected state
//! live in `switchwatch-core`.

use model::{ArpSource, PortChannelExpectation, UplinkExpectation, VersionExpectation};
use sqlx::PgPool;

use crate::error::{DatabaseError, DatabaseResult};

pub async fn list_uplinks(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<Vec<UplinkExpectation>> {
    let sql = "SELECT * FROM uplink_expectations WHERE maintenance_id = $1";
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn upsert_uplink(pool: &PgPool, expectation: &UplinkExpectation) -> DatabaseResult<()> {
    let sql = "INSERT INTO uplink_expectations
               (maintenance_id, hostname, local_interface, expected_neighbor, expected_interface)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (maintenance_id, hostname, local_interface) DO UPDATE SET
                 expected_neighbor = excluded.expected_neighbor,
                 expected_interface = excluded.expected_interface";
    sqlx::query(sql)
        .bind(&expectation.maintenance_id)
        .bind(&expectation.hostname)
        .bind(&expectation.local_interface)
        .bind(&expectation.expected_neighbor)
        .bind(&expectation.expected_interface)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

pub async fn delete_uplink(pool: &PgPool, maintenance_id: &str, hostname: &str, local_interface: &str) -> DatabaseResult<()> {
    let sql = "DELETE FROM uplink_expectations WHERE maintenance_id = $1 AND hostname = $2 AND local_interface = $3";
    sqlx::query(sql)
        .bind(maintenance_id)
        .bind(hostname)
        .bind(local_interface)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

pub async fn list_versions(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<Vec<VersionExpectation>> {
    let sql = "SELECT * FROM version_expectations WHERE maintenance_id = $1";
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn upsert_version(pool: &PgPool, expectation: &VersionExpectation) -> DatabaseResult<()> {
    let sql = "INSERT INTO version_expectations (maintenance_id, hostname, expected_version)
               VALUES ($1, $2, $3)
               ON CONFLICT (maintenance_id, hostname) DO UPDATE SET
                 expected_version = excluded.expected_version";
    sqlx::query(sql)
        .bind(&expectation.maintenance_id)
        .bind(&expectation.hostname)
        .bind(&expectation.expected_version)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

pub async fn delete_version(pool: &PgPool, maintenance_id: &str, hostname: &str) -> DatabaseResult<()> {
    let sql = "DELETE FROM version_expectations WHERE maintenance_id = $1 AND hostname = $2";
    sqlx::query(sql)
        .bind(maintenance_id)
        .bind(hostname)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct PortChannelExpectationRow {
    maintenance_id: String,
    hostname: String,
    port_channel: String,
    member_interfaces: sqlx::types::Json<Vec<String>>,
}

impl From<PortChannelExpectationRow> for PortChannelExpectation {
    fn from(row: PortChannelExpectationRow) -> Self {
        PortChannelExpectation {
            maintenance_id: row.maintenance_id,
            hostname: row.hostname,
            port_channel: row.port_channel,
            member_interfaces: row.member_interfaces.0,
        }
    }
}

pub async fn list_port_channels(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<Vec<PortChannelExpectation>> {
    let sql = "SELECT * FROM port_channel_expectations WHERE maintenance_id = $1";
    let rows: Vec<PortChannelExpectationRow> = sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn upsert_port_channel(pool: &PgPool, expectation: &PortChannelExpectation) -> DatabaseResult<()> {
    let sql = "INSERT INTO port_channel_expectations
               (maintenance_id, hostname, port_channel, member_interfaces)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (maintenance_id, hostname, port_channel) DO UPDATE SET
                 member_interfaces = excluded.member_interfaces";
    sqlx::query(sql)
        .bind(&expectation.maintenance_id)
        .bind(&expectation.hostname)
        .bind(&expectation.port_channel)
        .bind(sqlx::types::Json(expectation.member_interfaces.clone()))
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

pub async fn delete_port_channel(pool: &PgPool, maintenance_id: &str, hostname: &str, port_channel: &str) -> DatabaseResult<()> {
    let sql = "DELETE FROM port_channel_expectations WHERE maintenance_id = $1 AND hostname = $2 AND port_channel = $3";
    sqlx::query(sql)
        .bind(maintenance_id)
        .bind(hostname)
        .bind(port_channel)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

pub async fn list_arp_sources(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<Vec<ArpSource>> {
    let sql = "SELECT * FROM arp_sources WHERE maintenance_id = $1";
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn add_arp_source(pool: &PgPool, source: &ArpSource) -> DatabaseResult<()> {
    let sql = "INSERT INTO arp_sources (maintenance_id, hostname) VALUES ($1, $2)
               ON CONFLICT (maintenance_id, hostname) DO NOTHING";
    sqlx::query(sql)
        .bind(&source.maintenance_id)
        .bind(&source.hostname)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

pub async fn remove_arp_source(pool: &PgPool, maintenance_id: &str, hostname: &str) -> DatabaseResult<()> {
    let sql = "DELETE FROM arp_sources WHERE maintenance_id = $1 AND hostname = $2";
    sqlx::query(sql)
        .bind(maintenance_id)
        .bind(hostname)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}
