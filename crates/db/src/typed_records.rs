//! Per-collection-type typed row tables (§3). Each table carries
//! `batch_id` (FK `ON DELETE CASCADE`), `maintenance_id`, `switch_hostname`,
//! `collected_at` alongside its own columns. `store::save_batch` is the
//! only writer; reads here serve the indicator evaluators and read-model.

use chrono::{DateTime, Utc};
use model::record::{
    DynamicAclItem, FanItem, InterfaceErrorItem, InterfaceStatusItem, MacTableItem, NeighborItem,
    PingItem, PortChannelItem, PowerItem, StaticAclItem, TransceiverItem, VersionItem,
};
use sqlx::PgConnection;

use crate::error::{DatabaseError, DatabaseResult};

pub mod transceiver {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct TransceiverRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub interface_name: String,
        pub tx_power: Option<f64>,
        pub rx_power: Option<f64>,
        pub temperature: Option<f64>,
        pub voltage: Option<f64>,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[TransceiverItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO transceiver_records
                       (batch_id, maintenance_id, switch_hostname, collected_at,
                        interface_name, tx_power, rx_power, temperature, voltage)
                       VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.interface_name)
                .bind(item.tx_power)
                .bind(item.rx_power)
                .bind(item.temperature)
                .bind(item.voltage)
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }

    pub async fn latest_per_device(
        conn: &mut PgConnection,
        maintenance_id: &str,
    ) -> DatabaseResult<Vec<TransceiverRow>> {
        let sql = "SELECT t.* FROM transceiver_records t
                   JOIN latest_collection_batches l ON l.batch_id = t.batch_id
                   WHERE t.maintenance_id = $1 AND l.maintenance_id = $1";
        sqlx::query_as(sql)
            .bind(maintenance_id)
            .fetch_all(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }
}

pub mod fan {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct FanRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub fan_id: String,
        pub status: String,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[FanItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO fan_records
                       (batch_id, maintenance_id, switch_hostname, collected_at, fan_id, status)
                       VALUES ($1,$2,$3,$4,$5,$6)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.fan_id)
                .bind(&item.status)
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }

    pub async fn latest_per_device(
        conn: &mut PgConnection,
        maintenance_id: &str,
    ) -> DatabaseResult<Vec<FanRow>> {
        let sql = "SELECT t.* FROM fan_records t
                   JOIN latest_collection_batches l ON l.batch_id = t.batch_id
                   WHERE t.maintenance_id = $1 AND l.maintenance_id = $1";
        sqlx::query_as(sql)
            .bind(maintenance_id)
            .fetch_all(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }
}

pub mod power {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct PowerRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub ps_id: String,
        pub status: String,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[PowerItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO power_records
                       (batch_id, maintenance_id, switch_hostname, collected_at, ps_id, status)
                       VALUES ($1,$2,$3,$4,$5,$6)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.ps_id)
                .bind(&item.status)
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }

    pub async fn latest_per_device(
        conn: &mut PgConnection,
        maintenance_id: &str,
    ) -> DatabaseResult<Vec<PowerRow>> {
        let sql = "SELECT t.* FROM power_records t
                   JOIN latest_collection_batches l ON l.batch_id = t.batch_id
                   WHERE t.maintenance_id = $1 AND l.maintenance_id = $1";
        sqlx::query_as(sql)
            .bind(maintenance_id)
            .fetch_all(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }
}

pub mod port_channel {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct PortChannelRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub port_channel: String,
        pub status: Option<String>,
        pub member_interfaces: sqlx::types::Json<Vec<model::record::PortChannelMember>>,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[PortChannelItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO port_channel_records
                       (batch_id, maintenance_id, switch_hostname, collected_at,
                        port_channel, status, member_interfaces)
                       VALUES ($1,$2,$3,$4,$5,$6,$7)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.port_channel)
                .bind(&item.status)
                .bind(sqlx::types::Json(&item.member_interfaces))
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }

    pub async fn latest_per_device(
        conn: &mut PgConnection,
        maintenance_id: &str,
    ) -> DatabaseResult<Vec<PortChannelRow>> {
        let sql = "SELECT t.* FROM port_channel_records t
                   JOIN latest_collection_batches l ON l.batch_id = t.batch_id
                   WHERE t.maintenance_id = $1 AND l.maintenance_id = $1";
        sqlx::query_as(sql)
            .bind(maintenance_id)
            .fetch_all(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }
}

pub mod neighbor {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct NeighborRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub local_interface: String,
        pub neighbor_hostname: String,
        pub neighbor_interface: Option<String>,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[NeighborItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO neighbor_records
                       (batch_id, maintenance_id, switch_hostname, collected_at,
                        local_interface, neighbor_hostname, neighbor_interface)
                       VALUES ($1,$2,$3,$4,$5,$6,$7)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.local_interface)
                .bind(&item.neighbor_hostname)
                .bind(&item.neighbor_interface)
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }

    pub async fn latest_per_device(
        conn: &mut PgConnection,
        maintenance_id: &str,
    ) -> DatabaseResult<Vec<NeighborRow>> {
        let sql = "SELECT t.* FROM neighbor_records t
                   JOIN latest_collection_batches l ON l.batch_id = t.batch_id
                   WHERE t.maintenance_id = $1 AND l.maintenance_id = $1";
        sqlx::query_as(sql)
            .bind(maintenance_id)
            .fetch_all(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }
}

pub mod version {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct VersionRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub version: String,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[VersionItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO version_records
                       (batch_id, maintenance_id, switch_hostname, collected_at, version)
                       VALUES ($1,$2,$3,$4,$5)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.version)
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }

    pub async fn latest_per_device(
        conn: &mut PgConnection,
        maintenance_id: &str,
    ) -> DatabaseResult<Vec<VersionRow>> {
        let sql = "SELECT t.* FROM version_records t
                   JOIN latest_collection_batches l ON l.batch_id = t.batch_id
                   WHERE t.maintenance_id = $1 AND l.maintenance_id = $1";
        sqlx::query_as(sql)
            .bind(maintenance_id)
            .fetch_all(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }
}

pub mod ping {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct PingRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub ip_address: String,
        pub is_reachable: bool,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[PingItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO ping_records
                       (batch_id, maintenance_id, switch_hostname, collected_at, ip_address, is_reachable)
                       VALUES ($1,$2,$3,$4,$5,$6)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.ip_address)
                .bind(item.is_reachable)
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }

    pub async fn latest_per_device(
        conn: &mut PgConnection,
        maintenance_id: &str,
    ) -> DatabaseResult<Vec<PingRow>> {
        let sql = "SELECT t.* FROM ping_records t
                   JOIN latest_collection_batches l ON l.batch_id = t.batch_id
                   WHERE t.maintenance_id = $1 AND l.maintenance_id = $1";
        sqlx::query_as(sql)
            .bind(maintenance_id)
            .fetch_all(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }
}

pub mod interface_error {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct InterfaceErrorRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub interface_name: String,
        pub crc_errors: i64,
        pub input_errors: Option<i64>,
        pub output_errors: Option<i64>,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[InterfaceErrorItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO interface_error_records
                       (batch_id, maintenance_id, switch_hostname, collected_at,
                        interface_name, crc_errors, input_errors, output_errors)
                       VALUES ($1,$2,$3,$4,$5,$6,$7,$8)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.interface_name)
                .bind(item.crc_errors)
                .bind(item.input_errors)
                .bind(item.output_errors)
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }

    pub async fn latest_per_device(
        conn: &mut PgConnection,
        maintenance_id: &str,
    ) -> DatabaseResult<Vec<InterfaceErrorRow>> {
        let sql = "SELECT t.* FROM interface_error_records t
                   JOIN latest_collection_batches l ON l.batch_id = t.batch_id
                   WHERE t.maintenance_id = $1 AND l.maintenance_id = $1";
        sqlx::query_as(sql)
            .bind(maintenance_id)
            .fetch_all(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }

    pub async fn rows_for_batch(
        conn: &mut PgConnection,
        batch_id: i64,
    ) -> DatabaseResult<Vec<InterfaceErrorRow>> {
        let sql = "SELECT * FROM interface_error_records WHERE batch_id = $1";
        sqlx::query_as(sql)
            .bind(batch_id)
            .fetch_all(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }

    /// The single most recent batch id strictly before `latest_batch_id`
    /// for this device, used by the error-count delta indicator (§4.5).
    pub async fn previous_batch_id(
        conn: &mut PgConnection,
        maintenance_id: &str,
        switch_hostname: &str,
        latest_batch_id: i64,
    ) -> DatabaseResult<Option<i64>> {
        let sql = "SELECT id FROM collection_batches
                   WHERE maintenance_id = $1 AND switch_hostname = $2
                     AND collection_type = 'interface_error' AND id <> $3
                   ORDER BY collected_at DESC LIMIT 1";
        let row: Option<(i64,)> = sqlx::query_as(sql)
            .bind(maintenance_id)
            .bind(switch_hostname)
            .bind(latest_batch_id)
            .fetch_optional(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))?;
        Ok(row.map(|(id,)| id))
    }
}

pub mod static_acl {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct StaticAclRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub acl_name: String,
        pub sequence: i32,
        pub rule_text: String,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[StaticAclItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO static_acl_records
                       (batch_id, maintenance_id, switch_hostname, collected_at,
                        acl_name, sequence, rule_text)
                       VALUES ($1,$2,$3,$4,$5,$6,$7)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.acl_name)
                .bind(item.sequence)
                .bind(&item.rule_text)
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }
}

pub mod dynamic_acl {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct DynamicAclRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub interface_name: String,
        pub acl_name: String,
        pub applied: bool,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[DynamicAclItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO dynamic_acl_records
                       (batch_id, maintenance_id, switch_hostname, collected_at,
                        interface_name, acl_name, applied)
                       VALUES ($1,$2,$3,$4,$5,$6,$7)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.interface_name)
                .bind(&item.acl_name)
                .bind(item.applied)
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }

    /// The most recent ACL application state for a device — `client_ingest`
    /// reads this to fill `ClientRecord.acl_passes` (`applied` for every
    /// row the client's interface carries).
    pub async fn latest_for_interface(
        conn: &mut PgConnection,
        maintenance_id: &str,
        switch_hostname: &str,
        interface_name: &str,
    ) -> DatabaseResult<Vec<DynamicAclRow>> {
        let sql = "SELECT t.* FROM dynamic_acl_records t
                   JOIN latest_collection_batches l ON l.batch_id = t.batch_id
                   WHERE t.maintenance_id = $1 AND t.switch_hostname = $2 AND t.interface_name = $3";
        sqlx::query_as(sql)
            .bind(maintenance_id)
            .bind(switch_hostname)
            .bind(interface_name)
            .fetch_all(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }
}

pub mod mac_table {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct MacTableRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub mac_address: String,
        pub vlan_id: Option<i32>,
        pub interface_name: String,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[MacTableItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO mac_table_records
                       (batch_id, maintenance_id, switch_hostname, collected_at,
                        mac_address, vlan_id, interface_name)
                       VALUES ($1,$2,$3,$4,$5,$6,$7)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.mac_address)
                .bind(item.vlan_id)
                .bind(&item.interface_name)
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }

    /// Where a MAC currently sits, read from the latest batch of every
    /// device — feeds `client_ingest`'s switch/interface/vlan columns.
    pub async fn find_latest_by_mac(
        conn: &mut PgConnection,
        maintenance_id: &str,
        mac_address: &str,
    ) -> DatabaseResult<Option<MacTableRow>> {
        let sql = "SELECT t.* FROM mac_table_records t
                   JOIN latest_collection_batches l ON l.batch_id = t.batch_id
                   WHERE t.maintenance_id = $1 AND t.mac_address = $2
                   ORDER BY t.collected_at DESC LIMIT 1";
        sqlx::query_as(sql)
            .bind(maintenance_id)
            .bind(mac_address)
            .fetch_optional(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }
}

pub mod interface_status {
    use super::*;

    #[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
    pub struct InterfaceStatusRow {
        pub id: i64,
        pub batch_id: i64,
        pub maintenance_id: String,
        pub switch_hostname: String,
        pub collected_at: DateTime<Utc>,
        pub interface_name: String,
        pub link_status: String,
        pub speed: Option<String>,
        pub duplex: Option<String>,
    }

    pub async fn insert_all(
        conn: &mut PgConnection,
        batch_id: i64,
        maintenance_id: &str,
        switch_hostname: &str,
        collected_at: DateTime<Utc>,
        items: &[InterfaceStatusItem],
    ) -> DatabaseResult<()> {
        for item in items {
            let sql = "INSERT INTO interface_status_records
                       (batch_id, maintenance_id, switch_hostname, collected_at,
                        interface_name, link_status, speed, duplex)
                       VALUES ($1,$2,$3,$4,$5,$6,$7,$8)";
            sqlx::query(sql)
                .bind(batch_id)
                .bind(maintenance_id)
                .bind(switch_hostname)
                .bind(collected_at)
                .bind(&item.interface_name)
                .bind(&item.link_status)
                .bind(&item.speed)
                .bind(&item.duplex)
                .execute(&mut *conn)
                .await
                .map_err(|err| DatabaseError::query(sql, err))?;
        }
        Ok(())
    }

    pub async fn find_latest(
        conn: &mut PgConnection,
        maintenance_id: &str,
        switch_hostname: &str,
        interface_name: &str,
    ) -> DatabaseResult<Option<InterfaceStatusRow>> {
        let sql = "SELECT t.* FROM interface_status_records t
                   JOIN latest_collection_batches l ON l.batch_id = t.batch_id
                   WHERE t.maintenance_id = $1 AND t.switch_hostname = $2 AND t.interface_name = $3";
        sqlx::query_as(sql)
            .bind(maintenance_id)
            .bind(switch_hostname)
            .bind(interface_name)
            .fetch_optional(conn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))
    }
}
