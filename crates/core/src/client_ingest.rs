//! Client ingestion: merges one tick's `ClientPing` and `Client` (snapshot)
//! parsed items into `ClientRecord` rows, keyed by MAC address, then hands
//! each to `db::client_record::save`'s change-point pointer (§3, §4.7.2).
//!
//! Unlike the 12 typed-record collection types, these two never get a
//! `CollectionBatch` row of their own — the merge happens here, in the
//! engine, rather than in the generic store.

use std::collections::HashMap;

use chrono::Utc;
use db::error::DatabaseResult;
use db::store::SaveOutcome;
use db::Pool;
use model::record::{ClientPingItem, ClientSnapshotItem};
use model::ClientRecord;

#[derive(Default)]
struct Merged {
    switch_hostname: Option<String>,
    interface_name: Option<String>,
    vlan_id: Option<i32>,
    speed: Option<String>,
    duplex: Option<String>,
    link_status: Option<String>,
    ping_reachable: Option<bool>,
    acl_passes: Option<bool>,
}

/// Merge one tick's ping and snapshot items and persist a `ClientRecord`
/// per MAC, returning how many rows actually changed.
pub async fn ingest(
    pool: &Pool,
    maintenance_id: &str,
    pings: &[ClientPingItem],
    snapshots: &[ClientSnapshotItem],
) -> DatabaseResult<usize> {
    let mut merged: HashMap<String, Merged> = HashMap::new();

    for snapshot in snapshots {
        let entry = merged.entry(snapshot.mac_address.clone()).or_default();
        entry.switch_hostname = Some(snapshot.switch_hostname.clone());
        entry.interface_name = snapshot.interface_name.clone();
        entry.vlan_id = snapshot.vlan_id;
        entry.speed = snapshot.speed.clone();
        entry.duplex = snapshot.duplex.clone();
        entry.link_status = snapshot.link_status.clone();
        entry.acl_passes = snapshot.acl_passes;
    }
    for ping in pings {
        let entry = merged.entry(ping.mac_address.clone()).or_default();
        entry.ping_reachable = ping.is_reachable;
    }

    let collected_at = Utc::now();
    let mut changed = 0;
    for (mac_address, fields) in merged {
        let record = ClientRecord {
            maintenance_id: maintenance_id.to_string(),
            mac_address,
            switch_hostname: fields.switch_hostname,
            interface_name: fields.interface_name,
            vlan_id: fields.vlan_id,
            speed: fields.speed,
            duplex: fields.duplex,
            link_status: fields.link_status,
            ping_reachable: fields.ping_reachable,
            acl_passes: fields.acl_passes,
            collected_at,
        };
        if let SaveOutcome::Saved(_) = db::client_record::save(pool, &record).await? {
            changed += 1;
        }
    }
    Ok(changed)
}
