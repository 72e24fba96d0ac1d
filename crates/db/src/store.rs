//! The generic typed-record store and change-point strategy (§4.1, P1, P2).
//!
//! Interface-name canonicalisation (§6.3) is owned by `switchwatch-core`,
//! which this crate must not depend on, so `save_batch` takes the
//! canonicaliser as an explicit function argument rather than reaching for
//! a global — the same "context-passed services" discipline as the
//! Threshold Registry and System Log Sink (§9).

use chrono::Utc;
use model::record::TransceiverItem;
use model::{CollectionBatch, CollectionType, ParsedItems};
use sqlx::PgPool;

use crate::collection_batch;
use crate::error::{DatabaseError, DatabaseResult};
use crate::typed_records;

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Unchanged,
    Saved(CollectionBatch),
}

fn canonicalize_interface(items: &ParsedItems, canonicalize: &dyn Fn(&str) -> String) -> ParsedItems {
    use ParsedItems as P;
    match items {
        P::Transceiver(v) => P::Transceiver(
            v.iter()
                .map(|m| {
                    let mut m = m.clone();
                    m.interface_name = canonicalize(&m.interface_name);
                    m
                })
                .collect(),
        ),
        P::PortChannel(v) => P::PortChannel(
            v.iter()
                .map(|i| {
                    let mut i = i.clone();
                    for member in &mut i.member_interfaces {
                        member.interface_name = canonicalize(&member.interface_name);
                    }
                    i
                })
                .collect(),
        ),
        P::Neighbor(v) => P::Neighbor(
            v.iter()
                .map(|i| {
                    let mut i = i.clone();
                    i.local_interface = canonicalize(&i.local_interface);
                    i.neighbor_interface = i.neighbor_interface.as_deref().map(|s| canonicalize(s));
                    i
                })
                .collect(),
        ),
        P::InterfaceError(v) => P::InterfaceError(
            v.iter()
                .map(|i| {
                    let mut i = i.clone();
                    i.interface_name = canonicalize(&i.interface_name);
                    i
                })
                .collect(),
        ),
        P::DynamicAcl(v) => P::DynamicAcl(
            v.iter()
                .map(|i| {
                    let mut i = i.clone();
                    i.interface_name = canonicalize(&i.interface_name);
                    i
                })
                .collect(),
        ),
        P::MacTable(v) => P::MacTable(
            v.iter()
                .map(|i| {
                    let mut i = i.clone();
                    i.interface_name = canonicalize(&i.interface_name);
                    i
                })
                .collect(),
        ),
        P::InterfaceStatus(v) => P::InterfaceStatus(
            v.iter()
                .map(|i| {
                    let mut i = i.clone();
                    i.interface_name = canonicalize(&i.interface_name);
                    i
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

fn flatten_transceiver(items: &ParsedItems) -> Option<Vec<TransceiverItem>> {
    match items {
        ParsedItems::Transceiver(modules) => {
            Some(modules.iter().flat_map(|m| m.flatten()).collect())
        }
        _ => None,
    }
}

/// Step 1 (normalise) + step 2 (hash) + steps 3-5 (compare/write) of §4.1,
/// inside one transaction so a device's write is atomic.
pub async fn save_batch(
    pool: &PgPool,
    maintenance_id: &str,
    switch_hostname: &str,
    raw_data: &str,
    items: &ParsedItems,
    canonicalize: &dyn Fn(&str) -> String,
) -> DatabaseResult<SaveOutcome> {
    let collection_type = items.collection_type();
    if matches!(collection_type, CollectionType::ClientPing | CollectionType::Client) {
        return Err(DatabaseError::InvalidArgument(format!(
            "{collection_type} is ingested via client_record, not the typed-record store"
        )));
    }

    let canonicalized = canonicalize_interface(items, canonicalize);
    let flattened_transceiver = flatten_transceiver(&canonicalized);
    let data_hash = hash_items(&canonicalized, flattened_transceiver.as_deref())?;
    let item_count = flattened_transceiver
        .as_ref()
        .map(Vec::len)
        .unwrap_or_else(|| canonicalized.item_count()) as i32;

    let mut txn = pool.begin().await.map_err(|err| DatabaseError::query("begin", err))?;

    let latest =
        collection_batch::find_latest(&mut txn, maintenance_id, collection_type, switch_hostname)
            .await?;

    if let Some(latest) = &latest {
        if latest.data_hash == data_hash {
            collection_batch::touch_last_checked(
                &mut txn,
                maintenance_id,
                collection_type,
                switch_hostname,
            )
            .await?;
            txn.commit().await.map_err(|err| DatabaseError::query("commit", err))?;
            return Ok(SaveOutcome::Unchanged);
        }
    }

    let batch = collection_batch::insert_batch(
        &mut txn,
        maintenance_id,
        collection_type,
        switch_hostname,
        raw_data,
        item_count,
    )
    .await?;
    let collected_at = batch.collected_at;

    insert_typed_rows(&mut txn, batch.id, maintenance_id, switch_hostname, collected_at, &canonicalized, flattened_transceiver.as_deref())
        .await?;

    collection_batch::upsert_pointer(
        &mut txn,
        maintenance_id,
        collection_type,
        switch_hostname,
        batch.id,
        &data_hash,
    )
    .await?;

    txn.commit().await.map_err(|err| DatabaseError::query("commit", err))?;
    Ok(SaveOutcome::Saved(batch))
}

fn hash_items(
    items: &ParsedItems,
    flattened_transceiver: Option<&[TransceiverItem]>,
) -> DatabaseResult<String> {
    use ParsedItems as P;
    let result = match (items, flattened_transceiver) {
        (P::Transceiver(_), Some(flat)) => model::hash::data_hash(flat),
        (P::PortChannel(v), _) => model::hash::data_hash(v),
        (P::Neighbor(v), _) => model::hash::data_hash(v),
        (P::InterfaceError(v), _) => model::hash::data_hash(v),
        (P::StaticAcl(v), _) => model::hash::data_hash(v),
        (P::DynamicAcl(v), _) => model::hash::data_hash(v),
        (P::MacTable(v), _) => model::hash::data_hash(v),
        (P::Fan(v), _) => model::hash::data_hash(v),
        (P::Power(v), _) => model::hash::data_hash(v),
        (P::Version(v), _) => model::hash::data_hash(v),
        (P::Ping(v), _) => model::hash::data_hash(v),
        (P::InterfaceStatus(v), _) => model::hash::data_hash(v),
        (P::ClientPing(v), _) => model::hash::data_hash(v),
        (P::Client(v), _) => model::hash::data_hash(v),
        (P::Transceiver(_), None) => unreachable!("flattened_transceiver is always Some for Transceiver"),
    };
    result.map_err(|err| DatabaseError::Internal(err.to_string()))
}

#[allow(clippy::too_many_arguments)]
async fn insert_typed_rows(
    conn: &mut sqlx::PgConnection,
    batch_id: i64,
    maintenance_id: &str,
    switch_hostname: &str,
    collected_at: chrono::DateTime<Utc>,
    items: &ParsedItems,
    flattened_transceiver: Option<&[TransceiverItem]>,
) -> DatabaseResult<()> {
    use ParsedItems as P;
    match items {
        P::Transceiver(_) => {
            let flat = flattened_transceiver.expect("flattened before insert");
            typed_records::transceiver::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, flat).await
        }
        P::PortChannel(v) => {
            typed_records::port_channel::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, v).await
        }
        P::Neighbor(v) => {
            typed_records::neighbor::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, v).await
        }
        P::InterfaceError(v) => {
            typed_records::interface_error::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, v).await
        }
        P::StaticAcl(v) => {
            typed_records::static_acl::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, v).await
        }
        P::DynamicAcl(v) => {
            typed_records::dynamic_acl::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, v).await
        }
        P::MacTable(v) => {
            typed_records::mac_table::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, v).await
        }
        P::Fan(v) => {
            typed_records::fan::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, v).await
        }
        P::Power(v) => {
            typed_records::power::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, v).await
        }
        P::Version(v) => {
            typed_records::version::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, v).await
        }
        P::Ping(v) => {
            typed_records::ping::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, v).await
        }
        P::InterfaceStatus(v) => {
            typed_records::interface_status::insert_all(conn, batch_id, maintenance_id, switch_hostname, collected_at, v).await
        }
        P::ClientPing(_) | P::Client(_) => unreachable!("rejected earlier in save_batch"),
    }
}
