use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One of the 14 payload shapes a maintenance can be polled for.
///
/// The string form is also the scheduler job name and the
/// `CollectionBatch.collection_type` column value, so it must stay
/// stable once deployed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    Transceiver,
    PortChannel,
    Neighbor,
    InterfaceError,
    StaticAcl,
    DynamicAcl,
    MacTable,
    Fan,
    Power,
    Version,
    Ping,
    InterfaceStatus,
    ClientPing,
    Client,
}

impl CollectionType {
    pub const ALL: [CollectionType; 14] = [
        CollectionType::Transceiver,
        CollectionType::PortChannel,
        CollectionType::Neighbor,
        CollectionType::InterfaceError,
        CollectionType::StaticAcl,
        CollectionType::DynamicAcl,
        CollectionType::MacTable,
        CollectionType::Fan,
        CollectionType::Power,
        CollectionType::Version,
        CollectionType::Ping,
        CollectionType::InterfaceStatus,
        CollectionType::ClientPing,
        CollectionType::Client,
    ];
}

/// The vendor OS family a device reports, required by DNA-sourced fetches
/// and used to pick a parser out of the `(collection_type, vendor_os)`
/// registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum VendorOs {
    #[strum(serialize = "HPE")]
    #[serde(rename = "HPE")]
    Hpe,
    #[strum(serialize = "Cisco-IOS")]
    #[serde(rename = "Cisco-IOS")]
    CiscoIos,
    #[strum(serialize = "Cisco-NXOS")]
    #[serde(rename = "Cisco-NXOS")]
    CiscoNxos,
}

/// Which upstream system a fetcher talks to, per §6.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Fna,
    Dna,
    GnmsPing,
}

/// How a fetcher issues requests for a `(maintenance, collection_type)` tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchMode {
    /// One GET per device.
    PerDevice,
    /// One POST carrying every target IP.
    Bulk,
}

/// An append-only change-point row (§3, §4.1). Raw text is kept in full
/// for audit regardless of how small the parsed diff was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionBatch {
    pub id: i64,
    pub maintenance_id: String,
    pub collection_type: CollectionType,
    pub switch_hostname: String,
    pub raw_data: String,
    pub item_count: i32,
    pub collected_at: DateTime<Utc>,
}

/// The mutable `(maintenance_id, collection_type, switch_hostname)`
/// pointer used for O(1) latest-batch lookup (§3, §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestCollectionBatch {
    pub maintenance_id: String,
    pub collection_type: CollectionType,
    pub switch_hostname: String,
    pub batch_id: i64,
    pub data_hash: String,
    pub collected_at: DateTime<Utc>,
    pub last_checked_at: DateTime<Utc>,
}

/// One fetch-or-parse failure for a single device, never aborting the
/// rest of the tick (§4.2, §7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionError {
    pub id: i64,
    pub maintenance_id: String,
    pub collection_type: CollectionType,
    pub switch_hostname: String,
    pub error_message: String,
    pub occurred_at: DateTime<Utc>,
}
