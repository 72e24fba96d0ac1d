//! Typed items as they come out of a parser, before the store flattens or
//! persists them. Missing optional fields are `None` — parsers never fill
//! in defaults (§4.3).

use serde::{Deserialize, Serialize};

/// One laser channel of a transceiver, as reported by the parser before
/// flattening (§4.3's "special flattening rule").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransceiverChannel {
    pub channel_index: u32,
    pub tx_power: Option<f64>,
    pub rx_power: Option<f64>,
}

/// A transceiver as reported by a parser: one or more laser channels
/// sharing an interface-level temperature/voltage. The store flattens
/// this into one `TransceiverItem` row per channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransceiverModule {
    pub interface_name: String,
    pub temperature: Option<f64>,
    pub voltage: Option<f64>,
    pub channels: Vec<TransceiverChannel>,
}

/// A single flattened transceiver row, as stored and hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransceiverItem {
    pub interface_name: String,
    pub tx_power: Option<f64>,
    pub rx_power: Option<f64>,
    pub temperature: Option<f64>,
    pub voltage: Option<f64>,
}

impl TransceiverModule {
    /// Flatten into one row per channel, carrying interface-level fields
    /// along with each channel's own tx/rx power.
    pub fn flatten(&self) -> Vec<TransceiverItem> {
        if self.channels.is_empty() {
            return vec![TransceiverItem {
                interface_name: self.interface_name.clone(),
                tx_power: None,
                rx_power: None,
                temperature: self.temperature,
                voltage: self.voltage,
            }];
        }
        self.channels
            .iter()
            .map(|c| TransceiverItem {
                interface_name: if self.channels.len() > 1 {
                    format!("{}:{}", self.interface_name, c.channel_index)
                } else {
                    self.interface_name.clone()
                },
                tx_power: c.tx_power,
                rx_power: c.rx_power,
                temperature: self.temperature,
                voltage: self.voltage,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortChannelItem {
    pub port_channel: String,
    /// `None` when the device has no such aggregate at all.
    pub status: Option<String>,
    pub member_interfaces: Vec<PortChannelMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortChannelMember {
    pub interface_name: String,
    pub status: String,
}

/// LLDP/CDP-style neighbor row, used by the uplink indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborItem {
    pub local_interface: String,
    pub neighbor_hostname: String,
    pub neighbor_interface: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceErrorItem {
    pub interface_name: String,
    pub crc_errors: i64,
    pub input_errors: Option<i64>,
    pub output_errors: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticAclItem {
    pub acl_name: String,
    pub sequence: i32,
    pub rule_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicAclItem {
    pub interface_name: String,
    pub acl_name: String,
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacTableItem {
    pub mac_address: String,
    pub vlan_id: Option<i32>,
    pub interface_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanItem {
    pub fan_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerItem {
    pub ps_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionItem {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingItem {
    pub ip_address: String,
    pub is_reachable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceStatusItem {
    pub interface_name: String,
    pub link_status: String,
    pub speed: Option<String>,
    pub duplex: Option<String>,
}

/// A per-client ping observation, feeding `ClientRecord.ping_reachable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPingItem {
    pub mac_address: String,
    pub is_reachable: Option<bool>,
}

/// A per-client snapshot (mac-table + interface-status + vlan joined by
/// the upstream gateway), feeding the rest of `ClientRecord`'s columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSnapshotItem {
    pub mac_address: String,
    pub switch_hostname: String,
    pub interface_name: Option<String>,
    pub vlan_id: Option<i32>,
    pub speed: Option<String>,
    pub duplex: Option<String>,
    pub link_status: Option<String>,
    pub acl_passes: Option<bool>,
}

/// A sum type over every collection type's parsed items, used by the
/// generic collection pipeline (Fetcher → Parser → Store) so a single
/// function signature can carry any of the fourteen shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParsedItems {
    Transceiver(Vec<TransceiverModule>),
    PortChannel(Vec<PortChannelItem>),
    Neighbor(Vec<NeighborItem>),
    InterfaceError(Vec<InterfaceErrorItem>),
    StaticAcl(Vec<StaticAclItem>),
    DynamicAcl(Vec<DynamicAclItem>),
    MacTable(Vec<MacTableItem>),
    Fan(Vec<FanItem>),
    Power(Vec<PowerItem>),
    Version(Vec<VersionItem>),
    Ping(Vec<PingItem>),
    InterfaceStatus(Vec<InterfaceStatusItem>),
    ClientPing(Vec<ClientPingItem>),
    Client(Vec<ClientSnapshotItem>),
}

impl ParsedItems {
    pub fn collection_type(&self) -> crate::collection::CollectionType {
        use crate::collection::CollectionType as C;
        match self {
            ParsedItems::Transceiver(_) => C::Transceiver,
            ParsedItems::PortChannel(_) => C::PortChannel,
            ParsedItems::Neighbor(_) => C::Neighbor,
            ParsedItems::InterfaceError(_) => C::InterfaceError,
            ParsedItems::StaticAcl(_) => C::StaticAcl,
            ParsedItems::DynamicAcl(_) => C::DynamicAcl,
            ParsedItems::MacTable(_) => C::MacTable,
            ParsedItems::Fan(_) => C::Fan,
            ParsedItems::Power(_) => C::Power,
            ParsedItems::Version(_) => C::Version,
            ParsedItems::Ping(_) => C::Ping,
            ParsedItems::InterfaceStatus(_) => C::InterfaceStatus,
            ParsedItems::ClientPing(_) => C::ClientPing,
            ParsedItems::Client(_) => C::Client,
        }
    }

    pub fn item_count(&self) -> usize {
        match self {
            ParsedItems::Transceiver(v) => v.iter().map(|m| m.channels.len().max(1)).sum(),
            ParsedItems::PortChannel(v) => v.len(),
            ParsedItems::Neighbor(v) => v.len(),
            ParsedItems::InterfaceError(v) => v.len(),
            ParsedItems::StaticAcl(v) => v.len(),
            ParsedItems::DynamicAcl(v) => v.len(),
            ParsedItems::MacTable(v) => v.len(),
            ParsedItems::Fan(v) => v.len(),
            ParsedItems::Power(v) => v.len(),
            ParsedItems::Version(v) => v.len(),
            ParsedItems::Ping(v) => v.len(),
            ParsedItems::InterfaceStatus(v) => v.len(),
            ParsedItems::ClientPing(v) => v.len(),
            ParsedItems::Client(v) => v.len(),
        }
    }
}
