use serde::{Deserialize, Serialize};

/// Desired uplink topology for one local interface of a device (§3).
/// Unique key: `(maintenance_id, hostname, local_interface)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UplinkExpectation {
    pub maintenance_id: String,
    pub hostname: String,
    pub local_interface: String,
    pub expected_neighbor: String,
    pub expected_interface: Option<String>,
}

/// Desired firmware version for a device. Unique key:
/// `(maintenance_id, hostname)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VersionExpectation {
    pub maintenance_id: String,
    pub hostname: String,
    pub expected_version: String,
}

/// Desired port-channel membership. Unique key:
/// `(maintenance_id, hostname, port_channel)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortChannelExpectation {
    pub maintenance_id: String,
    pub hostname: String,
    pub port_channel: String,
    pub member_interfaces: Vec<String>,
}

/// A device expected to be an ARP source. Unique key:
/// `(maintenance_id, hostname)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArpSource {
    pub maintenance_id: String,
    pub hostname: String,
}
