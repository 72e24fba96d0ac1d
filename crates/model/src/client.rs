use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation in a MAC's time series (§3). Append-only; rows for a
/// given MAC form its history, which the case engine's change-flag
/// refresh and indicator `client` evaluator both walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientRecord {
    pub maintenance_id: String,
    pub mac_address: String,
    pub switch_hostname: Option<String>,
    pub interface_name: Option<String>,
    pub vlan_id: Option<i32>,
    pub speed: Option<String>,
    pub duplex: Option<String>,
    pub link_status: Option<String>,
    pub ping_reachable: Option<bool>,
    pub acl_passes: Option<bool>,
    pub collected_at: DateTime<Utc>,
}

/// `(maintenance_id, mac_address)` pointer to the latest `ClientRecord`,
/// mirroring `LatestCollectionBatch` so the client ingester can skip a
/// write when nothing changed (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LatestClientRecord {
    pub maintenance_id: String,
    pub mac_address: String,
    pub data_hash: String,
    pub collected_at: DateTime<Utc>,
    pub last_checked_at: DateTime<Utc>,
}

/// The attributes the case engine tracks for change detection (§4.7.5).
/// Order matches `original_source`'s `TRACKED_ATTRIBUTES` so timelines and
/// change-tag lists present consistently.
pub const TRACKED_ATTRIBUTES: [&str; 7] = [
    "speed",
    "duplex",
    "link_status",
    "ping_reachable",
    "interface_name",
    "vlan_id",
    "acl_rules_applied",
];

impl ClientRecord {
    /// Fetch one tracked attribute's value as a loosely-typed string for
    /// change detection and timeline display. `acl_rules_applied` reads
    /// from `acl_passes`.
    pub fn attribute_value(&self, attribute: &str) -> Option<String> {
        match attribute {
            "speed" => self.speed.clone(),
            "duplex" => self.duplex.clone(),
            "link_status" => self.link_status.clone(),
            "ping_reachable" => self.ping_reachable.map(|b| b.to_string()),
            "interface_name" => self.interface_name.clone(),
            "vlan_id" => self.vlan_id.map(|v| v.to_string()),
            "acl_rules_applied" => self.acl_passes.map(|b| b.to_string()),
            _ => None,
        }
    }

    pub fn attribute_label(attribute: &str) -> &str {
        match attribute {
            "speed" => "速率",
            "duplex" => "雙工",
            "link_status" => "連線狀態",
            "ping_reachable" => "Ping",
            "interface_name" => "介面",
            "vlan_id" => "VLAN",
            "acl_rules_applied" => "ACL",
            other => other,
        }
    }
}
