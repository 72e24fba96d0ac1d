use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A scheduled upgrade window — the unit of data isolation (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Maintenance {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub active_seconds_accumulated: i64,
    pub last_activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    #[sqlx(json)]
    pub config_data: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which side of a device-list row is presently in service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceSide {
    Old,
    New,
}

/// One row of `MaintenanceDeviceList` (§3). `is_replaced` tracks whether a
/// NEW side has actually been filled in; when both sides are populated but
/// `is_replaced` wasn't explicitly set, NEW wins (§9(b)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceListEntry {
    pub maintenance_id: String,
    pub old_hostname: String,
    pub old_ip: String,
    pub old_vendor: Option<String>,
    pub new_hostname: Option<String>,
    pub new_ip: Option<String>,
    pub new_vendor: Option<String>,
    pub is_replaced: Option<bool>,
    pub use_same_port: bool,
    pub tenant_group: Option<String>,
    pub is_reachable: Option<bool>,
    pub last_check_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl DeviceListEntry {
    /// The device currently in service: NEW if replaced (or ambiguous with
    /// a NEW side present), OLD otherwise. See §9(b).
    pub fn active_side(&self) -> DeviceSide {
        let has_new = self.new_hostname.is_some() && self.new_ip.is_some();
        match self.is_replaced {
            Some(true) => DeviceSide::New,
            Some(false) => DeviceSide::Old,
            None if has_new => DeviceSide::New,
            None => DeviceSide::Old,
        }
    }

    pub fn active_hostname(&self) -> &str {
        match self.active_side() {
            DeviceSide::New => self.new_hostname.as_deref().unwrap_or(&self.old_hostname),
            DeviceSide::Old => &self.old_hostname,
        }
    }

    pub fn active_ip(&self) -> &str {
        match self.active_side() {
            DeviceSide::New => self.new_ip.as_deref().unwrap_or(&self.old_ip),
            DeviceSide::Old => &self.old_ip,
        }
    }

    pub fn active_vendor(&self) -> Option<&str> {
        match self.active_side() {
            DeviceSide::New => self.new_vendor.as_deref().or(self.old_vendor.as_deref()),
            DeviceSide::Old => self.old_vendor.as_deref(),
        }
    }
}

/// One row of `MaintenanceMacList` (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MacListEntry {
    pub maintenance_id: String,
    pub mac_address: String,
    pub description: Option<String>,
    pub default_assignee: Option<String>,
    pub ip_address: Option<String>,
    pub tenant_group: Option<String>,
}

/// Normalise a MAC address to upper-case colon form, e.g.
/// `aa-bb-cc-dd-ee-ff` or `aabb.ccdd.eeff` → `AA:BB:CC:DD:EE:FF`.
pub fn normalize_mac(raw: &str) -> Result<String, crate::error::ModelError> {
    let hex: String = raw.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() != 12 {
        return Err(crate::error::ModelError::InvalidMacAddress(raw.to_string()));
    }
    let upper = hex.to_ascii_uppercase();
    let parts: Vec<&str> = (0..12).step_by(2).map(|i| &upper[i..i + 2]).collect();
    Ok(parts.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_various_mac_formats() {
        assert_eq!(normalize_mac("aa:bb:cc:dd:ee:ff").unwrap(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(normalize_mac("aa-bb-cc-dd-ee-ff").unwrap(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(normalize_mac("aabb.ccdd.eeff").unwrap(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(normalize_mac("AABBCCDDEEFF").unwrap(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn rejects_malformed_mac() {
        assert!(normalize_mac("not-a-mac").is_err());
    }

    #[test]
    fn new_wins_when_is_replaced_absent() {
        let entry = DeviceListEntry {
            maintenance_id: "m1".into(),
            old_hostname: "old-sw".into(),
            old_ip: "10.0.0.1".into(),
            old_vendor: Some("HPE".into()),
            new_hostname: Some("new-sw".into()),
            new_ip: Some("10.0.0.2".into()),
            new_vendor: Some("Cisco-IOS".into()),
            is_replaced: None,
            use_same_port: true,
            tenant_group: None,
            is_reachable: None,
            last_check_at: None,
            description: None,
        };
        assert_eq!(entry.active_side(), DeviceSide::New);
        assert_eq!(entry.active_hostname(), "new-sw");
    }

    #[test]
    fn old_wins_when_no_new_side_present() {
        let entry = DeviceListEntry {
            maintenance_id: "m1".into(),
            old_hostname: "old-sw".into(),
            old_ip: "10.0.0.1".into(),
            old_vendor: Some("HPE".into()),
            new_hostname: None,
            new_ip: None,
            new_vendor: None,
            is_replaced: None,
            use_same_port: true,
            tenant_group: None,
            is_reachable: None,
            last_check_at: None,
            description: None,
        };
        assert_eq!(entry.active_side(), DeviceSide::Old);
        assert_eq!(entry.active_hostname(), "old-sw");
    }
}
