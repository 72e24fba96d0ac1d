//! Parser registry (§4.3): pure, deterministic transforms from one device's
//! raw upstream text into typed items. Registered by `(collection_type,
//! vendor_os)`; `Ping`, `ClientPing` and `Client` carry no vendor and are
//! parsed the same way regardless of device.
//!
//! Every parser here reads the same wire shape: comma-separated fields,
//! one record per line, with the literal `NULL` standing in for a missing
//! optional field. Parsers never substitute defaults for missing fields —
//! a bare empty or `NULL` field always becomes `None`.

use model::record::{
    ClientPingItem, ClientSnapshotItem, DynamicAclItem, FanItem, InterfaceErrorItem,
    InterfaceStatusItem, MacTableItem, NeighborItem, PingItem, PortChannelItem,
    PortChannelMember, PowerItem, StaticAclItem, TransceiverChannel, TransceiverModule,
    VersionItem,
};
use model::{CollectionType, ParsedItems, VendorOs};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{collection_type} line {line}: {reason}")]
    Malformed { collection_type: CollectionType, line: usize, reason: String },
}

fn malformed(collection_type: CollectionType, line: usize, reason: impl Into<String>) -> ParseError {
    ParseError::Malformed { collection_type, line, reason: reason.into() }
}

fn lines(raw: &str) -> impl Iterator<Item = (usize, &str)> {
    raw.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

fn opt(field: &str) -> Option<&str> {
    if field.is_empty() || field.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(field)
    }
}

fn opt_string(field: &str) -> Option<String> {
    opt(field).map(str::to_string)
}

fn opt_f64(
    collection_type: CollectionType,
    line: usize,
    field: &str,
) -> Result<Option<f64>, ParseError> {
    match opt(field) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| malformed(collection_type, line, format!("not a number: {v}"))),
    }
}

fn opt_i32(collection_type: CollectionType, line: usize, field: &str) -> Result<Option<i32>, ParseError> {
    match opt(field) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| malformed(collection_type, line, format!("not an integer: {v}"))),
    }
}

fn opt_bool(collection_type: CollectionType, line: usize, field: &str) -> Result<Option<bool>, ParseError> {
    match opt(field) {
        None => Ok(None),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            other => Err(malformed(collection_type, line, format!("not a bool: {other}"))),
        },
    }
}

fn require<'a>(
    collection_type: CollectionType,
    line: usize,
    parts: &[&'a str],
    idx: usize,
) -> Result<&'a str, ParseError> {
    parts
        .get(idx)
        .copied()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed(collection_type, line, format!("missing field {idx}")))
}

/// Dispatch a raw payload to the parser registered for `(collection_type,
/// vendor_os)`. `vendor_os` is `None` for the sources that never carry a
/// per-device OS (GNMS-Ping, and the client-table extensions).
pub fn parse(
    collection_type: CollectionType,
    _vendor_os: Option<VendorOs>,
    raw: &str,
) -> Result<ParsedItems, ParseError> {
    match collection_type {
        CollectionType::Transceiver => parse_transceiver(raw).map(ParsedItems::Transceiver),
        CollectionType::PortChannel => parse_port_channel(raw).map(ParsedItems::PortChannel),
        CollectionType::Neighbor => parse_neighbor(raw).map(ParsedItems::Neighbor),
        CollectionType::InterfaceError => parse_interface_error(raw).map(ParsedItems::InterfaceError),
        CollectionType::StaticAcl => parse_static_acl(raw).map(ParsedItems::StaticAcl),
        CollectionType::DynamicAcl => parse_dynamic_acl(raw).map(ParsedItems::DynamicAcl),
        CollectionType::MacTable => parse_mac_table(raw).map(ParsedItems::MacTable),
        CollectionType::Fan => parse_fan(raw).map(ParsedItems::Fan),
        CollectionType::Power => parse_power(raw).map(ParsedItems::Power),
        CollectionType::Version => parse_version(raw).map(ParsedItems::Version),
        CollectionType::Ping => parse_ping(raw).map(ParsedItems::Ping),
        CollectionType::InterfaceStatus => parse_interface_status(raw).map(ParsedItems::InterfaceStatus),
        CollectionType::ClientPing => parse_client_ping(raw).map(ParsedItems::ClientPing),
        CollectionType::Client => parse_client_snapshot(raw).map(ParsedItems::Client),
    }
}

/// `interface,channel_index,tx_power,rx_power,temperature,voltage` — one
/// line per laser channel; consecutive lines sharing `interface` fold into
/// one `TransceiverModule`, matching the flattening rule in reverse.
fn parse_transceiver(raw: &str) -> Result<Vec<TransceiverModule>, ParseError> {
    let ct = CollectionType::Transceiver;
    let mut modules: Vec<TransceiverModule> = Vec::new();
    for (line_no, line) in lines(raw) {
        let parts: Vec<&str> = line.split(',').collect();
        let interface_name = require(ct, line_no, &parts, 0)?.to_string();
        let channel_index: u32 = opt(parts.get(1).copied().unwrap_or(""))
            .unwrap_or("1")
            .parse()
            .map_err(|_| malformed(ct, line_no, "channel_index not an integer"))?;
        let tx_power = opt_f64(ct, line_no, parts.get(2).copied().unwrap_or(""))?;
        let rx_power = opt_f64(ct, line_no, parts.get(3).copied().unwrap_or(""))?;
        let temperature = opt_f64(ct, line_no, parts.get(4).copied().unwrap_or(""))?;
        let voltage = opt_f64(ct, line_no, parts.get(5).copied().unwrap_or(""))?;

        let channel = TransceiverChannel { channel_index, tx_power, rx_power };
        match modules.iter_mut().find(|m| m.interface_name == interface_name) {
            Some(module) => module.channels.push(channel),
            None => modules.push(TransceiverModule {
                interface_name,
                temperature,
                voltage,
                channels: vec![channel],
            }),
        }
    }
    Ok(modules)
}

/// `port_channel,status,member1:status1;member2:status2;...`
fn parse_port_channel(raw: &str) -> Result<Vec<PortChannelItem>, ParseError> {
    let ct = CollectionType::PortChannel;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.splitn(3, ',').collect();
            let port_channel = require(ct, line_no, &parts, 0)?.to_string();
            let status = opt_string(parts.get(1).copied().unwrap_or(""));
            let member_interfaces = parts
                .get(2)
                .copied()
                .unwrap_or("")
                .split(';')
                .filter(|m| !m.is_empty())
                .map(|m| {
                    let (name, status) = m
                        .split_once(':')
                        .ok_or_else(|| malformed(ct, line_no, format!("bad member entry: {m}")))?;
                    Ok(PortChannelMember { interface_name: name.to_string(), status: status.to_string() })
                })
                .collect::<Result<Vec<_>, ParseError>>()?;
            Ok(PortChannelItem { port_channel, status, member_interfaces })
        })
        .collect()
}

/// `local_interface,neighbor_hostname,neighbor_interface`
fn parse_neighbor(raw: &str) -> Result<Vec<NeighborItem>, ParseError> {
    let ct = CollectionType::Neighbor;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.split(',').collect();
            Ok(NeighborItem {
                local_interface: require(ct, line_no, &parts, 0)?.to_string(),
                neighbor_hostname: require(ct, line_no, &parts, 1)?.to_string(),
                neighbor_interface: opt_string(parts.get(2).copied().unwrap_or("")),
            })
        })
        .collect()
}

/// `interface,crc_errors,input_errors,output_errors`
fn parse_interface_error(raw: &str) -> Result<Vec<InterfaceErrorItem>, ParseError> {
    let ct = CollectionType::InterfaceError;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.split(',').collect();
            let crc_field = require(ct, line_no, &parts, 1)?;
            let crc_errors: i64 = crc_field
                .parse()
                .map_err(|_| malformed(ct, line_no, format!("crc_errors not an integer: {crc_field}")))?;
            Ok(InterfaceErrorItem {
                interface_name: require(ct, line_no, &parts, 0)?.to_string(),
                crc_errors,
                input_errors: opt_i32(ct, line_no, parts.get(2).copied().unwrap_or(""))?.map(i64::from),
                output_errors: opt_i32(ct, line_no, parts.get(3).copied().unwrap_or(""))?.map(i64::from),
            })
        })
        .collect()
}

/// `acl_name,sequence,rule_text`
fn parse_static_acl(raw: &str) -> Result<Vec<StaticAclItem>, ParseError> {
    let ct = CollectionType::StaticAcl;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.splitn(3, ',').collect();
            let sequence_field = require(ct, line_no, &parts, 1)?;
            Ok(StaticAclItem {
                acl_name: require(ct, line_no, &parts, 0)?.to_string(),
                sequence: sequence_field
                    .parse()
                    .map_err(|_| malformed(ct, line_no, format!("sequence not an integer: {sequence_field}")))?,
                rule_text: require(ct, line_no, &parts, 2)?.to_string(),
            })
        })
        .collect()
}

/// `interface,acl_name,applied`
fn parse_dynamic_acl(raw: &str) -> Result<Vec<DynamicAclItem>, ParseError> {
    let ct = CollectionType::DynamicAcl;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.split(',').collect();
            let applied_field = require(ct, line_no, &parts, 2)?;
            Ok(DynamicAclItem {
                interface_name: require(ct, line_no, &parts, 0)?.to_string(),
                acl_name: require(ct, line_no, &parts, 1)?.to_string(),
                applied: opt_bool(ct, line_no, applied_field)?.unwrap_or(false),
            })
        })
        .collect()
}

/// `mac_address,vlan_id,interface_name`
fn parse_mac_table(raw: &str) -> Result<Vec<MacTableItem>, ParseError> {
    let ct = CollectionType::MacTable;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.split(',').collect();
            Ok(MacTableItem {
                mac_address: require(ct, line_no, &parts, 0)?.to_string(),
                vlan_id: opt_i32(ct, line_no, parts.get(1).copied().unwrap_or(""))?,
                interface_name: require(ct, line_no, &parts, 2)?.to_string(),
            })
        })
        .collect()
}

/// `fan_id,status`
fn parse_fan(raw: &str) -> Result<Vec<FanItem>, ParseError> {
    let ct = CollectionType::Fan;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.splitn(2, ',').collect();
            Ok(FanItem {
                fan_id: require(ct, line_no, &parts, 0)?.to_string(),
                status: require(ct, line_no, &parts, 1)?.to_string(),
            })
        })
        .collect()
}

/// `ps_id,status`
fn parse_power(raw: &str) -> Result<Vec<PowerItem>, ParseError> {
    let ct = CollectionType::Power;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.splitn(2, ',').collect();
            Ok(PowerItem {
                ps_id: require(ct, line_no, &parts, 0)?.to_string(),
                status: require(ct, line_no, &parts, 1)?.to_string(),
            })
        })
        .collect()
}

/// Whole raw payload is the version string, trimmed. Devices sometimes
/// echo a trailing blank line or CR — `lines()` already drops those.
fn parse_version(raw: &str) -> Result<Vec<VersionItem>, ParseError> {
    let ct = CollectionType::Version;
    match lines(raw).next() {
        Some((_, version)) => Ok(vec![VersionItem { version: version.to_string() }]),
        None => Err(malformed(ct, 1, "empty response")),
    }
}

/// `ip,reachable` — also used directly by the GNMS-Ping bulk fetcher,
/// which slices the returned `Vec` down to one device's row per batch.
pub fn parse_ping(raw: &str) -> Result<Vec<PingItem>, ParseError> {
    let ct = CollectionType::Ping;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.split(',').collect();
            let reachable_field = require(ct, line_no, &parts, 1)?;
            Ok(PingItem {
                ip_address: require(ct, line_no, &parts, 0)?.to_string(),
                is_reachable: opt_bool(ct, line_no, reachable_field)?.unwrap_or(false),
            })
        })
        .collect()
}

/// `interface_name,link_status,speed,duplex`
fn parse_interface_status(raw: &str) -> Result<Vec<InterfaceStatusItem>, ParseError> {
    let ct = CollectionType::InterfaceStatus;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.split(',').collect();
            Ok(InterfaceStatusItem {
                interface_name: require(ct, line_no, &parts, 0)?.to_string(),
                link_status: require(ct, line_no, &parts, 1)?.to_string(),
                speed: opt_string(parts.get(2).copied().unwrap_or("")),
                duplex: opt_string(parts.get(3).copied().unwrap_or("")),
            })
        })
        .collect()
}

/// `mac_address,is_reachable`
fn parse_client_ping(raw: &str) -> Result<Vec<ClientPingItem>, ParseError> {
    let ct = CollectionType::ClientPing;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.split(',').collect();
            Ok(ClientPingItem {
                mac_address: require(ct, line_no, &parts, 0)?.to_string(),
                is_reachable: opt_bool(ct, line_no, parts.get(1).copied().unwrap_or(""))?,
            })
        })
        .collect()
}

/// `mac_address,switch_hostname,interface_name,vlan_id,speed,duplex,link_status,acl_passes`
fn parse_client_snapshot(raw: &str) -> Result<Vec<ClientSnapshotItem>, ParseError> {
    let ct = CollectionType::Client;
    lines(raw)
        .map(|(line_no, line)| {
            let parts: Vec<&str> = line.split(',').collect();
            Ok(ClientSnapshotItem {
                mac_address: require(ct, line_no, &parts, 0)?.to_string(),
                switch_hostname: require(ct, line_no, &parts, 1)?.to_string(),
                interface_name: opt_string(parts.get(2).copied().unwrap_or("")),
                vlan_id: opt_i32(ct, line_no, parts.get(3).copied().unwrap_or(""))?,
                speed: opt_string(parts.get(4).copied().unwrap_or("")),
                duplex: opt_string(parts.get(5).copied().unwrap_or("")),
                link_status: opt_string(parts.get(6).copied().unwrap_or("")),
                acl_passes: opt_bool(ct, line_no, parts.get(7).copied().unwrap_or(""))?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transceiver_folds_channels_by_interface() {
        let raw = "Te1/0/1,1,-2.3,-4.1,35.2,3.3\nTe1/0/1,2,-2.5,-4.0,35.2,3.3\nTe1/0/2,1,NULL,NULL,NULL,NULL\n";
        let modules = parse_transceiver(raw).unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].channels.len(), 2);
        assert_eq!(modules[1].temperature, None);
    }

    #[test]
    fn port_channel_parses_members() {
        let raw = "Po1,UP,Te1/0/1:UP;Te1/0/2:DOWN\n";
        let items = parse_port_channel(raw).unwrap();
        assert_eq!(items[0].member_interfaces.len(), 2);
        assert_eq!(items[0].member_interfaces[1].status, "DOWN");
    }

    #[test]
    fn ping_defaults_missing_reachable_to_false() {
        let raw = "10.0.0.1,true\n10.0.0.2,false\n";
        let items = parse_ping(raw).unwrap();
        assert!(items[0].is_reachable);
        assert!(!items[1].is_reachable);
    }

    #[test]
    fn rejects_malformed_interface_error_line() {
        let raw = "Te1/0/1,not-a-number,0,0\n";
        assert!(parse_interface_error(raw).is_err());
    }

    #[test]
    fn version_takes_first_nonblank_line() {
        let items = parse_version("  \nHPE.07.13.01\n\n").unwrap();
        assert_eq!(items[0].version, "HPE.07.13.01");
    }
}
