//! Port-Channel indicator (§4.5): five ordered fail reasons, matching
//! actual aggregates to `PortChannelExpectation` rows after canonicalising
//! both sides' interface names so vendor spelling differences collapse.

use std::collections::{HashMap, HashSet};

use db::error::DatabaseResult;
use db::Pool;
use model::{EvaluationResult, IndicatorFailure, IndicatorPass, PortChannelExpectation};

use crate::canonical::canonicalize_interface_name;

const INDICATOR: &str = "port_channel";

pub async fn evaluate(pool: &Pool, maintenance_id: &str) -> DatabaseResult<EvaluationResult> {
    let active = super::active_hostnames(pool, maintenance_id).await?;
    let expectations = db::expectation::list_port_channels(pool, maintenance_id).await?;
    let mut conn = pool.acquire().await.map_err(|err| db::DatabaseError::query("acquire", err))?;
    let rows = db::typed_records::port_channel::latest_per_device(&mut conn, maintenance_id).await?;
    drop(conn);

    let mut by_device: HashMap<&str, Vec<&db::typed_records::port_channel::PortChannelRow>> = HashMap::new();
    for row in &rows {
        by_device.entry(row.switch_hostname.as_str()).or_default().push(row);
    }

    let mut failures = Vec::new();
    let mut passes = Vec::new();

    for expectation in &expectations {
        let PortChannelExpectation { hostname, port_channel, member_interfaces, .. } = expectation;
        if !active.contains(hostname) {
            continue;
        }
        let canon_expected = canonicalize_interface_name(port_channel);
        let reason = match by_device.get(hostname.as_str()) {
            None => Some("no data".to_string()),
            Some(device_rows) => {
                let actual = device_rows
                    .iter()
                    .find(|r| canonicalize_interface_name(&r.port_channel) == canon_expected);
                match actual {
                    None => Some("PC not present".to_string()),
                    Some(actual) => check_actual(actual, member_interfaces),
                }
            }
        };

        match reason {
            None => passes.push(IndicatorPass {
                device: hostname.clone(),
                interface: Some(port_channel.clone()),
                reason: "成員與狀態均符合預期".to_string(),
            }),
            Some(reason) => failures.push(IndicatorFailure {
                device: hostname.clone(),
                interface: Some(port_channel.clone()),
                reason,
            }),
        }
    }

    let total = failures.len() + passes.len();
    let pass = passes.len();
    let fail = failures.len();
    let mut pass_rates = HashMap::new();
    pass_rates.insert("pass".to_string(), EvaluationResult::pass_rate_percent(pass, total));

    Ok(EvaluationResult {
        indicator: INDICATOR.to_string(),
        maintenance_id: maintenance_id.to_string(),
        total,
        pass,
        fail,
        pass_rates,
        failures,
        passes: super::truncate_passes(passes),
        summary: format!("{pass}/{total} port-channels matching expectation"),
    })
}

fn check_actual(
    actual: &db::typed_records::port_channel::PortChannelRow,
    expected_members: &[String],
) -> Option<String> {
    if !matches!(actual.status.as_deref().map(str::to_uppercase).as_deref(), Some("UP")) {
        return Some(format!("PC status != UP (got {:?})", actual.status));
    }

    let actual_members: HashSet<String> = actual
        .member_interfaces
        .0
        .iter()
        .map(|m| canonicalize_interface_name(&m.interface_name))
        .collect();
    let expected_set: HashSet<String> = expected_members.iter().map(|m| canonicalize_interface_name(m)).collect();
    let missing: Vec<&String> = expected_set.difference(&actual_members).collect();
    if !missing.is_empty() {
        return Some(format!("members missing: {}", missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")));
    }

    let down: Vec<&str> = actual
        .member_interfaces
        .0
        .iter()
        .filter(|m| expected_set.contains(&canonicalize_interface_name(&m.interface_name)))
        .filter(|m| m.status.to_uppercase() != "UP")
        .map(|m| m.interface_name.as_str())
        .collect();
    if !down.is_empty() {
        return Some(format!("member(s) not UP: {}", down.join(", ")));
    }

    None
}
