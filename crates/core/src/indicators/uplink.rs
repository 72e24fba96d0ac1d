//! Uplink indicator (§4.5): the `UplinkExpectation` count is the
//! authoritative total, not the device count — a device with no uplink
//! expectations simply contributes nothing to this indicator.

use std::collections::HashMap;

use db::error::DatabaseResult;
use db::Pool;
use model::{EvaluationResult, IndicatorFailure, IndicatorPass};

const INDICATOR: &str = "uplink";

pub async fn evaluate(pool: &Pool, maintenance_id: &str) -> DatabaseResult<EvaluationResult> {
    let active = super::active_hostnames(pool, maintenance_id).await?;
    let expectations = db::expectation::list_uplinks(pool, maintenance_id).await?;
    let mut conn = pool.acquire().await.map_err(|err| db::DatabaseError::query("acquire", err))?;
    let neighbor_rows = db::typed_records::neighbor::latest_per_device(&mut conn, maintenance_id).await?;
    drop(conn);

    let mut by_device_interface: HashMap<(&str, &str), &db::typed_records::neighbor::NeighborRow> = HashMap::new();
    for row in &neighbor_rows {
        by_device_interface.insert((row.switch_hostname.as_str(), row.local_interface.as_str()), row);
    }

    let mut failures = Vec::new();
    let mut passes = Vec::new();

    for expectation in &expectations {
        if !active.contains(&expectation.hostname) {
            continue;
        }
        let actual = by_device_interface.get(&(expectation.hostname.as_str(), expectation.local_interface.as_str()));
        let matched = actual.is_some_and(|row| {
            row.neighbor_hostname == expectation.expected_neighbor
                && expectation
                    .expected_interface
                    .as_ref()
                    .is_none_or(|expected| row.neighbor_interface.as_deref() == Some(expected.as_str()))
        });

        if matched {
            passes.push(IndicatorPass {
                device: expectation.hostname.clone(),
                interface: Some(expectation.local_interface.clone()),
                reason: format!("uplink to {} confirmed", expectation.expected_neighbor),
            });
        } else {
            let reason = match actual {
                None => "no neighbor data for this interface".to_string(),
                Some(row) => format!(
                    "expected neighbor {} but saw {}",
                    expectation.expected_neighbor, row.neighbor_hostname
                ),
            };
            failures.push(IndicatorFailure {
                device: expectation.hostname.clone(),
                interface: Some(expectation.local_interface.clone()),
                reason,
            });
        }
    }

    let total = expectations.iter().filter(|e| active.contains(&e.hostname)).count();
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
        summary: format!("{pass}/{total} uplinks confirmed"),
    })
}
