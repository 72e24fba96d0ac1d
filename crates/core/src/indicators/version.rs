//! Version indicator (§4.5): exact-match against `VersionExpectation`.

use std::collections::HashMap;

use db::error::DatabaseResult;
use db::Pool;
use model::{EvaluationResult, IndicatorFailure, IndicatorPass};

const INDICATOR: &str = "version";

pub async fn evaluate(pool: &Pool, maintenance_id: &str) -> DatabaseResult<EvaluationResult> {
    let active = super::active_hostnames(pool, maintenance_id).await?;
    let expectations = db::expectation::list_versions(pool, maintenance_id).await?;
    let mut conn = pool.acquire().await.map_err(|err| db::DatabaseError::query("acquire", err))?;
    let rows = db::typed_records::version::latest_per_device(&mut conn, maintenance_id).await?;
    drop(conn);

    let by_device: HashMap<&str, &str> = rows.iter().map(|r| (r.switch_hostname.as_str(), r.version.as_str())).collect();
    let expected_by_device: HashMap<&str, &str> = expectations
        .iter()
        .map(|e| (e.hostname.as_str(), e.expected_version.as_str()))
        .collect();

    let mut failures = Vec::new();
    let mut passes = Vec::new();

    for hostname in &active {
        let Some(expected) = expected_by_device.get(hostname.as_str()) else {
            failures.push(IndicatorFailure {
                device: hostname.clone(),
                interface: None,
                reason: "未定義版本期望".to_string(),
            });
            continue;
        };
        match by_device.get(hostname.as_str()) {
            None => failures.push(IndicatorFailure {
                device: hostname.clone(),
                interface: None,
                reason: "無採集數據".to_string(),
            }),
            Some(actual) if actual == expected => passes.push(IndicatorPass {
                device: hostname.clone(),
                interface: None,
                reason: format!("version {actual} matches"),
            }),
            Some(actual) => failures.push(IndicatorFailure {
                device: hostname.clone(),
                interface: None,
                reason: format!("expected {expected} but found {actual}"),
            }),
        }
    }

    let total = active.len();
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
        summary: format!("{pass}/{total} devices on expected version"),
    })
}
