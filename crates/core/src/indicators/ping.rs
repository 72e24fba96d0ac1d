//! Ping indicator (§4.5): simpler than the Python original's
//! success-rate/80%-threshold model — a device either shows up reachable
//! in the latest batch or it doesn't.

use std::collections::HashMap;

use db::error::DatabaseResult;
use db::Pool;
use model::{EvaluationResult, IndicatorFailure, IndicatorPass};

const INDICATOR: &str = "ping";

pub async fn evaluate(pool: &Pool, maintenance_id: &str) -> DatabaseResult<EvaluationResult> {
    let active = super::active_hostnames(pool, maintenance_id).await?;
    let mut conn = pool.acquire().await.map_err(|err| db::DatabaseError::query("acquire", err))?;
    let rows = db::typed_records::ping::latest_per_device(&mut conn, maintenance_id).await?;
    drop(conn);

    let by_host: HashMap<&str, bool> = rows
        .iter()
        .filter(|r| active.contains(&r.switch_hostname))
        .map(|r| (r.switch_hostname.as_str(), r.is_reachable))
        .collect();

    let mut failures = Vec::new();
    let mut passes = Vec::new();

    for hostname in &active {
        match by_host.get(hostname.as_str()) {
            None => failures.push(IndicatorFailure {
                device: hostname.clone(),
                interface: None,
                reason: "尚無採集數據".to_string(),
            }),
            Some(false) => failures.push(IndicatorFailure {
                device: hostname.clone(),
                interface: None,
                reason: "Ping 不可達".to_string(),
            }),
            Some(true) => passes.push(IndicatorPass {
                device: hostname.clone(),
                interface: None,
                reason: "Ping 可達".to_string(),
            }),
        }
    }

    let total = active.len();
    let pass = passes.len();
    let fail = failures.len();
    let mut pass_rates = HashMap::new();
    pass_rates.insert("reachable".to_string(), EvaluationResult::pass_rate_percent(pass, total));

    Ok(EvaluationResult {
        indicator: INDICATOR.to_string(),
        maintenance_id: maintenance_id.to_string(),
        total,
        pass,
        fail,
        pass_rates,
        failures,
        passes: super::truncate_passes(passes),
        summary: format!("{pass}/{total} devices reachable"),
    })
}
