//! Power indicator (§4.5). Shares the per-device "all rows healthy" shape
//! with the fan indicator via `evaluate_status_indicator`.

use std::collections::{HashMap, HashSet};

use db::error::DatabaseResult;
use db::Pool;
use model::{EvaluationResult, IndicatorFailure, IndicatorPass};

use crate::threshold_registry::ThresholdRegistry;

pub async fn evaluate(pool: &Pool, maintenance_id: &str, thresholds: &ThresholdRegistry<'_>) -> DatabaseResult<EvaluationResult> {
    let healthy = thresholds.get_string_set("power_healthy_statuses").await?;
    let active = super::active_hostnames(pool, maintenance_id).await?;
    let mut conn = pool.acquire().await.map_err(|err| db::DatabaseError::query("acquire", err))?;
    let rows = db::typed_records::power::latest_per_device(&mut conn, maintenance_id).await?;
    drop(conn);

    let mut by_device: HashMap<String, Vec<(String, String)>> = HashMap::new();
    for row in rows {
        if active.contains(&row.switch_hostname) {
            by_device.entry(row.switch_hostname).or_default().push((row.ps_id, row.status));
        }
    }

    Ok(evaluate_status_indicator("power", maintenance_id, &active, by_device, &healthy, "未檢測到電源供應器"))
}

/// Shared by the fan and power indicators: a device passes iff every one
/// of its status rows matches the configured healthy set (case-insensitive,
/// trimmed); a device with no rows at all fails with `missing_reason`.
pub(crate) fn evaluate_status_indicator(
    name: &str,
    maintenance_id: &str,
    active: &HashSet<String>,
    by_device: HashMap<String, Vec<(String, String)>>,
    healthy: &[String],
    missing_reason: &str,
) -> EvaluationResult {
    let healthy_lower: HashSet<String> = healthy.iter().map(|s| s.trim().to_lowercase()).collect();

    let mut failures = Vec::new();
    let mut passes = Vec::new();

    for hostname in active {
        match by_device.get(hostname) {
            None => failures.push(IndicatorFailure {
                device: hostname.clone(),
                interface: None,
                reason: missing_reason.to_string(),
            }),
            Some(rows) => {
                let bad: Vec<&(String, String)> = rows
                    .iter()
                    .filter(|(_, status)| !healthy_lower.contains(&status.trim().to_lowercase()))
                    .collect();
                if bad.is_empty() {
                    passes.push(IndicatorPass {
                        device: hostname.clone(),
                        interface: None,
                        reason: format!("{} 個模組狀態正常", rows.len()),
                    });
                } else {
                    let reason = bad
                        .iter()
                        .map(|(id, status)| format!("{id}: {status}"))
                        .collect::<Vec<_>>()
                        .join(" | ");
                    failures.push(IndicatorFailure {
                        device: hostname.clone(),
                        interface: None,
                        reason,
                    });
                }
            }
        }
    }

    let total = active.len();
    let pass = passes.len();
    let fail = failures.len();
    let mut pass_rates = HashMap::new();
    pass_rates.insert("healthy".to_string(), EvaluationResult::pass_rate_percent(pass, total));

    EvaluationResult {
        indicator: name.to_string(),
        maintenance_id: maintenance_id.to_string(),
        total,
        pass,
        fail,
        pass_rates,
        failures,
        passes: super::truncate_passes(passes),
        summary: format!("{pass}/{total} devices healthy"),
    }
}
