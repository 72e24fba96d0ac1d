//! Fan indicator (§4.5): every fan row's status must be in the configured
//! healthy set; a device passes iff all of its fan rows pass.

use std::collections::HashMap;

use db::error::DatabaseResult;
use db::Pool;
use model::EvaluationResult;

use crate::indicators::power::evaluate_status_indicator;
use crate::threshold_registry::ThresholdRegistry;

pub async fn evaluate(pool: &Pool, maintenance_id: &str, thresholds: &ThresholdRegistry<'_>) -> DatabaseResult<EvaluationResult> {
    let healthy = thresholds.get_string_set("fan_healthy_statuses").await?;
    let active = super::active_hostnames(pool, maintenance_id).await?;
    let mut conn = pool.acquire().await.map_err(|err| db::DatabaseError::query("acquire", err))?;
    let rows = db::typed_records::fan::latest_per_device(&mut conn, maintenance_id).await?;
    drop(conn);

    let mut by_device: HashMap<String, Vec<(String, String)>> = HashMap::new();
    for row in rows {
        if active.contains(&row.switch_hostname) {
            by_device.entry(row.switch_hostname).or_default().push((row.fan_id, row.status));
        }
    }

    Ok(evaluate_status_indicator("fan", maintenance_id, &active, by_device, &healthy, "未檢測到風扇"))
}
