//! Error-Count (delta) indicator (§4.5): the only evaluator that walks
//! back one batch per device, diffing CRC counters rather than reading a
//! single snapshot.

use std::collections::HashMap;

use db::error::DatabaseResult;
use db::typed_records::interface_error::InterfaceErrorRow;
use db::Pool;
use model::{EvaluationResult, IndicatorFailure, IndicatorPass};

const INDICATOR: &str = "error_count";

pub async fn evaluate(pool: &Pool, maintenance_id: &str) -> DatabaseResult<EvaluationResult> {
    let active = super::active_hostnames(pool, maintenance_id).await?;
    let mut conn = pool.acquire().await.map_err(|err| db::DatabaseError::query("acquire", err))?;
    let latest_rows: Vec<InterfaceErrorRow> = db::typed_records::interface_error::latest_per_device(&mut conn, maintenance_id)
        .await?
        .into_iter()
        .filter(|r| active.contains(&r.switch_hostname))
        .collect();

    let mut by_device: HashMap<&str, Vec<&InterfaceErrorRow>> = HashMap::new();
    for row in &latest_rows {
        by_device.entry(row.switch_hostname.as_str()).or_default().push(row);
    }

    let mut failures = Vec::new();
    let mut passes = Vec::new();

    for (hostname, rows) in &by_device {
        let latest_batch_id = rows.first().map(|r| r.batch_id);
        let Some(latest_batch_id) = latest_batch_id else { continue };

        let previous_batch_id =
            db::typed_records::interface_error::previous_batch_id(&mut conn, maintenance_id, hostname, latest_batch_id).await?;

        let previous_rows: HashMap<String, i64> = match previous_batch_id {
            None => HashMap::new(),
            Some(batch_id) => db::typed_records::interface_error::rows_for_batch(&mut conn, batch_id)
                .await?
                .into_iter()
                .map(|r| (r.interface_name, r.crc_errors))
                .collect(),
        };

        for row in rows {
            match previous_rows.get(&row.interface_name) {
                None => passes.push(IndicatorPass {
                    device: hostname.to_string(),
                    interface: Some(row.interface_name.clone()),
                    reason: "首次採集，無歷史比對".to_string(),
                }),
                Some(&previous) => {
                    let delta = row.crc_errors - previous;
                    if delta > 0 {
                        failures.push(IndicatorFailure {
                            device: hostname.to_string(),
                            interface: Some(row.interface_name.clone()),
                            reason: format!("CRC 增長 +{delta} ({previous} → {})", row.crc_errors),
                        });
                    } else if delta == 0 {
                        passes.push(IndicatorPass {
                            device: hostname.to_string(),
                            interface: Some(row.interface_name.clone()),
                            reason: "計數器未增長".to_string(),
                        });
                    } else {
                        passes.push(IndicatorPass {
                            device: hostname.to_string(),
                            interface: Some(row.interface_name.clone()),
                            reason: "計數器已重置".to_string(),
                        });
                    }
                }
            }
        }
    }
    drop(conn);

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
        summary: format!("{pass}/{total} interfaces without CRC growth"),
    })
}
