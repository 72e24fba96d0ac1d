//! Transceiver indicator (§4.5): per-field threshold checks against the
//! Threshold Registry, with the "all four fields missing" special case
//! pulled out of the Python original's single long reason string.

use std::collections::HashMap;

use db::error::DatabaseResult;
use db::typed_records::transceiver::TransceiverRow;
use db::Pool;
use model::{EvaluationResult, IndicatorFailure, IndicatorPass};

use crate::threshold_registry::ThresholdRegistry;

const INDICATOR: &str = "transceiver";

struct Field {
    name: &'static str,
    min_key: &'static str,
    max_key: &'static str,
    label: &'static str,
    too_low: &'static str,
    too_high: &'static str,
}

const FIELDS: [Field; 4] = [
    Field {
        name: "tx_power",
        min_key: "transceiver_tx_power_min",
        max_key: "transceiver_tx_power_max",
        label: "Tx Power",
        too_low: "Tx Power 過低",
        too_high: "Tx Power 過高",
    },
    Field {
        name: "rx_power",
        min_key: "transceiver_rx_power_min",
        max_key: "transceiver_rx_power_max",
        label: "Rx Power",
        too_low: "Rx Power 過低",
        too_high: "Rx Power 過高",
    },
    Field {
        name: "temperature",
        min_key: "transceiver_temperature_min",
        max_key: "transceiver_temperature_max",
        label: "溫度",
        too_low: "溫度過低",
        too_high: "溫度過高",
    },
    Field {
        name: "voltage",
        min_key: "transceiver_voltage_min",
        max_key: "transceiver_voltage_max",
        label: "電壓",
        too_low: "電壓過低",
        too_high: "電壓過高",
    },
];

fn value_of(row: &TransceiverRow, field: &str) -> Option<f64> {
    match field {
        "tx_power" => row.tx_power,
        "rx_power" => row.rx_power,
        "temperature" => row.temperature,
        "voltage" => row.voltage,
        _ => None,
    }
}

pub async fn evaluate(pool: &Pool, maintenance_id: &str, thresholds: &ThresholdRegistry<'_>) -> DatabaseResult<EvaluationResult> {
    let active = crate::indicators::active_hostnames(pool, maintenance_id).await?;
    let mut conn = pool.acquire().await.map_err(|err| db::DatabaseError::query("acquire", err))?;
    let rows: Vec<TransceiverRow> = db::typed_records::transceiver::latest_per_device(&mut conn, maintenance_id)
        .await?
        .into_iter()
        .filter(|r| active.contains(&r.switch_hostname))
        .collect();
    drop(conn);

    let mut bounds = HashMap::new();
    for field in &FIELDS {
        let min = thresholds.get_f64(field.min_key).await?;
        let max = thresholds.get_f64(field.max_key).await?;
        bounds.insert(field.name, (min, max));
    }

    let mut field_in_range: HashMap<&str, usize> = HashMap::new();
    let mut field_observed: HashMap<&str, usize> = HashMap::new();

    let mut failures = Vec::new();
    let mut passes = Vec::new();

    for row in &rows {
        let all_missing = FIELDS.iter().all(|f| value_of(row, f.name).is_none());
        if all_missing {
            failures.push(IndicatorFailure {
                device: row.switch_hostname.clone(),
                interface: Some(row.interface_name.clone()),
                reason: "光模塊缺失或無法讀取".to_string(),
            });
            continue;
        }

        let mut reasons = Vec::new();
        for field in &FIELDS {
            let value = value_of(row, field.name);
            let (min, max) = bounds[field.name];
            match value {
                None => reasons.push(format!("{} 缺失", field.label)),
                Some(v) => {
                    *field_observed.entry(field.name).or_insert(0) += 1;
                    let below = min.is_some_and(|min| v < min);
                    let above = max.is_some_and(|max| v > max);
                    if !below && !above {
                        *field_in_range.entry(field.name).or_insert(0) += 1;
                    } else {
                        let range_min = min.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
                        let range_max = max.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
                        let direction = if below { field.too_low } else { field.too_high };
                        reasons.push(format!("{direction}: {v} (範圍: {range_min}~{range_max})"));
                    }
                }
            }
        }

        if reasons.is_empty() {
            passes.push(IndicatorPass {
                device: row.switch_hostname.clone(),
                interface: Some(row.interface_name.clone()),
                reason: "所有欄位在範圍內".to_string(),
            });
        } else {
            failures.push(IndicatorFailure {
                device: row.switch_hostname.clone(),
                interface: Some(row.interface_name.clone()),
                reason: reasons.join(" | "),
            });
        }
    }

    let total = rows.len();
    let pass = passes.len();
    let fail = failures.len();

    let mut pass_rates = HashMap::new();
    for field in &FIELDS {
        let observed = *field_observed.get(field.name).unwrap_or(&0);
        let in_range = *field_in_range.get(field.name).unwrap_or(&0);
        pass_rates.insert(
            field.name.to_string(),
            EvaluationResult::pass_rate_percent(in_range, observed),
        );
    }

    Ok(EvaluationResult {
        indicator: INDICATOR.to_string(),
        maintenance_id: maintenance_id.to_string(),
        total,
        pass,
        fail,
        pass_rates,
        failures,
        passes: crate::indicators::truncate_passes(passes),
        summary: format!("{pass}/{total} transceivers within threshold"),
    })
}
