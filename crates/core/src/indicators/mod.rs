//! Indicator Evaluators (§4.5): one `evaluate(maintenance_id)` per
//! standalone indicator, each reading the latest per-device batch (plus,
//! for the error-count delta, one batch of history) and producing a
//! uniform `model::EvaluationResult`.

pub mod error_count;
pub mod fan;
pub mod port_channel;
pub mod power;
pub mod transceiver;
pub mod uplink;
pub mod version;

mod ping;
pub use ping::evaluate as evaluate_ping;

use std::collections::HashSet;

use db::error::DatabaseResult;
use db::Pool;

/// The active device list for a maintenance, as a set of hostnames.
/// Every evaluator restricts its input to this set before scoring.
pub(crate) async fn active_hostnames(pool: &Pool, maintenance_id: &str) -> DatabaseResult<HashSet<String>> {
    let entries = db::device_list::list(pool, maintenance_id).await?;
    Ok(entries.iter().map(|e| e.active_hostname().to_string()).collect())
}

pub(crate) fn truncate_passes(passes: Vec<model::IndicatorPass>) -> Vec<model::IndicatorPass> {
    passes.into_iter().take(10).collect()
}

/// Run all eight standalone indicators for one maintenance. Each evaluator
/// is independent — one failing to read its tables doesn't block the rest.
pub async fn evaluate_all(
    pool: &Pool,
    maintenance_id: &str,
    thresholds: &crate::threshold_registry::ThresholdRegistry<'_>,
) -> DatabaseResult<Vec<model::EvaluationResult>> {
    Ok(vec![
        transceiver::evaluate(pool, maintenance_id, thresholds).await?,
        fan::evaluate(pool, maintenance_id, thresholds).await?,
        power::evaluate(pool, maintenance_id, thresholds).await?,
        port_channel::evaluate(pool, maintenance_id).await?,
        uplink::evaluate(pool, maintenance_id).await?,
        version::evaluate(pool, maintenance_id).await?,
        error_count::evaluate(pool, maintenance_id).await?,
        evaluate_ping(pool, maintenance_id).await?,
    ])
}
