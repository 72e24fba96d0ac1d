use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One failing record, with a human-readable reason (possibly joined from
/// several per-field reasons with ` | `, per §4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFailure {
    pub device: String,
    pub interface: Option<String>,
    pub reason: String,
}

/// A representative passing record (the evaluator truncates these to 10).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPass {
    pub device: String,
    pub interface: Option<String>,
    pub reason: String,
}

/// The uniform shape every indicator evaluator returns (§2 component #6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub indicator: String,
    pub maintenance_id: String,
    pub total: usize,
    pub pass: usize,
    pub fail: usize,
    pub pass_rates: HashMap<String, f64>,
    pub failures: Vec<IndicatorFailure>,
    pub passes: Vec<IndicatorPass>,
    pub summary: String,
}

impl EvaluationResult {
    pub fn pass_rate_percent(pass: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (pass as f64 / total as f64) * 100.0
        }
    }
}
