use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a `SystemLog` entry (§3). Kept as a small closed set rather
/// than a free-form string so the dashboard can group reliably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = crate::error::ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(crate::error::ModelError::InvalidLogLevel(other.to_string())),
        }
    }
}

/// A structured error record (§3, §4.9), written through a session
/// independent of the caller's transaction so it survives rollback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemLog {
    pub id: i64,
    pub level: LogLevel,
    pub source: String,
    pub module: String,
    pub summary: String,
    pub detail: Option<serde_json::Value>,
    pub user: Option<String>,
    pub maintenance_id: Option<String>,
    pub request_path: Option<String>,
    pub request_method: Option<String>,
    pub status_code: Option<i32>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
