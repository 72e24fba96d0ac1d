//! §4.9: the log sink writes through the connection pool directly, never
//! through a caller's transaction handle, so a rolled-back request still
//! leaves its log entry committed. The sink never propagates a write
//! failure — callers are not in a position to do anything useful with one.

use model::{LogLevel, SystemLog};
use sqlx::PgPool;
use tracing::error as trace_error;

use crate::error::{DatabaseError, DatabaseResult};

#[derive(Debug, Clone, Default)]
pub struct LogEntry {
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
}

#[derive(sqlx::FromRow)]
struct SystemLogRow {
    id: i64,
    level: String,
    source: String,
    module: String,
    summary: String,
    detail: Option<serde_json::Value>,
    user: Option<String>,
    maintenance_id: Option<String>,
    request_path: Option<String>,
    request_method: Option<String>,
    status_code: Option<i32>,
    ip_address: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

fn row_to_log(row: SystemLogRow) -> DatabaseResult<SystemLog> {
    let level: LogLevel = row
        .level
        .parse()
        .map_err(|err: model::ModelError| DatabaseError::Internal(err.to_string()))?;
    Ok(SystemLog {
        id: row.id,
        level,
        source: row.source,
        module: row.module,
        summary: row.summary,
        detail: row.detail,
        user: row.user,
        maintenance_id: row.maintenance_id,
        request_path: row.request_path,
        request_method: row.request_method,
        status_code: row.status_code,
        ip_address: row.ip_address,
        created_at: row.created_at,
    })
}

async fn try_write(pool: &PgPool, level: LogLevel, entry: &LogEntry) -> DatabaseResult<()> {
    let sql = "INSERT INTO system_logs
               (level, source, module, summary, detail, \"user\", maintenance_id,
                request_path, request_method, status_code, ip_address)
               VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)";
    sqlx::query(sql)
        .bind(level.to_string())
        .bind(&entry.source)
        .bind(&entry.module)
        .bind(&entry.summary)
        .bind(&entry.detail)
        .bind(&entry.user)
        .bind(&entry.maintenance_id)
        .bind(&entry.request_path)
        .bind(&entry.request_method)
        .bind(entry.status_code)
        .bind(&entry.ip_address)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

/// Write a log entry. Never returns an error to the caller — on failure it
/// logs to stderr via `tracing` and returns.
pub async fn write(pool: &PgPool, level: LogLevel, entry: LogEntry) {
    if let Err(err) = try_write(pool, level, &entry).await {
        trace_error!(%err, summary = %entry.summary, "system log sink write failed");
    }
}

pub async fn recent(pool: &PgPool, maintenance_id: Option<&str>, limit: i64) -> DatabaseResult<Vec<SystemLog>> {
    let sql = "SELECT * FROM system_logs
               WHERE $1::text IS NULL OR maintenance_id = $1
               ORDER BY created_at DESC LIMIT $2";
    let rows: Vec<SystemLogRow> = sqlx::query_as(sql)
        .bind(maintenance_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    rows.into_iter().map(row_to_log).collect()
}
