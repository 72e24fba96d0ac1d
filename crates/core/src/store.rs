//! Thin wrapper around `db::store::save_batch` supplying interface-name
//! canonicalisation and the serialisation-conflict retry policy from
//! §4.1's failure semantics — both belong here rather than in `db`, which
//! must stay free of the canonicalisation table and of any engine-level
//! retry/backoff policy.

use std::time::Duration;

use db::error::{DatabaseError, DatabaseResult};
use db::store::SaveOutcome;
use db::Pool;
use model::ParsedItems;

use crate::canonical::canonicalize_interface_name;

const MAX_RETRIES: u32 = 3;

/// Save one device's parsed items for one collection type, retrying up to
/// three times with exponential backoff on a Postgres serialisation
/// failure (SQLSTATE 40001) before surfacing the error to the caller.
pub async fn save(
    pool: &Pool,
    maintenance_id: &str,
    switch_hostname: &str,
    raw_data: &str,
    items: &ParsedItems,
) -> DatabaseResult<SaveOutcome> {
    let mut attempt = 0;
    loop {
        match db::store::save_batch(pool, maintenance_id, switch_hostname, raw_data, items, &canonicalize_interface_name).await {
            Ok(outcome) => return Ok(outcome),
            Err(err) if attempt < MAX_RETRIES && is_serialization_conflict(&err) => {
                attempt += 1;
                let backoff = Duration::from_millis(50 * 2u64.pow(attempt));
                tracing::warn!(maintenance_id, switch_hostname, attempt, "serialisation conflict, retrying");
                tokio::time::sleep(backoff).await;
            }
            Err(err) if is_serialization_conflict(&err) => {
                tracing::error!(maintenance_id, switch_hostname, %err, "serialisation conflict, retries exhausted");
                return Err(err);
            }
            Err(err) => return Err(err),
        }
    }
}

fn is_serialization_conflict(err: &DatabaseError) -> bool {
    match err {
        DatabaseError::Sqlx(annotated) => annotated
            .source
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .is_some_and(|code| code == "40001"),
        _ => false,
    }
}
