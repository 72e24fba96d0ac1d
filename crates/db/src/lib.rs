//! Postgres persistence for the switchwatch workspace. Every query here is
//! a runtime-checked `sqlx::query_as`, never the compile-time `query!`
//! macros — this workspace is never built against a live database.

pub mod case;
pub mod case_note;
pub mod client_record;
pub mod collection_batch;
pub mod csv_import;
pub mod device_list;
pub mod error;
pub mod expectation;
pub mod mac_list;
pub mod maintenance;
pub mod read_model;
pub mod store;
pub mod system_log;
pub mod threshold;
pub mod typed_records;
pub mod user;

pub use error::{DatabaseError, DatabaseResult};

pub type Pool = sqlx::PgPool;

/// Build the connection pool the daemon holds for the rest of its process
/// lifetime. `max_connections` should comfortably cover the fetch
/// concurrency bound (§5) plus scheduler housekeeping queries.
pub async fn connect(database_url: &str, max_connections: u32) -> DatabaseResult<Pool> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|err| DatabaseError::Internal(format!("failed to connect to database: {err}")))
}
