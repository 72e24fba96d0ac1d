//! Retention Sweeper (§4.8): purges collection history for maintenances
//! that have been inactive longer than the configured grace period.
//! Maintenance metadata itself is never touched here — only an operator's
//! explicit `db::maintenance::delete` removes the row (P8).

use chrono::Utc;
use db::error::DatabaseResult;
use db::system_log::LogEntry;
use db::Pool;
use model::LogLevel;
use std::time::Duration;

/// Aggregate counts across every maintenance swept this tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    pub maintenances_swept: usize,
    pub latest_pointers_deleted: u64,
    pub batches_deleted: u64,
    pub errors_deleted: u64,
}

/// Find every inactive maintenance whose grace period has elapsed and
/// purge its collection history. `grace` is measured from
/// `Maintenance.deactivated_at`, not `updated_at` — a maintenance can be
/// edited (e.g. its device list corrected) long after deactivation without
/// resetting the sweeper's clock.
pub async fn sweep(pool: &Pool, grace: Duration) -> DatabaseResult<SweepReport> {
    let cutoff = Utc::now() - chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::zero());
    let mut report = SweepReport::default();

    for maintenance in db::maintenance::list_all(pool).await? {
        if maintenance.is_active {
            continue;
        }
        let Some(deactivated_at) = maintenance.deactivated_at else {
            continue;
        };
        if deactivated_at > cutoff {
            continue;
        }

        let counts = db::collection_batch::purge_for_maintenance(pool, &maintenance.id).await?;
        report.maintenances_swept += 1;
        report.latest_pointers_deleted += counts.latest_pointers;
        report.batches_deleted += counts.batches;
        report.errors_deleted += counts.errors;
        tracing::info!(
            maintenance_id = %maintenance.id,
            latest_pointers = counts.latest_pointers,
            batches = counts.batches,
            errors = counts.errors,
            "purged expired maintenance's collection history",
        );
        db::system_log::write(
            pool,
            LogLevel::Info,
            LogEntry {
                source: "retention".to_string(),
                module: "sweep".to_string(),
                summary: format!(
                    "purged {} batch(es), {} pointer(s), {} error(s)",
                    counts.batches, counts.latest_pointers, counts.errors
                ),
                maintenance_id: Some(maintenance.id.clone()),
                ..Default::default()
            },
        )
        .await;
    }

    Ok(report)
}
