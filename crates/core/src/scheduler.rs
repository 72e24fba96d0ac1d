//! Scheduler (§4.4, §5): one periodic task per configured job, firing for
//! every active maintenance at tick time, with a `(job, maintenance_id)`
//! non-overlap guarantee and a graceful, grace-period-bounded shutdown.

use std::sync::Arc;

use dashmap::DashSet;
use db::error::DatabaseResult;
use db::Pool;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::{EngineConfig, JobConfig};
use crate::threshold_registry::ThresholdRegistry;

/// All of a job's in-flight `(job, maintenance_id)` work is tracked here so
/// a tick whose predecessor hasn't finished is skipped rather than queued.
pub struct Scheduler {
    pool: Pool,
    config: EngineConfig,
    client: reqwest::Client,
    cancel: CancellationToken,
    in_flight: DashSet<(String, String)>,
}

impl Scheduler {
    pub fn new(pool: Pool, config: EngineConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { pool, config, client, cancel: CancellationToken::new(), in_flight: DashSet::new() })
    }

    /// Clone and hold onto this to trigger shutdown from elsewhere (signal
    /// handler, test harness).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs every enabled job until the shutdown token fires, then waits up
    /// to `graceful_shutdown` for in-flight ticks to finish before
    /// abandoning the rest (§5's cancellation model).
    pub async fn run(self: Arc<Self>) {
        let mut jobs = JoinSet::new();
        for job in self.config.jobs.iter().filter(|j| j.enabled).cloned() {
            let this = self.clone();
            jobs.spawn(async move { this.run_job(job).await });
        }
        while jobs.join_next().await.is_some() {}
    }

    async fn run_job(self: Arc<Self>, job: JobConfig) {
        let mut ticker = tokio::time::interval(job.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut inflight_work: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => self.clone().fire(&job, &mut inflight_work).await,
            }
        }

        tracing::info!(job = %job.name, "draining in-flight ticks before shutdown");
        let grace = tokio::time::sleep(self.config.graceful_shutdown);
        tokio::pin!(grace);
        loop {
            tokio::select! {
                _ = &mut grace => {
                    if !inflight_work.is_empty() {
                        tracing::warn!(job = %job.name, remaining = inflight_work.len(), "grace period elapsed, cancelling in-flight ticks");
                        inflight_work.abort_all();
                    }
                    break;
                }
                next = inflight_work.join_next() => if next.is_none() { break },
            }
        }
        while inflight_work.join_next().await.is_some() {}
    }

    async fn fire(self: Arc<Self>, job: &JobConfig, inflight_work: &mut JoinSet<()>) {
        if job.name == "retention_sweep" {
            self.dispatch(job.clone(), "*".to_string(), inflight_work);
            return;
        }

        let maintenances = match db::maintenance::list_active(&self.pool).await {
            Ok(list) => list,
            Err(err) => {
                tracing::error!(job = %job.name, %err, "failed to list active maintenances");
                return;
            }
        };
        for maintenance in maintenances {
            self.dispatch(job.clone(), maintenance.id, inflight_work);
        }
    }

    fn dispatch(self: &Arc<Self>, job: JobConfig, maintenance_id: String, inflight_work: &mut JoinSet<()>) {
        let key = (job.name.clone(), maintenance_id.clone());
        if !self.in_flight.insert(key.clone()) {
            tracing::warn!(job = %job.name, maintenance_id, "tick skipped: previous invocation still running");
            return;
        }

        let this = self.clone();
        inflight_work.spawn(async move {
            if let Err(err) = this.run_once(&job, &maintenance_id).await {
                tracing::error!(job = %job.name, maintenance_id, %err, "job tick failed");
            }
            this.in_flight.remove(&key);
        });
    }

    async fn run_once(&self, job: &JobConfig, maintenance_id: &str) -> DatabaseResult<()> {
        if let Some(collection_type) = job.collection_type {
            crate::fetchers::run_tick(&self.client, &self.pool, &self.config, maintenance_id, collection_type).await?;
            return Ok(());
        }

        match job.name.as_str() {
            "client_ingest" => {
                crate::fetchers::run_client_tick(&self.client, &self.pool, &self.config, maintenance_id).await?;
            }
            "retention_sweep" => {
                crate::retention::sweep(&self.pool, self.config.retention_grace).await?;
            }
            "case_state_sweep" => {
                crate::case_engine::sync_cases(&self.pool, maintenance_id).await?;
                crate::case_engine::refresh_ping_states(&self.pool, maintenance_id).await?;
                let thresholds = ThresholdRegistry::new(&self.pool, maintenance_id, &self.config.thresholds);
                crate::case_engine::sweep(&self.pool, maintenance_id, &thresholds).await?;
            }
            "change_flag_refresh" => {
                crate::case_engine::refresh_all_change_flags(&self.pool, maintenance_id).await?;
            }
            other => tracing::warn!(job = other, "unrecognized sweep job, skipping"),
        }
        Ok(())
    }
}
