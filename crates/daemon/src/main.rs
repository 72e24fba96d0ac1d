mod config;

use std::sync::Arc;

use config::DaemonConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = DaemonConfig::load(config_path.as_deref())?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(&config.log_filter);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().compact())
        .with(env_filter)
        .init();

    tracing::info!(database_url = %redact(&config.database_url), "starting switchwatch-daemon");

    let pool = db::connect(&config.database_url, config.max_connections).await?;
    let engine_config = config.build_engine_config();
    let scheduler = Arc::new(core::scheduler::Scheduler::new(pool, engine_config)?);

    let shutdown = scheduler.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received, draining in-flight ticks");
            shutdown.cancel();
        }
    });

    scheduler.run().await;

    tracing::info!("stopped switchwatch-daemon");
    Ok(())
}

/// Strips embedded credentials from a Postgres URL before it hits a log line.
fn redact(database_url: &str) -> String {
    match database_url.split_once('@') {
        Some((_, host_and_rest)) => format!("postgres://***@{host_and_rest}"),
        None => database_url.to_string(),
    }
}
