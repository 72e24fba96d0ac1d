//! Process configuration: a TOML file overlaid with `SWITCHWATCH_`-prefixed
//! environment variables, loaded once at startup via `figment`. Everything
//! the engine itself needs beyond this (thresholds, job intervals, endpoint
//! routing) keeps sensible built-in defaults from `core::config::EngineConfig`
//! — this struct only carries the handful of values that differ per
//! deployment (database location, upstream base URLs, log verbosity).

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub log_filter: String,
    pub fna_base_url: String,
    pub dna_base_url: String,
    pub gnms_ping_base_url: String,
    #[serde(with = "humantime_serde")]
    pub graceful_shutdown: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://switchwatch@localhost/switchwatch".to_string(),
            max_connections: 20,
            log_filter: "info".to_string(),
            fna_base_url: "http://fna.internal".to_string(),
            dna_base_url: "http://dna.internal".to_string(),
            gnms_ping_base_url: "http://gnms-ping.internal".to_string(),
            graceful_shutdown: Duration::from_secs(30),
        }
    }
}

impl DaemonConfig {
    /// Merges, in increasing precedence: built-in defaults, an optional
    /// TOML file, then `SWITCHWATCH_*` environment variables.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("SWITCHWATCH_")).extract()
    }

    /// Applies the deployment-specific overrides on top of the engine's
    /// built-in thresholds/jobs/endpoint routing (§4.2, §4.4, §4.6).
    pub fn build_engine_config(&self) -> core::config::EngineConfig {
        let mut config = core::config::EngineConfig::default();
        for source in &mut config.sources {
            source.base_url = match source.name {
                model::Source::Fna => self.fna_base_url.clone(),
                model::Source::Dna => self.dna_base_url.clone(),
                model::Source::GnmsPing => self.gnms_ping_base_url.clone(),
            };
        }
        config.graceful_shutdown = self.graceful_shutdown;
        config
    }
}
