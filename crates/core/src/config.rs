//! Process-default thresholds, fetcher sources, and scheduler intervals
//! (§4.6, §4.2, §4.4). Loaded once at startup by the daemon via `figment`
//! and threaded through as an explicit dependency — see the "context-passed
//! services" note in `threshold_registry`.

use model::ThresholdValue;
use std::collections::HashMap;
use std::time::Duration;

/// Defaults for every threshold key the indicator evaluators read through
/// the Threshold Registry. A per-maintenance `ThresholdOverride` row beats
/// whatever is listed here.
#[derive(Debug, Clone)]
pub struct ThresholdDefaults(HashMap<String, ThresholdValue>);

impl Default for ThresholdDefaults {
    fn default() -> Self {
        let mut map = HashMap::new();
        let mut set = |key: &str, value: ThresholdValue| {
            map.insert(key.to_string(), value);
        };
        set("transceiver_tx_power_min", ThresholdValue::Float(-10.0));
        set("transceiver_tx_power_max", ThresholdValue::Float(3.0));
        set("transceiver_rx_power_min", ThresholdValue::Float(-15.0));
        set("transceiver_rx_power_max", ThresholdValue::Float(3.0));
        set("transceiver_temperature_min", ThresholdValue::Float(0.0));
        set("transceiver_temperature_max", ThresholdValue::Float(70.0));
        set("transceiver_voltage_min", ThresholdValue::Float(3.0));
        set("transceiver_voltage_max", ThresholdValue::Float(3.6));
        set(
            "fan_healthy_statuses",
            ThresholdValue::StringSet(vec!["ok".into(), "good".into(), "normal".into(), "active".into()]),
        );
        set(
            "power_healthy_statuses",
            ThresholdValue::StringSet(vec![
                "ok".into(),
                "good".into(),
                "normal".into(),
                "online".into(),
                "active".into(),
            ]),
        );
        set("case_stable_window_seconds", ThresholdValue::Int(600));
        Self(map)
    }
}

impl ThresholdDefaults {
    pub fn get(&self, key: &str) -> Option<&ThresholdValue> {
        self.0.get(key)
    }
}

/// One fetcher source (§4.2, §6.1).
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub name: model::Source,
    pub base_url: String,
    pub auth_token: String,
    pub timeout: Duration,
}

/// Per-`collection_type` routing into a source, matching §6.1's three
/// endpoint shapes. `path_template` may reference `{ip}` and, for DNA,
/// `{vendor_os}`.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub source: model::Source,
    pub path_template: String,
    pub batch_mode: model::BatchMode,
}

/// Routing matches the upstream split: FNA auto-detects vendor and only
/// needs `{ip}` (transceiver, port-channel, the two ACL flavours, and the
/// two client-level extensions); DNA needs `{vendor_os}` too (version,
/// uplink/neighbor, fan, power, error-count, mac-table, interface-status);
/// GNMS-Ping is the lone bulk source.
fn default_endpoints() -> HashMap<model::CollectionType, EndpointConfig> {
    use model::{BatchMode, CollectionType as C, Source};
    let fna = |path: &str| EndpointConfig {
        source: Source::Fna,
        path_template: path.to_string(),
        batch_mode: BatchMode::PerDevice,
    };
    let dna = |path: &str| EndpointConfig {
        source: Source::Dna,
        path_template: path.to_string(),
        batch_mode: BatchMode::PerDevice,
    };
    HashMap::from([
        (C::Transceiver, fna("/fna/transceiver/{ip}")),
        (C::PortChannel, fna("/fna/port-channel/{ip}")),
        (C::StaticAcl, fna("/fna/acl/{ip}")),
        (C::DynamicAcl, fna("/fna/acl/{ip}")),
        (C::ClientPing, fna("/fna/client-ping/{ip}")),
        (C::Client, fna("/fna/client/{ip}")),
        (C::Version, dna("/dna/{vendor_os}/version/{ip}")),
        (C::Neighbor, dna("/dna/{vendor_os}/uplink/{ip}")),
        (C::Fan, dna("/dna/{vendor_os}/fan/{ip}")),
        (C::Power, dna("/dna/{vendor_os}/power/{ip}")),
        (C::InterfaceError, dna("/dna/{vendor_os}/error-count/{ip}")),
        (C::MacTable, dna("/dna/{vendor_os}/mac-table/{ip}")),
        (C::InterfaceStatus, dna("/dna/{vendor_os}/interface-status/{ip}")),
        (
            C::Ping,
            EndpointConfig { source: Source::GnmsPing, path_template: "/ping".to_string(), batch_mode: BatchMode::Bulk },
        ),
    ])
}

/// §4.4: one scheduler job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub name: String,
    pub collection_type: Option<model::CollectionType>,
    pub interval: Duration,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub fetch_concurrency: usize,
    pub graceful_shutdown: Duration,
    pub retention_grace: Duration,
    pub jobs: Vec<JobConfig>,
    pub sources: Vec<SourceConfig>,
    pub endpoints: HashMap<model::CollectionType, EndpointConfig>,
    pub thresholds: ThresholdDefaults,
}

impl EngineConfig {
    pub fn source(&self, name: model::Source) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        use model::CollectionType as C;
        // ClientPing and Client are excluded here: they're merged by MAC
        // into `client_records` rather than stored as typed records, so
        // they ride the dedicated "client_ingest" job below instead of one
        // generic per-collection-type job each.
        let collection_jobs = C::ALL
            .iter()
            .filter(|ct| !matches!(ct, C::ClientPing | C::Client))
            .map(|ct| JobConfig {
                name: ct.to_string(),
                collection_type: Some(*ct),
                interval: Duration::from_secs(300),
                enabled: true,
            });
        let mut jobs: Vec<JobConfig> = collection_jobs.collect();
        jobs.push(JobConfig {
            name: "client_ingest".into(),
            collection_type: None,
            interval: Duration::from_secs(300),
            enabled: true,
        });
        jobs.push(JobConfig {
            name: "retention_sweep".into(),
            collection_type: None,
            interval: Duration::from_secs(3600),
            enabled: true,
        });
        jobs.push(JobConfig {
            name: "case_state_sweep".into(),
            collection_type: None,
            interval: Duration::from_secs(60),
            enabled: true,
        });
        jobs.push(JobConfig {
            name: "change_flag_refresh".into(),
            collection_type: None,
            interval: Duration::from_secs(120),
            enabled: true,
        });

        let sources = vec![
            SourceConfig {
                name: model::Source::Fna,
                base_url: "http://fna.internal".to_string(),
                auth_token: std::env::var("FNA_AUTH_TOKEN").unwrap_or_default(),
                timeout: Duration::from_secs(10),
            },
            SourceConfig {
                name: model::Source::Dna,
                base_url: "http://dna.internal".to_string(),
                auth_token: std::env::var("DNA_AUTH_TOKEN").unwrap_or_default(),
                timeout: Duration::from_secs(10),
            },
            SourceConfig {
                name: model::Source::GnmsPing,
                base_url: "http://gnms-ping.internal".to_string(),
                auth_token: std::env::var("GNMS_PING_TOKEN").unwrap_or_default(),
                timeout: Duration::from_secs(15),
            },
        ];

        Self {
            fetch_concurrency: 10,
            graceful_shutdown: Duration::from_secs(30),
            retention_grace: Duration::from_secs(30 * 24 * 3600),
            jobs,
            sources,
            endpoints: default_endpoints(),
            thresholds: ThresholdDefaults::default(),
        }
    }
}
