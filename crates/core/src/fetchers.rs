//! Fetchers and the collection pipeline (§4.2, §6.1): pull one device's raw
//! text (or, for GNMS-Ping, one bulk payload) over HTTP, hand it to the
//! Parser registry, then to the Store — recording a `CollectionError` and
//! moving on whenever a single device misbehaves rather than aborting the
//! whole tick.

use std::collections::HashMap;

use db::error::DatabaseResult;
use db::Pool;
use futures::stream::{self, StreamExt};
use model::{CollectionType, ParsedItems};

use crate::config::{EndpointConfig, EngineConfig, SourceConfig};
use crate::parsers::{self, ParseError};

/// Tally of one tick's outcome across every device it touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub attempted: usize,
    pub saved: usize,
    pub unchanged: usize,
    pub errors: usize,
}

impl TickReport {
    fn record(&mut self, outcome: &DeviceOutcome) {
        self.attempted += 1;
        match outcome {
            DeviceOutcome::Saved => self.saved += 1,
            DeviceOutcome::Unchanged => self.unchanged += 1,
            DeviceOutcome::Errored => self.errors += 1,
        }
    }
}

enum DeviceOutcome {
    Saved,
    Unchanged,
    Errored,
}

/// Run one `(maintenance_id, collection_type)` tick to completion. Returns
/// `Ok(TickReport::default())` unchanged when no endpoint is configured for
/// this collection type — that's a deployment choice, not a failure.
pub async fn run_tick(
    client: &reqwest::Client,
    pool: &Pool,
    config: &EngineConfig,
    maintenance_id: &str,
    collection_type: CollectionType,
) -> DatabaseResult<TickReport> {
    let Some(endpoint) = config.endpoints.get(&collection_type) else {
        tracing::debug!(%collection_type, "no endpoint configured, skipping tick");
        return Ok(TickReport::default());
    };
    let Some(source) = config.source(endpoint.source) else {
        tracing::warn!(%collection_type, source = ?endpoint.source, "endpoint references an unconfigured source");
        return Ok(TickReport::default());
    };

    let devices = db::device_list::list(pool, maintenance_id).await?;
    let active: Vec<(String, String, Option<String>)> = devices
        .iter()
        .map(|d| (d.active_hostname().to_string(), d.active_ip().to_string(), d.active_vendor().map(str::to_string)))
        .collect();

    match endpoint.batch_mode {
        model::BatchMode::PerDevice => {
            Ok(run_per_device(client, pool, config, maintenance_id, collection_type, endpoint, source, &active).await)
        }
        model::BatchMode::Bulk => {
            Ok(run_bulk_ping(client, pool, maintenance_id, collection_type, endpoint, source, &active).await)
        }
    }
}

async fn run_per_device(
    client: &reqwest::Client,
    pool: &Pool,
    config: &EngineConfig,
    maintenance_id: &str,
    collection_type: CollectionType,
    endpoint: &EndpointConfig,
    source: &SourceConfig,
    active: &[(String, String, Option<String>)],
) -> TickReport {
    let results = stream::iter(active.iter())
        .map(|(hostname, ip, vendor)| {
            fetch_and_store_one(client, pool, maintenance_id, collection_type, endpoint, source, hostname, ip, vendor.as_deref())
        })
        .buffer_unordered(config.fetch_concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    let mut report = TickReport::default();
    for outcome in &results {
        report.record(outcome);
    }
    report
}

fn build_url(source: &SourceConfig, endpoint: &EndpointConfig, ip: &str, vendor: Option<&str>) -> Result<String, String> {
    let mut path = endpoint.path_template.replace("{ip}", ip);
    if path.contains("{vendor_os}") {
        let vendor = vendor.ok_or_else(|| format!("device {ip} has no known vendor_os for a DNA-sourced endpoint"))?;
        path = path.replace("{vendor_os}", vendor);
    }
    Ok(format!("{}{}", source.base_url.trim_end_matches('/'), path))
}

/// Fetches and parses one device's payload without storing it, so callers
/// that need to accumulate items across devices (client ingestion) and
/// callers that store per-device (the generic typed-record pipeline) can
/// share the same HTTP/parse plumbing and error recording.
async fn fetch_one(
    client: &reqwest::Client,
    pool: &Pool,
    maintenance_id: &str,
    collection_type: CollectionType,
    endpoint: &EndpointConfig,
    source: &SourceConfig,
    hostname: &str,
    ip: &str,
    vendor: Option<&str>,
) -> Result<(String, ParsedItems), DeviceOutcome> {
    let url = match build_url(source, endpoint, ip, vendor) {
        Ok(url) => url,
        Err(reason) => return Err(fail(pool, maintenance_id, collection_type, hostname, &reason).await),
    };

    let mut request = client.get(&url).timeout(source.timeout);
    if !source.auth_token.is_empty() {
        request = request.bearer_auth(&source.auth_token);
    }

    let response = match request.send().await {
        Ok(resp) => resp,
        Err(err) => return Err(fail(pool, maintenance_id, collection_type, hostname, &format!("request failed: {err}")).await),
    };
    let response = match response.error_for_status() {
        Ok(resp) => resp,
        Err(err) => return Err(fail(pool, maintenance_id, collection_type, hostname, &format!("HTTP error: {err}")).await),
    };
    let raw = match response.text().await {
        Ok(body) => body,
        Err(err) => return Err(fail(pool, maintenance_id, collection_type, hostname, &format!("failed to read body: {err}")).await),
    };

    let vendor_os = vendor.and_then(|v| v.parse().ok());
    match parsers::parse(collection_type, vendor_os, &raw) {
        Ok(items) => Ok((raw, items)),
        Err(err) => Err(fail(pool, maintenance_id, collection_type, hostname, &err.to_string()).await),
    }
}

async fn fetch_and_store_one(
    client: &reqwest::Client,
    pool: &Pool,
    maintenance_id: &str,
    collection_type: CollectionType,
    endpoint: &EndpointConfig,
    source: &SourceConfig,
    hostname: &str,
    ip: &str,
    vendor: Option<&str>,
) -> DeviceOutcome {
    match fetch_one(client, pool, maintenance_id, collection_type, endpoint, source, hostname, ip, vendor).await {
        Ok((raw, items)) => persist(pool, maintenance_id, collection_type, hostname, &raw, &items).await,
        Err(outcome) => outcome,
    }
}

async fn persist(
    pool: &Pool,
    maintenance_id: &str,
    collection_type: CollectionType,
    hostname: &str,
    raw: &str,
    items: &ParsedItems,
) -> DeviceOutcome {
    match crate::store::save(pool, maintenance_id, hostname, raw, items).await {
        Ok(db::store::SaveOutcome::Unchanged) => DeviceOutcome::Unchanged,
        Ok(db::store::SaveOutcome::Saved(_)) => DeviceOutcome::Saved,
        Err(err) => fail(pool, maintenance_id, collection_type, hostname, &err.to_string()).await,
    }
}

async fn fail(
    pool: &Pool,
    maintenance_id: &str,
    collection_type: CollectionType,
    hostname: &str,
    message: &str,
) -> DeviceOutcome {
    tracing::warn!(maintenance_id, %collection_type, hostname, message, "collection failed for device");
    if let Err(err) = db::collection_batch::record_error(pool, maintenance_id, collection_type, hostname, message).await {
        tracing::error!(maintenance_id, %collection_type, hostname, %err, "failed to record collection error");
    }
    DeviceOutcome::Errored
}

/// GNMS-Ping's lone bulk endpoint: one POST carrying every active IP,
/// answered with a CSV-like `ip,reachable` body that's then sliced back
/// out per device so the Store's per-`(maintenance_id, switch_hostname)`
/// atomicity still applies (§4.1).
#[derive(serde::Serialize)]
struct PingRequest<'a> {
    app_name: &'a str,
    token: &'a str,
    addresses: &'a [String],
}

async fn run_bulk_ping(
    client: &reqwest::Client,
    pool: &Pool,
    maintenance_id: &str,
    collection_type: CollectionType,
    endpoint: &EndpointConfig,
    source: &SourceConfig,
    active: &[(String, String, Option<String>)],
) -> TickReport {
    let mut report = TickReport::default();
    let addresses: Vec<String> = active.iter().map(|(_, ip, _)| ip.clone()).collect();
    if addresses.is_empty() {
        return report;
    }

    let url = format!("{}{}", source.base_url.trim_end_matches('/'), endpoint.path_template);
    let app_name = std::env::var("GNMS_PING_APP_NAME").unwrap_or_default();
    let body = PingRequest { app_name: &app_name, token: &source.auth_token, addresses: &addresses };

    let raw = match client.post(&url).timeout(source.timeout).json(&body).send().await {
        Ok(resp) => match resp.error_for_status() {
            Ok(resp) => match resp.text().await {
                Ok(text) => text,
                Err(err) => {
                    report_bulk_failure(pool, maintenance_id, collection_type, active, &format!("failed to read body: {err}"), &mut report).await;
                    return report;
                }
            },
            Err(err) => {
                report_bulk_failure(pool, maintenance_id, collection_type, active, &format!("HTTP error: {err}"), &mut report).await;
                return report;
            }
        },
        Err(err) => {
            report_bulk_failure(pool, maintenance_id, collection_type, active, &format!("request failed: {err}"), &mut report).await;
            return report;
        }
    };

    let parsed = match parsers::parse_ping(&raw) {
        Ok(items) => items,
        Err(err) => {
            report_bulk_failure(pool, maintenance_id, collection_type, active, &err.to_string(), &mut report).await;
            return report;
        }
    };
    let by_ip: HashMap<&str, &model::record::PingItem> = parsed.iter().map(|item| (item.ip_address.as_str(), item)).collect();

    for (hostname, ip, _) in active {
        let Some(item) = by_ip.get(ip.as_str()) else {
            tracing::debug!(maintenance_id, hostname, ip, "device absent from GNMS-Ping response");
            continue;
        };
        let items = ParsedItems::Ping(vec![(*item).clone()]);
        let outcome = persist(pool, maintenance_id, collection_type, hostname, &raw, &items).await;
        report.record(&outcome);
    }
    report
}

async fn report_bulk_failure(
    pool: &Pool,
    maintenance_id: &str,
    collection_type: CollectionType,
    active: &[(String, String, Option<String>)],
    message: &str,
    report: &mut TickReport,
) {
    for (hostname, _, _) in active {
        let outcome = fail(pool, maintenance_id, collection_type, hostname, message).await;
        report.record(&outcome);
    }
}

/// ClientPing and Client are fetched per device like any other FNA
/// endpoint, but `client_ingest::ingest` needs both collection types'
/// items for the whole tick at once (it merges by MAC, not by device), so
/// this collects across every device before handing off to it instead of
/// persisting per device through the generic store.
pub async fn run_client_tick(
    client: &reqwest::Client,
    pool: &Pool,
    config: &EngineConfig,
    maintenance_id: &str,
) -> DatabaseResult<usize> {
    let devices = db::device_list::list(pool, maintenance_id).await?;
    let active: Vec<(String, String, Option<String>)> = devices
        .iter()
        .map(|d| (d.active_hostname().to_string(), d.active_ip().to_string(), d.active_vendor().map(str::to_string)))
        .collect();

    let pings = collect_client_items(client, pool, config, maintenance_id, CollectionType::ClientPing, &active).await;
    let snapshots = collect_client_items(client, pool, config, maintenance_id, CollectionType::Client, &active).await;

    let ping_items: Vec<model::record::ClientPingItem> = pings
        .into_iter()
        .filter_map(|items| match items {
            ParsedItems::ClientPing(v) => Some(v),
            _ => None,
        })
        .flatten()
        .collect();
    let snapshot_items: Vec<model::record::ClientSnapshotItem> = snapshots
        .into_iter()
        .filter_map(|items| match items {
            ParsedItems::Client(v) => Some(v),
            _ => None,
        })
        .flatten()
        .collect();

    crate::client_ingest::ingest(pool, maintenance_id, &ping_items, &snapshot_items).await
}

async fn collect_client_items(
    client: &reqwest::Client,
    pool: &Pool,
    config: &EngineConfig,
    maintenance_id: &str,
    collection_type: CollectionType,
    active: &[(String, String, Option<String>)],
) -> Vec<ParsedItems> {
    let Some(endpoint) = config.endpoints.get(&collection_type) else {
        tracing::debug!(%collection_type, "no endpoint configured, skipping tick");
        return Vec::new();
    };
    let Some(source) = config.source(endpoint.source) else {
        tracing::warn!(%collection_type, source = ?endpoint.source, "endpoint references an unconfigured source");
        return Vec::new();
    };
    if endpoint.batch_mode != model::BatchMode::PerDevice {
        tracing::warn!(%collection_type, "client ingestion only supports per-device endpoints, skipping");
        return Vec::new();
    }

    stream::iter(active.iter())
        .map(|(hostname, ip, vendor)| {
            fetch_one(client, pool, maintenance_id, collection_type, endpoint, source, hostname, ip, vendor.as_deref())
        })
        .buffer_unordered(config.fetch_concurrency.max(1))
        .filter_map(|result| async move { result.ok().map(|(_, items)| items) })
        .collect::<Vec<_>>()
        .await
}
