//! `MaintenanceDeviceList` CRUD (§3). Every insert/update is validated
//! in application code before hitting the database: OLD IPs unique across
//! OLD entries, NEW IPs unique across NEW entries, OLD/NEW hostnames
//! disjoint, and no cross-mapping (`A→B` alongside `B→A`).

use model::DeviceListEntry;
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{DatabaseError, DatabaseResult};
use crate::csv_import::{strip_bom, ImportError, ImportReport};

pub async fn list(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<Vec<DeviceListEntry>> {
    let sql = "SELECT * FROM maintenance_device_list WHERE maintenance_id = $1 ORDER BY old_hostname";
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

/// §3's invariants, checked against the other rows already present for
/// this maintenance. `skip_hostname` excludes the row being updated (if
/// any) from the comparison.
fn validate(
    existing: &[DeviceListEntry],
    candidate: &DeviceListEntry,
    skip_hostname: Option<&str>,
) -> DatabaseResult<()> {
    let others = existing
        .iter()
        .filter(|e| Some(e.old_hostname.as_str()) != skip_hostname);

    for other in others.clone() {
        if other.old_ip == candidate.old_ip {
            return Err(DatabaseError::InvariantViolation(format!(
                "OLD IP {} already in use by {}",
                candidate.old_ip, other.old_hostname
            )));
        }
        if let (Some(a), Some(b)) = (&candidate.new_ip, &other.new_ip) {
            if a == b {
                return Err(DatabaseError::InvariantViolation(format!(
                    "NEW IP {a} already in use by {}",
                    other.old_hostname
                )));
            }
        }
        if other.old_hostname == candidate.old_hostname {
            return Err(DatabaseError::InvariantViolation(format!(
                "hostname {} already present",
                candidate.old_hostname
            )));
        }
        if let Some(new_hostname) = &candidate.new_hostname {
            if *new_hostname == other.old_hostname
                || Some(new_hostname.clone()) == other.new_hostname
            {
                return Err(DatabaseError::InvariantViolation(format!(
                    "NEW hostname {new_hostname} collides with an existing entry"
                )));
            }
        }
    }

    // 偵測到交叉對應: reject (OLD=B, NEW=A) when (OLD=A, NEW=B) already exists.
    if let Some(new_hostname) = &candidate.new_hostname {
        let cross = others.clone().any(|other| {
            other.old_hostname == *new_hostname
                && other.new_hostname.as_deref() == Some(candidate.old_hostname.as_str())
        });
        if cross {
            return Err(DatabaseError::InvariantViolation(
                "cross-mapping detected between OLD/NEW device pairs".to_string(),
            ));
        }
    }

    Ok(())
}

pub async fn insert(pool: &PgPool, entry: &DeviceListEntry) -> DatabaseResult<DeviceListEntry> {
    let existing = list(pool, &entry.maintenance_id).await?;
    validate(&existing, entry, None)?;

    let sql = "INSERT INTO maintenance_device_list
               (maintenance_id, old_hostname, old_ip, old_vendor, new_hostname, new_ip,
                new_vendor, is_replaced, use_same_port, tenant_group, description)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING *";
    sqlx::query_as(sql)
        .bind(&entry.maintenance_id)
        .bind(&entry.old_hostname)
        .bind(&entry.old_ip)
        .bind(&entry.old_vendor)
        .bind(&entry.new_hostname)
        .bind(&entry.new_ip)
        .bind(&entry.new_vendor)
        .bind(entry.is_replaced)
        .bind(entry.use_same_port)
        .bind(&entry.tenant_group)
        .bind(&entry.description)
        .fetch_one(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn update(pool: &PgPool, entry: &DeviceListEntry) -> DatabaseResult<DeviceListEntry> {
    let existing = list(pool, &entry.maintenance_id).await?;
    validate(&existing, entry, Some(&entry.old_hostname))?;

    let sql = "UPDATE maintenance_device_list
               SET old_ip = $3, old_vendor = $4, new_hostname = $5, new_ip = $6,
                   new_vendor = $7, is_replaced = $8, use_same_port = $9,
                   tenant_group = $10, description = $11
               WHERE maintenance_id = $1 AND old_hostname = $2
               RETURNING *";
    sqlx::query_as(sql)
        .bind(&entry.maintenance_id)
        .bind(&entry.old_hostname)
        .bind(&entry.old_ip)
        .bind(&entry.old_vendor)
        .bind(&entry.new_hostname)
        .bind(&entry.new_ip)
        .bind(&entry.new_vendor)
        .bind(entry.is_replaced)
        .bind(entry.use_same_port)
        .bind(&entry.tenant_group)
        .bind(&entry.description)
        .fetch_one(pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound {
                kind: "DeviceListEntry",
                id: entry.old_hostname.clone(),
            },
            other => DatabaseError::query(sql, other),
        })
}

/// One row of a device-list CSV import (§6.4). Unknown columns are ignored
/// by `csv`'s header-matched deserialization; missing optional columns
/// deserialize to `None`.
#[derive(Debug, Clone, Deserialize)]
struct DeviceCsvRow {
    old_hostname: String,
    old_ip: String,
    #[serde(default)]
    old_vendor: Option<String>,
    #[serde(default)]
    new_hostname: Option<String>,
    #[serde(default)]
    new_ip: Option<String>,
    #[serde(default)]
    new_vendor: Option<String>,
    #[serde(default)]
    is_replaced: Option<bool>,
    #[serde(default)]
    use_same_port: Option<bool>,
    #[serde(default)]
    tenant_group: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl DeviceCsvRow {
    fn into_entry(self, maintenance_id: &str) -> DeviceListEntry {
        DeviceListEntry {
            maintenance_id: maintenance_id.to_string(),
            old_hostname: self.old_hostname,
            old_ip: self.old_ip,
            old_vendor: self.old_vendor,
            new_hostname: self.new_hostname,
            new_ip: self.new_ip,
            new_vendor: self.new_vendor,
            is_replaced: self.is_replaced,
            use_same_port: self.use_same_port.unwrap_or(true),
            tenant_group: self.tenant_group,
            is_reachable: None,
            last_check_at: None,
            description: self.description,
        }
    }
}

/// Two-phase CSV import (§6.4): every row is validated against the
/// existing list *and* against rows already accepted earlier in the same
/// file before anything is written. A single invalid row aborts the whole
/// import with a per-row error report; otherwise every row commits in one
/// transaction.
pub async fn import_csv(pool: &PgPool, maintenance_id: &str, data: &[u8]) -> DatabaseResult<ImportReport> {
    let data = crate::csv_import::strip_bom(data);
    let text = std::str::from_utf8(data).map_err(|_| {
        DatabaseError::InvalidArgument("device list CSV must be UTF-8 (GBK fallback not supported)".to_string())
    })?;

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(text.as_bytes());
    let mut candidates = Vec::new();
    let mut errors = Vec::new();
    for (index, record) in reader.deserialize::<DeviceCsvRow>().enumerate() {
        let row = index + 2; // header occupies row 1
        match record {
            Ok(parsed) => candidates.push((row, parsed.into_entry(maintenance_id))),
            Err(err) => errors.push(ImportError { row, message: err.to_string() }),
        }
    }

    let mut accepted = list(pool, maintenance_id).await?;
    for (row, candidate) in &candidates {
        match validate(&accepted, candidate, None) {
            Ok(()) => accepted.push(candidate.clone()),
            Err(err) => errors.push(ImportError { row: *row, message: err.to_string() }),
        }
    }

    if !errors.is_empty() {
        return Ok(ImportReport { inserted: 0, errors });
    }

    let mut txn = pool.begin().await.map_err(|err| DatabaseError::query("BEGIN", err))?;
    let sql = "INSERT INTO maintenance_device_list
               (maintenance_id, old_hostname, old_ip, old_vendor, new_hostname, new_ip,
                new_vendor, is_replaced, use_same_port, tenant_group, description)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";
    for (_, entry) in &candidates {
        sqlx::query(sql)
            .bind(&entry.maintenance_id)
            .bind(&entry.old_hostname)
            .bind(&entry.old_ip)
            .bind(&entry.old_vendor)
            .bind(&entry.new_hostname)
            .bind(&entry.new_ip)
            .bind(&entry.new_vendor)
            .bind(entry.is_replaced)
            .bind(entry.use_same_port)
            .bind(&entry.tenant_group)
            .bind(&entry.description)
            .execute(&mut *txn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))?;
    }
    txn.commit().await.map_err(|err| DatabaseError::query("COMMIT", err))?;

    Ok(ImportReport { inserted: candidates.len(), errors: Vec::new() })
}

pub async fn record_reachability(
    pool: &PgPool,
    maintenance_id: &str,
    old_hostname: &str,
    is_reachable: bool,
) -> DatabaseResult<()> {
    let sql = "UPDATE maintenance_device_list
               SET is_reachable = $3, last_check_at = now()
               WHERE maintenance_id = $1 AND old_hostname = $2";
    sqlx::query(sql)
        .bind(maintenance_id)
        .bind(old_hostname)
        .bind(is_reachable)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(old_hostname: &str, old_ip: &str, new_hostname: Option<&str>) -> DeviceListEntry {
        DeviceListEntry {
            maintenance_id: "m1".into(),
            old_hostname: old_hostname.into(),
            old_ip: old_ip.into(),
            old_vendor: None,
            new_hostname: new_hostname.map(String::from),
            new_ip: None,
            new_vendor: None,
            is_replaced: None,
            use_same_port: true,
            tenant_group: None,
            is_reachable: None,
            last_check_at: None,
            description: None,
        }
    }

    #[test]
    fn rejects_duplicate_old_ip() {
        let existing = vec![entry("sw-a", "10.0.0.1", None)];
        let candidate = entry("sw-b", "10.0.0.1", None);
        assert!(validate(&existing, &candidate, None).is_err());
    }

    #[test]
    fn rejects_cross_mapping() {
        let existing = vec![entry("sw-a", "10.0.0.1", Some("sw-b"))];
        let candidate = entry("sw-b", "10.0.0.2", Some("sw-a"));
        assert!(validate(&existing, &candidate, None).is_err());
    }

    #[test]
    fn parses_csv_rows_with_unknown_columns_and_missing_optionals() {
        let csv = "old_hostname,old_ip,unexpected_column,new_hostname\n\
                    sw-a,10.0.0.1,ignored,sw-a-new\n\
                    sw-b,10.0.0.2,ignored,\n";
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(csv.as_bytes());
        let rows: Vec<DeviceCsvRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].new_hostname.as_deref(), Some("sw-a-new"));
        assert_eq!(rows[1].new_hostname, None);
        assert!(rows[1].into_entry("m1").use_same_port);
    }

    #[test]
    fn strips_bom_before_parsing() {
        let mut data = crate::csv_import::UTF8_BOM.to_vec();
        data.extend_from_slice(b"old_hostname,old_ip\nsw-a,10.0.0.1\n");
        let stripped = crate::csv_import::strip_bom(&data);
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(stripped);
        let rows: Vec<DeviceCsvRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].old_hostname, "sw-a");
    }

    #[test]
    fn allows_unrelated_entry() {
        let existing = vec![entry("sw-a", "10.0.0.1", Some("sw-c"))];
        let candidate = entry("sw-b", "10.0.0.2", Some("sw-d"));
        assert!(validate(&existing, &candidate, None).is_ok());
    }
}
