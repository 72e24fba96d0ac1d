//! `MaintenanceMacList` CRUD (§3). Every MAC is normalised to upper-case
//! colon form via `model::maintenance::normalize_mac` before it ever
//! touches a query, so lookups elsewhere can compare without re-parsing.

use model::maintenance::normalize_mac;
use model::MacListEntry;
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashSet;

use crate::csv_import::{ImportError, ImportReport};
use crate::error::{DatabaseError, DatabaseResult};

pub async fn list(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<Vec<MacListEntry>> {
    let sql = "SELECT * FROM maintenance_mac_list WHERE maintenance_id = $1 ORDER BY mac_address";
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn upsert(pool: &PgPool, entry: &MacListEntry) -> DatabaseResult<MacListEntry> {
    let mac = normalize_mac(&entry.mac_address)
        .map_err(|err| DatabaseError::InvalidArgument(err.to_string()))?;

    let sql = "INSERT INTO maintenance_mac_list
               (maintenance_id, mac_address, description, default_assignee, ip_address, tenant_group)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (maintenance_id, mac_address) DO UPDATE SET
                 description = excluded.description,
                 default_assignee = excluded.default_assignee,
                 ip_address = excluded.ip_address,
                 tenant_group = excluded.tenant_group
               RETURNING *";
    sqlx::query_as(sql)
        .bind(&entry.maintenance_id)
        .bind(&mac)
        .bind(&entry.description)
        .bind(&entry.default_assignee)
        .bind(&entry.ip_address)
        .bind(&entry.tenant_group)
        .fetch_one(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

/// One row of a MAC-list CSV import (§6.4). Unknown columns are ignored.
#[derive(Debug, Clone, Deserialize)]
struct MacCsvRow {
    mac_address: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    default_assignee: Option<String>,
    #[serde(default)]
    ip_address: Option<String>,
    #[serde(default)]
    tenant_group: Option<String>,
}

/// Two-phase CSV import (§6.4): every row's MAC is format-validated and
/// checked for duplicates within the file before anything is written;
/// existing rows for the same MAC are upserted rather than rejected.
pub async fn import_csv(pool: &PgPool, maintenance_id: &str, data: &[u8]) -> DatabaseResult<ImportReport> {
    let data = crate::csv_import::strip_bom(data);
    let text = std::str::from_utf8(data).map_err(|_| {
        DatabaseError::InvalidArgument("mac list CSV must be UTF-8 (GBK fallback not supported)".to_string())
    })?;

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(text.as_bytes());
    let mut candidates: Vec<(usize, MacListEntry)> = Vec::new();
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, record) in reader.deserialize::<MacCsvRow>().enumerate() {
        let row = index + 2; // header occupies row 1
        let parsed = match record {
            Ok(parsed) => parsed,
            Err(err) => {
                errors.push(ImportError { row, message: err.to_string() });
                continue;
            }
        };
        let mac = match normalize_mac(&parsed.mac_address) {
            Ok(mac) => mac,
            Err(err) => {
                errors.push(ImportError { row, message: err.to_string() });
                continue;
            }
        };
        if !seen.insert(mac.clone()) {
            errors.push(ImportError { row, message: format!("duplicate MAC {mac} within the import file") });
            continue;
        }
        candidates.push((
            row,
            MacListEntry {
                maintenance_id: maintenance_id.to_string(),
                mac_address: mac,
                description: parsed.description,
                default_assignee: parsed.default_assignee,
                ip_address: parsed.ip_address,
                tenant_group: parsed.tenant_group,
            },
        ));
    }

    if !errors.is_empty() {
        return Ok(ImportReport { inserted: 0, errors });
    }

    let mut txn = pool.begin().await.map_err(|err| DatabaseError::query("BEGIN", err))?;
    let sql = "INSERT INTO maintenance_mac_list
               (maintenance_id, mac_address, description, default_assignee, ip_address, tenant_group)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (maintenance_id, mac_address) DO UPDATE SET
                 description = excluded.description,
                 default_assignee = excluded.default_assignee,
                 ip_address = excluded.ip_address,
                 tenant_group = excluded.tenant_group";
    for (_, entry) in &candidates {
        sqlx::query(sql)
            .bind(&entry.maintenance_id)
            .bind(&entry.mac_address)
            .bind(&entry.description)
            .bind(&entry.default_assignee)
            .bind(&entry.ip_address)
            .bind(&entry.tenant_group)
            .execute(&mut *txn)
            .await
            .map_err(|err| DatabaseError::query(sql, err))?;
    }
    txn.commit().await.map_err(|err| DatabaseError::query("COMMIT", err))?;

    Ok(ImportReport { inserted: candidates.len(), errors: Vec::new() })
}

pub async fn delete(pool: &PgPool, maintenance_id: &str, mac_address: &str) -> DatabaseResult<()> {
    let mac = normalize_mac(mac_address)
        .map_err(|err| DatabaseError::InvalidArgument(err.to_string()))?;
    let sql = "DELETE FROM maintenance_mac_list WHERE maintenance_id = $1 AND mac_address = $2";
    let result = sqlx::query(sql)
        .bind(maintenance_id)
        .bind(&mac)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound { kind: "MacListEntry", id: mac });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_csv_rows_ignoring_unknown_columns() {
        let csv = "mac_address,unexpected,description\nAA:BB:CC:DD:EE:FF,ignored,a client\n";
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(csv.as_bytes());
        let rows: Vec<MacCsvRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description.as_deref(), Some("a client"));
    }

    #[test]
    fn flags_duplicate_mac_within_same_file() {
        let mut seen = HashSet::new();
        assert!(seen.insert(normalize_mac("AA:BB:CC:DD:EE:FF").unwrap()));
        assert!(!seen.insert(normalize_mac("aa-bb-cc-dd-ee-ff").unwrap()));
    }
}
