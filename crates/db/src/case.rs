//! Case CRUD and query plumbing (§3, §4.7). The hysteresis/auto-resolve/
//! auto-reopen/permission *decisions* belong to `switchwatch-core`'s case
//! engine — this module only knows how to read, filter, sort and write
//! `Case` rows the way it's told to.

use chrono::{DateTime, Duration, Utc};
use model::{Case, CaseStatus};
use sqlx::PgPool;

use crate::error::{DatabaseError, DatabaseResult};

fn row_to_case(row: CaseRow) -> DatabaseResult<Case> {
    let status: CaseStatus = row
        .status
        .parse()
        .map_err(|err: model::ModelError| DatabaseError::Internal(err.to_string()))?;
    let change_flags = serde_json::from_value(row.change_flags)
        .map_err(|err| DatabaseError::Internal(format!("malformed change_flags: {err}")))?;
    Ok(Case {
        id: row.id,
        maintenance_id: row.maintenance_id,
        mac_address: row.mac_address,
        status,
        assignee: row.assignee,
        summary: row.summary,
        last_ping_reachable: row.last_ping_reachable,
        ping_reachable_since: row.ping_reachable_since,
        change_flags,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[derive(sqlx::FromRow)]
struct CaseRow {
    id: i64,
    maintenance_id: String,
    mac_address: String,
    status: String,
    assignee: Option<String>,
    summary: Option<String>,
    last_ping_reachable: Option<bool>,
    ping_reachable_since: Option<DateTime<Utc>>,
    change_flags: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// §4.7.1: create a `Case` for every MAC in `maintenance_mac_list` that
/// doesn't have one yet. `default_assignee_or_root` resolves each new
/// case's assignee (the MAC's `default_assignee`, else the lowest-id ROOT
/// user) — computed by the caller since it needs the user table, which is
/// out of scope for this crate's case module.
pub async fn sync_cases(
    pool: &PgPool,
    maintenance_id: &str,
    default_assignee_for_mac: &dyn Fn(&str) -> Option<String>,
) -> DatabaseResult<usize> {
    let sql = "SELECT mac_address FROM maintenance_mac_list
               WHERE maintenance_id = $1
               AND mac_address NOT IN (SELECT mac_address FROM cases WHERE maintenance_id = $1)";
    let missing: Vec<(String,)> = sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;

    let mut created = 0;
    for (mac_address,) in missing {
        let assignee = default_assignee_for_mac(&mac_address);
        let status = if assignee.is_some() { "ASSIGNED" } else { "UNASSIGNED" };
        let insert_sql = "INSERT INTO cases
                   (maintenance_id, mac_address, status, assignee, change_flags)
                   VALUES ($1, $2, $3, $4, '{}'::jsonb)
                   ON CONFLICT (maintenance_id, mac_address) DO NOTHING";
        sqlx::query(insert_sql)
            .bind(maintenance_id)
            .bind(&mac_address)
            .bind(status)
            .bind(&assignee)
            .execute(pool)
            .await
            .map_err(|err| DatabaseError::query(insert_sql, err))?;
        created += 1;
    }
    Ok(created)
}

#[derive(Debug, Clone, Default)]
pub struct CaseFilters {
    pub assignee: Option<String>,
    pub status: Option<CaseStatus>,
    pub ping_reachable: Option<bool>,
    pub search: Option<String>,
    pub include_resolved: bool,
    pub page: i64,
    pub page_size: i64,
}

/// §12 sort: ping-null first, then false, then true, then by MAC — except
/// when filtering specifically for RESOLVED, where cases with any `true`
/// change flag sort first, then by MAC (confirmed against the original
/// `get_cases` ordering).
pub async fn list_cases(pool: &PgPool, maintenance_id: &str, filters: &CaseFilters) -> DatabaseResult<Vec<Case>> {
    let mut sql = String::from("SELECT * FROM cases WHERE maintenance_id = $1");
    let mut binds: Vec<String> = Vec::new();
    let mut idx = 2;

    if let Some(assignee) = &filters.assignee {
        sql.push_str(&format!(" AND assignee = ${idx}"));
        binds.push(assignee.clone());
        idx += 1;
    }
    if let Some(status) = &filters.status {
        sql.push_str(&format!(" AND status = ${idx}"));
        binds.push(status.to_string());
        idx += 1;
    } else if !filters.include_resolved {
        sql.push_str(" AND status != 'RESOLVED'");
    }
    if let Some(reachable) = filters.ping_reachable {
        if reachable {
            sql.push_str(" AND last_ping_reachable = true");
        } else {
            sql.push_str(" AND (last_ping_reachable = false OR last_ping_reachable IS NULL)");
        }
    }
    if let Some(search) = &filters.search {
        sql.push_str(&format!(" AND (mac_address ILIKE ${idx} OR summary ILIKE ${idx})"));
        binds.push(format!("%{search}%"));
        idx += 1;
    }

    let is_resolved_only = matches!(filters.status, Some(CaseStatus::Resolved));
    if is_resolved_only {
        sql.push_str(
            " ORDER BY COALESCE((change_flags->>'any_true')::boolean, false) DESC, mac_address ASC",
        );
    } else {
        sql.push_str(
            " ORDER BY CASE WHEN last_ping_reachable IS NULL THEN 0 \
               WHEN last_ping_reachable = false THEN 1 ELSE 2 END, mac_address ASC",
        );
    }

    let page_size = filters.page_size.max(1);
    let offset = filters.page.max(0) * page_size;
    sql.push_str(&format!(" LIMIT ${idx} OFFSET ${}", idx + 1));

    let mut query = sqlx::query_as(&sql).bind(maintenance_id);
    for bind in &binds {
        query = query.bind(bind);
    }
    query = query.bind(page_size).bind(offset);

    let rows: Vec<CaseRow> = query.fetch_all(pool).await.map_err(|err| DatabaseError::query(&sql, err))?;
    rows.into_iter().map(row_to_case).collect()
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaseStats {
    pub unassigned: i64,
    pub assigned: i64,
    pub in_progress: i64,
    pub discussing: i64,
    pub resolved: i64,
    pub ping_unreachable: i64,
    pub active: i64,
}

pub async fn case_stats(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<CaseStats> {
    let sql = "SELECT
          count(*) FILTER (WHERE status = 'UNASSIGNED') AS unassigned,
          count(*) FILTER (WHERE status = 'ASSIGNED') AS assigned,
          count(*) FILTER (WHERE status = 'IN_PROGRESS') AS in_progress,
          count(*) FILTER (WHERE status = 'DISCUSSING') AS discussing,
          count(*) FILTER (WHERE status = 'RESOLVED') AS resolved,
          count(*) FILTER (WHERE status != 'RESOLVED' AND (last_ping_reachable = false OR last_ping_reachable IS NULL)) AS ping_unreachable,
          count(*) FILTER (WHERE status != 'RESOLVED') AS active
        FROM cases WHERE maintenance_id = $1";
    sqlx::query_as(sql)
        .bind(maintenance_id)
        .fetch_one(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn get_case(pool: &PgPool, case_id: i64) -> DatabaseResult<Case> {
    let sql = "SELECT * FROM cases WHERE id = $1";
    let row: Option<CaseRow> = sqlx::query_as(sql)
        .bind(case_id)
        .fetch_optional(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    match row {
        Some(row) => row_to_case(row),
        None => Err(DatabaseError::NotFound { kind: "case", id: case_id.to_string() }),
    }
}

pub async fn get_case_by_mac(pool: &PgPool, maintenance_id: &str, mac_address: &str) -> DatabaseResult<Option<Case>> {
    let sql = "SELECT * FROM cases WHERE maintenance_id = $1 AND mac_address = $2";
    let row: Option<CaseRow> = sqlx::query_as(sql)
        .bind(maintenance_id)
        .bind(mac_address)
        .fetch_optional(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    row.map(row_to_case).transpose()
}

/// Unconditional write of an already-permission-checked set of fields.
/// Callers (the case engine) are responsible for §4.7.6's rules before
/// calling this.
#[derive(Debug, Clone, Default)]
pub struct CaseUpdate {
    pub status: Option<CaseStatus>,
    pub assignee: Option<Option<String>>,
    pub summary: Option<Option<String>>,
}

pub async fn apply_update(pool: &PgPool, case_id: i64, update: &CaseUpdate) -> DatabaseResult<Case> {
    let existing = get_case(pool, case_id).await?;
    let status = update.status.unwrap_or(existing.status);
    let assignee = update.assignee.clone().unwrap_or(existing.assignee.clone());
    let summary = update.summary.clone().unwrap_or(existing.summary.clone());

    if !Case { status, assignee: assignee.clone(), ..existing.clone() }.invariant_holds() {
        return Err(DatabaseError::InvariantViolation(
            "status=UNASSIGNED must imply assignee is null (P5)".to_string(),
        ));
    }

    let sql = "UPDATE cases SET status = $2, assignee = $3, summary = $4, updated_at = now()
               WHERE id = $1 RETURNING *";
    let row: CaseRow = sqlx::query_as(sql)
        .bind(case_id)
        .bind(status.to_string())
        .bind(&assignee)
        .bind(&summary)
        .fetch_one(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    row_to_case(row)
}

/// §4.7.2's hysteresis table, applied in bulk for every case whose MAC has
/// a known latest `ping_reachable` value.
pub async fn update_ping_states(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<u64> {
    let sql = "
        WITH latest AS (
          SELECT DISTINCT ON (mac_address) mac_address, ping_reachable
          FROM client_records
          WHERE maintenance_id = $1
          ORDER BY mac_address, collected_at DESC
        )
        UPDATE cases c SET
          ping_reachable_since = CASE
            WHEN latest.ping_reachable = true AND c.last_ping_reachable = true AND c.ping_reachable_since IS NOT NULL
              THEN c.ping_reachable_since
            WHEN latest.ping_reachable = true THEN now()
            ELSE NULL
          END,
          last_ping_reachable = latest.ping_reachable,
          updated_at = now()
        FROM latest
        WHERE c.maintenance_id = $1 AND c.mac_address = latest.mac_address";
    let result = sqlx::query(sql)
        .bind(maintenance_id)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(result.rows_affected())
}

/// §4.7.3. `stable_window` is passed in rather than hardcoded so the
/// engine can source it from the Threshold Registry.
pub async fn auto_resolve_reachable(
    pool: &PgPool,
    maintenance_id: &str,
    stable_window: Duration,
) -> DatabaseResult<u64> {
    let sql = "UPDATE cases SET status = 'RESOLVED', updated_at = now()
               WHERE maintenance_id = $1
               AND status IN ('UNASSIGNED', 'ASSIGNED')
               AND last_ping_reachable = true
               AND ping_reachable_since <= $2";
    let cutoff = Utc::now() - stable_window;
    let result = sqlx::query(sql)
        .bind(maintenance_id)
        .bind(cutoff)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(result.rows_affected())
}

/// §4.7.4. Reopens land back on `ASSIGNED` when the case still has an
/// assignee, or `UNASSIGNED` when it doesn't — a case resolved while
/// unassigned must not come back with a non-null status and a null
/// assignee (P5).
pub async fn auto_reopen_unreachable(pool: &PgPool, maintenance_id: &str) -> DatabaseResult<u64> {
    let sql = "UPDATE cases SET
                 status = CASE WHEN assignee IS NULL THEN 'UNASSIGNED' ELSE 'ASSIGNED' END,
                 updated_at = now()
               WHERE maintenance_id = $1
               AND status = 'RESOLVED'
               AND (last_ping_reachable = false OR last_ping_reachable IS NULL)";
    let result = sqlx::query(sql)
        .bind(maintenance_id)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(result.rows_affected())
}

/// §4.7.5: persist a case's freshly computed change-flag map (the pure
/// `detect_change` function itself lives in the case engine).
pub async fn write_change_flags(
    pool: &PgPool,
    case_id: i64,
    change_flags: &std::collections::HashMap<String, bool>,
) -> DatabaseResult<()> {
    let value = serde_json::to_value(change_flags)
        .map_err(|err| DatabaseError::Internal(format!("change_flags serialise: {err}")))?;
    let sql = "UPDATE cases SET change_flags = $2, updated_at = now() WHERE id = $1";
    sqlx::query(sql)
        .bind(case_id)
        .bind(value)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}

/// §12: the ClientRecord values behind a case's change-flag timeline for
/// one attribute, oldest first, for UI display.
pub async fn change_timeline(
    pool: &PgPool,
    maintenance_id: &str,
    mac_address: &str,
) -> DatabaseResult<Vec<model::ClientRecord>> {
    crate::client_record::history_for_mac(pool, maintenance_id, mac_address).await
}
