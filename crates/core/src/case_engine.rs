//! Case Engine (§4.7): orchestrates `db::case`'s primitives with the
//! business-logic decisions the spec keeps separate from persistence —
//! default-assignee resolution, the `detect_change` pure function, and the
//! §4.7.6 permission checks around `update_case`.

use std::collections::HashMap;

use db::error::{DatabaseError, DatabaseResult};
use db::system_log::LogEntry;
use db::Pool;
use model::{Case, CaseStatus, LogLevel, UserRole, TRACKED_ATTRIBUTES};

use crate::threshold_registry::ThresholdRegistry;

/// §4.7.1. Resolves each newly-created case's assignee (MAC's
/// `default_assignee`, else the lowest-id active ROOT user) up front so
/// `db::case::sync_cases`'s closure stays synchronous.
pub async fn sync_cases(pool: &Pool, maintenance_id: &str) -> DatabaseResult<usize> {
    let mac_list = db::mac_list::list(pool, maintenance_id).await?;
    let root_fallback = db::user::lowest_id_root(pool).await?.map(|u| u.display_name);

    let mut defaults: HashMap<String, Option<String>> = HashMap::new();
    for entry in &mac_list {
        let assignee = entry.default_assignee.clone().or_else(|| root_fallback.clone());
        defaults.insert(entry.mac_address.clone(), assignee);
    }

    let resolver = move |mac: &str| defaults.get(mac).cloned().flatten();
    db::case::sync_cases(pool, maintenance_id, &resolver).await
}

/// §4.7.2, run every tick after ping collection.
pub async fn refresh_ping_states(pool: &Pool, maintenance_id: &str) -> DatabaseResult<u64> {
    db::case::update_ping_states(pool, maintenance_id).await
}

/// §4.7.3 + §4.7.4, run on the case-state sweep interval.
pub async fn sweep(pool: &Pool, maintenance_id: &str, thresholds: &ThresholdRegistry<'_>) -> DatabaseResult<(u64, u64)> {
    let stable_window_secs = thresholds.get_f64("case_stable_window_seconds").await?.unwrap_or(600.0);
    let stable_window = chrono::Duration::seconds(stable_window_secs as i64);
    let resolved = db::case::auto_resolve_reachable(pool, maintenance_id, stable_window).await?;
    let reopened = db::case::auto_reopen_unreachable(pool, maintenance_id).await?;

    if resolved > 0 || reopened > 0 {
        db::system_log::write(
            pool,
            LogLevel::Info,
            LogEntry {
                source: "case_engine".to_string(),
                module: "sweep".to_string(),
                summary: format!("auto-resolved {resolved} case(s), auto-reopened {reopened} case(s)"),
                maintenance_id: Some(maintenance_id.to_string()),
                ..Default::default()
            },
        )
        .await;
    }

    Ok((resolved, reopened))
}

/// §4.7.5's pure function, ported verbatim from the spec's five-step
/// description: whether a tracked attribute's value series counts as
/// "changed" within the window read.
pub fn detect_change(values: &[Option<String>]) -> bool {
    if values.is_empty() {
        return false;
    }
    let non_null: Vec<&String> = values.iter().filter_map(|v| v.as_ref()).collect();
    if non_null.is_empty() {
        return false;
    }
    let distinct: std::collections::HashSet<&String> = non_null.iter().copied().collect();
    if distinct.len() > 1 {
        return true;
    }
    values.last().map(|last| last.is_none()).unwrap_or(false)
}

/// §4.7.5: recompute and persist one case's change-flag map from its
/// MAC's full `ClientRecord` series.
pub async fn refresh_change_flags(pool: &Pool, maintenance_id: &str, case: &Case) -> DatabaseResult<HashMap<String, bool>> {
    let history = db::case::change_timeline(pool, maintenance_id, &case.mac_address).await?;
    let mut flags = HashMap::new();
    for attribute in TRACKED_ATTRIBUTES {
        let values: Vec<Option<String>> = history.iter().map(|record| record.attribute_value(attribute)).collect();
        flags.insert(attribute.to_string(), detect_change(&values));
    }
    flags.insert("any_true".to_string(), flags.values().any(|v| *v));
    db::case::write_change_flags(pool, case.id, &flags).await?;
    Ok(flags)
}

pub async fn refresh_all_change_flags(pool: &Pool, maintenance_id: &str) -> DatabaseResult<usize> {
    let cases = db::case::list_cases(
        pool,
        maintenance_id,
        &db::case::CaseFilters { include_resolved: true, page_size: i64::MAX, ..Default::default() },
    )
    .await?;
    let count = cases.len();
    for case in &cases {
        refresh_change_flags(pool, maintenance_id, case).await?;
    }
    Ok(count)
}

/// What a human wants to change in a case, before permission checks.
#[derive(Debug, Clone, Default)]
pub struct CaseChangeRequest {
    pub status: Option<CaseStatus>,
    pub assignee: Option<Option<String>>,
    pub summary: Option<Option<String>>,
}

/// §4.7.6: apply a human-initiated case update, enforcing every
/// permission and invariant rule before delegating to `db::case::apply_update`.
pub async fn update_case(
    pool: &Pool,
    case_id: i64,
    acting_user: &str,
    request: CaseChangeRequest,
) -> DatabaseResult<Case> {
    let existing = db::case::get_case(pool, case_id).await?;

    if (request.status.is_some() || request.summary.is_some())
        && existing.assignee.as_deref() != Some(acting_user)
    {
        return Err(DatabaseError::InvalidArgument("only the assignee may edit".to_string()));
    }

    if let Some(new_assignee) = &request.assignee {
        let permitted = match &existing.assignee {
            Some(current) => current == acting_user,
            None => {
                let actor = db::user::get_by_name(pool, acting_user).await?;
                matches!(actor.map(|u| u.role), Some(UserRole::Root) | Some(UserRole::Pm))
            }
        };
        if !permitted {
            return Err(DatabaseError::InvalidArgument(
                "only the current assignee, or ROOT/PM when unassigned, may reassign".to_string(),
            ));
        }
        if existing.status == CaseStatus::Resolved {
            return Err(DatabaseError::InvalidArgument(
                "a resolved case cannot be reassigned until reopened".to_string(),
            ));
        }
        if let Some(candidate) = new_assignee {
            let user = db::user::get_by_name(pool, candidate).await?;
            if !user.is_some_and(|u| u.is_active) {
                return Err(DatabaseError::InvalidArgument(format!("{candidate} is not an active user")));
            }
        }
    }

    if request.status == Some(CaseStatus::Resolved) && existing.last_ping_reachable != Some(true) {
        return Err(DatabaseError::InvalidArgument(
            "cannot resolve a case whose latest ping is not reachable".to_string(),
        ));
    }

    let assignee = request.assignee.clone().unwrap_or_else(|| existing.assignee.clone());
    let status = request.status.unwrap_or_else(|| {
        match (&existing.assignee, &assignee) {
            (None, Some(_)) if existing.status == CaseStatus::Unassigned => CaseStatus::Assigned,
            (Some(_), None) => CaseStatus::Unassigned,
            _ => existing.status,
        }
    });

    let update = db::case::CaseUpdate {
        status: Some(status),
        assignee: Some(assignee),
        summary: request.summary,
    };
    let updated = db::case::apply_update(pool, case_id, &update).await?;

    db::system_log::write(
        pool,
        LogLevel::Info,
        LogEntry {
            source: "case_engine".to_string(),
            module: "update_case".to_string(),
            summary: format!("case {case_id} updated by {acting_user}: status={status:?}"),
            user: Some(acting_user.to_string()),
            maintenance_id: Some(updated.maintenance_id.clone()),
            ..Default::default()
        },
    )
    .await;

    Ok(updated)
}
