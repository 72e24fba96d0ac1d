use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Case lifecycle state (§3). `UNASSIGNED ⇔ assignee IS NULL` is enforced
/// by every writer (P5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    Unassigned,
    Assigned,
    InProgress,
    Discussing,
    Resolved,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseStatus::Unassigned => "UNASSIGNED",
            CaseStatus::Assigned => "ASSIGNED",
            CaseStatus::InProgress => "IN_PROGRESS",
            CaseStatus::Discussing => "DISCUSSING",
            CaseStatus::Resolved => "RESOLVED",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for CaseStatus {
    type Err = crate::error::ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNASSIGNED" => Ok(CaseStatus::Unassigned),
            "ASSIGNED" => Ok(CaseStatus::Assigned),
            "IN_PROGRESS" => Ok(CaseStatus::InProgress),
            "DISCUSSING" => Ok(CaseStatus::Discussing),
            "RESOLVED" => Ok(CaseStatus::Resolved),
            other => Err(crate::error::ModelError::InvalidCaseStatus(other.to_string())),
        }
    }
}

/// A per-MAC case tracking one endpoint's maintenance outcome (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: i64,
    pub maintenance_id: String,
    pub mac_address: String,
    pub status: CaseStatus,
    pub assignee: Option<String>,
    pub summary: Option<String>,
    pub last_ping_reachable: Option<bool>,
    pub ping_reachable_since: Option<DateTime<Utc>>,
    pub change_flags: HashMap<String, bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    /// P5: the stored invariant this type must never violate.
    pub fn invariant_holds(&self) -> bool {
        (self.status == CaseStatus::Unassigned) == self.assignee.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CaseNote {
    pub id: i64,
    pub case_id: i64,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Roles recognised by the human-update permission rules of §4.7.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Root,
    Pm,
    Member,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub display_name: String,
    pub role: UserRole,
    pub is_active: bool,
}
