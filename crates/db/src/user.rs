//! The operator/user table backing §4.7.1's "lowest-id ROOT user" default
//! assignee and §4.7.6's role-gated reassignment and active-user checks.

use model::{User, UserRole};
use sqlx::PgPool;

use crate::error::{DatabaseError, DatabaseResult};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    display_name: String,
    role: String,
    is_active: bool,
}

fn row_to_user(row: UserRow) -> DatabaseResult<User> {
    let role = match row.role.as_str() {
        "ROOT" => UserRole::Root,
        "PM" => UserRole::Pm,
        "MEMBER" => UserRole::Member,
        other => return Err(DatabaseError::Internal(format!("unknown user role: {other}"))),
    };
    Ok(User { id: row.id, display_name: row.display_name, role, is_active: row.is_active })
}

pub async fn get_by_name(pool: &PgPool, display_name: &str) -> DatabaseResult<Option<User>> {
    let sql = "SELECT * FROM users WHERE display_name = $1";
    let row: Option<UserRow> = sqlx::query_as(sql)
        .bind(display_name)
        .fetch_optional(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    row.map(row_to_user).transpose()
}

/// §4.7.1: the lowest-id ROOT user, used as the fallback assignee when a
/// MAC has no `default_assignee`.
pub async fn lowest_id_root(pool: &PgPool) -> DatabaseResult<Option<User>> {
    let sql = "SELECT * FROM users WHERE role = 'ROOT' AND is_active = true ORDER BY id ASC LIMIT 1";
    let row: Option<UserRow> = sqlx::query_as(sql)
        .fetch_optional(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    row.map(row_to_user).transpose()
}

pub async fn list(pool: &PgPool) -> DatabaseResult<Vec<User>> {
    let sql = "SELECT * FROM users ORDER BY id ASC";
    let rows: Vec<UserRow> = sqlx::query_as(sql)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    rows.into_iter().map(row_to_user).collect()
}
