//! `CaseNote` CRUD (§3, §4.7.6). Permission check ("only the author may
//! edit or delete") is enforced here since it's a trivial equality check,
//! not a business rule that needs the case engine's context.

use model::CaseNote;
use sqlx::PgPool;

use crate::error::{DatabaseError, DatabaseResult};

pub async fn add(pool: &PgPool, case_id: i64, author: &str, content: &str) -> DatabaseResult<CaseNote> {
    let sql = "INSERT INTO case_notes (case_id, author, content) VALUES ($1, $2, $3) RETURNING *";
    sqlx::query_as(sql)
        .bind(case_id)
        .bind(author)
        .bind(content)
        .fetch_one(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn list_for_case(pool: &PgPool, case_id: i64) -> DatabaseResult<Vec<CaseNote>> {
    let sql = "SELECT * FROM case_notes WHERE case_id = $1 ORDER BY created_at ASC";
    sqlx::query_as(sql)
        .bind(case_id)
        .fetch_all(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

async fn require_author(pool: &PgPool, note_id: i64, author: &str) -> DatabaseResult<CaseNote> {
    let sql = "SELECT * FROM case_notes WHERE id = $1";
    let note: Option<CaseNote> = sqlx::query_as(sql)
        .bind(note_id)
        .fetch_optional(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    let note = note.ok_or_else(|| DatabaseError::NotFound { kind: "case_note", id: note_id.to_string() })?;
    if note.author != author {
        return Err(DatabaseError::InvalidArgument(
            "only the note's author may edit or delete it".to_string(),
        ));
    }
    Ok(note)
}

pub async fn edit(pool: &PgPool, note_id: i64, author: &str, content: &str) -> DatabaseResult<CaseNote> {
    require_author(pool, note_id, author).await?;
    let sql = "UPDATE case_notes SET content = $2 WHERE id = $1 RETURNING *";
    sqlx::query_as(sql)
        .bind(note_id)
        .bind(content)
        .fetch_one(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))
}

pub async fn delete(pool: &PgPool, note_id: i64, author: &str) -> DatabaseResult<()> {
    require_author(pool, note_id, author).await?;
    let sql = "DELETE FROM case_notes WHERE id = $1";
    sqlx::query(sql)
        .bind(note_id)
        .execute(pool)
        .await
        .map_err(|err| DatabaseError::query(sql, err))?;
    Ok(())
}
