use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::Location;

/// Wraps a `sqlx::Error` and records the call site and the operation name,
/// so a failing query can be traced back without `RUST_BACKTRACE=1`.
#[derive(Debug)]
pub struct AnnotatedSqlxError {
    file: &'static str,
    line: u32,
    query: String,
    pub source: sqlx::Error,
}

impl Display for AnnotatedSqlxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "database error: {} file={} line={} query={}",
            self.source, self.file, self.line, self.query,
        )
    }
}

impl Error for AnnotatedSqlxError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error(transparent)]
    Sqlx(#[from] AnnotatedSqlxError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DatabaseError {
    #[track_caller]
    pub fn query(query: &str, source: sqlx::Error) -> DatabaseError {
        let loc = Location::caller();
        DatabaseError::Sqlx(AnnotatedSqlxError {
            file: loc.file(),
            line: loc.line(),
            query: query.to_string(),
            source,
        })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DatabaseError::Sqlx(AnnotatedSqlxError { source: sqlx::Error::RowNotFound, .. })
                | DatabaseError::NotFound { .. }
        )
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
