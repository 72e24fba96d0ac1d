use thiserror::Error;

/// Errors that can arise purely from shaping or validating domain values,
/// independent of any I/O layer.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid MAC address: {0}")]
    InvalidMacAddress(String),
    #[error("invalid case status: {0}")]
    InvalidCaseStatus(String),
    #[error("invalid collection type: {0}")]
    InvalidCollectionType(String),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}
