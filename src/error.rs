//! Error types for the logbook.

use thiserror::Error;

/// Main error type for logbook operations.
///
/// A missing event is never an error: lookups and mutations report it as
/// `None`.
#[derive(Debug, Error)]
pub enum LogbookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Logbook is locked by another owner")]
    Locked,

    #[error("Logbook not initialized")]
    NotInitialized,
}

impl From<serde_json::Error> for LogbookError {
    fn from(e: serde_json::Error) -> Self {
        LogbookError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for LogbookError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        LogbookError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for LogbookError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        LogbookError::Deserialization(e.to_string())
    }
}

/// Result type for logbook operations.
pub type Result<T> = std::result::Result<T, LogbookError>;
