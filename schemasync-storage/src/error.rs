//! Error types for the storage layer.

use schemasync_types::{RecordId, RecordKind};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record of this kind has this id.
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: RecordId },

    /// The store rejected a payload.
    #[error("{kind} payload rejected: {}", errors.join("; "))]
    ValidationFailed { kind: RecordKind, errors: Vec<String> },

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A store lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Lock,

    /// Any other store failure.
    #[error("store error: {0}")]
    Store(String),
}

impl StoreError {
    /// The validation messages, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&[String]> {
        match self {
            Self::ValidationFailed { errors, .. } => Some(errors),
            _ => None,
        }
    }
}
