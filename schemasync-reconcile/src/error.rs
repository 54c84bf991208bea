//! Error types for the reconciliation layer.

use schemasync_storage::StoreError;
use schemasync_types::RecordKind;
use thiserror::Error;

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Result type for ontology importer calls.
pub type ImportResult<T> = Result<T, ImportError>;

/// Errors reported by the ontology importer.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The importer rejected the vocabulary or the diff.
    #[error("import validation failed: {0}")]
    ValidationFailed(String),

    /// The definition file or URL could not be read.
    #[error("source {location} unavailable: {reason}")]
    SourceUnavailable { location: String, reason: String },
}

/// Errors that can occur while reconciling desired state against a store.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A document's identity clashes with another document or a stored
    /// record. Aborts the whole batch.
    #[error("{kind} {document} conflicts: {reason}")]
    IdentityConflict {
        kind: RecordKind,
        document: String,
        reason: String,
    },

    /// A document failed structural validation.
    #[error("{document} is invalid: {}", errors.join("; "))]
    ValidationFailed { document: String, errors: Vec<String> },

    /// The document's source could not be read.
    #[error("{document}: source unavailable: {reason}")]
    SourceUnavailable { document: String, reason: String },

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Importer error.
    #[error("importer error: {0}")]
    Import(#[from] ImportError),

    /// A raw document could not be parsed.
    #[error("invalid document {document}: {reason}")]
    InvalidDocument { document: String, reason: String },

    /// The operation makes no sense for its arguments.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl ReconcileError {
    /// Validation messages from whichever collaborator rejected the input.
    pub fn validation_errors(&self) -> Vec<String> {
        match self {
            Self::ValidationFailed { errors, .. } => errors.clone(),
            Self::Store(e) => e.validation_errors().map(<[String]>::to_vec).unwrap_or_default(),
            Self::Import(ImportError::ValidationFailed(message)) => vec![message.clone()],
            _ => Vec::new(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::IdentityConflict { .. })
    }
}
