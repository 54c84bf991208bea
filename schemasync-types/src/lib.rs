//! Core type definitions for schemasync.
//!
//! This crate defines the small, store-agnostic types shared by every other
//! crate in the workspace:
//! - Record identifiers as assigned by the live store
//! - Pass identifiers (UUID v7) used to correlate log output of one run
//! - Record kinds, including the two kinds of vocabulary member
//!
//! Desired-state documents and merge logic live in `schemasync-model` and
//! `schemasync-merge`; nothing here knows about payload layout.

mod ids;
mod kind;

pub use ids::{PassId, RecordId};
pub use kind::{MemberKind, RecordKind};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("unknown record kind: {0}")]
    UnknownKind(String),
}
