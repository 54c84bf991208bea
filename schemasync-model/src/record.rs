use crate::reference::{normalize_reference, RecordRef};
use schemasync_types::{RecordId, RecordKind};
use serde::{Deserialize, Serialize};

/// A record as returned by the live store.
///
/// Records are value snapshots: the engine never mutates one in place and
/// writes changes back through a single store update. The `data` field holds
/// the record's JSON payload, see [`crate::keys`] for the engine-owned keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub kind: RecordKind,
    pub data: serde_json::Value,
}

impl Record {
    /// Extract a string value from `data` using a JSON pointer (e.g., "/o:label").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.data.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract a boolean value from `data` using a JSON pointer.
    pub fn get_bool(&self, pointer: &str) -> Option<bool> {
        self.data.pointer(pointer).and_then(|v| v.as_bool())
    }

    /// Extract a top-level field.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Extract a top-level string field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(|v| v.as_str())
    }

    /// Extract and normalize a top-level reference field.
    pub fn ref_field(&self, key: &str) -> Option<RecordRef> {
        self.field(key).and_then(normalize_reference)
    }

    /// This record as a reference.
    pub fn to_ref(&self) -> RecordRef {
        RecordRef::new(self.id)
    }
}
