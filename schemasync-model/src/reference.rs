//! Reference normalization.
//!
//! A "reference to record X" reaches the engine in several shapes: an
//! embedded record object, an identifier map (`{"o:id": 3}` or `{"id": "3"}`),
//! a JSON-LD node (`{"@id": "https://host/api/items/3"}`), a bare number,
//! or a URI whose last path segment is the id. Everything is funnelled
//! through [`normalize_reference`] so call sites never sniff shapes.

use crate::keys;
use schemasync_types::RecordId;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A resolved reference to a stored record. Serializes as `{"o:id": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordRef {
    pub id: RecordId,
}

impl RecordRef {
    pub const fn new(id: RecordId) -> Self {
        Self { id }
    }

    /// The canonical JSON form.
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(keys::ID.to_string(), Value::from(self.id.get()));
        Value::Object(map)
    }
}

impl From<RecordId> for RecordRef {
    fn from(id: RecordId) -> Self {
        Self { id }
    }
}

impl Serialize for RecordRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(keys::ID, &self.id.get())?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for RecordRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        normalize_reference(&value)
            .ok_or_else(|| de::Error::custom(format!("unresolvable record reference: {value}")))
    }
}

/// Converts any supported reference shape to a [`RecordRef`].
///
/// Returns `None` for anything that does not carry a positive integer id.
/// Never panics on malformed input.
pub fn normalize_reference(value: &Value) -> Option<RecordRef> {
    let id = match value {
        Value::Number(_) => scalar_id(value),
        Value::String(s) => id_from_str(s),
        Value::Object(map) => map
            .get(keys::ID)
            .or_else(|| map.get(keys::PLAIN_ID))
            .and_then(scalar_id)
            .or_else(|| map.get(keys::LD_ID).and_then(Value::as_str).and_then(id_from_uri)),
        _ => None,
    }?;
    Some(RecordRef { id })
}

/// Normalizes every element of an array, dropping the unresolvable ones.
/// A single non-array value is treated as a one-element list.
pub fn normalize_references(value: &Value) -> Vec<RecordRef> {
    match value {
        Value::Array(items) => items.iter().filter_map(normalize_reference).collect(),
        Value::Null => Vec::new(),
        other => normalize_reference(other).into_iter().collect(),
    }
}

/// Rewrites the given top-level reference keys of `record` to canonical form.
///
/// Keys whose value cannot be resolved are set to `null`; their names are
/// returned so the caller can decide whether that is fatal. Absent and
/// already-null keys are left alone.
pub fn canonicalize_refs(record: &mut Value, ref_keys: &[&str]) -> Vec<String> {
    let mut unresolved = Vec::new();
    let Some(map) = record.as_object_mut() else {
        return unresolved;
    };
    for key in ref_keys {
        let Some(slot) = map.get_mut(*key) else {
            continue;
        };
        if slot.is_null() {
            continue;
        }
        match normalize_reference(slot) {
            Some(r) => *slot = r.to_value(),
            None => {
                *slot = Value::Null;
                unresolved.push((*key).to_string());
            }
        }
    }
    unresolved
}

fn scalar_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f > 0.0).map(|f| f as u64))
            .and_then(RecordId::new),
        Value::String(s) => parse_digits(s.trim()),
        _ => None,
    }
}

fn id_from_str(s: &str) -> Option<RecordId> {
    let s = s.trim();
    parse_digits(s).or_else(|| id_from_uri(s))
}

/// Extracts the id from a URI whose final path segment is numeric.
fn id_from_uri(uri: &str) -> Option<RecordId> {
    let uri = uri.split(['#', '?']).next().unwrap_or_default();
    let uri = uri.trim_end_matches('/');
    if !uri.contains('/') {
        return None;
    }
    uri.rsplit('/').next().and_then(parse_digits)
}

fn parse_digits(s: &str) -> Option<RecordId> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u64>().ok().and_then(RecordId::new)
}
