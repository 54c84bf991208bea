use schemasync_model::{keys, normalize_reference, Record};
use serde_json::Value;

/// Result of a single-record lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Record),
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn found(self) -> Option<Record> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound => None,
        }
    }
}

impl From<Option<Record>> for Lookup {
    fn from(record: Option<Record>) -> Self {
        record.map_or(Self::NotFound, Self::Found)
    }
}

/// A conjunction of equality conditions on top-level record keys.
///
/// Reference-valued conditions (objects, or any condition on `o:id`) compare
/// by normalized id, so `{"o:id": 3}`, `{"@id": ".../3"}` and `3` all match
/// the same stored reference. Everything else compares exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds an equality condition.
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|(key, expected)| {
            if key == keys::ID {
                return normalize_reference(expected).is_some_and(|r| r.id == record.id);
            }
            let Some(actual) = record.field(key) else {
                return expected.is_null();
            };
            if expected.is_object() || actual.is_object() {
                match (normalize_reference(expected), normalize_reference(actual)) {
                    (Some(a), Some(b)) => a == b,
                    _ => expected == actual,
                }
            } else {
                expected == actual
            }
        })
    }
}
