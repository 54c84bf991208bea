//! Payload validation shared by the bundled stores.
//!
//! Mirrors the constraints a live store enforces on schema records:
//! required identity fields and uniqueness of identity keys.

use schemasync_model::{keys, normalize_reference, Record};
use schemasync_types::RecordKind;
use serde_json::Value;

/// Validates `data` for a record of `kind`, given the other stored records
/// of the same kind (the record being updated excluded).
pub fn validate(kind: RecordKind, data: &Value, others: &[Record]) -> Result<(), Vec<String>> {
    if !data.is_object() {
        return Err(vec!["payload must be a JSON object".to_string()]);
    }
    let mut errors = Vec::new();
    // Exact comparison, matching how filters look identity keys up.
    let taken = |key: &str, value: &str| others.iter().any(|r| r.str_field(key) == Some(value));

    match kind {
        RecordKind::Vocabulary => {
            if let Some(ns) = required_text(data, keys::NAMESPACE_URI, &mut errors) {
                if taken(keys::NAMESPACE_URI, ns) {
                    errors.push(format!("namespace URI {ns} is already taken"));
                }
            }
            if let Some(prefix) = required_text(data, keys::PREFIX, &mut errors) {
                if taken(keys::PREFIX, prefix) {
                    errors.push(format!("prefix {prefix} is already taken"));
                }
            }
            required_text(data, keys::LABEL, &mut errors);
        }
        RecordKind::ResourceClass | RecordKind::Property => {
            let local = required_text(data, keys::LOCAL_NAME, &mut errors);
            let vocabulary = data.get(keys::VOCABULARY).and_then(normalize_reference);
            if vocabulary.is_none() {
                errors.push(format!("{} is required", keys::VOCABULARY));
            }
            if let (Some(local), Some(vocabulary)) = (local, vocabulary) {
                let clash = others.iter().any(|r| {
                    r.ref_field(keys::VOCABULARY) == Some(vocabulary) && r.str_field(keys::LOCAL_NAME) == Some(local)
                });
                if clash {
                    errors.push(format!("local name {local} is already taken in vocabulary {}", vocabulary.id));
                }
            }
        }
        RecordKind::ResourceTemplate | RecordKind::CustomVocab => {
            if let Some(label) = required_text(data, keys::LABEL, &mut errors) {
                if taken(keys::LABEL, label) {
                    errors.push(format!("label {label} is already taken"));
                }
            }
        }
        RecordKind::ItemSet | RecordKind::Item | RecordKind::Media => {}
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn required_text<'a>(data: &'a Value, key: &str, errors: &mut Vec<String>) -> Option<&'a str> {
    let value = data.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty());
    if value.is_none() {
        errors.push(format!("{key} is required"));
    }
    value
}
