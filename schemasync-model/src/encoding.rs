//! Custom vocab payload encodings.
//!
//! Two store schema versions persist the same logical term list and URI map
//! differently:
//!
//! | Field     | Structured                      | Delimited                         |
//! |-----------|---------------------------------|-----------------------------------|
//! | `o:terms` | `["red", "blue"]`               | `"red\nblue"`                     |
//! | `o:uris`  | `{"http://x/1": "One"}`         | `"http://x/1 = One"` (one per line) |
//!
//! Parsing accepts either form; merging always happens on the parsed
//! (structured) form and the result is re-encoded for the target store.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::keys;

/// How term lists and URI maps are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadEncoding {
    #[default]
    Structured,
    Delimited,
}

/// Parses a term list from an array or a newline-delimited string.
/// Blank entries are skipped and surrounding whitespace trimmed.
pub fn parse_terms(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Parses a URI map from an object, an array of `{uri, label}` pairs or
/// lines, or a delimited string with one `uri = label` per line.
///
/// A URI without a label maps to the empty string. When a URI repeats, the
/// last label wins and the first position is kept.
pub fn parse_uris(value: &Value) -> IndexMap<String, String> {
    let mut uris = IndexMap::new();
    match value {
        Value::Object(map) => {
            for (uri, label) in map {
                let uri = uri.trim();
                if !uri.is_empty() {
                    uris.insert(uri.to_string(), label_text(label));
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(line) => insert_line(&mut uris, line),
                    Value::Object(pair) => {
                        if let Some(uri) = pair.get("uri").and_then(Value::as_str).map(str::trim) {
                            if !uri.is_empty() {
                                let label = pair.get("label").map(label_text).unwrap_or_default();
                                uris.insert(uri.to_string(), label);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        Value::String(s) => {
            for line in s.lines() {
                insert_line(&mut uris, line);
            }
        }
        _ => {}
    }
    uris
}

fn insert_line(uris: &mut IndexMap<String, String>, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    // URIs never contain whitespace, so the first run of it ends the URI.
    let (uri, rest) = match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], line[pos..].trim()),
        None => (line, ""),
    };
    let label = rest.strip_prefix('=').unwrap_or(rest).trim();
    uris.insert(uri.to_string(), label.to_string());
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Encodes a term list for persistence.
pub fn encode_terms(terms: &[String], encoding: PayloadEncoding) -> Value {
    match encoding {
        PayloadEncoding::Structured => {
            Value::Array(terms.iter().map(|t| Value::from(t.as_str())).collect())
        }
        PayloadEncoding::Delimited => Value::from(terms.join("\n")),
    }
}

/// Encodes a URI map for persistence.
pub fn encode_uris(uris: &IndexMap<String, String>, encoding: PayloadEncoding) -> Value {
    match encoding {
        PayloadEncoding::Structured => Value::Object(
            uris.iter()
                .map(|(uri, label)| (uri.clone(), Value::from(label.as_str())))
                .collect(),
        ),
        PayloadEncoding::Delimited => Value::from(
            uris.iter()
                .map(|(uri, label)| {
                    if label.is_empty() {
                        uri.clone()
                    } else {
                        format!("{uri} = {label}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
    }
}

/// Infers the encoding a stored custom vocab record uses.
/// Returns `None` when neither field carries a hint.
pub fn detect_encoding(data: &Value) -> Option<PayloadEncoding> {
    [keys::TERMS, keys::URIS]
        .iter()
        .filter_map(|key| data.get(*key))
        .find_map(|value| match value {
            Value::String(_) => Some(PayloadEncoding::Delimited),
            Value::Array(_) | Value::Object(_) => Some(PayloadEncoding::Structured),
            _ => None,
        })
}

/// Serde helper: accept either term-list encoding in documents.
pub fn deserialize_terms<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(parse_terms(&value))
}

/// Serde helper: accept either URI-map encoding in documents.
pub fn deserialize_uris<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<IndexMap<String, String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(parse_uris(&value))
}
