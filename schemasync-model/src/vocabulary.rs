use crate::definition::{check_identity, Definition};
use crate::keys;
use crate::record::Record;
use indexmap::IndexMap;
use schemasync_types::{MemberKind, RecordId, RecordKind};
use serde::{Deserialize, Serialize};

/// Where the ontology importer reads a vocabulary from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStrategy {
    File,
    Url,
}

/// Desired state of one vocabulary.
///
/// Identity key is `namespace_uri`; `prefix` is a secondary key that may
/// not be shared with a vocabulary of another namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyDefinition {
    pub namespace_uri: String,
    pub prefix: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(alias = "strategy")]
    pub source_strategy: SourceStrategy,
    #[serde(alias = "source", alias = "location")]
    pub source_location: String,
    #[serde(default, skip_serializing_if = "RenameMap::is_empty")]
    pub rename_map: RenameMap,
    /// Per-document importer options; unset fields fall back to config.
    #[serde(default, skip_serializing_if = "ImportOptions::is_empty")]
    pub import: ImportOptions,
}

impl Definition for VocabularyDefinition {
    const KIND: RecordKind = RecordKind::Vocabulary;

    fn identity(&self) -> &str {
        &self.namespace_uri
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_identity("namespace URI", &self.namespace_uri, &mut errors);
        if !self.namespace_uri.trim().is_empty() && !self.namespace_uri.ends_with(['/', '#']) {
            errors.push(format!(
                "namespace URI must end with \"/\" or \"#\": {}",
                self.namespace_uri
            ));
        }
        if self.prefix.trim().is_empty() {
            errors.push("prefix is required".to_string());
        } else if self.prefix.contains(|c: char| c == ':' || c.is_whitespace()) {
            errors.push(format!("prefix may not contain \":\" or whitespace: {}", self.prefix));
        }
        if self.label.trim().is_empty() {
            errors.push("label is required".to_string());
        }
        if self.source_location.trim().is_empty() {
            errors.push("source location is required".to_string());
        }
        for (kind, old, new) in self.rename_map.iter() {
            if old.trim().is_empty() || new.trim().is_empty() {
                errors.push(format!("{kind} rename has an empty name: {old:?} -> {new:?}"));
            } else if old == new {
                errors.push(format!("{kind} rename maps {old} onto itself"));
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Old local name -> new local name, per member kind. Order is significant:
/// when two renames target the same name, the first one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameMap {
    #[serde(default)]
    pub classes: IndexMap<String, String>,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
}

impl RenameMap {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.properties.is_empty()
    }

    /// Renames in processing order: classes first, then properties.
    pub fn iter(&self) -> impl Iterator<Item = (MemberKind, &str, &str)> {
        self.classes
            .iter()
            .map(|(o, n)| (MemberKind::Class, o.as_str(), n.as_str()))
            .chain(
                self.properties
                    .iter()
                    .map(|(o, n)| (MemberKind::Property, o.as_str(), n.as_str())),
            )
    }
}

/// Options handed to the ontology importer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// RDF serialization of the source (e.g. "turtle", "rdfxml", "guess").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_property: Option<String>,
}

impl ImportOptions {
    pub fn is_empty(&self) -> bool {
        self.format.is_none()
            && self.lang.is_none()
            && self.label_property.is_none()
            && self.comment_property.is_none()
    }

    /// Fields set on `overrides` replace ours.
    pub fn overlaid_with(&self, overrides: &ImportOptions) -> ImportOptions {
        ImportOptions {
            format: overrides.format.clone().or_else(|| self.format.clone()),
            lang: overrides.lang.clone().or_else(|| self.lang.clone()),
            label_property: overrides
                .label_property
                .clone()
                .or_else(|| self.label_property.clone()),
            comment_property: overrides
                .comment_property
                .clone()
                .or_else(|| self.comment_property.clone()),
        }
    }
}

/// A vocabulary as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyRecord {
    pub id: RecordId,
    pub namespace_uri: String,
    pub prefix: String,
    pub label: Option<String>,
    pub comment: Option<String>,
}

impl VocabularyRecord {
    pub fn from_record(record: &Record) -> Option<Self> {
        if record.kind != RecordKind::Vocabulary {
            return None;
        }
        Some(Self {
            id: record.id,
            namespace_uri: record.str_field(keys::NAMESPACE_URI)?.to_string(),
            prefix: record.str_field(keys::PREFIX)?.to_string(),
            label: record.str_field(keys::LABEL).map(str::to_string),
            comment: record.str_field(keys::COMMENT).map(str::to_string),
        })
    }
}
