use crate::definition::{check_identity, Definition};
use crate::encoding::{self, PayloadEncoding};
use crate::keys;
use crate::record::Record;
use crate::reference::{normalize_reference, RecordRef};
use indexmap::IndexMap;
use schemasync_types::{RecordId, RecordKind};
use serde::{Deserialize, Serialize};

/// Desired state of one custom vocab (enumerated value list).
///
/// Identity key is `label`. At most one of `item_set`, `uris` and `terms`
/// is authoritative, in that priority order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomVocabDefinition {
    #[serde(alias = "o:label")]
    pub label: String,
    #[serde(default, alias = "o:lang", skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Raw item set reference; see [`CustomVocabDefinition::item_set_ref`].
    #[serde(default, alias = "o:item_set", skip_serializing_if = "Option::is_none")]
    pub item_set: Option<serde_json::Value>,
    #[serde(
        default,
        alias = "o:uris",
        deserialize_with = "encoding::deserialize_uris",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub uris: IndexMap<String, String>,
    #[serde(
        default,
        alias = "o:terms",
        deserialize_with = "encoding::deserialize_terms",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub terms: Vec<String>,
}

impl CustomVocabDefinition {
    /// True when the document names an item set at all, resolvable or not.
    pub fn declares_item_set(&self) -> bool {
        self.item_set.as_ref().is_some_and(|v| !v.is_null())
    }

    /// The normalized item set reference, if the document carries one that
    /// can be resolved to an id.
    pub fn item_set_ref(&self) -> Option<RecordRef> {
        self.item_set.as_ref().and_then(normalize_reference)
    }

    /// The authoritative source of this document.
    pub fn source(&self) -> VocabSource {
        if let Some(r) = self.item_set_ref() {
            VocabSource::ItemSet(r)
        } else if !self.uris.is_empty() {
            VocabSource::Uris(self.uris.clone())
        } else if !self.terms.is_empty() {
            VocabSource::Terms(self.terms.clone())
        } else {
            VocabSource::Empty
        }
    }
}

impl Definition for CustomVocabDefinition {
    const KIND: RecordKind = RecordKind::CustomVocab;

    fn identity(&self) -> &str {
        &self.label
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_identity("label", &self.label, &mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// The one authoritative value source of a custom vocab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VocabSource {
    ItemSet(RecordRef),
    Uris(IndexMap<String, String>),
    Terms(Vec<String>),
    #[default]
    Empty,
}

impl VocabSource {
    pub fn is_item_set(&self) -> bool {
        matches!(self, Self::ItemSet(_))
    }

    /// Writes all three source keys, clearing the non-authoritative ones so
    /// a full update cannot leave stale data of another mode behind.
    pub fn write_into(&self, map: &mut serde_json::Map<String, serde_json::Value>, encoding: PayloadEncoding) {
        let (item_set, uris, terms) = match self {
            Self::ItemSet(r) => (r.to_value(), IndexMap::new(), Vec::new()),
            Self::Uris(u) => (serde_json::Value::Null, u.clone(), Vec::new()),
            Self::Terms(t) => (serde_json::Value::Null, IndexMap::new(), t.clone()),
            Self::Empty => (serde_json::Value::Null, IndexMap::new(), Vec::new()),
        };
        map.insert(keys::ITEM_SET.to_string(), item_set);
        map.insert(keys::URIS.to_string(), encoding::encode_uris(&uris, encoding));
        map.insert(keys::TERMS.to_string(), encoding::encode_terms(&terms, encoding));
    }
}

/// A custom vocab as stored, with its payload already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomVocabRecord {
    pub id: RecordId,
    pub label: String,
    pub lang: Option<String>,
    pub item_set: Option<RecordRef>,
    pub uris: IndexMap<String, String>,
    pub terms: Vec<String>,
    /// Encoding the record was stored with, when it gives any hint.
    pub encoding: Option<PayloadEncoding>,
}

impl CustomVocabRecord {
    pub fn from_record(record: &Record) -> Option<Self> {
        if record.kind != RecordKind::CustomVocab {
            return None;
        }
        let null = serde_json::Value::Null;
        Some(Self {
            id: record.id,
            label: record.str_field(keys::LABEL)?.to_string(),
            lang: record
                .str_field(keys::LANG)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            item_set: record.ref_field(keys::ITEM_SET),
            uris: encoding::parse_uris(record.field(keys::URIS).unwrap_or(&null)),
            terms: encoding::parse_terms(record.field(keys::TERMS).unwrap_or(&null)),
            encoding: encoding::detect_encoding(&record.data),
        })
    }

    /// The authoritative source currently stored.
    pub fn source(&self) -> VocabSource {
        if let Some(r) = self.item_set {
            VocabSource::ItemSet(r)
        } else if !self.uris.is_empty() {
            VocabSource::Uris(self.uris.clone())
        } else if !self.terms.is_empty() {
            VocabSource::Terms(self.terms.clone())
        } else {
            VocabSource::Empty
        }
    }
}
