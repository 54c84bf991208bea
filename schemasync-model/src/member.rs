use crate::keys;
use crate::record::Record;
use crate::reference::normalize_reference;
use schemasync_types::{MemberKind, RecordId};
use serde::{Deserialize, Serialize};

/// A reference to a vocabulary member (class or property).
///
/// Desired-state documents usually name members by vocabulary and local
/// name, because ids are store-specific. Records read back from the store
/// only carry the id until they are hydrated. Accepted input shapes:
/// `12`, `"dcterms:title"`, `"https://host/api/properties/12"`, or an object
/// with any of the fields below plus an optional `term`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MemberRefRepr")]
pub struct MemberRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocabulary_namespace_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocabulary_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MemberRef {
    /// A reference carrying only a resolved id.
    pub fn by_id(id: RecordId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// A reference by compact term, e.g. `("dcterms", "title")`.
    pub fn by_term(prefix: &str, local_name: &str) -> Self {
        Self {
            vocabulary_prefix: Some(prefix.to_string()),
            local_name: Some(local_name.to_string()),
            ..Self::default()
        }
    }

    /// A reference by vocabulary namespace and local name.
    pub fn by_namespace(namespace_uri: &str, local_name: &str) -> Self {
        Self {
            vocabulary_namespace_uri: Some(namespace_uri.to_string()),
            local_name: Some(local_name.to_string()),
            ..Self::default()
        }
    }

    /// Parses `prefix:local`, a numeric id or an id-bearing URI.
    pub fn parse(term: &str) -> Self {
        MemberRefRepr::Term(term.to_string()).into()
    }

    /// The compact `prefix:local` form, when both parts are known.
    pub fn term(&self) -> Option<String> {
        match (non_empty(&self.vocabulary_prefix), non_empty(&self.local_name)) {
            (Some(prefix), Some(local)) => Some(format!("{prefix}:{local}")),
            _ => None,
        }
    }

    /// Merge key: `namespace|localName` when both are known, else the id.
    pub fn merge_key(&self) -> Option<String> {
        match (non_empty(&self.vocabulary_namespace_uri), non_empty(&self.local_name)) {
            (Some(ns), Some(local)) => Some(format!("{ns}|{local}")),
            _ => self.id.map(|id| format!("#{id}")),
        }
    }

    /// True when namespace, local name and prefix are all present.
    pub fn is_complete(&self) -> bool {
        non_empty(&self.vocabulary_namespace_uri).is_some()
            && non_empty(&self.local_name).is_some()
            && non_empty(&self.vocabulary_prefix).is_some()
    }

    /// Human-readable description for warnings.
    pub fn describe(&self) -> String {
        if let Some(term) = self.term() {
            return term;
        }
        match (&self.vocabulary_namespace_uri, &self.local_name, self.id) {
            (Some(ns), Some(local), _) => format!("{ns}{local}"),
            (_, Some(local), _) => local.clone(),
            (_, None, Some(id)) => format!("#{id}"),
            _ => "(empty reference)".to_string(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MemberRefRepr {
    Id(u64),
    Term(String),
    Fields(MemberRefFields),
}

#[derive(Deserialize)]
struct MemberRefFields {
    #[serde(default, alias = "o:id", alias = "@id")]
    id: Option<serde_json::Value>,
    #[serde(default, alias = "namespace_uri", alias = "vocabulary_namespace")]
    vocabulary_namespace_uri: Option<String>,
    #[serde(default, alias = "prefix")]
    vocabulary_prefix: Option<String>,
    #[serde(default, alias = "o:local_name")]
    local_name: Option<String>,
    #[serde(default, alias = "o:label")]
    label: Option<String>,
    #[serde(default, alias = "o:term")]
    term: Option<String>,
}

impl From<MemberRefRepr> for MemberRef {
    fn from(repr: MemberRefRepr) -> Self {
        match repr {
            MemberRefRepr::Id(raw) => Self {
                id: RecordId::new(raw),
                ..Self::default()
            },
            MemberRefRepr::Term(term) => {
                if let Some(r) = normalize_reference(&serde_json::Value::String(term.clone())) {
                    return Self::by_id(r.id);
                }
                match term.split_once(':') {
                    Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => {
                        Self::by_term(prefix.trim(), local.trim())
                    }
                    _ => Self {
                        local_name: Some(term.trim().to_string()),
                        ..Self::default()
                    },
                }
            }
            MemberRefRepr::Fields(fields) => {
                let from_term = fields.term.as_deref().map(MemberRef::parse).unwrap_or_default();
                Self {
                    id: fields
                        .id
                        .as_ref()
                        .and_then(normalize_reference)
                        .map(|r| r.id)
                        .or(from_term.id),
                    vocabulary_namespace_uri: fields.vocabulary_namespace_uri,
                    vocabulary_prefix: fields.vocabulary_prefix.or(from_term.vocabulary_prefix),
                    local_name: fields.local_name.or(from_term.local_name),
                    label: fields.label,
                }
            }
        }
    }
}

/// A class or property as stored, owned by exactly one vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyMember {
    pub id: RecordId,
    pub kind: MemberKind,
    pub local_name: String,
    pub vocabulary_id: RecordId,
    pub label: Option<String>,
}

impl VocabularyMember {
    /// Reads a member out of a class or property record.
    /// Returns `None` when the record is not a member or lacks identity fields.
    pub fn from_record(record: &Record) -> Option<Self> {
        let kind = record.kind.as_member()?;
        Some(Self {
            id: record.id,
            kind,
            local_name: record.str_field(keys::LOCAL_NAME)?.to_string(),
            vocabulary_id: record.ref_field(keys::VOCABULARY)?.id,
            label: record.str_field(keys::LABEL).map(str::to_string),
        })
    }
}
