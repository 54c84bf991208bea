//! Custom vocab payload merge.

use indexmap::IndexMap;
use schemasync_model::encoding::PayloadEncoding;
use schemasync_model::{keys, CustomVocabDefinition, CustomVocabRecord, VocabSource};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Which branch [`build_update_payload`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermBranch {
    ItemSet,
    Uris,
    Terms,
    LabelOnly,
}

/// A complete custom vocab payload in normalized form.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomVocabPayload {
    pub label: String,
    pub lang: Option<String>,
    pub source: VocabSource,
    pub branch: TermBranch,
}

impl CustomVocabPayload {
    /// Payload for a custom vocab that does not exist yet.
    pub fn from_definition(definition: &CustomVocabDefinition) -> Self {
        let source = definition.source();
        let branch = match source {
            VocabSource::ItemSet(_) => TermBranch::ItemSet,
            VocabSource::Uris(_) => TermBranch::Uris,
            VocabSource::Terms(_) => TermBranch::Terms,
            VocabSource::Empty => TermBranch::LabelOnly,
        };
        Self {
            label: definition.label.clone(),
            lang: definition.lang.clone(),
            source,
            branch,
        }
    }

    /// Encodes the payload for a store using `encoding`.
    pub fn to_value(&self, encoding: PayloadEncoding) -> Value {
        let mut map = Map::new();
        map.insert(keys::LABEL.to_string(), Value::from(self.label.as_str()));
        map.insert(
            keys::LANG.to_string(),
            self.lang.as_deref().map(Value::from).unwrap_or(Value::Null),
        );
        self.source.write_into(&mut map, encoding);
        Value::Object(map)
    }
}

/// Builds the full update payload for an existing custom vocab.
///
/// Branches, in strict priority order:
/// 1. incoming item set: adopted, term list and URI map cleared
/// 2. incoming URI map: merged by URI, incoming labels win
/// 3. incoming terms: merged case-insensitively, first-seen casing kept
/// 4. nothing: only the label changes
pub fn build_update_payload(
    existing: &CustomVocabRecord,
    incoming: &CustomVocabDefinition,
) -> CustomVocabPayload {
    let lang = incoming.lang.clone().or_else(|| existing.lang.clone());

    if let Some(item_set) = incoming.item_set_ref() {
        return CustomVocabPayload {
            label: incoming.label.clone(),
            lang,
            source: VocabSource::ItemSet(item_set),
            branch: TermBranch::ItemSet,
        };
    }
    if !incoming.uris.is_empty() {
        return CustomVocabPayload {
            label: incoming.label.clone(),
            lang,
            source: VocabSource::Uris(merge_uris(&existing.uris, &incoming.uris)),
            branch: TermBranch::Uris,
        };
    }
    if !incoming.terms.is_empty() {
        return CustomVocabPayload {
            label: incoming.label.clone(),
            lang,
            source: VocabSource::Terms(merge_terms(&existing.terms, &incoming.terms)),
            branch: TermBranch::Terms,
        };
    }
    CustomVocabPayload {
        label: incoming.label.clone(),
        lang: existing.lang.clone(),
        source: existing.source(),
        branch: TermBranch::LabelOnly,
    }
}

/// Merges URI maps: existing order first, incoming-only URIs appended,
/// incoming label wins on a shared URI.
pub fn merge_uris(
    existing: &IndexMap<String, String>,
    incoming: &IndexMap<String, String>,
) -> IndexMap<String, String> {
    let mut merged = existing.clone();
    for (uri, label) in incoming {
        merged.insert(uri.clone(), label.clone());
    }
    merged
}

/// Merges term lists: existing then incoming, first occurrence per
/// case-insensitive key kept.
pub fn merge_terms(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    existing
        .iter()
        .chain(incoming)
        .filter(|term| seen.insert(term.to_lowercase()))
        .cloned()
        .collect()
}
