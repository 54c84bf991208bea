//! Resource template property merge.
//!
//! Bindings are keyed by `namespace|localName` (falling back to the resolved
//! id for bindings read back from the store without metadata). Existing
//! bindings fix the base order; incoming-only bindings are appended. The
//! result is never re-sorted.

use indexmap::map::Entry;
use indexmap::IndexMap;
use schemasync_model::{DataBlock, DataTypeName, MemberRef, PropertyBinding, ResourceTemplateDefinition};
use schemasync_types::RecordId;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};

/// Result of merging an incoming template document into a stored one.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTemplate {
    pub template: ResourceTemplateDefinition,
    /// Bindings dropped because they carry no resolved property id.
    pub discarded: Vec<PropertyBinding>,
    /// Bindings collapsed into another binding of the same property id.
    pub collapsed: Vec<PropertyBinding>,
}

/// Merges `incoming` into `existing`.
///
/// Template-level references take the incoming value when present, extra
/// top-level keys are overridden key by key, and property bindings go
/// through the keyed, order-preserving merge.
pub fn merge_template(
    existing: &ResourceTemplateDefinition,
    incoming: &ResourceTemplateDefinition,
) -> MergedTemplate {
    let extra = override_keys(&existing.extra, &incoming.extra);
    let (properties, discarded, collapsed) = merge_bindings(&existing.properties, &incoming.properties);

    MergedTemplate {
        template: ResourceTemplateDefinition {
            label: incoming.label.clone(),
            resource_class: prefer(&incoming.resource_class, &existing.resource_class),
            title_property: prefer(&incoming.title_property, &existing.title_property),
            description_property: prefer(&incoming.description_property, &existing.description_property),
            properties,
            extra,
        },
        discarded,
        collapsed,
    }
}

fn prefer(incoming: &Option<MemberRef>, existing: &Option<MemberRef>) -> Option<MemberRef> {
    incoming.clone().or_else(|| existing.clone())
}

type BindingLists = (Vec<PropertyBinding>, Vec<PropertyBinding>, Vec<PropertyBinding>);

fn merge_bindings(existing: &[PropertyBinding], incoming: &[PropertyBinding]) -> BindingLists {
    let mut keyed: IndexMap<String, PropertyBinding> = IndexMap::new();
    let mut discarded = Vec::new();

    for binding in existing.iter().chain(incoming) {
        let Some(key) = binding.property.merge_key() else {
            discarded.push(binding.clone());
            continue;
        };
        match keyed.entry(key) {
            Entry::Occupied(mut slot) => {
                let merged = merge_binding(slot.get(), binding);
                slot.insert(merged);
            }
            Entry::Vacant(slot) => {
                slot.insert(binding.clone());
            }
        }
    }

    // Dedup by resolved id. The first position wins; its content is the
    // first entry carrying complete vocabulary metadata.
    let mut result: Vec<PropertyBinding> = Vec::with_capacity(keyed.len());
    let mut position: IndexMap<RecordId, usize> = IndexMap::new();
    let mut collapsed = Vec::new();
    for binding in keyed.into_values() {
        let Some(id) = binding.property.id else {
            discarded.push(binding);
            continue;
        };
        match position.get(&id) {
            Some(&at) => {
                if !result[at].property.is_complete() && binding.property.is_complete() {
                    collapsed.push(std::mem::replace(&mut result[at], binding));
                } else {
                    collapsed.push(binding);
                }
            }
            None => {
                position.insert(id, result.len());
                result.push(binding);
            }
        }
    }

    (result, discarded, collapsed)
}

/// Merges two bindings of the same property.
pub fn merge_binding(existing: &PropertyBinding, incoming: &PropertyBinding) -> PropertyBinding {
    let (e, i) = (&existing.property, &incoming.property);
    PropertyBinding {
        property: MemberRef {
            id: i.id.or(e.id),
            vocabulary_namespace_uri: i
                .vocabulary_namespace_uri
                .clone()
                .or_else(|| e.vocabulary_namespace_uri.clone()),
            vocabulary_prefix: i.vocabulary_prefix.clone().or_else(|| e.vocabulary_prefix.clone()),
            local_name: i.local_name.clone().or_else(|| e.local_name.clone()),
            label: i.label.clone().or_else(|| e.label.clone()),
        },
        data_types: union_data_types(&existing.data_types, &incoming.data_types),
        data_blocks: merge_blocks(&existing.data_blocks, &incoming.data_blocks),
        extra: override_keys(&existing.extra, &incoming.extra),
    }
}

fn override_keys(existing: &Map<String, Value>, incoming: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = existing.clone();
    for (key, value) in incoming {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Order-preserving union: existing names first, then new incoming names.
/// If one side is empty the other is taken as is.
pub fn union_data_types(existing: &[DataTypeName], incoming: &[DataTypeName]) -> Vec<DataTypeName> {
    let mut seen = HashSet::new();
    existing
        .iter()
        .chain(incoming)
        .filter(|name| seen.insert((*name).clone()))
        .cloned()
        .collect()
}

/// Merges data blocks.
///
/// The first blocks merge by name-keyed union of their data-type tables
/// (incoming wins on a name collision) with incoming's other fields applied
/// as overrides. Trailing existing blocks are kept; trailing incoming blocks
/// are appended unless a block with the same data-type name set exists.
pub fn merge_blocks(existing: &[DataBlock], incoming: &[DataBlock]) -> Vec<DataBlock> {
    let (Some(e_first), Some(i_first)) = (existing.first(), incoming.first()) else {
        return if existing.is_empty() {
            incoming.to_vec()
        } else {
            existing.to_vec()
        };
    };

    let mut blocks = Vec::with_capacity(existing.len() + incoming.len());
    blocks.push(merge_block(e_first, i_first));
    blocks.extend(existing[1..].iter().cloned());
    for block in &incoming[1..] {
        let names = name_set(block);
        if !blocks.iter().any(|b| name_set(b) == names) {
            blocks.push(block.clone());
        }
    }
    blocks
}

fn merge_block(existing: &DataBlock, incoming: &DataBlock) -> DataBlock {
    let mut data_types = existing.data_types.clone();
    for entry in &incoming.data_types {
        match data_types.iter_mut().find(|e| e.name == entry.name) {
            Some(slot) => *slot = entry.clone(),
            None => data_types.push(entry.clone()),
        }
    }
    let mut fields = existing.fields.clone();
    for (key, value) in &incoming.fields {
        fields.insert(key.clone(), value.clone());
    }
    DataBlock { data_types, fields }
}

fn name_set(block: &DataBlock) -> BTreeSet<&DataTypeName> {
    block.data_types.iter().map(|e| &e.name).collect()
}
