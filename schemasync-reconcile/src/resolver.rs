//! Resolution of document references against the store.
//!
//! Documents name members by vocabulary and local name; stored templates
//! carry bare ids. Both are brought to the same complete [`MemberRef`]
//! shape (id, namespace, prefix, local name) so the merge keys line up.

use crate::report::Warning;
use schemasync_model::{
    keys, DataBlock, DataTypeName, MemberRef, PropertyBinding, ResourceTemplateDefinition,
    VocabularyMember, VocabularyRecord,
};
use schemasync_storage::{Filter, Store, StoreError, StoreResult};
use schemasync_types::{MemberKind, RecordId, RecordKind};
use tracing::debug;

pub struct Resolver<'a> {
    store: &'a dyn Store,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    // ── Vocabularies and members ─────────────────────────────────

    pub fn vocabulary_by_namespace(&self, namespace_uri: &str) -> StoreResult<Option<VocabularyRecord>> {
        self.vocabulary_where(keys::NAMESPACE_URI, namespace_uri)
    }

    pub fn vocabulary_by_prefix(&self, prefix: &str) -> StoreResult<Option<VocabularyRecord>> {
        self.vocabulary_where(keys::PREFIX, prefix)
    }

    fn vocabulary_where(&self, key: &str, value: &str) -> StoreResult<Option<VocabularyRecord>> {
        let lookup = self
            .store
            .search_one(RecordKind::Vocabulary, &Filter::all().eq(key, value))?;
        Ok(lookup.found().as_ref().and_then(VocabularyRecord::from_record))
    }

    fn vocabulary(&self, id: RecordId) -> StoreResult<Option<VocabularyRecord>> {
        found_or_none(self.store.read(RecordKind::Vocabulary, id))
            .map(|record| record.as_ref().and_then(VocabularyRecord::from_record))
    }

    /// The member of `kind` named `local_name` in vocabulary `vocabulary_id`.
    pub fn member(&self, kind: MemberKind, vocabulary_id: RecordId, local_name: &str) -> StoreResult<Option<VocabularyMember>> {
        let filter = Filter::all()
            .eq(keys::VOCABULARY, vocabulary_id.get())
            .eq(keys::LOCAL_NAME, local_name);
        let lookup = self.store.search_one(kind.record_kind(), &filter)?;
        Ok(lookup.found().as_ref().and_then(VocabularyMember::from_record))
    }

    fn member_by_id(&self, kind: MemberKind, id: RecordId) -> StoreResult<Option<VocabularyMember>> {
        found_or_none(self.store.read(kind.record_kind(), id))
            .map(|record| record.as_ref().and_then(VocabularyMember::from_record))
    }

    fn complete(&self, member: &VocabularyMember) -> StoreResult<MemberRef> {
        let vocabulary = self.vocabulary(member.vocabulary_id)?;
        Ok(MemberRef {
            id: Some(member.id),
            vocabulary_namespace_uri: vocabulary.as_ref().map(|v| v.namespace_uri.clone()),
            vocabulary_prefix: vocabulary.map(|v| v.prefix),
            local_name: Some(member.local_name.clone()),
            label: member.label.clone(),
        })
    }

    /// Resolves a document reference: an explicit id that exists wins,
    /// then vocabulary by namespace URI (else prefix) plus local name.
    pub fn resolve_member(&self, kind: MemberKind, reference: &MemberRef) -> StoreResult<Option<MemberRef>> {
        if let Some(id) = reference.id {
            if let Some(member) = self.member_by_id(kind, id)? {
                return self.complete(&member).map(Some);
            }
        }
        let Some(local_name) = reference.local_name.as_deref() else {
            return Ok(None);
        };
        let vocabulary = match (&reference.vocabulary_namespace_uri, &reference.vocabulary_prefix) {
            (Some(ns), _) => self.vocabulary_by_namespace(ns)?,
            (None, Some(prefix)) => self.vocabulary_by_prefix(prefix)?,
            (None, None) => None,
        };
        let Some(vocabulary) = vocabulary else {
            return Ok(None);
        };
        let member = self.member(kind, vocabulary.id, local_name)?;
        Ok(member.map(|m| MemberRef {
            id: Some(m.id),
            vocabulary_namespace_uri: Some(vocabulary.namespace_uri),
            vocabulary_prefix: Some(vocabulary.prefix),
            local_name: Some(m.local_name),
            label: m.label,
        }))
    }

    /// Fills in vocabulary metadata for a stored id-only reference. Ids that
    /// no longer exist are left as they are.
    pub fn hydrate(&self, kind: MemberKind, reference: &MemberRef) -> StoreResult<MemberRef> {
        let Some(id) = reference.id else {
            return Ok(reference.clone());
        };
        match self.member_by_id(kind, id)? {
            Some(member) => self.complete(&member),
            None => Ok(reference.clone()),
        }
    }

    pub fn record_exists(&self, kind: RecordKind, id: RecordId) -> StoreResult<bool> {
        Ok(found_or_none(self.store.read(kind, id))?.is_some())
    }

    // ── Data types ───────────────────────────────────────────────

    fn custom_vocab_id(&self, label: &str) -> StoreResult<Option<RecordId>> {
        let lookup = self
            .store
            .search_one(RecordKind::CustomVocab, &Filter::all().eq(keys::LABEL, label))?;
        Ok(lookup.found().map(|r| r.id))
    }

    /// Resolves `customvocab:<label>` to `customvocab:<id>`; other names
    /// pass through. `None` means unresolved.
    pub fn resolve_data_type(&self, name: &DataTypeName) -> StoreResult<Option<DataTypeName>> {
        match name.custom_vocab_label() {
            Some(label) => Ok(self.custom_vocab_id(label)?.map(DataTypeName::custom_vocab)),
            None => Ok(Some(name.clone())),
        }
    }

    fn resolve_data_types(
        &self,
        names: &[DataTypeName],
        context: &str,
        warnings: &mut Vec<Warning>,
    ) -> StoreResult<Vec<DataTypeName>> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            match self.resolve_data_type(name)? {
                Some(name) => resolved.push(name),
                None => warnings.push(unresolved(name.as_str(), context)),
            }
        }
        Ok(resolved)
    }

    fn resolve_block(&self, block: &DataBlock, context: &str, warnings: &mut Vec<Warning>) -> StoreResult<DataBlock> {
        let mut data_types = Vec::with_capacity(block.data_types.len());
        for entry in &block.data_types {
            match self.resolve_data_type(&entry.name)? {
                Some(name) => {
                    let mut entry = entry.clone();
                    entry.name = name;
                    data_types.push(entry);
                }
                None => warnings.push(unresolved(entry.name.as_str(), context)),
            }
        }
        Ok(DataBlock {
            data_types,
            fields: block.fields.clone(),
        })
    }

    // ── Templates ────────────────────────────────────────────────

    /// Resolves every reference of an incoming template document.
    /// Unresolvable bindings, references and data types are dropped with a
    /// warning each.
    pub fn resolve_template(
        &self,
        template: &ResourceTemplateDefinition,
        warnings: &mut Vec<Warning>,
    ) -> StoreResult<ResourceTemplateDefinition> {
        let context = format!("template {}", template.label);
        let optional = |kind, reference: &Option<MemberRef>, warnings: &mut Vec<Warning>| -> StoreResult<Option<MemberRef>> {
            let Some(reference) = reference else {
                return Ok(None);
            };
            let resolved = self.resolve_member(kind, reference)?;
            if resolved.is_none() {
                warnings.push(unresolved(&reference.describe(), &context));
            }
            Ok(resolved)
        };
        let resource_class = optional(MemberKind::Class, &template.resource_class, warnings)?;
        let title_property = optional(MemberKind::Property, &template.title_property, warnings)?;
        let description_property = optional(MemberKind::Property, &template.description_property, warnings)?;

        let mut properties = Vec::with_capacity(template.properties.len());
        for binding in &template.properties {
            let Some(property) = self.resolve_member(MemberKind::Property, &binding.property)? else {
                warnings.push(unresolved(&binding.property.describe(), &context));
                continue;
            };
            let binding_context = format!("{context}, property {}", property.describe());
            let data_types = self.resolve_data_types(&binding.data_types, &binding_context, warnings)?;
            let mut data_blocks = Vec::with_capacity(binding.data_blocks.len());
            for block in &binding.data_blocks {
                data_blocks.push(self.resolve_block(block, &binding_context, warnings)?);
            }
            properties.push(PropertyBinding {
                property,
                data_types,
                data_blocks,
                extra: binding.extra.clone(),
            });
        }
        debug!(template = %template.label, bindings = properties.len(), "resolved template");

        Ok(ResourceTemplateDefinition {
            label: template.label.clone(),
            resource_class,
            title_property,
            description_property,
            properties,
            extra: template.extra.clone(),
        })
    }

    /// Hydrates a template read back from the store.
    pub fn hydrate_template(&self, template: &ResourceTemplateDefinition) -> StoreResult<ResourceTemplateDefinition> {
        let hydrate = |kind, reference: &Option<MemberRef>| -> StoreResult<Option<MemberRef>> {
            reference.as_ref().map(|r| self.hydrate(kind, r)).transpose()
        };
        let mut properties = Vec::with_capacity(template.properties.len());
        for binding in &template.properties {
            properties.push(PropertyBinding {
                property: self.hydrate(MemberKind::Property, &binding.property)?,
                ..binding.clone()
            });
        }
        Ok(ResourceTemplateDefinition {
            label: template.label.clone(),
            resource_class: hydrate(MemberKind::Class, &template.resource_class)?,
            title_property: hydrate(MemberKind::Property, &template.title_property)?,
            description_property: hydrate(MemberKind::Property, &template.description_property)?,
            properties,
            extra: template.extra.clone(),
        })
    }
}

fn unresolved(reference: &str, context: &str) -> Warning {
    Warning::UnresolvedReference {
        reference: reference.to_string(),
        context: context.to_string(),
    }
}

fn found_or_none<T>(result: StoreResult<T>) -> StoreResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
