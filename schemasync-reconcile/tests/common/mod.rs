//! Shared fixtures for reconciliation tests: an in-memory importer that
//! serves canned ontologies and a messenger that records what it is told.

#![allow(dead_code)]

use schemasync_model::{keys, ImportOptions, Record, SourceStrategy, VocabularyDefinition};
use schemasync_reconcile::{
    ChangeKind, ImportError, ImportResult, MemberChange, MessageLevel, Messenger, Mode, OntologyDiff,
    OntologyImporter, ReconcileConfig, Reconciler, VocabularyDescriptor,
};
use schemasync_storage::{Filter, MemoryStore, SqliteStore, Store};
use schemasync_types::{MemberKind, RecordId, RecordKind};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Routes `RUST_LOG`-filtered output to the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Importer ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Ontology {
    pub classes: Vec<(String, String)>,
    pub properties: Vec<(String, String)>,
}

impl Ontology {
    pub fn new(classes: &[&str], properties: &[&str]) -> Self {
        let labeled = |names: &[&str]| names.iter().map(|n| (n.to_string(), n.to_string())).collect();
        Self {
            classes: labeled(classes),
            properties: labeled(properties),
        }
    }

    pub fn with_property_label(mut self, local: &str, label: &str) -> Self {
        for entry in &mut self.properties {
            if entry.0 == local {
                entry.1 = label.to_string();
            }
        }
        self
    }

    fn members(&self, kind: MemberKind) -> &[(String, String)] {
        match kind {
            MemberKind::Class => &self.classes,
            MemberKind::Property => &self.properties,
        }
    }
}

pub struct FakeImporter {
    store: Arc<dyn Store>,
    sources: Mutex<HashMap<String, Ontology>>,
    calls: Mutex<Vec<String>>,
}

impl FakeImporter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            sources: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn serve(&self, location: &str, ontology: Ontology) {
        self.sources.lock().unwrap().insert(location.to_string(), ontology);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn source(&self, location: &str) -> ImportResult<Ontology> {
        self.sources
            .lock()
            .unwrap()
            .get(location)
            .cloned()
            .ok_or_else(|| ImportError::SourceUnavailable {
                location: location.to_string(),
                reason: "not found".to_string(),
            })
    }

    fn create_member(&self, kind: MemberKind, vocabulary: RecordId, local: &str, label: &str) -> ImportResult<()> {
        self.store
            .create(
                kind.record_kind(),
                json!({"o:local_name": local, "o:label": label, "o:vocabulary": {"o:id": vocabulary.get()}}),
            )
            .map(|_| ())
            .map_err(|e| ImportError::ValidationFailed(e.to_string()))
    }
}

impl OntologyImporter for FakeImporter {
    fn import(
        &self,
        _strategy: SourceStrategy,
        descriptor: &VocabularyDescriptor,
        _options: &ImportOptions,
    ) -> ImportResult<RecordId> {
        self.calls.lock().unwrap().push(format!("import {}", descriptor.namespace_uri));
        let ontology = self.source(&descriptor.source_location)?;
        let vocabulary = self
            .store
            .create(
                RecordKind::Vocabulary,
                json!({
                    "o:namespace_uri": descriptor.namespace_uri,
                    "o:prefix": descriptor.prefix,
                    "o:label": descriptor.label,
                    "o:comment": descriptor.comment,
                }),
            )
            .map_err(|e| ImportError::ValidationFailed(e.to_string()))?;
        for kind in [MemberKind::Class, MemberKind::Property] {
            for (local, label) in ontology.members(kind) {
                self.create_member(kind, vocabulary.id, local, label)?;
            }
        }
        Ok(vocabulary.id)
    }

    fn get_diff(
        &self,
        _strategy: SourceStrategy,
        source_location: &str,
        namespace_uri: &str,
        _options: &ImportOptions,
    ) -> ImportResult<OntologyDiff> {
        self.calls.lock().unwrap().push(format!("diff {namespace_uri}"));
        let ontology = self.source(source_location)?;
        let vocabulary = self
            .store
            .search_one(RecordKind::Vocabulary, &Filter::all().eq(keys::NAMESPACE_URI, namespace_uri))
            .unwrap()
            .found()
            .ok_or_else(|| ImportError::ValidationFailed(format!("{namespace_uri} is not imported")))?;

        let mut diff = OntologyDiff::default();
        for kind in [MemberKind::Class, MemberKind::Property] {
            for (local, label) in ontology.members(kind) {
                let stored = self
                    .store
                    .search_one(
                        kind.record_kind(),
                        &Filter::all().eq(keys::VOCABULARY, vocabulary.id.get()).eq(keys::LOCAL_NAME, local.as_str()),
                    )
                    .unwrap()
                    .found();
                let change = match stored {
                    None => ChangeKind::Insert,
                    Some(record) if record.str_field(keys::LABEL) != Some(label.as_str()) => ChangeKind::Update,
                    Some(_) => continue,
                };
                let change = MemberChange {
                    change,
                    local_name: local.clone(),
                    label: Some(label.clone()),
                    comment: None,
                };
                match kind {
                    MemberKind::Class => diff.classes.push(change),
                    MemberKind::Property => diff.properties.push(change),
                }
            }
        }
        Ok(diff)
    }

    fn update(&self, vocabulary_id: RecordId, diff: &OntologyDiff) -> ImportResult<()> {
        self.calls.lock().unwrap().push(format!("update {vocabulary_id}"));
        let changes = diff
            .classes
            .iter()
            .map(|c| (MemberKind::Class, c))
            .chain(diff.properties.iter().map(|c| (MemberKind::Property, c)));
        for (kind, change) in changes {
            let label = change.label.clone().unwrap_or_else(|| change.local_name.clone());
            match change.change {
                ChangeKind::Insert => self.create_member(kind, vocabulary_id, &change.local_name, &label)?,
                ChangeKind::Update => {
                    let record = self
                        .store
                        .search_one(
                            kind.record_kind(),
                            &Filter::all()
                                .eq(keys::VOCABULARY, vocabulary_id.get())
                                .eq(keys::LOCAL_NAME, change.local_name.as_str()),
                        )
                        .unwrap()
                        .found()
                        .unwrap();
                    self.store
                        .update(kind.record_kind(), record.id, json!({"o:label": label}), true)
                        .map_err(|e| ImportError::ValidationFailed(e.to_string()))?;
                }
            }
        }
        Ok(())
    }
}

// ── Messenger ────────────────────────────────────────────────────

#[derive(Default)]
pub struct CollectingMessenger {
    messages: Mutex<Vec<(MessageLevel, String)>>,
}

impl CollectingMessenger {
    pub fn messages(&self) -> Vec<(MessageLevel, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count(&self, level: MessageLevel) -> usize {
        self.messages().iter().filter(|(l, _)| *l == level).count()
    }
}

impl Messenger for CollectingMessenger {
    fn notify(&self, level: MessageLevel, message: &str) {
        self.messages.lock().unwrap().push((level, message.to_string()));
    }
}

// ── Harness ──────────────────────────────────────────────────────

pub struct Harness {
    pub store: Arc<dyn Store>,
    pub importer: Arc<FakeImporter>,
    pub messenger: Arc<CollectingMessenger>,
    pub reconciler: Reconciler,
}

pub fn harness() -> Harness {
    harness_with(ReconcileConfig::default())
}

pub fn harness_with(config: ReconcileConfig) -> Harness {
    harness_on(Arc::new(MemoryStore::new()), config)
}

pub fn sqlite_harness() -> Harness {
    harness_on(Arc::new(SqliteStore::open_in_memory().unwrap()), ReconcileConfig::default())
}

pub fn harness_on(store: Arc<dyn Store>, config: ReconcileConfig) -> Harness {
    init_tracing();
    let importer = Arc::new(FakeImporter::new(store.clone()));
    let messenger = Arc::new(CollectingMessenger::default());
    let reconciler = Reconciler::new(store.clone(), importer.clone(), messenger.clone(), config);
    Harness {
        store,
        importer,
        messenger,
        reconciler,
    }
}

pub const DCTERMS: &str = "http://purl.org/dc/terms/";
pub const DCTERMS_SOURCE: &str = "vocabs/dcterms.ttl";

pub fn vocabulary_doc(namespace_uri: &str, prefix: &str, source: &str) -> VocabularyDefinition {
    serde_json::from_value(json!({
        "namespace_uri": namespace_uri,
        "prefix": prefix,
        "label": prefix,
        "source_strategy": "file",
        "source_location": source,
    }))
    .unwrap()
}

impl Harness {
    /// Imports a small Dublin Core vocabulary.
    pub fn seed_dcterms(&self) {
        self.importer.serve(
            DCTERMS_SOURCE,
            Ontology::new(
                &["Agent", "BibliographicResource"],
                &["title", "creator", "date", "subject", "description"],
            ),
        );
        let report = self
            .reconciler
            .reconcile_vocabularies(&[vocabulary_doc(DCTERMS, "dcterms", DCTERMS_SOURCE)], Mode::CheckAndApply)
            .unwrap();
        assert!(!report.has_failures());
    }

    pub fn vocabulary_id(&self, namespace_uri: &str) -> RecordId {
        self.store
            .search_one(RecordKind::Vocabulary, &Filter::all().eq(keys::NAMESPACE_URI, namespace_uri))
            .unwrap()
            .found()
            .unwrap()
            .id
    }

    pub fn member(&self, kind: MemberKind, namespace_uri: &str, local: &str) -> Option<Record> {
        let vocabulary = self.vocabulary_id(namespace_uri);
        self.store
            .search_one(
                kind.record_kind(),
                &Filter::all().eq(keys::VOCABULARY, vocabulary.get()).eq(keys::LOCAL_NAME, local),
            )
            .unwrap()
            .found()
    }

    pub fn property_id(&self, local: &str) -> u64 {
        self.member(MemberKind::Property, DCTERMS, local).unwrap().id.get()
    }

    pub fn find(&self, kind: RecordKind, label: &str) -> Record {
        self.store
            .search_one(kind, &Filter::all().eq(keys::LABEL, label))
            .unwrap()
            .found()
            .unwrap()
    }

    pub fn snapshot(&self, kind: RecordKind) -> Vec<Record> {
        self.store.search(kind, &Filter::all()).unwrap()
    }

    pub fn count(&self, kind: RecordKind) -> usize {
        self.snapshot(kind).len()
    }

    /// Adds a member the source ontology does not know about.
    pub fn add_member(&self, kind: MemberKind, local: &str) -> RecordId {
        let vocabulary = self.vocabulary_id(DCTERMS);
        self.store
            .create(
                kind.record_kind(),
                json!({"o:local_name": local, "o:label": local, "o:vocabulary": {"o:id": vocabulary.get()}}),
            )
            .unwrap()
            .id
    }
}

/// Property ids of a stored template, in binding order.
pub fn bound_property_ids(template: &Record) -> Vec<u64> {
    template.data[keys::TEMPLATE_PROPERTIES]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b[keys::PROPERTY][keys::ID].as_u64().unwrap())
        .collect()
}

pub fn binding_for<'a>(template: &'a Record, property_id: u64) -> &'a Value {
    template.data[keys::TEMPLATE_PROPERTIES]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b[keys::PROPERTY][keys::ID].as_u64() == Some(property_id))
        .unwrap()
}
