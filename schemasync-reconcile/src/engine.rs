//! Reconciliation engine: check/apply workflow per resource kind.
//!
//! A pass runs in two phases. The check phase resolves every document's
//! identity against the batch and the store without mutating anything; an
//! identity conflict aborts the whole batch before anything is applied. The
//! apply phase then processes documents strictly in order, re-deriving state
//! from the store for each one, and isolates failures per document.

use crate::config::{ExistingPolicy, ReconcileConfig};
use crate::custom_vocab::CustomVocabApplier;
use crate::error::{ReconcileError, ReconcileResult};
use crate::importer::OntologyImporter;
use crate::messenger::{MessageLevel, Messenger};
use crate::report::{DocumentReport, Mode, Outcome, PassReport, PlannedAction, Warning};
use crate::rewriter::ReferenceRewriter;
use crate::template::TemplateApplier;
use crate::vocabulary::VocabularyApplier;
use schemasync_model::{
    keys, CustomVocabDefinition, Definition, ResourceTemplateDefinition, VocabularyDefinition,
};
use schemasync_storage::{Store, StoreResult};
use schemasync_types::{PassId, RecordKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

/// Check-phase verdict for one document. An `Err` fails only that document.
pub(crate) type Checked = ReconcileResult<PlannedAction>;

/// Per-kind check and apply logic.
pub(crate) trait Applier {
    type Document: Definition + Serialize;

    /// Returns one verdict per document, or an error that aborts the batch.
    fn check(&self, documents: &[Self::Document]) -> ReconcileResult<Vec<Checked>>;

    fn apply(&self, document: &Self::Document, warnings: &mut Vec<Warning>) -> ReconcileResult<Outcome>;
}

/// An ordered batch of desired-state documents of one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    Vocabularies(Vec<VocabularyDefinition>),
    Templates(Vec<ResourceTemplateDefinition>),
    CustomVocabs(Vec<CustomVocabDefinition>),
}

impl Batch {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Vocabularies(_) => RecordKind::Vocabulary,
            Self::Templates(_) => RecordKind::ResourceTemplate,
            Self::CustomVocabs(_) => RecordKind::CustomVocab,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Vocabularies(d) => d.len(),
            Self::Templates(d) => d.len(),
            Self::CustomVocabs(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses already-loaded JSON documents of `kind`.
    pub fn from_json(kind: RecordKind, documents: &[Value]) -> ReconcileResult<Self> {
        match kind {
            RecordKind::Vocabulary => parse_all(documents).map(Self::Vocabularies),
            RecordKind::ResourceTemplate => parse_all(documents).map(Self::Templates),
            RecordKind::CustomVocab => parse_all(documents).map(Self::CustomVocabs),
            other => Err(ReconcileError::InvalidOperation(format!(
                "{other} records are not reconciled from documents"
            ))),
        }
    }
}

fn parse_all<D: DeserializeOwned>(documents: &[Value]) -> ReconcileResult<Vec<D>> {
    documents
        .iter()
        .enumerate()
        .map(|(index, value)| {
            D::deserialize(value).map_err(|e| ReconcileError::InvalidDocument {
                document: document_name(value, index),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn document_name(value: &Value, index: usize) -> String {
    ["namespace_uri", keys::NAMESPACE_URI, "label", keys::LABEL]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map_or_else(|| format!("document #{}", index + 1), str::to_string)
}

/// The reconciliation orchestrator.
///
/// Collaborators are injected at construction; the reconciler holds no
/// state between passes, so re-running a pass after a partial failure
/// starts from whatever the store holds now.
pub struct Reconciler {
    store: Arc<dyn Store>,
    importer: Arc<dyn OntologyImporter>,
    messenger: Arc<dyn Messenger>,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn Store>,
        importer: Arc<dyn OntologyImporter>,
        messenger: Arc<dyn Messenger>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            store,
            importer,
            messenger,
            config,
        }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub(crate) fn importer(&self) -> &dyn OntologyImporter {
        self.importer.as_ref()
    }

    pub fn rewriter(&self) -> ReferenceRewriter<'_> {
        ReferenceRewriter::new(self.store())
    }

    pub(crate) fn existing_policy(&self, kind: RecordKind) -> ExistingPolicy {
        match kind {
            RecordKind::Vocabulary => self.config.on_existing_vocabulary,
            RecordKind::ResourceTemplate => self.config.on_existing_template,
            RecordKind::CustomVocab => self.config.on_existing_custom_vocab,
            _ => ExistingPolicy::Update,
        }
    }

    // ── Passes ───────────────────────────────────────────────────

    pub fn reconcile_vocabularies(&self, documents: &[VocabularyDefinition], mode: Mode) -> ReconcileResult<PassReport> {
        self.run(&VocabularyApplier::new(self), documents, mode)
    }

    pub fn reconcile_templates(&self, documents: &[ResourceTemplateDefinition], mode: Mode) -> ReconcileResult<PassReport> {
        self.run(&TemplateApplier::new(self), documents, mode)
    }

    pub fn reconcile_custom_vocabs(&self, documents: &[CustomVocabDefinition], mode: Mode) -> ReconcileResult<PassReport> {
        self.run(&CustomVocabApplier::new(self), documents, mode)
    }

    pub fn reconcile(&self, batch: &Batch, mode: Mode) -> ReconcileResult<PassReport> {
        match batch {
            Batch::Vocabularies(documents) => self.reconcile_vocabularies(documents, mode),
            Batch::Templates(documents) => self.reconcile_templates(documents, mode),
            Batch::CustomVocabs(documents) => self.reconcile_custom_vocabs(documents, mode),
        }
    }

    fn run<A: Applier>(&self, applier: &A, documents: &[A::Document], mode: Mode) -> ReconcileResult<PassReport> {
        let pass_id = PassId::new();
        let kind = A::Document::KIND;
        let span = info_span!("reconcile", pass = %pass_id, %kind);
        let _guard = span.enter();
        info!(documents = documents.len(), ?mode, "starting pass");

        let checked = match applier.check(documents) {
            Ok(checked) => checked,
            Err(e) => {
                error!(error = %e, "check phase failed, batch aborted");
                self.messenger
                    .notify(MessageLevel::Error, &format!("{kind} batch aborted: {e}"));
                return Err(e);
            }
        };

        let mut report = PassReport::new(pass_id, kind, mode);
        for (document, verdict) in documents.iter().zip(checked) {
            let identity = document.identity().to_string();
            let mut warnings = Vec::new();
            let result = match (verdict, mode) {
                (Err(e), _) => Err(e),
                (Ok(action), Mode::CheckOnly) => Ok(Outcome::Planned(action)),
                (Ok(_), Mode::CheckAndApply) => applier.apply(document, &mut warnings),
            };
            let (outcome, applied) = match result {
                Ok(outcome) => {
                    debug!(document = %identity, %outcome, "document reconciled");
                    let applied = !matches!(outcome, Outcome::Planned(_) | Outcome::SkippedExisting(_));
                    (outcome, applied)
                }
                Err(e) => {
                    self.report_failure(document, &identity, &e);
                    (Outcome::Failed(format!("{identity}: {e}")), false)
                }
            };
            for warning in &warnings {
                warn!(document = %identity, "{warning}");
                self.messenger
                    .notify(MessageLevel::Warning, &format!("{kind} {identity}: {warning}"));
            }
            report.documents.push(DocumentReport {
                identity,
                outcome,
                applied,
                warnings,
            });
        }

        info!(
            documents = report.documents.len(),
            failed = report.failures().count(),
            "pass finished"
        );
        Ok(report)
    }

    fn report_failure<D: Definition + Serialize>(&self, document: &D, identity: &str, e: &ReconcileError) {
        let payload = serde_json::to_string(document).unwrap_or_default();
        error!(
            document = %identity,
            %payload,
            errors = ?e.validation_errors(),
            "document failed: {e}"
        );
        self.messenger.notify(
            MessageLevel::Error,
            &format!("{} {identity} failed: {e}", D::KIND),
        );
    }

    /// Runs a store write, logging the rejected payload on failure.
    pub(crate) fn submit<T>(
        &self,
        document: &str,
        payload: Value,
        write: impl FnOnce(Value) -> StoreResult<T>,
    ) -> ReconcileResult<T> {
        let logged = payload.clone();
        write(payload).map_err(|e| {
            error!(document, payload = %logged, errors = ?e.validation_errors(), "store rejected payload: {e}");
            e.into()
        })
    }
}
