//! Custom vocab reconciliation.

use crate::config::ExistingPolicy;
use crate::engine::{Applier, Checked, Reconciler};
use crate::error::{ReconcileError, ReconcileResult};
use crate::report::{Outcome, PlannedAction, Warning};
use crate::resolver::Resolver;
use schemasync_merge::{build_update_payload, CustomVocabPayload};
use schemasync_model::{keys, CustomVocabDefinition, CustomVocabRecord, Definition, Record};
use schemasync_storage::{Filter, StoreError, StoreResult};
use schemasync_types::RecordKind;
use serde_json::Value;
use tracing::debug;

const KIND: RecordKind = RecordKind::CustomVocab;

pub(crate) struct CustomVocabApplier<'a> {
    reconciler: &'a Reconciler,
}

impl<'a> CustomVocabApplier<'a> {
    pub(crate) fn new(reconciler: &'a Reconciler) -> Self {
        Self { reconciler }
    }

    fn find(&self, label: &str) -> StoreResult<Option<Record>> {
        let lookup = self
            .reconciler
            .store()
            .search_one(KIND, &Filter::all().eq(keys::LABEL, label))?;
        Ok(lookup.found())
    }

    /// Drops an item set reference that does not name a stored item set.
    fn resolve_item_set(
        &self,
        document: &CustomVocabDefinition,
        warnings: &mut Vec<Warning>,
    ) -> StoreResult<CustomVocabDefinition> {
        let mut document = document.clone();
        if !document.declares_item_set() {
            return Ok(document);
        }
        let resolver = Resolver::new(self.reconciler.store());
        let exists = match document.item_set_ref() {
            Some(item_set) => resolver.record_exists(RecordKind::ItemSet, item_set.id)?,
            None => false,
        };
        if !exists {
            let reference = document.item_set.take().map(|v| v.to_string()).unwrap_or_default();
            warnings.push(Warning::UnresolvedReference {
                reference,
                context: format!("custom vocab {} item set", document.label),
            });
        }
        Ok(document)
    }
}

/// Languages must agree when both sides name one; item sets must agree
/// when both sides are item-set backed.
fn compatibility(existing: &CustomVocabRecord, document: &CustomVocabDefinition) -> Result<(), String> {
    let incoming_lang = document.lang.as_deref().map(str::trim).filter(|l| !l.is_empty());
    if let (Some(stored), Some(incoming)) = (existing.lang.as_deref(), incoming_lang) {
        if !stored.eq_ignore_ascii_case(incoming) {
            return Err(format!("language {incoming} does not match stored language {stored}"));
        }
    }
    if let (Some(stored), Some(incoming)) = (existing.item_set, document.item_set_ref()) {
        if stored != incoming {
            return Err(format!(
                "item set #{} does not match stored item set #{}",
                incoming.id, stored.id
            ));
        }
    }
    Ok(())
}

fn malformed(record: &Record) -> ReconcileError {
    StoreError::Store(format!("custom vocab #{} has no label", record.id)).into()
}

impl Applier for CustomVocabApplier<'_> {
    type Document = CustomVocabDefinition;

    fn check(&self, documents: &[CustomVocabDefinition]) -> ReconcileResult<Vec<Checked>> {
        let policy = self.reconciler.existing_policy(KIND);
        let mut checked = Vec::with_capacity(documents.len());
        for document in documents {
            if let Err(errors) = document.validate() {
                checked.push(Err(ReconcileError::ValidationFailed {
                    document: document.label.clone(),
                    errors,
                }));
                continue;
            }
            let action = match self.find(&document.label)? {
                None => PlannedAction::Create,
                Some(record) => {
                    let existing = CustomVocabRecord::from_record(&record).ok_or_else(|| malformed(&record))?;
                    compatibility(&existing, document).map_err(|reason| ReconcileError::IdentityConflict {
                        kind: KIND,
                        document: document.label.clone(),
                        reason,
                    })?;
                    if policy == ExistingPolicy::Skip {
                        PlannedAction::Skip(record.id)
                    } else {
                        PlannedAction::Update(record.id)
                    }
                }
            };
            checked.push(Ok(action));
        }
        Ok(checked)
    }

    fn apply(&self, document: &CustomVocabDefinition, warnings: &mut Vec<Warning>) -> ReconcileResult<Outcome> {
        let reconciler = self.reconciler;
        let store = reconciler.store();
        let default_encoding = reconciler.config().custom_vocab_encoding;
        let document = self.resolve_item_set(document, warnings)?;

        let Some(record) = self.find(&document.label)? else {
            let payload = CustomVocabPayload::from_definition(&document).to_value(default_encoding);
            let created = reconciler.submit(&document.label, payload, |p| store.create(KIND, p))?;
            return Ok(Outcome::Created(created.id));
        };
        if reconciler.existing_policy(KIND) == ExistingPolicy::Skip {
            return Ok(Outcome::SkippedExisting(record.id));
        }

        let existing = CustomVocabRecord::from_record(&record).ok_or_else(|| malformed(&record))?;
        let encoding = existing.encoding.unwrap_or(default_encoding);
        let update = build_update_payload(&existing, &document);
        debug!(custom_vocab = %document.label, branch = ?update.branch, ?encoding, "merged custom vocab");

        let mut data = record.data.as_object().cloned().unwrap_or_default();
        if let Value::Object(fields) = update.to_value(encoding) {
            data.extend(fields);
        }
        reconciler.submit(&document.label, Value::Object(data), |p| store.update(KIND, record.id, p, false))?;
        Ok(Outcome::Updated(record.id))
    }
}
