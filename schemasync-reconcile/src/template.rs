//! Resource template reconciliation.

use crate::config::ExistingPolicy;
use crate::engine::{Applier, Checked, Reconciler};
use crate::error::{ReconcileError, ReconcileResult};
use crate::report::{Outcome, PlannedAction, Warning};
use crate::resolver::Resolver;
use schemasync_merge::merge_template;
use schemasync_model::{keys, Definition, Record, ResourceTemplateDefinition};
use schemasync_storage::{Filter, StoreResult};
use schemasync_types::RecordKind;
use tracing::debug;

const KIND: RecordKind = RecordKind::ResourceTemplate;

pub(crate) struct TemplateApplier<'a> {
    reconciler: &'a Reconciler,
}

impl<'a> TemplateApplier<'a> {
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
}

impl Applier for TemplateApplier<'_> {
    type Document = ResourceTemplateDefinition;

    fn check(&self, documents: &[ResourceTemplateDefinition]) -> ReconcileResult<Vec<Checked>> {
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
                Some(record) if policy == ExistingPolicy::Skip => PlannedAction::Skip(record.id),
                Some(record) => PlannedAction::Update(record.id),
            };
            checked.push(Ok(action));
        }
        Ok(checked)
    }

    fn apply(&self, document: &ResourceTemplateDefinition, warnings: &mut Vec<Warning>) -> ReconcileResult<Outcome> {
        let reconciler = self.reconciler;
        let store = reconciler.store();
        let resolver = Resolver::new(store);
        let incoming = resolver.resolve_template(document, warnings)?;

        let Some(record) = self.find(&document.label)? else {
            let created = reconciler.submit(&document.label, incoming.to_payload(), |p| store.create(KIND, p))?;
            return Ok(Outcome::Created(created.id));
        };
        if reconciler.existing_policy(KIND) == ExistingPolicy::Skip {
            return Ok(Outcome::SkippedExisting(record.id));
        }

        let existing = resolver.hydrate_template(&ResourceTemplateDefinition::from_record(&record))?;
        let merged = merge_template(&existing, &incoming);
        if !merged.collapsed.is_empty() {
            debug!(template = %document.label, collapsed = merged.collapsed.len(), "collapsed duplicate bindings");
        }
        for binding in &merged.discarded {
            warnings.push(Warning::UnresolvedReference {
                reference: binding.property.describe(),
                context: format!("template {}", document.label),
            });
        }

        // Full update: fields the store owns but the payload omits would
        // otherwise be reset.
        reconciler.submit(&document.label, merged.template.to_payload(), |p| {
            store.update(KIND, record.id, p, false)
        })?;
        Ok(Outcome::Updated(record.id))
    }
}
