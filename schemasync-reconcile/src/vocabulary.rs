//! Vocabulary reconciliation: import, rename tracking, upgrade.

use crate::config::ExistingPolicy;
use crate::engine::{Applier, Checked, Reconciler};
use crate::error::{ImportError, ReconcileError, ReconcileResult};
use crate::importer::VocabularyDescriptor;
use crate::report::{Outcome, PlannedAction, Warning};
use crate::resolver::Resolver;
use schemasync_model::{keys, Definition, VocabularyDefinition, VocabularyMember, VocabularyRecord};
use schemasync_types::{MemberKind, RecordId, RecordKind};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// A rename whose target name was already taken.
struct Replacement {
    kind: MemberKind,
    from: VocabularyMember,
    to: VocabularyMember,
}

pub(crate) struct VocabularyApplier<'a> {
    reconciler: &'a Reconciler,
}

impl<'a> VocabularyApplier<'a> {
    pub(crate) fn new(reconciler: &'a Reconciler) -> Self {
        Self { reconciler }
    }

    fn conflict(document: &VocabularyDefinition, reason: String) -> ReconcileError {
        ReconcileError::IdentityConflict {
            kind: RecordKind::Vocabulary,
            document: document.namespace_uri.clone(),
            reason,
        }
    }

    fn import_error(document: &VocabularyDefinition, error: ImportError) -> ReconcileError {
        match error {
            ImportError::SourceUnavailable { location, reason } => ReconcileError::SourceUnavailable {
                document: document.namespace_uri.clone(),
                reason: format!("{location}: {reason}"),
            },
            other => other.into(),
        }
    }

    /// Renames members in rename-map order. Renames onto a taken name are
    /// returned as replacements instead.
    fn rename_members(
        &self,
        document: &VocabularyDefinition,
        vocabulary: &VocabularyRecord,
        warnings: &mut Vec<Warning>,
    ) -> ReconcileResult<Vec<Replacement>> {
        let store = self.reconciler.store();
        let resolver = Resolver::new(store);
        let mut replacements = Vec::new();

        for (kind, old, new) in document.rename_map.iter() {
            let source = resolver.member(kind, vocabulary.id, old)?;
            let target = resolver.member(kind, vocabulary.id, new)?;
            match (source, target) {
                (None, Some(_)) => debug!(%kind, old, new, "rename already applied"),
                (None, None) => debug!(%kind, old, new, "rename source not found, nothing to rename"),
                (Some(source), None) => {
                    let mut payload = Map::new();
                    payload.insert(keys::LOCAL_NAME.to_string(), Value::from(new));
                    self.reconciler.submit(&document.namespace_uri, Value::Object(payload), |p| {
                        store.update(kind.record_kind(), source.id, p, true)
                    })?;
                    info!(%kind, id = %source.id, old, new, "renamed member");
                    warnings.push(Warning::Renamed {
                        kind,
                        vocabulary: vocabulary.prefix.clone(),
                        from: old.to_string(),
                        to: new.to_string(),
                    });
                }
                (Some(source), Some(target)) => {
                    warnings.push(Warning::RewriteInconsistency {
                        kind,
                        vocabulary: vocabulary.prefix.clone(),
                        from: old.to_string(),
                        to: new.to_string(),
                    });
                    replacements.push(Replacement {
                        kind,
                        from: source,
                        to: target,
                    });
                }
            }
        }
        Ok(replacements)
    }

    /// Writes namespace, prefix, label and comment when they differ from
    /// the stored record. Other stored keys are kept.
    fn refresh_metadata(&self, document: &VocabularyDefinition, stored: &VocabularyRecord) -> ReconcileResult<()> {
        let comment = document.comment.clone().or_else(|| stored.comment.clone());
        if stored.prefix == document.prefix
            && stored.label.as_deref() == Some(document.label.as_str())
            && stored.comment == comment
        {
            return Ok(());
        }
        let store = self.reconciler.store();
        let record = store.read(RecordKind::Vocabulary, stored.id)?;
        let mut data: Map<String, Value> = record.data.as_object().cloned().unwrap_or_default();
        data.insert(keys::NAMESPACE_URI.to_string(), Value::from(document.namespace_uri.as_str()));
        data.insert(keys::PREFIX.to_string(), Value::from(document.prefix.as_str()));
        data.insert(keys::LABEL.to_string(), Value::from(document.label.as_str()));
        data.insert(keys::COMMENT.to_string(), comment.map_or(Value::Null, Value::from));
        self.reconciler.submit(&document.namespace_uri, Value::Object(data), |p| {
            store.update(RecordKind::Vocabulary, stored.id, p, false)
        })?;
        debug!(namespace = %document.namespace_uri, "refreshed vocabulary metadata");
        Ok(())
    }
}

impl Applier for VocabularyApplier<'_> {
    type Document = VocabularyDefinition;

    fn check(&self, documents: &[VocabularyDefinition]) -> ReconcileResult<Vec<Checked>> {
        let resolver = Resolver::new(self.reconciler.store());
        let policy = self.reconciler.existing_policy(RecordKind::Vocabulary);
        let mut checked = Vec::with_capacity(documents.len());
        let mut valid: Vec<&VocabularyDefinition> = Vec::new();

        for document in documents {
            if let Err(errors) = document.validate() {
                checked.push(Err(ReconcileError::ValidationFailed {
                    document: document.namespace_uri.clone(),
                    errors,
                }));
                continue;
            }

            for earlier in &valid {
                if earlier.prefix == document.prefix && earlier.namespace_uri != document.namespace_uri {
                    return Err(Self::conflict(
                        document,
                        format!("prefix {} is also claimed by {}", document.prefix, earlier.namespace_uri),
                    ));
                }
                if earlier.namespace_uri == document.namespace_uri && earlier.prefix != document.prefix {
                    return Err(Self::conflict(
                        document,
                        format!(
                            "another document gives this namespace the prefix {}, not {}",
                            earlier.prefix, document.prefix
                        ),
                    ));
                }
            }

            if let Some(owner) = resolver.vocabulary_by_prefix(&document.prefix)? {
                if owner.namespace_uri != document.namespace_uri {
                    return Err(Self::conflict(
                        document,
                        format!("prefix {} is taken by stored vocabulary {}", document.prefix, owner.namespace_uri),
                    ));
                }
            }

            let action = match resolver.vocabulary_by_namespace(&document.namespace_uri)? {
                None => PlannedAction::Create,
                Some(stored) if policy == ExistingPolicy::Skip => PlannedAction::Skip(stored.id),
                Some(stored) => PlannedAction::Update(stored.id),
            };
            valid.push(document);
            checked.push(Ok(action));
        }
        Ok(checked)
    }

    fn apply(&self, document: &VocabularyDefinition, warnings: &mut Vec<Warning>) -> ReconcileResult<Outcome> {
        let reconciler = self.reconciler;
        let importer = reconciler.importer();
        let resolver = Resolver::new(reconciler.store());
        let options = reconciler.config().import.overlaid_with(&document.import);

        let Some(stored) = resolver.vocabulary_by_namespace(&document.namespace_uri)? else {
            let id = importer
                .import(document.source_strategy, &VocabularyDescriptor::from(document), &options)
                .map_err(|e| Self::import_error(document, e))?;
            info!(namespace = %document.namespace_uri, %id, "imported vocabulary");
            return Ok(Outcome::Created(id));
        };
        if reconciler.existing_policy(RecordKind::Vocabulary) == ExistingPolicy::Skip {
            return Ok(Outcome::SkippedExisting(stored.id));
        }

        let replacements = self.rename_members(document, &stored, warnings)?;

        let diff = importer
            .get_diff(document.source_strategy, &document.source_location, &document.namespace_uri, &options)
            .map_err(|e| Self::import_error(document, e))?;
        if !diff.is_empty() {
            importer
                .update(stored.id, &diff)
                .map_err(|e| Self::import_error(document, e))?;
            info!(namespace = %document.namespace_uri, changes = diff.len(), "upgraded vocabulary members");
        }

        if reconciler.config().rewrite_references {
            let rewriter = reconciler.rewriter();
            for replacement in collapse_chains(replacements) {
                let report = rewriter.rewrite(replacement.from.id, replacement.to.id, replacement.kind)?;
                warnings.push(Warning::Replaced {
                    vocabulary: stored.prefix.clone(),
                    from: replacement.from.local_name,
                    to: replacement.to.local_name,
                    report,
                });
            }
        }

        self.refresh_metadata(document, &stored)?;
        Ok(Outcome::Updated(stored.id))
    }
}

/// Points every replacement at the end of its chain, so that `a -> b`
/// followed by `b -> c` redirects `a` to `c` rather than to the deleted `b`.
/// Replacements that lead back to their own source are dropped and both
/// members are kept.
fn collapse_chains(replacements: Vec<Replacement>) -> Vec<Replacement> {
    let targets: HashMap<(MemberKind, RecordId), VocabularyMember> = replacements
        .iter()
        .map(|r| ((r.kind, r.from.id), r.to.clone()))
        .collect();
    replacements
        .into_iter()
        .filter_map(|mut replacement| {
            let mut seen = HashSet::from([replacement.from.id]);
            while let Some(next) = targets.get(&(replacement.kind, replacement.to.id)) {
                if !seen.insert(replacement.to.id) {
                    break;
                }
                replacement.to = next.clone();
            }
            if replacement.to.id == replacement.from.id {
                debug!(kind = %replacement.kind, member = %replacement.from.local_name, "replacement cycle, keeping member");
                return None;
            }
            Some(replacement)
        })
        .collect()
}
