//! Bulk reference-rewrite statements.
//!
//! A vocabulary member replace is three statements: redirect record usages,
//! redirect template usages, delete the old member. Stores plan each
//! statement against the current records with [`Statement::plan`] and then
//! persist the resulting [`Effect`], so both stores share one definition of
//! what "a usage" is.

use crate::error::StoreResult;
use schemasync_model::{keys, normalize_reference, Record, RecordRef};
use schemasync_types::{MemberKind, RecordId, RecordKind};
use serde_json::Value;
use std::fmt;

/// A store-side bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    /// Point every resource (item set, item, media) usage of `from` at `to`.
    RedirectRecordUsages {
        kind: MemberKind,
        from: RecordId,
        to: RecordId,
    },
    /// Point every resource template usage of `from` at `to`.
    RedirectTemplateUsages {
        kind: MemberKind,
        from: RecordId,
        to: RecordId,
    },
    DeleteRecord { kind: RecordKind, id: RecordId },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RedirectRecordUsages { kind, from, to } => {
                write!(f, "redirect record {kind} usages {from} -> {to}")
            }
            Self::RedirectTemplateUsages { kind, from, to } => {
                write!(f, "redirect template {kind} usages {from} -> {to}")
            }
            Self::DeleteRecord { kind, id } => write!(f, "delete {kind} {id}"),
        }
    }
}

/// What a planned statement changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effect {
    /// Records whose data must be written back.
    pub updated: Vec<Record>,
    /// Record to delete.
    pub deleted: Option<(RecordKind, RecordId)>,
    /// Number of usages redirected, or 1 for a delete.
    pub affected: usize,
}

impl Statement {
    /// Record kinds this statement reads.
    pub fn reads(&self) -> &'static [RecordKind] {
        match self {
            Self::RedirectRecordUsages { .. } => &RecordKind::RESOURCES,
            Self::RedirectTemplateUsages { .. } => &[RecordKind::ResourceTemplate],
            Self::DeleteRecord { .. } => &[],
        }
    }

    /// Plans this statement against the records of the kinds it reads.
    pub fn plan(&self, mut records_of: impl FnMut(RecordKind) -> StoreResult<Vec<Record>>) -> StoreResult<Effect> {
        let mut effect = Effect::default();
        match *self {
            Self::DeleteRecord { kind, id } => {
                effect.deleted = Some((kind, id));
                effect.affected = 1;
            }
            Self::RedirectRecordUsages { kind, from, to } | Self::RedirectTemplateUsages { kind, from, to } => {
                let in_templates = matches!(self, Self::RedirectTemplateUsages { .. });
                for &record_kind in self.reads() {
                    for mut record in records_of(record_kind)? {
                        let count = if in_templates {
                            redirect_template(&mut record.data, kind, from, to)
                        } else {
                            redirect_resource(&mut record.data, kind, from, to)
                        };
                        if count > 0 {
                            effect.affected += count;
                            effect.updated.push(record);
                        }
                    }
                }
            }
        }
        Ok(effect)
    }
}

fn points_at(value: &Value, id: RecordId) -> bool {
    normalize_reference(value).is_some_and(|r| r.id == id)
}

fn redirect_key(data: &mut Value, key: &str, from: RecordId, to: RecordId) -> usize {
    match data.get_mut(key) {
        Some(slot) if points_at(slot, from) => {
            *slot = RecordRef::new(to).to_value();
            1
        }
        _ => 0,
    }
}

/// Redirects usages inside one resource record.
pub fn redirect_resource(data: &mut Value, kind: MemberKind, from: RecordId, to: RecordId) -> usize {
    match kind {
        MemberKind::Class => redirect_key(data, keys::RESOURCE_CLASS, from, to),
        MemberKind::Property => {
            let Some(Value::Array(values)) = data.get_mut(keys::VALUES) else {
                return 0;
            };
            values
                .iter_mut()
                .map(|value| redirect_key(value, keys::PROPERTY, from, to))
                .sum()
        }
    }
}

/// Redirects usages inside one resource template record.
///
/// A binding of `from` in a template that already binds `to` is removed
/// rather than redirected, and still counts as a usage.
pub fn redirect_template(data: &mut Value, kind: MemberKind, from: RecordId, to: RecordId) -> usize {
    match kind {
        MemberKind::Class => redirect_key(data, keys::RESOURCE_CLASS, from, to),
        MemberKind::Property => {
            let mut count = redirect_key(data, keys::TITLE_PROPERTY, from, to)
                + redirect_key(data, keys::DESCRIPTION_PROPERTY, from, to);
            let Some(Value::Array(bindings)) = data.get_mut(keys::TEMPLATE_PROPERTIES) else {
                return count;
            };
            let binds = |b: &Value, id| b.get(keys::PROPERTY).is_some_and(|p| points_at(p, id));
            let already_bound = bindings.iter().any(|b| binds(b, to));
            let before = bindings.len();
            if already_bound {
                bindings.retain(|b| !binds(b, from));
                count += before - bindings.len();
            } else {
                for binding in bindings.iter_mut() {
                    count += redirect_key(binding, keys::PROPERTY, from, to);
                }
            }
            count
        }
    }
}
