//! Reference rewriting for member replaces.

use crate::error::{ReconcileError, ReconcileResult};
use schemasync_storage::{Statement, Store, StoreError};
use schemasync_types::{MemberKind, RecordId};
use std::fmt;
use tracing::info;

/// What a rewrite redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteReport {
    pub kind: MemberKind,
    pub from: RecordId,
    pub to: RecordId,
    pub record_usages: usize,
    pub template_usages: usize,
}

impl RewriteReport {
    pub fn total(&self) -> usize {
        self.record_usages + self.template_usages
    }
}

impl fmt::Display for RewriteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "redirected {} record and {} template usages of {} #{} to #{}, deleted #{}",
            self.record_usages, self.template_usages, self.kind, self.from, self.to, self.from
        )
    }
}

/// Redirects every usage of one vocabulary member to another, then deletes
/// the old member, as a single atomic statement batch.
pub struct ReferenceRewriter<'a> {
    store: &'a dyn Store,
}

impl<'a> ReferenceRewriter<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Finding no usages is a valid outcome; the old member is still deleted.
    /// The target must exist.
    pub fn rewrite(&self, from: RecordId, to: RecordId, kind: MemberKind) -> ReconcileResult<RewriteReport> {
        if from == to {
            return Err(ReconcileError::InvalidOperation(format!(
                "cannot rewrite {kind} #{from} onto itself"
            )));
        }
        match self.store.read(kind.record_kind(), to) {
            Ok(_) => {}
            Err(StoreError::NotFound { .. }) => {
                return Err(ReconcileError::InvalidOperation(format!(
                    "cannot rewrite {kind} #{from} onto missing #{to}"
                )));
            }
            Err(e) => return Err(e.into()),
        }
        let statements = [
            Statement::RedirectRecordUsages { kind, from, to },
            Statement::RedirectTemplateUsages { kind, from, to },
            Statement::DeleteRecord {
                kind: kind.record_kind(),
                id: from,
            },
        ];
        let counts = self.store.execute_batch(&statements)?;
        let report = RewriteReport {
            kind,
            from,
            to,
            record_usages: counts.first().copied().unwrap_or(0),
            template_usages: counts.get(1).copied().unwrap_or(0),
        };
        info!(%kind, %from, %to, records = report.record_usages, templates = report.template_usages, "rewrote references");
        Ok(report)
    }
}
