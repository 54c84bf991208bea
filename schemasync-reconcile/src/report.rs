//! Pass and per-document results.

use crate::rewriter::RewriteReport;
use schemasync_types::{MemberKind, PassId, RecordId, RecordKind};
use std::fmt;

/// Whether a pass may mutate the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Run the check phase only and report what would happen.
    CheckOnly,
    CheckAndApply,
}

/// What the apply phase would do with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedAction {
    Create,
    Update(RecordId),
    Skip(RecordId),
}

/// Terminal state of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(RecordId),
    Updated(RecordId),
    SkippedExisting(RecordId),
    /// The reason names the document and carries the collaborator's message.
    Failed(String),
    /// Check-only result.
    Planned(PlannedAction),
}

impl Outcome {
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::SkippedExisting(id) => Some(*id),
            Self::Planned(PlannedAction::Update(id) | PlannedAction::Skip(id)) => Some(*id),
            Self::Failed(_) | Self::Planned(PlannedAction::Create) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(id) => write!(f, "created #{id}"),
            Self::Updated(id) => write!(f, "updated #{id}"),
            Self::SkippedExisting(id) => write!(f, "skipped existing #{id}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Planned(PlannedAction::Create) => f.write_str("would create"),
            Self::Planned(PlannedAction::Update(id)) => write!(f, "would update #{id}"),
            Self::Planned(PlannedAction::Skip(id)) => write!(f, "would skip existing #{id}"),
        }
    }
}

/// Non-fatal findings, surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A reference in a document matched no stored record and was dropped.
    UnresolvedReference { reference: String, context: String },
    /// A member was renamed in place.
    Renamed {
        kind: MemberKind,
        vocabulary: String,
        from: String,
        to: String,
    },
    /// A rename target already exists, so the rename becomes a replace.
    RewriteInconsistency {
        kind: MemberKind,
        vocabulary: String,
        from: String,
        to: String,
    },
    /// References to one member were redirected to another and the old
    /// member deleted.
    Replaced {
        vocabulary: String,
        from: String,
        to: String,
        report: RewriteReport,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedReference { reference, context } => {
                write!(f, "unresolved reference {reference} in {context}, dropped")
            }
            Self::Renamed { kind, vocabulary, from, to } => {
                write!(f, "renamed {kind} {vocabulary}:{from} to {to}")
            }
            Self::RewriteInconsistency { kind, vocabulary, from, to } => write!(
                f,
                "cannot rename {kind} {vocabulary}:{from} to {to}: {to} already exists, replacing instead"
            ),
            Self::Replaced { vocabulary, from, to, report } => {
                write!(f, "replaced {vocabulary}:{from} with {vocabulary}:{to}: {report}")
            }
        }
    }
}

/// Result for one desired-state document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    /// The document's identity key.
    pub identity: String,
    pub outcome: Outcome,
    /// True when the store was written for this document.
    pub applied: bool,
    pub warnings: Vec<Warning>,
}

/// Result of one reconciliation pass over a batch of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub pass_id: PassId,
    pub kind: RecordKind,
    pub mode: Mode,
    pub documents: Vec<DocumentReport>,
}

impl PassReport {
    pub fn new(pass_id: PassId, kind: RecordKind, mode: Mode) -> Self {
        Self {
            pass_id,
            kind,
            mode,
            documents: Vec::new(),
        }
    }

    pub fn outcomes(&self) -> Vec<&Outcome> {
        self.documents.iter().map(|d| &d.outcome).collect()
    }

    pub fn document(&self, identity: &str) -> Option<&DocumentReport> {
        self.documents.iter().find(|d| d.identity == identity)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| d.outcome.is_failed())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.documents.iter().flat_map(|d| &d.warnings)
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}
