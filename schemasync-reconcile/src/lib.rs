//! Declarative schema reconciliation for schemasync.
//!
//! Takes desired-state documents for vocabularies, resource templates and
//! custom vocabs and reconciles them against a live store with an
//! idempotent create-or-update that never drops existing data implicitly.
//!
//! # Architecture
//!
//! ## Collaborators
//!
//! - **Store** ([`schemasync_storage::Store`]): record CRUD, search and bulk
//!   rewrite statements
//! - **OntologyImporter**: imports vocabulary sources and upgrades members
//! - **Messenger**: write-only operator notifications
//!
//! All three are injected into [`Reconciler::new`].
//!
//! ## Pass Lifecycle
//!
//! 1. **Check**: resolve each document's identity; an identity conflict
//!    aborts the batch before anything is written
//! 2. **Apply**: documents in order; create when absent, merge and submit a
//!    full update when present
//! 3. **Rename**: vocabulary updates rename members in place, or replace
//!    them through the [`ReferenceRewriter`] when the new name is taken
//!
//! A failure while applying one document is recorded as
//! [`Outcome::Failed`] and the pass continues with the next one.
//!
//! # Example
//!
//! ```
//! use schemasync_model::{CustomVocabDefinition, ImportOptions, SourceStrategy};
//! use schemasync_reconcile::{
//!     ImportError, ImportResult, Mode, OntologyDiff, OntologyImporter, Outcome,
//!     ReconcileConfig, Reconciler, TracingMessenger, VocabularyDescriptor,
//! };
//! use schemasync_storage::MemoryStore;
//! use schemasync_types::RecordId;
//! use std::sync::Arc;
//!
//! struct Offline;
//!
//! impl OntologyImporter for Offline {
//!     fn import(&self, _: SourceStrategy, d: &VocabularyDescriptor, _: &ImportOptions) -> ImportResult<RecordId> {
//!         Err(ImportError::SourceUnavailable {
//!             location: d.source_location.clone(),
//!             reason: "offline".into(),
//!         })
//!     }
//!
//!     fn get_diff(&self, _: SourceStrategy, _: &str, _: &str, _: &ImportOptions) -> ImportResult<OntologyDiff> {
//!         Ok(OntologyDiff::default())
//!     }
//!
//!     fn update(&self, _: RecordId, _: &OntologyDiff) -> ImportResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! let reconciler = Reconciler::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(Offline),
//!     Arc::new(TracingMessenger),
//!     ReconcileConfig::default(),
//! );
//! let colors: CustomVocabDefinition =
//!     serde_json::from_value(serde_json::json!({"label": "Colors", "terms": ["red", "blue"]})).unwrap();
//!
//! let report = reconciler.reconcile_custom_vocabs(&[colors], Mode::CheckAndApply).unwrap();
//! assert!(matches!(report.documents[0].outcome, Outcome::Created(_)));
//! ```

mod config;
mod custom_vocab;
mod engine;
mod error;
mod importer;
mod messenger;
mod report;
mod resolver;
mod rewriter;
mod template;
mod vocabulary;

pub use config::{ExistingPolicy, ReconcileConfig};
pub use engine::{Batch, Reconciler};
pub use error::{ImportError, ImportResult, ReconcileError, ReconcileResult};
pub use importer::{ChangeKind, MemberChange, OntologyDiff, OntologyImporter, VocabularyDescriptor};
pub use messenger::{MessageLevel, Messenger, TracingMessenger};
pub use report::{DocumentReport, Mode, Outcome, PassReport, PlannedAction, Warning};
pub use resolver::Resolver;
pub use rewriter::{ReferenceRewriter, RewriteReport};
