//! Store collaborator for schemasync.
//!
//! The reconciliation engine treats the live store as an opaque
//! create/read/search/update/delete service plus a bulk statement primitive
//! used for reference rewrites. This crate defines that interface and ships
//! two implementations:
//!
//! - [`MemoryStore`]: a mutex-guarded in-process store, used by tests and
//!   dry runs against a snapshot
//! - [`SqliteStore`]: records persisted as JSON in a single SQLite table
//!
//! # Atomicity
//!
//! [`Store::execute_batch`] runs a list of statements as one unit. Both
//! bundled stores make it all-or-nothing. The default implementation only
//! guarantees in-order execution, which keeps redirect-before-delete safe
//! for stores without transactions.

mod error;
mod filter;
mod memory;
mod sqlite;
mod statement;
pub mod validation;

pub use error::{StoreError, StoreResult};
pub use filter::{Filter, Lookup};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use statement::{redirect_resource, redirect_template, Effect, Statement};

use schemasync_model::Record;
use schemasync_types::{RecordId, RecordKind};
use serde_json::Value;

/// The live record store.
pub trait Store: Send + Sync {
    /// Returns the first record of `kind` matching `filter`.
    fn search_one(&self, kind: RecordKind, filter: &Filter) -> StoreResult<Lookup> {
        Ok(self.search(kind, filter)?.into_iter().next().into())
    }

    fn read(&self, kind: RecordKind, id: RecordId) -> StoreResult<Record>;

    /// Creates a record. Any `o:id` in `payload` is ignored.
    fn create(&self, kind: RecordKind, payload: Value) -> StoreResult<Record>;

    /// Updates a record. A partial update merges top-level keys into the
    /// stored data; a full update replaces it.
    fn update(&self, kind: RecordKind, id: RecordId, payload: Value, partial: bool) -> StoreResult<Record>;

    fn delete(&self, kind: RecordKind, id: RecordId) -> StoreResult<()>;

    /// Returns all records of `kind` matching `filter`, in id order.
    fn search(&self, kind: RecordKind, filter: &Filter) -> StoreResult<Vec<Record>>;

    /// Executes one bulk statement, returning the number of affected usages.
    fn execute(&self, statement: &Statement) -> StoreResult<usize>;

    /// Executes statements in order. Implementations with transactions
    /// override this to make the batch atomic.
    fn execute_batch(&self, statements: &[Statement]) -> StoreResult<Vec<usize>> {
        statements.iter().map(|s| self.execute(s)).collect()
    }
}

/// Builds the stored data for a record: `payload` (or the merge of
/// `payload` into `current` for partial updates) with `o:id` set.
pub(crate) fn compose_data(
    kind: RecordKind,
    id: RecordId,
    current: Option<&Value>,
    payload: Value,
) -> StoreResult<Value> {
    let Value::Object(incoming) = payload else {
        return Err(StoreError::ValidationFailed {
            kind,
            errors: vec!["payload must be a JSON object".to_string()],
        });
    };
    let mut data = match current {
        Some(Value::Object(existing)) => existing.clone(),
        _ => serde_json::Map::new(),
    };
    for (key, value) in incoming {
        data.insert(key, value);
    }
    data.insert(schemasync_model::keys::ID.to_string(), Value::from(id.get()));
    Ok(Value::Object(data))
}
