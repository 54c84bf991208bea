use crate::error::{StoreError, StoreResult};
use crate::filter::Filter;
use crate::statement::Statement;
use crate::validation::validate;
use crate::{compose_data, Store};
use schemasync_model::Record;
use schemasync_types::{RecordId, RecordKind};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    records: HashMap<RecordKind, BTreeMap<RecordId, Value>>,
    last_id: HashMap<RecordKind, u64>,
}

impl MemoryState {
    fn records_of(&self, kind: RecordKind) -> Vec<Record> {
        self.records
            .get(&kind)
            .map(|table| {
                table
                    .iter()
                    .map(|(id, data)| Record {
                        id: *id,
                        kind,
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn others(&self, kind: RecordKind, id: Option<RecordId>) -> Vec<Record> {
        let mut records = self.records_of(kind);
        records.retain(|r| Some(r.id) != id);
        records
    }

    fn get(&self, kind: RecordKind, id: RecordId) -> StoreResult<&Value> {
        self.records
            .get(&kind)
            .and_then(|table| table.get(&id))
            .ok_or(StoreError::NotFound { kind, id })
    }

    fn next_id(&mut self, kind: RecordKind) -> StoreResult<RecordId> {
        let last = self.last_id.entry(kind).or_insert(0);
        *last += 1;
        RecordId::new(*last).ok_or_else(|| StoreError::Store(format!("{kind} id sequence exhausted")))
    }

    fn put(&mut self, kind: RecordKind, id: RecordId, data: Value) -> Record {
        self.records.entry(kind).or_default().insert(id, data.clone());
        Record { id, kind, data }
    }

    fn execute(&mut self, statement: &Statement) -> StoreResult<usize> {
        let effect = statement.plan(|kind| Ok(self.records_of(kind)))?;
        for record in effect.updated {
            self.put(record.kind, record.id, record.data);
        }
        if let Some((kind, id)) = effect.deleted {
            self.records
                .get_mut(&kind)
                .and_then(|table| table.remove(&id))
                .ok_or(StoreError::NotFound { kind, id })?;
        }
        debug!(%statement, affected = effect.affected, "executed statement");
        Ok(effect.affected)
    }
}

/// An in-process store.
///
/// Ids are assigned per kind starting at 1 and never reused. Statement
/// batches run against a snapshot that is restored if any statement fails.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of `kind`.
    pub fn count(&self, kind: RecordKind) -> StoreResult<usize> {
        Ok(self.lock()?.records.get(&kind).map_or(0, BTreeMap::len))
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| StoreError::Lock)
    }
}

impl Store for MemoryStore {
    fn read(&self, kind: RecordKind, id: RecordId) -> StoreResult<Record> {
        let state = self.lock()?;
        let data = state.get(kind, id)?.clone();
        Ok(Record { id, kind, data })
    }

    fn create(&self, kind: RecordKind, payload: Value) -> StoreResult<Record> {
        let mut state = self.lock()?;
        let mut payload = payload;
        if let Some(map) = payload.as_object_mut() {
            map.remove(schemasync_model::keys::ID);
        }
        validate(kind, &payload, &state.others(kind, None)).map_err(|errors| StoreError::ValidationFailed { kind, errors })?;
        let id = state.next_id(kind)?;
        let data = compose_data(kind, id, None, payload)?;
        debug!(%kind, %id, "created record");
        Ok(state.put(kind, id, data))
    }

    fn update(&self, kind: RecordKind, id: RecordId, payload: Value, partial: bool) -> StoreResult<Record> {
        let mut state = self.lock()?;
        let current = state.get(kind, id)?;
        let data = compose_data(kind, id, partial.then_some(current), payload)?;
        validate(kind, &data, &state.others(kind, Some(id))).map_err(|errors| StoreError::ValidationFailed { kind, errors })?;
        debug!(%kind, %id, partial, "updated record");
        Ok(state.put(kind, id, data))
    }

    fn delete(&self, kind: RecordKind, id: RecordId) -> StoreResult<()> {
        let mut state = self.lock()?;
        state
            .records
            .get_mut(&kind)
            .and_then(|table| table.remove(&id))
            .ok_or(StoreError::NotFound { kind, id })?;
        debug!(%kind, %id, "deleted record");
        Ok(())
    }

    fn search(&self, kind: RecordKind, filter: &Filter) -> StoreResult<Vec<Record>> {
        let mut records = self.lock()?.records_of(kind);
        records.retain(|r| filter.matches(r));
        Ok(records)
    }

    fn execute(&self, statement: &Statement) -> StoreResult<usize> {
        self.lock()?.execute(statement)
    }

    fn execute_batch(&self, statements: &[Statement]) -> StoreResult<Vec<usize>> {
        let mut state = self.lock()?;
        let snapshot = state.clone();
        let result: StoreResult<Vec<usize>> = statements.iter().map(|s| state.execute(s)).collect();
        if result.is_err() {
            *state = snapshot;
        }
        result
    }
}
