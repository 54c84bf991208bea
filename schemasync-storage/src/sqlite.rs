//! SQLite-backed store.
//!
//! Every record lives in one `records` table as a JSON document keyed by
//! `(kind, id)`. Ids come from a per-kind sequence so deleted ids are never
//! handed out again.

use crate::error::{StoreError, StoreResult};
use crate::filter::Filter;
use crate::statement::Statement;
use crate::validation::validate;
use crate::{compose_data, Store};
use rusqlite::{params, Connection, OptionalExtension};
use schemasync_model::{keys, Record};
use schemasync_types::{RecordId, RecordKind};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Persistent store backed by SQLite. Clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS records (
                kind TEXT NOT NULL,
                id INTEGER NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (kind, id)
            );

            CREATE TABLE IF NOT EXISTS sequences (
                kind TEXT PRIMARY KEY,
                last_id INTEGER NOT NULL
            );
            ",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Lock)
    }
}

// ── Row helpers ──────────────────────────────────────────────────

fn to_record(kind: RecordKind, id: i64, data: &str) -> StoreResult<Record> {
    let id = RecordId::try_from(id).map_err(|e| StoreError::Store(e.to_string()))?;
    Ok(Record {
        id,
        kind,
        data: serde_json::from_str(data)?,
    })
}

fn load_kind(conn: &Connection, kind: RecordKind) -> StoreResult<Vec<Record>> {
    let mut stmt = conn.prepare("SELECT id, data FROM records WHERE kind = ?1 ORDER BY id")?;
    let rows = stmt.query_map(params![kind.as_str()], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut records = Vec::new();
    for row in rows {
        let (id, data) = row?;
        records.push(to_record(kind, id, &data)?);
    }
    Ok(records)
}

fn load_one(conn: &Connection, kind: RecordKind, id: RecordId) -> StoreResult<Record> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM records WHERE kind = ?1 AND id = ?2",
            params![kind.as_str(), id.get() as i64],
            |row| row.get(0),
        )
        .optional()?;
    match data {
        Some(data) => to_record(kind, id.get() as i64, &data),
        None => Err(StoreError::NotFound { kind, id }),
    }
}

fn write(conn: &Connection, record: &Record) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO records (kind, id, data) VALUES (?1, ?2, ?3)",
        params![record.kind.as_str(), record.id.get() as i64, serde_json::to_string(&record.data)?],
    )?;
    Ok(())
}

fn remove(conn: &Connection, kind: RecordKind, id: RecordId) -> StoreResult<()> {
    let deleted = conn.execute(
        "DELETE FROM records WHERE kind = ?1 AND id = ?2",
        params![kind.as_str(), id.get() as i64],
    )?;
    if deleted == 0 {
        return Err(StoreError::NotFound { kind, id });
    }
    Ok(())
}

fn next_id(conn: &Connection, kind: RecordKind) -> StoreResult<RecordId> {
    conn.execute(
        "INSERT INTO sequences (kind, last_id) VALUES (?1, 1)
         ON CONFLICT(kind) DO UPDATE SET last_id = last_id + 1",
        params![kind.as_str()],
    )?;
    let last: i64 = conn.query_row(
        "SELECT last_id FROM sequences WHERE kind = ?1",
        params![kind.as_str()],
        |row| row.get(0),
    )?;
    RecordId::try_from(last).map_err(|e| StoreError::Store(e.to_string()))
}

fn others(conn: &Connection, kind: RecordKind, id: Option<RecordId>) -> StoreResult<Vec<Record>> {
    let mut records = load_kind(conn, kind)?;
    records.retain(|r| Some(r.id) != id);
    Ok(records)
}

fn execute_on(conn: &Connection, statement: &Statement) -> StoreResult<usize> {
    let effect = statement.plan(|kind| load_kind(conn, kind))?;
    for record in &effect.updated {
        write(conn, record)?;
    }
    if let Some((kind, id)) = effect.deleted {
        remove(conn, kind, id)?;
    }
    debug!(%statement, affected = effect.affected, "executed statement");
    Ok(effect.affected)
}

impl Store for SqliteStore {
    fn read(&self, kind: RecordKind, id: RecordId) -> StoreResult<Record> {
        load_one(&*self.lock()?, kind, id)
    }

    fn create(&self, kind: RecordKind, payload: Value) -> StoreResult<Record> {
        let mut payload = payload;
        if let Some(map) = payload.as_object_mut() {
            map.remove(keys::ID);
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        validate(kind, &payload, &others(&tx, kind, None)?)
            .map_err(|errors| StoreError::ValidationFailed { kind, errors })?;
        let id = next_id(&tx, kind)?;
        let record = Record {
            id,
            kind,
            data: compose_data(kind, id, None, payload)?,
        };
        write(&tx, &record)?;
        tx.commit()?;
        debug!(%kind, %id, "created record");
        Ok(record)
    }

    fn update(&self, kind: RecordKind, id: RecordId, payload: Value, partial: bool) -> StoreResult<Record> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let current = load_one(&tx, kind, id)?;
        let record = Record {
            id,
            kind,
            data: compose_data(kind, id, partial.then_some(&current.data), payload)?,
        };
        validate(kind, &record.data, &others(&tx, kind, Some(id))?)
            .map_err(|errors| StoreError::ValidationFailed { kind, errors })?;
        write(&tx, &record)?;
        tx.commit()?;
        debug!(%kind, %id, partial, "updated record");
        Ok(record)
    }

    fn delete(&self, kind: RecordKind, id: RecordId) -> StoreResult<()> {
        remove(&*self.lock()?, kind, id)?;
        debug!(%kind, %id, "deleted record");
        Ok(())
    }

    fn search(&self, kind: RecordKind, filter: &Filter) -> StoreResult<Vec<Record>> {
        let mut records = load_kind(&*self.lock()?, kind)?;
        records.retain(|r| filter.matches(r));
        Ok(records)
    }

    fn execute(&self, statement: &Statement) -> StoreResult<usize> {
        execute_on(&*self.lock()?, statement)
    }

    fn execute_batch(&self, statements: &[Statement]) -> StoreResult<Vec<usize>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let counts = statements
            .iter()
            .map(|s| execute_on(&tx, s))
            .collect::<StoreResult<Vec<_>>>()?;
        tx.commit()?;
        Ok(counts)
    }
}
