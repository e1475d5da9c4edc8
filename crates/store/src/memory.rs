//! In-memory catalog store.
//!
//! Useful for dry runs and tests. Rows live in a shared map behind a mutex,
//! so every handle cloned from the same store sees the same catalog.
//!
//! Inserts claim their id in the shared map immediately (the way a row lock
//! would), which means uncommitted rows are visible to other sessions. A
//! rollback, or dropping the session, releases them again.

use crate::error::Result;
use crate::{CatalogStore, InsertOutcome, Session, TableStatus};
use async_trait::async_trait;
use gutensync_extract::models::Record;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    table: bool,
    rows: BTreeMap<String, Record>,
}

/// Catalog store that keeps everything in process memory.
///
/// # Examples
///
/// ```
/// use gutensync_extract::models::Record;
/// use gutensync_store::{CatalogStore, InsertOutcome, MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MemoryStore::with_records([Record::new("11", "Alice's Adventures in Wonderland", "Carroll, Lewis", "en")]);
/// assert!(store.get("11").await.unwrap().is_some());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// A store whose table already exists and holds `records`.
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let rows = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            state: Arc::new(Mutex::new(State { table: true, rows })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }
}

// No invariant spans more than one statement under the lock, so a poisoned
// mutex still holds consistent data.
fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl CatalogStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn begin(&self) -> Result<Box<dyn Session>> {
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
        }))
    }

    async fn get(&self, id: &str) -> Result<Option<Record>> {
        Ok(self.lock().rows.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Record>> {
        Ok(self.lock().rows.values().cloned().collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.lock().rows.len() as u64)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.lock().rows.remove(id).is_some())
    }
}

pub(crate) struct MemorySession {
    state: Arc<Mutex<State>>,
    /// Ids claimed by this session and not yet committed.
    pending: Vec<String>,
}

impl MemorySession {
    fn release(&mut self) {
        let mut state = lock(&self.state);
        for id in self.pending.drain(..) {
            state.rows.remove(&id);
        }
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn ensure_table(&mut self) -> Result<TableStatus> {
        let mut state = lock(&self.state);
        Ok(match std::mem::replace(&mut state.table, true) {
            true => TableStatus::Existing,
            false => TableStatus::Created,
        })
    }

    async fn exists(&mut self, id: &str) -> Result<bool> {
        Ok(lock(&self.state).rows.contains_key(id))
    }

    async fn ids(&mut self) -> Result<HashSet<String>> {
        Ok(lock(&self.state).rows.keys().cloned().collect())
    }

    async fn insert(&mut self, record: &Record) -> InsertOutcome {
        let mut state = lock(&self.state);
        if !state.table {
            return InsertOutcome::Failed("no such table: books".to_string());
        }
        if state.rows.contains_key(&record.id) {
            return InsertOutcome::DuplicateSkipped;
        }
        state.rows.insert(record.id.clone(), record.clone());
        drop(state);
        self.pending.push(record.id.clone());
        InsertOutcome::Inserted
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.pending.clear();
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.release();
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.release();
    }
}
