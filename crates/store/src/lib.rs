//! Persistence gateway for the Gutenberg catalog.
//!
//! The catalog lives in a single `books` table keyed by book id. This crate
//! hides which database holds that table behind [`CatalogStore`], and picks
//! the implementation from a closed set with [`open`].
//!
//! # Architecture
//! - [`CatalogStore`]: a handle to one catalog. Offers simple auto-committed
//!   data-access operations (get, list, add, delete) and [`begin`](CatalogStore::begin)
//!   for batched work.
//! - [`Session`]: one transaction, auto-commit disabled. Nothing written
//!   through a session is durable until [`commit`](Session::commit).
//!
//! Uniqueness of ids is the database's job. An insert that hits the primary
//! key reports [`InsertOutcome::DuplicateSkipped`] instead of an error, so
//! callers can treat it as the expected result of a lost race.

mod db;
pub mod error;
mod memory;
mod models;
mod sqlite;

pub use crate::db::Database;
pub use crate::memory::MemoryStore;
pub use crate::sqlite::SqliteStore;

use crate::error::Result;
use async_trait::async_trait;
use derive_more::Display;
use gutensync_extract::models::Record;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn CatalogStore>;

/// Which backend holds the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// SQLite database file, created if missing.
    Sqlite { path: PathBuf },
    /// Process-local, discarded on exit.
    Memory,
}

/// Open the configured catalog store.
pub async fn open(config: &StoreConfig) -> Result<StoreHandle> {
    Ok(match config {
        StoreConfig::Sqlite { path } => Arc::new(SqliteStore::connect(path).await?),
        StoreConfig::Memory => Arc::new(MemoryStore::default()),
    })
}

/// Result of preparing the `books` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TableStatus {
    #[display("created")]
    Created,
    #[display("existing")]
    Existing,
}

/// Result of inserting a single record.
///
/// Only whole-store problems (connection, schema, commit) are errors; a
/// single row that cannot be written is reported here so the caller can carry
/// on with the rest of its batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same id already exists.
    DuplicateSkipped,
    /// The row was rejected for any other reason.
    Failed(String),
}

/// One transaction against a catalog store.
///
/// A session is owned by exactly one caller and used sequentially. Dropping a
/// session without calling [`commit`](Self::commit) discards its writes.
#[async_trait]
pub trait Session: Send {
    /// Create the `books` table, treating "already exists" as success.
    async fn ensure_table(&mut self) -> Result<TableStatus>;

    /// Point lookup by primary key, as seen by this transaction.
    async fn exists(&mut self, id: &str) -> Result<bool>;

    /// Every stored id, as seen by this transaction.
    async fn ids(&mut self) -> Result<HashSet<String>>;

    /// Stage a record for insertion.
    async fn insert(&mut self, record: &Record) -> InsertOutcome;

    /// Make every staged insert durable.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every staged insert.
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// A catalog store backend.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Start a transaction with auto-commit disabled.
    async fn begin(&self) -> Result<Box<dyn Session>>;

    /// Fetch a single record.
    async fn get(&self, id: &str) -> Result<Option<Record>>;

    /// Fetch every record whose id is in `ids`; unknown ids are ignored.
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Record>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.get(id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Every stored record, ordered by id.
    async fn list(&self) -> Result<Vec<Record>>;

    /// Number of stored records.
    async fn count(&self) -> Result<u64>;

    /// Insert and commit a single record.
    async fn add(&self, record: &Record) -> Result<InsertOutcome> {
        let mut session = self.begin().await?;
        session.ensure_table().await?;
        let outcome = session.insert(record).await;
        match outcome {
            InsertOutcome::Inserted => session.commit().await?,
            _ => session.rollback().await?,
        }
        Ok(outcome)
    }

    /// Delete a record. Returns `false` if no record had that id.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Release the backend's resources.
    async fn close(&self) {}
}
