//! SQLite-backed catalog store.

use crate::db::Database;
use crate::error::{ErrorKind, Result};
use crate::models::BookRow;
use crate::{CatalogStore, InsertOutcome, Session, TableStatus};
use async_trait::async_trait;
use exn::ResultExt;
use gutensync_extract::models::Record;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, Transaction};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::OnceCell;

/// Create the `books` table unless it is already there.
///
/// The `CREATE TABLE` is always attempted; the "already exists" failure is
/// the normal path on every run after the first.
pub(crate) async fn create_table<'e>(executor: impl SqliteExecutor<'e>) -> Result<TableStatus> {
    match sqlx::query(include_str!("../queries/create_books_table.sql")).execute(executor).await {
        Ok(_) => Ok(TableStatus::Created),
        Err(sqlx::Error::Database(err)) if err.message().contains("already exists") => Ok(TableStatus::Existing),
        Err(err) => Err(err).or_raise(|| ErrorKind::Schema),
    }
}

async fn exists<'e>(executor: impl SqliteExecutor<'e>, id: &str) -> Result<bool> {
    let found: i64 = sqlx::query_scalar(include_str!("../queries/book_exists.sql"))
        .bind(id)
        .fetch_one(executor)
        .await
        .or_raise(|| ErrorKind::Database)?;
    Ok(found != 0)
}

async fn insert<'e>(executor: impl SqliteExecutor<'e>, record: &Record) -> InsertOutcome {
    let result = sqlx::query(include_str!("../queries/insert_book.sql"))
        .bind(&record.id)
        .bind(&record.author)
        .bind(&record.title)
        .bind(&record.language)
        .execute(executor)
        .await;
    match result {
        Ok(_) => InsertOutcome::Inserted,
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => InsertOutcome::DuplicateSkipped,
        Err(err) => InsertOutcome::Failed(err.to_string()),
    }
}

/// Catalog store backed by a SQLite database.
#[derive(Debug)]
pub struct SqliteStore {
    db: Database,
    table: OnceCell<TableStatus>,
}

impl From<Database> for SqliteStore {
    fn from(db: Database) -> Self {
        Self { db, table: OnceCell::new() }
    }
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Database::connect(path).await?.into())
    }

    /// Open a private in-memory database.
    pub async fn connect_in_memory() -> Result<Self> {
        Ok(Database::connect_in_memory().await?.into())
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The data-access operations don't run inside a synchronisation, so
    /// they make sure the table exists once per store handle.
    async fn table(&self) -> Result<TableStatus> {
        self.table.get_or_try_init(|| create_table(self.db.pool())).await.copied()
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    /// Starts an `IMMEDIATE` transaction. Holding the write lock from the
    /// start serialises concurrent runs: a later run waits, then sees every id
    /// the earlier one committed.
    async fn begin(&self) -> Result<Box<dyn Session>> {
        let tx = self.db.pool().begin_with("BEGIN IMMEDIATE").await.or_raise(|| ErrorKind::Database)?;
        Ok(Box::new(SqliteSession { tx }))
    }

    async fn get(&self, id: &str) -> Result<Option<Record>> {
        self.table().await?;
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(Record::from))
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.table().await?;
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id, author, title, language FROM books WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") ORDER BY id");
        let rows: Vec<BookRow> = builder
            .build_query_as()
            .fetch_all(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn list(&self) -> Result<Vec<Record>> {
        self.table().await?;
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_books.sql"))
            .fetch_all(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn count(&self) -> Result<u64> {
        self.table().await?;
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_books.sql"))
            .fetch_one(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("row count"))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.table().await?;
        let result = sqlx::query(include_str!("../queries/delete_book.sql"))
            .bind(id)
            .execute(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn close(&self) {
        self.db.close().await;
    }
}

/// A SQLite transaction.
///
/// If the session is dropped without committing, sqlx rolls the transaction
/// back when the connection returns to the pool.
pub(crate) struct SqliteSession {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl Session for SqliteSession {
    async fn ensure_table(&mut self) -> Result<TableStatus> {
        create_table(&mut *self.tx).await
    }

    async fn exists(&mut self, id: &str) -> Result<bool> {
        exists(&mut *self.tx, id).await
    }

    async fn ids(&mut self) -> Result<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar(include_str!("../queries/list_book_ids.sql"))
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(ids.into_iter().collect())
    }

    async fn insert(&mut self, record: &Record) -> InsertOutcome {
        insert(&mut *self.tx, record).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.or_raise(|| ErrorKind::Commit)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.or_raise(|| ErrorKind::Database)
    }
}
