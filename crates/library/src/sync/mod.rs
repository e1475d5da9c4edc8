//! Catalog synchronisation.
//!
//! A run walks the catalog root, skips every id the store already holds,
//! extracts the rest, and writes them in a single transaction:
//!
//! 1. **Init**: check the root and open a session (auto-commit off).
//! 2. **Table ready**: create the `books` table unless it already exists.
//! 3. **Streaming**: one candidate at a time, in listing order.
//! 4. **Finalized**: commit once. Success ends in `Committed`; a failed
//!    commit ends in `Aborted` and is returned as an error.
//!
//! Per-entry problems (no document, a document that cannot be extracted, a
//! row the store rejects) are logged and counted, never returned. The
//! existence check and the insert are separate steps, so another writer can
//! store the same id in between; the store reports that as
//! [`InsertOutcome::DuplicateSkipped`] and the run carries on.

mod existence;
mod result;

pub use self::existence::ExistenceStrategy;
pub use self::result::{SyncResult, SyncState};

use self::existence::ExistenceIndex;
use crate::error::{ErrorKind, Result};
use crate::extractor::{MetadataExtractor, RdfExtractor};
use crate::scan::{Candidate, ScanEntry, scan};
use crate::scheme::IdentifierScheme;
use exn::ResultExt;
use futures::StreamExt;
use gutensync_extract::models::Record;
use gutensync_store::{InsertOutcome, Session, StoreHandle};
use std::path::Path;
use std::pin::pin;
use std::sync::Arc;
use tracing::instrument;

/// Synchronises a catalog root into `store` with the default scheme,
/// extractor, and existence strategy.
///
/// Calling it again on an unchanged root inserts nothing.
pub async fn synchronize(root: impl AsRef<Path>, store: &StoreHandle) -> Result<SyncResult> {
    Synchronizer::new(Arc::clone(store)).run(root.as_ref()).await
}

/// A configured synchronisation engine.
///
/// ```no_run
/// use gutensync_library::{ExistenceStrategy, Synchronizer};
/// use gutensync_store::{StoreConfig, open};
/// use std::path::Path;
///
/// # async fn run() {
/// let store = open(&StoreConfig::Memory).await.unwrap();
/// let result = Synchronizer::new(store)
///     .with_strategy(ExistenceStrategy::Preload)
///     .run(Path::new("/srv/gutenberg/cache/epub"))
///     .await
///     .unwrap();
/// println!("{result}");
/// # }
/// ```
#[derive(Clone)]
pub struct Synchronizer {
    store: StoreHandle,
    extractor: Arc<dyn MetadataExtractor>,
    scheme: IdentifierScheme,
    strategy: ExistenceStrategy,
}

impl Synchronizer {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            extractor: Arc::new(RdfExtractor),
            scheme: IdentifierScheme::default(),
            strategy: ExistenceStrategy::default(),
        }
    }

    pub fn with_scheme(mut self, scheme: IdentifierScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_strategy(mut self, strategy: ExistenceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_extractor(mut self, extractor: impl MetadataExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Runs one synchronisation pass over `root`.
    ///
    /// # Errors
    /// - [`ErrorKind::InvalidRoot`]: `root` is not a readable directory.
    ///   Nothing is written.
    /// - [`ErrorKind::Store`]: no session could be opened or the table could
    ///   not be prepared. Nothing is written.
    /// - [`ErrorKind::Aborted`]: the commit failed; the counts the run had
    ///   reached are attached and nothing from the run is kept.
    #[instrument(skip_all, fields(root = %root.display(), store = self.store.name()))]
    pub async fn run(&self, root: &Path) -> Result<SyncResult> {
        let mut result = SyncResult::default();
        let invalid_root = || ErrorKind::InvalidRoot(root.to_path_buf());
        if !tokio::fs::metadata(root).await.or_raise(invalid_root)?.is_dir() {
            exn::bail!(invalid_root());
        }
        let mut session = self.store.begin().await.or_raise(|| ErrorKind::Store)?;
        tracing::info!(strategy = ?self.strategy, "Synchronisation started");

        match session.ensure_table().await {
            Ok(status) => tracing::info!(%status, "Books table ready"),
            Err(e) => {
                rollback(session).await;
                return Err(e).or_raise(|| ErrorKind::Store);
            },
        }
        result.transition(SyncState::TableReady);

        let mut index = ExistenceIndex::build(self.strategy, session.as_mut()).await;
        result.transition(SyncState::Streaming);
        let mut entries = pin!(scan(root, &self.scheme));
        while let Some(entry) = entries.next().await {
            match entry {
                Ok(ScanEntry::Candidate(candidate)) => {
                    self.process(session.as_mut(), &mut index, candidate, &mut result).await;
                },
                Ok(ScanEntry::Malformed { .. }) => result.skipped_failed += 1,
                Err(e) => {
                    rollback(session).await;
                    return Err(e);
                },
            }
        }

        result.transition(SyncState::Finalized);
        if let Err(e) = session.commit().await {
            result.transition(SyncState::Aborted);
            tracing::error!(error = ?e, %result, "Commit failed; synchronisation aborted");
            return Err(e).or_raise(|| ErrorKind::Aborted(result.clone()));
        }
        result.transition(SyncState::Committed);
        tracing::info!(
            inserted = result.inserted,
            skipped_existing = result.skipped_existing,
            skipped_failed = result.skipped_failed,
            "Synchronisation committed",
        );
        Ok(result)
    }

    async fn process(
        &self,
        session: &mut dyn Session,
        index: &mut ExistenceIndex,
        candidate: Candidate,
        result: &mut SyncResult,
    ) {
        let Candidate { id, path } = candidate;
        if index.exists(session, &id).await {
            tracing::trace!(id, "Already stored");
            result.skipped_existing += 1;
            return;
        }
        let metadata = match self.extractor.extract(&path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(id, path = %path.display(), error = ?e, "Cannot extract catalog document; skipping");
                result.skipped_failed += 1;
                return;
            },
        };
        let record = Record::from_metadata(id, metadata);
        match session.insert(&record).await {
            InsertOutcome::Inserted => {
                index.insert(&record.id);
                result.inserted += 1;
            },
            InsertOutcome::DuplicateSkipped => {
                tracing::debug!(id = record.id, "Stored by another writer since the existence check");
                result.skipped_existing += 1;
            },
            InsertOutcome::Failed(reason) => {
                tracing::warn!(id = record.id, reason, "Store rejected record; skipping");
                result.skipped_failed += 1;
            },
        }
    }
}

async fn rollback(session: Box<dyn Session>) {
    if let Err(e) = session.rollback().await {
        tracing::warn!(error = ?e, "Rollback failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalog, write_document};
    use async_trait::async_trait;
    use gutensync_extract::error::Result as ExtractResult;
    use gutensync_extract::models::Metadata;
    use gutensync_store::{CatalogStore, MemoryStore, SqliteStore};
    use rstest::rstest;
    use std::ops::Deref;

    async fn store(backend: &str) -> StoreHandle {
        match backend {
            "memory" => Arc::new(MemoryStore::default()),
            "sqlite" => Arc::new(SqliteStore::connect_in_memory().await.unwrap()),
            other => panic!("unknown backend {other}"),
        }
    }

    fn counts(result: &SyncResult) -> (u64, u64, u64) {
        (result.inserted, result.skipped_existing, result.skipped_failed)
    }

    #[rstest]
    #[tokio::test]
    async fn test_scenario(#[values("memory", "sqlite")] backend: &str) {
        let dir = catalog(&[("100", Some("A")), ("DELETE_200", Some("B")), ("300", None)]);
        let store = store(backend).await;

        let first = synchronize(dir.path(), &store).await.unwrap();
        assert_eq!(counts(&first), (1, 0, 1));
        assert_eq!(first.final_state(), SyncState::Committed);
        let stored = store.get("100").await.unwrap().unwrap();
        assert_eq!((stored.title.as_str(), stored.author.as_str(), stored.language.as_str()), ("A", "X", "en"));
        assert!(store.get("DELETE_200").await.unwrap().is_none());

        let second = synchronize(dir.path(), &store).await.unwrap();
        assert_eq!(counts(&second), (0, 1, 1));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_idempotent(
        #[values("memory", "sqlite")] backend: &str,
        #[values(ExistenceStrategy::Lookup, ExistenceStrategy::Preload)] strategy: ExistenceStrategy,
    ) {
        let dir = catalog(&[("1", Some("One")), ("2", Some("Two")), ("3", Some("Three"))]);
        let sync = Synchronizer::new(store(backend).await).with_strategy(strategy);
        assert_eq!(counts(&sync.run(dir.path()).await.unwrap()), (3, 0, 0));
        assert_eq!(sync.store.count().await.unwrap(), 3);
        assert_eq!(counts(&sync.run(dir.path()).await.unwrap()), (0, 3, 0));
        assert_eq!(sync.store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_new_entries_are_picked_up() {
        let dir = catalog(&[("1", Some("One"))]);
        let store = store("memory").await;
        synchronize(dir.path(), &store).await.unwrap();
        write_document(dir.path(), "2", "Two", "Y", "fr");
        assert_eq!(counts(&synchronize(dir.path(), &store).await.unwrap()), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_exclusion_is_case_insensitive() {
        let dir = catalog(&[("DELETE", Some("A")), ("delete_1", Some("B")), ("2DeLeTe", Some("C")), ("4", Some("D"))]);
        let store = store("memory").await;
        let result = synchronize(dir.path(), &store).await.unwrap();
        assert_eq!(counts(&result), (1, 0, 0));
        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["4"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_title_is_normalized(#[values("memory", "sqlite")] backend: &str) {
        let dir = catalog(&[("5", Some("Foo\nBar\r"))]);
        let store = store(backend).await;
        synchronize(dir.path(), &store).await.unwrap();
        assert_eq!(store.get("5").await.unwrap().unwrap().title, "FooBar");
    }

    #[tokio::test]
    async fn test_bad_documents_do_not_abort() {
        let dir = catalog(&[("1", Some("One")), ("2", None), ("3", Some("Three"))]);
        std::fs::create_dir(dir.path().join("4")).unwrap();
        std::fs::write(dir.path().join("4").join("pg4.rdf"), "<html>not rdf</html>").unwrap();
        let store = store("sqlite").await;
        let result = synchronize(dir.path(), &store).await.unwrap();
        assert_eq!(counts(&result), (2, 0, 2));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rejected_rows_are_skipped() {
        let dir = catalog(&[("1", Some("One"))]);
        write_document(dir.path(), "2", "Two", "Y", "english");
        let store = store("sqlite").await;
        let result = synchronize(dir.path(), &store).await.unwrap();
        assert_eq!(counts(&result), (1, 0, 1));
        assert!(store.get("2").await.unwrap().is_none());
    }

    /// Simulates a second run storing the same id between this run's
    /// existence check and its insert.
    struct RacingExtractor {
        rival: StoreHandle,
    }

    #[async_trait]
    impl MetadataExtractor for RacingExtractor {
        async fn extract(&self, path: &Path) -> ExtractResult<Metadata> {
            let metadata = RdfExtractor.extract(path).await?;
            let id = IdentifierScheme::default().identify(path).unwrap();
            let record = Record::from_metadata(id, metadata.clone());
            assert_eq!(self.rival.add(&record).await.unwrap(), InsertOutcome::Inserted);
            Ok(metadata)
        }
    }

    #[tokio::test]
    async fn test_duplicate_race_is_tolerated() {
        let dir = catalog(&[("7", Some("Seven"))]);
        let store = store("memory").await;
        let sync = Synchronizer::new(Arc::clone(&store)).with_extractor(RacingExtractor { rival: Arc::clone(&store) });
        let result = sync.run(dir.path()).await.unwrap();
        assert_eq!(counts(&result), (0, 1, 0));
        assert_eq!(result.final_state(), SyncState::Committed);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_concurrent_runs_share_a_database(
        #[values(ExistenceStrategy::Lookup, ExistenceStrategy::Preload)] strategy: ExistenceStrategy,
    ) {
        let dir = catalog(&[("7", Some("Seven")), ("8", Some("Eight")), ("9", Some("Nine"))]);
        let db = tempfile::tempdir().unwrap();
        let path = db.path().join("catalog.sqlite");
        let first: StoreHandle = Arc::new(SqliteStore::connect(&path).await.unwrap());
        let second: StoreHandle = Arc::new(SqliteStore::connect(&path).await.unwrap());
        let a = Synchronizer::new(Arc::clone(&first)).with_strategy(strategy);
        let b = Synchronizer::new(Arc::clone(&second)).with_strategy(strategy);

        let (a, b) = tokio::join!(a.run(dir.path()), b.run(dir.path()));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!((a.skipped_failed, b.skipped_failed), (0, 0));
        assert_eq!(a.inserted + b.inserted, 3);
        assert_eq!(a.skipped_existing + b.skipped_existing, 3);
        assert_eq!(first.count().await.unwrap(), 3);
        first.close().await;
        second.close().await;
    }

    #[tokio::test]
    async fn test_commit_failure_aborts() {
        let dir = catalog(&[("1", Some("One")), ("2", Some("Two"))]);
        let sqlite = SqliteStore::connect_in_memory().await.unwrap();
        // Every row breaks a deferred foreign key, which only fails at commit.
        sqlx::raw_sql(
            "CREATE TABLE owners (id TEXT PRIMARY KEY);
             CREATE TABLE books (
                 id VARCHAR(10) NOT NULL PRIMARY KEY
                     REFERENCES owners (id) DEFERRABLE INITIALLY DEFERRED,
                 author VARCHAR(300),
                 title VARCHAR(1000),
                 language VARCHAR(3)
             );",
        )
        .execute(sqlite.database().pool())
        .await
        .unwrap();
        let store: StoreHandle = Arc::new(sqlite);

        let err = synchronize(dir.path(), &store).await.unwrap_err();
        let ErrorKind::Aborted(result) = err.deref() else {
            panic!("expected an aborted run, got {err:?}");
        };
        assert_eq!(counts(result), (2, 0, 0));
        assert_eq!(result.final_state(), SyncState::Aborted);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[rstest]
    #[case::missing(false)]
    #[case::file(true)]
    #[tokio::test]
    async fn test_invalid_root_fails_fast(#[case] create_file: bool) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        if create_file {
            std::fs::write(&root, "").unwrap();
        }
        let store = store("memory").await;
        let err = synchronize(&root, &store).await.unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::InvalidRoot(p) if *p == root));
        // Nothing ran, so not even the table exists.
        let mut session = store.begin().await.unwrap();
        assert_eq!(session.ensure_table().await.unwrap(), gutensync_store::TableStatus::Created);
    }
}
