use gutensync_store::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a run decides whether a record is already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistenceStrategy {
    /// One primary-key query per candidate.
    #[default]
    Lookup,
    /// Load every stored id once at the start of the run.
    Preload,
}

/// Answers "is this id already stored?" for one run.
///
/// Uncertain answers are `false`: a lookup that fails is logged and the
/// candidate goes on to be inserted, where the store's primary key has the
/// final word.
pub(crate) enum ExistenceIndex {
    Lookup,
    Preloaded(HashSet<String>),
}

impl ExistenceIndex {
    pub(crate) async fn build(strategy: ExistenceStrategy, session: &mut dyn Session) -> Self {
        match strategy {
            ExistenceStrategy::Lookup => Self::Lookup,
            ExistenceStrategy::Preload => match session.ids().await {
                Ok(ids) => {
                    tracing::debug!(count = ids.len(), "Preloaded stored ids");
                    Self::Preloaded(ids)
                },
                Err(e) => {
                    tracing::error!(error = ?e, "Cannot preload stored ids; treating every candidate as new");
                    Self::Preloaded(HashSet::new())
                },
            },
        }
    }

    pub(crate) async fn exists(&self, session: &mut dyn Session, id: &str) -> bool {
        match self {
            Self::Preloaded(ids) => ids.contains(id),
            Self::Lookup => session.exists(id).await.unwrap_or_else(|e| {
                tracing::error!(id, error = ?e, "Existence lookup failed; treating record as absent");
                false
            }),
        }
    }

    /// Remember an id this run has just stored.
    pub(crate) fn insert(&mut self, id: &str) {
        if let Self::Preloaded(ids) = self {
            ids.insert(id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gutensync_extract::models::Record;
    use gutensync_store::error::{ErrorKind as StoreErrorKind, Result as StoreResult};
    use gutensync_store::{CatalogStore, InsertOutcome, MemoryStore, TableStatus};
    use rstest::rstest;

    /// A session whose reads always fail.
    struct BrokenSession;

    #[async_trait]
    impl Session for BrokenSession {
        async fn ensure_table(&mut self) -> StoreResult<TableStatus> {
            Ok(TableStatus::Existing)
        }
        async fn exists(&mut self, _id: &str) -> StoreResult<bool> {
            exn::bail!(StoreErrorKind::Database)
        }
        async fn ids(&mut self) -> StoreResult<HashSet<String>> {
            exn::bail!(StoreErrorKind::Database)
        }
        async fn insert(&mut self, _record: &Record) -> InsertOutcome {
            InsertOutcome::Inserted
        }
        async fn commit(self: Box<Self>) -> StoreResult<()> {
            Ok(())
        }
        async fn rollback(self: Box<Self>) -> StoreResult<()> {
            Ok(())
        }
    }

    #[rstest]
    #[case(ExistenceStrategy::Lookup)]
    #[case(ExistenceStrategy::Preload)]
    #[tokio::test]
    async fn test_exists(#[case] strategy: ExistenceStrategy) {
        let store = MemoryStore::with_records([Record::new("1", "One", "", "")]);
        let mut session = store.begin().await.unwrap();
        let index = ExistenceIndex::build(strategy, session.as_mut()).await;
        assert!(index.exists(session.as_mut(), "1").await);
        assert!(!index.exists(session.as_mut(), "2").await);
    }

    #[rstest]
    #[case(ExistenceStrategy::Lookup)]
    #[case(ExistenceStrategy::Preload)]
    #[tokio::test]
    async fn test_failures_report_absent(#[case] strategy: ExistenceStrategy) {
        let mut session = BrokenSession;
        let index = ExistenceIndex::build(strategy, &mut session).await;
        assert!(!index.exists(&mut session, "1").await);
    }

    #[tokio::test]
    async fn test_preloaded_index_learns_inserts() {
        let store = MemoryStore::with_records([]);
        let mut session = store.begin().await.unwrap();
        let mut index = ExistenceIndex::build(ExistenceStrategy::Preload, session.as_mut()).await;
        index.insert("9");
        assert!(index.exists(session.as_mut(), "9").await);
    }
}
