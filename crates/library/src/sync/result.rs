use derive_more::Display;
use serde::Serialize;
use std::fmt::{self, Formatter};

/// Where a synchronisation run is (or ended up).
///
/// Runs move `Init → TableReady → Streaming → Finalized` and end in either
/// `Committed` or `Aborted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    #[display("init")]
    Init,
    #[display("table ready")]
    TableReady,
    #[display("streaming")]
    Streaming,
    #[display("finalized")]
    Finalized,
    #[display("committed")]
    Committed,
    #[display("aborted")]
    Aborted,
}

impl SyncState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Aborted)
    }
}

/// Counts for one synchronisation run.
///
/// Every non-excluded catalog entry lands in exactly one of the three
/// counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Records newly written by this run.
    pub inserted: u64,
    /// Records that were already stored, including ids another writer stored
    /// between this run's existence check and its insert.
    pub skipped_existing: u64,
    /// Entries with no document, an unreadable document, or a rejected row.
    pub skipped_failed: u64,
    state: SyncState,
}

impl SyncResult {
    pub fn final_state(&self) -> SyncState {
        self.state
    }

    /// Total number of catalog entries the run looked at.
    pub fn processed(&self) -> u64 {
        self.inserted + self.skipped_existing + self.skipped_failed
    }

    pub(crate) fn transition(&mut self, state: SyncState) {
        tracing::debug!(from = %self.state, to = %state, "Synchronisation state change");
        self.state = state;
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} already stored, {} failed ({})",
            self.inserted, self.skipped_existing, self.skipped_failed, self.state,
        )
    }
}
