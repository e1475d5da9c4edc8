//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::sync::SyncResult;
use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// ### Configuration Errors
/// Nothing was written; fix the configuration and run again.
/// - [`ErrorKind::InvalidRoot`]
/// - [`ErrorKind::InvalidName`]
/// - [`ErrorKind::Store`]
///
/// ### Run Errors
/// - [`ErrorKind::Aborted`]: the run reached the end but could not commit.
/// - [`ErrorKind::NotFound`] and [`ErrorKind::Extract`] only come from
///   single-record reads, never from a synchronisation run.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The catalog root is missing, is not a directory, or cannot be listed.
    #[display("invalid catalog root: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    /// The directory entry name cannot be turned into a document path.
    #[display("invalid catalog entry name: {_0:?}")]
    InvalidName(#[error(not(source))] String),
    /// The catalog store could not be opened or prepared.
    #[display("catalog store unavailable")]
    Store,
    /// The run could not be committed and nothing from it was kept.
    #[display("synchronisation aborted after {_0}")]
    Aborted(#[error(not(source))] SyncResult),
    /// No catalog document exists for the requested id.
    #[display("no catalog document for id {_0}")]
    NotFound(#[error(not(source))] String),
    /// The catalog document exists but could not be extracted.
    #[display("cannot extract catalog document")]
    Extract,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store | Self::Aborted(_))
    }
}
