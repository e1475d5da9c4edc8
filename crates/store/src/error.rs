//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The database could not be opened; check the configured location.
    #[display("cannot open database: {}", _0.display())]
    Connect(#[error(not(source))] PathBuf),
    #[display("database error")]
    Database,
    /// The `books` table could not be created and does not already exist.
    #[display("cannot prepare books table")]
    Schema,
    /// The transaction could not be made durable; nothing from it was kept.
    #[display("commit failed")]
    Commit,
    /// A row could not be converted into a record.
    #[display("invalid stored data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database | Self::Commit)
    }
}
