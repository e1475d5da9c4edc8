//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document could not be read from disk.
    #[display("unreadable document: {}", _0.display())]
    Unreadable(#[error(not(source))] PathBuf),
    /// The document is not an RDF/XML catalog entry.
    #[display("invalid catalog document: missing rdf:RDF root")]
    InvalidDocument,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A document is either well-formed or it isn't; only I/O is worth another go.
        matches!(self, Self::Unreadable(_))
    }
}
