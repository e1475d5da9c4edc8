//! Candidate discovery.
//!
//! [`scan`] walks the immediate subdirectories of a catalog root and turns
//! each one into a [`ScanEntry`]. Nothing is cached between calls: every scan
//! re-reads the directory, so a scan reflects the tree as it is right now.

mod stream;

pub use self::stream::scan;
use std::path::PathBuf;

/// A catalog entry that has a document and is ready for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub path: PathBuf,
}

/// One non-excluded directory entry of the catalog root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEntry {
    Candidate(Candidate),
    /// The entry has no usable document at its expected path. Already logged.
    Malformed { name: String, path: PathBuf },
}
