//! Discovery and synchronisation of a Project Gutenberg RDF catalog.
//!
//! # Architecture
//! - [`IdentifierScheme`]: maps a catalog directory entry to its record id
//!   and document path, and decides which entries are excluded.
//! - [`scan`]: lazily lists the candidates under a catalog root.
//! - [`MetadataExtractor`]: reads one document into
//!   [`Metadata`](gutensync_extract::models::Metadata).
//! - [`Synchronizer`]: loads every candidate the store does not already hold,
//!   in one transaction.
//! - [`read_catalog`] / [`read_record`]: the same extraction, without a store.

pub mod error;
mod extractor;
pub mod scan;
mod scheme;
mod snapshot;
mod sync;
#[cfg(test)]
mod testing;

pub use crate::extractor::{MetadataExtractor, RdfExtractor};
pub use crate::scan::scan;
pub use crate::scheme::{DEFAULT_EXCLUSION, IdentifierScheme};
pub use crate::snapshot::{CatalogSnapshot, read_catalog, read_record};
pub use crate::sync::{ExistenceStrategy, SyncResult, SyncState, Synchronizer, synchronize};
