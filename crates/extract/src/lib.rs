//! Metadata extraction for Project Gutenberg catalog documents.
//!
//! Each book in the catalog is described by one RDF/XML document. This crate
//! pulls out the three scalar fields the catalog database cares about (title,
//! author, language) and defines the [`Record`](models::Record) that gets
//! persisted.

mod consts;
pub mod error;
mod extract;
pub mod models;

use tracing::instrument;

pub use crate::consts::{DEFAULT_EXTENSION, DEFAULT_PREFIX};
use crate::error::Result;
pub use crate::extract::Extractor;
use crate::models::Metadata;

/// Easy, top-level entrypoint for the extraction of [`Metadata`] from raw
/// RDF/XML bytes.
///
/// ```rust
/// use gutensync_extract::extract;
/// let rdf = r#"
///     <rdf:RDF>
///         <pgterms:ebook>
///             <dcterms:title>Moby Dick</dcterms:title>
///         </pgterms:ebook>
///     </rdf:RDF>
/// "#;
///
/// assert_eq!(extract(rdf).unwrap().title.as_deref(), Some("Moby Dick"));
/// ```
#[instrument(skip(rdf), fields(rdf_size = rdf.as_ref().len()))]
pub fn extract(rdf: impl AsRef<[u8]>) -> Result<Metadata> {
    Extractor::new(rdf).metadata()
}
