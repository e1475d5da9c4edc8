use crate::error::{ErrorKind, Result};
use crate::extractor::MetadataExtractor;
use crate::scan::{Candidate, ScanEntry, scan};
use crate::scheme::IdentifierScheme;
use exn::ResultExt;
use futures::StreamExt;
use gutensync_extract::models::Record;
use std::collections::HashMap;
use std::path::Path;
use std::pin::pin;
use tracing::instrument;

/// Every readable record of a catalog root, keyed by id.
///
/// Built straight from the documents; the catalog store is not consulted.
pub type CatalogSnapshot = HashMap<String, Record>;

/// Extracts every candidate under `root` into a [`CatalogSnapshot`].
///
/// Entries without a usable document are logged and left out.
///
/// # Errors
/// [`ErrorKind::InvalidRoot`] if `root` cannot be listed.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn read_catalog(
    root: &Path,
    scheme: &IdentifierScheme,
    extractor: &dyn MetadataExtractor,
) -> Result<CatalogSnapshot> {
    let mut snapshot = CatalogSnapshot::new();
    let mut entries = pin!(scan(root, scheme));
    while let Some(entry) = entries.next().await {
        let Candidate { id, path } = match entry? {
            ScanEntry::Candidate(candidate) => candidate,
            ScanEntry::Malformed { .. } => continue,
        };
        match extractor.extract(&path).await {
            Ok(metadata) => {
                snapshot.insert(id.clone(), Record::from_metadata(id, metadata));
            },
            Err(e) => tracing::warn!(id, error = ?e, "Cannot extract catalog document; leaving it out"),
        }
    }
    tracing::debug!(records = snapshot.len(), "Catalog read");
    Ok(snapshot)
}

/// Extracts the single record `id` from its document under `root`.
///
/// # Errors
/// - [`ErrorKind::InvalidName`] if `id` cannot name a catalog entry.
/// - [`ErrorKind::NotFound`] if there is no document for `id`.
/// - [`ErrorKind::Extract`] if the document cannot be read or parsed.
pub async fn read_record(
    root: &Path,
    scheme: &IdentifierScheme,
    extractor: &dyn MetadataExtractor,
    id: &str,
) -> Result<Record> {
    let path = scheme.document_path(root, id)?;
    if !tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
        exn::bail!(ErrorKind::NotFound(id.to_string()));
    }
    let metadata = extractor.extract(&path).await.or_raise(|| ErrorKind::Extract)?;
    Ok(Record::from_metadata(id, metadata))
}
