use crate::error::{ErrorKind, Result};
use crate::scan::{Candidate, ScanEntry};
use crate::scheme::IdentifierScheme;
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use std::path::Path;
use tokio::fs;

/// Streams a [`ScanEntry`] for every subdirectory of `root` that the scheme
/// does not exclude.
///
/// Entries come in directory listing order. Plain files in `root` and
/// excluded directories are skipped without being yielded. A directory whose
/// document is missing is yielded as [`ScanEntry::Malformed`].
///
/// The only error is failing to list `root` itself
/// ([`ErrorKind::InvalidRoot`]), after which the stream ends.
pub fn scan<'a>(root: &'a Path, scheme: &'a IdentifierScheme) -> impl Stream<Item = Result<ScanEntry>> + 'a {
    stream!({
        let invalid_root = || ErrorKind::InvalidRoot(root.to_path_buf());
        let mut listing = match fs::read_dir(root).await.or_raise(invalid_root) {
            Ok(listing) => listing,
            Err(e) => {
                yield Err(e);
                return;
            },
        };

        loop {
            let entry = match listing.next_entry().await.or_raise(invalid_root) {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            let entry_path = entry.path();
            // Follows symlinks, so a linked book directory still counts.
            if !fs::metadata(&entry_path).await.is_ok_and(|m| m.is_dir()) {
                tracing::debug!(path = %entry_path.display(), "Skipping catalog entry that is not a directory");
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    let name = raw.to_string_lossy().into_owned();
                    tracing::warn!(name, "Skipping catalog entry with a non UTF-8 name");
                    yield Ok(ScanEntry::Malformed { name, path: entry_path });
                    continue;
                },
            };
            if scheme.is_excluded(&name) {
                tracing::debug!(name, "Skipping excluded catalog entry");
                continue;
            }
            let path = match scheme.document_path(root, &name) {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(name, error = ?e, "Skipping catalog entry with an invalid name");
                    yield Ok(ScanEntry::Malformed { name, path: entry_path });
                    continue;
                },
            };
            if !fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
                tracing::warn!(name, path = %path.display(), "Catalog entry has no document; skipping");
                yield Ok(ScanEntry::Malformed { name, path });
                continue;
            }
            yield Ok(ScanEntry::Candidate(Candidate { id: name, path }));
        }
    })
}
