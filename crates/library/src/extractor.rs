use async_trait::async_trait;
use exn::ResultExt;
use gutensync_extract::error::{ErrorKind, Result};
use gutensync_extract::models::Metadata;
use std::path::Path;
use tracing::instrument;

/// Pulls the catalog fields out of one document on disk.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<Metadata>;
}

/// Reads Gutenberg RDF/XML documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RdfExtractor;

#[async_trait]
impl MetadataExtractor for RdfExtractor {
    #[instrument(level = "debug", skip(self), fields(path = %path.display()))]
    async fn extract(&self, path: &Path) -> Result<Metadata> {
        let bytes = tokio::fs::read(path).await.or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
        gutensync_extract::extract(bytes)
    }
}
