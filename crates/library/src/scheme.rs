use crate::error::{ErrorKind, Result};
use gutensync_extract::{DEFAULT_EXTENSION, DEFAULT_PREFIX};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Entries whose name contains this (in any case) are never synchronised.
pub const DEFAULT_EXCLUSION: &str = "delete";

/// Maps catalog directory entries to record ids and document paths.
///
/// A catalog root holds one directory per book, named after the book id, with
/// a single document inside named `<prefix><id><extension>`:
///
/// ```text
/// root/
/// ├── 100/pg100.rdf
/// └── 300/pg300.rdf
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierScheme {
    pub prefix: String,
    pub extension: String,
    pub exclusion: String,
}

impl Default for IdentifierScheme {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_EXTENSION, DEFAULT_EXCLUSION)
    }
}

impl IdentifierScheme {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>, exclusion: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
            exclusion: exclusion.into(),
        }
    }

    /// File name of the document describing `id`.
    pub fn document_name(&self, id: &str) -> String {
        format!("{}{id}{}", self.prefix, self.extension)
    }

    /// Expected path of the document for the directory entry `name`.
    ///
    /// ```
    /// use gutensync_library::IdentifierScheme;
    /// use std::path::Path;
    ///
    /// let path = IdentifierScheme::default().document_path(Path::new("/cache/epub"), "1342").unwrap();
    /// assert_eq!(path, Path::new("/cache/epub/1342/pg1342.rdf"));
    /// ```
    ///
    /// # Errors
    /// [`ErrorKind::InvalidName`] if `name` is blank or is not a single path
    /// component.
    pub fn document_path(&self, root: &Path, name: &str) -> Result<PathBuf> {
        let single_component = !name.contains(['/', '\\']) && name != "." && name != "..";
        if name.trim().is_empty() || !single_component {
            exn::bail!(ErrorKind::InvalidName(name.to_string()));
        }
        Ok(root.join(name).join(self.document_name(name)))
    }

    /// Whether the directory entry `name` contains the exclusion marker,
    /// ignoring case. An empty marker excludes nothing.
    pub fn is_excluded(&self, name: &str) -> bool {
        !self.exclusion.is_empty() && name.to_lowercase().contains(&self.exclusion.to_lowercase())
    }

    /// Recovers the record id from a document path (`pg123.rdf` → `123`).
    pub fn identify(&self, path: &Path) -> Option<String> {
        let file_name = path.file_name()?.to_str()?;
        let id = file_name.strip_prefix(&self.prefix)?.strip_suffix(&self.extension)?;
        (!id.is_empty()).then(|| id.to_string())
    }
}
