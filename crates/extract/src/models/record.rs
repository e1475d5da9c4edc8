use super::Metadata;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};

/// A catalog entry, the unit of persistence.
///
/// Absent fields are stored as empty strings, never as `NULL`.
///
/// # Identity
/// Two records are equal when both `id` and `title` match. The store only
/// enforces uniqueness on `id`, so two records can be unequal here while
/// still colliding on the primary key. Anything that deduplicates records in
/// memory has to pick one of those two notions explicitly.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    pub id: String,
    pub title: String,
    pub author: String,
    pub language: String,
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: normalize_title(&title.into()),
            author: author.into(),
            language: language.into(),
        }
    }

    /// Builds the record for `id` from extracted metadata.
    pub fn from_metadata(id: impl Into<String>, metadata: Metadata) -> Self {
        Self::new(
            id,
            metadata.title.unwrap_or_default(),
            metadata.author.unwrap_or_default(),
            metadata.language.unwrap_or_default(),
        )
    }
}

/// Removes every line feed and carriage return; nothing is put in their place.
pub(crate) fn normalize_title(title: &str) -> String {
    title.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.title == other.title
    }
}
impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.title.hash(state);
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}] {}", self.id, self.title)?;
        if !self.author.is_empty() {
            write!(f, " by {}", self.author)?;
        }
        if !self.language.is_empty() {
            write!(f, " ({})", self.language)?;
        }
        Ok(())
    }
}
