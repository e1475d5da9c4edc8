/// Scalar fields pulled out of a single catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Book title, verbatim (may contain line breaks)
    pub title: Option<String>,
    /// Name of the last credited creator
    pub author: Option<String>,
    /// Language code, usually ISO 639-1 (e.g. "en")
    pub language: Option<String>,
}
