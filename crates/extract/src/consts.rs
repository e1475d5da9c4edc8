//! Element names as they appear after parsing.
//!
//! The parser lowercases tag names and keeps the namespace prefix as part of
//! the local name, so `<rdf:RDF>` becomes `rdf:rdf`.

pub(crate) const RDF_ROOT: &str = "rdf:rdf";
pub(crate) const TITLE: &str = "dcterms:title";
pub(crate) const CREATOR: &str = "dcterms:creator";
pub(crate) const AGENT_NAME: &str = "pgterms:name";
pub(crate) const LANGUAGE: &str = "dcterms:language";
pub(crate) const VALUE: &str = "rdf:value";

/// Default document file name prefix (`pg123.rdf`).
pub const DEFAULT_PREFIX: &str = "pg";
/// Default document file name extension (`pg123.rdf`).
pub const DEFAULT_EXTENSION: &str = ".rdf";
