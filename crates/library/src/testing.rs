//! Fixtures for building catalog trees on disk.

use std::path::Path;
use tempfile::TempDir;

pub(crate) fn rdf(title: &str, author: &str, language: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dcterms="http://purl.org/dc/terms/"
         xmlns:pgterms="http://www.gutenberg.org/2009/pgterms/">
  <pgterms:ebook rdf:about="ebooks/1">
    <dcterms:title>{title}</dcterms:title>
    <dcterms:creator>
      <pgterms:agent rdf:about="2009/agents/1">
        <pgterms:name>{author}</pgterms:name>
      </pgterms:agent>
    </dcterms:creator>
    <dcterms:language>
      <rdf:Description rdf:nodeID="N1">
        <rdf:value rdf:datatype="http://purl.org/dc/terms/RFC4646">{language}</rdf:value>
      </rdf:Description>
    </dcterms:language>
  </pgterms:ebook>
</rdf:RDF>
"#
    )
}

/// Writes `root/<id>/pg<id>.rdf`.
pub(crate) fn write_document(root: &Path, id: &str, title: &str, author: &str, language: &str) {
    let dir = root.join(id);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("pg{id}.rdf")), rdf(title, author, language)).unwrap();
}

/// A catalog root with one directory per entry. Entries with a title get a
/// document authored by "X" in "en"; entries without one get an empty directory.
pub(crate) fn catalog(entries: &[(&str, Option<&str>)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (id, title) in entries {
        match title {
            Some(title) => write_document(dir.path(), id, title, "X", "en"),
            None => std::fs::create_dir_all(dir.path().join(id)).unwrap(),
        }
    }
    dir
}
