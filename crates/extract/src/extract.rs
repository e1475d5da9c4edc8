//! Main extraction logic for Project Gutenberg RDF/XML documents.
//!
//! Catalog documents are RDF/XML, but the fields needed here sit in a
//! predictable shape, so the document is parsed leniently and walked by
//! element name instead of being loaded into a triple store:
//!
//! ```text
//! rdf:RDF
//! └── pgterms:ebook
//!     ├── dcterms:title ............................ title
//!     ├── dcterms:creator
//!     │   └── pgterms:agent
//!     │       └── pgterms:name ..................... author
//!     └── dcterms:language
//!         └── rdf:Description
//!             └── rdf:value ........................ language
//! ```

use exn::OptionExt;
use scraper::{ElementRef, Html};
use tracing::instrument;

use crate::consts;
use crate::error::{ErrorKind, Result};
use crate::models::Metadata;

/// Parsed catalog document, ready for field lookups.
///
/// Accepts raw bytes instead of requiring valid UTF-8; invalid sequences are
/// replaced with U+FFFD before parsing.
pub struct Extractor {
    document: Html,
}

impl Extractor {
    pub fn new(rdf: impl AsRef<[u8]>) -> Self {
        let text = String::from_utf8_lossy(rdf.as_ref());
        Self {
            document: Html::parse_document(&text),
        }
    }

    /// Returns `true` if the document has an `rdf:RDF` root element.
    pub fn is_valid(&self) -> bool {
        self.root().is_some()
    }

    /// Extracts title, author and language.
    ///
    /// When a field occurs more than once (several creators, say) the last
    /// occurrence wins. Missing fields are `None`; only a document without an
    /// `rdf:RDF` root is rejected.
    #[instrument(level = "debug", skip(self))]
    pub fn metadata(&self) -> Result<Metadata> {
        let root = self.root().ok_or_raise(|| ErrorKind::InvalidDocument)?;
        Ok(Metadata {
            title: title(root),
            author: author(root),
            language: language(root),
        })
    }

    fn root(&self) -> Option<ElementRef<'_>> {
        named(self.document.root_element(), consts::RDF_ROOT).next()
    }
}

/// All elements (including `scope` itself) with the given parsed name, in
/// document order.
fn named<'a>(scope: ElementRef<'a>, name: &'static str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    scope.descendants().filter_map(ElementRef::wrap).filter(move |el| el.value().name() == name)
}

/// Last element named `inner` nested under any element named `outer`.
fn nested<'a>(scope: ElementRef<'a>, outer: &'static str, inner: &'static str) -> Option<ElementRef<'a>> {
    named(scope, outer).flat_map(move |el| named(el, inner)).last()
}

fn text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

#[instrument(level = "trace")]
pub(crate) fn title(root: ElementRef<'_>) -> Option<String> {
    named(root, consts::TITLE).last().map(text)
}

#[instrument(level = "trace")]
pub(crate) fn author(root: ElementRef<'_>) -> Option<String> {
    nested(root, consts::CREATOR, consts::AGENT_NAME).map(text)
}

#[instrument(level = "trace")]
pub(crate) fn language(root: ElementRef<'_>) -> Option<String> {
    nested(root, consts::LANGUAGE, consts::VALUE).map(|el| text(el).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SHAKESPEARE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rdf:RDF xml:base="http://www.gutenberg.org/"
  xmlns:dcterms="http://purl.org/dc/terms/"
  xmlns:pgterms="http://www.gutenberg.org/2009/pgterms/"
  xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <pgterms:ebook rdf:about="ebooks/100">
    <dcterms:type>
      <rdf:Description rdf:nodeID="N1">
        <rdf:value>Text</rdf:value>
      </rdf:Description>
    </dcterms:type>
    <dcterms:title>The Complete Works of William Shakespeare</dcterms:title>
    <dcterms:creator>
      <pgterms:agent rdf:about="2009/agents/65">
        <pgterms:birthdate rdf:datatype="http://www.w3.org/2001/XMLSchema#integer">1564</pgterms:birthdate>
        <pgterms:name>Shakespeare, William</pgterms:name>
      </pgterms:agent>
    </dcterms:creator>
    <dcterms:language>
      <rdf:Description rdf:nodeID="N2">
        <rdf:value rdf:datatype="http://purl.org/dc/terms/RFC4646">en</rdf:value>
      </rdf:Description>
    </dcterms:language>
  </pgterms:ebook>
</rdf:RDF>
"#;

    #[test]
    fn test_extract_all_fields() {
        let metadata = Extractor::new(SHAKESPEARE).metadata().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("The Complete Works of William Shakespeare"));
        assert_eq!(metadata.author.as_deref(), Some("Shakespeare, William"));
        assert_eq!(metadata.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_language_ignores_other_rdf_values() {
        // `dcterms:type` also carries an `rdf:value` and appears first.
        let metadata = Extractor::new(SHAKESPEARE).metadata().unwrap();
        assert_ne!(metadata.language.as_deref(), Some("Text"));
    }

    #[test]
    fn test_repeated_fields_keep_the_last() {
        let rdf = r#"<rdf:RDF><pgterms:ebook>
            <dcterms:title>Draft Title</dcterms:title>
            <dcterms:creator><pgterms:agent><pgterms:name>Engels, Friedrich</pgterms:name></pgterms:agent></dcterms:creator>
            <dcterms:creator><pgterms:agent><pgterms:name>Marx, Karl</pgterms:name></pgterms:agent></dcterms:creator>
            <dcterms:language><rdf:Description><rdf:value>de</rdf:value></rdf:Description></dcterms:language>
            <dcterms:language><rdf:Description><rdf:value>en</rdf:value></rdf:Description></dcterms:language>
            <dcterms:title>The Communist Manifesto</dcterms:title>
        </pgterms:ebook></rdf:RDF>"#;
        let metadata = Extractor::new(rdf).metadata().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("The Communist Manifesto"));
        assert_eq!(metadata.author.as_deref(), Some("Marx, Karl"));
        assert_eq!(metadata.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_title_keeps_embedded_newlines() {
        let rdf = "<rdf:RDF><pgterms:ebook><dcterms:title>Alice's Adventures\nin Wonderland</dcterms:title></pgterms:ebook></rdf:RDF>";
        let metadata = Extractor::new(rdf).metadata().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Alice's Adventures\nin Wonderland"));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let rdf = "<rdf:RDF><pgterms:ebook><dcterms:title>Anonymous</dcterms:title></pgterms:ebook></rdf:RDF>";
        let metadata = Extractor::new(rdf).metadata().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Anonymous"));
        assert_eq!(metadata.author, None);
        assert_eq!(metadata.language, None);
    }

    #[rstest]
    #[case("")]
    #[case("not a catalog document")]
    #[case("<html><body><h1>Hello</h1></body></html>")]
    fn test_invalid_document(#[case] input: &str) {
        let extractor = Extractor::new(input);
        assert!(!extractor.is_valid());
        let err = extractor.metadata().unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidDocument);
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let mut rdf = b"<rdf:RDF><dcterms:title>Caf".to_vec();
        rdf.push(0xE9);
        rdf.extend_from_slice(b"</dcterms:title></rdf:RDF>");
        let metadata = Extractor::new(rdf).metadata().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Caf\u{FFFD}"));
    }
}
