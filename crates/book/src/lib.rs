//! Standing-order ebook wire/boundary support.
//!
//! This crate is responsible for translating between the CMS-exported book
//! JSON and the in-memory content schema consumed by the `sor-core` engine.
//!
//! Engine behaviour (flattening, search, decision evaluation) lives in
//! `sor-core`. This crate handles the data contract only: the chapter
//! hierarchy, the closed content-item union, and the normalisation pass that
//! collapses the two wire representations of decision content into one
//! canonical field before anything downstream sees the tree.
//!
//! The content tree is externally authored and not validated at load time, so
//! deserialisation is tolerant throughout: missing arrays become empty, and
//! `null` entries inside chapter/page sequences are dropped rather than
//! rejected.

pub mod decision;
pub mod schema;

pub use decision::{Case, Decision, DecisionNode};
pub use schema::{
    Book, Chapter, ContentItem, ContentKind, ListItem, NestedContent, NestedListItem, Page,
    SubChapter, SubSubChapter, TableCell, TableCellItem,
};

use thiserror::Error;

/// Errors returned by the `sor-book` boundary crate.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("invalid book JSON at `{path}`: {source}")]
    InvalidJson {
        path: String,
        source: serde_json::Error,
    },

    #[error("failed to serialise book: {0}")]
    Serialisation(serde_json::Error),
}

/// Read a `Book` from its CMS JSON export.
///
/// Deserialisation reports the exact path of the first offending value, then
/// the decision-normalisation pass runs so that every chapter-level node
/// carries at most one canonical [`Decision`] (see [`decision`] module docs
/// for the precedence rule).
///
/// # Errors
///
/// Returns [`BookError::InvalidJson`] when the input is not structurally
/// valid book JSON. Absent optional fields are not an error.
pub fn read_book_json(input: &str) -> Result<Book, BookError> {
    let deserializer = &mut serde_json::Deserializer::from_str(input);
    let mut book: Book =
        serde_path_to_error::deserialize(deserializer).map_err(|e| BookError::InvalidJson {
            path: e.path().to_string(),
            source: e.into_inner(),
        })?;
    book.normalise_decisions();
    Ok(book)
}

/// Write a `Book` back to pretty-printed JSON.
pub fn write_book_json(book: &Book) -> Result<String, BookError> {
    serde_json::to_string_pretty(book).map_err(BookError::Serialisation)
}
