//! Document storage backends.
//!
//! Every pipeline stage reaches storage through the [`DocumentStore`] trait,
//! which exposes the four primitives the derivation logic needs (scan, filtered
//! scan, insert, upsert by id) plus housekeeping.
//!
//! # Public Types
//!
//! - [`DocumentStore`]: Storage trait for a named collection
//! - [`MemoryCollection`]: In-process collection, used by tests and dry runs
//! - [`LogCollection`]: Append-only log collection persisted on disk

mod log;
mod memory;

#[cfg(test)]
mod memory_tests;

pub(crate) use log::LOG_FILE;
pub use log::LogCollection;
pub use memory::MemoryCollection;

use crate::document::{Body, Document, DocumentId};
use crate::error::Result;
use crate::filter::Filter;

/// A named collection of JSON documents.
///
/// Scans return documents in insertion order. Updating an existing document
/// keeps its position.
pub trait DocumentStore: Send + Sync {
    /// Collection name.
    fn name(&self) -> &str;

    /// Returns every document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn scan(&self) -> Result<Vec<Document>>;

    /// Returns the documents whose body matches `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn scan_matching(&self, filter: &Filter) -> Result<Vec<Document>> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|doc| filter.matches_body(&doc.body))
            .collect())
    }

    /// Inserts a new document and returns its freshly assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn insert(&self, body: Body) -> Result<DocumentId>;

    /// Merges `patch` into the top-level fields of document `id`, creating
    /// the document when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn upsert_by_key(&self, id: DocumentId, patch: Body) -> Result<()>;

    /// Number of documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn count(&self) -> Result<usize>;

    /// Removes every document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<()>;

    /// Returns the first document in insertion order, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn first(&self) -> Result<Option<Document>> {
        Ok(self.scan()?.into_iter().next())
    }
}
