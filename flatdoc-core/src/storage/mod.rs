//! The storage collaborator abstraction: a per-collection table exposing
//! `insert`, `insert_multiple`, `search`, `get`, `update`, `remove`, `all`,
//! and `tables`. This is treated as an external dependency whose shape the
//! core only names; `Storage` is that shape made concrete, with two
//! backends selected at the call site rather than at compile time.

pub mod json_file;
pub mod memory;

use crate::document::{Document, DocumentId};
use crate::error::Result;
use crate::predicate::Predicate;
use serde_json::{Map, Value};

/// Record id: a storage-assigned integer handle for a persisted document,
/// distinct from the document's own `_id` (see GLOSSARY).
pub type RecordId = u64;

/// The storage collaborator interface consumed by the Write Coordinator
/// and Cursor. One implementor owns every collection ("table") within a
/// single database file; collection name is passed per call rather than
/// each table being its own trait object, since a flat-file backend must
/// serialize all of its collections together.
pub trait Storage: Send + Sync {
    fn insert(&mut self, collection: &str, doc: Document) -> Result<RecordId>;

    fn insert_multiple(&mut self, collection: &str, docs: Vec<Document>) -> Result<Vec<RecordId>>;

    fn search(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Document>>;

    fn get(&self, collection: &str, predicate: &Predicate) -> Result<Option<Document>>;

    /// Apply `patch` (a flat field-merge, i.e. an already-extracted `$set`
    /// body) to every document matching `predicate`. Returns the `_id`s of
    /// the documents modified.
    fn update(
        &mut self,
        collection: &str,
        patch: &Map<String, Value>,
        predicate: &Predicate,
    ) -> Result<Vec<DocumentId>>;

    /// Remove every document matching `predicate`. Returns the `_id`s of
    /// the documents removed.
    fn remove(&mut self, collection: &str, predicate: &Predicate) -> Result<Vec<DocumentId>>;

    fn all(&self, collection: &str) -> Result<Vec<Document>>;

    /// The set of collection ("table") names currently known to this
    /// storage collaborator.
    fn tables(&self) -> Vec<String>;

    /// Reset the monotonic record-id counter for `collection` back to zero:
    /// required after `delete_many({})` so that subsequently inserted
    /// documents resume ordering from the base state.
    fn reset_record_counter(&mut self, collection: &str) -> Result<()>;
}
