//! `Collection`: the caller-facing handle that composes the Predicate
//! Builder, Write Coordinator, and Cursor over one named table of a
//! storage collaborator.

use crate::cursor::{Cursor, SortSpec};
use crate::document::Document;
use crate::error::Result;
use crate::predicate::Predicate;
use crate::query::build_predicate;
use crate::storage::Storage;
use crate::write::{self, DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

/// A named table within a database, lazily materialized in the storage
/// collaborator on first use. Cheap to clone: every clone shares the same
/// backing storage handle.
#[derive(Clone)]
pub struct Collection {
    name: String,
    storage: Arc<RwLock<dyn Storage>>,
}

impl Collection {
    pub(crate) fn new(name: impl Into<String>, storage: Arc<RwLock<dyn Storage>>) -> Self {
        Collection { name: name.into(), storage }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert one document, assigning `_id` if absent and duplicate-checking
    /// unless `bypass_duplicate_check` is set.
    pub fn insert_one(&self, doc: Document, bypass_duplicate_check: bool) -> Result<InsertOneResult> {
        let mut storage = self.storage.write();
        write::insert_one(&mut *storage, &self.name, doc, bypass_duplicate_check)
    }

    /// Insert many documents as a single batch; the whole call fails before
    /// any mutation if any `_id` collides.
    pub fn insert_many(&self, docs: Vec<Document>, bypass_duplicate_check: bool) -> Result<InsertManyResult> {
        let mut storage = self.storage.write();
        write::insert_many(&mut *storage, &self.name, docs, bypass_duplicate_check)
    }

    /// Query, sort, and paginate. `filter` of `json!({})` or `Value::Null`
    /// matches every document.
    pub fn find(
        &self,
        filter: &Value,
        sort: Option<&SortSpec>,
        skip: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Cursor> {
        let predicate = build_predicate_or_match_all(filter)?;
        let storage = self.storage.read();
        let items = storage.search(&self.name, &predicate)?;
        Ok(Cursor::new(items, sort, skip, limit))
    }

    pub fn find_one(&self, filter: &Value) -> Result<Option<Document>> {
        let predicate = build_predicate_or_match_all(filter)?;
        let storage = self.storage.read();
        storage.get(&self.name, &predicate)
    }

    pub fn update_one(&self, filter: &Value, update: &Value) -> Result<UpdateResult> {
        let predicate = build_predicate_or_match_all(filter)?;
        let mut storage = self.storage.write();
        write::update_one(&mut *storage, &self.name, &predicate, update)
    }

    pub fn update_many(&self, filter: &Value, update: &Value) -> Result<UpdateResult> {
        let predicate = build_predicate_or_match_all(filter)?;
        let mut storage = self.storage.write();
        write::update_many(&mut *storage, &self.name, &predicate, update)
    }

    pub fn delete_one(&self, filter: &Value) -> Result<DeleteResult> {
        let predicate = build_predicate_or_match_all(filter)?;
        let mut storage = self.storage.write();
        write::delete_one(&mut *storage, &self.name, &predicate)
    }

    pub fn delete_many(&self, filter: &Value) -> Result<DeleteResult> {
        let is_match_all = is_empty_filter(filter);
        let predicate = build_predicate_or_match_all(filter)?;
        let mut storage = self.storage.write();
        write::delete_many(&mut *storage, &self.name, &predicate, is_match_all)
    }

    /// `remove(spec, multi)`: a single entry point over `delete_one`/
    /// `delete_many`.
    pub fn remove(&self, filter: &Value, multi: bool) -> Result<DeleteResult> {
        if multi {
            self.delete_many(filter)
        } else {
            self.delete_one(filter)
        }
    }

    /// The number of documents currently in this collection (an unpaginated
    /// count, distinct from `Cursor::count`, which reflects pagination).
    pub fn count_documents(&self, filter: &Value) -> Result<usize> {
        let predicate = build_predicate_or_match_all(filter)?;
        let storage = self.storage.read();
        Ok(storage.search(&self.name, &predicate)?.len())
    }

    /// The total number of documents currently in this collection.
    pub fn count(&self) -> Result<usize> {
        let storage = self.storage.read();
        Ok(storage.all(&self.name)?.len())
    }
}

fn is_empty_filter(filter: &Value) -> bool {
    matches!(filter, Value::Null) || filter.as_object().map(|o| o.is_empty()).unwrap_or(false)
}

fn build_predicate_or_match_all(filter: &Value) -> Result<Predicate> {
    if is_empty_filter(filter) {
        return Ok(Predicate::match_all());
    }
    build_predicate(filter)
}
