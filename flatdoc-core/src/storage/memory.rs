//! In-process, non-persistent `Storage` backend: a HashMap-backed stand-in
//! for the file backend. Used by the test suite and by callers who want an
//! ephemeral collection.

use super::{RecordId, Storage};
use crate::document::{Document, DocumentId};
use crate::error::Result;
use crate::predicate::Predicate;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Default)]
struct Table {
    docs: Vec<Document>,
    next_record_id: RecordId,
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: HashMap<String, Table>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    fn table_mut(&mut self, collection: &str) -> &mut Table {
        self.tables.entry(collection.to_string()).or_default()
    }
}

impl Storage for MemoryStorage {
    fn insert(&mut self, collection: &str, doc: Document) -> Result<RecordId> {
        let table = self.table_mut(collection);
        table.next_record_id += 1;
        let record_id = table.next_record_id;
        table.docs.push(doc);
        Ok(record_id)
    }

    fn insert_multiple(&mut self, collection: &str, docs: Vec<Document>) -> Result<Vec<RecordId>> {
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            ids.push(self.insert(collection, doc)?);
        }
        Ok(ids)
    }

    fn search(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Document>> {
        Ok(match self.tables.get(collection) {
            Some(table) => table.docs.iter().filter(|d| predicate.matches(d)).cloned().collect(),
            None => Vec::new(),
        })
    }

    fn get(&self, collection: &str, predicate: &Predicate) -> Result<Option<Document>> {
        Ok(self
            .tables
            .get(collection)
            .and_then(|table| table.docs.iter().find(|d| predicate.matches(d)).cloned()))
    }

    fn update(
        &mut self,
        collection: &str,
        patch: &Map<String, Value>,
        predicate: &Predicate,
    ) -> Result<Vec<DocumentId>> {
        let table = self.table_mut(collection);
        let mut updated = Vec::new();
        for doc in table.docs.iter_mut() {
            if predicate.matches(doc) {
                for (k, v) in patch {
                    doc.set(k.clone(), v.clone());
                }
                updated.push(doc.id.clone());
            }
        }
        Ok(updated)
    }

    fn remove(&mut self, collection: &str, predicate: &Predicate) -> Result<Vec<DocumentId>> {
        let table = self.table_mut(collection);
        let mut removed = Vec::new();
        table.docs.retain(|doc| {
            if predicate.matches(doc) {
                removed.push(doc.id.clone());
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    fn all(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self.tables.get(collection).map(|t| t.docs.clone()).unwrap_or_default())
    }

    fn tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    fn reset_record_counter(&mut self, collection: &str) -> Result<()> {
        self.table_mut(collection).next_record_id = 0;
        Ok(())
    }
}
