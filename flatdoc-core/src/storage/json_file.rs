//! File-backed `Storage` implementor: one JSON file per database, holding
//! every collection as a top-level key mapping to its ordered document
//! list. A flat document store has no durability story beyond "write the
//! whole file", so every mutation serializes the full in-memory image and
//! replaces the file on disk. Closing the client is a no-op because there
//! is no buffered state left to flush.

use crate::document::{Document, DocumentId};
use crate::error::Result;
use crate::predicate::Predicate;
use crate::{log_debug, log_warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::RecordId;

#[derive(Default, Serialize, Deserialize)]
struct CollectionImage {
    #[serde(default)]
    next_record_id: RecordId,
    #[serde(default)]
    docs: Vec<Document>,
}

#[derive(Default, Serialize, Deserialize)]
struct FileImage {
    #[serde(flatten)]
    collections: HashMap<String, CollectionImage>,
}

/// A single flat JSON file coordinating every collection of one database.
pub struct JsonFileStorage {
    path: PathBuf,
    image: FileImage,
}

impl JsonFileStorage {
    /// Open (or create) the file at `path`. A missing file is treated as an
    /// empty database rather than an error, matching lazily-materialized
    /// database semantics.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let image = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                FileImage::default()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            FileImage::default()
        };
        Ok(JsonFileStorage { path, image })
    }

    fn flush(&self) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.image)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, raw)?;
        log_debug!("flushed {} collection(s) to {}", self.image.collections.len(), self.path.display());
        Ok(())
    }

    fn collection_mut(&mut self, collection: &str) -> &mut CollectionImage {
        self.image.collections.entry(collection.to_string()).or_default()
    }
}

impl super::Storage for JsonFileStorage {
    fn insert(&mut self, collection: &str, doc: Document) -> Result<RecordId> {
        let table = self.collection_mut(collection);
        table.next_record_id += 1;
        let record_id = table.next_record_id;
        table.docs.push(doc);
        self.flush()?;
        Ok(record_id)
    }

    fn insert_multiple(&mut self, collection: &str, docs: Vec<Document>) -> Result<Vec<RecordId>> {
        let table = self.collection_mut(collection);
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            table.next_record_id += 1;
            ids.push(table.next_record_id);
            table.docs.push(doc);
        }
        self.flush()?;
        Ok(ids)
    }

    fn search(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Document>> {
        Ok(match self.image.collections.get(collection) {
            Some(table) => table.docs.iter().filter(|d| predicate.matches(d)).cloned().collect(),
            None => Vec::new(),
        })
    }

    fn get(&self, collection: &str, predicate: &Predicate) -> Result<Option<Document>> {
        Ok(self
            .image
            .collections
            .get(collection)
            .and_then(|table| table.docs.iter().find(|d| predicate.matches(d)).cloned()))
    }

    fn update(
        &mut self,
        collection: &str,
        patch: &Map<String, Value>,
        predicate: &Predicate,
    ) -> Result<Vec<DocumentId>> {
        let table = self.collection_mut(collection);
        let mut updated = Vec::new();
        for doc in table.docs.iter_mut() {
            if predicate.matches(doc) {
                for (k, v) in patch {
                    doc.set(k.clone(), v.clone());
                }
                updated.push(doc.id.clone());
            }
        }
        if !updated.is_empty() {
            self.flush()?;
        }
        Ok(updated)
    }

    fn remove(&mut self, collection: &str, predicate: &Predicate) -> Result<Vec<DocumentId>> {
        let table = self.collection_mut(collection);
        let mut removed = Vec::new();
        table.docs.retain(|doc| {
            if predicate.matches(doc) {
                removed.push(doc.id.clone());
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            self.flush()?;
        } else {
            log_warn!("remove on '{}' matched no documents", collection);
        }
        Ok(removed)
    }

    fn all(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self
            .image
            .collections
            .get(collection)
            .map(|t| t.docs.clone())
            .unwrap_or_default())
    }

    fn tables(&self) -> Vec<String> {
        self.image.collections.keys().cloned().collect()
    }

    fn reset_record_counter(&mut self, collection: &str) -> Result<()> {
        self.collection_mut(collection).next_record_id = 0;
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::super::Storage;
    use super::*;
    use crate::id::generate_id;
    use serde_json::json;
    use tempfile::tempdir;

    fn doc(fields: Value) -> Document {
        let mut map = HashMap::new();
        for (k, v) in fields.as_object().unwrap() {
            map.insert(k.clone(), v.clone());
        }
        Document::new(generate_id(), map)
    }

    #[test]
    fn insert_persists_and_reopen_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        {
            let mut storage = JsonFileStorage::open(&path).unwrap();
            storage.insert("users", doc(json!({"name": "Alice"}))).unwrap();
        }

        let storage = JsonFileStorage::open(&path).unwrap();
        let all = storage.all("users").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("name").unwrap(), &json!("Alice"));
    }

    #[test]
    fn opening_missing_file_is_an_empty_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let storage = JsonFileStorage::open(&path).unwrap();
        assert!(storage.tables().is_empty());
    }

    #[test]
    fn reset_record_counter_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        {
            let mut storage = JsonFileStorage::open(&path).unwrap();
            storage.insert("users", doc(json!({}))).unwrap();
            storage.reset_record_counter("users").unwrap();
        }

        let mut storage = JsonFileStorage::open(&path).unwrap();
        let id = storage.insert("users", doc(json!({}))).unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn update_and_remove_persist_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        let mut storage = JsonFileStorage::open(&path).unwrap();
        storage.insert("users", doc(json!({"name": "Alice", "age": 30}))).unwrap();

        let pred = Predicate::Eq("name".into(), json!("Alice"));
        let mut patch = Map::new();
        patch.insert("age".to_string(), json!(31));
        storage.update("users", &patch, &pred).unwrap();

        let reopened = JsonFileStorage::open(&path).unwrap();
        let found = reopened.get("users", &pred).unwrap().unwrap();
        assert_eq!(found.get("age").unwrap(), &json!(31));

        drop(reopened);
        storage.remove("users", &pred).unwrap();
        let reopened = JsonFileStorage::open(&path).unwrap();
        assert!(reopened.all("users").unwrap().is_empty());
    }
}
