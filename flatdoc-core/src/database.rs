//! `Database`: a mapping from collection name to collection, backed by
//! exactly one `<database>.json` file. Opened on first access by the
//! owning `Client`; this type only caches the collection handles over that
//! already-open storage.

use crate::collection::Collection;
use crate::storage::Storage;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A lazily-populated table of collection handles sharing one storage file.
#[derive(Clone)]
pub struct Database {
    storage: Arc<RwLock<dyn Storage>>,
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl Database {
    pub(crate) fn new(storage: Arc<RwLock<dyn Storage>>) -> Self {
        Database { storage, collections: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Collection access by name: creates an in-memory handle on first
    /// reference; the handle's first operation lazily materializes the
    /// table in the storage collaborator.
    pub fn collection(&self, name: &str) -> Collection {
        if let Some(existing) = self.collections.read().get(name) {
            return existing.clone();
        }
        let mut collections = self.collections.write();
        collections
            .entry(name.to_string())
            .or_insert_with(|| Collection::new(name, self.storage.clone()))
            .clone()
    }

    /// The current set of table names known to the storage collaborator,
    /// not just the ones with a cached handle.
    pub fn collection_names(&self) -> Vec<String> {
        self.storage.read().tables()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentId};
    use crate::storage::memory::MemoryStorage;
    use serde_json::json;
    use std::collections::HashMap as StdHashMap;

    #[test]
    fn collection_handles_are_cached_by_name() {
        let db = Database::new(Arc::new(RwLock::new(MemoryStorage::new())));
        let a = db.collection("users");
        let b = db.collection("users");
        a.insert_one(Document::new(DocumentId::new("1"), StdHashMap::new()), false).unwrap();
        assert_eq!(b.count().unwrap(), 1);
    }

    #[test]
    fn collection_names_reflects_storage_after_first_write() {
        let db = Database::new(Arc::new(RwLock::new(MemoryStorage::new())));
        assert!(db.collection_names().is_empty());
        db.collection("users")
            .insert_one(Document::new(DocumentId::new("1"), StdHashMap::from([("a".to_string(), json!(1))])), false)
            .unwrap();
        assert_eq!(db.collection_names(), vec!["users".to_string()]);
    }
}
