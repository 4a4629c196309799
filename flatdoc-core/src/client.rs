//! `Client`: a scoped acquisition of a root folder containing zero or more
//! database files. Construction ensures the folder exists; a preexisting
//! folder is not an error.

use crate::database::Database;
use crate::error::Result;
use crate::storage::json_file::JsonFileStorage;
use crate::storage::Storage;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The root namespace handle: one folder, any number of lazily-opened
/// database files.
#[derive(Clone)]
pub struct Client {
    root: PathBuf,
    databases: Arc<RwLock<HashMap<String, Database>>>,
}

impl Client {
    /// Open (creating if necessary) a client rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Client { root, databases: Arc::new(RwLock::new(HashMap::new())) })
    }

    /// Database access by name: opens (and caches) the backing
    /// `<name>.json` file on first reference.
    pub fn database(&self, name: &str) -> Result<Database> {
        if let Some(existing) = self.databases.read().get(name) {
            return Ok(existing.clone());
        }
        let mut databases = self.databases.write();
        if let Some(existing) = databases.get(name) {
            return Ok(existing.clone());
        }
        let path = self.root.join(format!("{name}.json"));
        let storage: Arc<RwLock<dyn Storage>> = Arc::new(RwLock::new(JsonFileStorage::open(path)?));
        let database = Database::new(storage);
        databases.insert(name.to_string(), database.clone());
        Ok(database)
    }

    /// No-op: the storage collaborator owns file lifecycle.
    pub fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentId};
    use serde_json::json;
    use std::collections::HashMap as StdHashMap;
    use tempfile::tempdir;

    #[test]
    fn opening_creates_missing_folder() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested/store");
        assert!(!root.exists());
        Client::open(&root).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn opening_preexisting_folder_is_not_an_error() {
        let dir = tempdir().unwrap();
        Client::open(dir.path()).unwrap();
        Client::open(dir.path()).unwrap();
    }

    #[test]
    fn database_handles_are_cached_and_persist_to_disk() {
        let dir = tempdir().unwrap();
        let client = Client::open(dir.path()).unwrap();
        let db = client.database("app").unwrap();
        db.collection("users")
            .insert_one(
                Document::new(DocumentId::new("1"), StdHashMap::from([("name".to_string(), json!("Alice"))])),
                false,
            )
            .unwrap();

        assert!(dir.path().join("app.json").exists());

        let reopened = Client::open(dir.path()).unwrap();
        let db2 = reopened.database("app").unwrap();
        assert_eq!(db2.collection("users").count().unwrap(), 1);
    }
}
