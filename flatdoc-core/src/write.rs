//! The Write Coordinator: insert/update/delete orchestration sitting
//! between a `Collection` and its storage collaborator. Result types mirror
//! a MongoDB-style driver's four result classes, with every field actually
//! computed rather than left as a documented-but-unimplemented property.

use crate::document::{Document, DocumentId};
use crate::error::{FlatDocError, Result};
use crate::id::generate_id;
use crate::log_debug;
use crate::predicate::Predicate;
use crate::storage::Storage;
use serde_json::{Map, Value};

/// Result of `insert_one`.
#[derive(Debug, Clone)]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: DocumentId,
}

/// Result of `insert_many`.
#[derive(Debug, Clone)]
pub struct InsertManyResult {
    pub acknowledged: bool,
    pub inserted_ids: Vec<DocumentId>,
}

/// Result of `update_one` / `update_many`.
#[derive(Debug, Clone)]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: usize,
    pub modified_count: usize,
}

impl UpdateResult {
    fn unsuccessful() -> Self {
        UpdateResult { acknowledged: false, matched_count: 0, modified_count: 0 }
    }
}

/// Result of `delete_one` / `delete_many`.
#[derive(Debug, Clone)]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: usize,
}

/// Extract the `$set` body from an update document: if present,
/// its value becomes the actual patch; otherwise the whole document is
/// treated as the patch.
fn extract_patch(update: &Value) -> Result<Map<String, Value>> {
    let obj = update
        .as_object()
        .ok_or_else(|| FlatDocError::InvalidArgument("update document must be an object".into()))?;
    match obj.get("$set") {
        Some(set) => set
            .as_object()
            .cloned()
            .ok_or_else(|| FlatDocError::InvalidArgument("$set value must be an object".into())),
        None => Ok(obj.clone()),
    }
}

/// `insert_one`: assigns `_id` if absent, duplicate-checks unless
/// `bypass_duplicate_check`, then inserts.
pub fn insert_one(
    storage: &mut dyn Storage,
    collection: &str,
    mut doc: Document,
    bypass_duplicate_check: bool,
) -> Result<InsertOneResult> {
    if doc.id.as_str().is_empty() {
        doc.id = generate_id();
    }
    if !bypass_duplicate_check {
        let existing = storage.get(collection, &Predicate::Eq("_id".into(), Value::String(doc.id.0.clone())))?;
        if existing.is_some() {
            return Err(FlatDocError::DuplicateKey(doc.id.0.clone(), collection.to_string()));
        }
    }
    let inserted_id = doc.id.clone();
    storage.insert(collection, doc)?;
    log_debug!("insert_one into '{}' assigned _id={}", collection, inserted_id);
    Ok(InsertOneResult { acknowledged: true, inserted_id })
}

/// `insert_many`: validates every `_id` up-front against both the
/// existing collection and the ids already assigned earlier in this call,
/// so the batch fully applies or fully fails before any storage mutation.
pub fn insert_many(
    storage: &mut dyn Storage,
    collection: &str,
    docs: Vec<Document>,
    bypass_duplicate_check: bool,
) -> Result<InsertManyResult> {
    let mut existing_ids: std::collections::HashSet<String> = if bypass_duplicate_check {
        std::collections::HashSet::new()
    } else {
        storage
            .all(collection)?
            .into_iter()
            .map(|d| d.id.0)
            .collect()
    };

    let mut prepared = Vec::with_capacity(docs.len());
    for mut doc in docs {
        if doc.id.as_str().is_empty() {
            doc.id = generate_id();
        }
        if !bypass_duplicate_check && existing_ids.contains(&doc.id.0) {
            return Err(FlatDocError::DuplicateKey(doc.id.0.clone(), collection.to_string()));
        }
        existing_ids.insert(doc.id.0.clone());
        prepared.push(doc);
    }

    let inserted_ids: Vec<DocumentId> = prepared.iter().map(|d| d.id.clone()).collect();
    storage.insert_multiple(collection, prepared)?;
    log_debug!("insert_many into '{}' inserted {} document(s)", collection, inserted_ids.len());
    Ok(InsertManyResult { acknowledged: true, inserted_ids })
}

/// `update_one` / the single-document path of `update_many`: storage
/// failures are swallowed into an unsuccessful, unacknowledged result
/// rather than propagated.
pub fn update_one(
    storage: &mut dyn Storage,
    collection: &str,
    predicate: &Predicate,
    update: &Value,
) -> Result<UpdateResult> {
    let patch = match extract_patch(update) {
        Ok(patch) => patch,
        Err(_) => return Ok(UpdateResult::unsuccessful()),
    };
    let matched = storage.search(collection, predicate)?.len();
    match storage.update(collection, &patch, predicate) {
        Ok(modified) => {
            log_debug!("update on '{}' matched {} modified {}", collection, matched, modified.len());
            Ok(UpdateResult { acknowledged: true, matched_count: matched, modified_count: modified.len() })
        }
        Err(_) => Ok(UpdateResult::unsuccessful()),
    }
}

/// `update_many`: backwards-compatible list-of-updates form, each
/// applied independently against the same predicate; a plain single update
/// document delegates straight to `update_one`.
pub fn update_many(
    storage: &mut dyn Storage,
    collection: &str,
    predicate: &Predicate,
    update: &Value,
) -> Result<UpdateResult> {
    match update.as_array() {
        Some(updates) => {
            let mut total = UpdateResult { acknowledged: true, matched_count: 0, modified_count: 0 };
            for one in updates {
                let result = update_one(storage, collection, predicate, one)?;
                total.matched_count += result.matched_count;
                total.modified_count += result.modified_count;
                total.acknowledged = total.acknowledged && result.acknowledged;
            }
            Ok(total)
        }
        None => update_one(storage, collection, predicate, update),
    }
}

/// `delete_one`: locates a single match, then removes by exact `_id`
/// equality. An empty match is a not-found error rather than a silent no-op.
pub fn delete_one(storage: &mut dyn Storage, collection: &str, predicate: &Predicate) -> Result<DeleteResult> {
    let found = storage.get(collection, predicate)?;
    match found {
        Some(doc) => {
            let by_id = Predicate::Eq("_id".into(), Value::String(doc.id.0.clone()));
            let removed = storage.remove(collection, &by_id)?;
            Ok(DeleteResult { acknowledged: true, deleted_count: removed.len() })
        }
        None => Err(FlatDocError::NotFound),
    }
}

/// `delete_many`: materializes every match, removes each by exact
/// `_id`, and resets the monotonic record-id counter when the query was
/// match-all (an empty query document).
pub fn delete_many(
    storage: &mut dyn Storage,
    collection: &str,
    predicate: &Predicate,
    is_match_all: bool,
) -> Result<DeleteResult> {
    let matches = storage.search(collection, predicate)?;
    let mut deleted = 0;
    for doc in matches {
        let by_id = Predicate::Eq("_id".into(), Value::String(doc.id.0.clone()));
        deleted += storage.remove(collection, &by_id)?.len();
    }
    if is_match_all {
        storage.reset_record_counter(collection)?;
    }
    log_debug!("delete_many on '{}' removed {} document(s)", collection, deleted);
    Ok(DeleteResult { acknowledged: true, deleted_count: deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use serde_json::json;
    use std::collections::HashMap;

    fn doc(id: &str, fields: Value) -> Document {
        let mut map = HashMap::new();
        for (k, v) in fields.as_object().unwrap() {
            map.insert(k.clone(), v.clone());
        }
        Document::new(DocumentId::new(id), map)
    }

    #[test]
    fn insert_one_assigns_id_when_absent() {
        let mut storage = MemoryStorage::new();
        let result = insert_one(&mut storage, "users", doc("", json!({"name": "Alice"})), false).unwrap();
        assert!(!result.inserted_id.as_str().is_empty());
    }

    #[test]
    fn insert_one_rejects_duplicate_id() {
        let mut storage = MemoryStorage::new();
        insert_one(&mut storage, "users", doc("1", json!({})), false).unwrap();
        let err = insert_one(&mut storage, "users", doc("1", json!({})), false).unwrap_err();
        assert!(matches!(err, FlatDocError::DuplicateKey(_, _)));
    }

    #[test]
    fn insert_many_fails_whole_batch_on_internal_duplicate() {
        let mut storage = MemoryStorage::new();
        let docs = vec![doc("1", json!({})), doc("1", json!({}))];
        let err = insert_many(&mut storage, "users", docs, false).unwrap_err();
        assert!(matches!(err, FlatDocError::DuplicateKey(_, _)));
        assert!(storage.all("users").unwrap().is_empty());
    }

    #[test]
    fn insert_many_preserves_issue_order() {
        let mut storage = MemoryStorage::new();
        let docs = vec![doc("1", json!({})), doc("2", json!({})), doc("3", json!({}))];
        let result = insert_many(&mut storage, "users", docs, false).unwrap();
        let ids: Vec<&str> = result.inserted_ids.iter().map(|d| d.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn update_one_extracts_set_body_as_patch() {
        let mut storage = MemoryStorage::new();
        insert_one(&mut storage, "users", doc("1", json!({"age": 30})), false).unwrap();
        let pred = Predicate::Eq("_id".into(), json!("1"));
        let update = json!({"$set": {"age": 31}});
        let result = update_one(&mut storage, "users", &pred, &update).unwrap();
        assert_eq!(result.matched_count, 1);
        assert_eq!(result.modified_count, 1);
        let found = storage.get("users", &pred).unwrap().unwrap();
        assert_eq!(found.get("age").unwrap(), &json!(31));
    }

    #[test]
    fn delete_one_on_no_match_is_not_found() {
        let mut storage = MemoryStorage::new();
        let pred = Predicate::Eq("name".into(), json!("nobody"));
        let err = delete_one(&mut storage, "users", &pred).unwrap_err();
        assert!(matches!(err, FlatDocError::NotFound));
    }

    #[test]
    fn delete_many_match_all_resets_record_counter() {
        let mut storage = MemoryStorage::new();
        insert_one(&mut storage, "users", doc("1", json!({})), false).unwrap();
        insert_one(&mut storage, "users", doc("2", json!({})), false).unwrap();
        delete_many(&mut storage, "users", &Predicate::match_all(), true).unwrap();

        let next_id = storage.insert("users", doc("3", json!({}))).unwrap();
        assert_eq!(next_id, 1);
    }
}
