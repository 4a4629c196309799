//! End-to-end scenarios over the full public surface: `Client` ->
//! `Database` -> `Collection`, backed by a real file-backed store in a
//! temporary directory, seeded with a 100-document numeric fixture.

use flatdoc_core::document::{Document, DocumentId};
use flatdoc_core::{Client, Collection};
use serde_json::{json, Value};
use std::collections::HashMap;
use tempfile::tempdir;

fn seeded_collection() -> Collection {
    let dir = tempdir().unwrap();
    let client = Client::open(dir.path()).unwrap();
    let db = client.database("scenarios").unwrap();
    let collection = db.collection("numbers");

    for count in 0..100i64 {
        let mut fields = HashMap::new();
        fields.insert("count".to_string(), json!(count));
        fields.insert("countStr".to_string(), json!(count.to_string()));
        fields.insert("countFloat".to_string(), json!(count as f64 + 0.1));
        fields.insert("countBool".to_string(), json!(count & 1 == 1));
        fields.insert("countArray".to_string(), json!((count..count + 5).collect::<Vec<_>>()));
        collection.insert_one(Document::new(DocumentId::new(""), fields), false).unwrap();
    }

    // `dir` would otherwise drop (and delete) the backing folder before the
    // test runs; leaking it keeps the file alive for the collection's life,
    // which is acceptable for a short-lived test process.
    std::mem::forget(dir);
    collection
}

#[test]
fn s1_initialization_counts_one_hundred() {
    let collection = seeded_collection();
    let cursor = collection.find(&Value::Null, None, None, None).unwrap();
    assert_eq!(cursor.count(), 100);
}

#[test]
fn s2_range_queries() {
    let collection = seeded_collection();

    let gte_50 = collection.find(&json!({"count": {"$gte": 50}}), None, None, None).unwrap();
    assert_eq!(gte_50.count(), 50);

    let between = collection
        .find(&json!({"count": {"$gt": 50, "$lte": 51}}), None, None, None)
        .unwrap();
    assert_eq!(between.count(), 1);
    assert_eq!(between.get(0).unwrap().get("countStr").unwrap(), &json!("51"));
}

#[test]
fn s3_sort_ascending_and_descending() {
    let collection = seeded_collection();
    use flatdoc_core::SortSpec;

    let asc = SortSpec::single("count", 1).unwrap();
    let sorted_asc = collection.find(&Value::Null, Some(&asc), None, None).unwrap();
    assert_eq!(sorted_asc.get(0).unwrap().get("count").unwrap(), &json!(0));
    assert_eq!(sorted_asc.get(1).unwrap().get("count").unwrap(), &json!(1));

    let desc = SortSpec::single("count", -1).unwrap();
    let sorted_desc = collection.find(&Value::Null, Some(&desc), None, None).unwrap();
    assert_eq!(sorted_desc.get(0).unwrap().get("count").unwrap(), &json!(99));
}

#[test]
fn s4_update_one_applies_set() {
    let collection = seeded_collection();
    let result = collection
        .update_one(&json!({"count": 3}), &json!({"$set": {"countStr": "three"}}))
        .unwrap();
    assert_eq!(result.modified_count, 1);

    let found = collection.find_one(&json!({"count": 3})).unwrap().unwrap();
    assert_eq!(found.get("countStr").unwrap(), &json!("three"));
}

#[test]
fn s5_delete_many_leaves_the_complement() {
    let collection = seeded_collection();
    collection.delete_many(&json!({"count": {"$gte": 50}})).unwrap();
    let remaining = collection.find(&Value::Null, None, None, None).unwrap();
    assert_eq!(remaining.count(), 50);
}

#[test]
fn s6_logical_combinators() {
    let collection = seeded_collection();

    let and_result = collection
        .find(&json!({"$and": [{"count": {"$gt": 10}}, {"count": {"$lte": 50}}]}), None, None, None)
        .unwrap();
    assert_eq!(and_result.count(), 40);

    let or_result = collection
        .find(&json!({"$or": [{"count": {"$lt": 10}}, {"count": {"$gte": 90}}]}), None, None, None)
        .unwrap();
    assert_eq!(or_result.count(), 20);
}

#[test]
fn s7_duplicate_insert_leaves_first_document_intact() {
    let dir = tempdir().unwrap();
    let client = Client::open(dir.path()).unwrap();
    let db = client.database("dup").unwrap();
    let collection = db.collection("items");

    let mut first = HashMap::new();
    first.insert("a".to_string(), json!(1));
    collection.insert_one(Document::new(DocumentId::new("x"), first), false).unwrap();

    let mut second = HashMap::new();
    second.insert("a".to_string(), json!(2));
    let err = collection
        .insert_one(Document::new(DocumentId::new("x"), second), false)
        .unwrap_err();
    assert!(matches!(err, flatdoc_core::FlatDocError::DuplicateKey(_, _)));

    let found = collection.find_one(&json!({"_id": "x"})).unwrap().unwrap();
    assert_eq!(found.get("a").unwrap(), &json!(1));
    assert_eq!(collection.count().unwrap(), 1);
}

#[test]
fn negation_rewrite_matches_direct_lt() {
    let collection = seeded_collection();
    let not_result = collection
        .find(&json!({"count": {"$not": {"$gte": 50}}}), None, None, None)
        .unwrap();
    let lt_result = collection.find(&json!({"count": {"$lt": 50}}), None, None, None).unwrap();
    assert_eq!(not_result.count(), lt_result.count());
}

#[test]
fn in_and_list_field_duality() {
    let dir = tempdir().unwrap();
    let client = Client::open(dir.path()).unwrap();
    let db = client.database("tags").unwrap();
    let collection = db.collection("posts");

    let mut scalar_tag = HashMap::new();
    scalar_tag.insert("tag".to_string(), json!("x"));
    collection.insert_one(Document::new(DocumentId::new(""), scalar_tag), false).unwrap();

    let mut list_tag = HashMap::new();
    list_tag.insert("tag".to_string(), json!(["x", "y"]));
    collection.insert_one(Document::new(DocumentId::new(""), list_tag), false).unwrap();

    let found = collection.find(&json!({"tag": "x"}), None, None, None).unwrap();
    assert_eq!(found.count(), 2);
}
