// src/document.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A document's `_id`: a string, unique within its owning collection.
///
/// The core never interprets the string beyond equality and ordering; it
/// generates one (see [`crate::id::generate_id`]) when a caller omits it,
/// and otherwise accepts whatever string form the caller supplies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(value: impl Into<String>) -> Self {
        DocumentId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        DocumentId(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        DocumentId(s.to_string())
    }
}

/// A schema-less document: a string-keyed map of values plus a unique `_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: DocumentId,

    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

impl Document {
    pub fn new(id: DocumentId, fields: HashMap<String, Value>) -> Self {
        Document { id, fields }
    }

    /// Build a document from a JSON object, requiring `_id` to already be present.
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        serde_json::from_value(value.clone())
    }

    pub fn to_value(&self) -> Value {
        self.clone().into()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Field lookup, including dot-paths, array-index path segments, and the
    /// list-field convention (a single-element list is unwrapped by field
    /// name, e.g. `"tags.name"` against `{"tags": [{"name": "x"}]}`). `_id`
    /// is answered directly since it is not stored in `fields`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        if field.is_empty() {
            return None;
        }
        if field == "_id" {
            // _id is a plain string, not a serde_json::Value we own; callers
            // that need to compare it use `id` directly via `get_id_value`.
            return None;
        }
        if field.contains('.') {
            let mut parts = field.split('.');
            let mut value = self.fields.get(parts.next().unwrap())?;
            for part in parts {
                value = crate::value_utils::descend_field(value, part)?;
            }
            Some(value)
        } else {
            self.fields.get(field)
        }
    }

    /// The `_id` as a JSON value, for use in predicate evaluation.
    pub fn get_id_value(&self) -> Value {
        Value::String(self.id.0.clone())
    }

    pub fn set(&mut self, field: String, value: Value) {
        self.fields.insert(field, value);
    }

    /// Set a (possibly dotted) field, creating intermediate objects as needed.
    pub fn set_nested(&mut self, field: &str, value: Value) {
        if !field.contains('.') {
            self.fields.insert(field.to_string(), value);
            return;
        }

        let parts: Vec<&str> = field.split('.').collect();
        let first = parts[0];

        if !self.fields.contains_key(first) {
            let nested = Self::create_nested_value(&parts[1..], value);
            self.fields.insert(first.to_string(), nested);
            return;
        }

        let root = self.fields.get_mut(first).unwrap();
        Self::set_value_at_path(root, &parts[1..], value);
    }

    fn create_nested_value(parts: &[&str], value: Value) -> Value {
        if parts.is_empty() {
            return value;
        }
        let mut obj = serde_json::Map::new();
        obj.insert(
            parts[0].to_string(),
            Self::create_nested_value(&parts[1..], value),
        );
        Value::Object(obj)
    }

    fn set_value_at_path(current: &mut Value, parts: &[&str], value: Value) {
        if parts.is_empty() {
            return;
        }
        if parts.len() == 1 {
            match current {
                Value::Object(map) => {
                    map.insert(parts[0].to_string(), value);
                }
                Value::Array(arr) => {
                    if let Ok(index) = parts[0].parse::<usize>() {
                        if index < arr.len() {
                            arr[index] = value;
                        }
                    }
                }
                _ => {
                    let mut obj = serde_json::Map::new();
                    obj.insert(parts[0].to_string(), value);
                    *current = Value::Object(obj);
                }
            }
            return;
        }

        match current {
            Value::Object(map) => {
                if !map.contains_key(parts[0]) {
                    map.insert(
                        parts[0].to_string(),
                        Self::create_nested_value(&parts[1..], value),
                    );
                } else {
                    let next = map.get_mut(parts[0]).unwrap();
                    Self::set_value_at_path(next, &parts[1..], value);
                }
            }
            Value::Array(arr) => {
                if let Ok(index) = parts[0].parse::<usize>() {
                    if index < arr.len() {
                        Self::set_value_at_path(&mut arr[index], &parts[1..], value);
                    }
                }
            }
            _ => {
                *current = Self::create_nested_value(parts, value);
            }
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        if field == "_id" {
            return true;
        }
        self.fields.contains_key(field)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        let mut map = serde_json::Map::new();
        map.insert("_id".to_string(), Value::String(doc.id.0));
        for (k, v) in doc.fields {
            map.insert(k, v);
        }
        Value::Object(map)
    }
}
