//! Value utility functions shared between the predicate and cursor layers.

use serde_json::Value;
use std::cmp::Ordering;

/// Get a nested value from JSON with dot-notation support.
///
/// Supports plain fields (`"name"`), nested objects (`"address.city"`), and
/// array indexing (`"items.0.name"`), plus the list-field convention (see
/// `descend_field`) that lets a dot-path reach through a single-element list
/// by field name, e.g. `"tags.name"` against `{"tags": [{"name": "x"}]}`.
///
/// ```
/// use serde_json::json;
/// use flatdoc_core::value_utils::get_nested_value;
///
/// let doc = json!({"address": {"city": "NYC"}});
/// assert_eq!(get_nested_value(&doc, "address.city"), Some(&json!("NYC")));
/// ```
pub fn get_nested_value<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut value = doc;
    for part in path.split('.') {
        value = descend_field(value, part)?;
    }
    Some(value)
}

/// Descend one dot-path component into `value`. Objects look the field up
/// directly. Arrays accept a numeric index (`"items.0"`), and otherwise fall
/// back to the list-field convention: when the array has exactly one element
/// and that element is a document carrying `part`, descend into it.
pub fn descend_field<'a>(value: &'a Value, part: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(part),
        Value::Array(arr) => {
            if let Ok(index) = part.parse::<usize>() {
                return arr.get(index);
            }
            if arr.len() == 1 {
                arr[0].as_object()?.get(part)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Compare two JSON scalars. Returns `None` for types the comparison
/// operators leave undefined across types.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(n1), Value::Number(n2)) => n1.as_f64()?.partial_cmp(&n2.as_f64()?),
        (Value::String(s1), Value::String(s2)) => Some(s1.cmp(s2)),
        (Value::Bool(b1), Value::Bool(b2)) => Some(b1.cmp(b2)),
        _ => None,
    }
}
