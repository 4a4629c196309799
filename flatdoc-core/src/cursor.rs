//! The Cursor: a materialized, in-memory result snapshot supporting
//! positional access, forward iteration with peek, multi-key stable sort
//! with cross-type total ordering, and (skip, limit) pagination.
//!
//! The comparator implements a specific cross-type class order
//! (unsortable/missing, numeric, string, document, list, boolean, with
//! empty list as its own class below everything) rather than a generic
//! type-priority scheme, since MongoDB-style query semantics need sorting
//! to always succeed across heterogeneous documents.

use crate::document::Document;
use crate::error::{FlatDocError, Result};
use serde_json::Value;
use std::cmp::Ordering;

/// One key of a sort specification: a (possibly dotted) field path and a
/// direction, `1` for ascending or `-1` for descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub path: String,
    pub direction: i32,
}

impl SortKey {
    pub fn new(path: impl Into<String>, direction: i32) -> Self {
        SortKey { path: path.into(), direction }
    }
}

/// A multi-key sort specification, applied left-to-right with stable
/// ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec(pub Vec<SortKey>);

impl SortSpec {
    pub fn single(path: impl Into<String>, direction: i32) -> Result<Self> {
        validate_direction(direction)?;
        Ok(SortSpec(vec![SortKey::new(path, direction)]))
    }

    pub fn pairs(pairs: Vec<(String, i32)>) -> Result<Self> {
        let mut keys = Vec::with_capacity(pairs.len());
        for (path, direction) in pairs {
            validate_direction(direction)?;
            keys.push(SortKey::new(path, direction));
        }
        Ok(SortSpec(keys))
    }

    /// Parse one of three accepted JSON shapes: a list of
    /// `[field, direction]` pairs, a single-entry `{field: direction}`
    /// mapping, or (via `direction`) a bare field path. Any other shape,
    /// including a bare string with no `direction` argument, is an
    /// invalid-argument error.
    pub fn from_value(spec: &Value, direction: Option<i32>) -> Result<Self> {
        match (spec, direction) {
            (Value::String(field), Some(dir)) => SortSpec::single(field.clone(), dir),
            (Value::String(_), None) => Err(FlatDocError::InvalidArgument(
                "a bare field-path sort spec requires an explicit direction".to_string(),
            )),
            (Value::Object(map), _) => {
                if map.len() != 1 {
                    return Err(FlatDocError::InvalidArgument(
                        "a mapping sort spec must have exactly one field".to_string(),
                    ));
                }
                let (field, dir_value) = map.iter().next().unwrap();
                let dir = dir_value.as_i64().ok_or_else(|| {
                    FlatDocError::InvalidArgument("sort direction must be 1 or -1".to_string())
                })? as i32;
                SortSpec::single(field.clone(), dir)
            }
            (Value::Array(items), _) => {
                let mut pairs = Vec::with_capacity(items.len());
                for item in items {
                    let pair = item.as_array().ok_or_else(|| {
                        FlatDocError::InvalidArgument(
                            "sort list entries must be [field, direction] pairs".to_string(),
                        )
                    })?;
                    if pair.len() != 2 {
                        return Err(FlatDocError::InvalidArgument(
                            "sort list entries must be [field, direction] pairs".to_string(),
                        ));
                    }
                    let field = pair[0].as_str().ok_or_else(|| {
                        FlatDocError::InvalidArgument("sort field must be a string".to_string())
                    })?;
                    let dir = pair[1].as_i64().ok_or_else(|| {
                        FlatDocError::InvalidArgument("sort direction must be 1 or -1".to_string())
                    })? as i32;
                    pairs.push((field.to_string(), dir));
                }
                SortSpec::pairs(pairs)
            }
            _ => Err(FlatDocError::InvalidArgument(
                "unrecognized sort specification shape".to_string(),
            )),
        }
    }
}

fn validate_direction(direction: i32) -> Result<()> {
    if direction == 1 || direction == -1 {
        Ok(())
    } else {
        Err(FlatDocError::InvalidArgument(format!(
            "sort direction must be 1 or -1, got {direction}"
        )))
    }
}

/// Ordering class for a value. Empty lists get their own class, strictly
/// below everything else.
fn class_of(value: &Value) -> i32 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(items) => {
            if items.is_empty() {
                -1
            } else {
                4
            }
        }
        Value::Bool(_) => 5,
    }
}

/// Compare two values already known to sort within the same class, or
/// recurse across classes via `class_of` when they differ. This is the
/// within-class half of the total order; it never needs `direction`, since
/// the direction-dependent min/max reduction for list-valued sort keys
/// happens once, in [`extract_sort_value`], before this is called.
fn cmp_for_sort(a: &Value, b: &Value) -> Ordering {
    let (ca, cb) = (class_of(a), class_of(b));
    if ca != cb {
        return ca.cmp(&cb);
    }
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            if x.is_empty() && y.is_empty() {
                return Ordering::Equal;
            }
            for (xi, yi) in x.iter().zip(y.iter()) {
                let c = cmp_for_sort(xi, yi);
                if c != Ordering::Equal {
                    return c;
                }
            }
            x.len().cmp(&y.len())
        }
        // "an ordered walk of (class-of-value, key, value)": serde_json's
        // default map is key-ordered, so iterating both in lockstep is that walk.
        (Value::Object(x), Value::Object(y)) => {
            let mut xi = x.iter();
            let mut yi = y.iter();
            loop {
                match (xi.next(), yi.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some((xk, xv)), Some((yk, yv))) => {
                        let (xc, yc) = (class_of(xv), class_of(yv));
                        if xc != yc {
                            return xc.cmp(&yc);
                        }
                        let kc = xk.cmp(yk);
                        if kc != Ordering::Equal {
                            return kc;
                        }
                        let vc = cmp_for_sort(xv, yv);
                        if vc != Ordering::Equal {
                            return vc;
                        }
                    }
                }
            }
        }
        _ => Ordering::Equal,
    }
}

/// Descend one path component into `value`, applying the list-unwrapping
/// convenience for sort field extraction: in ascending mode, a
/// single-element list is transparently unwrapped if its element carries
/// the key; in descending mode, the first list element carrying the key
/// wins.
fn descend<'a>(value: &'a Value, part: &str, direction: i32) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(part),
        Value::Array(items) => {
            if direction >= 0 {
                if items.len() == 1 {
                    items[0].as_object()?.get(part)
                } else {
                    None
                }
            } else {
                items.iter().find_map(|item| item.as_object().and_then(|o| o.get(part)))
            }
        }
        _ => None,
    }
}

fn resolve_path(doc: &Document, path: &str, direction: i32) -> Option<Value> {
    if path == "_id" {
        return Some(doc.get_id_value());
    }
    let mut parts = path.split('.');
    let mut current = doc.fields.get(parts.next().unwrap())?;
    for part in parts {
        current = descend(current, part, direction)?;
    }
    Some(current.clone())
}

/// Resolve the sort key's value for one document, reducing a list-valued
/// result to a representative scalar: its minimum element when sorting
/// ascending, its maximum when sorting descending. A path that fails to
/// resolve sorts as `null` (class 0, below all typed values).
fn extract_sort_value(doc: &Document, path: &str, direction: i32) -> Value {
    match resolve_path(doc, path, direction) {
        None => Value::Null,
        Some(Value::Array(items)) if !items.is_empty() => {
            let picked = if direction >= 0 {
                items.iter().min_by(|a, b| cmp_for_sort(a, b))
            } else {
                items.iter().max_by(|a, b| cmp_for_sort(a, b))
            };
            picked.cloned().unwrap_or(Value::Array(vec![]))
        }
        Some(other) => other,
    }
}

fn compare_by_key(a: &Document, b: &Document, key: &SortKey) -> Ordering {
    let va = extract_sort_value(a, &key.path, key.direction);
    let vb = extract_sort_value(b, &key.path, key.direction);
    let ordering = cmp_for_sort(&va, &vb);
    if key.direction < 0 {
        ordering.reverse()
    } else {
        ordering
    }
}

/// A materialized, in-memory snapshot of a query's results.
///
/// Position starts at `-1` (before the first element). `Vec::sort_by` is a
/// stable sort, which is what gives multi-key sorting its required
/// stability without needing to track an explicit grouping id per pass: a
/// composite lexicographic key compared left-to-right under a stable sort
/// has the same effect.
#[derive(Debug, Clone)]
pub struct Cursor {
    items: Vec<Document>,
    position: i64,
}

impl Cursor {
    /// Build a cursor over `items`. If `sort` is given, the documents are
    /// sorted immediately; pagination (`skip`, `limit`) is applied after
    /// sorting.
    pub fn new(
        mut items: Vec<Document>,
        sort: Option<&SortSpec>,
        skip: Option<usize>,
        limit: Option<usize>,
    ) -> Self {
        if let Some(spec) = sort {
            Self::sort_in_place(&mut items, spec);
        }
        let items = Self::paginate(items, skip, limit);
        Cursor { items, position: -1 }
    }

    fn sort_in_place(items: &mut [Document], spec: &SortSpec) {
        items.sort_by(|a, b| {
            for key in &spec.0 {
                let ordering = compare_by_key(a, b, key);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    /// Keep documents at indices `[skip, skip+limit)`. Skip without an
    /// accompanying limit is a documented no-op: this core does not offer
    /// an unbounded skip.
    fn paginate(items: Vec<Document>, skip: Option<usize>, limit: Option<usize>) -> Vec<Document> {
        match (skip, limit) {
            (skip, Some(limit)) if limit > 0 => {
                let skip = skip.unwrap_or(0);
                let start = skip.min(items.len());
                let end = start.saturating_add(limit).min(items.len());
                items[start..end].to_vec()
            }
            _ => items,
        }
    }

    /// Re-sort the current (already paginated) snapshot in place, resetting
    /// position to before-the-first-element. Mirrors the surface API's
    /// `cursor.sort(spec, direction?)`, usable after a cursor has already
    /// been constructed.
    pub fn sort(&mut self, spec: &SortSpec) -> &mut Self {
        Self::sort_in_place(&mut self.items, spec);
        self.position = -1;
        self
    }

    /// Positional integer access (`__getitem__(int)` in the surface API).
    pub fn get(&self, index: usize) -> Option<&Document> {
        self.items.get(index)
    }

    /// String-key access against the current record (`__getitem__(str)` in
    /// the surface API).
    pub fn get_field(&self, key: &str) -> Option<&Value> {
        self.current()?.get(key)
    }

    /// The document at the current position, or `None` before the first
    /// `next()` call.
    pub fn current(&self) -> Option<&Document> {
        if self.position < 0 {
            None
        } else {
            self.items.get(self.position as usize)
        }
    }

    /// Advance and return the document at the new position; fails with
    /// `CursorOutOfRange` once exhausted.
    pub fn next(&mut self) -> Result<&Document> {
        let next_pos = self.position + 1;
        if next_pos as usize >= self.items.len() {
            return Err(FlatDocError::CursorOutOfRange);
        }
        self.position = next_pos;
        Ok(&self.items[next_pos as usize])
    }

    /// Peek one position ahead without advancing; never fails.
    pub fn has_next(&self) -> bool {
        ((self.position + 1) as usize) < self.items.len()
    }

    /// The number of documents in the materialized (post-pagination)
    /// sequence.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Document> {
        self.items
    }
}
