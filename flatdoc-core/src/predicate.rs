//! The opaque predicate tree produced by the [`crate::query`] builder and
//! evaluated against documents by the storage collaborator.
//!
//! Modeled as a tagged tree: leaf variants are field comparisons, interior
//! variants are `And`/`Or`. `&` and `|` compose two predicates; `$not` is
//! handled by the builder rewriting the comparison itself rather than by a
//! `Not` variant, so there is no negation leaf here.

use crate::document::Document;
use crate::value_utils::compare_values;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::ops::{BitAnd, BitOr};
use std::sync::Arc;

pub type FieldPath = String;

/// A compiled regex paired with the source pattern, so `Predicate::Regex`
/// can still be `Debug`/`Clone`d for tests without re-deriving those on
/// `regex::Regex` itself (which already implements both).
#[derive(Debug, Clone)]
pub struct CompiledRegex {
    pub pattern: String,
    pub regex: Arc<Regex>,
}

#[derive(Debug, Clone)]
pub enum Predicate {
    Eq(FieldPath, Value),
    Ne(FieldPath, Value),
    Gt(FieldPath, Value),
    Ge(FieldPath, Value),
    Lt(FieldPath, Value),
    Le(FieldPath, Value),
    /// `$in`: field equals (or, for list fields, contains) any listed value.
    AnyOf(FieldPath, Vec<Value>),
    /// `$all`: field is a list containing every listed value.
    AllOf(FieldPath, Vec<Value>),
    Regex(FieldPath, CompiledRegex),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// The sentinel matching every document in a collection: `_id != "-1"`.
    /// `_id` is always a non-empty generated or caller-given string, so this
    /// is never false.
    pub fn match_all() -> Predicate {
        Predicate::Ne("_id".to_string(), Value::String("-1".to_string()))
    }

    /// Fold a list of predicates into their conjunction. An empty list folds
    /// to the match-all sentinel so callers never need a special case for
    /// "no constraints at this level".
    pub fn and(mut preds: Vec<Predicate>) -> Predicate {
        if preds.is_empty() {
            return Predicate::match_all();
        }
        if preds.len() == 1 {
            return preds.pop().unwrap();
        }
        Predicate::And(preds)
    }

    pub fn or(preds: Vec<Predicate>) -> Predicate {
        if preds.len() == 1 {
            return preds.into_iter().next().unwrap();
        }
        Predicate::Or(preds)
    }

    /// Evaluate this predicate against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Predicate::Eq(field, value) => field_eq(doc, field, value),
            Predicate::Ne(field, value) => !field_eq(doc, field, value),
            Predicate::Gt(field, value) => {
                compare_field(doc, field, value) == Some(Ordering::Greater)
            }
            Predicate::Ge(field, value) => {
                matches!(compare_field(doc, field, value), Some(Ordering::Greater | Ordering::Equal))
            }
            Predicate::Lt(field, value) => {
                compare_field(doc, field, value) == Some(Ordering::Less)
            }
            Predicate::Le(field, value) => {
                matches!(compare_field(doc, field, value), Some(Ordering::Less | Ordering::Equal))
            }
            Predicate::AnyOf(field, values) => values.iter().any(|v| field_eq(doc, field, v)),
            Predicate::AllOf(field, values) => match doc_field(doc, field) {
                Some(Value::Array(items)) => values.iter().all(|v| items.contains(v)),
                _ => false,
            },
            Predicate::Regex(field, compiled) => match doc_field(doc, field) {
                Some(Value::String(s)) => compiled.regex.is_match(s),
                _ => false,
            },
            Predicate::And(preds) => preds.iter().all(|p| p.matches(doc)),
            Predicate::Or(preds) => preds.iter().any(|p| p.matches(doc)),
        }
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;
    fn bitand(self, rhs: Predicate) -> Predicate {
        match (self, rhs) {
            (Predicate::And(mut lhs), Predicate::And(rhs)) => {
                lhs.extend(rhs);
                Predicate::And(lhs)
            }
            (Predicate::And(mut lhs), rhs) => {
                lhs.push(rhs);
                Predicate::And(lhs)
            }
            (lhs, rhs) => Predicate::And(vec![lhs, rhs]),
        }
    }
}

impl BitOr for Predicate {
    type Output = Predicate;
    fn bitor(self, rhs: Predicate) -> Predicate {
        match (self, rhs) {
            (Predicate::Or(mut lhs), Predicate::Or(rhs)) => {
                lhs.extend(rhs);
                Predicate::Or(lhs)
            }
            (Predicate::Or(mut lhs), rhs) => {
                lhs.push(rhs);
                Predicate::Or(lhs)
            }
            (lhs, rhs) => Predicate::Or(vec![lhs, rhs]),
        }
    }
}

/// Resolves a dot-path against a document's fields, including the list-field
/// convention `Document::get` implements (a single-element list unwrapped by
/// field name).
fn doc_field<'a>(doc: &'a Document, field: &str) -> Option<&'a Value> {
    if field == "_id" {
        return None;
    }
    doc.get(field)
}

/// `field(key) == value`: if the stored value is a list, match when the
/// list contains `value` as a member.
fn field_eq(doc: &Document, field: &str, value: &Value) -> bool {
    if field == "_id" {
        return &doc.get_id_value() == value;
    }
    match doc_field(doc, field) {
        Some(Value::Array(items)) => items.contains(value),
        Some(found) => found == value,
        None => false,
    }
}

fn compare_field(doc: &Document, field: &str, value: &Value) -> Option<Ordering> {
    if field == "_id" {
        return compare_values(&doc.get_id_value(), value);
    }
    compare_values(doc_field(doc, field)?, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentId;
    use serde_json::json;
    use std::collections::HashMap;

    fn doc(fields: Value) -> Document {
        let mut map = HashMap::new();
        for (k, v) in fields.as_object().unwrap() {
            map.insert(k.clone(), v.clone());
        }
        Document::new(DocumentId::new("1"), map)
    }

    #[test]
    fn eq_matches_scalar_and_list_containment() {
        let pred = Predicate::Eq("tag".into(), json!("x"));
        assert!(pred.matches(&doc(json!({"tag": "x"}))));
        assert!(pred.matches(&doc(json!({"tag": ["x", "y"]}))));
        assert!(!pred.matches(&doc(json!({"tag": "y"}))));
    }

    #[test]
    fn ne_is_negation_of_eq() {
        let pred = Predicate::Ne("tag".into(), json!("x"));
        assert!(!pred.matches(&doc(json!({"tag": "x"}))));
        assert!(pred.matches(&doc(json!({"tag": "y"}))));
    }

    #[test]
    fn gt_undefined_across_types_is_false() {
        let pred = Predicate::Gt("count".into(), json!(10));
        assert!(!pred.matches(&doc(json!({"count": "not a number"}))));
        assert!(pred.matches(&doc(json!({"count": 11}))));
    }

    #[test]
    fn any_of_and_all_of() {
        let any = Predicate::AnyOf("count".into(), vec![json!(1), json!(2)]);
        assert!(any.matches(&doc(json!({"count": 2}))));
        assert!(!any.matches(&doc(json!({"count": 3}))));

        let all = Predicate::AllOf("tags".into(), vec![json!("a"), json!("b")]);
        assert!(all.matches(&doc(json!({"tags": ["a", "b", "c"]}))));
        assert!(!all.matches(&doc(json!({"tags": ["a"]}))));
    }

    #[test]
    fn and_or_composition_via_operators() {
        let a = Predicate::Gt("count".into(), json!(10));
        let b = Predicate::Le("count".into(), json!(50));
        let conj = a.clone() & b.clone();
        assert!(conj.matches(&doc(json!({"count": 40}))));
        assert!(!conj.matches(&doc(json!({"count": 5}))));

        let disj = a | b;
        assert!(disj.matches(&doc(json!({"count": 5}))));
    }

    #[test]
    fn eq_descends_through_single_element_list_by_field_name() {
        let pred = Predicate::Eq("tags.name".into(), json!("x"));
        assert!(pred.matches(&doc(json!({"tags": [{"name": "x"}]}))));
        assert!(!pred.matches(&doc(json!({"tags": [{"name": "y"}]}))));
    }

    #[test]
    fn match_all_matches_any_id() {
        let pred = Predicate::match_all();
        assert!(pred.matches(&doc(json!({}))));
    }
}
