//! Recursive translation of a query document into a [`Predicate`] tree.
//!
//! Each level threads the enclosing field key (`prev_key`) so that bare
//! operators know what field they constrain, plus the field one level
//! further out (`last_prev_key`) for deeper `$not` nesting. The accumulation
//! at each level is an explicit `Vec<Predicate>` folded by
//! [`Predicate::and`], rather than a generator threading mutable state.

use crate::error::{FlatDocError, Result};
use crate::predicate::{CompiledRegex, Predicate};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Build a predicate from a filter document. `{}` (or any empty object)
/// yields the match-all sentinel.
pub fn build_predicate(query: &Value) -> Result<Predicate> {
    let obj = query
        .as_object()
        .ok_or_else(|| FlatDocError::InvalidQuery("filter must be a JSON object".to_string()))?;
    if obj.is_empty() {
        return Ok(Predicate::match_all());
    }
    build_level(obj, None, None, false)
}

/// Build the conjunction of predicates produced by one level of a query
/// document.
///
/// `prev_key` is the field this level's bare operators apply to (the
/// enclosing field key). `last_prev_key` is one level further out, carried
/// along only so it is available should deeper `$not` nesting need it;
/// behavior beyond one level of `$not` is deliberately left unspecified.
/// `negate` is set while recursing into a `$not` block, inverting the
/// comparison operators built at this level.
fn build_level(
    obj: &Map<String, Value>,
    prev_key: Option<&str>,
    last_prev_key: Option<&str>,
    negate: bool,
) -> Result<Predicate> {
    let mut preds = Vec::new();

    for (key, value) in obj {
        match key.as_str() {
            "$and" => preds.push(build_logical_list(value, Predicate::and)?),
            "$or" => preds.push(build_logical_list(value, Predicate::or)?),
            "$not" => {
                let field = prev_key.ok_or_else(|| {
                    FlatDocError::InvalidQuery("$not used without an enclosing field".to_string())
                })?;
                let sub = value.as_object().ok_or_else(|| {
                    FlatDocError::InvalidQuery(
                        "$not requires an operator document on the same field".to_string(),
                    )
                })?;
                preds.push(build_level(sub, Some(field), last_prev_key, true)?);
            }
            op if op.starts_with('$') => {
                let field = prev_key.ok_or_else(|| {
                    FlatDocError::InvalidQuery(format!(
                        "operator {op} used without an enclosing field"
                    ))
                })?;
                if let Some(pred) = build_operator(op, value, field, negate)? {
                    preds.push(pred);
                }
                // Unknown operators are a documented no-op.
            }
            field => match value {
                Value::Object(sub) if is_operator_block(sub) => {
                    preds.push(build_level(sub, Some(field), prev_key, false)?);
                }
                Value::Object(sub) => {
                    preds.push(build_nested_match(field, sub)?);
                }
                scalar => preds.push(Predicate::Eq(field.to_string(), scalar.clone())),
            },
        }
    }

    Ok(Predicate::and(preds))
}

fn build_logical_list(
    value: &Value,
    fold: impl Fn(Vec<Predicate>) -> Predicate,
) -> Result<Predicate> {
    let list = value
        .as_array()
        .ok_or_else(|| FlatDocError::InvalidQuery("$and/$or require a list of sub-queries".to_string()))?;
    let mut sub = Vec::with_capacity(list.len());
    for entry in list {
        let entry_obj = entry.as_object().ok_or_else(|| {
            FlatDocError::InvalidQuery("$and/$or entries must be query documents".to_string())
        })?;
        sub.push(build_level(entry_obj, None, None, false)?);
    }
    Ok(fold(sub))
}

/// A query document whose (at least one) key is an operator, as opposed to
/// one describing a literal nested document to match.
fn is_operator_block(sub: &Map<String, Value>) -> bool {
    sub.keys().any(|k| k.starts_with('$'))
}

/// `{key: {sub_query}}` where `sub_query`'s keys are plain field names: a
/// nested-document match at `key.<field>` for each entry.
fn build_nested_match(prefix: &str, sub: &Map<String, Value>) -> Result<Predicate> {
    let mut preds = Vec::new();
    for (key, value) in sub {
        let path = format!("{prefix}.{key}");
        match value {
            Value::Object(inner) if is_operator_block(inner) => {
                preds.push(build_level(inner, Some(&path), Some(prefix), false)?);
            }
            Value::Object(inner) => preds.push(build_nested_match(&path, inner)?),
            scalar => preds.push(Predicate::Eq(path, scalar.clone())),
        }
    }
    Ok(Predicate::and(preds))
}

/// Build the leaf predicate for one operator key. Returns `None` for
/// unrecognized operators, which the caller treats as a no-op.
fn build_operator(op: &str, value: &Value, field: &str, negate: bool) -> Result<Option<Predicate>> {
    let field = field.to_string();
    let pred = match (op, negate) {
        ("$gte", false) => Predicate::Ge(field, value.clone()),
        ("$gte", true) => Predicate::Lt(field, value.clone()),
        ("$gt", false) => Predicate::Gt(field, value.clone()),
        ("$gt", true) => Predicate::Le(field, value.clone()),
        ("$lte", false) => Predicate::Le(field, value.clone()),
        ("$lte", true) => Predicate::Gt(field, value.clone()),
        ("$lt", false) => Predicate::Lt(field, value.clone()),
        ("$lt", true) => Predicate::Ge(field, value.clone()),
        ("$ne", false) => Predicate::Ne(field, value.clone()),
        ("$ne", true) => Predicate::Eq(field, value.clone()),
        ("$eq", false) => Predicate::Eq(field, value.clone()),
        ("$eq", true) => Predicate::Ne(field, value.clone()),
        ("$in", _) => Predicate::AnyOf(field, as_value_list(value, "$in")?),
        ("$all", _) => Predicate::AllOf(field, as_value_list(value, "$all")?),
        ("$regex", _) => {
            let pattern = value.as_str().ok_or_else(|| {
                FlatDocError::InvalidQuery("$regex requires a string pattern".to_string())
            })?;
            Predicate::Regex(field, compile_regex(pattern)?)
        }
        _ => return Ok(None),
    };
    Ok(Some(pred))
}

fn as_value_list(value: &Value, op: &str) -> Result<Vec<Value>> {
    value
        .as_array()
        .map(|a| a.clone())
        .ok_or_else(|| FlatDocError::InvalidQuery(format!("{op} requires a list value")))
}

/// Normalize user-level escape sequences in a regex pattern: `\\` means a
/// literal backslash, `\x` means plain `x`. Done by swapping `\\` for a
/// placeholder, stripping remaining single backslashes, then restoring the
/// placeholder.
fn normalize_regex_pattern(input: &str) -> String {
    const PLACEHOLDER: &str = "\u{0}FLATDOC_BACKSLASH\u{0}";
    input
        .replace("\\\\", PLACEHOLDER)
        .replace('\\', "")
        .replace(PLACEHOLDER, "\\")
}

fn compile_regex(pattern: &str) -> Result<CompiledRegex> {
    let normalized = normalize_regex_pattern(pattern);
    let full_match = format!("^(?:{normalized})$");
    let regex = Regex::new(&full_match)
        .map_err(|e| FlatDocError::InvalidQuery(format!("invalid $regex pattern: {e}")))?;
    Ok(CompiledRegex {
        pattern: normalized,
        regex: Arc::new(regex),
    })
}
