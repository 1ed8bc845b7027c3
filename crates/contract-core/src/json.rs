//! Structural JSON comparison
//!
//! Equality is decided recursively over the JSON value kinds: objects by key
//! set (order irrelevant), arrays positionally, numbers by value regardless
//! of integer or float encoding. The diff attached to a mismatch is only a
//! diagnostic and never changes the outcome.

use crate::error::{ContractError, Result};
use serde_json::{Map, Number, Value};
use similar::{ChangeTag, TextDiff};

/// Outcome of a structural comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    /// Line diff of the canonical forms, `-` for expected and `+` for actual
    Mismatch { diff: String },
}

impl Comparison {
    pub fn is_equal(&self) -> bool {
        matches!(self, Comparison::Equal)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Comparison::Equal => Ok(()),
            Comparison::Mismatch { diff } => Err(ContractError::ShapeMismatch { diff }),
        }
    }
}

/// Compare `actual` against `expected`
pub fn compare(expected: &Value, actual: &Value) -> Comparison {
    if values_equal(expected, actual) {
        Comparison::Equal
    } else {
        Comparison::Mismatch {
            diff: render_diff(expected, actual),
        }
    }
}

/// Compare a list response.
///
/// A length mismatch is reported as a count failure before any element is
/// inspected.
pub fn compare_list(expected: &Value, actual: &Value) -> Result<()> {
    let Some(expected_items) = expected.as_array() else {
        return Err(ContractError::InvalidPayload {
            reason: format!("expected a JSON array, got {}", kind(expected)),
        });
    };
    let Some(actual_items) = actual.as_array() else {
        return compare(expected, actual).into_result();
    };
    if expected_items.len() != actual_items.len() {
        return Err(ContractError::CountMismatch {
            expected: expected_items.len(),
            actual: actual_items.len(),
            body: actual.to_string(),
        });
    }
    compare(expected, actual).into_result()
}

/// Check that every key of the `expected` object is present in `actual`
/// with an equal value. Extra keys in `actual` are ignored.
pub fn contains(expected: &Value, actual: &Value) -> Comparison {
    let (Some(wanted), Some(present)) = (expected.as_object(), actual.as_object()) else {
        return compare(expected, actual);
    };
    let projected: Map<String, Value> = present
        .iter()
        .filter(|(key, _)| wanted.contains_key(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    compare(expected, &Value::Object(projected))
}

fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| values_equal(value, other)))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        _ => expected == actual,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
}

/// Canonical form used for diffs: sorted keys, integral floats as integers
pub fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), canonical(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::Number(number) => normalize_number(number),
        other => other.clone(),
    }
}

fn normalize_number(number: &Number) -> Value {
    if number.is_f64() {
        if let Some(f) = number.as_f64() {
            // 2^53: beyond this an f64 no longer holds every integer exactly
            if f.fract() == 0.0 && f.abs() <= 9_007_199_254_740_992.0 {
                return Value::from(f as i64);
            }
        }
    }
    Value::Number(number.clone())
}

fn pretty(value: &Value) -> String {
    let canonical = canonical(value);
    let mut text = serde_json::to_string_pretty(&canonical).unwrap_or_else(|_| canonical.to_string());
    text.push('\n');
    text
}

fn render_diff(expected: &Value, actual: &Value) -> String {
    let expected = pretty(expected);
    let actual = pretty(actual);
    let diff = TextDiff::from_lines(&expected, &actual);

    let mut out = String::from("--- expected\n+++ actual\n");
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => ' ',
        };
        out.push(sign);
        out.push_str(change.value());
        if change.missing_newline() {
            out.push('\n');
        }
    }
    out
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
