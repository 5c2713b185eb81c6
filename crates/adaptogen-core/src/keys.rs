//! Normalization of caller-supplied argument keys.

use serde_json::{Number, Value};

/// Normalize a `keys` request value into an ordered list of strings.
///
/// Absent or `null` yields an empty list, an array yields one entry per
/// element, and any other scalar yields a single entry.
#[must_use]
pub fn normalize_keys(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(stringify).collect(),
        Some(other) => vec![stringify(other)],
    }
}

/// Text form of a single key, as existing clients expect it: whole-number
/// floats drop their fraction, nested arrays are comma-joined, and objects
/// collapse to `[object Object]`.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => stringify(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[allow(clippy::float_cmp)]
fn number_text(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.trunc() == f && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
