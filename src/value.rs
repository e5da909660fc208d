//! Document helpers.
//!
//! Documents are plain `serde_json::Value`s (a closed sum of null, boolean,
//! number, string, array and object). The engine never mutates them; the
//! helpers here coerce, flatten and key them.

pub use serde_json::Value;

use crate::{membership::clamp, output::to_canonical_json};

/// Check if the value is truthy
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(arr) => !arr.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
    }
}

/// Get as float
pub fn as_float(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Text form used by string predicates: strings unquoted, everything else as
/// canonical JSON.
pub fn as_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => to_canonical_json(other),
    }
}

/// Coerce a value to a membership degree. Numbers are clamped, booleans map
/// to 1/0 and everything else goes by truthiness.
pub fn to_membership(v: &Value) -> f64 {
    match v {
        Value::Number(n) => clamp(n.as_f64().unwrap_or(0.0)),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        other => {
            if is_truthy(other) {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Wrap a membership degree as a JSON number.
pub fn from_membership(m: f64) -> Value {
    serde_json::Number::from_f64(clamp(m))
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Equality key for documents: canonical JSON with sorted object keys, so
/// structurally equal values share a key regardless of key order.
pub fn canonical_key(v: &Value) -> String {
    to_canonical_json(v)
}

/// All scalar leaves of a document, depth first in document order.
pub fn flatten_leaves(v: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    collect_leaves(v, &mut out);
    out
}

fn collect_leaves<'a>(v: &'a Value, out: &mut Vec<&'a Value>) {
    match v {
        Value::Array(arr) => arr.iter().for_each(|item| collect_leaves(item, out)),
        Value::Object(obj) => obj.values().for_each(|item| collect_leaves(item, out)),
        leaf => out.push(leaf),
    }
}

/// Case-insensitive search for `needle` among the document's leaf values.
pub fn contains_text(doc: &Value, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    flatten_leaves(doc)
        .into_iter()
        .any(|leaf| as_text(leaf).to_lowercase().contains(&needle))
}
