//! Document <-> output record conversion
//!
//! Command output is one `{"doc": ..., "membership": ...}` record per line.
//! Reading accepts those records back, so commands can be chained with pipes
//! and keep their memberships.

use serde_json::{Map, Value, json};
use tracing::warn;

use super::CliError;
use crate::DomainError;

/// Wrap a document and its membership as an output record.
pub fn pair_to_record(doc: Value, membership: f64) -> Value {
    json!({ "doc": doc, "membership": membership })
}

/// Unwrap an output record; any other value is a plain document with
/// membership 1.0.
pub fn record_to_pair(value: Value) -> (Value, f64) {
    match value {
        Value::Object(mut obj) if is_record(&obj) => {
            let membership = obj
                .get("membership")
                .and_then(Value::as_f64)
                .unwrap_or(1.0);
            let doc = obj.remove("doc").unwrap_or(Value::Null);
            (doc, membership)
        }
        other => (other, 1.0),
    }
}

fn is_record(obj: &Map<String, Value>) -> bool {
    obj.len() == 2 && obj.contains_key("doc") && obj.get("membership").is_some_and(Value::is_number)
}

/// Parse input text into (document, membership) pairs.
///
/// A whole-text JSON array yields its elements. Otherwise the text is read as
/// JSON lines; a line that is not JSON becomes `{"content": line}`. A record
/// whose membership lies outside [0, 1] is an error naming the element index
/// or line number (1-based).
pub fn read_pairs(text: &str) -> Result<Vec<(Value, f64)>, CliError> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
            return items
                .into_iter()
                .enumerate()
                .map(|(index, item)| checked_pair(index + 1, item))
                .collect();
        }
    }

    let mut pairs = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = match serde_json::from_str::<Value>(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(line = index + 1, error = %e, "treating non-JSON line as text content");
                json!({ "content": line })
            }
        };
        pairs.push(checked_pair(index + 1, value)?);
    }
    Ok(pairs)
}

fn checked_pair(record: usize, value: Value) -> Result<(Value, f64), CliError> {
    let (doc, membership) = record_to_pair(value);
    if !(0.0..=1.0).contains(&membership) {
        return Err(CliError::InvalidRecord {
            record,
            error: DomainError::OutOfRange(membership),
        });
    }
    Ok((doc, membership))
}
