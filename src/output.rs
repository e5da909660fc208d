//! Deterministic JSON serialization.
//!
//! Object keys are always sorted, so the compact form doubles as the
//! canonical equality key for documents (see [`crate::value::canonical_key`]).
//!
//! # Examples
//!
//! ```
//! use fuzzy_query::output::{to_canonical_json, to_json_pretty};
//! use serde_json::json;
//!
//! let value = json!({"name": "Alice", "age": 30});
//! assert_eq!(to_canonical_json(&value), r#"{"age":30,"name":"Alice"}"#);
//! assert_eq!(to_json_pretty(&json!(42)), "42");
//! ```

use serde_json::{Map, Value};

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        let mut out = String::new();
        self.print_value(value, 0, &mut out);
        out
    }

    fn print_value(&self, value: &Value, indent: usize, out: &mut String) {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::String(s) => self.print_string(s, out),
            Value::Array(arr) => self.print_array(arr, indent, out),
            Value::Object(obj) => self.print_object(obj, indent, out),
        }
    }

    fn print_array(&self, arr: &[Value], indent: usize, out: &mut String) {
        if arr.is_empty() {
            out.push_str("[]");
            return;
        }

        out.push('[');
        for (i, item) in arr.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            if self.pretty {
                out.push('\n');
                self.indent(indent + 1, out);
            }
            self.print_value(item, indent + 1, out);
        }
        if self.pretty {
            out.push('\n');
            self.indent(indent, out);
        }
        out.push(']');
    }

    fn print_object(&self, obj: &Map<String, Value>, indent: usize, out: &mut String) {
        if obj.is_empty() {
            out.push_str("{}");
            return;
        }

        // Sort keys for deterministic output
        let mut entries: Vec<_> = obj.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        out.push('{');
        for (i, (key, item)) in entries.into_iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            if self.pretty {
                out.push('\n');
                self.indent(indent + 1, out);
            }
            self.print_string(key, out);
            out.push(':');
            if self.pretty {
                out.push(' ');
            }
            self.print_value(item, indent + 1, out);
        }
        if self.pretty {
            out.push('\n');
            self.indent(indent, out);
        }
        out.push('}');
    }

    fn indent(&self, level: usize, out: &mut String) {
        for _ in 0..level {
            out.push_str("  ");
        }
    }

    fn print_string(&self, s: &str, out: &mut String) {
        out.push('"');
        for c in s.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
        }
        out.push('"');
    }
}

/// Compact JSON with sorted object keys.
pub fn to_canonical_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// Pretty-printed JSON (2-space indentation) with sorted object keys.
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}
