//! Rendering an [`Expr`] back to query text.
//!
//! `parse_query(&format_query(&ast)) == ast` for every AST the parser
//! produces. String atoms are quoted whenever the bare form would lex as
//! something else.
//!
//! ```
//! use fuzzy_query::{format_query, parse_query};
//!
//! let ast = parse_query("(>= :age 25)").unwrap();
//! assert_eq!(format_query(&ast), "(>= :age 25)");
//! ```

use crate::{
    ast::{Expr, FieldRef},
    lexer::{is_float_text, is_integer_text},
};

/// Single-line form.
pub fn format_query(expr: &Expr) -> String {
    let mut out = String::new();
    write_compact(expr, &mut out);
    out
}

/// Indented multi-line form. Lists of at most three atoms stay on one line.
pub fn format_pretty(expr: &Expr) -> String {
    let mut out = String::new();
    write_pretty(expr, 0, &mut out);
    out
}

fn write_compact(expr: &Expr, out: &mut String) {
    match expr {
        Expr::List(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_compact(item, out);
            }
            out.push(')');
        }
        atom => out.push_str(&format_atom(atom)),
    }
}

fn is_simple(items: &[Expr]) -> bool {
    items.len() <= 3 && !items.iter().any(Expr::is_list)
}

fn write_pretty(expr: &Expr, indent: usize, out: &mut String) {
    let Expr::List(items) = expr else {
        out.push_str(&format_atom(expr));
        return;
    };
    if is_simple(items) {
        write_compact(expr, out);
        return;
    }

    out.push('(');
    write_compact(&items[0], out);
    for item in &items[1..] {
        out.push('\n');
        out.push_str(&"  ".repeat(indent + 1));
        write_pretty(item, indent + 1, out);
    }
    out.push(')');
}

fn format_atom(expr: &Expr) -> String {
    match expr {
        Expr::Null => "null".to_string(),
        Expr::Boolean(b) => b.to_string(),
        Expr::Integer(n) => n.to_string(),
        Expr::Float(n) => format_float(*n),
        Expr::String(s) => format_string(s),
        Expr::Field(field) => field.to_string(),
        Expr::Context => "$".to_string(),
        Expr::List(_) => format_query(expr),
    }
}

/// Floats always keep a decimal point so they reparse as floats.
fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s == "$"
        || s
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\''))
        || is_float_text(s)
        || is_integer_text(s)
        || matches!(
            s.to_lowercase().as_str(),
            "true" | "false" | "null" | "nil"
        )
        || FieldRef::parse(s).is_some()
}

fn format_string(s: &str) -> String {
    if !needs_quotes(s) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
