use std::fmt;

use serde_json::{Number, Value};

use crate::error::ParseError;

/// Prefix character of a field reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sigil {
    /// `:name`
    Colon,
    /// `@dotted.path`
    At,
}

impl Sigil {
    pub fn as_char(self) -> char {
        match self {
            Sigil::Colon => ':',
            Sigil::At => '@',
        }
    }

    pub fn from_char(c: char) -> Option<Sigil> {
        match c {
            ':' => Some(Sigil::Colon),
            '@' => Some(Sigil::At),
            _ => None,
        }
    }
}

/// A field reference atom. Both sigils resolve the same way; the sigil is
/// kept so formatting reproduces the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub sigil: Sigil,
    pub path: String,
}

impl FieldRef {
    pub fn new(sigil: Sigil, path: impl Into<String>) -> Self {
        FieldRef {
            sigil,
            path: path.into(),
        }
    }

    /// Parse `:a.b` / `@a.b`; `None` when `s` is not a well-formed reference.
    pub fn parse(s: &str) -> Option<FieldRef> {
        let mut chars = s.chars();
        let sigil = Sigil::from_char(chars.next()?)?;
        let path = chars.as_str();
        is_path_text(path).then(|| FieldRef::new(sigil, path))
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sigil.as_char(), self.path)
    }
}

/// Characters allowed after a sigil.
pub(crate) fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '*')
}

/// A path body starts with a letter, `_` or `*` and continues with path chars.
pub(crate) fn is_path_text(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '*' => chars.all(is_path_char),
        _ => false,
    }
}

/// Abstract Syntax Tree node of a fuzzy query.
///
/// Either an atom or a list whose head names an operator or predicate and
/// whose tail holds the operands. The tree carries no hidden state and is
/// freely cloned and shared.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `null` / `nil`
    Null,

    /// `true` / `false`
    Boolean(bool),

    /// Integer literal
    Integer(i64),

    /// Floating point literal
    Float(f64),

    /// String literal, quoted or bare. In head position it names an
    /// operator; elsewhere it is a literal (a whole-document containment
    /// test when evaluated on its own).
    String(String),

    /// `:field` or `@dotted.path`
    Field(FieldRef),

    /// `$`, the current context value
    Context,

    /// `(head operand ...)`; the empty list is the empty query
    List(Vec<Expr>),
}

impl Expr {
    pub fn string(s: impl Into<String>) -> Expr {
        Expr::String(s.into())
    }

    /// `:path` reference
    pub fn field(path: impl Into<String>) -> Expr {
        Expr::Field(FieldRef::new(Sigil::Colon, path))
    }

    /// `(op operand ...)`
    pub fn apply(op: impl Into<String>, operands: Vec<Expr>) -> Expr {
        let mut items = Vec::with_capacity(operands.len() + 1);
        items.push(Expr::String(op.into()));
        items.extend(operands);
        Expr::List(items)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Expr::List(_))
    }

    /// Operator name of a non-empty list whose head is a string.
    pub fn head(&self) -> Option<&str> {
        match self {
            Expr::List(items) => match items.first() {
                Some(Expr::String(op)) => Some(op),
                _ => None,
            },
            _ => None,
        }
    }

    /// Tail of a list; empty for atoms.
    pub fn operands(&self) -> &[Expr] {
        match self {
            Expr::List(items) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    /// JSON-compatible form: lists become arrays, field references become
    /// `":path"`/`"@path"` strings and `$` becomes `"$"`.
    pub fn to_json(&self) -> Value {
        match self {
            Expr::Null => Value::Null,
            Expr::Boolean(b) => Value::Bool(*b),
            Expr::Integer(n) => Value::Number((*n).into()),
            Expr::Float(n) => Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Expr::String(s) => Value::String(s.clone()),
            Expr::Field(field) => Value::String(field.to_string()),
            Expr::Context => Value::String("$".to_string()),
            Expr::List(items) => Value::Array(items.iter().map(Expr::to_json).collect()),
        }
    }

    /// Inverse of [`Expr::to_json`]. Objects are not part of the AST.
    pub fn from_json(value: &Value) -> Result<Expr, ParseError> {
        Ok(match value {
            Value::Null => Expr::Null,
            Value::Bool(b) => Expr::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Expr::Integer(i),
                None => Expr::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) if s == "$" => Expr::Context,
            Value::String(s) => match FieldRef::parse(s) {
                Some(field) => Expr::Field(field),
                None => Expr::String(s.clone()),
            },
            Value::Array(items) => {
                Expr::List(items.iter().map(Expr::from_json).collect::<Result<_, _>>()?)
            }
            Value::Object(_) => {
                return Err(ParseError::new("JSON objects are not valid query nodes"));
            }
        })
    }

    /// Rewrite `:a` and `@a.b` atoms into explicit `(field "a")` and
    /// `(path "a.b")` lists.
    pub fn expand_shortcuts(&self) -> Expr {
        match self {
            Expr::Field(field) => {
                let op = match field.sigil {
                    Sigil::Colon => "field",
                    Sigil::At => "path",
                };
                Expr::apply(op, vec![Expr::String(field.path.clone())])
            }
            Expr::List(items) => Expr::List(items.iter().map(Expr::expand_shortcuts).collect()),
            other => other.clone(),
        }
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Boolean(b)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::Integer(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::Integer(n.into())
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::Float(n)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::String(s.to_string())
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::String(s)
    }
}

impl From<FieldRef> for Expr {
    fn from(field: FieldRef) -> Self {
        Expr::Field(field)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::format_query(self))
    }
}
