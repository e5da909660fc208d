//! Fluent construction of query ASTs without going through text.
//!
//! ```
//! use fuzzy_query::QueryBuilder;
//! use serde_json::json;
//!
//! let query = QueryBuilder::new()
//!     .and_()
//!     .gte("age", 25)
//!     .contains("name", "smith")
//!     .very()
//!     .end()
//!     .build();
//! assert_eq!(
//!     query.to_json(),
//!     json!(["and", [">=", ":age", 25], ["very", ["contains?", ":name", "smith"]]])
//! );
//! ```

use crate::{
    ast::{Expr, FieldRef, Sigil},
    membership::Hedge,
};

const LOGICAL: [&str; 3] = ["and", "or", "not"];

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    stack: Vec<Vec<Expr>>,
    current: Vec<Expr>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder::default()
    }

    fn head(&self) -> Option<&str> {
        match self.current.first() {
            Some(Expr::String(op)) => Some(op),
            _ => None,
        }
    }

    fn in_logical_scope(&self) -> bool {
        self.head().is_some_and(|op| LOGICAL.contains(&op))
    }

    fn open(mut self, op: &str) -> Self {
        let parent = std::mem::replace(&mut self.current, vec![Expr::string(op)]);
        self.stack.push(parent);
        self
    }

    pub fn and_(self) -> Self {
        self.open("and")
    }

    pub fn or_(self) -> Self {
        self.open("or")
    }

    pub fn not_(self) -> Self {
        self.open("not")
    }

    /// Close the innermost scope and append it to its parent.
    pub fn end(mut self) -> Self {
        if let Some(mut parent) = self.stack.pop() {
            let scope = std::mem::take(&mut self.current);
            parent.push(Expr::List(scope));
            self.current = parent;
        }
        self
    }

    /// Append `(op field value...)` to a logical scope, or make it the
    /// current expression otherwise.
    pub fn leaf(mut self, op: &str, field: &str, args: Vec<Expr>) -> Self {
        let mut items = vec![Expr::string(op), field_ref(field)];
        items.extend(args);
        if self.in_logical_scope() {
            self.current.push(Expr::List(items));
        } else {
            self.current = items;
        }
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Expr>) -> Self {
        self.leaf("==", field, vec![value.into()])
    }

    pub fn neq(self, field: &str, value: impl Into<Expr>) -> Self {
        self.leaf("!=", field, vec![value.into()])
    }

    pub fn gt(self, field: &str, value: impl Into<Expr>) -> Self {
        self.leaf(">", field, vec![value.into()])
    }

    pub fn lt(self, field: &str, value: impl Into<Expr>) -> Self {
        self.leaf("<", field, vec![value.into()])
    }

    pub fn gte(self, field: &str, value: impl Into<Expr>) -> Self {
        self.leaf(">=", field, vec![value.into()])
    }

    pub fn lte(self, field: &str, value: impl Into<Expr>) -> Self {
        self.leaf("<=", field, vec![value.into()])
    }

    pub fn contains(self, field: &str, needle: &str) -> Self {
        self.leaf("contains?", field, vec![Expr::string(needle)])
    }

    pub fn exists(self, field: &str) -> Self {
        self.leaf("exists?", field, Vec::new())
    }

    /// Apply `hedge` to the last operand of a logical scope, or to the whole
    /// current expression otherwise.
    ///
    /// Does nothing when there is nothing to wrap yet: on a fresh builder or
    /// right after `and_()`/`or_()`/`not_()` before any operand was added.
    /// Call it after the leaf it should modify.
    pub fn hedge(mut self, hedge: Hedge) -> Self {
        let name = Expr::string(hedge.name());
        if self.current.is_empty() {
            return self;
        }

        if self.current.len() == 1 && self.current[0].is_list() {
            let inner = self.current.remove(0);
            self.current = vec![name, inner];
        } else if self.in_logical_scope() {
            if self.current.len() > 1 {
                if let Some(last) = self.current.pop() {
                    self.current.push(Expr::List(vec![name, last]));
                }
            }
        } else {
            let inner = std::mem::take(&mut self.current);
            self.current = vec![name, Expr::List(inner)];
        }
        self
    }

    pub fn very(self) -> Self {
        self.hedge(Hedge::Very)
    }

    pub fn somewhat(self) -> Self {
        self.hedge(Hedge::Somewhat)
    }

    /// Close any open scopes and return the AST.
    pub fn build(mut self) -> Expr {
        while !self.stack.is_empty() {
            self = self.end();
        }
        if self.current.len() == 1 {
            if let Some(only) = self.current.pop() {
                return only;
            }
        }
        Expr::List(self.current)
    }
}

/// `"age"` becomes `:age`; explicit `:`/`@` references are kept.
fn field_ref(field: &str) -> Expr {
    match FieldRef::parse(field) {
        Some(parsed) => Expr::Field(parsed),
        None => Expr::Field(FieldRef::new(Sigil::Colon, field)),
    }
}
