//! # Fuzzy Query Language - Abstract Syntax Tree
//!
//! Queries are Lisp-like expressions over degrees of membership:
//!
//! ```text
//! (and (>= :age 25) (very (contains? :name "smith")))
//! ```
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - The `Expr` tree shared by the parser, the
//!   formatter, the builder and the evaluator
//!
//! ## Atoms
//!
//! - numbers (`25`, `-3`, `0.75`), `true`/`false`, `null`/`nil`
//! - strings, quoted (`"john smith"`) or bare (`smith`); bare words in head
//!   position name operators and predicates
//! - field references `:name` or `@user.address.city` (with `*`/`**`)
//! - `$`, the current context value
//!
//! ## JSON form
//!
//! Every `Expr` has a JSON-compatible nested-array form, e.g.
//! `[">=", ":age", 25]`, see [`Expr::to_json`] and [`Expr::from_json`].
pub mod expressions;
pub mod tokens;

pub use expressions::{Expr, FieldRef, Sigil};
pub use tokens::{Spanned, Token};
