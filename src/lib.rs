//! Fuzzy-logic queries over JSON documents.
//!
//! Queries are S-expressions (`(and (>= :age 25) (very (contains? :name "ann")))`)
//! or the equivalent nested JSON arrays. Evaluating one against a document
//! yields a membership degree in [0, 1] instead of a boolean, so results can
//! be ranked, thresholded and combined with fuzzy set algebra.
//!
//! ```
//! use fuzzy_query::{Evaluator, parse_query};
//! use serde_json::json;
//!
//! let query = parse_query("(>= :score 80)").unwrap();
//! let m = Evaluator::new().evaluate(&query, &json!({"score": 85})).unwrap();
//! assert!(m > 0.99 && m < 1.0);
//! ```

pub mod ast;
pub mod builder;
pub mod defuzz;
pub mod error;
pub mod evaluator;
pub mod format;
pub mod fuzzy_set;
pub mod lexer;
pub mod membership;
pub mod output;
pub mod parser;
pub mod path;
pub mod predicates;
pub mod sampling;
pub mod shapes;
pub mod stream;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Expr, FieldRef, Sigil, Token};
pub use builder::QueryBuilder;
pub use defuzz::{Defuzzifier, defuzzify};
pub use error::{DomainError, EvalError, FuzzyError, ParseError, Position, StreamError};
pub use evaluator::{EvalConfig, Evaluator};
pub use format::{format_pretty, format_query};
pub use fuzzy_set::FuzzySet;
pub use lexer::Lexer;
pub use membership::{Hedge, Quantifier};
pub use output::{to_canonical_json, to_json_pretty};
pub use parser::{Parser, parse_query, validate_query_syntax};
pub use path::FieldPath;
pub use predicates::{Predicate, PredicateCall, PredicateRegistry};
pub use stream::{Source, Stage, Stream};
pub use value::Value;
