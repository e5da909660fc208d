//! Named predicates and the per-evaluator registry that holds them.
//!
//! A predicate receives its operands already evaluated (field references
//! resolved, nested expressions reduced to memberships) and returns a degree
//! in [0, 1]. Numeric comparisons are fuzzy; comparisons between anything
//! else are crisp.
//!
//! Custom predicates are plain closures:
//!
//! ```
//! use fuzzy_query::{Evaluator, parse_query};
//! use fuzzy_query::predicates::PredicateCall;
//! use serde_json::json;
//!
//! let evaluator = Evaluator::new().with_predicate("even?", |call: &PredicateCall<'_>| {
//!     call.arity(1, Some(1))?;
//!     Ok(match call.number(0) {
//!         Some(n) if n % 2.0 == 0.0 => 1.0,
//!         _ => 0.0,
//!     })
//! });
//! let ast = parse_query("(even? :n)").unwrap();
//! assert_eq!(evaluator.evaluate(&ast, &json!({"n": 4})).unwrap(), 1.0);
//! ```

use std::{cmp::Ordering, collections::HashMap, fmt, sync::Arc};

use regex::RegexBuilder;

use crate::{
    error::EvalError,
    evaluator::EvalConfig,
    shapes::{Shape, comparison_scale, fuzzy_between, fuzzy_eq, fuzzy_gt, fuzzy_lt},
    value::{Value, as_float, as_text},
};

/// Evaluated operands plus the ambient document and configuration.
pub struct PredicateCall<'a> {
    pub name: &'a str,
    pub args: &'a [Value],
    pub document: &'a Value,
    pub config: &'a EvalConfig,
}

impl<'a> PredicateCall<'a> {
    /// Fail with an arity error unless `min <= args <= max`.
    pub fn arity(&self, min: usize, max: Option<usize>) -> Result<(), EvalError> {
        check_arity(self.name, self.args.len(), min, max)
    }

    pub fn arg(&self, index: usize) -> Option<&'a Value> {
        self.args.get(index)
    }

    pub fn number(&self, index: usize) -> Option<f64> {
        self.arg(index).and_then(as_float)
    }

    /// Text form of an operand, lowercased when the config asks for it.
    pub fn text(&self, index: usize) -> Option<String> {
        self.arg(index).map(|v| self.fold_case(as_text(v)))
    }

    fn fold_case(&self, s: String) -> String {
        if self.config.case_insensitive_strings {
            s.to_lowercase()
        } else {
            s
        }
    }

    fn values_equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::String(x), Value::String(y)) if self.config.case_insensitive_strings => {
                x.to_lowercase() == y.to_lowercase()
            }
            _ => a == b,
        }
    }
}

pub(crate) fn check_arity(
    op: &str,
    found: usize,
    min: usize,
    max: Option<usize>,
) -> Result<(), EvalError> {
    if found >= min && max.is_none_or(|max| found <= max) {
        return Ok(());
    }
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    };
    Err(EvalError::Arity {
        op: op.to_string(),
        expected,
        found,
    })
}

pub trait Predicate: Send + Sync {
    fn apply(&self, call: &PredicateCall<'_>) -> Result<f64, EvalError>;
}

impl<F> Predicate for F
where
    F: Fn(&PredicateCall<'_>) -> Result<f64, EvalError> + Send + Sync,
{
    fn apply(&self, call: &PredicateCall<'_>) -> Result<f64, EvalError> {
        self(call)
    }
}

/// Name to predicate table. Lookups are case-insensitive.
#[derive(Clone)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Arc<dyn Predicate>>,
}

impl PredicateRegistry {
    pub fn empty() -> Self {
        PredicateRegistry {
            predicates: HashMap::new(),
        }
    }

    /// Register or replace `name`.
    pub fn insert(&mut self, name: &str, predicate: Arc<dyn Predicate>) {
        self.predicates.insert(name.to_lowercase(), predicate);
    }

    fn alias(&mut self, names: &[&str], predicate: Arc<dyn Predicate>) {
        for name in names {
            self.insert(name, Arc::clone(&predicate));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Predicate>> {
        self.predicates.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        let mut registry = PredicateRegistry::empty();

        registry.alias(&["==", "=", "eq?"], Arc::new(compare_eq));
        registry.alias(&["!=", "neq?"], Arc::new(compare_neq));
        registry.alias(&[">", "gt?"], Arc::new(compare_gt));
        registry.alias(&["<", "lt?"], Arc::new(compare_lt));
        registry.alias(&[">=", "gte?"], Arc::new(compare_gte));
        registry.alias(&["<=", "lte?"], Arc::new(compare_lte));

        registry.alias(&["contains?", "contains"], Arc::new(contains));
        registry.alias(&["starts-with?", "startswith"], Arc::new(starts_with));
        registry.alias(&["ends-with?", "endswith"], Arc::new(ends_with));
        registry.alias(&["regex?", "matches"], Arc::new(regex_match));
        registry.insert("in?", Arc::new(member_of));

        registry.insert("between?", Arc::new(between));
        registry.insert("close-to?", Arc::new(close_to));
        registry.insert("approx?", Arc::new(approx));

        registry
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("predicates", &self.names())
            .finish()
    }
}

fn crisp(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Both operands of a binary predicate.
fn pair<'a>(call: &PredicateCall<'a>) -> Result<(&'a Value, &'a Value), EvalError> {
    call.arity(2, Some(2))?;
    Ok((&call.args[0], &call.args[1]))
}

/// Ordering for non-numeric operands; only strings are ordered.
fn crisp_order(call: &PredicateCall<'_>, a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => {
            Some(call.fold_case(x.clone()).cmp(&call.fold_case(y.clone())))
        }
        _ => None,
    }
}

fn compare_eq(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    let (a, b) = pair(call)?;
    Ok(match (as_float(a), as_float(b)) {
        (Some(x), Some(y)) => fuzzy_eq(x, y, call.config.tolerance, call.config.cutoff),
        _ => crisp(call.values_equal(a, b)),
    })
}

fn compare_neq(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    compare_eq(call).map(|m| 1.0 - m)
}

/// Fuzzy curve for numbers, crisp string ordering otherwise.
fn ordered(
    call: &PredicateCall<'_>,
    curve: fn(f64, f64, f64, f64) -> f64,
    accept: &[Ordering],
) -> Result<f64, EvalError> {
    let (a, b) = pair(call)?;
    Ok(match (as_float(a), as_float(b)) {
        (Some(x), Some(y)) => curve(x, y, call.config.tolerance, call.config.cutoff),
        _ => crisp(crisp_order(call, a, b).is_some_and(|ord| accept.contains(&ord))),
    })
}

fn compare_gt(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    ordered(call, fuzzy_gt, &[Ordering::Greater])
}

fn compare_gte(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    ordered(call, fuzzy_gt, &[Ordering::Greater, Ordering::Equal])
}

fn compare_lt(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    ordered(call, fuzzy_lt, &[Ordering::Less])
}

fn compare_lte(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    ordered(call, fuzzy_lt, &[Ordering::Less, Ordering::Equal])
}

/// `(contains? haystack needle)`: element membership for arrays, substring
/// otherwise.
fn contains(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    let (haystack, needle) = pair(call)?;
    Ok(match haystack {
        Value::Array(items) => crisp(items.iter().any(|item| call.values_equal(item, needle))),
        _ => {
            let hay = call.fold_case(as_text(haystack));
            crisp(hay.contains(&call.fold_case(as_text(needle))))
        }
    })
}

fn starts_with(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    call.arity(2, Some(2))?;
    Ok(match (call.text(0), call.text(1)) {
        (Some(s), Some(prefix)) => crisp(s.starts_with(&prefix)),
        _ => 0.0,
    })
}

fn ends_with(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    call.arity(2, Some(2))?;
    Ok(match (call.text(0), call.text(1)) {
        (Some(s), Some(suffix)) => crisp(s.ends_with(&suffix)),
        _ => 0.0,
    })
}

/// `(regex? text pattern)`: unanchored search.
fn regex_match(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    let (text, pattern) = pair(call)?;
    let re = RegexBuilder::new(&as_text(pattern))
        .case_insensitive(call.config.case_insensitive_strings)
        .build()
        .map_err(|e| EvalError::InvalidRegex(e.to_string()))?;
    Ok(crisp(re.is_match(&as_text(text))))
}

/// `(in? needle collection)`: array element, object key or substring.
fn member_of(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    let (needle, collection) = pair(call)?;
    Ok(match collection {
        Value::Array(items) => crisp(items.iter().any(|item| call.values_equal(item, needle))),
        Value::Object(obj) => {
            let key = call.fold_case(as_text(needle));
            crisp(obj.keys().any(|k| call.fold_case(k.clone()) == key))
        }
        other => {
            let hay = call.fold_case(as_text(other));
            crisp(hay.contains(&call.fold_case(as_text(needle))))
        }
    })
}

/// `(between? x low high)`
fn between(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    call.arity(3, Some(3))?;
    Ok(match (call.number(0), call.number(1), call.number(2)) {
        (Some(x), Some(low), Some(high)) => fuzzy_between(x, low, high, call.config.tolerance),
        _ => 0.0,
    })
}

/// `(close-to? x target [sigma])`
fn close_to(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    call.arity(2, Some(3))?;
    let (Some(x), Some(target)) = (call.number(0), call.number(1)) else {
        return Ok(0.0);
    };
    let sigma = call
        .number(2)
        .unwrap_or_else(|| comparison_scale(x, target, call.config.tolerance));
    Ok(Shape::Gaussian(target, sigma).eval(x))
}

/// `(approx? x target [width])`
fn approx(call: &PredicateCall<'_>) -> Result<f64, EvalError> {
    call.arity(2, Some(3))?;
    let (Some(x), Some(target)) = (call.number(0), call.number(1)) else {
        return Ok(0.0);
    };
    let width = call
        .number(2)
        .unwrap_or_else(|| comparison_scale(x, target, call.config.tolerance));
    Ok(Shape::Bell(target, width, 2.0).eval(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(name: &str, args: Vec<Value>) -> Result<f64, EvalError> {
        run_with(name, args, &EvalConfig::default())
    }

    fn run_with(name: &str, args: Vec<Value>, config: &EvalConfig) -> Result<f64, EvalError> {
        let registry = PredicateRegistry::default();
        let doc = Value::Null;
        let call = PredicateCall {
            name,
            args: &args,
            document: &doc,
            config,
        };
        registry
            .get(name)
            .ok_or_else(|| EvalError::UnknownOperator(name.to_string()))?
            .apply(&call)
    }

    #[test]
    fn numeric_comparisons_are_fuzzy() {
        assert_eq!(run("==", vec![json!(10), json!(10.0)]).unwrap(), 1.0);
        assert_eq!(run(">", vec![json!(5), json!(5)]).unwrap(), 0.5);
        assert_eq!(run(">=", vec![json!(5), json!(5)]).unwrap(), 0.5);
        let near = run(">=", vec![json!(85), json!(80)]).unwrap();
        assert!(near > 0.99 && near < 1.0);
        assert_eq!(run("<", vec![json!(1), json!(100)]).unwrap(), 1.0);
        assert_eq!(run("!=", vec![json!(3), json!(3)]).unwrap(), 0.0);
    }

    #[test]
    fn non_numeric_comparisons_are_crisp() {
        assert_eq!(run("eq?", vec![json!("a"), json!("a")]).unwrap(), 1.0);
        assert_eq!(run("==", vec![json!("a"), json!("A")]).unwrap(), 0.0);
        assert_eq!(run(">", vec![json!("b"), json!("a")]).unwrap(), 1.0);
        assert_eq!(run(">=", vec![json!("a"), json!("a")]).unwrap(), 1.0);
        assert_eq!(run(">", vec![json!("a"), json!("a")]).unwrap(), 0.0);
        assert_eq!(run("<", vec![json!(true), json!(1)]).unwrap(), 0.0);

        let config = EvalConfig::default().with_case_insensitive_strings(true);
        assert_eq!(run_with("==", vec![json!("a"), json!("A")], &config).unwrap(), 1.0);
    }

    #[test]
    fn string_tests() {
        assert_eq!(run("contains?", vec![json!("hello"), json!("ell")]).unwrap(), 1.0);
        assert_eq!(run("contains", vec![json!(["a", "b"]), json!("b")]).unwrap(), 1.0);
        assert_eq!(run("starts-with?", vec![json!("hello"), json!("he")]).unwrap(), 1.0);
        assert_eq!(run("endswith", vec![json!("hello"), json!("he")]).unwrap(), 0.0);
        assert_eq!(run("regex?", vec![json!("abc123"), json!(r"\d+")]).unwrap(), 1.0);
        assert_eq!(run("in?", vec![json!("x"), json!({"x": 1})]).unwrap(), 1.0);
        assert_eq!(run("in?", vec![json!(2), json!([1, 2])]).unwrap(), 1.0);
    }

    #[test]
    fn bad_regex_and_arity_are_errors() {
        assert!(matches!(
            run("matches", vec![json!("x"), json!("(")]),
            Err(EvalError::InvalidRegex(_))
        ));
        assert_eq!(
            run(">", vec![json!(1)]),
            Err(EvalError::Arity {
                op: ">".to_string(),
                expected: "2".to_string(),
                found: 1
            })
        );
    }

    #[test]
    fn shape_predicates() {
        assert_eq!(run("between?", vec![json!(5), json!(1), json!(10)]).unwrap(), 1.0);
        assert_eq!(run("between?", vec![json!(50), json!(1), json!(10)]).unwrap(), 0.0);
        assert_eq!(run("close-to?", vec![json!(3), json!(3)]).unwrap(), 1.0);
        let c = run("close-to?", vec![json!(4), json!(3), json!(1.0)]).unwrap();
        assert!((c - (-0.5f64).exp()).abs() < 1e-12);
        assert_eq!(run("approx?", vec![json!(3), json!(5), json!(2.0)]).unwrap(), 0.5);
    }

    #[test]
    fn lookups_ignore_case() {
        let registry = PredicateRegistry::default();
        assert!(registry.contains("CONTAINS?"));
        assert!(!registry.contains("and"));
    }
}
