use std::sync::Arc;

use tracing::debug;

use crate::{
    ast::{Expr, FieldRef},
    error::EvalError,
    fuzzy_set::FuzzySet,
    membership::{self, Hedge, Quantifier, clamp},
    path::FieldPath,
    predicates::{Predicate, PredicateCall, PredicateRegistry, check_arity},
    value::{Value, contains_text, from_membership, to_membership},
};

/// Evaluation knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    /// Relative width of the comparison curves.
    pub tolerance: f64,
    /// Curve values within this distance of 0 or 1 snap to the bound.
    pub cutoff: f64,
    /// Quantifier used by `field`/`path` when none is given.
    pub default_quantifier: Quantifier,
    /// Case folding for string predicates.
    pub case_insensitive_strings: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            tolerance: 0.01,
            cutoff: 1e-3,
            default_quantifier: Quantifier::Any,
            case_insensitive_strings: false,
        }
    }
}

impl EvalConfig {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_default_quantifier(mut self, quantifier: Quantifier) -> Self {
        self.default_quantifier = quantifier;
        self
    }

    pub fn with_case_insensitive_strings(mut self, enabled: bool) -> Self {
        self.case_insensitive_strings = enabled;
        self
    }
}

/// The fuzzy query evaluator.
///
/// Walks an [`Expr`] against one document and produces a membership degree.
/// Owns its configuration and predicate table, so evaluators with different
/// predicates can coexist.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvalConfig,
    predicates: PredicateRegistry,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator::default()
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Evaluator {
            config,
            predicates: PredicateRegistry::default(),
        }
    }

    /// Register or replace a predicate.
    pub fn with_predicate<F>(mut self, name: &str, predicate: F) -> Self
    where
        F: Fn(&PredicateCall<'_>) -> Result<f64, EvalError> + Send + Sync + 'static,
    {
        self.predicates.insert(name, Arc::new(predicate));
        self
    }

    /// Register or replace a predicate given as a trait object.
    pub fn with_predicate_object(mut self, name: &str, predicate: Arc<dyn Predicate>) -> Self {
        self.predicates.insert(name, predicate);
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn predicates(&self) -> &PredicateRegistry {
        &self.predicates
    }

    /// Membership of `document` in the fuzzy set described by `expr`.
    ///
    /// ```
    /// use fuzzy_query::{Evaluator, parse_query};
    /// use serde_json::json;
    ///
    /// let ast = parse_query("(>= :age 25)").unwrap();
    /// let m = Evaluator::new().evaluate(&ast, &json!({"age": 25})).unwrap();
    /// assert_eq!(m, 0.5);
    /// ```
    pub fn evaluate(&self, expr: &Expr, document: &Value) -> Result<f64, EvalError> {
        self.eval_expr(expr, document).map(clamp)
    }

    /// Like [`Evaluator::evaluate`], but an evaluation error counts as
    /// membership 0.0.
    pub fn evaluate_lenient(&self, expr: &Expr, document: &Value) -> f64 {
        match self.evaluate(expr, document) {
            Ok(m) => m,
            Err(e) => {
                debug!(error = %e, "evaluation failed, treating membership as 0");
                0.0
            }
        }
    }

    /// One membership per document, in input order. Documents whose
    /// evaluation fails get 0.0.
    pub fn evaluate_batch<'a, I>(&self, expr: &Expr, documents: I) -> FuzzySet
    where
        I: IntoIterator<Item = &'a Value>,
    {
        FuzzySet::from_computed(
            documents
                .into_iter()
                .map(|doc| self.evaluate_lenient(expr, doc))
                .collect(),
        )
    }

    fn eval_expr(&self, expr: &Expr, document: &Value) -> Result<f64, EvalError> {
        match expr {
            Expr::Null => Ok(0.0),
            Expr::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Expr::Integer(n) => Ok(clamp(*n as f64)),
            Expr::Float(n) => Ok(clamp(*n)),
            Expr::String(s) => Ok(if contains_text(document, s) { 1.0 } else { 0.0 }),
            Expr::Field(field) => Ok(if field_path(field)?.exists(document) {
                1.0
            } else {
                0.0
            }),
            Expr::Context => Ok(to_membership(document)),
            Expr::List(items) => self.eval_list(items, document),
        }
    }

    fn eval_list(&self, items: &[Expr], document: &Value) -> Result<f64, EvalError> {
        let Some((head, operands)) = items.split_first() else {
            return Ok(0.0);
        };
        let Expr::String(op) = head else {
            return Err(EvalError::InvalidOperand(format!(
                "list head must be an operator name, got '{}'",
                head
            )));
        };
        let name = op.to_lowercase();

        if let Some(hedge) = Hedge::from_name(&name) {
            expect_arity(op, operands, 1, Some(1))?;
            return Ok(hedge.apply(self.eval_expr(&operands[0], document)?));
        }

        match name.as_str() {
            "and" => Ok(membership::and_all(self.eval_all(operands, document)?)),
            "or" => Ok(membership::or_all(self.eval_all(operands, document)?)),
            "not" => {
                expect_arity(op, operands, 1, Some(1))?;
                Ok(membership::not(self.eval_expr(&operands[0], document)?))
            }
            "field" | "path" => self.eval_field(op, operands, document),
            "any" | "all" | "none" => {
                expect_arity(op, operands, 2, Some(2))?;
                let quantifier = name.parse::<Quantifier>()?;
                self.eval_quantified(&operands[0], &operands[1], quantifier, document)
            }
            "exists" | "exists?" => {
                expect_arity(op, operands, 1, Some(1))?;
                let path = path_operand(&operands[0])?;
                Ok(if path.exists(document) { 1.0 } else { 0.0 })
            }
            _ => match self.predicates.get(&name) {
                Some(predicate) => self.eval_predicate(op, predicate.as_ref(), operands, document),
                None => Err(EvalError::UnknownOperator(op.clone())),
            },
        }
    }

    fn eval_all(&self, operands: &[Expr], document: &Value) -> Result<Vec<f64>, EvalError> {
        operands
            .iter()
            .map(|operand| self.eval_expr(operand, document))
            .collect()
    }

    /// `(field path [expr [quantifier]])`
    fn eval_field(&self, op: &str, operands: &[Expr], document: &Value) -> Result<f64, EvalError> {
        expect_arity(op, operands, 1, Some(3))?;
        match operands {
            [path] => Ok(if path_operand(path)?.exists(document) {
                1.0
            } else {
                0.0
            }),
            [path, expr] => {
                self.eval_quantified(path, expr, self.config.default_quantifier, document)
            }
            [path, expr, quantifier] => {
                let quantifier = match quantifier {
                    Expr::String(name) => name.parse::<Quantifier>()?,
                    other => return Err(EvalError::InvalidQuantifier(other.to_string())),
                };
                self.eval_quantified(path, expr, quantifier, document)
            }
            _ => unreachable!("arity checked above"),
        }
    }

    /// Evaluate `expr` with every value `path` resolves to as the document,
    /// then combine with `quantifier`. No matches means 0.0.
    fn eval_quantified(
        &self,
        path: &Expr,
        expr: &Expr,
        quantifier: Quantifier,
        document: &Value,
    ) -> Result<f64, EvalError> {
        let values = path_operand(path)?.resolve(document);
        if values.is_empty() {
            return Ok(0.0);
        }
        let degrees = values
            .into_iter()
            .map(|value| self.eval_expr(expr, value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(quantifier.apply(degrees))
    }

    /// Candidate values for one predicate operand.
    fn operand_values(&self, operand: &Expr, document: &Value) -> Result<Vec<Value>, EvalError> {
        Ok(match operand {
            Expr::Field(field) => field_path(field)?
                .resolve(document)
                .into_iter()
                .cloned()
                .collect(),
            Expr::Context => vec![document.clone()],
            Expr::List(_) => vec![from_membership(self.eval_expr(operand, document)?)],
            literal => vec![literal.to_json()],
        })
    }

    /// Invoke a predicate over every combination of operand values and keep
    /// the best degree. An operand with no values makes the result 0.0.
    fn eval_predicate(
        &self,
        op: &str,
        predicate: &dyn Predicate,
        operands: &[Expr],
        document: &Value,
    ) -> Result<f64, EvalError> {
        let candidates = operands
            .iter()
            .map(|operand| self.operand_values(operand, document))
            .collect::<Result<Vec<_>, _>>()?;
        if candidates.iter().any(Vec::is_empty) {
            return Ok(0.0);
        }

        let mut best = 0.0_f64;
        let mut choice = vec![0usize; candidates.len()];
        loop {
            let args: Vec<Value> = choice
                .iter()
                .zip(&candidates)
                .map(|(&i, values)| values[i].clone())
                .collect();
            let call = PredicateCall {
                name: op,
                args: &args,
                document,
                config: &self.config,
            };
            best = best.max(clamp(predicate.apply(&call)?));
            if best >= 1.0 || !advance(&mut choice, &candidates) {
                return Ok(best);
            }
        }
    }
}

/// Step a mixed-radix counter over the candidate lists; false when done.
fn advance(choice: &mut [usize], candidates: &[Vec<Value>]) -> bool {
    for (slot, values) in choice.iter_mut().zip(candidates).rev() {
        *slot += 1;
        if *slot < values.len() {
            return true;
        }
        *slot = 0;
    }
    false
}

fn expect_arity(op: &str, operands: &[Expr], min: usize, max: Option<usize>) -> Result<(), EvalError> {
    check_arity(op, operands.len(), min, max)
}

fn field_path(field: &FieldRef) -> Result<FieldPath, EvalError> {
    FieldPath::parse(&field.path).map_err(|e| EvalError::InvalidOperand(e.message))
}

/// A path operand: `:a.b`, `@a.b`, or a plain string.
fn path_operand(expr: &Expr) -> Result<FieldPath, EvalError> {
    match expr {
        Expr::Field(field) => field_path(field),
        Expr::String(s) => {
            let raw = s.strip_prefix([':', '@']).unwrap_or(s);
            FieldPath::parse(raw).map_err(|e| EvalError::InvalidOperand(e.message))
        }
        other => Err(EvalError::InvalidOperand(format!(
            "expected a field path, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_query;
    use serde_json::json;

    fn eval(query: &str, doc: Value) -> Result<f64, EvalError> {
        Evaluator::new().evaluate(&parse_query(query).unwrap(), &doc)
    }

    #[test]
    fn atoms() {
        let doc = json!({"name": "John Smith", "age": 40});
        assert_eq!(eval("smith", doc.clone()).unwrap(), 1.0);
        assert_eq!(eval("\"jane\"", doc.clone()).unwrap(), 0.0);
        assert_eq!(eval(":age", doc.clone()).unwrap(), 1.0);
        assert_eq!(eval("@address.city", doc.clone()).unwrap(), 0.0);
        assert_eq!(eval("0.3", doc.clone()).unwrap(), 0.3);
        assert_eq!(eval("7", doc.clone()).unwrap(), 1.0);
        assert_eq!(eval("null", doc.clone()).unwrap(), 0.0);
        assert_eq!(eval("", doc).unwrap(), 0.0);
    }

    #[test]
    fn logic_and_hedges() {
        let doc = json!({});
        assert_eq!(eval("(and 0.2 0.7)", doc.clone()).unwrap(), 0.2);
        assert_eq!(eval("(OR 0.2 0.7)", doc.clone()).unwrap(), 0.7);
        assert_eq!(eval("(and)", doc.clone()).unwrap(), 1.0);
        assert_eq!(eval("(or)", doc.clone()).unwrap(), 0.0);
        assert!((eval("(not 0.2)", doc.clone()).unwrap() - 0.8).abs() < 1e-12);
        assert!((eval("(very 0.5)", doc.clone()).unwrap() - 0.25).abs() < 1e-12);
        assert!((eval("(somewhat 0.25)", doc.clone()).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(eval("(same 0.4)", doc).unwrap(), 0.4);
    }

    #[test]
    fn hedge_arity_is_an_error() {
        assert_eq!(
            eval("(very 0.5 0.5)", json!({})),
            Err(EvalError::Arity {
                op: "very".to_string(),
                expected: "1".to_string(),
                found: 2
            })
        );
    }

    #[test]
    fn unknown_operator_is_an_error() {
        assert_eq!(
            eval("(frobnicate :a)", json!({"a": 1})),
            Err(EvalError::UnknownOperator("frobnicate".to_string()))
        );
    }

    #[test]
    fn field_accessor_with_quantifiers() {
        let doc = json!({"items": [{"price": 5}, {"price": 50}]});
        assert_eq!(eval("(field items.*.price (> $ 20))", doc.clone()).unwrap(), 1.0);
        assert_eq!(eval("(field items.*.price (> $ 20) all)", doc.clone()).unwrap(), 0.0);
        assert_eq!(eval("(none @items.*.price (> $ 100))", doc.clone()).unwrap(), 1.0);
        assert_eq!(eval("(all :items (exists price))", doc.clone()).unwrap(), 1.0);
        assert_eq!(eval("(field missing (> $ 1))", doc.clone()).unwrap(), 0.0);
        assert_eq!(eval("(path items.*.price)", doc.clone()).unwrap(), 1.0);
        assert_eq!(
            eval("(field items (> $ 1) most)", doc),
            Err(EvalError::InvalidQuantifier("most".to_string()))
        );
    }

    #[test]
    fn predicate_operands_expand_existentially() {
        let doc = json!({"scores": [{"v": 10}, {"v": 90}]});
        assert_eq!(eval("(> @scores.v 50)", doc.clone()).unwrap(), 1.0);
        assert_eq!(eval("(> :missing 50)", doc.clone()).unwrap(), 0.0);
        assert_eq!(eval("(> (very 1.0) 0.5)", doc).unwrap(), 1.0);
    }

    #[test]
    fn batch_maps_errors_to_zero() {
        let ast = parse_query("(very :a :b)").unwrap();
        let docs = [json!({"a": 1}), json!({})];
        let set = Evaluator::new().evaluate_batch(&ast, &docs);
        assert_eq!(set.memberships(), &[0.0, 0.0]);

        let ast = parse_query("(contains? :name smith)").unwrap();
        let docs = [json!({"name": "Ann Smith"}), json!({"name": "Bob"})];
        let set = Evaluator::new().evaluate_batch(&ast, &docs);
        assert_eq!(set.memberships(), &[0.0, 0.0]);
        let set = Evaluator::with_config(EvalConfig::default().with_case_insensitive_strings(true))
            .evaluate_batch(&ast, &docs);
        assert_eq!(set.memberships(), &[1.0, 0.0]);
    }

    #[test]
    fn predicates_can_be_overridden_per_evaluator() {
        let strict = Evaluator::new().with_predicate(">=", |call: &PredicateCall<'_>| {
            call.arity(2, Some(2))?;
            Ok(match (call.number(0), call.number(1)) {
                (Some(a), Some(b)) if a >= b => 1.0,
                _ => 0.0,
            })
        });
        let ast = parse_query("(>= :age 25)").unwrap();
        let doc = json!({"age": 25});
        assert_eq!(strict.evaluate(&ast, &doc).unwrap(), 1.0);
        assert_eq!(Evaluator::new().evaluate(&ast, &doc).unwrap(), 0.5);
    }
}
