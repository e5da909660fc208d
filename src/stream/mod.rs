//! Lazy, composable pipelines over document sources.
//!
//! A [`Stream`] is a descriptor: composing it (`filter`, `hedge`, `top_k`,
//! ...) only builds a new descriptor around the old one. Nothing is read
//! until a terminal call (`evaluate`, `collect`, `to_map`, ...) pulls from
//! it, and every terminal call walks the source again from scratch.
//!
//! `top_k`, `intersect` and `union` must see a whole side before emitting;
//! they may consume O(n) memory proportional to the upstream (or other-side)
//! size. Everything else is a single pass with constant state.
//!
//! ```
//! use fuzzy_query::{Stream, parse_query};
//! use serde_json::json;
//!
//! let people = vec![
//!     json!({"name": "Alice", "age": 25}),
//!     json!({"name": "Bob", "age": 30}),
//!     json!({"name": "Eve", "age": 22}),
//! ];
//! let adults = Stream::from_documents(people)
//!     .filter(parse_query("(>= :age 25)").unwrap())
//!     .threshold(0.9);
//! let names: Vec<_> = adults
//!     .collect()
//!     .unwrap()
//!     .into_iter()
//!     .map(|(doc, _)| doc["name"].clone())
//!     .collect();
//! assert_eq!(names, vec![json!("Bob")]);
//! ```

mod set_ops;
mod source;
mod stages;

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    ast::Expr,
    defuzz::{Defuzzifier, defuzzify},
    error::{DomainError, FuzzyError, ParseError},
    evaluator::Evaluator,
    fuzzy_set::FuzzySet,
    membership::Hedge,
    parser::parse_query,
    value::{Value, as_float, canonical_key},
};

pub use source::Source;

/// One element of a pipeline: a document and its membership.
pub type Item = Result<(Value, f64), FuzzyError>;

/// A fresh single-pass traversal.
pub type Pairs<'a> = Box<dyn Iterator<Item = Item> + 'a>;

/// A pipeline node. Implementations keep no iteration state of their own;
/// each `evaluate` call builds a new traversal.
pub trait Stage: Send + Sync {
    fn evaluate(&self) -> Pairs<'_>;

    /// Human-readable pipeline description, source first.
    fn describe(&self) -> String;
}

/// Handle to a pipeline plus the evaluator its filter stages will use.
#[derive(Clone)]
pub struct Stream {
    stage: Arc<dyn Stage>,
    evaluator: Arc<Evaluator>,
}

impl Stream {
    pub fn new(stage: Arc<dyn Stage>) -> Self {
        Stream {
            stage,
            evaluator: Arc::new(Evaluator::default()),
        }
    }

    /// In-memory documents, each starting at membership 1.0.
    pub fn from_documents(documents: Vec<Value>) -> Self {
        Stream::new(Arc::new(Source::Memory(Arc::new(documents))))
    }

    /// Documents that already carry a membership, e.g. the output of an
    /// earlier pipeline. A membership outside [0, 1] (or NaN) is rejected.
    pub fn from_pairs(pairs: Vec<(Value, f64)>) -> Result<Self, DomainError> {
        if let Some(&(_, bad)) = pairs.iter().find(|(_, m)| !(0.0..=1.0).contains(m)) {
            return Err(DomainError::OutOfRange(bad));
        }
        Ok(Stream::new(Arc::new(Source::Weighted(Arc::new(pairs)))))
    }

    /// Newline-delimited JSON text. Blank lines are skipped.
    pub fn from_json_lines(text: impl Into<String>) -> Self {
        Stream::new(Arc::new(Source::JsonLines(Arc::from(text.into()))))
    }

    /// A JSON value: an array yields its elements, anything else itself.
    pub fn from_json(value: Value) -> Self {
        Stream::new(Arc::new(Source::Json(Arc::new(value))))
    }

    /// Documents from a caller-supplied producer, invoked once per traversal.
    pub fn from_producer<F, I>(name: &str, producer: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: Iterator<Item = Value> + 'static,
    {
        Stream::new(Arc::new(Source::producer(name, producer)))
    }

    /// Use `evaluator` for filter and transform stages added from now on.
    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = Arc::new(evaluator);
        self
    }

    fn wrap(&self, stage: impl Stage + 'static) -> Stream {
        Stream {
            stage: Arc::new(stage),
            evaluator: Arc::clone(&self.evaluator),
        }
    }

    /// Keep documents whose running membership AND the query's is above 0.
    pub fn filter(&self, query: Expr) -> Stream {
        self.wrap(stages::Filter::new(
            Arc::clone(&self.stage),
            query,
            Arc::clone(&self.evaluator),
        ))
    }

    /// [`Stream::filter`] with a query string.
    pub fn filter_query(&self, query: &str) -> Result<Stream, ParseError> {
        Ok(self.filter(parse_query(query)?))
    }

    /// Replace each document with a derived value, keeping its membership.
    pub fn transform(&self, expr: Expr) -> Stream {
        self.wrap(stages::Transform::new(
            Arc::clone(&self.stage),
            expr,
            Arc::clone(&self.evaluator),
        ))
    }

    pub fn hedge(&self, hedge: Hedge) -> Stream {
        self.wrap(stages::Modify::hedge(Arc::clone(&self.stage), hedge))
    }

    pub fn very(&self) -> Stream {
        self.hedge(Hedge::Very)
    }

    pub fn somewhat(&self) -> Stream {
        self.hedge(Hedge::Somewhat)
    }

    pub fn slightly(&self) -> Stream {
        self.hedge(Hedge::Slightly)
    }

    pub fn extremely(&self) -> Stream {
        self.hedge(Hedge::Extremely)
    }

    /// `1 - membership` for every pair.
    pub fn complement(&self) -> Stream {
        self.wrap(stages::Modify::complement(Arc::clone(&self.stage)))
    }

    /// Alpha-cut: keep pairs with `membership >= threshold`.
    pub fn threshold(&self, threshold: f64) -> Stream {
        self.wrap(stages::Threshold::new(Arc::clone(&self.stage), threshold))
    }

    /// The `k` highest memberships, ties in input order. Materializes the
    /// upstream.
    pub fn top_k(&self, k: usize) -> Stream {
        self.wrap(stages::TopK::new(Arc::clone(&self.stage), k))
    }

    /// Fuzzy AND by document identity. Materializes `other`.
    pub fn intersect(&self, other: &Stream) -> Stream {
        self.wrap(set_ops::Intersect::new(
            Arc::clone(&self.stage),
            Arc::clone(&other.stage),
        ))
    }

    /// Fuzzy OR by document identity. Materializes both sides.
    pub fn union(&self, other: &Stream) -> Stream {
        self.wrap(set_ops::Union::new(
            Arc::clone(&self.stage),
            Arc::clone(&other.stage),
        ))
    }

    /// A fresh traversal of the pipeline.
    pub fn evaluate(&self) -> Pairs<'_> {
        self.stage.evaluate()
    }

    pub fn describe(&self) -> String {
        self.stage.describe()
    }

    pub fn collect(&self) -> Result<Vec<(Value, f64)>, FuzzyError> {
        self.evaluate().collect()
    }

    /// Final memberships in pipeline order.
    pub fn memberships(&self) -> Result<FuzzySet, FuzzyError> {
        let degrees = self
            .evaluate()
            .map(|item| item.map(|(_, m)| m))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FuzzySet::from_computed(degrees))
    }

    /// Pairs keyed by canonical document JSON; duplicates keep the highest
    /// membership.
    pub fn to_map(&self) -> Result<BTreeMap<String, (Value, f64)>, FuzzyError> {
        let mut map: BTreeMap<String, (Value, f64)> = BTreeMap::new();
        for item in self.evaluate() {
            let (doc, m) = item?;
            let key = canonical_key(&doc);
            match map.get_mut(&key) {
                Some(entry) => entry.1 = entry.1.max(m),
                None => {
                    map.insert(key, (doc, m));
                }
            }
        }
        Ok(map)
    }

    /// Reduce the final memberships to one crisp value.
    pub fn defuzzify(&self, method: Defuzzifier) -> Result<f64, FuzzyError> {
        Ok(defuzzify(&self.memberships()?, method)?)
    }

    /// The pair with the highest membership; the first one on ties.
    pub fn best(&self) -> Result<Option<(Value, f64)>, FuzzyError> {
        let mut best: Option<(Value, f64)> = None;
        for item in self.evaluate() {
            let (doc, m) = item?;
            if best.as_ref().is_none_or(|(_, top)| m > *top) {
                best = Some((doc, m));
            }
        }
        Ok(best)
    }

    /// Membership-weighted mean of the numeric documents, typically after a
    /// `transform` that projects a numeric field. Non-numeric documents are
    /// skipped; `None` when no numeric document carries any weight.
    pub fn weighted_mean(&self) -> Result<Option<f64>, FuzzyError> {
        let mut weighted_sum = 0.0;
        let mut total = 0.0;
        for item in self.evaluate() {
            let (doc, m) = item?;
            if let Some(x) = as_float(&doc) {
                weighted_sum += x * m;
                total += m;
            }
        }
        Ok((total > 0.0).then(|| weighted_sum / total))
    }

    /// The pair whose membership is closest to the average membership; the
    /// first one on ties. Materializes the pipeline.
    pub fn closest_to_mean(&self) -> Result<Option<(Value, f64)>, FuzzyError> {
        let pairs = self.collect()?;
        if pairs.is_empty() {
            return Ok(None);
        }
        let mean = pairs.iter().map(|(_, m)| m).sum::<f64>() / pairs.len() as f64;
        let mut closest: Option<(Value, f64)> = None;
        for (doc, m) in pairs {
            let better = closest
                .as_ref()
                .is_none_or(|(_, top)| (m - mean).abs() < (top - mean).abs());
            if better {
                closest = Some((doc, m));
            }
        }
        Ok(closest)
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("pipeline", &self.describe())
            .finish()
    }
}

/// Defer `build` until the first pull.
pub(crate) fn deferred<'a, F>(build: F) -> Pairs<'a>
where
    F: FnOnce() -> Pairs<'a> + 'a,
{
    Box::new(std::iter::once_with(build).flatten())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn people() -> Vec<Value> {
        vec![
            json!({"name": "Alice", "age": 25, "score": 85}),
            json!({"name": "Bob", "age": 30, "score": 92}),
            json!({"name": "Charlie", "age": 35, "score": 78}),
        ]
    }

    #[test]
    fn composition_does_not_touch_the_source() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulls);
        let stream = Stream::from_producer("counted", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            people().into_iter()
        })
        .filter_query("(> :age 20)")
        .unwrap()
        .top_k(2);
        assert_eq!(pulls.load(Ordering::SeqCst), 0);

        assert_eq!(stream.collect().unwrap().len(), 2);
        assert_eq!(stream.collect().unwrap().len(), 2);
        assert_eq!(pulls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_source_gives_empty_output() {
        let stream = Stream::from_documents(vec![])
            .filter_query("(> :age 20)")
            .unwrap()
            .very()
            .top_k(3);
        assert!(stream.collect().unwrap().is_empty());
    }

    #[test]
    fn top_k_zero_and_threshold_zero() {
        let stream = Stream::from_documents(people());
        assert!(stream.top_k(0).collect().unwrap().is_empty());
        assert_eq!(stream.threshold(0.0).collect().unwrap().len(), 3);
    }

    #[test]
    fn top_k_is_stable() {
        let docs = vec![json!({"v": 0.5}), json!({"v": 0.9}), json!({"v": 0.5})];
        let stream = Stream::from_documents(docs)
            .transform(parse_query(":v").unwrap())
            .filter(Expr::Context)
            .top_k(3);
        let order: Vec<f64> = stream.memberships().unwrap().into_memberships();
        assert_eq!(order, vec![0.9, 0.5, 0.5]);
    }

    #[test]
    fn json_lines_errors_carry_line_numbers() {
        let stream = Stream::from_json_lines("{\"a\": 1}\n\nnot json\n{\"a\": 2}\n");
        let items: Vec<Item> = stream.evaluate().collect();
        assert_eq!(items.len(), 3);
        assert!(matches!(
            &items[1],
            Err(FuzzyError::Stream(StreamError::Json { line: 3, .. }))
        ));
        assert!(stream.collect().is_err());
    }

    #[test]
    fn weighted_source_keeps_memberships() {
        let stream = Stream::from_pairs(vec![(json!({"a": 1}), 0.4), (json!({"a": 2}), 1.0)]).unwrap();
        assert_eq!(stream.memberships().unwrap().into_memberships(), vec![0.4, 1.0]);
        assert_eq!(stream.describe(), "weighted[2]");
        assert!((stream.very().memberships().unwrap()[0] - 0.16).abs() < 1e-12);
    }

    #[test]
    fn weighted_source_rejects_out_of_range_memberships() {
        let err = Stream::from_pairs(vec![(json!({"a": 1}), 1.7), (json!({"a": 2}), -0.4)]).unwrap_err();
        assert_eq!(err, DomainError::OutOfRange(1.7));
        assert_eq!(
            Stream::from_pairs(vec![(json!(1), 0.5), (json!(2), -0.4)]).unwrap_err(),
            DomainError::OutOfRange(-0.4)
        );
        assert!(Stream::from_pairs(vec![(json!(1), f64::NAN)]).is_err());
    }

    #[test]
    fn json_array_source() {
        let stream = Stream::from_json(json!([1, 2, 3]));
        assert_eq!(stream.memberships().unwrap(), FuzzySet::universe(3));
        assert_eq!(Stream::from_json(json!({"a": 1})).collect().unwrap().len(), 1);
    }

    #[test]
    fn hedges_and_complement_touch_membership_only() {
        let stream = Stream::from_json(json!([{"m": 0.5}]))
            .filter(parse_query("(field m $)").unwrap());
        let m = |s: &Stream| s.memberships().unwrap()[0];
        assert!((m(&stream.very()) - 0.25).abs() < 1e-12);
        assert!((m(&stream.somewhat()) - 0.5f64.sqrt()).abs() < 1e-12);
        assert!((m(&stream.complement()) - 0.5).abs() < 1e-12);
        assert_eq!(stream.very().collect().unwrap()[0].0, json!({"m": 0.5}));
    }

    #[test]
    fn best_and_to_map() {
        let stream = Stream::from_documents(people())
            .filter_query("(close-to? :score 90 5.0)")
            .unwrap();
        let (best, _) = stream.best().unwrap().unwrap();
        assert_eq!(best["name"], json!("Bob"));

        let dupes = Stream::from_json(json!([{"a": 1}, {"a": 1}]));
        assert_eq!(dupes.to_map().unwrap().len(), 1);
    }

    #[test]
    fn describe_lists_the_pipeline() {
        let stream = Stream::from_documents(people())
            .filter_query("(>= :age 25)")
            .unwrap()
            .very()
            .threshold(0.5)
            .top_k(2);
        assert_eq!(
            stream.describe(),
            "memory[3] | filter (>= :age 25) | very | threshold 0.5 | top 2"
        );
    }

    #[test]
    fn weighted_mean_of_projected_values() {
        let stream = Stream::from_json(json!([{"p": 10}, {"p": 100}, {"p": 1000}]))
            .filter_query("(> :p 50)")
            .unwrap()
            .transform(parse_query(":p").unwrap());
        assert_eq!(stream.weighted_mean().unwrap(), Some(550.0));

        let weighted = Stream::from_pairs(vec![
            (json!(10), 0.25),
            (json!("skip"), 1.0),
            (json!(20), 0.75),
        ])
        .unwrap();
        assert_eq!(weighted.weighted_mean().unwrap(), Some(17.5));
        assert_eq!(Stream::from_json(json!(["a", "b"])).weighted_mean().unwrap(), None);
        assert_eq!(Stream::from_documents(vec![]).weighted_mean().unwrap(), None);
    }

    #[test]
    fn closest_to_mean_picks_the_typical_pair() {
        let stream = Stream::from_pairs(vec![
            (json!("low"), 0.1),
            (json!("mid"), 0.5),
            (json!("high"), 0.8),
        ])
        .unwrap();
        // mean is 1.4 / 3
        assert_eq!(stream.closest_to_mean().unwrap(), Some((json!("mid"), 0.5)));

        let tied = Stream::from_pairs(vec![(json!(1), 0.25), (json!(2), 0.75)]).unwrap();
        assert_eq!(tied.closest_to_mean().unwrap(), Some((json!(1), 0.25)));
        assert_eq!(Stream::from_documents(vec![]).closest_to_mean().unwrap(), None);
    }
}
