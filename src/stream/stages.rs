use std::sync::Arc;

use tracing::{debug, trace};

use super::{Pairs, Stage, deferred};
use crate::{
    ast::Expr,
    error::FuzzyError,
    evaluator::Evaluator,
    membership::{self, Hedge},
    path::FieldPath,
    value::{Value, from_membership},
};

pub(crate) struct Filter {
    upstream: Arc<dyn Stage>,
    query: Expr,
    evaluator: Arc<Evaluator>,
}

impl Filter {
    pub(crate) fn new(upstream: Arc<dyn Stage>, query: Expr, evaluator: Arc<Evaluator>) -> Self {
        Filter {
            upstream,
            query,
            evaluator,
        }
    }
}

impl Stage for Filter {
    fn evaluate(&self) -> Pairs<'_> {
        Box::new(self.upstream.evaluate().filter_map(move |item| {
            let (doc, upstream) = match item {
                Ok(pair) => pair,
                Err(e) => return Some(Err(e)),
            };
            let m = membership::and(upstream, self.evaluator.evaluate_lenient(&self.query, &doc));
            trace!(membership = m, "filter");
            (m > 0.0).then_some(Ok((doc, m)))
        }))
    }

    fn describe(&self) -> String {
        format!("{} | filter {}", self.upstream.describe(), self.query)
    }
}

pub(crate) struct Transform {
    upstream: Arc<dyn Stage>,
    expr: Expr,
    evaluator: Arc<Evaluator>,
}

impl Transform {
    pub(crate) fn new(upstream: Arc<dyn Stage>, expr: Expr, evaluator: Arc<Evaluator>) -> Self {
        Transform {
            upstream,
            expr,
            evaluator,
        }
    }

    /// Field references yield their first resolved value (null if none),
    /// `$` the document itself, lists their membership, literals themselves.
    fn derive(&self, doc: Value) -> Value {
        match &self.expr {
            Expr::Field(field) => FieldPath::parse(&field.path)
                .ok()
                .and_then(|path| path.resolve(&doc).first().map(|v| (*v).clone()))
                .unwrap_or(Value::Null),
            Expr::Context => doc,
            Expr::List(_) => from_membership(self.evaluator.evaluate_lenient(&self.expr, &doc)),
            literal => literal.to_json(),
        }
    }
}

impl Stage for Transform {
    fn evaluate(&self) -> Pairs<'_> {
        Box::new(
            self.upstream
                .evaluate()
                .map(move |item| item.map(|(doc, m)| (self.derive(doc), m))),
        )
    }

    fn describe(&self) -> String {
        format!("{} | map {}", self.upstream.describe(), self.expr)
    }
}

#[derive(Debug, Clone, Copy)]
enum Modifier {
    Hedge(Hedge),
    Complement,
}

impl Modifier {
    fn apply(self, m: f64) -> f64 {
        match self {
            Modifier::Hedge(hedge) => hedge.apply(m),
            Modifier::Complement => membership::not(m),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Modifier::Hedge(hedge) => hedge.name(),
            Modifier::Complement => "not",
        }
    }
}

/// Membership-only rewrite; documents pass through untouched.
pub(crate) struct Modify {
    upstream: Arc<dyn Stage>,
    modifier: Modifier,
}

impl Modify {
    pub(crate) fn hedge(upstream: Arc<dyn Stage>, hedge: Hedge) -> Self {
        Modify {
            upstream,
            modifier: Modifier::Hedge(hedge),
        }
    }

    pub(crate) fn complement(upstream: Arc<dyn Stage>) -> Self {
        Modify {
            upstream,
            modifier: Modifier::Complement,
        }
    }
}

impl Stage for Modify {
    fn evaluate(&self) -> Pairs<'_> {
        let modifier = self.modifier;
        Box::new(
            self.upstream
                .evaluate()
                .map(move |item| item.map(|(doc, m)| (doc, membership::clamp(modifier.apply(m))))),
        )
    }

    fn describe(&self) -> String {
        format!("{} | {}", self.upstream.describe(), self.modifier.name())
    }
}

pub(crate) struct Threshold {
    upstream: Arc<dyn Stage>,
    threshold: f64,
}

impl Threshold {
    pub(crate) fn new(upstream: Arc<dyn Stage>, threshold: f64) -> Self {
        Threshold {
            upstream,
            threshold,
        }
    }
}

impl Stage for Threshold {
    fn evaluate(&self) -> Pairs<'_> {
        Box::new(self.upstream.evaluate().filter(move |item| match item {
            Ok((_, m)) => *m >= self.threshold,
            Err(_) => true,
        }))
    }

    fn describe(&self) -> String {
        format!("{} | threshold {}", self.upstream.describe(), self.threshold)
    }
}

pub(crate) struct TopK {
    upstream: Arc<dyn Stage>,
    k: usize,
}

impl TopK {
    pub(crate) fn new(upstream: Arc<dyn Stage>, k: usize) -> Self {
        TopK { upstream, k }
    }

    fn materialize(&self) -> Pairs<'_> {
        let mut pairs = match self.upstream.evaluate().collect::<Result<Vec<_>, _>>() {
            Ok(pairs) => pairs,
            Err(e) => return Box::new(std::iter::once(Err(e))),
        };
        debug!(materialized = pairs.len(), k = self.k, "top-k");
        // Stable sort keeps input order among equal memberships.
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        pairs.truncate(self.k);
        Box::new(pairs.into_iter().map(Ok::<_, FuzzyError>))
    }
}

impl Stage for TopK {
    fn evaluate(&self) -> Pairs<'_> {
        if self.k == 0 {
            return Box::new(std::iter::empty());
        }
        deferred(move || self.materialize())
    }

    fn describe(&self) -> String {
        format!("{} | top {}", self.upstream.describe(), self.k)
    }
}
