use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
};

use tracing::debug;

use super::{Pairs, Stage, deferred};
use crate::{
    error::FuzzyError,
    membership,
    value::{Value, canonical_key},
};

/// Emits receiver pairs whose document also appears on the other side,
/// with `min` of the two memberships. Other-side duplicates contribute their
/// highest membership.
pub(crate) struct Intersect {
    receiver: Arc<dyn Stage>,
    other: Arc<dyn Stage>,
}

impl Intersect {
    pub(crate) fn new(receiver: Arc<dyn Stage>, other: Arc<dyn Stage>) -> Self {
        Intersect { receiver, other }
    }

    fn materialize(&self) -> Pairs<'_> {
        let mut other: HashMap<String, f64> = HashMap::new();
        for item in self.other.evaluate() {
            match item {
                Ok((doc, m)) => {
                    let slot = other.entry(canonical_key(&doc)).or_insert(m);
                    *slot = slot.max(m);
                }
                Err(e) => return Box::new(std::iter::once(Err(e))),
            }
        }
        debug!(keys = other.len(), "intersect materialized other side");

        Box::new(self.receiver.evaluate().filter_map(move |item| match item {
            Ok((doc, m)) => other
                .get(&canonical_key(&doc))
                .map(|&o| Ok((doc, membership::and(m, o)))),
            Err(e) => Some(Err(e)),
        }))
    }
}

impl Stage for Intersect {
    fn evaluate(&self) -> Pairs<'_> {
        deferred(move || self.materialize())
    }

    fn describe(&self) -> String {
        format!(
            "({}) & ({})",
            self.receiver.describe(),
            self.other.describe()
        )
    }
}

/// Every distinct document from either side exactly once, receiver order
/// first, with the highest membership seen anywhere.
pub(crate) struct Union {
    receiver: Arc<dyn Stage>,
    other: Arc<dyn Stage>,
}

impl Union {
    pub(crate) fn new(receiver: Arc<dyn Stage>, other: Arc<dyn Stage>) -> Self {
        Union { receiver, other }
    }

    fn materialize(&self) -> Pairs<'_> {
        let mut table: Vec<(Value, f64)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for side in [&self.receiver, &self.other] {
            for item in side.evaluate() {
                let (doc, m) = match item {
                    Ok(pair) => pair,
                    Err(e) => return Box::new(std::iter::once(Err(e))),
                };
                match index.entry(canonical_key(&doc)) {
                    Entry::Occupied(slot) => {
                        let entry = &mut table[*slot.get()];
                        entry.1 = membership::or(entry.1, m);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(table.len());
                        table.push((doc, m));
                    }
                }
            }
        }
        debug!(keys = table.len(), "union materialized both sides");

        Box::new(table.into_iter().map(Ok::<_, FuzzyError>))
    }
}

impl Stage for Union {
    fn evaluate(&self) -> Pairs<'_> {
        deferred(move || self.materialize())
    }

    fn describe(&self) -> String {
        format!(
            "({}) | ({})",
            self.receiver.describe(),
            self.other.describe()
        )
    }
}
