//! Fixed-length membership sequences with fuzzy set algebra.
//!
//! A [`FuzzySet`] holds one degree per document of the batch that produced
//! it. Construction validates the [0, 1] invariant; binary operations require
//! equal lengths and report a [`DomainError`] otherwise, so the operator
//! impls return `Result`.
//!
//! ```
//! use fuzzy_query::FuzzySet;
//!
//! let a = FuzzySet::new(vec![0.2, 0.8]).unwrap();
//! let b = FuzzySet::new(vec![0.5, 0.5]).unwrap();
//! assert_eq!((&a & &b).unwrap().memberships(), &[0.2, 0.5]);
//! assert_eq!((&a | &b).unwrap().memberships(), &[0.5, 0.8]);
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Index, Not, Sub};

use crate::{
    error::DomainError,
    membership::{self, Hedge, clamp},
};

/// Pointwise equality tolerance.
pub const EQ_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Default)]
pub struct FuzzySet {
    memberships: Vec<f64>,
}

impl FuzzySet {
    /// Build a set, rejecting any degree outside [0, 1] (including NaN).
    pub fn new(memberships: Vec<f64>) -> Result<Self, DomainError> {
        if let Some(bad) = memberships
            .iter()
            .copied()
            .find(|m| !(0.0..=1.0).contains(m))
        {
            return Err(DomainError::OutOfRange(bad));
        }
        Ok(FuzzySet { memberships })
    }

    /// Build from computed degrees, clamping each into [0, 1].
    pub(crate) fn from_computed(memberships: Vec<f64>) -> Self {
        FuzzySet {
            memberships: memberships.into_iter().map(clamp).collect(),
        }
    }

    /// All-1.0 set of length `n`.
    pub fn universe(n: usize) -> Self {
        FuzzySet {
            memberships: vec![1.0; n],
        }
    }

    /// All-0.0 set of length `n`.
    pub fn empty(n: usize) -> Self {
        FuzzySet {
            memberships: vec![0.0; n],
        }
    }

    pub fn memberships(&self) -> &[f64] {
        &self.memberships
    }

    pub fn into_memberships(self) -> Vec<f64> {
        self.memberships
    }

    pub fn len(&self) -> usize {
        self.memberships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memberships.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.memberships.get(index).copied()
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, f64>> {
        self.memberships.iter().copied()
    }

    /// Sum of memberships (sigma-count).
    pub fn cardinality(&self) -> f64 {
        self.memberships.iter().sum()
    }

    /// Indices with non-zero membership.
    pub fn support(&self) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_, m)| *m > 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    fn zip_with(
        &self,
        other: &FuzzySet,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<FuzzySet, DomainError> {
        if self.len() != other.len() {
            return Err(DomainError::LengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(FuzzySet::from_computed(
            self.iter().zip(other.iter()).map(|(a, b)| f(a, b)).collect(),
        ))
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> FuzzySet {
        FuzzySet::from_computed(self.iter().map(f).collect())
    }

    /// Pointwise minimum.
    pub fn intersection(&self, other: &FuzzySet) -> Result<FuzzySet, DomainError> {
        self.zip_with(other, membership::and)
    }

    /// Pointwise maximum.
    pub fn union(&self, other: &FuzzySet) -> Result<FuzzySet, DomainError> {
        self.zip_with(other, membership::or)
    }

    /// Pointwise `1 - m`.
    pub fn complement(&self) -> FuzzySet {
        self.map(membership::not)
    }

    /// `self & !other`
    pub fn difference(&self, other: &FuzzySet) -> Result<FuzzySet, DomainError> {
        self.intersection(&other.complement())
    }

    /// `(self & !other) | (!self & other)`
    pub fn symmetric_difference(&self, other: &FuzzySet) -> Result<FuzzySet, DomainError> {
        self.difference(other)?.union(&other.difference(self)?)
    }

    pub fn hedge(&self, hedge: Hedge) -> FuzzySet {
        self.map(|m| hedge.apply(m))
    }

    /// Raise every membership to `n`.
    pub fn power(&self, n: f64) -> FuzzySet {
        self.map(|m| m.powf(n))
    }

    /// Alpha-cut: memberships below `threshold` become 0.
    pub fn alpha_cut(&self, threshold: f64) -> FuzzySet {
        self.map(|m| if m >= threshold { m } else { 0.0 })
    }

    /// Crisp truth values: 1.0 at or above `threshold`, else 0.0.
    pub fn truth(&self, threshold: f64) -> FuzzySet {
        self.map(|m| if m >= threshold { 1.0 } else { 0.0 })
    }
}

impl PartialEq for FuzzySet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| (a - b).abs() < EQ_TOLERANCE)
    }
}

impl fmt::Display for FuzzySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len() > 6 {
            write!(f, "FuzzySet({:?}...)", &self.memberships[..6])
        } else {
            write!(f, "FuzzySet({:?})", self.memberships)
        }
    }
}

impl Index<usize> for FuzzySet {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.memberships[index]
    }
}

impl TryFrom<Vec<f64>> for FuzzySet {
    type Error = DomainError;

    fn try_from(memberships: Vec<f64>) -> Result<Self, Self::Error> {
        FuzzySet::new(memberships)
    }
}

impl<'a> IntoIterator for &'a FuzzySet {
    type Item = f64;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl BitAnd for &FuzzySet {
    type Output = Result<FuzzySet, DomainError>;

    fn bitand(self, rhs: &FuzzySet) -> Self::Output {
        self.intersection(rhs)
    }
}

impl BitOr for &FuzzySet {
    type Output = Result<FuzzySet, DomainError>;

    fn bitor(self, rhs: &FuzzySet) -> Self::Output {
        self.union(rhs)
    }
}

impl BitXor for &FuzzySet {
    type Output = Result<FuzzySet, DomainError>;

    fn bitxor(self, rhs: &FuzzySet) -> Self::Output {
        self.symmetric_difference(rhs)
    }
}

impl Sub for &FuzzySet {
    type Output = Result<FuzzySet, DomainError>;

    fn sub(self, rhs: &FuzzySet) -> Self::Output {
        self.difference(rhs)
    }
}

impl Not for &FuzzySet {
    type Output = FuzzySet;

    fn not(self) -> FuzzySet {
        self.complement()
    }
}
