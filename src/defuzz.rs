//! Reducing a membership sequence to one crisp value.
//!
//! Every method works on index positions: the crisp value is a (possibly
//! fractional) index into the sequence the memberships came from.

use std::fmt;
use std::str::FromStr;

use crate::{error::DomainError, error::EvalError, fuzzy_set::FuzzySet};

/// Memberships within this distance of the maximum count as maxima.
pub const MAXIMA_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Defuzzifier {
    #[default]
    Centroid,
    Bisector,
    MeanOfMaxima,
    LargestOfMaxima,
    SmallestOfMaxima,
}

impl Defuzzifier {
    pub const ALL: [Defuzzifier; 5] = [
        Defuzzifier::Centroid,
        Defuzzifier::Bisector,
        Defuzzifier::MeanOfMaxima,
        Defuzzifier::LargestOfMaxima,
        Defuzzifier::SmallestOfMaxima,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Defuzzifier::Centroid => "centroid",
            Defuzzifier::Bisector => "bisector",
            Defuzzifier::MeanOfMaxima => "mom",
            Defuzzifier::LargestOfMaxima => "lom",
            Defuzzifier::SmallestOfMaxima => "som",
        }
    }
}

impl fmt::Display for Defuzzifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Defuzzifier {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "centroid" => Ok(Defuzzifier::Centroid),
            "bisector" => Ok(Defuzzifier::Bisector),
            "mom" | "mean-of-maxima" => Ok(Defuzzifier::MeanOfMaxima),
            "lom" | "largest-of-maxima" => Ok(Defuzzifier::LargestOfMaxima),
            "som" | "smallest-of-maxima" => Ok(Defuzzifier::SmallestOfMaxima),
            other => Err(EvalError::InvalidOperand(format!(
                "unknown defuzzification method '{}'",
                other
            ))),
        }
    }
}

pub fn defuzzify(set: &FuzzySet, method: Defuzzifier) -> Result<f64, DomainError> {
    match method {
        Defuzzifier::Centroid => Ok(centroid(set)),
        Defuzzifier::Bisector => Ok(bisector(set)),
        Defuzzifier::MeanOfMaxima => {
            let maxima = maxima(set, MAXIMA_TOLERANCE)?;
            Ok(maxima.iter().sum::<usize>() as f64 / maxima.len() as f64)
        }
        Defuzzifier::LargestOfMaxima => {
            let maxima = maxima(set, MAXIMA_TOLERANCE)?;
            Ok(maxima.last().copied().unwrap_or_default() as f64)
        }
        Defuzzifier::SmallestOfMaxima => {
            let maxima = maxima(set, MAXIMA_TOLERANCE)?;
            Ok(maxima.first().copied().unwrap_or_default() as f64)
        }
    }
}

/// Index-weighted center of mass; 0.0 when the total mass is zero.
pub fn centroid(set: &FuzzySet) -> f64 {
    let total = set.cardinality();
    if total == 0.0 {
        return 0.0;
    }
    let moment: f64 = set.iter().enumerate().map(|(i, m)| i as f64 * m).sum();
    moment / total
}

/// Smallest index at which the running mass reaches half the total.
pub fn bisector(set: &FuzzySet) -> f64 {
    let half = set.cardinality() / 2.0;
    if half == 0.0 {
        return 0.0;
    }
    let mut running = 0.0;
    for (i, m) in set.iter().enumerate() {
        running += m;
        if running >= half {
            return i as f64;
        }
    }
    // Float drift can leave the running sum a hair short of `half`.
    set.len().saturating_sub(1) as f64
}

/// Ascending indices whose membership is within `tolerance` of the maximum.
pub fn maxima(set: &FuzzySet, tolerance: f64) -> Result<Vec<usize>, DomainError> {
    let max = set.iter().reduce(f64::max).ok_or(DomainError::Empty)?;
    Ok(set
        .iter()
        .enumerate()
        .filter(|(_, m)| max - m <= tolerance)
        .map(|(i, _)| i)
        .collect())
}

/// Map every membership to a label independently.
pub fn linguistic<L>(set: &FuzzySet, label: impl FnMut(f64) -> L) -> Vec<L> {
    set.iter().map(label).collect()
}
