//! Membership algebra over degrees in [0, 1].
//!
//! `and` is the minimum t-norm, `or` the maximum t-conorm and `not` the
//! standard complement. Hedges are power functions whose results are clamped
//! back into the unit interval.

use std::fmt;
use std::str::FromStr;

use crate::error::EvalError;

/// Clamp a computed degree into [0, 1]. NaN maps to 0.
pub fn clamp(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Fuzzy AND (minimum t-norm)
pub fn and(a: f64, b: f64) -> f64 {
    a.min(b)
}

/// Fuzzy OR (maximum t-conorm)
pub fn or(a: f64, b: f64) -> f64 {
    a.max(b)
}

/// Fuzzy NOT (standard complement)
pub fn not(a: f64) -> f64 {
    clamp(1.0 - a)
}

/// n-ary AND. The empty conjunction is vacuously true.
pub fn and_all<I: IntoIterator<Item = f64>>(degrees: I) -> f64 {
    degrees.into_iter().fold(1.0, and)
}

/// n-ary OR. The empty disjunction is false.
pub fn or_all<I: IntoIterator<Item = f64>>(degrees: I) -> f64 {
    degrees.into_iter().fold(0.0, or)
}

/// Linguistic hedges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hedge {
    /// Identity
    Same,
    /// Concentration, `x^2`
    Very,
    /// Dilation, `x^0.5`
    Somewhat,
    /// Strong dilation, `x^0.1`
    Slightly,
    /// Strong concentration, `x^3`
    Extremely,
}

impl Hedge {
    pub const ALL: [Hedge; 5] = [
        Hedge::Same,
        Hedge::Very,
        Hedge::Somewhat,
        Hedge::Slightly,
        Hedge::Extremely,
    ];

    pub fn exponent(self) -> f64 {
        match self {
            Hedge::Same => 1.0,
            Hedge::Very => 2.0,
            Hedge::Somewhat => 0.5,
            Hedge::Slightly => 0.1,
            Hedge::Extremely => 3.0,
        }
    }

    pub fn apply(self, x: f64) -> f64 {
        clamp(clamp(x).powf(self.exponent()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Hedge::Same => "same",
            Hedge::Very => "very",
            Hedge::Somewhat => "somewhat",
            Hedge::Slightly => "slightly",
            Hedge::Extremely => "extremely",
        }
    }

    /// Case-insensitive lookup by operator name.
    pub fn from_name(name: &str) -> Option<Hedge> {
        Hedge::ALL
            .into_iter()
            .find(|h| h.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Hedge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Quantifiers combining the degrees of several matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quantifier {
    /// Universal, minimum
    All,
    /// Existential, maximum
    #[default]
    Any,
    /// Negated existential, `1 - max`
    None,
}

impl Quantifier {
    /// Combine degrees. `all([])` is vacuously 1.0, `any([])` is 0.0 and
    /// `none([])` is 1.0.
    pub fn apply<I: IntoIterator<Item = f64>>(self, degrees: I) -> f64 {
        match self {
            Quantifier::All => and_all(degrees),
            Quantifier::Any => or_all(degrees),
            Quantifier::None => not(or_all(degrees)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quantifier::All => "all",
            Quantifier::Any => "any",
            Quantifier::None => "none",
        }
    }

    pub fn from_name(name: &str) -> Option<Quantifier> {
        match name.to_ascii_lowercase().as_str() {
            "all" => Some(Quantifier::All),
            "any" => Some(Quantifier::Any),
            "none" => Some(Quantifier::None),
            _ => None,
        }
    }
}

impl FromStr for Quantifier {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantifier::from_name(s).ok_or_else(|| EvalError::InvalidQuantifier(s.to_string()))
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reductions_use_identities() {
        assert_eq!(and_all([]), 1.0);
        assert_eq!(or_all([]), 0.0);
        assert_eq!(Quantifier::All.apply([]), 1.0);
        assert_eq!(Quantifier::Any.apply([]), 0.0);
        assert_eq!(Quantifier::None.apply([]), 1.0);
    }

    #[test]
    fn quantifiers_reduce() {
        let d = [0.2, 0.9, 0.5];
        assert_eq!(Quantifier::All.apply(d), 0.2);
        assert_eq!(Quantifier::Any.apply(d), 0.9);
        assert!((Quantifier::None.apply(d) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn hedges_contract_and_dilate() {
        let x = 0.64;
        assert!((Hedge::Very.apply(x) - 0.4096).abs() < 1e-12);
        assert!((Hedge::Somewhat.apply(x) - 0.8).abs() < 1e-12);
        assert!(Hedge::Extremely.apply(x) < Hedge::Very.apply(x));
        assert!(Hedge::Slightly.apply(x) > Hedge::Somewhat.apply(x));
        assert_eq!(Hedge::Same.apply(x), x);
        for h in Hedge::ALL {
            assert_eq!(h.apply(0.0), 0.0);
            assert_eq!(h.apply(1.0), 1.0);
        }
    }

    #[test]
    fn hedges_are_monotonic() {
        for h in Hedge::ALL {
            let mut prev = 0.0;
            for i in 0..=100 {
                let y = h.apply(i as f64 / 100.0);
                assert!(y >= prev, "{} not monotonic at {}", h, i);
                prev = y;
            }
        }
    }

    #[test]
    fn clamp_handles_out_of_range_and_nan() {
        assert_eq!(clamp(1.5), 1.0);
        assert_eq!(clamp(-0.5), 0.0);
        assert_eq!(clamp(f64::NAN), 0.0);
        assert_eq!(not(0.25), 0.75);
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(Hedge::from_name("VERY"), Some(Hedge::Very));
        assert_eq!(Hedge::from_name("kinda"), None);
        assert_eq!("All".parse::<Quantifier>(), Ok(Quantifier::All));
        assert!(matches!(
            "most".parse::<Quantifier>(),
            Err(EvalError::InvalidQuantifier(_))
        ));
    }
}
