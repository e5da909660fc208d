//! Index selection over a membership sequence: ranking, nucleus (top-p)
//! selection and weighted random sampling.
//!
//! All functions return indices into the set. Randomized functions take the
//! generator as an argument so callers (and tests) control seeding.

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::{error::DomainError, fuzzy_set::FuzzySet};

/// Indices in descending membership order; ties keep their original order.
fn ranked(set: &FuzzySet) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..set.len()).collect();
    indices.sort_by(|&a, &b| set[b].total_cmp(&set[a]));
    indices
}

/// The `k` highest-membership indices.
pub fn top_k(set: &FuzzySet, k: usize) -> Vec<usize> {
    let mut indices = ranked(set);
    indices.truncate(k);
    indices
}

/// Smallest non-empty prefix of the ranking whose share of the total mass
/// reaches `p`. The top index is always included, so `p == 0` yields it alone.
pub fn top_p(set: &FuzzySet, p: f64) -> Result<Vec<usize>, DomainError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(DomainError::InvalidProbability(p));
    }
    let total = set.cardinality();
    if total == 0.0 {
        return Ok(Vec::new());
    }

    // Relative slack so float drift in the running sum cannot overshoot p = 1.
    let target = p * total * (1.0 - 1e-9);
    let mut covered = 0.0;
    let mut selected = Vec::new();
    for i in ranked(set) {
        covered += set[i];
        selected.push(i);
        if covered >= target {
            break;
        }
    }
    Ok(selected)
}

/// Memberships scaled to sum to 1.
pub fn to_probability_distribution(set: &FuzzySet) -> Result<Vec<f64>, DomainError> {
    let total = set.cardinality();
    if total == 0.0 {
        return Err(DomainError::ZeroMass);
    }
    Ok(set.iter().map(|m| m / total).collect())
}

/// Draw `n` indices with probability proportional to membership.
pub fn sample<R: Rng + ?Sized>(
    set: &FuzzySet,
    n: usize,
    with_replacement: bool,
    rng: &mut R,
) -> Result<Vec<usize>, DomainError> {
    if with_replacement {
        if n == 0 {
            return Err(DomainError::InvalidSampleSize {
                requested: n,
                population: set.len(),
            });
        }
        if set.cardinality() == 0.0 {
            return Err(DomainError::ZeroMass);
        }
        let dist = WeightedIndex::new(set.memberships()).map_err(|_| DomainError::ZeroMass)?;
        Ok((0..n).map(|_| dist.sample(rng)).collect())
    } else {
        weighted_sample_without_replacement(set.memberships(), n, rng)
    }
}

/// Repeatedly draw one remaining index weighted by its mass and remove it.
/// Once only zero-weight indices remain they are drawn uniformly.
pub fn weighted_sample_without_replacement<R: Rng + ?Sized>(
    weights: &[f64],
    n: usize,
    rng: &mut R,
) -> Result<Vec<usize>, DomainError> {
    if n == 0 || n > weights.len() {
        return Err(DomainError::InvalidSampleSize {
            requested: n,
            population: weights.len(),
        });
    }
    if let Some(bad) = weights.iter().copied().find(|w| !(*w >= 0.0) || w.is_infinite()) {
        return Err(DomainError::OutOfRange(bad));
    }
    if weights.iter().sum::<f64>() == 0.0 {
        return Err(DomainError::ZeroMass);
    }

    let mut remaining: Vec<(usize, f64)> = weights.iter().copied().enumerate().collect();
    let mut picked = Vec::with_capacity(n);
    for _ in 0..n {
        let mass: f64 = remaining.iter().map(|(_, w)| w).sum();
        let slot = if mass > 0.0 {
            pick_weighted(&remaining, mass, rng)
        } else {
            rng.gen_range(0..remaining.len())
        };
        picked.push(remaining.remove(slot).0);
    }
    Ok(picked)
}

fn pick_weighted<R: Rng + ?Sized>(remaining: &[(usize, f64)], mass: f64, rng: &mut R) -> usize {
    let target = rng.gen_range(0.0..mass);
    let mut running = 0.0;
    let mut last_positive = 0;
    for (slot, (_, w)) in remaining.iter().enumerate() {
        if *w > 0.0 {
            last_positive = slot;
        }
        running += w;
        if running > target {
            return slot;
        }
    }
    last_positive
}
