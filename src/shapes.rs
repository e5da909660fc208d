//! Membership-function shapes and the smooth comparison curves built on them.

use crate::membership::clamp;

/// Parametric membership functions over the real line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Triangular: (left, peak, right)
    Triangular(f64, f64, f64),
    /// Trapezoidal: (left, left_top, right_top, right)
    Trapezoidal(f64, f64, f64, f64),
    /// Gaussian: (mean, sigma)
    Gaussian(f64, f64),
    /// Logistic: (center, slope)
    Sigmoid(f64, f64),
    /// Generalized bell: (center, width, slope)
    Bell(f64, f64, f64),
}

impl Shape {
    pub fn eval(&self, x: f64) -> f64 {
        let y = match *self {
            Shape::Triangular(a, b, c) => {
                if x <= a || x >= c {
                    if x == b { 1.0 } else { 0.0 }
                } else if x <= b {
                    (x - a) / (b - a)
                } else {
                    (c - x) / (c - b)
                }
            }
            Shape::Trapezoidal(a, b, c, d) => {
                if x >= b && x <= c {
                    1.0
                } else if x <= a || x >= d {
                    0.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (d - x) / (d - c)
                }
            }
            Shape::Gaussian(mean, sigma) => {
                if sigma <= 0.0 {
                    if x == mean { 1.0 } else { 0.0 }
                } else {
                    (-(x - mean).powi(2) / (2.0 * sigma * sigma)).exp()
                }
            }
            Shape::Sigmoid(c, a) => 1.0 / (1.0 + (-a * (x - c)).exp()),
            Shape::Bell(c, a, b) => {
                if a == 0.0 {
                    if x == c { 1.0 } else { 0.0 }
                } else {
                    1.0 / (1.0 + ((x - c) / a).abs().powf(2.0 * b))
                }
            }
        };
        clamp(y)
    }
}

/// Rescale so that values within `cutoff` of either end snap to exactly 0 or 1.
/// Fixed points: 0.5 stays 0.5 and 1.0 stays 1.0.
fn trim(y: f64, cutoff: f64) -> f64 {
    if cutoff <= 0.0 {
        return clamp(y);
    }
    clamp((y - cutoff) / (1.0 - 2.0 * cutoff))
}

/// Width of the comparison transition for two magnitudes.
pub fn comparison_scale(a: f64, b: f64, tolerance: f64) -> f64 {
    tolerance.max(f64::MIN_POSITIVE) * a.abs().max(b.abs()).max(1.0)
}

/// Degree to which `a` equals `b`: a gaussian in the difference, exactly 1.0
/// at zero difference and exactly 0.0 far away.
pub fn fuzzy_eq(a: f64, b: f64, tolerance: f64, cutoff: f64) -> f64 {
    if a == b {
        return 1.0;
    }
    let sigma = comparison_scale(a, b, tolerance);
    let g = Shape::Gaussian(b, sigma).eval(a);
    // Only the lower tail is trimmed; the peak stays at 1.0.
    if cutoff <= 0.0 {
        g
    } else {
        clamp((g - cutoff) / (1.0 - cutoff))
    }
}

/// Degree to which `a > b`: a logistic in the signed difference, exactly 0.5
/// at the boundary.
pub fn fuzzy_gt(a: f64, b: f64, tolerance: f64, cutoff: f64) -> f64 {
    if a == b {
        return 0.5;
    }
    let scale = comparison_scale(a, b, tolerance);
    trim(Shape::Sigmoid(b, 1.0 / scale).eval(a), cutoff)
}

/// Degree to which `a < b`.
pub fn fuzzy_lt(a: f64, b: f64, tolerance: f64, cutoff: f64) -> f64 {
    fuzzy_gt(b, a, tolerance, cutoff)
}

/// Degree to which `x` lies in `[low, high]`, with shoulders one
/// comparison-scale wide on each side.
pub fn fuzzy_between(x: f64, low: f64, high: f64, tolerance: f64) -> f64 {
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    let left = comparison_scale(x, low, tolerance);
    let right = comparison_scale(x, high, tolerance);
    Shape::Trapezoidal(low - left, low, high, high + right).eval(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 0.01;
    const CUT: f64 = 1e-3;

    #[test]
    fn triangular_and_trapezoidal() {
        let tri = Shape::Triangular(0.0, 5.0, 10.0);
        assert_eq!(tri.eval(5.0), 1.0);
        assert_eq!(tri.eval(2.5), 0.5);
        assert_eq!(tri.eval(10.0), 0.0);

        let trap = Shape::Trapezoidal(0.0, 2.0, 4.0, 6.0);
        assert_eq!(trap.eval(3.0), 1.0);
        assert_eq!(trap.eval(1.0), 0.5);
        assert_eq!(trap.eval(7.0), 0.0);
    }

    #[test]
    fn gaussian_and_bell_peak_at_center() {
        assert_eq!(Shape::Gaussian(5.0, 1.0).eval(5.0), 1.0);
        assert!(Shape::Gaussian(5.0, 1.0).eval(6.0) < 1.0);
        assert_eq!(Shape::Bell(0.0, 1.0, 2.0).eval(0.0), 1.0);
        assert_eq!(Shape::Bell(0.0, 1.0, 2.0).eval(1.0), 0.5);
    }

    #[test]
    fn equality_is_one_at_zero_difference() {
        assert_eq!(fuzzy_eq(42.0, 42.0, TOL, CUT), 1.0);
        let near = fuzzy_eq(100.0, 100.5, TOL, CUT);
        assert!(near > 0.0 && near < 1.0);
        assert_eq!(fuzzy_eq(100.0, 200.0, TOL, CUT), 0.0);
    }

    #[test]
    fn ordering_is_half_at_boundary_and_monotonic() {
        assert_eq!(fuzzy_gt(80.0, 80.0, TOL, CUT), 0.5);
        assert_eq!(fuzzy_lt(80.0, 80.0, TOL, CUT), 0.5);
        let mut prev = 0.0;
        for i in 0..200 {
            let a = 70.0 + i as f64 * 0.1;
            let y = fuzzy_gt(a, 80.0, TOL, CUT);
            assert!(y >= prev);
            prev = y;
        }
        assert_eq!(fuzzy_gt(70.0, 80.0, TOL, CUT), 0.0);
        assert_eq!(fuzzy_gt(90.0, 80.0, TOL, CUT), 1.0);
    }

    #[test]
    fn near_misses_get_partial_credit() {
        let y = fuzzy_gt(85.0, 80.0, TOL, CUT);
        assert!(y > 0.99 && y < 1.0, "got {}", y);
        let z = fuzzy_gt(79.5, 80.0, TOL, CUT);
        assert!(z > 0.0 && z < 0.5, "got {}", z);
    }

    #[test]
    fn between_has_soft_shoulders() {
        assert_eq!(fuzzy_between(5.0, 0.0, 10.0, TOL), 1.0);
        assert_eq!(fuzzy_between(20.0, 0.0, 10.0, TOL), 0.0);
        let edge = fuzzy_between(10.05, 0.0, 10.0, TOL);
        assert!(edge > 0.0 && edge < 1.0);
    }
}
