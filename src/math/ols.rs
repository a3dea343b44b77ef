//! Ordinary least squares for a straight line.
//!
//! We repeatedly solve tiny regression problems of the form:
//!
//! ```text
//! minimize Σ (y_i - (a·x_i + b))^2
//! ```
//!
//! The normal equations are solved in closed form from the four running sums.
//! The denominator `n·Σx² - (Σx)²` is checked explicitly so callers get `None`
//! instead of a blown-up slope when every `x` is (almost) the same.

use nalgebra::DVector;

/// Denominators below this magnitude are treated as singular.
pub const SINGULAR_EPS: f64 = 1e-9;

/// Fitted line `y = slope·x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

/// Fit a line through `(x_i, y_i)`.
///
/// Returns `None` for mismatched or empty inputs and for a degenerate design.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LineFit> {
    if x.len() != y.len() || x.is_empty() {
        return None;
    }

    let xs = DVector::from_column_slice(x);
    let ys = DVector::from_column_slice(y);
    let n = x.len() as f64;

    let sum_x = xs.sum();
    let sum_y = ys.sum();
    let sum_xy = xs.dot(&ys);
    let sum_x2 = xs.dot(&xs);

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom.abs() < SINGULAR_EPS {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    if !(slope.is_finite() && intercept.is_finite()) {
        return None;
    }
    Some(LineFit { slope, intercept })
}
