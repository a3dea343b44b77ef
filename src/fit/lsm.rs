//! Least-squares identification via logarithmic linearization.
//!
//! After the dead time a first-order response satisfies
//!
//! ```text
//! t - step_time = tau · (-ln(1 - v)) + theta,   v = (y - y0) / (y_final - y0)
//! ```
//!
//! which is a straight line in `x = -ln(1 - v)`. Only the central part of the
//! response (`0.1 < v < 0.9`) is regressed: the ends are dominated by noise and
//! by the uncertainty in `y0` / `y_final`.

use log::debug;

use crate::domain::{FopdtParams, SeriesView, StepContext};
use crate::math::linear_regression;

const MIN_DELTA: f64 = 1e-9;

/// Normalized-response window used for the regression (exclusive bounds).
pub const LSM_WINDOW: (f64, f64) = (0.1, 0.9);

/// Identify FOPDT parameters by regressing the linearized response.
///
/// Returns gain-only parameters when fewer than two points fall in the window
/// or the regression is singular. Negative estimates are clamped to zero.
pub fn identify_lsm(samples: SeriesView<'_>, step: &StepContext) -> FopdtParams {
    if step.delta_duty.abs() < MIN_DELTA {
        return FopdtParams::zero();
    }
    let change = step.y_final - step.y0;
    let k = change / step.delta_duty;

    let (xs, ys) = linearized_points(samples, step);
    debug!("lsm: {} regression points", xs.len());
    if xs.len() < 2 {
        return FopdtParams::gain_only(k);
    }

    let Some(line) = linear_regression(&xs, &ys) else {
        debug!("lsm: regression is singular");
        return FopdtParams::gain_only(k);
    };

    FopdtParams {
        k,
        tau: line.slope.max(0.0),
        theta: line.intercept.max(0.0),
    }
}

/// `(x, y)` pairs of the linearized response after the step.
fn linearized_points(samples: SeriesView<'_>, step: &StepContext) -> (Vec<f64>, Vec<f64>) {
    let change = step.y_final - step.y0;
    let (lo, hi) = LSM_WINDOW;

    samples
        .iter()
        .filter(|&(t, _)| t > step.step_time)
        .filter_map(|(t, y)| {
            let v = (y - step.y0) / change;
            if !(v > lo && v < hi) {
                return None;
            }
            let remaining = 1.0 - v;
            if remaining < MIN_DELTA {
                return None;
            }
            Some((-remaining.ln(), t - step.step_time))
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::predict;

    #[test]
    fn recovers_exact_first_order_curve() {
        let truth = FopdtParams::new(1.2, 30.0, 5.0);
        let step = StepContext { step_time: 4.0, y0: 25.0, y_final: 25.0 + 1.2 * 15.0, delta_duty: 15.0 };
        let t: Vec<f64> = (0..3000).map(|i| 4.0 + i as f64 * 0.25).collect();
        let y: Vec<f64> = t.iter().map(|&ti| predict(&truth, ti, &step)).collect();

        let p = identify_lsm(SeriesView::new(&t, &y), &step);
        assert!((p.k - 1.2).abs() < 1e-9);
        assert!((p.tau - 30.0).abs() < 1e-6, "tau = {}", p.tau);
        assert!((p.theta - 5.0).abs() < 1e-6, "theta = {}", p.theta);
    }

    #[test]
    fn recovers_falling_curve() {
        let truth = FopdtParams::new(0.3, 12.0, 2.0);
        let step = StepContext { step_time: 0.0, y0: 50.0, y_final: 50.0 - 0.3 * 30.0, delta_duty: -30.0 };
        let t: Vec<f64> = (0..2000).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = t.iter().map(|&ti| predict(&truth, ti, &step)).collect();

        let p = identify_lsm(SeriesView::new(&t, &y), &step);
        assert!((p.tau - 12.0).abs() < 1e-6, "tau = {}", p.tau);
        assert!((p.theta - 2.0).abs() < 1e-6, "theta = {}", p.theta);
    }

    #[test]
    fn zero_delta_returns_zero_set() {
        let t = [0.0, 1.0];
        let y = [1.0, 2.0];
        let step = StepContext { step_time: 0.0, y0: 1.0, y_final: 2.0, delta_duty: 0.0 };
        assert_eq!(identify_lsm(SeriesView::new(&t, &y), &step), FopdtParams::zero());
    }

    #[test]
    fn too_few_points_returns_gain_only() {
        // Only one sample inside the 10%..90% band.
        let t = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 0.05, 0.5, 0.95];
        let step = StepContext { step_time: 0.0, y0: 0.0, y_final: 1.0, delta_duty: 2.0 };
        assert_eq!(identify_lsm(SeriesView::new(&t, &y), &step), FopdtParams::gain_only(0.5));
    }

    #[test]
    fn window_bounds_are_exclusive() {
        let step = StepContext { step_time: 0.0, y0: 0.0, y_final: 1.0, delta_duty: 1.0 };
        let t = [1.0, 2.0, 3.0, 4.0];
        let y = [0.1, 0.5, 0.6, 0.9];
        let (xs, _) = linearized_points(SeriesView::new(&t, &y), &step);
        assert_eq!(xs.len(), 2);
    }

    #[test]
    fn flat_response_yields_no_points() {
        let step = StepContext { step_time: 0.0, y0: 5.0, y_final: 5.0, delta_duty: 10.0 };
        let t = [1.0, 2.0, 3.0];
        let y = [5.0, 5.0, 5.0];
        let p = identify_lsm(SeriesView::new(&t, &y), &step);
        assert_eq!(p, FopdtParams::gain_only(0.0));
    }
}
