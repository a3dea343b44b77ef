//! Two-point (28.3% / 63.2%) identification.
//!
//! For a first-order response the 28.3% and 63.2% crossings sit at
//! `theta + tau/3` and `theta + tau` after the step, so
//!
//! ```text
//! tau   = 1.5 · (t63.2 - t28.3)
//! theta = t63.2 - step_time - tau
//! ```

use log::debug;

use crate::domain::{FopdtParams, SeriesView, StepContext};

/// Below this, the step or the response change is treated as absent.
const MIN_CHANGE: f64 = 1e-6;

const LEVEL_LOW: f64 = 0.283;
const LEVEL_HIGH: f64 = 0.632;

/// Identify FOPDT parameters from the two rise-time crossings.
///
/// Returns the zero set when there is no usable step, and gain-only
/// parameters when either crossing is never reached.
pub fn identify_two_point(samples: SeriesView<'_>, step: &StepContext) -> FopdtParams {
    let change = step.y_final - step.y0;
    if step.delta_duty.abs() < MIN_CHANGE || change.abs() < MIN_CHANGE {
        return FopdtParams::zero();
    }
    let k = change / step.delta_duty;

    let level_low = step.y0 + LEVEL_LOW * change;
    let level_high = step.y0 + LEVEL_HIGH * change;
    let rising = change > 0.0;
    let crosses = |y1: f64, y2: f64, level: f64| {
        if rising {
            y1 < level && y2 >= level
        } else {
            y1 > level && y2 <= level
        }
    };

    let mut t_low: Option<f64> = None;
    let mut t_high: Option<f64> = None;

    for i in 1..samples.len() {
        let (t1, y1) = (samples.time[i - 1], samples.measurement[i - 1]);
        let (t2, y2) = (samples.time[i], samples.measurement[i]);
        if t2 < step.step_time {
            continue;
        }

        if t_low.is_none() && crosses(y1, y2, level_low) {
            t_low = Some(interpolate_time(t1, y1, t2, y2, level_low));
        }
        if t_low.is_some() && crosses(y1, y2, level_high) {
            t_high = Some(interpolate_time(t1, y1, t2, y2, level_high));
            break;
        }
    }

    let (Some(t_low), Some(t_high)) = (t_low, t_high) else {
        debug!("two-point: crossings not found (28.3%: {t_low:?}, 63.2%: {t_high:?})");
        return FopdtParams::gain_only(k);
    };

    let tau = 1.5 * (t_high - t_low);
    let theta = (t_high - step.step_time - tau).max(0.0);
    FopdtParams { k, tau, theta }
}

/// Time at which the segment `(t1, y1) -> (t2, y2)` reaches `level`.
fn interpolate_time(t1: f64, y1: f64, t2: f64, y2: f64, level: f64) -> f64 {
    if (y2 - y1).abs() < 1e-9 {
        return t1;
    }
    t1 + (level - y1) * (t2 - t1) / (y2 - y1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::predict;

    fn synthetic(truth: &FopdtParams, step: &StepContext, dt: f64, t_end: f64) -> (Vec<f64>, Vec<f64>) {
        let n = (t_end / dt) as usize;
        let t: Vec<f64> = (0..=n).map(|i| step.step_time + i as f64 * dt).collect();
        let y = t.iter().map(|&ti| predict(truth, ti, step)).collect();
        (t, y)
    }

    #[test]
    fn recovers_rising_response() {
        let truth = FopdtParams::new(0.8, 40.0, 6.0);
        let step = StepContext { step_time: 10.0, y0: 35.0, y_final: 35.0 + 0.8 * 20.0, delta_duty: 20.0 };
        let (t, y) = synthetic(&truth, &step, 0.1, 600.0);

        let p = identify_two_point(SeriesView::new(&t, &y), &step);
        assert!((p.k - 0.8).abs() < 1e-12);
        assert!((p.tau - 40.0).abs() / 40.0 < 0.01, "tau = {}", p.tau);
        assert!((p.theta - 6.0).abs() < 0.1, "theta = {}", p.theta);
    }

    #[test]
    fn recovers_falling_response() {
        let truth = FopdtParams::new(0.5, 25.0, 3.0);
        let step = StepContext { step_time: 0.0, y0: 60.0, y_final: 60.0 - 0.5 * 40.0, delta_duty: -40.0 };
        let (t, y) = synthetic(&truth, &step, 0.1, 400.0);

        let p = identify_two_point(SeriesView::new(&t, &y), &step);
        assert!((p.k - 0.5).abs() < 1e-12);
        assert!((p.tau - 25.0).abs() / 25.0 < 0.01, "tau = {}", p.tau);
        assert!((p.theta - 3.0).abs() < 0.1, "theta = {}", p.theta);
    }

    #[test]
    fn zero_step_returns_zero_set() {
        let t = [0.0, 1.0, 2.0];
        let y = [20.0, 21.0, 22.0];
        let step = StepContext { step_time: 0.0, y0: 20.0, y_final: 22.0, delta_duty: 0.0 };
        assert_eq!(identify_two_point(SeriesView::new(&t, &y), &step), FopdtParams::zero());

        let step = StepContext { delta_duty: 10.0, y_final: 20.0, ..step };
        assert_eq!(identify_two_point(SeriesView::new(&t, &y), &step), FopdtParams::zero());
    }

    #[test]
    fn missing_crossing_returns_gain_only() {
        // Never reaches 63.2% of the declared change.
        let t = [0.0, 1.0, 2.0, 3.0];
        let y = [20.0, 22.0, 24.0, 25.0];
        let step = StepContext { step_time: 0.0, y0: 20.0, y_final: 30.0, delta_duty: 10.0 };
        let p = identify_two_point(SeriesView::new(&t, &y), &step);
        assert_eq!(p, FopdtParams::gain_only(1.0));
    }

    #[test]
    fn negative_dead_time_is_clamped() {
        // A stalled rise stretches t63.2 - t28.3 so that theta < 0 before clamping.
        let t = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.0, 0.3, 0.3, 0.3, 0.7];
        let step = StepContext { step_time: 0.0, y0: 0.0, y_final: 1.0, delta_duty: 1.0 };
        let p = identify_two_point(SeriesView::new(&t, &y), &step);
        assert!(p.tau > 0.0);
        assert_eq!(p.theta, 0.0);
    }
}
