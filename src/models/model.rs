//! FOPDT forward model.
//!
//! The fitter and the renderers rely on two primitive operations:
//! - predict `y(t)` at a single time (identifiers, residuals)
//! - sample `y(t)` on a fixed grid (plots, exports)
//!
//! Both are pure functions of an explicit parameter record.

use crate::domain::{FopdtParams, StepContext};

/// Default display step for sampled model curves (seconds).
pub const DEFAULT_CURVE_STEP: f64 = 0.1;

/// Predict the measurement at time `t`.
///
/// Inside the dead-time region (`t < step_time + theta`) the baseline is
/// returned unchanged. Callers guard against `tau <= 0` upstream.
pub fn predict(params: &FopdtParams, t: f64, step: &StepContext) -> f64 {
    let elapsed = t - step.step_time - params.theta;
    if elapsed < 0.0 {
        return step.y0;
    }
    // 1 - exp(-x) computed as -expm1(-x).
    let rise = -(-elapsed / params.tau).exp_m1();
    step.y0 + params.k * step.delta_duty * rise
}

/// Sample the model on `[t_start, t_end]` every `sample_step` seconds.
///
/// The returned iterator is lazy, finite and `Clone`, so it can be replayed.
pub fn predict_curve(
    params: &FopdtParams,
    t_start: f64,
    t_end: f64,
    step: &StepContext,
    sample_step: f64,
) -> ModelCurve {
    let n = if sample_step.is_finite() && sample_step > 0.0 && t_end >= t_start {
        // Inclusive end, tolerant to accumulated rounding at the last point.
        ((t_end - t_start) / sample_step + 1e-9).floor() as usize + 1
    } else if t_end == t_start {
        1
    } else {
        0
    };

    ModelCurve {
        params: *params,
        step: *step,
        t_start,
        sample_step,
        next: 0,
        len: n,
    }
}

/// Lazy `(t, y)` sequence produced by [`predict_curve`].
#[derive(Debug, Clone)]
pub struct ModelCurve {
    params: FopdtParams,
    step: StepContext,
    t_start: f64,
    sample_step: f64,
    next: usize,
    len: usize,
}

impl Iterator for ModelCurve {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let t = self.t_start + self.next as f64 * self.sample_step;
        self.next += 1;
        Some((t, predict(&self.params, t, &self.step)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ModelCurve {}
