//! Nelder–Mead refinement of FOPDT parameters.
//!
//! The cost is the plain sum of squared residuals over every sample. Infeasible
//! candidates (`tau <= 1e-6` or `theta < 0`) get a flat penalty, which keeps the
//! simplex in the physical region without a constrained solver.

use log::debug;
use nalgebra::DVector;

use crate::domain::{FopdtParams, SeriesView, StepContext};
use crate::math::{DEFAULT_MAX_ITERATIONS, minimize};
use crate::models::predict;

/// Cost returned for infeasible parameter vectors.
pub const INFEASIBLE_COST: f64 = 1e9;

const MIN_TAU: f64 = 1e-6;

/// Fallback time constant and dead time for the default initial guess.
const GUESS_TAU: f64 = 10.0;
const GUESS_THETA: f64 = 1.0;

/// Sum of squared residuals of `params` against `samples`.
pub fn sum_squared_error(params: &FopdtParams, samples: SeriesView<'_>, step: &StepContext) -> f64 {
    samples
        .iter()
        .map(|(t, y)| {
            let r = y - predict(params, t, step);
            r * r
        })
        .sum()
}

/// Root-mean-square residual; `None` for empty samples or unresolved dynamics.
pub fn fit_rmse(params: &FopdtParams, samples: SeriesView<'_>, step: &StepContext) -> Option<f64> {
    if samples.is_empty() || params.tau <= MIN_TAU {
        return None;
    }
    Some((sum_squared_error(params, samples, step) / samples.len() as f64).sqrt())
}

/// Optimizer objective with the feasibility penalty.
pub fn cost(params: &FopdtParams, samples: SeriesView<'_>, step: &StepContext) -> f64 {
    if params.tau <= MIN_TAU || params.theta < 0.0 {
        return INFEASIBLE_COST;
    }
    sum_squared_error(params, samples, step)
}

/// Starting point for the optimizer.
///
/// Uses the two-point result when it resolved the dynamics, otherwise the
/// static gain with `tau = 10`, `theta = 1`.
pub fn initial_guess(two_point: Option<&FopdtParams>, step: &StepContext) -> FopdtParams {
    if let Some(p) = two_point.filter(|p| p.is_identified()) {
        return *p;
    }
    let k = step.static_gain(1e-9).unwrap_or(0.0);
    FopdtParams::new(k, GUESS_TAU, GUESS_THETA)
}

/// Refine `guess` by minimizing the squared error. Never fails.
pub fn identify_nelder_mead(samples: SeriesView<'_>, step: &StepContext, guess: &FopdtParams) -> FopdtParams {
    let x0 = to_vector(guess);
    let objective = |x: &DVector<f64>| cost(&from_vector(x), samples, step);
    let outcome = minimize(objective, &x0, DEFAULT_MAX_ITERATIONS);

    debug!(
        "nelder-mead: {} iterations, converged={}, sse={:.6}",
        outcome.iterations, outcome.converged, outcome.cost
    );
    from_vector(&outcome.best)
}

fn to_vector(p: &FopdtParams) -> DVector<f64> {
    DVector::from_vec(vec![p.k, p.tau, p.theta])
}

fn from_vector(x: &DVector<f64>) -> FopdtParams {
    FopdtParams::new(x[0], x[1], x[2])
}
