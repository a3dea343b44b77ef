//! Run every identifier on one step response and pick the requested result.
//!
//! The two closed-form methods are independent and run in parallel; the
//! optimizer then starts from the two-point estimate (or the static-gain
//! fallback when two-point could not resolve the dynamics).

use log::{debug, warn};
use serde::Serialize;

use crate::domain::{FopdtParams, Method, SeriesView, StepContext};
use crate::fit::lsm::identify_lsm;
use crate::fit::optimizer::{fit_rmse, identify_nelder_mead, initial_guess};
use crate::fit::two_point::identify_two_point;

/// One method's estimate plus its goodness of fit on the post-step samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MethodFit {
    pub method: Method,
    pub params: FopdtParams,
    /// `None` when the dynamics were not resolved (`tau == 0`).
    pub rmse: Option<f64>,
}

/// Estimates from all three identifiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentificationSet {
    pub two_point: MethodFit,
    pub lsm: MethodFit,
    pub optimizer: MethodFit,
}

impl IdentificationSet {
    pub fn get(&self, method: Method) -> &MethodFit {
        match method {
            Method::TwoPoint => &self.two_point,
            Method::LeastSquares => &self.lsm,
            Method::Optimizer => &self.optimizer,
        }
    }

    /// Fits in the canonical method order.
    pub fn iter(&self) -> impl Iterator<Item = &MethodFit> {
        Method::ALL.into_iter().map(|m| self.get(m))
    }

    /// Method with the smallest RMSE among resolved fits.
    pub fn best_by_rmse(&self) -> Option<Method> {
        self.iter()
            .filter_map(|f| f.rmse.map(|r| (f.method, r)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(m, _)| m)
    }
}

/// Identify the process with every method.
pub fn identify_all(samples: SeriesView<'_>, step: &StepContext) -> IdentificationSet {
    let (two_point, lsm) = rayon::join(
        || identify_two_point(samples, step),
        || identify_lsm(samples, step),
    );

    let guess = initial_guess(Some(&two_point), step);
    debug!(
        "optimizer start: k={:.4} tau={:.3} theta={:.3}",
        guess.k, guess.tau, guess.theta
    );
    let optimizer = identify_nelder_mead(samples, step, &guess);

    let fit = |method: Method, params: FopdtParams| {
        if params.tau == 0.0 {
            warn!("{}: time constant not resolved", method.display_name());
        }
        MethodFit {
            method,
            params,
            rmse: fit_rmse(&params, samples, step),
        }
    };

    IdentificationSet {
        two_point: fit(Method::TwoPoint, two_point),
        lsm: fit(Method::LeastSquares, lsm),
        optimizer: fit(Method::Optimizer, optimizer),
    }
}
