//! IMC controller synthesis from FOPDT parameters.
//!
//! PID follows Rivera et al. (1986); PI is the "improved IMC" form. Both use
//! `effective_theta = max(theta, 0.1)` inside the formulas so a zero dead time
//! never produces an infinite gain.

use crate::domain::{ControllerGains, ControllerKind, FopdtParams};

/// Lower bound on the dead time used inside the gain formulas.
pub const MIN_EFFECTIVE_THETA: f64 = 0.1;

const DENOM_EPS: f64 = 1e-9;

pub fn effective_theta(theta: f64) -> f64 {
    theta.max(MIN_EFFECTIVE_THETA)
}

/// Parallel-form gains for `params` and damping `epsilon`.
///
/// Degenerate denominators yield zero coefficients instead of infinities.
pub fn synthesize(params: &FopdtParams, epsilon: f64, kind: ControllerKind) -> ControllerGains {
    let FopdtParams { k, tau, theta } = *params;
    let eff = effective_theta(theta);
    let tau_i = tau + eff / 2.0;

    let (numerator, denominator) = match kind {
        ControllerKind::Pid => (2.0 * tau + eff, k * (2.0 * epsilon + eff)),
        ControllerKind::Pi => (2.0 * tau + eff, 2.0 * k * epsilon),
    };
    let kc = if denominator.abs() < DENOM_EPS {
        0.0
    } else {
        numerator / denominator
    };

    let ki = if tau_i.abs() < DENOM_EPS { 0.0 } else { kc / tau_i };
    let kd = match kind {
        ControllerKind::Pid => {
            let tau_d_denom = 2.0 * tau + eff;
            if tau_d_denom.abs() < DENOM_EPS {
                0.0
            } else {
                kc * (tau * eff) / tau_d_denom
            }
        }
        ControllerKind::Pi => 0.0,
    };

    ControllerGains { kp: kc, ki, kd }
}
