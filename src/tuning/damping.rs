//! Mapping between the `[0, 3]` damping scale and IMC epsilon.
//!
//! The scale is piecewise linear through three anchors derived from the
//! process parameters:
//!
//! | scale | epsilon |
//! |---|---|
//! | 0.0 | 0 |
//! | 0.5 | `0.2·tau + 0.5·effective_theta` (aggressive) |
//! | 1.5 | `tau` (normal) |
//! | 2.5 | `2·tau` (conservative) |
//! | 3.0 | `1.5 · conservative` |

use serde::Serialize;

use crate::domain::FopdtParams;
use crate::tuning::imc::effective_theta;

pub const SCALE_MIN: f64 = 0.0;
pub const SCALE_MAX: f64 = 3.0;

/// Scale positions of the anchor points, including both ends.
const KNOTS: [f64; 5] = [0.0, 0.5, 1.5, 2.5, 3.0];

const WIDTH_EPS: f64 = 1e-12;

/// Epsilon values at the three named operating points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DampingAnchors {
    pub aggressive: f64,
    pub normal: f64,
    pub conservative: f64,
}

impl DampingAnchors {
    pub fn new(params: &FopdtParams) -> Self {
        let tau = params.tau;
        let mut aggressive = 0.2 * tau + 0.5 * effective_theta(params.theta);
        let normal = tau;
        let mut conservative = 2.0 * tau;

        if aggressive > normal {
            aggressive = normal / 2.0;
        }
        if conservative < normal {
            conservative = normal * 2.0;
        }

        Self {
            aggressive,
            normal,
            conservative,
        }
    }

    /// Epsilon at each knot of the scale.
    fn knot_values(&self) -> [f64; 5] {
        [
            0.0,
            self.aggressive,
            self.normal,
            self.conservative,
            1.5 * self.conservative,
        ]
    }

    /// Epsilon for a scale position; positions outside `[0, 3]` are clamped.
    pub fn scale_to_epsilon(&self, scale: f64) -> f64 {
        let s = clamp_scale(scale);
        let eps = self.knot_values();
        for i in 1..KNOTS.len() {
            if s <= KNOTS[i] {
                let frac = (s - KNOTS[i - 1]) / (KNOTS[i] - KNOTS[i - 1]);
                return eps[i - 1] + frac * (eps[i] - eps[i - 1]);
            }
        }
        eps[KNOTS.len() - 1]
    }

    /// Scale position for an epsilon; the result is clamped to `[0, 3]`.
    ///
    /// A zero-width segment (two equal anchors) maps to its left knot.
    pub fn epsilon_to_scale(&self, epsilon: f64) -> f64 {
        if epsilon.is_nan() {
            return SCALE_MIN;
        }
        let eps = self.knot_values();
        if epsilon <= eps[0] {
            return SCALE_MIN;
        }
        for i in 1..KNOTS.len() {
            if epsilon <= eps[i] {
                let width = eps[i] - eps[i - 1];
                if width < WIDTH_EPS {
                    return KNOTS[i - 1];
                }
                let s = KNOTS[i - 1] + (epsilon - eps[i - 1]) / width * (KNOTS[i] - KNOTS[i - 1]);
                return clamp_scale(s);
            }
        }
        SCALE_MAX
    }
}

/// Epsilon for `scale` given the process parameters.
pub fn scale_to_epsilon(params: &FopdtParams, scale: f64) -> f64 {
    DampingAnchors::new(params).scale_to_epsilon(scale)
}

/// Scale position for `epsilon` given the process parameters.
pub fn epsilon_to_scale(params: &FopdtParams, epsilon: f64) -> f64 {
    DampingAnchors::new(params).epsilon_to_scale(epsilon)
}

fn clamp_scale(s: f64) -> f64 {
    if s.is_nan() {
        return SCALE_MIN;
    }
    s.clamp(SCALE_MIN, SCALE_MAX)
}
