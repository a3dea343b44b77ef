//! Damping resolution plus both controller variants for one parameter set.

use log::debug;
use serde::Serialize;

use crate::domain::{ControllerGains, ControllerKind, Damping, FopdtParams};
use crate::tuning::damping::DampingAnchors;
use crate::tuning::imc::synthesize;

/// Smallest epsilon handed to the synthesizer.
pub const MIN_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TuningResult {
    pub epsilon: f64,
    /// Position of `epsilon` on the `[0, 3]` damping scale.
    pub scale: f64,
    /// `epsilon / theta`; `None` when theta is zero.
    pub epsilon_theta_ratio: Option<f64>,
    pub anchors: DampingAnchors,
    pub pid: ControllerGains,
    pub pi: ControllerGains,
}

/// Epsilon for `damping`, floored at [`MIN_EPSILON`].
pub fn resolve_epsilon(params: &FopdtParams, damping: Damping) -> f64 {
    let raw = match damping {
        Damping::Scale(s) => DampingAnchors::new(params).scale_to_epsilon(s),
        Damping::Epsilon(e) => e,
    };
    if raw.is_finite() { raw.max(MIN_EPSILON) } else { MIN_EPSILON }
}

/// Resolve the damping and synthesize PID and PI gains.
pub fn tune(params: &FopdtParams, damping: Damping) -> TuningResult {
    let anchors = DampingAnchors::new(params);
    let epsilon = resolve_epsilon(params, damping);
    let scale = anchors.epsilon_to_scale(epsilon);
    let epsilon_theta_ratio = (params.theta > 0.0).then(|| epsilon / params.theta);

    let pid = synthesize(params, epsilon, ControllerKind::Pid);
    let pi = synthesize(params, epsilon, ControllerKind::Pi);
    debug!("tune: epsilon={epsilon:.4} scale={scale:.3} pid={pid:?} pi={pi:?}");

    TuningResult {
        epsilon,
        scale,
        epsilon_theta_ratio,
        anchors,
        pid,
        pi,
    }
}
