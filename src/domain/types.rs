//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the identifiers, the synthesizer and the front-ends
//! - exported to JSON or the `key = value` parameter format
//! - reloaded later for plotting or re-tuning

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Native full-scale actuator value (8-bit PWM).
pub const ACTUATOR_FULL_SCALE: f64 = 255.0;

/// Rescale a raw actuator value (or delta) from `0..=255` to percent of full scale.
///
/// Every identifier and the synthesizer expect actuator deltas in percent, so
/// the gain `k` is reported in measurement units per percent actuator.
pub fn duty_percent(raw: i64) -> f64 {
    raw as f64 * 100.0 / ACTUATOR_FULL_SCALE
}

/// Aligned time / actuator / measurement arrays, one entry per valid input record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    time: Vec<f64>,
    actuator: Vec<i64>,
    measurement: Vec<f64>,
}

impl SampleSeries {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            time: Vec::with_capacity(n),
            actuator: Vec::with_capacity(n),
            measurement: Vec::with_capacity(n),
        }
    }

    /// Append one record. All three arrays grow together.
    pub fn push(&mut self, time: f64, actuator: i64, measurement: f64) {
        self.time.push(time);
        self.actuator.push(actuator);
        self.measurement.push(measurement);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn actuator(&self) -> &[i64] {
        &self.actuator
    }

    pub fn measurement(&self) -> &[f64] {
        &self.measurement
    }

    /// Borrow the samples from `start` to the end.
    pub fn view_from(&self, start: usize) -> SeriesView<'_> {
        let start = start.min(self.len());
        SeriesView {
            time: &self.time[start..],
            measurement: &self.measurement[start..],
        }
    }

    /// Borrow the whole series.
    pub fn view(&self) -> SeriesView<'_> {
        self.view_from(0)
    }

    pub(crate) fn scale_time(&mut self, factor: f64) {
        for t in &mut self.time {
            *t *= factor;
        }
    }
}

/// Borrowed `(time, measurement)` samples handed to the identifiers.
#[derive(Debug, Clone, Copy)]
pub struct SeriesView<'a> {
    pub time: &'a [f64],
    pub measurement: &'a [f64],
}

impl<'a> SeriesView<'a> {
    pub fn new(time: &'a [f64], measurement: &'a [f64]) -> Self {
        let n = time.len().min(measurement.len());
        Self {
            time: &time[..n],
            measurement: &measurement[..n],
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.time.iter().copied().zip(self.measurement.iter().copied())
    }

    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((*self.time.first()?, *self.time.last()?))
    }
}

/// The single recognized step in the actuator command.
///
/// A degenerate event (`index = 0`, `delta = 0`) means no step was found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    pub index: usize,
    pub time: f64,
    /// Signed raw actuator change at the step (native units).
    pub delta: i64,
}

impl StepEvent {
    /// Actuator delta in percent of full scale.
    pub fn delta_duty(&self) -> f64 {
        duty_percent(self.delta)
    }
}

/// Everything the model needs to know about the step besides the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepContext {
    pub step_time: f64,
    /// Baseline measurement before the step.
    pub y0: f64,
    /// Settled measurement at the end of the record.
    pub y_final: f64,
    /// Actuator delta in percent of full scale.
    pub delta_duty: f64,
}

impl StepContext {
    /// Response change divided by actuator change, or `None` when the step is empty.
    pub fn static_gain(&self, min_delta: f64) -> Option<f64> {
        if self.delta_duty.abs() < min_delta {
            return None;
        }
        Some((self.y_final - self.y0) / self.delta_duty)
    }
}

/// First-order-plus-dead-time parameters.
///
/// `tau = 0` means the identifier could not resolve the dynamics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FopdtParams {
    pub k: f64,
    pub tau: f64,
    pub theta: f64,
}

impl FopdtParams {
    pub fn new(k: f64, tau: f64, theta: f64) -> Self {
        Self { k, tau, theta }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Gain only; dynamics unresolved.
    pub fn gain_only(k: f64) -> Self {
        Self { k, tau: 0.0, theta: 0.0 }
    }

    pub fn is_identified(&self) -> bool {
        self.tau > 0.0 && self.k.is_finite() && self.k != 0.0
    }
}

/// Which identifier produced a parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// 28.3% / 63.2% rise-time method.
    TwoPoint,
    /// Logarithmic linearization + ordinary least squares.
    LeastSquares,
    /// Nelder–Mead refinement of the sum of squared errors.
    Optimizer,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::TwoPoint, Method::LeastSquares, Method::Optimizer];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Method::TwoPoint => "TwoPoint",
            Method::LeastSquares => "LSM",
            Method::Optimizer => "Nelder-Mead",
        }
    }

    /// Section marker used in parameter files.
    pub fn section_marker(self) -> &'static str {
        match self {
            Method::TwoPoint => "632 Method",
            Method::LeastSquares => "LSM Method",
            Method::Optimizer => "Optimization Method",
        }
    }
}

/// Controller structure produced by the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    /// IMC PID (Rivera 1986).
    Pid,
    /// Improved IMC PI.
    Pi,
}

/// Parallel-form controller coefficients. `kd = 0` for PI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// Named operating points on the damping scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DampingPreset {
    /// `epsilon = 0.2·tau + 0.5·theta`.
    Aggressive,
    /// `epsilon = tau`.
    Normal,
    /// `epsilon = 2·tau`.
    Conservative,
}

impl DampingPreset {
    pub fn scale_position(self) -> f64 {
        match self {
            DampingPreset::Aggressive => 0.5,
            DampingPreset::Normal => 1.5,
            DampingPreset::Conservative => 2.5,
        }
    }
}

/// How the user expressed the damping knob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Damping {
    /// Position on the `[0, 3]` display scale.
    Scale(f64),
    /// Explicit IMC epsilon.
    Epsilon(f64),
}

impl Default for Damping {
    fn default() -> Self {
        Damping::Scale(DampingPreset::Normal.scale_position())
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub inputs: Vec<PathBuf>,
    /// Seconds per row when the value column is a sample index.
    pub interval: f64,
    /// Averaging window (samples) for the baseline and final value.
    pub window: usize,
    /// Replace `window` with the samples-per-minute recommendation.
    pub auto_window: bool,
    pub method: Method,
    pub damping: Damping,

    pub export_params: bool,
    pub json: Option<PathBuf>,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            interval: 0.5,
            window: 30,
            auto_window: false,
            method: Method::Optimizer,
            damping: Damping::default(),
            export_params: false,
            json: None,
            plot: false,
            plot_width: 100,
            plot_height: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_percent_maps_full_scale() {
        assert!((duty_percent(255) - 100.0).abs() < 1e-12);
        assert!((duty_percent(-51) + 20.0).abs() < 1e-12);
        assert_eq!(duty_percent(0), 0.0);
    }

    #[test]
    fn series_view_from_clamps_start() {
        let mut s = SampleSeries::default();
        s.push(0.0, 0, 1.0);
        s.push(1.0, 5, 2.0);
        assert_eq!(s.view_from(1).len(), 1);
        assert!(s.view_from(10).is_empty());
        assert_eq!(s.view().time_range(), Some((0.0, 1.0)));
    }

    #[test]
    fn static_gain_requires_a_step() {
        let ctx = StepContext { step_time: 0.0, y0: 20.0, y_final: 30.0, delta_duty: 0.0 };
        assert!(ctx.static_gain(1e-6).is_none());
        let ctx = StepContext { delta_duty: 5.0, ..ctx };
        assert_eq!(ctx.static_gain(1e-6), Some(2.0));
    }
}
