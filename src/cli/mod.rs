//! Command-line parsing for the FOPDT identification and tuning tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! identification/tuning code. Handlers live in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Damping, DampingPreset, Method};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fopdt", version, about = "FOPDT step-response identification and IMC PID tuning")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Identify FOPDT parameters from one or more step logs and print tuning.
    Identify(IdentifyArgs),
    /// Plot a step log with the model curves from a parameter file.
    Plot(PlotArgs),
    /// Synthesize PID/PI gains from known FOPDT parameters.
    Tune(TuneArgs),
    /// Write a synthetic FOPDT step log.
    Simulate(SimulateArgs),
}

/// How a log is ingested.
#[derive(Debug, Args, Clone)]
pub struct IngestArgs {
    /// Seconds per row when the first column is a sample index.
    #[arg(long, env = "FOPDT_INTERVAL", default_value_t = 0.5)]
    pub interval: f64,

    /// Samples averaged for the baseline and final value.
    #[arg(long, env = "FOPDT_WINDOW", default_value_t = 30)]
    pub window: usize,

    /// Use one minute of samples as the averaging window.
    #[arg(long)]
    pub auto_window: bool,
}

/// Damping knob; at most one form may be given.
#[derive(Debug, Args, Clone, Default)]
#[group(multiple = false)]
pub struct DampingArgs {
    /// Position on the 0..3 damping scale (0.5 aggressive, 1.5 normal, 2.5 conservative).
    #[arg(long)]
    pub scale: Option<f64>,

    /// Explicit IMC epsilon (closed-loop time constant).
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Named damping preset.
    #[arg(long, value_enum)]
    pub preset: Option<DampingPreset>,
}

impl DampingArgs {
    pub fn damping(&self) -> Damping {
        if let Some(e) = self.epsilon {
            Damping::Epsilon(e)
        } else if let Some(s) = self.scale {
            Damping::Scale(s)
        } else if let Some(p) = self.preset {
            Damping::Scale(p.scale_position())
        } else {
            Damping::default()
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct IdentifyArgs {
    /// Step-response log files.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub ingest: IngestArgs,

    /// Parameter set used for tuning.
    #[arg(long, value_enum, default_value_t = Method::Optimizer)]
    pub method: Method,

    #[command(flatten)]
    pub damping: DampingArgs,

    /// Write `fopdt_<name>` parameter files next to each log.
    #[arg(long)]
    pub export_params: bool,

    /// Write a JSON report for all files.
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Render an ASCII plot per file.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Step-response log file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Parameter file (defaults to the `fopdt_<name>` file next to the log).
    #[arg(long, value_name = "PATH")]
    pub params: Option<PathBuf>,

    #[command(flatten)]
    pub ingest: IngestArgs,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct TuneArgs {
    /// Process gain (measurement units per % actuator).
    #[arg(long, requires_all = ["tau", "theta"], conflicts_with = "params")]
    pub k: Option<f64>,

    /// Time constant (s).
    #[arg(long, requires = "k")]
    pub tau: Option<f64>,

    /// Dead time (s).
    #[arg(long, requires = "k")]
    pub theta: Option<f64>,

    /// Parameter file to read instead of explicit values.
    #[arg(long, value_name = "PATH", required_unless_present = "k")]
    pub params: Option<PathBuf>,

    /// Section of the parameter file to use.
    #[arg(long, value_enum, default_value_t = Method::Optimizer)]
    pub method: Method,

    #[command(flatten)]
    pub damping: DampingArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Output log path.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: PathBuf,

    #[arg(long, default_value_t = 0.5)]
    pub k: f64,

    #[arg(long, default_value_t = 60.0)]
    pub tau: f64,

    #[arg(long, default_value_t = 10.0)]
    pub theta: f64,

    /// Initial measurement.
    #[arg(long, default_value_t = 35.0)]
    pub y0: f64,

    /// Raw actuator command before the step (0..=255).
    #[arg(long, default_value_t = 0)]
    pub pwm_from: i64,

    /// Raw actuator command after the step (0..=255).
    #[arg(long, default_value_t = 100)]
    pub pwm_to: i64,

    /// Seconds before the step.
    #[arg(long, default_value_t = 20.0)]
    pub pre_step: f64,

    /// Total record length (s).
    #[arg(long, default_value_t = 600.0)]
    pub duration: f64,

    /// Sample interval (s).
    #[arg(long, default_value_t = 0.5)]
    pub interval: f64,

    /// Standard deviation of measurement noise.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}
