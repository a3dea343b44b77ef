//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - sample storage (`SampleSeries`, `SeriesView`) and the step description (`StepEvent`, `StepContext`)
//! - model and controller outputs (`FopdtParams`, `ControllerGains`)
//! - selection and tuning knobs (`Method`, `DampingPreset`, `RunConfig`)

pub mod types;

pub use types::*;
