//! Test and demo data.

pub mod synth;

pub use synth::*;
