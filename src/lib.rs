//! `fopdt-tune` library crate.
//!
//! The binary (`fopdt`) is a thin wrapper around this library so that:
//!
//! - identification and tuning are testable without spawning processes
//! - the numeric core stays free of any front-end (CLI today, others later)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tuning;
