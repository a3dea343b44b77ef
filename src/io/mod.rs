//! Input/output helpers.
//!
//! - step-log ingest and step detection (`ingest`)
//! - parameter files in `key = value` form (`params`)
//! - JSON run reports (`export`)

pub mod export;
pub mod ingest;
pub mod params;

pub use export::*;
pub use ingest::*;
pub use params::*;
