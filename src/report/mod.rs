//! Terminal reports for identification and tuning runs.

pub mod format;

pub use format::*;
