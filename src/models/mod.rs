//! First-order-plus-dead-time process model.
//!
//! The model is a small, pure function so that the identifiers, the optimizer
//! cost and the renderers can all share it.

pub mod model;

pub use model::*;
