//! Mathematical utilities: straight-line least squares and simplex minimization.

pub mod ols;
pub mod simplex;

pub use ols::*;
pub use simplex::*;
