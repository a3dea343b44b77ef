//! FOPDT identification.
//!
//! - two-point 28.3% / 63.2% method (`two_point`)
//! - log-linearized least squares (`lsm`)
//! - Nelder–Mead refinement of the squared error (`optimizer`)
//! - running all three and comparing them (`selection`)

pub mod lsm;
pub mod optimizer;
pub mod selection;
pub mod two_point;

pub use lsm::*;
pub use optimizer::*;
pub use selection::*;
pub use two_point::*;
