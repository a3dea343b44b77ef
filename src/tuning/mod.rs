//! Controller synthesis.
//!
//! - IMC PID / PI gains (`imc`)
//! - damping scale <-> epsilon mapping (`damping`)
//! - resolved damping plus both controller variants (`summary`)

pub mod damping;
pub mod imc;
pub mod summary;

pub use damping::*;
pub use imc::*;
pub use summary::*;
