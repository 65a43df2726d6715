//! Threshold mapping with the external solver.
//!
//! - blocking subprocess runs behind the `SolverRunner` trait (`runner`)
//! - temperature sweeps and settings variants (`sweep`)

pub mod runner;
pub mod sweep;

pub use runner::*;
pub use sweep::*;
