//! Method of manufactured solutions (MMS) for the solver's update rules.
//!
//! - uniform grids (`grid`)
//! - the shared verification routine (`verifier`)
//! - manufactured cases for each solver rule (`cases`)

pub mod cases;
pub mod grid;
pub mod verifier;

pub use cases::*;
pub use grid::*;
pub use verifier::*;
