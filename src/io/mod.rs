//! Input/output helpers.
//!
//! - solver output table parsing and column lookup (`table`)
//! - solver input files (`solver_input`)
//! - two-column curve-fit data ingest (`ingest`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;
pub mod solver_input;
pub mod table;

pub use export::*;
pub use ingest::*;
pub use solver_input::*;
pub use table::*;
