//! `fuelcheck` library crate.
//!
//! The binary (`fuelcheck`) is a thin wrapper around this library so that:
//!
//! - numerical checks are testable without spawning processes
//! - the solver driver can be exercised against a fake solver
//! - code stays easy to navigate as the toolkit grows

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod mapping;
pub mod math;
pub mod mms;
pub mod models;
pub mod ode;
pub mod plot;
pub mod report;
pub mod tui;
