//! Empirical correlation models (sink strength, bubble aspect ratio).
//!
//! Models are small structs behind the `FitModel` trait so that the fitting code
//! can stay generic.

pub mod model;

pub use model::*;
