//! Mathematical utilities: least squares and sample spacing.

pub mod ols;
pub mod spacing;

pub use ols::*;
pub use spacing::*;
