//! Correlation fitting.
//!
//! Responsibilities:
//!
//! - Levenberg-Marquardt iterations on top of the SVD least squares solver
//! - multistart over model-provided starting points (parallel)
//! - fit diagnostics (covariance, standard errors, R², fitted grid)

pub mod fitter;
pub mod lm;

pub use fitter::*;
pub use lm::*;
