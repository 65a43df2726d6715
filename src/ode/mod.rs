//! Exploratory ODE integration.
//!
//! - `dopri`: adaptive Dormand-Prince 5(4) with dense output
//! - `coalescence`: grain-boundary bubble coalescence laws `dN/dA`

pub mod coalescence;
pub mod dopri;

pub use coalescence::*;
pub use dopri::*;
