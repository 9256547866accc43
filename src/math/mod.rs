//! Numerical building blocks: bin edges/centers, Gaussian smoothing and
//! regular-grid interpolation.

pub mod binning;
pub mod gaussian;
pub mod interp;

pub use binning::*;
pub use gaussian::*;
pub use interp::*;
