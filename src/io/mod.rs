//! Input/output helpers.
//!
//! - FITS grid files (`fits`)
//! - smoothed grid JSON read/write (`grid`)
//! - grid CSV export (`export`)
//! - query points CSV in/out (`points`)

pub mod export;
pub mod fits;
pub mod grid;
pub mod points;

pub use export::*;
pub use grid::*;
pub use points::*;
