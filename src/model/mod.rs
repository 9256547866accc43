//! Radial-velocity uncertainty model construction.
//!
//! `get_uncertainty_model` is the main entry point; `UncertaintyGrid` exposes
//! the intermediate steps (mean grid, smoothing widths, smoothed grid).

pub mod uncertainty;

pub use uncertainty::*;
