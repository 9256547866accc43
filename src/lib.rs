//! `one-datum` library crate.
//!
//! Builds a radial-velocity uncertainty model: a FITS lookup table of
//! ln(sigma) samples binned by magnitude and color is averaged per cell,
//! Gaussian-smoothed and wrapped in a regular-grid interpolant.
//!
//! ```no_run
//! use one_datum::{UncertaintyConfig, get_uncertainty_model};
//!
//! let model = get_uncertainty_model(&UncertaintyConfig::default()).unwrap();
//! let ln_sigma = model.evaluate(11.2, 0.9).unwrap();
//! println!("sigma_rv ~ {:.3}", ln_sigma.exp());
//! ```
//!
//! The grid file is not part of the source tree. `get_uncertainty_model` reads
//! `$ONE_DATUM_GRID` if set, otherwise `data/rv_uncertainty_grid.fits` under the
//! crate root; without either it fails with `ModelError::Io`. A stand-in grid
//! can be generated with
//! `one-datum synth --out data/rv_uncertainty_grid.fits`.
//!
//! The binary (`one-datum`) is a thin wrapper around this library so that
//! core logic is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod model;
pub mod plot;
pub mod report;

pub use domain::{InterpMethod, UncertaintyConfig};
pub use error::ModelError;
pub use math::GridInterpolator;
pub use model::{get_uncertainty_model, load_uncertainty_model};
