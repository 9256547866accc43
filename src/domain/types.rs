//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while building the model
//! - exported to JSON/CSV
//! - reloaded later for plotting

use clap::ValueEnum;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// How the interpolant blends between grid points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InterpMethod {
    /// Multilinear (bilinear) interpolation between the four surrounding centers.
    #[default]
    Linear,
    /// Value of the closest bin center along each axis.
    Nearest,
}

/// Configuration for building the uncertainty model.
///
/// Smoothing scales are in the units of their axis (magnitudes, color index).
/// They are converted to grid cells by dividing by the bin width, so a scale of
/// zero (or anything that yields less than `1e-15` cells) leaves that axis
/// unsmoothed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintyConfig {
    pub color_smoothing_scale: f64,
    pub mag_smoothing_scale: f64,
    /// Fail queries outside the bin-center range instead of filling/extrapolating.
    pub bounds_error: bool,
    /// Value returned for out-of-range queries when `bounds_error` is false.
    ///
    /// `None` extrapolates linearly from the edge cells.
    pub fill_value: Option<f64>,
    pub method: InterpMethod,
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            color_smoothing_scale: 0.1,
            mag_smoothing_scale: 0.1,
            bounds_error: false,
            fill_value: None,
            method: InterpMethod::Linear,
        }
    }
}

/// Grid bounds and bin counts from the primary header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridHeader {
    pub min_col: f64,
    pub max_col: f64,
    pub num_col: usize,
    pub min_mag: f64,
    pub max_mag: f64,
    pub num_mag: usize,
}

impl GridHeader {
    pub const KEY_MIN_COL: &'static str = "MIN_COL";
    pub const KEY_MAX_COL: &'static str = "MAX_COL";
    pub const KEY_NUM_COL: &'static str = "NUM_COL";
    pub const KEY_MIN_MAG: &'static str = "MIN_MAG";
    pub const KEY_MAX_MAG: &'static str = "MAX_MAG";
    pub const KEY_NUM_MAG: &'static str = "NUM_MAG";
}

/// Per-axis Gaussian sigmas in grid-cell units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingWidths {
    pub mag_cells: f64,
    pub color_cells: f64,
}

/// Raw log-uncertainty samples, shape `(num_mag, num_col, num_samples)`.
///
/// Stored row-major with the sample index varying fastest, which is also the
/// on-disk order of a FITS image with `NAXIS1 = num_samples`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleCube {
    shape: [usize; 3],
    data: Vec<f64>,
}

impl SampleCube {
    /// Wrap a flat buffer. Returns `None` if the length does not match the shape.
    pub fn new(shape: [usize; 3], data: Vec<f64>) -> Option<Self> {
        let expected = shape.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))?;
        (expected == data.len()).then_some(Self { shape, data })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn num_samples(&self) -> usize {
        self.shape[2]
    }

    pub fn get(&self, mag: usize, col: usize, sample: usize) -> f64 {
        let [_, nc, ns] = self.shape;
        self.data[(mag * nc + col) * ns + sample]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Arithmetic mean over the sample axis, giving a `(num_mag, num_col)` grid.
    ///
    /// NaN samples propagate into their cell.
    pub fn mean_last_axis(&self) -> DMatrix<f64> {
        let [nm, nc, ns] = self.shape;
        DMatrix::from_fn(nm, nc, |m, c| {
            let start = (m * nc + c) * ns;
            let cell = &self.data[start..start + ns];
            cell.iter().sum::<f64>() / ns as f64
        })
    }
}

/// Portable representation of a smoothed grid (JSON export).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridFile {
    pub tool: String,
    pub header: GridHeader,
    pub config: UncertaintyConfig,
    pub widths: SmoothingWidths,
    pub mag_centers: Vec<f64>,
    pub color_centers: Vec<f64>,
    /// Smoothed ln(sigma), one row per magnitude center.
    pub ln_sigma: Vec<Vec<f64>>,
}
