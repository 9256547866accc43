//! Command-line parsing for the `one-datum` binary.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! model code; `app` turns these structs into library calls.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::InterpMethod;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "one-datum",
    version,
    about = "Radial-velocity uncertainty model from a smoothed FITS lookup grid"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Describe the grid file and the smoothing derived from the options.
    Info(InfoArgs),
    /// Evaluate ln(sigma) at one (magnitude, color) pair or a CSV of points.
    Eval(EvalArgs),
    /// Print/export the smoothed grid.
    Grid(GridArgs),
    /// Plot a previously exported grid JSON.
    Plot(PlotArgs),
    /// Write a synthetic uncertainty grid file.
    Synth(SynthArgs),
}

/// Options shared by every command that builds the model.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Grid FITS file (defaults to $ONE_DATUM_GRID, then the bundled grid).
    #[arg(long, value_name = "FITS")]
    pub grid: Option<PathBuf>,

    /// Gaussian smoothing scale along color (color units).
    #[arg(long, default_value_t = 0.1, allow_negative_numbers = true)]
    pub color_smoothing_scale: f64,

    /// Gaussian smoothing scale along magnitude (magnitudes).
    #[arg(long, default_value_t = 0.1, allow_negative_numbers = true)]
    pub mag_smoothing_scale: f64,

    /// Fail on queries outside the grid instead of filling/extrapolating.
    #[arg(long)]
    pub bounds_error: bool,

    /// Value returned outside the grid (default: linear extrapolation).
    #[arg(long, allow_negative_numbers = true)]
    pub fill_value: Option<f64>,

    /// Interpolation method.
    #[arg(long, value_enum, default_value_t = InterpMethod::Linear)]
    pub method: InterpMethod,
}

#[derive(Debug, Args, Clone)]
pub struct InfoArgs {
    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args, Clone)]
pub struct EvalArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Magnitude of a single query.
    #[arg(long, requires = "color", conflicts_with = "points", allow_negative_numbers = true)]
    pub mag: Option<f64>,

    /// Color of a single query.
    #[arg(long, requires = "mag", conflicts_with = "points", allow_negative_numbers = true)]
    pub color: Option<f64>,

    /// CSV with `mag` and `color` columns.
    #[arg(long, value_name = "CSV")]
    pub points: Option<PathBuf>,

    /// Write results as CSV to this file.
    #[arg(long, value_name = "CSV")]
    pub out: Option<PathBuf>,

    /// Print CSV to stdout instead of a table.
    #[arg(long)]
    pub csv: bool,
}

#[derive(Debug, Args, Clone)]
pub struct GridArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Export the smoothed grid (with config and centers) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Export the smoothed grid to CSV (one row per cell).
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Render an ASCII heatmap in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for plotting a saved grid.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Grid JSON file produced by `one-datum grid --export-json`.
    #[arg(long = "grid-json", value_name = "JSON")]
    pub grid_json: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output FITS path.
    #[arg(long, value_name = "FITS")]
    pub out: PathBuf,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub min_col: f64,

    #[arg(long, default_value_t = 3.0, allow_negative_numbers = true)]
    pub max_col: f64,

    #[arg(long, default_value_t = 12)]
    pub num_col: usize,

    #[arg(long, default_value_t = 4.0, allow_negative_numbers = true)]
    pub min_mag: f64,

    #[arg(long, default_value_t = 13.0, allow_negative_numbers = true)]
    pub max_mag: f64,

    #[arg(long, default_value_t = 18)]
    pub num_mag: usize,

    /// Samples per grid cell.
    #[arg(long, default_value_t = 64)]
    pub samples: usize,

    /// Per-sample scatter in ln(sigma).
    #[arg(long, default_value_t = 0.3)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
