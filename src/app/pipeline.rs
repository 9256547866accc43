//! Shared "build the model" logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! resolve grid path -> load grid -> derive config -> smooth -> interpolant

use std::path::PathBuf;

use crate::cli::ModelArgs;
use crate::domain::UncertaintyConfig;
use crate::error::AppError;
use crate::math::GridInterpolator;
use crate::model::{UncertaintyGrid, bundled_grid_path};

/// A loaded grid together with the config derived from the CLI.
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub path: PathBuf,
    pub config: UncertaintyConfig,
    pub grid: UncertaintyGrid,
}

impl ModelRun {
    pub fn interpolator(&self) -> Result<GridInterpolator, AppError> {
        Ok(self.grid.interpolator(&self.config)?)
    }
}

pub fn config_from_args(args: &ModelArgs) -> UncertaintyConfig {
    UncertaintyConfig {
        color_smoothing_scale: args.color_smoothing_scale,
        mag_smoothing_scale: args.mag_smoothing_scale,
        bounds_error: args.bounds_error,
        fill_value: args.fill_value,
        method: args.method,
    }
}

/// Resolve the grid path and load it.
pub fn load_model(args: &ModelArgs) -> Result<ModelRun, AppError> {
    let path = args.grid.clone().unwrap_or_else(bundled_grid_path);
    tracing::debug!(path = %path.display(), "resolving uncertainty grid");
    let grid = UncertaintyGrid::open(&path)?;
    Ok(ModelRun {
        path,
        config: config_from_args(args),
        grid,
    })
}
