//! Read/write smoothed-grid JSON files.
//!
//! Grid JSON is the portable representation of a built model:
//! - the header and the config it was built with
//! - the derived smoothing widths
//! - bin centers and the smoothed ln(sigma) values
//!
//! The schema is defined by `domain::GridFile`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::domain::{GridFile, UncertaintyConfig};
use crate::error::{AppError, ModelError};
use crate::model::UncertaintyGrid;

/// Snapshot the smoothed grid for `config`.
pub fn build_grid_file(grid: &UncertaintyGrid, config: &UncertaintyConfig) -> Result<GridFile, ModelError> {
    let widths = grid.smoothing_widths(config)?;
    let smoothed = grid.smoothed(config)?;
    let ln_sigma = smoothed
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect();

    Ok(GridFile {
        tool: "one-datum".to_string(),
        header: *grid.header(),
        config: config.clone(),
        widths,
        mag_centers: grid.mag_axis().centers.clone(),
        color_centers: grid.color_axis().centers.clone(),
        ln_sigma,
    })
}

/// Write a grid JSON file.
pub fn write_grid_json(path: &Path, grid: &GridFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create grid JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), grid)
        .map_err(|e| AppError::new(2, format!("Failed to write grid JSON: {e}")))?;
    Ok(())
}

/// Read a grid JSON file.
pub fn read_grid_json(path: &Path) -> Result<GridFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open grid JSON '{}': {e}", path.display())))?;
    let grid: GridFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid grid JSON: {e}")))?;

    let rows_ok = grid.ln_sigma.len() == grid.mag_centers.len()
        && grid.ln_sigma.iter().all(|row| row.len() == grid.color_centers.len());
    if !rows_ok {
        return Err(AppError::new(2, "Invalid grid JSON: ln_sigma does not match the bin centers."));
    }
    Ok(grid)
}
