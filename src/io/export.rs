//! Export the smoothed grid to CSV.
//!
//! One row per cell in long format, which is easy to load into spreadsheets or
//! plotting scripts.

use std::path::Path;

use crate::domain::GridFile;
use crate::error::AppError;

/// Write `mag,color,ln_sigma,sigma` rows for every cell of `grid`.
pub fn write_grid_csv(path: &Path, grid: &GridFile) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writer
        .write_record(["mag", "color", "ln_sigma", "sigma"])
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (mag, row) in grid.mag_centers.iter().zip(&grid.ln_sigma) {
        for (color, ln_sigma) in grid.color_centers.iter().zip(row) {
            writer
                .write_record([
                    format!("{mag:.6}"),
                    format!("{color:.6}"),
                    format!("{ln_sigma:.10}"),
                    format!("{:.10}", ln_sigma.exp()),
                ])
                .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
