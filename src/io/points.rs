//! Query points in, evaluated uncertainties out (CSV).
//!
//! Input needs `mag` and `color` columns (any order, extra columns ignored).

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One `(magnitude, color)` query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    pub mag: f64,
    pub color: f64,
}

/// One evaluated query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluatedPoint {
    pub mag: f64,
    pub color: f64,
    pub ln_sigma: f64,
    pub sigma: f64,
}

impl EvaluatedPoint {
    pub fn new(point: QueryPoint, ln_sigma: f64) -> Self {
        Self {
            mag: point.mag,
            color: point.color,
            ln_sigma,
            sigma: ln_sigma.exp(),
        }
    }
}

/// Read query points from a CSV file with a header row.
pub fn read_query_points(path: &Path) -> Result<Vec<QueryPoint>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to open points CSV '{}': {e}", path.display())))?;

    let mut points = Vec::new();
    for (idx, row) in reader.deserialize::<QueryPoint>().enumerate() {
        // +2: header row, 1-based lines.
        let line = idx + 2;
        let point = row.map_err(|e| AppError::new(2, format!("Invalid points CSV row at line {line}: {e}")))?;
        points.push(point);
    }
    Ok(points)
}

/// Write evaluated points as CSV to any writer (stdout or a file).
pub fn write_evaluated<W: Write>(out: W, rows: &[EvaluatedPoint]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write results CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush results CSV: {e}")))?;
    Ok(())
}
