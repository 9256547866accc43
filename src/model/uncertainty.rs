//! The radial-velocity uncertainty model.
//!
//! Pipeline:
//!
//! 1. read `MIN_COL, MAX_COL, NUM_COL, MIN_MAG, MAX_MAG, NUM_MAG` from the primary
//!    header and the `(mag, color, sample)` cube from the first extension
//! 2. rebuild uniform bin edges per axis (`count + 1` edges)
//! 3. convert each smoothing scale to cells: `scale / (edges[1] - edges[0])`
//! 4. average the cube over its sample axis
//! 5. Gaussian-smooth the mean grid with `(mag_cells, color_cells)`
//! 6. interpolate on the bin centers
//!
//! The result is a `GridInterpolator` mapping `(magnitude, color)` to ln(sigma).

use std::path::{Path, PathBuf};

use nalgebra::DMatrix;

use crate::domain::{GridHeader, SampleCube, SmoothingWidths, UncertaintyConfig};
use crate::error::ModelError;
use crate::io::fits::GridFits;
use crate::math::{BinAxis, BoundsPolicy, GridInterpolator, gaussian_filter_2d};

/// Environment variable overriding the bundled grid location.
pub const GRID_PATH_ENV: &str = "ONE_DATUM_GRID";

/// File name of the bundled grid under `data/`.
pub const GRID_FILE_NAME: &str = "rv_uncertainty_grid.fits";

/// Location of the grid used by [`get_uncertainty_model`].
///
/// `$ONE_DATUM_GRID` if set, otherwise `data/rv_uncertainty_grid.fits` in the
/// crate root.
pub fn bundled_grid_path() -> PathBuf {
    match std::env::var_os(GRID_PATH_ENV) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(GRID_FILE_NAME),
    }
}

/// Build the uncertainty model from the bundled grid.
pub fn get_uncertainty_model(config: &UncertaintyConfig) -> Result<GridInterpolator, ModelError> {
    load_uncertainty_model(&bundled_grid_path(), config)
}

/// Build the uncertainty model from an explicit grid file.
pub fn load_uncertainty_model(path: &Path, config: &UncertaintyConfig) -> Result<GridInterpolator, ModelError> {
    UncertaintyGrid::open(path)?.interpolator(config)
}

fn count_key(fits: &mut GridFits, key: &str) -> Result<usize, ModelError> {
    let n = fits.integer_key(key)?;
    if n < 2 {
        return Err(ModelError::invalid_header(key, format!("need at least 2 bins, got {n}")));
    }
    usize::try_from(n).map_err(|_| ModelError::invalid_header(key, "bin count too large"))
}

fn bounds_keys(fits: &mut GridFits, min_key: &str, max_key: &str) -> Result<(f64, f64), ModelError> {
    let min = fits.float_key(min_key)?;
    let max = fits.float_key(max_key)?;
    if !(min.is_finite() && max.is_finite()) {
        return Err(ModelError::invalid_header(min_key, format!("bounds must be finite ({min}, {max})")));
    }
    if max <= min {
        return Err(ModelError::invalid_header(
            max_key,
            format!("{max_key} = {max} must be greater than {min_key} = {min}"),
        ));
    }
    Ok((min, max))
}

/// Read and validate the grid description from the primary header.
pub fn grid_header_from_fits(fits: &mut GridFits) -> Result<GridHeader, ModelError> {
    let (min_col, max_col) = bounds_keys(fits, GridHeader::KEY_MIN_COL, GridHeader::KEY_MAX_COL)?;
    let num_col = count_key(fits, GridHeader::KEY_NUM_COL)?;
    let (min_mag, max_mag) = bounds_keys(fits, GridHeader::KEY_MIN_MAG, GridHeader::KEY_MAX_MAG)?;
    let num_mag = count_key(fits, GridHeader::KEY_NUM_MAG)?;
    Ok(GridHeader {
        min_col,
        max_col,
        num_col,
        min_mag,
        max_mag,
        num_mag,
    })
}

/// A loaded, unsmoothed uncertainty grid.
///
/// Holds the per-cell mean of the sample cube; the cube itself is dropped
/// once the mean is taken.
#[derive(Debug, Clone)]
pub struct UncertaintyGrid {
    header: GridHeader,
    mag_axis: BinAxis,
    color_axis: BinAxis,
    mean: DMatrix<f64>,
    num_samples: usize,
}

impl UncertaintyGrid {
    /// Read a grid file.
    pub fn open(path: &Path) -> Result<Self, ModelError> {
        let (header, image) = {
            let mut fits = GridFits::open(path)?;
            let header = grid_header_from_fits(&mut fits)?;
            (header, fits.read_first_image()?)
        };

        let [nm, nc, ns] = match image.shape.as_slice() {
            [a, b, c] => [*a, *b, *c],
            other => {
                return Err(ModelError::format(
                    path,
                    format!("expected a 3-D image, found {} axes", other.len()),
                ));
            }
        };
        let cube = SampleCube::new([nm, nc, ns], image.data)
            .ok_or_else(|| ModelError::format(path, "image data length does not match its axes"))?;

        let grid = Self::from_parts(header, &cube).map_err(|e| match e {
            ModelError::InvalidConfig(message) => ModelError::format(path, message),
            other => other,
        })?;
        tracing::info!(
            path = %path.display(),
            num_mag = nm,
            num_col = nc,
            samples = ns,
            "loaded uncertainty grid"
        );
        Ok(grid)
    }

    /// Build from an in-memory header and cube (shape `(num_mag, num_col, samples)`).
    pub fn from_parts(header: GridHeader, cube: &SampleCube) -> Result<Self, ModelError> {
        let [nm, nc, ns] = cube.shape();
        if (nm, nc) != (header.num_mag, header.num_col) {
            return Err(ModelError::InvalidConfig(format!(
                "sample cube is {nm} x {nc} bins but the header declares NUM_MAG = {} and NUM_COL = {}",
                header.num_mag, header.num_col
            )));
        }
        if ns == 0 {
            return Err(ModelError::InvalidConfig("sample axis is empty".to_string()));
        }

        Ok(Self {
            header,
            mag_axis: BinAxis::uniform(header.min_mag, header.max_mag, header.num_mag),
            color_axis: BinAxis::uniform(header.min_col, header.max_col, header.num_col),
            mean: cube.mean_last_axis(),
            num_samples: ns,
        })
    }

    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    pub fn mag_axis(&self) -> &BinAxis {
        &self.mag_axis
    }

    pub fn color_axis(&self) -> &BinAxis {
        &self.color_axis
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Unsmoothed mean ln(sigma), `(num_mag, num_col)`.
    pub fn mean_grid(&self) -> &DMatrix<f64> {
        &self.mean
    }

    /// Smoothing scales converted to grid cells.
    pub fn smoothing_widths(&self, config: &UncertaintyConfig) -> Result<SmoothingWidths, ModelError> {
        for (name, scale) in [
            ("mag_smoothing_scale", config.mag_smoothing_scale),
            ("color_smoothing_scale", config.color_smoothing_scale),
        ] {
            if scale.is_infinite() {
                return Err(ModelError::InvalidConfig(format!("{name} must be finite, got {scale}")));
            }
        }
        let widths = SmoothingWidths {
            mag_cells: self.mag_axis.scale_to_cells(config.mag_smoothing_scale),
            color_cells: self.color_axis.scale_to_cells(config.color_smoothing_scale),
        };
        tracing::debug!(
            mag_cells = widths.mag_cells,
            color_cells = widths.color_cells,
            "smoothing widths"
        );
        Ok(widths)
    }

    /// Smoothed ln(sigma) grid.
    pub fn smoothed(&self, config: &UncertaintyConfig) -> Result<DMatrix<f64>, ModelError> {
        let widths = self.smoothing_widths(config)?;
        Ok(gaussian_filter_2d(&self.mean, widths.mag_cells, widths.color_cells))
    }

    /// Smooth and wrap in an interpolant over the bin centers.
    pub fn interpolator(&self, config: &UncertaintyConfig) -> Result<GridInterpolator, ModelError> {
        let smoothed = self.smoothed(config)?;
        GridInterpolator::new(
            self.mag_axis.centers.clone(),
            self.color_axis.centers.clone(),
            smoothed,
            config.method,
            BoundsPolicy {
                bounds_error: config.bounds_error,
                fill_value: config.fill_value,
            },
        )
    }
}
