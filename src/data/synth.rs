//! Synthetic uncertainty grids.
//!
//! Produces a `(GridHeader, SampleCube)` pair shaped like the real lookup table:
//! a smooth ln(sigma) surface that rises with magnitude and with distance from
//! a reference color, plus Gaussian scatter per sample. Useful for demos,
//! tests and for exercising the model without the bundled data file.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{GridHeader, SampleCube};
use crate::error::ModelError;
use crate::math::BinAxis;

/// Reference magnitude where the noiseless surface equals `LN_SIGMA_REF`.
const MAG_REF: f64 = 8.0;
const COLOR_REF: f64 = 1.0;
const LN_SIGMA_REF: f64 = -1.2;
/// d ln(sigma) / d mag.
const MAG_SLOPE: f64 = 0.35;
const COLOR_CURVATURE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub header: GridHeader,
    pub samples_per_cell: usize,
    /// Standard deviation of the per-sample scatter in ln(sigma).
    pub noise_sigma: f64,
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            header: GridHeader {
                min_col: 0.0,
                max_col: 3.0,
                num_col: 12,
                min_mag: 4.0,
                max_mag: 13.0,
                num_mag: 18,
            },
            samples_per_cell: 64,
            noise_sigma: 0.3,
            seed: 42,
        }
    }
}

/// Noiseless ln(sigma) surface used by the generator.
pub fn reference_ln_sigma(mag: f64, color: f64) -> f64 {
    let dc = color - COLOR_REF;
    LN_SIGMA_REF + MAG_SLOPE * (mag - MAG_REF) + COLOR_CURVATURE * dc * dc
}

fn validate(config: &SynthConfig) -> Result<(), ModelError> {
    let h = &config.header;
    for (name, min, max) in [("color", h.min_col, h.max_col), ("magnitude", h.min_mag, h.max_mag)] {
        if !(min.is_finite() && max.is_finite() && max > min) {
            return Err(ModelError::InvalidConfig(format!(
                "invalid {name} range: min={min}, max={max} (must be finite and max>min)"
            )));
        }
    }
    if h.num_col < 2 || h.num_mag < 2 {
        return Err(ModelError::InvalidConfig("bin counts must be >= 2".to_string()));
    }
    if config.samples_per_cell == 0 {
        return Err(ModelError::InvalidConfig("samples per cell must be > 0".to_string()));
    }
    if !(config.noise_sigma.is_finite() && config.noise_sigma >= 0.0) {
        return Err(ModelError::InvalidConfig(format!(
            "noise sigma must be finite and >= 0, got {}",
            config.noise_sigma
        )));
    }
    Ok(())
}

/// Generate a synthetic grid. Identical configs give identical grids.
pub fn generate_grid(config: &SynthConfig) -> Result<(GridHeader, SampleCube), ModelError> {
    validate(config)?;
    let h = config.header;
    let mag_axis = BinAxis::uniform(h.min_mag, h.max_mag, h.num_mag);
    let color_axis = BinAxis::uniform(h.min_col, h.max_col, h.num_col);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_sigma)
        .map_err(|e| ModelError::InvalidConfig(format!("noise distribution error: {e}")))?;

    let ns = config.samples_per_cell;
    let mut data = Vec::with_capacity(h.num_mag * h.num_col * ns);
    for &mag in &mag_axis.centers {
        for &color in &color_axis.centers {
            let level = reference_ln_sigma(mag, color);
            for _ in 0..ns {
                data.push(level + noise.sample(&mut rng));
            }
        }
    }

    let cube = SampleCube::new([h.num_mag, h.num_col, ns], data)
        .ok_or_else(|| ModelError::InvalidConfig("synthetic cube size mismatch".to_string()))?;
    tracing::debug!(seed = config.seed, samples = ns, "generated synthetic grid");
    Ok((h, cube))
}
