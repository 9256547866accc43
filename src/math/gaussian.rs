//! Separable Gaussian smoothing for 2-D grids.
//!
//! The filter follows the usual image-processing conventions:
//!
//! - kernel radius `floor(truncate * sigma + 0.5)` with `truncate = 4`
//! - weights `exp(-x^2 / (2 sigma^2))`, normalized to sum to one
//! - `reflect` boundaries (`d c b a | a b c d | d c b a`), repeated when the
//!   kernel is wider than the axis
//!
//! Reflection is periodic with period `2n` on an axis of `n` cells, so a
//! kernel at least as wide as the axis is folded onto `2n` offsets before it
//! is applied. Work per output cell is then bounded by the axis length rather
//! than by sigma.
//!
//! Axes are filtered one after the other (rows/magnitude first). A sigma of
//! `1e-15` or less (including negative and NaN values) skips that axis, so a
//! zero smoothing scale is the identity.

use nalgebra::DMatrix;

/// Kernel half-width in units of sigma.
pub const TRUNCATE: f64 = 4.0;

/// Sigmas at or below this are treated as "no smoothing".
const MIN_SIGMA: f64 = 1e-15;

/// Normalized 1-D Gaussian kernel of length `2 * radius + 1`.
pub fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f64> {
    let r = radius as i64;
    let scale = -0.5 / (sigma * sigma);
    let mut weights: Vec<f64> = (-r..=r).map(|x| (scale * (x * x) as f64).exp()).collect();
    let total: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= total;
    }
    weights
}

/// Kernel radius for `sigma` (see module docs). Saturates for huge sigmas.
pub fn kernel_radius(sigma: f64) -> usize {
    (TRUNCATE * sigma + 0.5) as usize
}

/// Folds up to this many taps one by one; wider kernels use the
/// Euler-Maclaurin sum per residue class.
const MAX_DIRECT_TAPS: usize = 1 << 22;

/// Simpson panels for the central kernel mass.
const MASS_PANELS: usize = 1024;

/// `integral of exp(-s^2 / 2) over [-t, t]`, composite Simpson.
fn standard_gaussian_mass(t: f64) -> f64 {
    let h = t / MASS_PANELS as f64;
    let f = |s: f64| (-0.5 * s * s).exp();
    let mut acc = f(0.0) + f(t);
    for i in 1..MASS_PANELS {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        acc += weight * f(i as f64 * h);
    }
    2.0 * acc * h / 3.0
}

/// Truncated Gaussian folded onto `2 * n` offsets: entry `d` holds the
/// normalized weight of every tap `k` in `-radius..=radius` with
/// `k mod 2n == d`.
fn folded_kernel(sigma: f64, radius: usize, n: usize, max_direct: usize) -> Vec<f64> {
    let period = 2 * n;
    let g = |x: f64| (-0.5 * (x / sigma) * (x / sigma)).exp();
    let mut folded = vec![0.0; period];

    if radius <= max_direct {
        let r = radius as i64;
        let p = period as i64;
        for k in -r..=r {
            folded[k.rem_euclid(p) as usize] += g(k as f64);
        }
    } else {
        // Each residue class samples the Gaussian every `period` cells, far
        // finer than sigma, so the class sum is its integral plus endpoint
        // corrections.
        let dg = |x: f64| -x / (sigma * sigma) * g(x);
        let simpson = |a: f64, b: f64| (b - a) / 6.0 * (g(a) + 4.0 * g(0.5 * (a + b)) + g(b));
        let (r, p) = (radius as i128, period as i128);
        let (rf, pf) = (radius as f64, period as f64);
        let mass = sigma * standard_gaussian_mass(rf / sigma);
        for (d, w) in folded.iter_mut().enumerate() {
            let d = d as i128;
            // Distance from each window edge to the outermost tap of the class.
            let off_lo = (d + r).rem_euclid(p) as f64;
            let off_hi = (r - d).rem_euclid(p) as f64;
            let (lo, hi) = (-(rf - off_lo), rf - off_hi);
            let inner = mass - simpson(rf - off_lo, rf) - simpson(rf - off_hi, rf);
            *w = inner / pf + 0.5 * (g(lo) + g(hi)) + pf / 12.0 * (dg(hi) - dg(lo));
        }
    }

    let total: f64 = folded.iter().sum();
    for w in &mut folded {
        *w /= total;
    }
    folded
}

/// Weights applied along one axis.
enum LineKernel {
    /// Centered taps, narrower than the axis.
    Taps(Vec<f64>),
    /// Weights per offset modulo `2n`.
    Folded(Vec<f64>),
}

impl LineKernel {
    fn new(sigma: f64, n: usize) -> Self {
        let radius = kernel_radius(sigma);
        if radius < n {
            Self::Taps(gaussian_kernel(sigma, radius))
        } else {
            Self::Folded(folded_kernel(sigma, radius, n, MAX_DIRECT_TAPS))
        }
    }
}

/// Map an out-of-range index onto `0..n` with reflect boundaries.
fn reflect_index(i: i64, n: usize) -> usize {
    let n = n as i64;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m >= n { (period - 1 - m) as usize } else { m as usize }
}

/// Correlate a 1-D line with `kernel`, reflect boundaries.
fn filter_line(line: &[f64], kernel: &LineKernel, out: &mut [f64]) {
    let n = line.len();
    match kernel {
        LineKernel::Taps(weights) => {
            let radius = (weights.len() / 2) as i64;
            for (i, slot) in out.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (k, w) in weights.iter().enumerate() {
                    let j = i as i64 + k as i64 - radius;
                    acc += w * line[reflect_index(j, n)];
                }
                *slot = acc;
            }
        }
        LineKernel::Folded(weights) => {
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = weights
                    .iter()
                    .enumerate()
                    .map(|(d, w)| w * line[reflect_index((i + d) as i64, n)])
                    .sum();
            }
        }
    }
}

/// Smooth `grid` with per-axis sigmas `(sigma_rows, sigma_cols)` in cell units.
///
/// Returns a new matrix of the same shape; the input is not modified.
pub fn gaussian_filter_2d(grid: &DMatrix<f64>, sigma_rows: f64, sigma_cols: f64) -> DMatrix<f64> {
    let mut out = grid.clone();
    let (nrows, ncols) = out.shape();
    if nrows == 0 || ncols == 0 {
        return out;
    }

    if sigma_rows > MIN_SIGMA {
        let kernel = LineKernel::new(sigma_rows, nrows);
        let mut line = vec![0.0; nrows];
        let mut filtered = vec![0.0; nrows];
        for c in 0..ncols {
            for r in 0..nrows {
                line[r] = out[(r, c)];
            }
            filter_line(&line, &kernel, &mut filtered);
            for r in 0..nrows {
                out[(r, c)] = filtered[r];
            }
        }
    }

    if sigma_cols > MIN_SIGMA {
        let kernel = LineKernel::new(sigma_cols, ncols);
        let mut line = vec![0.0; ncols];
        let mut filtered = vec![0.0; ncols];
        for r in 0..nrows {
            for c in 0..ncols {
                line[c] = out[(r, c)];
            }
            filter_line(&line, &kernel, &mut filtered);
            for c in 0..ncols {
                out[(r, c)] = filtered[c];
            }
        }
    }

    out
}
