//! ASCII heatmap of a smoothed ln(sigma) grid.
//!
//! This is intentionally "dumb" (fixed character ramp, nearest-cell sampling),
//! optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Rows are magnitude (bright at the top), columns are color (blue on the left).
//! Darker glyphs mean larger uncertainty.

use crate::domain::GridFile;

/// Glyphs from lowest to highest value.
const RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Render a heatmap for an exported/in-memory grid file.
pub fn render_grid_heatmap(grid: &GridFile, width: usize, height: usize) -> String {
    render_heatmap(&grid.mag_centers, &grid.color_centers, &grid.ln_sigma, width, height)
}

/// Render `values[mag][color]` into a `width x height` character plot.
pub fn render_heatmap(
    mag_centers: &[f64],
    color_centers: &[f64],
    values: &[Vec<f64>],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let nm = values.len();
    let nc = values.first().map_or(0, Vec::len);
    if nm == 0 || nc == 0 || mag_centers.len() != nm || color_centers.len() != nc {
        return "Plot: empty grid\n".to_string();
    }

    let (v_min, v_max) = value_range(values).unwrap_or((0.0, 1.0));

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: mag=[{:.2}, {:.2}] | color=[{:.2}, {:.2}] | ln_sigma=[{v_min:.3}, {v_max:.3}]\n",
        mag_centers[0],
        mag_centers[nm - 1],
        color_centers[0],
        color_centers[nc - 1],
    ));

    for row in 0..height {
        let m = map_index(row, height, nm);
        let line: String = (0..width)
            .map(|col| {
                let c = map_index(col, width, nc);
                glyph(values[m][c], v_min, v_max)
            })
            .collect();
        out.push_str(&line);
        out.push('\n');
    }

    out
}

fn value_range(values: &[Vec<f64>]) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values.iter().flatten().copied().filter(|v| v.is_finite()) {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v.is_finite() && max_v.is_finite() {
        Some((min_v, max_v))
    } else {
        None
    }
}

/// Map a plot cell `i` of `n_plot` to a grid index of `n_grid`.
fn map_index(i: usize, n_plot: usize, n_grid: usize) -> usize {
    ((i * n_grid) / n_plot).min(n_grid - 1)
}

fn glyph(v: f64, v_min: f64, v_max: f64) -> char {
    if !v.is_finite() {
        return '?';
    }
    let span = v_max - v_min;
    if span <= 0.0 {
        return RAMP[RAMP.len() / 2];
    }
    let u = ((v - v_min) / span).clamp(0.0, 1.0);
    let idx = (u * (RAMP.len() - 1) as f64).round() as usize;
    RAMP[idx]
}
