//! Formatted terminal output.
//!
//! We keep formatting code in one place so the model code stays clean and
//! output changes are localized.

use crate::domain::{SmoothingWidths, UncertaintyConfig};
use crate::io::EvaluatedPoint;
use crate::math::BinAxis;
use crate::model::UncertaintyGrid;

fn axis_line(name: &str, axis: &BinAxis) -> String {
    let n = axis.len();
    format!(
        "{name:<9} edges=[{:.4}, {:.4}] bins={n} width={:.4} | centers=[{:.4}, {:.4}]\n",
        axis.edges[0],
        axis.edges[n],
        axis.width(),
        axis.centers[0],
        axis.centers[n - 1],
    )
}

/// Grid description plus the smoothing derived from `config`.
pub fn format_grid_summary(grid: &UncertaintyGrid, config: &UncertaintyConfig, widths: &SmoothingWidths) -> String {
    let mut out = String::new();
    out.push_str("=== one-datum - RV uncertainty grid ===\n");
    out.push_str(&axis_line("magnitude", grid.mag_axis()));
    out.push_str(&axis_line("color", grid.color_axis()));
    out.push_str(&format!("Samples per cell: {}\n", grid.num_samples()));

    let (lo, hi) = grid
        .mean_grid()
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo.is_finite() {
        out.push_str(&format!("Mean ln_sigma: [{lo:.4}, {hi:.4}]\n"));
    }

    out.push_str(&format!(
        "Smoothing: mag={} ({:.4} cells) | color={} ({:.4} cells)\n",
        config.mag_smoothing_scale, widths.mag_cells, config.color_smoothing_scale, widths.color_cells,
    ));
    let fill = match (config.bounds_error, config.fill_value) {
        (true, _) => "error".to_string(),
        (false, Some(v)) => format!("fill {v}"),
        (false, None) => "extrapolate".to_string(),
    };
    out.push_str(&format!("Interpolation: {:?} | out of range: {fill}\n", config.method));
    out
}

/// One line per evaluated point.
pub fn format_evaluations(rows: &[EvaluatedPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>10} {:>10} {:>12} {:>12}\n", "mag", "color", "ln_sigma", "sigma"));
    for r in rows {
        out.push_str(&format!(
            "{:>10.4} {:>10.4} {:>12.6} {:>12.6}\n",
            r.mag, r.color, r.ln_sigma, r.sigma
        ));
    }
    out
}
