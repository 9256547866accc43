//! Uniform bin edges and centers.
//!
//! The grid file only stores bounds and counts; edges are rebuilt with the
//! same `linspace` rule used when the grid was binned, and the interpolant
//! lives on the bin centers.

/// `num` evenly spaced values from `start` to `stop` (both inclusive).
///
/// The last value is set to `stop` exactly. `num == 1` yields `[start]`.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num as f64 - 1.0);
            let mut out: Vec<f64> = (0..num).map(|i| start + step * i as f64).collect();
            out[num - 1] = stop;
            out
        }
    }
}

/// Midpoints of consecutive edges (one shorter than `edges`).
pub fn bin_centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| 0.5 * (w[1] + w[0])).collect()
}

/// Edges and centers for one grid axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BinAxis {
    pub edges: Vec<f64>,
    pub centers: Vec<f64>,
}

impl BinAxis {
    /// `count` uniform bins between `min` and `max` (`count + 1` edges).
    pub fn uniform(min: f64, max: f64, count: usize) -> Self {
        let edges = linspace(min, max, count + 1);
        let centers = bin_centers(&edges);
        Self { edges, centers }
    }

    /// Width of the first bin; all bins share it up to rounding.
    pub fn width(&self) -> f64 {
        match self.edges.as_slice() {
            [a, b, ..] => b - a,
            _ => f64::NAN,
        }
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Convert a physical smoothing scale into bin-width units.
    pub fn scale_to_cells(&self, scale: f64) -> f64 {
        scale / self.width()
    }
}
