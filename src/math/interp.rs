//! Regular-grid interpolation over `(magnitude, color)`.
//!
//! The grid is rectilinear: values sit at the outer product of two strictly
//! increasing coordinate vectors. Queries locate their cell independently per
//! axis; the same cell formula is used inside and outside the grid, so with no
//! fill value an out-of-range query extrapolates linearly from the edge cell.

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::domain::InterpMethod;
use crate::error::ModelError;

/// Out-of-range handling for [`GridInterpolator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsPolicy {
    pub bounds_error: bool,
    pub fill_value: Option<f64>,
}

/// Immutable 2-D interpolant. Cheap to share across threads.
#[derive(Debug, Clone)]
pub struct GridInterpolator {
    mag: Vec<f64>,
    color: Vec<f64>,
    values: DMatrix<f64>,
    method: InterpMethod,
    policy: BoundsPolicy,
}

/// Cell index and fractional position along one axis.
#[derive(Debug, Clone, Copy)]
struct AxisPos {
    i: usize,
    t: f64,
    out_of_bounds: bool,
}

fn validate_axis(name: &str, coords: &[f64]) -> Result<(), ModelError> {
    if coords.len() < 2 {
        return Err(ModelError::InvalidConfig(format!(
            "{name} axis needs at least 2 grid points, got {}",
            coords.len()
        )));
    }
    if coords.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidConfig(format!("{name} axis has non-finite coordinates")));
    }
    if coords.windows(2).any(|w| w[1] <= w[0]) {
        return Err(ModelError::InvalidConfig(format!(
            "{name} axis coordinates must be strictly increasing"
        )));
    }
    Ok(())
}

fn locate(grid: &[f64], x: f64) -> AxisPos {
    let n = grid.len();
    // Number of grid points strictly below x, minus one, clamped to a valid cell.
    let below = grid.partition_point(|&g| g < x);
    let i = below.saturating_sub(1).min(n - 2);
    let t = (x - grid[i]) / (grid[i + 1] - grid[i]);
    AxisPos {
        i,
        t,
        out_of_bounds: x < grid[0] || x > grid[n - 1],
    }
}

impl GridInterpolator {
    /// Build an interpolant. `values` has one row per magnitude coordinate and
    /// one column per color coordinate.
    pub fn new(
        mag: Vec<f64>,
        color: Vec<f64>,
        values: DMatrix<f64>,
        method: InterpMethod,
        policy: BoundsPolicy,
    ) -> Result<Self, ModelError> {
        validate_axis("magnitude", &mag)?;
        validate_axis("color", &color)?;
        if values.shape() != (mag.len(), color.len()) {
            return Err(ModelError::InvalidConfig(format!(
                "grid values have shape {:?}, expected ({}, {})",
                values.shape(),
                mag.len(),
                color.len()
            )));
        }
        if policy.bounds_error && policy.fill_value.is_some() {
            tracing::debug!("fill_value is ignored when bounds_error is set");
        }
        Ok(Self {
            mag,
            color,
            values,
            method,
            policy,
        })
    }

    pub fn mag_centers(&self) -> &[f64] {
        &self.mag
    }

    pub fn color_centers(&self) -> &[f64] {
        &self.color
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn method(&self) -> InterpMethod {
        self.method
    }

    pub fn policy(&self) -> BoundsPolicy {
        self.policy
    }

    /// `((mag_min, mag_max), (color_min, color_max))` covered without extrapolation.
    pub fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (
            (self.mag[0], self.mag[self.mag.len() - 1]),
            (self.color[0], self.color[self.color.len() - 1]),
        )
    }

    /// Interpolated ln(sigma) at `(mag, color)`.
    ///
    /// A NaN coordinate counts as out of range when `bounds_error` is set;
    /// otherwise it yields NaN.
    pub fn evaluate(&self, mag: f64, color: f64) -> Result<f64, ModelError> {
        if self.policy.bounds_error {
            self.check_bounds(mag, color)?;
        }
        if mag.is_nan() || color.is_nan() {
            return Ok(f64::NAN);
        }

        let pm = locate(&self.mag, mag);
        let pc = locate(&self.color, color);
        if pm.out_of_bounds || pc.out_of_bounds {
            if let Some(fill) = self.policy.fill_value {
                return Ok(fill);
            }
        }

        Ok(match self.method {
            InterpMethod::Linear => self.bilinear(pm, pc),
            InterpMethod::Nearest => self.nearest(pm, pc),
        })
    }

    fn check_bounds(&self, mag: f64, color: f64) -> Result<(), ModelError> {
        let ((m0, m1), (c0, c1)) = self.domain();
        if !(m0..=m1).contains(&mag) {
            return Err(ModelError::OutOfBounds {
                axis: "magnitude",
                value: mag,
                min: m0,
                max: m1,
            });
        }
        if !(c0..=c1).contains(&color) {
            return Err(ModelError::OutOfBounds {
                axis: "color",
                value: color,
                min: c0,
                max: c1,
            });
        }
        Ok(())
    }

    /// Evaluate many points in parallel. Fails on the first out-of-range point
    /// when `bounds_error` is set.
    pub fn evaluate_many(&self, points: &[(f64, f64)]) -> Result<Vec<f64>, ModelError> {
        points
            .par_iter()
            .map(|&(mag, color)| self.evaluate(mag, color))
            .collect()
    }

    fn bilinear(&self, pm: AxisPos, pc: AxisPos) -> f64 {
        let v = &self.values;
        let (i, j) = (pm.i, pc.i);
        let (tm, tc) = (pm.t, pc.t);
        v[(i, j)] * (1.0 - tm) * (1.0 - tc)
            + v[(i, j + 1)] * (1.0 - tm) * tc
            + v[(i + 1, j)] * tm * (1.0 - tc)
            + v[(i + 1, j + 1)] * tm * tc
    }

    fn nearest(&self, pm: AxisPos, pc: AxisPos) -> f64 {
        let i = if pm.t <= 0.5 { pm.i } else { pm.i + 1 };
        let j = if pc.t <= 0.5 { pc.i } else { pc.i + 1 };
        self.values[(i, j)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(policy: BoundsPolicy, method: InterpMethod) -> GridInterpolator {
        // v = 2 * mag + color on a 3 x 2 grid.
        let mag = vec![10.0, 11.0, 12.0];
        let color = vec![0.0, 1.0];
        let values = DMatrix::from_fn(3, 2, |r, c| 2.0 * mag[r] + color[c]);
        GridInterpolator::new(mag, color, values, method, policy).unwrap()
    }

    fn extrapolating() -> BoundsPolicy {
        BoundsPolicy {
            bounds_error: false,
            fill_value: None,
        }
    }

    #[test]
    fn reproduces_grid_points() {
        let interp = plane(extrapolating(), InterpMethod::Linear);
        for (r, &m) in [10.0, 11.0, 12.0].iter().enumerate() {
            for (c, &col) in [0.0, 1.0].iter().enumerate() {
                let v = interp.evaluate(m, col).unwrap();
                assert_eq!(v, interp.values()[(r, c)]);
            }
        }
    }

    #[test]
    fn linear_is_exact_on_a_plane() {
        let interp = plane(extrapolating(), InterpMethod::Linear);
        let v = interp.evaluate(11.25, 0.4).unwrap();
        assert!((v - (22.5 + 0.4)).abs() < 1e-12);
    }

    #[test]
    fn extrapolates_without_fill_value() {
        let interp = plane(extrapolating(), InterpMethod::Linear);
        let v = interp.evaluate(13.0, -1.0).unwrap();
        assert!((v - (26.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn fill_value_replaces_out_of_range() {
        let policy = BoundsPolicy {
            bounds_error: false,
            fill_value: Some(-99.0),
        };
        let interp = plane(policy, InterpMethod::Linear);
        assert_eq!(interp.evaluate(9.0, 0.5).unwrap(), -99.0);
        assert_eq!(interp.evaluate(11.0, 1.5).unwrap(), -99.0);
        // Domain edges are inside.
        assert_ne!(interp.evaluate(12.0, 1.0).unwrap(), -99.0);
    }

    #[test]
    fn bounds_error_names_the_axis() {
        let policy = BoundsPolicy {
            bounds_error: true,
            fill_value: Some(0.0),
        };
        let interp = plane(policy, InterpMethod::Linear);
        match interp.evaluate(11.0, 2.0) {
            Err(ModelError::OutOfBounds { axis, value, min, max }) => {
                assert_eq!(axis, "color");
                assert_eq!(value, 2.0);
                assert_eq!((min, max), (0.0, 1.0));
            }
            other => panic!("expected out-of-bounds, got {other:?}"),
        }
        assert!(interp.evaluate(12.5, 0.5).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn nearest_snaps_to_closest_center() {
        let interp = plane(extrapolating(), InterpMethod::Nearest);
        assert_eq!(interp.evaluate(10.4, 0.6).unwrap(), 21.0);
        assert_eq!(interp.evaluate(10.5, 0.5).unwrap(), 20.0);
        assert_eq!(interp.evaluate(11.9, 0.1).unwrap(), 24.0);
    }

    #[test]
    fn nan_query_yields_nan() {
        let interp = plane(extrapolating(), InterpMethod::Linear);
        assert!(interp.evaluate(f64::NAN, 0.5).unwrap().is_nan());

        let filled = plane(
            BoundsPolicy {
                bounds_error: false,
                fill_value: Some(-99.0),
            },
            InterpMethod::Nearest,
        );
        assert!(filled.evaluate(11.0, f64::NAN).unwrap().is_nan());
    }

    #[test]
    fn nan_query_is_out_of_bounds_when_strict() {
        let strict = plane(
            BoundsPolicy {
                bounds_error: true,
                fill_value: None,
            },
            InterpMethod::Linear,
        );
        match strict.evaluate(f64::NAN, 0.5) {
            Err(ModelError::OutOfBounds { axis, value, .. }) => {
                assert_eq!(axis, "magnitude");
                assert!(value.is_nan());
            }
            other => panic!("expected out-of-bounds, got {other:?}"),
        }
        assert!(strict.evaluate(11.0, f64::NAN).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn rejects_bad_axes() {
        let values = DMatrix::zeros(1, 2);
        let err = GridInterpolator::new(
            vec![1.0],
            vec![0.0, 1.0],
            values,
            InterpMethod::Linear,
            extrapolating(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least 2"));

        let err = GridInterpolator::new(
            vec![1.0, 1.0],
            vec![0.0, 1.0],
            DMatrix::zeros(2, 2),
            InterpMethod::Linear,
            extrapolating(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));

        let err = GridInterpolator::new(
            vec![1.0, 2.0],
            vec![0.0, 1.0],
            DMatrix::zeros(3, 2),
            InterpMethod::Linear,
            extrapolating(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("shape"));
    }

    #[test]
    fn evaluate_many_matches_single_queries() {
        let interp = plane(extrapolating(), InterpMethod::Linear);
        let pts = vec![(10.0, 0.0), (11.5, 0.25), (12.0, 1.0)];
        let many = interp.evaluate_many(&pts).unwrap();
        for (p, v) in pts.iter().zip(many) {
            assert_eq!(interp.evaluate(p.0, p.1).unwrap(), v);
        }
    }
}
