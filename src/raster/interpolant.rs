//! Continuous bathymetry sampling over a windowed raster grid.

use crate::raster::window::RasterGrid;
use crate::types::Bbox;

/// Bilinear interpolant with nearest-value extrapolation.
///
/// Built once from a windowed [`RasterGrid`] and immutable thereafter.
/// Queries inside the grid envelope are bilinear in the enclosing cell;
/// queries outside return the value of the nearest grid node. Cells with
/// a non-finite corner fall back to the nearest finite corner value.
#[derive(Clone, Debug)]
pub struct BathyInterpolant {
    x: Vec<f64>,
    y: Vec<f64>,
    values: Vec<Vec<f64>>,
}

impl BathyInterpolant {
    /// Build the interpolant, taking ownership of the grid.
    ///
    /// The raw window buffers live only inside the returned interpolant;
    /// nothing else is retained.
    pub fn new(grid: RasterGrid) -> Self {
        Self {
            x: grid.x,
            y: grid.y,
            values: grid.values,
        }
    }

    /// The grid envelope.
    pub fn envelope(&self) -> Bbox {
        Bbox::new(
            self.x[0],
            *self.x.last().unwrap(),
            self.y[0],
            *self.y.last().unwrap(),
        )
    }

    /// Lower-left grid corner, used as the pipeline reference origin.
    pub fn origin(&self) -> (f64, f64) {
        (self.x[0], self.y[0])
    }

    /// Sample the height at (x, y).
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let inside = x >= self.x[0]
            && x <= *self.x.last().unwrap()
            && y >= self.y[0]
            && y <= *self.y.last().unwrap();

        if !inside {
            let i = nearest_index(&self.x, x);
            let j = nearest_index(&self.y, y);
            return self.values[i][j];
        }

        let i0 = bracket_index(&self.x, x);
        let j0 = bracket_index(&self.y, y);
        let i1 = (i0 + 1).min(self.x.len() - 1);
        let j1 = (j0 + 1).min(self.y.len() - 1);

        let fx = if i1 > i0 {
            (x - self.x[i0]) / (self.x[i1] - self.x[i0])
        } else {
            0.0
        };
        let fy = if j1 > j0 {
            (y - self.y[j0]) / (self.y[j1] - self.y[j0])
        } else {
            0.0
        };

        let v00 = self.values[i0][j0];
        let v10 = self.values[i1][j0];
        let v01 = self.values[i0][j1];
        let v11 = self.values[i1][j1];

        if !v00.is_finite() || !v10.is_finite() || !v01.is_finite() || !v11.is_finite() {
            // Nearest finite corner, if any
            let corners = [
                (v00, fx + fy),
                (v10, (1.0 - fx) + fy),
                (v01, fx + (1.0 - fy)),
                (v11, (1.0 - fx) + (1.0 - fy)),
            ];
            return corners
                .iter()
                .filter(|(v, _)| v.is_finite())
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|&(v, _)| v)
                .unwrap_or(f64::NAN);
        }

        let v0 = v00 * (1.0 - fx) + v10 * fx;
        let v1 = v01 * (1.0 - fx) + v11 * fx;
        v0 * (1.0 - fy) + v1 * fy
    }
}

/// Index of the cell whose [i, i+1] interval brackets `v` on a strictly
/// increasing axis.
fn bracket_index(axis: &[f64], v: f64) -> usize {
    let upper = axis.partition_point(|&a| a <= v);
    upper.saturating_sub(1).min(axis.len() - 2)
}

/// Index of the nearest axis node to `v`.
fn nearest_index(axis: &[f64], v: f64) -> usize {
    let upper = axis.partition_point(|&a| a < v);
    if upper == 0 {
        return 0;
    }
    if upper >= axis.len() {
        return axis.len() - 1;
    }
    if (v - axis[upper - 1]).abs() <= (axis[upper] - v).abs() {
        upper - 1
    } else {
        upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::window::RasterGrid;

    fn planar_grid() -> RasterGrid {
        // z = -(x + 2y), exact under bilinear interpolation
        let x: Vec<f64> = (0..5).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..4).map(|j| 10.0 + j as f64).collect();
        let values = x
            .iter()
            .map(|&xv| y.iter().map(|&yv| -(xv + 2.0 * yv)).collect())
            .collect();
        RasterGrid { x, y, values }
    }

    #[test]
    fn test_bilinear_reproduces_plane() {
        let interp = BathyInterpolant::new(planar_grid());
        for &(x, y) in &[(0.5, 10.5), (2.25, 11.75), (3.9, 12.1), (0.0, 10.0)] {
            let expected = -(x + 2.0 * y);
            let got = interp.eval(x, y);
            assert!(
                (got - expected).abs() < 1e-12,
                "plane at ({x}, {y}): {got} vs {expected}"
            );
        }
    }

    #[test]
    fn test_value_bounded_by_cell_corners() {
        let interp = BathyInterpolant::new(planar_grid());
        let v = interp.eval(1.3, 11.6);
        // Corners of cell [1,2] x [11,12]
        let corners = [
            -(1.0 + 22.0),
            -(2.0 + 22.0),
            -(1.0 + 24.0),
            -(2.0 + 24.0),
        ];
        let lo = corners.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = corners.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(v >= lo && v <= hi, "{v} outside [{lo}, {hi}]");
    }

    #[test]
    fn test_nearest_outside_envelope() {
        let interp = BathyInterpolant::new(planar_grid());
        // Far southwest of the grid: nearest node is (0, 10)
        assert_eq!(interp.eval(-100.0, -100.0), -(0.0 + 20.0));
        // Far northeast: nearest node is (4, 13)
        assert_eq!(interp.eval(100.0, 100.0), -(4.0 + 26.0));
    }

    #[test]
    fn test_invalid_corner_falls_back_to_nearest_finite() {
        let mut grid = planar_grid();
        grid.values[1][1] = f64::NAN;
        let interp = BathyInterpolant::new(grid);
        // Query right next to the NaN corner still returns a finite value
        let v = interp.eval(1.01, 11.01);
        assert!(v.is_finite());
    }

    #[test]
    fn test_envelope_and_origin() {
        let interp = BathyInterpolant::new(planar_grid());
        let env = interp.envelope();
        assert_eq!(env.as_tuple(), (0.0, 4.0, 10.0, 13.0));
        assert_eq!(interp.origin(), (0.0, 10.0));
    }
}
