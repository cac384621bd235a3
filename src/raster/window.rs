//! Windowed raster loading.
//!
//! Reads only the sub-grid of a DEM covering a bounding box (plus a
//! one-cell margin), normalizing the result into a canonical grid:
//! strictly ascending axes, `values[ix][iy]` layout, longitudes in the
//! frame of the requested box. Handles the antimeridian by stitching two
//! reads, repairs out-of-range cells from a backup interpolant, and
//! reports how many cells were repaired.

use super::interpolant::BathyInterpolant;
use super::source::{RasterError, RasterSource, LAT_NAMES, LON_NAMES};
use crate::types::Bbox;

/// Heights whose magnitude exceeds this are treated as fill values.
pub const INVALID_THRESHOLD: f64 = 10_000.0;

/// A windowed raster in canonical form.
///
/// Both axes are strictly ascending and the value matrix is indexed
/// `values[ix][iy]`. Invalid cells hold `NaN` when no backup dataset was
/// available to repair them.
#[derive(Clone, Debug)]
pub struct RasterGrid {
    /// Longitude axis, ascending, in the frame of the requested window
    pub x: Vec<f64>,
    /// Latitude axis, ascending
    pub y: Vec<f64>,
    /// Heights indexed `[ix][iy]`
    pub values: Vec<Vec<f64>>,
}

impl RasterGrid {
    /// Grid envelope.
    pub fn bbox(&self) -> Bbox {
        Bbox::new(
            self.x[0],
            *self.x.last().unwrap(),
            self.y[0],
            *self.y.last().unwrap(),
        )
    }
}

/// Load the window of `source` covering `bbox`.
///
/// The request may extend past 180° longitude to describe an
/// antimeridian-spanning box; when the source stores longitudes in
/// [-180, 180], the window is assembled from one read ending at 180° and
/// a second read starting at -180° shifted up by 360°. Sources stored in
/// a [0, 360] frame are shifted down when the request is negative.
///
/// Cells with `|z| > 10,000` are repaired from `backup` when provided,
/// otherwise set to `NaN`; either way a warning reports the count.
pub fn load_window(
    source: &dyn RasterSource,
    bbox: &Bbox,
    backup: Option<&BathyInterpolant>,
) -> Result<RasterGrid, RasterError> {
    let lon = source.axis(LON_NAMES)?;
    let lat = source.axis(LAT_NAMES)?;
    let var = source.height_variable()?;

    if lon.len() < 2 || lat.len() < 2 {
        return Err(RasterError::InvalidGrid(
            "raster axes must have at least 2 nodes".to_string(),
        ));
    }

    let lon_min = lon.iter().cloned().fold(f64::INFINITY, f64::min);
    let lon_max = lon.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let mut grid = if bbox.crosses_antimeridian() && lon_min < 0.0 {
        // Source is in the [-180, 180] frame but the request runs past
        // 180: stitch the eastern strip onto a read ending at 180.
        let west = Bbox::new(bbox.x_min, 180.0, bbox.y_min, bbox.y_max);
        let east = Bbox::new(-180.0, bbox.x_max - 360.0, bbox.y_min, bbox.y_max);

        let mut a = read_raw(source, &var, &lon, &lat, &west)?;
        let mut b = read_raw(source, &var, &lon, &lat, &east)?;
        for x in &mut b.x {
            *x += 360.0;
        }

        // Drop any columns of the second read that duplicate the seam
        let seam = *a.x.last().unwrap();
        let skip = b.x.iter().take_while(|&&x| x <= seam).count();
        a.x.extend_from_slice(&b.x[skip..]);
        a.values.extend_from_slice(&b.values[skip..]);
        a
    } else {
        // Frame correction for non-spanning mismatches
        let shift = if bbox.x_max > 180.0 && lon_max <= 180.0 {
            -360.0
        } else if bbox.x_min < 0.0 && lon_min >= 0.0 {
            360.0
        } else {
            0.0
        };
        let shifted = Bbox::new(
            bbox.x_min + shift,
            bbox.x_max + shift,
            bbox.y_min,
            bbox.y_max,
        );
        let mut g = read_raw(source, &var, &lon, &lat, &shifted)?;
        for x in &mut g.x {
            *x -= shift;
        }
        g
    };

    repair_invalid(&mut grid, backup);
    validate_grid(&grid)?;
    Ok(grid)
}

/// Read the raw sub-grid covering `bbox` with a one-cell margin,
/// flipping a descending latitude axis into ascending order.
fn read_raw(
    source: &dyn RasterSource,
    var: &str,
    lon: &[f64],
    lat: &[f64],
    bbox: &Bbox,
) -> Result<RasterGrid, RasterError> {
    let (x0, x1) = window_indices(lon, bbox.x_min, bbox.x_max);
    let (y0, y1) = window_indices(lat, bbox.y_min, bbox.y_max);

    if x1 <= x0 || y1 <= y0 {
        return Err(RasterError::InvalidGrid(format!(
            "raster does not cover window {bbox}"
        )));
    }

    let mut x: Vec<f64> = lon[x0..x1].to_vec();
    let mut y: Vec<f64> = lat[y0..y1].to_vec();
    let mut values = source.read_window(var, x0, x1, y0, y1)?;

    if x.len() > 1 && x[0] > x[1] {
        x.reverse();
        values.reverse();
    }
    if y.len() > 1 && y[0] > y[1] {
        y.reverse();
        for col in &mut values {
            col.reverse();
        }
    }

    Ok(RasterGrid { x, y, values })
}

/// Half-open index range of axis nodes covering `[lo, hi]` plus a
/// one-node margin on each side. Works for ascending and descending axes.
fn window_indices(axis: &[f64], lo: f64, hi: f64) -> (usize, usize) {
    let ascending = axis.len() < 2 || axis[0] <= axis[1];
    let n = axis.len();

    let (first, last) = if ascending {
        let first = axis.partition_point(|&a| a < lo);
        let last = axis.partition_point(|&a| a <= hi);
        (first, last)
    } else {
        let first = axis.partition_point(|&a| a > hi);
        let last = axis.partition_point(|&a| a >= lo);
        (first, last)
    };

    (first.saturating_sub(1), (last + 1).min(n))
}

/// Replace fill-valued cells from the backup interpolant, or mark them
/// `NaN`, warning about the count either way.
fn repair_invalid(grid: &mut RasterGrid, backup: Option<&BathyInterpolant>) {
    let mut repaired = 0usize;
    let mut marked = 0usize;

    for (i, col) in grid.values.iter_mut().enumerate() {
        for (j, v) in col.iter_mut().enumerate() {
            if v.is_finite() && v.abs() <= INVALID_THRESHOLD {
                continue;
            }
            match backup {
                Some(interp) => {
                    *v = interp.eval(grid.x[i], grid.y[j]);
                    repaired += 1;
                }
                None => {
                    *v = f64::NAN;
                    marked += 1;
                }
            }
        }
    }

    if repaired > 0 {
        eprintln!("Warning: repaired {repaired} invalid raster cells from the backup dataset");
    }
    if marked > 0 {
        eprintln!("Warning: {marked} invalid raster cells with no backup dataset; marked as NaN");
    }
}

fn validate_grid(grid: &RasterGrid) -> Result<(), RasterError> {
    if grid.x.len() < 2 || grid.y.len() < 2 {
        return Err(RasterError::InvalidGrid(
            "windowed grid must have at least 2x2 nodes".to_string(),
        ));
    }
    if grid.x.windows(2).any(|w| w[1] <= w[0]) || grid.y.windows(2).any(|w| w[1] <= w[0]) {
        return Err(RasterError::InvalidGrid(
            "windowed grid axes must be strictly ascending".to_string(),
        ));
    }
    Ok(())
}
