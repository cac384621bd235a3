//! Bounding region: canonical bounding box plus closed boundary polygon.
//!
//! The "boubox" is the polygon form of the bounding region. For an
//! axis-aligned box it is the clockwise 5-point corner ring; an arbitrary
//! closed polygon may also be supplied and is canonicalized (closed,
//! oriented clockwise). When neither is given, the extent can be derived
//! from a raster's coordinate axes.

use geo::Coord;
use thiserror::Error;

use crate::geometry::Ring;
use crate::raster::{RasterError, RasterSource, LAT_NAMES, LON_NAMES};
use crate::types::Bbox;

/// Error type for bounding-region construction.
#[derive(Debug, Error)]
pub enum RegionError {
    /// Polygon input with fewer than 3 distinct vertices
    #[error("bounding polygon needs at least 3 distinct vertices, got {0}")]
    DegeneratePolygon(usize),

    /// Collinear polygon or single-valued raster axis
    #[error("bounding region spans zero area")]
    ZeroExtent,

    /// Raster axis probing failed
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Canonical bounding box plus closed clockwise boundary polygon.
#[derive(Clone, Debug)]
pub struct BoundingRegion {
    /// Axis-aligned extent
    pub bbox: Bbox,
    /// Closed boundary polygon ("boubox"), clockwise
    pub boubox: Ring,
}

impl BoundingRegion {
    /// Build the region from an axis-aligned bounding box.
    ///
    /// The boubox is the 4 corners walked clockwise plus the repeated
    /// first corner.
    pub fn from_bbox(bbox: Bbox) -> Self {
        let boubox = Ring::new(vec![
            Coord {
                x: bbox.x_min,
                y: bbox.y_min,
            },
            Coord {
                x: bbox.x_min,
                y: bbox.y_max,
            },
            Coord {
                x: bbox.x_max,
                y: bbox.y_max,
            },
            Coord {
                x: bbox.x_max,
                y: bbox.y_min,
            },
            Coord {
                x: bbox.x_min,
                y: bbox.y_min,
            },
        ]);
        Self { bbox, boubox }
    }

    /// Build the region from an arbitrary closed polygon.
    ///
    /// The polygon is closed if its last vertex does not repeat the first,
    /// and reversed into clockwise order if needed. The bounding box is
    /// the polygon's axis-aligned hull.
    pub fn from_polygon(points: &[(f64, f64)]) -> Result<Self, RegionError> {
        let mut ring = Ring::from_xy(points);
        // A trailing separator from sentinel-encoded input is tolerated
        ring.points.retain(|c| c.x.is_finite() && c.y.is_finite());

        let distinct = if ring.is_closed() {
            ring.len() - 1
        } else {
            ring.len()
        };
        if distinct < 3 {
            return Err(RegionError::DegeneratePolygon(distinct));
        }

        ring.close();
        if !ring.is_clockwise() {
            ring.reverse();
        }

        // Collinear input passes the distinct-vertex check but bounds
        // nothing
        if ring.signed_area() == 0.0 {
            return Err(RegionError::ZeroExtent);
        }

        let bbox = bbox_of(&ring);
        Ok(Self { bbox, boubox: ring })
    }

    /// Derive the region from a raster's coordinate axes.
    ///
    /// Probes the recognized longitude/latitude variable names in order
    /// and fails only after exhausting the candidate lists.
    pub fn from_raster(source: &dyn RasterSource) -> Result<Self, RegionError> {
        let x = source.axis(LON_NAMES)?;
        let y = source.axis(LAT_NAMES)?;

        let (x_min, x_max) = min_max(&x);
        let (y_min, y_max) = min_max(&y);
        if x_max <= x_min || y_max <= y_min {
            return Err(RegionError::ZeroExtent);
        }
        Ok(Self::from_bbox(Bbox::new(x_min, x_max, y_min, y_max)))
    }

    /// The boubox scaled by `factor` about its own centroid.
    ///
    /// Used as the region-of-interest for density-aware coarsening.
    pub fn inflated_boubox(&self, factor: f64) -> Ring {
        let n = self.boubox.len();
        if n == 0 {
            return Ring::default();
        }
        // Vertex-mean centroid; the closing vertex is excluded so it does
        // not double-weight the first corner.
        let m = if self.boubox.is_closed() { n - 1 } else { n };
        let (mut cx, mut cy) = (0.0, 0.0);
        for c in &self.boubox.points[..m] {
            cx += c.x;
            cy += c.y;
        }
        cx /= m as f64;
        cy /= m as f64;

        Ring::new(
            self.boubox
                .points
                .iter()
                .map(|c| Coord {
                    x: cx + (c.x - cx) * factor,
                    y: cy + (c.y - cy) * factor,
                })
                .collect(),
        )
    }
}

/// Axis-aligned hull of a ring.
pub fn bbox_of(ring: &Ring) -> Bbox {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for c in &ring.points {
        x_min = x_min.min(c.x);
        x_max = x_max.max(c.x);
        y_min = y_min.min(c.y);
        y_max = y_max.max(c.y);
    }
    Bbox::new(x_min, x_max, y_min, y_max)
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), &v| (lo.min(v), hi.max(v)),
    )
}
