//! Shoreline boundary sources.
//!
//! A [`BoundarySource`] produces the raw mainland/inner ring collections
//! for a bounding region. Adapters cover ESRI shapefiles (GSHHS-style
//! coastline databases) and raw sentinel-delimited point sequences, the
//! latter also serving iso-contour re-entry into the pipeline.

use std::path::{Path, PathBuf};

use geo::Coord;
use shapefile::{PolygonRing, Shape};
use thiserror::Error;

use crate::geometry::{BoundingRegion, Ring, RingCollection};
use crate::types::Bbox;

/// Error type for boundary-source operations.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shapefile parsing error
    #[error("shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// Source produced no rings intersecting the region
    #[error("boundary source contains no rings intersecting the region")]
    EmptySource,
}

/// Classification tag for a boundary ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingKind {
    /// Open-ocean shoreline
    Ocean,
    /// Enclosed water body (hole ring of a land polygon)
    Lake,
    /// Open polyline feature
    River,
    /// Faux island expanded from a weir crestline
    Weir,
}

/// Raw boundary rings for a region, before classification.
///
/// `mainland` rings cross the region edge; `inner` rings lie entirely
/// inside it. `inner_kinds` parallels `inner`.
#[derive(Clone, Debug, Default)]
pub struct RawBoundary {
    pub mainland: RingCollection,
    pub inner: RingCollection,
    pub inner_kinds: Vec<RingKind>,
}

impl RawBoundary {
    pub fn is_empty(&self) -> bool {
        self.mainland.ring_count() == 0 && self.inner.ring_count() == 0
    }
}

/// Produces raw boundary rings clipped to a bounding region.
pub trait BoundarySource {
    fn load(&self, region: &BoundingRegion) -> Result<RawBoundary, BoundaryError>;
}

/// Sort one ring into the raw boundary by its extent relative to the
/// region bbox: fully inside goes to `inner`, partially inside goes to
/// `mainland`, fully outside is dropped.
fn place_ring(raw: &mut RawBoundary, ring: Ring, kind: RingKind, region: &BoundingRegion) {
    if ring.is_empty() {
        return;
    }
    let inside = ring
        .points
        .iter()
        .filter(|p| region.bbox.contains(p.x, p.y))
        .count();

    if inside == ring.len() {
        raw.inner.push(ring);
        raw.inner_kinds.push(kind);
    } else if inside > 0 {
        raw.mainland.push(ring);
    }
}

// ============================================================================
// Shapefile source
// ============================================================================

/// Shapefile-backed coastline source.
///
/// Outer polygon rings are tagged [`RingKind::Ocean`], hole rings
/// [`RingKind::Lake`], and polyline records [`RingKind::River`].
pub struct ShapefileSource {
    path: PathBuf,
}

impl ShapefileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl BoundarySource for ShapefileSource {
    fn load(&self, region: &BoundingRegion) -> Result<RawBoundary, BoundaryError> {
        let mut reader = shapefile::Reader::from_path(&self.path)?;
        let mut raw = RawBoundary::default();

        for result in reader.iter_shapes_and_records() {
            let (shape, _record) = result?;
            match shape {
                Shape::Polygon(polygon) => {
                    for poly_ring in polygon.rings() {
                        let (points, kind) = match poly_ring {
                            PolygonRing::Outer(pts) => (pts, RingKind::Ocean),
                            PolygonRing::Inner(pts) => (pts, RingKind::Lake),
                        };
                        let mut ring = Ring::new(
                            points.iter().map(|p| Coord { x: p.x, y: p.y }).collect(),
                        );
                        ring.close();
                        place_ring(&mut raw, ring, kind, region);
                    }
                }
                Shape::Polyline(polyline) => {
                    for part in polyline.parts() {
                        let ring =
                            Ring::new(part.iter().map(|p| Coord { x: p.x, y: p.y }).collect());
                        place_ring(&mut raw, ring, RingKind::River, region);
                    }
                }
                _ => {}
            }
        }

        if raw.is_empty() {
            return Err(BoundaryError::EmptySource);
        }
        Ok(raw)
    }
}

// ============================================================================
// Raw point source
// ============================================================================

/// Boundary source from sentinel-delimited raw points.
///
/// Rings are separated by non-finite coordinate pairs, the flat encoding
/// used at file seams and by iso-contour re-entry. Closed rings are
/// tagged [`RingKind::Lake`], open chains [`RingKind::River`].
pub struct RawPointsSource {
    rings: RingCollection,
}

impl RawPointsSource {
    /// From a sentinel-delimited flat point sequence.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        Self {
            rings: RingCollection::from_sentinel_points(points),
        }
    }

    /// From an already-split ring collection.
    pub fn from_rings(rings: RingCollection) -> Self {
        Self { rings }
    }
}

impl BoundarySource for RawPointsSource {
    fn load(&self, region: &BoundingRegion) -> Result<RawBoundary, BoundaryError> {
        let mut raw = RawBoundary::default();
        for ring in &self.rings.rings {
            let kind = if ring.is_closed() {
                RingKind::Lake
            } else {
                RingKind::River
            };
            place_ring(&mut raw, ring.clone(), kind, region);
        }
        if raw.is_empty() {
            return Err(BoundaryError::EmptySource);
        }
        Ok(raw)
    }
}

/// Axis-aligned extent of every ring a source yields.
///
/// A collinear source (all points on one meridian or parallel) spans no
/// area on one axis; that axis is padded by a small margin so the result
/// is always a valid box instead of a panic downstream.
pub fn source_extent(raw: &RawBoundary) -> Option<Bbox> {
    const EXTENT_PAD: f64 = 1e-3;

    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for ring in raw.mainland.rings.iter().chain(raw.inner.rings.iter()) {
        for p in &ring.points {
            x_min = x_min.min(p.x);
            x_max = x_max.max(p.x);
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
    }
    if !x_min.is_finite() || !y_min.is_finite() {
        return None;
    }

    if x_max <= x_min {
        x_min -= EXTENT_PAD;
        x_max += EXTENT_PAD;
    }
    if y_max <= y_min {
        y_min -= EXTENT_PAD;
        y_max += EXTENT_PAD;
    }
    Some(Bbox::new(x_min, x_max, y_min, y_max))
}
