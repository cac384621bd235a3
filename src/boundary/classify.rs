//! Shoreline classification.
//!
//! Turns raw boundary rings into the classified form the mesh generator
//! consumes: an `outer` boundary, `mainland` segments, and `inner`
//! islands, all resampled to the target spacing, optionally smoothed,
//! and coarsened away from the region of interest.
//!
//! # Example
//!
//! ```
//! use coastprep::boundary::{classify, ClassifierParams, RawBoundary};
//! use coastprep::geometry::BoundingRegion;
//! use coastprep::types::Bbox;
//!
//! let region = BoundingRegion::from_bbox(Bbox::new(-80.0, -70.0, 30.0, 40.0));
//! let params = ClassifierParams::new(500.0);
//! let shoreline = classify(&RawBoundary::default(), &region, &params);
//! assert_eq!(shoreline.outer.rings[0].len(), 5);
//! ```

use std::collections::HashSet;

use super::source::{RawBoundary, RingKind};
use crate::geometry::{
    coarsen_collection, resample_collection, smooth_collection, BoundingRegion, Ring,
    RingCollection,
};

/// Quantum for point-coincidence tests, in degrees.
const COINCIDENCE_TOL: f64 = 1e-4;

/// Boubox inflation factor defining the full-density region of interest.
const ROI_INFLATION: f64 = 1.10;

/// Moving-average window applied when none is configured.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Classifier tuning knobs.
#[derive(Clone, Debug)]
pub struct ClassifierParams {
    /// Minimum mesh edge length in meters; drives the target spacing.
    pub min_edge_length: f64,
    /// Points per minimum edge; target spacing = min_edge_length / ratio.
    pub spacing_ratio: f64,
    /// Moving-average window; `<= 1` disables smoothing.
    pub smoothing_window: usize,
}

impl ClassifierParams {
    /// Defaults: two boundary points per minimum edge, smoothing window
    /// of [`DEFAULT_SMOOTHING_WINDOW`] points.
    pub fn new(min_edge_length: f64) -> Self {
        Self {
            min_edge_length,
            spacing_ratio: 2.0,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }

    pub fn target_spacing(&self) -> f64 {
        self.min_edge_length / self.spacing_ratio
    }
}

/// Classified, resampled shoreline for one region.
#[derive(Clone, Debug)]
pub struct ClassifiedShoreline {
    /// Outer boundary rings (boubox when no mainland exists)
    pub outer: RingCollection,
    /// Shoreline segments crossing the region edge
    pub mainland: RingCollection,
    /// Islands and enclosed features fully inside the region
    pub inner: RingCollection,
    /// Per-ring tags parallel to `inner`
    pub inner_kinds: Vec<RingKind>,
    /// Set when point-in-polygon membership appears inverted
    pub inpoly_flip: bool,
}

impl ClassifiedShoreline {
    pub fn ring_count(&self) -> usize {
        self.outer.ring_count() + self.mainland.ring_count() + self.inner.ring_count()
    }
}

fn quantize(x: f64, y: f64) -> (i64, i64) {
    (
        (x / COINCIDENCE_TOL).round() as i64,
        (y / COINCIDENCE_TOL).round() as i64,
    )
}

/// Classify raw boundary rings against a bounding region.
///
/// The steps, in order: default the outer boundary to the boubox when no
/// mainland exists, resample everything to the target spacing, smooth,
/// coarsen outside the inflated boubox, migrate inner rings that touch
/// the outer boundary into mainland, and delete mainland rings that are
/// the boubox edge itself.
pub fn classify(
    raw: &RawBoundary,
    region: &BoundingRegion,
    params: &ClassifierParams,
) -> ClassifiedShoreline {
    let spacing = params.target_spacing();

    // With no mainland the outer boundary is the boubox itself, kept
    // verbatim: there is no shoreline detail to resample.
    let boubox_outer = raw.mainland.ring_count() == 0;
    let mut outer = if boubox_outer {
        let mut rc = RingCollection::new();
        rc.push(region.boubox.clone());
        rc
    } else {
        raw.mainland.clone()
    };
    let mut mainland = raw.mainland.clone();
    let mut inner = raw.inner.clone();
    let mut inner_kinds = raw.inner_kinds.clone();

    if !boubox_outer {
        outer = resample_collection(&outer, spacing);
    }
    mainland = resample_collection(&mainland, spacing);
    inner = resample_collection(&inner, spacing);

    if params.smoothing_window > 1 {
        if !boubox_outer {
            outer = smooth_collection(&outer, params.smoothing_window);
        }
        mainland = smooth_collection(&mainland, params.smoothing_window);
        inner = smooth_collection(&inner, params.smoothing_window);
    }

    // Snapshot the outer point set before coarsening thins it
    let outer_keys: HashSet<(i64, i64)> = outer
        .rings
        .iter()
        .flat_map(|r| r.points.iter())
        .map(|p| quantize(p.x, p.y))
        .collect();

    if let Some(roi) = region.inflated_boubox(ROI_INFLATION).to_polygon() {
        outer = coarsen_collection(&outer, &roi, spacing);
        mainland = coarsen_collection(&mainland, &roi, spacing);
        inner = coarsen_collection(&inner, &roi, spacing);
    }

    // Inner rings touching the outer boundary are mainland that happened
    // to fall fully inside the box; migrate them.
    let mut kept_inner = RingCollection::new();
    let mut kept_kinds = Vec::new();
    for (ring, kind) in inner.rings.into_iter().zip(inner_kinds.drain(..)) {
        let touches = ring
            .points
            .iter()
            .any(|p| outer_keys.contains(&quantize(p.x, p.y)));
        if touches {
            mainland.push(ring.clone());
            outer.push(ring);
        } else {
            kept_inner.push(ring);
            kept_kinds.push(kind);
        }
    }

    // Mainland rings lying on the boubox edge carry no shoreline
    // information; drop them.
    let mainland = RingCollection::from_rings(
        mainland
            .rings
            .into_iter()
            .filter(|r| !ring_on_bbox_edge(r, region))
            .collect(),
    );

    ClassifiedShoreline {
        outer,
        mainland,
        inner: kept_inner,
        inner_kinds: kept_kinds,
        inpoly_flip: false,
    }
}

/// True when every vertex of the ring lies on the region's bbox edge.
fn ring_on_bbox_edge(ring: &Ring, region: &BoundingRegion) -> bool {
    let b = &region.bbox;
    !ring.is_empty()
        && ring.points.iter().all(|p| {
            let on_x = (p.x - b.x_min).abs() < COINCIDENCE_TOL
                || (p.x - b.x_max).abs() < COINCIDENCE_TOL;
            let on_y = (p.y - b.y_min).abs() < COINCIDENCE_TOL
                || (p.y - b.y_max).abs() < COINCIDENCE_TOL;
            (on_x && p.y >= b.y_min - COINCIDENCE_TOL && p.y <= b.y_max + COINCIDENCE_TOL)
                || (on_y && p.x >= b.x_min - COINCIDENCE_TOL && p.x <= b.x_max + COINCIDENCE_TOL)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Ring;
    use crate::types::Bbox;

    fn region() -> BoundingRegion {
        BoundingRegion::from_bbox(Bbox::new(0.0, 10.0, 0.0, 10.0))
    }

    #[test]
    fn test_params_default_to_smoothing_window_five() {
        let params = ClassifierParams::new(500.0);
        assert_eq!(params.smoothing_window, DEFAULT_SMOOTHING_WINDOW);
        assert_eq!(params.smoothing_window, 5);
    }

    #[test]
    fn test_no_mainland_defaults_outer_to_boubox() {
        let out = classify(&RawBoundary::default(), &region(), &ClassifierParams::new(500.0));
        assert_eq!(out.outer.ring_count(), 1);
        assert_eq!(out.mainland.ring_count(), 0);
        assert_eq!(out.inner.ring_count(), 0);
        assert!(!out.inpoly_flip);
    }

    #[test]
    fn test_classification_conserves_rings() {
        let mut raw = RawBoundary::default();
        raw.mainland.push(Ring::from_xy(&[
            (5.0, -2.0),
            (6.0, 5.0),
            (5.0, 12.0),
        ]));
        raw.inner.push(Ring::from_xy(&[
            (2.0, 2.0),
            (3.0, 2.0),
            (3.0, 3.0),
            (2.0, 3.0),
            (2.0, 2.0),
        ]));
        raw.inner_kinds.push(RingKind::Lake);

        let out = classify(&raw, &region(), &ClassifierParams::new(50_000.0));
        // Mainland ring survives, island stays inner, kinds stay parallel
        assert_eq!(out.mainland.ring_count(), 1);
        assert_eq!(out.inner.ring_count(), 1);
        assert_eq!(out.inner_kinds.len(), 1);
    }

    #[test]
    fn test_inner_touching_outer_migrates_to_mainland() {
        let mut raw = RawBoundary::default();
        // Mainland chain through the box
        raw.mainland.push(Ring::from_xy(&[
            (0.0, 5.0),
            (2.0, 5.0),
            (4.0, 5.0),
        ]));
        // "Island" sharing the mainland chain's terminal vertex
        raw.inner.push(Ring::from_xy(&[
            (4.0, 5.0),
            (5.0, 6.0),
            (4.0, 7.0),
            (4.0, 5.0),
        ]));
        raw.inner_kinds.push(RingKind::Lake);

        // Huge spacing and no smoothing so shared vertices survive
        // verbatim
        let mut params = ClassifierParams::new(1e9);
        params.spacing_ratio = 2.0;
        params.smoothing_window = 1;
        let out = classify(&raw, &region(), &params);

        assert_eq!(out.inner.ring_count(), 0);
        assert_eq!(out.inner_kinds.len(), 0);
        assert_eq!(out.mainland.ring_count(), 2);
        assert_eq!(out.outer.ring_count(), 2);
    }

    #[test]
    fn test_boubox_coincident_mainland_is_deleted() {
        let mut raw = RawBoundary::default();
        // The boubox itself fed back as shoreline
        raw.mainland.push(region().boubox.clone());
        // A genuine mainland chain
        raw.mainland.push(Ring::from_xy(&[
            (-1.0, 5.0),
            (5.0, 5.5),
            (11.0, 5.0),
        ]));

        let mut params = ClassifierParams::new(1e9);
        params.smoothing_window = 1;
        let out = classify(&raw, &region(), &params);
        assert_eq!(out.mainland.ring_count(), 1);
    }

    #[test]
    fn test_smoothing_preserves_ring_counts() {
        let mut raw = RawBoundary::default();
        raw.mainland.push(Ring::from_xy(&[
            (-1.0, 5.0),
            (5.0, 6.0),
            (11.0, 5.0),
        ]));
        let mut params = ClassifierParams::new(50_000.0);
        params.smoothing_window = 5;
        let out = classify(&raw, &region(), &params);
        assert_eq!(out.mainland.ring_count(), 1);
        assert_eq!(out.outer.ring_count(), 1);
    }
}
