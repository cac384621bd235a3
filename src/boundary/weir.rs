//! Weir feature expansion.
//!
//! A weir enters the pipeline as a crestline with a physical width and
//! leaves as a thin closed "faux island": two chains offset from the
//! crest by half the width on either side, an edge loop, and the pairing
//! between opposite nodes that the mesh generator uses to tie the two
//! banks together. The [`WeirGenerator`] trait is the seam for swapping
//! in a different expansion scheme.

use geo::Coord;

use crate::geometry::{spacing_in_degrees, Ring};

/// A weir crestline with its physical width in meters.
#[derive(Clone, Debug)]
pub struct WeirFeature {
    /// Crest polyline in lon/lat, at least two points
    pub crestline: Vec<Coord<f64>>,
    /// Total structure width in meters
    pub width_m: f64,
}

impl WeirFeature {
    pub fn new(crestline: Vec<(f64, f64)>, width_m: f64) -> Self {
        Self {
            crestline: crestline.into_iter().map(|(x, y)| Coord { x, y }).collect(),
            width_m,
        }
    }
}

/// Expanded weir geometry.
///
/// `points` holds both banks, `edges` the closed loop around them, and
/// `paired_nodes` the bank-to-bank node pairing, all indexed into
/// `points`.
#[derive(Clone, Debug, Default)]
pub struct WeirGeometry {
    pub points: Vec<Coord<f64>>,
    pub edges: Vec<(usize, usize)>,
    pub paired_nodes: Vec<(usize, usize)>,
}

impl WeirGeometry {
    /// The bank loop as a closed ring, for insertion among inner rings.
    pub fn to_ring(&self) -> Ring {
        let mut pts = self.points.clone();
        if let Some(&first) = pts.first() {
            pts.push(first);
        }
        Ring::new(pts)
    }
}

/// Expands one weir feature into mesh-ready geometry.
pub trait WeirGenerator {
    fn expand(&self, weir: &WeirFeature) -> WeirGeometry;
}

/// Default generator: offset the crestline by ±width/2 along the local
/// perpendicular.
#[derive(Clone, Copy, Debug, Default)]
pub struct OffsetWeirGenerator;

impl WeirGenerator for OffsetWeirGenerator {
    fn expand(&self, weir: &WeirFeature) -> WeirGeometry {
        let n = weir.crestline.len();
        if n < 2 {
            return WeirGeometry::default();
        }

        let half = weir.width_m / 2.0;
        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);

        for i in 0..n {
            let p = weir.crestline[i];
            // Central-difference tangent, one-sided at the ends
            let a = weir.crestline[i.saturating_sub(1)];
            let b = weir.crestline[(i + 1).min(n - 1)];
            let (tx, ty) = (b.x - a.x, b.y - a.y);
            let len = (tx * tx + ty * ty).sqrt().max(f64::MIN_POSITIVE);
            let (nx, ny) = (-ty / len, tx / len);

            let (dlon, dlat) = spacing_in_degrees(half, p.y);
            left.push(Coord {
                x: p.x + nx * dlon,
                y: p.y + ny * dlat,
            });
            right.push(Coord {
                x: p.x - nx * dlon,
                y: p.y - ny * dlat,
            });
        }

        // Loop layout: left bank forward (0..n), right bank reversed
        // (n..2n), so consecutive indices trace the closed outline
        let mut points = left;
        points.extend(right.iter().rev().copied());

        let total = points.len();
        let edges = (0..total).map(|i| (i, (i + 1) % total)).collect();

        // Left node i faces right node at index 2n-1-i
        let paired_nodes = (0..n).map(|i| (i, total - 1 - i)).collect();

        WeirGeometry {
            points,
            edges,
            paired_nodes,
        }
    }
}

/// Expand every weir and concatenate the results with cumulative index
/// offsets, preserving input order.
pub fn expand_all(weirs: &[WeirFeature], generator: &dyn WeirGenerator) -> WeirGeometry {
    let mut out = WeirGeometry::default();
    for weir in weirs {
        let g = generator.expand(weir);
        let offset = out.points.len();
        out.points.extend(g.points);
        out.edges
            .extend(g.edges.iter().map(|&(a, b)| (a + offset, b + offset)));
        out.paired_nodes
            .extend(g.paired_nodes.iter().map(|&(a, b)| (a + offset, b + offset)));
    }
    out
}
