//! Ring and ring-collection types for boundary geometry.
//!
//! A [`Ring`] is one closed or open polyline; a [`RingCollection`] is an
//! ordered sequence of rings. This replaces the sentinel-delimited flat
//! point arrays used by polygon file formats: separators only appear at
//! the ingestion seam ([`RingCollection::from_sentinel_points`]) and when
//! exporting back to flat form ([`RingCollection::to_sentinel_points`]).

use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Absolute closure tolerance in degrees (~0.1 mm at the equator).
const CLOSURE_TOL: f64 = 1e-9;

/// One closed or open polyline in lon/lat degrees.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ring {
    /// Ordered vertices. A closed ring repeats its first vertex last.
    pub points: Vec<Coord<f64>>,
}

impl Ring {
    /// Create a ring from vertices.
    pub fn new(points: Vec<Coord<f64>>) -> Self {
        Self { points }
    }

    /// Create a ring from (x, y) tuples.
    pub fn from_xy(points: &[(f64, f64)]) -> Self {
        Self {
            points: points.iter().map(|&(x, y)| Coord { x, y }).collect(),
        }
    }

    /// Number of vertices (closing vertex counted if present).
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the ring has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the first and last vertices coincide.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) if self.points.len() >= 4 => {
                (a.x - b.x).abs() < CLOSURE_TOL && (a.y - b.y).abs() < CLOSURE_TOL
            }
            _ => false,
        }
    }

    /// Close the ring by repeating the first vertex, if not already closed.
    pub fn close(&mut self) {
        if !self.is_closed() {
            if let Some(&first) = self.points.first() {
                self.points.push(first);
            }
        }
    }

    /// Shoelace signed area in degree² (positive = counter-clockwise).
    ///
    /// Open rings are treated as implicitly closed.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    /// Whether the ring winds clockwise.
    #[inline]
    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    /// Reverse the vertex order in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Convert to a `geo` line string.
    pub fn to_line_string(&self) -> LineString<f64> {
        LineString::from(self.points.clone())
    }

    /// Convert to a `geo` polygon if the ring is closed with enough vertices.
    pub fn to_polygon(&self) -> Option<Polygon<f64>> {
        if self.points.len() >= 4 && self.is_closed() {
            Some(Polygon::new(self.to_line_string(), vec![]))
        } else {
            None
        }
    }
}

/// An ordered sequence of rings (outer edge, mainland segments, islands...).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RingCollection {
    /// The rings, in input order.
    pub rings: Vec<Ring>,
}

impl RingCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection from rings, dropping empty ones.
    pub fn from_rings(rings: Vec<Ring>) -> Self {
        Self {
            rings: rings.into_iter().filter(|r| !r.is_empty()).collect(),
        }
    }

    /// Number of rings.
    #[inline]
    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    /// Total vertex count across all rings.
    pub fn total_points(&self) -> usize {
        self.rings.iter().map(Ring::len).sum()
    }

    /// Whether the collection holds no rings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Append a ring, ignoring empty ones.
    pub fn push(&mut self, ring: Ring) {
        if !ring.is_empty() {
            self.rings.push(ring);
        }
    }

    /// Move all rings from another collection onto the end of this one.
    pub fn append(&mut self, mut other: RingCollection) {
        self.rings.append(&mut other.rings);
    }

    /// Parse a flat point sequence delimited by non-finite (NaN) sentinels.
    ///
    /// Consecutive sentinels and a trailing sentinel are tolerated; empty
    /// segments are dropped.
    pub fn from_sentinel_points(points: &[(f64, f64)]) -> Self {
        let mut rings = Vec::new();
        let mut current = Vec::new();

        for &(x, y) in points {
            if x.is_finite() && y.is_finite() {
                current.push(Coord { x, y });
            } else if !current.is_empty() {
                rings.push(Ring::new(std::mem::take(&mut current)));
            }
        }
        if !current.is_empty() {
            rings.push(Ring::new(current));
        }

        Self { rings }
    }

    /// Flatten back to a sentinel-delimited point sequence.
    ///
    /// A separator follows every ring, including the last, so the result
    /// is always sentinel-terminated.
    pub fn to_sentinel_points(&self) -> Vec<(f64, f64)> {
        let mut out = Vec::with_capacity(self.total_points() + self.ring_count());
        for ring in &self.rings {
            out.extend(ring.points.iter().map(|c| (c.x, c.y)));
            out.push((f64::NAN, f64::NAN));
        }
        out
    }

    /// Collect the closed rings into a `geo` multipolygon for membership tests.
    ///
    /// Open rings are skipped: they cannot bound an area.
    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        MultiPolygon(self.rings.iter().filter_map(Ring::to_polygon).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_closure() {
        let mut ring = Ring::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert!(!ring.is_closed());

        ring.close();
        assert!(ring.is_closed());
        assert_eq!(ring.len(), 5);

        // Closing twice is a no-op
        ring.close();
        assert_eq!(ring.len(), 5);
    }

    #[test]
    fn test_signed_area_orientation() {
        // Counter-clockwise unit square
        let ccw = Ring::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        assert!((ccw.signed_area() - 1.0).abs() < 1e-12);
        assert!(!ccw.is_clockwise());

        let mut cw = ccw.clone();
        cw.reverse();
        assert!(cw.is_clockwise());
    }

    #[test]
    fn test_sentinel_roundtrip() {
        let flat = vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (f64::NAN, f64::NAN),
            (5.0, 5.0),
            (6.0, 5.0),
        ];
        let rc = RingCollection::from_sentinel_points(&flat);
        assert_eq!(rc.ring_count(), 2);
        assert_eq!(rc.rings[0].len(), 3);
        assert_eq!(rc.rings[1].len(), 2);

        let back = rc.to_sentinel_points();
        // 5 points + 2 separators, terminated by a separator
        assert_eq!(back.len(), 7);
        assert!(back.last().unwrap().0.is_nan());

        let again = RingCollection::from_sentinel_points(&back);
        assert_eq!(again, rc);
    }

    #[test]
    fn test_sentinel_tolerates_leading_and_double_separators() {
        let flat = vec![
            (f64::NAN, f64::NAN),
            (0.0, 0.0),
            (1.0, 1.0),
            (f64::NAN, f64::NAN),
            (f64::NAN, f64::NAN),
            (2.0, 2.0),
            (3.0, 3.0),
        ];
        let rc = RingCollection::from_sentinel_points(&flat);
        assert_eq!(rc.ring_count(), 2);
    }

    #[test]
    fn test_append_consumes_the_other_collection() {
        let mut a = RingCollection::new();
        a.push(Ring::from_xy(&[(0.0, 0.0), (1.0, 0.0)]));
        let mut b = RingCollection::new();
        b.push(Ring::from_xy(&[(5.0, 5.0), (6.0, 5.0)]));
        b.push(Ring::from_xy(&[(7.0, 7.0), (8.0, 7.0)]));

        a.append(b);
        assert_eq!(a.ring_count(), 3);
        assert_eq!(a.rings[2].points[0].x, 7.0);
    }

    #[test]
    fn test_multi_polygon_skips_open_rings() {
        let mut rc = RingCollection::new();
        rc.push(Ring::from_xy(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ]));
        rc.push(Ring::from_xy(&[(5.0, 5.0), (6.0, 6.0)]));

        let mp = rc.to_multi_polygon();
        assert_eq!(mp.0.len(), 1);
    }
}
