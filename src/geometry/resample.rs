//! Arc-length resampling, smoothing and density-aware coarsening.
//!
//! All kernels operate per ring and never merge or split rings, so the
//! ring count of a collection is invariant under each of them. Distances
//! along shorelines are great-circle arc lengths (haversine on the mean
//! sphere); coordinates stay in lon/lat degrees throughout.

use geo::{Contains, Coord, Point, Polygon};

use crate::geometry::{Ring, RingCollection};
use crate::types::{EARTH_RADIUS, METERS_PER_DEGREE};

/// Great-circle distance between two lon/lat points in meters.
pub fn haversine_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.x - a.x).to_radians();

    let s = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * s.sqrt().asin()
}

/// Convert a spacing in meters to degrees of (longitude, latitude) at the
/// given latitude.
pub fn spacing_in_degrees(meters: f64, lat: f64) -> (f64, f64) {
    let dlat = meters / METERS_PER_DEGREE;
    let cos_lat = lat.to_radians().cos().max(1e-6);
    (dlat / cos_lat, dlat)
}

/// Resample one ring to uniform arc-length spacing.
///
/// Spacing is uniform in arc length measured along the source polyline;
/// the straight-line separation of consecutive output points is shorter
/// wherever the walked span bends around a source vertex. The first
/// vertex is preserved; a closed ring stays exactly closed. Rings with
/// fewer than 2 vertices are returned unchanged.
pub fn resample_ring(ring: &Ring, spacing_m: f64) -> Ring {
    let n = ring.len();
    if n < 2 || spacing_m <= 0.0 {
        return ring.clone();
    }

    // Cumulative arc length along the ring
    let mut arc = Vec::with_capacity(n);
    arc.push(0.0);
    for i in 1..n {
        let d = haversine_m(ring.points[i - 1], ring.points[i]);
        arc.push(arc[i - 1] + d);
    }
    let total = *arc.last().unwrap();
    if total <= 0.0 {
        return ring.clone();
    }

    let closed = ring.is_closed();
    let segments = (total / spacing_m).round().max(1.0) as usize;
    let m = if closed { segments.max(3) + 1 } else { segments + 1 };
    let step = total / (m - 1) as f64;

    let mut out = Vec::with_capacity(m);
    let mut seg = 0;
    for k in 0..m {
        let target = step * k as f64;
        while seg + 2 < n && arc[seg + 1] < target {
            seg += 1;
        }
        let span = (arc[seg + 1] - arc[seg]).max(f64::MIN_POSITIVE);
        let t = ((target - arc[seg]) / span).clamp(0.0, 1.0);
        let a = ring.points[seg];
        let b = ring.points[seg + 1];
        out.push(Coord {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        });
    }

    if closed {
        // Snap the end onto the start so closure survives float error
        *out.last_mut().unwrap() = out[0];
    }
    Ring::new(out)
}

/// Resample every ring of a collection; ring count is preserved.
pub fn resample_collection(rc: &RingCollection, spacing_m: f64) -> RingCollection {
    RingCollection {
        rings: rc
            .rings
            .iter()
            .map(|r| resample_ring(r, spacing_m))
            .collect(),
    }
}

/// Centered moving-average filter applied per coordinate channel.
///
/// `window <= 1` disables smoothing. Closed rings are filtered
/// cyclically so the seam does not develop a kink. Open rings clamp the
/// window toward their ends and keep the two endpoints fixed, so chains
/// that terminate on the region boundary stay attached to it.
pub fn smooth_ring(ring: &Ring, window: usize) -> Ring {
    if window <= 1 || ring.len() < 3 {
        return ring.clone();
    }

    let closed = ring.is_closed();
    // Work on distinct vertices; the closing duplicate is re-added below
    let pts = if closed {
        &ring.points[..ring.len() - 1]
    } else {
        &ring.points[..]
    };
    let m = pts.len();
    let half = window / 2;

    let mut out = Vec::with_capacity(ring.len());
    for i in 0..m {
        let mut sx = 0.0;
        let mut sy = 0.0;
        let mut count = 0.0;
        for offset in -(half as isize)..=(half as isize) {
            let j = i as isize + offset;
            let j = if closed {
                j.rem_euclid(m as isize) as usize
            } else if j < 0 || j >= m as isize {
                continue;
            } else {
                j as usize
            };
            sx += pts[j].x;
            sy += pts[j].y;
            count += 1.0;
        }
        out.push(Coord {
            x: sx / count,
            y: sy / count,
        });
    }

    if closed {
        let first = out[0];
        out.push(first);
    } else {
        out[0] = pts[0];
        *out.last_mut().unwrap() = pts[m - 1];
    }
    Ring::new(out)
}

/// Smooth every ring of a collection.
pub fn smooth_collection(rc: &RingCollection, window: usize) -> RingCollection {
    RingCollection {
        rings: rc.rings.iter().map(|r| smooth_ring(r, window)).collect(),
    }
}

/// Drop near-duplicate consecutive points outside a region of interest.
///
/// Points inside `roi` keep full density. Outside it, a point survives
/// only when it is at least `min_sep_m` from the previously kept point.
/// The first and last vertices of a ring are always kept, so closure and
/// ring count are preserved. Applying the kernel twice with the same
/// region removes nothing further.
pub fn coarsen_ring(ring: &Ring, roi: &Polygon<f64>, min_sep_m: f64) -> Ring {
    if ring.len() < 3 {
        return ring.clone();
    }

    let mut out: Vec<Coord<f64>> = Vec::with_capacity(ring.len());
    out.push(ring.points[0]);

    for i in 1..ring.len() - 1 {
        let p = ring.points[i];
        if roi.contains(&Point::new(p.x, p.y)) {
            out.push(p);
            continue;
        }
        let last = *out.last().unwrap();
        if haversine_m(last, p) >= min_sep_m {
            out.push(p);
        }
    }

    out.push(*ring.points.last().unwrap());
    Ring::new(out)
}

/// Coarsen every ring of a collection against the same region of interest.
pub fn coarsen_collection(rc: &RingCollection, roi: &Polygon<f64>, min_sep_m: f64) -> RingCollection {
    RingCollection {
        rings: rc
            .rings
            .iter()
            .map(|r| coarsen_ring(r, roi, min_sep_m))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingRegion;
    use crate::types::Bbox;

    fn square_ring(size: f64) -> Ring {
        Ring::from_xy(&[
            (0.0, 0.0),
            (size, 0.0),
            (size, size),
            (0.0, size),
            (0.0, 0.0),
        ])
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let a = Coord { x: 0.0, y: 0.0 };
        let b = Coord { x: 0.0, y: 1.0 };
        let d = haversine_m(a, b);
        assert!((d - 111_195.0).abs() < 100.0, "1 degree lat: {d} m");
    }

    #[test]
    fn test_resample_preserves_ring_count_and_closure() {
        let mut rc = RingCollection::new();
        rc.push(square_ring(1.0));
        rc.push(Ring::from_xy(&[(3.0, 3.0), (4.0, 3.0), (4.0, 4.0)]));

        let out = resample_collection(&rc, 10_000.0);
        assert_eq!(out.ring_count(), 2);
        assert!(out.rings[0].is_closed());
        // Perimeter of a 1-degree square near the equator is ~445 km;
        // 10 km spacing gives on the order of 45 segments.
        assert!(out.rings[0].len() > 40, "got {}", out.rings[0].len());
    }

    #[test]
    fn test_resample_spacing_is_uniform_on_a_straight_line() {
        // On a straight polyline arc length and chord length coincide, so
        // segment distances must come out equal. Around corners the walk
        // cuts across the vertex and chords shorten; uniformity is only
        // claimed in arc length.
        let line = Ring::from_xy(&[(0.0, 0.0), (0.4, 0.0), (1.0, 0.0)]);
        let out = resample_ring(&line, 20_000.0);
        assert!(out.len() > 3);
        assert_eq!(out.points[0], line.points[0]);
        assert!(haversine_m(*out.points.last().unwrap(), *line.points.last().unwrap()) < 1.0);

        let lengths: Vec<f64> = out.points.windows(2).map(|w| haversine_m(w[0], w[1])).collect();
        let mean: f64 = lengths.iter().sum::<f64>() / lengths.len() as f64;
        for d in lengths {
            assert!(
                (d - mean).abs() / mean < 0.01,
                "segment {d} deviates from mean {mean}"
            );
        }
    }

    #[test]
    fn test_smoothing_disabled_below_two() {
        let ring = square_ring(1.0);
        assert_eq!(smooth_ring(&ring, 0), ring);
        assert_eq!(smooth_ring(&ring, 1), ring);
    }

    #[test]
    fn test_smoothing_pulls_in_corners() {
        let ring = resample_ring(&square_ring(1.0), 10_000.0);
        let smoothed = smooth_ring(&ring, 5);
        assert_eq!(smoothed.len(), ring.len());
        assert!(smoothed.is_closed());

        // Corner (1, 1) moves toward the square interior
        let corner = Coord { x: 1.0, y: 1.0 };
        let nearest = smoothed
            .points
            .iter()
            .map(|&p| haversine_m(p, corner))
            .fold(f64::INFINITY, f64::min);
        assert!(nearest > 1.0, "corner should be rounded off: {nearest} m");
    }

    #[test]
    fn test_smoothing_pins_open_chain_endpoints() {
        let chain = resample_ring(
            &Ring::from_xy(&[(0.0, 0.0), (0.5, 0.3), (1.0, 0.0)]),
            10_000.0,
        );
        let smoothed = smooth_ring(&chain, 5);
        assert_eq!(smoothed.points[0], chain.points[0]);
        assert_eq!(*smoothed.points.last().unwrap(), *chain.points.last().unwrap());
        // Interior still moves
        assert_ne!(smoothed.points[1], chain.points[1]);
    }

    #[test]
    fn test_coarsening_idempotent() {
        let region = BoundingRegion::from_bbox(Bbox::new(0.0, 1.0, 0.0, 1.0));
        let roi = region.inflated_boubox(1.10).to_polygon().unwrap();

        // Dense ring far outside the region of interest
        let ring = resample_ring(
            &Ring::from_xy(&[(5.0, 5.0), (6.0, 5.0), (6.0, 6.0), (5.0, 6.0), (5.0, 5.0)]),
            5_000.0,
        );
        let once = coarsen_ring(&ring, &roi, 50_000.0);
        assert!(once.len() < ring.len());

        let twice = coarsen_ring(&once, &roi, 50_000.0);
        assert_eq!(once, twice, "coarsening must be idempotent");
    }

    #[test]
    fn test_coarsening_keeps_full_density_inside_roi() {
        let region = BoundingRegion::from_bbox(Bbox::new(-1.0, 2.0, -1.0, 2.0));
        let roi = region.inflated_boubox(1.10).to_polygon().unwrap();

        let ring = resample_ring(&square_ring(1.0), 5_000.0);
        let out = coarsen_ring(&ring, &roi, 50_000.0);
        assert_eq!(out, ring);
    }
}
