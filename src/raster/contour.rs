//! Iso-contour extraction from a raster grid.
//!
//! Marching squares over the node grid: each cell is classified by which
//! of its four corners exceed the level, crossing segments are emitted
//! per cell, and segments are then chained into polylines by matching
//! endpoints. Every crossing point is computed once per grid edge, from
//! the edge's two nodes in a fixed order, so adjacent cells emit
//! bitwise-identical endpoints and closed contours assemble into single
//! closed rings.

use std::collections::HashMap;

use geo::Coord;

use super::window::RasterGrid;
use crate::geometry::{Ring, RingCollection};

/// Extract the iso-contour of `grid` at `level` as a ring collection.
///
/// Cells touching a non-finite node are skipped, so contours stop at
/// data holes instead of inventing geometry across them.
pub fn trace_iso_contour(grid: &RasterGrid, level: f64) -> RingCollection {
    let nx = grid.x.len();
    let ny = grid.y.len();
    let mut segments: Vec<(Coord<f64>, Coord<f64>)> = Vec::new();

    // Crossing on the horizontal grid edge from node (i, j) to (i+1, j).
    // Always interpolated west to east, so both cells sharing the edge
    // get the exact same point.
    let h_cross = |i: usize, j: usize| -> Coord<f64> {
        let za = grid.values[i][j];
        let zb = grid.values[i + 1][j];
        let t = (level - za) / (zb - za);
        Coord {
            x: grid.x[i] + (grid.x[i + 1] - grid.x[i]) * t,
            y: grid.y[j],
        }
    };
    // Crossing on the vertical grid edge from node (i, j) to (i, j+1),
    // interpolated south to north.
    let v_cross = |i: usize, j: usize| -> Coord<f64> {
        let za = grid.values[i][j];
        let zb = grid.values[i][j + 1];
        let t = (level - za) / (zb - za);
        Coord {
            x: grid.x[i],
            y: grid.y[j] + (grid.y[j + 1] - grid.y[j]) * t,
        }
    };

    for i in 0..nx - 1 {
        for j in 0..ny - 1 {
            let z = [
                grid.values[i][j],         // bottom-left
                grid.values[i + 1][j],     // bottom-right
                grid.values[i + 1][j + 1], // top-right
                grid.values[i][j + 1],     // top-left
            ];
            if z.iter().any(|v| !v.is_finite()) {
                continue;
            }

            let mut case = 0usize;
            for (k, &v) in z.iter().enumerate() {
                if v > level {
                    case |= 1 << k;
                }
            }
            if case == 0 || case == 15 {
                continue;
            }

            // Cell edge k lies between corners k and k+1:
            // 0 = bottom, 1 = right, 2 = top, 3 = left
            let cross = |k: usize| -> Coord<f64> {
                match k {
                    0 => h_cross(i, j),
                    1 => v_cross(i + 1, j),
                    2 => h_cross(i, j + 1),
                    _ => v_cross(i, j),
                }
            };

            // Edge pairs per case; saddles (5, 10) split by the cell
            // center value.
            let center = (z[0] + z[1] + z[2] + z[3]) / 4.0;
            let pairs: &[(usize, usize)] = match case {
                1 => &[(3, 0)],
                2 => &[(0, 1)],
                3 => &[(3, 1)],
                4 => &[(1, 2)],
                5 => {
                    if center > level {
                        &[(3, 2), (1, 0)]
                    } else {
                        &[(3, 0), (1, 2)]
                    }
                }
                6 => &[(0, 2)],
                7 => &[(3, 2)],
                8 => &[(2, 3)],
                9 => &[(2, 0)],
                10 => {
                    if center > level {
                        &[(0, 1), (2, 3)]
                    } else {
                        &[(0, 3), (2, 1)]
                    }
                }
                11 => &[(2, 1)],
                12 => &[(1, 3)],
                13 => &[(1, 0)],
                14 => &[(0, 3)],
                _ => unreachable!(),
            };

            for &(a, b) in pairs {
                segments.push((cross(a), cross(b)));
            }
        }
    }

    assemble(segments)
}

/// Endpoints match bit-exactly: crossings are computed once per grid
/// edge, never re-derived per cell.
fn key(p: Coord<f64>) -> (u64, u64) {
    (p.x.to_bits(), p.y.to_bits())
}

/// Chain segments into polylines by endpoint matching.
fn assemble(segments: Vec<(Coord<f64>, Coord<f64>)>) -> RingCollection {
    // Endpoint key -> indices of segments touching it
    let mut by_end: HashMap<(u64, u64), Vec<usize>> = HashMap::new();
    for (idx, &(a, b)) in segments.iter().enumerate() {
        by_end.entry(key(a)).or_default().push(idx);
        by_end.entry(key(b)).or_default().push(idx);
    }

    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (a, b) = segments[start];
        let mut chain = vec![a, b];

        // Extend forward from the tail, then backward from the head
        for forward in [true, false] {
            loop {
                let tip = if forward { *chain.last().unwrap() } else { chain[0] };
                let Some(candidates) = by_end.get(&key(tip)) else { break };
                let Some(&next) = candidates.iter().find(|&&i| !used[i]) else {
                    break;
                };
                used[next] = true;
                let (na, nb) = segments[next];
                let other = if key(na) == key(tip) { nb } else { na };
                if forward {
                    chain.push(other);
                } else {
                    chain.insert(0, other);
                }
            }
        }

        if chain.len() >= 2 {
            let mut ring = Ring::new(chain);
            if key(ring.points[0]) == key(*ring.points.last().unwrap()) {
                // Snap endpoints so closure is exact
                let first = ring.points[0];
                *ring.points.last_mut().unwrap() = first;
            }
            rings.push(ring);
        }
    }

    RingCollection::from_rings(rings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::haversine_m;

    /// Radial depth bowl: z = r - 2, so the z = 0 contour is the circle
    /// of radius 2 about the origin.
    fn bowl() -> RasterGrid {
        let x: Vec<f64> = (0..41).map(|i| -4.0 + i as f64 * 0.2).collect();
        let y: Vec<f64> = (0..41).map(|j| -4.0 + j as f64 * 0.2).collect();
        let values = x
            .iter()
            .map(|&xv| y.iter().map(|&yv| (xv * xv + yv * yv).sqrt() - 2.0).collect())
            .collect();
        RasterGrid { x: x.clone(), y, values }
    }

    #[test]
    fn test_circle_contour_is_one_closed_ring() {
        let rings = trace_iso_contour(&bowl(), 0.0);
        assert_eq!(rings.ring_count(), 1);
        let ring = &rings.rings[0];
        assert!(ring.is_closed(), "contour of a bowl must close");

        for p in &ring.points {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!((r - 2.0).abs() < 0.05, "contour point at radius {r}");
        }
    }

    #[test]
    fn test_adjacent_cells_share_crossing_points() {
        // A ring that fragments would show up as chains whose interior
        // endpoints touch only one segment; count endpoint degrees.
        let rings = trace_iso_contour(&bowl(), 0.0);
        let mut degree: HashMap<(u64, u64), usize> = HashMap::new();
        for ring in &rings.rings {
            for w in ring.points.windows(2) {
                *degree.entry(key(w[0])).or_default() += 1;
                *degree.entry(key(w[1])).or_default() += 1;
            }
        }
        // On a closed contour every crossing point is used exactly twice
        assert!(degree.values().all(|&d| d == 2), "fragmented contour");
    }

    #[test]
    fn test_flat_grid_has_no_contour() {
        let x: Vec<f64> = (0..5).map(|i| i as f64).collect();
        let y = x.clone();
        let values = vec![vec![-50.0; 5]; 5];
        let rings = trace_iso_contour(&RasterGrid { x, y, values }, 0.0);
        assert_eq!(rings.ring_count(), 0);
    }

    #[test]
    fn test_contour_stops_at_data_holes() {
        let mut grid = bowl();
        // NaN out a band so the circle cannot close
        for i in 0..grid.x.len() {
            grid.values[i][20] = f64::NAN;
        }
        let rings = trace_iso_contour(&grid, 0.0);
        assert!(rings.ring_count() >= 2);
        assert!(rings.rings.iter().all(|r| !r.is_closed()));
    }

    #[test]
    fn test_contour_points_are_geographically_plausible() {
        let rings = trace_iso_contour(&bowl(), 0.0);
        let ring = &rings.rings[0];
        // Consecutive contour points come from adjacent cells
        for w in ring.points.windows(2) {
            assert!(haversine_m(w[0], w[1]) < 60_000.0);
        }
    }
}
