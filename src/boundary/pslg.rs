//! Planar straight-line graph over boundary rings.
//!
//! Nodes are deduplicated by coordinate quantization so rings sharing
//! vertices become one connected structure. Breadth-first search over
//! the adjacency then partitions the graph into connected components,
//! which is how the pipeline separates the hydraulically reachable
//! boundary from detached fragments.

use std::collections::{HashMap, VecDeque};

use geo::Coord;

use crate::geometry::{Ring, RingCollection};

/// Node-merge quantum in degrees (~0.1 mm).
const NODE_TOL: f64 = 1e-9;

/// Planar straight-line graph built from boundary rings.
#[derive(Clone, Debug)]
pub struct Pslg {
    nodes: Vec<Coord<f64>>,
    edges: Vec<(usize, usize)>,
    /// node index -> (neighbor node, edge index)
    adjacency: Vec<Vec<(usize, usize)>>,
}

/// One BFS component: node and edge index sets into the owning [`Pslg`].
#[derive(Clone, Debug)]
pub struct ConnectivityPartition {
    pub nodes: Vec<usize>,
    pub edges: Vec<usize>,
}

fn node_key(p: Coord<f64>) -> (i64, i64) {
    ((p.x / NODE_TOL).round() as i64, (p.y / NODE_TOL).round() as i64)
}

impl Pslg {
    /// Build the graph from one or more ring collections.
    ///
    /// Coincident vertices across rings merge into single nodes, and
    /// consecutive ring vertices become edges. Zero-length segments are
    /// dropped.
    pub fn from_collections<'a>(collections: impl IntoIterator<Item = &'a RingCollection>) -> Self {
        let mut nodes: Vec<Coord<f64>> = Vec::new();
        let mut index: HashMap<(i64, i64), usize> = HashMap::new();
        let mut edges: Vec<(usize, usize)> = Vec::new();

        let mut intern = |p: Coord<f64>, nodes: &mut Vec<Coord<f64>>| -> usize {
            *index.entry(node_key(p)).or_insert_with(|| {
                nodes.push(p);
                nodes.len() - 1
            })
        };

        for rc in collections {
            for ring in &rc.rings {
                let mut prev: Option<usize> = None;
                for &p in &ring.points {
                    let id = intern(p, &mut nodes);
                    if let Some(q) = prev {
                        if q != id {
                            edges.push((q, id));
                        }
                    }
                    prev = Some(id);
                }
            }
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (e, &(a, b)) in edges.iter().enumerate() {
            adjacency[a].push((b, e));
            adjacency[b].push((a, e));
        }

        Self {
            nodes,
            edges,
            adjacency,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: usize) -> Coord<f64> {
        self.nodes[id]
    }

    /// Node nearest to (x, y) by squared planar distance.
    pub fn nearest_node(&self, x: f64, y: f64) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (a.x - x).powi(2) + (a.y - y).powi(2);
                let db = (b.x - x).powi(2) + (b.y - y).powi(2);
                da.total_cmp(&db)
            })
            .map(|(i, _)| i)
    }

    /// Breadth-first search from `start`, returning the reached
    /// component.
    pub fn bfs_from(&self, start: usize) -> ConnectivityPartition {
        let mut seen = vec![false; self.nodes.len()];
        let mut edge_seen = vec![false; self.edges.len()];
        let mut queue = VecDeque::new();
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        seen[start] = true;
        queue.push_back(start);
        while let Some(n) = queue.pop_front() {
            nodes.push(n);
            for &(m, e) in &self.adjacency[n] {
                if !edge_seen[e] {
                    edge_seen[e] = true;
                    edges.push(e);
                }
                if !seen[m] {
                    seen[m] = true;
                    queue.push_back(m);
                }
            }
        }

        ConnectivityPartition { nodes, edges }
    }

    /// Assemble a partition's edges into ordered polylines.
    ///
    /// Chains are walked greedily from junction or terminal nodes first,
    /// then remaining pure loops; a chain that returns to its start
    /// comes back as a closed ring.
    pub fn partition_polylines(&self, part: &ConnectivityPartition) -> RingCollection {
        let mut edge_used = vec![false; self.edges.len()];
        let mut in_part = vec![false; self.edges.len()];
        for &e in &part.edges {
            in_part[e] = true;
        }

        // Degree restricted to partition edges
        let mut degree: HashMap<usize, usize> = HashMap::new();
        for &e in &part.edges {
            let (a, b) = self.edges[e];
            *degree.entry(a).or_insert(0) += 1;
            *degree.entry(b).or_insert(0) += 1;
        }

        let mut walk_from = |start: usize, edge_used: &mut Vec<bool>| -> Option<Ring> {
            let first_edge = self.adjacency[start]
                .iter()
                .find(|&&(_, e)| in_part[e] && !edge_used[e])
                .map(|&(m, e)| (m, e))?;

            let mut points = vec![self.nodes[start]];
            let (mut current, first) = first_edge;
            edge_used[first] = true;
            points.push(self.nodes[current]);

            // Continue while the current node has exactly one unused
            // continuation
            loop {
                let mut next = None;
                let mut count = 0;
                for &(m, e) in &self.adjacency[current] {
                    if in_part[e] && !edge_used[e] {
                        count += 1;
                        next = Some((m, e));
                    }
                }
                if count != 1 {
                    break;
                }
                let (m, e) = next.unwrap();
                edge_used[e] = true;
                points.push(self.nodes[m]);
                current = m;
                if current == start {
                    break;
                }
            }
            Some(Ring::new(points))
        };

        let mut rings = Vec::new();

        // Terminals and junctions first so chains start at natural ends
        let mut starts: Vec<usize> = degree
            .iter()
            .filter(|&(_, &d)| d != 2)
            .map(|(&n, _)| n)
            .collect();
        starts.sort_unstable();
        for n in starts {
            while let Some(ring) = walk_from(n, &mut edge_used) {
                rings.push(ring);
            }
        }

        // Whatever remains is pure loops
        for &e in &part.edges {
            if !edge_used[e] {
                let (a, _) = self.edges[e];
                if let Some(ring) = walk_from(a, &mut edge_used) {
                    rings.push(ring);
                }
            }
        }

        RingCollection::from_rings(rings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Ring;

    fn square(x0: f64, y0: f64) -> Ring {
        Ring::from_xy(&[
            (x0, y0),
            (x0 + 1.0, y0),
            (x0 + 1.0, y0 + 1.0),
            (x0, y0 + 1.0),
            (x0, y0),
        ])
    }

    #[test]
    fn test_shared_vertices_merge() {
        let mut rc = RingCollection::new();
        rc.push(Ring::from_xy(&[(0.0, 0.0), (1.0, 0.0)]));
        rc.push(Ring::from_xy(&[(1.0, 0.0), (2.0, 0.0)]));

        let pslg = Pslg::from_collections([&rc]);
        assert_eq!(pslg.node_count(), 3);
        assert_eq!(pslg.edge_count(), 2);
    }

    #[test]
    fn test_bfs_reaches_only_connected_component() {
        let mut rc = RingCollection::new();
        rc.push(square(0.0, 0.0));
        rc.push(square(10.0, 10.0));

        let pslg = Pslg::from_collections([&rc]);
        assert_eq!(pslg.node_count(), 8);

        let seed = pslg.nearest_node(0.1, 0.1).unwrap();
        let part = pslg.bfs_from(seed);
        assert_eq!(part.nodes.len(), 4);
        assert_eq!(part.edges.len(), 4);
    }

    #[test]
    fn test_partition_polylines_recovers_loop() {
        let mut rc = RingCollection::new();
        rc.push(square(0.0, 0.0));

        let pslg = Pslg::from_collections([&rc]);
        let part = pslg.bfs_from(0);
        let rings = pslg.partition_polylines(&part);

        assert_eq!(rings.ring_count(), 1);
        assert!(rings.rings[0].is_closed());
        assert_eq!(rings.rings[0].len(), 5);
    }

    #[test]
    fn test_nearest_node() {
        let mut rc = RingCollection::new();
        rc.push(square(0.0, 0.0));
        let pslg = Pslg::from_collections([&rc]);

        let id = pslg.nearest_node(1.1, 1.1).unwrap();
        let p = pslg.node(id);
        assert_eq!((p.x, p.y), (1.0, 1.0));
    }

    #[test]
    fn test_open_chain_polyline() {
        let mut rc = RingCollection::new();
        rc.push(Ring::from_xy(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.5), (3.0, 0.0)]));

        let pslg = Pslg::from_collections([&rc]);
        let part = pslg.bfs_from(0);
        let rings = pslg.partition_polylines(&part);
        assert_eq!(rings.ring_count(), 1);
        assert_eq!(rings.rings[0].len(), 4);
        assert!(!rings.rings[0].is_closed());
    }
}
