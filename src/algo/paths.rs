//! Shortest-path curves across the mesh surface.
//!
//! Dividing paths connect the valve contour to the two vessel contours and
//! exist for one purpose: fixing the rotational phase of each contour when
//! it is mapped to its template circle. The vertex where a dividing path
//! meets a vessel contour is the vertex that must land at angle 3π/2 on
//! that contour's circle.
//!
//! Paths are discrete shortest paths over the edge graph (Dijkstra with
//! edge-length weights), which approximates geodesics well enough for
//! phase anchoring.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::mesh::{MeshTopology, SurfaceMesh};

use super::contours::SeedSet;

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    vertex: usize,
    distance: f64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior on a max-heap.
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// Shortest path between two vertices over the edge graph.
///
/// Returns the vertex sequence from `source` to `target` inclusive, or
/// `None` when `target` is unreachable. A path from a vertex to itself is
/// the single-vertex sequence.
pub fn shortest_path(
    mesh: &SurfaceMesh,
    topology: &MeshTopology,
    source: usize,
    target: usize,
) -> Option<Vec<usize>> {
    let n = mesh.num_vertices();
    if source >= n || target >= n {
        return None;
    }
    if source == target {
        return Some(vec![source]);
    }

    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors: Vec<Option<usize>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    distances[source] = 0.0;
    heap.push(QueueEntry {
        vertex: source,
        distance: 0.0,
    });

    while let Some(entry) = heap.pop() {
        let u = entry.vertex;
        if entry.distance > distances[u] {
            continue; // stale entry
        }
        if u == target {
            break;
        }

        for &v in topology.neighbors(u) {
            let edge_len = (mesh.position(u) - mesh.position(v)).norm();
            let candidate = entry.distance + edge_len;
            if candidate < distances[v] {
                distances[v] = candidate;
                predecessors[v] = Some(u);
                heap.push(QueueEntry {
                    vertex: v,
                    distance: candidate,
                });
            }
        }
    }

    if !distances[target].is_finite() {
        return None;
    }

    let mut path = vec![target];
    let mut current = target;
    while let Some(pred) = predecessors[current] {
        path.push(pred);
        current = pred;
    }
    path.reverse();
    Some(path)
}

/// Strategy for picking the two valve-contour vertices that anchor the
/// dividing paths.
///
/// The exact tie-breaking rule is a dataset-calibration concern, so it is
/// pluggable; [`SeedProximitySelector`] is the default.
pub trait ExtremeSelector {
    /// Pick `(toward_superior, toward_inferior)` vertices on the valve
    /// contour.
    fn select(&self, valve: &[usize], mesh: &SurfaceMesh, seeds: &SeedSet) -> (usize, usize);
}

/// Default extreme selection: the valve vertex nearest the superior seed
/// and the valve vertex nearest the inferior seed. Ties break toward the
/// lowest vertex index (valve contours are pre-sorted by index).
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedProximitySelector;

impl ExtremeSelector for SeedProximitySelector {
    fn select(&self, valve: &[usize], mesh: &SurfaceMesh, seeds: &SeedSet) -> (usize, usize) {
        let nearest = |seed: &nalgebra::Point3<f64>| {
            valve
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    let da = (mesh.position(a) - seed).norm();
                    let db = (mesh.position(b) - seed).norm();
                    da.partial_cmp(&db).unwrap_or(Ordering::Equal).then(a.cmp(&b))
                })
                .unwrap_or(0)
        };
        (nearest(&seeds.superior), nearest(&seeds.inferior))
    }
}

/// The three dividing paths of the flattening template.
#[derive(Debug, Clone)]
pub struct DividingPaths {
    /// Valve extreme toward the superior vessel, across to the extreme
    /// toward the inferior vessel.
    pub valve_span: Vec<usize>,
    /// From the superior valve extreme to the superior vessel seed vertex.
    pub to_superior: Vec<usize>,
    /// From the inferior valve extreme to the inferior vessel seed vertex.
    pub to_inferior: Vec<usize>,
}

/// Build the three dividing paths on a (typically hole-filled) mesh.
///
/// `tv_superior` / `tv_inferior` are the valve extremes; `svc` / `ivc` are
/// the mesh vertices nearest the vessel seeds. Unreachable targets produce
/// degenerate single-vertex paths, which anchor trivially.
pub fn dividing_paths(
    mesh: &SurfaceMesh,
    topology: &MeshTopology,
    tv_superior: usize,
    tv_inferior: usize,
    svc: usize,
    ivc: usize,
) -> DividingPaths {
    let fallback = |source: usize| vec![source];
    DividingPaths {
        valve_span: shortest_path(mesh, topology, tv_superior, tv_inferior)
            .unwrap_or_else(|| fallback(tv_superior)),
        to_superior: shortest_path(mesh, topology, tv_superior, svc)
            .unwrap_or_else(|| fallback(tv_superior)),
        to_inferior: shortest_path(mesh, topology, tv_inferior, ivc)
            .unwrap_or_else(|| fallback(tv_inferior)),
    }
}

/// The contour vertex where a dividing path first meets the contour.
///
/// This vertex maps to angle 3π/2 on the contour's template circle. For a
/// single-vertex path the anchor is that vertex, trivially (when the path
/// start already lies on the contour). Returns `None` when the path never
/// touches the contour.
pub fn phase_anchor(path: &[usize], contour: &[usize]) -> Option<usize> {
    let contour_set: HashSet<usize> = contour.iter().copied().collect();
    path.iter().copied().find(|v| contour_set.contains(v))
}
