//! Adjacency and boundary structure of a triangle mesh.
//!
//! [`MeshTopology`] is built once per mesh and answers the queries the rest
//! of the pipeline needs: vertex neighborhoods, boundary-edge membership,
//! and the boundary-restricted adjacency used for contour walks. Cotangent
//! edge weights live here too since they are a property of the triangulation.

use std::collections::{HashMap, HashSet};

use nalgebra::Point3;

use super::SurfaceMesh;

/// Clamp for a single cotangent contribution. Degenerate (near zero area)
/// triangles would otherwise blow the weight up to infinity.
const MAX_COTANGENT: f64 = 1.0e4;

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Undirected adjacency and boundary-edge structure for a [`SurfaceMesh`].
#[derive(Debug, Clone)]
pub struct MeshTopology {
    neighbors: Vec<Vec<usize>>,
    boundary_edges: HashSet<(usize, usize)>,
    boundary_neighbors: Vec<Vec<usize>>,
}

impl MeshTopology {
    /// Build the topology of a mesh.
    ///
    /// Boundary edges are the edges incident to exactly one face.
    pub fn build(mesh: &SurfaceMesh) -> Self {
        let n = mesh.num_vertices();
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut edge_faces: HashMap<(usize, usize), usize> = HashMap::new();

        for face in mesh.faces() {
            for i in 0..3 {
                let a = face[i];
                let b = face[(i + 1) % 3];
                *edge_faces.entry(edge_key(a, b)).or_insert(0) += 1;
            }
        }

        for &(a, b) in edge_faces.keys() {
            neighbors[a].push(b);
            neighbors[b].push(a);
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }

        let boundary_edges: HashSet<(usize, usize)> = edge_faces
            .iter()
            .filter(|(_, &count)| count == 1)
            .map(|(&e, _)| e)
            .collect();

        let mut boundary_neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for &(a, b) in &boundary_edges {
            boundary_neighbors[a].push(b);
            boundary_neighbors[b].push(a);
        }
        for list in &mut boundary_neighbors {
            list.sort_unstable();
        }

        Self {
            neighbors,
            boundary_edges,
            boundary_neighbors,
        }
    }

    /// Neighbors of vertex `v` (sorted ascending).
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.neighbors[v]
    }

    /// Whether the edge (a, b) lies on the mesh boundary.
    #[inline]
    pub fn is_boundary_edge(&self, a: usize, b: usize) -> bool {
        self.boundary_edges.contains(&edge_key(a, b))
    }

    /// Whether vertex `v` touches any boundary edge.
    #[inline]
    pub fn is_boundary_vertex(&self, v: usize) -> bool {
        !self.boundary_neighbors[v].is_empty()
    }

    /// Boundary-edge neighbors of vertex `v` (sorted ascending).
    ///
    /// For a manifold boundary this is empty (interior vertex) or has
    /// exactly two entries.
    #[inline]
    pub fn boundary_neighbors(&self, v: usize) -> &[usize] {
        &self.boundary_neighbors[v]
    }

    /// All boundary edges, as normalized `(min, max)` pairs.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.boundary_edges.iter().copied()
    }

    /// Whether the mesh has any boundary at all.
    pub fn has_boundary(&self) -> bool {
        !self.boundary_edges.is_empty()
    }
}

/// Cotangent edge weights for a triangulation.
///
/// The weight of edge (i, j) is the sum of the (clamped) cotangents of the
/// angles opposite the edge in its one or two incident triangles. Missing
/// edges weigh zero.
#[derive(Debug, Clone, Default)]
pub struct EdgeWeights {
    weights: HashMap<(usize, usize), f64>,
}

impl EdgeWeights {
    /// Weight of edge (a, b), 0.0 if the edge does not exist.
    #[inline]
    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.weights.get(&edge_key(a, b)).copied().unwrap_or(0.0)
    }

    /// Number of weighted edges.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether no edges are weighted.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Compute cotangent weights for every edge of a triangulation.
///
/// `positions` are passed separately from the mesh so the refinement pass
/// can reuse the same connectivity with the pass-1 planar coordinates.
///
/// Each cotangent is clamped to `[-MAX_COTANGENT, MAX_COTANGENT]`, so
/// degenerate triangles contribute a large-but-finite weight instead of
/// NaN or infinity.
pub fn cotangent_weights(positions: &[Point3<f64>], faces: &[[usize; 3]]) -> EdgeWeights {
    let mut weights: HashMap<(usize, usize), f64> = HashMap::new();

    for face in faces {
        // Corner k is opposite edge (i, j).
        for k in 0..3 {
            let i = face[(k + 1) % 3];
            let j = face[(k + 2) % 3];
            let apex = face[k];

            let u = positions[i] - positions[apex];
            let v = positions[j] - positions[apex];

            let cross = u.cross(&v).norm();
            let dot = u.dot(&v);
            let cot = if cross > f64::MIN_POSITIVE {
                (dot / cross).clamp(-MAX_COTANGENT, MAX_COTANGENT)
            } else {
                // Collapsed corner: the true cotangent diverges.
                MAX_COTANGENT * dot.signum()
            };

            *weights.entry(edge_key(i, j)).or_insert(0.0) += 0.5 * cot;
        }
    }

    EdgeWeights { weights }
}
