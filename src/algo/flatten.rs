//! Constrained quasi-conformal flattening.
//!
//! The numerical core of the pipeline: given a mesh, a set of vertices
//! pinned to target 2D positions, and cotangent edge weights, solve for a
//! 2D position of every vertex such that pinned vertices hold their
//! targets exactly and every free vertex sits at the weighted average of
//! its neighbors (the discrete harmonic condition).
//!
//! Constraints are eliminated rather than penalized: the linear system is
//! assembled over free vertices only, with constrained neighbors moved to
//! the right-hand side. Pinned vertices therefore hold their targets by
//! construction, not to solver tolerance. The reduced system is symmetric
//! and, on a connected region with clamped cotangent weights, positive
//! definite, so conjugate gradient applies.
//!
//! Flattening runs a fixed two-pass schedule: pass 1 weights the Laplacian
//! with the original 3D geometry, pass 2 rebuilds the weights from the
//! pass-1 planar result and re-solves. This reduces the angular distortion
//! that 3D weights introduce on a 2D target. Exactly two passes, never a
//! convergence loop.

use std::collections::{HashMap, VecDeque};

use nalgebra::{DVector, Point2, Point3};

use crate::error::{FlatError, Result};
use crate::mesh::{cotangent_weights, MeshTopology, SurfaceMesh};

use super::sparse::{conjugate_gradient, CsrMatrix};

/// A set of vertices pinned to fixed 2D target positions.
///
/// All vertex indices are distinct; the interior anchor must not coincide
/// with any boundary-constrained vertex.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    targets: HashMap<usize, Point2<f64>>,
}

impl ConstraintSet {
    /// Create an empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a contour vertex to a target position.
    ///
    /// # Errors
    ///
    /// [`FlatError::DuplicateConstraint`] if the vertex is already pinned.
    pub fn pin(&mut self, vertex: usize, target: Point2<f64>) -> Result<()> {
        if self.targets.insert(vertex, target).is_some() {
            return Err(FlatError::DuplicateConstraint(vertex));
        }
        Ok(())
    }

    /// Pin an ordered contour to its sampled template positions.
    ///
    /// `contour` and `samples` pair positionally and must have equal length.
    pub fn pin_contour(&mut self, contour: &[usize], samples: &[Point2<f64>]) -> Result<()> {
        assert_eq!(contour.len(), samples.len(), "contour/sample length mismatch");
        for (&v, &p) in contour.iter().zip(samples) {
            self.pin(v, p)?;
        }
        Ok(())
    }

    /// Pin the interior apex anchor.
    ///
    /// # Errors
    ///
    /// [`FlatError::AnchorOnBoundary`] if the anchor vertex is already
    /// constrained (it would coincide with a contour vertex).
    pub fn pin_anchor(&mut self, vertex: usize, target: Point2<f64>) -> Result<()> {
        if self.targets.contains_key(&vertex) {
            return Err(FlatError::AnchorOnBoundary(vertex));
        }
        self.targets.insert(vertex, target);
        Ok(())
    }

    /// Target position of a vertex, if pinned.
    #[inline]
    pub fn target(&self, vertex: usize) -> Option<Point2<f64>> {
        self.targets.get(&vertex).copied()
    }

    /// Whether the vertex is pinned.
    #[inline]
    pub fn contains(&self, vertex: usize) -> bool {
        self.targets.contains_key(&vertex)
    }

    /// Number of pinned vertices.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether no vertex is pinned.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// The solved 2D position of every mesh vertex.
#[derive(Debug, Clone)]
pub struct FlatMap {
    coords: Vec<Point2<f64>>,
}

impl FlatMap {
    /// 2D position of vertex `v`.
    #[inline]
    pub fn get(&self, v: usize) -> Point2<f64> {
        self.coords[v]
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// All coordinates, indexed by vertex.
    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Reinterpret the planar result as 3D geometry (z = 0), the input to
    /// the refinement pass's weight computation.
    pub fn to_planar_positions(&self) -> Vec<Point3<f64>> {
        self.coords.iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect()
    }
}

/// Solver parameters for the conjugate gradient solve.
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// Maximum CG iterations per axis.
    pub max_iterations: usize,
    /// CG convergence tolerance (relative residual).
    pub tolerance: f64,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            max_iterations: 4000,
            tolerance: 1e-12,
        }
    }
}

/// Check that every free vertex can reach a constrained vertex.
///
/// A free region with no path to any pin makes the reduced system
/// singular; that is a fatal geometry error, not something to patch over.
fn check_connectivity(
    n: usize,
    topology: &MeshTopology,
    constraints: &ConstraintSet,
) -> Result<()> {
    let mut reached = vec![false; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&v| constraints.contains(v)).collect();
    for &v in &queue {
        reached[v] = true;
    }
    while let Some(v) = queue.pop_front() {
        for &next in topology.neighbors(v) {
            if !reached[next] {
                reached[next] = true;
                queue.push_back(next);
            }
        }
    }
    match reached.iter().position(|&r| !r) {
        Some(vertex) => Err(FlatError::SingularSystem { vertex }),
        None => Ok(()),
    }
}

/// Solve one constrained harmonic flattening pass.
///
/// `positions` supply the geometry the cotangent weights are computed
/// from; the mesh's connectivity is taken from `mesh` and `topology`.
/// Both coordinate axes are solved independently against the same matrix.
///
/// # Errors
///
/// - [`FlatError::EmptyMesh`] for a mesh without faces
/// - [`FlatError::SingularSystem`] when a free region cannot reach a pin
/// - [`FlatError::ConvergenceFailed`] if CG stalls
pub fn flatten_pass(
    mesh: &SurfaceMesh,
    topology: &MeshTopology,
    positions: &[Point3<f64>],
    constraints: &ConstraintSet,
    options: &FlattenOptions,
) -> Result<FlatMap> {
    let n = mesh.num_vertices();
    if n == 0 || mesh.num_faces() == 0 {
        return Err(FlatError::EmptyMesh);
    }
    check_connectivity(n, topology, constraints)?;

    let weights = cotangent_weights(positions, mesh.faces());

    // Number the free vertices.
    let mut free_index = vec![usize::MAX; n];
    let mut free_vertices = Vec::new();
    for v in 0..n {
        if !constraints.contains(v) {
            free_index[v] = free_vertices.len();
            free_vertices.push(v);
        }
    }
    let n_free = free_vertices.len();

    let mut coords = vec![Point2::origin(); n];
    for v in 0..n {
        if let Some(target) = constraints.target(v) {
            coords[v] = target;
        }
    }
    if n_free == 0 {
        return Ok(FlatMap { coords });
    }

    // Reduced Laplacian: rows only for free vertices, constrained
    // neighbors contribute to the right-hand side.
    let mut triplets = Vec::new();
    let mut rhs_x = DVector::zeros(n_free);
    let mut rhs_y = DVector::zeros(n_free);

    for (row, &v) in free_vertices.iter().enumerate() {
        let mut diagonal = 0.0;
        for &u in topology.neighbors(v) {
            let w = weights.get(v, u);
            diagonal += w;
            match constraints.target(u) {
                Some(target) => {
                    rhs_x[row] += w * target.x;
                    rhs_y[row] += w * target.y;
                }
                None => triplets.push((row, free_index[u], -w)),
            }
        }
        triplets.push((row, row, diagonal));
    }

    let matrix = CsrMatrix::from_triplets(n_free, n_free, triplets);
    let x = conjugate_gradient(&matrix, &rhs_x, options.max_iterations, options.tolerance)?;
    let y = conjugate_gradient(&matrix, &rhs_y, options.max_iterations, options.tolerance)?;

    for (row, &v) in free_vertices.iter().enumerate() {
        coords[v] = Point2::new(x[row], y[row]);
    }

    Ok(FlatMap { coords })
}

/// Run the fixed two-pass flattening schedule.
///
/// Pass 1 uses weights from the mesh's 3D geometry; pass 2 rebuilds
/// weights from the pass-1 planar result and re-solves.
pub fn flatten_two_pass(
    mesh: &SurfaceMesh,
    topology: &MeshTopology,
    constraints: &ConstraintSet,
    options: &FlattenOptions,
) -> Result<FlatMap> {
    let first = flatten_pass(mesh, topology, mesh.positions(), constraints, options)?;
    let planar = first.to_planar_positions();
    flatten_pass(mesh, topology, &planar, constraints, options)
}
