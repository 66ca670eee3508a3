//! Core mesh data structures.
//!
//! This module provides [`SurfaceMesh`], a face-vertex triangle mesh with
//! named per-vertex scalar arrays, and [`MeshTopology`](topology::MeshTopology),
//! the adjacency/boundary structure derived from it.
//!
//! The flattening pipeline identifies vertices by plain `usize` indices and
//! relies on index correspondence between meshes produced by successive
//! stages, so the mesh keeps its vertex order stable across every operation
//! except [`SurfaceMesh::threshold_points`], which returns the index remap.
//!
//! # Construction
//!
//! ```
//! use raflat::mesh::SurfaceMesh;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh = SurfaceMesh::from_parts(vertices, faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 3);
//! ```

mod topology;

pub use topology::{cotangent_weights, EdgeWeights, MeshTopology};

use nalgebra::Point3;

use crate::error::{FlatError, Result};

/// A named per-vertex data array with 1 to 4 components per vertex.
///
/// Values are stored interleaved: vertex `i` owns
/// `values[i * components .. (i + 1) * components]`.
#[derive(Debug, Clone)]
pub struct ScalarArray {
    /// The array name (e.g. `"hole"`, `"uv"`).
    pub name: String,
    /// Number of components per vertex (1 to 4).
    pub components: usize,
    /// Interleaved values, `num_vertices * components` long.
    pub values: Vec<f64>,
}

/// A triangulated surface mesh with vertex positions and named point data.
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    positions: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
    point_data: Vec<ScalarArray>,
}

impl SurfaceMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from vertex positions and triangle indices.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidVertexIndex`] if any face references a
    /// vertex outside `positions`.
    pub fn from_parts(positions: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Result<Self> {
        let n = positions.len();
        for (fi, face) in faces.iter().enumerate() {
            for &v in face {
                if v >= n {
                    return Err(FlatError::InvalidVertexIndex { face: fi, vertex: v });
                }
            }
        }
        Ok(Self {
            positions,
            faces,
            point_data: Vec::new(),
        })
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangular faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Position of vertex `v`.
    #[inline]
    pub fn position(&self, v: usize) -> &Point3<f64> {
        &self.positions[v]
    }

    /// All vertex positions, indexed by vertex.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// All triangle faces.
    #[inline]
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Axis-aligned bounding box, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.positions {
            for c in 0..3 {
                min[c] = min[c].min(p[c]);
                max[c] = max[c].max(p[c]);
            }
        }
        Some((min, max))
    }

    /// Length of the bounding-box diagonal (0.0 for an empty mesh).
    pub fn bbox_diagonal(&self) -> f64 {
        self.bounding_box()
            .map(|(min, max)| (max - min).norm())
            .unwrap_or(0.0)
    }

    /// Find the vertex closest to an arbitrary 3D query point.
    ///
    /// Linear scan; the meshes in this pipeline are small enough (a few
    /// thousand vertices) that a spatial index is not worth maintaining.
    pub fn closest_vertex(&self, query: &Point3<f64>) -> Option<usize> {
        let mut best = None;
        let mut best_d = f64::INFINITY;
        for (i, p) in self.positions.iter().enumerate() {
            let d = (p - query).norm_squared();
            if d < best_d {
                best_d = d;
                best = Some(i);
            }
        }
        best
    }

    /// Attach or replace a named point-data array.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::ArrayLengthMismatch`] if `values.len()` is not
    /// `num_vertices * components`.
    pub fn set_point_data(&mut self, name: &str, components: usize, values: Vec<f64>) -> Result<()> {
        let expected = self.num_vertices() * components;
        if values.len() != expected {
            return Err(FlatError::ArrayLengthMismatch {
                name: name.to_string(),
                len: values.len(),
                expected,
            });
        }
        if let Some(existing) = self.point_data.iter_mut().find(|a| a.name == name) {
            existing.components = components;
            existing.values = values;
        } else {
            self.point_data.push(ScalarArray {
                name: name.to_string(),
                components,
                values,
            });
        }
        Ok(())
    }

    /// Look up a point-data array by name.
    pub fn point_data(&self, name: &str) -> Option<&ScalarArray> {
        self.point_data.iter().find(|a| a.name == name)
    }

    /// All point-data arrays, in insertion order.
    pub fn point_data_arrays(&self) -> &[ScalarArray] {
        &self.point_data
    }

    /// Remove a point-data array by name. Returns whether it existed.
    pub fn remove_point_data(&mut self, name: &str) -> bool {
        let before = self.point_data.len();
        self.point_data.retain(|a| a.name != name);
        self.point_data.len() != before
    }

    /// Extract the submesh of vertices whose `name` scalar lies in
    /// `[lower, upper]` (inclusive), keeping faces whose three vertices all
    /// survive.
    ///
    /// Returns the submesh together with the original index of each kept
    /// vertex, so callers can map submesh indices back to this mesh.
    /// Point-data arrays are carried over for the kept vertices.
    ///
    /// Vertices with no `name` array entry (array absent) are all kept.
    pub fn threshold_points(&self, name: &str, lower: f64, upper: f64) -> (SurfaceMesh, Vec<usize>) {
        let array = self.point_data(name);
        let keep: Vec<bool> = (0..self.num_vertices())
            .map(|i| match array {
                Some(a) => {
                    let v = a.values[i * a.components];
                    v >= lower && v <= upper
                }
                None => true,
            })
            .collect();

        let mut kept_ids = Vec::new();
        let mut remap = vec![usize::MAX; self.num_vertices()];
        let mut positions = Vec::new();
        for (i, &k) in keep.iter().enumerate() {
            if k {
                remap[i] = kept_ids.len();
                kept_ids.push(i);
                positions.push(self.positions[i]);
            }
        }

        let faces: Vec<[usize; 3]> = self
            .faces
            .iter()
            .filter(|f| f.iter().all(|&v| keep[v]))
            .map(|f| [remap[f[0]], remap[f[1]], remap[f[2]]])
            .collect();

        let mut sub = SurfaceMesh {
            positions,
            faces,
            point_data: Vec::new(),
        };
        for a in &self.point_data {
            let mut values = Vec::with_capacity(kept_ids.len() * a.components);
            for &old in &kept_ids {
                values.extend_from_slice(&a.values[old * a.components..(old + 1) * a.components]);
            }
            sub.point_data.push(ScalarArray {
                name: a.name.clone(),
                components: a.components,
                values,
            });
        }
        (sub, kept_ids)
    }

    /// Copy every point-data array from `source` onto this mesh by
    /// nearest-vertex lookup.
    ///
    /// Used when the two meshes have different vertex sets (e.g. original
    /// clipped mesh vs. the hole-removed mesh) and index correspondence is
    /// not available.
    pub fn transfer_point_data_nearest(&mut self, source: &SurfaceMesh) {
        let nearest: Vec<usize> = self
            .positions
            .iter()
            .map(|p| source.closest_vertex(p).unwrap_or(0))
            .collect();
        for a in &source.point_data {
            if self.point_data(&a.name).is_some() {
                continue;
            }
            let mut values = Vec::with_capacity(self.num_vertices() * a.components);
            for &src in &nearest {
                values.extend_from_slice(&a.values[src * a.components..(src + 1) * a.components]);
            }
            self.point_data.push(ScalarArray {
                name: a.name.clone(),
                components: a.components,
                values,
            });
        }
    }

    /// Copy every point-data array from `source` by direct index
    /// correspondence. Both meshes must have the same vertex count.
    pub fn transfer_point_data_by_index(&mut self, source: &SurfaceMesh) -> Result<()> {
        for a in &source.point_data {
            if self.point_data(&a.name).is_some() {
                continue;
            }
            self.set_point_data(&a.name, a.components, a.values.clone())?;
        }
        Ok(())
    }
}
