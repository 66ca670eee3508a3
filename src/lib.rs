//! # raflat
//!
//! Quasi-conformal flattening of open right-atrium surface meshes onto a
//! standardized 2D disk template.
//!
//! The input is a triangulated atrial surface with three boundary holes
//! (tricuspid valve, superior vena cava, inferior vena cava). The output
//! maps the valve to the outer boundary of a disk of radius 0.5, the two
//! venae cavae to small fixed circular holes inside it, and the appendage
//! apex to a pinned interior point, solving a cotangent-weighted harmonic
//! system for everything in between. Identical anatomy lands at identical
//! template coordinates across patients, which is the entire point.
//!
//! ## Quick start
//!
//! ```no_run
//! use raflat::pipeline::{self, PipelineOptions};
//! use std::path::Path;
//!
//! let output = pipeline::run(
//!     Path::new("atrium_clipped.vtk"),
//!     None, // seeds default to atrium_clipped_seeds.vtk
//!     None, // output defaults to atrium_clipped_flat.vtk
//!     &PipelineOptions::default(),
//! ).unwrap();
//! println!("flattened mesh written to {:?}", output);
//! ```
//!
//! ## Pieces
//!
//! The in-memory stages are usable on their own:
//!
//! ```
//! use raflat::mesh::{MeshTopology, SurfaceMesh};
//! use raflat::algo::extract_boundary_loops;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(0.5, 1.0, 0.0),
//! # ];
//! # let faces = vec![[0, 1, 2]];
//! let mesh = SurfaceMesh::from_parts(vertices, faces).unwrap();
//! let topology = MeshTopology::build(&mesh);
//! let loops = extract_boundary_loops(&topology);
//! assert_eq!(loops.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod pipeline;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use raflat::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        ConstraintSet, ContourRole, ContourSet, DiskTemplate, FlatMap, FlattenOptions, SeedSet,
    };
    pub use crate::error::{FlatError, Result};
    pub use crate::mesh::{MeshTopology, ScalarArray, SurfaceMesh};
    pub use crate::pipeline::PipelineOptions;
}

// Re-export nalgebra types for convenience
pub use nalgebra;
