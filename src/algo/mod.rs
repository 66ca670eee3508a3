//! Flattening algorithms.
//!
//! The modules here are the pipeline's building blocks, in roughly the
//! order the pipeline uses them:
//!
//! - **Contours**: boundary-loop extraction and anatomical classification
//! - **Paths**: shortest-path dividing curves and phase anchors
//! - **Order**: canonical cyclic ordering of boundary contours
//! - **Template**: the standardized 2D disk layout and circle sampling
//! - **Flatten**: the constrained harmonic solve (two passes)
//! - **Sparse**: CSR matrices and the conjugate gradient solver

pub mod contours;
pub mod flatten;
pub mod order;
pub mod paths;
pub mod sparse;
pub mod template;

pub use contours::{classify_contours, extract_boundary_loops, ContourRole, ContourSet, SeedSet};
pub use flatten::{flatten_pass, flatten_two_pass, ConstraintSet, FlatMap, FlattenOptions};
pub use order::order_contour;
pub use paths::{
    dividing_paths, phase_anchor, shortest_path, DividingPaths, ExtremeSelector,
    SeedProximitySelector,
};
pub use template::{sample_circle, CircleSpec, DiskTemplate};
