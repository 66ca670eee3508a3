//! Error types for raflat.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`FlatError`].
pub type Result<T> = std::result::Result<T, FlatError>;

/// Errors that can occur during the flattening pipeline.
#[derive(Error, Debug)]
pub enum FlatError {
    /// The input mesh file does not exist.
    #[error("input file not found: {0:?}")]
    InputNotFound(PathBuf),

    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// The mesh has no boundary edges, so there are no contours to pin.
    #[error("mesh is closed (no boundary edges)")]
    NoBoundary,

    /// A point-data array has the wrong length for the mesh.
    #[error("point-data array '{name}' has {len} values, expected {expected}")]
    ArrayLengthMismatch {
        /// The array name.
        name: String,
        /// The supplied length.
        len: usize,
        /// Expected length (vertex count times component count).
        expected: usize,
    },

    /// A seed file did not contain the three expected points.
    #[error("seed file must contain exactly 3 points (apex, superior, inferior), found {0}")]
    BadSeedCount(usize),

    /// Two constraints target the same vertex.
    #[error("vertex {0} is constrained more than once")]
    DuplicateConstraint(usize),

    /// The interior anchor vertex coincides with a boundary-constrained vertex.
    #[error("apex anchor vertex {0} lies on a constrained contour")]
    AnchorOnBoundary(usize),

    /// The constrained linear system is singular or disconnected.
    ///
    /// Raised when an unconstrained region of the mesh has no path to any
    /// constrained vertex. The hole-filled boundary structure of the input
    /// is invalid and must be rejected, not silently patched.
    #[error("singular system: vertex {vertex} has no connection to any constrained vertex")]
    SingularSystem {
        /// A representative disconnected vertex.
        vertex: usize,
    },

    /// The iterative solver failed to converge.
    #[error("linear solver failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// A contour walk could not be completed.
    #[error("invalid contour: {0}")]
    InvalidContour(String),

    /// The host platform is not supported by the external hole filler.
    #[error("unknown host platform: holes cannot be filled automatically; fill them manually, save as {expected:?}, and rerun")]
    UnknownPlatform {
        /// Path the pre-filled mesh is expected at.
        expected: PathBuf,
    },

    /// The external hole-filling tool exited with a failure.
    #[error("external hole filler exited with status {status}")]
    HoleFillerFailed {
        /// The process exit status.
        status: i32,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path:?}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path:?}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}
