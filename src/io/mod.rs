//! Mesh file I/O.
//!
//! The pipeline exchanges meshes with its external collaborators (the
//! hole-filling tool, the interactive seed picker) as legacy ASCII VTK
//! polydata files, so that is the one format supported here.
//!
//! ```no_run
//! use raflat::io;
//!
//! let mesh = io::load("atrium_clipped.vtk").unwrap();
//! io::save(&mesh, "atrium_flat.vtk").unwrap();
//! ```

pub mod vtk;

use std::path::Path;

use crate::error::Result;
use crate::mesh::SurfaceMesh;

/// Load a mesh from a legacy VTK polydata file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<SurfaceMesh> {
    vtk::load(path)
}

/// Save a mesh to a legacy VTK polydata file.
pub fn save<P: AsRef<Path>>(mesh: &SurfaceMesh, path: P) -> Result<()> {
    vtk::save(mesh, path)
}
