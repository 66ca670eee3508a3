//! Boundary-loop extraction and anatomical role classification.
//!
//! An open right-atrium mesh has three boundary holes: the tricuspid valve
//! (the large outer opening), the superior vena cava and the inferior vena
//! cava. This module partitions the boundary edges into connected loops and
//! decides which loop plays which role.
//!
//! Classification mixes two criteria, in this order:
//!
//! 1. the largest loop is always the valve, regardless of seed placement
//!    (the valve opening dwarfs the vessel orifices on every dataset);
//! 2. the remaining loops go to whichever vessel seed they sit closest to.
//!
//! Any loop count other than three is an advisory condition: a warning is
//! logged and classification proceeds best effort, possibly leaving a role
//! with an empty contour.

use std::collections::HashSet;

use log::warn;
use nalgebra::Point3;

use crate::mesh::{MeshTopology, SurfaceMesh};

/// The anatomical role of a boundary contour on the 2D template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContourRole {
    /// Tricuspid valve: the outer disk boundary.
    Valve,
    /// Superior vena cava: the central hole.
    SuperiorVessel,
    /// Inferior vena cava: the lower hole.
    InferiorVessel,
}

/// The three reference points picked by the external interactive step,
/// in the order they appear in the seed file.
#[derive(Debug, Clone)]
pub struct SeedSet {
    /// Appendage apex (interior anchor).
    pub apex: Point3<f64>,
    /// Superior vena cava center.
    pub superior: Point3<f64>,
    /// Inferior vena cava center.
    pub inferior: Point3<f64>,
}

impl SeedSet {
    /// Read the seed set from a 3-point mesh (a loaded seeds file).
    ///
    /// # Errors
    ///
    /// [`crate::error::FlatError::BadSeedCount`] unless exactly 3 points
    /// are present.
    pub fn from_mesh(mesh: &SurfaceMesh) -> crate::error::Result<Self> {
        if mesh.num_vertices() != 3 {
            return Err(crate::error::FlatError::BadSeedCount(mesh.num_vertices()));
        }
        Ok(Self {
            apex: *mesh.position(0),
            superior: *mesh.position(1),
            inferior: *mesh.position(2),
        })
    }
}

/// The three classified boundary loops (vertex sets, unordered).
///
/// A role whose loop could not be identified holds an empty vector.
#[derive(Debug, Clone, Default)]
pub struct ContourSet {
    /// Tricuspid valve loop.
    pub valve: Vec<usize>,
    /// Superior vena cava loop.
    pub superior: Vec<usize>,
    /// Inferior vena cava loop.
    pub inferior: Vec<usize>,
}

impl ContourSet {
    /// The loop for a given role.
    pub fn get(&self, role: ContourRole) -> &[usize] {
        match role {
            ContourRole::Valve => &self.valve,
            ContourRole::SuperiorVessel => &self.superior,
            ContourRole::InferiorVessel => &self.inferior,
        }
    }
}

/// Partition the mesh boundary edges into connected loops.
///
/// Each loop is returned as an unordered list of vertex indices. Loops are
/// discovered by traversal over the boundary-edge adjacency, so two holes
/// that merely share no edge but touch at a vertex still merge into one
/// component (consistent with edge-connectivity extraction).
pub fn extract_boundary_loops(topology: &MeshTopology) -> Vec<Vec<usize>> {
    let mut visited: HashSet<usize> = HashSet::new();
    let mut loops = Vec::new();

    let mut boundary_vertices: Vec<usize> = topology
        .boundary_edges()
        .flat_map(|(a, b)| [a, b])
        .collect();
    boundary_vertices.sort_unstable();
    boundary_vertices.dedup();

    for &start in &boundary_vertices {
        if visited.contains(&start) {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![start];
        visited.insert(start);
        while let Some(v) = stack.pop() {
            component.push(v);
            for &next in topology.boundary_neighbors(v) {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }
        component.sort_unstable();
        loops.push(component);
    }

    loops
}

/// Minimum distance from any loop vertex to a reference point.
fn loop_distance(loop_vertices: &[usize], mesh: &SurfaceMesh, seed: &Point3<f64>) -> f64 {
    loop_vertices
        .iter()
        .map(|&v| (mesh.position(v) - seed).norm())
        .fold(f64::INFINITY, f64::min)
}

/// Classify boundary loops into valve / superior / inferior roles.
///
/// The largest loop is the valve. Each remaining loop is assigned to the
/// vessel seed it is closest to; if both remaining loops prefer the same
/// seed, the closer one wins and the other takes the leftover role.
///
/// A loop count other than three logs a warning (classification may then
/// be wrong or incomplete) but never fails.
pub fn classify_contours(
    mut loops: Vec<Vec<usize>>,
    mesh: &SurfaceMesh,
    seeds: &SeedSet,
) -> ContourSet {
    if loops.len() != 3 {
        warn!(
            "expected 3 boundary contours, found {}: contour classification may be wrong",
            loops.len()
        );
    }

    let mut set = ContourSet::default();

    // Rule 1: the largest loop is the valve, always.
    let largest = match loops.iter().enumerate().max_by_key(|(_, l)| l.len()) {
        Some((i, _)) => i,
        None => return set,
    };
    set.valve = loops.swap_remove(largest);

    // Rule 2: remaining loops by seed proximity.
    match loops.len() {
        0 => {}
        1 => {
            if let Some(l) = loops.pop() {
                let d_sup = loop_distance(&l, mesh, &seeds.superior);
                let d_inf = loop_distance(&l, mesh, &seeds.inferior);
                if d_sup <= d_inf {
                    set.superior = l;
                } else {
                    set.inferior = l;
                }
            }
        }
        _ => {
            // Pick the loop nearest the superior seed first; everything
            // else competes for inferior. Extra loops beyond two are
            // ignored (already warned above).
            loops.sort_by(|a, b| {
                loop_distance(a, mesh, &seeds.superior)
                    .partial_cmp(&loop_distance(b, mesh, &seeds.superior))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let mut rest = loops.split_off(1);
            if let Some(l) = loops.pop() {
                set.superior = l;
            }
            rest.sort_by(|a, b| {
                loop_distance(a, mesh, &seeds.inferior)
                    .partial_cmp(&loop_distance(b, mesh, &seeds.inferior))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            if !rest.is_empty() {
                set.inferior = rest.remove(0);
            }
            if !rest.is_empty() {
                warn!("{} unclassified boundary contours ignored", rest.len());
            }
        }
    }

    set
}
