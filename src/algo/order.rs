//! Canonical ordering of boundary contours.
//!
//! Loop extraction yields unordered vertex sets; template sampling needs a
//! cyclic sequence with a fixed start and direction. The walk starts at the
//! phase-anchor vertex and steps along boundary edges; the caller-supplied
//! flip flag decides which of the anchor's two boundary neighbors is
//! visited first, and thereby the traversal direction. No orientation is
//! ever inferred automatically: flipping is a manual calibration step per
//! dataset.

use crate::error::{FlatError, Result};
use crate::mesh::MeshTopology;

/// Order a boundary loop into a cyclic walk starting at `anchor`.
///
/// Every vertex of a manifold boundary loop has exactly two boundary-edge
/// neighbors inside the loop, so once `flip` picks the anchor's first
/// neighbor the rest of the walk is forced. With `flip = false` the walk
/// starts toward the anchor's lower-indexed neighbor; with `flip = true`,
/// the higher-indexed one. Reversing the flag reverses the traversal.
///
/// # Errors
///
/// [`FlatError::InvalidContour`] if `anchor` is not part of the loop, a
/// loop vertex does not have two boundary neighbors in the loop, or the
/// walk fails to close after visiting every vertex.
pub fn order_contour(
    loop_vertices: &[usize],
    topology: &MeshTopology,
    anchor: usize,
    flip: bool,
) -> Result<Vec<usize>> {
    if !loop_vertices.contains(&anchor) {
        return Err(FlatError::InvalidContour(format!(
            "anchor vertex {anchor} is not on the contour"
        )));
    }
    if loop_vertices.len() == 1 {
        return Ok(vec![anchor]);
    }

    let in_loop = |v: usize| loop_vertices.binary_search(&v).is_ok();
    debug_assert!(loop_vertices.windows(2).all(|w| w[0] < w[1]), "loops are sorted");

    let loop_neighbors = |v: usize| -> Vec<usize> {
        topology
            .boundary_neighbors(v)
            .iter()
            .copied()
            .filter(|&n| in_loop(n))
            .collect()
    };

    let anchor_neighbors = loop_neighbors(anchor);
    if anchor_neighbors.len() != 2 {
        return Err(FlatError::InvalidContour(format!(
            "contour vertex {anchor} has {} boundary neighbors, expected 2",
            anchor_neighbors.len()
        )));
    }

    // boundary_neighbors is sorted, so [0] is the lower-indexed neighbor.
    let first = if flip {
        anchor_neighbors[1]
    } else {
        anchor_neighbors[0]
    };

    let mut ordered = Vec::with_capacity(loop_vertices.len());
    ordered.push(anchor);
    let mut prev = anchor;
    let mut current = first;

    while current != anchor {
        ordered.push(current);
        if ordered.len() > loop_vertices.len() {
            return Err(FlatError::InvalidContour(
                "contour walk did not close".to_string(),
            ));
        }
        let neighbors = loop_neighbors(current);
        if neighbors.len() != 2 {
            return Err(FlatError::InvalidContour(format!(
                "contour vertex {current} has {} boundary neighbors, expected 2",
                neighbors.len()
            )));
        }
        let next = if neighbors[0] == prev {
            neighbors[1]
        } else {
            neighbors[0]
        };
        prev = current;
        current = next;
    }

    if ordered.len() != loop_vertices.len() {
        return Err(FlatError::InvalidContour(format!(
            "contour walk visited {} of {} vertices",
            ordered.len(),
            loop_vertices.len()
        )));
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::contours::extract_boundary_loops;
    use crate::mesh::{MeshTopology, SurfaceMesh};
    use nalgebra::Point3;
    use std::f64::consts::TAU;

    /// Fan disk: center vertex 0 surrounded by a ring 1..=n.
    fn disk(n: usize) -> SurfaceMesh {
        let mut vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        for i in 0..n {
            let t = TAU * i as f64 / n as f64;
            vertices.push(Point3::new(t.cos(), t.sin(), 0.0));
        }
        let faces: Vec<[usize; 3]> = (0..n)
            .map(|i| [0, 1 + i, 1 + (i + 1) % n])
            .collect();
        SurfaceMesh::from_parts(vertices, faces).unwrap()
    }

    fn boundary_loop(mesh: &SurfaceMesh) -> (MeshTopology, Vec<usize>) {
        let topo = MeshTopology::build(mesh);
        let mut loops = extract_boundary_loops(&topo);
        assert_eq!(loops.len(), 1);
        (topo, loops.pop().unwrap())
    }

    #[test]
    fn test_walk_is_cyclic_and_complete() {
        let mesh = disk(8);
        let (topo, ring) = boundary_loop(&mesh);

        let ordered = order_contour(&ring, &topo, 3, false).unwrap();
        assert_eq!(ordered.len(), 8);
        assert_eq!(ordered[0], 3);
        // Every step must follow a boundary edge, and the walk must close.
        for pair in ordered.windows(2) {
            assert!(topo.is_boundary_edge(pair[0], pair[1]));
        }
        assert!(topo.is_boundary_edge(*ordered.last().unwrap(), ordered[0]));
    }

    #[test]
    fn test_flip_reverses_direction() {
        let mesh = disk(10);
        let (topo, ring) = boundary_loop(&mesh);

        let forward = order_contour(&ring, &topo, 5, false).unwrap();
        let flipped = order_contour(&ring, &topo, 5, true).unwrap();

        assert_eq!(forward[0], 5);
        assert_eq!(flipped[0], 5);
        // Same anchor-first element; the remainder runs in exact reverse.
        let mut reversed_tail: Vec<usize> = forward[1..].to_vec();
        reversed_tail.reverse();
        assert_eq!(flipped[1..], reversed_tail[..]);
    }

    #[test]
    fn test_anchor_not_on_contour() {
        let mesh = disk(6);
        let (topo, ring) = boundary_loop(&mesh);
        assert!(order_contour(&ring, &topo, 0, false).is_err()); // center vertex
    }

    #[test]
    fn test_interior_vertex_breaks_walk() {
        let mesh = disk(6);
        let topo = MeshTopology::build(&mesh);
        // Sneak the interior center vertex into the "loop".
        let bogus = vec![0, 1, 2, 3, 4, 5, 6];
        assert!(order_contour(&bogus, &topo, 1, false).is_err());
    }
}
