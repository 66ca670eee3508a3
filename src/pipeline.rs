//! End-to-end flattening orchestration.
//!
//! The pipeline is strictly sequential and carries no module-level state:
//! every stage is a function of the meshes, seeds and options passed to
//! it. [`run`] handles the file choreography (derived artifact names, the
//! external hole filler, intermediate outputs); [`flatten_atrium`] is the
//! in-memory core and is what the tests exercise.
//!
//! Artifact naming follows the convention of the surrounding toolchain:
//! for an input `atrium.vtk` the pipeline reads or creates `atrium_c.vtk`
//! (hole-filled), reads `atrium_seeds.vtk` (three picked points), writes
//! `atrium_to_be_flat.vtk` (the open mesh actually flattened) and writes
//! `atrium_flat.vtk` (the result).

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use crate::algo::{
    classify_contours, dividing_paths, extract_boundary_loops, flatten_two_pass, order_contour,
    phase_anchor, sample_circle, ConstraintSet, ContourRole, DiskTemplate, ExtremeSelector,
    FlattenOptions, SeedProximitySelector, SeedSet,
};
use crate::error::{FlatError, Result};
use crate::io;
use crate::mesh::{MeshTopology, SurfaceMesh};

/// Name of the point-data array marking hole-filling vertices.
pub const HOLE_ARRAY: &str = "hole";

/// Name of the 2-component point-data array carrying the flattened
/// coordinates on the output mesh.
pub const UV_ARRAY: &str = "uv";

/// Pipeline configuration.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Reverse the traversal direction of every contour walk.
    ///
    /// Mesh orientation is never detected automatically; if the flattened
    /// result comes out mirrored, rerun with the flag toggled.
    pub flip: bool,
    /// Target template geometry.
    pub template: DiskTemplate,
    /// Linear solver parameters.
    pub solver: FlattenOptions,
}

/// Sibling path `<stem><suffix>.vtk` next to `input`.
pub fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{suffix}.vtk"))
}

fn hole_filler_command(input: &Path, output: &Path) -> Result<Command> {
    let program = if cfg!(target_os = "linux") {
        "./FillSurfaceHoles"
    } else if cfg!(target_os = "windows") {
        "FillSurfaceHoles.exe"
    } else {
        return Err(FlatError::UnknownPlatform {
            expected: output.to_path_buf(),
        });
    };
    let mut command = Command::new(program);
    command.arg("-i").arg(input).arg("-o").arg(output);
    Ok(command)
}

/// Locate or create the hole-filled companion mesh `<stem>_c.vtk`.
///
/// If the file already exists it is reused as-is; otherwise the external
/// `FillSurfaceHoles` tool is invoked (file in, file out).
///
/// # Errors
///
/// [`FlatError::UnknownPlatform`] when no tool binary exists for the host
/// and no pre-filled mesh is present; [`FlatError::HoleFillerFailed`] when
/// the tool exits with a failure status.
pub fn ensure_closed_mesh(input: &Path) -> Result<PathBuf> {
    let closed = derived_path(input, "_c");
    if closed.exists() {
        info!("reusing hole-filled mesh {:?}", closed);
        return Ok(closed);
    }

    let mut command = hole_filler_command(input, &closed)?;
    info!("filling holes: {:?}", command);
    let status = command.status()?;
    if !status.success() {
        return Err(FlatError::HoleFillerFailed {
            status: status.code().unwrap_or(-1),
        });
    }
    if !closed.exists() {
        return Err(FlatError::InputNotFound(closed));
    }
    Ok(closed)
}

/// Tag every vertex of the hole-filled mesh that was added by the filler.
///
/// A vertex counts as added when its nearest neighbor on the original open
/// mesh is farther than 1e-6 of the closed mesh's bounding-box diagonal.
/// The result is stored as the 1-component [`HOLE_ARRAY`] (1 = filled).
pub fn mark_filled_holes(closed: &mut SurfaceMesh, open: &SurfaceMesh) -> Result<()> {
    let tolerance = 1e-6 * closed.bbox_diagonal();
    let values: Vec<f64> = closed
        .positions()
        .iter()
        .map(|p| {
            let filled = match open.closest_vertex(p) {
                Some(v) => (open.position(v) - p).norm() > tolerance,
                None => true,
            };
            if filled {
                1.0
            } else {
                0.0
            }
        })
        .collect();
    closed.set_point_data(HOLE_ARRAY, 1, values)
}

/// Map a path of `from`-mesh vertices to the nearest `to`-mesh vertices.
fn project_path(path: &[usize], from: &SurfaceMesh, to: &SurfaceMesh) -> Vec<usize> {
    path.iter()
        .filter_map(|&v| to.closest_vertex(from.position(v)))
        .collect()
}

/// Flatten an open atrium mesh onto the disk template.
///
/// `open` is the mesh to flatten (three boundary loops); `closed` is its
/// hole-filled companion, used only to trace the dividing paths across the
/// vessel orifices. The result is a copy of `open` carrying the solved
/// coordinates as the 2-component [`UV_ARRAY`], with [`HOLE_ARRAY`]
/// removed.
pub fn flatten_atrium(
    open: &SurfaceMesh,
    closed: &SurfaceMesh,
    seeds: &SeedSet,
    options: &PipelineOptions,
) -> Result<SurfaceMesh> {
    let topology = MeshTopology::build(open);
    if !topology.has_boundary() {
        return Err(FlatError::NoBoundary);
    }

    let loops = extract_boundary_loops(&topology);
    info!("found {} boundary contours", loops.len());
    let contours = classify_contours(loops, open, seeds);
    if contours.valve.is_empty() {
        return Err(FlatError::InvalidContour(
            "no valve contour identified".to_string(),
        ));
    }

    // Valve extremes anchor the dividing paths; the inferior extreme also
    // anchors the valve contour itself (it maps to angle 3pi/2).
    let (tv_superior, tv_inferior) =
        SeedProximitySelector.select(&contours.valve, open, seeds);

    // The open mesh is disconnected across the vessel orifices, so the
    // dividing paths are traced on the closed mesh and projected back.
    let closed_topology = MeshTopology::build(closed);
    let on_closed = |v: usize| closed.closest_vertex(open.position(v));
    let (tv_superior_c, tv_inferior_c) = match (on_closed(tv_superior), on_closed(tv_inferior)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(FlatError::EmptyMesh),
    };
    let (svc_c, ivc_c) = match (
        closed.closest_vertex(&seeds.superior),
        closed.closest_vertex(&seeds.inferior),
    ) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(FlatError::EmptyMesh),
    };
    let paths = dividing_paths(
        closed,
        &closed_topology,
        tv_superior_c,
        tv_inferior_c,
        svc_c,
        ivc_c,
    );

    let mut constraints = ConstraintSet::new();

    let ordered_valve = order_contour(&contours.valve, &topology, tv_inferior, options.flip)?;
    let valve_samples = sample_circle(ordered_valve.len(), &options.template.valve);
    constraints.pin_contour(&ordered_valve, &valve_samples)?;

    let vessel_jobs = [
        (ContourRole::SuperiorVessel, &paths.to_superior),
        (ContourRole::InferiorVessel, &paths.to_inferior),
    ];
    for (role, closed_path) in vessel_jobs {
        let contour = contours.get(role);
        if contour.is_empty() {
            warn!("{:?} contour missing, leaving its hole unconstrained", role);
            continue;
        }
        let path = project_path(closed_path, closed, open);
        let anchor = match phase_anchor(&path, contour) {
            Some(v) => v,
            None => {
                warn!(
                    "dividing path never reaches the {:?} contour, anchoring at its lowest vertex",
                    role
                );
                contour[0]
            }
        };
        let ordered = order_contour(contour, &topology, anchor, options.flip)?;
        let samples = sample_circle(ordered.len(), options.template.circle(role));
        constraints.pin_contour(&ordered, &samples)?;
    }

    let apex = open
        .closest_vertex(&seeds.apex)
        .ok_or(FlatError::EmptyMesh)?;
    constraints.pin_anchor(apex, options.template.apex)?;
    info!("pinned {} vertices", constraints.len());

    let map = flatten_two_pass(open, &topology, &constraints, &options.solver)?;

    let mut flat = open.clone();
    let mut uv = Vec::with_capacity(2 * map.len());
    for p in map.as_slice() {
        uv.push(p.x);
        uv.push(p.y);
    }
    flat.set_point_data(UV_ARRAY, 2, uv)?;
    flat.remove_point_data(HOLE_ARRAY);
    Ok(flat)
}

/// Run the full file-to-file pipeline.
///
/// Reads `input`, obtains its hole-filled companion, marks and removes the
/// filled regions, loads the seed file (`seeds` or the `<stem>_seeds.vtk`
/// sibling), flattens, and writes the result to `output` (default
/// `<stem>_flat.vtk`). Returns the output path. The open mesh actually
/// flattened is also written as `<stem>_to_be_flat.vtk` for inspection.
pub fn run(
    input: &Path,
    seeds: Option<&Path>,
    output: Option<&Path>,
    options: &PipelineOptions,
) -> Result<PathBuf> {
    if !input.exists() {
        return Err(FlatError::InputNotFound(input.to_path_buf()));
    }

    let original = io::load(input)?;
    info!(
        "loaded {:?}: {} vertices, {} faces",
        input,
        original.num_vertices(),
        original.num_faces()
    );

    let closed_path = ensure_closed_mesh(input)?;
    let mut closed = io::load(&closed_path)?;
    closed.transfer_point_data_nearest(&original);
    mark_filled_holes(&mut closed, &original)?;

    let seeds_path = seeds
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derived_path(input, "_seeds"));
    if !seeds_path.exists() {
        return Err(FlatError::InputNotFound(seeds_path));
    }
    let seed_set = SeedSet::from_mesh(&io::load(&seeds_path)?)?;

    let (open, _kept_ids) = closed.threshold_points(HOLE_ARRAY, 0.0, 0.0);
    io::save(&open, derived_path(input, "_to_be_flat"))?;

    let flat = flatten_atrium(&open, &closed, &seed_set, options)?;

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derived_path(input, "_flat"));
    io::save(&flat, &output_path)?;
    info!("wrote {:?}", output_path);
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Point3};

    fn grid(n: usize) -> SurfaceMesh {
        let mut vertices = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + n + 1;
                let v11 = v01 + 1;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
        SurfaceMesh::from_parts(vertices, faces).unwrap()
    }

    #[test]
    fn test_derived_path_naming() {
        let input = Path::new("/data/atrium.vtk");
        assert_eq!(derived_path(input, "_c"), Path::new("/data/atrium_c.vtk"));
        assert_eq!(
            derived_path(input, "_to_be_flat"),
            Path::new("/data/atrium_to_be_flat.vtk")
        );
        assert_eq!(
            derived_path(Path::new("atrium.vtk"), "_seeds"),
            Path::new("atrium_seeds.vtk")
        );
    }

    #[test]
    fn test_mark_filled_holes_tags_added_patch() {
        let open = grid(2);
        // Closed companion: same vertices plus a patch far off the surface.
        let mut positions = open.positions().to_vec();
        let base = positions.len();
        positions.push(Point3::new(10.0, 10.0, 10.0));
        positions.push(Point3::new(11.0, 10.0, 10.0));
        positions.push(Point3::new(10.5, 11.0, 10.0));
        let mut faces = open.faces().to_vec();
        faces.push([base, base + 1, base + 2]);
        let mut closed = SurfaceMesh::from_parts(positions, faces).unwrap();

        mark_filled_holes(&mut closed, &open).unwrap();
        let hole = closed.point_data(HOLE_ARRAY).unwrap();
        assert_eq!(hole.components, 1);
        for v in 0..base {
            assert_eq!(hole.values[v], 0.0, "original vertex {v} marked as filled");
        }
        for v in base..base + 3 {
            assert_eq!(hole.values[v], 1.0, "patch vertex {v} not marked");
        }
    }

    /// Closed mesh: a full grid. Open mesh: the same grid with two interior
    /// vertices punched out, leaving two hexagonal holes plus the outer
    /// boundary. This is the smallest honest stand-in for an atrium.
    fn synthetic_atrium(n: usize, hole_a: (usize, usize), hole_b: (usize, usize)) -> (SurfaceMesh, SurfaceMesh, SeedSet) {
        let closed = grid(n);
        let idx = |(i, j): (usize, usize)| j * (n + 1) + i;
        let mut cut = vec![0.0; closed.num_vertices()];
        cut[idx(hole_a)] = 1.0;
        cut[idx(hole_b)] = 1.0;
        let mut tagged = closed.clone();
        tagged.set_point_data("cut", 1, cut).unwrap();
        let (open, _) = tagged.threshold_points("cut", 0.0, 0.0);

        let seeds = SeedSet {
            apex: Point3::new(n as f64 * 0.5, n as f64 * 0.7, 0.0),
            superior: Point3::new(hole_a.0 as f64, hole_a.1 as f64, 0.0),
            inferior: Point3::new(hole_b.0 as f64, hole_b.1 as f64, 0.0),
        };
        (open, closed, seeds)
    }

    #[test]
    fn test_flatten_atrium_end_to_end() {
        let (open, closed, seeds) = synthetic_atrium(10, (3, 3), (7, 3));
        let options = PipelineOptions::default();
        let flat = flatten_atrium(&open, &closed, &seeds, &options).unwrap();

        assert_eq!(flat.num_vertices(), open.num_vertices());
        let uv = flat.point_data(UV_ARRAY).unwrap();
        assert_eq!(uv.components, 2);
        assert!(uv.values.iter().all(|v| v.is_finite()));

        // Flattened vertices stay in the neighborhood of the template disk
        // (negative cotangent weights allow a small overshoot of the hull).
        let radius_of = |v: usize| {
            Point2::new(uv.values[2 * v], uv.values[2 * v + 1])
                .coords
                .norm()
        };
        for v in 0..flat.num_vertices() {
            assert!(radius_of(v) <= 0.55, "vertex {v} escaped the disk");
        }

        // The outer boundary is pinned exactly to the valve circle.
        let topo = MeshTopology::build(&open);
        let loops = extract_boundary_loops(&topo);
        let valve = loops.iter().max_by_key(|l| l.len()).unwrap();
        for &v in valve {
            assert!((radius_of(v) - 0.5).abs() < 1e-12);
        }

        // The apex vertex sits exactly at the template pin.
        let apex = open.closest_vertex(&seeds.apex).unwrap();
        assert!((uv.values[2 * apex] - 0.10).abs() < 1e-12);
        assert!((uv.values[2 * apex + 1] - 0.10).abs() < 1e-12);

        // The hole marker never leaks into the output.
        assert!(flat.point_data(HOLE_ARRAY).is_none());
    }

    #[test]
    fn test_flatten_atrium_vessel_circles() {
        let (open, closed, seeds) = synthetic_atrium(10, (3, 3), (7, 3));
        let options = PipelineOptions::default();
        let flat = flatten_atrium(&open, &closed, &seeds, &options).unwrap();
        let uv = flat.point_data(UV_ARRAY).unwrap();

        let topo = MeshTopology::build(&open);
        let mut loops = extract_boundary_loops(&topo);
        loops.sort_by_key(|l| l.len());
        // Two 6-vertex hexagonal hole rings, then the outer boundary.
        assert_eq!(loops.len(), 3);
        assert_eq!(loops[0].len(), 6);
        assert_eq!(loops[1].len(), 6);

        let contours = classify_contours(loops, &open, &seeds);
        let template = DiskTemplate::default();
        for (contour, circle) in [
            (&contours.superior, &template.superior),
            (&contours.inferior, &template.inferior),
        ] {
            assert_eq!(contour.len(), 6);
            for &v in contour {
                let p = Point2::new(uv.values[2 * v], uv.values[2 * v + 1]);
                let r = (p - circle.center).norm();
                assert!((r - circle.radius).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_flip_mirrors_the_result() {
        let (open, closed, seeds) = synthetic_atrium(10, (3, 3), (7, 3));
        let forward = flatten_atrium(&open, &closed, &seeds, &PipelineOptions::default()).unwrap();
        let flipped = flatten_atrium(
            &open,
            &closed,
            &seeds,
            &PipelineOptions {
                flip: true,
                ..Default::default()
            },
        )
        .unwrap();

        // The valve anchor maps to 3pi/2 either way; some other boundary
        // vertex must land elsewhere under the reversed walk.
        let a = forward.point_data(UV_ARRAY).unwrap();
        let b = flipped.point_data(UV_ARRAY).unwrap();
        assert!(a.values.iter().zip(&b.values).any(|(x, y)| (x - y).abs() > 1e-6));
    }

    #[test]
    fn test_closed_mesh_is_rejected() {
        // A mesh with no boundary cannot be flattened.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let mesh = SurfaceMesh::from_parts(vertices, faces).unwrap();
        let seeds = SeedSet {
            apex: Point3::new(0.5, 0.5, 1.0),
            superior: Point3::new(0.0, 0.0, 0.0),
            inferior: Point3::new(1.0, 0.0, 0.0),
        };
        let result = flatten_atrium(&mesh, &mesh, &seeds, &PipelineOptions::default());
        assert!(matches!(result, Err(FlatError::NoBoundary)));
    }

    #[test]
    fn test_run_rejects_missing_input() {
        let result = run(
            Path::new("/nonexistent/atrium.vtk"),
            None,
            None,
            &PipelineOptions::default(),
        );
        assert!(matches!(result, Err(FlatError::InputNotFound(_))));
    }
}
