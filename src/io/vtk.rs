//! Legacy ASCII VTK polydata support.
//!
//! Reads and writes the subset of the legacy VTK file format the pipeline
//! needs: `POINTS`, `POLYGONS` (polygon fans are triangulated on read) and
//! any number of `SCALARS` point-data arrays with 1 to 4 components.
//! Seed files, which carry points but no polygons, load as meshes with
//! zero faces.
//!
//! The reader and writer are stream based so tests can run against
//! in-memory buffers.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{FlatError, Result};
use crate::mesh::SurfaceMesh;

/// Load a mesh from a legacy VTK polydata file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<SurfaceMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| FlatError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    read(BufReader::new(file)).map_err(|e| match e {
        FlatError::LoadError { message, .. } => FlatError::LoadError {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })
}

/// Save a mesh to a legacy VTK polydata file.
pub fn save<P: AsRef<Path>>(mesh: &SurfaceMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| FlatError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write(mesh, BufWriter::new(file))
}

fn load_err(message: impl Into<String>) -> FlatError {
    FlatError::LoadError {
        path: Default::default(),
        message: message.into(),
    }
}

fn tok<'a>(tokens: &'a [String], cursor: &mut usize) -> Result<&'a str> {
    let t = tokens
        .get(*cursor)
        .ok_or_else(|| load_err("unexpected end of file"))?;
    *cursor += 1;
    Ok(t)
}

fn tok_usize(tokens: &[String], cursor: &mut usize) -> Result<usize> {
    let t = tok(tokens, cursor)?;
    t.parse()
        .map_err(|_| load_err(format!("expected integer, found '{t}'")))
}

fn tok_f64(tokens: &[String], cursor: &mut usize) -> Result<f64> {
    let t = tok(tokens, cursor)?;
    t.parse()
        .map_err(|_| load_err(format!("expected number, found '{t}'")))
}

/// Read a mesh from any buffered reader carrying legacy VTK polydata.
pub fn read<R: BufRead>(reader: R) -> Result<SurfaceMesh> {
    // Legacy VTK is whitespace separated apart from the two header lines,
    // so tokenize everything after line 2 and walk a cursor through it.
    let mut lines = reader.lines();
    let header = lines
        .next()
        .transpose()?
        .ok_or_else(|| load_err("empty file"))?;
    if !header.starts_with("# vtk DataFile") {
        return Err(load_err("missing '# vtk DataFile' header"));
    }
    lines.next().transpose()?; // title line, ignored

    let mut tokens: Vec<String> = Vec::new();
    for line in lines {
        let line = line?;
        tokens.extend(line.split_whitespace().map(str::to_string));
    }
    let mut cursor = 0usize;

    if !tok(&tokens, &mut cursor)?.eq_ignore_ascii_case("ASCII") {
        return Err(load_err("only ASCII VTK files are supported"));
    }
    if !tok(&tokens, &mut cursor)?.eq_ignore_ascii_case("DATASET")
        || !tok(&tokens, &mut cursor)?.eq_ignore_ascii_case("POLYDATA")
    {
        return Err(load_err("only DATASET POLYDATA is supported"));
    }

    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();
    let mut arrays: Vec<(String, usize, Vec<f64>)> = Vec::new();

    while cursor < tokens.len() {
        let keyword = tok(&tokens, &mut cursor)?.to_ascii_uppercase();
        match keyword.as_str() {
            "POINTS" => {
                let n = tok_usize(&tokens, &mut cursor)?;
                tok(&tokens, &mut cursor)?; // data type, irrelevant for ASCII
                positions.reserve(n);
                for _ in 0..n {
                    let x = tok_f64(&tokens, &mut cursor)?;
                    let y = tok_f64(&tokens, &mut cursor)?;
                    let z = tok_f64(&tokens, &mut cursor)?;
                    positions.push(Point3::new(x, y, z));
                }
            }
            "POLYGONS" => {
                let n_cells = tok_usize(&tokens, &mut cursor)?;
                tok_usize(&tokens, &mut cursor)?; // total list size
                for _ in 0..n_cells {
                    let count = tok_usize(&tokens, &mut cursor)?;
                    let mut cell = Vec::with_capacity(count);
                    for _ in 0..count {
                        cell.push(tok_usize(&tokens, &mut cursor)?);
                    }
                    if count == 3 {
                        faces.push([cell[0], cell[1], cell[2]]);
                    } else {
                        // Fan triangulation for larger polygons.
                        for i in 1..count.saturating_sub(1) {
                            faces.push([cell[0], cell[i], cell[i + 1]]);
                        }
                    }
                }
            }
            // Seed files store their points as VERTICES cells; the cell
            // list carries no geometry we need, so consume and drop it.
            "VERTICES" | "LINES" => {
                let _n_cells = tok_usize(&tokens, &mut cursor)?;
                let total = tok_usize(&tokens, &mut cursor)?;
                for _ in 0..total {
                    tok(&tokens, &mut cursor)?;
                }
            }
            "POINT_DATA" => {
                let n = tok_usize(&tokens, &mut cursor)?;
                if n != positions.len() {
                    return Err(load_err(format!(
                        "POINT_DATA count {n} does not match {} points",
                        positions.len()
                    )));
                }
            }
            "SCALARS" => {
                let name = tok(&tokens, &mut cursor)?.to_string();
                tok(&tokens, &mut cursor)?; // data type
                // Component count is optional and defaults to 1.
                let components = match tokens.get(cursor).and_then(|t| t.parse::<usize>().ok()) {
                    Some(c) if (1..=4).contains(&c) => {
                        cursor += 1;
                        c
                    }
                    _ => 1,
                };
                if tok(&tokens, &mut cursor)?.eq_ignore_ascii_case("LOOKUP_TABLE") {
                    tok(&tokens, &mut cursor)?; // table name
                } else {
                    cursor -= 1;
                }
                let mut values = Vec::with_capacity(positions.len() * components);
                for _ in 0..positions.len() * components {
                    values.push(tok_f64(&tokens, &mut cursor)?);
                }
                arrays.push((name, components, values));
            }
            other => {
                return Err(load_err(format!("unsupported VTK section '{other}'")));
            }
        }
    }

    if positions.is_empty() {
        return Err(load_err("file contains no POINTS section"));
    }

    let mut mesh = SurfaceMesh::from_parts(positions, faces)?;
    for (name, components, values) in arrays {
        mesh.set_point_data(&name, components, values)?;
    }
    Ok(mesh)
}

/// Write a mesh as legacy VTK polydata to any writer.
pub fn write<W: Write>(mesh: &SurfaceMesh, mut writer: W) -> Result<()> {
    writeln!(writer, "# vtk DataFile Version 3.0")?;
    writeln!(writer, "raflat output")?;
    writeln!(writer, "ASCII")?;
    writeln!(writer, "DATASET POLYDATA")?;

    writeln!(writer, "POINTS {} double", mesh.num_vertices())?;
    for p in mesh.positions() {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }

    if mesh.num_faces() > 0 {
        writeln!(writer, "POLYGONS {} {}", mesh.num_faces(), mesh.num_faces() * 4)?;
        for f in mesh.faces() {
            writeln!(writer, "3 {} {} {}", f[0], f[1], f[2])?;
        }
    }

    if !mesh.point_data_arrays().is_empty() {
        writeln!(writer, "POINT_DATA {}", mesh.num_vertices())?;
        for array in mesh.point_data_arrays() {
            writeln!(writer, "SCALARS {} double {}", array.name, array.components)?;
            writeln!(writer, "LOOKUP_TABLE default")?;
            for chunk in array.values.chunks(array.components) {
                let line: Vec<String> = chunk.iter().map(|v| v.to_string()).collect();
                writeln!(writer, "{}", line.join(" "))?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_mesh() -> SurfaceMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.25),
            Point3::new(1.5, 1.0, 0.0),
        ];
        let mut mesh = SurfaceMesh::from_parts(vertices, vec![[0, 1, 2], [1, 3, 2]]).unwrap();
        mesh.set_point_data("hole", 1, vec![0.0, 0.0, 1.0, 0.0]).unwrap();
        mesh.set_point_data("uv", 2, vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7])
            .unwrap();
        mesh
    }

    #[test]
    fn test_round_trip() {
        let mesh = sample_mesh();
        let mut buf = Vec::new();
        write(&mesh, &mut buf).unwrap();
        let loaded = read(Cursor::new(buf)).unwrap();

        assert_eq!(loaded.num_vertices(), 4);
        assert_eq!(loaded.num_faces(), 2);
        for (a, b) in mesh.positions().iter().zip(loaded.positions()) {
            assert!((a - b).norm() < 1e-12);
        }
        assert_eq!(loaded.faces(), mesh.faces());
        assert_eq!(loaded.point_data("hole").unwrap().values, vec![0.0, 0.0, 1.0, 0.0]);
        let uv = loaded.point_data("uv").unwrap();
        assert_eq!(uv.components, 2);
        assert_eq!(uv.values.len(), 8);
    }

    #[test]
    fn test_read_polygon_fan() {
        let text = "\
# vtk DataFile Version 3.0
quad
ASCII
DATASET POLYDATA
POINTS 4 float
0 0 0
1 0 0
1 1 0
0 1 0
POLYGONS 1 5
4 0 1 2 3
";
        let mesh = read(Cursor::new(text)).unwrap();
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.faces(), &[[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_read_seed_file_without_polygons() {
        let text = "\
# vtk DataFile Version 3.0
seeds
ASCII
DATASET POLYDATA
POINTS 3 float
1 2 3
4 5 6
7 8 9
VERTICES 3 6
1 0
1 1
1 2
";
        let mesh = read(Cursor::new(text)).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 0);
        assert_eq!(*mesh.position(2), Point3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn test_read_scalars_default_components() {
        let text = "\
# vtk DataFile Version 3.0
t
ASCII
DATASET POLYDATA
POINTS 2 float
0 0 0
1 0 0
POINT_DATA 2
SCALARS tag float
LOOKUP_TABLE default
5 7
";
        let mesh = read(Cursor::new(text)).unwrap();
        let tag = mesh.point_data("tag").unwrap();
        assert_eq!(tag.components, 1);
        assert_eq!(tag.values, vec![5.0, 7.0]);
    }

    #[test]
    fn test_reject_non_vtk() {
        let err = read(Cursor::new("hello\n")).unwrap_err();
        assert!(matches!(err, FlatError::LoadError { .. }));
    }
}
