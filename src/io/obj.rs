//! Wavefront OBJ format support.
//!
//! Faces are kept as polygons; nothing is triangulated on load. All objects
//! in a file are merged into one mesh. Texture coordinates, normals and
//! materials are ignored.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{HarmonicsError, Result};
use crate::mesh::{build_from_polygons, to_polygons, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use harmonics::io::obj;
/// use harmonics::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("shell.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let options = tobj::LoadOptions {
        triangulate: false,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let (models, _) = tobj::load_obj(path, &options).map_err(|e| HarmonicsError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();

    for model in &models {
        let mesh = &model.mesh;
        let offset = vertices.len();
        vertices.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64)),
        );

        let index = |i: &u32| offset + *i as usize;
        if mesh.face_arities.is_empty() {
            faces.extend(mesh.indices.chunks_exact(3).map(|f| f.iter().map(index).collect()));
        } else {
            let mut start = 0;
            for &arity in &mesh.face_arities {
                let end = start + arity as usize;
                let face = mesh.indices.get(start..end).ok_or_else(|| HarmonicsError::LoadError {
                    path: path.to_path_buf(),
                    message: format!("face arity {} runs past the index list", arity),
                })?;
                faces.push(face.iter().map(index).collect());
                start = end;
            }
        }
    }

    if faces.is_empty() {
        return Err(HarmonicsError::LoadError {
            path: path.to_path_buf(),
            message: "OBJ file contains no faces".to_string(),
        });
    }

    log::debug!(
        "loaded {}: {} vertices, {} faces",
        path.display(),
        vertices.len(),
        faces.len()
    );
    build_from_polygons(&vertices, &faces)
}

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use harmonics::io::obj;
/// use harmonics::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// obj::save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh as OBJ text.
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> Result<()> {
    let (vertices, faces) = to_polygons(mesh);

    writeln!(writer, "# Generated by harmonics")?;
    writeln!(writer, "# {} vertices, {} faces", vertices.len(), faces.len())?;
    for v in &vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for face in &faces {
        write!(writer, "f")?;
        for &i in face {
            write!(writer, " {}", i + 1)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}
