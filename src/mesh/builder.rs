//! Mesh construction utilities.
//!
//! Builds half-edge meshes from polygon soups (vertex positions plus
//! per-face index lists) and converts them back.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{HarmonicsError, Result};

/// Build a half-edge mesh from vertices and polygon faces.
///
/// Each face lists at least three distinct vertex indices in winding order.
/// Faces can mix triangles, quads and larger polygons.
///
/// # Errors
/// - [`HarmonicsError::EmptyMesh`] if there are no faces
/// - [`HarmonicsError::InvalidVertexIndex`] for an out-of-range index
/// - [`HarmonicsError::DegenerateFace`] for a face with fewer than three distinct vertices
/// - [`HarmonicsError::NonManifoldEdge`] if two faces use the same directed edge
/// - [`HarmonicsError::NonManifoldVertex`] if a vertex has two boundary gaps (a bowtie)
///
/// # Example
/// ```
/// use harmonics::mesh::{build_from_polygons, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.5, 1.5, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3], vec![3, 2, 4]];
///
/// let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_faces(), 2);
/// assert!(!mesh.is_triangle_mesh());
/// ```
pub fn build_from_polygons<I, F>(vertices: &[Point3<f64>], faces: &[F]) -> Result<HalfEdgeMesh<I>>
where
    I: MeshIndex,
    F: AsRef<[usize]>,
{
    if faces.is_empty() {
        return Err(HarmonicsError::EmptyMesh);
    }

    let mut corner_count = 0;
    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        if let Some(&vi) = face.iter().find(|&&vi| vi >= vertices.len()) {
            return Err(HarmonicsError::InvalidVertexIndex { face: fi, vertex: vi });
        }
        let mut distinct = face.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        if face.len() < 3 || distinct.len() != face.len() {
            return Err(HarmonicsError::DegenerateFace { face: fi });
        }
        corner_count += face.len();
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), corner_count * 5 / 4, faces.len());

    let vertex_ids: Vec<VertexId<I>> = vertices
        .iter()
        .map(|&pos| mesh.add_vertex(pos))
        .collect();

    // Directed edge (from, to) -> interior half-edge
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::with_capacity(corner_count);

    for face in faces {
        let face = face.as_ref();
        let n = face.len();
        let first = mesh.num_halfedges();
        let face_id = FaceId::<I>::new(mesh.num_faces());
        mesh.faces.push(Face::new(HalfEdgeId::new(first)));

        for k in 0..n {
            let he_id = HalfEdgeId::<I>::new(first + k);
            let (from, to) = (face[k], face[(k + 1) % n]);

            if edge_map.insert((from, to), he_id).is_some() {
                return Err(HarmonicsError::NonManifoldEdge { v0: from, v1: to });
            }

            mesh.halfedges.push(HalfEdge {
                origin: vertex_ids[from],
                twin: HalfEdgeId::invalid(),
                next: HalfEdgeId::new(first + (k + 1) % n),
                prev: HalfEdgeId::new(first + (k + n - 1) % n),
                face: face_id,
            });
            mesh.vertex_mut(vertex_ids[from]).halfedge = he_id;
        }
    }

    // Link twins in creation order so boundary half-edge ids are reproducible.
    let interior_count = mesh.num_halfedges();
    for idx in 0..interior_count {
        let he = HalfEdgeId::<I>::new(idx);
        let from = mesh.origin(he).index();
        let to = mesh.origin(mesh.next(he)).index();

        match edge_map.get(&(to, from)) {
            Some(&twin) => mesh.halfedge_mut(he).twin = twin,
            None => {
                let boundary_he = HalfEdgeId::<I>::new(mesh.num_halfedges());
                mesh.halfedges.push(HalfEdge {
                    origin: vertex_ids[to],
                    twin: he,
                    ..HalfEdge::new()
                });
                mesh.halfedge_mut(he).twin = boundary_he;
            }
        }
    }

    link_boundary_loops(&mut mesh, interior_count)?;
    fix_boundary_vertex_halfedges(&mut mesh);

    Ok(mesh)
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Example
/// ```
/// use harmonics::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Link boundary half-edges (all ids from `first_boundary` on) into loops.
///
/// A vertex may start at most one boundary half-edge; more means its faces
/// form separate fans.
fn link_boundary_loops<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    first_boundary: usize,
) -> Result<()> {
    let boundary_hes: Vec<HalfEdgeId<I>> = (first_boundary..mesh.num_halfedges())
        .map(HalfEdgeId::new)
        .collect();

    let mut outgoing: HashMap<usize, HalfEdgeId<I>> = HashMap::with_capacity(boundary_hes.len());
    for &he in &boundary_hes {
        let vertex = mesh.origin(he).index();
        if outgoing.insert(vertex, he).is_some() {
            return Err(HarmonicsError::NonManifoldVertex { vertex });
        }
    }

    for &he in &boundary_hes {
        let dest = mesh.dest(he).index();
        if let Some(&next_he) = outgoing.get(&dest) {
            mesh.halfedge_mut(he).next = next_he;
            mesh.halfedge_mut(next_he).prev = he;
        }
    }
    Ok(())
}

/// Point every boundary vertex at one of its boundary half-edges.
fn fix_boundary_vertex_halfedges<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    for idx in 0..mesh.num_vertices() {
        let vid = VertexId::<I>::new(idx);
        let start = mesh.vertex(vid).halfedge;
        if !start.is_valid() {
            continue;
        }

        let mut he = start;
        loop {
            if mesh.is_boundary_halfedge(he) {
                mesh.vertex_mut(vid).halfedge = he;
                break;
            }
            // Interior fan: the twin of an interior half-edge always has a valid next.
            he = mesh.next(mesh.twin(he));
            if he == start || !he.is_valid() {
                break;
            }
        }
    }
}

/// Convert a half-edge mesh back to vertex positions and polygon index lists.
pub fn to_polygons<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let vertices = mesh.positions();
    let faces = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).map(|v| v.index()).collect())
        .collect();
    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        (vertices, faces)
    }

    #[test]
    fn test_single_triangle() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        // 3 interior + 3 boundary
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());
        assert!(mesh.vertex_ids().all(|v| mesh.is_boundary_vertex(v)));
    }

    #[test]
    fn test_two_triangles_neighbors() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        // 6 interior + 4 boundary
        assert_eq!(mesh.num_halfedges(), 10);
        assert!(mesh.is_valid());

        let mut n0: Vec<usize> = mesh
            .vertex_neighbors(VertexId::new(0))
            .map(|v| v.index())
            .collect();
        n0.sort_unstable();
        assert_eq!(n0, vec![1, 2, 3]);

        let mut n2: Vec<usize> = mesh
            .vertex_neighbors(VertexId::new(2))
            .map(|v| v.index())
            .collect();
        n2.sort_unstable();
        assert_eq!(n2, vec![0, 1]);
    }

    #[test]
    fn test_mixed_polygons() {
        // Quad with a triangle on top and a pentagon below
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 1.5, 0.0),
            Point3::new(1.2, -0.8, 0.0),
            Point3::new(0.5, -1.2, 0.0),
            Point3::new(-0.2, -0.8, 0.0),
        ];
        let faces = vec![vec![0, 1, 2, 3], vec![3, 2, 4], vec![1, 0, 7, 6, 5]];
        let mesh: HalfEdgeMesh<u32> = build_from_polygons(&vertices, &faces).unwrap();

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_faces(), 3);
        let counts: Vec<usize> = mesh.face_ids().map(|f| mesh.face_vertex_count(f)).collect();
        assert_eq!(counts, vec![4, 3, 5]);
        // Euler characteristic of a disk
        let edges = mesh.edges().count();
        assert_eq!(mesh.num_vertices() as i64 - edges as i64 + mesh.num_faces() as i64, 1);
    }

    #[test]
    fn test_roundtrip() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
        ];
        let faces = vec![vec![0, 1, 2, 3], vec![1, 4, 2]];
        let mesh: HalfEdgeMesh<u32> = build_from_polygons(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_polygons(&mesh);
        assert_eq!(out_faces, faces);
        for (v_in, v_out) in vertices.iter().zip(out_verts.iter()) {
            assert!((v_in - v_out).norm() < 1e-10);
        }
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[[0, 1, 2]]);
        assert!(matches!(
            result,
            Err(HarmonicsError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_degenerate_face() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let repeated: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[[0, 0, 2]]);
        assert!(matches!(repeated, Err(HarmonicsError::DegenerateFace { face: 0 })));

        let too_short: Result<HalfEdgeMesh<u32>> = build_from_polygons(&vertices, &[vec![0, 1]]);
        assert!(matches!(too_short, Err(HarmonicsError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_non_manifold_edge() {
        let (vertices, _) = two_triangles();
        // Both faces traverse 0 -> 1
        let faces = vec![[0, 1, 2], [0, 1, 3]];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(HarmonicsError::NonManifoldEdge { v0: 0, v1: 1 })));
    }

    #[test]
    fn test_bowtie_vertex_rejected() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];
        // Two triangles touching only at vertex 0
        let faces = vec![[0, 1, 2], [0, 3, 4]];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(HarmonicsError::NonManifoldVertex { vertex: 0 })));
    }

    #[test]
    fn test_empty_faces() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces: Vec<[usize; 3]> = Vec::new();
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(HarmonicsError::EmptyMesh)));
    }
}
