//! Vertex normals, the usual displacement directions for synthesis.

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Unit normal of every vertex, computed on the rayon thread pool.
///
/// Each normal is the normalized sum of the incident polygon normals; a
/// polygon normal averages the cross products of consecutive edges, so
/// n-gons are handled. Isolated vertices get a zero vector.
pub fn vertex_normals<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vector3<f64>> {
    (0..mesh.num_vertices())
        .into_par_iter()
        .map(|i| mesh.vertex_normal(VertexId::new(i)))
        .collect()
}

/// Single-threaded [`vertex_normals`].
pub fn vertex_normals_sequential<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vector3<f64>> {
    mesh.vertex_ids().map(|v| mesh.vertex_normal(v)).collect()
}
