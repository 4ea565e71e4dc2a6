//! # Harmonics
//!
//! Manifold harmonics on half-edge meshes.
//!
//! Harmonics builds a discrete Laplace operator from a polygon mesh,
//! decomposes it into vibration modes and uses those modes to synthesize,
//! analyse, calibrate and morph shapes.
//!
//! ## Features
//!
//! - **Half-edge data structure**: polygon meshes with type-safe indices
//! - **Laplacians**: graph and cotangent operators with Voronoi or barycentric areas
//! - **Fixities**: stiff diagonal entries for vertices matched by coordinates
//! - **Modal synthesis and analysis**: the manifold harmonics transform and its inverse
//! - **Area calibration and morphing** of modal states
//! - **File formats**: OBJ and PLY
//!
//! ## Quick Start
//!
//! ```no_run
//! use harmonics::prelude::*;
//! use harmonics::algo::{laplacian, normals, spectrum, synthesis::ModalState};
//!
//! let mesh: HalfEdgeMesh = harmonics::io::load("shell.obj").unwrap();
//!
//! let l = laplacian::cotangent_laplacian(&mesh, &Default::default()).unwrap();
//! let modes = spectrum::decompose(&l, 12).unwrap();
//!
//! let directions = normals::vertex_normals(&mesh);
//! let state = ModalState::new(vec![0.0, 1.0, 0.5], 2.0);
//! let shaped = state
//!     .apply(&mesh, &modes.modes(&[0, 1, 2]).unwrap(), &directions)
//!     .unwrap();
//!
//! harmonics::io::save(&shaped, "shaped.obj").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use harmonics::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.5, 1.5, 0.0),
//! ];
//! let faces = vec![vec![0, 1, 2, 3], vec![3, 2, 4]];
//!
//! let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 5);
//! assert_eq!(mesh.num_faces(), 2);
//! assert_eq!(mesh.valence(VertexId::new(2)), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod diagnostic;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use harmonics::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::spectrum::Spectrum;
    pub use crate::algo::synthesis::ModalState;
    pub use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
    pub use crate::error::{HarmonicsError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, to_polygons, Face, FaceId, HalfEdge,
        HalfEdgeId, HalfEdgeMesh, MeshIndex, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::algo::{laplacian, normals, spectrum, synthesis};
    use super::prelude::*;
    use nalgebra::Point3;

    fn tetrahedron() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![
            [0, 2, 1], // bottom
            [0, 1, 3], // front
            [1, 2, 3], // right
            [2, 0, 3], // left
        ];
        (vertices, faces)
    }

    #[test]
    fn test_tetrahedron() {
        let (vertices, faces) = tetrahedron();
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        // Closed: every half-edge is interior
        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.is_valid());

        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v), "vertex {:?} should not be on boundary", v);
        }
    }

    #[test]
    fn test_constant_mode_translates_along_normals() {
        let (vertices, faces) = tetrahedron();
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let spectrum = spectrum::decompose(&laplacian::graph_laplacian(&mesh), 1).unwrap();
        let directions = normals::vertex_normals(&mesh);

        // Mode 0 is constant 1/2, so every vertex moves 0.5 along its normal
        let moved = synthesis::ModalState::new(vec![1.0], 1.0)
            .apply(&mesh, &spectrum.eigenvectors, &directions)
            .unwrap();
        for (v, n) in mesh.vertex_ids().zip(&directions) {
            let offset = moved.position(v) - mesh.position(v);
            assert!((offset - n * 0.5).norm() < 1e-9);
        }
    }
}
