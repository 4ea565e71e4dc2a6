//! Discrete Laplace operators on half-edge meshes.
//!
//! Two operators are available:
//!
//! - [`graph_laplacian`]: purely combinatorial, `L = D - A`
//! - [`cotangent_laplacian`]: the cotangent-weighted Laplace-Beltrami
//!   operator, symmetrically normalized by per-vertex areas
//!
//! Both return a dense symmetric `n x n` matrix whose rows sum to zero. Row
//! and column `i` correspond to vertex `i`. Fixities are imposed afterwards
//! with [`apply_fixed_points`] or [`impose_boundary_conditions`].
//!
//! # Example
//!
//! ```
//! use harmonics::prelude::*;
//! use harmonics::algo::laplacian::{cotangent_laplacian, CotangentOptions, AreaWeighting};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let options = CotangentOptions::default().with_area(AreaWeighting::Barycentric);
//! let l = cotangent_laplacian(&mesh, &options).unwrap();
//!
//! for i in 0..4 {
//!     assert!(l.row(i).sum().abs() < 1e-9);
//! }
//! ```

mod boundary;
mod cotangent;

pub use boundary::{
    apply_fixed_points, impose_boundary_conditions, match_fixed_vertices, BoundaryConditions,
    FULL_FIXITY_STIFFNESS, PARTIAL_FIXITY_STIFFNESS,
};
pub use cotangent::{
    cotangent_laplacian, cotangent_weights, vertex_areas, AreaWeighting, CotangentOptions,
};

use nalgebra::DMatrix;

use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Build the combinatorial graph Laplacian.
///
/// `L[i][i]` is the valence of vertex `i`, `L[i][j] = -1` when `i` and `j`
/// share an edge, and 0 otherwise. Geometry is ignored.
pub fn graph_laplacian<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> DMatrix<f64> {
    let n = mesh.num_vertices();
    let mut l = DMatrix::zeros(n, n);

    for v in mesh.vertex_ids() {
        let i = v.index();
        for u in mesh.vertex_neighbors(v) {
            l[(i, u.index())] = -1.0;
        }
        l[(i, i)] = mesh.valence(v) as f64;
    }

    log::debug!("graph laplacian: {} vertices", n);
    l
}
