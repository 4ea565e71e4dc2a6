//! Core mesh data structures.
//!
//! The spectral operators read topology exclusively through [`HalfEdgeMesh`]:
//! vertex neighbours for the graph Laplacian and the feature detector,
//! incident triangles and opposite angles for the cotangent Laplacian, and
//! face areas for calibration.
//!
//! # Index Types
//!
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! These are generic over the underlying integer type ([`MeshIndex`]).
//! Row `i` of every Laplacian and mode matrix corresponds to `VertexId::new(i)`.
//!
//! # Construction
//!
//! ```
//! use harmonics::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! ```

mod builder;
mod halfedge;
mod index;

pub use builder::{build_from_polygons, build_from_triangles, to_polygons};
pub use halfedge::{Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
