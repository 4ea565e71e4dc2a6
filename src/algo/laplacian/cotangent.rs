//! Cotangent-weighted Laplace-Beltrami operator.
//!
//! # Algorithm
//!
//! 1. Each vertex gets an area (barycentric or mixed Voronoi), rescaled so
//!    that the largest is [`AREA_SCALE`].
//! 2. Each edge `(i, j)` gets `w_ij = cot(alpha) + cot(beta)`, the angles
//!    opposite the edge in its two triangles. A boundary side contributes 0.
//!    With area weighting, `w_ij` is divided by `sqrt(a_i * a_j)`, which keeps
//!    the operator symmetric.
//! 3. `L[i][j] = -w_ij` and `L[i][i] = sum_j w_ij`.
//!
//! # References
//!
//! - Meyer, M., et al. (2003). "Discrete Differential-Geometry Operators for
//!   Triangulated 2-Manifolds."
//! - Vallet, B., Lévy, B. (2008). "Spectral Geometry Processing with Manifold
//!   Harmonics."

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::algo::geometry::{cotangent_angle, obtuse_corner, triangle_area, voronoi_corner_area};
use crate::error::{HarmonicsError, Result};
use crate::mesh::{HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// Largest per-vertex area after rescaling.
pub const AREA_SCALE: f64 = 10.0;

/// How per-vertex areas normalize the cotangent weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaWeighting {
    /// One third of every incident triangle.
    Barycentric,
    /// Mixed Voronoi regions, with the obtuse-triangle fallback.
    #[default]
    Voronoi,
    /// No area normalization; raw cotangent weights.
    Unweighted,
}

/// Options for [`cotangent_laplacian`].
#[derive(Debug, Clone)]
pub struct CotangentOptions {
    /// Vertex area used to normalize edge weights.
    pub area: AreaWeighting,
    /// Compute areas and edge weights on the rayon thread pool.
    pub parallel: bool,
}

impl Default for CotangentOptions {
    fn default() -> Self {
        Self {
            area: AreaWeighting::Voronoi,
            parallel: true,
        }
    }
}

impl CotangentOptions {
    /// Set the area weighting.
    pub fn with_area(mut self, area: AreaWeighting) -> Self {
        self.area = area;
        self
    }

    /// Enable or disable parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Build the cotangent Laplacian of a triangle mesh.
///
/// # Errors
/// - [`HarmonicsError::InvalidTopology`] if any face is not a triangle
/// - [`HarmonicsError::DegenerateGeometry`] if area weighting is requested
///   and every vertex area is zero
pub fn cotangent_laplacian<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &CotangentOptions,
) -> Result<DMatrix<f64>> {
    let n = mesh.num_vertices();
    let weights = cotangent_weights(mesh, options)?;

    let mut l = DMatrix::zeros(n, n);
    for &(i, j, w) in &weights {
        l[(i, j)] = -w;
        l[(j, i)] = -w;
        l[(i, i)] += w;
        l[(j, j)] += w;
    }

    log::debug!(
        "cotangent laplacian: {} vertices, {} edges, {:?} areas",
        n,
        weights.len(),
        options.area
    );
    Ok(l)
}

/// Per-edge cotangent weights `(i, j, w_ij)` with `i < j`, normalized by the
/// vertex areas selected in `options`.
pub fn cotangent_weights<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &CotangentOptions,
) -> Result<Vec<(usize, usize, f64)>> {
    require_triangles(mesh)?;

    let areas = match options.area {
        AreaWeighting::Unweighted => None,
        weighting => Some(vertex_areas(mesh, weighting, options.parallel)?),
    };

    let edges: Vec<HalfEdgeId<I>> = mesh.edges().collect();
    let edge_weight = |he: HalfEdgeId<I>| -> (usize, usize, f64) {
        let i = mesh.origin(he).index();
        let j = mesh.dest(he).index();
        let mut w = opposite_cotangent(mesh, he) + opposite_cotangent(mesh, mesh.twin(he));
        if let Some(a) = &areas {
            w /= (a[i] * a[j]).sqrt();
        }
        (i, j, w)
    };

    let weights = if options.parallel {
        edges.par_iter().map(|&he| edge_weight(he)).collect()
    } else {
        edges.iter().map(|&he| edge_weight(he)).collect()
    };
    Ok(weights)
}

/// Per-vertex areas for the chosen weighting.
///
/// Barycentric and Voronoi areas are rescaled so that the largest equals
/// [`AREA_SCALE`]. `Unweighted` yields all zeros.
///
/// # Errors
/// - [`HarmonicsError::InvalidTopology`] if any face is not a triangle
/// - [`HarmonicsError::DegenerateGeometry`] if no vertex has positive area,
///   or if a vertex with incident faces has none
pub fn vertex_areas<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    weighting: AreaWeighting,
    parallel: bool,
) -> Result<Vec<f64>> {
    require_triangles(mesh)?;

    let n = mesh.num_vertices();
    if weighting == AreaWeighting::Unweighted {
        return Ok(vec![0.0; n]);
    }

    let area_of = |idx: usize| -> f64 {
        let v = VertexId::<I>::new(idx);
        match weighting {
            AreaWeighting::Barycentric => barycentric_area(mesh, v),
            _ => mixed_voronoi_area(mesh, v),
        }
    };

    let mut areas: Vec<f64> = if parallel {
        (0..n).into_par_iter().map(area_of).collect()
    } else {
        (0..n).map(area_of).collect()
    };

    let max = areas.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return Err(HarmonicsError::DegenerateGeometry(
            "every vertex area is zero".to_string(),
        ));
    }
    let positive = |a: f64| a.is_normal() && a > 0.0;
    if let Some(v) = mesh
        .vertex_ids()
        .find(|&v| mesh.vertex(v).halfedge.is_valid() && !positive(areas[v.index()]))
    {
        return Err(HarmonicsError::DegenerateGeometry(format!(
            "vertex {} has zero area",
            v.index()
        )));
    }
    let factor = AREA_SCALE / max;
    for a in &mut areas {
        *a *= factor;
    }
    Ok(areas)
}

fn require_triangles<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Result<()> {
    if let Some(f) = mesh.face_ids().find(|&f| mesh.face_vertex_count(f) != 3) {
        return Err(HarmonicsError::InvalidTopology {
            reason: format!(
                "cotangent weights need triangles, face {} has {} vertices",
                f.index(),
                mesh.face_vertex_count(f)
            ),
        });
    }
    Ok(())
}

/// Cotangent of the angle opposite `he` in its face, 0 on the boundary.
fn opposite_cotangent<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> f64 {
    if mesh.is_boundary_halfedge(he) {
        return 0.0;
    }
    let a = mesh.position(mesh.origin(he));
    let b = mesh.position(mesh.dest(he));
    let c = mesh.position(mesh.origin(mesh.prev(he)));
    cotangent_angle(c, a, b)
}

fn barycentric_area<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> f64 {
    mesh.vertex_faces(v)
        .map(|f| {
            let [p0, p1, p2] = mesh.face_positions(f);
            triangle_area(&p0, &p1, &p2) / 3.0
        })
        .sum()
}

fn mixed_voronoi_area<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> f64 {
    let mut area = 0.0;

    for f in mesh.vertex_faces(v) {
        let corners = mesh.face_triangle(f);
        let p = mesh.face_positions(f);
        let local = corners.iter().position(|&c| c == v).unwrap_or(0);

        area += match obtuse_corner(&p) {
            None => voronoi_corner_area(&p, local),
            Some(obtuse) => {
                let tri = triangle_area(&p[0], &p[1], &p[2]);
                if obtuse == local {
                    tri / 2.0
                } else {
                    tri / 4.0
                }
            }
        };
    }

    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_polygons, build_from_triangles};
    use nalgebra::Point3;

    fn create_flat_grid(n: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }

        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + (n + 1);
                let v11 = v01 + 1;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }

        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn create_octahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let faces = vec![
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn assert_laplacian_shape(l: &DMatrix<f64>) {
        for i in 0..l.nrows() {
            assert!(l.row(i).sum().abs() < 1e-9, "row {} sums to {}", i, l.row(i).sum());
            for j in 0..l.ncols() {
                assert!((l[(i, j)] - l[(j, i)]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_right_angles_give_zero_weight() {
        // Unit square split along 0-2; both angles opposite the diagonal are 90 degrees.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        let options = CotangentOptions::default().with_area(AreaWeighting::Unweighted);

        let weights = cotangent_weights(&mesh, &options).unwrap();
        let diagonal = weights.iter().find(|&&(i, j, _)| (i, j) == (0, 2)).unwrap();
        assert!(diagonal.2.abs() < 1e-12);

        let l = cotangent_laplacian(&mesh, &options).unwrap();
        assert!(l[(0, 2)].abs() < 1e-12);
        // Boundary edge 0-1 only sees the 45 degree angle at 2
        assert!((l[(0, 1)] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rows_sum_to_zero_all_weightings() {
        let meshes = [create_flat_grid(4), create_octahedron()];
        let weightings = [
            AreaWeighting::Barycentric,
            AreaWeighting::Voronoi,
            AreaWeighting::Unweighted,
        ];

        for mesh in &meshes {
            for &area in &weightings {
                let l = cotangent_laplacian(mesh, &CotangentOptions::default().with_area(area))
                    .unwrap();
                assert_laplacian_shape(&l);
            }
        }
    }

    #[test]
    fn test_areas_rescaled_to_ten() {
        let mesh = create_flat_grid(3);
        for area in [AreaWeighting::Barycentric, AreaWeighting::Voronoi] {
            let areas = vertex_areas(&mesh, area, true).unwrap();
            let max = areas.iter().copied().fold(f64::MIN, f64::max);
            assert!((max - AREA_SCALE).abs() < 1e-12);
            assert!(areas.iter().all(|&a| a > 0.0));
        }
    }

    #[test]
    fn test_voronoi_partitions_surface() {
        // Octahedron faces are equilateral, so mixed and barycentric areas agree.
        let mesh = create_octahedron();
        let bary = vertex_areas(&mesh, AreaWeighting::Barycentric, false).unwrap();
        let voronoi = vertex_areas(&mesh, AreaWeighting::Voronoi, false).unwrap();
        for (b, v) in bary.iter().zip(&voronoi) {
            assert!((b - v).abs() < 1e-9);
            assert!((b - AREA_SCALE).abs() < 1e-9);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = create_flat_grid(5);
        let par = cotangent_laplacian(&mesh, &CotangentOptions::default()).unwrap();
        let seq =
            cotangent_laplacian(&mesh, &CotangentOptions::default().with_parallel(false)).unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn test_rejects_polygons() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
        let result = cotangent_laplacian(&mesh, &CotangentOptions::default());
        assert!(matches!(result, Err(HarmonicsError::InvalidTopology { .. })));
    }

    #[test]
    fn test_degenerate_areas() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let result = cotangent_laplacian(
            &mesh,
            &CotangentOptions::default().with_area(AreaWeighting::Barycentric),
        );
        assert!(matches!(result, Err(HarmonicsError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_zero_area_vertex_rejected() {
        // Vertex 3 lies on edge 0-1, so its only triangle is flat
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap();

        for area in [AreaWeighting::Voronoi, AreaWeighting::Barycentric] {
            let result = cotangent_laplacian(&mesh, &CotangentOptions::default().with_area(area));
            match result {
                Err(HarmonicsError::DegenerateGeometry(message)) => {
                    assert!(message.contains("vertex 3"), "{}", message)
                }
                other => panic!("expected degenerate geometry, got {:?}", other.map(|_| ())),
            }
        }
    }
}
