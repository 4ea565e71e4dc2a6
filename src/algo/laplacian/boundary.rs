//! Fixities: pinning vertices by stiffening their diagonal entries.
//!
//! A fixed vertex keeps its row and column couplings but receives a very
//! large diagonal, which pushes its eigenvector components towards zero in
//! the low-frequency modes.
//!
//! Fixed points are matched to vertices by coordinate equality after
//! rounding. Coordinates are rounded to 3 decimals, or to 1 decimal when the
//! mesh looks like it is modelled in millimetres (any vertex further than
//! 1000 units from the origin).

use std::collections::HashMap;

use nalgebra::{DMatrix, Point3};

use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::error::{HarmonicsError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Diagonal stiffness when every fixed point matched a vertex.
pub const FULL_FIXITY_STIFFNESS: f64 = 1e5;

/// Diagonal stiffness when only some fixed points matched.
pub const PARTIAL_FIXITY_STIFFNESS: f64 = 1e3;

const MILLIMETRE_THRESHOLD: f64 = 1000.0;

/// A Laplacian with fixities applied.
#[derive(Debug, Clone)]
pub struct BoundaryConditions {
    /// The modified operator.
    pub matrix: DMatrix<f64>,
    /// Indices of the pinned vertices, in fixed-point order.
    pub fixed: Vec<usize>,
    /// Number of unconstrained vertices, `n - fixed.len()`. A useful upper
    /// bound for the number of modes to request.
    pub free_count: usize,
    /// Stiffness written to the pinned diagonals.
    pub stiffness: f64,
    /// Partial-match warnings.
    pub diagnostics: Diagnostics,
}

/// Overwrite `L[i][i]` with `stiffness` for every index in `fixed`.
///
/// Off-diagonal entries are left untouched.
pub fn impose_boundary_conditions(
    mut laplacian: DMatrix<f64>,
    fixed: &[usize],
    stiffness: f64,
) -> Result<DMatrix<f64>> {
    let n = laplacian.nrows();
    if let Some(&i) = fixed.iter().find(|&&i| i >= n) {
        return Err(HarmonicsError::invalid_param("fixed index", i, "exceeds matrix size"));
    }
    for &i in fixed {
        laplacian[(i, i)] = stiffness;
    }
    Ok(laplacian)
}

/// Find every vertex whose rounded coordinates equal a rounded fixed point.
///
/// Returns vertex indices grouped by fixed point, in the order the points
/// were given. A point that coincides with several vertices yields all of them.
pub fn match_fixed_vertices<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, points: &[Point3<f64>]) -> Vec<usize> {
    match_by_point(mesh, points).into_iter().flatten().collect()
}

/// Match `points` against the mesh and stiffen the matched diagonals.
///
/// # Errors
/// - [`HarmonicsError::NoFixedVerticesFound`] if no point matches a vertex
/// - [`HarmonicsError::DimensionMismatch`] if `laplacian` is not `n x n`
///
/// If only some points match, the softer [`PARTIAL_FIXITY_STIFFNESS`] is used
/// and a [`DiagnosticKind::PartialFixity`] warning is recorded.
pub fn apply_fixed_points<I: MeshIndex>(
    laplacian: DMatrix<f64>,
    mesh: &HalfEdgeMesh<I>,
    points: &[Point3<f64>],
) -> Result<BoundaryConditions> {
    let n = mesh.num_vertices();
    HarmonicsError::check_len("laplacian rows", n, laplacian.nrows())?;
    HarmonicsError::check_len("laplacian columns", n, laplacian.ncols())?;

    let per_point = match_by_point(mesh, points);
    let matched_points = per_point.iter().filter(|m| !m.is_empty()).count();
    let fixed: Vec<usize> = per_point.into_iter().flatten().collect();

    if fixed.is_empty() {
        return Err(HarmonicsError::NoFixedVerticesFound {
            requested: points.len(),
        });
    }

    let mut diagnostics = Diagnostics::new();
    let stiffness = if matched_points == points.len() {
        FULL_FIXITY_STIFFNESS
    } else {
        diagnostics.warning(
            DiagnosticKind::PartialFixity,
            format!(
                "only {} of {} fixed points match a mesh vertex",
                matched_points,
                points.len()
            ),
        );
        PARTIAL_FIXITY_STIFFNESS
    };

    let matrix = impose_boundary_conditions(laplacian, &fixed, stiffness)?;
    let free_count = n.saturating_sub(fixed.len());
    log::debug!("fixed {} vertices, {} free", fixed.len(), free_count);

    Ok(BoundaryConditions {
        matrix,
        fixed,
        free_count,
        stiffness,
        diagnostics,
    })
}

fn match_by_point<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, points: &[Point3<f64>]) -> Vec<Vec<usize>> {
    let decimals = coordinate_precision(mesh);

    let mut lookup: HashMap<[i64; 3], Vec<usize>> = HashMap::with_capacity(mesh.num_vertices());
    for v in mesh.vertex_ids() {
        lookup
            .entry(rounded_key(mesh.position(v), decimals))
            .or_default()
            .push(v.index());
    }

    points
        .iter()
        .map(|p| lookup.get(&rounded_key(p, decimals)).cloned().unwrap_or_default())
        .collect()
}

fn coordinate_precision<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> i32 {
    let millimetres = mesh
        .vertex_ids()
        .any(|v| mesh.position(v).coords.norm() > MILLIMETRE_THRESHOLD);
    if millimetres {
        1
    } else {
        3
    }
}

fn rounded_key(p: &Point3<f64>, decimals: i32) -> [i64; 3] {
    let factor = 10f64.powi(decimals);
    [
        (p.x * factor).round_ties_even() as i64,
        (p.y * factor).round_ties_even() as i64,
        (p.z * factor).round_ties_even() as i64,
    ]
}
