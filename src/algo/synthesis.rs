//! Modal synthesis: turning mode weights into displaced geometry.
//!
//! The nodal value of vertex `i` is the weighted sum of its mode entries,
//! `sum_j w_j V[i][j]`. Each vertex then moves along its (normalized)
//! displacement direction by `scale * nodal(i)`.
//!
//! # Example
//!
//! ```
//! use harmonics::prelude::*;
//! use harmonics::algo::synthesis::ModalState;
//! use nalgebra::{DMatrix, Point3, Vector3};
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! // One mode lifting only the apex
//! let modes = DMatrix::from_column_slice(3, 1, &[0.0, 0.0, 1.0]);
//! let up = vec![Vector3::z(); 3];
//!
//! let lifted = ModalState::new(vec![1.0], 2.0).apply(&mesh, &modes, &up).unwrap();
//! assert_eq!(lifted.position(VertexId::new(2)).z, 2.0);
//! ```

use nalgebra::{DMatrix, DVector, Vector3};

use crate::algo::geometry::unit_or_zero;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::error::{HarmonicsError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Scale applied to nodal values before they are mapped to grey levels.
const COLOUR_RESOLUTION: f64 = 1000.0;

/// Mode weights together with the displacement scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalState {
    /// One weight per mode column.
    pub weights: Vec<f64>,
    /// Displacement multiplier.
    pub scale: f64,
}

impl ModalState {
    /// Create a state from weights and scale.
    pub fn new(weights: Vec<f64>, scale: f64) -> Self {
        Self { weights, scale }
    }

    /// `count` unit weights.
    pub fn uniform(count: usize, scale: f64) -> Self {
        Self::new(vec![1.0; count], scale)
    }

    /// Per-vertex displacement vectors.
    pub fn displacements(
        &self,
        modes: &DMatrix<f64>,
        directions: &[Vector3<f64>],
    ) -> Result<Vec<Vector3<f64>>> {
        synthesize(modes, &self.weights, directions, self.scale)
    }

    /// A displaced copy of `mesh`.
    pub fn apply<I: MeshIndex>(
        &self,
        mesh: &HalfEdgeMesh<I>,
        modes: &DMatrix<f64>,
        directions: &[Vector3<f64>],
    ) -> Result<HalfEdgeMesh<I>> {
        HarmonicsError::check_len("mode rows", mesh.num_vertices(), modes.nrows())?;
        Ok(mesh.displaced(&self.displacements(modes, directions)?))
    }
}

/// Output of [`synthesize_or_uniform`].
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Weights actually used (the input, or the uniform fallback).
    pub weights: Vec<f64>,
    /// Per-vertex nodal values.
    pub nodal_values: Vec<f64>,
    /// Per-vertex displacement vectors.
    pub displacements: Vec<Vector3<f64>>,
    /// Fallback warnings.
    pub diagnostics: Diagnostics,
}

/// Nodal values `V w`.
///
/// # Errors
/// [`HarmonicsError::DimensionMismatch`] if `weights.len() != modes.ncols()`.
pub fn nodal_values(modes: &DMatrix<f64>, weights: &[f64]) -> Result<Vec<f64>> {
    HarmonicsError::check_len("weights", modes.ncols(), weights.len())?;
    let combined = modes * DVector::from_column_slice(weights);
    Ok(combined.iter().copied().collect())
}

/// Displacements `normalize(d_i) * nodal(i) * scale`.
///
/// Zero-length directions give zero displacement.
///
/// # Errors
/// [`HarmonicsError::DimensionMismatch`] if the weight count differs from the
/// mode count or the direction count differs from the vertex count.
pub fn synthesize(
    modes: &DMatrix<f64>,
    weights: &[f64],
    directions: &[Vector3<f64>],
    scale: f64,
) -> Result<Vec<Vector3<f64>>> {
    HarmonicsError::check_len("directions", modes.nrows(), directions.len())?;
    let nodal = nodal_values(modes, weights)?;
    Ok(displace_along(&nodal, directions, scale))
}

/// Like [`synthesize`], but falls back to unit weights when the weight count
/// does not match the mode count.
///
/// The fallback records a [`DiagnosticKind::DimensionMismatch`] warning. A
/// direction count mismatch is still an error.
pub fn synthesize_or_uniform(
    modes: &DMatrix<f64>,
    weights: &[f64],
    directions: &[Vector3<f64>],
    scale: f64,
) -> Result<Synthesis> {
    HarmonicsError::check_len("directions", modes.nrows(), directions.len())?;

    let mut diagnostics = Diagnostics::new();
    let weights = if weights.len() == modes.ncols() {
        weights.to_vec()
    } else {
        diagnostics.warning(
            DiagnosticKind::DimensionMismatch,
            format!(
                "{} weights for {} modes, using a weight of 1.0 for every mode",
                weights.len(),
                modes.ncols()
            ),
        );
        vec![1.0; modes.ncols()]
    };

    let nodal_values = nodal_values(modes, &weights)?;
    let displacements = displace_along(&nodal_values, directions, scale);

    Ok(Synthesis {
        weights,
        nodal_values,
        displacements,
        diagnostics,
    })
}

pub(crate) fn displace_along(
    nodal: &[f64],
    directions: &[Vector3<f64>],
    scale: f64,
) -> Vec<Vector3<f64>> {
    nodal
        .iter()
        .zip(directions)
        .map(|(&value, d)| unit_or_zero(d) * (value * scale))
        .collect()
}

/// How nodal values are mapped before grey-level scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColourScale {
    /// Black at the most negative value, white at the most positive.
    #[default]
    Signed,
    /// Black at zero amplitude, white at the largest magnitude.
    Absolute,
}

/// Map values linearly onto grey levels `0..=255`.
///
/// Values are multiplied by 1000 first. If the resulting range rounds to
/// zero the field is treated as constant and every entry is 0 (black).
pub fn colour_map(values: &[f64]) -> Vec<u8> {
    let scaled: Vec<f64> = values.iter().map(|v| v * COLOUR_RESOLUTION).collect();
    grey_levels(&scaled)
}

/// Grey levels for one mode column, one per vertex.
pub fn mode_vertex_colours(modes: &DMatrix<f64>, mode: usize, scale: ColourScale) -> Result<Vec<u8>> {
    check_mode(modes, mode)?;
    let values: Vec<f64> = modes
        .column(mode)
        .iter()
        .map(|&v| match scale {
            ColourScale::Signed => v,
            ColourScale::Absolute => v.abs(),
        })
        .collect();
    Ok(colour_map(&values))
}

/// Grey levels for one mode, one per face, from the mean nodal value of
/// each face's vertices.
pub fn mode_face_colours<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    modes: &DMatrix<f64>,
    mode: usize,
) -> Result<Vec<u8>> {
    HarmonicsError::check_len("mode rows", mesh.num_vertices(), modes.nrows())?;
    check_mode(modes, mode)?;

    let averages: Vec<f64> = mesh
        .face_ids()
        .map(|f| {
            let (sum, count) = mesh
                .face_vertices(f)
                .fold((0.0, 0usize), |(s, c), v| (s + modes[(v.index(), mode)], c + 1));
            sum / count as f64
        })
        .collect();
    Ok(colour_map(&averages))
}

/// Face grey levels for every mode column.
pub fn mode_face_colours_all<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    modes: &DMatrix<f64>,
) -> Result<Vec<Vec<u8>>> {
    (0..modes.ncols())
        .map(|mode| mode_face_colours(mesh, modes, mode))
        .collect()
}

fn check_mode(modes: &DMatrix<f64>, mode: usize) -> Result<()> {
    if mode >= modes.ncols() {
        return Err(HarmonicsError::invalid_param(
            "mode",
            mode,
            "exceeds the number of modes",
        ));
    }
    Ok(())
}

fn grey_levels(scaled: &[f64]) -> Vec<u8> {
    let min = scaled.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range.round_ties_even() == 0.0 {
        return vec![0; scaled.len()];
    }

    scaled
        .iter()
        .map(|&v| ((v - min) / range * 255.0).round_ties_even().clamp(0.0, 255.0) as u8)
        .collect()
}
