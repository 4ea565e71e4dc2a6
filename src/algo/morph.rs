//! Modal morphing between two shapes described over (possibly different)
//! subsets of modes.
//!
//! Each mode gets its own interpolation coefficient, plus one extra
//! coefficient for the displacement scale, so modes can be blended at
//! different rates.
//!
//! # Example
//!
//! ```
//! use harmonics::algo::morph::{total_mode_list, ModalShape};
//!
//! let a = ModalShape::new(vec![3, 1], vec![0.5, 1.0], 1.0);
//! let b = ModalShape::new(vec![1, 4], vec![-1.0, 0.2], 2.0);
//! assert_eq!(total_mode_list(&a, &b), vec![3, 1, 4]);
//! ```

use nalgebra::{DMatrix, Vector3};

use crate::algo::synthesis::displace_along;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::error::{HarmonicsError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Weights over a subset of mode columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalShape {
    /// Mode column indices.
    pub indices: Vec<usize>,
    /// One weight per index.
    pub weights: Vec<f64>,
    /// Displacement scale.
    pub scale: f64,
}

impl ModalShape {
    /// Create a shape from indices, weights and scale.
    pub fn new(indices: Vec<usize>, weights: Vec<f64>, scale: f64) -> Self {
        Self {
            indices,
            weights,
            scale,
        }
    }

    /// Weight of mode column `index`, or 0 if the shape does not use it.
    pub fn weight_of(&self, index: usize) -> f64 {
        self.indices
            .iter()
            .position(|&i| i == index)
            .map_or(0.0, |k| self.weights[k])
    }

    fn validate(&self, mode_count: usize) -> Result<()> {
        HarmonicsError::check_len("shape weights", self.indices.len(), self.weights.len())?;
        if let Some(&bad) = self.indices.iter().find(|&&i| i >= mode_count) {
            return Err(HarmonicsError::mismatch("mode index", mode_count, bad));
        }
        Ok(())
    }
}

/// Result of [`morph`].
#[derive(Debug, Clone)]
pub struct Morph<I: MeshIndex = u32> {
    /// The morphed mesh.
    pub mesh: HalfEdgeMesh<I>,
    /// Union of both shapes' mode indices.
    pub indices: Vec<usize>,
    /// `[w1, w2]` per union index.
    pub intervals: Vec<[f64; 2]>,
    /// Interpolated scale.
    pub scale: f64,
    /// Per-vertex displacements applied to the mesh.
    pub displacements: Vec<Vector3<f64>>,
    /// Coefficient fallback warnings.
    pub diagnostics: Diagnostics,
}

/// Indices of `a` in order, followed by indices only `b` uses.
pub fn total_mode_list(a: &ModalShape, b: &ModalShape) -> Vec<usize> {
    let mut indices = Vec::with_capacity(a.indices.len() + b.indices.len());
    for &i in a.indices.iter().chain(&b.indices) {
        if !indices.contains(&i) {
            indices.push(i);
        }
    }
    indices
}

/// Weights of `shape` laid out along `indices`.
pub fn aligned_weights(shape: &ModalShape, indices: &[usize]) -> Vec<f64> {
    indices.iter().map(|&i| shape.weight_of(i)).collect()
}

/// Check a coefficient vector of one entry per mode plus one for the scale.
///
/// A vector of the wrong length, or with any entry outside `[0, 1]`, is
/// replaced by all ones and an [`DiagnosticKind::InvalidCoefficientVector`]
/// warning is recorded.
pub fn validate_coefficients(lambda: &[f64], mode_count: usize) -> (Vec<f64>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();

    if lambda.iter().any(|l| !(0.0..=1.0).contains(l)) {
        diagnostics.warning(
            DiagnosticKind::InvalidCoefficientVector,
            "morph coefficients must lie between 0.0 and 1.0, using 1.0 for all",
        );
    }
    if lambda.len() != mode_count + 1 {
        diagnostics.warning(
            DiagnosticKind::InvalidCoefficientVector,
            format!(
                "expected {} morph coefficients but found {}, using 1.0 for all",
                mode_count + 1,
                lambda.len()
            ),
        );
    }

    if diagnostics.is_empty() {
        (lambda.to_vec(), diagnostics)
    } else {
        (vec![1.0; mode_count + 1], diagnostics)
    }
}

/// Blend shape `a` into shape `b`.
///
/// `lambda[j]` moves mode `j` of the union from `a` (0) to `b` (1); the last
/// entry does the same for the scale.
///
/// # Errors
/// [`HarmonicsError::DimensionMismatch`] if a shape's weights and indices
/// differ in length, an index exceeds the mode count, or the mode or
/// direction counts differ from the vertex count.
pub fn morph<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    modes: &DMatrix<f64>,
    directions: &[Vector3<f64>],
    a: &ModalShape,
    b: &ModalShape,
    lambda: &[f64],
) -> Result<Morph<I>> {
    let n = mesh.num_vertices();
    HarmonicsError::check_len("mode rows", n, modes.nrows())?;
    HarmonicsError::check_len("directions", n, directions.len())?;
    a.validate(modes.ncols())?;
    b.validate(modes.ncols())?;

    let indices = total_mode_list(a, b);
    let w1 = aligned_weights(a, &indices);
    let w2 = aligned_weights(b, &indices);
    let (lambda, diagnostics) = validate_coefficients(lambda, indices.len());

    let mut nodal = vec![0.0; n];
    for (j, &mode) in indices.iter().enumerate() {
        let blended = (1.0 - lambda[j]) * w1[j] + lambda[j] * w2[j];
        for (value, v) in nodal.iter_mut().zip(modes.column(mode).iter()) {
            *value += blended * v;
        }
    }

    let t = lambda[indices.len()];
    let scale = (1.0 - t) * a.scale + t * b.scale;
    let displacements = displace_along(&nodal, directions, scale);

    log::debug!("morphed {} modes, scale {:.4}", indices.len(), scale);

    Ok(Morph {
        mesh: mesh.displaced(&displacements),
        intervals: w1.iter().zip(&w2).map(|(&x, &y)| [x, y]).collect(),
        indices,
        scale,
        displacements,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::synthesis::ModalState;
    use crate::mesh::{build_from_triangles, VertexId};
    use nalgebra::Point3;

    fn fixture() -> (HalfEdgeMesh, DMatrix<f64>, Vec<Vector3<f64>>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        // 4 vertices x 3 modes
        let modes = DMatrix::from_row_slice(
            4,
            3,
            &[
                0.5, 0.5, 0.0, //
                0.5, -0.5, 0.7, //
                0.5, 0.5, 0.0, //
                0.5, -0.5, -0.7,
            ],
        );
        (mesh, modes, vec![Vector3::z(); 4])
    }

    #[test]
    fn test_total_mode_list_and_alignment() {
        let a = ModalShape::new(vec![2, 0], vec![0.5, 1.0], 1.0);
        let b = ModalShape::new(vec![0, 1, 0], vec![-1.0, 0.25, 9.0], 1.0);
        let indices = total_mode_list(&a, &b);
        assert_eq!(indices, vec![2, 0, 1]);
        assert_eq!(aligned_weights(&a, &indices), vec![0.5, 1.0, 0.0]);
        assert_eq!(aligned_weights(&b, &indices), vec![0.0, -1.0, 0.25]);
    }

    #[test]
    fn test_endpoints_reproduce_shapes() {
        let (mesh, modes, directions) = fixture();
        let a = ModalShape::new(vec![0, 2], vec![1.0, -0.5], 2.0);
        let b = ModalShape::new(vec![1], vec![0.8], 3.0);

        let start = morph(&mesh, &modes, &directions, &a, &b, &[0.0; 4]).unwrap();
        let end = morph(&mesh, &modes, &directions, &a, &b, &[1.0; 4]).unwrap();
        assert!(start.diagnostics.is_empty());
        assert_eq!(start.indices, vec![0, 2, 1]);
        assert_eq!(start.intervals, vec![[1.0, 0.0], [-0.5, 0.0], [0.0, 0.8]]);

        let shape_a = ModalState::new(vec![1.0, 0.0, -0.5], 2.0)
            .apply(&mesh, &modes, &directions)
            .unwrap();
        let shape_b = ModalState::new(vec![0.0, 0.8, 0.0], 3.0)
            .apply(&mesh, &modes, &directions)
            .unwrap();

        for i in 0..4 {
            let v = VertexId::new(i);
            assert!((start.mesh.position(v) - shape_a.position(v)).norm() < 1e-12);
            assert!((end.mesh.position(v) - shape_b.position(v)).norm() < 1e-12);
        }
        assert_eq!(start.scale, 2.0);
        assert_eq!(end.scale, 3.0);
    }

    #[test]
    fn test_per_mode_coefficients() {
        let (mesh, modes, directions) = fixture();
        let a = ModalShape::new(vec![0], vec![1.0], 1.0);
        let b = ModalShape::new(vec![0], vec![0.0], 1.0);

        let half = morph(&mesh, &modes, &directions, &a, &b, &[0.5, 0.0]).unwrap();
        assert_eq!(half.scale, 1.0);
        // Constant mode 0.5 at weight 0.5
        for d in &half.displacements {
            assert!((d.z - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_invalid_coefficients_fall_back() {
        let (values, diagnostics) = validate_coefficients(&[0.2, 1.5], 1);
        assert_eq!(values, vec![1.0, 1.0]);
        assert!(diagnostics.contains(DiagnosticKind::InvalidCoefficientVector));

        let (values, diagnostics) = validate_coefficients(&[0.2], 1);
        assert_eq!(values, vec![1.0, 1.0]);
        assert!(diagnostics.contains(DiagnosticKind::InvalidCoefficientVector));

        let (values, diagnostics) = validate_coefficients(&[f64::NAN, 0.0], 1);
        assert_eq!(values, vec![1.0, 1.0]);
        assert!(!diagnostics.is_empty());

        let (values, diagnostics) = validate_coefficients(&[0.2, 0.7], 1);
        assert_eq!(values, vec![0.2, 0.7]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let (mesh, modes, directions) = fixture();
        let good = ModalShape::new(vec![0], vec![1.0], 1.0);
        let out_of_range = ModalShape::new(vec![3], vec![1.0], 1.0);
        let ragged = ModalShape::new(vec![0, 1], vec![1.0], 1.0);

        for bad in [out_of_range, ragged] {
            assert!(matches!(
                morph(&mesh, &modes, &directions, &good, &bad, &[1.0, 1.0, 1.0]),
                Err(HarmonicsError::DimensionMismatch { .. })
            ));
        }
    }
}
