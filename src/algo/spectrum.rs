//! Eigendecomposition of symmetric Laplacians into vibration modes.
//!
//! The decomposition is a full dense symmetric eigensolve. Eigenpairs are
//! returned in ascending eigenvalue order, so column 0 is the lowest
//! frequency (for an unconstrained mesh, the constant mode with eigenvalue 0).
//!
//! Eigenvectors are only defined up to sign. Each returned column is
//! oriented so that its largest-magnitude entry is positive, which makes
//! repeated runs on the same input agree.
//!
//! # Example
//!
//! ```
//! use harmonics::prelude::*;
//! use harmonics::algo::laplacian::graph_laplacian;
//! use harmonics::algo::spectrum::decompose;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
//!
//! let spectrum = decompose(&graph_laplacian(&mesh), 4).unwrap();
//! assert!(spectrum.eigenvalues[0].abs() < 1e-9);
//! assert!((spectrum.eigenvalues[3] - 4.0).abs() < 1e-9);
//! ```

use std::cmp::Ordering;

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::error::{HarmonicsError, Result};

/// Sorted eigenpairs of a symmetric operator.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Eigenvalues in ascending order.
    pub eigenvalues: DVector<f64>,
    /// Unit eigenvectors, one column per eigenvalue.
    pub eigenvectors: DMatrix<f64>,
}

impl Spectrum {
    /// Number of retained modes.
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    /// True if no modes were retained.
    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// The mode matrix restricted to the listed columns.
    pub fn modes(&self, indices: &[usize]) -> Result<DMatrix<f64>> {
        extract_modes(&self.eigenvectors, indices)
    }
}

/// Decompose a symmetric matrix and keep the `count` lowest eigenpairs.
///
/// `count` is clamped to `[1, n]`. Only the lower triangle of `matrix` is
/// read by the solver.
///
/// # Errors
/// - [`HarmonicsError::EmptyMesh`] for a 0 x 0 matrix
/// - [`HarmonicsError::DimensionMismatch`] if the matrix is not square
/// - [`HarmonicsError::InvalidParameter`] if an entry is NaN or infinite
pub fn decompose(matrix: &DMatrix<f64>, count: usize) -> Result<Spectrum> {
    let n = matrix.nrows();
    HarmonicsError::check_len("matrix columns", n, matrix.ncols())?;
    if n == 0 {
        return Err(HarmonicsError::EmptyMesh);
    }
    if let Some(x) = matrix.iter().find(|x| !x.is_finite()) {
        return Err(HarmonicsError::invalid_param(
            "matrix",
            x,
            "entries must be finite",
        ));
    }
    let keep = count.clamp(1, n);

    let eigen = SymmetricEigen::new(matrix.clone());

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[a]
            .partial_cmp(&eigen.eigenvalues[b])
            .unwrap_or(Ordering::Equal)
    });
    order.truncate(keep);

    let eigenvalues = DVector::from_iterator(keep, order.iter().map(|&k| eigen.eigenvalues[k]));
    let mut eigenvectors = eigen.eigenvectors.select_columns(order.iter());
    for mut column in eigenvectors.column_iter_mut() {
        let pivot = column
            .iter()
            .copied()
            .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
        if pivot < 0.0 {
            column.neg_mut();
        }
    }

    log::debug!(
        "decomposed {}x{} operator, kept {} modes (lowest {:.6e})",
        n,
        n,
        keep,
        eigenvalues[0]
    );

    Ok(Spectrum {
        eigenvalues,
        eigenvectors,
    })
}

/// Copy the listed columns of a mode matrix, in list order.
///
/// # Errors
/// [`HarmonicsError::InvalidParameter`] if an index is out of range.
pub fn extract_modes(modes: &DMatrix<f64>, indices: &[usize]) -> Result<DMatrix<f64>> {
    if let Some(&bad) = indices.iter().find(|&&i| i >= modes.ncols()) {
        return Err(HarmonicsError::invalid_param(
            "mode index",
            bad,
            "exceeds the number of modes",
        ));
    }
    Ok(modes.select_columns(indices.iter()))
}
