//! Modal analysis: recovering mode weights from a target shape.
//!
//! The target is described by a *distance signal*: for every vertex, how far
//! it has to travel along its displacement direction to reach the target.
//! Projecting that signal onto the mode basis (the manifold harmonics
//! transform) yields one weight per mode. The weights are normalized so the
//! largest magnitude is 1, the most significant modes are kept, and the RMS
//! deviation of the reconstructed shape from the target is reported.
//!
//! # Example
//!
//! ```
//! use harmonics::algo::analysis::{normalize, project, rank_significant};
//! use nalgebra::DMatrix;
//!
//! let modes = DMatrix::<f64>::identity(3, 3);
//! let weights = project(&[0.5, -2.0, 1.0], &modes).unwrap();
//! let normalized = normalize(&weights, true);
//! assert_eq!(normalized.scale, 2.0);
//! assert_eq!(normalized.weights, vec![0.25, -1.0, 0.5]);
//!
//! let (indices, _) = rank_significant(&normalized.weights, 2);
//! assert_eq!(indices, vec![1, 2]);
//! ```

use nalgebra::{DMatrix, DVector, Point3, Vector3};

use crate::algo::geometry::{round_to, unit_or_zero};
use crate::algo::synthesis::displace_along;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::error::{HarmonicsError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Decimals kept when weights and scale are rounded.
const WEIGHT_DECIMALS: i32 = 2;

/// Vertices closer than this to a [`TargetPlane`] are treated as touching it.
const CONTACT_TOLERANCE: f64 = 0.01;

/// Produces the signed travel distance from a vertex to a target shape.
///
/// Positive values lie along the displacement direction, negative values
/// against it. `None` means the target cannot be reached from this vertex.
pub trait SignalSource {
    /// Distance for `vertex`, which sits at `position` and moves along `direction`.
    fn distance(&self, vertex: usize, position: &Point3<f64>, direction: &Vector3<f64>) -> Option<f64>;
}

impl<F> SignalSource for F
where
    F: Fn(usize, &Point3<f64>, &Vector3<f64>) -> Option<f64>,
{
    fn distance(&self, vertex: usize, position: &Point3<f64>, direction: &Vector3<f64>) -> Option<f64> {
        self(vertex, position, direction)
    }
}

/// An infinite plane target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPlane {
    /// Any point on the plane.
    pub origin: Point3<f64>,
    /// Plane normal; need not be unit length.
    pub normal: Vector3<f64>,
}

impl TargetPlane {
    /// Create a plane through `origin` with the given normal.
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { origin, normal }
    }
}

impl SignalSource for TargetPlane {
    fn distance(&self, _vertex: usize, position: &Point3<f64>, direction: &Vector3<f64>) -> Option<f64> {
        let normal = unit_or_zero(&self.normal);
        let dir = unit_or_zero(direction);
        let offset = normal.dot(&(self.origin - position));

        if normal == Vector3::zeros() {
            return None;
        }
        if offset.abs() <= CONTACT_TOLERANCE {
            return Some(0.0);
        }

        let along = normal.dot(&dir);
        if along.abs() < 1e-12 {
            return None;
        }
        // Hits in front are positive, hits behind (a ray cast backwards) negative.
        Some(offset / along)
    }
}

/// Which modes [`back_calculate`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeSelection {
    /// The `count` modes with the largest normalized weight magnitudes.
    #[default]
    MostSignificant,
    /// Modes `0..count`.
    First,
}

/// Options for [`back_calculate`].
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Number of modes to keep; clamped to `[1, modes]`.
    pub count: usize,
    /// How the kept modes are chosen.
    pub selection: ModeSelection,
    /// Round weights and scale to 2 decimals.
    pub round: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            count: 1,
            selection: ModeSelection::MostSignificant,
            round: true,
        }
    }
}

impl AnalysisOptions {
    /// Keep `count` modes.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the selection strategy.
    pub fn with_selection(mut self, selection: ModeSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Enable or disable rounding.
    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }
}

/// Weights divided by their largest magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Normalized (and possibly rounded) weights, within `[-1, 1]`.
    pub weights: Vec<f64>,
    /// `max(|min w|, max w)`, the factor that was divided out.
    pub scale: f64,
}

/// Result of [`back_calculate`].
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Selected mode indices.
    pub indices: Vec<usize>,
    /// Normalized weights of the selected modes, in `indices` order.
    pub weights: Vec<f64>,
    /// Displacement scale.
    pub scale: f64,
    /// Root mean square deviation of the reconstruction from the target.
    pub rms: f64,
    /// Shortfall remarks.
    pub diagnostics: Diagnostics,
}

/// Sample `source` at every vertex.
///
/// # Errors
/// - [`HarmonicsError::DimensionMismatch`] if `directions` does not have one entry per vertex
/// - [`HarmonicsError::SignalUnavailable`] for the first vertex the source cannot reach
pub fn distance_signal<I: MeshIndex, S: SignalSource + ?Sized>(
    mesh: &HalfEdgeMesh<I>,
    directions: &[Vector3<f64>],
    source: &S,
) -> Result<Vec<f64>> {
    HarmonicsError::check_len("directions", mesh.num_vertices(), directions.len())?;
    mesh.vertex_ids()
        .zip(directions)
        .map(|(v, d)| {
            source
                .distance(v.index(), mesh.position(v), d)
                .ok_or(HarmonicsError::SignalUnavailable { vertex: v.index() })
        })
        .collect()
}

/// Manifold harmonics transform: `w_j = sum_i s_i V[i][j]`.
///
/// # Errors
/// [`HarmonicsError::DimensionMismatch`] if `signal.len() != modes.nrows()`.
pub fn project(signal: &[f64], modes: &DMatrix<f64>) -> Result<Vec<f64>> {
    HarmonicsError::check_len("signal", modes.nrows(), signal.len())?;
    let weights = modes.tr_mul(&DVector::from_column_slice(signal));
    Ok(weights.iter().copied().collect())
}

/// Divide by the largest magnitude, optionally rounding to 2 decimals.
///
/// A zero scale leaves the weights unchanged.
pub fn normalize(weights: &[f64], round: bool) -> Normalized {
    let max = weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = weights.iter().copied().fold(f64::INFINITY, f64::min);
    let scale = if weights.is_empty() {
        0.0
    } else if min.abs() > max {
        min.abs()
    } else {
        max
    };

    let weights = weights
        .iter()
        .map(|&w| {
            let value = if scale != 0.0 { w / scale } else { w };
            if round {
                round_to(value, WEIGHT_DECIMALS)
            } else {
                value
            }
        })
        .collect();

    Normalized { weights, scale }
}

/// Greedily pick up to `count` indices of the largest non-zero magnitudes.
///
/// Ties go to the lowest index. If fewer than `count` weights are non-zero a
/// [`DiagnosticKind::ModeShortfall`] remark is recorded.
pub fn rank_significant(weights: &[f64], count: usize) -> (Vec<usize>, Diagnostics) {
    let mut remaining: Vec<f64> = weights.iter().map(|w| w.abs()).collect();
    let mut indices = Vec::with_capacity(count.min(weights.len()));
    let mut diagnostics = Diagnostics::new();

    while indices.len() < count {
        let best = remaining
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((i, v)),
            });

        match best {
            Some((i, v)) if v > 0.0 => {
                indices.push(i);
                remaining[i] = 0.0;
            }
            _ => {
                diagnostics.remark(
                    DiagnosticKind::ModeShortfall,
                    format!(
                        "only {} non-zero weights were found instead of {}",
                        indices.len(),
                        count
                    ),
                );
                break;
            }
        }
    }

    (indices, diagnostics)
}

/// Pick the weights at `indices`.
///
/// # Errors
/// [`HarmonicsError::InvalidParameter`] if an index is out of range.
pub fn extract_weights(weights: &[f64], indices: &[usize]) -> Result<Vec<f64>> {
    indices
        .iter()
        .map(|&i| {
            weights
                .get(i)
                .copied()
                .ok_or_else(|| HarmonicsError::invalid_param("mode index", i, "exceeds the number of weights"))
        })
        .collect()
}

/// Root mean square distance between the shape synthesized from the selected
/// modes and the target `p_i + normalize(d_i) * signal_i`.
///
/// # Errors
/// [`HarmonicsError::DimensionMismatch`] if lengths disagree, or
/// [`HarmonicsError::InvalidParameter`] for an out-of-range mode index.
pub fn rms<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    modes: &DMatrix<f64>,
    indices: &[usize],
    weights: &[f64],
    scale: f64,
    directions: &[Vector3<f64>],
    signal: &[f64],
) -> Result<f64> {
    let n = mesh.num_vertices();
    HarmonicsError::check_len("mode rows", n, modes.nrows())?;
    HarmonicsError::check_len("directions", n, directions.len())?;
    HarmonicsError::check_len("signal", n, signal.len())?;
    HarmonicsError::check_len("weights", indices.len(), weights.len())?;
    if n == 0 {
        return Ok(0.0);
    }

    let selected = crate::algo::spectrum::extract_modes(modes, indices)?;
    let nodal = selected * DVector::from_column_slice(weights);
    let nodal: Vec<f64> = nodal.iter().copied().collect();
    let displacements = displace_along(&nodal, directions, scale);

    let sum_sq: f64 = (0..n)
        .map(|i| {
            let p = mesh.position(VertexId::<I>::new(i));
            let reconstructed = p + displacements[i];
            let target = p + unit_or_zero(&directions[i]) * signal[i];
            (reconstructed - target).norm_squared()
        })
        .sum();

    Ok((sum_sq / n as f64).sqrt())
}

/// Back-calculate the weights that approximate `signal`.
///
/// Projects, normalizes, selects modes, extracts their weights and measures
/// the RMS deviation of the result. With rounding enabled the scale is
/// rounded to 2 decimals as well.
pub fn back_calculate<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    modes: &DMatrix<f64>,
    directions: &[Vector3<f64>],
    signal: &[f64],
    options: &AnalysisOptions,
) -> Result<Analysis> {
    if modes.ncols() == 0 {
        return Err(HarmonicsError::invalid_param("modes", 0, "need at least one mode"));
    }
    let count = options.count.clamp(1, modes.ncols());

    let weights = project(signal, modes)?;
    let normalized = normalize(&weights, options.round);

    let (indices, diagnostics) = match options.selection {
        ModeSelection::MostSignificant => rank_significant(&normalized.weights, count),
        ModeSelection::First => ((0..count).collect(), Diagnostics::new()),
    };
    let selected = extract_weights(&normalized.weights, &indices)?;

    let scale = if options.round {
        round_to(normalized.scale, WEIGHT_DECIMALS)
    } else {
        normalized.scale
    };

    let rms = rms(mesh, modes, &indices, &selected, scale, directions, signal)?;
    log::debug!(
        "back-calculated {} modes, scale {:.4}, rms {:.6}",
        indices.len(),
        scale,
        rms
    );

    Ok(Analysis {
        indices,
        weights: selected,
        scale,
        rms,
        diagnostics,
    })
}
