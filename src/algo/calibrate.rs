//! Area calibration of a modal state.
//!
//! Given a reference ("target") state and an edited ("new") state, the
//! calibrator walks the new state towards or away from the target until the
//! synthesized surface area deviates from the target area by a requested
//! percentage. The walk is a step-halving line search on a single travel
//! factor: each weight moves by `|w_target - w_new| * factor` in the direction
//! of its own sign, and the scale by `|s_target - s_new| * factor`.
//!
//! Deviations are compared after rounding to one decimal, so the search stops
//! as soon as the rounded percentage equals the requested one.

use nalgebra::{DMatrix, Vector3};

use crate::algo::geometry::round_to;
use crate::algo::synthesis::ModalState;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::error::{HarmonicsError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Options for [`calibrate_area`].
#[derive(Debug, Clone)]
pub struct CalibrationOptions {
    /// Upper bound on search iterations.
    pub max_iterations: usize,
    /// First change applied to the travel factor.
    pub initial_step: f64,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            initial_step: 0.1,
        }
    }
}

impl CalibrationOptions {
    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the initial step of the travel factor.
    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }
}

/// Result of [`calibrate_area`].
#[derive(Debug, Clone)]
pub struct Calibration<I: MeshIndex = u32> {
    /// The calibrated mesh.
    pub mesh: HalfEdgeMesh<I>,
    /// Surface area of `mesh`.
    pub area: f64,
    /// Area deviation from the target in percent, as last compared.
    pub deviation: f64,
    /// Calibrated weights, within `[-1, 1]`.
    pub weights: Vec<f64>,
    /// Calibrated scale.
    pub scale: f64,
    /// Search iterations performed.
    pub iterations: usize,
    /// Whether the requested deviation was reached.
    pub converged: bool,
    /// Iteration cap remarks.
    pub diagnostics: Diagnostics,
}

/// Adjust `new` until its area deviates from the area of `target` by
/// `percentage` percent (rounded to one decimal).
///
/// # Errors
/// - [`HarmonicsError::InvalidTopology`] if the mesh is not all triangles
/// - [`HarmonicsError::DimensionMismatch`] if weight, mode or direction counts disagree
/// - [`HarmonicsError::DegenerateGeometry`] if the target shape has no area
pub fn calibrate_area<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    modes: &DMatrix<f64>,
    directions: &[Vector3<f64>],
    target: &ModalState,
    new: &ModalState,
    percentage: f64,
    options: &CalibrationOptions,
) -> Result<Calibration<I>> {
    if !mesh.is_triangle_mesh() {
        return Err(HarmonicsError::InvalidTopology {
            reason: "area calibration requires a triangle mesh".to_string(),
        });
    }
    HarmonicsError::check_len("new weights", target.weights.len(), new.weights.len())?;

    let area_target = target.apply(mesh, modes, directions)?.surface_area();
    if area_target <= 0.0 {
        return Err(HarmonicsError::DegenerateGeometry(
            "target shape has zero surface area".to_string(),
        ));
    }

    let p = round_to(percentage, 1);
    let mut current = new.apply(mesh, modes, directions)?;
    let mut area = current.surface_area();
    let mut deviation = (100.0 * (area - area_target) / area_target).round_ties_even();
    let mut state = new.clone();

    let mut factor = 0.0;
    let mut step = options.initial_step;
    let mut reverse = 1.0;
    if deviation > p {
        step = -step;
        reverse = -1.0;
    }

    let mut iterations = 0;
    while deviation != p && iterations < options.max_iterations {
        factor += step;
        state = adjusted_state(target, new, factor);

        current = state.apply(mesh, modes, directions)?;
        area = current.surface_area();
        deviation = round_to(100.0 * (area - area_target) / area_target, 1);

        if deviation * reverse > p * reverse {
            factor -= step;
            step /= 2.0;
        }
        iterations += 1;
        log::trace!(
            "calibration step {}: factor {:.6}, deviation {}%",
            iterations,
            factor,
            deviation
        );
    }

    let converged = deviation == p;
    let mut diagnostics = Diagnostics::new();
    if !converged {
        diagnostics.remark(
            DiagnosticKind::IterationLimitReached,
            format!(
                "stopped after {} iterations at {}% instead of {}%",
                iterations, deviation, p
            ),
        );
    }

    let ModalState { mut weights, mut scale } = state;
    let peak = weights
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, &w| match acc {
            Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
            None => Some((w, w)),
        })
        .map(|(lo, hi)| if lo.abs() > hi { lo.abs() } else { hi })
        .unwrap_or(0.0);
    if peak > 1.0 {
        weights.iter_mut().for_each(|w| *w /= peak);
        scale *= peak;
    }

    log::debug!(
        "calibrated area {:.6} ({}% from target) in {} iterations",
        area,
        deviation,
        iterations
    );

    Ok(Calibration {
        mesh: current,
        area,
        deviation,
        weights,
        scale,
        iterations,
        converged,
        diagnostics,
    })
}

fn adjusted_state(target: &ModalState, new: &ModalState, factor: f64) -> ModalState {
    let weights = target
        .weights
        .iter()
        .zip(&new.weights)
        .map(|(&t, &w)| {
            let travel = (t - w).abs() * factor;
            if w < 0.0 {
                w - travel
            } else {
                w + travel
            }
        })
        .collect();
    let scale = new.scale + (target.scale - new.scale).abs() * factor;
    ModalState::new(weights, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_polygons, build_from_triangles};
    use nalgebra::Point3;
    use std::f64::consts::PI;

    /// 4 x 4 flat grid with a single sine bump mode vanishing on the border.
    fn bump_setup() -> (HalfEdgeMesh, DMatrix<f64>, Vec<Vector3<f64>>) {
        let n = 4;
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
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let bump: Vec<f64> = vertices
            .iter()
            .map(|p| (PI * p.x / n as f64).sin() * (PI * p.y / n as f64).sin())
            .collect();
        let modes = DMatrix::from_column_slice(bump.len(), 1, &bump);
        let directions = vec![Vector3::z(); bump.len()];
        (mesh, modes, directions)
    }

    #[test]
    fn test_shrinks_towards_target() {
        let (mesh, modes, directions) = bump_setup();
        let flat = ModalState::new(vec![1.0], 0.0);
        let bumped = ModalState::new(vec![1.0], 1.0);

        // The full bump adds about 13.5% area
        let result = calibrate_area(
            &mesh,
            &modes,
            &directions,
            &flat,
            &bumped,
            2.0,
            &CalibrationOptions::default(),
        )
        .unwrap();

        assert!(result.converged);
        assert!((result.deviation - 2.0).abs() < 0.1);
        assert!((result.area / 16.0 - 1.02).abs() < 0.001);
        assert!(result.scale > 0.0 && result.scale < 1.0);
        assert_eq!(result.weights, vec![1.0]);
        assert!(result.diagnostics.is_empty());
        assert!((result.mesh.surface_area() - result.area).abs() < 1e-12);
    }

    #[test]
    fn test_already_calibrated() {
        let (mesh, modes, directions) = bump_setup();
        let flat = ModalState::new(vec![1.0], 0.0);
        let bumped = ModalState::new(vec![1.0], 1.0);

        let result = calibrate_area(
            &mesh,
            &modes,
            &directions,
            &flat,
            &bumped,
            13.0,
            &CalibrationOptions::default(),
        )
        .unwrap();

        assert_eq!(result.iterations, 0);
        assert!(result.converged);
        assert_eq!(result.scale, 1.0);
    }

    #[test]
    fn test_grows_and_renormalizes() {
        let (mesh, modes, directions) = bump_setup();
        let target = ModalState::new(vec![0.5], 1.0);
        let new = ModalState::new(vec![1.0], 1.0);

        let result = calibrate_area(
            &mesh,
            &modes,
            &directions,
            &target,
            &new,
            30.0,
            &CalibrationOptions::default(),
        )
        .unwrap();

        assert!(result.converged);
        assert!((result.deviation - 30.0).abs() < 0.1);
        // The weight grew past 1 and was folded into the scale
        assert!((result.weights[0] - 1.0).abs() < 1e-12);
        assert!(result.scale > 1.0);
    }

    #[test]
    fn test_iteration_cap() {
        let (mesh, modes, directions) = bump_setup();
        let flat = ModalState::new(vec![1.0], 0.0);
        let bumped = ModalState::new(vec![1.0], 1.0);

        let result = calibrate_area(
            &mesh,
            &modes,
            &directions,
            &flat,
            &bumped,
            1.0,
            &CalibrationOptions::default().with_max_iterations(2),
        )
        .unwrap();

        assert_eq!(result.iterations, 2);
        assert!(!result.converged);
        assert!(result.diagnostics.contains(DiagnosticKind::IterationLimitReached));
    }

    #[test]
    fn test_rejects_polygons_and_degenerate_targets() {
        let square = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let quad: HalfEdgeMesh = build_from_polygons(&square, &[vec![0, 1, 2, 3]]).unwrap();
        let modes = DMatrix::from_element(4, 1, 0.5);
        let state = ModalState::new(vec![1.0], 1.0);
        assert!(matches!(
            calibrate_area(&quad, &modes, &[Vector3::z(); 4], &state, &state, 1.0, &Default::default()),
            Err(HarmonicsError::InvalidTopology { .. })
        ));

        let line = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let sliver: HalfEdgeMesh = build_from_triangles(&line, &[[0, 1, 2]]).unwrap();
        let modes = DMatrix::from_element(3, 1, 1.0);
        let flat = ModalState::new(vec![1.0], 0.0);
        assert!(matches!(
            calibrate_area(&sliver, &modes, &[Vector3::z(); 3], &flat, &state, 1.0, &Default::default()),
            Err(HarmonicsError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_weight_count_mismatch() {
        let (mesh, modes, directions) = bump_setup();
        let target = ModalState::new(vec![1.0], 0.0);
        let new = ModalState::new(vec![1.0, 0.5], 1.0);
        assert!(matches!(
            calibrate_area(&mesh, &modes, &directions, &target, &new, 1.0, &Default::default()),
            Err(HarmonicsError::DimensionMismatch { .. })
        ));
    }
}
