//! Triangle measures shared by the Laplacian builder and the calibrator.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Point3, Vector3};

/// Angle at vertex `a` in triangle (a, b, c), in radians.
pub fn triangle_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let denom = ab.norm() * ac.norm();
    if denom < f64::EPSILON {
        return 0.0;
    }
    (ab.dot(&ac) / denom).clamp(-1.0, 1.0).acos()
}

/// Cotangent of the angle at vertex `a` in triangle (a, b, c).
///
/// Returns 0 for degenerate (zero-area) triangles.
pub fn cotangent_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let cross_norm = ab.cross(&ac).norm();
    if cross_norm < 1e-12 {
        0.0
    } else {
        ab.dot(&ac) / cross_norm
    }
}

/// Area of triangle (a, b, c).
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// Local index (0, 1, 2) of the corner whose angle is at least 90 degrees.
pub fn obtuse_corner(p: &[Point3<f64>; 3]) -> Option<usize> {
    (0..3).find(|&k| triangle_angle(&p[k], &p[(k + 1) % 3], &p[(k + 2) % 3]) >= FRAC_PI_2)
}

/// Voronoi region of corner `k` in a non-obtuse triangle:
/// `(|e_next|^2 cot(angle at prev) + |e_prev|^2 cot(angle at next)) / 8`.
pub fn voronoi_corner_area(p: &[Point3<f64>; 3], k: usize) -> f64 {
    let vertex = &p[k];
    let next = &p[(k + 1) % 3];
    let prev = &p[(k + 2) % 3];

    let cot_prev = cotangent_angle(prev, vertex, next);
    let cot_next = cotangent_angle(next, vertex, prev);

    0.125 * ((next - vertex).norm_squared() * cot_prev + (prev - vertex).norm_squared() * cot_next)
}

/// Round to a fixed number of decimals, halves to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Unit vector along `v`, or zero if `v` has no usable length.
pub fn unit_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
}
