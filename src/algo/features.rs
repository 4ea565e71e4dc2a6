//! Peak and trough counts of vibration modes.
//!
//! A vertex is a *local* peak of a mode when its nodal value is strictly
//! larger than the value of every 1-ring neighbour, and a *global* peak when
//! it also beats every vertex of its 2-ring. Troughs are the same with the
//! comparison reversed. Values are rounded to 3 decimals before comparing, so
//! near-flat regions produce ties, and ties never count.
//!
//! Global extrema are a subset of local extrema, and `local` counts both.

use std::fmt;

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::algo::geometry::round_to;
use crate::error::{HarmonicsError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

const VALUE_DECIMALS: i32 = 3;

/// Peak or trough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    /// Strictly above the neighbourhood.
    Peak,
    /// Strictly below the neighbourhood.
    Trough,
}

/// Number of global and local extrema of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtremumCount {
    /// Extrema over the 1-ring and the 2-ring.
    pub global: usize,
    /// Extrema over the 1-ring.
    pub local: usize,
}

impl fmt::Display for ExtremumCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "global: {}, local: {}", self.global, self.local)
    }
}

/// Peak and trough counts of one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeFeatures {
    /// Peak counts.
    pub peaks: ExtremumCount,
    /// Trough counts.
    pub troughs: ExtremumCount,
}

/// Vertices that are extrema of a scalar field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extrema {
    /// Vertices that dominate their 1-ring and 2-ring.
    pub global: Vec<usize>,
    /// Vertices that dominate their 1-ring (includes `global`).
    pub local: Vec<usize>,
}

impl Extrema {
    /// Counts of both sets.
    pub fn count(&self) -> ExtremumCount {
        ExtremumCount {
            global: self.global.len(),
            local: self.local.len(),
        }
    }
}

/// Cached 1-ring and 2-ring neighbourhoods.
#[derive(Debug, Clone)]
pub struct VertexRings {
    one: Vec<Vec<usize>>,
    two: Vec<Vec<usize>>,
}

impl VertexRings {
    /// Collect the rings of every vertex.
    ///
    /// The 2-ring holds each neighbour-of-a-neighbour once, excluding the
    /// vertex itself and its 1-ring.
    pub fn new<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Self {
        let one: Vec<Vec<usize>> = mesh
            .vertex_ids()
            .map(|v| mesh.vertex_neighbors(v).map(|n| n.index()).collect())
            .collect();

        let two = one
            .iter()
            .enumerate()
            .map(|(i, ring)| {
                let mut second = Vec::new();
                for &k in ring {
                    for &m in &one[k] {
                        if m != i && !ring.contains(&m) && !second.contains(&m) {
                            second.push(m);
                        }
                    }
                }
                second
            })
            .collect();

        Self { one, two }
    }

    /// Number of vertices covered.
    pub fn len(&self) -> usize {
        self.one.len()
    }

    /// True if there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.one.is_empty()
    }

    /// 1-ring of vertex `i`.
    pub fn one_ring(&self, i: usize) -> &[usize] {
        &self.one[i]
    }

    /// 2-ring of vertex `i`.
    pub fn two_ring(&self, i: usize) -> &[usize] {
        &self.two[i]
    }
}

/// Extrema of a per-vertex field.
///
/// # Errors
/// [`HarmonicsError::DimensionMismatch`] if `values` does not have one entry per vertex.
pub fn find_extrema(rings: &VertexRings, values: &[f64], kind: Extremum) -> Result<Extrema> {
    HarmonicsError::check_len("values", rings.len(), values.len())?;

    let sign = match kind {
        Extremum::Peak => 1.0,
        Extremum::Trough => -1.0,
    };
    let rounded: Vec<f64> = values
        .iter()
        .map(|&v| sign * round_to(v, VALUE_DECIMALS))
        .collect();
    let dominates = |i: usize, ring: &[usize]| ring.iter().all(|&j| rounded[i] > rounded[j]);

    let mut extrema = Extrema::default();
    for i in 0..rings.len() {
        let ring = rings.one_ring(i);
        if ring.is_empty() || !dominates(i, ring) {
            continue;
        }
        extrema.local.push(i);
        if dominates(i, rings.two_ring(i)) {
            extrema.global.push(i);
        }
    }
    Ok(extrema)
}

/// Peak and trough counts for every mode column, modes processed in parallel.
///
/// # Errors
/// [`HarmonicsError::DimensionMismatch`] if the mode rows differ from the vertex count.
pub fn mode_features<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    modes: &DMatrix<f64>,
) -> Result<Vec<ModeFeatures>> {
    HarmonicsError::check_len("mode rows", mesh.num_vertices(), modes.nrows())?;
    let rings = VertexRings::new(mesh);
    (0..modes.ncols())
        .into_par_iter()
        .map(|mode| features_of(&rings, modes, mode))
        .collect()
}

/// Single-threaded [`mode_features`].
pub fn mode_features_sequential<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    modes: &DMatrix<f64>,
) -> Result<Vec<ModeFeatures>> {
    HarmonicsError::check_len("mode rows", mesh.num_vertices(), modes.nrows())?;
    let rings = VertexRings::new(mesh);
    (0..modes.ncols())
        .map(|mode| features_of(&rings, modes, mode))
        .collect()
}

fn features_of(rings: &VertexRings, modes: &DMatrix<f64>, mode: usize) -> Result<ModeFeatures> {
    let values: Vec<f64> = modes.column(mode).iter().copied().collect();
    Ok(ModeFeatures {
        peaks: find_extrema(rings, &values, Extremum::Peak)?.count(),
        troughs: find_extrema(rings, &values, Extremum::Trough)?.count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::laplacian::graph_laplacian;
    use crate::algo::spectrum::decompose;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;
    use std::f64::consts::PI;

    fn create_grid(n: usize) -> HalfEdgeMesh {
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

    #[test]
    fn test_single_bump() {
        let mesh = create_grid(4);
        let bump: Vec<f64> = mesh
            .vertex_ids()
            .map(|v| {
                let p = mesh.position(v);
                (PI * p.x / 4.0).sin() * (PI * p.y / 4.0).sin()
            })
            .collect();
        let modes = DMatrix::from_column_slice(25, 1, &bump);

        let features = mode_features(&mesh, &modes).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].peaks, ExtremumCount { global: 1, local: 1 });
        // The zero border is all ties
        assert_eq!(features[0].troughs, ExtremumCount::default());

        let rings = VertexRings::new(&mesh);
        let peaks = find_extrema(&rings, &bump, Extremum::Peak).unwrap();
        assert_eq!(peaks.global, vec![12]);
    }

    #[test]
    fn test_local_but_not_global() {
        let mesh = create_grid(4);
        let mut values = vec![0.0; 25];
        values[6] = 0.5; // (1, 1)
        values[18] = 0.9; // (3, 3), in the 2-ring of (1, 1) via (2, 2)

        let rings = VertexRings::new(&mesh);
        assert!(rings.two_ring(6).contains(&18));

        let peaks = find_extrema(&rings, &values, Extremum::Peak).unwrap();
        assert_eq!(peaks.local, vec![6, 18]);
        assert_eq!(peaks.global, vec![18]);
        assert_eq!(peaks.count(), ExtremumCount { global: 1, local: 2 });

        let negated: Vec<f64> = values.iter().map(|v| -v).collect();
        let troughs = find_extrema(&rings, &negated, Extremum::Trough).unwrap();
        assert_eq!(troughs, peaks);
    }

    #[test]
    fn test_rounding_creates_ties() {
        let mesh = create_grid(2);
        let mut values = vec![0.0; 9];
        values[4] = 0.0004;

        let rings = VertexRings::new(&mesh);
        assert!(find_extrema(&rings, &values, Extremum::Peak).unwrap().local.is_empty());
        values[4] = 0.0006;
        assert_eq!(find_extrema(&rings, &values, Extremum::Peak).unwrap().local, vec![4]);
    }

    #[test]
    fn test_rings_exclude_center_and_one_ring() {
        let mesh = create_grid(3);
        let rings = VertexRings::new(&mesh);
        for i in 0..rings.len() {
            let one = rings.one_ring(i);
            let two = rings.two_ring(i);
            assert!(!two.contains(&i));
            assert!(two.iter().all(|j| !one.contains(j)));
            let mut dedup = two.to_vec();
            dedup.sort_unstable();
            dedup.dedup();
            assert_eq!(dedup.len(), two.len());
        }
    }

    #[test]
    fn test_peaks_and_troughs_are_disjoint() {
        let mesh = create_grid(4);
        let spectrum = decompose(&graph_laplacian(&mesh), 10).unwrap();
        let rings = VertexRings::new(&mesh);

        for column in spectrum.eigenvectors.column_iter() {
            let values: Vec<f64> = column.iter().copied().collect();
            let peaks = find_extrema(&rings, &values, Extremum::Peak).unwrap();
            let troughs = find_extrema(&rings, &values, Extremum::Trough).unwrap();
            assert!(peaks.global.iter().all(|v| !troughs.global.contains(v)));
            assert!(peaks.local.iter().all(|v| !troughs.local.contains(v)));
        }

        let parallel = mode_features(&mesh, &spectrum.eigenvectors).unwrap();
        let sequential = mode_features_sequential(&mesh, &spectrum.eigenvectors).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_isolated_vertex_is_skipped() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 5.0, 5.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let modes = DMatrix::from_column_slice(4, 1, &[0.1, 0.2, 0.3, 9.0]);

        let features = mode_features_sequential(&mesh, &modes).unwrap();
        assert_eq!(features[0].peaks, ExtremumCount { global: 1, local: 1 });
        assert_eq!(features[0].troughs, ExtremumCount { global: 1, local: 1 });
    }
}
