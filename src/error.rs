//! Error types for harmonics.
//!
//! Hard failures are reported through [`HarmonicsError`]. Conditions an
//! operation can recover from (partial fixities, truncated mode selections,
//! iteration caps) are reported as [`crate::diagnostic::Diagnostic`]s instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`HarmonicsError`].
pub type Result<T> = std::result::Result<T, HarmonicsError>;

/// Errors that can occur while building meshes or running spectral operations.
#[derive(Error, Debug)]
pub enum HarmonicsError {
    /// The mesh has no faces (or the operator has no rows).
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has fewer than three vertices or repeats a vertex.
    #[error("face {face} is degenerate (fewer than 3 distinct vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A directed edge is used by more than one face.
    #[error("edge ({v0}, {v1}) is used twice with the same orientation")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// Two separate face fans meet at a single vertex.
    #[error("vertex {vertex} joins more than one face fan")]
    NonManifoldVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// The operation needs a different face structure (e.g. triangles only).
    #[error("invalid topology: {reason}")]
    InvalidTopology {
        /// What the operation expected.
        reason: String,
    },

    /// Two inputs that must agree in length or shape do not.
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Which input was checked.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        found: usize,
    },

    /// None of the requested fixed points coincide with a mesh vertex.
    #[error("none of the {requested} fixed points match a mesh vertex")]
    NoFixedVerticesFound {
        /// Number of fixed points supplied.
        requested: usize,
    },

    /// The signal source could not produce a distance for a vertex.
    #[error("no signal value for vertex {vertex}")]
    SignalUnavailable {
        /// The vertex index.
        vertex: usize,
    },

    /// Geometry is too degenerate for the requested measure.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl HarmonicsError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        HarmonicsError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a dimension mismatch error.
    pub fn mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        HarmonicsError::DimensionMismatch {
            what,
            expected,
            found,
        }
    }

    /// Fail unless `found == expected`.
    pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::mismatch(what, expected, found))
        }
    }
}
