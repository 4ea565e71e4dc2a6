//! Classified diagnostics for recoverable conditions.
//!
//! Operations that can carry on after something unexpected (a partial set of
//! fixities, a weight vector of the wrong length, an exhausted calibration)
//! return their result together with a [`Diagnostics`] list. Every diagnostic
//! is also forwarded to the [`log`] facade at the matching level, so callers
//! that only watch the log still see it.
//!
//! # Example
//!
//! ```
//! use harmonics::diagnostic::{DiagnosticKind, Diagnostics, Severity};
//!
//! let mut diagnostics = Diagnostics::new();
//! diagnostics.remark(DiagnosticKind::ModeShortfall, "only 2 non-zero weights");
//!
//! assert_eq!(diagnostics.len(), 1);
//! assert!(diagnostics.contains(DiagnosticKind::ModeShortfall));
//! assert_eq!(diagnostics.iter().next().unwrap().severity, Severity::Remark);
//! ```

use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational; the result is usable as-is.
    Remark,
    /// A fallback was taken; the result is usable but not what was asked for.
    Warning,
    /// The result should not be trusted.
    Error,
}

/// The condition a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Input lengths disagreed and a fallback was substituted.
    DimensionMismatch,
    /// Only some of the requested fixed points matched mesh vertices.
    PartialFixity,
    /// The area calibration stopped at its iteration cap.
    IterationLimitReached,
    /// Fewer significant modes than requested were available.
    ModeShortfall,
    /// Morphing coefficients were malformed and replaced by all ones.
    InvalidCoefficientVector,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::DimensionMismatch => "dimension mismatch",
            DiagnosticKind::PartialFixity => "partial fixity",
            DiagnosticKind::IterationLimitReached => "iteration limit reached",
            DiagnosticKind::ModeShortfall => "mode shortfall",
            DiagnosticKind::InvalidCoefficientVector => "invalid coefficient vector",
        };
        f.write_str(name)
    }
}

/// A single classified message.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity class.
    pub severity: Severity,
    /// Which condition was hit.
    pub kind: DiagnosticKind,
    /// Human readable detail.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({}): {}", self.severity, self.kind, self.message)
    }
}

/// An ordered list of diagnostics produced by one operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and forward it to the log.
    pub fn push(&mut self, severity: Severity, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => log::error!("{}: {}", kind, message),
            Severity::Warning => log::warn!("{}: {}", kind, message),
            Severity::Remark => log::info!("{}: {}", kind, message),
        }
        self.entries.push(Diagnostic {
            severity,
            kind,
            message,
        });
    }

    /// Record a warning.
    pub fn warning(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Severity::Warning, kind, message);
    }

    /// Record a remark.
    pub fn remark(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Severity::Remark, kind, message);
    }

    /// Append every entry of `other`, keeping order. Entries are not logged again.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if a diagnostic of this kind was recorded.
    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }

    /// The most severe recorded level, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.entries.iter().map(|d| d.severity).max()
    }

    /// Iterate over recorded diagnostics in order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.entries.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
