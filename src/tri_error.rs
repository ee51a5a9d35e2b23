//! TriError: unified error type for normcore public APIs
//!
//! Every fallible operation in the crate returns `Result<_, TriError>`.
//! Check variants of mutation primitives never produce an error for a
//! failed precondition; they report `Ok(false)` instead.

use thiserror::Error;

/// Unified error type for triangulation and normal surface operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TriError {
    /// Malformed input (bad isomorphism signature, non-coprime lens space
    /// parameters, out-of-range matrix values, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The caller was responsible for a precondition that does not hold.
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),
    /// A mutation would re-glue or remove a locked simplex or facet.
    #[error("Lock violation: {0}")]
    LockViolation(String),
    /// An internal invariant failed.
    #[error("Impossible scenario: {0}")]
    ImpossibleScenario(String),
    /// A long-running operation was cancelled cooperatively.
    #[error("Operation cancelled")]
    Cancelled,
    /// The query is not implemented for this kind of input.
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    /// The SnapPea collaborator could not build a triangulation.
    #[error("SnapPea triangulation is null: {0}")]
    SnapPeaIsNull(String),
    /// The SnapPea collaborator hit a case it cannot solve.
    #[error("SnapPea unsolved case: {0}")]
    SnapPeaUnsolvedCase(String),
    /// Reading or writing an external format failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TriError {
    fn from(e: std::io::Error) -> Self {
        TriError::Io(e.to_string())
    }
}

impl TriError {
    /// True if this error came from cooperative cancellation.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TriError::Cancelled)
    }
}
