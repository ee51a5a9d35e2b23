//! Structural self-checks for triangulations and surfaces.
//!
//! `validate_invariants` is always available. `debug_assert_invariants`
//! only does work in debug builds or with the `strict-invariants` /
//! `check-invariants` features, so it can sit on hot mutation paths.

use crate::tri_error::TriError;

pub trait DebugInvariants {
    /// Short name used in panic messages.
    const KIND: &'static str;

    /// Check the invariants and report the first violation.
    fn validate_invariants(&self) -> Result<(), TriError>;

    /// Panic on a violated invariant when checking is enabled.
    #[inline]
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), Self::KIND);
    }
}

/// Run a fallible check and panic with context when invariant checking is
/// compiled in. Expands to nothing otherwise.
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $kind:expr) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $check {
            panic!("[invariants] {} broken: {}", $kind, e);
        }
    };
}
