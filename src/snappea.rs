//! The narrow interface to a SnapPea-style cusp solver.
//!
//! Closed-surface quad coordinates and spun-surface boundary slopes need
//! the meridian and longitude of every cusp, expressed as linear functionals
//! on quad coordinates. Computing those needs hyperbolic shape data, which
//! lives outside this crate; callers supply it through [`CuspSlopes`].

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::maths::matrix::MatrixInt;
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

/// Source of cusp slope equations for an ideal triangulation.
pub trait CuspSlopes {
    /// Two rows per cusp (meridian, then longitude) over the `3n` quad
    /// columns. Cusps are numbered by increasing vertex index.
    fn slope_equations(&self, tri: &Triangulation) -> Result<MatrixInt, TriError>;
}

/// Slope equations recorded ahead of time, e.g. from an earlier SnapPea
/// session on the same labelled triangulation.
#[derive(Clone, Debug)]
pub struct SlopeMatrix {
    equations: MatrixInt,
}

impl SlopeMatrix {
    pub fn new(equations: MatrixInt) -> Self {
        Self { equations }
    }
}

impl CuspSlopes for SlopeMatrix {
    fn slope_equations(&self, tri: &Triangulation) -> Result<MatrixInt, TriError> {
        if tri.is_empty() {
            return Err(TriError::SnapPeaIsNull("empty triangulation".into()));
        }
        let cusps = cusp_vertices(tri);
        if self.equations.columns() != 3 * tri.size() || self.equations.rows() != 2 * cusps.len() {
            return Err(TriError::SnapPeaUnsolvedCase(format!(
                "recorded slopes are {}x{}, triangulation needs {}x{}",
                self.equations.rows(),
                self.equations.columns(),
                2 * cusps.len(),
                3 * tri.size()
            )));
        }
        Ok(self.equations.clone())
    }
}

/// Ideal vertices with torus or Klein bottle links, in index order.
pub fn cusp_vertices(tri: &Triangulation) -> Vec<usize> {
    tri.skeleton()
        .vertices
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_ideal())
        .map(|(i, _)| i)
        .collect()
}

/// Slope equations from `slopes`, validated against `tri`.
pub(crate) fn checked_slopes(tri: &Triangulation, slopes: &dyn CuspSlopes) -> Result<MatrixInt, TriError> {
    let m = slopes.slope_equations(tri)?;
    let cusps = cusp_vertices(tri).len();
    if m.columns() != 3 * tri.size() || m.rows() != 2 * cusps {
        return Err(TriError::InvalidArgument(format!(
            "slope equations are {}x{}, expected {}x{}",
            m.rows(),
            m.columns(),
            2 * cusps,
            3 * tri.size()
        )));
    }
    Ok(m)
}

// ---------------------------------------------------------------------------
// Kernel diagnostics flag (process-wide)
// ---------------------------------------------------------------------------

static KERNEL_MESSAGES: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(false));

/// Whether the SnapPea kernel should print diagnostic messages.
pub fn kernel_messages() -> bool {
    *KERNEL_MESSAGES.lock()
}

/// Turn SnapPea kernel diagnostics on or off for the whole process.
pub fn set_kernel_messages(enabled: bool) {
    *KERNEL_MESSAGES.lock() = enabled;
    log::debug!("SnapPea kernel messages {}", if enabled { "enabled" } else { "disabled" });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::example;
    use serial_test::serial;

    #[test]
    #[serial]
    fn kernel_flag_round_trips() {
        let before = kernel_messages();
        set_kernel_messages(true);
        assert!(kernel_messages());
        set_kernel_messages(false);
        assert!(!kernel_messages());
        set_kernel_messages(before);
    }

    #[test]
    fn recorded_slopes_are_validated() {
        let fig8 = example::figure_eight();
        assert_eq!(cusp_vertices(&fig8), vec![0]);
        let good = SlopeMatrix::new(MatrixInt::new(2, 6));
        assert!(good.slope_equations(&fig8).is_ok());
        let bad = SlopeMatrix::new(MatrixInt::new(2, 3));
        assert!(matches!(bad.slope_equations(&fig8), Err(TriError::SnapPeaUnsolvedCase(_))));
        assert!(matches!(
            good.slope_equations(&Triangulation::new()),
            Err(TriError::SnapPeaIsNull(_))
        ));
        assert!(cusp_vertices(&example::poincare_homology_sphere()).is_empty());
    }
}
