//! Compressing discs and incompressibility.
//!
//! Both tests work by cutting along the surface and looking at what is
//! left. They are sufficient-evidence checks: a `true` from
//! [`NormalSurface::is_incompressible`] means no compressing disc turned
//! up among the standard vertex surfaces of either side.

use crate::surfaces::NormalSurface;
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

/// Real boundary components with Euler characteristic 2.
fn count_boundary_spheres(tri: &Triangulation) -> usize {
    tri.skeleton()
        .boundary_components
        .iter()
        .filter(|bc| bc.is_real() && bc.euler_char() == 2)
        .count()
}

impl NormalSurface {
    /// True if this surface is a compressing disc: a properly embedded disc
    /// whose boundary does not bound a disc in the boundary of the
    /// manifold.
    ///
    /// With `known_connected`, the connectivity check is skipped.
    pub fn is_compressing_disc(&self, known_connected: bool) -> Result<bool, TriError> {
        if !self.is_compact() || !self.has_real_boundary() {
            return Ok(false);
        }
        if self.euler_char()? != 1 {
            return Ok(false);
        }
        if !known_connected && !self.is_connected()? {
            return Ok(false);
        }

        let before = self.tri.count_boundary_components();
        let spheres = count_boundary_spheres(&self.tri);
        let cut = self.cut_along()?;
        // A disc whose boundary does not separate its boundary component
        // leaves the component count unchanged.
        if cut.count_boundary_components() == before {
            return Ok(true);
        }
        // Otherwise the disc is trivial exactly when one side of its
        // boundary curve is a disc, which shows up as a new sphere.
        Ok(count_boundary_spheres(&cut) == spheres)
    }

    /// True if this closed surface is incompressible.
    ///
    /// Spheres, projective planes and thin edge links are always reported
    /// compressible. Otherwise the triangulation is cut along the surface
    /// and every piece with boundary is searched for a compressing disc.
    ///
    /// # Errors
    /// `FailedPrecondition` unless the surface is compact and connected and
    /// the triangulation is valid and closed.
    pub fn is_incompressible(&self) -> Result<bool, TriError> {
        self.require_compact("incompressibility test")?;
        if !self.tri.is_valid() || !self.tri.is_closed() {
            return Err(TriError::FailedPrecondition(
                "incompressibility needs a valid closed triangulation".into(),
            ));
        }
        if !self.is_connected()? {
            return Err(TriError::FailedPrecondition(
                "incompressibility is only tested for connected surfaces".into(),
            ));
        }

        let chi = self.euler_char()?;
        if chi == 2 || (chi == 1 && !self.is_two_sided()?) {
            return Ok(false);
        }
        if self.is_thin_edge_link().0.is_some() {
            return Ok(false);
        }

        let mut cut = self.cut_along()?;
        cut.simplify()?;
        for piece in cut.split_into_components() {
            if piece.has_boundary_triangles() && piece.has_compressing_disc()? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::maths::integer::Integer;
    use crate::surfaces::{NormalAlg, NormalCoords, NormalList, NormalSurfaces};
    use crate::triangulation::example;

    fn std_surface(tri: &Arc<Triangulation>, v: &[i64]) -> NormalSurface {
        NormalSurface::from_integers(tri.clone(), NormalCoords::Standard, v.iter().map(|&x| Integer::new(x)).collect())
            .unwrap()
    }

    #[test]
    fn meridian_discs_compress() {
        let tri = Arc::new(example::lst(1, 2).unwrap());
        let meridian = std_surface(&tri, &[1, 1, 0, 0, 0, 0, 1]);
        assert!(meridian.is_compressing_disc(false).unwrap());
        let link = std_surface(&tri, &[1, 1, 1, 1, 0, 0, 0]);
        assert!(!link.is_compressing_disc(true).unwrap());
    }

    #[test]
    fn discs_in_a_ball_never_compress() {
        let tri = Arc::new(example::ball());
        let list = NormalSurfaces::enumerate(tri, NormalCoords::Standard, NormalList::default(), NormalAlg::default(), None)
            .unwrap();
        assert_eq!(list.size(), 7);
        for s in &list {
            assert!(!s.is_compressing_disc(false).unwrap());
        }
    }

    #[test]
    fn closed_surfaces_are_not_discs() {
        let tri = Arc::new(example::poincare_homology_sphere());
        let link = NormalSurface::vertex_link(tri, 0).unwrap();
        assert!(!link.is_compressing_disc(false).unwrap());
        assert!(!link.is_incompressible().unwrap());
    }

    #[test]
    fn incompressibility_needs_a_closed_triangulation() {
        let tri = Arc::new(example::twisted_kxi());
        let link = NormalSurface::vertex_link(tri, 0).unwrap();
        assert!(matches!(link.is_incompressible(), Err(TriError::FailedPrecondition(_))));
    }
}
