//! Enumerated lists of normal surfaces.
//!
//! [`NormalSurfaces::enumerate`] runs one of the enumerators in
//! [`crate::enumerate`] over the matching equations of a triangulation and
//! wraps every resulting vector as a [`NormalSurface`]. The list remembers
//! what was asked for and which algorithm actually ran.

use core::cmp::Ordering;
use core::fmt::{self, Debug, Formatter};
use core::ops::{BitOr, ControlFlow};
use std::io::Write;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::enumerate::{hilbert_basis, quad_to_standard, vertex_rays};
use crate::maths::integer::{Integer, LargeInteger};
use crate::maths::matrix::MatrixInt;
use crate::progress::ProgressTracker;
use crate::snappea::CuspSlopes;
use crate::surfaces::csv::{self, CsvFields};
use crate::surfaces::encoding::{NormalCoords, NormalEncoding};
use crate::surfaces::filter::SurfaceFilter;
use crate::surfaces::matching::{EmbeddedConstraints, make_embedded_constraints, make_matching_equations};
use crate::surfaces::NormalSurface;
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

// ---------------------------------------------------------------------------
// What to enumerate, and how
// ---------------------------------------------------------------------------

/// Which surfaces a list holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalList(u8);

impl NormalList {
    /// Extreme rays of the solution cone.
    pub const VERTEX: NormalList = NormalList(0x01);
    /// Hilbert basis of the solution cone.
    pub const FUNDAMENTAL: NormalList = NormalList(0x02);
    /// Only surfaces satisfying the quad-octagon constraints.
    pub const EMBEDDED_ONLY: NormalList = NormalList(0x04);
    /// Immersed and singular surfaces too.
    pub const IMMERSED_SINGULAR: NormalList = NormalList(0x08);

    #[inline]
    pub fn has(&self, flag: NormalList) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Fill in defaults and reject contradictions.
    fn resolve(self) -> Result<NormalList, TriError> {
        if self.has(Self::VERTEX | Self::FUNDAMENTAL) {
            return Err(TriError::InvalidArgument(
                "a list cannot be both vertex and fundamental".into(),
            ));
        }
        if self.has(Self::EMBEDDED_ONLY | Self::IMMERSED_SINGULAR) {
            return Err(TriError::InvalidArgument(
                "a list cannot be both embedded-only and immersed/singular".into(),
            ));
        }
        let mut out = self;
        if !out.has(Self::FUNDAMENTAL) {
            out = out | Self::VERTEX;
        }
        if !out.has(Self::IMMERSED_SINGULAR) {
            out = out | Self::EMBEDDED_ONLY;
        }
        Ok(out)
    }
}

impl Default for NormalList {
    fn default() -> Self {
        NormalList::VERTEX | NormalList::EMBEDDED_ONLY
    }
}

impl BitOr for NormalList {
    type Output = NormalList;

    fn bitor(self, rhs: NormalList) -> NormalList {
        NormalList(self.0 | rhs.0)
    }
}

/// Enumeration algorithms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalAlg {
    /// Double description, straight in the requested coordinates.
    #[default]
    DoubleDescription,
    /// Dual Hilbert basis completion. The only choice for fundamental lists.
    HilbertDual,
    /// Quad vertex enumeration followed by conversion. Standard embedded
    /// vertex lists on valid triangulations only; otherwise double
    /// description runs instead.
    QuadToStandard,
}

/// Tuning knobs for enumeration.
#[derive(Clone, Default)]
pub struct EnumerationConfig {
    /// Give up with `Cancelled` once double description holds more rays
    /// than this after some hyperplane.
    pub max_rays: Option<usize>,
    /// Cusp slopes, needed by the closed quad coordinate systems.
    pub slopes: Option<Arc<dyn CuspSlopes + Send + Sync>>,
}

impl Debug for EnumerationConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumerationConfig")
            .field("max_rays", &self.max_rays)
            .field("slopes", &self.slopes.as_ref().map(|_| "<cusp slopes>"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// The list
// ---------------------------------------------------------------------------

/// An enumerated list of surfaces, all in one triangulation and one
/// coordinate system, in lexicographic order of their vectors.
#[derive(Clone)]
pub struct NormalSurfaces {
    tri: Arc<Triangulation>,
    coords: NormalCoords,
    list: NormalList,
    alg: NormalAlg,
    slopes: Option<Arc<dyn CuspSlopes + Send + Sync>>,
    surfaces: Vec<NormalSurface>,
}

impl NormalSurfaces {
    /// Enumerate with the default configuration.
    ///
    /// # Errors
    /// `InvalidArgument` for contradictory flags or edge weight
    /// coordinates, `FailedPrecondition` for closed coordinates without
    /// cusp slopes, `Cancelled` from the tracker.
    pub fn enumerate(
        tri: impl Into<Arc<Triangulation>>,
        coords: NormalCoords,
        list: NormalList,
        alg: NormalAlg,
        tracker: Option<&ProgressTracker>,
    ) -> Result<Self, TriError> {
        Self::enumerate_with_config(tri, coords, list, alg, &EnumerationConfig::default(), tracker)
    }

    pub fn enumerate_with_config(
        tri: impl Into<Arc<Triangulation>>,
        coords: NormalCoords,
        list: NormalList,
        alg: NormalAlg,
        config: &EnumerationConfig,
        tracker: Option<&ProgressTracker>,
    ) -> Result<Self, TriError> {
        let tri = tri.into();
        let solved = solve(&tri, coords, list, alg, config, tracker)?;
        let enc = NormalEncoding::new(coords)?;
        let surfaces = solved
            .vectors
            .into_iter()
            .map(|v| NormalSurface::from_encoding(tri.clone(), enc, large(v)))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(t) = tracker {
            t.set_finished();
        }
        Ok(Self {
            tri,
            coords,
            list: solved.list,
            alg: solved.alg,
            slopes: config.slopes.clone(),
            surfaces,
        })
    }

    /// Hand each surface to `visit` as it is built, without keeping a list.
    /// Returns `Break` if `visit` stopped early.
    pub fn enumerate_with(
        tri: impl Into<Arc<Triangulation>>,
        coords: NormalCoords,
        list: NormalList,
        alg: NormalAlg,
        config: &EnumerationConfig,
        tracker: Option<&ProgressTracker>,
        mut visit: impl FnMut(NormalSurface) -> ControlFlow<()>,
    ) -> Result<ControlFlow<()>, TriError> {
        let tri = tri.into();
        let solved = solve(&tri, coords, list, alg, config, tracker)?;
        let enc = NormalEncoding::new(coords)?;
        for v in solved.vectors {
            let s = NormalSurface::from_encoding(tri.clone(), enc, large(v))?;
            if visit(s).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// A list holding exactly `surfaces`, which must all live in `tri` and
    /// use `coords`.
    pub fn from_surfaces(
        tri: Arc<Triangulation>,
        coords: NormalCoords,
        list: NormalList,
        surfaces: Vec<NormalSurface>,
    ) -> Result<Self, TriError> {
        let enc = NormalEncoding::new(coords)?;
        if let Some(bad) = surfaces
            .iter()
            .position(|s| !Arc::ptr_eq(s.triangulation(), &tri) || s.encoding() != enc)
        {
            return Err(TriError::InvalidArgument(format!(
                "surface {bad} does not belong to this triangulation and coordinate system"
            )));
        }
        Ok(Self {
            tri,
            coords,
            list,
            alg: NormalAlg::default(),
            slopes: None,
            surfaces,
        })
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    #[inline]
    pub fn triangulation(&self) -> &Arc<Triangulation> {
        &self.tri
    }

    #[inline]
    pub fn coords(&self) -> NormalCoords {
        self.coords
    }

    #[inline]
    pub fn list(&self) -> NormalList {
        self.list
    }

    /// The algorithm that actually ran.
    #[inline]
    pub fn algorithm(&self) -> NormalAlg {
        self.alg
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.surfaces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn surface(&self, i: usize) -> Result<&NormalSurface, TriError> {
        self.surfaces.get(i).ok_or_else(|| {
            TriError::InvalidArgument(format!("surface {i} out of range ({})", self.surfaces.len()))
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalSurface> {
        self.surfaces.iter()
    }

    /// The raw vector of every surface, in the list's coordinates.
    pub fn vectors(&self) -> impl Iterator<Item = &[LargeInteger]> + '_ {
        self.surfaces.iter().map(NormalSurface::vector)
    }

    pub fn sort_by(&mut self, compare: impl FnMut(&NormalSurface, &NormalSurface) -> Ordering) {
        self.surfaces.sort_by(compare);
    }

    /// The matching equations the surfaces were enumerated against.
    pub fn recreate_matching_equations(&self) -> Result<MatrixInt, TriError> {
        make_matching_equations(&self.tri, self.coords, slopes_ref(&self.slopes))
    }

    /// The surfaces `filter` accepts, as a new list.
    pub fn filter(&self, filter: &SurfaceFilter) -> NormalSurfaces {
        NormalSurfaces {
            surfaces: self.surfaces.iter().filter(|s| filter.accepts(s)).cloned().collect(),
            ..self.clone()
        }
    }

    pub fn write_csv_standard(&self, out: &mut impl Write, fields: CsvFields) -> Result<(), TriError> {
        csv::write_csv_standard(self, out, fields)
    }

    pub fn write_csv_edge_weight(&self, out: &mut impl Write, fields: CsvFields) -> Result<(), TriError> {
        csv::write_csv_edge_weight(self, out, fields)
    }
}

impl Debug for NormalSurfaces {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalSurfaces")
            .field("coords", &self.coords)
            .field("list", &self.list)
            .field("alg", &self.alg)
            .field("surfaces", &self.surfaces)
            .finish_non_exhaustive()
    }
}

impl<'a> IntoIterator for &'a NormalSurfaces {
    type Item = &'a NormalSurface;
    type IntoIter = std::slice::Iter<'a, NormalSurface>;

    fn into_iter(self) -> Self::IntoIter {
        self.surfaces.iter()
    }
}

impl core::ops::Index<usize> for NormalSurfaces {
    type Output = NormalSurface;

    fn index(&self, i: usize) -> &NormalSurface {
        &self.surfaces[i]
    }
}

// ---------------------------------------------------------------------------
// Running the enumerators
// ---------------------------------------------------------------------------

struct Solved {
    list: NormalList,
    alg: NormalAlg,
    vectors: Vec<Vec<Integer>>,
}

fn slopes_ref(slopes: &Option<Arc<dyn CuspSlopes + Send + Sync>>) -> Option<&dyn CuspSlopes> {
    slopes.as_deref().map(|s| s as &dyn CuspSlopes)
}

fn large(v: Vec<Integer>) -> Vec<LargeInteger> {
    v.into_iter().map(LargeInteger::Finite).collect()
}

fn constraints_for(tri: &Triangulation, coords: NormalCoords, list: NormalList) -> Result<EmbeddedConstraints, TriError> {
    if list.has(NormalList::EMBEDDED_ONLY) {
        make_embedded_constraints(tri, coords)
    } else {
        Ok(EmbeddedConstraints::none())
    }
}

fn solve(
    tri: &Triangulation,
    coords: NormalCoords,
    list: NormalList,
    alg: NormalAlg,
    config: &EnumerationConfig,
    tracker: Option<&ProgressTracker>,
) -> Result<Solved, TriError> {
    let list = list.resolve()?;
    NormalEncoding::new(coords)?;
    let eqns = make_matching_equations(tri, coords, slopes_ref(&config.slopes))?;
    let constraints = constraints_for(tri, coords, list)?;

    if list.has(NormalList::FUNDAMENTAL) {
        if alg != NormalAlg::HilbertDual {
            log::debug!("fundamental lists always use the dual Hilbert basis (asked for {alg:?})");
        }
        let vectors = hilbert_basis(&eqns, &constraints, tracker)?;
        return Ok(Solved {
            list,
            alg: NormalAlg::HilbertDual,
            vectors,
        });
    }

    let convertible =
        coords == NormalCoords::Standard && list.has(NormalList::EMBEDDED_ONLY) && tri.is_valid();
    if alg == NormalAlg::QuadToStandard && convertible {
        let quad_eqns = make_matching_equations(tri, NormalCoords::Quad, None)?;
        let quad_constraints = make_embedded_constraints(tri, NormalCoords::Quad)?;
        let quad = vertex_rays(&quad_eqns, &quad_constraints, config.max_rays, None)?;
        let vectors = quad_to_standard(tri, &quad, tracker)?;
        return Ok(Solved {
            list,
            alg: NormalAlg::QuadToStandard,
            vectors,
        });
    }
    if alg != NormalAlg::DoubleDescription {
        log::debug!("{alg:?} does not apply to this vertex list, using double description");
    }
    let vectors = vertex_rays(&eqns, &constraints, config.max_rays, tracker)?;
    Ok(Solved {
        list,
        alg: NormalAlg::DoubleDescription,
        vectors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surfaces::filter::PropertyFilter;
    use crate::triangulation::example;

    #[test]
    fn flags_resolve_to_defaults() {
        assert_eq!(NormalList::default().resolve().unwrap(), NormalList::default());
        let f = NormalList::FUNDAMENTAL.resolve().unwrap();
        assert!(f.has(NormalList::FUNDAMENTAL) && f.has(NormalList::EMBEDDED_ONLY));
        assert!(!f.has(NormalList::VERTEX));
        assert!((NormalList::VERTEX | NormalList::FUNDAMENTAL).resolve().is_err());
        assert!((NormalList::EMBEDDED_ONLY | NormalList::IMMERSED_SINGULAR).resolve().is_err());
    }

    #[test]
    fn algorithms_fall_back_when_they_do_not_apply() {
        let tri = Arc::new(example::twisted_kxi());
        let q2s = NormalSurfaces::enumerate(
            tri.clone(),
            NormalCoords::Standard,
            NormalList::default(),
            NormalAlg::QuadToStandard,
            None,
        )
        .unwrap();
        assert_eq!(q2s.algorithm(), NormalAlg::QuadToStandard);
        let dd = NormalSurfaces::enumerate(tri.clone(), NormalCoords::Standard, NormalList::default(), NormalAlg::default(), None)
            .unwrap();
        assert_eq!(dd.algorithm(), NormalAlg::DoubleDescription);
        assert_eq!(q2s.vectors().collect::<Vec<_>>(), dd.vectors().collect::<Vec<_>>());

        let quad = NormalSurfaces::enumerate(tri, NormalCoords::Quad, NormalList::default(), NormalAlg::QuadToStandard, None)
            .unwrap();
        assert_eq!(quad.algorithm(), NormalAlg::DoubleDescription);
        assert_eq!(quad.size(), 6);
    }

    #[test]
    fn fundamental_lists_contain_the_vertex_surfaces() {
        let tri = Arc::new(example::layered_loop(4, true));
        let vertex = NormalSurfaces::enumerate(tri.clone(), NormalCoords::Quad, NormalList::default(), NormalAlg::default(), None)
            .unwrap();
        let fund = NormalSurfaces::enumerate(tri, NormalCoords::Quad, NormalList::FUNDAMENTAL, NormalAlg::default(), None)
            .unwrap();
        assert_eq!((vertex.size(), fund.size()), (5, 7));
        assert_eq!(fund.algorithm(), NormalAlg::HilbertDual);
        assert!(vertex.iter().all(|v| fund.iter().any(|f| f == v)));
    }

    #[test]
    fn callbacks_can_stop_early() {
        let tri = Arc::new(example::twisted_kxi());
        let mut seen = 0;
        let flow = NormalSurfaces::enumerate_with(
            tri,
            NormalCoords::Standard,
            NormalList::default(),
            NormalAlg::default(),
            &EnumerationConfig::default(),
            None,
            |_| {
                seen += 1;
                if seen == 3 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
            },
        )
        .unwrap();
        assert_eq!(flow, ControlFlow::Break(()));
        assert_eq!(seen, 3);
    }

    #[test]
    fn lists_sort_filter_and_index() {
        let tri = Arc::new(example::twisted_kxi());
        let mut all = NormalSurfaces::enumerate(tri, NormalCoords::Standard, NormalList::default(), NormalAlg::default(), None)
            .unwrap();
        assert_eq!(all.size(), 8);
        assert!(all.surface(8).is_err());
        let eqns = all.recreate_matching_equations().unwrap();
        for s in &all {
            let v: Vec<Integer> = s.vector().iter().map(|x| x.finite().cloned().unwrap()).collect();
            assert!(eqns.apply(&v).unwrap().iter().all(Integer::is_zero));
        }

        let klein = all.filter(&PropertyFilter::default().euler([0]).orientable(false).into());
        assert_eq!(klein.size(), 4);
        assert!(klein.iter().all(|s| !s.is_vertex_linking()));
        let discs = all.filter(&PropertyFilter::default().euler([1]).into());
        assert_eq!(discs.size(), 1);
        assert!(discs[0].is_vertex_linking());

        all.sort_by(|a, b| b.vector().cmp(a.vector()));
        assert!(all[0].vector() >= all[1].vector());
    }

    #[test]
    fn edge_weights_and_missing_slopes_are_rejected() {
        let fig8 = Arc::new(example::figure_eight());
        for coords in [NormalCoords::EdgeWeight, NormalCoords::QuadClosed] {
            assert!(
                NormalSurfaces::enumerate(fig8.clone(), coords, NormalList::default(), NormalAlg::default(), None).is_err()
            );
        }
    }

    #[test]
    fn ray_limits_cancel() {
        let tri = Arc::new(example::poincare_homology_sphere());
        let config = EnumerationConfig {
            max_rays: Some(2),
            ..Default::default()
        };
        let r = NormalSurfaces::enumerate_with_config(
            tri,
            NormalCoords::Standard,
            NormalList::default(),
            NormalAlg::default(),
            &config,
            None,
        );
        assert_eq!(r.err(), Some(TriError::Cancelled));
        assert!(format!("{config:?}").contains("max_rays"));
    }
}
