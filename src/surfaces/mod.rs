//! Normal and almost normal surfaces.
//!
//! A [`NormalSurface`] is a vector of disc counts in some
//! [`NormalEncoding`], tied to the triangulation it lives in. Every query
//! works from the vector alone, cross-referencing the skeleton: nothing is
//! ever realised geometrically except by [`NormalSurface::cut_along`] and
//! [`NormalSurface::crush`].
//!
//! Internally each surface also keeps its coordinates in the full
//! ten-per-tetrahedron layout (triangles, quads, octagons), with triangle
//! coordinates reconstructed when the encoding does not store them. Spun
//! surfaces carry infinite triangle coordinates around their cusps.

pub mod compress;
pub mod crush;
pub mod csv;
pub mod cut;
pub(crate) mod disc;
pub mod encoding;
pub mod filter;
pub mod links;
pub mod list;
pub mod matching;
pub mod tables;

use std::ops::Add;
use std::sync::Arc;

use itertools::iproduct;
use once_cell::sync::OnceCell;

use crate::debug_invariants::DebugInvariants;
use crate::maths::integer::{Integer, LargeInteger};
use crate::maths::matrix::MatrixInt;
use crate::snappea::{CuspSlopes, checked_slopes, cusp_vertices};
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

use disc::{DISC_TYPES, DiscGraph, DiscSummary};
use tables::{QUAD_MEETING, QUAD_SEPARATING};

pub use csv::{CsvFields, CsvRow, read_csv_standard};
pub use encoding::{NormalCoords, NormalEncoding};
pub use filter::{PropertyFilter, SurfaceFilter};
pub use list::{EnumerationConfig, NormalAlg, NormalList, NormalSurfaces};

/// Layout of the internal full vector.
#[inline]
fn full_encoding() -> NormalEncoding {
    NormalEncoding::STORES_TRIANGLES | NormalEncoding::STORES_OCTAGONS
}

#[derive(Clone, Debug, Default)]
struct SurfaceCache {
    euler: OnceCell<Integer>,
    discs: OnceCell<DiscSummary>,
    real_boundary: OnceCell<bool>,
    boundaries: OnceCell<usize>,
}

/// A normal or almost normal surface in a fixed triangulation.
#[derive(Clone, Debug)]
pub struct NormalSurface {
    tri: Arc<Triangulation>,
    enc: NormalEncoding,
    vector: Vec<LargeInteger>,
    full: Vec<LargeInteger>,
    name: String,
    cache: SurfaceCache,
}

impl NormalSurface {
    /// A surface from a vector laid out for `coords`.
    ///
    /// # Errors
    /// `InvalidArgument` if the length is wrong, an entry is negative, or a
    /// quad or octagon coordinate is infinite.
    pub fn new(
        tri: impl Into<Arc<Triangulation>>,
        coords: NormalCoords,
        vector: Vec<LargeInteger>,
    ) -> Result<Self, TriError> {
        Self::from_encoding(tri.into(), NormalEncoding::new(coords)?, vector)
    }

    /// As [`NormalSurface::new`], from finite integers.
    pub fn from_integers(
        tri: impl Into<Arc<Triangulation>>,
        coords: NormalCoords,
        vector: Vec<Integer>,
    ) -> Result<Self, TriError> {
        Self::new(tri, coords, vector.into_iter().map(LargeInteger::Finite).collect())
    }

    pub(crate) fn from_encoding(
        tri: Arc<Triangulation>,
        enc: NormalEncoding,
        vector: Vec<LargeInteger>,
    ) -> Result<Self, TriError> {
        let b = enc.block_size();
        if vector.len() != b * tri.size() {
            return Err(TriError::InvalidArgument(format!(
                "vector has {} entries, expected {}",
                vector.len(),
                b * tri.size()
            )));
        }
        for (i, x) in vector.iter().enumerate() {
            match x {
                LargeInteger::Finite(v) if v.sign() < 0 => {
                    return Err(TriError::InvalidArgument(format!("coordinate {i} is negative")));
                }
                LargeInteger::Infinity if !enc.stores_triangles() || i % b >= 4 => {
                    return Err(TriError::InvalidArgument(format!(
                        "coordinate {i} is infinite but is not a triangle coordinate"
                    )));
                }
                _ => {}
            }
        }
        let full = encoding::promote(&tri, &vector, enc, full_encoding())?;
        Ok(Self {
            tri,
            enc,
            vector,
            full,
            name: String::new(),
            cache: SurfaceCache::default(),
        })
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    #[inline]
    pub fn triangulation(&self) -> &Arc<Triangulation> {
        &self.tri
    }

    #[inline]
    pub fn encoding(&self) -> NormalEncoding {
        self.enc
    }

    /// The stored vector, in this surface's own encoding.
    #[inline]
    pub fn vector(&self) -> &[LargeInteger] {
        &self.vector
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Triangles cutting off vertex `v` of tetrahedron `t`.
    #[inline]
    pub fn triangles(&self, t: usize, v: usize) -> &LargeInteger {
        &self.full[DISC_TYPES * t + v]
    }

    /// Quads of type `q` in tetrahedron `t`.
    #[inline]
    pub fn quads(&self, t: usize, q: usize) -> &LargeInteger {
        &self.full[DISC_TYPES * t + 4 + q]
    }

    /// Octagons of type `k` in tetrahedron `t`.
    #[inline]
    pub fn octs(&self, t: usize, k: usize) -> &LargeInteger {
        &self.full[DISC_TYPES * t + 7 + k]
    }

    /// The coordinates in another layout, taken from the full vector.
    pub(crate) fn layout(&self, enc: NormalEncoding) -> Vec<LargeInteger> {
        extract(&self.full, enc)
    }

    /// All ten disc counts per tetrahedron, for compact surfaces.
    pub(crate) fn finite_coords(&self) -> Result<Vec<Integer>, TriError> {
        self.full
            .iter()
            .map(|x| x.require_finite("triangle coordinate of a spun surface").cloned())
            .collect()
    }

    fn check_index(what: &str, i: usize, len: usize) -> Result<(), TriError> {
        if i < len {
            Ok(())
        } else {
            Err(TriError::InvalidArgument(format!("{what} {i} out of range ({len})")))
        }
    }

    // ---------------------------------------------------------------------
    // Intersections and counts
    // ---------------------------------------------------------------------

    /// Number of times the surface crosses edge `e`.
    pub fn edge_weight(&self, e: usize) -> Result<LargeInteger, TriError> {
        let sk = self.tri.skeleton();
        Self::check_index("edge", e, sk.edges.len())?;
        let emb = sk.edges[e].front();
        let (t, a, b) = (emb.tet, emb.perm.apply(0), emb.perm.apply(1));
        let [m0, m1] = QUAD_MEETING[a][b];
        let mut w = self.triangles(t, a) + self.triangles(t, b);
        w += self.quads(t, m0);
        w += self.quads(t, m1);
        for k in 0..3 {
            w += self.octs(t, k);
        }
        w += self.octs(t, QUAD_SEPARATING[a][b]);
        Ok(w)
    }

    /// Number of normal arcs on triangle `f` cutting off its vertex `v`.
    pub fn arcs(&self, f: usize, v: usize) -> Result<LargeInteger, TriError> {
        let sk = self.tri.skeleton();
        Self::check_index("triangle", f, sk.triangles.len())?;
        Self::check_index("triangle vertex", v, 3)?;
        let emb = sk.triangles[f].front();
        let (t, corner, face) = (emb.tet, emb.perm.apply(v), emb.perm.apply(3));
        let [m0, m1] = QUAD_MEETING[corner][face];
        let mut a = self.triangles(t, corner) + self.quads(t, QUAD_SEPARATING[corner][face]);
        a += self.octs(t, m0);
        a += self.octs(t, m1);
        Ok(a)
    }

    pub fn is_empty(&self) -> bool {
        self.full.iter().all(LargeInteger::is_zero)
    }

    /// False for spun surfaces, which have infinitely many triangles.
    pub fn is_compact(&self) -> bool {
        self.full.iter().all(|x| !x.is_infinite())
    }

    fn require_compact(&self, what: &str) -> Result<(), TriError> {
        if self.is_compact() {
            Ok(())
        } else {
            Err(TriError::FailedPrecondition(format!("{what} needs a compact surface")))
        }
    }

    /// Euler characteristic: edge weights minus arcs plus discs.
    pub fn euler_char(&self) -> Result<Integer, TriError> {
        self.require_compact("Euler characteristic")?;
        self.cache
            .euler
            .get_or_try_init(|| {
                let sk = self.tri.skeleton();
                let mut chi = Integer::ZERO;
                for e in 0..sk.edges.len() {
                    chi += self.edge_weight(e)?.require_finite("edge weight")?;
                }
                for f in 0..sk.triangles.len() {
                    for v in 0..3 {
                        chi -= self.arcs(f, v)?.require_finite("arc count")?;
                    }
                }
                for x in &self.full {
                    chi += x.require_finite("disc count")?;
                }
                Ok(chi)
            })
            .cloned()
    }

    fn disc_summary(&self) -> Result<&DiscSummary, TriError> {
        self.require_compact("disc graph")?;
        self.cache.discs.get_or_try_init(|| {
            let coords = self.finite_coords()?;
            Ok(DiscGraph::new(&self.tri, &coords)?.summarise())
        })
    }

    pub fn is_orientable(&self) -> Result<bool, TriError> {
        Ok(self.disc_summary()?.orientable)
    }

    pub fn is_two_sided(&self) -> Result<bool, TriError> {
        Ok(self.disc_summary()?.two_sided)
    }

    /// Exactly one component. The empty surface is not connected.
    pub fn is_connected(&self) -> Result<bool, TriError> {
        Ok(self.disc_summary()?.components == 1)
    }

    pub fn count_components(&self) -> Result<usize, TriError> {
        Ok(self.disc_summary()?.components)
    }

    /// The connected components, each in this surface's layout with
    /// triangles added.
    pub fn components(&self) -> Result<Vec<NormalSurface>, TriError> {
        let summary = self.disc_summary()?;
        let coords = self.finite_coords()?;
        let graph = DiscGraph::new(&self.tri, &coords)?;
        let mut vectors = vec![vec![Integer::ZERO; self.full.len()]; summary.components];
        for d in graph.discs() {
            let c = summary.component_of[graph.node(d)];
            vectors[c][DISC_TYPES * d.tet + d.disc_type] += &Integer::ONE;
        }
        let enc = self.enc.with_triangles();
        vectors
            .into_iter()
            .map(|v| {
                let full: Vec<LargeInteger> = v.into_iter().map(LargeInteger::Finite).collect();
                let layout = extract(&full, enc);
                NormalSurface::from_encoding(self.tri.clone(), enc, layout)
            })
            .collect()
    }

    /// True if some disc meets a boundary triangle.
    pub fn has_real_boundary(&self) -> bool {
        *self.cache.real_boundary.get_or_init(|| {
            (0..self.tri.size()).any(|t| {
                let tet = self.tri.tetrahedron(t);
                if !tet.has_boundary() {
                    return false;
                }
                if (0..3).any(|k| !self.quads(t, k).is_zero() || !self.octs(t, k).is_zero()) {
                    return true;
                }
                (0..4).any(|v| {
                    !self.triangles(t, v).is_zero()
                        && (0..4).any(|f| f != v && tet.adjacent(f).is_none())
                })
            })
        })
    }

    /// Number of boundary curves of the surface.
    pub fn count_boundaries(&self) -> Result<usize, TriError> {
        self.require_compact("counting boundary curves")?;
        self.cache.boundaries.get_or_try_init(|| self.compute_boundaries()).copied()
    }

    fn compute_boundaries(&self) -> Result<usize, TriError> {
        let tri = &*self.tri;
        let sk = tri.skeleton();
        // One node per point where the surface crosses a boundary edge.
        let mut base = vec![usize::MAX; sk.edges.len()];
        let mut nodes = 0usize;
        for (e, edge) in sk.edges.iter().enumerate() {
            if edge.boundary {
                base[e] = nodes;
                nodes += to_usize(self.edge_weight(e)?.require_finite("edge weight")?)?;
            }
        }
        let mut parent: Vec<usize> = (0..nodes).collect();
        for triangle in sk.triangles.iter().filter(|t| t.is_boundary()) {
            let emb = triangle.front();
            let t = emb.tet;
            for i in 0..3 {
                let v = emb.perm.apply(i);
                let f = emb.perm.apply(3);
                let [m0, m1] = QUAD_MEETING[v][f];
                let count = self.triangles(t, v).require_finite("triangle coordinate")?
                    + self.quads(t, QUAD_SEPARATING[v][f]).require_finite("quad coordinate")?;
                let count = &(&count + self.octs(t, m0).require_finite("octagon coordinate")?)
                    + self.octs(t, m1).require_finite("octagon coordinate")?;
                let count = to_usize(&count)?;
                let ends: Vec<usize> = (0..4).filter(|&x| x != v && x != f).collect();
                for k in 0..count {
                    let a = self.edge_point(t, v, ends[0], k);
                    let b = self.edge_point(t, v, ends[1], k);
                    union(&mut parent, base[a.0] + a.1, base[b.0] + b.1);
                }
            }
        }
        Ok((0..nodes).filter(|&x| find(&mut parent, x) == x).count())
    }

    /// The edge through local vertices `v`, `w` of `t`, and the index (from
    /// the edge's own vertex 0) of the `k`-th crossing counted from `v`.
    fn edge_point(&self, t: usize, v: usize, w: usize, k: usize) -> (usize, usize) {
        let local = crate::maths::perm::EDGE_NUMBER[v][w];
        let e = self.tri.tet_edge(t, local);
        if self.tri.tet_edge_mapping(t, local).apply(0) == v {
            (e, k)
        } else {
            let weight = self
                .edge_weight(e)
                .ok()
                .and_then(|w| w.finite().and_then(Integer::to_i64))
                .unwrap_or(0) as usize;
            (e, weight - 1 - k)
        }
    }

    // ---------------------------------------------------------------------
    // Recognition
    // ---------------------------------------------------------------------

    /// Only triangles: a union of (possibly several) vertex links.
    pub fn is_vertex_linking(&self) -> bool {
        (0..self.tri.size()).all(|t| (0..3).all(|k| self.quads(t, k).is_zero() && self.octs(t, k).is_zero()))
    }

    /// The vertex this surface is a multiple of the link of, if any.
    pub fn is_vertex_link(&self) -> Option<usize> {
        if !self.is_vertex_linking() {
            return None;
        }
        let mut found = None;
        for (i, vertex) in self.tri.skeleton().vertices.iter().enumerate() {
            let mut corners = vertex.embeddings.iter().map(|emb| self.triangles(emb.tet, emb.vertex));
            let Some(first) = corners.next() else { continue };
            let uniform = corners.all(|c| c == first);
            if first.is_zero() && uniform {
                continue;
            }
            if found.is_some() || !uniform {
                return None;
            }
            found = Some(i);
        }
        found
    }

    /// Up to two edges whose thin link is a positive multiple of this
    /// surface.
    pub fn is_thin_edge_link(&self) -> (Option<usize>, Option<usize>) {
        let mut edges = self.matching_edge_links().into_iter();
        (edges.next(), edges.next())
    }

    /// Edges whose normal link is a positive multiple of this surface,
    /// together with how many of those links are thin. Only thin links are
    /// recognised, so the count equals the number of edges.
    pub fn is_normal_edge_link(&self) -> (Vec<usize>, usize) {
        let edges = self.matching_edge_links();
        let thin = edges.len();
        (edges, thin)
    }

    fn matching_edge_links(&self) -> Vec<usize> {
        if self.is_empty() || !self.is_compact() || self.has_octagons() {
            return Vec::new();
        }
        let Ok(mine) = self.finite_coords() else { return Vec::new() };
        (0..self.tri.count_edges())
            .filter(|&e| self.edge_weight(e).is_ok_and(|w| w.is_zero()))
            .filter(|&e| match links::thin_edge_link_coords(&self.tri, e) {
                Some(link) => positive_multiple(&mine, &link),
                None => false,
            })
            .collect()
    }

    fn has_octagons(&self) -> bool {
        (0..self.tri.size()).any(|t| (0..3).any(|k| !self.octs(t, k).is_zero()))
    }

    /// No triangles and exactly one quad in every tetrahedron.
    pub fn is_splitting(&self) -> bool {
        (0..self.tri.size()).all(|t| {
            (0..4).all(|v| self.triangles(t, v).is_zero())
                && (0..3).all(|k| self.octs(t, k).is_zero())
                && (0..3).map(|k| self.quads(t, k)).fold(LargeInteger::ZERO, |a, b| &a + b)
                    == LargeInteger::ONE
        })
    }

    /// If every tetrahedron holds at most one disc, the number of discs.
    pub fn is_central(&self) -> Option<usize> {
        if !self.is_compact() {
            return None;
        }
        let mut total = 0usize;
        for block in self.full.chunks(DISC_TYPES) {
            let discs = block.iter().fold(LargeInteger::ZERO, |a, b| &a + b);
            match discs.finite().and_then(Integer::to_i64) {
                Some(0) => {}
                Some(1) => total += 1,
                _ => return None,
            }
        }
        (total > 0).then_some(total)
    }

    /// First (tetrahedron, octagon type) with a non-zero octagon count.
    pub fn oct_position(&self) -> Option<(usize, usize)> {
        iproduct!(0..self.tri.size(), 0..3).find(|&(t, k)| !self.octs(t, k).is_zero())
    }

    /// More than one octagonal disc in total.
    pub fn has_multiple_oct_discs(&self) -> bool {
        let total = iproduct!(0..self.tri.size(), 0..3).fold(LargeInteger::ZERO, |a, (t, k)| &a + self.octs(t, k));
        total > LargeInteger::ONE
    }

    /// Could this surface and `other` be made disjoint locally: at most one
    /// quad or octagon type per tetrahedron between them, and at most one
    /// octagon type overall.
    pub fn locally_compatible(&self, other: &NormalSurface) -> bool {
        let mut oct_type: Option<(usize, usize)> = None;
        for t in 0..self.tri.size() {
            let mut kinds = 0;
            for k in 0..3 {
                if !self.quads(t, k).is_zero() || !other.quads(t, k).is_zero() {
                    kinds += 1;
                }
                if !self.octs(t, k).is_zero() || !other.octs(t, k).is_zero() {
                    kinds += 1;
                    if oct_type.is_some_and(|o| o != (t, k)) {
                        return false;
                    }
                    oct_type = Some((t, k));
                }
            }
            if kinds > 1 {
                return false;
            }
        }
        true
    }

    /// Can the two connected surfaces be isotoped apart?
    ///
    /// # Errors
    /// `FailedPrecondition` unless both surfaces are compact and connected.
    pub fn disjoint(&self, other: &NormalSurface) -> Result<bool, TriError> {
        if !self.is_connected()? || !other.is_connected()? {
            return Err(TriError::FailedPrecondition(
                "disjointness is only decided for connected surfaces".into(),
            ));
        }
        if !self.locally_compatible(other) {
            return Ok(false);
        }
        let sum = self.sum(other)?;
        let parts = sum.components()?;
        if parts.len() != 2 {
            return Ok(false);
        }
        Ok(parts.iter().any(|p| p.full == self.full))
    }

    // ---------------------------------------------------------------------
    // Algebra
    // ---------------------------------------------------------------------

    fn same_triangulation(&self, other: &NormalSurface) -> bool {
        Arc::ptr_eq(&self.tri, &other.tri) || self.tri.is_identical_to(&other.tri)
    }

    /// Sum of the two vectors, in the least encoding storing both.
    pub fn sum(&self, other: &NormalSurface) -> Result<NormalSurface, TriError> {
        if !self.same_triangulation(other) {
            return Err(TriError::InvalidArgument(
                "cannot add surfaces from different triangulations".into(),
            ));
        }
        let enc = self.enc | other.enc;
        let vector = self
            .layout(enc)
            .iter()
            .zip(other.layout(enc).iter())
            .map(|(a, b)| a + b)
            .collect();
        NormalSurface::from_encoding(self.tri.clone(), enc, vector)
    }

    /// Every coordinate multiplied by `k`.
    pub fn scaled(&self, k: &Integer) -> Result<NormalSurface, TriError> {
        if k.sign() < 0 {
            return Err(TriError::InvalidArgument("cannot scale by a negative factor".into()));
        }
        let vector = self.vector.iter().map(|x| x * k).collect();
        NormalSurface::from_encoding(self.tri.clone(), self.enc, vector)
    }

    /// Two parallel copies.
    pub fn double_surface(&self) -> NormalSurface {
        let vector = self.vector.iter().map(|x| x + x).collect();
        let full = self.full.iter().map(|x| x + x).collect();
        NormalSurface {
            tri: self.tri.clone(),
            enc: self.enc,
            vector,
            full,
            name: self.name.clone(),
            cache: SurfaceCache::default(),
        }
    }

    // ---------------------------------------------------------------------
    // Cusps
    // ---------------------------------------------------------------------

    /// Boundary slope of a spun surface at each cusp: one row per cusp,
    /// columns (meridian, longitude).
    ///
    /// # Errors
    /// `FailedPrecondition` if the triangulation has no cusps or the
    /// surface is compact.
    pub fn boundary_intersections(&self, slopes: &dyn CuspSlopes) -> Result<MatrixInt, TriError> {
        let cusps = cusp_vertices(&self.tri);
        if cusps.is_empty() {
            return Err(TriError::FailedPrecondition("triangulation has no cusps".into()));
        }
        if self.is_compact() {
            return Err(TriError::FailedPrecondition(
                "boundary slopes are only defined for spun surfaces".into(),
            ));
        }
        let eqns = checked_slopes(&self.tri, slopes)?;
        let mut quads = Vec::with_capacity(3 * self.tri.size());
        for t in 0..self.tri.size() {
            for k in 0..3 {
                quads.push(self.quads(t, k).require_finite("quad coordinate")?.clone());
            }
        }
        let values = eqns.apply(&quads)?;
        let mut out = MatrixInt::new(cusps.len(), 2);
        for c in 0..cusps.len() {
            out.set(c, 0, values[2 * c].clone());
            out.set(c, 1, values[2 * c + 1].clone());
        }
        Ok(out)
    }
}

/// Extract the coordinates of `enc` from a full ten-per-tetrahedron vector.
fn extract(full: &[LargeInteger], enc: NormalEncoding) -> Vec<LargeInteger> {
    let mut out = Vec::with_capacity(enc.block_size() * full.len() / DISC_TYPES);
    for block in full.chunks(DISC_TYPES) {
        if enc.stores_triangles() {
            out.extend(block[..4].iter().cloned());
        }
        out.extend(block[4..7].iter().cloned());
        if enc.stores_octagons() {
            out.extend(block[7..].iter().cloned());
        }
    }
    out
}

/// True if `a = r b` for some rational `r > 0`.
fn positive_multiple(a: &[Integer], b: &[Integer]) -> bool {
    let mut ratio: Option<(&Integer, &Integer)> = None;
    for (x, y) in a.iter().zip(b) {
        if y.is_zero() {
            if !x.is_zero() {
                return false;
            }
            continue;
        }
        match ratio {
            None => ratio = Some((x, y)),
            Some((p, q)) => {
                if x * q != p * y {
                    return false;
                }
            }
        }
    }
    ratio.is_some_and(|(p, q)| p.sign() * q.sign() > 0)
}

fn to_usize(v: &Integer) -> Result<usize, TriError> {
    v.to_i64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| TriError::FailedPrecondition(format!("count {v} is too large")))
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}

impl PartialEq for NormalSurface {
    /// Same triangulation and the same disc counts, whatever the encoding.
    fn eq(&self, other: &Self) -> bool {
        self.same_triangulation(other) && self.full == other.full
    }
}

impl Add for &NormalSurface {
    type Output = Result<NormalSurface, TriError>;
    fn add(self, rhs: &NormalSurface) -> Self::Output {
        self.sum(rhs)
    }
}

impl DebugInvariants for NormalSurface {
    const KIND: &'static str = "NormalSurface";

    fn validate_invariants(&self) -> Result<(), TriError> {
        if self.full.iter().any(|x| x.finite().is_some_and(|v| v.sign() < 0)) {
            return Err(TriError::ImpossibleScenario("negative disc count".into()));
        }
        let constraints = matching::make_embedded_constraints(&self.tri, NormalCoords::AlmostNormal)?;
        let positive = |i: usize| !self.full[i].is_zero();
        if !constraints.admits(positive) {
            return Err(TriError::ImpossibleScenario(
                "surface is not embedded: incompatible quads or octagons".into(),
            ));
        }
        if self.is_compact() {
            let m = matching::make_matching_equations(&self.tri, NormalCoords::AlmostNormal, None)?;
            let values = m.apply(&self.finite_coords()?)?;
            if values.iter().any(|v| !v.is_zero()) {
                return Err(TriError::ImpossibleScenario(
                    "surface violates the matching equations".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::example;

    fn std_surface(tri: &Arc<Triangulation>, v: &[i64]) -> NormalSurface {
        NormalSurface::from_integers(tri.clone(), NormalCoords::Standard, v.iter().map(|&x| Integer::new(x)).collect())
            .unwrap()
    }

    #[test]
    fn vertex_link_of_figure_eight_is_a_torus() {
        let tri = Arc::new(example::figure_eight());
        let link = NormalSurface::vertex_link(tri.clone(), 0).unwrap();
        assert_eq!(link.is_vertex_link(), Some(0));
        assert!(link.is_vertex_linking());
        assert_eq!(link.euler_char().unwrap(), Integer::ZERO);
        assert!(link.is_orientable().unwrap());
        assert!(link.is_two_sided().unwrap());
        assert!(link.is_connected().unwrap());
        assert!(!link.has_real_boundary());
        assert_eq!(link.count_boundaries().unwrap(), 0);
        for e in 0..tri.count_edges() {
            assert_eq!(link.edge_weight(e).unwrap(), LargeInteger::from(2));
        }
        link.validate_invariants().unwrap();
    }

    #[test]
    fn euler_characteristic_is_additive() {
        let tri = Arc::new(example::poincare_homology_sphere());
        let link = NormalSurface::vertex_link(tri.clone(), 0).unwrap();
        let doubled = link.double_surface();
        assert_eq!(doubled.euler_char().unwrap(), Integer::new(4));
        assert_eq!(doubled.count_components().unwrap(), 2);
        assert!(!doubled.is_connected().unwrap());
        assert_eq!(doubled.is_vertex_link(), Some(0));
        let sum = (&link + &link).unwrap();
        assert_eq!(sum, doubled);
        assert_eq!(link.scaled(&Integer::new(3)).unwrap().euler_char().unwrap(), Integer::new(6));
        assert!(link.scaled(&Integer::new(-1)).is_err());
        let parts = doubled.components().unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| *p == link));
    }

    #[test]
    fn bad_vectors_are_rejected() {
        let tri = Arc::new(example::figure_eight());
        assert!(NormalSurface::from_integers(tri.clone(), NormalCoords::Standard, vec![Integer::ZERO; 13]).is_err());
        let mut v = vec![0i64; 14];
        v[4] = -1;
        assert!(NormalSurface::from_integers(
            tri.clone(),
            NormalCoords::Standard,
            v.into_iter().map(Integer::new).collect()
        )
        .is_err());
        let mut quads = vec![LargeInteger::ZERO; 6];
        quads[0] = LargeInteger::Infinity;
        assert!(NormalSurface::new(tri, NormalCoords::Quad, quads).is_err());
    }

    #[test]
    fn spun_surfaces_are_not_compact() {
        let tri = Arc::new(example::figure_eight());
        let spun = NormalSurface::from_integers(
            tri.clone(),
            NormalCoords::Quad,
            [1, 0, 0, 0, 2, 0].into_iter().map(Integer::new).collect(),
        )
        .unwrap();
        assert!(!spun.is_compact());
        assert!(spun.euler_char().is_err());
        assert!(spun.is_orientable().is_err());
        assert!(spun.triangles(0, 0).is_infinite());
        assert_eq!(spun.is_vertex_link(), None);
        assert_eq!(spun.is_central(), None);
        assert!(!spun.is_empty());
    }

    #[test]
    fn boundary_curves_of_a_meridian_disc() {
        // The layered solid torus: every boundary curve of a disc is one
        // loop on the boundary torus.
        let tri = Arc::new(example::lst(1, 2).unwrap());
        let link = NormalSurface::vertex_link(tri.clone(), 0).unwrap();
        assert!(link.has_real_boundary());
        assert_eq!(link.count_boundaries().unwrap(), 1);
        assert_eq!(link.euler_char().unwrap(), Integer::ONE);
    }

    #[test]
    fn central_and_splitting() {
        let tri = Arc::new(example::figure_eight());
        let mut v = vec![0i64; 14];
        v[4] = 1;
        v[11] = 1;
        let s = std_surface(&tri, &v);
        assert_eq!(s.is_central(), Some(2));
        assert!(s.is_splitting());
        let link = NormalSurface::vertex_link(tri.clone(), 0).unwrap();
        assert_eq!(link.is_central(), None);
        assert!(!link.is_splitting());
        assert_eq!(link.oct_position(), None);
        assert!(!link.has_multiple_oct_discs());
    }

    #[test]
    fn octagon_queries() {
        let tri = Arc::new(example::figure_eight());
        let mut v = vec![0i64; 20];
        v[8] = 2;
        let s = NormalSurface::from_integers(
            tri.clone(),
            NormalCoords::AlmostNormal,
            v.into_iter().map(Integer::new).collect(),
        )
        .unwrap();
        assert_eq!(s.oct_position(), Some((0, 1)));
        assert!(s.has_multiple_oct_discs());
        let mut w = vec![0i64; 20];
        w[14] = 1;
        let other = NormalSurface::from_integers(
            tri,
            NormalCoords::AlmostNormal,
            w.into_iter().map(Integer::new).collect(),
        )
        .unwrap();
        assert!(s.locally_compatible(&other));
        let mut u = vec![0i64; 20];
        u[5] = 1;
        let clash = NormalSurface::from_integers(
            s.triangulation().clone(),
            NormalCoords::AlmostNormal,
            u.into_iter().map(Integer::new).collect(),
        )
        .unwrap();
        assert!(!s.locally_compatible(&clash));
    }

    #[test]
    fn boundary_intersections_need_cusps_and_spinning() {
        use crate::snappea::SlopeMatrix;
        let tri = Arc::new(example::figure_eight());
        let mut m = MatrixInt::new(2, 6);
        m.set(0, 0, 1);
        m.set(0, 4, -1);
        m.set(1, 1, 2);
        let slopes = SlopeMatrix::new(m);
        let spun = NormalSurface::from_integers(
            tri.clone(),
            NormalCoords::Quad,
            [1, 0, 0, 0, 2, 0].into_iter().map(Integer::new).collect(),
        )
        .unwrap();
        let b = spun.boundary_intersections(&slopes).unwrap();
        assert_eq!((b.rows(), b.columns()), (1, 2));
        assert_eq!(*b.entry(0, 0), Integer::new(-1));
        assert_eq!(*b.entry(0, 1), Integer::ZERO);

        let link = NormalSurface::vertex_link(tri, 0).unwrap();
        assert!(matches!(link.boundary_intersections(&slopes), Err(TriError::FailedPrecondition(_))));
        let phs = Arc::new(example::poincare_homology_sphere());
        let s = NormalSurface::vertex_link(phs, 0).unwrap();
        assert!(matches!(s.boundary_intersections(&slopes), Err(TriError::FailedPrecondition(_))));
    }
}
