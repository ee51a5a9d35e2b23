//! Three-dimensional triangulations.
//!
//! A [`Triangulation`] is a list of tetrahedra together with face pairings
//! (gluings). Each gluing of facet `f` of tetrahedron `t` to tetrahedron `u`
//! carries a permutation `p` of the four vertices, so that vertex `i` of `t`
//! is identified with vertex `p[i]` of `u` and facet `f` lands on facet
//! `p[f]`. Gluings are stored on both sides and are always involutive.
//!
//! The skeleton (vertices, edges, triangles, components and boundary
//! components) is computed lazily on first use and discarded by every
//! mutation. Other derived properties live in a [`PropertyCache`].

pub mod cache;
pub mod events;
pub mod example;
pub mod homology;
pub mod isomorphism;
pub mod isosig;
pub mod recognition;
pub mod skeleton;

use once_cell::sync::OnceCell;

use crate::debug_invariants::DebugInvariants;
use crate::maths::perm::Perm4;
use crate::tri_error::TriError;

pub use cache::{InvalidateCache, PropertyCache};
pub use events::{ChangeEvents, ChangeListener};
use events::SpanCounter;
pub use isomorphism::Isomorphism;
pub use isosig::IsoSigKind;
pub use recognition::Summands;
pub use skeleton::{
    BoundaryComponent, BoundaryKind, Component, Edge, FaceEmbedding, Skeleton, Triangle, Vertex,
    VertexLinkType,
};

/// Destination of a glued facet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Gluing {
    pub tet: usize,
    pub perm: Perm4,
}

impl Gluing {
    #[inline]
    pub fn new(tet: usize, perm: Perm4) -> Self {
        Self { tet, perm }
    }
}

const SIMPLEX_LOCK: u8 = 1;

#[inline]
const fn facet_lock(f: usize) -> u8 {
    1 << (f + 1)
}

/// One tetrahedron: four optional gluings, a lock mask and a description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tetrahedron {
    adj: [Option<Gluing>; 4],
    locks: u8,
    description: String,
}

impl Tetrahedron {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Gluing across facet `f`, or `None` if that facet is boundary.
    #[inline]
    pub fn adjacent(&self, f: usize) -> Option<Gluing> {
        self.adj[f]
    }

    #[inline]
    pub fn adjacent_tet(&self, f: usize) -> Option<usize> {
        self.adj[f].map(|g| g.tet)
    }

    #[inline]
    pub fn adjacent_gluing(&self, f: usize) -> Option<Perm4> {
        self.adj[f].map(|g| g.perm)
    }

    /// Facet of the neighbour that facet `f` is glued to.
    #[inline]
    pub fn adjacent_facet(&self, f: usize) -> Option<usize> {
        self.adj[f].map(|g| g.perm.apply(f))
    }

    #[inline]
    pub fn has_boundary(&self) -> bool {
        self.adj.iter().any(Option::is_none)
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locks & SIMPLEX_LOCK != 0
    }

    #[inline]
    pub fn is_facet_locked(&self, f: usize) -> bool {
        self.locks & facet_lock(f) != 0
    }

    /// Raw lock mask: bit 0 for the simplex, bits 1..=4 for facets 0..=3.
    #[inline]
    pub fn lock_mask(&self) -> u8 {
        self.locks
    }
}

/// What [`Triangulation::clone_with`] carries over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CloneOptions {
    /// Copy simplex and facet locks.
    pub locks: bool,
    /// Copy the skeleton and any computed properties.
    pub properties: bool,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            locks: true,
            properties: true,
        }
    }
}

/// A 3-dimensional triangulation.
#[derive(Debug, Default)]
pub struct Triangulation {
    tets: Vec<Tetrahedron>,
    skeleton: OnceCell<Skeleton>,
    props: PropertyCache,
    events: ChangeEvents,
    topology_lock: SpanCounter,
}

static_assertions::assert_impl_all!(Triangulation: Send, Sync);

impl Clone for Triangulation {
    /// Copies gluings, locks and computed properties. Listeners are not
    /// copied.
    fn clone(&self) -> Self {
        self.clone_with(CloneOptions::default())
    }
}

impl Triangulation {
    /// The empty triangulation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build `n` tetrahedra and glue them as listed. Each entry
    /// `(t, f, u, p)` glues facet `f` of `t` to `u` via `p`.
    pub fn from_gluings(n: usize, gluings: &[(usize, usize, usize, Perm4)]) -> Result<Self, TriError> {
        let mut tri = Triangulation::new();
        tri.new_tetrahedra(n);
        for &(t, f, u, p) in gluings {
            tri.join(t, f, u, p)?;
        }
        Ok(tri)
    }

    /// Copy this triangulation, choosing what to carry over.
    pub fn clone_with(&self, options: CloneOptions) -> Self {
        let mut tets = self.tets.clone();
        if !options.locks {
            for t in &mut tets {
                t.locks = 0;
            }
        }
        let (skeleton, props) = if options.properties {
            (self.skeleton.clone(), self.props.clone())
        } else {
            (OnceCell::new(), PropertyCache::new())
        };
        Self {
            tets,
            skeleton,
            props,
            events: ChangeEvents::default(),
            topology_lock: SpanCounter::default(),
        }
    }

    // ---------------------------------------------------------------------
    // Basic queries
    // ---------------------------------------------------------------------

    /// Number of tetrahedra.
    #[inline]
    pub fn size(&self) -> usize {
        self.tets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tets.is_empty()
    }

    #[inline]
    pub fn tetrahedron(&self, t: usize) -> &Tetrahedron {
        &self.tets[t]
    }

    #[inline]
    pub fn tetrahedra(&self) -> &[Tetrahedron] {
        &self.tets
    }

    #[inline]
    pub fn adjacent_tet(&self, t: usize, f: usize) -> Option<usize> {
        self.tets[t].adjacent_tet(f)
    }

    #[inline]
    pub fn adjacent_gluing(&self, t: usize, f: usize) -> Option<Perm4> {
        self.tets[t].adjacent_gluing(f)
    }

    #[inline]
    pub fn adjacent_facet(&self, t: usize, f: usize) -> Option<usize> {
        self.tets[t].adjacent_facet(f)
    }

    #[inline]
    pub fn adjacent(&self, t: usize, f: usize) -> Option<Gluing> {
        self.tets[t].adjacent(f)
    }

    /// Identical gluings (not merely isomorphic).
    pub fn is_identical_to(&self, other: &Triangulation) -> bool {
        self.size() == other.size()
            && self
                .tets
                .iter()
                .zip(&other.tets)
                .all(|(a, b)| a.adj == b.adj)
    }

    /// Computed-property cache.
    #[inline]
    pub fn properties(&self) -> &PropertyCache {
        &self.props
    }

    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    fn check_tet(&self, t: usize) -> Result<(), TriError> {
        if t < self.tets.len() {
            Ok(())
        } else {
            Err(TriError::InvalidArgument(format!(
                "tetrahedron {t} out of range (size {})",
                self.tets.len()
            )))
        }
    }

    fn check_facet(f: usize) -> Result<(), TriError> {
        if f < 4 {
            Ok(())
        } else {
            Err(TriError::InvalidArgument(format!("facet {f} out of range")))
        }
    }

    /// Discard derived data after a change to the gluings. Topological
    /// properties survive while a topology lock is held.
    pub(crate) fn clear_caches(&mut self) {
        self.skeleton.take();
        self.props.clear_combinatorial();
        if !self.is_topology_locked() {
            self.props.clear_topological();
        }
    }

    /// Append a tetrahedron; returns its index.
    pub fn new_tetrahedron(&mut self) -> usize {
        self.change_span(|tri| tri.new_tetrahedron_raw(String::new()))
    }

    pub fn new_tetrahedron_with_description(&mut self, description: impl Into<String>) -> usize {
        let d = description.into();
        self.change_span(|tri| tri.new_tetrahedron_raw(d))
    }

    /// Append `k` tetrahedra; returns the range of their indices.
    pub fn new_tetrahedra(&mut self, k: usize) -> core::ops::Range<usize> {
        self.change_span(|tri| {
            let start = tri.tets.len();
            for _ in 0..k {
                tri.new_tetrahedron_raw(String::new());
            }
            start..tri.tets.len()
        })
    }

    pub(crate) fn new_tetrahedron_raw(&mut self, description: String) -> usize {
        self.tets.push(Tetrahedron::with_description(description));
        self.clear_caches();
        self.tets.len() - 1
    }

    pub fn set_description(&mut self, t: usize, description: impl Into<String>) -> Result<(), TriError> {
        self.check_tet(t)?;
        let d = description.into();
        self.change_span(|tri| tri.tets[t].description = d);
        Ok(())
    }

    /// Glue facet `f` of `t` to facet `p[f]` of `u`.
    ///
    /// # Errors
    /// `InvalidArgument` if either facet is already glued or a facet would
    /// be glued to itself; `LockViolation` if either facet is locked.
    pub fn join(&mut self, t: usize, f: usize, u: usize, p: Perm4) -> Result<(), TriError> {
        self.check_tet(t)?;
        self.check_tet(u)?;
        Self::check_facet(f)?;
        let g = p.apply(f);
        if t == u && g == f {
            return Err(TriError::InvalidArgument(format!(
                "cannot glue facet {f} of tetrahedron {t} to itself"
            )));
        }
        if self.tets[t].adj[f].is_some() {
            return Err(TriError::InvalidArgument(format!(
                "facet {f} of tetrahedron {t} is already glued"
            )));
        }
        if self.tets[u].adj[g].is_some() {
            return Err(TriError::InvalidArgument(format!(
                "facet {g} of tetrahedron {u} is already glued"
            )));
        }
        if self.tets[t].is_facet_locked(f) || self.tets[u].is_facet_locked(g) {
            return Err(TriError::LockViolation(format!(
                "facet {f} of tetrahedron {t} or its target is locked"
            )));
        }
        self.change_span(|tri| tri.join_raw(t, f, u, p));
        Ok(())
    }

    /// Unchecked gluing used inside moves, which check everything first.
    pub(crate) fn join_raw(&mut self, t: usize, f: usize, u: usize, p: Perm4) {
        self.tets[t].adj[f] = Some(Gluing::new(u, p));
        self.tets[u].adj[p.apply(f)] = Some(Gluing::new(t, p.inverse()));
        self.clear_caches();
    }

    /// Unglue facet `f` of `t`; returns the former neighbour, if any.
    pub fn unjoin(&mut self, t: usize, f: usize) -> Result<Option<usize>, TriError> {
        self.check_tet(t)?;
        Self::check_facet(f)?;
        if self.tets[t].adj[f].is_none() {
            return Ok(None);
        }
        if self.tets[t].is_facet_locked(f) {
            return Err(TriError::LockViolation(format!(
                "facet {f} of tetrahedron {t} is locked"
            )));
        }
        Ok(self.change_span(|tri| tri.unjoin_raw(t, f)))
    }

    pub(crate) fn unjoin_raw(&mut self, t: usize, f: usize) -> Option<usize> {
        let g = self.tets[t].adj[f].take()?;
        self.tets[g.tet].adj[g.perm.apply(f)] = None;
        self.clear_caches();
        Some(g.tet)
    }

    /// Unglue every facet of `t`.
    pub fn isolate(&mut self, t: usize) -> Result<(), TriError> {
        self.check_tet(t)?;
        if (0..4).any(|f| self.tets[t].adj[f].is_some() && self.tets[t].is_facet_locked(f)) {
            return Err(TriError::LockViolation(format!(
                "tetrahedron {t} has a locked glued facet"
            )));
        }
        self.change_span(|tri| tri.isolate_raw(t));
        Ok(())
    }

    pub(crate) fn isolate_raw(&mut self, t: usize) {
        for f in 0..4 {
            self.unjoin_raw(t, f);
        }
    }

    /// Remove tetrahedron `t`, ungluing it first. Higher indices shift down.
    pub fn remove_tetrahedron(&mut self, t: usize) -> Result<(), TriError> {
        self.check_tet(t)?;
        if self.tets[t].locks != 0 {
            return Err(TriError::LockViolation(format!(
                "tetrahedron {t} or one of its facets is locked"
            )));
        }
        self.change_span(|tri| tri.remove_tetrahedron_raw(t));
        Ok(())
    }

    pub(crate) fn remove_tetrahedron_raw(&mut self, t: usize) {
        self.isolate_raw(t);
        self.tets.remove(t);
        for tet in &mut self.tets {
            for g in tet.adj.iter_mut().flatten() {
                if g.tet > t {
                    g.tet -= 1;
                }
            }
        }
        self.clear_caches();
    }

    /// Remove several tetrahedra at once (indices may be in any order).
    pub(crate) fn remove_tetrahedra_raw(&mut self, mut which: Vec<usize>) {
        which.sort_unstable();
        which.dedup();
        for &t in which.iter().rev() {
            self.remove_tetrahedron_raw(t);
        }
    }

    pub fn remove_all_tetrahedra(&mut self) -> Result<(), TriError> {
        if self.has_locks() {
            return Err(TriError::LockViolation(
                "cannot remove locked tetrahedra".into(),
            ));
        }
        self.change_span(|tri| {
            tri.tets.clear();
            tri.clear_caches();
        });
        Ok(())
    }

    /// Exchange the contents of two triangulations. Listeners stay put.
    pub fn swap(&mut self, other: &mut Triangulation) {
        self.change_span(|a| {
            other.change_span(|b| {
                core::mem::swap(&mut a.tets, &mut b.tets);
                core::mem::swap(&mut a.skeleton, &mut b.skeleton);
                core::mem::swap(&mut a.props, &mut b.props);
            })
        });
    }

    /// Append a disjoint copy of `other`; returns the index offset.
    pub fn insert_triangulation(&mut self, other: &Triangulation) -> usize {
        let offset = self.tets.len();
        self.change_span(|tri| {
            for tet in &other.tets {
                let mut copy = tet.clone();
                for g in copy.adj.iter_mut().flatten() {
                    g.tet += offset;
                }
                tri.tets.push(copy);
            }
            tri.clear_caches();
        });
        offset
    }

    /// One triangulation per connected component, in component order.
    /// Locks are not carried over.
    pub fn split_into_components(&self) -> Vec<Triangulation> {
        let sk = self.skeleton();
        let mut local = vec![0usize; self.tets.len()];
        for comp in &sk.components {
            for (i, &t) in comp.tets.iter().enumerate() {
                local[t] = i;
            }
        }
        sk.components
            .iter()
            .map(|comp| {
                let tets = comp
                    .tets
                    .iter()
                    .map(|&t| {
                        let mut tet = self.tets[t].clone();
                        tet.locks = 0;
                        for g in tet.adj.iter_mut().flatten() {
                            g.tet = local[g.tet];
                        }
                        tet
                    })
                    .collect();
                let mut part = Triangulation::new();
                part.replace_tetrahedra(tets);
                part
            })
            .collect()
    }

    /// Replace the tetrahedron list wholesale (used by relabelling code).
    pub(crate) fn replace_tetrahedra(&mut self, tets: Vec<Tetrahedron>) {
        self.tets = tets;
        self.clear_caches();
    }

    /// Set the lock bit on one side of a facet only. Moves use this to
    /// carry locks from removed tetrahedra onto their replacements.
    pub(crate) fn lock_facet_raw(&mut self, t: usize, f: usize) {
        self.tets[t].locks |= facet_lock(f);
    }

    // ---------------------------------------------------------------------
    // Locks
    // ---------------------------------------------------------------------

    pub fn lock_simplex(&mut self, t: usize) -> Result<(), TriError> {
        self.check_tet(t)?;
        self.change_span(|tri| tri.tets[t].locks |= SIMPLEX_LOCK);
        Ok(())
    }

    pub fn unlock_simplex(&mut self, t: usize) -> Result<(), TriError> {
        self.check_tet(t)?;
        self.change_span(|tri| tri.tets[t].locks &= !SIMPLEX_LOCK);
        Ok(())
    }

    /// Lock facet `f` of `t` and the facet it is glued to.
    pub fn lock_facet(&mut self, t: usize, f: usize) -> Result<(), TriError> {
        self.check_tet(t)?;
        Self::check_facet(f)?;
        self.change_span(|tri| {
            tri.tets[t].locks |= facet_lock(f);
            if let Some(g) = tri.tets[t].adj[f] {
                tri.tets[g.tet].locks |= facet_lock(g.perm.apply(f));
            }
        });
        Ok(())
    }

    pub fn unlock_facet(&mut self, t: usize, f: usize) -> Result<(), TriError> {
        self.check_tet(t)?;
        Self::check_facet(f)?;
        self.change_span(|tri| {
            tri.tets[t].locks &= !facet_lock(f);
            if let Some(g) = tri.tets[t].adj[f] {
                tri.tets[g.tet].locks &= !facet_lock(g.perm.apply(f));
            }
        });
        Ok(())
    }

    pub fn unlock_all(&mut self) {
        self.change_span(|tri| {
            for t in &mut tri.tets {
                t.locks = 0;
            }
        });
    }

    pub fn has_locks(&self) -> bool {
        self.tets.iter().any(|t| t.locks != 0)
    }

    #[inline]
    pub fn is_simplex_locked(&self, t: usize) -> bool {
        self.tets[t].is_locked()
    }

    #[inline]
    pub fn is_facet_locked(&self, t: usize, f: usize) -> bool {
        self.tets[t].is_facet_locked(f)
    }

    /// `LockViolation` unless tetrahedron `t` may be removed or rebuilt.
    pub(crate) fn ensure_removable(&self, t: usize) -> Result<(), TriError> {
        if self.tets[t].locks != 0 {
            Err(TriError::LockViolation(format!(
                "tetrahedron {t} or one of its facets is locked"
            )))
        } else {
            Ok(())
        }
    }

    /// `LockViolation` unless facet `f` of `t` may be reglued.
    pub(crate) fn ensure_facet_unlocked(&self, t: usize, f: usize) -> Result<(), TriError> {
        if self.tets[t].is_facet_locked(f) {
            Err(TriError::LockViolation(format!(
                "facet {f} of tetrahedron {t} is locked"
            )))
        } else {
            Ok(())
        }
    }

    // ---------------------------------------------------------------------
    // Skeleton access
    // ---------------------------------------------------------------------

    /// The skeleton, computed on first use.
    pub fn skeleton(&self) -> &Skeleton {
        self.skeleton.get_or_init(|| Skeleton::build(&self.tets))
    }

    #[inline]
    pub fn count_vertices(&self) -> usize {
        self.skeleton().vertices.len()
    }

    #[inline]
    pub fn count_edges(&self) -> usize {
        self.skeleton().edges.len()
    }

    #[inline]
    pub fn count_triangles(&self) -> usize {
        self.skeleton().triangles.len()
    }

    #[inline]
    pub fn count_components(&self) -> usize {
        self.skeleton().components.len()
    }

    #[inline]
    pub fn count_boundary_components(&self) -> usize {
        self.skeleton().boundary_components.len()
    }

    #[inline]
    pub fn vertex(&self, i: usize) -> &Vertex {
        &self.skeleton().vertices[i]
    }

    #[inline]
    pub fn edge(&self, i: usize) -> &Edge {
        &self.skeleton().edges[i]
    }

    #[inline]
    pub fn triangle(&self, i: usize) -> &Triangle {
        &self.skeleton().triangles[i]
    }

    #[inline]
    pub fn component(&self, i: usize) -> &Component {
        &self.skeleton().components[i]
    }

    #[inline]
    pub fn boundary_component(&self, i: usize) -> &BoundaryComponent {
        &self.skeleton().boundary_components[i]
    }

    /// Index of vertex `v` of tetrahedron `t` in the skeleton.
    #[inline]
    pub fn tet_vertex(&self, t: usize, v: usize) -> usize {
        self.skeleton().tet_vertex[t][v]
    }

    #[inline]
    pub fn tet_edge(&self, t: usize, e: usize) -> usize {
        self.skeleton().tet_edge[t][e]
    }

    #[inline]
    pub fn tet_triangle(&self, t: usize, f: usize) -> usize {
        self.skeleton().tet_triangle[t][f]
    }

    /// Maps (0, 1) to the ends of edge `e` of `t`, matching the edge's own
    /// vertex numbering.
    #[inline]
    pub fn tet_edge_mapping(&self, t: usize, e: usize) -> Perm4 {
        self.skeleton().tet_edge_perm[t][e]
    }

    /// Maps (0, 1, 2) to the vertices of facet `f` of `t`, matching the
    /// triangle's own vertex numbering, and 3 to `f`.
    #[inline]
    pub fn tet_triangle_mapping(&self, t: usize, f: usize) -> Perm4 {
        self.skeleton().tet_triangle_perm[t][f]
    }

    // ---------------------------------------------------------------------
    // Predicates
    // ---------------------------------------------------------------------

    pub fn is_valid(&self) -> bool {
        let sk = self.skeleton();
        sk.edges.iter().all(|e| e.valid) && sk.vertices.iter().all(Vertex::is_valid)
    }

    pub fn is_orientable(&self) -> bool {
        self.skeleton().components.iter().all(|c| c.orientable)
    }

    /// True if every tetrahedron is positively oriented, i.e. every gluing
    /// permutation is odd.
    pub fn is_oriented(&self) -> bool {
        self.tets
            .iter()
            .all(|t| t.adj.iter().flatten().all(|g| g.perm.sign() < 0))
    }

    pub fn is_connected(&self) -> bool {
        self.count_components() <= 1
    }

    pub fn has_boundary_triangles(&self) -> bool {
        self.tets.iter().any(Tetrahedron::has_boundary)
    }

    pub fn count_boundary_triangles(&self) -> usize {
        self.tets
            .iter()
            .map(|t| t.adj.iter().filter(|g| g.is_none()).count())
            .sum()
    }

    /// True if some vertex link is a closed surface other than a sphere.
    pub fn is_ideal(&self) -> bool {
        self.skeleton().vertices.iter().any(Vertex::is_ideal)
    }

    /// True if there are no boundary components of any kind.
    pub fn is_closed(&self) -> bool {
        self.skeleton().boundary_components.is_empty()
    }

    /// True if every vertex link is a sphere, disc, torus or Klein bottle.
    pub fn is_standard(&self) -> bool {
        self.skeleton().vertices.iter().all(|v| {
            matches!(
                v.link,
                VertexLinkType::Sphere
                    | VertexLinkType::Disc
                    | VertexLinkType::Torus
                    | VertexLinkType::KleinBottle
            )
        })
    }

    /// True if some boundary component is real (made of boundary triangles).
    pub fn has_real_boundary(&self) -> bool {
        self.has_boundary_triangles()
    }

    /// Euler characteristic of the triangulation as a cell complex.
    pub fn euler_char_tri(&self) -> i64 {
        self.count_vertices() as i64 - self.count_edges() as i64 + self.count_triangles() as i64
            - self.size() as i64
    }

    /// Euler characteristic of the compact manifold (ideal vertices
    /// truncated).
    pub fn euler_char_manifold(&self) -> i64 {
        let mut chi = self.euler_char_tri();
        for v in &self.skeleton().vertices {
            if v.is_ideal() {
                chi += v.link_euler - 1;
            }
        }
        chi
    }
}

impl InvalidateCache for Triangulation {
    fn invalidate_cache(&mut self) {
        self.skeleton.take();
        self.props.invalidate_cache();
    }
}

impl DebugInvariants for Triangulation {
    const KIND: &'static str = "Triangulation";

    fn validate_invariants(&self) -> Result<(), TriError> {
        for (t, tet) in self.tets.iter().enumerate() {
            for f in 0..4 {
                let Some(g) = tet.adj[f] else { continue };
                if g.tet >= self.tets.len() {
                    return Err(TriError::ImpossibleScenario(format!(
                        "tetrahedron {t} facet {f} glued to missing tetrahedron {}",
                        g.tet
                    )));
                }
                let back = self.tets[g.tet].adj[g.perm.apply(f)];
                if back != Some(Gluing::new(t, g.perm.inverse())) {
                    return Err(TriError::ImpossibleScenario(format!(
                        "gluing of tetrahedron {t} facet {f} is not involutive"
                    )));
                }
                if g.tet == t && g.perm.apply(f) == f {
                    return Err(TriError::ImpossibleScenario(format!(
                        "facet {f} of tetrahedron {t} is glued to itself"
                    )));
                }
                if tet.is_facet_locked(f) != self.tets[g.tet].is_facet_locked(g.perm.apply(f)) {
                    return Err(TriError::ImpossibleScenario(format!(
                        "facet lock of tetrahedron {t} facet {f} is one-sided"
                    )));
                }
            }
        }
        Ok(())
    }
}
