//! Recognition of manifolds and of properties of triangulations that need
//! normal surface theory.
//!
//! Every routine caches its answer in the [`PropertyCache`]. Properties of
//! the manifold (3-sphere, ball, handlebody genus, irreducibility, Haken,
//! T² × I, compressing discs) survive topology-preserving moves; properties
//! of the triangulation itself (0-efficiency, splitting surfaces) do not.
//!
//! [`PropertyCache`]: crate::triangulation::PropertyCache

use std::sync::Arc;

use itertools::iproduct;

use crate::maths::perm::Perm4;
use crate::surfaces::{NormalAlg, NormalCoords, NormalList, NormalSurface, NormalSurfaces};
use crate::tri_error::TriError;
use crate::triangulation::{CloneOptions, Triangulation};

/// Coset enumeration gives up beyond this many cosets.
const COSET_LIMIT: usize = 5_000;

/// Standard embedded vertex surfaces, via quad-to-standard conversion.
fn standard_vertex_surfaces(tri: &Triangulation) -> Result<NormalSurfaces, TriError> {
    NormalSurfaces::enumerate(
        Arc::new(tri.clone_with(CloneOptions::default())),
        NormalCoords::Standard,
        NormalList::default(),
        NormalAlg::QuadToStandard,
        None,
    )
}

fn cache(slot: &once_cell::sync::OnceCell<bool>, value: bool) -> bool {
    *slot.get_or_init(|| value)
}

impl Triangulation {
    /// An unlocked copy without cached properties, for destructive work.
    fn working_copy(&self) -> Triangulation {
        self.clone_with(CloneOptions {
            locks: false,
            properties: false,
        })
    }

    /// A normal sphere or disc that is not vertex-linking, if any standard
    /// vertex surface is one. A one-sided projective plane is returned
    /// doubled (as a sphere).
    pub fn nontrivial_sphere_or_disc(&self) -> Result<Option<NormalSurface>, TriError> {
        for s in &standard_vertex_surfaces(self)? {
            if s.is_vertex_linking() {
                continue;
            }
            let chi = s.euler_char()?;
            if chi == 2 {
                return Ok(Some(s.clone()));
            }
            if chi == 1 {
                if s.has_real_boundary() {
                    return Ok(Some(s.clone()));
                }
                if !s.is_two_sided()? {
                    return Ok(Some(s.double_surface()));
                }
            }
        }
        Ok(None)
    }

    // ---------------------------------------------------------------------
    // Properties of the triangulation
    // ---------------------------------------------------------------------

    /// True if the only normal spheres are vertex links, the only normal
    /// discs are vertex links, and there are no normal projective planes.
    ///
    /// # Errors
    /// `FailedPrecondition` for invalid or ideal triangulations.
    pub fn is_zero_efficient(&self) -> Result<bool, TriError> {
        if let Some(&v) = self.props.zero_efficient.get() {
            return Ok(v);
        }
        if !self.is_valid() || self.is_ideal() {
            return Err(TriError::FailedPrecondition(
                "0-efficiency is only defined for valid non-ideal triangulations".into(),
            ));
        }
        let sphere_boundary = self
            .skeleton()
            .boundary_components
            .iter()
            .any(|bc| bc.is_real() && bc.euler_char() == 2);
        let ans = !sphere_boundary && self.nontrivial_sphere_or_disc()?.is_none();
        Ok(cache(&self.props.zero_efficient, ans))
    }

    /// True if some standard vertex surface is a splitting surface.
    pub fn has_splitting_surface(&self) -> Result<bool, TriError> {
        if let Some(&v) = self.props.splitting_surface.get() {
            return Ok(v);
        }
        let ans = standard_vertex_surfaces(self)?.iter().any(NormalSurface::is_splitting);
        Ok(cache(&self.props.splitting_surface, ans))
    }

    // ---------------------------------------------------------------------
    // Compressing discs
    // ---------------------------------------------------------------------

    /// True if the manifold has a compressing disc.
    ///
    /// Triangulations without boundary triangles, or whose boundary is
    /// all spheres, have none. Otherwise a simplified copy is searched: a
    /// one-tetrahedron solid torus always has one, and any other
    /// compressing disc shows up among the standard vertex surfaces.
    pub fn has_compressing_disc(&self) -> Result<bool, TriError> {
        if let Some(&v) = self.props.compressing_disc.get() {
            return Ok(v);
        }
        if !self.has_boundary_triangles() || !self.is_valid() || self.is_ideal() {
            return Ok(false);
        }
        let min_chi = self
            .skeleton()
            .boundary_components
            .iter()
            .map(|bc| bc.euler_char())
            .min()
            .unwrap_or(2);
        if min_chi == 2 {
            return Ok(cache(&self.props.compressing_disc, false));
        }

        let mut work = self.working_copy();
        work.simplify()?;
        let mut ans = false;
        for piece in work.split_into_components() {
            if !piece.has_boundary_triangles() {
                continue;
            }
            if piece.size() == 1 && piece.count_triangles() == 3 && piece.count_vertices() == 1 {
                ans = true;
                break;
            }
            let mut found = false;
            for s in &standard_vertex_surfaces(&piece)? {
                if s.is_compressing_disc(true)? {
                    found = true;
                    break;
                }
            }
            if found {
                ans = true;
                break;
            }
        }
        Ok(cache(&self.props.compressing_disc, ans))
    }

    // ---------------------------------------------------------------------
    // 3-spheres and balls
    // ---------------------------------------------------------------------

    /// Crush non-trivial normal spheres until every piece is 0-efficient.
    /// Pieces that crush away entirely are dropped; the rest are returned
    /// simplified.
    fn crush_to_zero_efficient(&self) -> Result<Vec<Triangulation>, TriError> {
        let mut start = self.working_copy();
        start.simplify()?;
        let mut queue = vec![start];
        let mut done = Vec::new();
        while let Some(piece) = queue.pop() {
            match piece.nontrivial_sphere_or_disc()? {
                Some(sphere) => {
                    let crushed = sphere.crush()?;
                    log::debug!("crushed a normal sphere: {} -> {} tetrahedra", piece.size(), crushed.size());
                    for mut part in crushed.split_into_components() {
                        part.simplify()?;
                        queue.push(part);
                    }
                }
                None => done.push(piece),
            }
        }
        Ok(done)
    }

    /// True if some octagonal almost normal sphere appears among the
    /// quad-oct vertex surfaces.
    fn has_octagonal_sphere(&self) -> Result<bool, TriError> {
        let list = NormalSurfaces::enumerate(
            Arc::new(self.clone_with(CloneOptions::default())),
            NormalCoords::QuadOct,
            NormalList::default(),
            NormalAlg::default(),
            None,
        )?;
        for s in &list {
            if s.oct_position().is_some() && s.is_compact() && s.euler_char()? == 2 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True if this is a triangulation of the 3-sphere.
    ///
    /// Quick answers come from the fundamental group and homology. Failing
    /// those, non-trivial spheres are crushed away. A 0-efficient closed
    /// piece with more than one vertex is a 3-sphere, and a one-vertex
    /// piece is one exactly when it holds an octagonal almost normal
    /// sphere.
    pub fn is_three_sphere(&self) -> Result<bool, TriError> {
        if let Some(&v) = self.props.three_sphere.get() {
            return Ok(v);
        }
        let ans = self.compute_three_sphere()?;
        Ok(cache(&self.props.three_sphere, ans))
    }

    fn compute_three_sphere(&self) -> Result<bool, TriError> {
        if self.is_empty() || !self.is_valid() || !self.is_closed() || !self.is_orientable() || !self.is_connected() {
            return Ok(false);
        }
        let mut work = self.working_copy();
        work.simplify()?;
        let group = work.fundamental_group();
        if group.count_generators() == 0 {
            return Ok(true);
        }
        if !work.homology().is_trivial() {
            return Ok(false);
        }
        if let Some(order) = group.order(COSET_LIMIT) {
            return Ok(order == 1);
        }

        for piece in work.crush_to_zero_efficient()? {
            if !piece.homology().is_trivial() {
                return Ok(false);
            }
            if piece.count_vertices() > 1 {
                continue;
            }
            if !piece.has_octagonal_sphere()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Cone every real boundary component to a single new vertex. Returns
    /// true if anything changed.
    ///
    /// Each boundary triangle gets a new tetrahedron whose facet 3 is glued
    /// to it; the side facets of these cones are glued to each other across
    /// the boundary edges.
    pub fn finite_to_ideal(&mut self) -> Result<bool, TriError> {
        if !self.has_boundary_triangles() {
            return Ok(false);
        }
        let faces: Vec<(usize, usize, Perm4)> = iproduct!(0..self.size(), 0..4)
            .filter(|&(t, f)| self.adjacent(t, f).is_none())
            .map(|(t, f)| (t, f, self.tet_triangle_mapping(t, f)))
            .collect();
        // (front tet, front facet, front ends, back tet, back facet, back ends),
        // where the ends are the tetrahedron vertices at edge vertices 0, 1
        // and the third vertex of the boundary triangle.
        let seams: Vec<[(usize, usize, [usize; 3]); 2]> = self
            .skeleton()
            .edges
            .iter()
            .filter(|e| e.boundary)
            .filter_map(|e| {
                let front = e.embeddings.first()?;
                let back = e.embeddings.last()?;
                let (p, q) = (front.perm, back.perm);
                Some([
                    (front.tet, p.apply(3), [p.apply(0), p.apply(1), p.apply(2)]),
                    (back.tet, q.apply(2), [q.apply(0), q.apply(1), q.apply(3)]),
                ])
            })
            .collect();

        let mut cone = hashbrown::HashMap::with_capacity(faces.len());
        let first = self.new_tetrahedra(faces.len()).start;
        for (i, &(t, f, p)) in faces.iter().enumerate() {
            self.join(first + i, 3, t, p)?;
            cone.insert((t, f), (first + i, p));
        }
        for [a, b] in seams {
            let (Some(&(ca, pa)), Some(&(cb, pb))) = (cone.get(&(a.0, a.1)), cone.get(&(b.0, b.1))) else {
                return Err(TriError::ImpossibleScenario(
                    "boundary edge without boundary triangles".into(),
                ));
            };
            let mut images = [3u8; 4];
            for k in 0..3 {
                images[pa.pre(a.2[k])] = pb.pre(b.2[k]) as u8;
            }
            let glue = Perm4::from_images(images)?;
            self.join(ca, pa.pre(a.2[2]), cb, glue)?;
        }
        Ok(true)
    }

    /// True if this is a triangulation of the 3-ball.
    pub fn is_ball(&self) -> Result<bool, TriError> {
        if let Some(&v) = self.props.ball.get() {
            return Ok(v);
        }
        let candidate = self.is_valid()
            && self.has_boundary_triangles()
            && !self.is_ideal()
            && self.is_orientable()
            && self.is_connected()
            && self.count_boundary_components() == 1
            && self.boundary_component(0).euler_char() == 2
            && self.homology().is_trivial();
        let ans = if candidate {
            let mut coned = self.working_copy();
            coned.finite_to_ideal()?;
            coned.is_three_sphere()?
        } else {
            false
        };
        Ok(cache(&self.props.ball, ans))
    }

    // ---------------------------------------------------------------------
    // Handlebodies, summands, Haken and T² × I
    // ---------------------------------------------------------------------

    /// The genus if this is an orientable handlebody, or `None`.
    pub fn handlebody_genus(&self) -> Result<Option<usize>, TriError> {
        if let Some(&v) = self.props.handlebody_genus.get() {
            return Ok(v);
        }
        let ans = self.compute_handlebody_genus()?;
        Ok(*self.props.handlebody_genus.get_or_init(|| ans))
    }

    fn compute_handlebody_genus(&self) -> Result<Option<usize>, TriError> {
        if !self.is_valid()
            || self.is_ideal()
            || !self.is_orientable()
            || !self.is_connected()
            || !self.has_boundary_triangles()
            || self.count_boundary_components() != 1
        {
            return Ok(None);
        }
        let chi = self.boundary_component(0).euler_char();
        if chi > 2 || chi % 2 != 0 {
            return Ok(None);
        }
        let genus = ((2 - chi) / 2) as usize;
        let h1 = self.homology();
        if h1.rank() != genus || !h1.torsion().is_empty() {
            return Ok(None);
        }
        if genus == 0 {
            return Ok(self.is_ball()?.then_some(0));
        }

        let mut work = self.working_copy();
        work.simplify()?;
        let mut disc = None;
        for s in &standard_vertex_surfaces(&work)? {
            if s.is_compressing_disc(false)? {
                disc = Some(s.clone());
                break;
            }
        }
        let Some(disc) = disc else {
            return Ok(None);
        };
        let mut cut = disc.cut_along()?;
        cut.simplify()?;
        let mut total = 0;
        let pieces = cut.split_into_components();
        for piece in &pieces {
            match piece.handlebody_genus()? {
                Some(g) => total += g,
                None => return Ok(None),
            }
        }
        // A non-separating disc drops the genus by one; a separating disc
        // splits it between the two sides.
        let expected = if pieces.len() == 1 { genus - 1 } else { genus };
        Ok((total == expected).then_some(genus))
    }

    /// Split along non-trivial normal spheres into 0-efficient pieces and
    /// report the prime summands that are not 3-spheres, plus how many
    /// S² × S¹ and RP³ summands vanished along the way.
    ///
    /// # Errors
    /// `FailedPrecondition` unless the triangulation is valid, closed,
    /// orientable and connected.
    pub fn summands(&self) -> Result<Summands, TriError> {
        if !self.is_valid() || !self.is_closed() || !self.is_orientable() || !self.is_connected() {
            return Err(TriError::FailedPrecondition(
                "connected sum decomposition needs a valid closed orientable connected triangulation".into(),
            ));
        }
        let before = self.homology();
        let mut pieces = Vec::new();
        let (mut rank, mut z2) = (0, 0);
        for piece in self.crush_to_zero_efficient()? {
            if piece.is_three_sphere()? {
                continue;
            }
            let h = piece.homology();
            rank += h.rank();
            z2 += count_z2_factors(h.torsion());
            pieces.push(piece);
        }
        Ok(Summands {
            pieces,
            lost_s2xs1: before.rank().saturating_sub(rank),
            lost_rp3: count_z2_factors(before.torsion()).saturating_sub(z2),
        })
    }

    /// True if every embedded 2-sphere bounds a ball.
    pub fn is_irreducible(&self) -> Result<bool, TriError> {
        if let Some(&v) = self.props.irreducible.get() {
            return Ok(v);
        }
        let s = self.summands()?;
        let ans = s.lost_s2xs1 == 0 && s.pieces.len() + s.lost_rp3 <= 1;
        Ok(cache(&self.props.irreducible, ans))
    }

    /// True if this closed orientable irreducible manifold contains a
    /// closed incompressible surface other than a sphere.
    ///
    /// Infinite first homology settles it at once. Otherwise each standard
    /// vertex surface (doubled if one-sided) is tested for
    /// incompressibility.
    pub fn is_haken(&self) -> Result<bool, TriError> {
        if let Some(&v) = self.props.haken.get() {
            return Ok(v);
        }
        let ans = self.compute_haken()?;
        Ok(cache(&self.props.haken, ans))
    }

    fn compute_haken(&self) -> Result<bool, TriError> {
        if !self.is_irreducible()? {
            return Ok(false);
        }
        if self.homology().rank() > 0 {
            return Ok(true);
        }
        let mut work = self.working_copy();
        work.simplify()?;
        let list = standard_vertex_surfaces(&work)?;
        for s in &list {
            if s.is_vertex_linking() || !s.is_connected()? {
                continue;
            }
            let s = if s.is_two_sided()? { s.clone() } else { s.double_surface() };
            if s.euler_char()? >= 2 {
                continue;
            }
            if s.is_incompressible()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// A quick test for the product of the torus and an interval: two torus
    /// boundary components, first homology Z², and no compressing disc.
    /// A `true` is evidence rather than proof.
    pub fn is_txi(&self) -> Result<bool, TriError> {
        if let Some(&v) = self.props.txi.get() {
            return Ok(v);
        }
        let sk = self.skeleton();
        let shape = self.is_valid()
            && self.is_orientable()
            && self.is_connected()
            && !self.is_ideal()
            && sk.boundary_components.len() == 2
            && sk.boundary_components.iter().all(|bc| bc.is_real() && bc.euler_char() == 0);
        let h1 = self.homology();
        let ans = shape && h1.rank() == 2 && h1.torsion().is_empty() && !self.has_compressing_disc()?;
        Ok(cache(&self.props.txi, ans))
    }
}

/// Result of [`Triangulation::summands`].
#[derive(Debug, Default)]
pub struct Summands {
    /// 0-efficient prime pieces that are not 3-spheres.
    pub pieces: Vec<Triangulation>,
    pub lost_s2xs1: usize,
    pub lost_rp3: usize,
}

/// Number of Z₂ factors in the primary decomposition.
fn count_z2_factors(torsion: &[crate::maths::integer::Integer]) -> usize {
    let two = crate::maths::integer::Integer::new(2);
    let four = crate::maths::integer::Integer::new(4);
    torsion
        .iter()
        .filter(|d| {
            d.div_mod(&two).is_ok_and(|(_, r)| r.is_zero()) && d.div_mod(&four).is_ok_and(|(_, r)| !r.is_zero())
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maths::integer::Integer;
    use crate::triangulation::example;

    #[test]
    fn spheres_and_their_impostors() {
        assert!(example::three_sphere().is_three_sphere().unwrap());
        assert!(example::sphere_two_vertex().is_three_sphere().unwrap());
        assert!(example::lens(1, 0).unwrap().is_three_sphere().unwrap());
        assert!(!example::poincare_homology_sphere().is_three_sphere().unwrap());
        assert!(!example::lens(5, 2).unwrap().is_three_sphere().unwrap());
        assert!(!example::figure_eight().is_three_sphere().unwrap());
        assert!(!Triangulation::new().is_three_sphere().unwrap());
    }

    #[test]
    fn coning_a_ball_gives_a_sphere() {
        let mut coned = example::ball();
        assert!(coned.finite_to_ideal().unwrap());
        assert_eq!(coned.size(), 5);
        assert!(coned.is_closed());
        assert!(coned.is_valid());
        assert!(!coned.finite_to_ideal().unwrap());

        assert!(example::ball().is_ball().unwrap());
        assert!(!example::lst(1, 2).unwrap().is_ball().unwrap());
        assert!(!example::three_sphere().is_ball().unwrap());
    }

    #[test]
    fn coning_a_solid_torus_leaves_an_ideal_vertex() {
        let mut t = example::lst(2, 3).unwrap();
        let n = t.size();
        let boundary = t.count_boundary_triangles();
        t.finite_to_ideal().unwrap();
        assert_eq!(t.size(), n + boundary);
        assert!(t.is_ideal());
        assert!(t.is_valid());
        assert!(t.homology().is_z());
    }

    #[test]
    fn solid_tori_compress_and_are_genus_one() {
        let lst = example::lst(1, 2).unwrap();
        assert!(lst.has_compressing_disc().unwrap());
        assert_eq!(lst.handlebody_genus().unwrap(), Some(1));
        assert!(example::lst(2, 3).unwrap().has_compressing_disc().unwrap());
        assert!(!example::twisted_kxi().has_compressing_disc().unwrap());
        assert!(!example::ball().has_compressing_disc().unwrap());
        assert_eq!(example::ball().handlebody_genus().unwrap(), Some(0));
        assert_eq!(example::twisted_kxi().handlebody_genus().unwrap(), None);
    }

    #[test]
    fn zero_efficiency_and_splitting_surfaces() {
        assert!(example::poincare_homology_sphere().is_zero_efficient().unwrap());
        assert!(!example::ball().is_zero_efficient().unwrap());
        assert!(!example::lens(0, 1).unwrap().is_zero_efficient().unwrap());
        assert!(example::figure_eight().is_zero_efficient().is_err());

        for tri in [example::lst(1, 2).unwrap(), example::layered_loop(3, true), example::three_sphere()] {
            let any = standard_vertex_surfaces(&tri).unwrap().iter().any(NormalSurface::is_splitting);
            assert_eq!(tri.has_splitting_surface().unwrap(), any);
            assert_eq!(tri.props.splitting_surface.get(), Some(&any));
        }
    }

    #[test]
    fn irreducibility_of_small_manifolds() {
        for tri in [example::three_sphere(), example::poincare_homology_sphere(), example::lens(5, 2).unwrap()] {
            assert!(tri.is_irreducible().unwrap());
            assert!(!tri.is_haken().unwrap());
        }
        let s2xs1 = example::lens(0, 1).unwrap();
        assert!(!s2xs1.is_irreducible().unwrap());
        assert!(!s2xs1.is_haken().unwrap());
        assert!(example::twisted_kxi().summands().is_err());
    }

    #[test]
    fn torus_times_interval_needs_two_tori() {
        assert!(!example::twisted_kxi().is_txi().unwrap());
        assert!(!example::lst(1, 2).unwrap().is_txi().unwrap());
    }

    #[test]
    fn z2_factors_count_primary_parts() {
        let t: Vec<Integer> = [2, 6, 4, 12].into_iter().map(Integer::new).collect();
        assert_eq!(count_z2_factors(&t), 2);
    }
}
