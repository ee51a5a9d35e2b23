//! Greedy and randomised simplification, plus boundary and vertex
//! minimisation.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::progress::{self, ProgressTracker};
use crate::tri_error::TriError;
use crate::triangulation::{BoundaryComponent, Triangulation};

/// Tuning knobs for [`Triangulation::intelligent_simplify`].
#[derive(Debug, Clone)]
pub struct SimplifyConfig {
    /// Seed for the random 4-4 walk.
    pub rng_seed: u64,
    /// Random 4-4 moves tried per tetrahedron before a plateau is accepted.
    pub four_four_attempts: usize,
    /// Try opening and closing books when there are boundary triangles.
    pub use_book_moves: bool,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            four_four_attempts: 5,
            use_book_moves: true,
        }
    }
}

/// A legal move that is blocked by a lock counts as unavailable.
fn attempt(result: Result<bool, TriError>) -> Result<bool, TriError> {
    match result {
        Err(TriError::LockViolation(_)) => Ok(false),
        other => other,
    }
}

fn has_minimal_vertex_count(bc: &BoundaryComponent) -> bool {
    !bc.is_real() || bc.vertices.len() <= 1 || bc.count_triangles() <= 2
}

impl Triangulation {
    /// Simplify with the default [`SimplifyConfig`]. Returns true if the
    /// triangulation changed; otherwise it is left untouched.
    pub fn simplify(&mut self) -> Result<bool, TriError> {
        self.intelligent_simplify(&SimplifyConfig::default(), None)
    }

    /// Reduce to a local minimum, then escape plateaus with random 4-4
    /// moves and, on bounded triangulations, book moves. Every accepted
    /// step strictly decreases the number of tetrahedra or, failing that,
    /// the number of boundary triangles.
    pub fn intelligent_simplify(
        &mut self,
        config: &SimplifyConfig,
        tracker: Option<&ProgressTracker>,
    ) -> Result<bool, TriError> {
        let initial = self.size();
        let mut changed = self.local_minimum(true, tracker)?;
        let mut rng = SmallRng::seed_from_u64(config.rng_seed);
        loop {
            if self.four_four_walk(config, &mut rng, tracker)? {
                changed = true;
                continue;
            }
            if config.use_book_moves && self.has_boundary_triangles() && self.book_moves(tracker)? {
                changed = true;
                continue;
            }
            break;
        }
        log::debug!("simplified {initial} tetrahedra down to {}", self.size());
        Ok(changed)
    }

    /// Apply size-reducing moves greedily until none is left: 3-2, 2-0 and
    /// 2-1 around low-degree edges, 2-0 and 4-1 about vertices, boundary
    /// shelling, then edge collapse. With `perform` unset, only report
    /// whether such a move exists.
    pub fn simplify_to_local_minimum(&mut self, perform: bool) -> Result<bool, TriError> {
        self.local_minimum(perform, None)
    }

    fn local_minimum(&mut self, perform: bool, tracker: Option<&ProgressTracker>) -> Result<bool, TriError> {
        if !perform {
            return self.reduce_once(false);
        }
        let mut changed = false;
        loop {
            progress::poll(tracker)?;
            if !self.reduce_once(true)? {
                return Ok(changed);
            }
            changed = true;
        }
    }

    fn reduce_once(&mut self, perform: bool) -> Result<bool, TriError> {
        for e in 0..self.count_edges() {
            let done = match self.edge(e).degree() {
                3 => attempt(self.pachner_edge(e, true, perform))?,
                2 => attempt(self.two_zero_edge(e, true, perform))?,
                1 => {
                    attempt(self.two_one(e, 0, true, perform))?
                        || attempt(self.two_one(e, 1, true, perform))?
                }
                _ => false,
            };
            if done {
                return Ok(true);
            }
        }
        for v in 0..self.count_vertices() {
            if attempt(self.two_zero_vertex(v, true, perform))?
                || attempt(self.pachner_vertex(v, true, perform))?
            {
                return Ok(true);
            }
        }
        if self.has_boundary_triangles() {
            for t in 0..self.size() {
                if attempt(self.shell_boundary(t, true, perform))? {
                    return Ok(true);
                }
            }
        }
        for e in 0..self.count_edges() {
            if attempt(self.collapse_edge(e, true, perform))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Random walk of 4-4 moves on a copy. The copy replaces `self` as soon
    /// as a local minimum below the current size is reached.
    fn four_four_walk(
        &mut self,
        config: &SimplifyConfig,
        rng: &mut SmallRng,
        tracker: Option<&ProgressTracker>,
    ) -> Result<bool, TriError> {
        let mut scratch = self.clone();
        for _ in 0..config.four_four_attempts * self.size() {
            progress::poll(tracker)?;
            let mut moves = Vec::new();
            for e in 0..scratch.count_edges() {
                for axis in 0..2 {
                    if scratch.four_four(e, axis, true, false)? {
                        moves.push((e, axis));
                    }
                }
            }
            if moves.is_empty() {
                return Ok(false);
            }
            let (e, axis) = moves[rng.gen_range(0..moves.len())];
            if !attempt(scratch.four_four(e, axis, true, true))? {
                continue;
            }
            if scratch.local_minimum(true, tracker)? {
                self.swap(&mut scratch);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Try each book opening and closing on a copy, keeping the first that
    /// leads somewhere strictly simpler.
    fn book_moves(&mut self, tracker: Option<&ProgressTracker>) -> Result<bool, TriError> {
        let current = (self.size(), self.count_boundary_triangles());
        for f in 0..self.count_triangles() {
            progress::poll(tracker)?;
            if !self.open_book(f, true, false)? {
                continue;
            }
            let mut scratch = self.clone();
            if attempt(scratch.open_book(f, true, true))?
                && scratch.local_minimum(true, tracker)?
                && scratch.size() < current.0
            {
                self.swap(&mut scratch);
                return Ok(true);
            }
        }
        for e in 0..self.count_edges() {
            progress::poll(tracker)?;
            if !self.edge(e).boundary || !self.close_book(e, true, false)? {
                continue;
            }
            let mut scratch = self.clone();
            if !attempt(scratch.close_book(e, true, true))? {
                continue;
            }
            scratch.local_minimum(true, tracker)?;
            if (scratch.size(), scratch.count_boundary_triangles()) < current {
                self.swap(&mut scratch);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True if every real boundary component has a single vertex, or is a
    /// two-triangle sphere or projective plane.
    pub fn has_minimal_boundary(&self) -> bool {
        self.skeleton()
            .boundary_components
            .iter()
            .all(has_minimal_vertex_count)
    }

    /// True if the boundary is minimal, no component with boundary has an
    /// internal vertex, and every closed component has exactly one vertex.
    pub fn has_minimal_vertices(&self) -> bool {
        if !self.has_minimal_boundary() {
            return false;
        }
        let sk = self.skeleton();
        let mut internal = vec![0usize; sk.components.len()];
        for v in &sk.vertices {
            if !v.is_boundary() {
                internal[v.component] += 1;
            }
        }
        sk.components
            .iter()
            .zip(&internal)
            .all(|(c, &n)| if c.boundary_components.is_empty() { n == 1 } else { n == 0 })
    }

    /// Reduce every real boundary component to as few vertices as
    /// possible using book closures, layering a tetrahedron first where no
    /// closure is available. The triangulation must be valid.
    pub fn minimise_boundary(&mut self) -> Result<bool, TriError> {
        if !self.is_valid() {
            return Err(TriError::FailedPrecondition(
                "boundary minimisation needs a valid triangulation".into(),
            ));
        }
        let mut changed = false;
        loop {
            let target = self
                .skeleton()
                .boundary_components
                .iter()
                .find(|bc| !has_minimal_vertex_count(bc))
                .map(|bc| bc.edges.clone());
            let Some(edges) = target else {
                return Ok(changed);
            };
            changed = true;

            let mut closed = false;
            for &e in &edges {
                if attempt(self.close_book(e, true, true))? {
                    closed = true;
                    break;
                }
            }
            if closed {
                continue;
            }

            // Layering over an edge with distinct ends makes the new
            // opposite edge closable.
            let e = edges
                .iter()
                .copied()
                .find(|&e| {
                    let ends = self.edge(e).vertices;
                    ends[0] != ends[1]
                })
                .ok_or_else(|| {
                    TriError::ImpossibleScenario(
                        "boundary component with several vertices has no edge between two of them".into(),
                    )
                })?;
            let new = self.layer_on(e)?;
            let opposite = self.tet_edge(new, 5);
            if !self.close_book(opposite, true, true)? {
                return Err(TriError::ImpossibleScenario(format!(
                    "layering over edge {e} did not produce a closable book"
                )));
            }
        }
    }

    /// Minimise the boundary, then remove internal vertices by collapsing
    /// edges. Where no collapse is legal an edge is pinched instead, which
    /// adds two tetrahedra.
    pub fn minimise_vertices(&mut self) -> Result<bool, TriError> {
        let mut changed = self.minimise_boundary()?;
        loop {
            let candidates: Vec<usize> = (0..self.count_edges())
                .filter(|&e| {
                    let [a, b] = self.edge(e).vertices;
                    a != b && !(self.vertex(a).is_boundary() && self.vertex(b).is_boundary())
                })
                .collect();
            let Some(&fallback) = candidates.first() else {
                return Ok(changed);
            };
            changed = true;

            let mut collapsed = false;
            for &e in &candidates {
                if attempt(self.collapse_edge(e, true, true))? {
                    collapsed = true;
                    break;
                }
            }
            if !collapsed {
                log::warn!("no edge collapse reduces the vertex count; pinching edge {fallback}");
                self.pinch_edge(fallback)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maths::perm::Perm4;
    use crate::triangulation::example;

    fn random_two_three(tri: &mut Triangulation, moves: usize, seed: u64) {
        let mut rng = SmallRng::seed_from_u64(seed);
        for _ in 0..moves {
            let legal: Vec<usize> = (0..tri.count_triangles())
                .filter(|&f| tri.pachner_triangle(f, true, false).unwrap())
                .collect();
            let f = legal[rng.gen_range(0..legal.len())];
            assert!(tri.pachner_triangle(f, true, true).unwrap());
        }
    }

    #[test]
    fn local_minimum_undoes_a_subdivision() {
        let mut tri = example::figure_eight();
        assert!(!tri.simplify_to_local_minimum(false).unwrap());
        tri.pachner_tet(0, true, true).unwrap();
        assert!(tri.simplify_to_local_minimum(false).unwrap());
        assert_eq!(tri.size(), 5);
        assert!(tri.simplify_to_local_minimum(true).unwrap());
        assert_eq!(tri.size(), 2);
        assert_eq!(tri.homology().to_string(), "Z");
    }

    #[test]
    fn simplify_recovers_minimal_triangulations() {
        for seed in 0..3 {
            let mut phs = example::poincare_homology_sphere();
            random_two_three(&mut phs, 6, seed);
            assert_eq!(phs.size(), 11);
            assert!(phs.simplify().unwrap());
            assert_eq!(phs.size(), 5);
            assert!(phs.homology().is_trivial());

            let mut fig8 = example::figure_eight();
            random_two_three(&mut fig8, 5, seed);
            assert!(fig8.simplify().unwrap());
            assert_eq!(fig8.size(), 2);
            assert!(fig8.is_ideal());
        }
    }

    #[test]
    fn simplify_shrinks_the_three_tetrahedron_rp3() {
        let mut tri = example::lens(2, 1).unwrap();
        assert_eq!(tri.size(), 3);
        assert!(tri.simplify().unwrap());
        assert_eq!(tri.size(), 2);
        assert_eq!(tri.homology().to_string(), "Z_2");
    }

    #[test]
    fn minimal_triangulations_are_left_alone() {
        let original = example::poincare_homology_sphere();
        let mut tri = original.clone();
        assert!(!tri.simplify().unwrap());
        assert!(tri.is_identical_to(&original));
    }

    #[test]
    fn cancelled_simplification_reports_cancelled() {
        let mut tri = example::poincare_homology_sphere();
        random_two_three(&mut tri, 2, 9);
        let tracker = ProgressTracker::new();
        tracker.cancel();
        let result = tri.intelligent_simplify(&SimplifyConfig::default(), Some(&tracker));
        assert_eq!(result, Err(TriError::Cancelled));
    }

    #[test]
    fn boundary_minimisation() {
        let mut ball = example::ball();
        assert!(!ball.has_minimal_boundary());
        assert!(ball.minimise_boundary().unwrap());
        assert!(ball.has_minimal_boundary());
        assert_eq!(ball.count_boundary_triangles(), 2);

        let mut solid_torus = example::lst(1, 2).unwrap();
        assert!(solid_torus.has_minimal_boundary());
        assert!(!solid_torus.minimise_boundary().unwrap());

        // Cone over a six-triangle torus; no book closes until a layer is added.
        let mut cone = Triangulation::from_isosig("gffjQafeefaaaa").unwrap();
        let homology = cone.homology().to_string();
        assert!(!cone.has_minimal_boundary());
        assert!(cone.minimise_boundary().unwrap());
        assert!(cone.has_minimal_boundary());
        assert_eq!(cone.count_boundary_triangles(), 2);
        assert!(cone.size() > 6);
        assert_eq!(cone.homology().to_string(), homology);
    }

    #[test]
    fn vertex_minimisation() {
        let mut fig8 = example::figure_eight();
        fig8.pachner_tet(0, true, true).unwrap();
        fig8.pachner_tet(1, true, true).unwrap();
        assert!(!fig8.has_minimal_vertices());
        assert!(fig8.minimise_vertices().unwrap());
        assert!(fig8.has_minimal_vertices());
        assert_eq!(fig8.count_vertices(), 1);
        assert_eq!(fig8.homology().to_string(), "Z");

        let mut phs = example::poincare_homology_sphere();
        assert!(phs.has_minimal_vertices());
        assert!(!phs.minimise_vertices().unwrap());
        phs.pachner_tet(0, true, true).unwrap();
        phs.pachner_tet(3, true, true).unwrap();
        assert!(phs.minimise_vertices().unwrap());
        assert_eq!(phs.count_vertices(), 1);
        assert!(phs.homology().is_trivial());
    }

    #[test]
    fn invalid_triangulations_are_rejected() {
        // Edge 23 is glued to itself in reverse.
        let mut tri = Triangulation::from_gluings(1, &[(0, 0, 0, Perm4::new_unchecked([1, 0, 3, 2]))]).unwrap();
        assert!(!tri.is_valid());
        assert!(matches!(tri.minimise_boundary(), Err(TriError::FailedPrecondition(_))));
        assert!(matches!(tri.minimise_vertices(), Err(TriError::FailedPrecondition(_))));
    }
}
