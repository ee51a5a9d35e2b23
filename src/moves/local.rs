//! Small local moves: 4-4, 2-0 about an edge or vertex, and 2-1.

use crate::maths::perm::{EDGE_NUMBER, Perm4};
use crate::tri_error::TriError;
use crate::triangulation::{Triangulation, VertexLinkType};

impl Triangulation {
    /// Size of the connected component containing tetrahedron `t`.
    fn component_size_of(&self, t: usize) -> usize {
        let sk = self.skeleton();
        sk.components[sk.tet_component[t]].size()
    }

    /// 4-4 move about an internal degree-4 edge surrounded by four distinct
    /// tetrahedra. `new_axis` (0 or 1) picks which of the two diagonals of
    /// the surrounding octahedron becomes the new central edge.
    pub fn four_four(
        &mut self,
        e: usize,
        new_axis: usize,
        check: bool,
        perform: bool,
    ) -> Result<bool, TriError> {
        self.check_edge_index(e)?;
        if new_axis > 1 {
            return Err(TriError::InvalidArgument(format!("axis {new_axis} is not 0 or 1")));
        }
        let edge = self.edge(e).clone();
        if check {
            if edge.boundary || !edge.valid || edge.degree() != 4 {
                return Ok(false);
            }
            let mut tets: Vec<usize> = edge.embeddings.iter().map(|emb| emb.tet).collect();
            tets.sort_unstable();
            tets.dedup();
            if tets.len() != 4 {
                return Ok(false);
            }
        }
        if !perform {
            return Ok(true);
        }
        if edge.degree() != 4 {
            return Err(TriError::FailedPrecondition(format!(
                "edge {e} has degree {}, not 4",
                edge.degree()
            )));
        }

        for emb in &edge.embeddings {
            if self.is_simplex_locked(emb.tet) {
                return Err(TriError::LockViolation(format!("tetrahedron {} is locked", emb.tet)));
            }
            self.ensure_facet_unlocked(emb.tet, emb.perm.apply(2))?;
            self.ensure_facet_unlocked(emb.tet, emb.perm.apply(3))?;
        }

        let pivot = &edge.embeddings[new_axis];
        let triangle = self.tet_triangle(pivot.tet, pivot.perm.apply(2));
        let last = edge.embeddings[3];
        let last_edge = EDGE_NUMBER[last.perm.apply(0)][last.perm.apply(1)];
        // The 2-3 move removes the pivot and the tetrahedron after it.
        let shift = edge.embeddings[new_axis..new_axis + 2]
            .iter()
            .filter(|emb| emb.tet < last.tet)
            .count();

        self.topology_preserving(|tri| -> Result<bool, TriError> {
            if !tri.pachner_triangle(triangle, false, true)? {
                return Err(TriError::ImpossibleScenario(
                    "2-3 step of a 4-4 move failed".into(),
                ));
            }
            let central = tri.tet_edge(last.tet - shift, last_edge);
            if !tri.pachner_edge(central, false, true)? {
                return Err(TriError::ImpossibleScenario(
                    "3-2 step of a 4-4 move failed".into(),
                ));
            }
            Ok(true)
        })
    }

    /// 2-0 move: flatten the two tetrahedra around an internal degree-2
    /// edge onto a single triangle pair.
    pub fn two_zero_edge(&mut self, e: usize, check: bool, perform: bool) -> Result<bool, TriError> {
        self.check_edge_index(e)?;
        let edge = self.edge(e).clone();
        if check && (edge.degree() != 2 || edge.boundary || !edge.valid) {
            return Ok(false);
        }
        if edge.degree() != 2 {
            return Err(TriError::FailedPrecondition(format!(
                "edge {e} has degree {}, not 2",
                edge.degree()
            )));
        }
        let (t0, p0) = (edge.embeddings[0].tet, edge.embeddings[0].perm);
        let (t1, p1) = (edge.embeddings[1].tet, edge.embeddings[1].perm);

        if check {
            if t0 == t1 {
                return Ok(false);
            }
            let opposite = [
                self.tet_edge(t0, EDGE_NUMBER[p0.apply(2)][p0.apply(3)]),
                self.tet_edge(t1, EDGE_NUMBER[p1.apply(2)][p1.apply(3)]),
            ];
            if opposite[0] == opposite[1] {
                return Ok(false);
            }
            if self.edge(opposite[0]).boundary && self.edge(opposite[1]).boundary {
                return Ok(false);
            }
            for i in 0..2 {
                if self.tet_triangle(t0, p0.apply(i)) == self.tet_triangle(t1, p1.apply(i)) {
                    return Ok(false);
                }
            }
            if self.component_size_of(t0) == 2 {
                return Ok(false);
            }
        }
        if !perform {
            return Ok(true);
        }
        self.ensure_all_removable(&[t0, t1])?;

        let crossover = self
            .adjacent_gluing(t0, p0.apply(2))
            .ok_or_else(|| TriError::ImpossibleScenario(format!("edge {e} is not internal")))?;
        self.topology_preserving(|tri| {
            for i in 0..2 {
                tri.flatten_pair(t0, p0.apply(i), t1, p1.apply(i), crossover);
            }
            tri.remove_tetrahedra_raw(vec![t0, t1]);
        });
        Ok(true)
    }

    /// 2-0 move about an internal degree-2 vertex with a sphere link.
    pub fn two_zero_vertex(&mut self, v: usize, check: bool, perform: bool) -> Result<bool, TriError> {
        self.check_vertex_index(v)?;
        let vertex = self.vertex(v).clone();
        if check && (vertex.link != VertexLinkType::Sphere || vertex.degree() != 2) {
            return Ok(false);
        }
        if vertex.degree() != 2 {
            return Err(TriError::FailedPrecondition(format!(
                "vertex {v} has degree {}, not 2",
                vertex.degree()
            )));
        }
        let (t0, v0) = (vertex.embeddings[0].tet, vertex.embeddings[0].vertex);
        let (t1, v1) = (vertex.embeddings[1].tet, vertex.embeddings[1].vertex);

        if check {
            if t0 == t1 {
                return Ok(false);
            }
            let f0 = self.tet_triangle(t0, v0);
            let f1 = self.tet_triangle(t1, v1);
            if f0 == f1 || (self.triangle(f0).is_boundary() && self.triangle(f1).is_boundary()) {
                return Ok(false);
            }
            if (0..4).any(|i| i != v0 && self.adjacent_tet(t0, i) != Some(t1)) {
                return Ok(false);
            }
        }
        if !perform {
            return Ok(true);
        }
        self.ensure_all_removable(&[t0, t1])?;

        let crossover = self
            .adjacent_gluing(t0, if v0 == 0 { 1 } else { 0 })
            .ok_or_else(|| TriError::ImpossibleScenario(format!("vertex {v} is not internal")))?;
        self.topology_preserving(|tri| {
            tri.flatten_pair(t0, v0, t1, v1, crossover);
            tri.remove_tetrahedra_raw(vec![t0, t1]);
        });
        Ok(true)
    }

    /// 2-1 move: merge the tetrahedron containing a degree-1 edge with its
    /// neighbour across the facet opposite end `edge_end` of that edge.
    pub fn two_one(
        &mut self,
        e: usize,
        edge_end: usize,
        check: bool,
        perform: bool,
    ) -> Result<bool, TriError> {
        self.check_edge_index(e)?;
        if edge_end > 1 {
            return Err(TriError::InvalidArgument(format!("edge end {edge_end} is not 0 or 1")));
        }
        let edge = self.edge(e).clone();
        if check && (edge.degree() != 1 || edge.boundary || !edge.valid) {
            return Ok(false);
        }
        let other_end = 1 - edge_end;
        let (old, ov) = (edge.front().tet, edge.front().perm);
        let Some(top_gluing) = self.adjacent(old, ov.apply(edge_end)) else {
            return Ok(false);
        };
        let top = top_gluing.tet;
        let b2t = top_gluing.perm;
        let top_glued = [b2t.apply(ov.apply(2)), b2t.apply(ov.apply(3))];

        if check {
            if self.tet_triangle(old, ov.apply(edge_end)) == self.tet_triangle(old, ov.apply(other_end)) {
                return Ok(false);
            }
            let top_end = b2t.apply(ov.apply(edge_end));
            let flat = [
                self.tet_edge(top, EDGE_NUMBER[top_glued[0]][top_end]),
                self.tet_edge(top, EDGE_NUMBER[top_glued[1]][top_end]),
            ];
            if flat[0] == flat[1] || (self.edge(flat[0]).boundary && self.edge(flat[1]).boundary) {
                return Ok(false);
            }
            if self.tet_triangle(top, top_glued[0]) == self.tet_triangle(top, top_glued[1]) {
                return Ok(false);
            }
        }
        if !perform {
            return Ok(true);
        }
        self.ensure_all_removable(&[old, top])?;

        self.topology_preserving(|tri| {
            // Flatten the top tetrahedron along its two glued facets.
            let adj0 = tri.adjacent(top, top_glued[0]);
            let adj1 = tri.adjacent(top, top_glued[1]);
            match (adj0, adj1) {
                (None, None) => {}
                (None, Some(_)) => {
                    tri.unjoin_raw(top, top_glued[1]);
                }
                (Some(_), None) => {
                    tri.unjoin_raw(top, top_glued[0]);
                }
                (Some(a0), Some(a1)) => {
                    let face0 = a0.perm.apply(top_glued[0]);
                    let gluing =
                        a1.perm * Perm4::swap(top_glued[0], top_glued[1]) * a0.perm.inverse();
                    tri.unjoin_raw(top, top_glued[0]);
                    tri.unjoin_raw(top, top_glued[1]);
                    tri.join_raw(a0.tet, face0, a1.tet, gluing);
                }
            }

            // A single tetrahedron folded around its facet 2 replaces the pair.
            let new = tri.new_tetrahedron_raw(String::new());
            tri.join_raw(new, 2, new, Perm4::swap(2, 3));

            let mut bottom_face_perm = Perm4::new_unchecked([
                ov.apply(edge_end) as u8,
                ov.apply(other_end) as u8,
                ov.apply(2) as u8,
                ov.apply(3) as u8,
            ]);
            let top_face = b2t.apply(ov.apply(other_end));
            if tri.adjacent_tet(old, ov.apply(other_end)) == Some(top) {
                let across = tri
                    .adjacent_gluing(top, top_face)
                    .unwrap_or_else(Perm4::identity);
                let gluing = bottom_face_perm.inverse()
                    * across
                    * b2t
                    * bottom_face_perm
                    * Perm4::swap(0, 1);
                tri.unjoin_raw(top, top_face);
                tri.join_raw(new, 0, new, gluing);
            } else {
                if bottom_face_perm.sign() < 0 {
                    bottom_face_perm = bottom_face_perm * Perm4::swap(2, 3);
                }
                let adj_top = tri.adjacent(top, top_face);
                let adj_bottom = tri.adjacent(old, ov.apply(other_end));
                if let Some(g) = adj_top {
                    tri.unjoin_raw(top, top_face);
                    tri.join_raw(new, 0, g.tet, g.perm * b2t * bottom_face_perm * Perm4::swap(0, 1));
                }
                if let Some(g) = adj_bottom {
                    tri.unjoin_raw(old, ov.apply(other_end));
                    tri.join_raw(new, 1, g.tet, g.perm * bottom_face_perm);
                }
            }
            tri.remove_tetrahedra_raw(vec![old, top]);
        });
        Ok(true)
    }

    /// Glue the outer neighbours of facet `f0` of `t0` and facet `f1` of
    /// `t1` directly to each other, bypassing the pair being removed.
    fn flatten_pair(&mut self, t0: usize, f0: usize, t1: usize, f1: usize, crossover: Perm4) {
        let top = self.adjacent(t0, f0);
        let bottom = self.adjacent(t1, f1);
        match (top, bottom) {
            (None, None) => {}
            (None, Some(_)) => {
                self.unjoin_raw(t1, f1);
            }
            (Some(_), None) => {
                self.unjoin_raw(t0, f0);
            }
            (Some(top), Some(bottom)) => {
                let top_face = top.perm.apply(f0);
                let gluing = bottom.perm * crossover * top.perm.inverse();
                self.unjoin_raw(t0, f0);
                self.unjoin_raw(t1, f1);
                self.join_raw(top.tet, top_face, bottom.tet, gluing);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_invariants::DebugInvariants;
    use crate::triangulation::{CloneOptions, example};

    fn legal_count(tri: &Triangulation, f: impl Fn(&mut Triangulation, usize) -> bool, n: usize) -> usize {
        let mut copy = tri.clone();
        (0..n).filter(|&i| f(&mut copy, i)).count()
    }

    #[test]
    fn four_four_keeps_the_manifold() {
        let tri = example::layered_loop(4, false);
        let legal = legal_count(&tri, |t, e| t.four_four(e, 0, true, false).unwrap(), tri.count_edges());
        assert_eq!(legal, 2);
        let e = (0..tri.count_edges())
            .find(|&e| tri.clone().four_four(e, 1, true, false).unwrap())
            .unwrap();
        let mut moved = tri.clone();
        assert!(moved.four_four(e, 1, true, true).unwrap());
        assert_eq!(moved.size(), 4);
        assert!(moved.is_valid());
        assert_eq!(moved.homology().to_string(), "Z_4");
        assert!(!moved.is_isomorphic_to(&tri));
    }

    fn fresh_homology(tri: &Triangulation) -> String {
        tri.clone_with(CloneOptions { locks: true, properties: false })
            .homology()
            .to_string()
    }

    #[test]
    fn four_four_on_either_axis_keeps_the_manifold() {
        let mut inputs = Vec::new();
        for base in [
            example::layered_loop(4, false),
            example::layered_loop(4, true),
            example::poincare_homology_sphere(),
            example::lens(7, 3).unwrap(),
        ] {
            for f in 0..base.count_triangles() {
                let mut next = base.clone();
                if next.pachner_triangle(f, true, true).unwrap() {
                    inputs.push(next);
                }
            }
            inputs.push(base);
        }

        let mut moves = [0usize; 2];
        for tri in &inputs {
            let h1 = fresh_homology(tri);
            for e in 0..tri.count_edges() {
                for axis in 0..2 {
                    let mut moved = tri.clone();
                    if !moved.four_four(e, axis, true, true).unwrap() {
                        continue;
                    }
                    moves[axis] += 1;
                    assert!(moved.validate_invariants().is_ok(), "edge {e} axis {axis}");
                    assert!(moved.is_valid(), "edge {e} axis {axis}");
                    assert_eq!(moved.size(), tri.size());
                    assert_eq!(moved.is_closed(), tri.is_closed());
                    assert_eq!(fresh_homology(&moved), h1, "edge {e} axis {axis}");
                }
            }
        }
        assert!(moves[0] > 0);
        assert_eq!(moves[0], moves[1]);
    }

    #[test]
    fn two_zero_vertex_undoes_a_subdivision() {
        let original = example::figure_eight();
        let mut tri = original.clone();
        tri.pachner_tet(0, true, true).unwrap();
        let centre = (0..tri.count_vertices())
            .find(|&v| tri.vertex(v).degree() == 4)
            .unwrap();
        let e = (0..tri.count_edges())
            .find(|&e| tri.edge(e).vertices.contains(&centre))
            .unwrap();
        assert!(tri.pachner_edge(e, true, true).unwrap());
        assert_eq!(tri.size(), 4);

        let legal: Vec<usize> = (0..tri.count_vertices())
            .filter(|&v| tri.clone().two_zero_vertex(v, true, false).unwrap())
            .collect();
        assert_eq!(legal.len(), 1);
        assert!(tri.two_zero_vertex(legal[0], true, true).unwrap());
        assert_eq!(tri.size(), 2);
        assert!(tri.is_isomorphic_to(&original));
    }

    #[test]
    fn two_zero_edge_removes_a_flat_pillow() {
        let tri = pillow();
        let legal: Vec<usize> = (0..tri.count_edges())
            .filter(|&e| tri.clone().two_zero_edge(e, true, false).unwrap())
            .collect();
        assert_eq!(legal.len(), 1);
        let mut moved = tri.clone();
        assert!(moved.two_zero_edge(legal[0], true, true).unwrap());
        assert_eq!(moved.size(), 2);
        assert!(moved.is_isomorphic_to(&example::figure_eight()));
    }

    #[test]
    fn two_one_shrinks_the_three_tetrahedron_rp3() {
        let tri = example::lens(2, 1).unwrap();
        assert_eq!(tri.size(), 3);
        let mut found = None;
        for e in 0..tri.count_edges() {
            for end in 0..2 {
                if found.is_none() && tri.clone().two_one(e, end, true, false).unwrap() {
                    found = Some((e, end));
                }
            }
        }
        let (e, end) = found.unwrap();
        let mut moved = tri.clone();
        assert!(moved.two_one(e, end, true, true).unwrap());
        assert_eq!(moved.size(), 2);
        assert!(moved.is_valid());
        assert_eq!(moved.homology().to_string(), "Z_2");
    }

    #[test]
    fn illegal_moves_report_false() {
        let mut tri = example::poincare_homology_sphere();
        for e in 0..tri.count_edges() {
            assert!(!tri.two_zero_edge(e, true, true).unwrap());
            assert!(!tri.two_one(e, 0, true, true).unwrap());
        }
        assert!(!tri.two_zero_vertex(0, true, true).unwrap());
        assert_eq!(tri.size(), 5);
        assert!(tri.four_four(0, 2, true, false).is_err());
    }

    #[test]
    fn locked_tetrahedra_block_removal() {
        let mut tri = pillow();
        let e = (0..tri.count_edges())
            .find(|&e| tri.clone().two_zero_edge(e, true, false).unwrap())
            .unwrap();
        let t = tri.edge(e).front().tet;
        tri.lock_simplex(t).unwrap();
        assert!(matches!(
            tri.two_zero_edge(e, true, true),
            Err(TriError::LockViolation(_))
        ));
        assert_eq!(tri.size(), 4);
    }

    /// Figure eight knot complement after two 2-3 moves; it has a
    /// single degree-2 edge.
    fn pillow() -> Triangulation {
        Triangulation::from_isosig("eLPkbcdddmbvgg").unwrap()
    }
}
