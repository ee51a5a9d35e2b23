//! Moves that act on the real boundary: book opening and closing, shelling
//! a boundary tetrahedron, and layering a tetrahedron onto a boundary edge.

use crate::maths::perm::{EDGE_NUMBER, EDGE_VERTEX, Perm4};
use crate::tri_error::TriError;
use crate::triangulation::{Triangulation, VertexLinkType};

impl Triangulation {
    /// Unglue an internal triangle that has exactly two boundary edges.
    pub fn open_book(&mut self, f: usize, check: bool, perform: bool) -> Result<bool, TriError> {
        self.check_triangle_index(f)?;
        let front = self.triangle(f).front();
        let (tet, vertices) = (front.tet, front.perm);

        if check {
            if self.triangle(f).is_boundary() {
                return Ok(false);
            }
            let mut boundary_edges = 0;
            let mut free_vertex = 0;
            for (a, b, opposite) in [(0, 1, 2), (1, 2, 0), (2, 0, 1)] {
                let edge = self.tet_edge(tet, EDGE_NUMBER[vertices.apply(a)][vertices.apply(b)]);
                if self.edge(edge).boundary {
                    boundary_edges += 1;
                } else {
                    free_vertex = opposite;
                }
            }
            if boundary_edges != 2 {
                return Ok(false);
            }
            if self.vertex(self.tet_vertex(tet, vertices.apply(free_vertex))).link
                != VertexLinkType::Disc
            {
                return Ok(false);
            }
            let (a, b) = ((free_vertex + 1) % 3, (free_vertex + 2) % 3);
            let internal = self.tet_edge(tet, EDGE_NUMBER[vertices.apply(a)][vertices.apply(b)]);
            if !self.edge(internal).valid {
                return Ok(false);
            }
        }
        if !perform {
            return Ok(true);
        }
        self.ensure_facet_unlocked(tet, vertices.apply(3))?;
        self.topology_preserving(|tri| {
            tri.unjoin_raw(tet, vertices.apply(3));
        });
        Ok(true)
    }

    /// Fold the two boundary triangles on either side of boundary edge `e`
    /// onto each other.
    pub fn close_book(&mut self, e: usize, check: bool, perform: bool) -> Result<bool, TriError> {
        self.check_edge_index(e)?;
        let edge = self.edge(e);
        if check {
            if !edge.boundary {
                return Ok(false);
            }
            let bc = edge.boundary_component.map(|b| self.boundary_component(b));
            if bc.is_none_or(|bc| bc.count_triangles() <= 2) {
                return Ok(false);
            }
        }
        let (t0, p0) = (edge.front().tet, edge.front().perm);
        let (t1, p1) = (edge.back().tet, edge.back().perm);

        if check {
            let v0 = self.tet_vertex(t0, p0.apply(2));
            let v1 = self.tet_vertex(t1, p1.apply(3));
            if v0 == v1
                || self.vertex(v0).link != VertexLinkType::Disc
                || self.vertex(v1).link != VertexLinkType::Disc
            {
                return Ok(false);
            }
        }
        if !perform {
            return Ok(true);
        }
        self.ensure_facet_unlocked(t0, p0.apply(3))?;
        self.ensure_facet_unlocked(t1, p1.apply(2))?;
        if self.adjacent(t0, p0.apply(3)).is_some() || self.adjacent(t1, p1.apply(2)).is_some() {
            return Err(TriError::FailedPrecondition(format!(
                "edge {e} is not on the boundary"
            )));
        }
        self.topology_preserving(|tri| {
            tri.join_raw(t0, p0.apply(3), t1, p1 * Perm4::swap(2, 3) * p0.inverse());
        });
        Ok(true)
    }

    /// Remove a tetrahedron with one, two or three boundary facets without
    /// changing the manifold.
    pub fn shell_boundary(&mut self, t: usize, check: bool, perform: bool) -> Result<bool, TriError> {
        self.check_tet_index(t)?;
        if check {
            let boundary: Vec<usize> = (0..4).filter(|&f| self.adjacent(t, f).is_none()).collect();
            match boundary.len() {
                1 => {
                    let apex = boundary[0];
                    if self.vertex(self.tet_vertex(t, apex)).is_boundary() {
                        return Ok(false);
                    }
                    let internal: Vec<usize> = (0..4)
                        .filter(|&i| i != apex)
                        .map(|i| self.tet_edge(t, EDGE_NUMBER[apex][i]))
                        .collect();
                    if internal.iter().any(|&i| !self.edge(i).valid) {
                        return Ok(false);
                    }
                    if internal[0] == internal[1]
                        || internal[1] == internal[2]
                        || internal[2] == internal[0]
                    {
                        return Ok(false);
                    }
                }
                2 => {
                    let i = EDGE_NUMBER[boundary[0]][boundary[1]];
                    let edge = self.edge(self.tet_edge(t, i));
                    if edge.boundary || !edge.valid {
                        return Ok(false);
                    }
                    if self.adjacent_tet(t, EDGE_VERTEX[5 - i][0]) == Some(t) {
                        return Ok(false);
                    }
                }
                3 => {}
                _ => return Ok(false),
            }
        }
        if !perform {
            return Ok(true);
        }
        self.ensure_removable(t)?;
        self.topology_preserving(|tri| tri.remove_tetrahedron_raw(t));
        Ok(true)
    }

    /// Glue a new tetrahedron onto the two boundary triangles that meet at
    /// boundary edge `e`, so that `e` becomes internal. Returns the index of
    /// the new tetrahedron.
    pub fn layer_on(&mut self, e: usize) -> Result<usize, TriError> {
        self.check_edge_index(e)?;
        let edge = self.edge(e);
        if !edge.boundary {
            return Err(TriError::FailedPrecondition(format!("edge {e} is not on the boundary")));
        }
        let (t1, r1) = (edge.front().tet, edge.front().perm);
        let (t2, r2) = (edge.back().tet, edge.back().perm);
        if (t1, r1.apply(3)) == (t2, r2.apply(2)) {
            return Err(TriError::FailedPrecondition(format!(
                "both sides of edge {e} lie on the same boundary triangle"
            )));
        }
        self.ensure_facet_unlocked(t1, r1.apply(3))?;
        self.ensure_facet_unlocked(t2, r2.apply(2))?;

        Ok(self.topology_preserving(|tri| {
            let new = tri.new_tetrahedron_raw(String::new());
            tri.join_raw(new, 3, t1, r1);
            tri.join_raw(new, 2, t2, r2);
            new
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::example;

    fn legal<F: Fn(&mut Triangulation, usize) -> bool>(tri: &Triangulation, n: usize, f: F) -> Vec<usize> {
        (0..n).filter(|&i| f(&mut tri.clone(), i)).collect()
    }

    #[test]
    fn minimal_solid_torus_admits_no_boundary_moves() {
        let tri = example::lst(1, 2).unwrap();
        assert!(legal(&tri, tri.count_triangles(), |t, f| t.open_book(f, true, false).unwrap()).is_empty());
        assert!(legal(&tri, tri.count_edges(), |t, e| t.close_book(e, true, false).unwrap()).is_empty());
        assert!(legal(&tri, tri.size(), |t, x| t.shell_boundary(x, true, false).unwrap()).is_empty());
    }

    #[test]
    fn shelling_peels_a_layer() {
        let tri = example::lst(1, 3).unwrap();
        let shells = legal(&tri, tri.size(), |t, x| t.shell_boundary(x, true, false).unwrap());
        assert_eq!(shells.len(), 1);
        let mut peeled = tri.clone();
        assert!(peeled.shell_boundary(shells[0], true, true).unwrap());
        assert_eq!(peeled.size(), 1);
        assert!(peeled.homology().is_z());
        assert_eq!(peeled.count_boundary_triangles(), 2);
    }

    #[test]
    fn opening_then_closing_a_book() {
        let tri = example::lst(1, 3).unwrap();
        let opens = legal(&tri, tri.count_triangles(), |t, f| t.open_book(f, true, false).unwrap());
        assert_eq!(opens.len(), 3);

        let mut opened = tri.clone();
        assert!(opened.open_book(opens[0], true, true).unwrap());
        assert_eq!(opened.count_boundary_triangles(), 4);
        assert_eq!(opened.count_vertices(), 2);
        assert!(opened.homology().is_z());

        let closes = legal(&opened, opened.count_edges(), |t, e| t.close_book(e, true, false).unwrap());
        assert!(!closes.is_empty());
        assert!(opened.close_book(closes[0], true, true).unwrap());
        assert_eq!(opened.count_boundary_triangles(), 2);
        assert_eq!(opened.count_vertices(), 1);
        assert!(opened.homology().is_z());
    }

    #[test]
    fn layering_keeps_a_solid_torus() {
        let mut tri = example::lst(1, 2).unwrap();
        let e = (0..tri.count_edges()).find(|&e| tri.edge(e).boundary).unwrap();
        let new = tri.layer_on(e).unwrap();
        assert_eq!(new, 1);
        assert_eq!(tri.size(), 2);
        assert!(tri.homology().is_z());
        assert_eq!(tri.count_boundary_triangles(), 2);

        let internal = (0..tri.count_edges()).find(|&e| !tri.edge(e).boundary).unwrap();
        assert!(matches!(tri.layer_on(internal), Err(TriError::FailedPrecondition(_))));
    }

    #[test]
    fn locked_boundary_facets_block_layering() {
        let mut tri = example::lst(1, 2).unwrap();
        let e = (0..tri.count_edges()).find(|&e| tri.edge(e).boundary).unwrap();
        let front = tri.edge(e).front();
        tri.lock_facet(front.tet, front.perm.apply(3)).unwrap();
        assert!(matches!(tri.layer_on(e), Err(TriError::LockViolation(_))));
        assert_eq!(tri.size(), 1);
    }
}
