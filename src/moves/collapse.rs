//! Edge collapse and edge pinch.

use crate::maths::perm::{EDGE_NUMBER, Perm4};
use crate::tri_error::TriError;
use crate::triangulation::{Triangulation, VertexLinkType};

/// Union-find over `0..n` that reports when an insertion closes a cycle.
struct CycleDetector {
    parent: Vec<usize>,
}

impl CycleDetector {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Join `a` and `b`; false if they were already connected.
    fn insert(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[ra.min(rb)] = ra.max(rb);
        true
    }
}

impl Triangulation {
    /// Collapse edge `e` to a point, flattening every tetrahedron around it.
    ///
    /// Legal when the two ends are distinct, the bigons around the edge can
    /// be flattened without crushing a sphere or projective plane, and the
    /// resulting triangular pillows do not chain into a cycle or run from
    /// boundary to boundary.
    pub fn collapse_edge(&mut self, e: usize, check: bool, perform: bool) -> Result<bool, TriError> {
        self.check_edge_index(e)?;
        let edge = self.edge(e).clone();

        if check {
            if edge.vertices[0] == edge.vertices[1] {
                return Ok(false);
            }
            let (v0, v1) = (self.vertex(edge.vertices[0]), self.vertex(edge.vertices[1]));
            // Ideal vertices count as boundary here.
            if v0.is_boundary() && v1.is_boundary() {
                if !edge.boundary
                    || v0.link != VertexLinkType::Disc
                    || v1.link != VertexLinkType::Disc
                {
                    return Ok(false);
                }
            }
            if edge.boundary {
                let bc = edge.boundary_component.map(|b| self.boundary_component(b));
                if bc.is_some_and(|bc| bc.count_triangles() == 2) {
                    return Ok(false);
                }
            }

            // Bigons: all boundary or invalid edges share one node.
            let n_edges = self.count_edges();
            let node = |tri: &Triangulation, i: usize| {
                let other = tri.edge(i);
                if other.boundary || !other.valid { n_edges } else { i }
            };
            let mut bigons = CycleDetector::new(n_edges + 1);
            for (k, emb) in edge.embeddings.iter().enumerate() {
                let p = emb.perm;
                let upper = self.tet_edge(emb.tet, EDGE_NUMBER[p.apply(0)][p.apply(2)]);
                let lower = self.tet_edge(emb.tet, EDGE_NUMBER[p.apply(1)][p.apply(2)]);
                if upper == e || lower == e {
                    return Ok(false);
                }
                // The first bigon of a boundary edge lies on the boundary.
                if edge.boundary && k == 0 {
                    continue;
                }
                if !bigons.insert(node(self, upper), node(self, lower)) {
                    return Ok(false);
                }
            }

            // Pillows: all boundary triangles share one node.
            let n_triangles = self.count_triangles();
            let tnode = |tri: &Triangulation, i: usize| {
                if tri.triangle(i).is_boundary() { n_triangles } else { i }
            };
            let mut pillows = CycleDetector::new(n_triangles + 1);
            for emb in &edge.embeddings {
                let upper = self.tet_triangle(emb.tet, emb.perm.apply(0));
                let lower = self.tet_triangle(emb.tet, emb.perm.apply(1));
                if !pillows.insert(tnode(self, upper), tnode(self, lower)) {
                    return Ok(false);
                }
            }
        }
        if !perform {
            return Ok(true);
        }

        let tets: Vec<usize> = edge.embeddings.iter().map(|emb| emb.tet).collect();
        self.ensure_all_removable(&tets)?;

        self.topology_preserving(|tri| {
            for emb in &edge.embeddings {
                let p = emb.perm;
                let top = tri.adjacent(emb.tet, p.apply(0));
                let bottom = tri.adjacent(emb.tet, p.apply(1));
                tri.isolate_raw(emb.tet);
                if let (Some(top), Some(bottom)) = (top, bottom) {
                    tri.join_raw(
                        top.tet,
                        top.perm.apply(p.apply(0)),
                        bottom.tet,
                        bottom.perm * Perm4::swap(p.apply(0), p.apply(1)) * top.perm.inverse(),
                    );
                }
            }
            tri.remove_tetrahedra_raw(tets);
        });
        log::debug!("collapsed edge {e}; {} tetrahedra remain", self.size());
        Ok(true)
    }

    /// Pinch internal edge `e` to a point by inserting two tetrahedra into
    /// one of the triangles around it.
    ///
    /// When the ends of `e` are distinct the manifold is unchanged and the
    /// vertex count drops by one. Pinching a loop drills out a curve.
    pub fn pinch_edge(&mut self, e: usize) -> Result<(), TriError> {
        self.check_edge_index(e)?;
        let edge = self.edge(e);
        if edge.boundary {
            return Err(TriError::FailedPrecondition(format!("edge {e} is on the boundary")));
        }
        let open = edge.front().tet;
        let vertices = edge.front().perm;
        self.ensure_facet_unlocked(open, vertices.apply(3))?;
        let Some(adj) = self.adjacent(open, vertices.apply(3)) else {
            return Err(TriError::ImpossibleScenario(format!("internal edge {e} has a boundary facet")));
        };

        self.change_span(|tri| {
            let t0 = tri.new_tetrahedron_raw(String::new());
            let t1 = tri.new_tetrahedron_raw(String::new());
            // Together these form a ball with an internal arc pinched to a point.
            tri.join_raw(t0, 0, t1, Perm4::swap(1, 2));
            tri.join_raw(t0, 3, t1, Perm4::swap(0, 1));
            tri.join_raw(t1, 1, t1, Perm4::swap(1, 2));

            tri.unjoin_raw(open, vertices.apply(3));
            tri.join_raw(
                t0,
                1,
                adj.tet,
                adj.perm * vertices * Perm4::new_unchecked([0, 3, 1, 2]),
            );
            tri.join_raw(t0, 2, open, vertices * Perm4::swap(2, 3));
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::example;

    #[test]
    fn cycle_detector_finds_cycles() {
        let mut uf = CycleDetector::new(4);
        assert!(uf.insert(0, 1));
        assert!(uf.insert(1, 2));
        assert!(!uf.insert(2, 0));
        assert!(!uf.insert(3, 3));
    }

    #[test]
    fn collapsing_undoes_a_subdivision() {
        let original = example::figure_eight();
        let mut tri = original.clone();
        tri.pachner_tet(0, true, true).unwrap();
        let legal: Vec<usize> = (0..tri.count_edges())
            .filter(|&e| tri.clone().collapse_edge(e, true, false).unwrap())
            .collect();
        assert_eq!(legal.len(), 4);
        assert!(tri.collapse_edge(legal[0], true, true).unwrap());
        assert_eq!(tri.size(), 2);
        assert!(tri.is_isomorphic_to(&original));
    }

    #[test]
    fn loops_and_balls_never_collapse() {
        for tri in [
            example::layered_loop(3, false),
            example::layered_loop(2, false),
            example::ball(),
            example::lst(1, 2).unwrap(),
            example::twisted_kxi(),
        ] {
            for e in 0..tri.count_edges() {
                assert!(!tri.clone().collapse_edge(e, true, true).unwrap());
            }
        }
    }

    #[test]
    fn pinching_joins_two_vertices() {
        let mut tri = example::poincare_homology_sphere();
        tri.pachner_tet(1, true, true).unwrap();
        assert_eq!(tri.count_vertices(), 2);
        let e = (0..tri.count_edges())
            .find(|&e| tri.edge(e).vertices[0] != tri.edge(e).vertices[1])
            .unwrap();
        tri.pinch_edge(e).unwrap();
        assert_eq!(tri.size(), 10);
        assert_eq!(tri.count_vertices(), 1);
        assert!(tri.is_valid());
        assert!(tri.homology().is_trivial());
    }

    #[test]
    fn pinching_a_loop_drills_it_out() {
        let mut tri = example::poincare_homology_sphere();
        tri.pinch_edge(0).unwrap();
        assert_eq!(tri.size(), 7);
        assert!(tri.is_ideal());
        assert_eq!(tri.homology().to_string(), "Z");
    }

    #[test]
    fn pinching_a_boundary_edge_fails() {
        let mut tri = example::lst(1, 2).unwrap();
        let e = (0..tri.count_edges()).find(|&e| tri.edge(e).boundary).unwrap();
        assert!(matches!(tri.pinch_edge(e), Err(TriError::FailedPrecondition(_))));
    }
}
