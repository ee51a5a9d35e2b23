//! The disc graph of an embedded normal surface.
//!
//! Every normal disc is a node, labelled by (tetrahedron, disc type, index
//! within its type). Two discs are joined when they meet along a normal arc
//! on an internal facet. Walking the graph with a pair of signs per disc
//! decides orientability and two-sidedness, and splits the surface into
//! connected components.

use crate::maths::integer::Integer;
use crate::maths::perm::Perm4;
use crate::surfaces::tables::{QUAD_DEFN, QUAD_MEETING, QUAD_SEPARATING, disc_arcs};
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

/// Disc types per tetrahedron: four triangles, three quads, three octagons.
pub(crate) const DISC_TYPES: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Disc {
    pub tet: usize,
    pub disc_type: usize,
    pub index: usize,
}

/// Topological summary of the surface read off the disc graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DiscSummary {
    pub components: usize,
    pub orientable: bool,
    pub two_sided: bool,
    /// Component of each disc, in node order.
    pub component_of: Vec<usize>,
}

pub(crate) struct DiscGraph<'a> {
    tri: &'a Triangulation,
    counts: Vec<[usize; DISC_TYPES]>,
    offsets: Vec<[usize; DISC_TYPES]>,
    total: usize,
}

impl<'a> DiscGraph<'a> {
    /// `coords` holds the ten disc counts of each tetrahedron in turn.
    pub fn new(tri: &'a Triangulation, coords: &[Integer]) -> Result<Self, TriError> {
        let n = tri.size();
        let mut counts = vec![[0usize; DISC_TYPES]; n];
        let mut offsets = vec![[0usize; DISC_TYPES]; n];
        let mut total = 0usize;
        for t in 0..n {
            for ty in 0..DISC_TYPES {
                let c = coords[DISC_TYPES * t + ty]
                    .to_i64()
                    .and_then(|c| usize::try_from(c).ok())
                    .ok_or_else(|| {
                        TriError::FailedPrecondition("disc count does not fit in memory".into())
                    })?;
                counts[t][ty] = c;
                offsets[t][ty] = total;
                total = total.checked_add(c).ok_or_else(|| {
                    TriError::FailedPrecondition("too many normal discs".into())
                })?;
            }
        }
        Ok(Self {
            tri,
            counts,
            offsets,
            total,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.total
    }

    #[inline]
    fn count(&self, t: usize, ty: usize) -> usize {
        self.counts[t][ty]
    }

    #[inline]
    pub fn node(&self, d: Disc) -> usize {
        self.offsets[d.tet][d.disc_type] + d.index
    }

    /// Every disc, in node order.
    pub fn discs(&self) -> impl Iterator<Item = Disc> + '_ {
        (0..self.counts.len()).flat_map(move |tet| {
            (0..DISC_TYPES).flat_map(move |disc_type| {
                (0..self.count(tet, disc_type)).map(move |index| Disc {
                    tet,
                    disc_type,
                    index,
                })
            })
        })
    }

    /// Discs of this type are numbered starting from the side of `v`.
    fn numbered_from(disc_type: usize, v: usize) -> bool {
        if disc_type < 4 {
            return v == disc_type;
        }
        let d = QUAD_DEFN[(disc_type - 4) % 3];
        v == d[0] || v == d[1]
    }

    /// Position of disc `(t, ty, k)`'s arc around vertex `v` of a facet,
    /// counting outward from `v`.
    fn arc_position(&self, t: usize, v: usize, ty: usize, k: usize) -> usize {
        if ty < 4 {
            return k;
        }
        let inner = self.count(t, v);
        if Self::numbered_from(ty, v) {
            inner + k
        } else {
            inner + self.count(t, ty) - k - 1
        }
    }

    /// The disc owning the `pos`-th arc around vertex `v` of facet `f`.
    fn disc_at_arc(&self, t: usize, f: usize, v: usize, mut pos: usize) -> (usize, usize) {
        if pos < self.count(t, v) {
            return (v, pos);
        }
        pos -= self.count(t, v);
        let mut ty = 4 + QUAD_SEPARATING[v][f];
        if pos >= self.count(t, ty) {
            pos -= self.count(t, ty);
            let [m0, m1] = QUAD_MEETING[v][f];
            ty = 7 + m0;
            if pos >= self.count(t, ty) {
                pos -= self.count(t, ty);
                ty = 7 + m1;
            }
        }
        let k = if Self::numbered_from(ty, v) {
            pos
        } else {
            self.count(t, ty) - pos - 1
        };
        (ty, k)
    }

    /// The disc across arc `arc` of `d`, with the arc seen from that disc
    /// and the gluing crossed.
    pub fn across(&self, d: Disc, arc: Perm4) -> Option<(Disc, Perm4, Perm4)> {
        let face = arc.apply(3);
        let g = self.tri.adjacent(d.tet, face)?;
        let adj_arc = g.perm * arc;
        let pos = self.arc_position(d.tet, arc.apply(0), d.disc_type, d.index);
        let (disc_type, index) = self.disc_at_arc(g.tet, adj_arc.apply(3), adj_arc.apply(0), pos);
        Some((
            Disc {
                tet: g.tet,
                disc_type,
                index,
            },
            adj_arc,
            g.perm,
        ))
    }

    /// Walk the whole graph.
    pub fn summarise(&self) -> DiscSummary {
        const UNSEEN: usize = usize::MAX;
        let mut sigma = vec![0i8; self.total];
        let mut tau = vec![0i8; self.total];
        let mut component_of = vec![UNSEEN; self.total];
        let mut summary = DiscSummary {
            components: 0,
            orientable: true,
            two_sided: true,
            component_of: Vec::new(),
        };

        for start in self.discs() {
            let id = self.node(start);
            if component_of[id] != UNSEEN {
                continue;
            }
            let c = summary.components;
            summary.components += 1;
            component_of[id] = c;
            sigma[id] = 1;
            tau[id] = 1;
            let mut stack = vec![start];
            while let Some(cur) = stack.pop() {
                let here = self.node(cur);
                for &arc in disc_arcs(cur.disc_type) {
                    let Some((next, adj_arc, gluing)) = self.across(cur, arc) else {
                        continue;
                    };
                    let follows: i8 = if disc_arcs(next.disc_type).contains(&adj_arc) { 1 } else { -1 };
                    let s = -sigma[here] * follows;
                    let t = tau[here] * follows * gluing.sign() as i8;
                    let there = self.node(next);
                    if component_of[there] == UNSEEN {
                        component_of[there] = c;
                        sigma[there] = s;
                        tau[there] = t;
                        stack.push(next);
                    } else {
                        if sigma[there] != s {
                            summary.orientable = false;
                        }
                        if tau[there] != t {
                            summary.two_sided = false;
                        }
                    }
                }
            }
        }
        summary.component_of = component_of;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::example;

    fn vertex_link_coords(tri: &Triangulation) -> Vec<Integer> {
        let mut v = vec![Integer::ZERO; DISC_TYPES * tri.size()];
        for emb in &tri.skeleton().vertices[0].embeddings {
            v[DISC_TYPES * emb.tet + emb.vertex] = Integer::ONE;
        }
        v
    }

    #[test]
    fn vertex_link_is_one_component() {
        let tri = example::poincare_homology_sphere();
        let coords = vertex_link_coords(&tri);
        let graph = DiscGraph::new(&tri, &coords).unwrap();
        assert_eq!(graph.len(), 4 * tri.size());
        let s = graph.summarise();
        assert_eq!(s.components, 1);
        assert!(s.orientable);
        assert!(s.two_sided);
    }

    #[test]
    fn gieseking_cusp_is_a_klein_bottle() {
        let tri = example::gieseking();
        let s = DiscGraph::new(&tri, &vertex_link_coords(&tri)).unwrap().summarise();
        assert_eq!(s.components, 1);
        assert!(!s.orientable);
        assert!(s.two_sided);
    }

    #[test]
    fn arcs_line_up_across_facets() {
        let tri = example::figure_eight();
        let mut coords = vertex_link_coords(&tri);
        for c in coords.iter_mut() {
            *c = &*c * &Integer::new(2);
        }
        let graph = DiscGraph::new(&tri, &coords).unwrap();
        for d in graph.discs() {
            for &arc in disc_arcs(d.disc_type) {
                let (next, adj_arc, gluing) = graph.across(d, arc).unwrap();
                let (back, _, _) = graph.across(next, adj_arc).unwrap();
                assert_eq!(back, d);
                assert_eq!(gluing.inverse() * adj_arc, arc);
            }
        }
        assert_eq!(graph.summarise().components, 2);
    }
}
