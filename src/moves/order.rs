//! Relabelling tetrahedra and their vertices: vertex orderings, orientation
//! and breadth-first renumbering. None of these change the gluing pattern
//! up to isomorphism.

use std::collections::VecDeque;

use crate::maths::perm::{EDGE_NUMBER, Perm4};
use crate::triangulation::{Isomorphism, Triangulation};

/// Search state for [`Triangulation::order`].
struct EdgeOrientations<'a> {
    tri: &'a Triangulation,
    force_oriented: bool,
    /// +1 if the edge runs from its vertex 0 to its vertex 1, -1 if
    /// reversed, 0 while unassigned.
    dir: Vec<i8>,
    /// Highest edge index in each tetrahedron; the tetrahedron is fully
    /// decided once that edge has been assigned.
    last_edge: Vec<usize>,
    tets_of_edge: Vec<Vec<usize>>,
}

impl<'a> EdgeOrientations<'a> {
    fn new(tri: &'a Triangulation, force_oriented: bool) -> Self {
        let n_edges = tri.count_edges();
        let sk = tri.skeleton();
        let last_edge = sk
            .tet_edge
            .iter()
            .map(|edges| edges.iter().copied().max().unwrap_or(0))
            .collect();
        let tets_of_edge = sk
            .edges
            .iter()
            .map(|edge| {
                let mut tets: Vec<usize> = edge.embeddings.iter().map(|emb| emb.tet).collect();
                tets.sort_unstable();
                tets.dedup();
                tets
            })
            .collect();
        Self {
            tri,
            force_oriented,
            dir: vec![0; n_edges],
            last_edge,
            tets_of_edge,
        }
    }

    /// Whether local vertex `a` precedes `b` in tetrahedron `t`, if the
    /// edge between them has been decided.
    fn precedes(&self, t: usize, a: usize, b: usize) -> Option<bool> {
        let local = EDGE_NUMBER[a][b];
        let d = self.dir[self.tri.tet_edge(t, local)];
        if d == 0 {
            return None;
        }
        let forward = self.tri.tet_edge_mapping(t, local).apply(0) == a;
        Some(forward == (d > 0))
    }

    /// Number of later vertices for each vertex of a fully decided
    /// tetrahedron.
    fn out_degrees(&self, t: usize) -> [usize; 4] {
        let mut out = [0; 4];
        for a in 0..4 {
            for b in 0..4 {
                if a != b && self.precedes(t, a, b) == Some(true) {
                    out[a] += 1;
                }
            }
        }
        out
    }

    /// New label of each vertex: the vertex preceding all others becomes 0.
    fn relabelling(&self, t: usize) -> Perm4 {
        let out = self.out_degrees(t);
        Perm4::new_unchecked([
            (3 - out[0]) as u8,
            (3 - out[1]) as u8,
            (3 - out[2]) as u8,
            (3 - out[3]) as u8,
        ])
    }

    fn has_cyclic_face(&self, t: usize) -> bool {
        (0..4).any(|f| {
            let [a, b, c] = match f {
                0 => [1, 2, 3],
                1 => [0, 2, 3],
                2 => [0, 1, 3],
                _ => [0, 1, 2],
            };
            match (self.precedes(t, a, b), self.precedes(t, b, c), self.precedes(t, c, a)) {
                (Some(x), Some(y), Some(z)) => x == y && y == z,
                _ => false,
            }
        })
    }

    fn consistent(&self, e: usize) -> bool {
        for &t in &self.tets_of_edge[e] {
            if self.has_cyclic_face(t) {
                return false;
            }
            if self.last_edge[t] != e || !self.force_oriented {
                continue;
            }
            let sigma = self.relabelling(t);
            for f in 0..4 {
                let Some(g) = self.tri.adjacent(t, f) else { continue };
                if self.last_edge[g.tet] > e {
                    continue;
                }
                // An order-preserving gluing between facets f' and g' has
                // sign (-1)^(f' + g'); oriented means odd.
                let other = if g.tet == t { sigma } else { self.relabelling(g.tet) };
                if (sigma.apply(f) + other.apply(g.perm.apply(f))) % 2 == 0 {
                    return false;
                }
            }
        }
        true
    }

    fn search(&mut self) -> bool {
        let n = self.dir.len();
        let mut e = 0;
        // Iterative depth-first search; `dir[e]` records the branch taken.
        loop {
            if e == n {
                return true;
            }
            let next = match self.dir[e] {
                0 => Some(1),
                1 => Some(-1),
                _ => None,
            };
            match next {
                Some(d) => {
                    self.dir[e] = d;
                    if self.consistent(e) {
                        e += 1;
                    }
                }
                None => {
                    self.dir[e] = 0;
                    if e == 0 {
                        return false;
                    }
                    e -= 1;
                }
            }
        }
    }
}

impl Triangulation {
    /// Relabel vertices so that every gluing preserves the vertex order on
    /// the glued facets. With `force_oriented` the result must also be
    /// oriented. Returns false, leaving the triangulation untouched, if no
    /// such labelling exists.
    pub fn order(&mut self, force_oriented: bool) -> bool {
        if self.skeleton().edges.iter().any(|e| !e.valid) {
            return false;
        }
        if force_oriented && !self.is_orientable() {
            return false;
        }
        let mut search = EdgeOrientations::new(self, force_oriented);
        if !search.search() {
            log::debug!("no ordering of {} tetrahedra exists", self.size());
            return false;
        }
        let facet_perm = (0..self.size()).map(|t| search.relabelling(t)).collect();
        let iso = Isomorphism {
            simp_image: (0..self.size()).collect(),
            facet_perm,
        };
        iso.relabel(self);
        true
    }

    /// True if every gluing maps the vertices of its facet in increasing
    /// order.
    pub fn is_ordered(&self) -> bool {
        self.tetrahedra().iter().all(|tet| {
            (0..4).all(|f| match tet.adjacent(f) {
                None => true,
                Some(g) => {
                    let images: Vec<usize> =
                        (0..4).filter(|&v| v != f).map(|v| g.perm.apply(v)).collect();
                    images.windows(2).all(|w| w[0] < w[1])
                }
            })
        })
    }

    /// Renumber tetrahedra in breadth-first order from tetrahedron 0,
    /// visiting facets in order. Components follow in order of their lowest
    /// tetrahedron. With `reverse` the final order is reversed.
    pub fn reorder_bfs(&mut self, reverse: bool) {
        let n = self.size();
        let mut order = Vec::with_capacity(n);
        let mut seen = vec![false; n];
        for start in 0..n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut queue = VecDeque::from([start]);
            while let Some(t) = queue.pop_front() {
                order.push(t);
                for f in 0..4 {
                    if let Some(u) = self.adjacent_tet(t, f) {
                        if !seen[u] {
                            seen[u] = true;
                            queue.push_back(u);
                        }
                    }
                }
            }
        }
        if reverse {
            order.reverse();
        }
        let mut simp_image = vec![0; n];
        for (pos, &t) in order.iter().enumerate() {
            simp_image[t] = pos;
        }
        let iso = Isomorphism {
            simp_image,
            facet_perm: vec![Perm4::identity(); n],
        };
        iso.relabel(self);
    }

    /// Relabel every negatively oriented tetrahedron in an orientable
    /// component so that the triangulation becomes oriented. Non-orientable
    /// components are left alone.
    pub fn orient(&mut self) {
        let sk = self.skeleton();
        let facet_perm: Vec<Perm4> = (0..self.size())
            .map(|t| {
                let orientable = sk.components[sk.tet_component[t]].orientable;
                if orientable && sk.tet_orientation[t] < 0 {
                    Perm4::swap(2, 3)
                } else {
                    Perm4::identity()
                }
            })
            .collect();
        if facet_perm.iter().all(Perm4::is_identity) {
            return;
        }
        let iso = Isomorphism {
            simp_image: (0..self.size()).collect(),
            facet_perm,
        };
        iso.relabel(self);
    }
}
