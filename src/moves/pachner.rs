//! Pachner (bistellar) moves.
//!
//! A move about a face of dimension `k` replaces the `4 - k` tetrahedra
//! surrounding that face with `k + 1` new ones. New tetrahedra are appended
//! and the old ones removed, so indices of untouched tetrahedra can shift
//! down. Vertex labels of the new tetrahedra follow a fixed scheme that
//! keeps an oriented triangulation oriented.

use crate::maths::perm::Perm4;
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

use super::vertex_ordering;

const DIM: usize = 3;

/// Relabelling between old and new tetrahedra for a move whose old side
/// surrounds a face of dimension `k`.
fn move_perm(k: usize, old_simp: usize, new_simp: usize) -> Perm4 {
    let mut image = [0u8; 4];
    let mut old_facet = 0;
    let mut new_facet = 0;
    for i in 0..k {
        if new_simp != i {
            image[i] = (DIM - k + i) as u8;
        } else {
            old_facet = i;
        }
    }
    if new_simp != k {
        image[k + old_simp] = DIM as u8;
    } else {
        old_facet = k + old_simp;
    }
    for i in 0..DIM - k {
        if old_simp != i {
            image[k + i] = i as u8;
        } else {
            new_facet = i;
        }
    }
    if old_simp != DIM - k {
        image[DIM] = (DIM - k + new_simp) as u8;
    } else {
        new_facet = DIM - k + new_simp;
    }
    image[old_facet] = new_facet as u8;
    Perm4::new_unchecked(image)
}

impl Triangulation {
    /// 4-1 move: replace the four tetrahedra around an internal degree-4
    /// vertex by one.
    pub fn pachner_vertex(&mut self, v: usize, check: bool, perform: bool) -> Result<bool, TriError> {
        self.check_vertex_index(v)?;
        let vertex = self.vertex(v);
        if check && (vertex.is_boundary() || !vertex.is_valid() || vertex.degree() != 4) {
            return Ok(false);
        }
        let front = vertex.embeddings[0];

        let mut old_simp = [0usize; 4];
        let mut old_vertices = [Perm4::identity(); 4];
        old_simp[0] = front.tet;
        old_vertices[0] = vertex_ordering(front.vertex);
        if old_vertices[0].sign() < 0 {
            old_vertices[0] = old_vertices[0] * Perm4::swap(DIM - 1, DIM);
        }
        for i in 1..=DIM {
            let Some(g) = self.adjacent(old_simp[0], old_vertices[0].apply(i)) else {
                return Ok(false);
            };
            if check && old_simp[..i].contains(&g.tet) {
                return Ok(false);
            }
            old_simp[i] = g.tet;
            old_vertices[i] = g.perm * old_vertices[0] * Perm4::swap(0, i);
        }
        if check {
            for i in 1..=DIM {
                for j in 1..i {
                    match self.adjacent(old_simp[j], old_vertices[j].apply(i)) {
                        Some(g)
                            if g.tet == old_simp[i]
                                && g.perm * old_vertices[j] * Perm4::swap(i, j)
                                    == old_vertices[i] => {}
                        _ => return Ok(false),
                    }
                }
            }
        }
        if !perform {
            return Ok(true);
        }

        for i in 0..=DIM {
            if self.is_simplex_locked(old_simp[i]) {
                return Err(TriError::LockViolation(format!(
                    "tetrahedron {} is locked",
                    old_simp[i]
                )));
            }
            for m in (0..=DIM).filter(|&m| m != i) {
                self.ensure_facet_unlocked(old_simp[i], old_vertices[i].apply(m))?;
            }
        }

        self.topology_preserving(|tri| {
            let new_simp = tri.new_tetrahedron_raw(String::new());
            let mut adj: [Option<(usize, Perm4)>; 4] = [None; 4];
            let mut carried = [false; 4];
            for i in 0..=DIM {
                let facet = old_vertices[i].apply(i);
                carried[i] = tri.is_facet_locked(old_simp[i], facet);
                let Some(g) = tri.adjacent(old_simp[i], facet) else { continue };
                let mut gluing = g.perm * old_vertices[i];
                let mut dest = Some(g.tet);
                if let Some(j) = old_simp.iter().position(|&t| t == g.tet) {
                    if i > j {
                        dest = None;
                    } else {
                        dest = Some(new_simp);
                        gluing = old_vertices[j].inverse() * gluing;
                    }
                }
                adj[i] = dest.map(|d| (d, gluing));
            }
            for &t in &old_simp {
                tri.isolate_raw(t);
            }
            for i in 0..=DIM {
                if let Some((d, p)) = adj[i] {
                    tri.join_raw(new_simp, i, d, p);
                }
                if carried[i] {
                    tri.lock_facet_raw(new_simp, i);
                }
            }
            tri.remove_tetrahedra_raw(old_simp.to_vec());
        });
        Ok(true)
    }

    /// 3-2 move about an internal degree-3 edge.
    pub fn pachner_edge(&mut self, e: usize, check: bool, perform: bool) -> Result<bool, TriError> {
        self.check_edge_index(e)?;
        let edge = self.edge(e);
        if check && (edge.boundary || !edge.valid || edge.degree() != 3) {
            return Ok(false);
        }
        let front = edge.front();
        self.pachner_face(1, front.tet, front.perm, check, perform)
    }

    /// 2-3 move about an internal triangle joining two distinct tetrahedra.
    pub fn pachner_triangle(&mut self, f: usize, check: bool, perform: bool) -> Result<bool, TriError> {
        self.check_triangle_index(f)?;
        let triangle = self.triangle(f);
        if check && triangle.is_boundary() {
            return Ok(false);
        }
        let front = triangle.front();
        self.pachner_face(2, front.tet, front.perm, check, perform)
    }

    /// 1-4 move: subdivide tetrahedron `t` about a new interior vertex.
    /// Always legal.
    pub fn pachner_tet(&mut self, t: usize, _check: bool, perform: bool) -> Result<bool, TriError> {
        self.check_tet_index(t)?;
        if !perform {
            return Ok(true);
        }
        if self.is_simplex_locked(t) {
            return Err(TriError::LockViolation(format!("tetrahedron {t} is locked")));
        }

        self.topology_preserving(|tri| {
            let adj: Vec<_> = (0..4).map(|i| tri.adjacent(t, i)).collect();
            let carried: Vec<bool> = (0..4).map(|i| tri.is_facet_locked(t, i)).collect();
            tri.isolate_raw(t);

            let base = tri.size();
            for _ in 0..=DIM {
                tri.new_tetrahedron_raw(String::new());
            }
            let new_simp = |i: usize| base + DIM - i;
            for i in 0..=DIM {
                for j in i + 1..=DIM {
                    tri.join_raw(new_simp(i), j, new_simp(j), Perm4::swap(i, j));
                }
            }
            for i in 0..=DIM {
                match adj[i] {
                    Some(g) if g.tet == t => {
                        if tri.adjacent(new_simp(i), i).is_none() {
                            tri.join_raw(new_simp(i), i, new_simp(g.perm.apply(i)), g.perm);
                        }
                    }
                    Some(g) => tri.join_raw(new_simp(i), i, g.tet, g.perm),
                    None => {}
                }
                if carried[i] {
                    tri.lock_facet_raw(new_simp(i), i);
                }
            }
            tri.remove_tetrahedron_raw(t);
        });
        Ok(true)
    }

    /// Shared 3-2 (`k = 1`) and 2-3 (`k = 2`) implementation. `vertices`
    /// maps `0..=k` onto the face inside tetrahedron `tet`.
    fn pachner_face(
        &mut self,
        k: usize,
        tet: usize,
        vertices: Perm4,
        check: bool,
        perform: bool,
    ) -> Result<bool, TriError> {
        let n_old = DIM + 1 - k;
        let mut old_simp = [0usize; 4];
        let mut old_vertices = [Perm4::identity(); 4];
        old_simp[0] = tet;
        old_vertices[0] = vertices;
        if vertices.sign() < 0 {
            old_vertices[0] = if k < DIM - 1 {
                vertices * Perm4::swap(DIM - 1, DIM)
            } else {
                vertices * Perm4::swap(0, 1)
            };
        }
        for i in 1..n_old {
            let Some(g) = self.adjacent(old_simp[0], old_vertices[0].apply(i + k)) else {
                return Ok(false);
            };
            if check && old_simp[..i].contains(&g.tet) {
                return Ok(false);
            }
            old_simp[i] = g.tet;
            old_vertices[i] = g.perm * old_vertices[0] * Perm4::swap(k, i + k);
        }
        if check {
            for i in 1..n_old {
                for j in 1..i {
                    match self.adjacent(old_simp[j], old_vertices[j].apply(i + k)) {
                        Some(g)
                            if g.tet == old_simp[i]
                                && g.perm * old_vertices[j] * Perm4::swap(i + k, j + k)
                                    == old_vertices[i] => {}
                        _ => return Ok(false),
                    }
                }
            }
        }
        if !perform {
            return Ok(true);
        }

        let old = &old_simp[..n_old];
        for j in 0..n_old {
            if self.is_simplex_locked(old_simp[j]) {
                return Err(TriError::LockViolation(format!(
                    "tetrahedron {} is locked",
                    old_simp[j]
                )));
            }
            for v in k + 1..=DIM {
                self.ensure_facet_unlocked(old_simp[j], old_vertices[j].apply(v))?;
            }
        }

        self.topology_preserving(|tri| {
            let base = tri.size();
            for _ in 0..=k {
                tri.new_tetrahedron_raw(String::new());
            }
            let new_simp = |i: usize| base + k - i;

            let mut adj = [[None::<(usize, Perm4)>; 4]; 4];
            let mut carried = [[false; 4]; 4];
            for i in 0..=k {
                for j in 0..=DIM - k {
                    let old_facet = if i < k { i } else { k + j };
                    let facet = old_vertices[j].apply(old_facet);
                    carried[i][j] = tri.is_facet_locked(old_simp[j], facet);
                    let Some(g) = tri.adjacent(old_simp[j], facet) else { continue };
                    let mut gluing = g.perm * old_vertices[j] * move_perm(DIM - k, i, j);
                    let mut dest = Some(g.tet);
                    if let Some(l) = old.iter().position(|&t| t == g.tet) {
                        let new_facet = if j < DIM - k { j } else { i + DIM - k };
                        let mut dest_facet = old_vertices[l].pre(gluing.apply(new_facet));
                        if j < l || (j == l && old_facet < dest_facet) {
                            dest = None;
                        } else {
                            dest_facet = dest_facet.min(k);
                            dest = Some(new_simp(dest_facet));
                            gluing = move_perm(k, l, dest_facet) * old_vertices[l].inverse() * gluing;
                        }
                    }
                    adj[i][j] = dest.map(|d| (d, gluing));
                }
            }

            for &t in old {
                tri.isolate_raw(t);
            }
            for i in 0..=k {
                for j in 0..=DIM - k {
                    let facet = if j < DIM - k { j } else { i + DIM - k };
                    if let Some((d, p)) = adj[i][j] {
                        tri.join_raw(new_simp(i), facet, d, p);
                    }
                    if carried[i][j] {
                        tri.lock_facet_raw(new_simp(i), facet);
                    }
                }
            }
            for i in 1..=k {
                for j in 0..i {
                    tri.join_raw(
                        new_simp(i),
                        j + DIM - k,
                        new_simp(j),
                        Perm4::swap(i + DIM - k, j + DIM - k),
                    );
                }
            }
            tri.remove_tetrahedra_raw(old.to_vec());
        });
        Ok(true)
    }
}
