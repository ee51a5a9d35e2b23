//! First homology and fundamental group.
//!
//! Absolute invariants come from the dual 2-skeleton: generators are the
//! internal triangles not crossed by a maximal forest of the dual graph,
//! and each internal edge contributes the relator read off by walking
//! around it. For ideal triangulations this describes the truncated
//! manifold.

use std::collections::VecDeque;

use crate::maths::group::{GroupExpressionTerm, GroupPresentation};
use crate::maths::integer::Integer;
use crate::maths::matrix::{AbelianGroup, MatrixInt};
use crate::maths::perm::EDGE_NUMBER;
use crate::tri_error::TriError;

use super::Triangulation;

const NOT_GENERATOR: usize = usize::MAX;

impl Triangulation {
    /// Map each triangle to its generator index in the dual presentation.
    fn dual_generators(&self) -> (usize, Vec<usize>) {
        let sk = self.skeleton();
        let n = self.size();
        let mut in_tree = vec![false; sk.triangles.len()];
        let mut seen = vec![false; n];
        for s in 0..n {
            if seen[s] {
                continue;
            }
            seen[s] = true;
            let mut queue = VecDeque::from([s]);
            while let Some(t) = queue.pop_front() {
                for f in 0..4 {
                    let Some(u) = self.adjacent_tet(t, f) else { continue };
                    if !seen[u] {
                        seen[u] = true;
                        in_tree[sk.tet_triangle[t][f]] = true;
                        queue.push_back(u);
                    }
                }
            }
        }
        let mut index = vec![NOT_GENERATOR; sk.triangles.len()];
        let mut count = 0;
        for (i, tri) in sk.triangles.iter().enumerate() {
            if !tri.is_boundary() && !in_tree[i] {
                index[i] = count;
                count += 1;
            }
        }
        (count, index)
    }

    /// Relator words of the dual presentation, one per internal edge.
    fn dual_relators(&self, gen_index: &[usize]) -> Vec<Vec<GroupExpressionTerm>> {
        let sk = self.skeleton();
        let mut out = Vec::new();
        for edge in &sk.edges {
            if edge.boundary {
                continue;
            }
            let mut word = Vec::new();
            for emb in &edge.embeddings {
                let f = emb.perm.apply(2);
                let tri = sk.tet_triangle[emb.tet][f];
                let g = gen_index[tri];
                if g == NOT_GENERATOR {
                    continue;
                }
                let front = sk.triangles[tri].front();
                let forward = front.tet == emb.tet && front.perm.apply(3) == f;
                word.push(GroupExpressionTerm::new(g, if forward { 1 } else { -1 }));
            }
            out.push(word);
        }
        out
    }

    /// First homology group of the (truncated) manifold.
    pub fn homology(&self) -> &AbelianGroup {
        self.props.homology.get_or_init(|| {
            let (n_gens, index) = self.dual_generators();
            let relators = self.dual_relators(&index);
            let mut m = MatrixInt::new(relators.len(), n_gens);
            for (r, word) in relators.iter().enumerate() {
                for t in word {
                    *m.entry_mut(r, t.generator) += Integer::new(t.exponent);
                }
            }
            AbelianGroup::from_presentation(m)
        })
    }

    /// Fundamental group, as a simplified presentation.
    pub fn fundamental_group(&self) -> &GroupPresentation {
        self.props.fundamental_group.get_or_init(|| {
            let (n_gens, index) = self.dual_generators();
            let mut group = GroupPresentation::new(n_gens);
            for word in self.dual_relators(&index) {
                // Generators come from the same index table, so this cannot fail.
                let _ = group.add_relation(word);
            }
            group.simplify_words();
            group
        })
    }

    /// First homology relative to the boundary (real boundary triangles
    /// together with ideal and invalid vertices), from cellular chains.
    pub fn homology_rel(&self) -> &AbelianGroup {
        self.props.homology_rel.get_or_init(|| {
            let sk = self.skeleton();
            let vert_index = relative_index(sk.vertices.iter().map(|v| v.is_boundary()));
            let edge_index = relative_index(sk.edges.iter().map(|e| e.boundary));
            let tri_index = relative_index(sk.triangles.iter().map(|t| t.is_boundary()));
            let n_verts = vert_index.iter().filter(|i| i.is_some()).count();
            let n_edges = edge_index.iter().filter(|i| i.is_some()).count();
            let n_tris = tri_index.iter().filter(|i| i.is_some()).count();

            let mut d1 = MatrixInt::new(n_edges, n_verts);
            for (e, edge) in sk.edges.iter().enumerate() {
                let Some(row) = edge_index[e] else { continue };
                if let Some(c) = vert_index[edge.vertices[1]] {
                    *d1.entry_mut(row, c) += Integer::ONE;
                }
                if let Some(c) = vert_index[edge.vertices[0]] {
                    *d1.entry_mut(row, c) += Integer::new(-1);
                }
            }

            let mut d2 = MatrixInt::new(n_tris, n_edges);
            for (i, tri) in sk.triangles.iter().enumerate() {
                let Some(row) = tri_index[i] else { continue };
                let emb = tri.front();
                let p = emb.perm;
                // boundary of [v0, v1, v2] = [v1, v2] - [v0, v2] + [v0, v1]
                for (a, b, sign) in [(1, 2, 1i64), (0, 2, -1), (0, 1, 1)] {
                    let (va, vb) = (p.apply(a), p.apply(b));
                    let en = EDGE_NUMBER[va][vb];
                    let e = sk.tet_edge[emb.tet][en];
                    let Some(col) = edge_index[e] else { continue };
                    let dir = if sk.tet_edge_perm[emb.tet][en].apply(0) == va { 1 } else { -1 };
                    *d2.entry_mut(row, col) += Integer::new(sign * dir);
                }
            }

            let rank = n_edges - d1.rank() - d2.rank();
            let mut snf = d2;
            snf.smith_normal_form();
            let torsion: Vec<Integer> = snf
                .diagonal()
                .into_iter()
                .filter(|d| !d.is_zero() && *d != 1)
                .collect();
            AbelianGroup::from_invariants(rank, &torsion)
        })
    }

    /// First homology of the boundary surfaces (real and ideal).
    ///
    /// # Errors
    /// `FailedPrecondition` if some boundary component is invalid.
    pub fn homology_bdry(&self) -> Result<&AbelianGroup, TriError> {
        if let Some(g) = self.props.homology_bdry.get() {
            return Ok(g);
        }
        let mut rank = 0usize;
        let mut torsion = Vec::new();
        for bc in &self.skeleton().boundary_components {
            if bc.is_invalid() {
                return Err(TriError::FailedPrecondition(
                    "boundary homology of an invalid boundary component".into(),
                ));
            }
            let deficit = 2 - bc.euler_char;
            if bc.orientable {
                rank += deficit.max(0) as usize;
            } else {
                rank += (deficit - 1).max(0) as usize;
                torsion.push(Integer::new(2));
            }
        }
        let group = AbelianGroup::from_invariants(rank, &torsion);
        Ok(self.props.homology_bdry.get_or_init(|| group))
    }
}

/// Number the cells that are not on the boundary.
fn relative_index(boundary: impl Iterator<Item = bool>) -> Vec<Option<usize>> {
    let mut next = 0;
    boundary
        .map(|b| {
            if b {
                None
            } else {
                next += 1;
                Some(next - 1)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::maths::integer::Integer;
    use crate::triangulation::Triangulation;
    use crate::triangulation::example;

    #[test]
    fn ball_and_solid_torus() {
        let ball = Triangulation::from_gluings(1, &[]).unwrap();
        assert!(ball.homology().is_trivial());
        assert!(ball.homology_rel().is_trivial());
        assert_eq!(ball.homology_bdry().unwrap().to_string(), "0");

        let lst = example::lst(1, 2).unwrap();
        assert!(lst.homology().is_z());
        assert_eq!(lst.homology_bdry().unwrap().to_string(), "2 Z");
    }

    #[test]
    fn figure_eight_and_gieseking() {
        let fig8 = example::figure_eight();
        assert!(fig8.homology().is_z());
        let gies = example::gieseking();
        assert!(gies.homology().is_z());
        assert_eq!(gies.homology_bdry().unwrap().to_string(), "Z + Z_2");
    }

    #[test]
    fn lens_space_torsion() {
        let l = example::lens(5, 2).unwrap();
        assert_eq!(l.homology().torsion(), &[Integer::new(5)]);
        assert_eq!(l.fundamental_group().abelianisation().to_string(), "Z_5");
    }
}
