//! Vertex links and thin edge links as normal surfaces.

use std::sync::Arc;

use crate::maths::integer::Integer;
use crate::maths::perm::EDGE_NUMBER;
use crate::surfaces::disc::DISC_TYPES;
use crate::surfaces::encoding::NormalCoords;
use crate::surfaces::tables::QUAD_SEPARATING;
use crate::surfaces::NormalSurface;
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

impl NormalSurface {
    /// The link of vertex `v`: one triangle at every corner of `v`, in
    /// standard coordinates.
    pub fn vertex_link(tri: impl Into<Arc<Triangulation>>, v: usize) -> Result<NormalSurface, TriError> {
        let tri = tri.into();
        let sk = tri.skeleton();
        if v >= sk.vertices.len() {
            return Err(TriError::InvalidArgument(format!(
                "vertex {v} out of range ({})",
                sk.vertices.len()
            )));
        }
        let mut vector = vec![Integer::ZERO; 7 * tri.size()];
        for emb in &sk.vertices[v].embeddings {
            vector[7 * emb.tet + emb.vertex] = Integer::ONE;
        }
        let mut s = NormalSurface::from_integers(tri, NormalCoords::Standard, vector)?;
        s.set_name(format!("Link of vertex {v}"));
        Ok(s)
    }

    /// The thin link of edge `e` in standard coordinates, or `None` when
    /// the frontier of a neighbourhood of `e` is not already normal.
    pub fn thin_edge_link(tri: impl Into<Arc<Triangulation>>, e: usize) -> Result<Option<NormalSurface>, TriError> {
        let tri = tri.into();
        if e >= tri.count_edges() {
            return Err(TriError::InvalidArgument(format!(
                "edge {e} out of range ({})",
                tri.count_edges()
            )));
        }
        let Some(full) = thin_edge_link_coords(&tri, e) else {
            return Ok(None);
        };
        let vector = full
            .chunks(DISC_TYPES)
            .flat_map(|block| block[..7].iter().cloned())
            .collect();
        let mut s = NormalSurface::from_integers(tri, NormalCoords::Standard, vector)?;
        s.set_name(format!("Thin link of edge {e}"));
        Ok(Some(s))
    }
}

/// Ten-per-tetrahedron coordinates of the frontier of a regular
/// neighbourhood of edge `e`, if that frontier is normal.
///
/// Within each tetrahedron the neighbourhood meets the corners at the ends
/// of `e` and the local copies of `e`. Each piece is a single corner (one
/// triangle) or one copy of `e` with its two corners (one quad). Any other
/// piece makes the frontier non-normal.
pub(crate) fn thin_edge_link_coords(tri: &Triangulation, e: usize) -> Option<Vec<Integer>> {
    let sk = tri.skeleton();
    let ends = sk.edges[e].vertices;
    let mut out = vec![Integer::ZERO; DISC_TYPES * tri.size()];
    for t in 0..tri.size() {
        let at_end: Vec<bool> = (0..4).map(|v| ends.contains(&tri.tet_vertex(t, v))).collect();
        let mut partner = [None; 4];
        for a in 0..4 {
            for b in (a + 1)..4 {
                if tri.tet_edge(t, EDGE_NUMBER[a][b]) != e {
                    continue;
                }
                if partner[a].is_some() || partner[b].is_some() {
                    return None;
                }
                partner[a] = Some(b);
                partner[b] = Some(a);
            }
        }
        for v in 0..4 {
            match partner[v] {
                Some(w) if v < w => out[DISC_TYPES * t + 4 + QUAD_SEPARATING[v][w]] += &Integer::ONE,
                Some(_) => {}
                None if at_end[v] => out[DISC_TYPES * t + v] += &Integer::ONE,
                None => {}
            }
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::example;

    #[test]
    fn every_vertex_link_is_recognised() {
        for tri in [example::twisted_kxi(), example::lst(2, 3).unwrap(), example::three_sphere()] {
            let tri = Arc::new(tri);
            for v in 0..tri.count_vertices() {
                let link = NormalSurface::vertex_link(tri.clone(), v).unwrap();
                assert_eq!(link.is_vertex_link(), Some(v));
                assert!(link.is_connected().unwrap());
            }
        }
        assert!(NormalSurface::vertex_link(example::figure_eight(), 1).is_err());
    }

    #[test]
    fn opposite_edges_of_a_ball_share_a_thin_link() {
        let tri = Arc::new(example::ball());
        let (e01, e23) = (tri.tet_edge(0, 0), tri.tet_edge(0, 5));
        let link = NormalSurface::thin_edge_link(tri.clone(), e01).unwrap().unwrap();
        assert_eq!(*link.quads(0, 0), crate::maths::integer::LargeInteger::ONE);
        assert_eq!(link.euler_char().unwrap(), Integer::ONE);
        let (first, second) = link.is_thin_edge_link();
        let mut found = vec![first.unwrap(), second.unwrap()];
        found.sort_unstable();
        let mut expected = vec![e01, e23];
        expected.sort_unstable();
        assert_eq!(found, expected);
        assert_eq!(link.is_normal_edge_link(), (expected, 2));
    }

    #[test]
    fn thin_edge_links_are_recognised() {
        let tri = Arc::new(example::poincare_homology_sphere());
        for e in 0..tri.count_edges() {
            let Some(link) = NormalSurface::thin_edge_link(tri.clone(), e).unwrap() else {
                continue;
            };
            let (first, second) = link.is_thin_edge_link();
            assert!(first == Some(e) || second == Some(e));
            assert!(link.is_normal_edge_link().0.contains(&e));
            assert_eq!(link.is_vertex_link(), None);
            assert_eq!(link.double_surface().is_thin_edge_link().0, first);
        }
        assert!(NormalSurface::thin_edge_link(tri.clone(), tri.count_edges()).is_err());
    }
}
