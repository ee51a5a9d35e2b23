//! Crushing a normal surface, and trading octagons for quads.

use std::sync::Arc;

use crate::maths::integer::Integer;
use crate::maths::perm::{EDGE_VERTEX, Perm4};
use crate::surfaces::NormalSurface;
use crate::surfaces::encoding::NormalCoords;
use crate::surfaces::tables::QUAD_PARTNER;
use crate::tri_error::TriError;
use crate::triangulation::{CloneOptions, Triangulation};

impl NormalSurface {
    /// The single quad type used in each tetrahedron, if any.
    ///
    /// # Errors
    /// `FailedPrecondition` if some tetrahedron holds two quad types.
    pub(crate) fn quad_types(&self) -> Result<Vec<Option<usize>>, TriError> {
        (0..self.tri.size())
            .map(|t| {
                let mut used = (0..3).filter(|&k| !self.quads(t, k).is_zero());
                let first = used.next();
                if used.next().is_some() {
                    return Err(TriError::FailedPrecondition(format!(
                        "tetrahedron {t} holds more than one quad type"
                    )));
                }
                Ok(first)
            })
            .collect()
    }

    /// Cut along the surface and crush every copy of it to a point.
    ///
    /// Tetrahedra without quads survive. Each tetrahedron with quads is
    /// flattened, which pairs its facets across the quad; facets of
    /// surviving tetrahedra are reglued through chains of flattened ones.
    ///
    /// # Errors
    /// `FailedPrecondition` for spun surfaces, surfaces with octagons, or
    /// surfaces that are not embedded.
    pub fn crush(&self) -> Result<Triangulation, TriError> {
        self.require_compact("crushing")?;
        if self.has_octagons() {
            return Err(TriError::FailedPrecondition("cannot crush a surface with octagons".into()));
        }
        let quads = self.quad_types()?;
        let n = self.tri.size();
        let mut ans = self.tri.clone_with(CloneOptions::default());

        let mut result = Ok(());
        ans.change_span(|ans| {
            for t in (0..n).filter(|&t| quads[t].is_none()) {
                for f in 0..4 {
                    let Some(g) = ans.adjacent(t, f) else { continue };
                    if quads[g.tet].is_none() {
                        continue;
                    }
                    ans.unjoin_raw(t, f);
                    let (mut adj, mut perm) = (g.tet, g.perm);
                    let mut steps = 0;
                    let mut end = true;
                    while let Some(q) = quads[adj] {
                        steps += 1;
                        if steps > 4 * n {
                            result = Err(TriError::ImpossibleScenario(
                                "crushing walked a cycle of flattened tetrahedra".into(),
                            ));
                            return;
                        }
                        let entry = perm.apply(f);
                        let swap = Perm4::swap(entry, QUAD_PARTNER[q][entry]);
                        match ans.adjacent(adj, swap.apply(entry)) {
                            Some(h) => {
                                perm = h.perm * swap * perm;
                                adj = h.tet;
                            }
                            None => {
                                end = false;
                                break;
                            }
                        }
                    }
                    if !end {
                        continue;
                    }
                    let adj_face = perm.apply(f);
                    if (adj, adj_face) == (t, f) {
                        continue;
                    }
                    ans.unjoin_raw(adj, adj_face);
                    ans.join_raw(t, f, adj, perm);
                }
            }
            ans.remove_tetrahedra_raw((0..n).filter(|&t| quads[t].is_some()).collect());
        });
        result.map(|()| ans)
    }

    /// The same surface with every octagon replaced by quads, in a
    /// subdivision of the triangulation where each tetrahedron holding
    /// octagons is split into three.
    ///
    /// The middle piece keeps the tetrahedron's index and takes the
    /// octagons as quads; the outer two are appended at the end and take
    /// the octagons as pairs of triangles. The result is in standard
    /// coordinates.
    ///
    /// # Errors
    /// `FailedPrecondition` for spun surfaces or a tetrahedron holding two
    /// octagon types.
    pub fn remove_octs(&self) -> Result<NormalSurface, TriError> {
        self.require_compact("removing octagons")?;
        let tri = &*self.tri;
        let n = tri.size();
        let coords = self.finite_coords()?;
        let mut blocks: Vec<[Integer; 7]> = coords
            .chunks(10)
            .map(|b| core::array::from_fn(|i| b[i].clone()))
            .collect();

        let mut ans = Triangulation::new();
        ans.new_tetrahedra(n);
        let mut owner: Vec<[usize; 4]> = (0..n).map(|t| [t; 4]).collect();
        let mut splits = Vec::new();

        for t in 0..n {
            let mut used = (0..3).filter(|&k| !self.octs(t, k).is_zero());
            let Some(k) = used.next() else { continue };
            if used.next().is_some() {
                return Err(TriError::FailedPrecondition(format!(
                    "tetrahedron {t} holds more than one octagon type"
                )));
            }
            let m = coords[10 * t + 7 + k].clone();
            let outer_a = ans.new_tetrahedron();
            let outer_c = ans.new_tetrahedron();
            let a_faces = EDGE_VERTEX[5 - k];
            let c_faces = EDGE_VERTEX[k];
            for f in a_faces {
                owner[t][f] = outer_a;
            }
            for f in c_faces {
                owner[t][f] = outer_c;
            }

            let mut a_block: [Integer; 7] = Default::default();
            let mut c_block: [Integer; 7] = Default::default();
            for v in 0..4 {
                a_block[v] = blocks[t][v].clone();
                c_block[v] = blocks[t][v].clone();
            }
            for v in c_faces {
                a_block[v] += &m;
            }
            for v in a_faces {
                c_block[v] += &m;
            }
            blocks[t].swap(a_faces[0], a_faces[1]);
            blocks[t][4 + k] += &m;
            blocks.push(a_block);
            blocks.push(c_block);
            splits.push((t, outer_a, outer_c, a_faces, c_faces));
        }

        for t in 0..n {
            for f in 0..4 {
                let Some(g) = tri.adjacent(t, f) else { continue };
                let back = g.perm.apply(f);
                if (g.tet, back) < (t, f) {
                    continue;
                }
                ans.join(owner[t][f], f, owner[g.tet][back], g.perm)?;
            }
        }
        for (b, a, c, a_faces, c_faces) in splits {
            let swap = Perm4::swap(a_faces[0], a_faces[1]);
            for f in c_faces {
                ans.join(b, f, a, swap)?;
            }
            for f in a_faces {
                ans.join(b, f, c, swap)?;
            }
        }

        let vector = blocks.into_iter().flatten().collect();
        let mut s = NormalSurface::from_integers(Arc::new(ans), NormalCoords::Standard, vector)?;
        s.set_name(self.name.clone());
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_invariants::DebugInvariants;
    use crate::triangulation::example;

    fn surface(tri: &Arc<Triangulation>, coords: NormalCoords, v: &[i64]) -> NormalSurface {
        NormalSurface::from_integers(tri.clone(), coords, v.iter().map(|&x| Integer::new(x)).collect()).unwrap()
    }

    #[test]
    fn crushing_a_vertex_link_changes_nothing() {
        let tri = Arc::new(example::poincare_homology_sphere());
        let link = NormalSurface::vertex_link(tri.clone(), 0).unwrap();
        let crushed = link.crush().unwrap();
        assert!(crushed.is_identical_to(&tri));
    }

    #[test]
    fn crushing_a_splitting_surface_leaves_nothing() {
        let tri = Arc::new(example::figure_eight());
        let mut v = vec![0i64; 14];
        v[4] = 1;
        v[11] = 1;
        let crushed = surface(&tri, NormalCoords::Standard, &v).crush().unwrap();
        assert!(crushed.is_empty());
    }

    #[test]
    fn crushing_a_meridian_disc_keeps_nothing() {
        // The only tetrahedron of the layered solid torus holds the quad.
        let tri = Arc::new(example::lst(1, 2).unwrap());
        let disc = surface(&tri, NormalCoords::Standard, &[1, 1, 0, 0, 0, 0, 1]);
        assert_eq!(disc.crush().unwrap().size(), 0);
    }

    #[test]
    fn crushing_rejects_octagons_and_clashing_quads() {
        let tri = Arc::new(example::figure_eight());
        let mut v = vec![0i64; 20];
        v[7] = 1;
        let oct = surface(&tri, NormalCoords::AlmostNormal, &v);
        assert!(matches!(oct.crush(), Err(TriError::FailedPrecondition(_))));
        let mut w = vec![0i64; 14];
        w[4] = 1;
        w[5] = 1;
        let clash = surface(&tri, NormalCoords::Standard, &w);
        assert!(matches!(clash.crush(), Err(TriError::FailedPrecondition(_))));
    }

    #[test]
    fn removing_no_octagons_copies_the_surface() {
        let tri = Arc::new(example::twisted_kxi());
        let link = NormalSurface::vertex_link(tri.clone(), 0).unwrap();
        let same = link.remove_octs().unwrap();
        assert_eq!(same.triangulation().size(), tri.size());
        assert!(same.triangulation().is_identical_to(&tri));
        assert_eq!(same.vector(), link.vector());
        assert_eq!(same.name(), link.name());
    }

    #[test]
    fn removing_octagons_splits_their_tetrahedra() {
        let tri = Arc::new(example::figure_eight());
        let mut v = vec![0i64; 20];
        v[8] = 2;
        let s = surface(&tri, NormalCoords::AlmostNormal, &v);
        let out = s.remove_octs().unwrap();
        let sub = out.triangulation();
        assert_eq!(sub.size(), 4);
        assert_eq!(sub.homology().to_string(), tri.homology().to_string());
        assert_eq!(*out.quads(0, 1), crate::maths::integer::LargeInteger::from(2));
        assert_eq!(out.oct_position(), None);
        sub.validate_invariants().unwrap();
    }
}
