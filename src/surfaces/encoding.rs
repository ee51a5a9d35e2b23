//! Coordinate systems and the encodings that store surfaces in them.
//!
//! A [`NormalCoords`] is what a user asks for; a [`NormalEncoding`] is how
//! a vector is laid out in memory. Each tetrahedron owns one block of
//! `block_size()` entries: triangle coordinates first (if stored), then the
//! three quads, then the three octagons (if stored).

use core::fmt::{Display, Formatter};
use core::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::maths::integer::{Integer, LargeInteger};
use crate::surfaces::tables::{QUAD_MEETING, QUAD_SEPARATING};
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

/// Coordinate systems for normal and almost normal surfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalCoords {
    /// Triangles and quads, 7 per tetrahedron.
    Standard,
    /// Quads only, 3 per tetrahedron. Admits spun surfaces.
    Quad,
    /// Quads only, restricted to closed surfaces via cusp slope equations.
    QuadClosed,
    /// Triangles, quads and octagons, 10 per tetrahedron.
    AlmostNormal,
    /// Quads and octagons, 6 per tetrahedron.
    QuadOct,
    /// Quads and octagons, restricted to closed surfaces.
    QuadOctClosed,
    /// Edge weights. Output only.
    EdgeWeight,
}

impl NormalCoords {
    pub fn name(&self) -> &'static str {
        match self {
            NormalCoords::Standard => "Standard normal (tri-quad)",
            NormalCoords::Quad => "Quad normal",
            NormalCoords::QuadClosed => "Closed quad (non-spun)",
            NormalCoords::AlmostNormal => "Standard almost normal (tri-quad-oct)",
            NormalCoords::QuadOct => "Quad-oct almost normal",
            NormalCoords::QuadOctClosed => "Closed quad-oct (non-spun)",
            NormalCoords::EdgeWeight => "Edge weights",
        }
    }

    /// True for the systems that append cusp slope equations.
    #[inline]
    pub fn is_closed_variant(&self) -> bool {
        matches!(self, NormalCoords::QuadClosed | NormalCoords::QuadOctClosed)
    }
}

impl Display for NormalCoords {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage layout of a normal surface vector, plus what the layout allows
/// the surface to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalEncoding(u8);

impl NormalEncoding {
    pub const STORES_TRIANGLES: NormalEncoding = NormalEncoding(0x01);
    pub const STORES_OCTAGONS: NormalEncoding = NormalEncoding(0x02);
    /// Vertex links are visible in this layout (it stores triangles).
    pub const COULD_BE_VERTEX_LINK: NormalEncoding = NormalEncoding(0x04);
    /// Vectors may describe spun (infinite) surfaces.
    pub const COULD_BE_NON_COMPACT: NormalEncoding = NormalEncoding(0x08);

    const EMPTY: NormalEncoding = NormalEncoding(0);

    /// Encoding used by vectors of the given coordinate system.
    pub fn new(coords: NormalCoords) -> Result<Self, TriError> {
        use NormalEncoding as E;
        Ok(match coords {
            NormalCoords::Standard => E::STORES_TRIANGLES | E::COULD_BE_VERTEX_LINK,
            NormalCoords::Quad => E::COULD_BE_NON_COMPACT,
            NormalCoords::QuadClosed => E::EMPTY,
            NormalCoords::AlmostNormal => {
                E::STORES_TRIANGLES | E::STORES_OCTAGONS | E::COULD_BE_VERTEX_LINK
            }
            NormalCoords::QuadOct => E::STORES_OCTAGONS | E::COULD_BE_NON_COMPACT,
            NormalCoords::QuadOctClosed => E::STORES_OCTAGONS,
            NormalCoords::EdgeWeight => {
                return Err(TriError::InvalidArgument(
                    "edge weight coordinates cannot store surfaces".into(),
                ));
            }
        })
    }

    #[inline]
    fn has(&self, flag: NormalEncoding) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Entries per tetrahedron: 3, 6, 7 or 10.
    #[inline]
    pub fn block_size(&self) -> usize {
        3 + if self.stores_triangles() { 4 } else { 0 } + if self.stores_octagons() { 3 } else { 0 }
    }

    #[inline]
    pub fn stores_triangles(&self) -> bool {
        self.has(Self::STORES_TRIANGLES)
    }

    #[inline]
    pub fn stores_octagons(&self) -> bool {
        self.has(Self::STORES_OCTAGONS)
    }

    #[inline]
    pub fn could_be_vertex_link(&self) -> bool {
        self.has(Self::COULD_BE_VERTEX_LINK)
    }

    #[inline]
    pub fn could_be_non_compact(&self) -> bool {
        self.has(Self::COULD_BE_NON_COMPACT)
    }

    #[inline]
    pub fn could_be_almost_normal(&self) -> bool {
        self.stores_octagons()
    }

    /// Offset of the first quad coordinate within a block.
    #[inline]
    pub fn quad_offset(&self) -> usize {
        if self.stores_triangles() { 4 } else { 0 }
    }

    /// Offset of the first octagon coordinate within a block, if stored.
    #[inline]
    pub fn oct_offset(&self) -> Option<usize> {
        self.stores_octagons().then(|| self.quad_offset() + 3)
    }

    /// The same encoding without triangle coordinates. Vertex links vanish
    /// from such a layout.
    pub fn without_triangles(self) -> Self {
        NormalEncoding(self.0 & !(Self::STORES_TRIANGLES.0 | Self::COULD_BE_VERTEX_LINK.0))
    }

    /// The same encoding with triangle coordinates.
    pub fn with_triangles(self) -> Self {
        NormalEncoding(self.0 | Self::STORES_TRIANGLES.0)
    }

    /// Partial order on layouts: `self ⊑ other` when `other` stores every
    /// coordinate `self` stores.
    pub fn le(&self, other: &NormalEncoding) -> bool {
        let storage = Self::STORES_TRIANGLES.0 | Self::STORES_OCTAGONS.0;
        (self.0 & storage) & !(other.0 & storage) == 0
    }

    /// Raw bit pattern, for diagnostics and serialisation.
    #[inline]
    pub fn bits(&self) -> u8 {
        self.0
    }
}

/// Least upper bound: stores everything either side stores and allows
/// everything either side allows.
impl BitOr for NormalEncoding {
    type Output = NormalEncoding;
    fn bitor(self, rhs: NormalEncoding) -> NormalEncoding {
        NormalEncoding(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Promotion and triangle reconstruction
// ---------------------------------------------------------------------------

/// Number of normal arcs cut off vertex `v` on facet `f` by the quads and
/// octagons of one tetrahedron (triangles excluded).
#[inline]
pub(crate) fn non_triangle_arcs(quads: &[Integer; 3], octs: &[Integer; 3], v: usize, f: usize) -> Integer {
    let [m0, m1] = QUAD_MEETING[v][f];
    &(&quads[QUAD_SEPARATING[v][f]] + &octs[m0]) + &octs[m1]
}

/// Triangle coordinates for a surface given only its quads and octagons.
///
/// For each vertex, values are propagated corner to corner across internal
/// facets using the arc counts on that facet, starting from zero at one
/// corner, and finally shifted so the smallest is zero. A vertex whose
/// propagation is inconsistent carries a spun end of the surface; all of
/// its triangle coordinates are infinite.
pub fn reconstruct_triangles(
    tri: &Triangulation,
    quads: &[[Integer; 3]],
    octs: &[[Integer; 3]],
) -> Vec<[LargeInteger; 4]> {
    let n = tri.size();
    let mut out: Vec<[LargeInteger; 4]> = vec![Default::default(); n];
    let mut value: Vec<[Option<Integer>; 4]> = vec![Default::default(); n];

    for vertex in &tri.skeleton().vertices {
        let Some(start) = vertex.embeddings.first() else { continue };
        value[start.tet][start.vertex] = Some(Integer::ZERO);
        let mut consistent = true;
        let mut stack = vec![(start.tet, start.vertex)];
        while let Some((t, v)) = stack.pop() {
            let Some(here) = value[t][v].clone() else { continue };
            for f in (0..4).filter(|&f| f != v) {
                let Some(g) = tri.adjacent(t, f) else { continue };
                let (u, w, uf) = (g.tet, g.perm.apply(v), g.perm.apply(f));
                let arcs = &here + &non_triangle_arcs(&quads[t], &octs[t], v, f);
                let there = &arcs - &non_triangle_arcs(&quads[u], &octs[u], w, uf);
                match &value[u][w] {
                    None => {
                        value[u][w] = Some(there);
                        stack.push((u, w));
                    }
                    Some(existing) => {
                        if *existing != there {
                            consistent = false;
                        }
                    }
                }
            }
        }

        if consistent {
            let min = vertex
                .embeddings
                .iter()
                .filter_map(|emb| value[emb.tet][emb.vertex].clone())
                .min()
                .unwrap_or(Integer::ZERO);
            for emb in &vertex.embeddings {
                let v = value[emb.tet][emb.vertex].clone().unwrap_or(Integer::ZERO);
                out[emb.tet][emb.vertex] = LargeInteger::Finite(&v - &min);
            }
        } else {
            for emb in &vertex.embeddings {
                out[emb.tet][emb.vertex] = LargeInteger::Infinity;
            }
        }
    }
    out
}

fn finite_block(vector: &[LargeInteger], start: usize, what: &str) -> Result<[Integer; 3], TriError> {
    Ok([
        vector[start].require_finite(what)?.clone(),
        vector[start + 1].require_finite(what)?.clone(),
        vector[start + 2].require_finite(what)?.clone(),
    ])
}

/// Re-express `vector` (laid out by `from`) in the layout `to`.
///
/// Shared coordinates are copied, absent octagons become zero and missing
/// triangle coordinates are reconstructed (infinite around spun vertices).
/// Requires `from ⊑ to`.
pub fn promote(
    tri: &Triangulation,
    vector: &[LargeInteger],
    from: NormalEncoding,
    to: NormalEncoding,
) -> Result<Vec<LargeInteger>, TriError> {
    let n = tri.size();
    if vector.len() != from.block_size() * n {
        return Err(TriError::InvalidArgument(format!(
            "vector has {} entries, expected {}",
            vector.len(),
            from.block_size() * n
        )));
    }
    if !from.le(&to) {
        return Err(TriError::InvalidArgument(
            "cannot promote to an encoding that stores less".into(),
        ));
    }
    if from.block_size() == to.block_size() {
        return Ok(vector.to_vec());
    }

    let (fb, tb) = (from.block_size(), to.block_size());
    let triangles = if from.stores_triangles() || !to.stores_triangles() {
        None
    } else {
        let mut quads = Vec::with_capacity(n);
        let mut octs = Vec::with_capacity(n);
        for t in 0..n {
            quads.push(finite_block(vector, fb * t + from.quad_offset(), "quad coordinate")?);
            octs.push(match from.oct_offset() {
                Some(off) => finite_block(vector, fb * t + off, "octagon coordinate")?,
                None => [Integer::ZERO, Integer::ZERO, Integer::ZERO],
            });
        }
        Some(reconstruct_triangles(tri, &quads, &octs))
    };

    let mut out = Vec::with_capacity(tb * n);
    for t in 0..n {
        let block = &vector[fb * t..fb * (t + 1)];
        if to.stores_triangles() {
            match &triangles {
                Some(rebuilt) => out.extend(rebuilt[t].iter().cloned()),
                None => out.extend(block[..4].iter().cloned()),
            }
        }
        let q = from.quad_offset();
        out.extend(block[q..q + 3].iter().cloned());
        if to.stores_octagons() {
            match from.oct_offset() {
                Some(o) => out.extend(block[o..o + 3].iter().cloned()),
                None => out.extend([LargeInteger::ZERO, LargeInteger::ZERO, LargeInteger::ZERO]),
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::example;

    fn enc(c: NormalCoords) -> NormalEncoding {
        NormalEncoding::new(c).unwrap()
    }

    fn large(v: &[i64]) -> Vec<LargeInteger> {
        v.iter().map(|&x| LargeInteger::from(x)).collect()
    }

    #[test]
    fn block_sizes_and_flags() {
        assert_eq!(enc(NormalCoords::Standard).block_size(), 7);
        assert_eq!(enc(NormalCoords::Quad).block_size(), 3);
        assert_eq!(enc(NormalCoords::QuadClosed).block_size(), 3);
        assert_eq!(enc(NormalCoords::AlmostNormal).block_size(), 10);
        assert_eq!(enc(NormalCoords::QuadOct).block_size(), 6);
        assert!(enc(NormalCoords::Quad).could_be_non_compact());
        assert!(!enc(NormalCoords::QuadClosed).could_be_non_compact());
        assert!(enc(NormalCoords::Standard).could_be_vertex_link());
        assert!(enc(NormalCoords::QuadOct).could_be_almost_normal());
        assert!(matches!(
            NormalEncoding::new(NormalCoords::EdgeWeight),
            Err(TriError::InvalidArgument(_))
        ));
    }

    #[test]
    fn join_and_order() {
        let std = enc(NormalCoords::Standard);
        let quad = enc(NormalCoords::Quad);
        let qo = enc(NormalCoords::QuadOct);
        let joined = quad | std;
        assert!(joined.stores_triangles());
        assert!(joined.could_be_non_compact());
        assert!(quad.le(&std));
        assert!(!std.le(&quad));
        assert!(quad.le(&qo) && qo.le(&enc(NormalCoords::AlmostNormal)));
        assert!(!qo.le(&std));
        assert_eq!(std.without_triangles().block_size(), 3);
        assert!(!std.without_triangles().could_be_vertex_link());
        assert_eq!(quad.with_triangles().block_size(), 7);
    }

    #[test]
    fn spun_quads_promote_to_infinite_triangles() {
        let fig8 = example::figure_eight();
        // One of the four spun quad vertex surfaces.
        let v = large(&[1, 0, 0, 0, 2, 0]);
        let std = promote(&fig8, &v, enc(NormalCoords::Quad), enc(NormalCoords::Standard)).unwrap();
        assert_eq!(std.len(), 14);
        assert!(std[0].is_infinite());
        assert!(std[10].is_infinite());
        assert_eq!(std[4], LargeInteger::ONE);
        assert_eq!(std[12], LargeInteger::from(2));
    }

    #[test]
    fn closed_quads_reconstruct_finite_triangles() {
        let tri = example::layered_loop(2, false);
        let quad = enc(NormalCoords::Quad);
        let an = enc(NormalCoords::AlmostNormal);
        let zero = large(&[0, 0, 0, 0, 0, 0]);
        let std = promote(&tri, &zero, quad, enc(NormalCoords::Standard)).unwrap();
        assert!(std.iter().all(LargeInteger::is_zero));
        let full = promote(&tri, &zero, quad, an).unwrap();
        assert_eq!(full.len(), 20);
        assert!(promote(&tri, &std, enc(NormalCoords::Standard), quad).is_err());
    }
}
