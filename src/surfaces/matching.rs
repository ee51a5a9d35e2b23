//! Matching equations and embedded-surface constraints.

use crate::maths::integer::Integer;
use crate::maths::matrix::MatrixInt;
use crate::snappea::{CuspSlopes, checked_slopes};
use crate::surfaces::encoding::{NormalCoords, NormalEncoding};
use crate::surfaces::tables::{QUAD_MEETING, QUAD_SEPARATING};
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

/// Matching equations for `coords`, one row per equation and one column per
/// coordinate.
///
/// Systems with triangles get three rows per internal triangle (one per
/// corner). Quad systems get one row per internal edge. The closed quad
/// systems append two slope rows per cusp from `slopes`.
pub fn make_matching_equations(
    tri: &Triangulation,
    coords: NormalCoords,
    slopes: Option<&dyn CuspSlopes>,
) -> Result<MatrixInt, TriError> {
    let enc = NormalEncoding::new(coords)?;
    let b = enc.block_size();
    let n = tri.size();
    let sk = tri.skeleton();
    let mut m = MatrixInt::new(0, b * n);
    let mut row = vec![Integer::ZERO; b * n];

    if enc.stores_triangles() {
        let q = enc.quad_offset();
        for triangle in sk.triangles.iter().filter(|t| !t.is_boundary()) {
            for i in 0..3 {
                row.iter_mut().for_each(|x| *x = Integer::ZERO);
                for (emb, sign) in triangle.embeddings.iter().zip([1i64, -1]) {
                    let (v, f) = (emb.perm.apply(i), emb.perm.apply(3));
                    let base = b * emb.tet;
                    row[base + v] += Integer::new(sign);
                    row[base + q + QUAD_SEPARATING[v][f]] += Integer::new(sign);
                    if let Some(o) = enc.oct_offset() {
                        for k in QUAD_MEETING[v][f] {
                            row[base + o + k] += Integer::new(sign);
                        }
                    }
                }
                m.push_row(&row)?;
            }
        }
    } else {
        for edge in sk.edges.iter().filter(|e| !e.boundary) {
            row.iter_mut().for_each(|x| *x = Integer::ZERO);
            for emb in &edge.embeddings {
                let p = emb.perm;
                let base = b * emb.tet;
                let up = QUAD_SEPARATING[p.apply(0)][p.apply(2)];
                let down = QUAD_SEPARATING[p.apply(0)][p.apply(3)];
                row[base + up] += Integer::ONE;
                row[base + down] += Integer::new(-1);
                if let Some(o) = enc.oct_offset() {
                    row[base + o + up] += Integer::new(-1);
                    row[base + o + down] += Integer::ONE;
                }
            }
            m.push_row(&row)?;
        }
    }

    if coords.is_closed_variant() {
        if !tri.is_ideal() || tri.has_real_boundary() || !tri.is_valid() {
            return Err(TriError::FailedPrecondition(
                "closed quad coordinates need a valid ideal triangulation without real boundary".into(),
            ));
        }
        let Some(slopes) = slopes else {
            return Err(TriError::FailedPrecondition(
                "closed quad coordinates need cusp slope equations".into(),
            ));
        };
        let eqns = checked_slopes(tri, slopes)?;
        for r in 0..eqns.rows() {
            row.iter_mut().for_each(|x| *x = Integer::ZERO);
            for t in 0..n {
                for k in 0..3 {
                    row[b * t + k] = eqns.entry(r, 3 * t + k).clone();
                }
            }
            m.push_row(&row)?;
        }
    }
    Ok(m)
}

/// Sets of coordinates that may not be simultaneously positive in an
/// embedded surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedConstraints {
    /// Per tetrahedron: its quad and octagon columns. At most one may be
    /// positive.
    pub per_tet: Vec<Vec<usize>>,
    /// Every octagon column. At most one may be positive.
    pub octagons: Vec<usize>,
}

impl EmbeddedConstraints {
    /// True if the support described by `positive` violates no constraint.
    pub fn admits(&self, positive: impl Fn(usize) -> bool) -> bool {
        self.per_tet
            .iter()
            .all(|cols| cols.iter().filter(|&&c| positive(c)).count() <= 1)
            && self.octagons.iter().filter(|&&c| positive(c)).count() <= 1
    }

    /// No constraints at all (immersed and singular surfaces allowed).
    pub fn none() -> Self {
        Self {
            per_tet: Vec::new(),
            octagons: Vec::new(),
        }
    }
}

/// The quad/octagon constraints for embedded surfaces in `coords`.
pub fn make_embedded_constraints(tri: &Triangulation, coords: NormalCoords) -> Result<EmbeddedConstraints, TriError> {
    let enc = NormalEncoding::new(coords)?;
    let b = enc.block_size();
    let mut per_tet = Vec::with_capacity(tri.size());
    let mut octagons = Vec::new();
    for t in 0..tri.size() {
        let q = b * t + enc.quad_offset();
        let mut cols: Vec<usize> = (q..q + 3).collect();
        if let Some(o) = enc.oct_offset() {
            let o = b * t + o;
            cols.extend(o..o + 3);
            octagons.extend(o..o + 3);
        }
        per_tet.push(cols);
    }
    Ok(EmbeddedConstraints { per_tet, octagons })
}
