//! Hilbert bases by the dual (Pottier-style) completion algorithm.
//!
//! The basis of the positive orthant is the set of unit vectors. Each
//! hyperplane splits the current basis into vectors on it, above it and
//! below it; sums of opposite pairs are added until no sum is left that is
//! not already reducible. The vectors on the hyperplane then form the
//! basis of the smaller cone.

use crate::enumerate::{dot, percent};
use crate::maths::integer::Integer;
use crate::maths::matrix::MatrixInt;
use crate::progress::{self, ProgressTracker};
use crate::surfaces::matching::EmbeddedConstraints;
use crate::tri_error::TriError;

#[derive(Clone, Debug)]
struct Element {
    coords: Vec<Integer>,
    value: Integer,
}

impl Element {
    fn new(coords: Vec<Integer>, row: &[Integer]) -> Self {
        let value = dot(&coords, row);
        Self { coords, value }
    }

    fn degree(&self) -> Integer {
        let mut total = Integer::ZERO;
        for x in &self.coords {
            total += x;
        }
        total
    }

    fn le(&self, other: &Element) -> bool {
        self.coords.iter().zip(&other.coords).all(|(a, b)| a <= b)
    }

    /// Reducible if some element of `pool` equals it, or lies below it with
    /// no larger value on the current hyperplane.
    fn reducible<'a>(&self, pool: impl IntoIterator<Item = &'a Element>) -> bool {
        pool.into_iter().any(|u| {
            u.coords == self.coords || (u.le(self) && u.value.abs() <= self.value.abs())
        })
    }
}

/// The minimal generating set of the integer points of
/// `{x ≥ 0 : eqns · x = 0}` that satisfy `constraints`, in lexicographic
/// order.
///
/// A sum that breaks `constraints` is discarded as soon as it appears:
/// supports only grow under addition, so nothing built from it could be
/// admissible.
///
/// # Errors
/// `Cancelled` if the tracker is cancelled.
pub fn hilbert_basis(
    eqns: &MatrixInt,
    constraints: &EmbeddedConstraints,
    tracker: Option<&ProgressTracker>,
) -> Result<Vec<Vec<Integer>>, TriError> {
    let dim = eqns.columns();
    let mut basis: Vec<Vec<Integer>> = (0..dim)
        .map(|i| {
            let mut v = vec![Integer::ZERO; dim];
            v[i] = Integer::ONE;
            v
        })
        .collect();

    for h in 0..eqns.rows() {
        let row = eqns.row(h);
        let mut zero = Vec::new();
        let mut pos = Vec::new();
        let mut neg = Vec::new();
        for v in basis {
            let e = Element::new(v, row);
            match e.value.sign() {
                0 => zero.push(e),
                s if s > 0 => pos.push(e),
                _ => neg.push(e),
            }
        }

        // pos[..old_p] has been paired with all of neg[..old_n].
        let (mut old_p, mut old_n) = (0, 0);
        while old_p < pos.len() || old_n < neg.len() {
            progress::poll(tracker)?;
            let (new_p, new_n) = (pos.len(), neg.len());
            let mut cands = Vec::new();
            for (i, p) in pos.iter().enumerate() {
                let from = if i < old_p { old_n } else { 0 };
                for q in &neg[from..new_n] {
                    let coords: Vec<Integer> = p.coords.iter().zip(&q.coords).map(|(a, b)| a + b).collect();
                    if !constraints.admits(|i| !coords[i].is_zero()) {
                        continue;
                    }
                    cands.push(Element::new(coords, row));
                }
            }
            (old_p, old_n) = (new_p, new_n);

            cands.sort_by(|a, b| a.degree().cmp(&b.degree()).then_with(|| a.coords.cmp(&b.coords)));
            for s in cands {
                match s.value.sign() {
                    0 => {
                        if !s.reducible(&zero) {
                            zero.push(s);
                        }
                    }
                    x if x > 0 => {
                        if !s.reducible(zero.iter().chain(&pos)) {
                            pos.push(s);
                        }
                    }
                    _ => {
                        if !s.reducible(zero.iter().chain(&neg)) {
                            neg.push(s);
                        }
                    }
                }
            }
        }

        basis = zero.into_iter().map(|e| e.coords).collect();
        log::debug!("hilbert basis: hyperplane {}/{}, {} elements", h + 1, eqns.rows(), basis.len());
        if let Some(t) = tracker {
            t.set_percent(percent(h + 1, eqns.rows()))?;
        }
    }

    let minimal: Vec<Vec<Integer>> = basis
        .iter()
        .filter(|v| {
            !basis
                .iter()
                .any(|u| u != *v && u.iter().zip(v.iter()).all(|(a, b)| a <= b))
        })
        .cloned()
        .collect();
    let mut out = minimal;
    out.sort();
    out.dedup();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerate::vertex_rays;
    use crate::surfaces::NormalCoords;
    use crate::surfaces::matching::{make_embedded_constraints, make_matching_equations};
    use crate::triangulation::example;

    fn ints(v: &[i64]) -> Vec<Integer> {
        v.iter().map(|&x| Integer::new(x)).collect()
    }

    #[test]
    fn interior_points_join_the_basis() {
        // x0 + x1 = 2 x2: the rays (2,0,1), (0,2,1) plus the point (1,1,1).
        let m = MatrixInt::from_rows(vec![ints(&[1, 1, -2])]).unwrap();
        let basis = hilbert_basis(&m, &EmbeddedConstraints::none(), None).unwrap();
        assert_eq!(basis, vec![ints(&[0, 2, 1]), ints(&[1, 1, 1]), ints(&[2, 0, 1])]);
        let rays = vertex_rays(&m, &EmbeddedConstraints::none(), None, None).unwrap();
        assert_eq!(rays, vec![ints(&[0, 2, 1]), ints(&[2, 0, 1])]);
    }

    #[test]
    fn vertex_rays_are_fundamental() {
        for (tri, coords, vertices, fundamental) in [
            (example::layered_loop(4, true), NormalCoords::Quad, 5, 7),
            (example::layered_loop(6, false), NormalCoords::Quad, 7, 9),
            (example::twisted_kxi(), NormalCoords::Standard, 8, 8),
            (example::figure_eight(), NormalCoords::Quad, 4, 4),
        ] {
            let m = make_matching_equations(&tri, coords, None).unwrap();
            let c = make_embedded_constraints(&tri, coords).unwrap();
            let rays = vertex_rays(&m, &c, None, None).unwrap();
            let basis = hilbert_basis(&m, &c, None).unwrap();
            assert_eq!((rays.len(), basis.len()), (vertices, fundamental));
            assert!(rays.iter().all(|r| basis.contains(r)));
        }
    }

    #[test]
    fn gieseking_has_no_quad_surfaces() {
        let tri = example::gieseking();
        let m = make_matching_equations(&tri, NormalCoords::Quad, None).unwrap();
        let c = make_embedded_constraints(&tri, NormalCoords::Quad).unwrap();
        assert!(hilbert_basis(&m, &c, None).unwrap().is_empty());
    }

    #[test]
    fn cancelled_trackers_stop_the_search() {
        let tri = example::twisted_kxi();
        let m = make_matching_equations(&tri, NormalCoords::Standard, None).unwrap();
        let tracker = ProgressTracker::new();
        tracker.cancel();
        assert_eq!(
            hilbert_basis(&m, &EmbeddedConstraints::none(), Some(&tracker)),
            Err(TriError::Cancelled)
        );
    }
}
