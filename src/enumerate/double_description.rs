//! Vertex enumeration by the double description method.
//!
//! Start from the unit rays of the positive orthant and intersect with one
//! hyperplane at a time. Rays on the hyperplane survive; every adjacent
//! pair of rays on opposite sides yields a new ray on it. Adjacency is
//! tested combinatorially: two rays are adjacent when no third ray
//! vanishes everywhere both of them do.

use crate::enumerate::{Ray, percent};
use crate::maths::integer::Integer;
use crate::maths::matrix::MatrixInt;
use crate::progress::ProgressTracker;
use crate::surfaces::matching::EmbeddedConstraints;
use crate::tri_error::TriError;

/// Extreme rays of `{x ≥ 0 : eqns · x = 0}` that satisfy `constraints`,
/// each primitive, in lexicographic order.
///
/// # Errors
/// `Cancelled` if the tracker is cancelled, or if more than `max_rays`
/// intermediate rays would be kept after some hyperplane.
pub fn vertex_rays(
    eqns: &MatrixInt,
    constraints: &EmbeddedConstraints,
    max_rays: Option<usize>,
    tracker: Option<&ProgressTracker>,
) -> Result<Vec<Vec<Integer>>, TriError> {
    let dim = eqns.columns();
    let mut rays: Vec<Ray> = (0..dim).map(|i| Ray::unit(dim, i)).collect();

    for h in 0..eqns.rows() {
        let row = eqns.row(h);
        let dots: Vec<Integer> = rays.iter().map(|r| r.dot(row)).collect();
        let mut next = Vec::with_capacity(rays.len());
        let mut pos = Vec::new();
        let mut neg = Vec::new();
        for (i, d) in dots.iter().enumerate() {
            match d.sign() {
                0 => next.push(rays[i].clone()),
                s if s > 0 => pos.push(i),
                _ => neg.push(i),
            }
        }

        for &p in &pos {
            for &q in &neg {
                let (rp, rq) = (&rays[p], &rays[q]);
                if !constraints.admits(|i| rp.positive(i) || rq.positive(i)) {
                    continue;
                }
                let common = rp.zeros.intersection(&rq.zeros);
                let blocked = rays
                    .iter()
                    .enumerate()
                    .any(|(k, r)| k != p && k != q && common.is_subset(&r.zeros));
                if blocked {
                    continue;
                }
                next.push(Ray::combine(rp, &dots[p], rq, &dots[q]));
                if max_rays.is_some_and(|max| next.len() > max) {
                    log::debug!("double description: more than {:?} rays, giving up", max_rays);
                    return Err(TriError::Cancelled);
                }
            }
        }

        rays = next;
        log::debug!("double description: hyperplane {}/{}, {} rays", h + 1, eqns.rows(), rays.len());
        if let Some(t) = tracker {
            t.set_percent(percent(h + 1, eqns.rows()))?;
        }
    }

    let mut out: Vec<Vec<Integer>> = rays.into_iter().map(|r| r.coords).collect();
    out.sort();
    out.dedup();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surfaces::NormalCoords;
    use crate::surfaces::matching::{make_embedded_constraints, make_matching_equations};
    use crate::triangulation::example;

    fn ints(v: &[i64]) -> Vec<Integer> {
        v.iter().map(|&x| Integer::new(x)).collect()
    }

    #[test]
    fn a_single_plane_through_the_orthant() {
        // x0 - x1 = 0 in three dimensions: rays (1,1,0) and (0,0,1).
        let m = MatrixInt::from_rows(vec![ints(&[1, -1, 0])]).unwrap();
        let rays = vertex_rays(&m, &EmbeddedConstraints::none(), None, None).unwrap();
        assert_eq!(rays, vec![ints(&[0, 0, 1]), ints(&[1, 1, 0])]);
    }

    #[test]
    fn non_adjacent_pairs_are_skipped() {
        // x0 + x1 - x2 - x3 = 0: four rays, not the six pairwise sums.
        let m = MatrixInt::from_rows(vec![ints(&[1, 1, -1, -1])]).unwrap();
        let rays = vertex_rays(&m, &EmbeddedConstraints::none(), None, None).unwrap();
        assert_eq!(rays.len(), 4);
        assert!(rays.iter().all(|r| r.iter().filter(|x| !x.is_zero()).count() == 2));
    }

    #[test]
    fn figure_eight_quad_rays() {
        let tri = example::figure_eight();
        let m = make_matching_equations(&tri, NormalCoords::Quad, None).unwrap();
        let c = make_embedded_constraints(&tri, NormalCoords::Quad).unwrap();
        let rays = vertex_rays(&m, &c, None, None).unwrap();
        assert_eq!(rays.len(), 4);
        for r in &rays {
            assert!(m.apply(r).unwrap().iter().all(Integer::is_zero));
            assert!(c.admits(|i| !r[i].is_zero()));
        }
    }

    #[test]
    fn ray_limit_and_cancellation() {
        let tri = example::poincare_homology_sphere();
        let m = make_matching_equations(&tri, NormalCoords::Standard, None).unwrap();
        let c = make_embedded_constraints(&tri, NormalCoords::Standard).unwrap();
        assert_eq!(vertex_rays(&m, &c, Some(1), None), Err(TriError::Cancelled));
        let tracker = ProgressTracker::new();
        tracker.cancel();
        assert_eq!(vertex_rays(&m, &c, None, Some(&tracker)), Err(TriError::Cancelled));
    }
}
