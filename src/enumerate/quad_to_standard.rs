//! Conversion from quad vertex surfaces to standard vertex surfaces.
//!
//! Standard space is quad space with the vertex links added back. Starting
//! from the quad vertex rays (lifted to standard coordinates), each vertex
//! link is reintroduced in turn: first its negative joins the ray set and
//! the corner coordinates of that vertex are cut down one at a time by
//! double description, then the positive link is added. The cone after all
//! links are added is exactly the standard solution cone, and far fewer
//! intermediate rays appear than when running double description in
//! standard coordinates from scratch.
//!
//! Triangle coordinates of links still to come are ignored in the
//! adjacency tests, since they are determined by the quads.

use crate::enumerate::{Ray, ZeroSet, percent};
use crate::maths::integer::{Integer, LargeInteger};
use crate::progress::{self, ProgressTracker};
use crate::surfaces::encoding::{NormalCoords, NormalEncoding, promote};
use crate::surfaces::matching::make_embedded_constraints;
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

/// Standard embedded vertex rays of `tri`, from its quad embedded vertex
/// rays.
///
/// Quad rays that are not compact (spun around some cusp) have no standard
/// counterpart and are dropped with a warning.
///
/// # Errors
/// `FailedPrecondition` if `tri` is invalid, `InvalidArgument` if a quad
/// ray has the wrong length, `Cancelled` from the tracker.
pub fn quad_to_standard(
    tri: &Triangulation,
    quad_rays: &[Vec<Integer>],
    tracker: Option<&ProgressTracker>,
) -> Result<Vec<Vec<Integer>>, TriError> {
    if !tri.is_valid() {
        return Err(TriError::FailedPrecondition(
            "quad-to-standard conversion needs a valid triangulation".into(),
        ));
    }
    let n = tri.size();
    let dim = 7 * n;
    let constraints = make_embedded_constraints(tri, NormalCoords::Standard)?;
    let (quad, standard) = (
        NormalEncoding::new(NormalCoords::Quad)?,
        NormalEncoding::new(NormalCoords::Standard)?,
    );

    let mut rays = Vec::with_capacity(quad_rays.len());
    for r in quad_rays {
        let large: Vec<LargeInteger> = r.iter().cloned().map(LargeInteger::Finite).collect();
        let lifted = promote(tri, &large, quad, standard)?;
        match lifted.iter().map(|x| x.finite().cloned()).collect::<Option<Vec<_>>>() {
            Some(coords) => rays.push(Ray::new(coords)),
            None => log::warn!("quad-to-standard: dropping non-compact quad vertex {r:?}"),
        }
    }

    let links: Vec<Vec<usize>> = tri
        .skeleton()
        .vertices
        .iter()
        .map(|v| v.embeddings.iter().map(|e| 7 * e.tet + e.vertex).collect())
        .collect();

    let mut ignore = ZeroSet::empty(dim);
    for c in (0..dim).filter(|c| c % 7 < 4) {
        ignore.insert(c);
    }

    for (vtx, corners) in links.iter().enumerate() {
        rays.push(Ray::new(link_vector(dim, corners, -1)));
        let threshold = 2 * n + vtx - 1;

        for &tc in corners {
            progress::poll(tracker)?;
            let mut next = Vec::with_capacity(rays.len());
            let mut pos = Vec::new();
            let mut neg = Vec::new();
            for (i, r) in rays.iter().enumerate() {
                match r.coords[tc].sign() {
                    0 => next.push(r.clone()),
                    s if s > 0 => {
                        next.push(r.clone());
                        pos.push(i);
                    }
                    _ => neg.push(i),
                }
            }

            for &p in &pos {
                for &q in &neg {
                    let (rp, rq) = (&rays[p], &rays[q]);
                    let join = rp.zeros.intersection(&rq.zeros);
                    if join.count_outside(&ignore) < threshold {
                        continue;
                    }
                    if !constraints.admits(|i| !join.contains(i)) {
                        continue;
                    }
                    let blocked = rays
                        .iter()
                        .enumerate()
                        .any(|(k, r)| k != p && k != q && join.is_subset_with(&r.zeros, &ignore));
                    if blocked {
                        continue;
                    }
                    next.push(Ray::combine(rp, &rp.coords[tc], rq, &rq.coords[tc]));
                }
            }
            rays = next;
            ignore.remove(tc);
        }

        rays.push(Ray::new(link_vector(dim, corners, 1)));

        // Strip copies of later links, which the lifting step over-counts.
        let later = &links[vtx + 1..];
        rays = rays
            .into_iter()
            .map(|r| {
                let mut coords = r.coords;
                for link in later {
                    if link.iter().any(|&c| coords[c].is_zero()) {
                        continue;
                    }
                    let least = link.iter().map(|&c| coords[c].clone()).min().unwrap_or(Integer::ZERO);
                    for &c in link {
                        coords[c] = &coords[c] - &least;
                    }
                }
                Ray::new(coords)
            })
            .collect();

        log::debug!("quad-to-standard: vertex {}/{}, {} rays", vtx + 1, links.len(), rays.len());
        if let Some(t) = tracker {
            t.set_percent(percent(vtx + 1, links.len()))?;
        }
    }

    let mut out: Vec<Vec<Integer>> = rays.into_iter().map(|r| r.coords).collect();
    out.sort();
    out.dedup();
    Ok(out)
}

fn link_vector(dim: usize, corners: &[usize], value: i64) -> Vec<Integer> {
    let mut v = vec![Integer::ZERO; dim];
    for &c in corners {
        v[c] = Integer::new(value);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerate::vertex_rays;
    use crate::surfaces::matching::make_matching_equations;
    use crate::triangulation::example;

    fn both_ways(tri: &Triangulation) -> (Vec<Vec<Integer>>, Vec<Vec<Integer>>) {
        let direct = {
            let m = make_matching_equations(tri, NormalCoords::Standard, None).unwrap();
            let c = make_embedded_constraints(tri, NormalCoords::Standard).unwrap();
            vertex_rays(&m, &c, None, None).unwrap()
        };
        let quad = {
            let m = make_matching_equations(tri, NormalCoords::Quad, None).unwrap();
            let c = make_embedded_constraints(tri, NormalCoords::Quad).unwrap();
            vertex_rays(&m, &c, None, None).unwrap()
        };
        (quad_to_standard(tri, &quad, None).unwrap(), direct)
    }

    #[test]
    fn conversion_agrees_with_direct_enumeration() {
        for (tri, count) in [
            (example::poincare_homology_sphere(), 7),
            (example::lens(7, 3).unwrap(), 2),
            (example::layered_loop(5, true), 12),
            (example::twisted_kxi(), 8),
            (example::ball(), 7),
        ] {
            let (converted, direct) = both_ways(&tri);
            assert_eq!(converted.len(), count);
            assert_eq!(converted, direct);
        }
    }

    #[test]
    fn spun_quad_rays_are_dropped() {
        for tri in [example::figure_eight(), example::gieseking()] {
            let (converted, direct) = both_ways(&tri);
            assert_eq!(converted.len(), 1);
            assert_eq!(converted, direct);
        }
    }
}
