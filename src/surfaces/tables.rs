//! Combinatorial tables for normal discs inside a tetrahedron.
//!
//! Quadrilateral type `q` separates edge `q` from edge `5 - q` (edges
//! numbered as in [`EDGE_VERTEX`](crate::maths::perm::EDGE_VERTEX)).
//! Octagon type `k` meets edges `k` and `5 - k` twice and every other edge
//! once.

use crate::maths::perm::Perm4;

const X: usize = usize::MAX;

/// `QUAD_SEPARATING[i][j]` is the quad type separating vertices `i` and `j`
/// from the other two.
pub const QUAD_SEPARATING: [[usize; 4]; 4] = [[X, 0, 1, 2], [0, X, 2, 1], [1, 2, X, 0], [2, 1, 0, X]];

/// `QUAD_MEETING[i][j]` are the two quad types that meet the edge `ij`.
pub const QUAD_MEETING: [[[usize; 2]; 4]; 4] = [
    [[X, X], [1, 2], [0, 2], [0, 1]],
    [[1, 2], [X, X], [0, 1], [0, 2]],
    [[0, 2], [0, 1], [X, X], [1, 2]],
    [[0, 1], [0, 2], [1, 2], [X, X]],
];

/// Vertices of each quad type, split as `{d[0], d[1]} | {d[2], d[3]}`.
pub const QUAD_DEFN: [[usize; 4]; 3] = [[0, 1, 2, 3], [0, 2, 1, 3], [0, 3, 1, 2]];

/// `QUAD_PARTNER[q][f]` is the facet paired with facet `f` when a
/// tetrahedron is flattened along quad type `q`.
pub const QUAD_PARTNER: [[usize; 4]; 3] = [[1, 0, 3, 2], [2, 3, 0, 1], [3, 2, 1, 0]];

/// Column labels for the three quad types.
pub const QUAD_STRING: [&str; 3] = ["01/23", "02/13", "03/12"];

const fn p(a: u8, b: u8, c: u8, d: u8) -> Perm4 {
    Perm4::new_unchecked([a, b, c, d])
}

/// Arcs of each triangle disc. For arc `a`, `a[3]` is the facet holding it
/// and `a[0]` is the vertex it cuts off in that facet. The arcs are listed
/// in the cyclic order that defines the disc's orientation.
pub const TRI_DISC_ARCS: [[Perm4; 3]; 4] = [
    [p(0, 1, 2, 3), p(0, 2, 3, 1), p(0, 3, 1, 2)],
    [p(1, 0, 3, 2), p(1, 3, 2, 0), p(1, 2, 0, 3)],
    [p(2, 3, 0, 1), p(2, 0, 1, 3), p(2, 1, 3, 0)],
    [p(3, 2, 1, 0), p(3, 1, 0, 2), p(3, 0, 2, 1)],
];

/// Arcs of each quad disc, as for [`TRI_DISC_ARCS`].
pub const QUAD_DISC_ARCS: [[Perm4; 4]; 3] = [
    [p(0, 2, 3, 1), p(3, 0, 1, 2), p(1, 3, 2, 0), p(2, 1, 0, 3)],
    [p(0, 3, 1, 2), p(1, 0, 2, 3), p(2, 1, 3, 0), p(3, 2, 0, 1)],
    [p(0, 1, 2, 3), p(2, 0, 3, 1), p(3, 2, 1, 0), p(1, 3, 0, 2)],
];

/// Arcs of each octagon disc, as for [`TRI_DISC_ARCS`].
pub const OCT_DISC_ARCS: [[Perm4; 8]; 3] = [
    [
        p(0, 3, 1, 2),
        p(0, 1, 2, 3),
        p(2, 0, 3, 1),
        p(2, 3, 1, 0),
        p(1, 2, 0, 3),
        p(1, 0, 3, 2),
        p(3, 1, 2, 0),
        p(3, 2, 0, 1),
    ],
    [
        p(0, 1, 2, 3),
        p(0, 2, 3, 1),
        p(3, 0, 1, 2),
        p(3, 1, 2, 0),
        p(2, 3, 0, 1),
        p(2, 0, 1, 3),
        p(1, 2, 3, 0),
        p(1, 3, 0, 2),
    ],
    [
        p(0, 2, 3, 1),
        p(0, 3, 1, 2),
        p(1, 0, 2, 3),
        p(1, 2, 3, 0),
        p(3, 1, 0, 2),
        p(3, 0, 2, 1),
        p(2, 3, 1, 0),
        p(2, 1, 0, 3),
    ],
];

/// Disc type within a tetrahedron: 0..4 triangles, 4..7 quads, 7..10
/// octagons.
pub(crate) fn disc_arcs(disc_type: usize) -> &'static [Perm4] {
    match disc_type {
        0..4 => &TRI_DISC_ARCS[disc_type],
        4..7 => &QUAD_DISC_ARCS[disc_type - 4],
        _ => &OCT_DISC_ARCS[disc_type - 7],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maths::perm::EDGE_NUMBER;

    #[test]
    fn quad_tables_agree() {
        for (q, d) in QUAD_DEFN.iter().enumerate() {
            assert_eq!(QUAD_SEPARATING[d[0]][d[1]], q);
            assert_eq!(QUAD_SEPARATING[d[2]][d[3]], q);
            assert_eq!(EDGE_NUMBER[d[0]][d[1]], q);
            assert_eq!(EDGE_NUMBER[d[2]][d[3]], 5 - q);
            for &(a, b) in &[(d[0], d[2]), (d[0], d[3]), (d[1], d[2]), (d[1], d[3])] {
                assert!(QUAD_MEETING[a][b].contains(&q));
            }
        }
        for (q, partner) in QUAD_PARTNER.iter().enumerate() {
            let d = QUAD_DEFN[q];
            // Partner facets lie on the same side of the quad.
            assert_eq!(partner[d[0]], d[1]);
            assert_eq!(partner[d[2]], d[3]);
        }
    }

    #[test]
    fn arcs_cut_off_the_right_vertices() {
        for (v, arcs) in TRI_DISC_ARCS.iter().enumerate() {
            for a in arcs {
                assert_eq!(a.apply(0), v);
                assert_ne!(a.apply(3), v);
            }
        }
        for (q, arcs) in QUAD_DISC_ARCS.iter().enumerate() {
            let facets: Vec<usize> = arcs.iter().map(|a| a.apply(3)).collect();
            for f in 0..4 {
                assert!(facets.contains(&f), "quad {q} misses facet {f}");
            }
        }
        for arcs in &OCT_DISC_ARCS {
            for f in 0..4 {
                assert_eq!(arcs.iter().filter(|a| a.apply(3) == f).count(), 2);
            }
        }
    }
}
