//! Ready-made triangulations.
//!
//! Lens spaces and layered solid tori are built by layering, tracking the
//! meridian weight of each boundary edge as tetrahedra are added: layering
//! on an edge of weight `x` whose boundary triangle has other edges `y` and
//! `z` creates a new boundary edge of weight `|y - z|` if `x = y + z`, and
//! `y + z` otherwise.

use num_integer::Integer as _;

use crate::maths::perm::Perm4;
use crate::tri_error::TriError;

use super::Triangulation;

#[inline]
const fn p(a: u8, b: u8, c: u8, d: u8) -> Perm4 {
    Perm4::new_unchecked([a, b, c, d])
}

/// Build `n` tetrahedra from gluings known to be consistent.
fn fixed(n: usize, gluings: &[(usize, usize, usize, Perm4)]) -> Triangulation {
    let mut tri = Triangulation::new();
    tri.change_span(|tri| {
        for _ in 0..n {
            tri.new_tetrahedron_raw(String::new());
        }
        for &(t, f, u, perm) in gluings {
            tri.join_raw(t, f, u, perm);
        }
    });
    tri
}

/// A boundary edge of a layered solid torus, named by one of its
/// appearances, with the number of times the meridian disc meets it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BoundaryEdge {
    tet: usize,
    number: usize,
    weight: u64,
}

struct LayeredSolidTorus {
    tri: Triangulation,
    edges: [BoundaryEdge; 3],
}

impl LayeredSolidTorus {
    /// One tetrahedron with two facets folded together: weights (1, 2, 3).
    fn base() -> Self {
        let tri = fixed(1, &[(0, 0, 0, p(1, 2, 3, 0))]);
        let edges = [
            BoundaryEdge { tet: 0, number: 0, weight: 3 },
            BoundaryEdge { tet: 0, number: 1, weight: 2 },
            BoundaryEdge { tet: 0, number: 2, weight: 1 },
        ];
        Self { tri, edges }
    }

    fn build(a: u64, b: u64) -> Result<Self, TriError> {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        if a.gcd(&b) != 1 {
            return Err(TriError::InvalidArgument(format!(
                "layered solid torus parameters ({a}, {b}) are not coprime"
            )));
        }
        match (a, b) {
            (1, 2) => Ok(Self::base()),
            (1, 1) => {
                let mut lst = Self::base();
                lst.layer(3)?;
                Ok(lst)
            }
            (0, 1) => {
                let mut lst = Self::build(1, 1)?;
                lst.layer(2)?;
                Ok(lst)
            }
            _ => {
                let mut lst = Self::build(a, b - a)?;
                lst.layer(b - a)?;
                Ok(lst)
            }
        }
    }

    /// Skeletal index of the first boundary edge with the given weight.
    fn edge_with_weight(&self, weight: u64) -> Result<usize, TriError> {
        self.edges
            .iter()
            .find(|e| e.weight == weight)
            .map(|e| self.tri.tet_edge(e.tet, e.number))
            .ok_or_else(|| {
                TriError::ImpossibleScenario(format!("no boundary edge of weight {weight}"))
            })
    }

    fn weight_of(&self, edge: usize) -> Result<u64, TriError> {
        self.edges
            .iter()
            .find(|e| self.tri.tet_edge(e.tet, e.number) == edge)
            .map(|e| e.weight)
            .ok_or_else(|| TriError::ImpossibleScenario(format!("edge {edge} is not tracked")))
    }

    fn layer(&mut self, weight: u64) -> Result<(), TriError> {
        let edge = self.edge_with_weight(weight)?;
        let front = self.tri.edge(edge).front();
        let r = front.perm;
        let y = self.weight_of(self.tri.tet_edge(front.tet, edge_number(r.apply(0), r.apply(2))))?;
        let z = self.weight_of(self.tri.tet_edge(front.tet, edge_number(r.apply(1), r.apply(2))))?;

        let top = self.tri.layer_on(edge)?;
        // Edges 02 and 12 of the new tetrahedron sit on the old edges y and z.
        let new_weight = if weight == y + z { y.abs_diff(z) } else { y + z };
        self.edges = [
            BoundaryEdge { tet: top, number: 1, weight: y },
            BoundaryEdge { tet: top, number: 3, weight: z },
            BoundaryEdge { tet: top, number: 5, weight: new_weight },
        ];
        Ok(())
    }

    /// Fold the boundary closed around the edge of the given weight.
    fn close(mut self, weight: u64) -> Result<Triangulation, TriError> {
        let edge = self.edge_with_weight(weight)?;
        if !self.tri.close_book(edge, false, true)? {
            return Err(TriError::ImpossibleScenario(format!(
                "cannot close the book around edge {edge}"
            )));
        }
        Ok(self.tri)
    }
}

#[inline]
fn edge_number(a: usize, b: usize) -> usize {
    crate::maths::perm::EDGE_NUMBER[a][b]
}

/// Layered solid torus whose meridian meets the three boundary edges
/// `a`, `b` and `a + b` times.
///
/// # Errors
/// `InvalidArgument` unless `gcd(a, b) = 1`.
pub fn lst(a: u64, b: u64) -> Result<Triangulation, TriError> {
    LayeredSolidTorus::build(a, b).map(|l| l.tri)
}

/// Layered lens space `L(p, q)`.
///
/// `L(0, 1)` is S² × S¹ and `L(1, 0)` is the 3-sphere.
///
/// # Errors
/// `InvalidArgument` unless `gcd(p, q) = 1`.
pub fn lens(p: u64, q: u64) -> Result<Triangulation, TriError> {
    if p.gcd(&q) != 1 {
        return Err(TriError::InvalidArgument(format!(
            "lens space parameters ({p}, {q}) are not coprime"
        )));
    }
    match p {
        0 => LayeredSolidTorus::build(1, 1)?.close(2),
        1 => LayeredSolidTorus::build(1, 2)?.close(3),
        _ => {
            let r = q % p;
            let q = r.min(p - r);
            LayeredSolidTorus::build(p - 2 * q, q)?.close(p - 2 * q)
        }
    }
}

/// Layered loop on `n` tetrahedra: a chain of tetrahedra each layered on
/// the last, closed up with or without a twist.
pub fn layered_loop(n: usize, twisted: bool) -> Triangulation {
    if n == 0 {
        return Triangulation::new();
    }
    let mut gluings = Vec::with_capacity(2 * n);
    for i in 0..n - 1 {
        gluings.push((i, 0, i + 1, p(1, 0, 2, 3)));
        gluings.push((i, 3, i + 1, p(0, 1, 3, 2)));
    }
    if twisted {
        gluings.push((n - 1, 0, 0, p(2, 3, 1, 0)));
        gluings.push((n - 1, 3, 0, p(3, 2, 0, 1)));
    } else {
        gluings.push((n - 1, 0, 0, p(1, 0, 2, 3)));
        gluings.push((n - 1, 3, 0, p(0, 1, 3, 2)));
    }
    fixed(n, &gluings)
}

/// Ideal figure-eight knot complement.
pub fn figure_eight() -> Triangulation {
    fixed(
        2,
        &[
            (0, 0, 1, p(1, 3, 0, 2)),
            (0, 1, 1, p(2, 0, 3, 1)),
            (0, 2, 1, p(0, 3, 2, 1)),
            (0, 3, 1, p(2, 1, 0, 3)),
        ],
    )
}

/// The Gieseking manifold: one ideal tetrahedron, non-orientable, with a
/// Klein bottle cusp.
pub fn gieseking() -> Triangulation {
    fixed(1, &[(0, 0, 0, p(1, 2, 0, 3)), (0, 2, 0, p(0, 2, 3, 1))])
}

/// Ideal trefoil knot complement on two tetrahedra.
pub fn trefoil() -> Triangulation {
    fixed(
        2,
        &[
            (0, 0, 1, p(0, 1, 3, 2)),
            (0, 1, 1, p(0, 1, 3, 2)),
            (0, 2, 1, p(0, 3, 2, 1)),
            (0, 3, 1, p(1, 0, 2, 3)),
        ],
    )
}

/// Twisted I-bundle over the Klein bottle, with real boundary.
pub fn twisted_kxi() -> Triangulation {
    fixed(
        3,
        &[
            (0, 0, 1, p(0, 1, 2, 3)),
            (0, 1, 2, p(2, 1, 0, 3)),
            (0, 2, 2, p(1, 3, 2, 0)),
            (1, 1, 2, p(0, 3, 2, 1)),
            (1, 2, 2, p(3, 1, 0, 2)),
        ],
    )
}

/// Five-tetrahedron one-vertex triangulation of the Poincaré homology
/// sphere.
pub fn poincare_homology_sphere() -> Triangulation {
    fixed(
        5,
        &[
            (0, 0, 4, p(1, 0, 2, 3)),
            (0, 1, 3, p(0, 2, 3, 1)),
            (0, 2, 1, p(0, 1, 3, 2)),
            (0, 3, 2, p(2, 1, 3, 0)),
            (1, 0, 3, p(1, 3, 2, 0)),
            (1, 1, 2, p(0, 2, 3, 1)),
            (1, 2, 4, p(2, 1, 0, 3)),
            (2, 1, 4, p(0, 2, 3, 1)),
            (2, 3, 3, p(3, 1, 2, 0)),
            (3, 3, 4, p(0, 1, 2, 3)),
        ],
    )
}

/// A single tetrahedron with no gluings.
pub fn ball() -> Triangulation {
    fixed(1, &[])
}

/// One-vertex, one-tetrahedron 3-sphere (the layered lens space L(1, 0)).
pub fn three_sphere() -> Triangulation {
    fixed(1, &[(0, 0, 0, p(1, 2, 3, 0)), (0, 2, 0, p(0, 1, 3, 2))])
}

/// One-tetrahedron 3-sphere with two vertices: facets 0/1 and 2/3 are
/// folded together by transpositions.
pub fn sphere_two_vertex() -> Triangulation {
    fixed(1, &[(0, 2, 0, p(0, 1, 3, 2)), (0, 0, 0, p(1, 0, 2, 3))])
}
