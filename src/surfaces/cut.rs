//! Cutting a triangulation along a normal surface.
//!
//! Every tetrahedron is sliced by the surface's discs into regions. The
//! boundary of each region is a union of polygons: pieces of the
//! tetrahedron's facets and copies of the discs themselves. A region is
//! triangulated as a cone from an interior point over the cones from each
//! polygon's centre over its edges, so one new tetrahedron is built per
//! (region, polygon, polygon edge):
//!
//! - vertex 0 is the region's centre and vertex 1 the polygon's centre;
//! - vertices 2 and 3 are the ends of the polygon edge, in cyclic order.
//!
//! Facet 0 lies on the polygon, facet 1 faces the other polygon of the
//! region sharing that edge, and facets 2 and 3 face the neighbouring
//! edges of the same polygon. Facet 0 of a facet piece is glued across the
//! original facet; facet 0 of a disc copy is left as boundary.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;

use crate::maths::perm::{EDGE_NUMBER, EDGE_VERTEX, Perm4};
use crate::surfaces::NormalSurface;
use crate::surfaces::tables::QUAD_DEFN;
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

/// A region of a tetrahedron between consecutive discs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Region {
    /// Between vertex `v` and its first triangle.
    Corner(usize),
    /// Between triangles `j` and `j + 1` at vertex `v`.
    Slab(usize, usize),
    /// The central region on one side of the quads (0 or 1).
    Mid(usize),
    /// Between quads `j` and `j + 1`.
    QuadSlab(usize),
}

/// A point on the boundary of a tetrahedron.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Point {
    Vertex(usize),
    /// The `k`-th crossing of edge `e`, counted from its lower vertex.
    Cross(usize, usize),
}

#[derive(Clone, Debug)]
struct Polygon {
    /// The facet this polygon lies in, or `None` for a disc copy.
    facet: Option<usize>,
    points: Vec<Point>,
}

/// Disc counts of one tetrahedron, as cutting sees them.
#[derive(Clone, Debug)]
struct Slices {
    tris: [usize; 4],
    quad: Option<(usize, usize)>,
    side: [usize; 4],
}

impl Slices {
    fn new(tris: [usize; 4], quad: Option<(usize, usize)>) -> Self {
        let mut side = [0; 4];
        if let Some((q, _)) = quad {
            side[QUAD_DEFN[q][2]] = 1;
            side[QUAD_DEFN[q][3]] = 1;
        }
        Self { tris, quad, side }
    }

    fn quads_on(&self, a: usize, b: usize) -> usize {
        match self.quad {
            Some((_, count)) if self.side[a] != self.side[b] => count,
            _ => 0,
        }
    }

    fn weight(&self, a: usize, b: usize) -> usize {
        self.tris[a] + self.tris[b] + self.quads_on(a, b)
    }

    /// The region containing segment `s` of edge `e`, counted from the
    /// edge's lower vertex.
    fn segment_region(&self, e: usize, s: usize) -> Region {
        let [a, b] = EDGE_VERTEX[e];
        let w = self.weight(a, b);
        if s < self.tris[a] {
            return if s == 0 { Region::Corner(a) } else { Region::Slab(a, s) };
        }
        let back = w - s;
        if back < self.tris[b] {
            return if back == 0 { Region::Corner(b) } else { Region::Slab(b, back) };
        }
        let q = self.quads_on(a, b);
        let m = s - self.tris[a];
        if q == 0 || m == 0 {
            Region::Mid(self.side[a])
        } else if m == q {
            Region::Mid(self.side[b])
        } else {
            Region::QuadSlab(if self.side[a] == 0 { m } else { q - m })
        }
    }

    /// Point `k` along edge `ab`, counted from `a`, where 0 is `a` itself.
    fn point(&self, a: usize, b: usize, k: usize) -> Point {
        let w = self.weight(a, b);
        let (lo, hi, k) = if a < b { (a, b, k) } else { (b, a, w + 1 - k) };
        if k == 0 {
            Point::Vertex(lo)
        } else if k == w + 1 {
            Point::Vertex(hi)
        } else {
            Point::Cross(EDGE_NUMBER[lo][hi], k)
        }
    }

    /// Region containing segment `k` along edge `ab`, counted from `a`.
    fn segment(&self, a: usize, b: usize, k: usize) -> Region {
        let e = EDGE_NUMBER[a][b];
        let k = if a < b { k } else { self.weight(a, b) - k };
        self.segment_region(e, k)
    }

    /// Every polygon bounding every region, regions in a fixed order.
    fn regions(&self) -> Result<Vec<(Region, Vec<Polygon>)>, TriError> {
        let mut regions: BTreeMap<Region, Vec<Polygon>> = BTreeMap::new();

        for f in 0..4 {
            let vs: Vec<usize> = (0..4).filter(|&x| x != f).collect();
            let mut walk = Vec::new();
            for i in 0..3 {
                let (a, b) = (vs[i], vs[(i + 1) % 3]);
                for k in 0..=self.weight(a, b) {
                    walk.push((self.point(a, b, k), self.segment(a, b, k)));
                }
            }
            let seen: BTreeSet<Region> = walk.iter().map(|&(_, r)| r).collect();
            for r in seen {
                let points: Vec<Point> = (0..walk.len())
                    .filter(|&i| {
                        let prev = walk[(i + walk.len() - 1) % walk.len()].1;
                        walk[i].1 == r || prev == r
                    })
                    .map(|i| walk[i].0)
                    .collect();
                if points.len() < 3 {
                    return Err(TriError::ImpossibleScenario(format!(
                        "facet piece of {r:?} has {} corners",
                        points.len()
                    )));
                }
                regions.entry(r).or_default().push(Polygon {
                    facet: Some(f),
                    points,
                });
            }
        }

        for v in 0..4 {
            for j in 1..=self.tris[v] {
                let points: Vec<Point> = (0..4).filter(|&x| x != v).map(|x| self.point(v, x, j)).collect();
                let inner = if j == 1 { Region::Corner(v) } else { Region::Slab(v, j - 1) };
                let outer = if j < self.tris[v] {
                    Region::Slab(v, j)
                } else {
                    Region::Mid(self.side[v])
                };
                for r in [inner, outer] {
                    regions.entry(r).or_default().push(Polygon {
                        facet: None,
                        points: points.clone(),
                    });
                }
            }
        }

        if let Some((q, count)) = self.quad {
            let d = QUAD_DEFN[q];
            let cycle = [(d[0], d[2]), (d[2], d[1]), (d[1], d[3]), (d[3], d[0])];
            for j in 1..=count {
                let points: Vec<Point> = cycle
                    .iter()
                    .map(|&(a, b)| {
                        if self.side[a] == 0 {
                            self.point(a, b, self.tris[a] + j)
                        } else {
                            self.point(b, a, self.tris[b] + j)
                        }
                    })
                    .collect();
                let below = if j == 1 { Region::Mid(0) } else { Region::QuadSlab(j - 1) };
                let above = if j == count { Region::Mid(1) } else { Region::QuadSlab(j) };
                for r in [below, above] {
                    regions.entry(r).or_default().push(Polygon {
                        facet: None,
                        points: points.clone(),
                    });
                }
            }
        }
        Ok(regions.into_iter().collect())
    }

    /// Where point `p` of this tetrahedron lands in the tetrahedron on the
    /// other side of a gluing.
    fn carry(p: Point, perm: Perm4, there: &Slices) -> Point {
        match p {
            Point::Vertex(v) => Point::Vertex(perm.apply(v)),
            Point::Cross(e, k) => {
                let [x, y] = EDGE_VERTEX[e];
                let (x, y) = (perm.apply(x), perm.apply(y));
                let e = EDGE_NUMBER[x][y];
                if x < y {
                    Point::Cross(e, k)
                } else {
                    Point::Cross(e, there.weight(x, y) + 1 - k)
                }
            }
        }
    }
}

fn edge_key(a: Point, b: Point) -> (Point, Point) {
    if a <= b { (a, b) } else { (b, a) }
}

impl NormalSurface {
    /// Cut the triangulation open along this surface.
    ///
    /// The result may be disconnected; see
    /// [`Triangulation::split_into_components`]. Each copy of the surface
    /// becomes real boundary.
    ///
    /// # Errors
    /// `FailedPrecondition` for spun surfaces, surfaces with octagons, or
    /// surfaces that are not embedded.
    pub fn cut_along(&self) -> Result<Triangulation, TriError> {
        self.require_compact("cutting")?;
        if self.has_octagons() {
            return Err(TriError::FailedPrecondition("cannot cut along a surface with octagons".into()));
        }
        let quads = self.quad_types()?;
        let tri = &*self.tri;
        let n = tri.size();
        let coords = self.finite_coords()?;
        let count = |i: usize| super::to_usize(&coords[i]);

        let mut slices = Vec::with_capacity(n);
        for t in 0..n {
            let tris = [count(10 * t)?, count(10 * t + 1)?, count(10 * t + 2)?, count(10 * t + 3)?];
            let quad = match quads[t] {
                Some(q) => Some((q, count(10 * t + 4 + q)?)),
                None => None,
            };
            slices.push(Slices::new(tris, quad));
        }
        let pieces: Vec<Vec<(Region, Vec<Polygon>)>> =
            slices.iter().map(Slices::regions).collect::<Result<_, _>>()?;

        // First new tetrahedron of each (tet, region, polygon).
        let mut ans = Triangulation::new();
        let mut first: Vec<Vec<Vec<usize>>> = Vec::with_capacity(n);
        for regions in &pieces {
            let mut per_region = Vec::with_capacity(regions.len());
            for (_, polygons) in regions {
                let mut per_polygon = Vec::with_capacity(polygons.len());
                for poly in polygons {
                    per_polygon.push(ans.new_tetrahedra(poly.points.len()).start);
                }
                per_region.push(per_polygon);
            }
            first.push(per_region);
        }

        let mut result = Ok(());
        ans.change_span(|ans| {
            result = glue_pieces(ans, tri, &slices, &pieces, &first);
        });
        result.map(|()| ans)
    }
}

fn glue_pieces(
    ans: &mut Triangulation,
    tri: &Triangulation,
    slices: &[Slices],
    pieces: &[Vec<(Region, Vec<Polygon>)>],
    first: &[Vec<Vec<usize>>],
) -> Result<(), TriError> {
    let swap23 = Perm4::swap(2, 3);
    for t in 0..pieces.len() {
        for (ri, (region, polygons)) in pieces[t].iter().enumerate() {
            let mut sharing: HashMap<(Point, Point), Vec<(usize, usize)>> = HashMap::new();
            for (pi, poly) in polygons.iter().enumerate() {
                let m = poly.points.len();
                for k in 0..m {
                    sharing
                        .entry(edge_key(poly.points[k], poly.points[(k + 1) % m]))
                        .or_default()
                        .push((pi, k));
                }
            }
            if let Some((key, l)) = sharing.iter().find(|(_, l)| l.len() != 2) {
                return Err(TriError::ImpossibleScenario(format!(
                    "edge {key:?} of {region:?} in tetrahedron {t} bounds {} polygons",
                    l.len()
                )));
            }

            for (pi, poly) in polygons.iter().enumerate() {
                let m = poly.points.len();
                for k in 0..m {
                    let me = first[t][ri][pi] + k;
                    let (a, b) = (poly.points[k], poly.points[(k + 1) % m]);

                    if ans.adjacent(me, 1).is_none() {
                        let pair = &sharing[&edge_key(a, b)];
                        let (op, ok) = if pair[0] == (pi, k) { pair[1] } else { pair[0] };
                        let perm = if polygons[op].points[ok] == a { Perm4::identity() } else { swap23 };
                        ans.join_raw(me, 1, first[t][ri][op] + ok, perm);
                    }
                    if ans.adjacent(me, 2).is_none() {
                        ans.join_raw(me, 2, first[t][ri][pi] + (k + 1) % m, swap23);
                    }

                    let Some(f) = poly.facet else { continue };
                    let Some(g) = tri.adjacent(t, f) else { continue };
                    if ans.adjacent(me, 0).is_some() {
                        continue;
                    }
                    let (u, there) = (g.tet, &slices[g.tet]);
                    let carry = |p: Point| Slices::carry(p, g.perm, there);
                    let (ca, cb) = (carry(a), carry(b));
                    let want: BTreeSet<Point> = poly.points.iter().map(|&p| carry(p)).collect();
                    let target_facet = Some(g.perm.apply(f));

                    let mut found = None;
                    'search: for (rj, (_, other)) in pieces[u].iter().enumerate() {
                        for (pj, cand) in other.iter().enumerate() {
                            if cand.facet != target_facet || cand.points.len() != want.len() {
                                continue;
                            }
                            if cand.points.iter().copied().collect::<BTreeSet<_>>() != want {
                                continue;
                            }
                            let m2 = cand.points.len();
                            for kk in 0..m2 {
                                let (x, y) = (cand.points[kk], cand.points[(kk + 1) % m2]);
                                if edge_key(x, y) == edge_key(ca, cb) {
                                    let perm = if x == ca { Perm4::identity() } else { swap23 };
                                    found = Some((first[u][rj][pj] + kk, perm));
                                    break 'search;
                                }
                            }
                        }
                    }
                    let Some((other, perm)) = found else {
                        return Err(TriError::ImpossibleScenario(format!(
                            "no matching facet piece across facet {f} of tetrahedron {t}"
                        )));
                    };
                    if ans.adjacent(other, 0).is_none() {
                        ans.join_raw(me, 0, other, perm);
                    }
                }
            }
        }
    }
    Ok(())
}
