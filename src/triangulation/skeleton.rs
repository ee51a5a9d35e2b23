//! Lazily computed skeleton of a triangulation.
//!
//! [`Skeleton::build`] derives vertices, edges, triangles, connected
//! components and boundary components from the raw gluings, together with
//! per-tetrahedron lookup tables. The result is immutable; any change to the
//! gluings discards it.
//!
//! Embeddings of an edge are listed in the order met when walking around
//! the edge. For each embedding `(t, p)`, `p[0]` and `p[1]` are the ends of
//! the edge inside `t`, the walk leaves `t` through facet `p[2]` and enters
//! through facet `p[3]`. For a boundary edge the walk starts at one of its
//! two boundary triangles.

use std::collections::VecDeque;

use crate::maths::perm::{EDGE_NUMBER, Perm4};

use super::Tetrahedron;

const UNSET: usize = usize::MAX;

/// Topological type of a vertex link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexLinkType {
    Sphere,
    Disc,
    Torus,
    KleinBottle,
    /// A closed surface other than a sphere, torus or Klein bottle.
    NonStandardCusp,
    /// A bounded surface other than a disc.
    Invalid,
}

/// Appearance of an edge or triangle inside a tetrahedron.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceEmbedding {
    pub tet: usize,
    /// Maps the face's own vertices to tetrahedron vertices.
    pub perm: Perm4,
}

/// Appearance of a vertex inside a tetrahedron.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexEmbedding {
    pub tet: usize,
    pub vertex: usize,
}

#[derive(Clone, Debug)]
pub struct Vertex {
    pub embeddings: Vec<VertexEmbedding>,
    pub link: VertexLinkType,
    pub link_euler: i64,
    pub link_orientable: bool,
    pub component: usize,
    pub boundary_component: Option<usize>,
}

impl Vertex {
    #[inline]
    pub fn degree(&self) -> usize {
        self.embeddings.len()
    }

    /// Closed link other than a sphere.
    #[inline]
    pub fn is_ideal(&self) -> bool {
        matches!(
            self.link,
            VertexLinkType::Torus | VertexLinkType::KleinBottle | VertexLinkType::NonStandardCusp
        )
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.link != VertexLinkType::Invalid
    }

    #[inline]
    pub fn is_link_closed(&self) -> bool {
        !matches!(self.link, VertexLinkType::Disc | VertexLinkType::Invalid)
    }

    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.boundary_component.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct Edge {
    pub embeddings: Vec<FaceEmbedding>,
    /// False if the edge is identified with itself in reverse.
    pub valid: bool,
    /// True if the edge lies on a boundary triangle.
    pub boundary: bool,
    pub vertices: [usize; 2],
    pub component: usize,
    pub boundary_component: Option<usize>,
}

impl Edge {
    #[inline]
    pub fn degree(&self) -> usize {
        self.embeddings.len()
    }

    #[inline]
    pub fn front(&self) -> FaceEmbedding {
        self.embeddings[0]
    }

    #[inline]
    pub fn back(&self) -> FaceEmbedding {
        self.embeddings[self.embeddings.len() - 1]
    }
}

#[derive(Clone, Debug)]
pub struct Triangle {
    /// One embedding for a boundary triangle, otherwise two.
    pub embeddings: Vec<FaceEmbedding>,
    pub component: usize,
    pub boundary_component: Option<usize>,
}

impl Triangle {
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.embeddings.len() == 1
    }

    #[inline]
    pub fn front(&self) -> FaceEmbedding {
        self.embeddings[0]
    }
}

#[derive(Clone, Debug)]
pub struct Component {
    pub tets: Vec<usize>,
    pub orientable: bool,
    pub boundary_components: Vec<usize>,
}

impl Component {
    #[inline]
    pub fn size(&self) -> usize {
        self.tets.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    /// Made of boundary triangles.
    Real,
    /// A single ideal vertex.
    Ideal,
    /// A single invalid vertex off the real boundary.
    Invalid,
}

#[derive(Clone, Debug)]
pub struct BoundaryComponent {
    pub kind: BoundaryKind,
    pub triangles: Vec<usize>,
    pub edges: Vec<usize>,
    pub vertices: Vec<usize>,
    pub euler_char: i64,
    pub orientable: bool,
    pub component: usize,
}

impl BoundaryComponent {
    #[inline]
    pub fn is_real(&self) -> bool {
        self.kind == BoundaryKind::Real
    }

    #[inline]
    pub fn is_ideal(&self) -> bool {
        self.kind == BoundaryKind::Ideal
    }

    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.kind == BoundaryKind::Invalid
    }

    #[inline]
    pub fn count_triangles(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn euler_char(&self) -> i64 {
        self.euler_char
    }

    #[inline]
    pub fn is_orientable(&self) -> bool {
        self.orientable
    }
}

/// Precomputed skeletal data for a triangulation.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub triangles: Vec<Triangle>,
    pub components: Vec<Component>,
    pub boundary_components: Vec<BoundaryComponent>,

    pub tet_vertex: Vec<[usize; 4]>,
    pub tet_edge: Vec<[usize; 6]>,
    pub tet_edge_perm: Vec<[Perm4; 6]>,
    pub tet_triangle: Vec<[usize; 4]>,
    pub tet_triangle_perm: Vec<[Perm4; 4]>,
    pub tet_component: Vec<usize>,
    /// +1 or -1 per tetrahedron, from a BFS orientation of each component.
    pub tet_orientation: Vec<i32>,
}

/// Step around an edge: leave `t` through facet `p[role]`.
#[inline]
fn edge_step(tets: &[Tetrahedron], t: usize, p: Perm4, role: usize) -> Option<(usize, Perm4)> {
    let g = tets[t].adjacent(p.apply(role))?;
    Some((g.tet, g.perm * p * Perm4::swap(2, 3)))
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}

/// Parity of the ordering `(a, b, c)` relative to ascending order.
#[inline]
fn triple_sign(a: u8, b: u8, c: u8) -> i32 {
    let inversions = (a > b) as u32 + (a > c) as u32 + (b > c) as u32;
    if inversions % 2 == 0 { 1 } else { -1 }
}

impl Skeleton {
    /// Compute the full skeleton of the given tetrahedra.
    pub fn build(tets: &[Tetrahedron]) -> Skeleton {
        let n = tets.len();
        let mut sk = Skeleton {
            tet_vertex: vec![[UNSET; 4]; n],
            tet_edge: vec![[UNSET; 6]; n],
            tet_edge_perm: vec![[Perm4::identity(); 6]; n],
            tet_triangle: vec![[UNSET; 4]; n],
            tet_triangle_perm: vec![[Perm4::identity(); 4]; n],
            tet_component: vec![UNSET; n],
            tet_orientation: vec![0; n],
            ..Skeleton::default()
        };
        sk.build_components(tets);
        sk.build_vertices(tets);
        sk.build_edges(tets);
        sk.build_triangles(tets);
        sk.compute_vertex_links(tets);
        sk.build_boundary_components(tets);
        sk
    }

    fn build_components(&mut self, tets: &[Tetrahedron]) {
        for s in 0..tets.len() {
            if self.tet_component[s] != UNSET {
                continue;
            }
            let c = self.components.len();
            let mut comp = Component {
                tets: Vec::new(),
                orientable: true,
                boundary_components: Vec::new(),
            };
            self.tet_component[s] = c;
            self.tet_orientation[s] = 1;
            let mut queue = VecDeque::from([s]);
            while let Some(t) = queue.pop_front() {
                comp.tets.push(t);
                for f in 0..4 {
                    let Some(g) = tets[t].adjacent(f) else { continue };
                    let want = -self.tet_orientation[t] * g.perm.sign();
                    if self.tet_component[g.tet] == UNSET {
                        self.tet_component[g.tet] = c;
                        self.tet_orientation[g.tet] = want;
                        queue.push_back(g.tet);
                    } else if self.tet_orientation[g.tet] != want {
                        comp.orientable = false;
                    }
                }
            }
            self.components.push(comp);
        }
    }

    fn build_vertices(&mut self, tets: &[Tetrahedron]) {
        let n = tets.len();
        let mut parent: Vec<usize> = (0..4 * n).collect();
        for (t, tet) in tets.iter().enumerate() {
            for f in 0..4 {
                let Some(g) = tet.adjacent(f) else { continue };
                for v in (0..4).filter(|&v| v != f) {
                    union(&mut parent, 4 * t + v, 4 * g.tet + g.perm.apply(v));
                }
            }
        }
        let mut class_index = vec![UNSET; 4 * n];
        for t in 0..n {
            for v in 0..4 {
                let root = find(&mut parent, 4 * t + v);
                if class_index[root] == UNSET {
                    class_index[root] = self.vertices.len();
                    self.vertices.push(Vertex {
                        embeddings: Vec::new(),
                        link: VertexLinkType::Sphere,
                        link_euler: 0,
                        link_orientable: true,
                        component: self.tet_component[t],
                        boundary_component: None,
                    });
                }
                let idx = class_index[root];
                self.vertices[idx]
                    .embeddings
                    .push(VertexEmbedding { tet: t, vertex: v });
                self.tet_vertex[t][v] = idx;
            }
        }
    }

    fn build_edges(&mut self, tets: &[Tetrahedron]) {
        for t in 0..tets.len() {
            for e in 0..6 {
                if self.tet_edge[t][e] != UNSET {
                    continue;
                }
                let start = (t, Perm4::edge_ordering(e));

                // Walk backwards to a boundary end, if there is one.
                let mut begin = start;
                let mut cur = start;
                loop {
                    match edge_step(tets, cur.0, cur.1, 3) {
                        None => {
                            begin = cur;
                            break;
                        }
                        Some(next) if next == start => break,
                        Some(next) => cur = next,
                    }
                }

                let idx = self.edges.len();
                let mut embeddings = Vec::new();
                let mut valid = true;
                let mut cur = Some(begin);
                while let Some((tt, pp)) = cur {
                    let en = EDGE_NUMBER[pp.apply(0)][pp.apply(1)];
                    if self.tet_edge[tt][en] == idx {
                        if self.tet_edge_perm[tt][en][0] != pp[0] {
                            valid = false;
                        }
                        break;
                    }
                    self.tet_edge[tt][en] = idx;
                    self.tet_edge_perm[tt][en] = pp;
                    embeddings.push(FaceEmbedding { tet: tt, perm: pp });
                    cur = edge_step(tets, tt, pp, 2);
                    if cur == Some(begin) {
                        break;
                    }
                }

                let boundary = tets[begin.0].adjacent(begin.1.apply(3)).is_none();
                let ends = [
                    self.tet_vertex[begin.0][begin.1.apply(0)],
                    self.tet_vertex[begin.0][begin.1.apply(1)],
                ];
                self.edges.push(Edge {
                    embeddings,
                    valid,
                    boundary,
                    vertices: ends,
                    component: self.tet_component[t],
                    boundary_component: None,
                });
            }
        }
    }

    fn build_triangles(&mut self, tets: &[Tetrahedron]) {
        for t in 0..tets.len() {
            for f in 0..4 {
                if self.tet_triangle[t][f] != UNSET {
                    continue;
                }
                let idx = self.triangles.len();
                let p = Perm4::triangle_ordering(f);
                let mut embeddings = vec![FaceEmbedding { tet: t, perm: p }];
                self.tet_triangle[t][f] = idx;
                self.tet_triangle_perm[t][f] = p;
                if let Some(g) = tets[t].adjacent(f) {
                    let q = g.perm * p;
                    let back = g.perm.apply(f);
                    embeddings.push(FaceEmbedding { tet: g.tet, perm: q });
                    self.tet_triangle[g.tet][back] = idx;
                    self.tet_triangle_perm[g.tet][back] = q;
                }
                self.triangles.push(Triangle {
                    embeddings,
                    component: self.tet_component[t],
                    boundary_component: None,
                });
            }
        }
    }

    fn compute_vertex_links(&mut self, tets: &[Tetrahedron]) {
        // Link vertices are edge ends; an invalid edge has a single end class.
        let mut ends = vec![0i64; self.vertices.len()];
        for e in &self.edges {
            ends[e.vertices[0]] += 1;
            if e.valid {
                ends[e.vertices[1]] += 1;
            }
        }

        let mut corner_sign = vec![0i32; 4 * tets.len()];
        for (vi, vertex) in self.vertices.iter_mut().enumerate() {
            let faces = vertex.embeddings.len() as i64;
            let mut bdry_edges = 0i64;
            let mut internal_sides = 0i64;
            for emb in &vertex.embeddings {
                for f in (0..4).filter(|&f| f != emb.vertex) {
                    if tets[emb.tet].adjacent(f).is_some() {
                        internal_sides += 1;
                    } else {
                        bdry_edges += 1;
                    }
                }
            }
            let chi = ends[vi] - (bdry_edges + internal_sides / 2) + faces;

            let mut orientable = true;
            let first = vertex.embeddings[0];
            corner_sign[4 * first.tet + first.vertex] = 1;
            let mut stack = vec![first];
            while let Some(c) = stack.pop() {
                let sign = corner_sign[4 * c.tet + c.vertex];
                for f in (0..4).filter(|&f| f != c.vertex) {
                    let Some(g) = tets[c.tet].adjacent(f) else { continue };
                    let key = 4 * g.tet + g.perm.apply(c.vertex);
                    let want = -sign * g.perm.sign();
                    if corner_sign[key] == 0 {
                        corner_sign[key] = want;
                        stack.push(VertexEmbedding {
                            tet: g.tet,
                            vertex: g.perm.apply(c.vertex),
                        });
                    } else if corner_sign[key] != want {
                        orientable = false;
                    }
                }
            }

            vertex.link_euler = chi;
            vertex.link_orientable = orientable;
            vertex.link = if bdry_edges > 0 {
                if chi == 1 {
                    VertexLinkType::Disc
                } else {
                    VertexLinkType::Invalid
                }
            } else {
                match chi {
                    2 => VertexLinkType::Sphere,
                    0 if orientable => VertexLinkType::Torus,
                    0 => VertexLinkType::KleinBottle,
                    _ => VertexLinkType::NonStandardCusp,
                }
            };
        }
    }

    fn build_boundary_components(&mut self, tets: &[Tetrahedron]) {
        let nt = self.triangles.len();
        let mut parent: Vec<usize> = (0..nt).collect();
        // (a, b, relative orientation sign) for each boundary edge.
        let mut links: Vec<(usize, usize, i32)> = Vec::new();
        for e in &self.edges {
            if !e.boundary || !e.valid {
                continue;
            }
            let front = e.front();
            let back = e.back();
            let (q1, q2) = (front.perm, back.perm);
            if tets[back.tet].adjacent(q2.apply(2)).is_some() {
                continue;
            }
            let a = self.tet_triangle[front.tet][q1.apply(3)];
            let b = self.tet_triangle[back.tet][q2.apply(2)];
            let sa = triple_sign(q1[0], q1[1], q1[2]);
            let sb = triple_sign(q2[0], q2[1], q2[3]);
            union(&mut parent, a, b);
            links.push((a, b, -sa * sb));
        }

        let mut comp_of = vec![UNSET; nt];
        let mut real: Vec<Vec<usize>> = Vec::new();
        let mut root_index = vec![UNSET; nt];
        for tri in 0..nt {
            if !self.triangles[tri].is_boundary() {
                continue;
            }
            let root = find(&mut parent, tri);
            if root_index[root] == UNSET {
                root_index[root] = real.len();
                real.push(Vec::new());
            }
            comp_of[tri] = root_index[root];
            real[root_index[root]].push(tri);
        }

        // Orientation of each real component by BFS over boundary triangles.
        let mut adjacency: Vec<Vec<(usize, i32)>> = vec![Vec::new(); nt];
        for &(a, b, rel) in &links {
            adjacency[a].push((b, rel));
            adjacency[b].push((a, rel));
        }
        let mut tri_sign = vec![0i32; nt];
        let mut orientable = vec![true; real.len()];
        for (c, tris) in real.iter().enumerate() {
            let Some(&seed) = tris.first() else { continue };
            tri_sign[seed] = 1;
            let mut stack = vec![seed];
            while let Some(x) = stack.pop() {
                for &(y, rel) in &adjacency[x] {
                    let want = tri_sign[x] * rel;
                    if tri_sign[y] == 0 {
                        tri_sign[y] = want;
                        stack.push(y);
                    } else if tri_sign[y] != want {
                        orientable[c] = false;
                    }
                }
            }
        }

        for (c, tris) in real.into_iter().enumerate() {
            let bc = self.boundary_components.len();
            let mut verts: Vec<usize> = Vec::new();
            for &tri in &tris {
                let emb = self.triangles[tri].front();
                for i in 0..3 {
                    verts.push(self.tet_vertex[emb.tet][emb.perm.apply(i)]);
                }
                self.triangles[tri].boundary_component = Some(bc);
            }
            verts.sort_unstable();
            verts.dedup();
            let mut edges: Vec<usize> = Vec::new();
            for (ei, e) in self.edges.iter_mut().enumerate() {
                if !e.boundary {
                    continue;
                }
                let front = e.embeddings[0];
                let a = self.tet_triangle[front.tet][front.perm.apply(3)];
                if comp_of[a] == c {
                    e.boundary_component = Some(bc);
                    edges.push(ei);
                }
            }
            for &v in &verts {
                self.vertices[v].boundary_component = Some(bc);
            }
            let component = self.triangles[tris[0]].component;
            let euler_char = verts.len() as i64 - edges.len() as i64 + tris.len() as i64;
            self.components[component].boundary_components.push(bc);
            self.boundary_components.push(BoundaryComponent {
                kind: BoundaryKind::Real,
                triangles: tris,
                edges,
                vertices: verts,
                euler_char,
                orientable: orientable[c],
                component,
            });
        }

        for vi in 0..self.vertices.len() {
            let v = &self.vertices[vi];
            let kind = if v.is_ideal() {
                BoundaryKind::Ideal
            } else if !v.is_valid() && v.boundary_component.is_none() {
                BoundaryKind::Invalid
            } else {
                continue;
            };
            let bc = self.boundary_components.len();
            let component = v.component;
            self.boundary_components.push(BoundaryComponent {
                kind,
                triangles: Vec::new(),
                edges: Vec::new(),
                vertices: vec![vi],
                euler_char: v.link_euler,
                orientable: v.link_orientable,
                component,
            });
            self.components[component].boundary_components.push(bc);
            self.vertices[vi].boundary_component = Some(bc);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::maths::perm::Perm4;
    use crate::triangulation::Triangulation;

    fn perm(s: &str) -> Perm4 {
        s.parse().unwrap()
    }

    #[test]
    fn single_tetrahedron_is_a_ball() {
        let tri = Triangulation::from_gluings(1, &[]).unwrap();
        assert_eq!(tri.count_vertices(), 4);
        assert_eq!(tri.count_edges(), 6);
        assert_eq!(tri.count_triangles(), 4);
        assert_eq!(tri.count_boundary_components(), 1);
        let bc = tri.boundary_component(0);
        assert!(bc.is_real());
        assert_eq!(bc.euler_char(), 2);
        assert!(bc.is_orientable());
        assert!(tri.is_valid());
        assert!(!tri.is_closed());
        assert!(tri.vertex(0).link == super::VertexLinkType::Disc);
    }

    #[test]
    fn gieseking_has_klein_bottle_cusp() {
        let tri = Triangulation::from_gluings(
            1,
            &[(0, 0, 0, perm("1203")), (0, 2, 0, perm("0231"))],
        )
        .unwrap();
        assert_eq!(tri.count_vertices(), 1);
        assert_eq!(tri.count_edges(), 1);
        assert_eq!(tri.vertex(0).link, super::VertexLinkType::KleinBottle);
        assert!(tri.is_ideal());
        assert!(!tri.is_orientable());
        assert!(tri.is_valid());
        assert_eq!(tri.count_boundary_components(), 1);
        assert!(tri.boundary_component(0).is_ideal());
    }

    #[test]
    fn edge_embeddings_follow_the_walk() {
        // Two tetrahedra glued along one facet: the shared edges have degree 2.
        let tri = Triangulation::from_gluings(2, &[(0, 3, 1, perm("0123"))]).unwrap();
        assert_eq!(tri.count_edges(), 9);
        let e = tri.tet_edge(0, 0);
        assert_eq!(tri.edge(e).degree(), 2);
        assert!(tri.edge(e).boundary);
        let m = tri.tet_edge_mapping(1, 0);
        assert_eq!((m[0], m[1]), (0, 1));
        assert_eq!(tri.boundary_component(0).euler_char(), 2);
    }

    #[test]
    fn reversed_edge_is_invalid() {
        // Glue facet 3 onto facet 2 with vertices 0 and 1 exchanged.
        let tri = Triangulation::from_gluings(1, &[(0, 3, 0, perm("1032"))]).unwrap();
        let e = tri.tet_edge(0, 0);
        assert!(!tri.edge(e).valid);
        assert!(!tri.is_valid());
    }
}
