//! Isomorphism signatures.
//!
//! A signature is computed per connected component by trying every start
//! (tetrahedron, vertex labelling), relabelling the component in BFS order
//! from that start and packing the resulting gluing data into printable
//! base-64 characters. The smallest string wins; component signatures are
//! sorted and concatenated. The empty triangulation has signature `"a"`.
//!
//! Packing, per component:
//! - the size `n` (one character if `n < 63`, otherwise a marker, a width
//!   `w` and `n` in `w` characters),
//! - one action per facet in BFS order, three actions of two bits per
//!   character (0 = boundary, 1 = new tetrahedron, 2 = gluing to a known
//!   tetrahedron),
//! - the destination of each action-2 gluing (`w` characters each),
//! - the permutation index of each action-2 gluing (one character each).

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::maths::perm::{Perm4, S4};
use crate::tri_error::TriError;

use super::{Isomorphism, Triangulation};

const ALPHABET: &[u8; 64] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+-";

/// Which family of starting labellings a signature minimises over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IsoSigKind {
    /// Every (tetrahedron, labelling) start.
    #[default]
    Classic,
    /// Only starts whose edge degree profile is minimal. Faster on large
    /// inputs; produces a different (still canonical) string.
    EdgeDegrees,
}

#[inline]
fn encode_char(v: usize) -> u8 {
    ALPHABET[v & 63]
}

fn decode_char(c: u8) -> Result<usize, TriError> {
    match c {
        b'a'..=b'z' => Ok((c - b'a') as usize),
        b'A'..=b'Z' => Ok((c - b'A') as usize + 26),
        b'0'..=b'9' => Ok((c - b'0') as usize + 52),
        b'+' => Ok(62),
        b'-' => Ok(63),
        _ => Err(TriError::InvalidArgument(format!(
            "invalid signature character {:?}",
            c as char
        ))),
    }
}

fn encode_int(out: &mut Vec<u8>, mut v: usize, width: usize) {
    for _ in 0..width {
        out.push(encode_char(v));
        v >>= 6;
    }
}

/// One candidate: the packed string plus the relabelling that produced it.
struct Candidate {
    sig: Vec<u8>,
    image: Vec<usize>,
    vmap: Vec<Perm4>,
}

/// Relabel the component of `start` by BFS with `verts` as the labelling
/// of the start tetrahedron, and pack the result.
fn candidate(tri: &Triangulation, start: usize, verts: Perm4) -> Candidate {
    let n = tri.size();
    let mut image = vec![usize::MAX; n];
    let mut vmap = vec![Perm4::identity(); n];
    let mut pre = Vec::with_capacity(n);
    image[start] = 0;
    vmap[start] = verts.inverse();
    pre.push(start);

    let mut actions: Vec<u8> = Vec::new();
    let mut dests: Vec<usize> = Vec::new();
    let mut gluings: Vec<usize> = Vec::new();

    let mut si = 0;
    while si < pre.len() {
        let src = pre[si];
        let src_inv = vmap[src].inverse();
        for fi in 0..4 {
            let fs = src_inv.apply(fi);
            let Some(g) = tri.adjacent(src, fs) else {
                actions.push(0);
                continue;
            };
            let (dest, p) = (g.tet, g.perm);
            if image[dest] != usize::MAX {
                if image[dest] < image[src]
                    || (dest == src && vmap[src].apply(p.apply(fs)) < vmap[src].apply(fs))
                {
                    continue;
                }
            } else {
                image[dest] = pre.len();
                pre.push(dest);
                vmap[dest] = vmap[src] * p.inverse();
                actions.push(1);
                continue;
            }
            dests.push(image[dest]);
            gluings.push((vmap[dest] * p * vmap[src].inverse()).s4_index());
            actions.push(2);
        }
        si += 1;
    }

    let size = pre.len();
    let mut sig = Vec::new();
    let width = if size < 63 {
        1
    } else {
        let mut w = 0;
        let mut tmp = size;
        while tmp > 0 {
            tmp >>= 6;
            w += 1;
        }
        sig.push(encode_char(63));
        sig.push(encode_char(w));
        w
    };
    encode_int(&mut sig, size, width);
    for chunk in actions.chunks(3) {
        let v = chunk
            .iter()
            .enumerate()
            .fold(0usize, |acc, (j, &a)| acc | ((a as usize) << (2 * j)));
        sig.push(encode_char(v));
    }
    for &d in &dests {
        encode_int(&mut sig, d, width);
    }
    for &g in &gluings {
        sig.push(encode_char(g));
    }
    Candidate { sig, image, vmap }
}

/// Degree profile of the six edges of `t` seen through labelling `verts`.
fn degree_key(tri: &Triangulation, t: usize, verts: Perm4) -> [usize; 6] {
    let mut key = [0; 6];
    for (k, ends) in crate::maths::perm::EDGE_VERTEX.iter().enumerate() {
        let e = crate::maths::perm::EDGE_NUMBER[verts.apply(ends[0])][verts.apply(ends[1])];
        key[k] = tri.edge(tri.tet_edge(t, e)).degree();
    }
    key
}

fn starts(tri: &Triangulation, members: &[usize], kind: IsoSigKind) -> Vec<(usize, Perm4)> {
    let all: Vec<(usize, Perm4)> = members
        .iter()
        .flat_map(|&t| S4.iter().map(move |&p| (t, p)))
        .collect();
    match kind {
        IsoSigKind::Classic => all,
        IsoSigKind::EdgeDegrees => {
            let keys: Vec<[usize; 6]> = all.iter().map(|&(t, p)| degree_key(tri, t, p)).collect();
            let Some(best) = keys.iter().min().copied() else {
                return all;
            };
            all.into_iter()
                .zip(keys)
                .filter(|(_, k)| *k == best)
                .map(|(s, _)| s)
                .collect()
        }
    }
}

fn best_candidate(tri: &Triangulation, members: &[usize], kind: IsoSigKind) -> Option<Candidate> {
    let starts = starts(tri, members, kind);
    #[cfg(feature = "rayon")]
    {
        starts
            .par_iter()
            .map(|&(t, p)| candidate(tri, t, p))
            .min_by(|a, b| a.sig.cmp(&b.sig))
    }
    #[cfg(not(feature = "rayon"))]
    {
        starts
            .iter()
            .map(|&(t, p)| candidate(tri, t, p))
            .min_by(|a, b| a.sig.cmp(&b.sig))
    }
}

impl Triangulation {
    /// Classic isomorphism signature (cached).
    pub fn iso_sig(&self) -> String {
        self.props
            .iso_sig
            .get_or_init(|| self.iso_sig_detail(IsoSigKind::Classic).0)
            .clone()
    }

    /// Signature of the requested kind.
    pub fn iso_sig_of_kind(&self, kind: IsoSigKind) -> String {
        match kind {
            IsoSigKind::Classic => self.iso_sig(),
            IsoSigKind::EdgeDegrees => self.iso_sig_detail(kind).0,
        }
    }

    /// Signature together with the isomorphism from this triangulation to
    /// the labelling that [`Triangulation::from_isosig`] reconstructs.
    pub fn iso_sig_detail(&self, kind: IsoSigKind) -> (String, Isomorphism) {
        let n = self.size();
        if n == 0 {
            return ("a".to_string(), Isomorphism::identity(0));
        }
        let mut parts: Vec<(Vec<u8>, Vec<usize>, Candidate)> = Vec::new();
        for comp in &self.skeleton().components {
            let mut members = comp.tets.clone();
            members.sort_unstable();
            if let Some(best) = best_candidate(self, &members, kind) {
                parts.push((best.sig.clone(), members, best));
            }
        }
        parts.sort_by(|a, b| a.0.cmp(&b.0));

        let mut sig = Vec::new();
        let mut simp_image = vec![0; n];
        let mut facet_perm = vec![Perm4::identity(); n];
        let mut offset = 0;
        for (s, members, cand) in &parts {
            sig.extend_from_slice(s);
            for &t in members {
                simp_image[t] = offset + cand.image[t];
                facet_perm[t] = cand.vmap[t];
            }
            offset += members.len();
        }
        let text = String::from_utf8_lossy(&sig).into_owned();
        (
            text,
            Isomorphism {
                simp_image,
                facet_perm,
            },
        )
    }

    /// True if the two triangulations are combinatorially isomorphic.
    pub fn is_isomorphic_to(&self, other: &Triangulation) -> bool {
        self.size() == other.size() && self.iso_sig() == other.iso_sig()
    }

    /// Relabel into the canonical form encoded by the signature. Returns
    /// true if the labelling changed.
    pub fn make_canonical(&mut self) -> Result<bool, TriError> {
        let (_, iso) = self.iso_sig_detail(IsoSigKind::Classic);
        if iso == Isomorphism::identity(self.size()) {
            return Ok(false);
        }
        iso.apply_in_place(self)?;
        Ok(true)
    }

    /// Rebuild a triangulation from its signature.
    ///
    /// # Errors
    /// `InvalidArgument` on any malformed input.
    pub fn from_isosig(sig: &str) -> Result<Triangulation, TriError> {
        let bytes = sig.as_bytes();
        let bad = |why: &str| TriError::InvalidArgument(format!("invalid signature {sig:?}: {why}"));
        let mut tri = Triangulation::new();
        let mut pos = 0;

        let read = |pos: &mut usize| -> Result<usize, TriError> {
            let c = *bytes.get(*pos).ok_or_else(|| bad("truncated"))?;
            *pos += 1;
            decode_char(c)
        };

        if bytes.is_empty() {
            return Err(bad("empty string"));
        }
        while pos < bytes.len() {
            let mut n = read(&mut pos)?;
            let width = if n == 63 {
                let w = read(&mut pos)?;
                if w == 0 || w > 5 {
                    return Err(bad("bad size width"));
                }
                n = 0;
                for i in 0..w {
                    n |= read(&mut pos)? << (6 * i);
                }
                w
            } else {
                1
            };
            if n == 0 {
                continue;
            }

            let mut actions = Vec::new();
            let mut facets = 0;
            let mut joins = 0;
            while facets < 4 * n {
                let v = read(&mut pos)?;
                for j in 0..3 {
                    let a = (v >> (2 * j)) & 3;
                    if facets == 4 * n {
                        if a != 0 {
                            return Err(bad("trailing actions"));
                        }
                        continue;
                    }
                    match a {
                        0 => facets += 1,
                        1 => facets += 2,
                        2 => {
                            facets += 2;
                            joins += 1;
                        }
                        _ => return Err(bad("unknown action")),
                    }
                    if facets > 4 * n {
                        return Err(bad("too many facets"));
                    }
                    actions.push(a);
                }
            }

            let mut dests = Vec::with_capacity(joins);
            for _ in 0..joins {
                let mut d = 0;
                for i in 0..width {
                    d |= read(&mut pos)? << (6 * i);
                }
                if d >= n {
                    return Err(bad("destination out of range"));
                }
                dests.push(d);
            }
            let mut gluings = Vec::with_capacity(joins);
            for _ in 0..joins {
                let g = read(&mut pos)?;
                if g >= 24 {
                    return Err(bad("permutation out of range"));
                }
                gluings.push(S4[g]);
            }

            let base = tri.size();
            tri.new_tetrahedra(n);
            let mut next_action = 0;
            let mut next_new = 1;
            let mut next_join = 0;
            for t in 0..n {
                for f in 0..4 {
                    if tri.adjacent(base + t, f).is_some() {
                        continue;
                    }
                    let a = *actions.get(next_action).ok_or_else(|| bad("missing action"))?;
                    next_action += 1;
                    match a {
                        1 => {
                            if next_new >= n {
                                return Err(bad("too many tetrahedra"));
                            }
                            tri.join(base + t, f, base + next_new, Perm4::identity())
                                .map_err(|_| bad("inconsistent new tetrahedron"))?;
                            next_new += 1;
                        }
                        2 => {
                            let (d, p) = (dests[next_join], gluings[next_join]);
                            next_join += 1;
                            tri.join(base + t, f, base + d, p)
                                .map_err(|_| bad("inconsistent gluing"))?;
                        }
                        _ => {}
                    }
                }
            }
            if next_new != n {
                return Err(bad("disconnected component"));
            }
        }
        Ok(tri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::example;

    #[test]
    fn known_signatures() {
        assert_eq!(Triangulation::new().iso_sig(), "a");
        assert_eq!(example::figure_eight().iso_sig(), "cPcbbbiht");
        assert_eq!(example::gieseking().iso_sig(), "bkaaid");
    }

    #[test]
    fn decode_rejects_garbage() {
        for bad in ["", "b", "b!", "bkaai", "bzzzzz", "cPcbbbih"] {
            assert!(
                matches!(Triangulation::from_isosig(bad), Err(TriError::InvalidArgument(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn detail_isomorphism_reaches_canonical_labelling() {
        let tri = example::twisted_kxi();
        let (sig, iso) = tri.iso_sig_detail(IsoSigKind::Classic);
        let canonical = Triangulation::from_isosig(&sig).unwrap();
        assert!(iso.apply(&tri).unwrap().is_identical_to(&canonical));
    }

    #[test]
    fn edge_degree_variant_is_invariant() {
        let tri = example::poincare_homology_sphere();
        let mut other = tri.clone();
        other.make_canonical().unwrap();
        assert_eq!(
            tri.iso_sig_of_kind(IsoSigKind::EdgeDegrees),
            other.iso_sig_of_kind(IsoSigKind::EdgeDegrees)
        );
        assert!(tri.is_isomorphic_to(&other));
    }
}
