//! Small, fixed-size permutations `Perm<K>` for K = 3, 4, 5.
//!
//! A permutation is stored by its image array, so `p[i]` is the image of
//! `i`. Composition follows the usual convention: `p * q` applies `q`
//! first and then `p`.
//!
//! Lexicographic indices (`index`, `ordered_sn`) are computed through the
//! factorial number system, which is constant time for the sizes used
//! here. The most heavily used group, S₄, additionally has a precomputed
//! table with inverse lookup in [`S4`] / [`S4_INDEX`].

use core::fmt::{Debug, Display, Formatter};
use core::ops::{Index, Mul};

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::tri_error::TriError;

/// Fixed-size permutation of `{0, .., K-1}`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Perm<const K: usize>(pub [u8; K]);

pub type Perm3 = Perm<3>;
pub type Perm4 = Perm<4>;
pub type Perm5 = Perm<5>;

impl<const K: usize> Default for Perm<K> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<const K: usize> Debug for Perm<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Perm").field(&self.to_string()).finish()
    }
}

impl<const K: usize> Display for Perm<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        for &x in &self.0 {
            write!(f, "{x}")?;
        }
        Ok(())
    }
}

impl<const K: usize> Index<usize> for Perm<K> {
    type Output = u8;
    #[inline]
    fn index(&self, i: usize) -> &u8 {
        &self.0[i]
    }
}

impl<const K: usize> Mul for Perm<K> {
    type Output = Perm<K>;
    #[inline]
    fn mul(self, rhs: Perm<K>) -> Perm<K> {
        self.compose(rhs)
    }
}

const fn factorial(k: usize) -> usize {
    let mut out = 1;
    let mut i = 2;
    while i <= k {
        out *= i;
        i += 1;
    }
    out
}

impl<const K: usize> Perm<K> {
    /// Number of permutations in Sₖ.
    pub const N_PERMS: usize = factorial(K);

    #[inline]
    pub const fn identity() -> Self {
        let mut id = [0u8; K];
        let mut i = 0;
        while i < K {
            id[i] = i as u8;
            i += 1;
        }
        Perm(id)
    }

    #[inline]
    pub const fn new_unchecked(p: [u8; K]) -> Self {
        Perm(p)
    }

    /// Build from an explicit image list, checking that it is a bijection.
    pub fn from_images(images: [u8; K]) -> Result<Self, TriError> {
        let mut seen = [false; K];
        for &x in &images {
            let x = x as usize;
            if x >= K || seen[x] {
                return Err(TriError::InvalidArgument(format!(
                    "{images:?} is not a permutation of {K} elements"
                )));
            }
            seen[x] = true;
        }
        Ok(Perm(images))
    }

    /// The transposition exchanging `a` and `b`.
    #[inline]
    pub const fn swap(a: usize, b: usize) -> Self {
        let mut p = Self::identity();
        p.0[a] = b as u8;
        p.0[b] = a as u8;
        p
    }

    /// The cyclic rotation `i -> i + r (mod K)`.
    #[inline]
    pub const fn rot(r: usize) -> Self {
        let mut p = [0u8; K];
        let mut i = 0;
        while i < K {
            p[i] = ((i + r) % K) as u8;
            i += 1;
        }
        Perm(p)
    }

    /// Image of `i`.
    #[inline]
    pub fn apply(&self, i: usize) -> usize {
        self.0[i] as usize
    }

    /// Preimage of `i`.
    #[inline]
    pub fn pre(&self, i: usize) -> usize {
        let mut j = 0;
        while j < K {
            if self.0[j] as usize == i {
                return j;
            }
            j += 1;
        }
        K
    }

    #[inline]
    pub fn images(&self) -> [u8; K] {
        self.0
    }

    /// `self ∘ other`: apply `other`, then `self`.
    #[inline]
    pub fn compose(&self, other: Self) -> Self {
        let mut out = [0u8; K];
        let mut i = 0;
        while i < K {
            out[i] = self.0[other.0[i] as usize];
            i += 1;
        }
        Perm(out)
    }

    #[inline]
    pub fn inverse(&self) -> Self {
        let mut inv = [0u8; K];
        let mut i = 0;
        while i < K {
            inv[self.0[i] as usize] = i as u8;
            i += 1;
        }
        Perm(inv)
    }

    /// +1 for even permutations, -1 for odd.
    #[inline]
    pub fn sign(&self) -> i32 {
        let mut s = 1;
        for i in 0..K {
            for j in (i + 1)..K {
                if self.0[i] > self.0[j] {
                    s = -s;
                }
            }
        }
        s
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Position of this permutation in the lexicographic ordering of Sₖ.
    pub fn index(&self) -> usize {
        let mut idx = 0;
        for i in 0..K {
            let smaller = ((i + 1)..K).filter(|&j| self.0[j] < self.0[i]).count();
            idx = idx * (K - i) + smaller;
        }
        idx
    }

    /// Alias for [`Perm::index`], the inverse of [`Perm::ordered_sn`].
    #[inline]
    pub fn ordered_index(&self) -> usize {
        self.index()
    }

    /// The `i`-th permutation in lexicographic order.
    pub fn ordered_sn(i: usize) -> Self {
        let mut digits = [0usize; K];
        let mut rest = i % Self::N_PERMS;
        for pos in (0..K).rev() {
            let base = K - pos;
            digits[pos] = rest % base;
            rest /= base;
        }
        let mut avail: [bool; K] = [true; K];
        let mut out = [0u8; K];
        for pos in 0..K {
            let mut count = digits[pos];
            for (v, free) in avail.iter_mut().enumerate() {
                if *free {
                    if count == 0 {
                        out[pos] = v as u8;
                        *free = false;
                        break;
                    }
                    count -= 1;
                }
            }
        }
        Perm(out)
    }

    /// Alias for [`Perm::ordered_sn`].
    #[inline]
    pub fn sn(i: usize) -> Self {
        Self::ordered_sn(i)
    }

    /// Iterate over Sₖ in lexicographic order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::N_PERMS).map(Self::ordered_sn)
    }

    #[inline]
    const fn pack_bits() -> u32 {
        if K <= 4 {
            if K <= 3 { 2 } else { 3 }
        } else {
            3
        }
    }

    /// Compact "image pack": `bits` bits per image, image of 0 lowest.
    pub fn image_pack(&self) -> u32 {
        let b = Self::pack_bits();
        let mut out = 0u32;
        for i in 0..K {
            out |= (self.0[i] as u32) << (b * i as u32);
        }
        out
    }

    /// Inverse of [`Perm::image_pack`], rejecting packs that do not encode
    /// a permutation or carry stray high bits.
    pub fn from_image_pack(pack: u32) -> Result<Self, TriError> {
        let b = Self::pack_bits();
        let mask = (1u32 << b) - 1;
        if b * (K as u32) < 32 && (pack >> (b * K as u32)) != 0 {
            return Err(TriError::InvalidArgument(format!(
                "image pack {pack:#x} has bits beyond {K} images"
            )));
        }
        let mut images = [0u8; K];
        for (i, img) in images.iter_mut().enumerate() {
            *img = ((pack >> (b * i as u32)) & mask) as u8;
        }
        Self::from_images(images)
    }
}

// ---------------------------------------------------------------------------
// S4 tables and tetrahedron face numbering
// ---------------------------------------------------------------------------

/// All 24 permutations of four elements, in lexicographic order.
pub static S4: Lazy<[Perm4; 24]> = Lazy::new(|| {
    let mut out = [Perm4::identity(); 24];
    for (i, p) in out.iter_mut().enumerate() {
        *p = Perm4::ordered_sn(i);
    }
    out
});

/// `S4_INDEX[image_pack]` is the lexicographic index of that permutation.
pub static S4_INDEX: Lazy<Vec<u8>> = Lazy::new(|| {
    let mut idx = vec![u8::MAX; 1 << 12];
    for (i, p) in S4.iter().enumerate() {
        idx[p.image_pack() as usize] = i as u8;
    }
    idx
});

/// `INV_S4[i]` is the index of the inverse of `S4[i]`.
pub static INV_S4: Lazy<[u8; 24]> = Lazy::new(|| {
    let mut out = [0u8; 24];
    for (i, p) in S4.iter().enumerate() {
        out[i] = S4_INDEX[p.inverse().image_pack() as usize];
    }
    out
});

/// Edge number of the edge joining vertices `i` and `j` of a tetrahedron.
pub const EDGE_NUMBER: [[usize; 4]; 4] = [
    [usize::MAX, 0, 1, 2],
    [0, usize::MAX, 3, 4],
    [1, 3, usize::MAX, 5],
    [2, 4, 5, usize::MAX],
];

/// The two vertices of each edge of a tetrahedron.
pub const EDGE_VERTEX: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

impl Perm4 {
    /// Fast lexicographic index via the precomputed table.
    #[inline]
    pub fn s4_index(&self) -> usize {
        S4_INDEX[self.image_pack() as usize] as usize
    }

    /// Induced permutation of the six edges of a tetrahedron.
    pub fn pairs(&self) -> Perm<6> {
        let mut out = [0u8; 6];
        for (e, ends) in EDGE_VERTEX.iter().enumerate() {
            out[e] = EDGE_NUMBER[self.apply(ends[0])][self.apply(ends[1])] as u8;
        }
        Perm(out)
    }

    /// Permutation sending (0,1) to the ends of edge `e` (ascending) and
    /// (2,3) to the remaining vertices (ascending).
    pub fn edge_ordering(e: usize) -> Self {
        let [a, b] = EDGE_VERTEX[e];
        let mut rest = (0..4u8).filter(|&x| x as usize != a && x as usize != b);
        let c = rest.next().unwrap_or(0);
        let d = rest.next().unwrap_or(0);
        Perm([a as u8, b as u8, c, d])
    }

    /// Permutation sending (0,1,2) to the vertices of triangle `f`
    /// (ascending) and 3 to `f`.
    pub fn triangle_ordering(f: usize) -> Self {
        let mut out = [0u8; 4];
        let mut k = 0;
        for v in 0..4u8 {
            if v as usize != f {
                out[k] = v;
                k += 1;
            }
        }
        out[3] = f as u8;
        Perm(out)
    }
}

// ---------------------------------------------------------------------------
// serde: permutations travel as their image strings, e.g. "0231"
// ---------------------------------------------------------------------------

impl<const K: usize> Serialize for Perm<K> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de, const K: usize> Deserialize<'de> for Perm<K> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl<const K: usize> core::str::FromStr for Perm<K> {
    type Err = TriError;

    fn from_str(raw: &str) -> Result<Self, TriError> {
        let digits: Vec<u8> = raw
            .chars()
            .map(|c| {
                c.to_digit(10)
                    .map(|d| d as u8)
                    .ok_or_else(|| TriError::InvalidArgument(format!("invalid permutation: {raw}")))
            })
            .collect::<Result<_, _>>()?;
        let images: [u8; K] = digits
            .try_into()
            .map_err(|_| TriError::InvalidArgument(format!("invalid permutation length: {raw}")))?;
        Self::from_images(images)
    }
}

static_assertions::assert_eq_size!(Perm4, u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_tables_agree_with_direct_computation() {
        for i in 0..24 {
            let p = Perm4::ordered_sn(i);
            assert_eq!(p.index(), i);
            assert_eq!(p.s4_index(), i);
            assert_eq!(S4[INV_S4[i] as usize], p.inverse());
        }
        for i in 0..120 {
            assert_eq!(Perm5::ordered_sn(i).index(), i);
            assert_eq!(Perm5::ordered_sn(i).ordered_index(), i);
        }
        assert_eq!(Perm3::ordered_sn(5), Perm([2, 1, 0]));
    }

    #[test]
    fn compose_applies_right_first() {
        let p = Perm4::from_images([1, 2, 3, 0]).unwrap();
        let q = Perm4::swap(0, 1);
        assert_eq!((p * q).apply(0), p.apply(1));
        assert_eq!(p * p.inverse(), Perm4::identity());
    }

    #[test]
    fn sign_and_pairs() {
        assert_eq!(Perm4::swap(2, 3).sign(), -1);
        assert_eq!(Perm4::rot(1).sign(), -1);
        assert_eq!(Perm5::rot(1).sign(), 1);
        let p = Perm4::swap(0, 3);
        assert_eq!(p.pairs().apply(EDGE_NUMBER[0][1]), EDGE_NUMBER[3][1]);
        assert_eq!(Perm4::identity().pairs(), Perm::<6>::identity());
    }

    #[test]
    fn image_pack_rejects_garbage() {
        let p = Perm5::from_images([4, 0, 3, 1, 2]).unwrap();
        assert_eq!(Perm5::from_image_pack(p.image_pack()).unwrap(), p);
        assert!(Perm4::from_image_pack(0).is_err());
        assert!(Perm4::from_image_pack(1 << 20).is_err());
        assert!(Perm4::from_images([0, 0, 1, 2]).is_err());
    }

    #[test]
    fn orderings() {
        assert_eq!(Perm4::edge_ordering(4).images(), [1, 3, 0, 2]);
        assert_eq!(Perm4::triangle_ordering(1).images(), [0, 2, 3, 1]);
        assert_eq!("0231".parse::<Perm4>().unwrap(), Perm([0, 2, 3, 1]));
    }
}
