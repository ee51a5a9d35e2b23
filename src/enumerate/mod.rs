//! Exact enumeration over the cone of non-negative solutions to the
//! matching equations.
//!
//! All routines work on plain integer vectors and a [`MatrixInt`] of
//! hyperplanes; the surface layer wraps the results. Rays are always
//! primitive (gcd 1) and returned in lexicographic order, so repeated runs
//! agree exactly.
//!
//! [`MatrixInt`]: crate::maths::matrix::MatrixInt

pub mod double_description;
pub mod hilbert;
pub mod quad_to_standard;

pub use double_description::vertex_rays;
pub use hilbert::hilbert_basis;
pub use quad_to_standard::quad_to_standard;

use crate::maths::integer::{Integer, scale_down};

// ---------------------------------------------------------------------------
// Zero sets
// ---------------------------------------------------------------------------

/// Positions at which a vector vanishes, as a packed bit set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ZeroSet {
    words: Vec<u64>,
}

impl ZeroSet {
    pub fn empty(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
        }
    }

    pub fn of(v: &[Integer]) -> Self {
        let mut z = Self::empty(v.len());
        for (i, x) in v.iter().enumerate() {
            if x.is_zero() {
                z.insert(i);
            }
        }
        z
    }

    #[inline]
    pub fn insert(&mut self, i: usize) {
        self.words[i / 64] |= 1 << (i % 64);
    }

    #[inline]
    pub fn remove(&mut self, i: usize) {
        self.words[i / 64] &= !(1 << (i % 64));
    }

    #[inline]
    pub fn contains(&self, i: usize) -> bool {
        self.words[i / 64] & (1 << (i % 64)) != 0
    }

    pub fn intersection(&self, other: &ZeroSet) -> ZeroSet {
        ZeroSet {
            words: self.words.iter().zip(&other.words).map(|(a, b)| a & b).collect(),
        }
    }

    pub fn is_subset(&self, other: &ZeroSet) -> bool {
        self.words.iter().zip(&other.words).all(|(a, b)| a & !b == 0)
    }

    /// `self ⊆ other ∪ extra`.
    pub fn is_subset_with(&self, other: &ZeroSet, extra: &ZeroSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .zip(&extra.words)
            .all(|((a, b), e)| a & !(b | e) == 0)
    }

    /// Number of positions in `self` but not in `ignore`.
    pub fn count_outside(&self, ignore: &ZeroSet) -> usize {
        self.words
            .iter()
            .zip(&ignore.words)
            .map(|(a, i)| (a & !i).count_ones() as usize)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Rays
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub(crate) struct Ray {
    pub coords: Vec<Integer>,
    pub zeros: ZeroSet,
}

impl Ray {
    pub fn new(mut coords: Vec<Integer>) -> Self {
        scale_down(&mut coords);
        let zeros = ZeroSet::of(&coords);
        Self { coords, zeros }
    }

    pub fn unit(dim: usize, i: usize) -> Self {
        let mut coords = vec![Integer::ZERO; dim];
        coords[i] = Integer::ONE;
        Self::new(coords)
    }

    pub fn dot(&self, row: &[Integer]) -> Integer {
        dot(&self.coords, row)
    }

    #[inline]
    pub fn positive(&self, i: usize) -> bool {
        !self.zeros.contains(i)
    }

    /// The primitive positive combination of `pos` and `neg` that vanishes
    /// where `pos` takes value `dp > 0` and `neg` takes value `dn < 0`.
    pub fn combine(pos: &Ray, dp: &Integer, neg: &Ray, dn: &Integer) -> Ray {
        let coords = pos
            .coords
            .iter()
            .zip(&neg.coords)
            .map(|(a, b)| &(b * dp) - &(a * dn))
            .collect();
        Ray::new(coords)
    }
}

pub(crate) fn dot(v: &[Integer], row: &[Integer]) -> Integer {
    let mut acc = Integer::ZERO;
    for (a, b) in v.iter().zip(row) {
        if !a.is_zero() && !b.is_zero() {
            acc += &(a * b);
        }
    }
    acc
}

/// Percentage of `done` out of `total`, for progress reporting.
#[inline]
pub(crate) fn percent(done: usize, total: usize) -> f64 {
    if total == 0 { 100.0 } else { 100.0 * done as f64 / total as f64 }
}
