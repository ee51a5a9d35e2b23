//! Arbitrary-precision integers with a native fast path.
//!
//! [`Integer`] keeps values in an `i64` while they fit and falls back to
//! [`num_bigint::BigInt`] on overflow. Results are demoted back to the
//! native form whenever possible, so equality and hashing never depend on
//! the internal representation.
//!
//! [`LargeInteger`] adds a single positive infinity, used by normal surface
//! coordinates of non-compact (spun) surfaces.

use core::cmp::Ordering;
use core::fmt::{Debug, Display, Formatter};
use core::hash::{Hash, Hasher};
use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Rem, Sub, SubAssign};
use core::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer as _;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::tri_error::TriError;

/// Signed integer of unbounded size.
#[derive(Clone)]
pub enum Integer {
    Native(i64),
    Large(Box<BigInt>),
}

impl Integer {
    pub const ZERO: Integer = Integer::Native(0);
    pub const ONE: Integer = Integer::Native(1);

    #[inline]
    pub fn new(v: i64) -> Self {
        Integer::Native(v)
    }

    fn from_big(b: BigInt) -> Self {
        match b.to_i64() {
            Some(v) => Integer::Native(v),
            None => Integer::Large(Box::new(b)),
        }
    }

    /// Arbitrary-precision view of the value.
    pub fn to_big(&self) -> BigInt {
        match self {
            Integer::Native(v) => BigInt::from(*v),
            Integer::Large(b) => (**b).clone(),
        }
    }

    /// True while the value is stored natively.
    #[inline]
    pub fn is_native(&self) -> bool {
        matches!(self, Integer::Native(_))
    }

    /// Native value, if it fits.
    #[inline]
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Integer::Native(v) => Some(*v),
            Integer::Large(b) => b.to_i64(),
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        matches!(self, Integer::Native(0))
    }

    /// -1, 0 or 1.
    pub fn sign(&self) -> i32 {
        match self {
            Integer::Native(v) => v.signum() as i32,
            Integer::Large(b) => {
                if b.is_negative() {
                    -1
                } else if b.is_zero() {
                    0
                } else {
                    1
                }
            }
        }
    }

    pub fn abs(&self) -> Integer {
        match self {
            Integer::Native(v) => match v.checked_abs() {
                Some(a) => Integer::Native(a),
                None => Integer::from_big(BigInt::from(*v).abs()),
            },
            Integer::Large(b) => Integer::from_big(b.abs()),
        }
    }

    /// Non-negative greatest common divisor; `gcd(0, 0) = 0`.
    pub fn gcd(&self, other: &Integer) -> Integer {
        if let (Integer::Native(a), Integer::Native(b)) = (self, other) {
            if let (Some(mut x), Some(mut y)) = (a.checked_abs(), b.checked_abs()) {
                while y != 0 {
                    let t = x % y;
                    x = y;
                    y = t;
                }
                return Integer::Native(x);
            }
        }
        Integer::from_big(self.to_big().gcd(&other.to_big()))
    }

    /// Non-negative least common multiple.
    pub fn lcm(&self, other: &Integer) -> Integer {
        if self.is_zero() || other.is_zero() {
            return Integer::ZERO;
        }
        let g = self.gcd(other);
        (self.div_exact(&g) * other).abs()
    }

    /// Division where the caller knows `other` divides `self`.
    pub fn div_exact(&self, other: &Integer) -> Integer {
        if let (Integer::Native(a), Integer::Native(b)) = (self, other) {
            if let Some(q) = a.checked_div(*b) {
                return Integer::Native(q);
            }
        }
        Integer::from_big(self.to_big() / other.to_big())
    }

    /// Euclidean division: `self = q * d + r` with `0 <= r < |d|`.
    pub fn div_mod(&self, d: &Integer) -> Result<(Integer, Integer), TriError> {
        if d.is_zero() {
            return Err(TriError::InvalidArgument("division by zero".into()));
        }
        if let (Integer::Native(a), Integer::Native(b)) = (self, d) {
            if let (Some(q), Some(r)) = (a.checked_div_euclid(*b), a.checked_rem_euclid(*b)) {
                return Ok((Integer::Native(q), Integer::Native(r)));
            }
        }
        let (a, b) = (self.to_big(), d.to_big());
        let mut r = a.mod_floor(&b);
        if r.is_negative() {
            r += b.abs();
        }
        let q = (&a - &r) / &b;
        Ok((Integer::from_big(q), Integer::from_big(r)))
    }

    /// Extended gcd: returns `(g, u, v)` with `u*self + v*other = g >= 0`.
    pub fn gcd_with_coeffs(&self, other: &Integer) -> (Integer, Integer, Integer) {
        let ext = self.to_big().extended_gcd(&other.to_big());
        let (mut g, mut u, mut v) = (ext.gcd, ext.x, ext.y);
        if g.is_negative() {
            g = -g;
            u = -u;
            v = -v;
        }
        (Integer::from_big(g), Integer::from_big(u), Integer::from_big(v))
    }
}

impl Default for Integer {
    fn default() -> Self {
        Integer::ZERO
    }
}

impl From<i64> for Integer {
    fn from(v: i64) -> Self {
        Integer::Native(v)
    }
}

impl From<i32> for Integer {
    fn from(v: i32) -> Self {
        Integer::Native(v as i64)
    }
}

impl From<usize> for Integer {
    fn from(v: usize) -> Self {
        match i64::try_from(v) {
            Ok(x) => Integer::Native(x),
            Err(_) => Integer::from_big(BigInt::from(v)),
        }
    }
}

impl From<BigInt> for Integer {
    fn from(v: BigInt) -> Self {
        Integer::from_big(v)
    }
}

impl PartialEq for Integer {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Integer::Native(a), Integer::Native(b)) => a == b,
            // Large values never fit natively, so mixed forms differ.
            (Integer::Large(a), Integer::Large(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Integer {}

impl PartialEq<i64> for Integer {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, Integer::Native(v) if v == other)
    }
}

impl Hash for Integer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Integer::Native(v) => v.hash(state),
            Integer::Large(b) => b.hash(state),
        }
    }
}

impl Ord for Integer {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Integer::Native(a), Integer::Native(b)) => a.cmp(b),
            _ => self.to_big().cmp(&other.to_big()),
        }
    }
}

impl PartialOrd for Integer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialOrd<i64> for Integer {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        Some(match self {
            Integer::Native(v) => v.cmp(other),
            Integer::Large(b) => (**b).cmp(&BigInt::from(*other)),
        })
    }
}

impl Debug for Integer {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Integer::Native(v) => write!(f, "{v}"),
            Integer::Large(b) => write!(f, "{b}"),
        }
    }
}

impl FromStr for Integer {
    type Err = TriError;

    fn from_str(raw: &str) -> Result<Self, TriError> {
        let t = raw.trim();
        if let Ok(v) = t.parse::<i64>() {
            return Ok(Integer::Native(v));
        }
        t.parse::<BigInt>()
            .map(Integer::from_big)
            .map_err(|_| TriError::InvalidArgument(format!("invalid integer: {raw}")))
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

macro_rules! integer_binop {
    ($trait:ident, $method:ident, $checked:ident, $big:tt) => {
        impl<'a> $trait<&'a Integer> for &'a Integer {
            type Output = Integer;
            #[inline]
            fn $method(self, rhs: &'a Integer) -> Integer {
                if let (Integer::Native(a), Integer::Native(b)) = (self, rhs) {
                    if let Some(v) = a.$checked(*b) {
                        return Integer::Native(v);
                    }
                }
                Integer::from_big(self.to_big() $big rhs.to_big())
            }
        }
        impl $trait<Integer> for Integer {
            type Output = Integer;
            #[inline]
            fn $method(self, rhs: Integer) -> Integer {
                (&self).$method(&rhs)
            }
        }
        impl<'a> $trait<&'a Integer> for Integer {
            type Output = Integer;
            #[inline]
            fn $method(self, rhs: &'a Integer) -> Integer {
                (&self).$method(rhs)
            }
        }
        impl $trait<i64> for Integer {
            type Output = Integer;
            #[inline]
            fn $method(self, rhs: i64) -> Integer {
                (&self).$method(&Integer::Native(rhs))
            }
        }
    };
}

integer_binop!(Add, add, checked_add, +);
integer_binop!(Sub, sub, checked_sub, -);
integer_binop!(Mul, mul, checked_mul, *);
integer_binop!(Div, div, checked_div, /);
integer_binop!(Rem, rem, checked_rem, %);

impl AddAssign<&Integer> for Integer {
    fn add_assign(&mut self, rhs: &Integer) {
        *self = &*self + rhs;
    }
}

impl AddAssign<Integer> for Integer {
    fn add_assign(&mut self, rhs: Integer) {
        *self = &*self + &rhs;
    }
}

impl SubAssign<&Integer> for Integer {
    fn sub_assign(&mut self, rhs: &Integer) {
        *self = &*self - rhs;
    }
}

impl MulAssign<&Integer> for Integer {
    fn mul_assign(&mut self, rhs: &Integer) {
        *self = &*self * rhs;
    }
}

impl Neg for Integer {
    type Output = Integer;
    fn neg(self) -> Integer {
        match self {
            Integer::Native(v) => match v.checked_neg() {
                Some(n) => Integer::Native(n),
                None => Integer::from_big(-BigInt::from(v)),
            },
            Integer::Large(b) => Integer::from_big(-*b),
        }
    }
}

impl Neg for &Integer {
    type Output = Integer;
    fn neg(self) -> Integer {
        -(self.clone())
    }
}

impl Zero for Integer {
    fn zero() -> Self {
        Integer::ZERO
    }
    fn is_zero(&self) -> bool {
        Integer::is_zero(self)
    }
}

impl One for Integer {
    fn one() -> Self {
        Integer::ONE
    }
}

impl core::iter::Sum for Integer {
    fn sum<I: Iterator<Item = Integer>>(iter: I) -> Integer {
        iter.fold(Integer::ZERO, |acc, x| acc + x)
    }
}

impl<'a> core::iter::Sum<&'a Integer> for Integer {
    fn sum<I: Iterator<Item = &'a Integer>>(iter: I) -> Integer {
        iter.fold(Integer::ZERO, |acc, x| acc + x)
    }
}

// ---------------------------------------------------------------------------
// LargeInteger: Integer plus infinity
// ---------------------------------------------------------------------------

/// An [`Integer`] or positive infinity.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum LargeInteger {
    Finite(Integer),
    Infinity,
}

impl LargeInteger {
    pub const ZERO: LargeInteger = LargeInteger::Finite(Integer::ZERO);
    pub const ONE: LargeInteger = LargeInteger::Finite(Integer::ONE);

    #[inline]
    pub fn is_infinite(&self) -> bool {
        matches!(self, LargeInteger::Infinity)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        matches!(self, LargeInteger::Finite(v) if v.is_zero())
    }

    #[inline]
    pub fn finite(&self) -> Option<&Integer> {
        match self {
            LargeInteger::Finite(v) => Some(v),
            LargeInteger::Infinity => None,
        }
    }

    /// Finite value or a `FailedPrecondition` naming `what`.
    pub fn require_finite(&self, what: &str) -> Result<&Integer, TriError> {
        self.finite()
            .ok_or_else(|| TriError::FailedPrecondition(format!("{what} is infinite")))
    }
}

impl Default for LargeInteger {
    fn default() -> Self {
        LargeInteger::ZERO
    }
}

impl From<Integer> for LargeInteger {
    fn from(v: Integer) -> Self {
        LargeInteger::Finite(v)
    }
}

impl From<i64> for LargeInteger {
    fn from(v: i64) -> Self {
        LargeInteger::Finite(Integer::Native(v))
    }
}

impl Ord for LargeInteger {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (LargeInteger::Finite(a), LargeInteger::Finite(b)) => a.cmp(b),
            (LargeInteger::Finite(_), LargeInteger::Infinity) => Ordering::Less,
            (LargeInteger::Infinity, LargeInteger::Finite(_)) => Ordering::Greater,
            (LargeInteger::Infinity, LargeInteger::Infinity) => Ordering::Equal,
        }
    }
}

impl PartialOrd for LargeInteger {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add<&LargeInteger> for &LargeInteger {
    type Output = LargeInteger;
    fn add(self, rhs: &LargeInteger) -> LargeInteger {
        match (self, rhs) {
            (LargeInteger::Finite(a), LargeInteger::Finite(b)) => LargeInteger::Finite(a + b),
            _ => LargeInteger::Infinity,
        }
    }
}

impl Add for LargeInteger {
    type Output = LargeInteger;
    fn add(self, rhs: LargeInteger) -> LargeInteger {
        &self + &rhs
    }
}

impl AddAssign<&LargeInteger> for LargeInteger {
    fn add_assign(&mut self, rhs: &LargeInteger) {
        *self = &*self + rhs;
    }
}

impl Mul<&Integer> for &LargeInteger {
    type Output = LargeInteger;
    fn mul(self, rhs: &Integer) -> LargeInteger {
        match self {
            LargeInteger::Finite(a) => LargeInteger::Finite(a * rhs),
            LargeInteger::Infinity if rhs.is_zero() => LargeInteger::ZERO,
            LargeInteger::Infinity => LargeInteger::Infinity,
        }
    }
}

impl Debug for LargeInteger {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for LargeInteger {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            LargeInteger::Finite(v) => Display::fmt(v, f),
            LargeInteger::Infinity => write!(f, "inf"),
        }
    }
}

impl FromStr for LargeInteger {
    type Err = TriError;

    fn from_str(raw: &str) -> Result<Self, TriError> {
        if raw.trim() == "inf" {
            Ok(LargeInteger::Infinity)
        } else {
            raw.parse().map(LargeInteger::Finite)
        }
    }
}

/// Gcd of a slice (0 for an empty or all-zero slice).
pub fn gcd_of(values: &[Integer]) -> Integer {
    values.iter().fold(Integer::ZERO, |g, v| {
        if g == 1 { g } else { g.gcd(v) }
    })
}

/// Divide a vector through by the gcd of its entries.
pub fn scale_down(values: &mut [Integer]) {
    let g = gcd_of(values);
    if g.is_zero() || g == 1 {
        return;
    }
    for v in values.iter_mut() {
        *v = v.div_exact(&g);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_promotes_and_demotes() {
        let big = Integer::new(i64::MAX) + Integer::new(1);
        assert!(!big.is_native());
        let back = big - Integer::new(1);
        assert!(back.is_native());
        assert_eq!(back, Integer::new(i64::MAX));
        let sq = Integer::new(i64::MIN) * Integer::new(-1);
        assert_eq!(sq.to_string(), "9223372036854775808");
    }

    #[test]
    fn compares_against_machine_literals() {
        assert!(Integer::new(2) >= 2);
        assert!(Integer::new(-1) < 0);
        let big = Integer::new(i64::MAX) + Integer::new(1);
        assert!(big > i64::MAX);
        assert!(-big < i64::MIN + 1);
    }

    #[test]
    fn euclidean_division() {
        let (q, r) = Integer::new(-7).div_mod(&Integer::new(3)).unwrap();
        assert_eq!((q, r), (Integer::new(-3), Integer::new(2)));
        let (q, r) = Integer::new(7).div_mod(&Integer::new(-3)).unwrap();
        assert_eq!((q, r), (Integer::new(-2), Integer::new(1)));
        assert!(Integer::new(1).div_mod(&Integer::ZERO).is_err());
    }

    #[test]
    fn gcd_lcm_and_coefficients() {
        assert_eq!(Integer::new(-12).gcd(&Integer::new(18)), Integer::new(6));
        assert_eq!(Integer::new(4).lcm(&Integer::new(6)), Integer::new(12));
        let (g, u, v) = Integer::new(240).gcd_with_coeffs(&Integer::new(46));
        assert_eq!(g, Integer::new(2));
        assert_eq!(u * Integer::new(240) + v * Integer::new(46), g);
    }

    #[test]
    fn infinity_orders_last() {
        let mut v = vec![LargeInteger::Infinity, LargeInteger::from(3), LargeInteger::ZERO];
        v.sort();
        assert_eq!(v[2], LargeInteger::Infinity);
        assert!((&LargeInteger::from(1) + &LargeInteger::Infinity).is_infinite());
        assert_eq!("inf".parse::<LargeInteger>().unwrap(), LargeInteger::Infinity);
    }

    #[test]
    fn scale_down_vector() {
        let mut v = vec![Integer::new(4), Integer::ZERO, Integer::new(-6)];
        scale_down(&mut v);
        assert_eq!(v, vec![Integer::new(2), Integer::ZERO, Integer::new(-3)]);
    }
}
