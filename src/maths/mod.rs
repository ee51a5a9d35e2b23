//! Exact arithmetic support for the combinatorial code.
//!
//! This module provides:
//! - Small fixed-size permutations with precomputed S₄ tables
//! - Integers with a native fast path and arbitrary-precision overflow
//! - Dense integer matrices, Smith normal form and abelian groups
//! - Finite group presentations

pub mod group;
pub mod integer;
pub mod matrix;
pub mod perm;

pub use group::{GroupExpressionTerm, GroupPresentation, GroupWord};
pub use integer::{Integer, LargeInteger};
pub use matrix::{AbelianGroup, MatrixInt};
pub use perm::{Perm, Perm3, Perm4, Perm5};
