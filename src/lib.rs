#![cfg_attr(docsrs, feature(doc_cfg))]
//! # normcore
//!
//! normcore is a library for normal surface theory on 3-manifold
//! triangulations. It builds triangulations out of glued tetrahedra, derives
//! their skeleta and invariants, simplifies them with local moves, and
//! enumerates and analyses normal and almost normal surfaces with exact
//! integer arithmetic.
//!
//! ## Features
//! - Tetrahedra glued by permutations of S₄, with lazily computed skeleta,
//!   boundary components, homology and fundamental groups
//! - Pachner, collapse, book and ordering moves with lock-aware rollback,
//!   plus greedy and randomised simplification
//! - Isomorphism signatures, canonical relabelling and isomorphism tests
//! - Standard, quadrilateral and octagonal coordinate systems, including
//!   spun surfaces in ideal triangulations
//! - Vertex enumeration by double description or quad-to-standard
//!   conversion, and Hilbert bases for fundamental surfaces
//! - Surface recognition, crushing, cutting and compression tests, and
//!   3-sphere, ball and handlebody recognition built on them
//!
//! ## Determinism
//!
//! Enumeration returns surfaces in lexicographic order of their vectors.
//! Randomised simplification takes a `SmallRng` seed from
//! [`moves::SimplifyConfig`] so runs are reproducible.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! normcore = "0.4"
//! # Optional features:
//! # features = ["rayon", "check-invariants"]
//! ```

pub mod debug_invariants;
pub mod enumerate;
pub mod maths;
pub mod moves;
pub mod progress;
pub mod snappea;
pub mod surfaces;
pub mod tri_error;
pub mod triangulation;

pub use debug_invariants::DebugInvariants;
pub use tri_error::TriError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::maths::{AbelianGroup, GroupPresentation, Integer, LargeInteger, MatrixInt, Perm4};
    pub use crate::moves::SimplifyConfig;
    pub use crate::progress::ProgressTracker;
    pub use crate::snappea::CuspSlopes;
    pub use crate::surfaces::{
        CsvFields, EnumerationConfig, NormalAlg, NormalCoords, NormalList, NormalSurface, NormalSurfaces,
        PropertyFilter, SurfaceFilter,
    };
    pub use crate::tri_error::TriError;
    pub use crate::triangulation::{CloneOptions, IsoSigKind, Isomorphism, Triangulation, example};
}
