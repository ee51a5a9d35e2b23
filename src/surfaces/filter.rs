//! Predicates for picking surfaces out of a list.

use serde::{Deserialize, Serialize};

use crate::surfaces::NormalSurface;

/// Conditions on basic properties of a surface. Unset conditions accept
/// everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFilter {
    /// Allowed Euler characteristics; empty means any.
    pub euler: Vec<i64>,
    pub orientable: Option<bool>,
    pub compact: Option<bool>,
    pub real_boundary: Option<bool>,
    pub two_sided: Option<bool>,
}

impl PropertyFilter {
    pub fn euler(mut self, values: impl IntoIterator<Item = i64>) -> Self {
        self.euler.extend(values);
        self
    }

    pub fn orientable(mut self, yes: bool) -> Self {
        self.orientable = Some(yes);
        self
    }

    pub fn compact(mut self, yes: bool) -> Self {
        self.compact = Some(yes);
        self
    }

    pub fn real_boundary(mut self, yes: bool) -> Self {
        self.real_boundary = Some(yes);
        self
    }

    pub fn two_sided(mut self, yes: bool) -> Self {
        self.two_sided = Some(yes);
        self
    }

    /// Spun surfaces have no Euler characteristic, orientability or
    /// sidedness here, so any condition on those rejects them.
    fn accepts(&self, s: &NormalSurface) -> bool {
        if self.compact.is_some_and(|c| c != s.is_compact()) {
            return false;
        }
        if self.real_boundary.is_some_and(|b| b != s.has_real_boundary()) {
            return false;
        }
        if !self.euler.is_empty() {
            match s.euler_char() {
                Ok(chi) if self.euler.iter().any(|&e| chi == e) => {}
                _ => return false,
            }
        }
        if let Some(want) = self.orientable {
            if s.is_orientable().ok() != Some(want) {
                return false;
            }
        }
        if let Some(want) = self.two_sided {
            if s.is_two_sided().ok() != Some(want) {
                return false;
            }
        }
        true
    }
}

/// A filter tree: property leaves combined by conjunction and disjunction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceFilter {
    Properties(PropertyFilter),
    /// Accepts when every child does (so an empty `And` accepts all).
    And(Vec<SurfaceFilter>),
    /// Accepts when some child does (so an empty `Or` accepts none).
    Or(Vec<SurfaceFilter>),
}

impl SurfaceFilter {
    pub fn accepts(&self, s: &NormalSurface) -> bool {
        match self {
            SurfaceFilter::Properties(p) => p.accepts(s),
            SurfaceFilter::And(children) => children.iter().all(|c| c.accepts(s)),
            SurfaceFilter::Or(children) => children.iter().any(|c| c.accepts(s)),
        }
    }
}

impl From<PropertyFilter> for SurfaceFilter {
    fn from(p: PropertyFilter) -> Self {
        SurfaceFilter::Properties(p)
    }
}
