//! Cache invalidation utilities shared by the triangulation and the
//! structures derived from it.

use once_cell::sync::OnceCell;

use crate::maths::group::GroupPresentation;
use crate::maths::matrix::AbelianGroup;

/// Anything that caches derived data (skeleta, invariants, signatures, …)
/// should implement this.
pub trait InvalidateCache {
    /// Invalidate *all* internal caches so future queries recompute correctly.
    fn invalidate_cache(&mut self);
}

// Blanket impl for Box<T>
impl<T: InvalidateCache + ?Sized> InvalidateCache for Box<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}

/// Write-once slots for computed properties of a triangulation.
///
/// Topological slots depend only on the underlying manifold and survive
/// mutations performed under a topology lock. Combinatorial slots depend on
/// the exact gluings and are cleared by every mutation.
#[derive(Clone, Debug, Default)]
pub struct PropertyCache {
    // topological
    pub homology: OnceCell<AbelianGroup>,
    pub homology_rel: OnceCell<AbelianGroup>,
    pub homology_bdry: OnceCell<AbelianGroup>,
    pub fundamental_group: OnceCell<GroupPresentation>,
    pub zero_efficient: OnceCell<bool>,
    pub splitting_surface: OnceCell<bool>,
    pub handlebody_genus: OnceCell<Option<usize>>,
    pub three_sphere: OnceCell<bool>,
    pub ball: OnceCell<bool>,
    pub irreducible: OnceCell<bool>,
    pub haken: OnceCell<bool>,
    pub txi: OnceCell<bool>,
    pub compressing_disc: OnceCell<bool>,

    // combinatorial
    pub iso_sig: OnceCell<String>,
}

impl PropertyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the slots that depend on the exact gluings.
    pub fn clear_combinatorial(&mut self) {
        self.iso_sig = OnceCell::new();
        // 0-efficiency and splitting surfaces are properties of the
        // triangulation, not of the manifold.
        self.zero_efficient = OnceCell::new();
        self.splitting_surface = OnceCell::new();
    }

    /// Clear the slots that depend only on the manifold.
    pub fn clear_topological(&mut self) {
        self.homology = OnceCell::new();
        self.homology_rel = OnceCell::new();
        self.homology_bdry = OnceCell::new();
        self.fundamental_group = OnceCell::new();
        self.handlebody_genus = OnceCell::new();
        self.three_sphere = OnceCell::new();
        self.ball = OnceCell::new();
        self.irreducible = OnceCell::new();
        self.haken = OnceCell::new();
        self.txi = OnceCell::new();
        self.compressing_disc = OnceCell::new();
    }

    /// True if any topological property has been computed.
    pub fn has_topological(&self) -> bool {
        self.homology.get().is_some()
            || self.fundamental_group.get().is_some()
            || self.three_sphere.get().is_some()
    }
}

impl InvalidateCache for PropertyCache {
    fn invalidate_cache(&mut self) {
        self.clear_combinatorial();
        self.clear_topological();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearing_respects_slot_kind() {
        let mut cache = PropertyCache::new();
        cache.homology.set(AbelianGroup::trivial()).unwrap();
        cache.iso_sig.set("a".into()).unwrap();
        cache.clear_combinatorial();
        assert!(cache.homology.get().is_some());
        assert!(cache.iso_sig.get().is_none());
        let mut boxed: Box<PropertyCache> = Box::new(cache);
        boxed.invalidate_cache();
        assert!(!boxed.has_topological());
    }
}
