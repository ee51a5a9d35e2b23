//! Change notification for triangulations.
//!
//! Every mutation runs inside a change span. Spans nest; only the outermost
//! span notifies listeners, so a compound move reports exactly one
//! `to_be_changed` / `was_changed` pair.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use super::Triangulation;
use crate::debug_invariants::DebugInvariants;

/// Observer of triangulation mutations.
pub trait ChangeListener: Send + Sync {
    /// Called before the first change of an outermost span.
    fn to_be_changed(&self, _tri: &Triangulation) {}
    /// Called after the outermost span has finished.
    fn was_changed(&self, _tri: &Triangulation) {}
}

/// Nesting counter whose guard steps back out even if the span unwinds.
#[derive(Debug, Default)]
pub(crate) struct SpanCounter(Arc<AtomicU32>);

pub(crate) struct SpanGuard(Arc<AtomicU32>);

impl SpanCounter {
    #[inline]
    pub(crate) fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn enter(&self) -> SpanGuard {
        self.0.fetch_add(1, Ordering::AcqRel);
        SpanGuard(self.0.clone())
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Registered listeners plus the current span depth.
#[derive(Default)]
pub struct ChangeEvents {
    listeners: Vec<Arc<dyn ChangeListener>>,
    depth: SpanCounter,
}

impl core::fmt::Debug for ChangeEvents {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChangeEvents")
            .field("listeners", &self.listeners.len())
            .field("depth", &self.depth.get())
            .finish()
    }
}

impl ChangeEvents {
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    #[inline]
    pub fn count_listeners(&self) -> usize {
        self.listeners.len()
    }
}

impl Triangulation {
    /// Register a listener. The same listener may be registered once.
    pub fn listen(&mut self, listener: Arc<dyn ChangeListener>) {
        if !self
            .events
            .listeners
            .iter()
            .any(|l| Arc::ptr_eq(l, &listener))
        {
            self.events.listeners.push(listener);
        }
    }

    /// Remove a previously registered listener; returns whether it was found.
    pub fn unlisten(&mut self, listener: &Arc<dyn ChangeListener>) -> bool {
        let before = self.events.listeners.len();
        self.events.listeners.retain(|l| !Arc::ptr_eq(l, listener));
        before != self.events.listeners.len()
    }

    /// Run `f` as one atomic change, firing listeners around the outermost
    /// span only.
    pub fn change_span<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        if self.events.depth() == 0 && !self.events.listeners.is_empty() {
            let listeners = self.events.listeners.clone();
            for l in &listeners {
                l.to_be_changed(self);
            }
        }
        let guard = self.events.depth.enter();
        let out = f(self);
        drop(guard);
        if self.events.depth() == 0 {
            self.debug_assert_invariants();
            if !self.events.listeners.is_empty() {
                let listeners = self.events.listeners.clone();
                for l in &listeners {
                    l.was_changed(self);
                }
            }
        }
        out
    }

    /// Run `f` while holding a topology lock: cached topological invariants
    /// survive the mutations it performs.
    pub(crate) fn with_topology_lock<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let _lock = self.topology_lock.enter();
        f(self)
    }

    /// True while some topology-preserving operation is running.
    #[inline]
    pub fn is_topology_locked(&self) -> bool {
        self.topology_lock.get() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maths::perm::Perm4;
    use std::panic::AssertUnwindSafe;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counter {
        before: AtomicUsize,
        after: AtomicUsize,
    }

    impl ChangeListener for Counter {
        fn to_be_changed(&self, _tri: &Triangulation) {
            self.before.fetch_add(1, Ordering::SeqCst);
        }
        fn was_changed(&self, _tri: &Triangulation) {
            self.after.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn a_panicking_span_does_not_wedge_notification() {
        let counter = Arc::new(Counter::default());
        let mut tri = Triangulation::new();
        tri.listen(counter.clone());
        let unwound = std::panic::catch_unwind(AssertUnwindSafe(|| {
            tri.change_span(|t| {
                t.with_topology_lock(|t| {
                    t.new_tetrahedron();
                    if t.size() > 0 {
                        panic!("move failed half way");
                    }
                })
            })
        }));
        assert!(unwound.is_err());
        assert_eq!(tri.events.depth(), 0);
        assert!(!tri.is_topology_locked());

        let before = counter.after.load(Ordering::SeqCst);
        tri.new_tetrahedron();
        assert_eq!(counter.after.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn nested_spans_fire_once() {
        let counter = Arc::new(Counter::default());
        let mut tri = Triangulation::new();
        tri.listen(counter.clone());
        tri.change_span(|t| {
            let a = t.new_tetrahedron();
            let b = t.new_tetrahedron();
            t.join(a, 0, b, Perm4::identity()).unwrap();
        });
        assert_eq!(counter.before.load(Ordering::SeqCst), 1);
        assert_eq!(counter.after.load(Ordering::SeqCst), 1);

        tri.new_tetrahedron();
        assert_eq!(counter.after.load(Ordering::SeqCst), 2);

        let as_dyn: Arc<dyn ChangeListener> = counter.clone();
        assert!(tri.unlisten(&as_dyn));
        tri.new_tetrahedron();
        assert_eq!(counter.after.load(Ordering::SeqCst), 2);
    }
}
