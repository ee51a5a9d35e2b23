//! Local modifications of a triangulation.
//!
//! Every move is a method on [`Triangulation`] of the form
//! `fn xxx(&mut self, .., check: bool, perform: bool) -> Result<bool, TriError>`.
//! With `check` set the move first verifies that it is legal and returns
//! `Ok(false)` without touching anything if not. With `perform` unset the
//! call is a pure predicate. A move that would remove or reglue a locked
//! tetrahedron or facet fails with [`TriError::LockViolation`] before any
//! change is made.
//!
//! Moves that preserve the underlying manifold run under a topology lock,
//! so cached homology and recognition results survive them.

pub mod book;
pub mod collapse;
pub mod local;
pub mod order;
pub mod pachner;
pub mod simplify;

pub use simplify::SimplifyConfig;

use crate::maths::perm::Perm4;
use crate::tri_error::TriError;
use crate::triangulation::Triangulation;

impl Triangulation {
    /// One event span holding a topology lock.
    pub(crate) fn topology_preserving<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.change_span(|tri| tri.with_topology_lock(f))
    }

    pub(crate) fn check_edge_index(&self, e: usize) -> Result<(), TriError> {
        if e < self.count_edges() {
            Ok(())
        } else {
            Err(TriError::InvalidArgument(format!(
                "edge {e} out of range ({} edges)",
                self.count_edges()
            )))
        }
    }

    pub(crate) fn check_vertex_index(&self, v: usize) -> Result<(), TriError> {
        if v < self.count_vertices() {
            Ok(())
        } else {
            Err(TriError::InvalidArgument(format!(
                "vertex {v} out of range ({} vertices)",
                self.count_vertices()
            )))
        }
    }

    pub(crate) fn check_triangle_index(&self, f: usize) -> Result<(), TriError> {
        if f < self.count_triangles() {
            Ok(())
        } else {
            Err(TriError::InvalidArgument(format!(
                "triangle {f} out of range ({} triangles)",
                self.count_triangles()
            )))
        }
    }

    pub(crate) fn check_tet_index(&self, t: usize) -> Result<(), TriError> {
        if t < self.size() {
            Ok(())
        } else {
            Err(TriError::InvalidArgument(format!(
                "tetrahedron {t} out of range (size {})",
                self.size()
            )))
        }
    }

    /// `LockViolation` if any of the given tetrahedra carries a lock.
    pub(crate) fn ensure_all_removable(&self, tets: &[usize]) -> Result<(), TriError> {
        tets.iter().try_for_each(|&t| self.ensure_removable(t))
    }
}

/// Vertex-role permutation of a vertex embedding: maps 0 to the vertex and
/// 1, 2, 3 to the remaining vertices in increasing order.
pub(crate) fn vertex_ordering(v: usize) -> Perm4 {
    let mut image = [v as u8, 0, 0, 0];
    let mut next = 1;
    for i in 0..4u8 {
        if i as usize != v {
            image[next] = i;
            next += 1;
        }
    }
    Perm4::new_unchecked(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_orderings_start_at_the_vertex() {
        for v in 0..4 {
            let p = vertex_ordering(v);
            assert_eq!(p.apply(0), v);
            assert!(p.apply(1) < p.apply(2) && p.apply(2) < p.apply(3));
        }
    }
}
