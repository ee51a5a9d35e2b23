//! Combinatorial isomorphisms between triangulations.

use core::fmt::{Display, Formatter};

use rand::Rng;

use crate::maths::perm::{Perm4, S4};
use crate::tri_error::TriError;

use super::{Gluing, Tetrahedron, Triangulation, facet_lock, SIMPLEX_LOCK};

/// Relabelling of tetrahedra and their vertices: tetrahedron `t` becomes
/// `simp_image[t]`, and vertex `i` of `t` becomes vertex `facet_perm[t][i]`
/// of the image.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Isomorphism {
    pub simp_image: Vec<usize>,
    pub facet_perm: Vec<Perm4>,
}

impl Isomorphism {
    pub fn identity(n: usize) -> Self {
        Self {
            simp_image: (0..n).collect(),
            facet_perm: vec![Perm4::identity(); n],
        }
    }

    /// Build from explicit data, checking that `simp_image` is a bijection.
    pub fn new(simp_image: Vec<usize>, facet_perm: Vec<Perm4>) -> Result<Self, TriError> {
        let n = simp_image.len();
        if facet_perm.len() != n {
            return Err(TriError::InvalidArgument(
                "isomorphism arrays have different lengths".into(),
            ));
        }
        let mut seen = vec![false; n];
        for &i in &simp_image {
            if i >= n || seen[i] {
                return Err(TriError::InvalidArgument(format!(
                    "{simp_image:?} is not a permutation"
                )));
            }
            seen[i] = true;
        }
        Ok(Self {
            simp_image,
            facet_perm,
        })
    }

    /// Uniformly random isomorphism on `n` tetrahedra.
    pub fn random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        let mut image: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = rng.gen_range(0..=i);
            image.swap(i, j);
        }
        let facet_perm = (0..n).map(|_| S4[rng.gen_range(0..24)]).collect();
        Self {
            simp_image: image,
            facet_perm,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.simp_image.len()
    }

    pub fn inverse(&self) -> Self {
        let n = self.size();
        let mut simp_image = vec![0; n];
        let mut facet_perm = vec![Perm4::identity(); n];
        for t in 0..n {
            simp_image[self.simp_image[t]] = t;
            facet_perm[self.simp_image[t]] = self.facet_perm[t].inverse();
        }
        Self {
            simp_image,
            facet_perm,
        }
    }

    /// `self ∘ other`: apply `other` first.
    pub fn compose(&self, other: &Isomorphism) -> Self {
        let simp_image = other
            .simp_image
            .iter()
            .map(|&i| self.simp_image[i])
            .collect();
        let facet_perm = (0..other.size())
            .map(|t| self.facet_perm[other.simp_image[t]] * other.facet_perm[t])
            .collect();
        Self {
            simp_image,
            facet_perm,
        }
    }

    fn check_size(&self, tri: &Triangulation) -> Result<(), TriError> {
        if tri.size() != self.size() {
            return Err(TriError::InvalidArgument(format!(
                "isomorphism on {} tetrahedra applied to {}",
                self.size(),
                tri.size()
            )));
        }
        Ok(())
    }

    fn relabelled(&self, tri: &Triangulation) -> Vec<Tetrahedron> {
        let mut out = vec![Tetrahedron::new(); tri.size()];
        for (t, tet) in tri.tetrahedra().iter().enumerate() {
            let img = self.simp_image[t];
            let fp = self.facet_perm[t];
            let dest = &mut out[img];
            dest.description = tet.description.clone();
            dest.locks = tet.locks & SIMPLEX_LOCK;
            for f in 0..4 {
                if tet.is_facet_locked(f) {
                    dest.locks |= facet_lock(fp.apply(f));
                }
                if let Some(g) = tet.adjacent(f) {
                    let perm = self.facet_perm[g.tet] * g.perm * fp.inverse();
                    dest.adj[fp.apply(f)] = Some(Gluing::new(self.simp_image[g.tet], perm));
                }
            }
        }
        out
    }

    /// The image of `tri` under this isomorphism.
    pub fn apply(&self, tri: &Triangulation) -> Result<Triangulation, TriError> {
        self.check_size(tri)?;
        let tets = self.relabelled(tri);
        let mut out = Triangulation::new();
        out.replace_tetrahedra(tets);
        Ok(out)
    }

    /// Relabel `tri` in place. Topological properties are preserved.
    pub fn apply_in_place(&self, tri: &mut Triangulation) -> Result<(), TriError> {
        self.check_size(tri)?;
        self.relabel(tri);
        Ok(())
    }

    /// In-place relabelling for isomorphisms built from `tri` itself.
    pub(crate) fn relabel(&self, tri: &mut Triangulation) {
        let tets = self.relabelled(tri);
        tri.topology_preserving(|t| t.replace_tetrahedra(tets));
    }
}

impl Display for Isomorphism {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let parts: Vec<String> = self
            .simp_image
            .iter()
            .zip(&self.facet_perm)
            .enumerate()
            .map(|(t, (i, p))| format!("{t} -> {i} ({p})"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::example;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn inverse_and_compose() {
        let mut rng = SmallRng::seed_from_u64(7);
        let iso = Isomorphism::random(5, &mut rng);
        assert_eq!(iso.compose(&iso.inverse()), Isomorphism::identity(5));
        assert_eq!(iso.inverse().compose(&iso), Isomorphism::identity(5));
    }

    #[test]
    fn relabelling_preserves_structure() {
        let tri = example::poincare_homology_sphere();
        let mut rng = SmallRng::seed_from_u64(11);
        let iso = Isomorphism::random(tri.size(), &mut rng);
        let image = iso.apply(&tri).unwrap();
        assert_eq!(image.count_edges(), tri.count_edges());
        assert_eq!(image.count_vertices(), tri.count_vertices());
        assert!(image.homology().is_trivial());
        let back = iso.inverse().apply(&image).unwrap();
        assert!(back.is_identical_to(&tri));
    }
}
