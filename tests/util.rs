#![allow(dead_code)]
use std::sync::Arc;

use normcore::maths::integer::Integer;
use normcore::surfaces::{NormalAlg, NormalCoords, NormalList, NormalSurfaces};
use normcore::triangulation::Triangulation;

pub fn ints(v: &[i64]) -> Vec<Integer> {
    v.iter().map(|&x| Integer::new(x)).collect()
}

/// Embedded vertex surfaces with the default algorithm.
pub fn vertex_surfaces(tri: Triangulation, coords: NormalCoords) -> NormalSurfaces {
    NormalSurfaces::enumerate(Arc::new(tri), coords, NormalList::default(), NormalAlg::default(), None).unwrap()
}

/// Embedded fundamental surfaces.
pub fn fundamental_surfaces(tri: Triangulation, coords: NormalCoords) -> NormalSurfaces {
    NormalSurfaces::enumerate(
        Arc::new(tri),
        coords,
        NormalList::FUNDAMENTAL | NormalList::EMBEDDED_ONLY,
        NormalAlg::HilbertDual,
        None,
    )
    .unwrap()
}
