mod util;

use std::ops::ControlFlow;
use std::sync::Arc;

use normcore::enumerate::{quad_to_standard, vertex_rays};
use normcore::maths::integer::LargeInteger;
use normcore::progress::ProgressTracker;
use normcore::surfaces::matching::{make_embedded_constraints, make_matching_equations};
use normcore::surfaces::{EnumerationConfig, NormalAlg, NormalCoords, NormalList, NormalSurfaces};
use normcore::tri_error::TriError;
use normcore::triangulation::{CloneOptions, Triangulation, example};
use util::{fundamental_surfaces, vertex_surfaces};

fn standard_with(tri: Triangulation, alg: NormalAlg) -> NormalSurfaces {
    NormalSurfaces::enumerate(Arc::new(tri), NormalCoords::Standard, NormalList::default(), alg, None).unwrap()
}

#[test]
fn both_standard_algorithms_agree() {
    for tri in [
        example::poincare_homology_sphere(),
        example::lens(7, 3).unwrap(),
        example::layered_loop(5, true),
        example::twisted_kxi(),
        example::ball(),
    ] {
        let copy = tri.clone_with(CloneOptions { locks: false, properties: false });
        let dd = standard_with(tri, NormalAlg::DoubleDescription);
        let q2s = standard_with(copy, NormalAlg::QuadToStandard);
        assert_eq!(dd.vectors().collect::<Vec<_>>(), q2s.vectors().collect::<Vec<_>>());
    }
}

#[test]
fn layered_loops_count_their_surfaces() {
    for (n, twisted, vertex, fundamental) in [(4, true, 5, 7), (4, false, 5, 7), (6, false, 7, 9)] {
        let v = vertex_surfaces(example::layered_loop(n, twisted), NormalCoords::Quad);
        let f = fundamental_surfaces(example::layered_loop(n, twisted), NormalCoords::Quad);
        assert_eq!(v.size(), vertex, "loop({n}, {twisted})");
        assert_eq!(f.size(), fundamental, "loop({n}, {twisted})");
        for s in &v {
            assert!(f.iter().any(|t| t == s));
        }
    }
}

#[test]
fn enumeration_is_deterministic() {
    let a = vertex_surfaces(example::poincare_homology_sphere(), NormalCoords::Quad);
    let b = vertex_surfaces(example::poincare_homology_sphere(), NormalCoords::Quad);
    let va: Vec<_> = a.vectors().collect();
    assert_eq!(va, b.vectors().collect::<Vec<_>>());
    let mut sorted = va.clone();
    sorted.sort();
    assert_eq!(va, sorted);
}

#[test]
fn raw_rays_match_the_list() {
    let tri = example::twisted_kxi();
    let eqns = make_matching_equations(&tri, NormalCoords::Quad, None).unwrap();
    let cons = make_embedded_constraints(&tri, NormalCoords::Quad).unwrap();
    let rays = vertex_rays(&eqns, &cons, None, None).unwrap();
    assert_eq!(rays.len(), 6);

    let std = quad_to_standard(&tri, &rays, None).unwrap();
    assert_eq!(std.len(), 8);
    let list = vertex_surfaces(tri, NormalCoords::Standard);
    let from_list: Vec<_> = list.iter().map(|s| s.vector().to_vec()).collect();
    let converted: Vec<_> = std
        .into_iter()
        .map(|v| v.into_iter().map(LargeInteger::from).collect::<Vec<_>>())
        .collect();
    assert_eq!(from_list, converted);
}

#[test]
fn cancellation_and_limits() {
    let tracker = ProgressTracker::new();
    tracker.cancel();
    let res = NormalSurfaces::enumerate(
        Arc::new(example::poincare_homology_sphere()),
        NormalCoords::Standard,
        NormalList::default(),
        NormalAlg::DoubleDescription,
        Some(&tracker),
    );
    assert!(matches!(res, Err(TriError::Cancelled)));

    let config = EnumerationConfig {
        max_rays: Some(1),
        ..Default::default()
    };
    let res = NormalSurfaces::enumerate_with_config(
        Arc::new(example::poincare_homology_sphere()),
        NormalCoords::Standard,
        NormalList::default(),
        NormalAlg::DoubleDescription,
        &config,
        None,
    );
    assert!(matches!(res, Err(TriError::Cancelled)));

    let tracker = ProgressTracker::new();
    let list = NormalSurfaces::enumerate(
        Arc::new(example::lens(5, 2).unwrap()),
        NormalCoords::Quad,
        NormalList::default(),
        NormalAlg::default(),
        Some(&tracker),
    )
    .unwrap();
    assert_eq!(list.coords(), NormalCoords::Quad);
    assert!(tracker.is_finished());
}

#[test]
fn visitors_see_every_surface_until_they_stop() {
    let mut seen = 0;
    let flow = NormalSurfaces::enumerate_with(
        Arc::new(example::twisted_kxi()),
        NormalCoords::Standard,
        NormalList::default(),
        NormalAlg::default(),
        &EnumerationConfig::default(),
        None,
        |_| {
            seen += 1;
            ControlFlow::Continue(())
        },
    )
    .unwrap();
    assert_eq!(flow, ControlFlow::Continue(()));
    assert_eq!(seen, 8);

    let mut names = Vec::new();
    let flow = NormalSurfaces::enumerate_with(
        Arc::new(example::twisted_kxi()),
        NormalCoords::Standard,
        NormalList::default(),
        NormalAlg::default(),
        &EnumerationConfig::default(),
        None,
        |s| {
            names.push(s.euler_char().unwrap());
            if names.len() == 3 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        },
    )
    .unwrap();
    assert_eq!(flow, ControlFlow::Break(()));
    assert_eq!(names.len(), 3);
}
