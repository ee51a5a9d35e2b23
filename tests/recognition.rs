mod util;

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use normcore::surfaces::{NormalCoords, NormalSurface, PropertyFilter, SurfaceFilter};
use normcore::triangulation::{Isomorphism, example};
use util::{ints, vertex_surfaces};

#[test]
fn relabelled_spheres_are_still_spheres() {
    let mut rng = SmallRng::seed_from_u64(7);
    for tri in [example::three_sphere(), example::sphere_two_vertex(), example::lens(1, 0).unwrap()] {
        let iso = Isomorphism::random(tri.size(), &mut rng);
        let moved = iso.apply(&tri).unwrap();
        assert!(moved.is_three_sphere().unwrap());
    }
    assert!(!example::lens(2, 1).unwrap().is_three_sphere().unwrap());
}

#[test]
fn cutting_a_solid_torus_along_its_meridian_leaves_a_ball() {
    let tri = Arc::new(example::lst(1, 2).unwrap());
    let meridian = NormalSurface::from_integers(tri.clone(), NormalCoords::Standard, ints(&[1, 1, 0, 0, 0, 0, 1])).unwrap();
    assert!(meridian.is_compressing_disc(false).unwrap());

    let ball = meridian.cut_along().unwrap();
    assert_eq!(ball.count_components(), 1);
    assert_eq!(ball.count_boundary_components(), 1);
    assert!(ball.is_ball().unwrap());
    assert_eq!(ball.handlebody_genus().unwrap(), Some(0));
    assert_eq!(tri.handlebody_genus().unwrap(), Some(1));
}

#[test]
fn coned_boundaries_close_up() {
    let mut t = example::ball();
    t.finite_to_ideal().unwrap();
    assert!(t.is_closed());
    assert!(t.is_three_sphere().unwrap());

    let mut kxi = example::twisted_kxi();
    kxi.finite_to_ideal().unwrap();
    assert!(kxi.is_ideal());
    assert!(kxi.is_valid());
    assert!(!kxi.has_boundary_triangles());
}

#[test]
fn homology_spheres_have_one_normal_sphere() {
    let list = vertex_surfaces(example::poincare_homology_sphere(), NormalCoords::Standard);
    let spheres = list.filter(&SurfaceFilter::from(PropertyFilter::default().euler([2])));
    assert_eq!(spheres.size(), 1);
    assert!(spheres[0].is_vertex_linking());
    let tori = list.filter(&PropertyFilter::default().euler([0]).orientable(true).into());
    assert_eq!(tori.size(), 6);

    let phs = example::poincare_homology_sphere();
    assert!(phs.is_zero_efficient().unwrap());
    assert!(phs.is_irreducible().unwrap());
    assert!(!phs.is_three_sphere().unwrap());
}

#[test]
fn connected_sums_with_s2xs1_are_reducible() {
    let s = example::lens(0, 1).unwrap();
    let summands = s.summands().unwrap();
    assert_eq!(summands.lost_s2xs1, 1);
    assert!(summands.pieces.is_empty());
    assert!(!s.is_irreducible().unwrap());

    let rp3 = example::lens(2, 1).unwrap();
    assert!(rp3.is_irreducible().unwrap());
}
