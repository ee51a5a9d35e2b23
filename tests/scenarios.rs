mod util;

use normcore::maths::integer::{Integer, LargeInteger};
use normcore::maths::matrix::MatrixInt;
use normcore::snappea::{SlopeMatrix, cusp_vertices};
use normcore::surfaces::{CsvFields, NormalCoords, read_csv_standard};
use normcore::triangulation::example;
use util::{fundamental_surfaces, vertex_surfaces};

#[test]
fn lens_space_3_1() {
    let l31 = example::lens(3, 1).unwrap();
    assert_eq!(l31.size(), 2);
    assert_eq!(l31.count_vertices(), 1);
    assert_eq!(l31.count_edges(), 3);
    assert_eq!(l31.count_triangles(), 4);
    assert!(l31.is_closed() && l31.is_orientable() && l31.is_valid());
    assert_eq!(l31.homology().torsion(), &[Integer::new(3)]);
    assert_eq!(l31.fundamental_group().abelianisation(), *l31.homology());
}

#[test]
fn one_tetrahedron_lens_spaces() {
    for (p, q) in [(4, 1), (5, 2)] {
        let l = example::lens(p, q).unwrap();
        assert_eq!(l.size(), 1);
        assert_eq!(l.count_vertices(), 1);
        assert!(l.is_closed() && l.is_orientable() && l.is_valid());
        assert_eq!(l.homology().torsion(), &[Integer::new(p as i64)]);
    }
}

#[test]
fn figure_eight_complement() {
    let tri = example::figure_eight();
    assert!(tri.is_valid() && tri.is_orientable() && tri.is_ideal());
    assert_eq!(tri.count_vertices(), 1);
    assert_eq!(tri.size(), 2);
    assert_eq!(tri.count_edges(), 2);
    assert_eq!(cusp_vertices(&tri).len(), 1);

    let list = vertex_surfaces(tri, NormalCoords::Quad);
    assert_eq!(list.size(), 4);
    let mut m = MatrixInt::new(2, 6);
    m.set(0, 0, 1);
    m.set(1, 3, 1);
    let slopes = SlopeMatrix::new(m);
    for s in &list {
        assert!(!s.is_vertex_linking());
        assert!(!s.is_compact());
        let b = s.boundary_intersections(&slopes).unwrap();
        assert_eq!((b.rows(), b.columns()), (1, 2));
    }
}

#[test]
fn poincare_homology_sphere() {
    let tri = example::poincare_homology_sphere();
    assert_eq!(tri.size(), 5);
    assert!(tri.is_closed() && tri.is_orientable());
    assert!(tri.homology().is_trivial());
    assert_eq!(tri.fundamental_group().order(5_000), Some(120));

    let list = vertex_surfaces(tri, NormalCoords::Standard);
    assert_eq!(list.size(), 7);
    let mut spheres = 0;
    for s in &list {
        let chi = s.euler_char().unwrap();
        assert!(s.is_connected().unwrap());
        if chi == 2 {
            spheres += 1;
            assert_eq!(s.is_vertex_link(), Some(0));
        } else {
            assert_eq!(chi, 0);
            assert!(s.is_orientable().unwrap());
            assert!(s.is_two_sided().unwrap());
        }
    }
    assert_eq!(spheres, 1);
}

#[test]
fn trefoil_octagons_never_mix() {
    let list = fundamental_surfaces(example::trefoil(), NormalCoords::QuadOct);
    assert_eq!(list.size(), 10);
    let mut with_octagon = 0;
    for s in &list {
        let types = (0..2)
            .flat_map(|t| (0..3).map(move |k| (t, k)))
            .filter(|&(t, k)| !s.octs(t, k).is_zero())
            .count();
        assert!(types <= 1);
        if let Some((t, k)) = s.oct_position() {
            with_octagon += 1;
            assert_eq!(*s.octs(t, k), LargeInteger::from(1));
        }
    }
    assert_eq!(with_octagon, 6);
}

#[test]
fn gieseking_manifold() {
    let tri = example::gieseking();
    assert!(!tri.is_orientable());
    assert!(tri.is_ideal());
    assert_eq!(tri.size(), 1);
    assert!(tri.homology().is_z());

    assert!(vertex_surfaces(example::gieseking(), NormalCoords::Quad).is_empty());
    let list = vertex_surfaces(tri, NormalCoords::Standard);
    assert_eq!(list.size(), 1);
    let link = &list[0];
    assert_eq!(link.is_vertex_link(), Some(0));
    assert!(!link.is_orientable().unwrap());
    assert!(link.is_two_sided().unwrap());
    assert_eq!(link.euler_char().unwrap(), 0);
}

#[test]
fn csv_of_a_lens_space_reads_back() {
    let list = vertex_surfaces(example::lens(3, 1).unwrap(), NormalCoords::Standard);
    assert!(!list.is_empty());
    let mut out = Vec::new();
    list.write_csv_standard(&mut out, CsvFields::ALL).unwrap();
    let rows = read_csv_standard(out.as_slice()).unwrap();
    assert_eq!(rows.len(), list.size());
    for (row, s) in rows.iter().zip(&list) {
        assert_eq!(row.vector.as_slice(), s.vector());
    }

    let mut bare = Vec::new();
    list.write_csv_standard(&mut bare, CsvFields::NONE).unwrap();
    let text = String::from_utf8(bare).unwrap();
    assert!(text.starts_with("T0:0,T0:1,T0:2,T0:3,Q0:01/23,Q0:02/13,Q0:03/12,T1:0"));
    let reread = read_csv_standard(text.as_bytes()).unwrap();
    assert!(reread.iter().all(|r| r.name.is_none()));
}
