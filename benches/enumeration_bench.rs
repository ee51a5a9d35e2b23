use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use normcore::surfaces::{NormalAlg, NormalCoords, NormalList, NormalSurfaces};
use normcore::triangulation::example;

fn bench_layered_loops(c: &mut Criterion) {
    let mut group = c.benchmark_group("layered_loop_enumeration");
    group.sample_size(20);

    for &n in &[4usize, 6, 8] {
        let tri = Arc::new(example::layered_loop(n, true));

        group.bench_with_input(BenchmarkId::new("quad_vertex", n), &n, |b, _| {
            b.iter(|| {
                let list =
                    NormalSurfaces::enumerate(tri.clone(), NormalCoords::Quad, NormalList::default(), NormalAlg::default(), None);
                black_box(list)
            });
        });

        group.bench_with_input(BenchmarkId::new("quad_fundamental", n), &n, |b, _| {
            b.iter(|| {
                let list = NormalSurfaces::enumerate(
                    tri.clone(),
                    NormalCoords::Quad,
                    NormalList::FUNDAMENTAL,
                    NormalAlg::HilbertDual,
                    None,
                );
                black_box(list)
            });
        });

        for alg in [NormalAlg::DoubleDescription, NormalAlg::QuadToStandard] {
            group.bench_with_input(BenchmarkId::new(format!("standard_{alg:?}"), n), &n, |b, _| {
                b.iter(|| {
                    let list = NormalSurfaces::enumerate(tri.clone(), NormalCoords::Standard, NormalList::default(), alg, None);
                    black_box(list)
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_layered_loops);
criterion_main!(benches);
