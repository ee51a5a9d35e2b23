use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use normcore::triangulation::{IsoSigKind, Isomorphism, Triangulation, example};

fn bench_signatures(c: &mut Criterion) {
    let mut group = c.benchmark_group("isosig");
    let mut rng = SmallRng::seed_from_u64(42);

    for (name, tri) in [
        ("figure_eight", example::figure_eight()),
        ("poincare", example::poincare_homology_sphere()),
        ("layered_loop_12", example::layered_loop(12, true)),
    ] {
        let relabelled = Isomorphism::random(tri.size(), &mut rng).apply(&tri).unwrap();
        let sig = tri.iso_sig();

        for kind in [IsoSigKind::Classic, IsoSigKind::EdgeDegrees] {
            group.bench_with_input(BenchmarkId::new(format!("{kind:?}"), name), &relabelled, |b, t| {
                b.iter(|| black_box(t.iso_sig_detail(kind)));
            });
        }
        group.bench_with_input(BenchmarkId::new("decode", name), &sig, |b, s| {
            b.iter(|| black_box(Triangulation::from_isosig(s).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_signatures);
criterion_main!(benches);
