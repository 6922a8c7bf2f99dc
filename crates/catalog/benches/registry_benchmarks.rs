use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use skuforge_catalog::{compose_code, CompositionMode, Registry, VocabularySet};

/// Every product-mode code the standard vocabulary can produce, plus a numeric suffix.
fn candidate_codes(n: usize) -> Vec<String> {
    let v = VocabularySet::standard();
    let mut out = Vec::with_capacity(n);
    let mut suffix = 0usize;
    'outer: loop {
        for stone in v.stones() {
            for metal in v.metals() {
                for product in v.products() {
                    if out.len() == n {
                        break 'outer;
                    }
                    let tag = suffix.to_string();
                    out.push(
                        compose_code(stone, metal, product, CompositionMode::Product, None, Some(&tag))
                            .unwrap(),
                    );
                }
            }
        }
        suffix += 1;
    }
    out
}

fn bench_import_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("import_batch");

    for size in [100usize, 1_000, 10_000] {
        let codes = candidate_codes(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &codes, |b, codes| {
            b.iter(|| {
                let mut registry = Registry::default();
                black_box(registry.import_batch(codes.iter(), None));
            });
        });
    }

    group.finish();
}

fn bench_register_against_full_registry(c: &mut Criterion) {
    let codes = candidate_codes(10_000);
    let mut registry = Registry::default();
    registry.import_batch(codes.iter(), None);

    c.bench_function("register_duplicate_in_10k", |b| {
        b.iter(|| {
            let _ = black_box(registry.register(black_box("ll-br-nl-0"), None));
        });
    });
}

fn bench_compute_stats(c: &mut Criterion) {
    let codes = candidate_codes(10_000);
    let mut registry = Registry::default();
    registry.import_batch(codes.iter(), None);

    c.bench_function("compute_stats_10k", |b| {
        b.iter(|| black_box(registry.compute_stats()));
    });
}

criterion_group!(
    benches,
    bench_import_batch,
    bench_register_against_full_registry,
    bench_compute_stats
);
criterion_main!(benches);
