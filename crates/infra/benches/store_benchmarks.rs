use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use skuforge_infra::{InMemorySkuStore, SkuStore, SqliteSkuStore};

fn codes(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("LL-AU-R-{i:05}")).collect()
}

/// Same batch into each backend; the SQLite store pays for a snapshot load and a transaction.
fn bench_import(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("store_import_batch");

    for size in [100usize, 1_000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("in_memory", size), &size, |b, &n| {
            b.iter(|| {
                rt.block_on(async {
                    let store = InMemorySkuStore::new();
                    black_box(store.import_batch(codes(n), None).await.unwrap())
                })
            })
        });

        group.bench_with_input(BenchmarkId::new("sqlite", size), &size, |b, &n| {
            b.iter(|| {
                rt.block_on(async {
                    let store = SqliteSkuStore::in_memory().await.unwrap();
                    black_box(store.import_batch(codes(n), None).await.unwrap())
                })
            })
        });
    }

    group.finish();
}

fn bench_register_against_existing(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("store_register_duplicate_1k");

    let memory = InMemorySkuStore::new();
    let sqlite = rt.block_on(SqliteSkuStore::in_memory()).unwrap();
    rt.block_on(async {
        memory.import_batch(codes(1_000), None).await.unwrap();
        sqlite.import_batch(codes(1_000), None).await.unwrap();
    });

    group.bench_function("in_memory", |b| {
        b.iter(|| rt.block_on(async { black_box(memory.register("ll-au-r-00500", None).await.is_err()) }))
    });
    group.bench_function("sqlite", |b| {
        b.iter(|| rt.block_on(async { black_box(sqlite.register("ll-au-r-00500", None).await.is_err()) }))
    });

    group.finish();
}

criterion_group!(benches, bench_import, bench_register_against_existing);
criterion_main!(benches);
