//! Benchmarks for core index operations.
//!
//! Run with: `cargo bench`
//!
//! Measures:
//! - single insert into an in-memory index
//! - exact search over 1K and 10K vectors at D384
//! - a full checkpoint of 10K vectors

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use novaindex::{Config, DocumentIndex, Metadata, SyncMode};
use tempfile::tempdir;

const DIM: usize = 384;

/// Generates a deterministic embedding from a seed.
fn make_embedding(seed: u64) -> Vec<f32> {
    (0..DIM)
        .map(|i| (seed as f32 * 0.1 + i as f32 * 0.01).sin())
        .collect()
}

fn populate(index: &DocumentIndex, n: u64) {
    let ids: Vec<String> = (0..n).map(|i| format!("doc-{i}")).collect();
    let vectors: Vec<Vec<f32>> = (0..n).map(make_embedding).collect();
    let metadata = vec![Metadata::new(); n as usize];
    index.insert_batch(&ids, &vectors, metadata).unwrap();
}

/// Benchmark inserting one document.
fn bench_insert(c: &mut Criterion) {
    let index = DocumentIndex::in_memory(Config::default()).unwrap();
    let embedding = make_embedding(1);
    let mut next = 0u64;

    c.bench_function("insert_single", |b| {
        b.iter(|| {
            next += 1;
            index
                .insert(&format!("doc-{next}"), &embedding, Metadata::new())
                .unwrap();
        });
    });
}

/// Benchmark exact search at growing index sizes.
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_k10");

    for n in [1_000u64, 10_000] {
        let index = DocumentIndex::in_memory(Config::default()).unwrap();
        populate(&index, n);
        let query = make_embedding(n / 2);

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| index.search(&query, 10).unwrap());
        });
    }

    group.finish();
}

/// Benchmark writing a full snapshot.
fn bench_checkpoint(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let config = Config {
        sync_mode: SyncMode::Fast,
        ..Config::default()
    };
    let index = DocumentIndex::open(dir.path(), config).unwrap();
    populate(&index, 10_000);

    c.bench_function("checkpoint_10k", |b| {
        b.iter(|| index.checkpoint().unwrap());
    });

    index.close().unwrap();
}

criterion_group!(benches, bench_insert, bench_search, bench_checkpoint);
criterion_main!(benches);
