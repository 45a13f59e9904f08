#![allow(clippy::unwrap_used)]
//! Sorted set benchmarks against the in-process backend
//!
//! Measures the facade plus command dispatch for the common sorted set
//! operations, without any socket in the way.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rankset::{Backend, MemoryBackend, Order, ScoreBound, Sortable};

fn populated(size: usize) -> MemoryBackend {
    let db = MemoryBackend::new();
    db.sorted_set("bench")
        .insert_batch((0..size).map(|i| (format!("member:{}", i), i as f64)))
        .unwrap();
    db
}

/// Benchmark ZADD throughput, single and batched
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("zadd");
    group.throughput(Throughput::Elements(1));

    let db = MemoryBackend::new();
    let set = db.sorted_set("bench");
    group.bench_function("insert_new", |b| {
        let mut i = 0u64;
        b.iter(|| {
            set.insert(black_box(format!("member:{}", i)), i as f64).unwrap();
            i += 1;
        })
    });

    let db = populated(10_000);
    let set = db.sorted_set("bench");
    group.bench_function("rescore_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            set.insert(black_box(format!("member:{}", i % 10_000)), (i * 7) as f64)
                .unwrap();
            i += 1;
        })
    });

    for batch in [10usize, 100] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::new("insert_batch", batch), &batch, |b, &batch| {
            let db = MemoryBackend::new();
            let set = db.sorted_set("bench");
            let mut round = 0usize;
            b.iter(|| {
                let pairs = (0..batch).map(|i| (format!("m:{}:{}", round, i), i as f64));
                black_box(set.insert_batch(pairs).unwrap());
                round += 1;
            })
        });
    }

    group.finish();
}

/// Benchmark rank and score range queries at different set sizes
fn bench_ranges(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranges");

    for size in [1_000usize, 100_000] {
        let db = populated(size);
        let set = db.sorted_set("bench");

        group.bench_with_input(BenchmarkId::new("top_10_desc", size), &size, |b, _| {
            b.iter(|| black_box(set.select_by_rank(0, 9, true, Order::Descending).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("score_window", size), &size, |b, &size| {
            let mid = (size / 2) as f64;
            b.iter(|| {
                black_box(
                    set.select_by_score(
                        ScoreBound::inclusive(mid),
                        ScoreBound::exclusive(mid + 50.0),
                        None,
                        false,
                        Order::Ascending,
                    )
                    .unwrap(),
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("rank", size), &size, |b, &size| {
            let mut i = 0usize;
            b.iter(|| {
                black_box(set.rank(format!("member:{}", i % size), Order::Ascending).unwrap());
                i += 1;
            })
        });
    }

    group.finish();
}

/// Benchmark a full cursor walk over a set
fn bench_scan(c: &mut Criterion) {
    let db = populated(10_000);
    let set = db.sorted_set("bench");

    let mut group = c.benchmark_group("zscan");
    group.throughput(Throughput::Elements(10_000));
    for hint in [10usize, 500] {
        group.bench_with_input(BenchmarkId::new("full_walk", hint), &hint, |b, &hint| {
            b.iter(|| black_box(set.select("").count_hint(hint).count()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_ranges, bench_scan);
criterion_main!(benches);
