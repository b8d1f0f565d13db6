//! Criterion micro-benchmarks for acquire, release and resize.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tagheap_alloc::BlockPtr;
use tagheap_bench::bench_heap;

/// Acquire then release a single small block on a warm heap.
fn bench_acquire_release(c: &mut Criterion) {
    let mut heap = bench_heap().unwrap();
    c.bench_function("acquire_release_64", |b| {
        b.iter(|| {
            let p = heap.acquire(black_box(64)).unwrap();
            heap.release(p).unwrap();
        });
    });
}

/// Best-fit search over a long, fragmented free list.
fn bench_fragmented_fit(c: &mut Criterion) {
    let mut heap = bench_heap().unwrap();
    let blocks: Vec<BlockPtr> = (0..2_000)
        .map(|i| heap.acquire(16 + (i % 97) * 8).unwrap())
        .collect();
    // Free every other block so no neighbors merge.
    for p in blocks.iter().step_by(2) {
        heap.release(*p).unwrap();
    }
    c.bench_function("fragmented_fit_1k_free", |b| {
        b.iter(|| {
            let p = heap.acquire(black_box(700)).unwrap();
            heap.release(p).unwrap();
        });
    });
}

/// Grow one block step by step, then release it.
fn bench_resize_growth(c: &mut Criterion) {
    let mut heap = bench_heap().unwrap();
    c.bench_function("resize_growth_to_64k", |b| {
        b.iter(|| {
            let mut p = heap.acquire(64).unwrap();
            let mut size = 64;
            while size < 64 * 1024 {
                size *= 2;
                p = heap.resize(p, size).unwrap().unwrap();
            }
            black_box(p);
            heap.release(p).unwrap();
        });
    });
}

/// Many live blocks released in reverse, exercising every merge path.
fn bench_churn_1k(c: &mut Criterion) {
    let mut heap = bench_heap().unwrap();
    let mut live = Vec::with_capacity(1_000);
    c.bench_function("churn_1k", |b| {
        b.iter(|| {
            for i in 0..1_000 {
                live.push(heap.acquire(8 + i % 256).unwrap());
            }
            while let Some(p) = live.pop() {
                heap.release(p).unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_acquire_release,
    bench_fragmented_fit,
    bench_resize_growth,
    bench_churn_1k
);
criterion_main!(benches);
