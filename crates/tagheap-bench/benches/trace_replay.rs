//! Criterion benchmarks replaying generated traces end to end.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tagheap_bench::{bench_heap, reference_profile, stress_profile};
use tagheap_trace::{replay, ReplayOptions};

const NO_CHECKS: ReplayOptions = ReplayOptions {
    check_each_op: false,
    verify_payloads: false,
};

fn bench_reference(c: &mut Criterion) {
    let trace = reference_profile(42);
    c.bench_function("replay_reference", |b| {
        b.iter_batched(
            || bench_heap().unwrap(),
            |mut heap| black_box(replay(&trace, &mut heap, NO_CHECKS).unwrap()),
            BatchSize::LargeInput,
        );
    });
}

fn bench_stress(c: &mut Criterion) {
    let trace = stress_profile(42);
    let mut group = c.benchmark_group("stress");
    group.sample_size(10);
    group.bench_function("replay_stress", |b| {
        b.iter_batched(
            || bench_heap().unwrap(),
            |mut heap| black_box(replay(&trace, &mut heap, NO_CHECKS).unwrap()),
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_reference, bench_stress);
criterion_main!(benches);
