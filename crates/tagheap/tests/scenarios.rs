//! Whole-heap scenarios through the public facade.

use tagheap::alloc::BlockState;
use tagheap::prelude::*;
use tagheap_test_utils::{HeapBuilder, Workload};

fn heap() -> Heap {
    HeapBuilder::new().max_bytes(1 << 22).build()
}

fn assert_conserved(heap: &Heap) {
    let s = heap.stats();
    assert_eq!(
        s.allocated_bytes + s.free_bytes + s.overhead_bytes,
        s.arena_bytes,
        "capacity leaked: {s:?}"
    );
}

#[test]
fn best_fit_reuses_freed_block() {
    let mut heap = heap();
    let a = heap.acquire(100).unwrap();
    let _b = heap.acquire(50).unwrap();
    heap.release(a).unwrap();
    let before = heap.arena_bytes();

    let c = heap.acquire(90).unwrap();
    assert_eq!(c, a);
    assert_eq!(heap.arena_bytes(), before);
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn best_fit_prefers_smallest_sufficient_block() {
    let mut heap = heap();
    let big = heap.acquire(400).unwrap();
    let _pin1 = heap.acquire(8).unwrap();
    let small = heap.acquire(120).unwrap();
    let _pin2 = heap.acquire(8).unwrap();
    heap.release(big).unwrap();
    heap.release(small).unwrap();

    assert_eq!(heap.acquire(100).unwrap(), small);
}

#[test]
fn adjacent_releases_coalesce() {
    let mut heap = heap();
    let a = heap.acquire(200).unwrap();
    let b = heap.acquire(200).unwrap();
    heap.release(a).unwrap();
    heap.release(b).unwrap();

    let free: Vec<_> = heap
        .blocks()
        .filter(|b| b.state == BlockState::Free)
        .collect();
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].ptr, a);

    let before = heap.arena_bytes();
    let c = heap.acquire(350).unwrap();
    assert_eq!(c, a);
    assert_eq!(heap.arena_bytes(), before);
}

#[test]
fn release_then_same_acquire_does_not_grow() {
    let mut heap = heap();
    let _keep = heap.acquire(64).unwrap();
    for size in [1, 17, 100, 1000, 3000] {
        let p = heap.acquire(size).unwrap();
        heap.release(p).unwrap();
        let before = heap.arena_bytes();
        let free_before = heap.stats().free_bytes;
        let q = heap.acquire(size).unwrap();
        assert_eq!(heap.arena_bytes(), before, "size {size} grew the arena");
        heap.release(q).unwrap();
        assert_eq!(heap.stats().free_bytes, free_before);
    }
}

#[test]
fn zero_acquire_is_rejected() {
    let mut heap = heap();
    assert!(matches!(
        heap.acquire(0),
        Err(HeapError::InvalidSize { requested: 0 })
    ));
}

#[test]
fn exhaustion_leaves_heap_intact() {
    let mut heap = HeapBuilder::new().max_bytes(8192).build();
    let a = heap.acquire(1000).unwrap();
    heap.payload_mut(a).unwrap().fill(0x5a);
    let before = heap.stats();

    let err = heap.acquire(16 * 1024).unwrap_err();
    assert!(matches!(err, HeapError::OutOfMemory { .. }));
    let err = heap.resize(a, 16 * 1024).unwrap_err();
    assert!(matches!(err, HeapError::OutOfMemory { .. }));

    let after = heap.stats();
    assert_eq!(after.arena_bytes, before.arena_bytes);
    assert_eq!(after.free_bytes, before.free_bytes);
    assert!(heap.payload(a).unwrap()[..1000].iter().all(|&b| b == 0x5a));
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn shrinking_resize_keeps_pointer_and_prefix() {
    let mut heap = heap();
    let p = heap.acquire(256).unwrap();
    for (i, b) in heap.payload_mut(p).unwrap().iter_mut().enumerate() {
        *b = i as u8;
    }
    let q = heap.resize(p, 100).unwrap().unwrap();
    assert_eq!(q, p);
    assert!(heap.payload(q).unwrap()[..100]
        .iter()
        .enumerate()
        .all(|(i, &b)| b == i as u8));
}

#[test]
fn growing_resize_moves_past_a_pinned_neighbor() {
    let mut heap = heap();
    let p = heap.acquire(32).unwrap();
    let _pin = heap.acquire(32).unwrap();
    heap.payload_mut(p).unwrap()[..32].copy_from_slice(&[7; 32]);

    let q = heap.resize(p, 500).unwrap().unwrap();
    assert_ne!(q, p);
    assert_eq!(&heap.payload(q).unwrap()[..32], &[7; 32]);
    assert_eq!(heap.stats().relocations, 1);
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn varied_churn_never_leaks() {
    let mut heap = heap();
    let mut live = Vec::new();
    for round in 0..200usize {
        let size = 1 + (round * 131) % 2000;
        live.push(heap.acquire(size).unwrap());
        if round % 3 == 0 {
            let p = live.swap_remove(round % live.len());
            heap.release(p).unwrap();
        }
        assert_conserved(&heap);
    }
    for p in live {
        heap.release(p).unwrap();
        assert_conserved(&heap);
    }
    let s = heap.stats();
    assert_eq!(s.free_blocks, 1);
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn generated_workload_replays_cleanly() {
    let trace = Workload::new(2024, 3_000).max_size(2048).generate();
    let mut heap = heap();
    let report = replay(&trace, &mut heap, ReplayOptions::strict()).unwrap();
    assert_eq!(report.live, 0);
    assert!(report.utilization > 0.0 && report.utilization <= 1.0);
    assert_eq!(report.final_stats.free_blocks, 1);
}

#[test]
fn init_discards_all_blocks() {
    let mut heap = heap();
    heap.acquire(500).unwrap();
    heap.acquire(500).unwrap();
    heap.init().unwrap();
    let s = heap.stats();
    assert_eq!(s.allocated_blocks, 0);
    assert_eq!(s.acquires, 0);
    assert_eq!(heap.check(), Ok(()));
}
