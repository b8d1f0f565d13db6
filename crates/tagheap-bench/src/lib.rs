//! Benchmark profiles for the tagheap allocator.
//!
//! - [`reference_profile`]: 2K mixed requests, payloads up to 512 bytes
//! - [`stress_profile`]: 20K mixed requests, payloads up to 16 KiB
//! - [`bench_heap`]: a heap large enough for either profile

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tagheap_alloc::{Heap, HeapConfig, HeapError};
use tagheap_arena::{ArenaConfig, MemArena};
use tagheap_test_utils::Workload;
use tagheap_trace::Trace;

/// Arena ceiling used by every benchmark heap.
pub const BENCH_ARENA_BYTES: usize = 256 << 20;

/// Small-object churn: mostly allocate and free, few reallocs.
pub fn reference_profile(seed: u64) -> Trace {
    Workload::new(seed, 2_000)
        .max_size(512)
        .weights(6, 4, 1)
        .generate()
}

/// Large mixed workload with frequent reallocs.
pub fn stress_profile(seed: u64) -> Trace {
    Workload::new(seed, 20_000)
        .max_size(16 * 1024)
        .weights(5, 4, 3)
        .generate()
}

/// A fresh default-configured heap over a [`BENCH_ARENA_BYTES`] arena.
pub fn bench_heap() -> Result<Heap, HeapError> {
    let arena = MemArena::new(ArenaConfig::new(BENCH_ARENA_BYTES))
        .map_err(|e| HeapError::InvalidConfig {
            reason: e.to_string(),
        })?;
    Heap::new(arena, HeapConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagheap_trace::{replay, ReplayOptions};

    #[test]
    fn reference_profile_replays() {
        let trace = reference_profile(42);
        let mut heap = bench_heap().unwrap();
        let report = replay(&trace, &mut heap, ReplayOptions::strict()).unwrap();
        assert_eq!(report.live, 0);
    }

    #[test]
    fn stress_profile_is_drained() {
        let trace = stress_profile(42);
        assert!(trace.len() >= 20_000);
        assert!(matches!(
            trace.records().last().map(|r| r.op),
            Some(tagheap_trace::Op::Free { .. })
        ));
    }

    #[test]
    fn profiles_are_deterministic() {
        assert_eq!(reference_profile(7), reference_profile(7));
    }
}
