//! Seeded random workloads rendered as traces.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tagheap_trace::{Op, Trace};

/// Parameters for a reproducible random trace.
///
/// The same seed always yields the same trace. Every generated trace is
/// well formed: frees and reallocs only name live ids, and ids are fresh
/// when allocated.
#[derive(Clone, Debug)]
pub struct Workload {
    pub seed: u64,
    pub ops: usize,
    pub max_size: usize,
    /// Relative weights of allocate, free and realloc.
    pub weights: [u32; 3],
    /// Free every remaining id at the end.
    pub drain: bool,
}

impl Workload {
    pub fn new(seed: u64, ops: usize) -> Self {
        Self {
            seed,
            ops,
            max_size: 4096,
            weights: [5, 3, 2],
            drain: true,
        }
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    pub fn weights(mut self, alloc: u32, free: u32, realloc: u32) -> Self {
        self.weights = [alloc.max(1), free, realloc];
        self
    }

    pub fn drain(mut self, drain: bool) -> Self {
        self.drain = drain;
        self
    }

    pub fn generate(&self) -> Trace {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut live: Vec<u32> = Vec::new();
        let mut next_id = 0u32;
        let mut trace = Trace::new();
        let total: u32 = self.weights.iter().sum();

        for _ in 0..self.ops {
            let roll = rng.random_range(0..total);
            let kind = if live.is_empty() || roll < self.weights[0] {
                0
            } else if roll < self.weights[0] + self.weights[1] {
                1
            } else {
                2
            };
            match kind {
                0 => {
                    let size = rng.random_range(1..=self.max_size);
                    trace.push(Op::Alloc { id: next_id, size });
                    live.push(next_id);
                    next_id += 1;
                }
                1 => {
                    let id = live.swap_remove(rng.random_range(0..live.len()));
                    trace.push(Op::Free { id });
                }
                _ => {
                    let i = rng.random_range(0..live.len());
                    let size = rng.random_range(1..=self.max_size);
                    trace.push(Op::Realloc { id: live[i], size });
                }
            }
        }

        if self.drain {
            for id in live {
                trace.push(Op::Free { id });
            }
        }
        trace
    }
}
