//! Heap and arena fixtures.

use tagheap_alloc::{Heap, HeapConfig};
use tagheap_arena::{ArenaError, MemArena, Sbrk};

/// Builder for heaps with small, explicit limits.
#[derive(Clone, Debug)]
pub struct HeapBuilder {
    max_bytes: usize,
    chunk_size: usize,
    initial_extend: usize,
}

impl HeapBuilder {
    pub fn new() -> Self {
        let config = HeapConfig::default();
        Self {
            max_bytes: 1 << 20,
            chunk_size: config.chunk_size,
            initial_extend: config.initial_extend,
        }
    }

    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Sets the growth chunk; the initial extension follows unless set.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self.initial_extend = chunk_size;
        self
    }

    pub fn initial_extend(mut self, initial_extend: usize) -> Self {
        self.initial_extend = initial_extend;
        self
    }

    fn config(&self) -> HeapConfig {
        HeapConfig::new(self.chunk_size).with_initial_extend(self.initial_extend)
    }

    /// Build over a [`MemArena`]. Panics on an invalid combination.
    pub fn build(&self) -> Heap {
        let arena = MemArena::with_max_bytes(self.max_bytes).expect("valid arena limit");
        Heap::new(arena, self.config()).expect("heap fits its arena")
    }

    /// Build over a [`FlakyArena`] that refuses its `fail_at`-th grow.
    pub fn build_flaky(&self, fail_at: usize) -> Heap<FlakyArena> {
        let arena = FlakyArena::new(self.max_bytes, fail_at);
        Heap::new(arena, self.config()).expect("heap fits its arena")
    }
}

impl Default for HeapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory arena whose growth fails on a chosen call.
///
/// Counts every non-zero `sbrk` since the last reset. Call number
/// `fail_at` (1-based) and every later one return
/// [`ArenaError::Exhausted`] with the break unchanged.
#[derive(Debug)]
pub struct FlakyArena {
    inner: MemArena,
    fail_at: usize,
    grows: usize,
}

impl FlakyArena {
    pub fn new(max_bytes: usize, fail_at: usize) -> Self {
        Self {
            inner: MemArena::with_max_bytes(max_bytes).expect("valid arena limit"),
            fail_at,
            grows: 0,
        }
    }

    /// Growth calls attempted so far, including refused ones.
    pub fn grows(&self) -> usize {
        self.grows
    }
}

impl Sbrk for FlakyArena {
    fn sbrk(&mut self, incr: usize) -> Result<usize, ArenaError> {
        if incr > 0 {
            self.grows += 1;
            if self.grows >= self.fail_at {
                return Err(ArenaError::Exhausted {
                    requested: incr,
                    brk: self.inner.brk(),
                    max: self.inner.max_bytes(),
                });
            }
        }
        self.inner.sbrk(incr)
    }

    fn reset_brk(&mut self) {
        self.grows = 0;
        self.inner.reset_brk();
    }

    fn brk(&self) -> usize {
        self.inner.brk()
    }

    fn bytes(&self) -> &[u8] {
        self.inner.bytes()
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.inner.bytes_mut()
    }

    fn max_bytes(&self) -> usize {
        self.inner.max_bytes()
    }
}
