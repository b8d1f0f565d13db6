//! Heap-memory-backed arena.
//!
//! [`MemArena`] stands in for the process break: a `Vec<u8>` that grows on
//! `sbrk` up to a fixed ceiling. Newly exposed bytes are zeroed so stale
//! contents from a previous `reset_brk` never leak into fresh blocks.

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::sbrk::Sbrk;

/// A `Vec<u8>`-backed arena with a hard size ceiling.
#[derive(Debug)]
pub struct MemArena {
    /// Backing storage. `data.len()` is the break.
    data: Vec<u8>,
    /// Ceiling on `data.len()`.
    max_bytes: usize,
}

impl MemArena {
    /// Create an empty arena from a validated config.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let reserve = config.initial_capacity.min(config.max_bytes);
        Ok(Self {
            data: Vec::with_capacity(reserve),
            max_bytes: config.max_bytes,
        })
    }

    /// Create an empty arena with the given ceiling.
    pub fn with_max_bytes(max_bytes: usize) -> Result<Self, ArenaError> {
        Self::new(ArenaConfig::new(max_bytes))
    }

    /// Bytes still available below the ceiling.
    pub fn remaining(&self) -> usize {
        self.max_bytes - self.data.len()
    }

    /// Memory held by the backing allocation in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.data.capacity()
    }
}

impl Default for MemArena {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            max_bytes: ArenaConfig::DEFAULT_MAX_BYTES,
        }
    }
}

impl Sbrk for MemArena {
    fn sbrk(&mut self, incr: usize) -> Result<usize, ArenaError> {
        let old = self.data.len();
        let new_brk = match old.checked_add(incr) {
            Some(n) if n <= self.max_bytes => n,
            _ => {
                log::warn!(
                    "sbrk of {incr} bytes at break {old} exceeds ceiling {}",
                    self.max_bytes
                );
                return Err(ArenaError::Exhausted {
                    requested: incr,
                    brk: old,
                    max: self.max_bytes,
                });
            }
        };
        self.data.resize(new_brk, 0);
        Ok(old)
    }

    fn reset_brk(&mut self) {
        self.data.clear();
    }

    fn brk(&self) -> usize {
        self.data.len()
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}
