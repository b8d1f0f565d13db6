//! Heap configuration parameters.

use crate::error::HeapError;
use crate::layout::ALIGNMENT;

/// Configuration for a [`Heap`](crate::Heap).
///
/// Controls how aggressively the arena grows. Validated when the heap is
/// constructed; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    /// Minimum number of bytes requested from the arena per growth.
    ///
    /// Default: 4096. Must be a non-zero multiple of 8. A request larger
    /// than the chunk grows the arena by exactly the adjusted request.
    pub chunk_size: usize,

    /// Bytes the arena is grown by during `init`, forming the first free
    /// block.
    ///
    /// Default: 4096. May be zero; must be a multiple of 8.
    pub initial_extend: usize,
}

impl HeapConfig {
    /// Default growth chunk: 4 KiB.
    pub const DEFAULT_CHUNK_SIZE: usize = 1 << 12;

    /// Create a config whose chunk and initial extension are both `chunk_size`.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            initial_extend: chunk_size,
        }
    }

    /// Set the initial extension.
    pub fn with_initial_extend(mut self, initial_extend: usize) -> Self {
        self.initial_extend = initial_extend;
        self
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<(), HeapError> {
        if self.chunk_size == 0 || self.chunk_size % ALIGNMENT != 0 {
            return Err(HeapError::InvalidConfig {
                reason: format!(
                    "chunk_size {} must be a non-zero multiple of {ALIGNMENT}",
                    self.chunk_size
                ),
            });
        }
        if self.initial_extend % ALIGNMENT != 0 {
            return Err(HeapError::InvalidConfig {
                reason: format!(
                    "initial_extend {} must be a multiple of {ALIGNMENT}",
                    self.initial_extend
                ),
            });
        }
        Ok(())
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHUNK_SIZE)
    }
}
