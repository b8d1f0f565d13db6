//! Error types for heap operations.

use std::error::Error;
use std::fmt;

use tagheap_arena::ArenaError;

use crate::layout::BlockPtr;

/// Errors returned by [`Heap`](crate::Heap) operations.
///
/// A failed operation leaves every block and the free list exactly as
/// they were before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// Zero-byte request, or a request so large its block size overflows.
    InvalidSize {
        /// The requested payload size.
        requested: usize,
    },
    /// The arena could not grow far enough to satisfy the request.
    OutOfMemory {
        /// Number of bytes the arena was asked to grow by.
        requested: usize,
        /// The arena's refusal.
        source: ArenaError,
    },
    /// The pointer does not name a live block of this heap.
    InvalidPointer {
        /// The rejected pointer.
        ptr: BlockPtr,
    },
    /// The pointer names a block that is already free.
    DoubleFree {
        /// The rejected pointer.
        ptr: BlockPtr,
    },
    /// The heap or arena configuration failed validation.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { requested } => {
                write!(f, "invalid allocation size {requested}")
            }
            Self::OutOfMemory { requested, .. } => {
                write!(f, "out of memory: arena could not grow by {requested} bytes")
            }
            Self::InvalidPointer { ptr } => write!(f, "invalid block pointer {ptr}"),
            Self::DoubleFree { ptr } => write!(f, "block {ptr} is already free"),
            Self::InvalidConfig { reason } => write!(f, "invalid heap config: {reason}"),
        }
    }
}

impl Error for HeapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::OutOfMemory { source, .. } => Some(source),
            _ => None,
        }
    }
}
