//! Heap statistics.
//!
//! [`HeapStats`] combines a walk over every block in the arena with the
//! operation counters the heap keeps as it runs. Computing it is O(blocks),
//! so it is meant for telemetry and tests, not for every operation.

use tagheap_arena::Sbrk;

use crate::heap::Heap;
use crate::layout::{self, BlockPtr, BlockState, Tag, DSIZE, FIRST_BLOCK, WSIZE};

/// Cumulative operation counters, reset by `init`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub(crate) acquires: u64,
    pub(crate) releases: u64,
    pub(crate) resizes: u64,
    pub(crate) relocations: u64,
    pub(crate) grows: u64,
}

/// Snapshot of heap occupancy and activity.
///
/// Byte totals are whole block sizes (header and footer included), so
/// `allocated_bytes + free_bytes + overhead_bytes == arena_bytes` always
/// holds, and on a consistent heap `overhead_bytes` is
/// [`HEAP_OVERHEAD`](crate::layout::HEAP_OVERHEAD).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Current arena size in bytes.
    pub arena_bytes: usize,
    /// Number of allocated blocks.
    pub allocated_blocks: usize,
    /// Sum of allocated block sizes.
    pub allocated_bytes: usize,
    /// Sum of usable payload bytes across allocated blocks.
    pub usable_bytes: usize,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Sum of free block sizes.
    pub free_bytes: usize,
    /// Size of the largest free block, 0 if none.
    pub largest_free: usize,
    /// Arena bytes outside any block: alignment pad, prologue, epilogue.
    pub overhead_bytes: usize,
    /// Successful acquire calls, including those made by relocating resizes.
    pub acquires: u64,
    /// Successful release calls.
    pub releases: u64,
    /// Successful non-releasing resize calls.
    pub resizes: u64,
    /// Resizes that had to move the block.
    pub relocations: u64,
    /// Times the arena was grown, including the initial extension.
    pub grows: u64,
}

impl HeapStats {
    /// Fraction of the arena handed out as usable payload.
    pub fn payload_ratio(&self) -> f64 {
        if self.arena_bytes == 0 {
            return 0.0;
        }
        self.usable_bytes as f64 / self.arena_bytes as f64
    }
}

/// One block as seen by a walk over the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Payload offset.
    pub ptr: BlockPtr,
    /// Total block size in bytes.
    pub size: usize,
    /// Allocation state.
    pub state: BlockState,
}

/// Iterator over every block between the prologue and the epilogue, in
/// address order.
///
/// Stops early, without panicking, at a header that cannot be read or a
/// block that would run past the end of the arena.
pub struct Blocks<'a> {
    bytes: &'a [u8],
    cursor: BlockPtr,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let at = self.cursor.offset().checked_sub(WSIZE)?;
        let tag = Tag::unpack(layout::try_word(self.bytes, at)?);
        if tag.size == 0 {
            return None;
        }
        let end = self
            .cursor
            .offset()
            .checked_add(tag.size)
            .filter(|&end| end <= self.bytes.len())?;
        let info = BlockInfo {
            ptr: self.cursor,
            size: tag.size,
            state: tag.state,
        };
        self.cursor = BlockPtr::new(end);
        Some(info)
    }
}

impl<A: Sbrk> Heap<A> {
    /// Walk every block in address order.
    ///
    /// On a corrupted arena the walk ends at the first unreadable or
    /// out-of-range block rather than panicking, so it may be partial; run
    /// [`check`](Self::check) first when that is in doubt.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            bytes: self.arena.bytes(),
            cursor: FIRST_BLOCK,
        }
    }

    /// Compute a statistics snapshot.
    pub fn stats(&self) -> HeapStats {
        let mut stats = HeapStats {
            arena_bytes: self.arena.brk(),
            acquires: self.counters.acquires,
            releases: self.counters.releases,
            resizes: self.counters.resizes,
            relocations: self.counters.relocations,
            grows: self.counters.grows,
            ..HeapStats::default()
        };
        for block in self.blocks() {
            match block.state {
                BlockState::Allocated => {
                    stats.allocated_blocks += 1;
                    stats.allocated_bytes += block.size;
                    stats.usable_bytes += block.size - DSIZE;
                }
                BlockState::Free => {
                    stats.free_blocks += 1;
                    stats.free_bytes += block.size;
                    stats.largest_free = stats.largest_free.max(block.size);
                }
            }
        }
        stats.overhead_bytes = stats
            .arena_bytes
            .saturating_sub(stats.allocated_bytes + stats.free_bytes);
        stats
    }
}
