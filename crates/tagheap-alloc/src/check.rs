//! Heap consistency checker.
//!
//! [`Heap::check`] re-derives every structural invariant from the arena
//! bytes alone:
//!
//! - the prologue and epilogue are intact;
//! - every block is aligned, at least [`MIN_BLOCK`] bytes, and its header
//!   equals its footer;
//! - no two physically adjacent blocks are free;
//! - the free list visits exactly the free blocks, in ascending size, with
//!   mutually consistent links and no cycles.
//!
//! The checker never panics on a corrupt arena; it reports the first
//! violation it finds. It is a diagnostic and is never run implicitly.

use std::error::Error;
use std::fmt;

use indexmap::IndexSet;
use tagheap_arena::Sbrk;

use crate::heap::Heap;
use crate::layout::{
    self, BlockPtr, Link, Tag, ALIGNMENT, DSIZE, FIRST_BLOCK, HEAP_OVERHEAD, MIN_BLOCK, PROLOGUE,
    WSIZE,
};

/// An invariant violation found by [`Heap::check`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckError {
    /// The arena is too short or its prologue tags are wrong.
    BadPrologue,
    /// The block walk did not end in a zero-size allocated header at the break.
    BadEpilogue {
        /// Where the walk stopped.
        at: usize,
    },
    /// A tag word or link lies outside the arena.
    OutOfBounds {
        /// The block being examined.
        ptr: BlockPtr,
    },
    /// A block's payload offset or size is not a multiple of the alignment.
    Misaligned {
        /// The offending block.
        ptr: BlockPtr,
    },
    /// A block is smaller than the minimum block size.
    TooSmall {
        /// The offending block.
        ptr: BlockPtr,
        /// Its recorded size.
        size: usize,
    },
    /// Header and footer disagree.
    TagMismatch {
        /// The offending block.
        ptr: BlockPtr,
        /// Decoded header.
        header: Tag,
        /// Decoded footer.
        footer: Tag,
    },
    /// Two physically adjacent blocks are both free.
    AdjacentFree {
        /// The second of the two blocks.
        ptr: BlockPtr,
    },
    /// A free block is missing from the free list.
    FreeNotListed {
        /// The missing block.
        ptr: BlockPtr,
    },
    /// The free list reaches a block that is not a free block.
    AllocatedListed {
        /// The listed block.
        ptr: BlockPtr,
    },
    /// A block is smaller than the list entry before it.
    ListOrder {
        /// The out-of-order block.
        ptr: BlockPtr,
    },
    /// A node's back link does not point at its predecessor in the walk.
    BrokenLink {
        /// The node with the bad link.
        ptr: BlockPtr,
    },
    /// The free list revisits a node.
    ListCycle {
        /// The revisited node.
        ptr: BlockPtr,
    },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadPrologue => write!(f, "prologue block is damaged"),
            Self::BadEpilogue { at } => write!(f, "epilogue missing at offset {at}"),
            Self::OutOfBounds { ptr } => write!(f, "block {ptr} extends outside the arena"),
            Self::Misaligned { ptr } => write!(f, "block {ptr} is misaligned"),
            Self::TooSmall { ptr, size } => {
                write!(f, "block {ptr} has size {size}, below the minimum {MIN_BLOCK}")
            }
            Self::TagMismatch {
                ptr,
                header,
                footer,
            } => write!(
                f,
                "block {ptr} header {header:?} does not match footer {footer:?}"
            ),
            Self::AdjacentFree { ptr } => {
                write!(f, "block {ptr} is free and follows a free block")
            }
            Self::FreeNotListed { ptr } => write!(f, "free block {ptr} is not in the free list"),
            Self::AllocatedListed { ptr } => {
                write!(f, "free list reaches {ptr}, which is not a free block")
            }
            Self::ListOrder { ptr } => write!(f, "free list out of size order at {ptr}"),
            Self::BrokenLink { ptr } => write!(f, "free list link at {ptr} is inconsistent"),
            Self::ListCycle { ptr } => write!(f, "free list cycles back to {ptr}"),
        }
    }
}

impl Error for CheckError {}

impl<A: Sbrk> Heap<A> {
    /// Verify every structural invariant of the heap.
    pub fn check(&self) -> Result<(), CheckError> {
        let bytes = self.arena.bytes();
        let free = walk_blocks(bytes)?;
        walk_free_list(bytes, self.free_list.tail(), &free)
    }
}

fn read_tag(bytes: &[u8], at: usize, ptr: BlockPtr) -> Result<Tag, CheckError> {
    layout::try_word(bytes, at)
        .map(Tag::unpack)
        .ok_or(CheckError::OutOfBounds { ptr })
}

/// Walk the arena by headers, returning the free blocks in address order.
fn walk_blocks(bytes: &[u8]) -> Result<IndexSet<BlockPtr>, CheckError> {
    let brk = bytes.len();
    if brk < HEAP_OVERHEAD || brk % ALIGNMENT != 0 {
        return Err(CheckError::BadPrologue);
    }
    let prologue = Tag::allocated(DSIZE);
    if read_tag(bytes, layout::header(PROLOGUE), PROLOGUE)? != prologue
        || read_tag(bytes, layout::footer(PROLOGUE, DSIZE), PROLOGUE)? != prologue
    {
        return Err(CheckError::BadPrologue);
    }

    let mut free = IndexSet::new();
    let mut prev_free = false;
    let mut at = FIRST_BLOCK.offset();
    loop {
        let ptr = BlockPtr::from_offset(at).ok_or(CheckError::BadEpilogue { at })?;
        let header = read_tag(bytes, at - WSIZE, ptr)?;
        if header.size == 0 {
            if header.is_free() || at != brk {
                return Err(CheckError::BadEpilogue { at });
            }
            return Ok(free);
        }
        if at % ALIGNMENT != 0 || header.size % ALIGNMENT != 0 {
            return Err(CheckError::Misaligned { ptr });
        }
        if header.size < MIN_BLOCK {
            return Err(CheckError::TooSmall {
                ptr,
                size: header.size,
            });
        }
        let end = at
            .checked_add(header.size)
            .filter(|&end| end <= brk)
            .ok_or(CheckError::OutOfBounds { ptr })?;
        let footer = read_tag(bytes, end - DSIZE, ptr)?;
        if footer != header {
            return Err(CheckError::TagMismatch {
                ptr,
                header,
                footer,
            });
        }
        if header.is_free() {
            if prev_free {
                return Err(CheckError::AdjacentFree { ptr });
            }
            free.insert(ptr);
        }
        prev_free = header.is_free();
        at = end;
    }
}

/// Walk the free list from the tail and compare it with the block walk.
fn walk_free_list(
    bytes: &[u8],
    tail: Option<BlockPtr>,
    free: &IndexSet<BlockPtr>,
) -> Result<(), CheckError> {
    let mut seen = IndexSet::new();
    let mut smaller: Option<(BlockPtr, usize)> = None;
    let mut cursor = tail;

    while let Some(ptr) = cursor {
        if !free.contains(&ptr) {
            return Err(CheckError::AllocatedListed { ptr });
        }
        if !seen.insert(ptr) {
            return Err(CheckError::ListCycle { ptr });
        }
        let size = layout::tag(bytes, ptr).size;
        let next = layout::try_link(bytes, ptr, Link::Next).ok_or(CheckError::OutOfBounds { ptr })?;
        if next != smaller.map(|(p, _)| p) {
            return Err(CheckError::BrokenLink { ptr });
        }
        if smaller.is_some_and(|(_, s)| size < s) {
            return Err(CheckError::ListOrder { ptr });
        }
        smaller = Some((ptr, size));
        cursor = layout::try_link(bytes, ptr, Link::Prev).ok_or(CheckError::OutOfBounds { ptr })?;
    }

    match free.iter().find(|ptr| !seen.contains(*ptr)) {
        Some(&ptr) => Err(CheckError::FreeNotListed { ptr }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeapConfig;
    use tagheap_arena::MemArena;

    fn heap() -> Heap {
        Heap::new(MemArena::with_max_bytes(1 << 20).unwrap(), HeapConfig::default()).unwrap()
    }

    /// A heap with allocated, free, allocated, free-remainder blocks.
    fn mixed_heap() -> (Heap, BlockPtr, BlockPtr) {
        let mut heap = heap();
        let a = heap.acquire(40).unwrap();
        let b = heap.acquire(40).unwrap();
        let _c = heap.acquire(40).unwrap();
        heap.release(b).unwrap();
        (heap, a, b)
    }

    #[test]
    fn consistent_heap_passes() {
        let (heap, _, _) = mixed_heap();
        assert_eq!(heap.check(), Ok(()));
    }

    #[test]
    fn detects_footer_corruption() {
        let (mut heap, a, _) = mixed_heap();
        let size = layout::tag(heap.arena.bytes(), a).size;
        layout::put_word(
            heap.arena.bytes_mut(),
            layout::footer(a, size),
            Tag::allocated(size + 8).pack(),
        );
        assert!(matches!(heap.check(), Err(CheckError::TagMismatch { ptr, .. }) if ptr == a));
    }

    #[test]
    fn detects_damaged_prologue() {
        let (mut heap, _, _) = mixed_heap();
        layout::put_word(heap.arena.bytes_mut(), 4, Tag::free(8).pack());
        assert_eq!(heap.check(), Err(CheckError::BadPrologue));
    }

    #[test]
    fn detects_unlisted_free_block() {
        let (mut heap, _, b) = mixed_heap();
        let bytes = heap.arena.bytes_mut();
        heap.free_list.remove(bytes, b);
        assert_eq!(heap.check(), Err(CheckError::FreeNotListed { ptr: b }));
    }

    #[test]
    fn detects_allocated_block_in_list() {
        let (mut heap, a, _) = mixed_heap();
        let size = layout::tag(heap.arena.bytes(), a).size;
        let bytes = heap.arena.bytes_mut();
        heap.free_list.insert(bytes, a, size);
        assert_eq!(heap.check(), Err(CheckError::AllocatedListed { ptr: a }));
    }

    #[test]
    fn detects_adjacent_free_blocks() {
        let (mut heap, a, b) = mixed_heap();
        // Free `a` by hand, skipping the merge with `b`.
        let size = layout::tag(heap.arena.bytes(), a).size;
        let bytes = heap.arena.bytes_mut();
        layout::set_tag(bytes, a, Tag::free(size));
        heap.free_list.insert(bytes, a, size);
        assert_eq!(heap.check(), Err(CheckError::AdjacentFree { ptr: b }));
    }

    #[test]
    fn detects_missing_epilogue() {
        let (mut heap, _, _) = mixed_heap();
        let brk = heap.arena.brk();
        layout::put_word(heap.arena.bytes_mut(), brk - WSIZE, Tag::free(0).pack());
        assert!(matches!(heap.check(), Err(CheckError::BadEpilogue { .. })));
    }

    #[test]
    fn detects_list_cycle() {
        let (mut heap, _, b) = mixed_heap();
        let bytes = heap.arena.bytes_mut();
        layout::set_link(bytes, b, Link::Prev, Some(b));
        let err = heap.check().unwrap_err();
        assert!(matches!(
            err,
            CheckError::ListCycle { .. } | CheckError::BrokenLink { .. }
        ));
    }

    #[test]
    fn errors_render() {
        let ptr = BlockPtr::from_offset(24).unwrap();
        assert_eq!(
            CheckError::AdjacentFree { ptr }.to_string(),
            "block 0x00000018 is free and follows a free block"
        );
    }
}
