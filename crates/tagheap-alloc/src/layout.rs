//! Block layout codec.
//!
//! A block is a run of arena bytes whose size is a multiple of
//! [`ALIGNMENT`]. Its first word (the header) and last word (the footer)
//! both hold a packed [`Tag`]. While a block is free, payload words 0 and 1
//! hold the free-list links.
//!
//! ```text
//!          header   payload (bp)                          footer
//!          |        |                                     |
//! ... ─────┼────────┼──────────┬──────────┬─── ... ───────┼────────┼── ...
//!          │ size|a │ prev (F) │ next (F) │               │ size|a │
//! ... ─────┴────────┴──────────┴──────────┴─── ... ───────┴────────┴── ...
//!          bp-4     bp         bp+4                      bp+size-8
//! ```
//!
//! Everything here is offset arithmetic over a byte slice. Out-of-range
//! offsets panic in the indexing accessors; the `try_` variants return
//! `None` instead and are what the consistency checker, pointer
//! validation and the block walk behind `Heap::blocks` use.

use std::fmt;

/// Size of a tag or link word in bytes.
pub const WSIZE: usize = 4;

/// Double word: header + footer overhead of one block.
pub const DSIZE: usize = 8;

/// Block sizes and payload offsets are multiples of this.
pub const ALIGNMENT: usize = 8;

/// Smallest block that can hold a header, a footer and two links.
pub const MIN_BLOCK: usize = 16;

/// Payload offset of the prologue block.
pub(crate) const PROLOGUE: BlockPtr = BlockPtr(DSIZE as u32);

/// Payload offset of the first real block.
pub(crate) const FIRST_BLOCK: BlockPtr = BlockPtr((2 * DSIZE) as u32);

/// Bytes of the arena that never belong to a block: alignment pad,
/// prologue and epilogue.
pub const HEAP_OVERHEAD: usize = 2 * DSIZE;

const ALLOCATED_BIT: u32 = 0x1;
const SIZE_MASK: u32 = !0x7;

/// Arena-relative offset of a block's payload.
///
/// This is the "pointer" the allocator hands out. Offset 0 is never a
/// payload, which lets free-list links use 0 as "no block".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockPtr(u32);

impl BlockPtr {
    /// Wrap a payload offset.
    ///
    /// Arenas are capped at `u32::MAX` bytes, so every in-arena offset fits.
    pub(crate) fn new(offset: usize) -> Self {
        debug_assert!(offset <= u32::MAX as usize);
        Self(offset as u32)
    }

    /// Build a pointer from a raw offset, returning `None` past `u32::MAX`.
    ///
    /// Intended for tests and tooling that need to forge pointers; the heap
    /// validates every pointer it is given.
    pub fn from_offset(offset: usize) -> Option<Self> {
        u32::try_from(offset).ok().map(Self)
    }

    /// The payload offset within the arena.
    pub fn offset(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Allocation state carried in the low bit of a tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
    /// Linked into the free list; payload words 0 and 1 are links.
    Free,
    /// Handed out by the allocator; payload belongs to the caller.
    Allocated,
}

/// Decoded boundary tag: block size in bytes plus allocation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tag {
    /// Total block size including header and footer.
    pub size: usize,
    /// Allocation state.
    pub state: BlockState,
}

impl Tag {
    /// A free tag of the given size.
    pub fn free(size: usize) -> Self {
        Self {
            size,
            state: BlockState::Free,
        }
    }

    /// An allocated tag of the given size.
    pub fn allocated(size: usize) -> Self {
        Self {
            size,
            state: BlockState::Allocated,
        }
    }

    /// Pack into a single word. `size` must be a multiple of 8.
    pub fn pack(self) -> u32 {
        debug_assert_eq!(self.size % ALIGNMENT, 0, "tag size {} unaligned", self.size);
        debug_assert!(self.size <= u32::MAX as usize);
        let flag = match self.state {
            BlockState::Free => 0,
            BlockState::Allocated => ALLOCATED_BIT,
        };
        (self.size as u32 & SIZE_MASK) | flag
    }

    /// Unpack a word written by [`pack`](Self::pack).
    pub fn unpack(word: u32) -> Self {
        let state = if word & ALLOCATED_BIT != 0 {
            BlockState::Allocated
        } else {
            BlockState::Free
        };
        Self {
            size: (word & SIZE_MASK) as usize,
            state,
        }
    }

    /// Whether the block is free.
    pub fn is_free(self) -> bool {
        self.state == BlockState::Free
    }
}

/// Round `size` up to [`ALIGNMENT`].
pub fn align(size: usize) -> Option<usize> {
    size.checked_add(ALIGNMENT - 1)
        .map(|s| s & !(ALIGNMENT - 1))
}

/// Block size needed to satisfy a request of `requested` payload bytes.
///
/// Adds header and footer, rounds to the alignment and floors at
/// [`MIN_BLOCK`]. `None` on arithmetic overflow.
pub fn adjust(requested: usize) -> Option<usize> {
    requested
        .checked_add(DSIZE)
        .and_then(align)
        .map(|s| s.max(MIN_BLOCK))
}

// ── word access ────────────────────────────────────────────────

pub(crate) fn word(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; WSIZE];
    buf.copy_from_slice(&bytes[at..at + WSIZE]);
    u32::from_le_bytes(buf)
}

pub(crate) fn try_word(bytes: &[u8], at: usize) -> Option<u32> {
    let end = at.checked_add(WSIZE)?;
    let slice = bytes.get(at..end)?;
    let mut buf = [0u8; WSIZE];
    buf.copy_from_slice(slice);
    Some(u32::from_le_bytes(buf))
}

pub(crate) fn put_word(bytes: &mut [u8], at: usize, value: u32) {
    bytes[at..at + WSIZE].copy_from_slice(&value.to_le_bytes());
}

// ── tags and neighbors ─────────────────────────────────────────

/// Offset of the header word of the block at `bp`.
pub(crate) fn header(bp: BlockPtr) -> usize {
    bp.offset() - WSIZE
}

/// Offset of the footer word of a block at `bp` with the given size.
pub(crate) fn footer(bp: BlockPtr, size: usize) -> usize {
    bp.offset() + size - DSIZE
}

/// Tag read from the header of the block at `bp`.
pub(crate) fn tag(bytes: &[u8], bp: BlockPtr) -> Tag {
    Tag::unpack(word(bytes, header(bp)))
}

/// Write `tag` into both the header and the footer of the block at `bp`.
pub(crate) fn set_tag(bytes: &mut [u8], bp: BlockPtr, tag: Tag) {
    let packed = tag.pack();
    put_word(bytes, header(bp), packed);
    put_word(bytes, footer(bp, tag.size), packed);
}

/// Write a zero-size allocated header at `bp`. The epilogue has no footer.
pub(crate) fn set_epilogue(bytes: &mut [u8], bp: BlockPtr) {
    put_word(bytes, header(bp), Tag::allocated(0).pack());
}

/// Payload offset of the block physically after `bp`.
pub(crate) fn next_block(bytes: &[u8], bp: BlockPtr) -> BlockPtr {
    BlockPtr::new(bp.offset() + tag(bytes, bp).size)
}

/// Payload offset of the block physically before `bp`, found through the
/// predecessor's footer.
pub(crate) fn prev_block(bytes: &[u8], bp: BlockPtr) -> BlockPtr {
    let prev_footer = Tag::unpack(word(bytes, bp.offset() - DSIZE));
    BlockPtr::new(bp.offset() - prev_footer.size)
}

/// Tag of the block physically before `bp`, read from its footer.
pub(crate) fn prev_tag(bytes: &[u8], bp: BlockPtr) -> Tag {
    Tag::unpack(word(bytes, bp.offset() - DSIZE))
}

// ── free-list links ────────────────────────────────────────────

/// Which of a free block's two link words to access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Link {
    /// Toward larger blocks (payload word 0).
    Prev,
    /// Toward smaller blocks, i.e. toward the tail (payload word 1).
    Next,
}

impl Link {
    fn offset(self, bp: BlockPtr) -> usize {
        match self {
            Link::Prev => bp.offset(),
            Link::Next => bp.offset() + WSIZE,
        }
    }
}

pub(crate) fn link(bytes: &[u8], bp: BlockPtr, which: Link) -> Option<BlockPtr> {
    match word(bytes, which.offset(bp)) {
        0 => None,
        raw => Some(BlockPtr(raw)),
    }
}

pub(crate) fn try_link(bytes: &[u8], bp: BlockPtr, which: Link) -> Option<Option<BlockPtr>> {
    try_word(bytes, which.offset(bp)).map(|raw| match raw {
        0 => None,
        raw => Some(BlockPtr(raw)),
    })
}

pub(crate) fn set_link(bytes: &mut [u8], bp: BlockPtr, which: Link, target: Option<BlockPtr>) {
    put_word(bytes, which.offset(bp), target.map_or(0, |p| p.0));
}
