//! The allocation engine.
//!
//! [`Heap`] owns an [`Sbrk`] arena and a [`FreeList`] and implements
//! acquire (malloc), release (free) and resize (realloc) on top of the
//! boundary-tag layout. Freed blocks are coalesced immediately, so no two
//! physically adjacent blocks are ever both free.

use tagheap_arena::{ArenaConfig, ArenaError, MemArena, Sbrk};

use crate::config::HeapConfig;
use crate::error::HeapError;
use crate::free_list::FreeList;
use crate::layout::{self, BlockPtr, Tag, DSIZE, FIRST_BLOCK, MIN_BLOCK, PROLOGUE, WSIZE};
use crate::stats::Counters;

/// A boundary-tag allocator over a single growable arena.
///
/// Every pointer handed out is an arena-relative [`BlockPtr`]; use
/// [`payload`](Self::payload) / [`payload_mut`](Self::payload_mut) to reach
/// the bytes. The heap is single-threaded: wrap it in a lock to share it.
pub struct Heap<A: Sbrk = MemArena> {
    pub(crate) arena: A,
    pub(crate) config: HeapConfig,
    pub(crate) free_list: FreeList,
    pub(crate) counters: Counters,
}

impl Heap<MemArena> {
    /// A heap over a default 20 MiB [`MemArena`] with default config.
    pub fn with_defaults() -> Result<Self, HeapError> {
        Self::new(MemArena::default(), HeapConfig::default())
    }
}

impl<A: Sbrk> Heap<A> {
    /// Build a heap over `arena` and run [`init`](Self::init).
    ///
    /// Arenas that can grow past `u32::MAX` bytes are rejected: block
    /// offsets and tags are 32-bit.
    pub fn new(arena: A, config: HeapConfig) -> Result<Self, HeapError> {
        config.validate()?;
        if arena.max_bytes() > ArenaConfig::MAX_ADDRESSABLE {
            return Err(HeapError::InvalidConfig {
                reason: format!(
                    "arena limit {} exceeds the addressable {} bytes",
                    arena.max_bytes(),
                    ArenaConfig::MAX_ADDRESSABLE
                ),
            });
        }
        let mut heap = Self {
            arena,
            config,
            free_list: FreeList::new(),
            counters: Counters::default(),
        };
        heap.init()?;
        Ok(heap)
    }

    /// Reset the arena and lay down a fresh prologue and epilogue.
    ///
    /// Every previously returned pointer becomes invalid. If the
    /// configured initial extension is non-zero, the arena is grown by it
    /// so the first acquire does not need to.
    pub fn init(&mut self) -> Result<(), HeapError> {
        self.arena.reset_brk();
        self.free_list = FreeList::new();
        self.counters = Counters::default();

        let bootstrap = 4 * WSIZE;
        self.arena
            .sbrk(bootstrap)
            .map_err(|source| HeapError::OutOfMemory {
                requested: bootstrap,
                source,
            })?;
        let bytes = self.arena.bytes_mut();
        layout::put_word(bytes, 0, 0);
        layout::set_tag(bytes, PROLOGUE, Tag::allocated(DSIZE));
        layout::set_epilogue(bytes, FIRST_BLOCK);

        if self.config.initial_extend > 0 {
            self.extend(self.config.initial_extend)?;
        }
        log::debug!(
            "heap initialised: brk {} bytes, chunk {} bytes",
            self.arena.brk(),
            self.config.chunk_size
        );
        Ok(())
    }

    /// Allocate a block with at least `size` usable bytes.
    ///
    /// Picks the smallest free block that fits, growing the arena by at
    /// least one chunk if none does. The payload contents are unspecified.
    pub fn acquire(&mut self, size: usize) -> Result<BlockPtr, HeapError> {
        if size == 0 {
            return Err(HeapError::InvalidSize { requested: size });
        }
        let adjusted = layout::adjust(size).ok_or(HeapError::InvalidSize { requested: size })?;

        let bp = match self.free_list.find_fit(self.arena.bytes(), adjusted) {
            Some(bp) => bp,
            None => self.extend(adjusted.max(self.config.chunk_size))?,
        };
        self.place(bp, adjusted);
        self.counters.acquires += 1;
        log::trace!("acquire({size}) -> {bp} (block {adjusted})");
        Ok(bp)
    }

    /// Free the block at `ptr`, merging it with any free neighbors.
    ///
    /// Pointers that do not name a live block are rejected without
    /// touching the heap.
    pub fn release(&mut self, ptr: BlockPtr) -> Result<(), HeapError> {
        let tag = self.live_tag(ptr)?;
        self.free_block(ptr, tag.size);
        self.counters.releases += 1;
        log::trace!("release({ptr}) block {}", tag.size);
        Ok(())
    }

    /// Change the usable size of the block at `ptr` to at least `size`.
    ///
    /// - `size == 0` releases the block and returns `Ok(None)`.
    /// - If the block is already big enough it is returned unchanged; the
    ///   heap never shrinks a block on resize.
    /// - Otherwise the block grows in place by absorbing a free successor
    ///   and, when it sits at the end of the arena, by growing the arena.
    /// - Failing that, the contents move to a new block and the old one is
    ///   released.
    ///
    /// Contents up to the smaller of the old usable size and `size` are
    /// preserved. On error the heap is unchanged and `ptr` stays valid.
    pub fn resize(&mut self, ptr: BlockPtr, size: usize) -> Result<Option<BlockPtr>, HeapError> {
        if size == 0 {
            self.release(ptr)?;
            return Ok(None);
        }
        let current = self.live_tag(ptr)?.size;
        let adjusted = layout::adjust(size).ok_or(HeapError::InvalidSize { requested: size })?;

        if current >= adjusted {
            self.counters.resizes += 1;
            log::trace!("resize({ptr}, {size}) fits in block {current}");
            return Ok(Some(ptr));
        }

        match self.grow_in_place(ptr, current, adjusted) {
            Ok(true) => {
                self.counters.resizes += 1;
                log::trace!("resize({ptr}, {size}) grew in place");
                return Ok(Some(ptr));
            }
            Ok(false) => {}
            Err(err) => {
                log::debug!("in-place growth of {ptr} failed ({err}), relocating");
            }
        }

        let moved = self.acquire(size)?;
        let copy = (current - DSIZE).min(size);
        let bytes = self.arena.bytes_mut();
        bytes.copy_within(ptr.offset()..ptr.offset() + copy, moved.offset());
        self.free_block(ptr, current);
        self.counters.resizes += 1;
        self.counters.relocations += 1;
        log::trace!("resize({ptr}, {size}) moved to {moved}, copied {copy} bytes");
        Ok(Some(moved))
    }

    /// The usable bytes of the live block at `ptr`.
    pub fn payload(&self, ptr: BlockPtr) -> Result<&[u8], HeapError> {
        let size = self.live_tag(ptr)?.size;
        Ok(&self.arena.bytes()[ptr.offset()..ptr.offset() + size - DSIZE])
    }

    /// The usable bytes of the live block at `ptr`, mutably.
    pub fn payload_mut(&mut self, ptr: BlockPtr) -> Result<&mut [u8], HeapError> {
        let size = self.live_tag(ptr)?.size;
        Ok(&mut self.arena.bytes_mut()[ptr.offset()..ptr.offset() + size - DSIZE])
    }

    /// Number of usable bytes in the live block at `ptr`.
    ///
    /// Always at least the size that was requested for it.
    pub fn usable_size(&self, ptr: BlockPtr) -> Result<usize, HeapError> {
        Ok(self.live_tag(ptr)?.size - DSIZE)
    }

    /// Current arena size in bytes.
    pub fn arena_bytes(&self) -> usize {
        self.arena.brk()
    }

    /// The configuration the heap was built with.
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// The free list's tail (smallest free block), if any.
    pub fn free_list(&self) -> &FreeList {
        &self.free_list
    }

    /// Read-only access to the arena.
    pub fn arena(&self) -> &A {
        &self.arena
    }

    /// Tear the heap down, returning its arena.
    pub fn into_arena(self) -> A {
        self.arena
    }

    // ── internals ──────────────────────────────────────────────

    /// Validate that `ptr` names a live (allocated) block and return its tag.
    fn live_tag(&self, ptr: BlockPtr) -> Result<Tag, HeapError> {
        let bytes = self.arena.bytes();
        let brk = bytes.len();
        let bp = ptr.offset();
        if bp < FIRST_BLOCK.offset() || bp % layout::ALIGNMENT != 0 || bp >= brk {
            log::warn!("rejected pointer {ptr} outside the block area");
            return Err(HeapError::InvalidPointer { ptr });
        }
        let head = layout::try_word(bytes, layout::header(ptr))
            .map(Tag::unpack)
            .ok_or(HeapError::InvalidPointer { ptr })?;
        // The block, footer included, must end before the epilogue header.
        let fits = bp.checked_add(head.size).is_some_and(|end| end <= brk);
        if head.size < MIN_BLOCK || !fits {
            log::warn!("rejected pointer {ptr} with implausible size {}", head.size);
            return Err(HeapError::InvalidPointer { ptr });
        }
        let foot = layout::try_word(bytes, layout::footer(ptr, head.size)).map(Tag::unpack);
        if foot != Some(head) {
            log::warn!("rejected pointer {ptr}: header and footer disagree");
            return Err(HeapError::InvalidPointer { ptr });
        }
        if head.is_free() {
            log::warn!("rejected double free of {ptr}");
            return Err(HeapError::DoubleFree { ptr });
        }
        Ok(head)
    }

    /// Grow the arena by `size` bytes (rounded up to the alignment) and
    /// return the resulting free block after coalescing with a free
    /// predecessor. The block is in the free list.
    fn extend(&mut self, size: usize) -> Result<BlockPtr, HeapError> {
        let size = layout::align(size).ok_or(HeapError::InvalidSize { requested: size })?;
        let brk = self.arena.brk();
        if brk.checked_add(size).is_none_or(|end| end > ArenaConfig::MAX_ADDRESSABLE) {
            log::warn!("refusing growth by {size} bytes past the addressable limit");
            return Err(HeapError::OutOfMemory {
                requested: size,
                source: ArenaError::Exhausted {
                    requested: size,
                    brk,
                    max: ArenaConfig::MAX_ADDRESSABLE,
                },
            });
        }
        let old_brk = self
            .arena
            .sbrk(size)
            .map_err(|source| HeapError::OutOfMemory {
                requested: size,
                source,
            })?;

        // The old epilogue header becomes the new block's header.
        let bp = BlockPtr::new(old_brk);
        let bytes = self.arena.bytes_mut();
        layout::set_tag(bytes, bp, Tag::free(size));
        let epilogue = layout::next_block(bytes, bp);
        layout::set_epilogue(bytes, epilogue);
        self.counters.grows += 1;
        log::debug!("arena grown by {size} bytes to {}", self.arena.brk());
        Ok(self.coalesce(bp))
    }

    /// Merge the free block at `bp` with its free physical neighbors and
    /// insert the result into the free list. Returns the merged block.
    fn coalesce(&mut self, bp: BlockPtr) -> BlockPtr {
        let bytes = self.arena.bytes_mut();
        let mut bp = bp;
        let mut size = layout::tag(bytes, bp).size;

        let next = layout::next_block(bytes, bp);
        let next_tag = layout::tag(bytes, next);
        if next_tag.is_free() {
            self.free_list.remove(bytes, next);
            size += next_tag.size;
        }

        let prev_tag = layout::prev_tag(bytes, bp);
        if prev_tag.is_free() {
            let prev = layout::prev_block(bytes, bp);
            self.free_list.remove(bytes, prev);
            size += prev_tag.size;
            bp = prev;
        }

        layout::set_tag(bytes, bp, Tag::free(size));
        self.free_list.insert(bytes, bp, size);
        bp
    }

    /// Mark the allocated block at `bp` free and coalesce it.
    fn free_block(&mut self, bp: BlockPtr, size: usize) {
        layout::set_tag(self.arena.bytes_mut(), bp, Tag::free(size));
        self.coalesce(bp);
    }

    /// Carve an allocated block of `adjusted` bytes out of the free block
    /// at `bp`, returning any usable remainder to the free list.
    fn place(&mut self, bp: BlockPtr, adjusted: usize) {
        let bytes = self.arena.bytes_mut();
        self.free_list.remove(bytes, bp);
        let size = layout::tag(bytes, bp).size;
        self.split(bp, size, adjusted);
    }

    /// Turn the detached region `bp..bp + size` into an allocated block of
    /// `adjusted` bytes, splitting off a free remainder if one fits.
    fn split(&mut self, bp: BlockPtr, size: usize, adjusted: usize) {
        let bytes = self.arena.bytes_mut();
        let rest = size - adjusted;
        if rest >= MIN_BLOCK {
            layout::set_tag(bytes, bp, Tag::allocated(adjusted));
            let remainder = layout::next_block(bytes, bp);
            layout::set_tag(bytes, remainder, Tag::free(rest));
            self.free_list.insert(bytes, remainder, rest);
        } else {
            layout::set_tag(bytes, bp, Tag::allocated(size));
        }
    }

    /// Try to grow the allocated block at `ptr` (currently `current`
    /// bytes) to `adjusted` bytes without moving it.
    ///
    /// Returns `Ok(false)` when the neighborhood cannot be extended, and an
    /// error only when arena growth was attempted and refused.
    fn grow_in_place(
        &mut self,
        ptr: BlockPtr,
        current: usize,
        adjusted: usize,
    ) -> Result<bool, HeapError> {
        let bytes = self.arena.bytes();
        let next = layout::next_block(bytes, ptr);
        let next_tag = layout::tag(bytes, next);
        let available = if next_tag.is_free() {
            current + next_tag.size
        } else {
            current
        };

        let absorbed = if next_tag.is_free() && available >= adjusted {
            self.free_list.remove(self.arena.bytes_mut(), next);
            next_tag.size
        } else {
            // Only a block that ends at the epilogue (possibly through one
            // free successor) can be extended by growing the arena.
            let last = if next_tag.is_free() {
                layout::next_block(bytes, next)
            } else {
                next
            };
            if layout::tag(bytes, last).size != 0 {
                return Ok(false);
            }
            let shortfall = adjusted - available;
            let grown = self.extend(shortfall.max(self.config.chunk_size))?;
            debug_assert_eq!(grown, next);
            let bytes = self.arena.bytes_mut();
            self.free_list.remove(bytes, grown);
            layout::tag(bytes, grown).size
        };

        self.split(ptr, current + absorbed, adjusted);
        Ok(true)
    }
}
