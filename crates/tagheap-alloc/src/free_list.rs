//! Size-ordered explicit free list.
//!
//! [`FreeList`] threads every free block into one doubly linked list kept
//! in ascending size order. The links are stored in the blocks' own
//! payload words (see [`layout`](crate::layout)), so the list itself only
//! owns a single offset: the tail, which is the smallest free block.
//!
//! ```text
//! tail ──prev──▶ larger ──prev──▶ ... ──prev──▶ largest (prev = none)
//!      ◀──next──        ◀──next──     ◀──next──
//! ```
//!
//! Walking from the tail and stopping at the first block that is large
//! enough therefore yields the smallest sufficient block (best fit).
//! No head is tracked: reaching the largest block is a full walk.

use crate::layout::{self, BlockPtr, Link};

/// Tail-anchored, ascending-size free list over arena bytes.
///
/// Every method takes the arena bytes explicitly; the list owns nothing
/// but the tail offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FreeList {
    tail: Option<BlockPtr>,
}

impl FreeList {
    /// An empty list.
    pub fn new() -> Self {
        Self { tail: None }
    }

    /// The smallest free block, if any.
    pub fn tail(&self) -> Option<BlockPtr> {
        self.tail
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.tail.is_none()
    }

    /// Splice the free block at `bp` (of `size` bytes) into size order.
    ///
    /// Walks from the tail past every strictly smaller block. Ties are
    /// placed on the tail side of existing equal-sized blocks.
    pub fn insert(&mut self, bytes: &mut [u8], bp: BlockPtr, size: usize) {
        let mut larger = self.tail;
        let mut smaller = None;
        while let Some(candidate) = larger {
            if size <= layout::tag(bytes, candidate).size {
                break;
            }
            smaller = Some(candidate);
            larger = layout::link(bytes, candidate, Link::Prev);
        }

        layout::set_link(bytes, bp, Link::Prev, larger);
        layout::set_link(bytes, bp, Link::Next, smaller);
        if let Some(l) = larger {
            layout::set_link(bytes, l, Link::Next, Some(bp));
        }
        match smaller {
            Some(s) => layout::set_link(bytes, s, Link::Prev, Some(bp)),
            None => self.tail = Some(bp),
        }
    }

    /// Unlink the free block at `bp` using its own links.
    ///
    /// `bp` must currently be in the list. Removing the only element
    /// leaves the list empty.
    pub fn remove(&mut self, bytes: &mut [u8], bp: BlockPtr) {
        let larger = layout::link(bytes, bp, Link::Prev);
        let smaller = layout::link(bytes, bp, Link::Next);
        if let Some(l) = larger {
            layout::set_link(bytes, l, Link::Next, smaller);
        }
        match smaller {
            Some(s) => layout::set_link(bytes, s, Link::Prev, larger),
            None => self.tail = larger,
        }
    }

    /// The smallest free block of at least `size` bytes.
    pub fn find_fit(&self, bytes: &[u8], size: usize) -> Option<BlockPtr> {
        self.iter(bytes)
            .find(|&bp| layout::tag(bytes, bp).size >= size)
    }

    /// Iterate from the smallest block toward the largest.
    pub fn iter<'a>(&self, bytes: &'a [u8]) -> Iter<'a> {
        Iter {
            bytes,
            cursor: self.tail,
        }
    }
}

/// Iterator over a [`FreeList`], smallest block first.
pub struct Iter<'a> {
    bytes: &'a [u8],
    cursor: Option<BlockPtr>,
}

impl Iterator for Iter<'_> {
    type Item = BlockPtr;

    fn next(&mut self) -> Option<BlockPtr> {
        let current = self.cursor?;
        self.cursor = layout::link(self.bytes, current, Link::Prev);
        Some(current)
    }
}
