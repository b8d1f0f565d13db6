//! The arena-growth primitive.

use crate::error::ArenaError;

/// A contiguous byte region that only grows at its high end.
///
/// This is the boundary between the allocator and whatever supplies its
/// memory. Implementors guarantee that bytes below the break never move
/// relative to offset 0, so arena offsets stay valid across growth.
pub trait Sbrk {
    /// Extend the region by `incr` bytes.
    ///
    /// Returns the old break (the offset of the first new byte). On
    /// failure the break is unchanged and [`ArenaError::Exhausted`] is
    /// returned.
    fn sbrk(&mut self, incr: usize) -> Result<usize, ArenaError>;

    /// Move the break back to zero, discarding every byte.
    fn reset_brk(&mut self);

    /// Current break: the number of managed bytes.
    fn brk(&self) -> usize;

    /// The managed bytes, `0..brk()`.
    fn bytes(&self) -> &[u8];

    /// The managed bytes, mutably.
    fn bytes_mut(&mut self) -> &mut [u8];

    /// Upper bound on [`brk`](Self::brk).
    fn max_bytes(&self) -> usize;
}
