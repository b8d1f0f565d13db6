//! Growable byte arena for the tagheap allocator.
//!
//! Provides the single contiguous region that the allocator carves blocks
//! out of, and the `sbrk`-style primitive used to grow it. The arena knows
//! nothing about blocks: it only hands out more bytes at the break and
//! reports exhaustion when the configured ceiling would be crossed.
//!
//! # Architecture
//!
//! ```text
//! Sbrk (growth primitive, trait)
//! └── MemArena (Vec<u8>-backed, capped at ArenaConfig::max_bytes)
//! ```
//!
//! All offsets handed out by the arena are relative to its first byte, so
//! the allocator built on top never needs raw pointers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod mem;
pub mod sbrk;

pub use config::ArenaConfig;
pub use error::ArenaError;
pub use mem::MemArena;
pub use sbrk::Sbrk;
