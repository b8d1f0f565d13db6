//! Boundary-tag allocator over a single growable arena.
//!
//! Implements acquire/release/resize over the bytes of one [`Sbrk`] arena.
//! All bookkeeping lives inside the arena itself: every block carries a
//! header and footer word, and free blocks reuse their first two payload
//! words as links of a size-ordered free list.
//!
//! # Architecture
//!
//! ```text
//! Heap<A: Sbrk> (allocation engine)
//! ├── layout    boundary-tag codec, offset arithmetic, word access
//! ├── FreeList  ascending-size doubly linked list, tail-anchored
//! ├── check     consistency checker (diagnostic, never on the hot path)
//! └── HeapStats arena walk + operation counters
//! ```
//!
//! # Arena layout
//!
//! ```text
//! | pad | prologue hdr | prologue ftr | block ... block | epilogue hdr |
//! 0     4              8              16                brk-4        brk
//! ```
//!
//! Every offset handed out is arena-relative, so no `unsafe` is needed
//! anywhere in the allocator.
//!
//! [`Sbrk`]: tagheap_arena::Sbrk

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod check;
pub mod config;
pub mod error;
pub mod free_list;
pub mod heap;
pub mod layout;
pub mod stats;

pub use check::CheckError;
pub use config::HeapConfig;
pub use error::HeapError;
pub use free_list::FreeList;
pub use heap::Heap;
pub use layout::{BlockPtr, BlockState, Tag};
pub use stats::{BlockInfo, HeapStats};
