//! tagheap: a boundary-tag heap allocator over a growable byte arena.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the tagheap sub-crates. For most users, adding `tagheap` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tagheap::prelude::*;
//!
//! let mut heap = Heap::with_defaults().unwrap();
//!
//! let p = heap.acquire(100).unwrap();
//! heap.payload_mut(p).unwrap()[..5].copy_from_slice(b"hello");
//!
//! // Grow it; the first five bytes come along.
//! let p = heap.resize(p, 4000).unwrap().unwrap();
//! assert_eq!(&heap.payload(p).unwrap()[..5], b"hello");
//!
//! heap.release(p).unwrap();
//! assert_eq!(heap.check(), Ok(()));
//! assert_eq!(heap.stats().allocated_blocks, 0);
//! ```
//!
//! # Replaying a trace
//!
//! ```rust
//! use tagheap::prelude::*;
//!
//! let trace = Trace::parse("a 0 64\na 1 32\nr 0 512\nf 1\nf 0\n").unwrap();
//! let mut heap = Heap::with_defaults().unwrap();
//! let report = replay(&trace, &mut heap, ReplayOptions::strict()).unwrap();
//! assert_eq!(report.ops, 5);
//! assert_eq!(report.live, 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `tagheap-arena` | The `Sbrk` growth trait and the in-memory arena |
//! | [`alloc`] | `tagheap-alloc` | Block layout, free list, the heap, stats and checker |
//! | [`trace`] | `tagheap-trace` | Text traces and replay |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Arena growth primitive and in-memory arena (`tagheap-arena`).
///
/// Implement [`arena::Sbrk`] to run the heap over memory of your own.
pub use tagheap_arena as arena;

/// The allocator (`tagheap-alloc`).
///
/// [`alloc::Heap`] is the entry point; [`alloc::layout`] documents the
/// block format.
pub use tagheap_alloc as alloc;

/// Trace parsing and replay (`tagheap-trace`).
pub use tagheap_trace as trace;

/// Common imports for typical tagheap usage.
///
/// ```rust
/// use tagheap::prelude::*;
/// ```
pub mod prelude {
    // Arena
    pub use tagheap_arena::{ArenaConfig, ArenaError, MemArena, Sbrk};

    // Heap
    pub use tagheap_alloc::{BlockPtr, Heap, HeapConfig, HeapStats};

    // Errors
    pub use tagheap_alloc::{CheckError, HeapError};

    // Traces
    pub use tagheap_trace::{replay, Op, ReplayOptions, ReplayReport, Trace, TraceError};
}
