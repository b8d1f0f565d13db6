//! Allocation trace parsing and replay for tagheap.
//!
//! Drives a [`Heap`](tagheap_alloc::Heap) from a text trace of allocate,
//! free and reallocate requests, verifying along the way that no block's
//! contents are disturbed by any other operation.
//!
//! # Architecture
//!
//! - [`TraceReader`] parses records from any `BufRead` source
//! - [`Trace`] holds a parsed trace and renders it back to text
//! - [`replay`] runs a trace against a heap and returns a [`ReplayReport`]
//!
//! # Format
//!
//! ```text
//! # comment
//! a <id> <size>    allocate <size> bytes under <id>
//! r <id> <size>    reallocate <id> to <size> bytes (0 frees)
//! f <id>           free <id>
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod reader;
pub mod replay;
pub mod types;

pub use error::TraceError;
pub use reader::TraceReader;
pub use replay::{replay, ReplayOptions, ReplayReport};
pub use types::{Op, Record, Trace};
