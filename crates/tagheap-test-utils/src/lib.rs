//! Test utilities and fixtures for tagheap development.
//!
//! Provides a [`HeapBuilder`] for small, quickly exhausted heaps, a
//! [`FlakyArena`] mock whose growth fails on demand, a [`Model`] that
//! drives a heap while tracking what every live block should contain,
//! proptest strategies over request sequences, and a seeded workload
//! generator producing replayable traces.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod model;
pub mod strategies;
pub mod workload;

pub use fixtures::{FlakyArena, HeapBuilder};
pub use model::{Model, Step};
pub use workload::Workload;
