//! Trace replay against a heap.
//!
//! [`replay`] applies each record of a [`Trace`] to a [`Heap`], binding
//! caller ids to the blocks it hands out. Every live block is filled with
//! a pattern derived from its id, and the pattern is verified before the
//! block is freed or resized, so any operation that tramples a neighbor
//! is caught at the line that exposed it.

use indexmap::IndexMap;
use log::{debug, trace};
use tagheap_alloc::{BlockPtr, Heap, HeapStats};
use tagheap_arena::Sbrk;

use crate::error::TraceError;
use crate::types::{Op, Trace};

/// Knobs for [`replay`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Run [`Heap::check`] after every request.
    pub check_each_op: bool,
    /// Fill payloads with an id pattern and verify it survives.
    pub verify_payloads: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            check_each_op: false,
            verify_payloads: true,
        }
    }
}

impl ReplayOptions {
    /// Every check enabled.
    pub fn strict() -> Self {
        Self {
            check_each_op: true,
            verify_payloads: true,
        }
    }
}

/// Outcome of a successful replay.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayReport {
    /// Requests applied.
    pub ops: usize,
    /// Ids still live at the end.
    pub live: usize,
    /// Highest total of live requested payload bytes at any point.
    pub peak_payload: usize,
    /// Heap statistics after the last request.
    pub final_stats: HeapStats,
    /// `peak_payload` over the final arena size.
    pub utilization: f64,
}

/// A live id's block and requested size.
#[derive(Clone, Copy, Debug)]
struct Binding {
    ptr: BlockPtr,
    size: usize,
}

/// Byte written at `index` of the payload bound to `id`.
fn pattern(id: u32, index: usize) -> u8 {
    (id.wrapping_mul(0x9e37_79b9) >> 24) as u8 ^ index as u8
}

fn fill<A: Sbrk>(heap: &mut Heap<A>, line: usize, id: u32, b: Binding) -> Result<(), TraceError> {
    let payload = heap
        .payload_mut(b.ptr)
        .map_err(|source| TraceError::Heap { line, source })?;
    for (i, byte) in payload[..b.size].iter_mut().enumerate() {
        *byte = pattern(id, i);
    }
    Ok(())
}

fn verify<A: Sbrk>(
    heap: &Heap<A>,
    line: usize,
    id: u32,
    ptr: BlockPtr,
    len: usize,
) -> Result<(), TraceError> {
    let payload = heap
        .payload(ptr)
        .map_err(|source| TraceError::Heap { line, source })?;
    let intact = payload[..len]
        .iter()
        .enumerate()
        .all(|(i, &byte)| byte == pattern(id, i));
    if intact {
        Ok(())
    } else {
        Err(TraceError::Corrupted { line, id })
    }
}

/// Apply `trace` to `heap`.
///
/// Stops at the first failing request. Ids may be reused once freed.
pub fn replay<A: Sbrk>(
    trace: &Trace,
    heap: &mut Heap<A>,
    options: ReplayOptions,
) -> Result<ReplayReport, TraceError> {
    debug!(
        "replaying {} requests (check_each_op={}, verify_payloads={})",
        trace.len(),
        options.check_each_op,
        options.verify_payloads
    );
    let mut live: IndexMap<u32, Binding> = IndexMap::new();
    let mut payload = 0usize;
    let mut peak_payload = 0usize;

    for record in trace.records() {
        let line = record.line;
        trace!("line {line}: {}", record.op);
        match record.op {
            Op::Alloc { id, size } => {
                if live.contains_key(&id) {
                    return Err(TraceError::LiveId { line, id });
                }
                let ptr = heap
                    .acquire(size)
                    .map_err(|source| TraceError::Heap { line, source })?;
                let binding = Binding { ptr, size };
                if options.verify_payloads {
                    fill(heap, line, id, binding)?;
                }
                live.insert(id, binding);
                payload += size;
            }
            Op::Free { id } => {
                let binding = live
                    .swap_remove(&id)
                    .ok_or(TraceError::UnknownId { line, id })?;
                if options.verify_payloads {
                    verify(heap, line, id, binding.ptr, binding.size)?;
                }
                heap.release(binding.ptr)
                    .map_err(|source| TraceError::Heap { line, source })?;
                payload -= binding.size;
            }
            Op::Realloc { id, size } => {
                let old = *live.get(&id).ok_or(TraceError::UnknownId { line, id })?;
                if options.verify_payloads {
                    verify(heap, line, id, old.ptr, old.size)?;
                }
                let moved = heap
                    .resize(old.ptr, size)
                    .map_err(|source| TraceError::Heap { line, source })?;
                payload -= old.size;
                match moved {
                    Some(ptr) => {
                        let binding = Binding { ptr, size };
                        if options.verify_payloads {
                            verify(heap, line, id, ptr, old.size.min(size))?;
                            fill(heap, line, id, binding)?;
                        }
                        live.insert(id, binding);
                        payload += size;
                    }
                    None => {
                        live.swap_remove(&id);
                    }
                }
            }
        }
        peak_payload = peak_payload.max(payload);

        if options.check_each_op {
            heap.check()
                .map_err(|source| TraceError::Inconsistent { line, source })?;
        }
    }

    let final_stats = heap.stats();
    let utilization = if final_stats.arena_bytes == 0 {
        0.0
    } else {
        peak_payload as f64 / final_stats.arena_bytes as f64
    };
    debug!(
        "replay done: {} live ids, peak payload {peak_payload}, arena {} bytes",
        live.len(),
        final_stats.arena_bytes
    );
    Ok(ReplayReport {
        ops: trace.len(),
        live: live.len(),
        peak_payload,
        final_stats,
        utilization,
    })
}
