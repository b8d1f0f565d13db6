//! A reference model that drives a heap and tracks expected contents.

use indexmap::IndexMap;
use proptest::sample::Index;
use tagheap_alloc::{BlockPtr, Heap, HeapError};
use tagheap_arena::Sbrk;

/// One request against the model, with targets chosen by index into the
/// current live set.
#[derive(Clone, Debug)]
pub enum Step {
    Acquire(usize),
    Release(Index),
    Resize(Index, usize),
}

#[derive(Clone, Copy, Debug)]
struct Live {
    ptr: BlockPtr,
    size: usize,
    seed: u8,
}

/// Drives a heap and remembers what every live block should hold.
///
/// Each acquired block is filled with bytes derived from a per-block seed;
/// [`verify`](Model::verify) checks every live block still holds them.
#[derive(Debug, Default)]
pub struct Model {
    live: IndexMap<u64, Live>,
    next_key: u64,
}

fn byte(seed: u8, index: usize) -> u8 {
    seed.wrapping_add(index as u8).rotate_left(3)
}

fn fill<A: Sbrk>(heap: &mut Heap<A>, live: Live) {
    let payload = heap.payload_mut(live.ptr).expect("live block");
    for (i, b) in payload[..live.size].iter_mut().enumerate() {
        *b = byte(live.seed, i);
    }
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Sum of requested sizes of live blocks.
    pub fn live_bytes(&self) -> usize {
        self.live.values().map(|l| l.size).sum()
    }

    pub fn pointers(&self) -> impl Iterator<Item = BlockPtr> + '_ {
        self.live.values().map(|l| l.ptr)
    }

    /// Apply one step. Heap errors (such as out of memory) are returned
    /// with the model unchanged; steps that target an empty live set are
    /// skipped.
    pub fn apply<A: Sbrk>(&mut self, heap: &mut Heap<A>, step: &Step) -> Result<(), HeapError> {
        match *step {
            Step::Acquire(size) => {
                let ptr = heap.acquire(size)?;
                let live = Live {
                    ptr,
                    size,
                    seed: self.next_key as u8,
                };
                fill(heap, live);
                self.live.insert(self.next_key, live);
                self.next_key += 1;
            }
            Step::Release(ref idx) => {
                if self.live.is_empty() {
                    return Ok(());
                }
                let i = idx.index(self.live.len());
                let (_, live) = self.live.get_index(i).expect("index in range");
                heap.release(live.ptr)?;
                self.live.swap_remove_index(i);
            }
            Step::Resize(ref idx, size) => {
                if self.live.is_empty() {
                    return Ok(());
                }
                let i = idx.index(self.live.len());
                let (&key, &old) = self.live.get_index(i).expect("index in range");
                match heap.resize(old.ptr, size)? {
                    None => {
                        self.live.swap_remove_index(i);
                    }
                    Some(ptr) => {
                        let kept = old.size.min(size);
                        let payload = heap.payload(ptr).expect("resized block is live");
                        assert!(
                            payload[..kept]
                                .iter()
                                .enumerate()
                                .all(|(j, &b)| b == byte(old.seed, j)),
                            "resize of {} to {size} lost contents",
                            old.ptr
                        );
                        let live = Live { ptr, size, seed: old.seed };
                        fill(heap, live);
                        self.live.insert(key, live);
                    }
                }
            }
        }
        Ok(())
    }

    /// Check every live block still holds its pattern and fits its
    /// usable size.
    pub fn verify<A: Sbrk>(&self, heap: &Heap<A>) -> Result<(), String> {
        for (key, live) in &self.live {
            let payload = heap
                .payload(live.ptr)
                .map_err(|e| format!("block {key} at {}: {e}", live.ptr))?;
            if payload.len() < live.size {
                return Err(format!(
                    "block {key} at {} has {} usable bytes, asked for {}",
                    live.ptr,
                    payload.len(),
                    live.size
                ));
            }
            if let Some(j) = (0..live.size).find(|&j| payload[j] != byte(live.seed, j)) {
                return Err(format!("block {key} at {} corrupted at byte {j}", live.ptr));
            }
        }
        Ok(())
    }

    /// Release every live block.
    pub fn drain<A: Sbrk>(&mut self, heap: &mut Heap<A>) -> Result<(), HeapError> {
        while let Some((_, live)) = self.live.pop() {
            heap.release(live.ptr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeapBuilder;
    use proptest::strategy::{Strategy, ValueTree};
    use proptest::test_runner::TestRunner;

    fn index() -> Index {
        let mut runner = TestRunner::deterministic();
        proptest::arbitrary::any::<Index>()
            .new_tree(&mut runner)
            .unwrap()
            .current()
    }

    #[test]
    fn tracks_blocks_through_resize_and_release() {
        let mut heap = HeapBuilder::new().build();
        let mut model = Model::new();
        model.apply(&mut heap, &Step::Acquire(24)).unwrap();
        model.apply(&mut heap, &Step::Acquire(40)).unwrap();
        model.apply(&mut heap, &Step::Resize(index(), 900)).unwrap();
        assert_eq!(model.live_count(), 2);
        model.verify(&heap).unwrap();
        model.apply(&mut heap, &Step::Release(index())).unwrap();
        assert_eq!(model.live_count(), 1);
        model.drain(&mut heap).unwrap();
        assert_eq!(heap.stats().allocated_blocks, 0);
    }

    #[test]
    fn steps_on_empty_model_are_skipped() {
        let mut heap = HeapBuilder::new().build();
        let mut model = Model::new();
        model.apply(&mut heap, &Step::Release(index())).unwrap();
        model.apply(&mut heap, &Step::Resize(index(), 10)).unwrap();
        assert_eq!(model.live_count(), 0);
    }

    #[test]
    fn verify_catches_overwrite() {
        let mut heap = HeapBuilder::new().build();
        let mut model = Model::new();
        model.apply(&mut heap, &Step::Acquire(16)).unwrap();
        let ptr = model.pointers().next().unwrap();
        heap.payload_mut(ptr).unwrap()[3] ^= 0xff;
        assert!(model.verify(&heap).is_err());
    }
}
