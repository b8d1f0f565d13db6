//! Proptest strategies over heap requests.

use proptest::prelude::*;
use proptest::sample::Index;

use crate::model::Step;

/// Request sizes skewed toward small blocks, with occasional large ones.
pub fn size() -> impl Strategy<Value = usize> {
    prop_oneof![
        6 => 1usize..64,
        3 => 64usize..1024,
        1 => 1024usize..16384,
    ]
}

/// A single step, weighted toward acquires so the live set grows.
pub fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => size().prop_map(Step::Acquire),
        3 => any::<Index>().prop_map(Step::Release),
        2 => (any::<Index>(), size()).prop_map(|(i, s)| Step::Resize(i, s)),
        1 => any::<Index>().prop_map(|i| Step::Resize(i, 0)),
    ]
}

/// Between 1 and `max_len` steps.
pub fn steps(max_len: usize) -> impl Strategy<Value = Vec<Step>> {
    proptest::collection::vec(step(), 1..=max_len)
}
