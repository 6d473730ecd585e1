//! Offline batch answering with Mo's algorithm.
//!
//! All queries are collected up front, reordered to keep the two window
//! pointers moving as little as possible, answered in one sweep, and
//! returned in their original order. There is no per-query entry point.

use std::collections::HashMap;
use std::hash::Hash;

use crate::combiner::Invertible;
use crate::error::{Error, Result};
use crate::util::{ceil_sqrt, check_range};

/// Incrementally maintained state over a contiguous window of the sequence.
///
/// The sweep calls `add_*` when an element enters the window and `remove_*`
/// when it leaves; `_left`/`_right` say which end moved. Windows whose state
/// does not depend on element order only implement `add` and `remove`.
pub trait MoWindow<T> {
    type Answer;

    /// Resets to the empty window. Called once per batch, before the sweep.
    fn clear(&mut self);

    fn add(&mut self, index: usize, value: &T);

    fn remove(&mut self, index: usize, value: &T);

    fn add_left(&mut self, index: usize, value: &T) {
        self.add(index, value);
    }

    fn add_right(&mut self, index: usize, value: &T) {
        self.add(index, value);
    }

    fn remove_left(&mut self, index: usize, value: &T) {
        self.remove(index, value);
    }

    fn remove_right(&mut self, index: usize, value: &T) {
        self.remove(index, value);
    }

    fn answer(&self) -> Self::Answer;
}

/// How the left endpoints are bucketed before sorting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockSize {
    /// `ceil(sqrt(N))`.
    #[default]
    Sqrt,
    /// `max(1, N / sqrt(Q))`, which balances left and right pointer travel
    /// for `Q` queries: O(N·√Q) total moves.
    QueryAdaptive,
    Fixed(usize),
}

impl BlockSize {
    fn resolve(self, len: usize, queries: usize) -> Result<usize> {
        match self {
            BlockSize::Sqrt => Ok(ceil_sqrt(len)),
            BlockSize::QueryAdaptive => Ok((len / ceil_sqrt(queries)).max(1)),
            BlockSize::Fixed(0) => Err(Error::UnsupportedOperation("block size must be at least 1")),
            BlockSize::Fixed(size) => Ok(size),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoConfig {
    pub block_size: BlockSize,
}

#[derive(Clone, Copy, Debug)]
struct MoEvent {
    left: usize,
    right: usize,
    index: usize,
    block: usize,
}

/// Answers a batch of inclusive `(left, right)` queries over a fixed slice.
#[derive(Clone, Copy, Debug)]
pub struct MoProcessor<'a, T> {
    values: &'a [T],
    config: MoConfig,
}

impl<'a, T> MoProcessor<'a, T> {
    pub fn new(values: &'a [T]) -> Self {
        Self::with_config(values, MoConfig::default())
    }

    pub fn with_config(values: &'a [T], config: MoConfig) -> Self {
        Self { values, config }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Validates the whole batch and returns it in sweep order: by
    /// `left / block_size`, then by `right` ascending in even blocks and
    /// descending in odd ones.
    fn schedule(&self, queries: &[(usize, usize)]) -> Result<Vec<MoEvent>> {
        for &(left, right) in queries {
            check_range(left, right, self.values.len())?;
        }
        let block_size = self.config.block_size.resolve(self.values.len(), queries.len())?;

        let mut events = queries
            .iter()
            .enumerate()
            .map(|(index, &(left, right))| MoEvent {
                left,
                right,
                index,
                block: left / block_size,
            })
            .collect::<Vec<_>>();
        events.sort_unstable_by(|a, b| {
            a.block.cmp(&b.block).then_with(|| {
                if a.block % 2 == 0 {
                    a.right.cmp(&b.right)
                } else {
                    b.right.cmp(&a.right)
                }
            })
        });
        rq_debug!(queries = queries.len(), block_size, "scheduled mo batch");
        Ok(events)
    }

    /// Original indices of `queries` in the order the sweep visits them.
    pub fn order(&self, queries: &[(usize, usize)]) -> Result<Vec<usize>> {
        Ok(self.schedule(queries)?.into_iter().map(|e| e.index).collect())
    }

    /// Total number of single-step pointer moves the sweep performs.
    pub fn pointer_moves(&self, queries: &[(usize, usize)]) -> Result<usize> {
        let (mut lo, mut hi) = (0_usize, 0_usize);
        let mut moves = 0;
        for event in self.schedule(queries)? {
            let (l, r) = (event.left, event.right + 1);
            moves += lo.abs_diff(l) + hi.abs_diff(r);
            (lo, hi) = (l, r);
        }
        Ok(moves)
    }

    /// Answers every query, returned in the order given.
    ///
    /// `window` is cleared once the batch has been validated, so it may be
    /// reused across batches. Invalid queries are reported before the window
    /// is touched; on success it is left covering the last range of the
    /// sweep.
    pub fn answer_all<W: MoWindow<T>>(
        &self,
        queries: &[(usize, usize)],
        window: &mut W,
    ) -> Result<Vec<W::Answer>> {
        let events = self.schedule(queries)?;
        let values = self.values;
        window.clear();

        // Current window is [lo, hi).
        let (mut lo, mut hi) = (0_usize, 0_usize);
        let mut answers = Vec::with_capacity(events.len());
        for event in events {
            let (l, r) = (event.left, event.right + 1);
            while lo > l {
                lo -= 1;
                window.add_left(lo, &values[lo]);
            }
            while hi < r {
                window.add_right(hi, &values[hi]);
                hi += 1;
            }
            while lo < l {
                window.remove_left(lo, &values[lo]);
                lo += 1;
            }
            while hi > r {
                hi -= 1;
                window.remove_right(hi, &values[hi]);
            }
            answers.push((event.index, window.answer()));
        }

        answers.sort_unstable_by_key(|&(index, _)| index);
        Ok(answers.into_iter().map(|(_, answer)| answer).collect())
    }
}

/// Number of distinct values in the window.
#[derive(Clone, Debug)]
pub struct DistinctCount<T> {
    counts: HashMap<T, usize>,
}

impl<T: Hash + Eq> DistinctCount<T> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }
}

impl<T: Hash + Eq> Default for DistinctCount<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone> MoWindow<T> for DistinctCount<T> {
    type Answer = usize;

    fn clear(&mut self) {
        self.counts.clear();
    }

    fn add(&mut self, _index: usize, value: &T) {
        *self.counts.entry(value.clone()).or_insert(0) += 1;
    }

    fn remove(&mut self, _index: usize, value: &T) {
        if let Some(count) = self.counts.get_mut(value) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(value);
            }
        }
    }

    fn answer(&self) -> usize {
        self.counts.len()
    }
}

/// Aggregate of the window under a commutative group combiner.
#[derive(Clone, Debug)]
pub struct CombinerWindow<C: Invertible> {
    combiner: C,
    acc: C::Value,
}

impl<C: Invertible> CombinerWindow<C> {
    pub fn new(combiner: C) -> Result<Self> {
        if !combiner.is_commutative() {
            return Err(Error::UnsupportedOperation(
                "window aggregation requires a commutative combiner",
            ));
        }
        let acc = combiner.identity();
        Ok(Self { combiner, acc })
    }
}

impl<C: Invertible> MoWindow<C::Value> for CombinerWindow<C> {
    type Answer = C::Value;

    fn clear(&mut self) {
        self.acc = self.combiner.identity();
    }

    fn add(&mut self, _index: usize, value: &C::Value) {
        self.acc = self.combiner.combine(&self.acc, value);
    }

    fn remove(&mut self, _index: usize, value: &C::Value) {
        self.acc = self.combiner.uncombine(&self.acc, value);
    }

    fn answer(&self) -> C::Value {
        self.acc.clone()
    }
}
