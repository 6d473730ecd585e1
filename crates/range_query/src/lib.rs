//! Range-query engine: interchangeable backends answering associative
//! aggregate queries over contiguous ranges of a sequence.
//!
//! | backend                   | update                | query        | combiner            |
//! |---------------------------|-----------------------|--------------|---------------------|
//! | [`FenwickIndex`]          | point delta, O(log N) | O(log N)     | commutative group   |
//! | [`SegmentTree`]           | point set, O(log N)   | O(log N)     | any                 |
//! | [`LazySegmentTree`]       | range tag, O(log N)   | O(log N)     | [`LazyCombiner`]    |
//! | [`PersistentSegmentTree`] | versioned, O(log N)   | O(log N)     | any                 |
//! | [`SparseTable`]           | none                  | O(1)         | idempotent          |
//! | [`SqrtDecomposition`]     | point set, O(√N)      | O(√N)        | any                 |
//! | [`MoProcessor`]           | none (offline batch)  | O((N+Q)·√N)  | caller's window     |
//!
//! Queries take an inclusive `(left, right)` pair with
//! `left <= right < len`; anything else is [`Error::InvalidRange`].

#[macro_use]
mod macros;

pub mod combiner;
mod error;
mod fenwick;
mod lazy_segment_tree;
pub mod mo;
mod persistent_segment_tree;
mod segment_tree;
mod sparse_table;
mod sqrt_decomposition;
mod util;

pub use combiner::{Combiner, FnCombiner, Gcd, Invertible, Max, Min, Sum, Xor, check_laws};
pub use error::{Error, Result};
pub use fenwick::FenwickIndex;
pub use lazy_segment_tree::{LazyCombiner, LazySegmentTree, Tag};
pub use mo::{BlockSize, CombinerWindow, DistinctCount, MoConfig, MoProcessor, MoWindow};
pub use persistent_segment_tree::{PersistentSegmentTree, Version};
pub use segment_tree::SegmentTree;
pub use sparse_table::SparseTable;
pub use sqrt_decomposition::SqrtDecomposition;

/// Single-state range aggregation shared by every mutable-in-place backend.
///
/// `fold` takes `&mut self` because lazy backends flush pending tags while
/// answering.
pub trait RangeQuery {
    type Value;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate of `[left, right]`.
    fn fold(&mut self, left: usize, right: usize) -> Result<Self::Value>;
}

pub trait PointUpdate: RangeQuery {
    /// Replaces the element at `index`.
    fn set(&mut self, index: usize, value: Self::Value) -> Result<()>;
}
