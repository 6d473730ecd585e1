use crate::combiner::{Combiner, Invertible, debug_check_laws};
use crate::error::{Error, Result};
use crate::util::{check_index, check_range};
use crate::{PointUpdate, RangeQuery};

/// Fenwick (binary indexed) tree over a commutative group.
///
/// `tree[i]` holds the aggregate of `[i & (i + 1), i]`. Range aggregates are
/// recovered by subtracting two prefixes, hence the [`Invertible`] bound.
#[derive(Clone, Debug)]
pub struct FenwickIndex<C: Invertible> {
    combiner: C,
    tree: Vec<C::Value>,
}

impl<C: Invertible> FenwickIndex<C> {
    /// A sequence of `len` identity elements.
    pub fn new(combiner: C, len: usize) -> Result<Self> {
        Self::require_commutative(&combiner)?;
        let tree = (0..len).map(|_| combiner.identity()).collect();
        Ok(Self { combiner, tree })
    }

    /// Builds in O(N) by pushing every node into its parent once.
    pub fn from_values(combiner: C, values: &[C::Value]) -> Result<Self> {
        Self::require_commutative(&combiner)?;
        debug_check_laws(&combiner, values)?;

        let n = values.len();
        let mut tree = values.to_vec();
        for i in 0..n {
            let parent = i | (i + 1);
            if parent < n {
                tree[parent] = combiner.combine(&tree[parent], &tree[i]);
            }
        }
        rq_debug!(len = n, "built fenwick index");
        Ok(Self { combiner, tree })
    }

    fn require_commutative(combiner: &C) -> Result<()> {
        if !combiner.is_commutative() {
            return Err(Error::UnsupportedOperation(
                "fenwick index requires a commutative combiner",
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Folds `delta` into the element at `index`.
    pub fn update(&mut self, index: usize, delta: C::Value) -> Result<()> {
        check_index(index, self.len())?;
        let mut idx = index;
        while idx < self.tree.len() {
            self.tree[idx] = self.combiner.combine(&self.tree[idx], &delta);
            idx |= idx + 1;
        }
        Ok(())
    }

    // Aggregate of [0, end).
    fn prefix_exclusive(&self, end: usize) -> C::Value {
        debug_assert!(end <= self.tree.len());
        let mut acc = self.combiner.identity();
        let mut r = end;
        while r > 0 {
            acc = self.combiner.combine(&self.tree[r - 1], &acc);
            r &= r - 1;
        }
        acc
    }

    /// Aggregate of `[0, index]`.
    pub fn prefix_query(&self, index: usize) -> Result<C::Value> {
        check_index(index, self.len())?;
        Ok(self.prefix_exclusive(index + 1))
    }

    /// Aggregate of `[left, right]`.
    pub fn range_query(&self, left: usize, right: usize) -> Result<C::Value> {
        check_range(left, right, self.len())?;
        let total = self.prefix_exclusive(right + 1);
        let before = self.prefix_exclusive(left);
        Ok(self.combiner.uncombine(&total, &before))
    }

    pub fn get(&self, index: usize) -> Result<C::Value> {
        self.range_query(index, index)
    }

    /// Replaces the element at `index` by applying the difference to the
    /// current value.
    pub fn set(&mut self, index: usize, value: C::Value) -> Result<()> {
        let current = self.get(index)?;
        let delta = self.combiner.uncombine(&value, &current);
        self.update(index, delta)
    }

    /// Returns the largest `k` such that `pred(aggregate of [0, k))` holds,
    /// assuming `pred` is monotone (true, then false) over prefix lengths and
    /// holds for the identity.
    pub fn partition_point(&self, mut pred: impl FnMut(&C::Value) -> bool) -> usize {
        let n = self.tree.len();
        if n == 0 {
            return 0;
        }
        let mut idx = 0;
        let mut acc = self.combiner.identity();
        let mut step = 1_usize << (usize::BITS - 1 - n.leading_zeros());
        while step > 0 {
            let next = idx + step;
            if next <= n {
                let candidate = self.combiner.combine(&acc, &self.tree[next - 1]);
                if pred(&candidate) {
                    acc = candidate;
                    idx = next;
                }
            }
            step >>= 1;
        }
        idx
    }
}

impl<C: Invertible> RangeQuery for FenwickIndex<C> {
    type Value = C::Value;

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn fold(&mut self, left: usize, right: usize) -> Result<C::Value> {
        self.range_query(left, right)
    }
}

impl<C: Invertible> PointUpdate for FenwickIndex<C> {
    fn set(&mut self, index: usize, value: C::Value) -> Result<()> {
        FenwickIndex::set(self, index, value)
    }
}
