use crate::combiner::{Combiner, debug_check_laws};
use crate::error::{Error, Result};
use crate::util::{check_index, check_range};
use crate::{PointUpdate, RangeQuery};

/// Point-update, range-query segment tree.
///
/// Nodes live in one arena: the root at index 1, children of `i` at `2i` and
/// `2i + 1`, leaf `j` at `size + j`. Leaves past `len` hold the identity.
#[derive(Clone, Debug)]
pub struct SegmentTree<C: Combiner> {
    combiner: C,
    len: usize,
    size: usize,
    tree: Vec<C::Value>,
}

impl<C: Combiner> SegmentTree<C> {
    pub fn new(combiner: C, values: &[C::Value]) -> Result<Self> {
        debug_check_laws(&combiner, values)?;

        let len = values.len();
        let size = len.next_power_of_two();
        let mut tree = Vec::with_capacity(2 * size);
        tree.extend((0..size).map(|_| combiner.identity()));
        tree.extend_from_slice(values);
        tree.extend((len..size).map(|_| combiner.identity()));
        for i in (1..size).rev() {
            tree[i] = combiner.combine(&tree[2 * i], &tree[2 * i + 1]);
        }

        rq_debug!(len, size, "built segment tree");
        Ok(Self {
            combiner,
            len,
            size,
            tree,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Result<&C::Value> {
        check_index(index, self.len)?;
        Ok(&self.tree[self.size + index])
    }

    /// Aggregate of the whole sequence.
    pub fn total(&self) -> C::Value {
        match self.len {
            0 => self.combiner.identity(),
            _ => self.tree[1].clone(),
        }
    }

    /// Replaces the element at `index` and recomputes its ancestors.
    pub fn update(&mut self, index: usize, value: C::Value) -> Result<()> {
        check_index(index, self.len)?;
        let mut i = self.size + index;
        self.tree[i] = value;
        while i > 1 {
            i >>= 1;
            self.tree[i] = self.combiner.combine(&self.tree[2 * i], &self.tree[2 * i + 1]);
        }
        Ok(())
    }

    /// Aggregate of `[left, right]`, combined strictly left to right.
    pub fn query(&self, left: usize, right: usize) -> Result<C::Value> {
        check_range(left, right, self.len)?;
        if left == right {
            return Ok(self.tree[self.size + left].clone());
        }

        let mut l = left + self.size;
        let mut r = right + 1 + self.size;
        let mut acc_left = self.combiner.identity();
        let mut acc_right = self.combiner.identity();

        while l < r {
            if (l & 1) == 1 {
                acc_left = self.combiner.combine(&acc_left, &self.tree[l]);
                l += 1;
            }
            if (r & 1) == 1 {
                r -= 1;
                acc_right = self.combiner.combine(&self.tree[r], &acc_right);
            }
            l >>= 1;
            r >>= 1;
        }

        Ok(self.combiner.combine(&acc_left, &acc_right))
    }

    /// Returns the largest `r` in `[left, len]` such that
    /// `pred(aggregate of [left, r))` holds. `pred` must hold for the
    /// identity and be monotone as `r` grows.
    pub fn max_right(&self, left: usize, mut pred: impl FnMut(&C::Value) -> bool) -> Result<usize> {
        if left > self.len {
            return Err(Error::IndexOutOfRange {
                index: left,
                len: self.len,
            });
        }
        debug_assert!(pred(&self.combiner.identity()));
        if left == self.len {
            return Ok(self.len);
        }

        let mut l = left + self.size;
        let mut acc = self.combiner.identity();
        loop {
            while l % 2 == 0 {
                l >>= 1;
            }
            let candidate = self.combiner.combine(&acc, &self.tree[l]);
            if !pred(&candidate) {
                while l < self.size {
                    l *= 2;
                    let candidate = self.combiner.combine(&acc, &self.tree[l]);
                    if pred(&candidate) {
                        acc = candidate;
                        l += 1;
                    }
                }
                return Ok((l - self.size).min(self.len));
            }
            acc = candidate;
            l += 1;
            if l.is_power_of_two() {
                return Ok(self.len);
            }
        }
    }
}

impl<C: Combiner> RangeQuery for SegmentTree<C> {
    type Value = C::Value;

    fn len(&self) -> usize {
        self.len
    }

    fn fold(&mut self, left: usize, right: usize) -> Result<C::Value> {
        self.query(left, right)
    }
}

impl<C: Combiner> PointUpdate for SegmentTree<C> {
    fn set(&mut self, index: usize, value: C::Value) -> Result<()> {
        self.update(index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combiner::{FnCombiner, Max, Sum};

    #[test]
    fn sum_after_update() {
        let mut seg = SegmentTree::new(Sum::<i64>::new(), &[1, 3, 5, 7, 9, 11]).unwrap();
        seg.update(2, 15).unwrap();
        assert_eq!(seg.query(1, 4), Ok(34));
        assert_eq!(seg.query(3, 3), Ok(7));
        assert_eq!(seg.total(), 46);
        assert_eq!(seg.get(2), Ok(&15));
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let seg = SegmentTree::new(Sum::<i64>::new(), &[5, 1, 4]).unwrap();
        assert_eq!(
            seg.query(2, 1),
            Err(Error::InvalidRange {
                left: 2,
                right: 1,
                len: 3
            })
        );
        assert!(seg.query(0, 3).is_err());
        assert_eq!(seg.get(3), Err(Error::IndexOutOfRange { index: 3, len: 3 }));

        let empty = SegmentTree::new(Sum::<i64>::new(), &[]).unwrap();
        assert!(empty.query(0, 0).is_err());
        assert_eq!(empty.total(), 0);
    }

    #[test]
    fn non_commutative_order_is_preserved() {
        let concat = FnCombiner::new(String::new(), |a: &String, b: &String| format!("{a}{b}"));
        let letters = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        let mut seg = SegmentTree::new(concat, &letters).unwrap();
        assert_eq!(seg.query(0, 4).as_deref(), Ok("abcde"));
        assert_eq!(seg.query(1, 3).as_deref(), Ok("bcd"));
        seg.update(2, "X".to_string()).unwrap();
        assert_eq!(seg.query(1, 4).as_deref(), Ok("bXde"));
    }

    #[test]
    fn max_right_finds_longest_prefix() {
        let values = [3_i64, 1, 4, 1, 5, 9, 2];
        let seg = SegmentTree::new(Sum::<i64>::new(), &values).unwrap();
        for left in 0..=values.len() {
            for limit in 0..30 {
                let mut expected = left;
                let mut sum = 0;
                while expected < values.len() && sum + values[expected] <= limit {
                    sum += values[expected];
                    expected += 1;
                }
                assert_eq!(
                    seg.max_right(left, |&s| s <= limit),
                    Ok(expected),
                    "left={left} limit={limit}"
                );
            }
        }

        let seg = SegmentTree::new(Max::<i64>::new(), &values).unwrap();
        assert_eq!(seg.max_right(0, |&m| m < 5), Ok(4));
        assert_eq!(seg.max_right(5, |&m| m < 100), Ok(7));
        assert!(seg.max_right(8, |_| true).is_err());
    }
}
