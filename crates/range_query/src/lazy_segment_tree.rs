use std::mem;

use crate::combiner::{Combiner, Max, Min, Sum, debug_check_laws};
use crate::error::Result;
use crate::util::{check_index, check_range};
use crate::{PointUpdate, RangeQuery};

/// A pending range update.
///
/// Composition, pending tag first, newer tag second:
///
/// | pending \ newer | `NoOp`   | `Add(d)`     | `Set(v)` |
/// |-----------------|----------|--------------|----------|
/// | `NoOp`          | `NoOp`   | `Add(d)`     | `Set(v)` |
/// | `Add(a)`        | `Add(a)` | `Add(a + d)` | `Set(v)` |
/// | `Set(s)`        | `Set(s)` | `Set(s + d)` | `Set(v)` |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tag<T> {
    #[default]
    NoOp,
    Add(T),
    Set(T),
}

impl<T> Tag<T> {
    pub fn is_noop(&self) -> bool {
        matches!(self, Tag::NoOp)
    }
}

/// A combiner whose aggregates can absorb [`Tag`]s without visiting leaves.
pub trait LazyCombiner: Combiner {
    /// Element-wise addition used by `Add` tags.
    fn add_values(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    /// The aggregate of a segment of `len` elements after `tag` is applied
    /// to every element of it.
    fn apply_tag(&self, aggregate: &Self::Value, tag: &Tag<Self::Value>, len: usize) -> Self::Value;

    /// `pending` followed by `next`, as a single tag.
    fn compose_tags(&self, pending: &Tag<Self::Value>, next: &Tag<Self::Value>) -> Tag<Self::Value> {
        match (pending, next) {
            (_, Tag::NoOp) => pending.clone(),
            (_, Tag::Set(v)) => Tag::Set(v.clone()),
            (Tag::NoOp, Tag::Add(d)) => Tag::Add(d.clone()),
            (Tag::Add(a), Tag::Add(d)) => Tag::Add(self.add_values(a, d)),
            (Tag::Set(s), Tag::Add(d)) => Tag::Set(self.add_values(s, d)),
        }
    }
}

// `Sum` wraps: scaling by the segment length commutes with wrapping
// addition. `Min`/`Max` saturate instead, since a saturating shift is
// monotone and so commutes with taking the minimum or maximum. Stacked
// deltas still pending on one node saturate as their combined sum.
macro_rules! impl_lazy_combiners {
    ($($t:ty),*) => {$(
        impl LazyCombiner for Sum<$t> {
            fn add_values(&self, a: &$t, b: &$t) -> $t {
                a.wrapping_add(*b)
            }

            fn apply_tag(&self, aggregate: &$t, tag: &Tag<$t>, len: usize) -> $t {
                match tag {
                    Tag::NoOp => *aggregate,
                    Tag::Add(d) => aggregate.wrapping_add(d.wrapping_mul(len as $t)),
                    Tag::Set(v) => v.wrapping_mul(len as $t),
                }
            }
        }

        impl LazyCombiner for Min<$t> {
            fn add_values(&self, a: &$t, b: &$t) -> $t {
                a.saturating_add(*b)
            }

            fn apply_tag(&self, aggregate: &$t, tag: &Tag<$t>, _len: usize) -> $t {
                match tag {
                    Tag::NoOp => *aggregate,
                    Tag::Add(d) => aggregate.saturating_add(*d),
                    Tag::Set(v) => *v,
                }
            }
        }

        impl LazyCombiner for Max<$t> {
            fn add_values(&self, a: &$t, b: &$t) -> $t {
                a.saturating_add(*b)
            }

            fn apply_tag(&self, aggregate: &$t, tag: &Tag<$t>, _len: usize) -> $t {
                match tag {
                    Tag::NoOp => *aggregate,
                    Tag::Add(d) => aggregate.saturating_add(*d),
                    Tag::Set(v) => *v,
                }
            }
        }
    )*};
}

impl_lazy_combiners!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Segment tree with range updates through deferred tags.
///
/// Arena layout: node `k` covers a non-empty `[lo, hi)`, its children are
/// `2k` and `2k + 1` splitting at the midpoint. `values[k]` already reflects
/// `tags[k]`; the children do not until the tag is pushed down.
#[derive(Clone, Debug)]
pub struct LazySegmentTree<C: LazyCombiner> {
    combiner: C,
    len: usize,
    values: Vec<C::Value>,
    tags: Vec<Tag<C::Value>>,
}

impl<C: LazyCombiner> LazySegmentTree<C> {
    pub fn new(combiner: C, values: &[C::Value]) -> Result<Self> {
        debug_check_laws(&combiner, values)?;

        let len = values.len();
        let slots = 4 * len.max(1);
        let mut tree = Self {
            values: (0..slots).map(|_| combiner.identity()).collect(),
            tags: vec![Tag::NoOp; slots],
            combiner,
            len,
        };
        if len > 0 {
            tree.build(1, 0, len, values);
        }
        rq_debug!(len, "built lazy segment tree");
        Ok(tree)
    }

    fn build(&mut self, node: usize, lo: usize, hi: usize, values: &[C::Value]) {
        if hi - lo == 1 {
            self.values[node] = values[lo].clone();
            return;
        }
        let mid = lo + (hi - lo) / 2;
        self.build(2 * node, lo, mid, values);
        self.build(2 * node + 1, mid, hi, values);
        self.pull(node);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total(&self) -> C::Value {
        match self.len {
            0 => self.combiner.identity(),
            _ => self.values[1].clone(),
        }
    }

    fn pull(&mut self, node: usize) {
        self.values[node] = self
            .combiner
            .combine(&self.values[2 * node], &self.values[2 * node + 1]);
    }

    fn apply_at(&mut self, node: usize, tag: &Tag<C::Value>, len: usize) {
        self.values[node] = self.combiner.apply_tag(&self.values[node], tag, len);
        if len > 1 {
            self.tags[node] = self.combiner.compose_tags(&self.tags[node], tag);
        }
    }

    fn push_down(&mut self, node: usize, lo: usize, mid: usize, hi: usize) {
        let tag = mem::replace(&mut self.tags[node], Tag::NoOp);
        if tag.is_noop() {
            return;
        }
        self.apply_at(2 * node, &tag, mid - lo);
        self.apply_at(2 * node + 1, &tag, hi - mid);
    }

    /// Applies `tag` to every element of `[left, right]`.
    pub fn range_update(&mut self, left: usize, right: usize, tag: Tag<C::Value>) -> Result<()> {
        check_range(left, right, self.len)?;
        rq_trace!(left, right, "lazy range update");
        if !tag.is_noop() {
            self.update_rec(1, 0, self.len, left, right + 1, &tag);
        }
        Ok(())
    }

    pub fn range_add(&mut self, left: usize, right: usize, delta: C::Value) -> Result<()> {
        self.range_update(left, right, Tag::Add(delta))
    }

    pub fn range_assign(&mut self, left: usize, right: usize, value: C::Value) -> Result<()> {
        self.range_update(left, right, Tag::Set(value))
    }

    fn update_rec(&mut self, node: usize, lo: usize, hi: usize, l: usize, r: usize, tag: &Tag<C::Value>) {
        if r <= lo || hi <= l {
            return;
        }
        if l <= lo && hi <= r {
            self.apply_at(node, tag, hi - lo);
            return;
        }
        let mid = lo + (hi - lo) / 2;
        self.push_down(node, lo, mid, hi);
        self.update_rec(2 * node, lo, mid, l, r, tag);
        self.update_rec(2 * node + 1, mid, hi, l, r, tag);
        self.pull(node);
    }

    /// Aggregate of `[left, right]`. Flushes pending tags along the way.
    pub fn range_query(&mut self, left: usize, right: usize) -> Result<C::Value> {
        check_range(left, right, self.len)?;
        Ok(self.query_rec(1, 0, self.len, left, right + 1))
    }

    fn query_rec(&mut self, node: usize, lo: usize, hi: usize, l: usize, r: usize) -> C::Value {
        if r <= lo || hi <= l {
            return self.combiner.identity();
        }
        if l <= lo && hi <= r {
            return self.values[node].clone();
        }
        let mid = lo + (hi - lo) / 2;
        self.push_down(node, lo, mid, hi);
        let left = self.query_rec(2 * node, lo, mid, l, r);
        let right = self.query_rec(2 * node + 1, mid, hi, l, r);
        self.combiner.combine(&left, &right)
    }

    pub fn get(&mut self, index: usize) -> Result<C::Value> {
        check_index(index, self.len)?;
        self.range_query(index, index)
    }

    pub fn set(&mut self, index: usize, value: C::Value) -> Result<()> {
        check_index(index, self.len)?;
        self.range_update(index, index, Tag::Set(value))
    }
}

impl<C: LazyCombiner> RangeQuery for LazySegmentTree<C> {
    type Value = C::Value;

    fn len(&self) -> usize {
        self.len
    }

    fn fold(&mut self, left: usize, right: usize) -> Result<C::Value> {
        self.range_query(left, right)
    }
}

impl<C: LazyCombiner> PointUpdate for LazySegmentTree<C> {
    fn set(&mut self, index: usize, value: C::Value) -> Result<()> {
        LazySegmentTree::set(self, index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn apply_naive(values: &mut [i64], l: usize, r: usize, tag: Tag<i64>) {
        for x in &mut values[l..=r] {
            match tag {
                Tag::NoOp => {}
                Tag::Add(d) => *x += d,
                Tag::Set(v) => *x = v,
            }
        }
    }

    #[test]
    fn add_then_query() {
        let mut lazy = LazySegmentTree::new(Sum::<i64>::new(), &[1, 3, 15, 7, 9, 11]).unwrap();
        lazy.range_add(0, 2, 100).unwrap();
        assert_eq!(lazy.range_query(0, 5), Ok(346));
        assert_eq!(lazy.range_query(1, 1), Ok(103));
        assert_eq!(lazy.range_query(2, 3), Ok(122));
    }

    #[test]
    fn set_discards_pending_add() {
        let mut lazy = LazySegmentTree::new(Sum::<i64>::new(), &[0; 8]).unwrap();
        lazy.range_add(0, 7, 5).unwrap();
        lazy.range_assign(2, 5, 1).unwrap();
        lazy.range_add(4, 7, 2).unwrap();
        // [5, 5, 1, 1, 3, 3, 7, 7]
        assert_eq!(lazy.range_query(0, 7), Ok(32));
        assert_eq!(lazy.range_query(3, 4), Ok(4));
        assert_eq!(lazy.get(6), Ok(7));
    }

    #[test]
    fn compose_table() {
        let c = Sum::<i64>::new();
        let tags = [Tag::NoOp, Tag::Add(3), Tag::Add(-2), Tag::Set(7), Tag::Set(0)];
        for pending in tags {
            for next in tags {
                let composed = c.compose_tags(&pending, &next);
                for len in 1..4 {
                    for agg in [-4_i64, 0, 9] {
                        let sequential = c.apply_tag(&c.apply_tag(&agg, &pending, len), &next, len);
                        assert_eq!(
                            c.apply_tag(&agg, &composed, len),
                            sequential,
                            "pending={pending:?} next={next:?}"
                        );
                    }
                }
            }
        }
        assert_eq!(c.compose_tags(&Tag::Add(3), &Tag::Set(1)), Tag::Set(1));
        assert_eq!(c.compose_tags(&Tag::Set(1), &Tag::Add(3)), Tag::Set(4));
        assert_eq!(c.compose_tags(&Tag::Add(1), &Tag::Add(3)), Tag::Add(4));
    }

    #[test]
    fn random_range_updates_match_naive() {
        let mut rng = StdRng::seed_from_u64(0x1A2F_5EED);
        for n in 1..48 {
            let mut values = (0..n)
                .map(|_| rng.random_range(-20_i64..=20))
                .collect::<Vec<_>>();
            let mut sum = LazySegmentTree::new(Sum::<i64>::new(), &values).unwrap();
            let mut min = LazySegmentTree::new(Min::<i64>::new(), &values).unwrap();

            for _ in 0..300 {
                let l = rng.random_range(0..n);
                let r = rng.random_range(l..n);
                match rng.random_range(0..3) {
                    0 => {
                        let tag = if rng.random_bool(0.5) {
                            Tag::Add(rng.random_range(-10_i64..=10))
                        } else {
                            Tag::Set(rng.random_range(-10_i64..=10))
                        };
                        sum.range_update(l, r, tag).unwrap();
                        min.range_update(l, r, tag).unwrap();
                        apply_naive(&mut values, l, r, tag);
                    }
                    _ => {
                        let slice = &values[l..=r];
                        assert_eq!(sum.range_query(l, r), Ok(slice.iter().sum::<i64>()));
                        assert_eq!(min.range_query(l, r), Ok(*slice.iter().min().unwrap()));
                    }
                }
            }
            assert_eq!(sum.total(), values.iter().sum::<i64>());
        }
    }

    #[test]
    fn min_max_adds_saturate_at_the_bounds() {
        let mut min = LazySegmentTree::new(Min::<i64>::new(), &[i64::MAX, 0]).unwrap();
        min.range_add(0, 1, 1).unwrap();
        assert_eq!(min.range_query(0, 1), Ok(1));
        assert_eq!(min.get(0), Ok(i64::MAX));
        assert_eq!(min.get(1), Ok(1));

        let mut max = LazySegmentTree::new(Max::<i64>::new(), &[i64::MAX, 0]).unwrap();
        max.range_add(0, 1, 1).unwrap();
        assert_eq!(max.range_query(0, 1), Ok(i64::MAX));
        assert_eq!(max.get(1), Ok(1));

        let mut min = LazySegmentTree::new(Min::<i64>::new(), &[i64::MIN, 5, 7]).unwrap();
        min.range_add(0, 2, -10).unwrap();
        assert_eq!(min.range_query(0, 2), Ok(i64::MIN));
        assert_eq!(min.range_query(1, 2), Ok(-5));
        assert_eq!(min.get(0), Ok(i64::MIN));

        let mut max = LazySegmentTree::new(Max::<u8>::new(), &[250, 3]).unwrap();
        max.range_add(0, 1, 10).unwrap();
        assert_eq!(max.range_query(0, 1), Ok(u8::MAX));
        assert_eq!(max.get(1), Ok(13));
    }

    #[test]
    fn failed_update_leaves_tree_untouched() {
        let mut lazy = LazySegmentTree::new(Sum::<i64>::new(), &[1, 2, 3]).unwrap();
        assert_eq!(
            lazy.range_add(1, 3, 10),
            Err(Error::InvalidRange {
                left: 1,
                right: 3,
                len: 3
            })
        );
        assert!(lazy.range_add(2, 1, 10).is_err());
        assert_eq!(lazy.set(5, 0), Err(Error::IndexOutOfRange { index: 5, len: 3 }));
        assert_eq!(lazy.range_query(0, 2), Ok(6));
    }
}
