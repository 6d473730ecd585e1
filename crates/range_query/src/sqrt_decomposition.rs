use crate::combiner::{Combiner, Invertible, debug_check_laws};
use crate::error::{Error, Result};
use crate::util::{ceil_sqrt, check_index, check_range};
use crate::{PointUpdate, RangeQuery};

/// Online sqrt-decomposition: the sequence is cut into blocks of
/// `block_size` elements, each caching its aggregate.
#[derive(Clone, Debug)]
pub struct SqrtDecomposition<C: Combiner> {
    combiner: C,
    block_size: usize,
    values: Vec<C::Value>,
    blocks: Vec<C::Value>,
}

impl<C: Combiner> SqrtDecomposition<C> {
    /// Blocks of `ceil(sqrt(N))` elements.
    pub fn new(combiner: C, values: &[C::Value]) -> Result<Self> {
        Self::with_block_size(combiner, values, ceil_sqrt(values.len()))
    }

    pub fn with_block_size(combiner: C, values: &[C::Value], block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::UnsupportedOperation("block size must be at least 1"));
        }
        debug_check_laws(&combiner, values)?;

        let blocks = values
            .chunks(block_size)
            .map(|chunk| fold_slice(&combiner, chunk))
            .collect::<Vec<_>>();
        rq_debug!(len = values.len(), block_size, blocks = blocks.len(), "built sqrt decomposition");
        Ok(Self {
            combiner,
            block_size,
            values: values.to_vec(),
            blocks,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn get(&self, index: usize) -> Result<&C::Value> {
        check_index(index, self.len())?;
        Ok(&self.values[index])
    }

    fn recompute_block(&mut self, block: usize) {
        let start = block * self.block_size;
        let end = (start + self.block_size).min(self.values.len());
        self.blocks[block] = fold_slice(&self.combiner, &self.values[start..end]);
        rq_trace!(block, "recomputed block");
    }

    /// Replaces the element at `index` and refolds its block, O(√N).
    pub fn update(&mut self, index: usize, value: C::Value) -> Result<()> {
        check_index(index, self.len())?;
        self.values[index] = value;
        self.recompute_block(index / self.block_size);
        Ok(())
    }

    /// Aggregate of `[left, right]`: partial left block, whole interior
    /// blocks, partial right block, in that order.
    pub fn query(&self, left: usize, right: usize) -> Result<C::Value> {
        check_range(left, right, self.len())?;
        let first = left / self.block_size;
        let last = right / self.block_size;
        if first == last {
            return Ok(fold_slice(&self.combiner, &self.values[left..=right]));
        }

        let head_end = (first + 1) * self.block_size;
        let tail_start = last * self.block_size;
        let mut acc = fold_slice(&self.combiner, &self.values[left..head_end]);
        for block in &self.blocks[first + 1..last] {
            acc = self.combiner.combine(&acc, block);
        }
        let tail = fold_slice(&self.combiner, &self.values[tail_start..=right]);
        Ok(self.combiner.combine(&acc, &tail))
    }
}

impl<C: Invertible> SqrtDecomposition<C> {
    /// Like [`update`](Self::update), but patches the block aggregate with
    /// the difference in O(1) when the combiner is commutative.
    pub fn update_incremental(&mut self, index: usize, value: C::Value) -> Result<()> {
        check_index(index, self.len())?;
        if !self.combiner.is_commutative() {
            return self.update(index, value);
        }
        let block = index / self.block_size;
        let delta = self.combiner.uncombine(&value, &self.values[index]);
        self.blocks[block] = self.combiner.combine(&self.blocks[block], &delta);
        self.values[index] = value;
        Ok(())
    }

    /// Combines `delta` into the element at `index`.
    pub fn add(&mut self, index: usize, delta: C::Value) -> Result<()> {
        check_index(index, self.len())?;
        let value = self.combiner.combine(&self.values[index], &delta);
        if !self.combiner.is_commutative() {
            return self.update(index, value);
        }
        let block = index / self.block_size;
        self.blocks[block] = self.combiner.combine(&self.blocks[block], &delta);
        self.values[index] = value;
        Ok(())
    }
}

fn fold_slice<C: Combiner>(combiner: &C, values: &[C::Value]) -> C::Value {
    values
        .iter()
        .fold(combiner.identity(), |acc, x| combiner.combine(&acc, x))
}

impl<C: Combiner> RangeQuery for SqrtDecomposition<C> {
    type Value = C::Value;

    fn len(&self) -> usize {
        self.values.len()
    }

    fn fold(&mut self, left: usize, right: usize) -> Result<C::Value> {
        self.query(left, right)
    }
}

impl<C: Combiner> PointUpdate for SqrtDecomposition<C> {
    fn set(&mut self, index: usize, value: C::Value) -> Result<()> {
        self.update(index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combiner::{FnCombiner, Sum};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn blocks_partition_the_sequence() {
        let values = (1..=10).collect::<Vec<i64>>();
        let sq = SqrtDecomposition::new(Sum::<i64>::new(), &values).unwrap();
        assert_eq!(sq.block_size(), 4);
        assert_eq!(sq.block_count(), 3);
        assert_eq!(sq.query(0, 9), Ok(55));
        assert_eq!(sq.query(2, 8), Ok(42));
        assert_eq!(sq.query(5, 6), Ok(13));
    }

    #[test]
    fn zero_block_size_is_rejected() {
        assert!(matches!(
            SqrtDecomposition::with_block_size(Sum::<i64>::new(), &[1, 2], 0),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn incremental_and_full_updates_agree() {
        let mut rng = StdRng::seed_from_u64(0x5C7_F00D);
        let values = (0..50).map(|_| rng.random_range(-9_i64..=9)).collect::<Vec<_>>();
        let mut full = SqrtDecomposition::with_block_size(Sum::<i64>::new(), &values, 6).unwrap();
        let mut fast = SqrtDecomposition::with_block_size(Sum::<i64>::new(), &values, 6).unwrap();
        for _ in 0..500 {
            let i = rng.random_range(0..values.len());
            let x = rng.random_range(-9_i64..=9);
            full.update(i, x).unwrap();
            if i % 2 == 0 {
                fast.update_incremental(i, x).unwrap();
            } else {
                let delta = x - *fast.get(i).unwrap();
                fast.add(i, delta).unwrap();
            }
            let l = rng.random_range(0..values.len());
            let r = rng.random_range(l..values.len());
            assert_eq!(full.query(l, r), fast.query(l, r));
        }
    }

    #[test]
    fn order_is_preserved_across_blocks() {
        let concat = FnCombiner::new(String::new(), |a: &String, b: &String| format!("{a}{b}"));
        let letters = "abcdefghij".chars().map(String::from).collect::<Vec<_>>();
        let mut sq = SqrtDecomposition::with_block_size(concat, &letters, 3).unwrap();
        assert_eq!(sq.query(1, 8).as_deref(), Ok("bcdefghi"));
        sq.update(4, "_".to_string()).unwrap();
        assert_eq!(sq.query(2, 6).as_deref(), Ok("cd_fg"));
        assert_eq!(sq.get(4).map(String::as_str), Ok("_"));
    }
}
