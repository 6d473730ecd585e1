use crate::combiner::{Combiner, debug_check_laws};
use crate::error::{Error, Result};
use crate::util::{check_range, floor_log2_nonzero};
use crate::{PointUpdate, RangeQuery};

/// Static O(1) range queries for idempotent combiners.
///
/// Row `k` stores the aggregate of every window of length `2^k`, rows are
/// packed back to back in one buffer and located through `row_offsets`.
#[derive(Clone, Debug)]
pub struct SparseTable<C: Combiner> {
    combiner: C,
    len: usize,
    row_offsets: Vec<usize>,
    table: Vec<C::Value>,
}

impl<C: Combiner> SparseTable<C> {
    pub fn new(combiner: C, values: &[C::Value]) -> Result<Self> {
        if !combiner.is_idempotent() {
            return Err(Error::UnsupportedOperation(
                "sparse table requires an idempotent combiner",
            ));
        }
        debug_check_laws(&combiner, values)?;

        let n = values.len();
        if n == 0 {
            return Ok(Self {
                combiner,
                len: 0,
                row_offsets: Vec::new(),
                table: Vec::new(),
            });
        }

        let levels = (floor_log2_nonzero(n) as usize) + 1;
        let mut row_offsets = Vec::with_capacity(levels);
        let mut offset = 0_usize;
        for k in 0..levels {
            row_offsets.push(offset);
            offset += n + 1 - (1_usize << k);
        }

        let mut table = Vec::with_capacity(offset);
        table.extend_from_slice(values);
        for k in 1..levels {
            let half = 1_usize << (k - 1);
            let len = n + 1 - (1_usize << k);
            let prev_base = row_offsets[k - 1];
            for i in 0..len {
                let value = combiner.combine(&table[prev_base + i], &table[prev_base + i + half]);
                table.push(value);
            }
        }
        debug_assert_eq!(table.len(), offset);

        rq_debug!(len = n, levels, "built sparse table");
        Ok(Self {
            combiner,
            len: n,
            row_offsets,
            table,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Aggregate of `[left, right]` from two overlapping power-of-two
    /// windows.
    pub fn query(&self, left: usize, right: usize) -> Result<C::Value> {
        check_range(left, right, self.len)?;
        let len = right - left + 1;
        if len == 1 {
            return Ok(self.table[left].clone());
        }

        let k = floor_log2_nonzero(len) as usize;
        let span = 1_usize << k;
        let base = self.row_offsets[k];
        let a = &self.table[base + left];
        let b = &self.table[base + right + 1 - span];
        Ok(self.combiner.combine(a, b))
    }
}

impl<C: Combiner> RangeQuery for SparseTable<C> {
    type Value = C::Value;

    fn len(&self) -> usize {
        self.len
    }

    fn fold(&mut self, left: usize, right: usize) -> Result<C::Value> {
        self.query(left, right)
    }
}

/// Always fails: the table is immutable after construction.
impl<C: Combiner> PointUpdate for SparseTable<C> {
    fn set(&mut self, _index: usize, _value: C::Value) -> Result<()> {
        Err(Error::UnsupportedOperation("sparse table is immutable"))
    }
}
