use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::combiner::{Combiner, debug_check_laws};
use crate::error::{Error, Result};
use crate::util::{check_index, check_range};

#[derive(Debug)]
enum Node<V> {
    Leaf(V),
    Internal {
        value: V,
        left: Arc<Node<V>>,
        right: Arc<Node<V>>,
    },
}

impl<V> Node<V> {
    fn value(&self) -> &V {
        match self {
            Node::Leaf(value) => value,
            Node::Internal { value, .. } => value,
        }
    }
}

/// An immutable snapshot of the sequence.
///
/// Cloning a version is an `Arc` clone. Nodes are reference counted
/// individually, so dropping the last handle to a version frees exactly the
/// nodes no other live version reaches.
#[derive(Clone, Debug)]
pub struct Version<V> {
    root: Option<Arc<Node<V>>>,
    len: usize,
    tree_id: u64,
    generation: u64,
}

impl<V> Version<V> {
    /// 0 for the initial build, then one more for every derived version, in
    /// creation order.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Segment tree where every update yields a new [`Version`] and leaves the
/// old one intact.
///
/// Only the root-to-leaf path of an update is copied, every other subtree is
/// shared with the parent version.
/// Versions are tagged with the id of the tree that built them and are
/// rejected by any other tree.
#[derive(Clone, Debug)]
pub struct PersistentSegmentTree<C: Combiner> {
    combiner: C,
    len: usize,
    id: u64,
    next_generation: u64,
}

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(0);

impl<C: Combiner> PersistentSegmentTree<C> {
    pub fn new(combiner: C, values: &[C::Value]) -> Result<(Self, Version<C::Value>)> {
        debug_check_laws(&combiner, values)?;

        let len = values.len();
        let tree = Self {
            combiner,
            len,
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            next_generation: 1,
        };
        let root = (len > 0).then(|| tree.build(values));
        rq_debug!(len, "built persistent segment tree");
        let version = Version {
            root,
            len,
            tree_id: tree.id,
            generation: 0,
        };
        Ok((tree, version))
    }

    fn build(&self, values: &[C::Value]) -> Arc<Node<C::Value>> {
        if values.len() == 1 {
            return Arc::new(Node::Leaf(values[0].clone()));
        }
        let mid = values.len() / 2;
        let left = self.build(&values[..mid]);
        let right = self.build(&values[mid..]);
        self.join(left, right)
    }

    fn join(&self, left: Arc<Node<C::Value>>, right: Arc<Node<C::Value>>) -> Arc<Node<C::Value>> {
        let value = self.combiner.combine(left.value(), right.value());
        Arc::new(Node::Internal { value, left, right })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check_version(&self, version: &Version<C::Value>) -> Result<()> {
        if version.tree_id != self.id {
            return Err(Error::UnsupportedOperation(
                "version was not created by this tree",
            ));
        }
        Ok(())
    }

    /// Derives a version equal to `version` except that `index` holds
    /// `value`. `version` itself stays valid and unchanged.
    pub fn update(
        &mut self,
        version: &Version<C::Value>,
        index: usize,
        value: C::Value,
    ) -> Result<Version<C::Value>> {
        self.check_version(version)?;
        check_index(index, self.len)?;
        let Some(root) = &version.root else {
            return Err(Error::IndexOutOfRange { index, len: 0 });
        };

        let root = self.set_rec(root, 0, self.len, index, value);
        let generation = self.next_generation;
        self.next_generation += 1;
        rq_trace!(from = version.generation, generation, index, "derived version");
        Ok(Version {
            root: Some(root),
            len: self.len,
            tree_id: self.id,
            generation,
        })
    }

    fn set_rec(
        &self,
        node: &Arc<Node<C::Value>>,
        lo: usize,
        hi: usize,
        index: usize,
        value: C::Value,
    ) -> Arc<Node<C::Value>> {
        match node.as_ref() {
            Node::Leaf(_) => Arc::new(Node::Leaf(value)),
            Node::Internal { left, right, .. } => {
                let mid = lo + (hi - lo) / 2;
                if index < mid {
                    let left = self.set_rec(left, lo, mid, index, value);
                    self.join(left, Arc::clone(right))
                } else {
                    let right = self.set_rec(right, mid, hi, index, value);
                    self.join(Arc::clone(left), right)
                }
            }
        }
    }

    /// Aggregate of `[left, right]` as of `version`.
    pub fn query(&self, version: &Version<C::Value>, left: usize, right: usize) -> Result<C::Value> {
        self.check_version(version)?;
        check_range(left, right, self.len)?;
        match &version.root {
            Some(root) => Ok(self.query_rec(root, 0, self.len, left, right + 1)),
            None => Err(Error::InvalidRange { left, right, len: 0 }),
        }
    }

    fn query_rec(&self, node: &Node<C::Value>, lo: usize, hi: usize, l: usize, r: usize) -> C::Value {
        if l <= lo && hi <= r {
            return node.value().clone();
        }
        match node {
            Node::Leaf(_) => self.combiner.identity(),
            Node::Internal { left, right, .. } => {
                let mid = lo + (hi - lo) / 2;
                if r <= mid {
                    self.query_rec(left, lo, mid, l, r)
                } else if mid <= l {
                    self.query_rec(right, mid, hi, l, r)
                } else {
                    let a = self.query_rec(left, lo, mid, l, r);
                    let b = self.query_rec(right, mid, hi, l, r);
                    self.combiner.combine(&a, &b)
                }
            }
        }
    }

    pub fn get(&self, version: &Version<C::Value>, index: usize) -> Result<C::Value> {
        check_index(index, self.len)?;
        self.query(version, index, index)
    }
}
