//! The algebra a backend aggregates with.
//!
//! A [`Combiner`] is an identity element together with an associative binary
//! operation. Backends only ever call `combine(left, right)` with `left`
//! covering indices strictly before `right`, so non-commutative algebras
//! (matrix products, affine maps, concatenation) are supported everywhere
//! except where a backend documents otherwise.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{Error, Result};

/// Number of leading input values the constructors feed to [`check_laws`] in
/// debug builds.
pub(crate) const LAW_SAMPLE_LEN: usize = 8;

pub trait Combiner {
    type Value: Clone + PartialEq;

    fn identity(&self) -> Self::Value;

    /// Must be associative, with [`identity`](Combiner::identity) neutral on
    /// both sides.
    fn combine(&self, left: &Self::Value, right: &Self::Value) -> Self::Value;

    fn is_commutative(&self) -> bool {
        false
    }

    /// `combine(x, x) == x` for every `x`. Required by the sparse table.
    fn is_idempotent(&self) -> bool {
        false
    }
}

/// A combiner whose operation can be undone (a group).
pub trait Invertible: Combiner {
    /// Returns `x` such that `combine(part, x) == total`.
    fn uncombine(&self, total: &Self::Value, part: &Self::Value) -> Self::Value;
}

/// Checks the identity, associativity and declared commutativity and
/// idempotence laws on every pair and triple drawn from `samples`.
///
/// Laws can only be refuted, never proven, this way.
pub fn check_laws<C: Combiner>(combiner: &C, samples: &[C::Value]) -> Result<()> {
    let id = combiner.identity();
    for x in samples {
        if combiner.combine(&id, x) != *x || combiner.combine(x, &id) != *x {
            return Err(Error::AlgebraContractViolation("identity is not neutral"));
        }
        if combiner.is_idempotent() && combiner.combine(x, x) != *x {
            return Err(Error::AlgebraContractViolation(
                "combiner declared idempotent but combine(x, x) != x",
            ));
        }
    }
    for a in samples {
        for b in samples {
            let ab = combiner.combine(a, b);
            if combiner.is_commutative() && ab != combiner.combine(b, a) {
                return Err(Error::AlgebraContractViolation(
                    "combiner declared commutative but combine(a, b) != combine(b, a)",
                ));
            }
            for c in samples {
                let left = combiner.combine(&ab, c);
                let right = combiner.combine(a, &combiner.combine(b, c));
                if left != right {
                    return Err(Error::AlgebraContractViolation("combine is not associative"));
                }
            }
        }
    }
    Ok(())
}

/// Runs [`check_laws`] on a prefix of `values` in debug builds only.
pub(crate) fn debug_check_laws<C: Combiner>(combiner: &C, values: &[C::Value]) -> Result<()> {
    if cfg!(debug_assertions) {
        let n = values.len().min(LAW_SAMPLE_LEN);
        check_laws(combiner, &values[..n])?;
    }
    Ok(())
}

/// Wrapping addition.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum<T>(PhantomData<T>);

/// Bitwise exclusive or.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xor<T>(PhantomData<T>);

#[derive(Clone, Copy, Debug, Default)]
pub struct Min<T>(PhantomData<T>);

#[derive(Clone, Copy, Debug, Default)]
pub struct Max<T>(PhantomData<T>);

/// Greatest common divisor over unsigned integers, with `0` as identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct Gcd<T>(PhantomData<T>);

macro_rules! impl_new {
    ($($name:ident),*) => {$(
        impl<T> $name<T> {
            pub const fn new() -> Self {
                Self(PhantomData)
            }
        }
    )*};
}

impl_new!(Sum, Xor, Min, Max, Gcd);

macro_rules! impl_integer_combiners {
    ($($t:ty),*) => {$(
        impl Combiner for Sum<$t> {
            type Value = $t;

            fn identity(&self) -> $t {
                0
            }

            fn combine(&self, left: &$t, right: &$t) -> $t {
                left.wrapping_add(*right)
            }

            fn is_commutative(&self) -> bool {
                true
            }
        }

        impl Invertible for Sum<$t> {
            fn uncombine(&self, total: &$t, part: &$t) -> $t {
                total.wrapping_sub(*part)
            }
        }

        impl Combiner for Xor<$t> {
            type Value = $t;

            fn identity(&self) -> $t {
                0
            }

            fn combine(&self, left: &$t, right: &$t) -> $t {
                left ^ right
            }

            fn is_commutative(&self) -> bool {
                true
            }
        }

        impl Invertible for Xor<$t> {
            fn uncombine(&self, total: &$t, part: &$t) -> $t {
                total ^ part
            }
        }

        impl Combiner for Min<$t> {
            type Value = $t;

            fn identity(&self) -> $t {
                <$t>::MAX
            }

            fn combine(&self, left: &$t, right: &$t) -> $t {
                *left.min(right)
            }

            fn is_commutative(&self) -> bool {
                true
            }

            fn is_idempotent(&self) -> bool {
                true
            }
        }

        impl Combiner for Max<$t> {
            type Value = $t;

            fn identity(&self) -> $t {
                <$t>::MIN
            }

            fn combine(&self, left: &$t, right: &$t) -> $t {
                *left.max(right)
            }

            fn is_commutative(&self) -> bool {
                true
            }

            fn is_idempotent(&self) -> bool {
                true
            }
        }
    )*};
}

impl_integer_combiners!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! impl_gcd {
    ($($t:ty),*) => {$(
        impl Combiner for Gcd<$t> {
            type Value = $t;

            fn identity(&self) -> $t {
                0
            }

            // Binary GCD.
            fn combine(&self, left: &$t, right: &$t) -> $t {
                let (mut a, mut b) = (*left, *right);
                if a == 0 {
                    return b;
                }
                if b == 0 {
                    return a;
                }

                let shift = (a | b).trailing_zeros();
                a >>= a.trailing_zeros();

                loop {
                    b >>= b.trailing_zeros();
                    if a > b {
                        std::mem::swap(&mut a, &mut b);
                    }
                    b -= a;
                    if b == 0 {
                        return a << shift;
                    }
                }
            }

            fn is_commutative(&self) -> bool {
                true
            }

            fn is_idempotent(&self) -> bool {
                true
            }
        }
    )*};
}

impl_gcd!(u8, u16, u32, u64, u128, usize);

/// A combiner assembled from an identity value and a closure.
///
/// Commutativity and idempotence default to `false` and are opted into with
/// [`commutative`](FnCombiner::commutative) and
/// [`idempotent`](FnCombiner::idempotent).
#[derive(Clone)]
pub struct FnCombiner<T, F> {
    identity: T,
    op: F,
    commutative: bool,
    idempotent: bool,
}

impl<T, F> FnCombiner<T, F>
where
    T: Clone + PartialEq,
    F: Fn(&T, &T) -> T,
{
    pub fn new(identity: T, op: F) -> Self {
        Self {
            identity,
            op,
            commutative: false,
            idempotent: false,
        }
    }

    pub fn commutative(mut self) -> Self {
        self.commutative = true;
        self
    }

    pub fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }
}

impl<T: fmt::Debug, F> fmt::Debug for FnCombiner<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCombiner")
            .field("identity", &self.identity)
            .field("commutative", &self.commutative)
            .field("idempotent", &self.idempotent)
            .finish_non_exhaustive()
    }
}

impl<T, F> Combiner for FnCombiner<T, F>
where
    T: Clone + PartialEq,
    F: Fn(&T, &T) -> T,
{
    type Value = T;

    fn identity(&self) -> T {
        self.identity.clone()
    }

    fn combine(&self, left: &T, right: &T) -> T {
        (self.op)(left, right)
    }

    fn is_commutative(&self) -> bool {
        self.commutative
    }

    fn is_idempotent(&self) -> bool {
        self.idempotent
    }
}
