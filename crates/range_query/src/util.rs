use crate::error::{Error, Result};

#[inline(always)]
pub(crate) fn floor_log2_nonzero(x: usize) -> u32 {
    debug_assert!(x > 0);
    usize::BITS - 1 - x.leading_zeros()
}

#[inline]
pub(crate) fn check_range(left: usize, right: usize, len: usize) -> Result<()> {
    if left > right || right >= len {
        return Err(Error::InvalidRange { left, right, len });
    }
    Ok(())
}

#[inline]
pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Error::IndexOutOfRange { index, len });
    }
    Ok(())
}

/// `ceil(sqrt(n))`, at least 1.
pub(crate) fn ceil_sqrt(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let mut x = (n as f64).sqrt() as usize;
    while x * x > n {
        x -= 1;
    }
    while x * x < n {
        x += 1;
    }
    x
}
