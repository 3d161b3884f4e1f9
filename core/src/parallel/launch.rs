//! Kernel launches over sample slots.

use rayon::prelude::*;

/// Number of sample slots scheduled together. Sample budgets are rounded to whole blocks.
pub const DISPATCH_BLOCK_SIZE: usize = 256;

/// Round a slot count down to a whole number of dispatch blocks.
///
/// * `n` - Slot count.
#[inline]
pub fn round_down_blocks(n: usize) -> usize {
    (n / DISPATCH_BLOCK_SIZE) * DISPATCH_BLOCK_SIZE
}

/// Run a kernel once per slot. The kernel receives the slot index and exclusive access to the slot's item.
///
/// * `items`  - One item per slot.
/// * `kernel` - The kernel.
pub fn launch<T, F>(items: &mut [T], kernel: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    items
        .par_iter_mut()
        .with_min_len(DISPATCH_BLOCK_SIZE)
        .enumerate()
        .for_each(|(i, item)| kernel(i, item));
}

/// Run a kernel once per slot over a buffer holding `stride` items per slot.
///
/// * `items`  - `stride` items per slot, slot-major.
/// * `stride` - Items per slot.
/// * `kernel` - The kernel.
pub fn launch_strided<T, F>(items: &mut [T], stride: usize, kernel: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    debug_assert!(stride > 0 && items.len() % stride == 0);
    items
        .par_chunks_mut(stride)
        .with_min_len(DISPATCH_BLOCK_SIZE)
        .enumerate()
        .for_each(|(i, chunk)| kernel(i, chunk));
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
