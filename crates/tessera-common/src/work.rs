//! Balanced splitting of a flat work amount across a fixed worker count.

use core::ops::Range;

/// Splits `work_amount` items across `nthr` workers and returns the
/// contiguous `[start, end)` range owned by worker `ithr`.
///
/// The first `work_amount % nthr` workers receive one extra item, so the
/// range sizes of any two workers differ by at most 1 and worker 0 always
/// starts at 0 (e.g. 10 items over 4 workers → `[0,3) [3,6) [6,8) [8,10)`).
/// The ranges are pairwise disjoint and cover `[0, work_amount)` exactly.
///
/// Pure integer arithmetic; never allocates.
#[inline]
pub fn balance(work_amount: usize, nthr: usize, ithr: usize) -> Range<usize> {
    debug_assert!(nthr > 0);
    debug_assert!(ithr < nthr);
    let base = work_amount / nthr;
    let rem = work_amount % nthr;
    let start = ithr * base + ithr.min(rem);
    let len = base + usize::from(ithr < rem);
    start..start + len
}
