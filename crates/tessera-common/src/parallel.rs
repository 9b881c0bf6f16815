//! Fork-join execution of closures over a fixed worker count.
//!
//! Workers are scoped threads that terminate before the call returns, so a
//! caller observes every side effect of the closure once `parallel` is done.
//! Worker 0 always runs on the calling thread.

use crate::nd::NdIndexer;
use crate::work::balance;

/// Runs `f(ithr, nthr)` once for every `ithr` in `0..nthr`.
///
/// With `nthr <= 1` the closure runs inline on the caller and no threads are
/// spawned.
pub fn parallel<F>(nthr: usize, f: F)
where
    F: Fn(usize, usize) + Sync,
{
    if nthr <= 1 {
        f(0, 1.max(nthr));
        return;
    }

    log::trace!("forking {nthr} workers");

    std::thread::scope(|scope| {
        for ithr in 1..nthr {
            let f = &f;
            scope.spawn(move || f(ithr, nthr));
        }
        f(0, nthr);
    });
}

/// Runs `f(coords)` once for every coordinate tuple of `extents`, splitting
/// the flattened range across at most `nthr` workers.
///
/// Each worker decodes the first tuple of its contiguous share and then steps
/// through the rest, so per-tuple cost stays O(1) after the initial decode.
pub fn parallel_nd<const K: usize, F>(nthr: usize, extents: [usize; K], f: F)
where
    F: Fn([usize; K]) + Sync,
{
    let indexer = NdIndexer::new(extents);
    let work_amount = indexer.len();
    if work_amount == 0 {
        return;
    }

    let nthr = nthr.clamp(1, work_amount);
    parallel(nthr, |ithr, nthr| {
        let range = balance(work_amount, nthr, ithr);
        if range.is_empty() {
            return;
        }
        let mut coords = indexer.decode(range.start);
        for _ in range {
            f(coords);
            indexer.step(&mut coords);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn visits_every_index_exactly_once() {
        for nthr in [1, 2, 3, 7] {
            let hits: Vec<AtomicUsize> = (0..24).map(|_| AtomicUsize::new(0)).collect();
            parallel(nthr, |ithr, nthr| {
                for i in balance(hits.len(), nthr, ithr) {
                    hits[i].fetch_add(1, Ordering::Relaxed);
                }
            });
            assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
        }
    }

    #[test]
    fn single_worker_runs_inline() {
        let caller = std::thread::current().id();
        parallel(1, |ithr, nthr| {
            assert_eq!((ithr, nthr), (0, 1));
            assert_eq!(std::thread::current().id(), caller);
        });
    }

    #[test]
    fn nd_covers_the_full_grid() {
        let extents = [3, 4, 5];
        let hits: Vec<AtomicUsize> = (0..60).map(|_| AtomicUsize::new(0)).collect();
        let indexer = NdIndexer::new(extents);
        parallel_nd(4, extents, |coords| {
            hits[indexer.linearize(&coords)].fetch_add(1, Ordering::Relaxed);
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn nd_clamps_workers_to_work_amount() {
        // More workers than tuples must not panic or duplicate work.
        let count = AtomicUsize::new(0);
        parallel_nd(16, [2, 1], |_| {
            count.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn nd_with_empty_extent_is_a_no_op() {
        parallel_nd(4, [3, 0, 2], |_| panic!("no tuples expected"));
    }
}
