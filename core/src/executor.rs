//! Parallel execution of whole-grid passes.
//!
//! Grid passes (growth, stocking) are embarrassingly parallel across
//! rows. The executor owns a dedicated rayon pool sized to the
//! configured worker count and hands callers a scope to spawn one
//! task per row band. partition_rows is the only partitioning logic
//! and is a pure function so it can be tested on its own.
//!
//! RULE: A pass must produce identical results for any worker count.
//! Anything a pass writes must be disjoint between bands; anything it
//! draws from an RNG must come from a per-cell stream.

use std::ops::Range;

use crate::error::{SimError, SimResult};

/// Split `[0, height)` into at most `workers` contiguous row ranges.
/// Every row is covered exactly once and the last range absorbs the
/// remainder; fewer ranges come back when there are more workers
/// than rows.
pub fn partition_rows(height: usize, workers: usize) -> Vec<Range<usize>> {
    assert!(workers > 0, "worker count must be > 0");
    if height == 0 {
        return Vec::new();
    }
    let bands = workers.min(height);
    let size = height / bands;
    (0..bands)
        .map(|ndx| {
            let start = ndx * size;
            let end = if ndx == bands - 1 { height } else { start + size };
            start..end
        })
        .collect()
}

pub struct ParallelGridExecutor {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl ParallelGridExecutor {
    /// Build an executor with a dedicated pool of `workers` threads.
    pub fn new(workers: usize) -> SimResult<Self> {
        if workers == 0 {
            return Err(SimError::Configuration(
                "worker count must be at least 1".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|ndx| format!("grid-worker-{ndx}"))
            .build()
            .map_err(|err| SimError::Configuration(format!("thread pool: {err}")))?;
        log::debug!("grid executor ready with {workers} workers");
        Ok(Self { pool, workers })
    }

    /// Executor sized to the machine's available parallelism.
    pub fn with_available_parallelism() -> SimResult<Self> {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run one pass. The closure spawns a task per band on the scope;
    /// the call blocks until every task finishes. A panicking task
    /// propagates the panic to the caller.
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&rayon::Scope<'scope>) -> R + Send,
        R: Send,
    {
        self.pool.scope(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(height: usize, workers: usize) {
        let ranges = partition_rows(height, workers);
        let mut next = 0;
        for range in &ranges {
            assert_eq!(range.start, next, "gap or overlap at row {next}");
            assert!(range.end >= range.start);
            next = range.end;
        }
        assert_eq!(next, height);
    }

    #[test]
    fn partition_covers_exactly() {
        for height in [1, 2, 7, 64, 100, 101] {
            for workers in [1, 2, 3, 8, 200] {
                assert_covers(height, workers);
            }
        }
    }

    #[test]
    fn partition_of_empty_grid_is_empty() {
        assert!(partition_rows(0, 4).is_empty());
    }

    #[test]
    fn last_range_absorbs_remainder() {
        let ranges = partition_rows(10, 3);
        assert_eq!(ranges, vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn never_more_ranges_than_rows() {
        assert_eq!(partition_rows(2, 8).len(), 2);
    }

    #[test]
    #[should_panic]
    fn zero_workers_is_a_programming_error() {
        partition_rows(10, 0);
    }

    #[test]
    fn scope_runs_all_tasks() {
        let exec = ParallelGridExecutor::new(4).unwrap();
        let mut cells = vec![0u32; 16];
        let bands: Vec<&mut [u32]> = cells.chunks_mut(4).collect();
        exec.scope(|s| {
            for band in bands {
                s.spawn(move |_| {
                    for cell in band.iter_mut() {
                        *cell += 1;
                    }
                });
            }
        });
        assert!(cells.iter().all(|&c| c == 1));
    }

    #[test]
    fn worker_panic_propagates() {
        let exec = ParallelGridExecutor::new(2).unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            exec.scope(|s| {
                s.spawn(|_| panic!("boom"));
            });
        }));
        assert!(result.is_err());
    }
}
