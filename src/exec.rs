//! Order-preserving parallel map over immutable row slices.

use rayon::prelude::*;

use crate::error::{PipelineError, PipelineResult};

/// Dedicated worker pool for the row-parallel stages.
///
/// Results always come back in input order, so the worker count never leaks
/// into the produced tables.
pub struct Executor {
    pool: rayon::ThreadPool,
}

impl Executor {
    /// Build a pool with `workers` threads; `0` means one per logical core.
    pub fn new(workers: usize) -> PipelineResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("tardis-worker-{idx}"))
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build thread pool: {e}")))?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Map `f` over `items` in parallel, aborting the batch on the first
    /// failing row.
    pub fn try_map<T, U, F>(&self, items: &[T], f: F) -> PipelineResult<Vec<U>>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> PipelineResult<U> + Sync + Send,
    {
        self.pool.install(|| items.par_iter().map(f).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_map_keeps_input_order() {
        let exec = Executor::new(4).unwrap();
        let input: Vec<u64> = (0..1000).collect();
        let out = exec.try_map(&input, |x| Ok(x * 2)).unwrap();
        assert_eq!(out, input.iter().map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn try_map_surfaces_failure() {
        let exec = Executor::new(2).unwrap();
        let input = vec![1, 2, 3];
        let out = exec.try_map(&input, |x| {
            if *x == 2 {
                Err(PipelineError::invariant("two"))
            } else {
                Ok(*x)
            }
        });
        assert!(matches!(out, Err(PipelineError::InvariantViolation(_))));
    }
}
