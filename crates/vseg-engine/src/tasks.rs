//! Bounded-parallelism execution of idempotent, index-addressed steps.
//!
//! A fixed pool of `workers` threads strides over a pre-sized slot array:
//! worker `w` visits `start + w`, `start + w + workers`, ... where `start` is
//! the first unfinished slot. The deadline is checked between units, so a
//! pass that runs out of time leaves the remaining slots empty and a later
//! pass picks up where it stopped. Results are written back by index, never
//! by completion order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// One unit of resumable work addressed by index.
pub trait IdempotentStep: Sync {
    type Output: Send + Sync;

    /// Produce the result for `index`.
    ///
    /// `prior` is whatever an earlier pass left in the slot. Returning `None`
    /// leaves the slot untouched.
    fn run(&self, index: usize, prior: Option<&Self::Output>) -> Option<Self::Output>;
}

/// Outcome of one executor pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Slots written during this pass.
    pub completed: usize,
    /// Slots still empty after this pass.
    pub remaining: usize,
    /// Whether the deadline cut the pass short.
    pub timed_out: bool,
}

impl ExecutionReport {
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

/// Index of the first empty slot, if any.
pub fn first_unfinished<T>(slots: &[Option<T>]) -> Option<usize> {
    slots.iter().position(Option::is_none)
}

/// Fixed-size worker pool striding over a slot array under a deadline.
pub struct StridedExecutor {
    workers: usize,
    deadline: Option<Duration>,
    pool: rayon::ThreadPool,
}

impl StridedExecutor {
    pub fn new(workers: usize, deadline: Option<Duration>) -> EngineResult<Self> {
        if workers == 0 {
            return Err(EngineError::config("executor needs at least one worker"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("vseg-step-{}", i))
            .build()
            .map_err(|e| EngineError::config(format!("failed to build worker pool: {}", e)))?;

        Ok(Self {
            workers,
            deadline,
            pool,
        })
    }

    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        Self::new(config.worker_count, config.deadline_ms.map(Duration::from_millis))
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run one pass of `step` over `slots`, starting at the first empty slot.
    pub fn run<S: IdempotentStep>(&self, step: &S, slots: &mut [Option<S::Output>]) -> ExecutionReport {
        let Some(start) = first_unfinished(slots) else {
            return ExecutionReport {
                completed: 0,
                remaining: 0,
                timed_out: false,
            };
        };

        let started = Instant::now();
        let timed_out = AtomicBool::new(false);
        let workers = self.workers;
        let deadline = self.deadline;
        let view: &[Option<S::Output>] = slots;

        let produced: Vec<Vec<(usize, S::Output)>> = self.pool.install(|| {
            (0..workers)
                .into_par_iter()
                .map(|worker| {
                    let mut out = Vec::new();
                    for index in (start + worker..view.len()).step_by(workers) {
                        if deadline.is_some_and(|d| started.elapsed() >= d) {
                            timed_out.store(true, Ordering::Relaxed);
                            break;
                        }
                        if let Some(result) = step.run(index, view[index].as_ref()) {
                            out.push((index, result));
                        }
                    }
                    out
                })
                .collect()
        });

        let mut completed = 0;
        for (index, result) in produced.into_iter().flatten() {
            slots[index] = Some(result);
            completed += 1;
        }

        let remaining = slots.iter().filter(|s| s.is_none()).count();
        let timed_out = timed_out.load(Ordering::Relaxed);
        if timed_out {
            warn!(
                completed,
                remaining,
                resume_at = ?first_unfinished(slots),
                "Step pass hit deadline"
            );
        } else {
            debug!(completed, remaining, "Step pass finished");
        }

        ExecutionReport {
            completed,
            remaining,
            timed_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Doubler {
        calls: AtomicUsize,
    }

    impl Doubler {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl IdempotentStep for Doubler {
        type Output = usize;

        fn run(&self, index: usize, prior: Option<&usize>) -> Option<usize> {
            if prior.is_some() {
                return None;
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(index * 2)
        }
    }

    #[test]
    fn test_results_merged_by_index() {
        let executor = StridedExecutor::new(3, None).unwrap();
        let step = Doubler::new();
        let mut slots: Vec<Option<usize>> = vec![None; 10];

        let report = executor.run(&step, &mut slots);
        assert!(report.is_complete());
        assert_eq!(report.completed, 10);
        let values: Vec<usize> = slots.into_iter().map(|s| s.unwrap()).collect();
        assert_eq!(values, (0..10).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_prior_results_not_recomputed() {
        let executor = StridedExecutor::new(2, None).unwrap();
        let step = Doubler::new();
        let mut slots = vec![Some(100), Some(101), None, Some(103), None];

        let report = executor.run(&step, &mut slots);
        assert_eq!(report.completed, 2);
        assert_eq!(step.calls.load(Ordering::SeqCst), 2);
        assert_eq!(slots, vec![Some(100), Some(101), Some(4), Some(103), Some(8)]);
    }

    #[test]
    fn test_expired_deadline_then_resume() {
        let step = Doubler::new();
        let mut slots: Vec<Option<usize>> = vec![None; 6];

        let expired = StridedExecutor::new(2, Some(Duration::ZERO)).unwrap();
        let report = expired.run(&step, &mut slots);
        assert!(report.timed_out);
        assert_eq!(report.remaining, 6);
        assert_eq!(first_unfinished(&slots), Some(0));

        let unbounded = StridedExecutor::new(2, None).unwrap();
        let report = unbounded.run(&step, &mut slots);
        assert!(report.is_complete());
        assert!(!report.timed_out);
        assert_eq!(slots[5], Some(10));
    }

    #[test]
    fn test_nothing_to_do() {
        let executor = StridedExecutor::new(1, None).unwrap();
        let step = Doubler::new();
        let mut slots = vec![Some(1usize)];
        let report = executor.run(&step, &mut slots);
        assert_eq!(report.completed, 0);
        assert_eq!(step.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(StridedExecutor::new(0, None).is_err());
    }
}
