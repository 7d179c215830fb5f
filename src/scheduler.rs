//! Two-lane deferred scheduler.
//!
//! The scheduler uses two lanes:
//! 1. Deferred lane (highest priority) - callbacks that must run ahead of
//!    coarser deferred work (microtask-equivalent)
//! 2. Timer lane - timer-granularity deferred work
//!
//! Within each lane, jobs run in submission order.
//!
//! # Contract
//!
//! - `schedule` never invokes the callback synchronously; jobs run only
//!   inside a drain call, after the submitting code has returned.
//! - Jobs submitted to the same lane run in submission order relative to
//!   each other.
//! - Every pop takes from the deferred lane first; a timer-lane job runs
//!   only when the deferred lane is empty, regardless of submission time.
//!   Jobs enqueued by a running job are honored in the same drain.
//!
//! Submission itself never fails. The scheduler does not intercept job
//! panics; the dispatch routine that owns the job body is responsible for
//! its own fault boundary.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::BudgetExceeded;

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce() + Send>;

/// The two scheduler lanes.
#[derive(Default)]
struct Lanes {
    /// Deferred lane: runs ahead of all timer-lane work.
    deferred: VecDeque<Job>,
    /// Timer lane: coarser deferred work.
    timer: VecDeque<Job>,
}

impl Lanes {
    fn pending(&self) -> usize {
        self.deferred.len() + self.timer.len()
    }
}

/// A cloneable handle to a two-lane job queue.
///
/// Cloning is cheap and every clone drains the same queues, so the handle
/// can be captured freely by the closures it schedules.
///
/// # Example
///
/// ```
/// use promissum::Scheduler;
///
/// let sched = Scheduler::new();
/// sched.schedule(Box::new(|| {}));
/// assert_eq!(sched.pending(), 1);
/// assert_eq!(sched.run_until_idle(), 1);
/// assert!(sched.is_idle());
/// ```
#[derive(Clone, Default)]
pub struct Scheduler {
    lanes: Arc<Mutex<Lanes>>,
}

impl Scheduler {
    /// Creates a new empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits a job to the deferred lane.
    pub fn schedule(&self, job: Job) {
        let mut lanes = self.lanes.lock().expect("scheduler lanes poisoned");
        lanes.deferred.push_back(job);
        tracing::trace!(lane = "deferred", pending = lanes.pending(), "job scheduled");
    }

    /// Submits a job to the timer lane.
    ///
    /// Timer-lane jobs run only once the deferred lane is empty, including
    /// deferred-lane jobs submitted after this one.
    pub fn schedule_timer(&self, job: Job) {
        let mut lanes = self.lanes.lock().expect("scheduler lanes poisoned");
        lanes.timer.push_back(job);
        tracing::trace!(lane = "timer", pending = lanes.pending(), "job scheduled");
    }

    /// Returns the total number of queued jobs across both lanes.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lanes.lock().expect("scheduler lanes poisoned").pending()
    }

    /// Returns true if no jobs are queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Pops the next job to run: deferred lane first, then timer lane.
    fn pop(&self) -> Option<Job> {
        let mut lanes = self.lanes.lock().expect("scheduler lanes poisoned");
        lanes.deferred.pop_front().or_else(|| lanes.timer.pop_front())
    }

    /// Runs queued jobs until both lanes are empty, returning the number of
    /// jobs executed.
    ///
    /// No lock is held while a job runs, so jobs may freely submit further
    /// work; newly submitted jobs are honored in the same drain.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(job) = self.pop() {
            job();
            ran += 1;
        }
        tracing::debug!(ran, "drain idle");
        ran
    }

    /// Runs queued jobs until both lanes are empty or `budget` jobs have
    /// executed, whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetExceeded`] if work is still pending once the budget
    /// is spent. Jobs that already ran are not rolled back; the remainder
    /// stays queued.
    pub fn run_with_budget(&self, budget: usize) -> Result<usize, BudgetExceeded> {
        let mut ran = 0;
        while !self.is_idle() {
            if ran == budget {
                tracing::debug!(ran, budget, "drain stopped at budget");
                return Err(BudgetExceeded { limit: budget });
            }
            if let Some(job) = self.pop() {
                job();
                ran += 1;
            }
        }
        Ok(ran)
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
