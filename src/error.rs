//! Error types for the deferred-value engine.
//!
//! The engine itself converts every fault it encounters (executor errors,
//! handler errors, handler panics) into a rejection reason carried as a
//! [`Value`](crate::value::Value), so rejections are data, not `Err` values.
//! The types here exist at the two places where that data meets ordinary
//! `Result`-based Rust code:
//!
//! - [`Rejected`] lifts a settled rejection into an error for `?`-style
//!   consumption, via [`Outcome::into_result`](crate::deferred::Outcome::into_result).
//! - [`BudgetExceeded`] reports a bounded scheduler drain that ran out of
//!   budget with work still queued.

use thiserror::Error;

use crate::value::Value;

/// A bounded scheduler drain exhausted its job budget with work still pending.
///
/// Returned by [`Scheduler::run_with_budget`](crate::scheduler::Scheduler::run_with_budget).
/// Jobs that already ran are not rolled back; the remaining jobs stay queued
/// and a later drain may pick them up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("scheduler budget of {limit} jobs exhausted with work still pending")]
pub struct BudgetExceeded {
    /// The number of jobs the drain was allowed to run.
    pub limit: usize,
}

/// A settled rejection, lifted into an error.
///
/// Produced by [`Outcome::into_result`](crate::deferred::Outcome::into_result)
/// so a terminal observer can fold a deferred outcome into ordinary `Result`
/// plumbing.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("deferred value rejected: {reason}")]
pub struct Rejected {
    /// The rejection reason.
    pub reason: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_exceeded_display() {
        let err = BudgetExceeded { limit: 16 };
        assert_eq!(
            err.to_string(),
            "scheduler budget of 16 jobs exhausted with work still pending"
        );
    }

    #[test]
    fn rejected_display_renders_reason() {
        let err = Rejected {
            reason: Value::text("boom"),
        };
        assert_eq!(err.to_string(), "deferred value rejected: \"boom\"");
    }
}
