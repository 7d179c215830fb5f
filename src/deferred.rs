//! Settle-once deferred values with `then`-chaining and thenable adoption.
//!
//! A [`Deferred`] is a container for one eventual outcome:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        SETTLE-ONCE LIFECYCLE                     │
//! │                                                                  │
//! │              resolve(value)                                      │
//! │   Pending ────────────────────► Fulfilled(value)                 │
//! │      │                                                           │
//! │      │       reject(reason)                                      │
//! │      └────────────────────────► Rejected(reason)                 │
//! │                                                                  │
//! │   Both arms are terminal; later settlement calls are no-ops.     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Observers registered with [`Deferred::then`] (or through the
//! [`Thenable`] protocol) queue up while the value is pending and drain in
//! registration order once it settles. Every handler runs through the
//! [`Scheduler`]'s deferred lane, never on the stack that registered it or
//! the stack that settled the value.
//!
//! # Fault boundary
//!
//! Executors and handlers signal faults by returning `Err`; panics inside
//! either are additionally caught and converted. Both become a rejection of
//! the value under construction (executor) or the downstream value
//! (handler). Nothing unwinds across a scheduler drain.
//!
//! # Example
//!
//! ```
//! use promissum::{handler, Deferred, Outcome, Scheduler, Value};
//!
//! let sched = Scheduler::new();
//! let doubled = Deferred::resolve(&sched, Value::from(21)).then(
//!     Some(handler(|v| {
//!         let n = v.as_int().ok_or_else(|| Value::text("expected an int"))?;
//!         Ok(Value::from(n * 2))
//!     })),
//!     None,
//! );
//!
//! sched.run_until_idle();
//! assert_eq!(doubled.outcome(), Some(Outcome::Fulfilled(Value::from(42))));
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use crate::error::Rejected;
use crate::scheduler::Scheduler;
use crate::thenable::{SettleFn, Thenable};
use crate::value::Value;

/// A success or failure handler attached through [`Deferred::then`].
///
/// The handler receives the settled value or reason. A normal return feeds
/// the downstream value (with thenable adoption applied to the result); an
/// `Err` return is the fault channel and rejects the downstream value.
pub type Handler = Box<dyn FnOnce(Value) -> Result<Value, Value> + Send>;

/// Boxes a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: FnOnce(Value) -> Result<Value, Value> + Send + 'static,
{
    Box::new(f)
}

/// Public view of a deferred value's lifecycle position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    /// Not yet settled.
    Pending,
    /// Settled with a fulfillment value.
    Fulfilled,
    /// Settled with a rejection reason.
    Rejected,
}

/// The terminal outcome of a settled deferred value.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The value fulfilled.
    Fulfilled(Value),
    /// The value rejected.
    Rejected(Value),
}

impl Outcome {
    /// Returns the lifecycle position this outcome corresponds to.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Fulfilled(_) => StateKind::Fulfilled,
            Self::Rejected(_) => StateKind::Rejected,
        }
    }

    /// Returns true if this outcome is a fulfillment.
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    /// Returns true if this outcome is a rejection.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns the carried value or reason.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        match self {
            Self::Fulfilled(value) | Self::Rejected(value) => value,
        }
    }

    /// Lifts the outcome into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected`] carrying the reason if the outcome is a
    /// rejection.
    pub fn into_result(self) -> Result<Value, Rejected> {
        match self {
            Self::Fulfilled(value) => Ok(value),
            Self::Rejected(reason) => Err(Rejected { reason }),
        }
    }
}

/// Internal settle-once state. The settled payload lives immutably in the
/// `Done` arm; the only permitted write is `Pending -> Done`.
enum State {
    Pending,
    Done(Outcome),
}

/// One registered observer: the optional handler pair plus the settlement
/// functions of the downstream value created by the registering `then`.
struct Observer {
    on_fulfilled: Option<Handler>,
    on_rejected: Option<Handler>,
    complete: SettleFn,
    fail: SettleFn,
}

struct Inner {
    state: State,
    /// Append-only while pending; drained front-first once settled.
    observers: VecDeque<Observer>,
}

/// A settle-once container for one eventual outcome.
///
/// `Deferred` is a cheap cloneable handle; every clone observes the same
/// cell. Settlement authority lives in the separate [`Settler`] handle, so
/// holding a `Deferred` only permits observation and chaining.
#[derive(Clone)]
pub struct Deferred {
    inner: Arc<Mutex<Inner>>,
    sched: Scheduler,
}

/// The settlement capability of one [`Deferred`]: its `resolve`/`reject`
/// pair carried as a single cloneable handle.
///
/// Either operation is a silent no-op once the value has settled, so a
/// `Settler` can be cloned into competing callbacks and the first
/// settlement wins.
#[derive(Clone)]
pub struct Settler {
    target: Deferred,
}

impl Deferred {
    /// Creates a pending value together with its settlement capability.
    ///
    /// This is the shape combinators and bridging code use; it is
    /// equivalent to [`Deferred::new`] with an executor that stores its
    /// settlement functions.
    #[must_use]
    pub fn pair(sched: &Scheduler) -> (Self, Settler) {
        let deferred = Self {
            inner: Arc::new(Mutex::new(Inner {
                state: State::Pending,
                observers: VecDeque::new(),
            })),
            sched: sched.clone(),
        };
        let settler = Settler {
            target: deferred.clone(),
        };
        (deferred, settler)
    }

    /// Creates a deferred value and runs `executor` synchronously with its
    /// settlement capability.
    ///
    /// An `Err` return (or a panic) from the executor rejects the value,
    /// unless the executor already settled it; settlement sticks and the
    /// fault is discarded.
    pub fn new<F>(sched: &Scheduler, executor: F) -> Self
    where
        F: FnOnce(&Settler) -> Result<(), Value>,
    {
        let (deferred, settler) = Self::pair(sched);
        match catch_unwind(AssertUnwindSafe(|| executor(&settler))) {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => settler.reject(reason),
            Err(payload) => settler.reject(panic_reason(payload)),
        }
        deferred
    }

    /// Returns a deferred value fulfilled with `value`, adopting thenables.
    ///
    /// If `value` already is a `Deferred` of this crate (detected through
    /// [`Thenable::as_deferred`]), that handle is returned unchanged. Any
    /// other thenable is adopted: the returned value settles with the
    /// thenable's eventual outcome.
    #[must_use]
    pub fn resolve(sched: &Scheduler, value: Value) -> Self {
        if let Value::Thenable(participant) = &value {
            if let Some(existing) = participant.as_deferred() {
                return existing;
            }
        }
        let (deferred, settler) = Self::pair(sched);
        settler.resolve(value);
        deferred
    }

    /// Returns a deferred value rejected with `reason`.
    ///
    /// No unwrapping: a thenable reason rejects as-is.
    #[must_use]
    pub fn reject(sched: &Scheduler, reason: Value) -> Self {
        let (deferred, settler) = Self::pair(sched);
        settler.reject(reason);
        deferred
    }

    /// Returns the current lifecycle position.
    #[must_use]
    pub fn state(&self) -> StateKind {
        match &self.inner.lock().expect("deferred state poisoned").state {
            State::Pending => StateKind::Pending,
            State::Done(outcome) => outcome.kind(),
        }
    }

    /// Returns a clone of the settled outcome, or `None` while pending.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        match &self.inner.lock().expect("deferred state poisoned").state {
            State::Pending => None,
            State::Done(outcome) => Some(outcome.clone()),
        }
    }

    /// Registers a handler pair and returns the downstream deferred value
    /// they feed.
    ///
    /// A missing handler makes the corresponding settlement pass through
    /// unchanged: fulfillment propagates fulfillment and rejection
    /// propagates rejection. Works identically on pending and settled
    /// values; on a settled value the observer is scheduled without delay.
    pub fn then(&self, on_fulfilled: Option<Handler>, on_rejected: Option<Handler>) -> Self {
        let (downstream, settler) = Self::pair(&self.sched);
        let complete: SettleFn = {
            let settler = settler.clone();
            Box::new(move |value| settler.resolve(value))
        };
        let fail: SettleFn = Box::new(move |reason| settler.reject(reason));
        self.register(Observer {
            on_fulfilled,
            on_rejected,
            complete,
            fail,
        });
        downstream
    }

    /// Registers a failure handler; shorthand for `then(None, Some(f))`.
    pub fn catch<F>(&self, on_rejected: F) -> Self
    where
        F: FnOnce(Value) -> Result<Value, Value> + Send + 'static,
    {
        self.then(None, Some(Box::new(on_rejected)))
    }

    /// Registers a side-effect hook that runs exactly once on either
    /// settlement, receiving no arguments.
    ///
    /// The original outcome passes through unchanged unless `on_finally`
    /// itself faults, which overrides the outcome with that fault.
    pub fn finally<F>(&self, on_finally: F) -> Self
    where
        F: FnOnce() -> Result<(), Value> + Send + 'static,
    {
        // Only one of the two handlers ever runs; the shared slot lets a
        // FnOnce hook serve both without cloning it.
        let hook = Arc::new(Mutex::new(Some(on_finally)));
        let tail = Arc::clone(&hook);
        self.then(
            Some(handler(move |value| {
                if let Some(f) = hook.lock().expect("finally hook poisoned").take() {
                    f()?;
                }
                Ok(value)
            })),
            Some(handler(move |reason| {
                if let Some(f) = tail.lock().expect("finally hook poisoned").take() {
                    f()?;
                }
                Err(reason)
            })),
        )
    }

    /// Appends an observer record and drains if already settled.
    fn register(&self, observer: Observer) {
        {
            let mut inner = self.inner.lock().expect("deferred state poisoned");
            inner.observers.push_back(observer);
            tracing::trace!(queued = inner.observers.len(), "observer registered");
        }
        self.run();
    }

    /// Drains observers front-first while settled; no-op while pending.
    ///
    /// The state lock is released before each record is handed to the
    /// scheduler, so dispatch never runs under the lock.
    fn run(&self) {
        loop {
            let (observer, outcome) = {
                let mut inner = self.inner.lock().expect("deferred state poisoned");
                let outcome = match &inner.state {
                    State::Pending => return,
                    State::Done(outcome) => outcome.clone(),
                };
                match inner.observers.pop_front() {
                    Some(observer) => (observer, outcome),
                    None => return,
                }
            };
            self.sched
                .schedule(Box::new(move || run_observer(observer, outcome)));
        }
    }
}

impl Thenable for Deferred {
    fn subscribe(&self, complete: SettleFn, fail: SettleFn) {
        // A handler-free observer: pass-through dispatch hands the settled
        // payload straight to the matching continuation, via the scheduler.
        self.register(Observer {
            on_fulfilled: None,
            on_rejected: None,
            complete,
            fail,
        });
    }

    fn as_deferred(&self) -> Option<Deferred> {
        Some(self.clone())
    }
}

impl From<Deferred> for Value {
    fn from(deferred: Deferred) -> Self {
        Self::Thenable(Arc::new(deferred))
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().expect("deferred state poisoned");
        let state = match &inner.state {
            State::Pending => StateKind::Pending,
            State::Done(outcome) => outcome.kind(),
        };
        f.debug_struct("Deferred")
            .field("state", &state)
            .field("observers", &inner.observers.len())
            .finish()
    }
}

impl Settler {
    /// Fulfills the target, adopting thenable values.
    ///
    /// A thenable `value` defers settlement: the target subscribes to it
    /// with its own `resolve`/`reject` continuations and settles with the
    /// thenable's eventual outcome (nested thenables unwrap the same way).
    /// A no-op once the target has settled.
    pub fn resolve(&self, value: Value) {
        if let Value::Thenable(participant) = &value {
            if self.target.state() != StateKind::Pending {
                // Already settled: adoption could never take effect.
                return;
            }
            let resolve: SettleFn = {
                let settler = self.clone();
                Box::new(move |v| settler.resolve(v))
            };
            let reject: SettleFn = {
                let settler = self.clone();
                Box::new(move |r| settler.reject(r))
            };
            participant.subscribe(resolve, reject);
            return;
        }
        self.settle(Outcome::Fulfilled(value));
    }

    /// Rejects the target with `reason`, without unwrapping thenables.
    ///
    /// A no-op once the target has settled.
    pub fn reject(&self, reason: Value) {
        self.settle(Outcome::Rejected(reason));
    }

    /// The single `Pending -> Done` transition, then a drain.
    fn settle(&self, outcome: Outcome) {
        {
            let mut inner = self
                .target
                .inner
                .lock()
                .expect("deferred state poisoned");
            if !matches!(inner.state, State::Pending) {
                return;
            }
            tracing::trace!(kind = ?outcome.kind(), "deferred settled");
            inner.state = State::Done(outcome);
        }
        self.target.run();
    }
}

impl fmt::Debug for Settler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler")
            .field("state", &self.target.state())
            .finish()
    }
}

/// Per-observer dispatch routine; runs inside a scheduler job.
fn run_observer(observer: Observer, outcome: Outcome) {
    let Observer {
        on_fulfilled,
        on_rejected,
        complete,
        fail,
    } = observer;

    let (selected, payload, fulfilled) = match outcome {
        Outcome::Fulfilled(value) => (on_fulfilled, value, true),
        Outcome::Rejected(reason) => (on_rejected, reason, false),
    };

    // Pass-through: no handler for this settlement kind, so the downstream
    // settlement function matching the outcome kind gets the payload as-is.
    let Some(callback) = selected else {
        if fulfilled {
            complete(payload);
        } else {
            fail(payload);
        }
        return;
    };

    match catch_unwind(AssertUnwindSafe(move || callback(payload))) {
        Ok(Ok(data)) => match data {
            // Adoption: the downstream settles with the thenable's outcome.
            Value::Thenable(participant) => participant.subscribe(complete, fail),
            other => complete(other),
        },
        Ok(Err(fault)) => fail(fault),
        Err(payload) => fail(panic_reason(payload)),
    }
}

/// Converts a caught panic payload into a rejection reason.
fn panic_reason(payload: Box<dyn std::any::Any + Send>) -> Value {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        Value::text(*text)
    } else if let Some(text) = payload.downcast_ref::<String>() {
        Value::text(text.as_str())
    } else {
        Value::text("opaque panic payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executor_runs_synchronously() {
        let sched = Scheduler::new();
        let mut ran = false;
        Deferred::new(&sched, |_| {
            ran = true;
            Ok(())
        });
        assert!(ran);
    }

    #[test]
    fn resolve_settles_state_immediately() {
        let sched = Scheduler::new();
        let deferred = Deferred::resolve(&sched, Value::from(5));
        assert_eq!(deferred.state(), StateKind::Fulfilled);
        assert_eq!(deferred.outcome(), Some(Outcome::Fulfilled(Value::from(5))));
    }

    #[test]
    fn reject_settles_without_unwrapping() {
        let sched = Scheduler::new();
        let inner = Deferred::resolve(&sched, Value::from(1));
        let reason = Value::from(inner);
        let deferred = Deferred::reject(&sched, reason.clone());

        assert_eq!(deferred.state(), StateKind::Rejected);
        assert_eq!(deferred.outcome(), Some(Outcome::Rejected(reason)));
    }

    #[test]
    fn first_settlement_wins_resolve_then_reject() {
        let sched = Scheduler::new();
        let deferred = Deferred::new(&sched, |settler| {
            settler.resolve(Value::from(1));
            settler.reject(Value::text("late"));
            Ok(())
        });
        assert_eq!(deferred.outcome(), Some(Outcome::Fulfilled(Value::from(1))));
    }

    #[test]
    fn first_settlement_wins_reject_then_resolve() {
        let sched = Scheduler::new();
        let deferred = Deferred::new(&sched, |settler| {
            settler.reject(Value::text("first"));
            settler.resolve(Value::from(1));
            Ok(())
        });
        assert_eq!(
            deferred.outcome(),
            Some(Outcome::Rejected(Value::text("first")))
        );
    }

    #[test]
    fn executor_error_becomes_rejection() {
        let sched = Scheduler::new();
        let deferred = Deferred::new(&sched, |_| Err(Value::text("boom")));
        assert_eq!(
            deferred.outcome(),
            Some(Outcome::Rejected(Value::text("boom")))
        );
    }

    #[test]
    fn executor_error_after_settlement_is_discarded() {
        let sched = Scheduler::new();
        let deferred = Deferred::new(&sched, |settler| {
            settler.resolve(Value::from(9));
            Err(Value::text("too late"))
        });
        assert_eq!(deferred.outcome(), Some(Outcome::Fulfilled(Value::from(9))));
    }

    #[test]
    fn executor_panic_becomes_rejection() {
        let sched = Scheduler::new();
        let deferred = Deferred::new(&sched, |_| panic!("kaput"));
        assert_eq!(
            deferred.outcome(),
            Some(Outcome::Rejected(Value::text("kaput")))
        );
    }

    #[test]
    fn resolve_returns_existing_deferred_unchanged() {
        let sched = Scheduler::new();
        let (pending, _settler) = Deferred::pair(&sched);
        let wrapped = Deferred::resolve(&sched, Value::from(pending.clone()));

        // Same cell: settling through the original is visible via the result.
        assert!(Arc::ptr_eq(&pending.inner, &wrapped.inner));
    }

    #[test]
    fn then_returns_a_distinct_pending_value() {
        let sched = Scheduler::new();
        let deferred = Deferred::resolve(&sched, Value::from(1));
        let chained = deferred.then(None, None);

        assert!(!Arc::ptr_eq(&deferred.inner, &chained.inner));
        assert_eq!(chained.state(), StateKind::Pending);
    }

    #[test]
    fn handlers_run_only_inside_a_drain() {
        let sched = Scheduler::new();
        let deferred = Deferred::resolve(&sched, Value::from(1));
        let chained = deferred.then(Some(handler(Ok)), None);

        assert_eq!(chained.state(), StateKind::Pending);
        sched.run_until_idle();
        assert_eq!(chained.outcome(), Some(Outcome::Fulfilled(Value::from(1))));
    }

    #[test]
    fn handler_fault_rejects_downstream() {
        let sched = Scheduler::new();
        let chained = Deferred::resolve(&sched, Value::from(1))
            .then(Some(handler(|_| Err(Value::text("handler fault")))), None);

        sched.run_until_idle();
        assert_eq!(
            chained.outcome(),
            Some(Outcome::Rejected(Value::text("handler fault")))
        );
    }

    #[test]
    fn handler_panic_rejects_downstream() {
        let sched = Scheduler::new();
        let chained = Deferred::resolve(&sched, Value::from(1))
            .then(Some(handler(|_| panic!("handler blew up"))), None);

        sched.run_until_idle();
        assert_eq!(
            chained.outcome(),
            Some(Outcome::Rejected(Value::text("handler blew up")))
        );
    }

    #[test]
    fn catch_recovers_a_rejection() {
        let sched = Scheduler::new();
        let recovered = Deferred::reject(&sched, Value::text("e"))
            .catch(|reason| Ok(Value::list(vec![Value::text("handled"), reason])));

        sched.run_until_idle();
        assert_eq!(
            recovered.outcome(),
            Some(Outcome::Fulfilled(Value::list(vec![
                Value::text("handled"),
                Value::text("e"),
            ])))
        );
    }

    #[test]
    fn outcome_into_result() {
        let ok = Outcome::Fulfilled(Value::from(3)).into_result();
        assert_eq!(ok, Ok(Value::from(3)));

        let err = Outcome::Rejected(Value::text("r")).into_result();
        assert_eq!(
            err,
            Err(Rejected {
                reason: Value::text("r")
            })
        );
    }

    #[test]
    fn settler_debug_shows_state() {
        let sched = Scheduler::new();
        let (_deferred, settler) = Deferred::pair(&sched);
        assert_eq!(format!("{settler:?}"), "Settler { state: Pending }");
    }
}
