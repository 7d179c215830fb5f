//! Promissum: settle-once deferred values built on an explicit deferred scheduler.
//!
//! # Overview
//!
//! Promissum is a deferred-value ("future/promise") primitive built from
//! first principles on top of a bare callback-scheduling facility. A
//! [`Deferred`] settles exactly once, observers drain in registration order
//! through the [`Scheduler`]'s deferred lane, and chaining interoperates
//! with any foreign implementation of the [`Thenable`] protocol.
//!
//! # Core Guarantees
//!
//! - **Settle-once**: a value transitions `Pending -> Fulfilled` or
//!   `Pending -> Rejected` at most once; later settlement calls are no-ops
//! - **No synchronous handlers**: handler execution always goes through the
//!   scheduler, never the stack that registered the handler or settled the
//!   value
//! - **Registration-order draining**: observers on one value are scheduled
//!   in the order their `then` calls registered them
//! - **Structural interop**: adoption treats every `dyn Thenable`
//!   uniformly; nothing special-cases the crate's own type
//! - **Contained faults**: executor and handler faults (including panics)
//!   become rejections; nothing unwinds across a scheduler drain
//!
//! # Module Structure
//!
//! - [`value`]: dynamic value model shared by fulfillments and rejections
//! - [`thenable`]: the structural thenable protocol
//! - [`scheduler`]: two-lane deferred scheduler (deferred lane over timer lane)
//! - [`deferred`]: the settle-once container and chaining operators
//! - [`combinator`]: `all` and `race` aggregation
//! - [`invoke`]: receiver-explicit invocation utilities (independent of the core)
//! - [`error`]: error types at the `Result` boundary
//!
//! # Example
//!
//! ```
//! use promissum::{all, handler, Deferred, Outcome, Scheduler, Value};
//!
//! let sched = Scheduler::new();
//! let combined = all(
//!     &sched,
//!     [
//!         Value::from(1),
//!         Value::from(Deferred::resolve(&sched, Value::from(2))),
//!     ],
//! );
//! let tagged = combined.then(
//!     Some(handler(|values| Ok(Value::list(vec![Value::text("ok"), values])))),
//!     None,
//! );
//!
//! sched.run_until_idle();
//! assert_eq!(
//!     tagged.outcome(),
//!     Some(Outcome::Fulfilled(Value::list(vec![
//!         Value::text("ok"),
//!         Value::list(vec![Value::from(1), Value::from(2)]),
//!     ])))
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod combinator;
pub mod deferred;
pub mod error;
pub mod invoke;
pub mod scheduler;
pub mod thenable;
pub mod value;

// Re-exports for convenient access to core types
pub use combinator::{all, race};
pub use deferred::{handler, Deferred, Handler, Outcome, Settler, StateKind};
pub use error::{BudgetExceeded, Rejected};
pub use invoke::{invoke_with, rebind};
pub use scheduler::{Job, Scheduler};
pub use thenable::{SettleFn, Thenable};
pub use value::Value;
