//! Structural thenable protocol.
//!
//! Interoperability between deferred-value implementations rests on a
//! capability check, not a type check: anything that can accept a pair of
//! settlement continuations and eventually invoke exactly one of them is a
//! valid settlement source. [`Deferred`](crate::deferred::Deferred)
//! implements the protocol, and so can any foreign type; adoption logic
//! treats every participant uniformly through `dyn Thenable`.

use crate::deferred::Deferred;
use crate::value::Value;

/// One settlement continuation: consumes the value or reason it is invoked
/// with. Each continuation is called at most once.
pub type SettleFn = Box<dyn FnOnce(Value) + Send>;

/// A participant in the thenable protocol.
pub trait Thenable: Send + Sync {
    /// Registers a pair of settlement continuations with this participant.
    ///
    /// The implementor must eventually invoke exactly one of the two:
    /// `complete` with its fulfillment value, or `fail` with its rejection
    /// reason. The unused continuation is dropped. Invocation may happen
    /// during `subscribe` itself (an already-settled participant) or at any
    /// later point; callers must not rely on either timing.
    fn subscribe(&self, complete: SettleFn, fail: SettleFn);

    /// Identity hook for the `resolve` short-circuit.
    ///
    /// Returns the underlying [`Deferred`] handle when this participant *is*
    /// one, letting [`Deferred::resolve`] return it unwrapped instead of
    /// constructing a redundant wrapper. Adoption never consults this:
    /// foreign participants and native ones settle through `subscribe`
    /// alike.
    fn as_deferred(&self) -> Option<Deferred> {
        None
    }
}
