//! `race` combinator: first settlement of any kind wins.
//!
//! `race(items)` returns a deferred value that adopts the first settlement
//! among its inputs, fulfillment or rejection alike. Later settlements hit
//! the settle-once guard and are ignored; nothing is cancelled.
//!
//! Empty input stays pending forever: with no sources there is no first
//! settlement to adopt.

use crate::deferred::Deferred;
use crate::scheduler::Scheduler;
use crate::thenable::Thenable;
use crate::value::Value;

/// Races `items` against each other; see the module docs for the exact
/// semantics.
pub fn race<I>(sched: &Scheduler, items: I) -> Deferred
where
    I: IntoIterator<Item = Value>,
{
    let (combined, settler) = Deferred::pair(sched);

    for item in items {
        let source = Deferred::resolve(sched, item);
        let on_value = settler.clone();
        let on_fault = settler.clone();
        source.subscribe(
            Box::new(move |value| on_value.resolve(value)),
            Box::new(move |reason| on_fault.reject(reason)),
        );
    }

    combined
}
