//! `all` combinator: index-preserving, fail-fast aggregation.
//!
//! `all(items)` consumes an iterable of items (deferred values, foreign
//! thenables, or plain values) and returns one deferred value that:
//!
//! - fulfills with an ordered sequence of results, one per input item, each
//!   placed at the index its source held at iteration time, even when
//!   completion happens out of order;
//! - rejects with the **first** reason to arrive as soon as any single item
//!   rejects (remaining items keep settling; their outcomes are ignored, not
//!   cancelled);
//! - fulfills immediately with an empty sequence for empty input.
//!
//! Every item is normalized through [`Deferred::resolve`] before being
//! observed, so plain values still settle through the deferred path:
//! `all([1, 2, 3])` never exposes its result synchronously. This is a
//! contract, not an artifact of the scheduler.

use std::sync::{Arc, Mutex};

use crate::deferred::Deferred;
use crate::scheduler::Scheduler;
use crate::thenable::Thenable;
use crate::value::Value;

/// In-flight aggregation state shared by the per-item continuations.
struct Gather {
    slots: Vec<Option<Value>>,
    remaining: usize,
}

/// Aggregates `items` into one deferred value; see the module docs for the
/// exact semantics.
pub fn all<I>(sched: &Scheduler, items: I) -> Deferred
where
    I: IntoIterator<Item = Value>,
{
    let (combined, settler) = Deferred::pair(sched);

    let sources: Vec<Deferred> = items
        .into_iter()
        .map(|item| Deferred::resolve(sched, item))
        .collect();

    if sources.is_empty() {
        settler.resolve(Value::list(Vec::new()));
        return combined;
    }

    tracing::trace!(items = sources.len(), "all aggregation started");
    let gather = Arc::new(Mutex::new(Gather {
        slots: vec![None; sources.len()],
        remaining: sources.len(),
    }));

    for (index, source) in sources.iter().enumerate() {
        let gather = Arc::clone(&gather);
        let on_value = settler.clone();
        let on_fault = settler.clone();
        source.subscribe(
            Box::new(move |value| {
                let results = {
                    let mut gather = gather.lock().expect("all gather poisoned");
                    gather.slots[index] = Some(value);
                    gather.remaining -= 1;
                    if gather.remaining > 0 {
                        None
                    } else {
                        let results = gather
                            .slots
                            .iter_mut()
                            .map(|slot| slot.take().expect("slot filled before completion"))
                            .collect();
                        Some(results)
                    }
                };
                if let Some(results) = results {
                    on_value.resolve(Value::list(results));
                }
            }),
            // First rejection wins; the settle-once guard absorbs the rest.
            Box::new(move |reason| on_fault.reject(reason)),
        );
    }

    combined
}
