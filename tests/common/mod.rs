#![allow(dead_code)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! mod common;
//! use common::*;
//! ```

use std::sync::{Arc, Mutex, Once};

use promissum::{SettleFn, Thenable, Value};
use proptest::prelude::ProptestConfig;
use proptest::test_runner::RngSeed;

static INIT_LOGGING: Once = Once::new();

/// Fixed seed for property tests when running under CI.
pub const DEFAULT_PROPTEST_SEED: u64 = 0x5EED5EED;

/// Initialize test logging with trace-level output.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Build a ProptestConfig with deterministic seed support for CI.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    let mut config = ProptestConfig::with_cases(cases);
    if matches!(config.rng_seed, RngSeed::Random) && std::env::var("CI").is_ok() {
        config.rng_seed = RngSeed::Fixed(DEFAULT_PROPTEST_SEED);
    }
    config
}

/// Shared ordered event log for observing callback execution order.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&self, event: impl Into<String>) {
        self.events
            .lock()
            .expect("recorder poisoned")
            .push(event.into());
    }

    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("recorder poisoned").clone()
    }
}

/// A minimal foreign thenable: not a `Deferred`, settled by the test when it
/// chooses. Subscribers registered after settlement are fired immediately.
pub struct ManualThenable {
    inner: Mutex<ManualInner>,
}

struct ManualInner {
    settled: Option<(bool, Value)>,
    waiting: Vec<(SettleFn, SettleFn)>,
}

impl ManualThenable {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(ManualInner {
                settled: None,
                waiting: Vec::new(),
            }),
        })
    }

    /// Wraps a shared handle as a value, keeping the handle for later firing.
    #[must_use]
    pub fn as_value(this: &Arc<Self>) -> Value {
        Value::Thenable(Arc::clone(this) as Arc<dyn Thenable>)
    }

    pub fn complete(&self, value: Value) {
        self.fire(true, value);
    }

    pub fn fail(&self, reason: Value) {
        self.fire(false, reason);
    }

    fn fire(&self, fulfilled: bool, payload: Value) {
        let waiting = {
            let mut inner = self.inner.lock().expect("manual thenable poisoned");
            if inner.settled.is_some() {
                return;
            }
            inner.settled = Some((fulfilled, payload.clone()));
            std::mem::take(&mut inner.waiting)
        };
        for (complete, fail) in waiting {
            if fulfilled {
                complete(payload.clone());
            } else {
                fail(payload.clone());
            }
        }
    }
}

impl Thenable for ManualThenable {
    fn subscribe(&self, complete: SettleFn, fail: SettleFn) {
        let mut inner = self.inner.lock().expect("manual thenable poisoned");
        match &inner.settled {
            Some((true, value)) => {
                let value = value.clone();
                drop(inner);
                complete(value);
            }
            Some((false, reason)) => {
                let reason = reason.clone();
                drop(inner);
                fail(reason);
            }
            None => inner.waiting.push((complete, fail)),
        }
    }
}
