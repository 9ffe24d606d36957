//! Injectable clock for the velocity estimator.
//!
//! `Bus::velocity_read` differentiates two timed position reads, so it needs
//! a monotonic timestamp source. Defaulting to `Instant::now()` makes the
//! estimator wall-clock-dependent and flaky to test; implementing [`Clock`]
//! for a test double makes it hermetic.

use std::time::Instant;

/// A source of monotonic timestamps.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The real monotonic clock, used outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A scripted clock for tests: returns a fixed sequence of instants derived
/// from a single real base instant, so elapsed-time math stays exact without
/// depending on scheduling jitter between calls.
#[cfg(test)]
pub(crate) struct ScriptedClock {
    base: Instant,
    offsets_ms: std::cell::RefCell<std::collections::VecDeque<u64>>,
}

#[cfg(test)]
impl ScriptedClock {
    pub(crate) fn new(offsets_ms: impl IntoIterator<Item = u64>) -> Self {
        Self {
            base: Instant::now(),
            offsets_ms: std::cell::RefCell::new(offsets_ms.into_iter().collect()),
        }
    }
}

#[cfg(test)]
impl Clock for ScriptedClock {
    fn now(&self) -> Instant {
        let offset = self
            .offsets_ms
            .borrow_mut()
            .pop_front()
            .expect("ScriptedClock ran out of scripted instants");
        self.base + std::time::Duration::from_millis(offset)
    }
}
