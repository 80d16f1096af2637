//! Time source abstraction.
//!
//! Components that need "now" (signal expiry, risk sweeps) take a
//! [`Clock`] so backtests can drive deterministic time while live
//! trading uses the system clock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::types::Timestamp;

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually advanced clock for backtests.
///
/// The replay driver sets it to each bar's timestamp before publishing,
/// so downstream expiry and risk checks see replay time.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Creates a clock at the given start time.
    #[must_use]
    pub fn new(start: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            millis: AtomicI64::new(start.as_millis()),
        })
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: Timestamp) {
        self.millis.store(now.as_millis(), Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::new_unchecked(self.millis.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        assert!(clock.now().as_millis() > 0);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(Timestamp::new_unchecked(1000));
        assert_eq!(clock.now().as_millis(), 1000);
        clock.set(Timestamp::new_unchecked(5000));
        assert_eq!(clock.now().as_millis(), 5000);
    }
}
