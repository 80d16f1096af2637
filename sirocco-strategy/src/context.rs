//! Per-strategy runtime context.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use sirocco_core::types::Timestamp;

/// Counters and metadata the manager keeps for one registered strategy.
pub struct StrategyContext {
    /// Configuration the strategy was registered with
    pub config: Mutex<serde_json::Value>,
    /// Registration time
    pub registered_at: Timestamp,
    /// Last time a callback ran
    pub last_active: Mutex<Timestamp>,
    /// Events offered to the strategy
    pub received_events: AtomicU64,
    /// Callbacks that completed without error
    pub processed_events: AtomicU64,
    /// Signals the strategy returned
    pub generated_signals: AtomicU64,
    /// Callbacks that returned an error
    pub errors: AtomicU64,
}

impl StrategyContext {
    /// Creates a context at registration time.
    #[must_use]
    pub fn new(config: serde_json::Value, registered_at: Timestamp) -> Self {
        Self {
            config: Mutex::new(config),
            registered_at,
            last_active: Mutex::new(registered_at),
            received_events: AtomicU64::new(0),
            processed_events: AtomicU64::new(0),
            generated_signals: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Records callback activity at `now`.
    pub fn touch(&self, now: Timestamp) {
        *self.last_active.lock() = now;
    }

    /// Returns a counters snapshot.
    #[must_use]
    pub fn stats(&self) -> ContextStats {
        ContextStats {
            registered_at: self.registered_at,
            last_active: *self.last_active.lock(),
            received_events: self.received_events.load(Ordering::Relaxed),
            processed_events: self.processed_events.load(Ordering::Relaxed),
            generated_signals: self.generated_signals.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of one strategy's counters.
#[derive(Debug, Clone, Serialize)]
pub struct ContextStats {
    /// Registration time
    pub registered_at: Timestamp,
    /// Last callback time
    pub last_active: Timestamp,
    /// Events offered
    pub received_events: u64,
    /// Callbacks completed
    pub processed_events: u64,
    /// Signals generated
    pub generated_signals: u64,
    /// Callback errors
    pub errors: u64,
}
