//! Engine statistics snapshots.

use serde::Serialize;
use sirocco_core::event::EventType;

/// Point-in-time statistics for one subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberStats {
    /// Handler name
    pub name: String,
    /// Subscribed event type
    pub event_type: EventType,
    /// Events currently buffered in the inbox
    pub inbox_size: usize,
    /// Handler invocations that completed without error
    pub processed: u64,
    /// Handler invocations that returned an error
    pub failed: u64,
    /// Events dropped because the inbox was full
    pub dropped: u64,
    /// True while the worker is accepting events
    pub active: bool,
}

/// Point-in-time statistics for the whole engine.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    /// True while the dispatcher is running
    pub running: bool,
    /// Events waiting in the main queue
    pub queue_size: usize,
    /// Events accepted by `publish`
    pub published: u64,
    /// Events pulled from the main queue and forwarded
    pub dispatched: u64,
    /// Events dropped by back-pressure (main queue or subscriber inbox)
    pub dropped: u64,
    /// Per-subscriber statistics
    pub subscribers: Vec<SubscriberStats>,
}
