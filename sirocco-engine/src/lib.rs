//! # Sirocco Engine
//!
//! Prioritized, multi-subscriber event bus with per-subscriber isolation.
//!
//! One main priority queue receives every published event. A single
//! dispatcher drains it in strict priority order (FIFO within equal
//! priority) and forwards each event to the bounded inbox of every
//! subscriber registered for the event's type. Each subscriber owns a
//! dedicated worker that serializes its handler invocations, so a slow or
//! failing handler never blocks publishers, the dispatcher, or other
//! subscribers.
//!
//! The [`timer`] module provides the periodic `TimerEvent` producers.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bus;
mod handler;
mod queue;
mod stats;

/// Periodic timer event producers
pub mod timer;

pub use bus::{BusConfig, EventBus, SubscriptionId};
pub use handler::{EventHandler, HandlerError, HandlerResult};
pub use stats::{EngineStats, SubscriberStats};

use thiserror::Error;

/// Errors raised by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The bus is not running
    #[error("event bus is not running")]
    NotRunning,

    /// A handler failed to initialize during registration
    #[error("handler '{name}' failed to initialize: {reason}")]
    HandlerInitFailed {
        /// Handler name
        name: String,
        /// Failure description
        reason: String,
    },

    /// No subscriber matched an unregister request
    #[error("no subscriber '{name}' registered for {event_type}")]
    SubscriberNotFound {
        /// Handler name
        name: String,
        /// Event type
        event_type: sirocco_core::event::EventType,
    },
}
