//! Event handler contract.

use async_trait::async_trait;
use sirocco_core::event::Event;

/// Error type returned from handler callbacks.
///
/// Handlers live in different crates with their own error enums; the
/// worker only needs `Display`, so the boundary type is erased.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for handler callbacks.
pub type HandlerResult = Result<(), HandlerError>;

/// Contract implemented by every event bus subscriber.
///
/// A handler is registered for one or more event types. Its
/// `handle_event` invocations are serialized by the subscriber's worker;
/// a handler never runs in parallel with itself. Errors returned from
/// `handle_event` are caught at the worker boundary, logged, and counted
/// against the subscriber - they never cross the bus.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable handler name used in registration, logs, and statistics.
    fn name(&self) -> &str;

    /// Called once before the subscription becomes active. Registration
    /// is abandoned if this fails.
    async fn initialize(&self) -> HandlerResult {
        Ok(())
    }

    /// Handles one event.
    async fn handle_event(&self, event: &Event) -> HandlerResult;

    /// Called after the subscription is torn down and its inbox drained.
    async fn destroy(&self) -> HandlerResult {
        Ok(())
    }
}
