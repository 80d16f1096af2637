//! # Sirocco Strategy
//!
//! Strategy contract and the multi-strategy coordinator.
//!
//! The [`StrategyManager`] subscribes to market, fill, and timer events
//! and fans them out to registered strategies by status and watched
//! symbols. Signals returned from strategies are published back onto the
//! bus as signal events.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod context;
mod manager;
mod r#trait;

/// Bundled reference strategies
pub mod strategies;

pub use context::{ContextStats, StrategyContext};
pub use manager::{ManagerStats, StrategyManager, TRIGGER_EVENT_ID};
pub use r#trait::{Strategy, StrategyStatus, StrategyType, WatchContext};

use thiserror::Error;

/// Errors raised by strategies and the strategy manager.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// Strategy ID is empty or already registered
    #[error("invalid strategy id: {0}")]
    InvalidId(String),

    /// Registration would exceed the configured maximum
    #[error("strategy limit reached: {0}")]
    LimitReached(usize),

    /// No strategy with the given ID
    #[error("strategy not found: {0}")]
    NotFound(String),

    /// Strategy configuration is malformed
    #[error("invalid strategy config: {0}")]
    InvalidConfig(String),

    /// Operation is not valid in the strategy's current status
    #[error("invalid status {status} for operation {operation}")]
    InvalidStatus {
        /// Current status
        status: StrategyStatus,
        /// Attempted operation
        operation: &'static str,
    },

    /// Strategy callback failure
    #[error("strategy execution failed: {0}")]
    Execution(String),
}
