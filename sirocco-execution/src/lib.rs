//! # Sirocco Execution
//!
//! Order lifecycle management and fill generation.
//!
//! Two handlers share the [`OrderTracker`] bookkeeping core:
//! [`SimulatedExecutionHandler`] generates fills against current bars
//! with market microstructure simulation (slippage, partial fills,
//! delays, random rejection), and [`LiveExecutionHandler`] forwards
//! orders to a [`BrokerAdapter`] and translates its execution reports
//! into the same fill path. Both subscribe to `ORDER` events and emit
//! `FillEvent`s at the highest priority.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod live;
mod rng;
mod simulated;
mod tracker;

pub use live::{BrokerAdapter, ExecutionReport, LiveExecutionHandler};
pub use simulated::{SimulatedExecutionHandler, SimulationConfig};
pub use tracker::{ExecutionStats, OrderTracker};

use thiserror::Error;

/// Errors raised by execution handlers.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Order failed validation
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// No current bar for the order's symbol
    #[error("missing market data: {0}")]
    MissingMarketData(String),

    /// Order rejected by the (simulated) market
    #[error("order rejected: {0}")]
    Rejected(String),

    /// Order not found among active orders
    #[error("unknown order: {0}")]
    UnknownOrder(String),

    /// Broker adapter failure
    #[error("broker error: {0}")]
    Broker(String),
}
