//! Domain entities for trading operations.
//!
//! This module provides:
//! - [`Bar`] - OHLCV quote records with optional precomputed indicators
//! - [`Signal`] - Strategy trading recommendations
//! - [`Order`] - Order lifecycle and bookkeeping
//! - [`Fill`] - Realized executions with fee accounting
//! - [`Position`] - Signed per-symbol holdings with average cost
//! - [`Account`] - Cash, frozen cash, positions, and fill history
//! - [`Trade`] - Informational round-trip aggregation

mod account;
mod bar;
mod fill;
mod order;
mod position;
mod signal;
mod trade;

pub use account::{Account, AccountError};
pub use bar::{Bar, BarBuilder, Frequency, Indicators};
pub use fill::{FeeSchedule, Fill};
pub use order::{
    Order, OrderAction, OrderBuilder, OrderSide, OrderStatus, OrderType, OrderValidationError,
    TimeInForce,
};
pub use position::{Position, PositionUpdate};
pub use signal::{Signal, SignalDirection};
pub use trade::{Trade, TradeStatus};

/// Validation error for domain entity construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataValidationError {
    /// Timestamp is missing or zero
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// OHLC price relation is violated
    #[error("invalid price relation: {0}")]
    InvalidPriceRelation(String),

    /// A required field has an out-of-range value
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// A required field is missing
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
