//! NewType wrappers for financial primitives.
//!
//! This module provides type-safe wrappers around decimal values
//! to prevent mixing incompatible types at compile time.
//!
//! # Types
//!
//! - [`Price`] - Asset price values
//! - [`Quantity`] - Trading quantities (shares)
//! - [`Amount`] - Monetary amounts (price × quantity)
//! - [`Symbol`] - Instrument identifiers
//! - [`OrderId`] - Order identifiers
//! - [`Timestamp`] - Unix millisecond timestamps

mod amount;
mod order_id;
mod price;
mod quantity;
mod symbol;
mod timestamp;

pub use amount::Amount;
pub use order_id::OrderId;
pub use price::Price;
pub use quantity::Quantity;
pub use symbol::Symbol;
pub use timestamp::Timestamp;

/// Validation error for `NewType` construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Price value is negative
    #[error("price cannot be negative: {0}")]
    NegativePrice(rust_decimal::Decimal),

    /// Quantity value is negative
    #[error("quantity cannot be negative: {0}")]
    NegativeQuantity(rust_decimal::Decimal),

    /// Amount value is negative
    #[error("amount cannot be negative: {0}")]
    NegativeAmount(rust_decimal::Decimal),

    /// Symbol format is invalid
    #[error("invalid symbol format: {0}")]
    InvalidSymbol(String),

    /// Symbol is empty
    #[error("symbol cannot be empty")]
    EmptySymbol,

    /// Order ID is empty
    #[error("order ID cannot be empty")]
    EmptyOrderId,

    /// Timestamp is invalid (negative)
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}
