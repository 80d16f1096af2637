//! Signed per-symbol positions with average cost tracking.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Price, Symbol, Timestamp};

/// Outcome of applying a fill delta to a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionUpdate {
    /// Position remains open after the update
    Open,
    /// Position quantity reached zero; the entry should be removed
    Closed,
}

/// Position - net holding in one symbol with average cost basis.
///
/// Quantity is signed: positive = long, negative = short, zero = flat.
/// A flat position is deleted by its owner (see [`PositionUpdate::Closed`]).
///
/// # Update rule
///
/// For a fill of signed delta `Δ` at price `p`:
/// - Same sign (add): `avg' = |q·avg + Δ·p| / |q + Δ|`
/// - Opposite sign, `|Δ| ≤ |q|` (reduce): average cost unchanged
/// - Opposite sign, `|Δ| > |q|` (reverse through zero): `avg' = p`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument symbol
    pub symbol: Symbol,
    /// Signed quantity (+long / −short)
    pub quantity: Decimal,
    /// Average cost price
    pub avg_price: Price,
    /// Strategy that opened the position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<String>,
    /// Last update timestamp
    pub update_time: Timestamp,
}

impl Position {
    /// Creates a new position from an opening fill delta.
    #[must_use]
    pub fn open(
        symbol: Symbol,
        quantity: Decimal,
        price: Price,
        strategy_id: Option<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            symbol,
            quantity,
            avg_price: price,
            strategy_id,
            update_time: timestamp,
        }
    }

    /// Returns true if this is a long position.
    #[must_use]
    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    /// Returns true if this is a short position.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.quantity < Decimal::ZERO
    }

    /// Returns true if the position is flat.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Returns the absolute market value at `price`.
    #[must_use]
    pub fn market_value(&self, price: Price) -> Decimal {
        self.quantity.abs() * price.as_decimal()
    }

    /// Returns the absolute value at average cost.
    #[must_use]
    pub fn entry_value(&self) -> Decimal {
        self.quantity.abs() * self.avg_price.as_decimal()
    }

    /// Returns the unrealized P&L at `price` (sign-aware).
    #[must_use]
    pub fn unrealized_pnl(&self, price: Price) -> Decimal {
        (price.as_decimal() - self.avg_price.as_decimal()) * self.quantity
    }

    /// Applies a signed fill delta at `price`.
    ///
    /// Returns [`PositionUpdate::Closed`] when the resulting quantity is
    /// zero, in which case the owner must delete the entry.
    pub fn apply_delta(
        &mut self,
        delta: Decimal,
        price: Price,
        timestamp: Timestamp,
    ) -> PositionUpdate {
        let old_qty = self.quantity;
        let new_qty = old_qty + delta;
        self.update_time = timestamp;

        if new_qty.is_zero() {
            self.quantity = Decimal::ZERO;
            return PositionUpdate::Closed;
        }

        let same_sign = !old_qty.is_zero() && old_qty.is_sign_positive() == delta.is_sign_positive();
        if old_qty.is_zero() || (!same_sign && new_qty.is_sign_positive() != old_qty.is_sign_positive())
        {
            // Opening from flat, or reversing through zero: cost basis restarts at p.
            self.avg_price = price;
        } else if same_sign {
            let total_cost =
                (old_qty * self.avg_price.as_decimal() + delta * price.as_decimal()).abs();
            self.avg_price = Price::new_unchecked(total_cost / new_qty.abs());
        }
        // Reducing toward zero leaves the average cost unchanged.

        self.quantity = new_qty;
        PositionUpdate::Open
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Position[{} qty={} avg={}]",
            self.symbol, self.quantity, self.avg_price
        )
    }
}
