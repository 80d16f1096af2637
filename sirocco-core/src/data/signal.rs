//! Trading signal types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::{Amount, Price, Symbol, Timestamp};

/// Default signal validity window in seconds.
pub const DEFAULT_VALIDITY_SECS: i64 = 300;

/// Default signal priority (1 = most urgent, 10 = least).
pub const DEFAULT_SIGNAL_PRIORITY: u8 = 5;

/// Signal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDirection {
    /// Open or add to a long exposure
    Buy,
    /// Close or reduce exposure
    Sell,
    /// No action recommended
    Hold,
}

impl SignalDirection {
    /// Returns true if this is a buy signal.
    #[must_use]
    pub const fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }

    /// Returns true if this is a sell signal.
    #[must_use]
    pub const fn is_sell(&self) -> bool {
        matches!(self, Self::Sell)
    }

    /// Returns true if this is a hold signal.
    #[must_use]
    pub const fn is_hold(&self) -> bool {
        matches!(self, Self::Hold)
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Trading signal - a strategy's directional, strength-weighted
/// recommendation for one symbol.
///
/// Strength is clamped to `[0, 1]` and priority to `[1, 10]` at
/// construction, so a stored signal is always in range.
///
/// # Examples
///
/// ```
/// use sirocco_core::data::{Signal, SignalDirection};
/// use sirocco_core::types::{Price, Symbol, Timestamp};
/// use rust_decimal::Decimal;
///
/// let signal = Signal::new(
///     "ma-cross",
///     Symbol::new("000001.SZ").unwrap(),
///     SignalDirection::Buy,
///     Decimal::new(8, 1),
///     Timestamp::now(),
///     Price::new(Decimal::from(10)).unwrap(),
///     "golden cross",
/// );
/// assert!(signal.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Globally unique signal ID
    pub signal_id: String,
    /// Originating strategy ID
    pub strategy_id: String,
    /// Instrument symbol
    pub symbol: Symbol,
    /// Signal direction
    pub direction: SignalDirection,
    /// Signal strength in `[0, 1]`
    pub strength: Decimal,
    /// Signal timestamp
    pub timestamp: Timestamp,
    /// Reference price at decision time
    pub reference_price: Price,
    /// Suggested position size in quote currency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_position_size: Option<Amount>,
    /// Human-readable reason, kept for post-trade review
    pub reason: String,
    /// Priority in `[1, 10]`, lower is more urgent
    pub priority: u8,
    /// Validity window in seconds
    pub validity_secs: i64,
    /// Stop-loss price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss_price: Option<Price>,
    /// Take-profit price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_price: Option<Price>,
}

impl Signal {
    /// Creates a new signal with a generated ID and default
    /// priority/validity.
    ///
    /// Strength is clamped to `[0, 1]`.
    #[must_use]
    pub fn new(
        strategy_id: impl Into<String>,
        symbol: Symbol,
        direction: SignalDirection,
        strength: Decimal,
        timestamp: Timestamp,
        reference_price: Price,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            signal_id: Uuid::new_v4().to_string(),
            strategy_id: strategy_id.into(),
            symbol,
            direction,
            strength: strength.clamp(Decimal::ZERO, Decimal::ONE),
            timestamp,
            reference_price,
            suggested_position_size: None,
            reason: reason.into(),
            priority: DEFAULT_SIGNAL_PRIORITY,
            validity_secs: DEFAULT_VALIDITY_SECS,
            stop_loss_price: None,
            take_profit_price: None,
        }
    }

    /// Sets the suggested position size.
    #[must_use]
    pub fn with_suggested_size(mut self, size: Amount) -> Self {
        self.suggested_position_size = Some(size);
        self
    }

    /// Sets the priority, clamped to `[1, 10]`.
    #[must_use]
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(1, 10);
        self
    }

    /// Sets the validity window in seconds.
    #[must_use]
    pub fn with_validity_secs(mut self, secs: i64) -> Self {
        self.validity_secs = secs;
        self
    }

    /// Sets the stop-loss price.
    #[must_use]
    pub fn with_stop_loss(mut self, price: Price) -> Self {
        self.stop_loss_price = Some(price);
        self
    }

    /// Sets the take-profit price.
    #[must_use]
    pub fn with_take_profit(mut self, price: Price) -> Self {
        self.take_profit_price = Some(price);
        self
    }

    /// Returns true if all required fields are populated and in range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.signal_id.is_empty()
            && !self.strategy_id.is_empty()
            && self.strength >= Decimal::ZERO
            && self.strength <= Decimal::ONE
            && !self.reference_price.is_zero()
            && !self.timestamp.is_zero()
            && (1..=10).contains(&self.priority)
    }

    /// Returns true if the signal has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.timestamp.plus_secs(self.validity_secs) < now
    }

    /// Returns true if this is a buy signal.
    #[must_use]
    pub const fn is_buy(&self) -> bool {
        self.direction.is_buy()
    }

    /// Returns true if this is a sell signal.
    #[must_use]
    pub const fn is_sell(&self) -> bool {
        self.direction.is_sell()
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signal[{} {} {} strength={} @{}]",
            self.strategy_id, self.direction, self.symbol, self.strength, self.reference_price
        )
    }
}
