//! Order types and lifecycle bookkeeping.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Amount, OrderId, Price, Quantity, Symbol, Timestamp};

/// Order side - buy or sell direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl OrderSide {
    /// Returns true if this is a buy order.
    #[must_use]
    pub const fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }

    /// Returns true if this is a sell order.
    #[must_use]
    pub const fn is_sell(&self) -> bool {
        matches!(self, Self::Sell)
    }

    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns the direction multiplier (1 for Buy, -1 for Sell).
    #[must_use]
    pub fn direction(&self) -> Decimal {
        match self {
            Self::Buy => Decimal::ONE,
            Self::Sell => -Decimal::ONE,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type - specifies how the order should be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Market order - executes at best available price
    Market,
    /// Limit order - executes at the limit price or better
    Limit,
    /// Stop order - becomes a market order at the stop price
    Stop,
    /// Stop-limit order - becomes a limit order at the stop price
    StopLimit,
}

impl OrderType {
    /// Returns true if this order type requires a limit price.
    #[must_use]
    pub const fn requires_price(&self) -> bool {
        matches!(self, Self::Limit | Self::StopLimit)
    }

    /// Returns true if this is a market order type.
    #[must_use]
    pub const fn is_market(&self) -> bool {
        matches!(self, Self::Market | Self::Stop)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Limit => write!(f, "LIMIT"),
            Self::Stop => write!(f, "STOP"),
            Self::StopLimit => write!(f, "STOP_LIMIT"),
        }
    }
}

/// Order status - current lifecycle state of an order.
///
/// # State transitions
///
/// ```text
/// Pending -> Submitted -> PartiallyFilled -> terminal
///         -> Rejected  -> terminal
///         -> Cancelled
///
/// terminal = Filled | Cancelled | Rejected | Expired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created, not yet handed to an execution handler
    Pending,
    /// Accepted by an execution handler
    Submitted,
    /// Partially filled, remainder still working
    PartiallyFilled,
    /// Completely filled
    Filled,
    /// Cancelled before completion
    Cancelled,
    /// Rejected by validation, risk, or the market
    Rejected,
    /// Expired per its time-in-force
    Expired,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Cancelled | Self::Rejected | Self::Expired
        )
    }

    /// Returns true if the order is still working.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Submitted | Self::PartiallyFilled)
    }

    /// Returns true if an order in this status can be cancelled.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        self.is_active()
    }

    /// Checks whether a transition to `new_status` is valid.
    #[must_use]
    pub const fn can_transition_to(&self, new_status: Self) -> bool {
        match (self, new_status) {
            (Self::Pending, Self::Submitted | Self::Rejected | Self::Cancelled)
            | (
                Self::Submitted | Self::PartiallyFilled,
                Self::PartiallyFilled
                | Self::Filled
                | Self::Cancelled
                | Self::Rejected
                | Self::Expired,
            ) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Submitted => write!(f, "SUBMITTED"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Filled => write!(f, "FILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Time in force - validity policy of an order across time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Valid for the current trading day
    #[default]
    Day,
    /// Good till cancelled
    Gtc,
    /// Immediate or cancel
    Ioc,
    /// Fill or kill
    Fok,
    /// Good till the order's expire time
    Gtt,
}

impl TimeInForce {
    /// Returns true if this is an immediate execution policy.
    #[must_use]
    pub const fn is_immediate(&self) -> bool {
        matches!(self, Self::Ioc | Self::Fok)
    }

    /// Returns true if partial fills are allowed.
    #[must_use]
    pub const fn allows_partial_fill(&self) -> bool {
        !matches!(self, Self::Fok)
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "DAY"),
            Self::Gtc => write!(f, "GTC"),
            Self::Ioc => write!(f, "IOC"),
            Self::Fok => write!(f, "FOK"),
            Self::Gtt => write!(f, "GTT"),
        }
    }
}

/// Order action carried on an order event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderAction {
    /// Submit a new order
    New,
    /// Modify a working order
    Modify,
    /// Cancel a working order
    Cancel,
    /// Reject notification
    Reject,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Modify => write!(f, "MODIFY"),
            Self::Cancel => write!(f, "CANCEL"),
            Self::Reject => write!(f, "REJECT"),
        }
    }
}

/// Order - a commitment to trade at specific terms pending execution.
///
/// Fill bookkeeping maintains `filled_quantity + remaining_quantity()
/// == quantity` and the volume-weighted average fill price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub order_id: OrderId,
    /// Instrument symbol
    pub symbol: Symbol,
    /// Order type
    pub order_type: OrderType,
    /// Order side
    pub side: OrderSide,
    /// Original quantity
    pub quantity: Quantity,
    /// Limit price (zero for market orders)
    pub price: Price,
    /// Current status
    pub status: OrderStatus,
    /// Creation timestamp
    pub created_time: Timestamp,
    /// Submission timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_time: Option<Timestamp>,
    /// Last update timestamp
    pub update_time: Timestamp,
    /// Filled quantity
    pub filled_quantity: Quantity,
    /// Volume-weighted average fill price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_fill_price: Option<Price>,
    /// Cumulative fill amount (Σ qty × price)
    pub total_fill_amount: Amount,
    /// Originating signal ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_id: Option<String>,
    /// Originating strategy ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<String>,
    /// Free-form tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Time in force
    #[serde(default)]
    pub time_in_force: TimeInForce,
    /// Expire timestamp (required for GTT)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<Timestamp>,
    /// Cancel or reject reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl Order {
    /// Creates a new builder for `Order`.
    #[must_use]
    pub fn builder() -> OrderBuilder {
        OrderBuilder::default()
    }

    /// Creates a new pending limit order.
    #[must_use]
    pub fn limit(
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        price: Price,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            order_id: OrderId::generate(),
            symbol,
            order_type: OrderType::Limit,
            side,
            quantity,
            price,
            status: OrderStatus::Pending,
            created_time: timestamp,
            submitted_time: None,
            update_time: timestamp,
            filled_quantity: Quantity::ZERO,
            avg_fill_price: None,
            total_fill_amount: Amount::ZERO,
            signal_id: None,
            strategy_id: None,
            tag: None,
            time_in_force: TimeInForce::default(),
            expire_time: None,
            cancel_reason: None,
        }
    }

    /// Creates a new pending market order.
    #[must_use]
    pub fn market(
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> Self {
        let mut order = Self::limit(symbol, side, quantity, Price::ZERO, timestamp);
        order.order_type = OrderType::Market;
        order
    }

    /// Returns the remaining unfilled quantity.
    #[must_use]
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    /// Returns true if the order is still working.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns true if the order reached a terminal state.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.status.is_final()
    }

    /// Returns true if the order can currently be cancelled.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        self.status.is_cancellable()
    }

    /// Returns true if the order has expired at `now` per its
    /// time-in-force.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        match self.time_in_force {
            TimeInForce::Gtt => self.expire_time.is_some_and(|t| t < now),
            _ => false,
        }
    }

    /// Basic validity: positive quantity and a non-negative limit price
    /// (market orders may carry price zero).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        if self.quantity.is_zero() || self.quantity.is_negative() {
            return false;
        }
        if self.order_type.requires_price() && self.price.is_zero() {
            return false;
        }
        true
    }

    /// Marks the order submitted at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not in `Pending` status.
    pub fn submit(&mut self, now: Timestamp) -> Result<(), OrderValidationError> {
        self.update_status(OrderStatus::Submitted, now)?;
        self.submitted_time = Some(now);
        Ok(())
    }

    /// Updates the order status with transition validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is invalid.
    pub fn update_status(
        &mut self,
        new_status: OrderStatus,
        now: Timestamp,
    ) -> Result<(), OrderValidationError> {
        if !self.status.can_transition_to(new_status) {
            return Err(OrderValidationError::InvalidStatusTransition {
                from: self.status,
                to: new_status,
            });
        }
        self.status = new_status;
        self.update_time = now;
        Ok(())
    }

    /// Records a fill, updating filled quantity, average price, cumulative
    /// amount, and status (`PartiallyFilled` or `Filled`).
    ///
    /// # Errors
    ///
    /// Returns an error if the fill would exceed the order quantity.
    pub fn record_fill(
        &mut self,
        fill_qty: Quantity,
        fill_price: Price,
        now: Timestamp,
    ) -> Result<(), OrderValidationError> {
        let new_filled = self.filled_quantity + fill_qty;
        if new_filled > self.quantity {
            return Err(OrderValidationError::FillExceedsQuantity {
                fill: fill_qty,
                remaining: self.remaining_quantity(),
            });
        }

        let fill_value = fill_price.as_decimal() * fill_qty.as_decimal();
        let total_value = self.total_fill_amount.as_decimal() + fill_value;
        self.total_fill_amount = Amount::new_unchecked(total_value);
        self.filled_quantity = new_filled;
        if !new_filled.is_zero() {
            self.avg_fill_price =
                Some(Price::new_unchecked(total_value / new_filled.as_decimal()));
        }
        self.update_time = now;

        self.status = if self.filled_quantity == self.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };

        Ok(())
    }

    /// Marks the order cancelled with a reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not cancellable.
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), OrderValidationError> {
        self.update_status(OrderStatus::Cancelled, now)?;
        self.cancel_reason = Some(reason.into());
        Ok(())
    }

    /// Marks the order rejected with a reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is already in a terminal state.
    pub fn reject(
        &mut self,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), OrderValidationError> {
        self.update_status(OrderStatus::Rejected, now)?;
        self.cancel_reason = Some(reason.into());
        Ok(())
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order[{} {} {} {}@{} {} filled={}]",
            self.order_id,
            self.side,
            self.symbol,
            self.quantity,
            self.price,
            self.status,
            self.filled_quantity
        )
    }
}

/// Builder for `Order`.
#[derive(Debug, Default)]
pub struct OrderBuilder {
    order_id: Option<OrderId>,
    symbol: Option<Symbol>,
    order_type: Option<OrderType>,
    side: Option<OrderSide>,
    quantity: Option<Quantity>,
    price: Option<Price>,
    signal_id: Option<String>,
    strategy_id: Option<String>,
    tag: Option<String>,
    time_in_force: TimeInForce,
    expire_time: Option<Timestamp>,
    created_time: Option<Timestamp>,
}

impl OrderBuilder {
    /// Sets the order ID (generated when not provided).
    #[must_use]
    pub fn order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// Sets the symbol.
    #[must_use]
    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = Some(symbol);
        self
    }

    /// Sets the order type.
    #[must_use]
    pub fn order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = Some(order_type);
        self
    }

    /// Sets the side.
    #[must_use]
    pub fn side(mut self, side: OrderSide) -> Self {
        self.side = Some(side);
        self
    }

    /// Sets the quantity.
    #[must_use]
    pub fn quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Sets the limit price.
    #[must_use]
    pub fn price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets the originating signal ID.
    #[must_use]
    pub fn signal_id(mut self, signal_id: impl Into<String>) -> Self {
        self.signal_id = Some(signal_id.into());
        self
    }

    /// Sets the originating strategy ID.
    #[must_use]
    pub fn strategy_id(mut self, strategy_id: impl Into<String>) -> Self {
        self.strategy_id = Some(strategy_id.into());
        self
    }

    /// Sets the tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the time in force.
    #[must_use]
    pub fn time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Sets the expire time (for GTT orders).
    #[must_use]
    pub fn expire_time(mut self, expire_time: Timestamp) -> Self {
        self.expire_time = Some(expire_time);
        self
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub fn created_time(mut self, created_time: Timestamp) -> Self {
        self.created_time = Some(created_time);
        self
    }

    /// Builds the `Order` in `Pending` status.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing, the quantity is
    /// zero, a price-requiring type has no price, or a GTT order has no
    /// expire time.
    pub fn build(self) -> Result<Order, OrderValidationError> {
        let order_type = self
            .order_type
            .ok_or(OrderValidationError::MissingField("order_type"))?;
        let quantity = self
            .quantity
            .ok_or(OrderValidationError::MissingField("quantity"))?;
        if quantity.is_zero() {
            return Err(OrderValidationError::InvalidQuantity(
                "quantity must be positive".to_string(),
            ));
        }
        let price = match self.price {
            Some(price) => price,
            None if order_type.requires_price() => {
                return Err(OrderValidationError::MissingPrice);
            }
            None => Price::ZERO,
        };
        if self.time_in_force == TimeInForce::Gtt && self.expire_time.is_none() {
            return Err(OrderValidationError::MissingField("expire_time"));
        }

        let created_time = self.created_time.unwrap_or_else(Timestamp::now);
        Ok(Order {
            order_id: self.order_id.unwrap_or_else(OrderId::generate),
            symbol: self
                .symbol
                .ok_or(OrderValidationError::MissingField("symbol"))?,
            order_type,
            side: self
                .side
                .ok_or(OrderValidationError::MissingField("side"))?,
            quantity,
            price,
            status: OrderStatus::Pending,
            created_time,
            submitted_time: None,
            update_time: created_time,
            filled_quantity: Quantity::ZERO,
            avg_fill_price: None,
            total_fill_amount: Amount::ZERO,
            signal_id: self.signal_id,
            strategy_id: self.strategy_id,
            tag: self.tag,
            time_in_force: self.time_in_force,
            expire_time: self.expire_time,
            cancel_reason: None,
        })
    }
}

/// Order validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderValidationError {
    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Missing price for a price-requiring order type
    #[error("price is required for limit orders")]
    MissingPrice,

    /// Invalid quantity
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Invalid status transition
    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status
        from: OrderStatus,
        /// Attempted new status
        to: OrderStatus,
    },

    /// Fill exceeds remaining quantity
    #[error("fill quantity {fill} exceeds remaining quantity {remaining}")]
    FillExceedsQuantity {
        /// Fill quantity
        fill: Quantity,
        /// Remaining quantity
        remaining: Quantity,
    },
}
