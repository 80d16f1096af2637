//! Fill records and fee accounting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::{Amount, OrderId, Price, Quantity, Symbol, Timestamp};

use super::OrderSide;

/// Fee schedule applied when a fill is created.
///
/// Defaults mirror the A-share retail schedule: commission 0.03% with a
/// 5-unit floor, stamp tax 0.1% on the sell side only, transfer fee
/// 0.002% with a 1-unit floor. Every rate and floor is tunable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Commission rate applied to the gross amount
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,
    /// Minimum commission per fill
    #[serde(default = "default_min_commission")]
    pub min_commission: Decimal,
    /// Stamp tax rate, charged on sells only
    #[serde(default = "default_stamp_tax_rate")]
    pub stamp_tax_rate: Decimal,
    /// Transfer fee rate
    #[serde(default = "default_transfer_fee_rate")]
    pub transfer_fee_rate: Decimal,
    /// Minimum transfer fee per fill
    #[serde(default = "default_min_transfer_fee")]
    pub min_transfer_fee: Decimal,
}

fn default_commission_rate() -> Decimal {
    Decimal::new(3, 4) // 0.0003
}

fn default_min_commission() -> Decimal {
    Decimal::from(5)
}

fn default_stamp_tax_rate() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

fn default_transfer_fee_rate() -> Decimal {
    Decimal::new(2, 5) // 0.00002
}

fn default_min_transfer_fee() -> Decimal {
    Decimal::ONE
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            commission_rate: default_commission_rate(),
            min_commission: default_min_commission(),
            stamp_tax_rate: default_stamp_tax_rate(),
            transfer_fee_rate: default_transfer_fee_rate(),
            min_transfer_fee: default_min_transfer_fee(),
        }
    }
}

impl FeeSchedule {
    /// A schedule with every rate and floor at zero. Useful in tests.
    #[must_use]
    pub fn free() -> Self {
        Self {
            commission_rate: Decimal::ZERO,
            min_commission: Decimal::ZERO,
            stamp_tax_rate: Decimal::ZERO,
            transfer_fee_rate: Decimal::ZERO,
            min_transfer_fee: Decimal::ZERO,
        }
    }
}

/// Fill - a realized (partial) execution of an order.
///
/// Fee arithmetic happens at construction: gross amount = qty × price,
/// commission = max(amount × rate, floor), stamp tax on sells only,
/// transfer fee with its own floor, and a signed net amount that is
/// negative for buys (cash out) and positive for sells (cash in).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Globally unique fill ID
    pub fill_id: String,
    /// Filled order ID
    pub order_id: OrderId,
    /// Instrument symbol
    pub symbol: Symbol,
    /// Side of the filled order
    pub side: OrderSide,
    /// Filled quantity
    pub quantity: Quantity,
    /// Execution price
    pub price: Price,
    /// Gross amount (quantity × price)
    pub amount: Amount,
    /// Commission charged
    pub commission: Decimal,
    /// Stamp tax charged (sells only)
    pub stamp_tax: Decimal,
    /// Transfer fee charged
    pub transfer_fee: Decimal,
    /// Total fees (commission + stamp tax + transfer fee)
    pub total_fee: Decimal,
    /// Signed cash impact: −(amount + fees) for buys, amount − fees for sells
    pub net_amount: Decimal,
    /// Execution timestamp
    pub timestamp: Timestamp,
    /// Originating strategy ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<String>,
    /// True when produced by the simulated execution handler
    pub is_simulated: bool,
}

impl Fill {
    /// Creates a fill and computes all fee fields from the schedule.
    #[must_use]
    pub fn new(
        order_id: OrderId,
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        price: Price,
        timestamp: Timestamp,
        strategy_id: Option<String>,
        fees: &FeeSchedule,
    ) -> Self {
        let amount = quantity.as_decimal() * price.as_decimal();

        let commission = (amount * fees.commission_rate).max(fees.min_commission);
        let stamp_tax = if side.is_sell() {
            amount * fees.stamp_tax_rate
        } else {
            Decimal::ZERO
        };
        let transfer_fee = (amount * fees.transfer_fee_rate).max(fees.min_transfer_fee);
        let total_fee = commission + stamp_tax + transfer_fee;

        let net_amount = if side.is_buy() {
            -(amount + total_fee)
        } else {
            amount - total_fee
        };

        Self {
            fill_id: Uuid::new_v4().to_string(),
            order_id,
            symbol,
            side,
            quantity,
            price,
            amount: Amount::new_unchecked(amount),
            commission,
            stamp_tax,
            transfer_fee,
            total_fee,
            net_amount,
            timestamp,
            strategy_id,
            is_simulated: false,
        }
    }

    /// Marks the fill as simulated.
    #[must_use]
    pub fn simulated(mut self) -> Self {
        self.is_simulated = true;
        self
    }

    /// Returns true if all fields are populated and in range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.fill_id.is_empty()
            && !self.quantity.is_zero()
            && !self.price.is_zero()
            && !self.amount.is_zero()
            && !self.timestamp.is_zero()
    }

    /// Returns the signed position delta of this fill
    /// (positive for buys, negative for sells).
    #[must_use]
    pub fn signed_quantity(&self) -> Decimal {
        self.side.direction() * self.quantity.as_decimal()
    }

    /// Returns the total fees as a fraction of the gross amount.
    #[must_use]
    pub fn fee_rate(&self) -> Decimal {
        if self.amount.is_zero() {
            return Decimal::ZERO;
        }
        self.total_fee / self.amount.as_decimal()
    }

    /// Creates the reverse of this fill at the given time (opposite side,
    /// same terms). Used to unwind erroneous executions.
    #[must_use]
    pub fn reverse(&self, timestamp: Timestamp, fees: &FeeSchedule) -> Self {
        let mut reversed = Self::new(
            self.order_id.clone(),
            self.symbol.clone(),
            self.side.opposite(),
            self.quantity,
            self.price,
            timestamp,
            self.strategy_id.clone(),
            fees,
        );
        reversed.is_simulated = self.is_simulated;
        reversed
    }
}

impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fill[{} {} {}@{} net={} fee={}]",
            self.symbol, self.side, self.quantity, self.price, self.net_amount, self.total_fee
        )
    }
}
