//! Round-trip trade records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Fill;

/// Trade status across its round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    /// Opened, nothing closed yet
    Open,
    /// Part of the opened quantity has been closed
    PartiallyClosed,
    /// Fully closed
    Closed,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::PartiallyClosed => write!(f, "PARTIALLY_CLOSED"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Trade - an informational aggregation of one opening fill and the fills
/// that close it.
///
/// This record exists for post-trade review. It is NOT the authoritative
/// P&L ledger; authoritative P&L is derived from account cash plus
/// position valuation plus realized history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Opening fill
    pub open_fill: Fill,
    /// Closing fills, in execution order
    pub close_fills: Vec<Fill>,
    /// Quantity closed so far
    pub closed_quantity: Decimal,
    /// Realized P&L net of fees on the closed quantity
    pub realized_pnl: Decimal,
    /// Current status
    pub status: TradeStatus,
}

impl Trade {
    /// Creates a new open trade from an opening fill.
    #[must_use]
    pub fn open(open_fill: Fill) -> Self {
        Self {
            open_fill,
            close_fills: Vec::new(),
            closed_quantity: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            status: TradeStatus::Open,
        }
    }

    /// Returns the quantity still open.
    #[must_use]
    pub fn remaining_quantity(&self) -> Decimal {
        self.open_fill.quantity.as_decimal() - self.closed_quantity
    }

    /// Records a closing fill against this trade.
    ///
    /// P&L for a long open is `(close − open) × qty` minus the closing
    /// fill's fees and a proportional share of the opening fees; symmetric
    /// for shorts. Quantity beyond the remaining open amount is ignored by
    /// the caller splitting fills across trades.
    pub fn record_close(&mut self, close_fill: Fill) {
        let close_qty = close_fill
            .quantity
            .as_decimal()
            .min(self.remaining_quantity());
        if close_qty <= Decimal::ZERO {
            return;
        }

        let open_price = self.open_fill.price.as_decimal();
        let close_price = close_fill.price.as_decimal();
        let direction = self.open_fill.side.direction();
        let gross = (close_price - open_price) * close_qty * direction;

        let open_fee_share = if self.open_fill.quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.open_fill.total_fee * close_qty / self.open_fill.quantity.as_decimal()
        };
        self.realized_pnl += gross - close_fill.total_fee - open_fee_share;

        self.closed_quantity += close_qty;
        self.close_fills.push(close_fill);
        self.status = if self.remaining_quantity().is_zero() {
            TradeStatus::Closed
        } else {
            TradeStatus::PartiallyClosed
        };
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade[{} {} open={} closed={} pnl={} {}]",
            self.open_fill.symbol,
            self.open_fill.side,
            self.open_fill.quantity,
            self.closed_quantity,
            self.realized_pnl,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FeeSchedule, OrderSide};
    use crate::types::{OrderId, Price, Quantity, Symbol, Timestamp};
    use rust_decimal_macros::dec;

    fn fill(side: OrderSide, qty: Decimal, price: Decimal) -> Fill {
        Fill::new(
            OrderId::new("ORD-1").unwrap(),
            Symbol::new("000001.SZ").unwrap(),
            side,
            Quantity::new(qty).unwrap(),
            Price::new(price).unwrap(),
            Timestamp::new_unchecked(1000),
            None,
            &FeeSchedule::free(),
        )
    }

    #[test]
    fn test_trade_full_close_long() {
        let mut trade = Trade::open(fill(OrderSide::Buy, dec!(1000), dec!(10.00)));
        trade.record_close(fill(OrderSide::Sell, dec!(1000), dec!(11.00)));

        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.realized_pnl, dec!(1000));
        assert_eq!(trade.remaining_quantity(), dec!(0));
    }

    #[test]
    fn test_trade_partial_close() {
        let mut trade = Trade::open(fill(OrderSide::Buy, dec!(1000), dec!(10.00)));
        trade.record_close(fill(OrderSide::Sell, dec!(400), dec!(10.50)));

        assert_eq!(trade.status, TradeStatus::PartiallyClosed);
        assert_eq!(trade.realized_pnl, dec!(200));
        assert_eq!(trade.remaining_quantity(), dec!(600));
    }

    #[test]
    fn test_trade_short_close() {
        let mut trade = Trade::open(fill(OrderSide::Sell, dec!(500), dec!(10.00)));
        trade.record_close(fill(OrderSide::Buy, dec!(500), dec!(9.00)));

        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.realized_pnl, dec!(500));
    }

    #[test]
    fn test_trade_fees_reduce_pnl() {
        let fees = FeeSchedule::default();
        let open = Fill::new(
            OrderId::new("ORD-2").unwrap(),
            Symbol::new("000001.SZ").unwrap(),
            OrderSide::Buy,
            Quantity::new(dec!(1000)).unwrap(),
            Price::new(dec!(10.00)).unwrap(),
            Timestamp::new_unchecked(1000),
            None,
            &fees,
        );
        let close = Fill::new(
            OrderId::new("ORD-3").unwrap(),
            Symbol::new("000001.SZ").unwrap(),
            OrderSide::Sell,
            Quantity::new(dec!(1000)).unwrap(),
            Price::new(dec!(11.00)).unwrap(),
            Timestamp::new_unchecked(2000),
            None,
            &fees,
        );
        let open_fee = open.total_fee;
        let close_fee = close.total_fee;

        let mut trade = Trade::open(open);
        trade.record_close(close);
        assert_eq!(trade.realized_pnl, dec!(1000) - open_fee - close_fee);
    }

    #[test]
    fn test_trade_overclose_ignored() {
        let mut trade = Trade::open(fill(OrderSide::Buy, dec!(100), dec!(10.00)));
        trade.record_close(fill(OrderSide::Sell, dec!(100), dec!(10.00)));
        let pnl = trade.realized_pnl;
        trade.record_close(fill(OrderSide::Sell, dec!(100), dec!(12.00)));
        assert_eq!(trade.realized_pnl, pnl);
        assert_eq!(trade.status, TradeStatus::Closed);
    }
}
