//! Trading account state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::types::{Price, Symbol, Timestamp};

use super::position::PositionUpdate;
use super::{Fill, Order, Position, Trade, TradeStatus};

/// Account error raised by cash and position mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    /// Freeze request exceeds available cash
    #[error("insufficient available cash: requested {requested}, available {available}")]
    InsufficientCash {
        /// Requested amount
        requested: Decimal,
        /// Available cash
        available: Decimal,
    },

    /// Unfreeze request exceeds frozen cash
    #[error("unfreeze {requested} exceeds frozen cash {frozen}")]
    ExcessiveUnfreeze {
        /// Requested amount
        requested: Decimal,
        /// Currently frozen cash
        frozen: Decimal,
    },

    /// Initial capital must be positive
    #[error("initial capital must be positive: {0}")]
    NonPositiveCapital(Decimal),
}

/// Account - cash, frozen cash, positions, and execution history.
///
/// All mutation goes through `&mut self`, so callers serialize access by
/// holding the account lock; readers take snapshots.
///
/// Invariants: `cash ≥ frozen_cash ≥ 0` and
/// `available_cash() = cash − frozen_cash ≥ 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub account_id: String,
    /// Initial capital
    pub initial_capital: Decimal,
    /// Current cash balance
    pub cash: Decimal,
    /// Cash frozen against working orders
    pub frozen_cash: Decimal,
    /// Open positions by symbol
    pub positions: HashMap<Symbol, Position>,
    /// Orders known to the account, by order ID string
    pub orders: HashMap<String, Order>,
    /// Fill history
    pub fills: Vec<Fill>,
    /// Round-trip trade history (informational)
    pub trades: Vec<Trade>,
    /// Cumulative commission paid
    pub total_commission: Decimal,
    /// Cumulative realized P&L from closed quantity
    pub total_realized_pnl: Decimal,
    /// Creation timestamp
    pub created_time: Timestamp,
    /// Last update timestamp
    pub update_time: Timestamp,
}

impl Account {
    /// Creates a new account with the given initial capital.
    ///
    /// # Errors
    ///
    /// Returns an error if `initial_capital` is not positive.
    pub fn new(
        account_id: impl Into<String>,
        initial_capital: Decimal,
        timestamp: Timestamp,
    ) -> Result<Self, AccountError> {
        if initial_capital <= Decimal::ZERO {
            return Err(AccountError::NonPositiveCapital(initial_capital));
        }
        Ok(Self {
            account_id: account_id.into(),
            initial_capital,
            cash: initial_capital,
            frozen_cash: Decimal::ZERO,
            positions: HashMap::new(),
            orders: HashMap::new(),
            fills: Vec::new(),
            trades: Vec::new(),
            total_commission: Decimal::ZERO,
            total_realized_pnl: Decimal::ZERO,
            created_time: timestamp,
            update_time: timestamp,
        })
    }

    /// Returns cash not frozen against working orders.
    #[must_use]
    pub fn available_cash(&self) -> Decimal {
        self.cash - self.frozen_cash
    }

    /// Returns true if all cash invariants hold.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.cash >= Decimal::ZERO
            && self.frozen_cash >= Decimal::ZERO
            && self.available_cash() >= Decimal::ZERO
    }

    /// Freezes cash against a working order.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount exceeds available cash.
    pub fn freeze_cash(&mut self, amount: Decimal, now: Timestamp) -> Result<(), AccountError> {
        if amount > self.available_cash() {
            return Err(AccountError::InsufficientCash {
                requested: amount,
                available: self.available_cash(),
            });
        }
        self.frozen_cash += amount;
        self.update_time = now;
        Ok(())
    }

    /// Releases previously frozen cash.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount exceeds frozen cash.
    pub fn unfreeze_cash(&mut self, amount: Decimal, now: Timestamp) -> Result<(), AccountError> {
        if amount > self.frozen_cash {
            return Err(AccountError::ExcessiveUnfreeze {
                requested: amount,
                frozen: self.frozen_cash,
            });
        }
        self.frozen_cash -= amount;
        self.update_time = now;
        Ok(())
    }

    /// Records an order against the account.
    pub fn track_order(&mut self, order: Order) {
        self.orders.insert(order.order_id.as_str().to_string(), order);
    }

    /// Applies a fill: updates the position via the position update rule,
    /// moves cash by the fill's signed net amount, accumulates fees and
    /// realized P&L, and appends to the fill and trade histories.
    ///
    /// This is the only path that mutates positions and cash together.
    pub fn apply_fill(&mut self, fill: &Fill) {
        let delta = fill.signed_quantity();

        // Realized P&L accrues on the quantity that closes against an
        // existing opposite exposure, measured against average cost.
        let mut is_closing = false;
        if let Some(position) = self.positions.get(&fill.symbol) {
            let closing = if position.quantity.is_sign_positive() != delta.is_sign_positive() {
                delta.abs().min(position.quantity.abs())
            } else {
                Decimal::ZERO
            };
            if closing > Decimal::ZERO {
                is_closing = true;
                let direction = if position.quantity > Decimal::ZERO {
                    Decimal::ONE
                } else {
                    -Decimal::ONE
                };
                let pnl =
                    (fill.price.as_decimal() - position.avg_price.as_decimal()) * closing * direction;
                self.total_realized_pnl += pnl;
            }
        }

        // Round-trip aggregation: opening fills start a trade, closing
        // fills land on the earliest open trade. Informational only; the
        // account's own cash/position figures stay authoritative.
        if is_closing {
            if let Some(trade) = self
                .trades
                .iter_mut()
                .find(|t| t.open_fill.symbol == fill.symbol && t.status != TradeStatus::Closed)
            {
                trade.record_close(fill.clone());
            }
        } else {
            self.trades.push(Trade::open(fill.clone()));
        }

        match self.positions.get_mut(&fill.symbol) {
            Some(position) => {
                if position.apply_delta(delta, fill.price, fill.timestamp) == PositionUpdate::Closed
                {
                    self.positions.remove(&fill.symbol);
                }
            }
            None => {
                self.positions.insert(
                    fill.symbol.clone(),
                    Position::open(
                        fill.symbol.clone(),
                        delta,
                        fill.price,
                        fill.strategy_id.clone(),
                        fill.timestamp,
                    ),
                );
            }
        }

        self.cash += fill.net_amount;
        self.total_commission += fill.commission;
        self.update_time = fill.timestamp;
        self.fills.push(fill.clone());
    }

    /// Returns the position for a symbol, if any.
    #[must_use]
    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Returns total account value at the given prices:
    /// `cash + Σ |qty| · price`, falling back to average cost for symbols
    /// without a quote.
    #[must_use]
    pub fn total_value(&self, prices: &HashMap<Symbol, Price>) -> Decimal {
        let position_value: Decimal = self
            .positions
            .values()
            .map(|p| {
                let price = prices.get(&p.symbol).copied().unwrap_or(p.avg_price);
                p.market_value(price)
            })
            .sum();
        self.cash + position_value
    }

    /// Returns the fraction of total value held in positions.
    #[must_use]
    pub fn position_ratio(&self, prices: &HashMap<Symbol, Price>) -> Decimal {
        let total = self.total_value(prices);
        if total <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (total - self.cash) / total
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account[{} cash={} frozen={} positions={}]",
            self.account_id,
            self.cash,
            self.frozen_cash,
            self.positions.len()
        )
    }
}
