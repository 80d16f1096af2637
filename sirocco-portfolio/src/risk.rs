//! Per-symbol risk state.

use rust_decimal::Decimal;
use serde::Serialize;

use sirocco_core::types::Timestamp;

/// Reason recorded when the periodic sweep blocks a symbol.
pub(crate) const RISK_LIMIT_REASON: &str = "risk-limit-triggered";

/// Risk state tracked per symbol.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RiskStatus {
    /// Cumulative signed cash impact of today's fills
    pub daily_pnl: Decimal,
    /// Largest observed drawdown fraction
    pub max_drawdown: Decimal,
    /// Time of the last fill
    pub last_trade_time: Option<Timestamp>,
    /// True once the symbol is blocked from new signals
    pub is_blocked: bool,
    /// Why the symbol was blocked
    pub block_reason: Option<String>,
}

impl RiskStatus {
    /// Returns true if either the daily-loss or drawdown limit is
    /// breached.
    ///
    /// `max_daily_loss` is the tolerated loss amount (positive);
    /// `max_drawdown` is the tolerated drawdown fraction.
    #[must_use]
    pub fn is_risk_exceeded(&self, max_daily_loss: Decimal, max_drawdown: Decimal) -> bool {
        self.daily_pnl < -max_daily_loss || self.max_drawdown > max_drawdown
    }

    /// Blocks the symbol with a reason.
    pub fn block(&mut self, reason: impl Into<String>) {
        self.is_blocked = true;
        self.block_reason = Some(reason.into());
    }
}
