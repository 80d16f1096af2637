//! # Sirocco Portfolio
//!
//! The portfolio & risk manager: arbitrates signals into orders and
//! maintains the account by consuming fills.
//!
//! Every signal runs an eight-stage gating pipeline (validity, symbol
//! block, position limits, cash, daily risk, sizing, whole-lot order
//! construction, publication). Fills update positions, cash, and
//! per-symbol risk state; a periodic risk sweep blocks symbols that
//! breach their daily-loss or drawdown limits.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod manager;
mod risk;

pub use manager::{PortfolioManager, PortfolioStats};
pub use risk::RiskStatus;

use thiserror::Error;

/// Errors raised by the portfolio manager.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Account construction failed
    #[error("account error: {0}")]
    Account(#[from] sirocco_core::data::AccountError),
}
