//! # Sirocco Server
//!
//! Composition root and lifecycle for the Sirocco trading engine.
//!
//! [`App`] wires the event bus, data provider, strategy manager,
//! portfolio manager, and execution handler from a [`sirocco_core::config::SiroccoConfig`],
//! and exposes start/stop/status. The [`replay`] module drives backtests
//! by feeding historical bars through the same event pipeline live
//! trading uses.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod app;
mod logging;

/// Backtest bar replay driver
pub mod replay;

pub use app::{App, AppStatus};
pub use logging::init_logging;

use thiserror::Error;

/// Errors raised while assembling or running the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading or validation failed
    #[error("config error: {0}")]
    Config(#[from] sirocco_core::config::ConfigError),

    /// Account setup failed
    #[error("portfolio error: {0}")]
    Portfolio(#[from] sirocco_portfolio::PortfolioError),

    /// Handler registration failed
    #[error("engine error: {0}")]
    Engine(#[from] sirocco_engine::EngineError),

    /// Strategy registration failed
    #[error("strategy error: {0}")]
    Strategy(#[from] sirocco_strategy::StrategyError),

    /// Live mode selected without a broker adapter wired in
    #[error("live execution requires a broker adapter")]
    MissingBrokerAdapter,

    /// Backtest window is incomplete
    #[error("backtest requires start_date and end_date")]
    IncompleteBacktestWindow,

    /// Data provider failure
    #[error("data error: {0}")]
    Data(#[from] sirocco_data::DataError),
}
