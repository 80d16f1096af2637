//! # Sirocco Data
//!
//! Upstream market-data contracts consumed by the trading core.
//!
//! The core never reads storage directly: it talks to a [`DataProvider`]
//! for historical bars, latest quotes, the trading calendar, and the
//! tradable universe, and receives real-time pushes through a
//! [`BarListener`]. [`InMemoryProvider`] backs backtests and tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod archive;
mod calendar;
mod memory;
mod provider;
mod universe;

pub use archive::kline_partition_path;
pub use calendar::TradingCalendar;
pub use memory::InMemoryProvider;
pub use provider::{BarListener, DataProvider};
pub use universe::Universe;

use thiserror::Error;

/// Errors raised by data providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// No data for the requested symbol/frequency
    #[error("no data for {symbol} at {frequency}")]
    NoData {
        /// Requested symbol
        symbol: String,
        /// Requested frequency tag
        frequency: String,
    },

    /// The requested range is empty or inverted
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Underlying storage failure
    #[error("storage error: {0}")]
    Storage(String),
}
