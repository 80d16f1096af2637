//! Data provider contract.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;

use sirocco_core::data::{Bar, Frequency};
use sirocco_core::types::{Symbol, Timestamp};

use crate::DataError;

/// Receiver of real-time bar pushes.
///
/// The subscriber side (usually the composition root) turns each pushed
/// bar into a `MarketEvent` on the bus.
pub trait BarListener: Send + Sync {
    /// Called for every new bar of a subscribed symbol.
    fn on_bar(&self, bar: Bar);
}

/// Upstream market-data provider.
///
/// Implemented outside the core; the engine consumes it read-only for
/// history, quotes, the trading calendar, and the universe.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Reads historical bars for `[start, end]`, ascending by timestamp.
    async fn read_bars(
        &self,
        symbol: &Symbol,
        start: Timestamp,
        end: Timestamp,
        frequency: Frequency,
    ) -> Result<Vec<Bar>, DataError>;

    /// Returns the most recent bar at or before now, if any.
    async fn latest_bar(&self, symbol: &Symbol, frequency: Frequency) -> Option<Bar>;

    /// Returns true if `date` is a trading day.
    async fn is_trading_day(&self, date: NaiveDate) -> bool;

    /// Returns the trading days in `[start, end]`, ascending.
    async fn trading_calendar(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate>;

    /// Returns the tradable universe as of `as_of`.
    async fn universe(&self, as_of: NaiveDate) -> HashSet<Symbol>;

    /// Subscribes a listener to real-time bars of one symbol.
    async fn subscribe(&self, symbol: &Symbol, listener: Arc<dyn BarListener>);
}
