//! In-memory data provider for backtests and tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use sirocco_core::data::{Bar, Frequency};
use sirocco_core::types::{Symbol, Timestamp};

use crate::calendar::TradingCalendar;
use crate::provider::{BarListener, DataProvider};
use crate::universe::Universe;
use crate::DataError;

/// In-memory provider: sorted per-(symbol, frequency) bar store plus a
/// calendar and universe.
///
/// `push_bar` appends a bar and fans it out to subscribed listeners, so
/// a backtest driver can use the same real-time path as live feeds.
pub struct InMemoryProvider {
    bars: DashMap<(Symbol, Frequency), Vec<Bar>>,
    calendar: RwLock<TradingCalendar>,
    universe: RwLock<Universe>,
    listeners: DashMap<Symbol, Vec<Arc<dyn BarListener>>>,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvider {
    /// Creates an empty provider with a weekday calendar.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bars: DashMap::new(),
            calendar: RwLock::new(TradingCalendar::weekdays()),
            universe: RwLock::new(Universe::default()),
            listeners: DashMap::new(),
        }
    }

    /// Replaces the trading calendar.
    pub fn set_calendar(&self, calendar: TradingCalendar) {
        *self.calendar.write() = calendar;
    }

    /// Replaces the universe catalog.
    pub fn set_universe(&self, universe: Universe) {
        *self.universe.write() = universe;
    }

    /// Loads historical bars, keeping each series sorted by timestamp.
    pub fn load_bars(&self, bars: impl IntoIterator<Item = Bar>) {
        for bar in bars {
            let key = (bar.symbol.clone(), bar.frequency);
            let mut series = self.bars.entry(key).or_default();
            series.push(bar);
            series.sort_by_key(|b| b.timestamp);
        }
    }

    /// Appends one bar and pushes it to the symbol's listeners.
    pub fn push_bar(&self, bar: Bar) {
        let listeners = self
            .listeners
            .get(&bar.symbol)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        {
            let key = (bar.symbol.clone(), bar.frequency);
            let mut series = self.bars.entry(key).or_default();
            series.push(bar.clone());
            series.sort_by_key(|b| b.timestamp);
        }

        debug!(symbol = %bar.symbol, listeners = listeners.len(), "bar pushed");
        for listener in listeners {
            listener.on_bar(bar.clone());
        }
    }

    /// Returns the number of stored bars for one series.
    #[must_use]
    pub fn series_len(&self, symbol: &Symbol, frequency: Frequency) -> usize {
        self.bars
            .get(&(symbol.clone(), frequency))
            .map_or(0, |series| series.len())
    }
}

#[async_trait]
impl DataProvider for InMemoryProvider {
    async fn read_bars(
        &self,
        symbol: &Symbol,
        start: Timestamp,
        end: Timestamp,
        frequency: Frequency,
    ) -> Result<Vec<Bar>, DataError> {
        if end < start {
            return Err(DataError::InvalidRange(format!(
                "end {end} before start {start}"
            )));
        }
        let series = self
            .bars
            .get(&(symbol.clone(), frequency))
            .ok_or_else(|| DataError::NoData {
                symbol: symbol.as_str().to_string(),
                frequency: frequency.as_str().to_string(),
            })?;
        Ok(series
            .iter()
            .filter(|b| b.timestamp >= start && b.timestamp <= end)
            .cloned()
            .collect())
    }

    async fn latest_bar(&self, symbol: &Symbol, frequency: Frequency) -> Option<Bar> {
        self.bars
            .get(&(symbol.clone(), frequency))
            .and_then(|series| series.last().cloned())
    }

    async fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.calendar.read().is_trading_day(date)
    }

    async fn trading_calendar(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        self.calendar.read().range(start, end)
    }

    async fn universe(&self, as_of: NaiveDate) -> HashSet<Symbol> {
        self.universe.read().as_of(as_of)
    }

    async fn subscribe(&self, symbol: &Symbol, listener: Arc<dyn BarListener>) {
        self.listeners
            .entry(symbol.clone())
            .or_default()
            .push(listener);
    }
}
