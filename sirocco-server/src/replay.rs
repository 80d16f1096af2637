//! Backtest bar replay.
//!
//! Replays historical bars chronologically through the same event
//! pipeline live trading uses: each bar advances the backtest clock, is
//! published as a `MarketEvent`, and the driver waits for the bus to
//! drain before the next bar so fills land in bar order.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use sirocco_core::data::{Account, Bar};
use sirocco_core::event::Event;
use sirocco_core::types::{Symbol, Timestamp};
use sirocco_data::DataProvider;

use crate::app::App;
use crate::AppError;

/// How long to wait for the bus to drain after each bar.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one replay run.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// First replayed date
    pub start_date: NaiveDate,
    /// Last replayed date
    pub end_date: NaiveDate,
    /// Bars fed through the pipeline
    pub bars_replayed: usize,
    /// Final account state
    pub account: Account,
}

/// Runs a backtest replay over the app's configured window.
///
/// # Errors
///
/// Returns an error when the backtest window is incomplete or bar
/// loading fails. Symbols with no data in the window are skipped with a
/// warning.
pub async fn run(app: &mut App) -> Result<ReplayReport, AppError> {
    let backtest = app.config().backtest.clone();
    let (Some(start_date), Some(end_date)) = (backtest.start_date, backtest.end_date) else {
        return Err(AppError::IncompleteBacktestWindow);
    };

    let symbols: Vec<Symbol> = if backtest.universe.is_empty() {
        app.provider()
            .universe(start_date)
            .await
            .into_iter()
            .collect()
    } else {
        backtest
            .universe
            .iter()
            .filter_map(|s| Symbol::new(s.as_str()).ok())
            .collect()
    };

    let start = Timestamp::from_datetime(
        start_date
            .and_hms_opt(0, 0, 0)
            .expect("midnight exists")
            .and_utc(),
    );
    let end = Timestamp::from_datetime(
        end_date
            .and_hms_opt(23, 59, 59)
            .expect("end of day exists")
            .and_utc(),
    );

    // Merge all series into one chronological stream.
    let mut bars: Vec<Bar> = Vec::new();
    for symbol in &symbols {
        match app
            .provider()
            .read_bars(symbol, start, end, backtest.frequency)
            .await
        {
            Ok(series) => bars.extend(series),
            Err(e) => warn!(symbol = %symbol, error = %e, "no bars for symbol, skipped"),
        }
    }
    bars.sort_by_key(|bar| bar.timestamp);

    info!(
        symbols = symbols.len(),
        bars = bars.len(),
        %start_date,
        %end_date,
        "replay starting"
    );

    let mut replayed = 0usize;
    for bar in bars {
        if let Some(clock) = app.manual_clock() {
            clock.set(bar.timestamp);
        }
        if app.bus().publish(Event::market(bar)) {
            replayed += 1;
        }
        drain(app).await;
    }
    // Let in-flight fills settle before reading the account.
    drain(app).await;

    let account = app.portfolio().account_snapshot();
    info!(
        bars = replayed,
        final_cash = %account.cash,
        realized_pnl = %account.total_realized_pnl,
        "replay complete"
    );

    Ok(ReplayReport {
        start_date,
        end_date,
        bars_replayed: replayed,
        account,
    })
}

/// Waits until the pipeline is quiescent: main queue and every inbox
/// empty, with the dispatched counter stable across several samples (a
/// worker may be mid-handler and about to publish a follow-up event).
async fn drain(app: &App) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    let mut last_dispatched = u64::MAX;
    let mut stable_samples = 0u8;
    loop {
        let stats = app.bus().stats();
        let quiet = stats.queue_size == 0
            && stats.subscribers.iter().all(|s| s.inbox_size == 0);
        if quiet && stats.dispatched == last_dispatched {
            stable_samples += 1;
            if stable_samples >= 3 {
                return;
            }
        } else {
            stable_samples = 0;
        }
        last_dispatched = stats.dispatched;

        if tokio::time::Instant::now() >= deadline {
            warn!(queue_size = stats.queue_size, "drain timed out");
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
