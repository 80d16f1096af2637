//! Trading calendar service.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Read-only trading calendar.
///
/// Built either from an explicit set of trading days (loaded from the
/// relational `trading_calendar` table upstream) or as a weekday
/// approximation when no table is available.
#[derive(Debug, Clone, Default)]
pub struct TradingCalendar {
    /// Explicit trading days; empty means "weekdays are trading days".
    days: BTreeSet<NaiveDate>,
}

impl TradingCalendar {
    /// Creates a calendar from explicit trading days.
    #[must_use]
    pub fn from_days(days: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            days: days.into_iter().collect(),
        }
    }

    /// Creates a weekday-approximation calendar.
    #[must_use]
    pub fn weekdays() -> Self {
        Self::default()
    }

    /// Returns true if `date` is a trading day.
    #[must_use]
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        if self.days.is_empty() {
            !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
        } else {
            self.days.contains(&date)
        }
    }

    /// Returns the trading days in `[start, end]`, ascending.
    #[must_use]
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        if self.days.is_empty() {
            let mut days = Vec::new();
            let mut date = start;
            while date <= end {
                if self.is_trading_day(date) {
                    days.push(date);
                }
                date = match date.succ_opt() {
                    Some(next) => next,
                    None => break,
                };
            }
            days
        } else {
            self.days.range(start..=end).copied().collect()
        }
    }
}
