//! Timer categories and schedules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timer category carried on timer events.
///
/// Each category maps to a fixed dispatch priority so, for example, risk
/// sweeps overtake cleanup ticks under load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerType {
    /// Refresh market data caches
    MarketDataUpdate,
    /// Periodic risk sweep
    RiskCheck,
    /// Heartbeat / liveness tick
    Heartbeat,
    /// Housekeeping and cleanup
    Cleanup,
    /// Strategy-facing periodic hook
    StrategyTimer,
    /// Portfolio rebalance trigger
    PortfolioRebalance,
}

impl TimerType {
    /// Returns the dispatch priority for this timer category.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        match self {
            Self::MarketDataUpdate => 3,
            Self::RiskCheck => 4,
            Self::StrategyTimer => 5,
            Self::PortfolioRebalance => 6,
            Self::Heartbeat => 8,
            Self::Cleanup => 9,
        }
    }
}

impl fmt::Display for TimerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarketDataUpdate => write!(f, "MARKET_DATA_UPDATE"),
            Self::RiskCheck => write!(f, "RISK_CHECK"),
            Self::Heartbeat => write!(f, "HEARTBEAT"),
            Self::Cleanup => write!(f, "CLEANUP"),
            Self::StrategyTimer => write!(f, "STRATEGY_TIMER"),
            Self::PortfolioRebalance => write!(f, "PORTFOLIO_REBALANCE"),
        }
    }
}

/// Schedule for one recurring timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSpec {
    /// Timer category
    pub timer_type: TimerType,
    /// Recurrence interval in milliseconds
    pub interval_ms: u64,
    /// Optional payload republished on every tick
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl TimerSpec {
    /// Creates a schedule without a payload.
    #[must_use]
    pub fn new(timer_type: TimerType, interval_ms: u64) -> Self {
        Self {
            timer_type,
            interval_ms,
            payload: None,
        }
    }

    /// Returns the interval as a `Duration`.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_priorities() {
        assert_eq!(TimerType::MarketDataUpdate.priority(), 3);
        assert_eq!(TimerType::RiskCheck.priority(), 4);
        assert_eq!(TimerType::StrategyTimer.priority(), 5);
        assert_eq!(TimerType::PortfolioRebalance.priority(), 6);
        assert_eq!(TimerType::Heartbeat.priority(), 8);
        assert_eq!(TimerType::Cleanup.priority(), 9);
    }

    #[test]
    fn test_timer_spec_interval() {
        let spec = TimerSpec::new(TimerType::Heartbeat, 30_000);
        assert_eq!(spec.interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_timer_type_serde() {
        let json = serde_json::to_string(&TimerType::RiskCheck).unwrap();
        assert_eq!(json, "\"RISK_CHECK\"");
    }
}
