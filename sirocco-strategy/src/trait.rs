//! The strategy contract.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use sirocco_core::data::{Bar, Fill, Signal};
use sirocco_core::event::{Event, TimerType};
use sirocco_core::types::Symbol;

use crate::StrategyError;

/// Strategy role, which determines its default watch set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyType {
    /// Opens new positions: watches the universe minus symbols it holds
    Entry,
    /// Manages exits: watches exactly the symbols it holds
    Exit,
    /// Catastrophic-stop sweep: watches every held symbol system-wide
    UniversalStop,
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => write!(f, "ENTRY"),
            Self::Exit => write!(f, "EXIT"),
            Self::UniversalStop => write!(f, "UNIVERSAL_STOP"),
        }
    }
}

/// Strategy lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyStatus {
    /// Created, `initialize` not yet called
    NotInitialized,
    /// Initialized, not yet started
    Initialized,
    /// Receiving events
    Running,
    /// Temporarily not receiving events
    Paused,
    /// Stopped by the operator or manager
    Stopped,
    /// Failed and out of rotation
    Error,
}

impl StrategyStatus {
    /// Returns true if the strategy should receive events.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for StrategyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "NOT_INITIALIZED"),
            Self::Initialized => write!(f, "INITIALIZED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Holdings and universe snapshot handed to `watched_symbols`.
///
/// The manager builds one per strategy per market event, so the watch
/// set always reflects current holdings.
#[derive(Debug, Clone, Default)]
pub struct WatchContext {
    /// The tradable universe
    pub universe: HashSet<Symbol>,
    /// Symbols this strategy currently holds
    pub own_holdings: HashSet<Symbol>,
    /// Symbols held by any strategy
    pub all_holdings: HashSet<Symbol>,
}

impl WatchContext {
    /// Returns the default watch set for a strategy of the given type:
    /// ENTRY watches the universe minus its own holdings, EXIT watches
    /// its own holdings, UNIVERSAL_STOP watches every held symbol.
    #[must_use]
    pub fn default_watch_set(&self, strategy_type: StrategyType) -> HashSet<Symbol> {
        match strategy_type {
            StrategyType::Entry => self
                .universe
                .difference(&self.own_holdings)
                .cloned()
                .collect(),
            StrategyType::Exit => self.own_holdings.clone(),
            StrategyType::UniversalStop => self.all_holdings.clone(),
        }
    }
}

/// Contract implemented by every trading strategy.
///
/// Strategies are single-threaded: the manager serializes all callbacks
/// on one strategy behind a lock, so implementations keep plain mutable
/// state.
pub trait Strategy: Send {
    /// Unique, non-empty strategy ID.
    fn strategy_id(&self) -> &str;

    /// The strategy's role.
    fn strategy_type(&self) -> StrategyType;

    /// Current lifecycle status.
    fn status(&self) -> StrategyStatus;

    /// The dynamic set of symbols this strategy wants market events for.
    ///
    /// The default derives the set from the strategy type per
    /// [`WatchContext::default_watch_set`].
    fn watched_symbols(&self, ctx: &WatchContext) -> HashSet<Symbol> {
        ctx.default_watch_set(self.strategy_type())
    }

    /// Handles a market event, returning zero or more signals.
    ///
    /// # Errors
    ///
    /// Returns an error if signal computation fails; the manager counts
    /// and logs it without stopping the strategy.
    fn on_market_event(&mut self, event: &Event, bar: &Bar) -> Result<Vec<Signal>, StrategyError>;

    /// Handles a fill attributed to this strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if internal bookkeeping fails.
    fn on_fill_event(&mut self, fill: &Fill) -> Result<(), StrategyError>;

    /// Periodic housekeeping hook.
    ///
    /// # Errors
    ///
    /// Returns an error if the periodic work fails.
    fn on_timer_event(&mut self, timer_type: TimerType) -> Result<(), StrategyError> {
        let _ = timer_type;
        Ok(())
    }

    /// Initializes the strategy with its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is rejected; the manager
    /// then abandons the registration.
    fn initialize(&mut self, config: &serde_json::Value) -> Result<(), StrategyError>;

    /// Starts receiving events.
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy is not in a startable status.
    fn start(&mut self) -> Result<(), StrategyError>;

    /// Stops receiving events.
    ///
    /// # Errors
    ///
    /// Returns an error if stopping fails.
    fn stop(&mut self) -> Result<(), StrategyError>;

    /// Clears internal state back to the post-initialize baseline.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset fails.
    fn reset(&mut self) -> Result<(), StrategyError>;

    /// Applies a configuration update without restarting.
    ///
    /// # Errors
    ///
    /// Returns an error if the new configuration is rejected.
    fn update_config(&mut self, config: &serde_json::Value) -> Result<(), StrategyError>;
}
