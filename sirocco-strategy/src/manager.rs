//! Multi-strategy coordinator.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use sirocco_core::data::{Bar, Fill};
use sirocco_core::event::{Event, EventPayload};
use sirocco_core::types::{Symbol, Timestamp};
use sirocco_engine::{EventBus, EventHandler, HandlerResult};

use crate::context::{ContextStats, StrategyContext};
use crate::r#trait::{Strategy, WatchContext};
use crate::StrategyError;

/// Extension key linking a signal event to the market event that
/// triggered it.
pub const TRIGGER_EVENT_ID: &str = "trigger_event_id";

struct Registered {
    strategy: Mutex<Box<dyn Strategy>>,
    context: StrategyContext,
}

/// Aggregate manager statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerStats {
    /// Registered strategy count
    pub total_strategies: usize,
    /// Strategies currently running
    pub running_strategies: usize,
    /// Per-strategy counters by strategy ID
    pub strategies: HashMap<String, ContextStats>,
}

/// The strategy manager: registry, lifecycle, and event fan-out.
///
/// Registered on the bus for `MARKET`, `FILL`, and `TIMER` events.
/// Market events go to every running strategy whose watch set contains
/// the event symbol; fills go only to the strategy they are attributed
/// to; timer events go to every running strategy. Callback errors are
/// counted per strategy and never escalate.
pub struct StrategyManager {
    bus: EventBus,
    max_strategies: usize,
    strategies: DashMap<String, Arc<Registered>>,
    /// Signed holdings per strategy, maintained from observed fills.
    holdings: DashMap<String, HashMap<Symbol, Decimal>>,
    /// Universe snapshot supplied by the composition root.
    universe: RwLock<HashSet<Symbol>>,
}

impl StrategyManager {
    /// Creates a manager publishing signals into `bus`.
    #[must_use]
    pub fn new(bus: EventBus, max_strategies: usize) -> Self {
        Self {
            bus,
            max_strategies,
            strategies: DashMap::new(),
            holdings: DashMap::new(),
            universe: RwLock::new(HashSet::new()),
        }
    }

    /// Replaces the universe snapshot used for watch-set derivation.
    pub fn set_universe(&self, universe: HashSet<Symbol>) {
        *self.universe.write() = universe;
    }

    /// Registers and initializes a strategy.
    ///
    /// # Errors
    ///
    /// Rejects empty or duplicate IDs, registrations beyond the
    /// configured maximum, and strategies whose `initialize` fails (the
    /// strategy is then not registered).
    pub fn register(
        &self,
        mut strategy: Box<dyn Strategy>,
        config: serde_json::Value,
    ) -> Result<(), StrategyError> {
        let id = strategy.strategy_id().to_string();
        if id.is_empty() {
            return Err(StrategyError::InvalidId("empty id".to_string()));
        }
        if self.strategies.contains_key(&id) {
            return Err(StrategyError::InvalidId(format!("duplicate id: {id}")));
        }
        if self.strategies.len() >= self.max_strategies {
            return Err(StrategyError::LimitReached(self.max_strategies));
        }

        strategy.initialize(&config)?;

        let strategy_type = strategy.strategy_type();
        let registered = Arc::new(Registered {
            strategy: Mutex::new(strategy),
            context: StrategyContext::new(config, Timestamp::now()),
        });
        self.strategies.insert(id.clone(), registered);
        info!(strategy = %id, strategy_type = %strategy_type, "strategy registered");
        Ok(())
    }

    /// Stops and removes a strategy.
    ///
    /// # Errors
    ///
    /// Returns `StrategyError::NotFound` for an unknown ID.
    pub fn unregister(&self, strategy_id: &str) -> Result<(), StrategyError> {
        let (_, registered) = self
            .strategies
            .remove(strategy_id)
            .ok_or_else(|| StrategyError::NotFound(strategy_id.to_string()))?;
        if let Err(e) = registered.strategy.lock().stop() {
            warn!(strategy = %strategy_id, error = %e, "stop during unregister failed");
        }
        self.holdings.remove(strategy_id);
        info!(strategy = %strategy_id, "strategy unregistered");
        Ok(())
    }

    /// Starts one strategy.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID or the strategy's own error.
    pub fn start_strategy(&self, strategy_id: &str) -> Result<(), StrategyError> {
        let registered = self
            .strategies
            .get(strategy_id)
            .ok_or_else(|| StrategyError::NotFound(strategy_id.to_string()))?;
        registered.strategy.lock().start()?;
        info!(strategy = %strategy_id, "strategy started");
        Ok(())
    }

    /// Stops one strategy.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID or the strategy's own error.
    pub fn stop_strategy(&self, strategy_id: &str) -> Result<(), StrategyError> {
        let registered = self
            .strategies
            .get(strategy_id)
            .ok_or_else(|| StrategyError::NotFound(strategy_id.to_string()))?;
        registered.strategy.lock().stop()?;
        info!(strategy = %strategy_id, "strategy stopped");
        Ok(())
    }

    /// Starts every registered strategy, logging individual failures.
    pub fn start_all(&self) {
        for entry in self.strategies.iter() {
            if let Err(e) = entry.value().strategy.lock().start() {
                warn!(strategy = %entry.key(), error = %e, "start failed");
            }
        }
    }

    /// Stops every registered strategy, logging individual failures.
    pub fn stop_all(&self) {
        for entry in self.strategies.iter() {
            if let Err(e) = entry.value().strategy.lock().stop() {
                warn!(strategy = %entry.key(), error = %e, "stop failed");
            }
        }
    }

    /// Applies a configuration update to a running strategy.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID or the strategy's own error.
    pub fn update_strategy_config(
        &self,
        strategy_id: &str,
        config: serde_json::Value,
    ) -> Result<(), StrategyError> {
        let registered = self
            .strategies
            .get(strategy_id)
            .ok_or_else(|| StrategyError::NotFound(strategy_id.to_string()))?;
        registered.strategy.lock().update_config(&config)?;
        *registered.context.config.lock() = config;
        registered.context.touch(Timestamp::now());
        info!(strategy = %strategy_id, "strategy config updated");
        Ok(())
    }

    /// Returns the counters snapshot for one strategy.
    #[must_use]
    pub fn strategy_stats(&self, strategy_id: &str) -> Option<ContextStats> {
        self.strategies
            .get(strategy_id)
            .map(|registered| registered.context.stats())
    }

    /// Returns aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> ManagerStats {
        let mut strategies = HashMap::new();
        let mut running = 0;
        for entry in self.strategies.iter() {
            if entry.value().strategy.lock().status().is_running() {
                running += 1;
            }
            strategies.insert(entry.key().clone(), entry.value().context.stats());
        }
        ManagerStats {
            total_strategies: self.strategies.len(),
            running_strategies: running,
            strategies,
        }
    }

    fn watch_context(&self, strategy_id: &str) -> WatchContext {
        let own_holdings = self
            .holdings
            .get(strategy_id)
            .map(|h| {
                h.iter()
                    .filter(|(_, qty)| !qty.is_zero())
                    .map(|(symbol, _)| symbol.clone())
                    .collect()
            })
            .unwrap_or_default();
        let mut all_holdings: HashSet<Symbol> = HashSet::new();
        for entry in self.holdings.iter() {
            for (symbol, qty) in entry.value() {
                if !qty.is_zero() {
                    all_holdings.insert(symbol.clone());
                }
            }
        }
        WatchContext {
            universe: self.universe.read().clone(),
            own_holdings,
            all_holdings,
        }
    }

    fn handle_market(&self, event: &Event, bar: &Bar) {
        let symbol = &bar.symbol;
        for entry in self.strategies.iter() {
            let strategy_id = entry.key();
            let registered = entry.value();
            let mut strategy = registered.strategy.lock();

            if !strategy.status().is_running() {
                continue;
            }
            let ctx = self.watch_context(strategy_id);
            if !strategy.watched_symbols(&ctx).contains(symbol) {
                continue;
            }

            registered.context.received_events.fetch_add(1, Ordering::Relaxed);
            match strategy.on_market_event(event, bar) {
                Ok(signals) => {
                    registered
                        .context
                        .processed_events
                        .fetch_add(1, Ordering::Relaxed);
                    registered.context.touch(bar.timestamp);
                    drop(strategy);
                    for signal in signals {
                        registered
                            .context
                            .generated_signals
                            .fetch_add(1, Ordering::Relaxed);
                        let signal_event = Event::signal(signal).with_extension(
                            TRIGGER_EVENT_ID,
                            serde_json::Value::String(event.event_id.clone()),
                        );
                        if !self.bus.publish(signal_event) {
                            warn!(strategy = %strategy_id, "signal event not accepted by bus");
                        }
                    }
                }
                Err(e) => {
                    registered.context.errors.fetch_add(1, Ordering::Relaxed);
                    error!(
                        strategy = %strategy_id,
                        symbol = %symbol,
                        error = %e,
                        "market callback failed"
                    );
                }
            }
        }
    }

    fn handle_fill(&self, fill: &Fill) {
        let Some(strategy_id) = fill.strategy_id.as_deref() else {
            return;
        };
        let Some(registered) = self.strategies.get(strategy_id) else {
            debug!(strategy = %strategy_id, "fill for unregistered strategy ignored");
            return;
        };

        // Holdings bookkeeping feeds watch-set derivation and is kept
        // current even while the strategy is paused.
        self.holdings
            .entry(strategy_id.to_string())
            .or_default()
            .entry(fill.symbol.clone())
            .and_modify(|qty| *qty += fill.signed_quantity())
            .or_insert_with(|| fill.signed_quantity());

        let mut strategy = registered.strategy.lock();
        if !strategy.status().is_running() {
            return;
        }
        registered.context.received_events.fetch_add(1, Ordering::Relaxed);
        match strategy.on_fill_event(fill) {
            Ok(()) => {
                registered
                    .context
                    .processed_events
                    .fetch_add(1, Ordering::Relaxed);
                registered.context.touch(fill.timestamp);
            }
            Err(e) => {
                registered.context.errors.fetch_add(1, Ordering::Relaxed);
                error!(strategy = %strategy_id, error = %e, "fill callback failed");
            }
        }
    }

    fn handle_timer(&self, event: &Event) {
        let EventPayload::Timer { timer_type, .. } = &event.payload else {
            return;
        };
        for entry in self.strategies.iter() {
            let registered = entry.value();
            let mut strategy = registered.strategy.lock();
            if !strategy.status().is_running() {
                continue;
            }
            registered.context.received_events.fetch_add(1, Ordering::Relaxed);
            match strategy.on_timer_event(*timer_type) {
                Ok(()) => {
                    registered
                        .context
                        .processed_events
                        .fetch_add(1, Ordering::Relaxed);
                    registered.context.touch(event.timestamp);
                }
                Err(e) => {
                    registered.context.errors.fetch_add(1, Ordering::Relaxed);
                    error!(strategy = %entry.key(), error = %e, "timer callback failed");
                }
            }
        }
    }
}

#[async_trait]
impl EventHandler for StrategyManager {
    fn name(&self) -> &str {
        "strategy-manager"
    }

    async fn handle_event(&self, event: &Event) -> HandlerResult {
        match &event.payload {
            EventPayload::Market { bar } => self.handle_market(event, bar),
            EventPayload::Fill { fill } => self.handle_fill(fill),
            EventPayload::Timer { .. } => self.handle_timer(event),
            other => debug!(payload = ?other.event_type(), "ignoring event type"),
        }
        Ok(())
    }

    async fn destroy(&self) -> HandlerResult {
        self.stop_all();
        Ok(())
    }
}
