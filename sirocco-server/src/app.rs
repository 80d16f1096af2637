//! Application composition root.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use sirocco_core::clock::{Clock, ManualClock, SystemClock};
use sirocco_core::config::{ExecutionType, Mode, SiroccoConfig};
use sirocco_core::data::FeeSchedule;
use sirocco_core::event::{EventType, TimerSpec, TimerType};
use sirocco_core::types::Timestamp;
use sirocco_data::{DataProvider, InMemoryProvider};
use sirocco_engine::timer::TimerService;
use sirocco_engine::{BusConfig, EngineStats, EventBus};
use sirocco_execution::{
    BrokerAdapter, ExecutionStats, LiveExecutionHandler, SimulatedExecutionHandler,
    SimulationConfig,
};
use sirocco_portfolio::{PortfolioManager, PortfolioStats};
use sirocco_strategy::{ManagerStats, Strategy, StrategyManager};

use crate::AppError;

/// Default periodic timers wired at startup, in milliseconds.
const RISK_CHECK_INTERVAL_MS: u64 = 30_000;
const HEARTBEAT_INTERVAL_MS: u64 = 30_000;
const CLEANUP_INTERVAL_MS: u64 = 300_000;

enum ExecutionWiring {
    Simulated(SimulatedExecutionHandler),
    Live(Arc<LiveExecutionHandler>),
}

/// Aggregated component status.
#[derive(Debug, Clone, Serialize)]
pub struct AppStatus {
    /// Operating mode
    pub mode: Mode,
    /// Event bus statistics
    pub engine: EngineStats,
    /// Strategy manager statistics
    pub strategies: ManagerStats,
    /// Portfolio statistics
    pub portfolio: PortfolioStats,
    /// Execution statistics
    pub execution: ExecutionStats,
}

/// The assembled trading application.
///
/// Components are wired explicitly from configuration; no registry or
/// reflection. `start` registers every handler on the bus and brings the
/// system up; `stop` takes components down independently, so one failing
/// component never blocks the rest of the shutdown.
pub struct App {
    config: SiroccoConfig,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    /// Present in backtest mode so the replay driver can advance time.
    manual_clock: Option<Arc<ManualClock>>,
    provider: Arc<InMemoryProvider>,
    strategies: Arc<StrategyManager>,
    portfolio: Arc<PortfolioManager>,
    execution: ExecutionWiring,
    timers: TimerService,
}

impl App {
    /// Assembles the application from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid configuration, or when live execution
    /// is selected (a broker adapter must be supplied through
    /// [`App::with_broker`]).
    pub fn new(config: SiroccoConfig) -> Result<Self, AppError> {
        config.validate()?;
        if config.execution.execution_type == ExecutionType::Live {
            return Err(AppError::MissingBrokerAdapter);
        }
        Self::build(config, None)
    }

    /// Assembles a live application with the given broker adapter.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid configuration.
    pub fn with_broker(
        config: SiroccoConfig,
        adapter: Arc<dyn BrokerAdapter>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        Self::build(config, Some(adapter))
    }

    fn build(
        config: SiroccoConfig,
        adapter: Option<Arc<dyn BrokerAdapter>>,
    ) -> Result<Self, AppError> {
        let mut bus_config = BusConfig::with_capacity(config.engine.queue_capacity);
        bus_config.slow_handler_threshold =
            std::time::Duration::from_millis(config.engine.timeout_ms);
        let bus = EventBus::new(bus_config);

        let (clock, manual_clock): (Arc<dyn Clock>, Option<Arc<ManualClock>>) = match config.mode {
            Mode::Backtest => {
                let manual = ManualClock::new(Timestamp::now());
                (manual.clone(), Some(manual))
            }
            Mode::Live => (Arc::new(SystemClock), None),
        };

        let provider = Arc::new(InMemoryProvider::new());
        let strategies = Arc::new(StrategyManager::new(
            bus.clone(),
            config.strategy.max_strategies,
        ));
        let portfolio = Arc::new(PortfolioManager::new(
            bus.clone(),
            provider.clone(),
            clock.clone(),
            config.portfolio.clone(),
            config.risk.clone(),
            &config.account.account_id,
            config.account.initial_capital,
        )?);

        let mut fees = FeeSchedule::default();
        if let Some(rate) = config.execution.commission_rate {
            fees.commission_rate = rate;
        }
        let execution = match (config.execution.execution_type, adapter) {
            (ExecutionType::Simulated, _) => {
                // Backtests default to frictionless deterministic
                // execution; friction is opted into via config.
                let mut sim = match config.mode {
                    Mode::Backtest => SimulationConfig::frictionless(),
                    Mode::Live => SimulationConfig::default(),
                };
                sim.fees = fees;
                if let Some(slippage) = config.execution.slippage {
                    sim.base_slippage = slippage;
                    sim.enable_slippage = !slippage.is_zero();
                }
                if let Some(delay_ms) = config.execution.delay_ms {
                    sim.enable_delayed_execution = delay_ms > 0;
                    sim.min_execution_delay_ms = delay_ms;
                    sim.max_execution_delay_ms = delay_ms;
                }
                ExecutionWiring::Simulated(SimulatedExecutionHandler::new(
                    bus.clone(),
                    sim,
                    clock.clone(),
                ))
            }
            (ExecutionType::Live, Some(adapter)) => ExecutionWiring::Live(Arc::new(
                LiveExecutionHandler::new(bus.clone(), adapter, fees, clock.clone()),
            )),
            (ExecutionType::Live, None) => return Err(AppError::MissingBrokerAdapter),
        };

        let timers = TimerService::new(bus.clone());

        Ok(Self {
            config,
            bus,
            clock,
            manual_clock,
            provider,
            strategies,
            portfolio,
            execution,
            timers,
        })
    }

    /// Returns the event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Returns the data provider.
    #[must_use]
    pub fn provider(&self) -> &Arc<InMemoryProvider> {
        &self.provider
    }

    /// Returns the strategy manager.
    #[must_use]
    pub fn strategies(&self) -> &Arc<StrategyManager> {
        &self.strategies
    }

    /// Returns the portfolio manager.
    #[must_use]
    pub fn portfolio(&self) -> &Arc<PortfolioManager> {
        &self.portfolio
    }

    /// Returns the manual clock in backtest mode.
    #[must_use]
    pub fn manual_clock(&self) -> Option<&Arc<ManualClock>> {
        self.manual_clock.as_ref()
    }

    /// Returns the application configuration.
    #[must_use]
    pub fn config(&self) -> &SiroccoConfig {
        &self.config
    }

    /// Registers a strategy with the manager.
    ///
    /// # Errors
    ///
    /// Propagates registration failures (duplicate id, limit reached,
    /// initialize failure).
    pub fn register_strategy(
        &self,
        strategy: Box<dyn Strategy>,
        config: serde_json::Value,
    ) -> Result<(), AppError> {
        self.strategies.register(strategy, config)?;
        Ok(())
    }

    /// Starts the bus, registers every component, seeds the strategy
    /// universe, starts timers and strategies.
    ///
    /// # Errors
    ///
    /// Returns an error if a handler fails to initialize; the system
    /// does not start.
    pub async fn start(&mut self) -> Result<(), AppError> {
        info!(mode = %self.config.mode, "starting sirocco");
        self.bus.start();

        self.bus
            .register(EventType::Market, self.strategies.clone())
            .await?;
        self.bus
            .register(EventType::Fill, self.strategies.clone())
            .await?;
        self.bus
            .register(EventType::Timer, self.strategies.clone())
            .await?;

        self.bus
            .register(EventType::Signal, self.portfolio.clone())
            .await?;
        self.bus
            .register(EventType::Fill, self.portfolio.clone())
            .await?;
        self.bus
            .register(EventType::Timer, self.portfolio.clone())
            .await?;

        match &self.execution {
            ExecutionWiring::Simulated(handler) => {
                self.bus
                    .register(EventType::Order, Arc::new(handler.clone()))
                    .await?;
                self.bus
                    .register(EventType::Market, Arc::new(handler.clone()))
                    .await?;
            }
            ExecutionWiring::Live(handler) => {
                self.bus
                    .register(EventType::Order, handler.clone())
                    .await?;
            }
        }

        let as_of = self.clock.now().to_date();
        let universe = self.provider.universe(as_of).await;
        if universe.is_empty() {
            warn!("universe is empty; entry strategies will not watch any symbol");
        }
        self.strategies.set_universe(universe);

        self.timers
            .add(TimerSpec::new(TimerType::RiskCheck, RISK_CHECK_INTERVAL_MS));
        self.timers
            .add(TimerSpec::new(TimerType::Heartbeat, HEARTBEAT_INTERVAL_MS));
        self.timers
            .add(TimerSpec::new(TimerType::Cleanup, CLEANUP_INTERVAL_MS));
        self.timers.start();

        self.strategies.start_all();
        info!("sirocco started");
        Ok(())
    }

    /// Stops every component. A failure in one component is logged and
    /// does not prevent the others from stopping.
    pub async fn stop(&mut self) -> EngineStats {
        info!("stopping sirocco");
        self.timers.stop();
        self.strategies.stop_all();

        match &self.execution {
            ExecutionWiring::Simulated(handler) => handler.shutdown(),
            ExecutionWiring::Live(handler) => handler.shutdown().await,
        }

        let stats = self.bus.stop().await;
        if stats.dropped > 0 {
            error!(dropped = stats.dropped, "events were dropped this run");
        }
        info!("sirocco stopped");
        stats
    }

    /// Returns the aggregated component status.
    pub async fn status(&self) -> AppStatus {
        let execution = match &self.execution {
            ExecutionWiring::Simulated(handler) => handler.stats(),
            ExecutionWiring::Live(handler) => handler.stats(),
        };
        AppStatus {
            mode: self.config.mode,
            engine: self.bus.stats(),
            strategies: self.strategies.stats(),
            portfolio: self.portfolio.stats().await,
            execution,
        }
    }
}
