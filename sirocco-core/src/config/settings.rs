//! Configuration structures for every subsystem.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::ConfigError;
use crate::data::Frequency;

/// Operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Simulated execution against historical bars
    #[default]
    Backtest,
    /// Live execution through a broker adapter
    Live,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backtest => write!(f, "backtest"),
            Self::Live => write!(f, "live"),
        }
    }
}

/// Top-level system configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiroccoConfig {
    /// Operating mode
    #[serde(default)]
    pub mode: Mode,
    /// Event engine settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// Account settings
    #[serde(default)]
    pub account: AccountConfig,
    /// Portfolio settings
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    /// Risk settings
    #[serde(default)]
    pub risk: RiskConfig,
    /// Execution settings
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Strategy framework settings
    #[serde(default)]
    pub strategy: StrategySettings,
    /// Backtest window settings
    #[serde(default)]
    pub backtest: BacktestConfig,
    /// Data settings
    #[serde(default)]
    pub data: DataConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Unrecognized keys, kept for diagnostics
    #[serde(flatten, skip_serializing)]
    pub unknown: HashMap<String, serde_json::Value>,
}

impl SiroccoConfig {
    /// Validates every recognized field and warns about unknown keys.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for key in self.unknown.keys() {
            warn!(key = %key, "ignoring unknown config key");
        }
        self.engine.validate()?;
        self.account.validate()?;
        self.portfolio.validate()?;
        self.risk.validate()?;
        self.execution.validate()?;
        self.strategy.validate()?;
        Ok(())
    }

    /// Applies `SIROCCO_*` environment variable overrides.
    ///
    /// For example `SIROCCO_ENGINE_QUEUE_CAPACITY=5000` overrides
    /// `engine.queue_capacity`.
    pub fn apply_env_overrides(&mut self) {
        apply_usize("SIROCCO_ENGINE_QUEUE_CAPACITY", &mut self.engine.queue_capacity);
        apply_usize("SIROCCO_ENGINE_WORKER_THREADS", &mut self.engine.worker_threads);
        apply_u64("SIROCCO_ENGINE_TIMEOUT_MS", &mut self.engine.timeout_ms);
        apply_string("SIROCCO_ACCOUNT_ID", &mut self.account.account_id);
        apply_decimal(
            "SIROCCO_ACCOUNT_INITIAL_CAPITAL",
            &mut self.account.initial_capital,
        );
        apply_string("SIROCCO_DATA_ROOT_PATH", &mut self.data.root_path);
        apply_string("SIROCCO_LOGGING_LEVEL", &mut self.logging.level);
    }
}

fn apply_string(key: &str, target: &mut String) {
    if let Ok(value) = std::env::var(key) {
        *target = value;
    }
}

fn apply_usize(key: &str, target: &mut usize) {
    if let Ok(value) = std::env::var(key) {
        if let Ok(parsed) = value.parse() {
            *target = parsed;
        }
    }
}

fn apply_u64(key: &str, target: &mut u64) {
    if let Ok(value) = std::env::var(key) {
        if let Ok(parsed) = value.parse() {
            *target = parsed;
        }
    }
}

fn apply_decimal(key: &str, target: &mut Decimal) {
    if let Ok(value) = std::env::var(key) {
        if let Ok(parsed) = value.parse() {
            *target = parsed;
        }
    }
}

/// Event engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Main queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Worker thread hint for the runtime
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Slow-handler warning threshold in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_queue_capacity() -> usize {
    10_000
}

fn default_worker_threads() -> usize {
    4
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            worker_threads: default_worker_threads(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidField {
                field: "engine.queue_capacity".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.worker_threads == 0 {
            return Err(ConfigError::InvalidField {
                field: "engine.worker_threads".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the per-subscriber inbox capacity (main capacity / 10).
    #[must_use]
    pub fn inbox_capacity(&self) -> usize {
        (self.queue_capacity / 10).max(1)
    }
}

/// Account settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account identifier
    #[serde(default = "default_account_id")]
    pub account_id: String,
    /// Initial capital in quote currency
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,
}

fn default_account_id() -> String {
    "sirocco-default".to_string()
}

fn default_initial_capital() -> Decimal {
    Decimal::from(1_000_000)
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            account_id: default_account_id(),
            initial_capital: default_initial_capital(),
        }
    }
}

impl AccountConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.account_id.is_empty() {
            return Err(ConfigError::MissingField("account.account_id".to_string()));
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::InvalidField {
                field: "account.initial_capital".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Portfolio sizing and gating settings. Percentages are fractions in
/// `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// Max single-symbol position value as a fraction of total assets
    #[serde(default = "default_max_position_percent")]
    pub max_position_percent: Decimal,
    /// Max total position value as a fraction of total assets
    #[serde(default = "default_max_total_position_percent")]
    pub max_total_position_percent: Decimal,
    /// Minimum order amount in quote currency
    #[serde(default = "default_min_order_amount")]
    pub min_order_amount: Decimal,
    /// Sizing method; only "fixed_amount" is implemented
    #[serde(default = "default_position_size_method")]
    pub position_size_method: String,
    /// Default position size in quote currency
    #[serde(default = "default_position_size")]
    pub default_position_size: Decimal,
}

fn default_max_position_percent() -> Decimal {
    Decimal::new(1, 1) // 0.1
}

fn default_max_total_position_percent() -> Decimal {
    Decimal::new(95, 2) // 0.95
}

fn default_min_order_amount() -> Decimal {
    Decimal::from(1000)
}

fn default_position_size_method() -> String {
    "fixed_amount".to_string()
}

fn default_position_size() -> Decimal {
    Decimal::from(10_000)
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            max_position_percent: default_max_position_percent(),
            max_total_position_percent: default_max_total_position_percent(),
            min_order_amount: default_min_order_amount(),
            position_size_method: default_position_size_method(),
            default_position_size: default_position_size(),
        }
    }
}

impl PortfolioConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let unit = Decimal::ONE;
        for (field, value) in [
            ("portfolio.max_position_percent", self.max_position_percent),
            (
                "portfolio.max_total_position_percent",
                self.max_total_position_percent,
            ),
        ] {
            if value <= Decimal::ZERO || value > unit {
                return Err(ConfigError::InvalidField {
                    field: field.to_string(),
                    reason: "must be in (0, 1]".to_string(),
                });
            }
        }
        if self.position_size_method != "fixed_amount" {
            return Err(ConfigError::InvalidField {
                field: "portfolio.position_size_method".to_string(),
                reason: format!("unsupported method: {}", self.position_size_method),
            });
        }
        if self.default_position_size <= Decimal::ZERO {
            return Err(ConfigError::InvalidField {
                field: "portfolio.default_position_size".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Risk settings. Percentages are fractions in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Max tolerated daily loss as a fraction of total assets
    #[serde(default = "default_max_daily_loss_percent")]
    pub max_daily_loss_percent: Decimal,
    /// Max tolerated drawdown fraction
    #[serde(default = "default_max_drawdown_percent")]
    pub max_drawdown_percent: Decimal,
    /// Max pairwise correlation (reserved for future gating)
    #[serde(default = "default_max_correlation")]
    pub max_correlation: Decimal,
}

fn default_max_daily_loss_percent() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

fn default_max_drawdown_percent() -> Decimal {
    Decimal::new(2, 1) // 0.2
}

fn default_max_correlation() -> Decimal {
    Decimal::new(8, 1) // 0.8
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_loss_percent: default_max_daily_loss_percent(),
            max_drawdown_percent: default_max_drawdown_percent(),
            max_correlation: default_max_correlation(),
        }
    }
}

impl RiskConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("risk.max_daily_loss_percent", self.max_daily_loss_percent),
            ("risk.max_drawdown_percent", self.max_drawdown_percent),
        ] {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::InvalidField {
                    field: field.to_string(),
                    reason: "must be in (0, 1]".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Execution handler selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionType {
    /// Simulated market microstructure
    #[default]
    Simulated,
    /// Live broker adapter
    Live,
}

/// Execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Which handler to wire
    #[serde(default, rename = "type")]
    pub execution_type: ExecutionType,
    /// Base slippage fraction
    #[serde(default)]
    pub slippage: Option<Decimal>,
    /// Commission rate override
    #[serde(default)]
    pub commission_rate: Option<Decimal>,
    /// Fixed execution delay in milliseconds
    #[serde(default)]
    pub delay_ms: Option<u64>,
    /// Max submit retries for live execution
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,
    /// Live broker connection settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker: Option<BrokerConfig>,
}

fn default_max_retry_count() -> u32 {
    3
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            execution_type: ExecutionType::default(),
            slippage: None,
            commission_rate: None,
            delay_ms: None,
            max_retry_count: default_max_retry_count(),
            broker: None,
        }
    }
}

impl ExecutionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(slippage) = self.slippage {
            if slippage < Decimal::ZERO {
                return Err(ConfigError::InvalidField {
                    field: "execution.slippage".to_string(),
                    reason: "must be non-negative".to_string(),
                });
            }
        }
        if self.execution_type == ExecutionType::Live && self.broker.is_none() {
            return Err(ConfigError::MissingField("execution.broker".to_string()));
        }
        Ok(())
    }
}

/// Live broker connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker endpoint URL
    pub url: String,
    /// Broker-side account identifier
    pub account: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_broker_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_broker_timeout_ms() -> u64 {
    10_000
}

/// Strategy framework settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySettings {
    /// Maximum number of registered strategies
    #[serde(default = "default_max_strategies")]
    pub max_strategies: usize,
    /// Default signal validity window in seconds
    #[serde(default = "default_signal_timeout_seconds")]
    pub signal_timeout_seconds: i64,
}

fn default_max_strategies() -> usize {
    32
}

fn default_signal_timeout_seconds() -> i64 {
    300
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            max_strategies: default_max_strategies(),
            signal_timeout_seconds: default_signal_timeout_seconds(),
        }
    }
}

impl StrategySettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_strategies == 0 {
            return Err(ConfigError::InvalidField {
                field: "strategy.max_strategies".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Backtest window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Start date (inclusive), `YYYY-MM-DD`
    #[serde(default)]
    pub start_date: Option<chrono::NaiveDate>,
    /// End date (inclusive), `YYYY-MM-DD`
    #[serde(default)]
    pub end_date: Option<chrono::NaiveDate>,
    /// Symbols to replay; empty means the provider universe
    #[serde(default)]
    pub universe: Vec<String>,
    /// Bar frequency to replay
    #[serde(default = "default_backtest_frequency")]
    pub frequency: Frequency,
}

fn default_backtest_frequency() -> Frequency {
    Frequency::Daily
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            universe: Vec::new(),
            frequency: default_backtest_frequency(),
        }
    }
}

/// Data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root path of the columnar bar archive
    #[serde(default = "default_data_root")]
    pub root_path: String,
    /// Days of history to preload before the backtest start
    #[serde(default = "default_preload_days")]
    pub preload_days: u32,
    /// Storage-engine connection strings by name
    #[serde(default)]
    pub connections: HashMap<String, String>,
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_preload_days() -> u32 {
    60
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root_path: default_data_root(),
            preload_days: default_preload_days(),
            connections: HashMap::new(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (e.g. "info", "debug")
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON instead of human-readable lines
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_is_valid() {
        let config = SiroccoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.queue_capacity, 10_000);
        assert_eq!(config.engine.inbox_capacity(), 1_000);
        assert_eq!(config.mode, Mode::Backtest);
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let config = SiroccoConfig {
            engine: EngineConfig {
                queue_capacity: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_position_percent_out_of_range_rejected() {
        let config = SiroccoConfig {
            portfolio: PortfolioConfig {
                max_position_percent: dec!(1.5),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_sizing_method_rejected() {
        let config = SiroccoConfig {
            portfolio: PortfolioConfig {
                position_size_method: "kelly".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_live_mode_requires_broker() {
        let config = SiroccoConfig {
            execution: ExecutionConfig {
                execution_type: ExecutionType::Live,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_inbox_capacity_floor() {
        let engine = EngineConfig {
            queue_capacity: 5,
            ..Default::default()
        };
        assert_eq!(engine.inbox_capacity(), 1);
    }
}
