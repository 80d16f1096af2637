//! Typed configuration for the Sirocco trading system.
//!
//! Unknown keys are logged and ignored to permit forward compatibility;
//! recognized keys are validated field by field at load time.

mod loader;
mod settings;

pub use loader::{ConfigFormat, load_config, load_config_str};
pub use settings::{
    AccountConfig, BacktestConfig, BrokerConfig, DataConfig, EngineConfig, ExecutionConfig,
    ExecutionType, LoggingConfig, Mode, PortfolioConfig, RiskConfig, SiroccoConfig,
    StrategySettings,
};

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read config file {path}: {reason}")]
    Io {
        /// File path
        path: String,
        /// OS error text
        reason: String,
    },

    /// Unsupported file extension
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// File could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A required field is missing
    #[error("missing required config field: {0}")]
    MissingField(String),

    /// A field value is out of range
    #[error("invalid config field {field}: {reason}")]
    InvalidField {
        /// Dotted field path
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}
