//! Error types and handling framework.
//!
//! Domain-level errors live here; each subsystem crate defines its own
//! operational error enum (engine, strategy, portfolio, execution) and
//! converts domain errors as needed.
//!
//! # Severity
//!
//! [`ErrorSeverity`] classifies how an error should be handled:
//! fatal errors stop startup, recoverable errors are retried or surfaced
//! as rejections, warnings are logged and counted.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;
use crate::data::{AccountError, DataValidationError, OrderValidationError};
use crate::types::ValidationError;

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Unrecoverable error; the system cannot continue normal operation
    Fatal,
    /// The operation failed but the system continues
    #[default]
    Recoverable,
    /// Non-critical issue worth logging
    Warning,
    /// Informational, an expected or handled condition
    Info,
}

impl ErrorSeverity {
    /// Returns true if this error is recoverable (not fatal).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Fatal)
    }

    /// Returns true if this error is fatal.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }

    /// Returns the severity as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Recoverable => "RECOVERABLE",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level domain error for the Sirocco trading system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SiroccoError {
    /// Primitive validation error.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Domain entity validation error.
    #[error("{0}")]
    Data(#[from] DataValidationError),

    /// Order lifecycle error.
    #[error("{0}")]
    Order(#[from] OrderValidationError),

    /// Account mutation error.
    #[error("{0}")]
    Account(#[from] AccountError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl SiroccoError {
    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Validation(_) | Self::Data(_) | Self::Order(_) => ErrorSeverity::Recoverable,
            Self::Account(_) => ErrorSeverity::Warning,
            Self::Config(_) => ErrorSeverity::Fatal,
        }
    }

    /// Returns true if this error is recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.severity().is_recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_classification() {
        assert!(ErrorSeverity::Fatal.is_fatal());
        assert!(!ErrorSeverity::Fatal.is_recoverable());
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert!(ErrorSeverity::Warning.is_recoverable());
    }

    #[test]
    fn test_config_errors_are_fatal() {
        let err = SiroccoError::Config(ConfigError::MissingField("mode".to_string()));
        assert!(err.severity().is_fatal());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_validation_errors_are_recoverable() {
        let err = SiroccoError::Validation(ValidationError::EmptySymbol);
        assert!(err.is_recoverable());
    }
}
