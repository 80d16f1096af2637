//! Symbol type for representing instrument identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Symbol type - used for representing instrument identifiers.
///
/// Wraps a `String` value with validation to ensure proper format.
/// Equity symbols carry an exchange suffix, e.g. "000001.SZ" or "600000.SH".
///
/// # Examples
///
/// ```
/// use sirocco_core::types::Symbol;
///
/// let symbol = Symbol::new("000001.SZ").unwrap();
/// assert_eq!(symbol.as_str(), "000001.SZ");
/// assert_eq!(symbol.exchange(), Some("SZ"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new `Symbol` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptySymbol` if the string is empty.
    /// Returns `ValidationError::InvalidSymbol` if the format is invalid.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        if !s
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidSymbol(s));
        }
        Ok(Self(s))
    }

    /// Creates a new `Symbol` without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure the value is a valid symbol format.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the instrument code without the exchange suffix
    /// (e.g. "000001" from "000001.SZ").
    #[must_use]
    pub fn code(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Returns the exchange suffix (e.g. "SZ" from "000001.SZ").
    ///
    /// Returns `None` if the symbol carries no exchange suffix.
    #[must_use]
    pub fn exchange(&self) -> Option<&str> {
        let mut parts = self.0.split('.');
        parts.next()?;
        parts.next()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_new_valid() {
        let symbol = Symbol::new("000001.SZ").unwrap();
        assert_eq!(symbol.as_str(), "000001.SZ");
    }

    #[test]
    fn test_symbol_new_empty() {
        assert!(matches!(Symbol::new(""), Err(ValidationError::EmptySymbol)));
    }

    #[test]
    fn test_symbol_new_invalid_chars() {
        let result = Symbol::new("000001 SZ");
        assert!(matches!(result, Err(ValidationError::InvalidSymbol(_))));
    }

    #[test]
    fn test_symbol_code_and_exchange() {
        let symbol = Symbol::new("600000.SH").unwrap();
        assert_eq!(symbol.code(), "600000");
        assert_eq!(symbol.exchange(), Some("SH"));

        let bare = Symbol::new("IF2406").unwrap();
        assert_eq!(bare.code(), "IF2406");
        assert_eq!(bare.exchange(), None);
    }

    #[test]
    fn test_symbol_display() {
        let symbol = Symbol::new("000001.SZ").unwrap();
        assert_eq!(format!("{symbol}"), "000001.SZ");
    }
}
