//! Order identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use super::ValidationError;

static ORDER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Order ID - uniquely identifies an order within the system.
///
/// Wraps a `String`. Generated ids are sequential (`ORD-{:016X}`) so
/// backtests produce stable, comparable identifiers.
///
/// # Examples
///
/// ```
/// use sirocco_core::types::OrderId;
///
/// let id = OrderId::generate();
/// assert!(id.as_str().starts_with("ORD-"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Creates a new `OrderId` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyOrderId` if the string is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyOrderId);
        }
        Ok(Self(s))
    }

    /// Generates the next sequential order ID.
    #[must_use]
    pub fn generate() -> Self {
        let seq = ORDER_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("ORD-{seq:016X}"))
    }

    /// Returns the order ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_new_valid() {
        let id = OrderId::new("ORD-1").unwrap();
        assert_eq!(id.as_str(), "ORD-1");
    }

    #[test]
    fn test_order_id_new_empty() {
        assert!(matches!(
            OrderId::new(""),
            Err(ValidationError::EmptyOrderId)
        ));
    }

    #[test]
    fn test_order_id_generate_unique() {
        let a = OrderId::generate();
        let b = OrderId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("ORD-"));
    }
}
