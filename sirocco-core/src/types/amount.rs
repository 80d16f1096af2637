//! Amount type for representing monetary values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use super::ValidationError;

/// Amount type - used for representing monetary values (price × quantity).
///
/// Wraps a `Decimal` value to keep monetary sums distinct from prices
/// and quantities at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new `Amount` from a `Decimal` value.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NegativeAmount` if the value is negative.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount(value));
        }
        Ok(Self(value))
    }

    /// Creates a new `Amount` without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure the value is non-negative.
    #[must_use]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying `Decimal` value.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Decimal;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_new_valid() {
        let amount = Amount::new(dec!(10000)).unwrap();
        assert_eq!(amount.as_decimal(), dec!(10000));
    }

    #[test]
    fn test_amount_new_negative() {
        let result = Amount::new(dec!(-0.01));
        assert!(matches!(result, Err(ValidationError::NegativeAmount(_))));
    }

    #[test]
    fn test_amount_add() {
        let a = Amount::new(dec!(100)).unwrap();
        let b = Amount::new(dec!(50)).unwrap();
        assert_eq!((a + b).as_decimal(), dec!(150));
    }
}
