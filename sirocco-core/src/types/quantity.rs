//! Quantity type for representing trading quantities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use super::ValidationError;

/// Quantity type - used for representing trading quantities in shares.
///
/// Wraps a `Decimal` value. Order and fill quantities are always
/// non-negative; signed exposure lives on [`crate::data::Position`].
///
/// # Examples
///
/// ```
/// use sirocco_core::types::Quantity;
/// use rust_decimal::Decimal;
///
/// let qty = Quantity::new(Decimal::from(1000)).unwrap();
/// assert_eq!(qty.as_decimal(), Decimal::from(1000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Zero quantity constant.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new `Quantity` from a `Decimal` value.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NegativeQuantity` if the value is negative.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value < Decimal::ZERO {
            return Err(ValidationError::NegativeQuantity(value));
        }
        Ok(Self(value))
    }

    /// Creates a new `Quantity` without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure the value is non-negative.
    #[must_use]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// Creates a `Quantity` from a whole number of shares.
    #[must_use]
    pub fn from_shares(shares: i64) -> Self {
        Self(Decimal::from(shares.max(0)))
    }

    /// Returns the underlying `Decimal` value.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns true if the quantity is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the quantity is negative.
    ///
    /// Only reachable through `new_unchecked`; used by validation paths.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal =
            Decimal::from_str(s).map_err(|_| ValidationError::NegativeQuantity(Decimal::ZERO))?;
        Self::new(decimal)
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl From<Quantity> for Decimal {
    fn from(qty: Quantity) -> Self {
        qty.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quantity_new_valid() {
        let qty = Quantity::new(dec!(1000)).unwrap();
        assert_eq!(qty.as_decimal(), dec!(1000));
    }

    #[test]
    fn test_quantity_new_negative() {
        let result = Quantity::new(dec!(-1));
        assert!(matches!(result, Err(ValidationError::NegativeQuantity(_))));
    }

    #[test]
    fn test_quantity_from_shares() {
        assert_eq!(Quantity::from_shares(500).as_decimal(), dec!(500));
        assert_eq!(Quantity::from_shares(-5), Quantity::ZERO);
    }

    #[test]
    fn test_quantity_arithmetic() {
        let a = Quantity::new(dec!(1000)).unwrap();
        let b = Quantity::new(dec!(400)).unwrap();
        assert_eq!((a - b).as_decimal(), dec!(600));
        assert_eq!((a + b).as_decimal(), dec!(1400));
    }
}
