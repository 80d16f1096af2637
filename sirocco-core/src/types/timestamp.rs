//! Timestamp type for representing Unix millisecond timestamps.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use super::ValidationError;

/// Timestamp type - used for representing Unix millisecond timestamps.
///
/// Wraps an `i64` value representing milliseconds since Unix epoch.
///
/// # Examples
///
/// ```
/// use sirocco_core::types::Timestamp;
///
/// let ts = Timestamp::now();
/// assert!(ts.as_millis() > 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Zero timestamp constant.
    pub const ZERO: Self = Self(0);

    /// Creates a new `Timestamp` from milliseconds since Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidTimestamp` if the value is negative.
    pub fn new(millis: i64) -> Result<Self, ValidationError> {
        if millis < 0 {
            return Err(ValidationError::InvalidTimestamp(millis));
        }
        Ok(Self(millis))
    }

    /// Creates a new `Timestamp` without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure the value is non-negative.
    #[must_use]
    pub const fn new_unchecked(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current timestamp.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System time before Unix epoch");
        Self(duration.as_millis() as i64)
    }

    /// Creates a `Timestamp` from seconds since Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidTimestamp` if the value is negative.
    pub fn from_secs(secs: i64) -> Result<Self, ValidationError> {
        Self::new(secs * 1000)
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> i64 {
        self.0 / 1000
    }

    /// Returns true if the timestamp is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns a timestamp shifted forward by the given number of seconds.
    #[must_use]
    pub const fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + secs * 1000)
    }

    /// Returns a timestamp shifted forward by the given number of milliseconds.
    #[must_use]
    pub const fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0 + millis)
    }

    /// Converts to a `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.0)
            .single()
            .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap())
    }

    /// Returns the UTC calendar date of this timestamp.
    #[must_use]
    pub fn to_date(&self) -> NaiveDate {
        self.to_datetime().date_naive()
    }

    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_new_valid() {
        let ts = Timestamp::new(1_704_067_200_000).unwrap();
        assert_eq!(ts.as_millis(), 1_704_067_200_000);
        assert_eq!(ts.as_secs(), 1_704_067_200);
    }

    #[test]
    fn test_timestamp_new_negative() {
        assert!(matches!(
            Timestamp::new(-1),
            Err(ValidationError::InvalidTimestamp(-1))
        ));
    }

    #[test]
    fn test_timestamp_plus_secs() {
        let ts = Timestamp::new_unchecked(1000);
        assert_eq!(ts.plus_secs(300).as_millis(), 301_000);
    }

    #[test]
    fn test_timestamp_to_date() {
        let ts = Timestamp::new(1_704_067_200_000).unwrap(); // 2024-01-01 00:00:00 UTC
        assert_eq!(
            ts.to_date(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_timestamp_ordering() {
        let earlier = Timestamp::new_unchecked(1000);
        let later = Timestamp::new_unchecked(2000);
        assert!(earlier < later);
    }
}
