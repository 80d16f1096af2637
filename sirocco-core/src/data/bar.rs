//! Bar (OHLCV) data structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::types::{Amount, Price, Quantity, Symbol, Timestamp};

use super::DataValidationError;

/// Bar frequency enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// 1 minute
    #[serde(rename = "1m")]
    Minute1,
    /// 5 minutes
    #[serde(rename = "5m")]
    Minute5,
    /// 15 minutes
    #[serde(rename = "15m")]
    Minute15,
    /// 30 minutes
    #[serde(rename = "30m")]
    Minute30,
    /// 1 hour
    #[serde(rename = "1h")]
    Hour1,
    /// 4 hours
    #[serde(rename = "4h")]
    Hour4,
    /// 1 day
    #[serde(rename = "1d")]
    Daily,
    /// 1 week
    #[serde(rename = "1w")]
    Weekly,
    /// 1 month
    #[serde(rename = "1mo")]
    Monthly,
}

impl Frequency {
    /// Returns the nominal duration of this frequency.
    ///
    /// Months are approximated as 30 days; only used for coarse scheduling.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        match self {
            Self::Minute1 => Duration::from_secs(60),
            Self::Minute5 => Duration::from_secs(5 * 60),
            Self::Minute15 => Duration::from_secs(15 * 60),
            Self::Minute30 => Duration::from_secs(30 * 60),
            Self::Hour1 => Duration::from_secs(60 * 60),
            Self::Hour4 => Duration::from_secs(4 * 60 * 60),
            Self::Daily => Duration::from_secs(24 * 60 * 60),
            Self::Weekly => Duration::from_secs(7 * 24 * 60 * 60),
            Self::Monthly => Duration::from_secs(30 * 24 * 60 * 60),
        }
    }

    /// Returns the short tag representation (e.g. "1m", "1d").
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1m",
            Self::Minute5 => "5m",
            Self::Minute15 => "15m",
            Self::Minute30 => "30m",
            Self::Hour1 => "1h",
            Self::Hour4 => "4h",
            Self::Daily => "1d",
            Self::Weekly => "1w",
            Self::Monthly => "1mo",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Precomputed technical indicators attached to a bar.
///
/// All fields are optional; upstream archives may populate any subset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Indicators {
    /// 5-period moving average
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma5: Option<Price>,
    /// 10-period moving average
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma10: Option<Price>,
    /// 20-period moving average
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma20: Option<Price>,
    /// 60-period moving average
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma60: Option<Price>,
    /// MACD DIF line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_dif: Option<Decimal>,
    /// MACD DEA (signal) line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_dea: Option<Decimal>,
    /// MACD histogram
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_histogram: Option<Decimal>,
    /// 14-period RSI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi14: Option<Decimal>,
    /// Bollinger upper band
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boll_upper: Option<Price>,
    /// Bollinger middle band
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boll_middle: Option<Price>,
    /// Bollinger lower band
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boll_lower: Option<Price>,
}

impl Indicators {
    /// Returns true if no indicator is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ma5.is_none()
            && self.ma10.is_none()
            && self.ma20.is_none()
            && self.ma60.is_none()
            && self.macd_dif.is_none()
            && self.macd_dea.is_none()
            && self.macd_histogram.is_none()
            && self.rsi14.is_none()
            && self.boll_upper.is_none()
            && self.boll_middle.is_none()
            && self.boll_lower.is_none()
    }
}

/// Bar (OHLCV) quote record.
///
/// Represents aggregated price and volume data over one time bucket,
/// optionally carrying precomputed indicators from the upstream archive.
///
/// # Examples
///
/// ```
/// use sirocco_core::data::{Bar, Frequency};
/// use sirocco_core::types::{Symbol, Timestamp, Price, Quantity, Amount};
/// use rust_decimal::Decimal;
///
/// let bar = Bar::builder()
///     .symbol(Symbol::new("000001.SZ").unwrap())
///     .timestamp(Timestamp::new(1_704_067_200_000).unwrap())
///     .frequency(Frequency::Daily)
///     .open(Price::new(Decimal::from(10)).unwrap())
///     .high(Price::new(Decimal::from(11)).unwrap())
///     .low(Price::new(Decimal::from(9)).unwrap())
///     .close(Price::new(Decimal::from(10)).unwrap())
///     .volume(1_000_000)
///     .amount(Amount::new(Decimal::from(10_000_000)).unwrap())
///     .build()
///     .unwrap();
/// assert!(bar.is_bullish());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Instrument symbol
    pub symbol: Symbol,
    /// Bar open timestamp (start of bucket)
    pub timestamp: Timestamp,
    /// Bar frequency
    pub frequency: Frequency,
    /// Opening price
    pub open: Price,
    /// Highest price
    pub high: Price,
    /// Lowest price
    pub low: Price,
    /// Closing price
    pub close: Price,
    /// Traded volume in shares
    pub volume: u64,
    /// Traded amount in quote currency
    pub amount: Amount,
    /// Precomputed indicators
    #[serde(default, skip_serializing_if = "Indicators::is_empty")]
    pub indicators: Indicators,
}

impl Bar {
    /// Creates a new builder for `Bar`.
    #[must_use]
    pub fn builder() -> BarBuilder {
        BarBuilder::default()
    }

    /// Validates the bar data.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The timestamp is zero
    /// - `low > min(open, close)` or `max(open, close) > high`
    pub fn validate(&self) -> Result<(), DataValidationError> {
        if self.timestamp.is_zero() {
            return Err(DataValidationError::InvalidTimestamp(
                "timestamp cannot be zero".to_string(),
            ));
        }

        if self.high < self.low {
            return Err(DataValidationError::InvalidPriceRelation(format!(
                "high ({}) < low ({})",
                self.high, self.low
            )));
        }

        if self.open > self.high || self.open < self.low {
            return Err(DataValidationError::InvalidPriceRelation(format!(
                "open ({}) outside low-high range ({}-{})",
                self.open, self.low, self.high
            )));
        }

        if self.close > self.high || self.close < self.low {
            return Err(DataValidationError::InvalidPriceRelation(format!(
                "close ({}) outside low-high range ({}-{})",
                self.close, self.low, self.high
            )));
        }

        Ok(())
    }

    /// Returns true if this is a bullish (close ≥ open) bar.
    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// Returns true if this is a bearish bar.
    #[must_use]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Returns the price range (high − low).
    #[must_use]
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// Returns the traded volume as a `Quantity`.
    #[must_use]
    pub fn volume_quantity(&self) -> Quantity {
        Quantity::new_unchecked(Decimal::from(self.volume))
    }
}

/// Builder for `Bar`.
#[derive(Debug, Default)]
pub struct BarBuilder {
    symbol: Option<Symbol>,
    timestamp: Option<Timestamp>,
    frequency: Option<Frequency>,
    open: Option<Price>,
    high: Option<Price>,
    low: Option<Price>,
    close: Option<Price>,
    volume: Option<u64>,
    amount: Option<Amount>,
    indicators: Indicators,
}

impl BarBuilder {
    /// Sets the symbol.
    #[must_use]
    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = Some(symbol);
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the frequency.
    #[must_use]
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Sets the open price.
    #[must_use]
    pub fn open(mut self, open: Price) -> Self {
        self.open = Some(open);
        self
    }

    /// Sets the high price.
    #[must_use]
    pub fn high(mut self, high: Price) -> Self {
        self.high = Some(high);
        self
    }

    /// Sets the low price.
    #[must_use]
    pub fn low(mut self, low: Price) -> Self {
        self.low = Some(low);
        self
    }

    /// Sets the close price.
    #[must_use]
    pub fn close(mut self, close: Price) -> Self {
        self.close = Some(close);
        self
    }

    /// Sets the traded volume.
    #[must_use]
    pub fn volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Sets the traded amount.
    #[must_use]
    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Sets the precomputed indicators.
    #[must_use]
    pub fn indicators(mut self, indicators: Indicators) -> Self {
        self.indicators = indicators;
        self
    }

    /// Builds the `Bar` and validates price relations.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or validation fails.
    pub fn build(self) -> Result<Bar, DataValidationError> {
        let bar = Bar {
            symbol: self
                .symbol
                .ok_or(DataValidationError::MissingField("symbol"))?,
            timestamp: self
                .timestamp
                .ok_or(DataValidationError::MissingField("timestamp"))?,
            frequency: self
                .frequency
                .ok_or(DataValidationError::MissingField("frequency"))?,
            open: self.open.ok_or(DataValidationError::MissingField("open"))?,
            high: self.high.ok_or(DataValidationError::MissingField("high"))?,
            low: self.low.ok_or(DataValidationError::MissingField("low"))?,
            close: self
                .close
                .ok_or(DataValidationError::MissingField("close"))?,
            volume: self
                .volume
                .ok_or(DataValidationError::MissingField("volume"))?,
            amount: self
                .amount
                .ok_or(DataValidationError::MissingField("amount"))?,
            indicators: self.indicators,
        };

        bar.validate()?;
        Ok(bar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_builder() -> BarBuilder {
        Bar::builder()
            .symbol(Symbol::new("000001.SZ").unwrap())
            .timestamp(Timestamp::new(1_704_067_200_000).unwrap())
            .frequency(Frequency::Daily)
            .open(Price::new(dec!(10.00)).unwrap())
            .high(Price::new(dec!(10.10)).unwrap())
            .low(Price::new(dec!(9.95)).unwrap())
            .close(Price::new(dec!(10.05)).unwrap())
            .volume(10_000_000)
            .amount(Amount::new(dec!(100_000_000)).unwrap())
    }

    #[test]
    fn test_bar_builder_valid() {
        let bar = base_builder().build().unwrap();
        assert_eq!(bar.symbol.as_str(), "000001.SZ");
        assert!(bar.is_bullish());
        assert_eq!(bar.range(), dec!(0.15));
    }

    #[test]
    fn test_bar_high_below_low_rejected() {
        let result = base_builder()
            .high(Price::new(dec!(9.00)).unwrap())
            .low(Price::new(dec!(9.95)).unwrap())
            .build();
        assert!(matches!(
            result,
            Err(DataValidationError::InvalidPriceRelation(_))
        ));
    }

    #[test]
    fn test_bar_close_outside_range_rejected() {
        let result = base_builder()
            .close(Price::new(dec!(11.00)).unwrap())
            .build();
        assert!(matches!(
            result,
            Err(DataValidationError::InvalidPriceRelation(_))
        ));
    }

    #[test]
    fn test_bar_missing_field() {
        let result = Bar::builder().build();
        assert!(matches!(result, Err(DataValidationError::MissingField(_))));
    }

    #[test]
    fn test_frequency_tags() {
        assert_eq!(Frequency::Minute1.as_str(), "1m");
        assert_eq!(Frequency::Daily.as_str(), "1d");
        assert_eq!(Frequency::Monthly.as_str(), "1mo");
    }

    #[test]
    fn test_frequency_serde_tag() {
        let json = serde_json::to_string(&Frequency::Minute5).unwrap();
        assert_eq!(json, "\"5m\"");
        let parsed: Frequency = serde_json::from_str("\"1mo\"").unwrap();
        assert_eq!(parsed, Frequency::Monthly);
    }

    #[test]
    fn test_bar_serde_roundtrip() {
        let bar = base_builder().build().unwrap();
        let json = serde_json::to_string(&bar).unwrap();
        let parsed: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, parsed);
    }

    #[test]
    fn test_indicators_default_empty() {
        assert!(Indicators::default().is_empty());
        let with_ma = Indicators {
            ma5: Some(Price::new(dec!(10)).unwrap()),
            ..Default::default()
        };
        assert!(!with_ma.is_empty());
    }
}
