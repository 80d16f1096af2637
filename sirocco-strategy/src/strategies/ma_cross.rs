//! Moving-average cross strategy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use sirocco_core::data::{Bar, Fill, Signal, SignalDirection};
use sirocco_core::event::Event;
use sirocco_core::types::{Amount, Symbol};

use crate::r#trait::{Strategy, StrategyStatus, StrategyType};
use crate::StrategyError;

/// Parameters for [`MaCrossStrategy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaCrossParams {
    /// Role of this instance: an `ENTRY` instance buys golden crosses on
    /// symbols it does not hold, an `EXIT` instance sells death crosses
    /// on symbols it holds
    #[serde(default = "default_role")]
    pub role: StrategyType,
    /// Position size suggested on entry signals, in quote currency
    #[serde(default)]
    pub position_size: Option<Decimal>,
    /// Minimum relative spread between the averages before a cross
    /// counts, filtering flat-market noise
    #[serde(default = "default_min_spread")]
    pub min_spread: Decimal,
}

fn default_role() -> StrategyType {
    StrategyType::Entry
}

fn default_min_spread() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

impl Default for MaCrossParams {
    fn default() -> Self {
        Self {
            role: default_role(),
            position_size: None,
            min_spread: default_min_spread(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaRelation {
    FastAbove,
    FastBelow,
}

/// Golden/death-cross strategy over the precomputed ma5/ma20 indicators.
///
/// An `ENTRY` instance emits a BUY when ma5 crosses above ma20 (golden
/// cross); an `EXIT` instance emits a SELL for a held symbol when ma5
/// crosses back below (death cross), suggesting the full holding as the
/// closing size. Signal strength scales with the relative spread between
/// the averages.
pub struct MaCrossStrategy {
    id: String,
    status: StrategyStatus,
    params: MaCrossParams,
    /// Last observed ma5/ma20 relation per symbol
    last_relation: HashMap<Symbol, MaRelation>,
    /// Signed holdings attributed to this strategy
    holdings: HashMap<Symbol, Decimal>,
}

impl MaCrossStrategy {
    /// Creates an uninitialized strategy with the given ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: StrategyStatus::NotInitialized,
            params: MaCrossParams::default(),
            last_relation: HashMap::new(),
            holdings: HashMap::new(),
        }
    }

    fn relation(bar: &Bar) -> Option<(MaRelation, Decimal)> {
        let ma5 = bar.indicators.ma5?.as_decimal();
        let ma20 = bar.indicators.ma20?.as_decimal();
        if ma20.is_zero() {
            return None;
        }
        let spread = ((ma5 - ma20) / ma20).abs();
        let relation = if ma5 >= ma20 {
            MaRelation::FastAbove
        } else {
            MaRelation::FastBelow
        };
        Some((relation, spread))
    }

    fn strength(spread: Decimal, min_spread: Decimal) -> Decimal {
        // Scale the spread into (0, 1]: ten times the entry threshold
        // saturates at full strength.
        if min_spread.is_zero() {
            return Decimal::ONE;
        }
        (spread / (min_spread * Decimal::from(10))).clamp(Decimal::new(1, 1), Decimal::ONE)
    }

    fn holding(&self, symbol: &Symbol) -> Decimal {
        self.holdings.get(symbol).copied().unwrap_or_default()
    }

    fn entry_signal(&self, bar: &Bar, spread: Decimal) -> Option<Signal> {
        if !self.holding(&bar.symbol).is_zero() {
            return None;
        }
        let mut signal = Signal::new(
            &self.id,
            bar.symbol.clone(),
            SignalDirection::Buy,
            Self::strength(spread, self.params.min_spread),
            bar.timestamp,
            bar.close,
            "golden cross ma5/ma20",
        );
        if let Some(size) = self.params.position_size {
            signal = signal.with_suggested_size(Amount::new_unchecked(size));
        }
        Some(signal)
    }

    fn exit_signal(&self, bar: &Bar, spread: Decimal) -> Option<Signal> {
        let held = self.holding(&bar.symbol);
        if held <= Decimal::ZERO {
            return None;
        }
        // Suggest closing the whole holding at the current price.
        let closing_value = held * bar.close.as_decimal();
        Some(
            Signal::new(
                &self.id,
                bar.symbol.clone(),
                SignalDirection::Sell,
                Self::strength(spread, self.params.min_spread),
                bar.timestamp,
                bar.close,
                "death cross ma5/ma20",
            )
            .with_suggested_size(Amount::new_unchecked(closing_value)),
        )
    }
}

impl Strategy for MaCrossStrategy {
    fn strategy_id(&self) -> &str {
        &self.id
    }

    fn strategy_type(&self) -> StrategyType {
        self.params.role
    }

    fn status(&self) -> StrategyStatus {
        self.status
    }

    fn on_market_event(&mut self, _event: &Event, bar: &Bar) -> Result<Vec<Signal>, StrategyError> {
        let Some((relation, spread)) = Self::relation(bar) else {
            return Ok(Vec::new());
        };

        let previous = self.last_relation.insert(bar.symbol.clone(), relation);
        let Some(previous) = previous else {
            return Ok(Vec::new());
        };
        if previous == relation || spread < self.params.min_spread {
            return Ok(Vec::new());
        }

        let signal = match (self.params.role, relation) {
            (StrategyType::Entry, MaRelation::FastAbove) => self.entry_signal(bar, spread),
            (StrategyType::Exit | StrategyType::UniversalStop, MaRelation::FastBelow) => {
                self.exit_signal(bar, spread)
            }
            _ => None,
        };
        Ok(signal.into_iter().collect())
    }

    fn on_fill_event(&mut self, fill: &Fill) -> Result<(), StrategyError> {
        let entry = self.holdings.entry(fill.symbol.clone()).or_default();
        *entry += fill.signed_quantity();
        if entry.is_zero() {
            self.holdings.remove(&fill.symbol);
        }
        Ok(())
    }

    fn initialize(&mut self, config: &serde_json::Value) -> Result<(), StrategyError> {
        self.params = serde_json::from_value(config.clone())
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        self.status = StrategyStatus::Initialized;
        Ok(())
    }

    fn start(&mut self) -> Result<(), StrategyError> {
        match self.status {
            StrategyStatus::Initialized | StrategyStatus::Paused | StrategyStatus::Stopped => {
                self.status = StrategyStatus::Running;
                Ok(())
            }
            status => Err(StrategyError::InvalidStatus {
                status,
                operation: "start",
            }),
        }
    }

    fn stop(&mut self) -> Result<(), StrategyError> {
        self.status = StrategyStatus::Stopped;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StrategyError> {
        self.last_relation.clear();
        self.holdings.clear();
        self.status = StrategyStatus::Initialized;
        Ok(())
    }

    fn update_config(&mut self, config: &serde_json::Value) -> Result<(), StrategyError> {
        self.params = serde_json::from_value(config.clone())
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sirocco_core::data::{FeeSchedule, Frequency, Indicators, OrderSide};
    use sirocco_core::types::{OrderId, Price, Quantity, Timestamp};

    fn bar_with_mas(symbol: &str, millis: i64, ma5: Decimal, ma20: Decimal) -> Bar {
        Bar::builder()
            .symbol(Symbol::new(symbol).unwrap())
            .timestamp(Timestamp::new(millis).unwrap())
            .frequency(Frequency::Daily)
            .open(Price::new(dec!(10.00)).unwrap())
            .high(Price::new(dec!(10.20)).unwrap())
            .low(Price::new(dec!(9.80)).unwrap())
            .close(Price::new(dec!(10.00)).unwrap())
            .volume(1_000_000)
            .amount(Amount::new(dec!(10_000_000)).unwrap())
            .indicators(Indicators {
                ma5: Some(Price::new(ma5).unwrap()),
                ma20: Some(Price::new(ma20).unwrap()),
                ..Default::default()
            })
            .build()
            .unwrap()
    }

    fn strategy_with_role(role: &str) -> MaCrossStrategy {
        let mut strategy = MaCrossStrategy::new("ma-cross");
        strategy
            .initialize(&serde_json::json!({ "role": role }))
            .unwrap();
        strategy.start().unwrap();
        strategy
    }

    fn market(strategy: &mut MaCrossStrategy, bar: &Bar) -> Vec<Signal> {
        let event = Event::market(bar.clone());
        strategy.on_market_event(&event, bar).unwrap()
    }

    fn buy_fill(qty: Decimal) -> Fill {
        Fill::new(
            OrderId::generate(),
            Symbol::new("000001.SZ").unwrap(),
            OrderSide::Buy,
            Quantity::new(qty).unwrap(),
            Price::new(dec!(10)).unwrap(),
            Timestamp::new_unchecked(1_500),
            Some("ma-cross".to_string()),
            &FeeSchedule::free(),
        )
    }

    #[test]
    fn test_entry_golden_cross_emits_buy() {
        let mut strategy = strategy_with_role("ENTRY");
        // Establish fast-below, then cross above
        let below = bar_with_mas("000001.SZ", 1_000, dec!(9.80), dec!(10.00));
        assert!(market(&mut strategy, &below).is_empty());

        let above = bar_with_mas("000001.SZ", 2_000, dec!(10.20), dec!(10.00));
        let signals = market(&mut strategy, &above);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, SignalDirection::Buy);
        assert!(signals[0].strength > dec!(0));
    }

    #[test]
    fn test_entry_skips_held_symbol() {
        let mut strategy = strategy_with_role("ENTRY");
        let below = bar_with_mas("000001.SZ", 1_000, dec!(9.80), dec!(10.00));
        market(&mut strategy, &below);
        strategy.on_fill_event(&buy_fill(dec!(1000))).unwrap();

        let above = bar_with_mas("000001.SZ", 2_000, dec!(10.20), dec!(10.00));
        assert!(market(&mut strategy, &above).is_empty());
    }

    #[test]
    fn test_no_signal_without_cross() {
        let mut strategy = strategy_with_role("ENTRY");
        let bar1 = bar_with_mas("000001.SZ", 1_000, dec!(10.20), dec!(10.00));
        let bar2 = bar_with_mas("000001.SZ", 2_000, dec!(10.30), dec!(10.00));
        market(&mut strategy, &bar1);
        assert!(market(&mut strategy, &bar2).is_empty());
    }

    #[test]
    fn test_exit_death_cross_sells_holding() {
        let mut strategy = strategy_with_role("EXIT");
        strategy.on_fill_event(&buy_fill(dec!(900))).unwrap();

        let above = bar_with_mas("000001.SZ", 1_000, dec!(10.20), dec!(10.00));
        market(&mut strategy, &above);
        let below = bar_with_mas("000001.SZ", 2_000, dec!(9.80), dec!(10.00));
        let signals = market(&mut strategy, &below);

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, SignalDirection::Sell);
        // Suggests closing the whole 900-share holding at the close
        assert_eq!(
            signals[0].suggested_position_size,
            Some(Amount::new(dec!(9000)).unwrap())
        );
    }

    #[test]
    fn test_exit_silent_without_holding() {
        let mut strategy = strategy_with_role("EXIT");
        let above = bar_with_mas("000001.SZ", 1_000, dec!(10.20), dec!(10.00));
        market(&mut strategy, &above);
        let below = bar_with_mas("000001.SZ", 2_000, dec!(9.80), dec!(10.00));
        assert!(market(&mut strategy, &below).is_empty());
    }

    #[test]
    fn test_bars_without_indicators_ignored() {
        let mut strategy = strategy_with_role("ENTRY");
        let bare = Bar::builder()
            .symbol(Symbol::new("000001.SZ").unwrap())
            .timestamp(Timestamp::new(1_000).unwrap())
            .frequency(Frequency::Daily)
            .open(Price::new(dec!(10)).unwrap())
            .high(Price::new(dec!(10)).unwrap())
            .low(Price::new(dec!(10)).unwrap())
            .close(Price::new(dec!(10)).unwrap())
            .volume(1)
            .amount(Amount::new(dec!(10)).unwrap())
            .build()
            .unwrap();
        assert!(market(&mut strategy, &bare).is_empty());
    }

    #[test]
    fn test_suggested_size_from_params() {
        let mut strategy = MaCrossStrategy::new("ma-cross");
        strategy
            .initialize(&serde_json::json!({"position_size": "20000"}))
            .unwrap();
        strategy.start().unwrap();

        let below = bar_with_mas("000001.SZ", 1_000, dec!(9.80), dec!(10.00));
        market(&mut strategy, &below);
        let above = bar_with_mas("000001.SZ", 2_000, dec!(10.20), dec!(10.00));
        let signals = market(&mut strategy, &above);
        assert_eq!(
            signals[0].suggested_position_size,
            Some(Amount::new(dec!(20000)).unwrap())
        );
    }

    #[test]
    fn test_start_requires_initialize() {
        let mut strategy = MaCrossStrategy::new("ma-cross");
        assert!(matches!(
            strategy.start(),
            Err(StrategyError::InvalidStatus { .. })
        ));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut strategy = strategy_with_role("ENTRY");
        let below = bar_with_mas("000001.SZ", 1_000, dec!(9.80), dec!(10.00));
        market(&mut strategy, &below);
        strategy.reset().unwrap();
        assert_eq!(strategy.status(), StrategyStatus::Initialized);

        // After reset the first bar only re-establishes the relation
        strategy.start().unwrap();
        let above = bar_with_mas("000001.SZ", 2_000, dec!(10.20), dec!(10.00));
        assert!(market(&mut strategy, &above).is_empty());
    }
}
