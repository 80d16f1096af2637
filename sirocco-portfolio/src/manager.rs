//! The portfolio & risk manager.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use sirocco_core::clock::Clock;
use sirocco_core::config::{PortfolioConfig, RiskConfig};
use sirocco_core::data::{Account, Fill, Frequency, Order, OrderAction, OrderSide, Signal};
use sirocco_core::event::{Event, EventPayload, TimerType};
use sirocco_core::types::{Price, Quantity, Symbol};
use sirocco_data::DataProvider;
use sirocco_engine::{EventBus, EventHandler, HandlerResult};

use crate::risk::{RiskStatus, RISK_LIMIT_REASON};
use crate::PortfolioError;

/// Whole-lot size for equity orders.
const LOT_SIZE: u32 = 100;

/// Aggregate portfolio statistics.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioStats {
    /// Signals received
    pub total_signals: u64,
    /// Signals that passed every gate
    pub passed_signals: u64,
    /// Signals rejected by a gate
    pub rejected_signals: u64,
    /// Orders published
    pub generated_orders: u64,
    /// Pass rate in `[0, 1]`
    pub pass_rate: f64,
    /// Total account value at current reference prices
    pub total_assets: Decimal,
    /// Cash not frozen against orders
    pub available_cash: Decimal,
    /// Fraction of total value held in positions
    pub position_ratio: Decimal,
    /// Open position count
    pub position_count: usize,
    /// Symbols currently blocked by risk
    pub blocked_symbols: usize,
}

/// The portfolio & risk manager.
///
/// Registered on the bus for `SIGNAL`, `FILL`, and `TIMER` events.
/// Signals that pass the gating pipeline become LIMIT orders published at
/// priority 2; fills mutate the account through its single serialized
/// surface.
pub struct PortfolioManager {
    bus: EventBus,
    provider: Arc<dyn DataProvider>,
    clock: Arc<dyn Clock>,
    portfolio: PortfolioConfig,
    risk: RiskConfig,
    account: Arc<Mutex<Account>>,
    risk_status: DashMap<Symbol, RiskStatus>,
    total_signals: AtomicU64,
    passed_signals: AtomicU64,
    rejected_signals: AtomicU64,
    generated_orders: AtomicU64,
}

impl PortfolioManager {
    /// Creates a manager with a fresh account.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured initial capital is not
    /// positive.
    pub fn new(
        bus: EventBus,
        provider: Arc<dyn DataProvider>,
        clock: Arc<dyn Clock>,
        portfolio: PortfolioConfig,
        risk: RiskConfig,
        account_id: &str,
        initial_capital: Decimal,
    ) -> Result<Self, PortfolioError> {
        let account = Account::new(account_id, initial_capital, clock.now())?;
        info!(
            account = %account_id,
            initial_capital = %initial_capital,
            "portfolio manager initialized"
        );
        Ok(Self {
            bus,
            provider,
            clock,
            portfolio,
            risk,
            account: Arc::new(Mutex::new(account)),
            risk_status: DashMap::new(),
            total_signals: AtomicU64::new(0),
            passed_signals: AtomicU64::new(0),
            rejected_signals: AtomicU64::new(0),
            generated_orders: AtomicU64::new(0),
        })
    }

    /// Returns a clone of the current account state.
    #[must_use]
    pub fn account_snapshot(&self) -> Account {
        self.account.lock().clone()
    }

    /// Returns the risk state for one symbol, if tracked.
    #[must_use]
    pub fn risk_status(&self, symbol: &Symbol) -> Option<RiskStatus> {
        self.risk_status.get(symbol).map(|entry| entry.clone())
    }

    /// Blocks a symbol from new signals, e.g. by operator action.
    pub fn block_symbol(&self, symbol: Symbol, reason: impl Into<String>) {
        self.risk_status.entry(symbol).or_default().block(reason);
    }

    /// Returns aggregate statistics at current reference prices.
    pub async fn stats(&self) -> PortfolioStats {
        let prices = self.reference_prices(None).await;
        let account = self.account.lock();
        let total = self.total_signals.load(Ordering::Relaxed);
        let passed = self.passed_signals.load(Ordering::Relaxed);
        #[allow(clippy::cast_precision_loss)]
        let pass_rate = if total > 0 {
            passed as f64 / total as f64
        } else {
            0.0
        };
        PortfolioStats {
            total_signals: total,
            passed_signals: passed,
            rejected_signals: self.rejected_signals.load(Ordering::Relaxed),
            generated_orders: self.generated_orders.load(Ordering::Relaxed),
            pass_rate,
            total_assets: account.total_value(&prices),
            available_cash: account.available_cash(),
            position_ratio: account.position_ratio(&prices),
            position_count: account.positions.len(),
            blocked_symbols: self
                .risk_status
                .iter()
                .filter(|entry| entry.is_blocked)
                .count(),
        }
    }

    /// Collects reference prices for all held symbols from the latest
    /// daily bar, optionally overriding one symbol with a known price.
    async fn reference_prices(
        &self,
        overlay: Option<(&Symbol, Price)>,
    ) -> HashMap<Symbol, Price> {
        let held: Vec<Symbol> = self.account.lock().positions.keys().cloned().collect();
        let mut prices = HashMap::new();
        for symbol in held {
            if let Some(bar) = self.provider.latest_bar(&symbol, Frequency::Daily).await {
                prices.insert(symbol, bar.close);
            }
        }
        if let Some((symbol, price)) = overlay {
            prices.insert(symbol.clone(), price);
        }
        prices
    }

    fn reject(&self, signal: &Signal, reason: &str) {
        self.rejected_signals.fetch_add(1, Ordering::Relaxed);
        warn!(signal = %signal, reason = reason, "signal rejected");
    }

    async fn handle_signal(&self, signal: &Signal) {
        self.total_signals.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now();

        // 1. Validity and expiry
        if !signal.is_valid() {
            self.reject(signal, "invalid signal");
            return;
        }
        if signal.is_expired(now) {
            self.reject(signal, "signal expired");
            return;
        }

        // 2. Per-symbol block
        if let Some(status) = self.risk_status.get(&signal.symbol) {
            if status.is_blocked {
                let reason = status
                    .block_reason
                    .clone()
                    .unwrap_or_else(|| "blocked".to_string());
                drop(status);
                self.reject(signal, &format!("symbol blocked: {reason}"));
                return;
            }
        }

        let prices = self
            .reference_prices(Some((&signal.symbol, signal.reference_price)))
            .await;
        let order_amount = signal
            .suggested_position_size
            .map_or(self.portfolio.default_position_size, |size| {
                size.as_decimal()
            });

        let order = {
            let mut account = self.account.lock();
            let total_assets = account.total_value(&prices);

            // 3. Position limits (BUY only)
            if signal.is_buy() && total_assets > Decimal::ZERO {
                if let Some(position) = account.position(&signal.symbol) {
                    let position_ratio =
                        position.market_value(signal.reference_price) / total_assets;
                    if position_ratio >= self.portfolio.max_position_percent {
                        self.reject(signal, "single-symbol position limit");
                        return;
                    }
                }
                if account.position_ratio(&prices) >= self.portfolio.max_total_position_percent {
                    self.reject(signal, "total position limit");
                    return;
                }
            }

            // 4. Cash (BUY only)
            if signal.is_buy() {
                if order_amount < self.portfolio.min_order_amount {
                    self.reject(signal, "order amount below minimum");
                    return;
                }
                if order_amount > account.available_cash() {
                    self.reject(signal, "insufficient available cash");
                    return;
                }
            }

            // 5. Daily risk
            if let Some(status) = self.risk_status.get(&signal.symbol) {
                let max_loss = total_assets * self.risk.max_daily_loss_percent;
                if status.is_risk_exceeded(max_loss, self.risk.max_drawdown_percent) {
                    self.reject(signal, "daily risk limit");
                    return;
                }
            }

            // 6-7. Sizing and whole-lot order construction
            let lot = Decimal::from(LOT_SIZE);
            let quantity =
                (order_amount / signal.reference_price.as_decimal() / lot).floor() * lot;
            if quantity <= Decimal::ZERO {
                self.reject(signal, "rounded quantity is zero");
                return;
            }

            let side = if signal.is_buy() {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            };
            let mut order = Order::limit(
                signal.symbol.clone(),
                side,
                Quantity::new_unchecked(quantity),
                signal.reference_price,
                now,
            );
            order.signal_id = Some(signal.signal_id.clone());
            order.strategy_id = Some(signal.strategy_id.clone());
            order.tag = Some(format!("signal: {}", signal.reason));
            account.track_order(order.clone());
            order
        };

        // 8. Publish at order priority
        debug!(order = %order, "signal converted to order");
        let event = Event::order(order, OrderAction::New, Some(signal.signal_id.clone()), now);
        if self.bus.publish(event) {
            self.passed_signals.fetch_add(1, Ordering::Relaxed);
            self.generated_orders.fetch_add(1, Ordering::Relaxed);
        } else {
            self.reject(signal, "order event not accepted by bus");
        }
    }

    fn handle_fill(&self, fill: &Fill) {
        if !fill.is_valid() {
            warn!(fill = %fill, "invalid fill ignored");
            return;
        }

        self.account.lock().apply_fill(fill);

        let mut status = self.risk_status.entry(fill.symbol.clone()).or_default();
        status.daily_pnl += fill.net_amount;
        status.last_trade_time = Some(fill.timestamp);
        debug!(
            symbol = %fill.symbol,
            daily_pnl = %status.daily_pnl,
            "risk state updated from fill"
        );
    }

    async fn risk_sweep(&self) {
        let prices = self.reference_prices(None).await;
        let total_assets = self.account.lock().total_value(&prices);
        let max_loss = total_assets * self.risk.max_daily_loss_percent;

        for mut entry in self.risk_status.iter_mut() {
            if entry.is_blocked {
                continue;
            }
            if entry.is_risk_exceeded(max_loss, self.risk.max_drawdown_percent) {
                let symbol = entry.key().clone();
                entry.block(RISK_LIMIT_REASON);
                warn!(
                    symbol = %symbol,
                    daily_pnl = %entry.daily_pnl,
                    max_drawdown = %entry.max_drawdown,
                    "symbol blocked by risk sweep"
                );
            }
        }
    }
}

#[async_trait]
impl EventHandler for PortfolioManager {
    fn name(&self) -> &str {
        "portfolio-manager"
    }

    async fn handle_event(&self, event: &Event) -> HandlerResult {
        match &event.payload {
            EventPayload::Signal { signal } => self.handle_signal(signal).await,
            EventPayload::Fill { fill } => self.handle_fill(fill),
            EventPayload::Timer { timer_type, .. } => {
                if *timer_type == TimerType::RiskCheck {
                    self.risk_sweep().await;
                }
            }
            other => debug!(payload = ?other.event_type(), "ignoring event type"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;
    use rust_decimal_macros::dec;
    use sirocco_core::clock::ManualClock;
    use sirocco_core::data::{FeeSchedule, SignalDirection};
    use sirocco_core::event::EventType;
    use sirocco_core::types::{OrderId, Timestamp};
    use sirocco_data::InMemoryProvider;
    use sirocco_engine::BusConfig;

    struct OrderCapture {
        orders: PlMutex<Vec<Order>>,
    }

    #[async_trait]
    impl EventHandler for OrderCapture {
        fn name(&self) -> &str {
            "order-capture"
        }

        async fn handle_event(&self, event: &Event) -> HandlerResult {
            if let EventPayload::Order { order, .. } = &event.payload {
                self.orders.lock().push(order.clone());
            }
            Ok(())
        }
    }

    struct Fixture {
        bus: EventBus,
        manager: Arc<PortfolioManager>,
        capture: Arc<OrderCapture>,
        clock: Arc<ManualClock>,
    }

    async fn fixture() -> Fixture {
        fixture_with(PortfolioConfig::default(), RiskConfig::default()).await
    }

    async fn fixture_with(portfolio: PortfolioConfig, risk: RiskConfig) -> Fixture {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        let clock = ManualClock::new(Timestamp::new_unchecked(1_704_067_200_000));
        let manager = Arc::new(
            PortfolioManager::new(
                bus.clone(),
                Arc::new(InMemoryProvider::new()),
                clock.clone(),
                portfolio,
                risk,
                "test",
                dec!(1_000_000),
            )
            .unwrap(),
        );
        let capture = Arc::new(OrderCapture {
            orders: PlMutex::new(Vec::new()),
        });
        bus.register(EventType::Order, capture.clone()).await.unwrap();
        Fixture {
            bus,
            manager,
            capture,
            clock,
        }
    }

    fn signal(direction: SignalDirection, price: Decimal) -> Signal {
        Signal::new(
            "s1",
            Symbol::new("000001.SZ").unwrap(),
            direction,
            dec!(0.8),
            Timestamp::new_unchecked(1_704_067_200_000),
            Price::new(price).unwrap(),
            "test",
        )
    }

    fn fill(side: OrderSide, qty: Decimal, price: Decimal) -> Fill {
        Fill::new(
            OrderId::generate(),
            Symbol::new("000001.SZ").unwrap(),
            side,
            Quantity::new(qty).unwrap(),
            Price::new(price).unwrap(),
            Timestamp::new_unchecked(1_704_067_200_000),
            Some("s1".to_string()),
            &FeeSchedule::free(),
        )
    }

    async fn captured_orders(fixture: &Fixture) -> Vec<Order> {
        // Allow the bus to forward the order event to the capture handler
        for _ in 0..100 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            let orders = fixture.capture.orders.lock().clone();
            if !orders.is_empty() {
                return orders;
            }
        }
        fixture.capture.orders.lock().clone()
    }

    #[tokio::test]
    async fn test_buy_signal_becomes_whole_lot_limit_order() {
        let f = fixture().await;
        f.manager.handle_signal(&signal(SignalDirection::Buy, dec!(10.00))).await;

        let orders = captured_orders(&f).await;
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        // 10,000 / 10.00 / 100 = 10 lots = 1000 shares
        assert_eq!(order.quantity.as_decimal(), dec!(1000));
        assert_eq!(order.price.as_decimal(), dec!(10.00));
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.strategy_id.as_deref(), Some("s1"));

        let stats = f.manager.stats().await;
        assert_eq!(stats.passed_signals, 1);
        assert_eq!(stats.generated_orders, 1);
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_lot_rounding_floors() {
        let f = fixture().await;
        // 10,000 / 33.10 = 302.1 shares, floors to 3 lots = 300
        f.manager.handle_signal(&signal(SignalDirection::Buy, dec!(33.10))).await;
        let orders = captured_orders(&f).await;
        assert_eq!(orders[0].quantity.as_decimal(), dec!(300));
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_rounded_to_zero_rejected() {
        let f = fixture().await;
        // 10,000 / 200 = 50 shares, floors to zero lots
        f.manager.handle_signal(&signal(SignalDirection::Buy, dec!(200))).await;
        let stats = f.manager.stats().await;
        assert_eq!(stats.rejected_signals, 1);
        assert_eq!(stats.generated_orders, 0);
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_invalid_signal_rejected() {
        let f = fixture().await;
        let mut bad = signal(SignalDirection::Buy, dec!(10));
        bad.strategy_id = String::new();
        f.manager.handle_signal(&bad).await;
        assert_eq!(f.manager.stats().await.rejected_signals, 1);
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_expired_signal_rejected() {
        let f = fixture().await;
        let sig = signal(SignalDirection::Buy, dec!(10));
        // Advance the clock past the 300 s validity window
        f.clock.set(Timestamp::new_unchecked(1_704_067_200_000 + 301_000));
        f.manager.handle_signal(&sig).await;
        assert_eq!(f.manager.stats().await.rejected_signals, 1);
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_blocked_symbol_rejected() {
        let f = fixture().await;
        f.manager
            .block_symbol(Symbol::new("000001.SZ").unwrap(), "operator");
        f.manager.handle_signal(&signal(SignalDirection::Buy, dec!(10))).await;
        assert_eq!(f.manager.stats().await.rejected_signals, 1);
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_position_limit_rejects_buy() {
        // 5% single-symbol cap; existing position worth 6% of assets
        let portfolio = PortfolioConfig {
            max_position_percent: dec!(0.05),
            ..Default::default()
        };
        let f = fixture_with(portfolio, RiskConfig::default()).await;
        // Buy 6000 shares at 10.00 = 60,000 of 1,000,000
        f.manager.handle_fill(&fill(OrderSide::Buy, dec!(6000), dec!(10.00)));

        f.manager.handle_signal(&signal(SignalDirection::Buy, dec!(10.00))).await;
        let stats = f.manager.stats().await;
        assert_eq!(stats.rejected_signals, 1);
        assert_eq!(stats.generated_orders, 0);

        // Sells are not gated by the position limit
        f.manager.handle_signal(&signal(SignalDirection::Sell, dec!(10.00))).await;
        assert_eq!(f.manager.stats().await.passed_signals, 1);
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_total_position_limit_rejects_buy() {
        let portfolio = PortfolioConfig {
            max_total_position_percent: dec!(0.05),
            ..Default::default()
        };
        let f = fixture_with(portfolio, RiskConfig::default()).await;
        f.manager.handle_fill(&fill(OrderSide::Buy, dec!(6000), dec!(10.00)));
        f.manager.handle_signal(&signal(SignalDirection::Buy, dec!(10.00))).await;
        assert_eq!(f.manager.stats().await.rejected_signals, 1);
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_min_order_amount_rejected() {
        let portfolio = PortfolioConfig {
            min_order_amount: dec!(50_000),
            ..Default::default()
        };
        let f = fixture_with(portfolio, RiskConfig::default()).await;
        f.manager.handle_signal(&signal(SignalDirection::Buy, dec!(10))).await;
        assert_eq!(f.manager.stats().await.rejected_signals, 1);
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_insufficient_cash_rejected() {
        let portfolio = PortfolioConfig {
            default_position_size: dec!(2_000_000),
            ..Default::default()
        };
        let f = fixture_with(portfolio, RiskConfig::default()).await;
        f.manager.handle_signal(&signal(SignalDirection::Buy, dec!(10))).await;
        assert_eq!(f.manager.stats().await.rejected_signals, 1);
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_suggested_size_overrides_default() {
        let f = fixture().await;
        let sig = signal(SignalDirection::Buy, dec!(10.00))
            .with_suggested_size(sirocco_core::types::Amount::new(dec!(50_000)).unwrap());
        f.manager.handle_signal(&sig).await;
        let orders = captured_orders(&f).await;
        assert_eq!(orders[0].quantity.as_decimal(), dec!(5000));
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_fill_updates_account_and_risk() {
        let f = fixture().await;
        f.manager.handle_fill(&fill(OrderSide::Buy, dec!(1000), dec!(10.00)));

        let account = f.manager.account_snapshot();
        assert_eq!(account.cash, dec!(990_000));
        let position = account
            .position(&Symbol::new("000001.SZ").unwrap())
            .unwrap();
        assert_eq!(position.quantity, dec!(1000));

        let status = f
            .manager
            .risk_status(&Symbol::new("000001.SZ").unwrap())
            .unwrap();
        assert_eq!(status.daily_pnl, dec!(-10_000));
        assert!(status.last_trade_time.is_some());
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_risk_sweep_blocks_breached_symbol() {
        // 0.1% daily loss tolerance: a single 10,000 buy breaches it
        let risk = RiskConfig {
            max_daily_loss_percent: dec!(0.001),
            ..Default::default()
        };
        let f = fixture_with(PortfolioConfig::default(), risk).await;
        f.manager.handle_fill(&fill(OrderSide::Buy, dec!(1000), dec!(10.00)));

        let event = Event::timer(TimerType::RiskCheck, 1000, None, Timestamp::now());
        f.manager.handle_event(&event).await.unwrap();

        let status = f
            .manager
            .risk_status(&Symbol::new("000001.SZ").unwrap())
            .unwrap();
        assert!(status.is_blocked);
        assert_eq!(status.block_reason.as_deref(), Some("risk-limit-triggered"));

        // Subsequent signals on the blocked symbol are rejected
        f.manager.handle_signal(&signal(SignalDirection::Buy, dec!(10))).await;
        assert_eq!(f.manager.stats().await.rejected_signals, 1);
        f.bus.stop().await;
    }

    #[tokio::test]
    async fn test_signal_pipeline_via_bus() {
        let f = fixture().await;
        f.bus
            .register(EventType::Signal, f.manager.clone())
            .await
            .unwrap();

        assert!(f.bus.publish(Event::signal(signal(SignalDirection::Buy, dec!(10.00)))));
        let orders = captured_orders(&f).await;
        assert_eq!(orders.len(), 1);
        f.bus.stop().await;
    }
}
