//! Event envelope dispatched by the event bus.
//!
//! The pipeline is `MarketEvent → SignalEvent → OrderEvent → FillEvent`,
//! with `TimerEvent` as a cross-cutting periodic trigger and `SystemEvent`
//! for operational notices. Events are immutable once published.

mod timer;

pub use timer::{TimerSpec, TimerType};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::data::{Bar, Fill, Order, OrderAction, Signal};
use crate::types::{Symbol, Timestamp};

/// Default event priority.
pub const DEFAULT_PRIORITY: u8 = 5;

/// Priority reserved for fill events (most urgent).
pub const FILL_PRIORITY: u8 = 1;

/// Priority reserved for order events.
pub const ORDER_PRIORITY: u8 = 2;

/// Event type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Market data update
    Market,
    /// Strategy trading signal
    Signal,
    /// Order action
    Order,
    /// Execution fill
    Fill,
    /// Periodic timer tick
    Timer,
    /// System notice
    System,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Signal => write!(f, "SIGNAL"),
            Self::Order => write!(f, "ORDER"),
            Self::Fill => write!(f, "FILL"),
            Self::Timer => write!(f, "TIMER"),
            Self::System => write!(f, "SYSTEM"),
        }
    }
}

/// Event payload, one variant per event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    /// A new bar for one symbol
    Market {
        /// The bar
        bar: Bar,
    },
    /// A strategy signal
    Signal {
        /// The signal
        signal: Signal,
    },
    /// An order action request or notification
    Order {
        /// The order
        order: Order,
        /// Requested action
        action: OrderAction,
        /// Signal that produced the order
        #[serde(skip_serializing_if = "Option::is_none")]
        related_signal_id: Option<String>,
    },
    /// An execution fill
    Fill {
        /// The fill
        fill: Fill,
    },
    /// A periodic timer tick
    Timer {
        /// Timer category
        timer_type: TimerType,
        /// Recurrence interval in milliseconds
        interval_ms: u64,
        /// Optional payload
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Value>,
    },
    /// A system notice
    System {
        /// Notice text
        message: String,
    },
}

impl EventPayload {
    /// Returns the event type tag of this payload.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Market { .. } => EventType::Market,
            Self::Signal { .. } => EventType::Signal,
            Self::Order { .. } => EventType::Order,
            Self::Fill { .. } => EventType::Fill,
            Self::Timer { .. } => EventType::Timer,
            Self::System { .. } => EventType::System,
        }
    }
}

/// Event - the immutable envelope moved through the bus.
///
/// Priority is an integer in `[1, 10]`; lower is more urgent. Fills are
/// published at priority 1 and orders at 2 so execution feedback overtakes
/// market data under load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID
    pub event_id: String,
    /// Event timestamp
    pub timestamp: Timestamp,
    /// Symbol the event concerns, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    /// Dispatch priority, lower is more urgent
    pub priority: u8,
    /// Payload
    pub payload: EventPayload,
    /// Free-form extension map
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extensions: HashMap<String, serde_json::Value>,
}

impl Event {
    /// Creates an event with an explicit priority, clamped to `[1, 10]`.
    #[must_use]
    pub fn with_priority(timestamp: Timestamp, payload: EventPayload, priority: u8) -> Self {
        let symbol = match &payload {
            EventPayload::Market { bar } => Some(bar.symbol.clone()),
            EventPayload::Signal { signal } => Some(signal.symbol.clone()),
            EventPayload::Order { order, .. } => Some(order.symbol.clone()),
            EventPayload::Fill { fill } => Some(fill.symbol.clone()),
            EventPayload::Timer { .. } | EventPayload::System { .. } => None,
        };
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp,
            symbol,
            priority: priority.clamp(1, 10),
            payload,
            extensions: HashMap::new(),
        }
    }

    /// Creates a market event at the default priority.
    #[must_use]
    pub fn market(bar: Bar) -> Self {
        let timestamp = bar.timestamp;
        Self::with_priority(timestamp, EventPayload::Market { bar }, DEFAULT_PRIORITY)
    }

    /// Creates a signal event, inheriting the signal's priority.
    #[must_use]
    pub fn signal(signal: Signal) -> Self {
        let timestamp = signal.timestamp;
        let priority = signal.priority;
        Self::with_priority(timestamp, EventPayload::Signal { signal }, priority)
    }

    /// Creates an order event at the reserved order priority.
    #[must_use]
    pub fn order(
        order: Order,
        action: OrderAction,
        related_signal_id: Option<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self::with_priority(
            timestamp,
            EventPayload::Order {
                order,
                action,
                related_signal_id,
            },
            ORDER_PRIORITY,
        )
    }

    /// Creates a fill event at the reserved fill priority.
    #[must_use]
    pub fn fill(fill: Fill) -> Self {
        let timestamp = fill.timestamp;
        Self::with_priority(timestamp, EventPayload::Fill { fill }, FILL_PRIORITY)
    }

    /// Creates a timer event; priority derives from the timer type.
    #[must_use]
    pub fn timer(
        timer_type: TimerType,
        interval_ms: u64,
        payload: Option<serde_json::Value>,
        timestamp: Timestamp,
    ) -> Self {
        let priority = timer_type.priority();
        Self::with_priority(
            timestamp,
            EventPayload::Timer {
                timer_type,
                interval_ms,
                payload,
            },
            priority,
        )
    }

    /// Creates a system event at the default priority.
    #[must_use]
    pub fn system(message: impl Into<String>, timestamp: Timestamp) -> Self {
        Self::with_priority(
            timestamp,
            EventPayload::System {
                message: message.into(),
            },
            DEFAULT_PRIORITY,
        )
    }

    /// Returns the event type tag.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    /// Attaches an extension value.
    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    /// Reads an extension value as a string.
    #[must_use]
    pub fn extension_str(&self, key: &str) -> Option<&str> {
        self.extensions.get(key).and_then(|v| v.as_str())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event[{} {} prio={} {}]",
            self.event_type(),
            self.symbol.as_ref().map_or("-", Symbol::as_str),
            self.priority,
            self.event_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FeeSchedule, Frequency, OrderSide, OrderType, SignalDirection};
    use crate::types::{Amount, OrderId, Price, Quantity};
    use rust_decimal_macros::dec;

    fn test_bar() -> Bar {
        Bar::builder()
            .symbol(Symbol::new("000001.SZ").unwrap())
            .timestamp(Timestamp::new(1_704_067_200_000).unwrap())
            .frequency(Frequency::Daily)
            .open(Price::new(dec!(10.00)).unwrap())
            .high(Price::new(dec!(10.10)).unwrap())
            .low(Price::new(dec!(9.95)).unwrap())
            .close(Price::new(dec!(10.00)).unwrap())
            .volume(10_000_000)
            .amount(Amount::new(dec!(100_000_000)).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_market_event_defaults() {
        let event = Event::market(test_bar());
        assert_eq!(event.event_type(), EventType::Market);
        assert_eq!(event.priority, DEFAULT_PRIORITY);
        assert_eq!(event.symbol.as_ref().unwrap().as_str(), "000001.SZ");
    }

    #[test]
    fn test_fill_event_priority_reserved() {
        let fill = Fill::new(
            OrderId::new("ORD-1").unwrap(),
            Symbol::new("000001.SZ").unwrap(),
            OrderSide::Buy,
            Quantity::new(dec!(100)).unwrap(),
            Price::new(dec!(10)).unwrap(),
            Timestamp::new_unchecked(1000),
            None,
            &FeeSchedule::default(),
        );
        let event = Event::fill(fill);
        assert_eq!(event.priority, FILL_PRIORITY);
    }

    #[test]
    fn test_order_event_priority_reserved() {
        let order = crate::data::Order::builder()
            .symbol(Symbol::new("000001.SZ").unwrap())
            .order_type(OrderType::Limit)
            .side(OrderSide::Buy)
            .quantity(Quantity::new(dec!(100)).unwrap())
            .price(Price::new(dec!(10)).unwrap())
            .build()
            .unwrap();
        let event = Event::order(order, OrderAction::New, Some("sig-1".into()), Timestamp::now());
        assert_eq!(event.priority, ORDER_PRIORITY);
        match &event.payload {
            EventPayload::Order {
                action,
                related_signal_id,
                ..
            } => {
                assert_eq!(*action, OrderAction::New);
                assert_eq!(related_signal_id.as_deref(), Some("sig-1"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_signal_event_inherits_signal_priority() {
        let signal = Signal::new(
            "s1",
            Symbol::new("000001.SZ").unwrap(),
            SignalDirection::Buy,
            dec!(0.8),
            Timestamp::new_unchecked(1000),
            Price::new(dec!(10)).unwrap(),
            "test",
        )
        .with_priority(3);
        let event = Event::signal(signal);
        assert_eq!(event.priority, 3);
    }

    #[test]
    fn test_timer_event_priority_by_type() {
        let event = Event::timer(TimerType::RiskCheck, 1000, None, Timestamp::now());
        assert_eq!(event.priority, 4);
        let event = Event::timer(TimerType::Cleanup, 1000, None, Timestamp::now());
        assert_eq!(event.priority, 9);
    }

    #[test]
    fn test_priority_clamped() {
        let event = Event::with_priority(
            Timestamp::now(),
            EventPayload::System {
                message: "m".into(),
            },
            0,
        );
        assert_eq!(event.priority, 1);
        let event = Event::with_priority(
            Timestamp::now(),
            EventPayload::System {
                message: "m".into(),
            },
            200,
        );
        assert_eq!(event.priority, 10);
    }

    #[test]
    fn test_extension_roundtrip() {
        let event = Event::market(test_bar())
            .with_extension("trigger_event_id", serde_json::json!("abc"));
        assert_eq!(event.extension_str("trigger_event_id"), Some("abc"));
        assert_eq!(event.extension_str("missing"), None);
    }

    #[test]
    fn test_event_serde_roundtrip() {
        let event = Event::market(test_bar());
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }
}
