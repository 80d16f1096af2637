//! Live execution through a broker adapter.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use sirocco_core::clock::Clock;
use sirocco_core::data::{FeeSchedule, Order, OrderAction};
use sirocco_core::event::{Event, EventPayload};
use sirocco_core::types::{OrderId, Price, Quantity};
use sirocco_engine::{EventBus, EventHandler, HandlerResult};

use crate::tracker::{ExecutionStats, OrderTracker};
use crate::ExecutionError;

/// Asynchronous execution report produced by a broker connection.
#[derive(Debug, Clone)]
pub enum ExecutionReport {
    /// A partial or complete fill
    Fill {
        /// Filled order
        order_id: OrderId,
        /// Filled quantity
        quantity: Quantity,
        /// Execution price
        price: Price,
    },
    /// Broker-side rejection
    Rejected {
        /// Rejected order
        order_id: OrderId,
        /// Broker reason
        reason: String,
    },
    /// Broker-side cancellation confirmation
    Cancelled {
        /// Cancelled order
        order_id: OrderId,
    },
}

/// Broker connection seam for live trading.
///
/// Implementations own their transport, authentication, and timeouts.
/// Asynchronous outcomes (partial/complete fills, rejections,
/// cancellations) come back as [`ExecutionReport`]s fed to
/// [`LiveExecutionHandler::on_execution_report`].
#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    /// Submits an order to the broker.
    async fn submit_order(&self, order: &Order) -> Result<(), ExecutionError>;

    /// Requests cancellation. A `false` return means the broker refused;
    /// the order's status is then left unchanged.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<bool, ExecutionError>;
}

/// Live execution handler.
///
/// Shares the bookkeeping rules of the simulated handler through
/// [`OrderTracker`]: accepted orders are tracked as submitted, broker
/// fills flow through the same fill path (fees applied, `FillEvent`
/// published at the highest priority), and a failed broker cancel leaves
/// the order untouched.
pub struct LiveExecutionHandler {
    tracker: OrderTracker,
    adapter: Arc<dyn BrokerAdapter>,
    clock: Arc<dyn Clock>,
}

impl LiveExecutionHandler {
    /// Creates a live handler over a broker adapter.
    #[must_use]
    pub fn new(
        bus: EventBus,
        adapter: Arc<dyn BrokerAdapter>,
        fees: FeeSchedule,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tracker: OrderTracker::new(bus, fees),
            adapter,
            clock,
        }
    }

    /// Validates and submits one order to the broker.
    pub async fn execute_order(&self, order: Order) {
        let now = self.clock.now();
        let order_id = match self.tracker.accept(order, now) {
            Ok(order_id) => order_id,
            Err(e) => {
                warn!(error = %e, "order not accepted");
                return;
            }
        };

        let Some(order) = self.tracker.get(&order_id) else {
            return;
        };
        if let Err(e) = self.adapter.submit_order(&order).await {
            self.tracker.reject(
                &order_id,
                &format!("broker submit failed: {e}"),
                self.clock.now(),
            );
        }
    }

    /// Requests cancellation through the broker. Returns `false` when
    /// the order is unknown, not cancellable, or the broker refuses; a
    /// refused cancel leaves the order status unchanged.
    pub async fn cancel_order(&self, order_id: &OrderId) -> bool {
        let Some(order) = self.tracker.get(order_id) else {
            warn!(order = %order_id, "cancel for unknown order");
            return false;
        };
        if !order.is_cancellable() {
            return false;
        }

        match self.adapter.cancel_order(order_id).await {
            Ok(true) => self.tracker.cancel(order_id, self.clock.now()),
            Ok(false) => {
                info!(order = %order_id, "broker refused cancel");
                false
            }
            Err(e) => {
                warn!(order = %order_id, error = %e, "broker cancel failed");
                false
            }
        }
    }

    /// Applies an asynchronous broker execution report.
    pub fn on_execution_report(&self, report: ExecutionReport) {
        let now = self.clock.now();
        match report {
            ExecutionReport::Fill {
                order_id,
                quantity,
                price,
            } => {
                if let Err(e) = self.tracker.record_fill(&order_id, quantity, price, now, false) {
                    warn!(order = %order_id, error = %e, "broker fill not applied");
                }
            }
            ExecutionReport::Rejected { order_id, reason } => {
                self.tracker.reject(&order_id, &reason, now);
            }
            ExecutionReport::Cancelled { order_id } => {
                self.tracker.cancel(&order_id, now);
            }
        }
    }

    /// Returns execution statistics.
    #[must_use]
    pub fn stats(&self) -> ExecutionStats {
        self.tracker.stats()
    }

    /// Cancels all working orders through the broker.
    pub async fn shutdown(&self) {
        for order_id in self.tracker.active_order_ids() {
            self.cancel_order(&order_id).await;
        }
    }
}

#[async_trait]
impl EventHandler for LiveExecutionHandler {
    fn name(&self) -> &str {
        "live-execution"
    }

    async fn handle_event(&self, event: &Event) -> HandlerResult {
        match &event.payload {
            EventPayload::Order { order, action, .. } => match action {
                OrderAction::New => self.execute_order(order.clone()).await,
                OrderAction::Cancel => {
                    self.cancel_order(&order.order_id).await;
                }
                other => debug!(action = %other, "unsupported order action ignored"),
            },
            other => debug!(payload = ?other.event_type(), "ignoring event type"),
        }
        Ok(())
    }

    async fn destroy(&self) -> HandlerResult {
        self.shutdown().await;
        Ok(())
    }
}
