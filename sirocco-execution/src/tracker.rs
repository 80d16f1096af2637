//! Shared order bookkeeping for execution handlers.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

use sirocco_core::data::{FeeSchedule, Fill, Order, OrderStatus};
use sirocco_core::event::Event;
use sirocco_core::types::{OrderId, Price, Quantity, Timestamp};
use sirocco_engine::EventBus;

use crate::ExecutionError;

/// Point-in-time execution statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionStats {
    /// Orders accepted for execution
    pub orders_received: u64,
    /// Fills emitted
    pub fills_emitted: u64,
    /// Orders rejected
    pub rejections: u64,
    /// Orders cancelled
    pub cancellations: u64,
    /// Orders expired per their time-in-force
    pub expirations: u64,
    /// Orders currently active
    pub active_orders: usize,
}

/// Order bookkeeping shared by the simulated and live handlers.
///
/// Owns the active-order map and the submit → fill/cancel/reject state
/// transitions; every fill it records is published as a `FillEvent` at
/// the highest priority.
pub struct OrderTracker {
    bus: EventBus,
    fees: FeeSchedule,
    active: DashMap<String, Order>,
    orders_received: AtomicU64,
    fills_emitted: AtomicU64,
    rejections: AtomicU64,
    cancellations: AtomicU64,
    expirations: AtomicU64,
}

impl OrderTracker {
    /// Creates a tracker publishing fills into `bus` with the given fee
    /// schedule.
    #[must_use]
    pub fn new(bus: EventBus, fees: FeeSchedule) -> Self {
        Self {
            bus,
            fees,
            active: DashMap::new(),
            orders_received: AtomicU64::new(0),
            fills_emitted: AtomicU64::new(0),
            rejections: AtomicU64::new(0),
            cancellations: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Validates an incoming order, marks it submitted, and adds it to
    /// the active set.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::InvalidOrder` if validation or the
    /// status transition fails.
    pub fn accept(&self, mut order: Order, now: Timestamp) -> Result<OrderId, ExecutionError> {
        if !order.is_valid() {
            self.rejections.fetch_add(1, Ordering::Relaxed);
            return Err(ExecutionError::InvalidOrder(format!(
                "validation failed: {order}"
            )));
        }
        order
            .submit(now)
            .map_err(|e| ExecutionError::InvalidOrder(e.to_string()))?;

        let order_id = order.order_id.clone();
        self.orders_received.fetch_add(1, Ordering::Relaxed);
        self.active.insert(order_id.as_str().to_string(), order);
        Ok(order_id)
    }

    /// Rejects an active order with a reason; emits no fill.
    pub fn reject(&self, order_id: &OrderId, reason: &str, now: Timestamp) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
        if let Some((_, mut order)) = self.active.remove(order_id.as_str()) {
            if let Err(e) = order.reject(reason, now) {
                warn!(order = %order_id, error = %e, "reject transition failed");
            }
            warn!(order = %order, reason = reason, "order rejected");
        } else {
            warn!(order = %order_id, reason = reason, "reject for unknown order");
        }
    }

    /// Records a fill against an active order and publishes the fill
    /// event. A complete fill removes the order from the active set; a
    /// partial fill keeps it working.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOrder` if the order is not active, or
    /// `InvalidOrder` if the fill exceeds the remaining quantity.
    pub fn record_fill(
        &self,
        order_id: &OrderId,
        quantity: Quantity,
        price: Price,
        now: Timestamp,
        simulated: bool,
    ) -> Result<Fill, ExecutionError> {
        let mut entry = self
            .active
            .get_mut(order_id.as_str())
            .ok_or_else(|| ExecutionError::UnknownOrder(order_id.as_str().to_string()))?;

        entry
            .record_fill(quantity, price, now)
            .map_err(|e| ExecutionError::InvalidOrder(e.to_string()))?;

        let mut fill = Fill::new(
            order_id.clone(),
            entry.symbol.clone(),
            entry.side,
            quantity,
            price,
            now,
            entry.strategy_id.clone(),
            &self.fees,
        );
        if simulated {
            fill = fill.simulated();
        }

        let complete = entry.status == OrderStatus::Filled;
        drop(entry);
        if complete {
            self.active.remove(order_id.as_str());
        }

        self.fills_emitted.fetch_add(1, Ordering::Relaxed);
        info!(fill = %fill, complete = complete, "fill recorded");
        if !self.bus.publish(Event::fill(fill.clone())) {
            warn!(order = %order_id, "fill event not accepted by bus");
        }
        Ok(fill)
    }

    /// Marks a cancellable active order cancelled.
    ///
    /// Returns `false` when the order is unknown or not cancellable.
    pub fn cancel(&self, order_id: &OrderId, now: Timestamp) -> bool {
        let Some(mut entry) = self.active.get_mut(order_id.as_str()) else {
            warn!(order = %order_id, "cancel for unknown order");
            return false;
        };
        if !entry.is_cancellable() {
            warn!(order = %*entry, "order not cancellable");
            return false;
        }
        if let Err(e) = entry.cancel("cancelled by request", now) {
            warn!(order = %order_id, error = %e, "cancel transition failed");
            return false;
        }
        drop(entry);
        self.active.remove(order_id.as_str());
        self.cancellations.fetch_add(1, Ordering::Relaxed);
        info!(order = %order_id, "order cancelled");
        true
    }

    /// Marks an active order expired per its time-in-force.
    ///
    /// Returns `false` when the order is unknown or the transition is
    /// not valid.
    pub fn expire(&self, order_id: &OrderId, now: Timestamp) -> bool {
        let Some(mut entry) = self.active.get_mut(order_id.as_str()) else {
            return false;
        };
        if let Err(e) = entry.update_status(OrderStatus::Expired, now) {
            warn!(order = %order_id, error = %e, "expire transition failed");
            return false;
        }
        drop(entry);
        self.active.remove(order_id.as_str());
        self.expirations.fetch_add(1, Ordering::Relaxed);
        info!(order = %order_id, "order expired");
        true
    }

    /// Returns a clone of an active order.
    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<Order> {
        self.active.get(order_id.as_str()).map(|entry| entry.clone())
    }

    /// Returns the active orders for one symbol.
    #[must_use]
    pub fn active_for_symbol(&self, symbol: &sirocco_core::types::Symbol) -> Vec<Order> {
        self.active
            .iter()
            .filter(|entry| &entry.symbol == symbol)
            .map(|entry| entry.clone())
            .collect()
    }

    /// Returns the ids of all active orders.
    #[must_use]
    pub fn active_order_ids(&self) -> Vec<OrderId> {
        self.active
            .iter()
            .map(|entry| entry.order_id.clone())
            .collect()
    }

    /// Cancels every active order, e.g. during shutdown.
    pub fn cancel_all(&self, now: Timestamp) {
        for order_id in self.active_order_ids() {
            self.cancel(&order_id, now);
        }
    }

    /// Returns a statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> ExecutionStats {
        ExecutionStats {
            orders_received: self.orders_received.load(Ordering::Relaxed),
            fills_emitted: self.fills_emitted.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            active_orders: self.active.len(),
        }
    }
}
