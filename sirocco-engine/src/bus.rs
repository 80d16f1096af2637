//! The event bus: publish, dispatch, subscribe.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use sirocco_core::event::{Event, EventType};

use crate::handler::EventHandler;
use crate::queue::{MainQueue, OfferOutcome};
use crate::stats::{EngineStats, SubscriberStats};
use crate::EngineError;

/// Poll timeout of the dispatcher's blocking wait, so shutdown is
/// observed promptly.
const DISPATCH_POLL: Duration = Duration::from_millis(100);

/// Identifier of one registered subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the numeric id.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

/// Bus construction parameters.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Main queue capacity
    pub queue_capacity: usize,
    /// Per-subscriber inbox capacity
    pub inbox_capacity: usize,
    /// Wall-clock threshold beyond which a handler invocation is logged
    /// as slow
    pub slow_handler_threshold: Duration,
    /// Deadline for joining workers during shutdown
    pub shutdown_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
            inbox_capacity: 1_000,
            slow_handler_threshold: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl BusConfig {
    /// Creates a config with the given main queue capacity and the
    /// conventional `capacity / 10` inbox size.
    #[must_use]
    pub fn with_capacity(queue_capacity: usize) -> Self {
        Self {
            queue_capacity,
            inbox_capacity: (queue_capacity / 10).max(1),
            ..Default::default()
        }
    }
}

struct Subscriber {
    name: String,
    event_type: EventType,
    /// Taken on teardown so the worker's receive loop drains and ends.
    tx: Mutex<Option<mpsc::Sender<Arc<Event>>>>,
    inbox_capacity: usize,
    handler: Arc<dyn EventHandler>,
    active: AtomicBool,
    processed: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Subscriber {
    fn inbox_size(&self) -> usize {
        self.tx
            .lock()
            .as_ref()
            .map_or(0, |tx| self.inbox_capacity - tx.capacity())
    }

    fn stats(&self) -> SubscriberStats {
        SubscriberStats {
            name: self.name.clone(),
            event_type: self.event_type,
            inbox_size: self.inbox_size(),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
        }
    }
}

struct BusInner {
    config: BusConfig,
    queue: Mutex<MainQueue>,
    notify: Notify,
    running: AtomicBool,
    next_subscription: AtomicU64,
    subscribers: DashMap<EventType, Vec<Arc<Subscriber>>>,
    published: AtomicU64,
    dispatched: AtomicU64,
    dropped: AtomicU64,
}

/// The event bus.
///
/// Cheap to clone; all clones share the same queue, dispatcher, and
/// subscriber registry.
///
/// # Example
///
/// ```ignore
/// let bus = EventBus::new(BusConfig::default());
/// bus.start();
/// bus.register(EventType::Market, handler).await?;
/// bus.publish(Event::market(bar));
/// let stats = bus.stop().await;
/// ```
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
    dispatcher: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl EventBus {
    /// Creates a stopped bus.
    #[must_use]
    pub fn new(config: BusConfig) -> Self {
        let queue = MainQueue::new(config.queue_capacity);
        Self {
            inner: Arc::new(BusInner {
                config,
                queue: Mutex::new(queue),
                notify: Notify::new(),
                running: AtomicBool::new(false),
                next_subscription: AtomicU64::new(1),
                subscribers: DashMap::new(),
                published: AtomicU64::new(0),
                dispatched: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
            dispatcher: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns true while the dispatcher is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Starts the dispatcher. Idempotent.
    pub fn start(&self) {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            dispatch_loop(inner).await;
        });
        *self.dispatcher.lock() = Some(handle);
        info!(
            capacity = self.inner.config.queue_capacity,
            "event bus started"
        );
    }

    /// Publishes an event that may be absent; `None` is counted as a
    /// failed publish.
    pub fn publish_opt(&self, event: Option<Event>) -> bool {
        match event {
            Some(event) => self.publish(event),
            None => {
                warn!("null event ignored");
                false
            }
        }
    }

    /// Publishes an event onto the main queue. Never blocks.
    ///
    /// Returns `false` (and drops the event) when the bus is not running
    /// or the low-priority back-pressure rule sheds it.
    pub fn publish(&self, event: Event) -> bool {
        if !self.is_running() {
            warn!(event = %event, "bus not running, event dropped");
            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let event = Arc::new(event);
        let outcome = self.inner.queue.lock().offer(Arc::clone(&event));
        match outcome {
            OfferOutcome::Accepted => {
                self.inner.published.fetch_add(1, Ordering::Relaxed);
                self.inner.notify.notify_one();
                true
            }
            OfferOutcome::Shed => {
                warn!(event = %event, "main queue near capacity, low-priority event dropped");
                self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Registers a handler for one event type.
    ///
    /// Calls `handler.initialize()` first; on failure the subscription is
    /// abandoned. Otherwise a dedicated worker task is spawned over a
    /// bounded inbox of `inbox_capacity` events.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::HandlerInitFailed` if initialization fails.
    pub async fn register(
        &self,
        event_type: EventType,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionId, EngineError> {
        if let Err(e) = handler.initialize().await {
            return Err(EngineError::HandlerInitFailed {
                name: handler.name().to_string(),
                reason: e.to_string(),
            });
        }

        let id = self.inner.next_subscription.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel::<Arc<Event>>(self.inner.config.inbox_capacity);
        let subscriber = Arc::new(Subscriber {
            name: handler.name().to_string(),
            event_type,
            tx: Mutex::new(Some(tx)),
            inbox_capacity: self.inner.config.inbox_capacity,
            handler,
            active: AtomicBool::new(true),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            worker: Mutex::new(None),
        });

        let worker = tokio::spawn(worker_loop(
            Arc::clone(&subscriber),
            rx,
            self.inner.config.slow_handler_threshold,
        ));
        *subscriber.worker.lock() = Some(worker);

        self.inner
            .subscribers
            .entry(event_type)
            .or_default()
            .push(Arc::clone(&subscriber));

        info!(
            handler = %subscriber.name,
            event_type = %event_type,
            "handler registered"
        );
        Ok(SubscriptionId(id))
    }

    /// Unregisters the named handler from one event type: stops its
    /// worker, drains the remaining inbox best-effort, and calls
    /// `destroy()`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SubscriberNotFound` if no such registration
    /// exists.
    pub async fn unregister(&self, event_type: EventType, name: &str) -> Result<(), EngineError> {
        let subscriber = {
            let mut entry = self.inner.subscribers.entry(event_type).or_default();
            match entry.iter().position(|s| s.name == name) {
                Some(index) => entry.remove(index),
                None => {
                    return Err(EngineError::SubscriberNotFound {
                        name: name.to_string(),
                        event_type,
                    });
                }
            }
        };

        self.teardown_subscriber(&subscriber).await;
        info!(handler = %name, event_type = %event_type, "handler unregistered");
        Ok(())
    }

    /// Stops the dispatcher and all workers, joining each with the
    /// shutdown deadline, and returns the final statistics.
    ///
    /// Idempotent: stopping a stopped bus just returns statistics.
    pub async fn stop(&self) -> EngineStats {
        if self
            .inner
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            info!("stopping event bus");
            self.inner.notify.notify_one();

            let dispatcher = self.dispatcher.lock().take();
            if let Some(handle) = dispatcher {
                if tokio::time::timeout(self.inner.config.shutdown_timeout, handle)
                    .await
                    .is_err()
                {
                    warn!("dispatcher did not stop within the shutdown deadline");
                }
            }

            let subscribers: Vec<Arc<Subscriber>> = self
                .inner
                .subscribers
                .iter()
                .flat_map(|entry| entry.value().clone())
                .collect();
            for subscriber in subscribers {
                self.teardown_subscriber(&subscriber).await;
            }

            let stats = self.stats();
            // Subscriptions do not survive a stop; a restarted bus begins
            // with a clean registry.
            self.inner.subscribers.clear();
            info!(
                published = stats.published,
                dispatched = stats.dispatched,
                dropped = stats.dropped,
                "event bus stopped"
            );
            return stats;
        }

        self.stats()
    }

    async fn teardown_subscriber(&self, subscriber: &Subscriber) {
        subscriber.active.store(false, Ordering::Release);
        // Dropping the sender lets the worker drain buffered events and
        // end its receive loop.
        subscriber.tx.lock().take();

        let worker = subscriber.worker.lock().take();
        if let Some(handle) = worker {
            if tokio::time::timeout(self.inner.config.shutdown_timeout, handle)
                .await
                .is_err()
            {
                warn!(
                    handler = %subscriber.name,
                    "worker did not drain within the shutdown deadline, abandoned"
                );
            }
        }

        if let Err(e) = subscriber.handler.destroy().await {
            warn!(handler = %subscriber.name, error = %e, "handler destroy failed");
        }
    }

    /// Returns a point-in-time statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let subscribers = self
            .inner
            .subscribers
            .iter()
            .flat_map(|entry| entry.value().iter().map(|s| s.stats()).collect::<Vec<_>>())
            .collect();
        EngineStats {
            running: self.is_running(),
            queue_size: self.inner.queue.lock().len(),
            published: self.inner.published.load(Ordering::Relaxed),
            dispatched: self.inner.dispatched.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
            subscribers,
        }
    }

    /// Resets the published/dispatched/dropped counters and every
    /// subscriber's counters. Resetting is always explicit; counters
    /// otherwise accumulate across start/stop cycles.
    pub fn reset_stats(&self) {
        self.inner.published.store(0, Ordering::Relaxed);
        self.inner.dispatched.store(0, Ordering::Relaxed);
        self.inner.dropped.store(0, Ordering::Relaxed);
        for entry in self.inner.subscribers.iter() {
            for subscriber in entry.value() {
                subscriber.processed.store(0, Ordering::Relaxed);
                subscriber.failed.store(0, Ordering::Relaxed);
                subscriber.dropped.store(0, Ordering::Relaxed);
            }
        }
    }
}

async fn dispatch_loop(inner: Arc<BusInner>) {
    debug!("dispatcher started");
    while inner.running.load(Ordering::Acquire) {
        let event = inner.queue.lock().pop();
        let Some(event) = event else {
            let _ = tokio::time::timeout(DISPATCH_POLL, inner.notify.notified()).await;
            continue;
        };

        dispatch_one(&inner, &event);
        inner.dispatched.fetch_add(1, Ordering::Relaxed);
        // Yield between events so subscriber workers are never starved
        // by a long dispatch burst.
        tokio::task::yield_now().await;
    }
    debug!("dispatcher stopped");
}

fn dispatch_one(inner: &BusInner, event: &Arc<Event>) {
    let event_type = event.event_type();
    let Some(subscribers) = inner.subscribers.get(&event_type) else {
        debug!(event_type = %event_type, "no subscribers for event type");
        return;
    };
    if subscribers.is_empty() {
        debug!(event_type = %event_type, "no subscribers for event type");
        return;
    }

    for subscriber in subscribers.iter() {
        if !subscriber.active.load(Ordering::Acquire) {
            continue;
        }
        let send_result = subscriber
            .tx
            .lock()
            .as_ref()
            .map(|tx| tx.try_send(Arc::clone(event)));
        match send_result {
            Some(Ok(())) | None => {}
            Some(Err(mpsc::error::TrySendError::Full(_))) => {
                warn!(
                    handler = %subscriber.name,
                    event = %event,
                    "subscriber inbox full, event dropped for this subscriber"
                );
                subscriber.dropped.fetch_add(1, Ordering::Relaxed);
                inner.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Some(Err(mpsc::error::TrySendError::Closed(_))) => {
                debug!(handler = %subscriber.name, "subscriber inbox closed");
            }
        }
    }
}

async fn worker_loop(
    subscriber: Arc<Subscriber>,
    mut rx: mpsc::Receiver<Arc<Event>>,
    slow_threshold: Duration,
) {
    debug!(handler = %subscriber.name, "worker started");
    while let Some(event) = rx.recv().await {
        let start = Instant::now();
        match subscriber.handler.handle_event(&event).await {
            Ok(()) => {
                subscriber.processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                subscriber.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    handler = %subscriber.name,
                    event = %event,
                    error = %e,
                    "handler failed"
                );
            }
        }
        let elapsed = start.elapsed();
        if elapsed > slow_threshold {
            warn!(
                handler = %subscriber.name,
                event = %event,
                elapsed_ms = elapsed.as_millis() as u64,
                "slow handler"
            );
        }
    }
    debug!(handler = %subscriber.name, "worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerResult;
    use async_trait::async_trait;
    use sirocco_core::event::EventPayload;
    use sirocco_core::types::Timestamp;
    use std::sync::atomic::AtomicUsize;

    struct CountingHandler {
        name: String,
        seen: Mutex<Vec<String>>,
        count: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl CountingHandler {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                seen: Mutex::new(Vec::new()),
                count: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: false,
            })
        }

        fn slow(name: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                seen: Mutex::new(Vec::new()),
                count: AtomicUsize::new(0),
                delay,
                fail: false,
            })
        }

        fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                seen: Mutex::new(Vec::new()),
                count: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: true,
            })
        }
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        fn name(&self) -> &str {
            &self.name
        }

        async fn handle_event(&self, event: &Event) -> HandlerResult {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if let EventPayload::System { message } = &event.payload {
                self.seen.lock().push(message.clone());
            }
            self.count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err("synthetic failure".into());
            }
            Ok(())
        }
    }

    struct FailingInit;

    #[async_trait]
    impl EventHandler for FailingInit {
        fn name(&self) -> &str {
            "failing-init"
        }

        async fn initialize(&self) -> HandlerResult {
            Err("init refused".into())
        }

        async fn handle_event(&self, _event: &Event) -> HandlerResult {
            Ok(())
        }
    }

    fn system_event(message: &str, priority: u8) -> Event {
        Event::with_priority(
            Timestamp::new_unchecked(1000),
            EventPayload::System {
                message: message.to_string(),
            },
            priority,
        )
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached within deadline");
    }

    #[tokio::test]
    async fn test_publish_when_not_running_returns_false() {
        let bus = EventBus::new(BusConfig::default());
        assert!(!bus.publish(system_event("e", 5)));
        assert_eq!(bus.stats().dropped, 1);
    }

    #[tokio::test]
    async fn test_publish_none_returns_false() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        assert!(!bus.publish_opt(None));
        bus.stop().await;
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        bus.start();
        assert!(bus.is_running());
        bus.stop().await;
        assert!(!bus.is_running());
    }

    #[tokio::test]
    async fn test_delivery_to_subscriber() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        let handler = CountingHandler::new("counter");
        bus.register(EventType::System, handler.clone())
            .await
            .unwrap();

        for i in 0..5 {
            assert!(bus.publish(system_event(&format!("e{i}"), 5)));
        }

        wait_for(|| handler.count.load(Ordering::SeqCst) == 5).await;
        // Equal priority: delivered in publish order
        assert_eq!(
            *handler.seen.lock(),
            vec!["e0", "e1", "e2", "e3", "e4"]
        );
        bus.stop().await;
    }

    #[tokio::test]
    async fn test_failing_handler_counted_not_fatal() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        let handler = CountingHandler::failing("bad");
        bus.register(EventType::System, handler.clone())
            .await
            .unwrap();

        bus.publish(system_event("a", 5));
        bus.publish(system_event("b", 5));

        wait_for(|| handler.count.load(Ordering::SeqCst) == 2).await;
        let stats = bus.stop().await;
        let sub = &stats.subscribers[0];
        assert_eq!(sub.failed, 2);
        assert_eq!(sub.processed, 0);
    }

    #[tokio::test]
    async fn test_failing_initialize_abandons_registration() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        let result = bus.register(EventType::System, Arc::new(FailingInit)).await;
        assert!(matches!(
            result,
            Err(EngineError::HandlerInitFailed { .. })
        ));
        assert!(bus.stats().subscribers.is_empty());
        bus.stop().await;
    }

    #[tokio::test]
    async fn test_handler_isolation_slow_subscriber() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        let slow = CountingHandler::slow("slow", Duration::from_millis(200));
        let fast = CountingHandler::new("fast");
        bus.register(EventType::System, slow.clone()).await.unwrap();
        bus.register(EventType::System, fast.clone()).await.unwrap();

        for i in 0..10 {
            bus.publish(system_event(&format!("e{i}"), 5));
        }

        // The fast subscriber finishes all ten while the slow one is
        // still working through its first few.
        wait_for(|| fast.count.load(Ordering::SeqCst) == 10).await;
        assert!(slow.count.load(Ordering::SeqCst) < 10);
        bus.stop().await;
    }

    #[tokio::test]
    async fn test_inbox_saturation_drops_only_that_subscriber() {
        let config = BusConfig {
            queue_capacity: 1000,
            inbox_capacity: 2,
            ..Default::default()
        };
        let bus = EventBus::new(config);
        bus.start();
        let slow = CountingHandler::slow("slow", Duration::from_millis(500));
        let fast = CountingHandler::new("fast");
        bus.register(EventType::System, slow.clone()).await.unwrap();
        bus.register(EventType::System, fast.clone()).await.unwrap();

        for i in 0..20 {
            bus.publish(system_event(&format!("e{i}"), 5));
        }

        wait_for(|| fast.count.load(Ordering::SeqCst) == 20).await;
        let stats = bus.stats();
        let slow_stats = stats
            .subscribers
            .iter()
            .find(|s| s.name == "slow")
            .unwrap();
        let fast_stats = stats
            .subscribers
            .iter()
            .find(|s| s.name == "fast")
            .unwrap();
        assert!(slow_stats.dropped > 0);
        assert_eq!(fast_stats.dropped, 0);
        bus.stop().await;
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        let handler = CountingHandler::new("ephemeral");
        bus.register(EventType::System, handler.clone())
            .await
            .unwrap();
        bus.publish(system_event("before", 5));
        wait_for(|| handler.count.load(Ordering::SeqCst) == 1).await;

        bus.unregister(EventType::System, "ephemeral").await.unwrap();
        assert!(bus.stats().subscribers.is_empty());

        bus.publish(system_event("after", 5));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handler.count.load(Ordering::SeqCst), 1);
        bus.stop().await;
    }

    #[tokio::test]
    async fn test_unregister_unknown_fails() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        let result = bus.unregister(EventType::System, "ghost").await;
        assert!(matches!(
            result,
            Err(EngineError::SubscriberNotFound { .. })
        ));
        bus.stop().await;
    }

    #[tokio::test]
    async fn test_no_handler_invoked_after_stop() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        let handler = CountingHandler::new("counter");
        bus.register(EventType::System, handler.clone())
            .await
            .unwrap();
        bus.publish(system_event("e", 5));
        wait_for(|| handler.count.load(Ordering::SeqCst) == 1).await;
        bus.stop().await;

        assert!(!bus.publish(system_event("late", 5)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handler.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_restart_accumulates_statistics() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        bus.publish(system_event("a", 5));
        bus.stop().await;

        bus.start();
        bus.publish(system_event("b", 5));
        let stats = bus.stop().await;
        assert_eq!(stats.published, 2);

        bus.reset_stats();
        assert_eq!(bus.stats().published, 0);
    }

    #[tokio::test]
    async fn test_priority_dispatch_order_under_contention() {
        // A single slow-ish subscriber lets the queue accumulate, so
        // later urgent events overtake earlier low-priority ones.
        let bus = EventBus::new(BusConfig::default());
        let handler = CountingHandler::slow("ordered", Duration::from_millis(30));
        bus.start();
        bus.register(EventType::System, handler.clone())
            .await
            .unwrap();

        // First event occupies the worker while the rest queue up.
        bus.publish(system_event("warmup", 5));
        tokio::time::sleep(Duration::from_millis(5)).await;
        bus.publish(system_event("low", 9));
        bus.publish(system_event("high", 1));
        bus.publish(system_event("mid", 5));

        wait_for(|| handler.count.load(Ordering::SeqCst) == 4).await;
        let seen = handler.seen.lock().clone();
        let rest = &seen[1..];
        assert_eq!(rest, ["high", "mid", "low"]);
        bus.stop().await;
    }
}
