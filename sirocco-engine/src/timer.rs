//! Periodic timer event producers.
//!
//! Each registered [`TimerSpec`] gets its own task publishing a
//! `TimerEvent` on every tick at the priority derived from its timer
//! type. After firing, a timer rearms itself for the next interval.

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use sirocco_core::event::{Event, TimerSpec};
use sirocco_core::types::Timestamp;

use crate::bus::EventBus;

/// Periodic producer of timer events.
pub struct TimerService {
    bus: EventBus,
    specs: Vec<TimerSpec>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TimerService {
    /// Creates a timer service publishing into the given bus.
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            specs: Vec::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Adds a timer schedule. Takes effect at the next `start`.
    pub fn add(&mut self, spec: TimerSpec) {
        self.specs.push(spec);
    }

    /// Returns the number of registered schedules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns true if no schedules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Spawns one tick task per schedule. Idempotent: calling `start`
    /// while running restarts all tasks.
    pub fn start(&self) {
        self.stop();
        let mut tasks = self.tasks.lock();
        for spec in &self.specs {
            let bus = self.bus.clone();
            let spec = spec.clone();
            tasks.push(tokio::spawn(async move {
                tick_loop(bus, spec).await;
            }));
        }
        info!(timers = self.specs.len(), "timer service started");
    }

    /// Aborts all tick tasks.
    pub fn stop(&self) {
        let mut tasks = self.tasks.lock();
        if tasks.is_empty() {
            return;
        }
        for task in tasks.drain(..) {
            task.abort();
        }
        info!("timer service stopped");
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn tick_loop(bus: EventBus, spec: TimerSpec) {
    let mut interval = tokio::time::interval(spec.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of tokio's interval completes immediately; consume
    // it so the first event fires one full interval after start.
    interval.tick().await;

    loop {
        interval.tick().await;
        let event = Event::timer(
            spec.timer_type,
            spec.interval_ms,
            spec.payload.clone(),
            Timestamp::now(),
        );
        if !bus.publish(event) {
            debug!(timer_type = %spec.timer_type, "timer event not accepted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusConfig;
    use crate::handler::{EventHandler, HandlerResult};
    use async_trait::async_trait;
    use sirocco_core::event::{EventPayload, EventType, TimerType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct TickCounter {
        ticks: AtomicUsize,
        last_type: Mutex<Option<TimerType>>,
    }

    #[async_trait]
    impl EventHandler for TickCounter {
        fn name(&self) -> &str {
            "tick-counter"
        }

        async fn handle_event(&self, event: &Event) -> HandlerResult {
            if let EventPayload::Timer { timer_type, .. } = &event.payload {
                self.ticks.fetch_add(1, Ordering::SeqCst);
                *self.last_type.lock() = Some(*timer_type);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_timer_fires_and_rearms() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        let counter = Arc::new(TickCounter {
            ticks: AtomicUsize::new(0),
            last_type: Mutex::new(None),
        });
        bus.register(EventType::Timer, counter.clone())
            .await
            .unwrap();

        let mut timers = TimerService::new(bus.clone());
        timers.add(TimerSpec::new(TimerType::Heartbeat, 20));
        timers.start();

        tokio::time::sleep(Duration::from_millis(150)).await;
        timers.stop();
        let ticks = counter.ticks.load(Ordering::SeqCst);
        assert!(ticks >= 3, "expected repeated ticks, got {ticks}");
        assert_eq!(*counter.last_type.lock(), Some(TimerType::Heartbeat));
        bus.stop().await;
    }

    #[tokio::test]
    async fn test_stop_halts_ticks() {
        let bus = EventBus::new(BusConfig::default());
        bus.start();
        let counter = Arc::new(TickCounter {
            ticks: AtomicUsize::new(0),
            last_type: Mutex::new(None),
        });
        bus.register(EventType::Timer, counter.clone())
            .await
            .unwrap();

        let mut timers = TimerService::new(bus.clone());
        timers.add(TimerSpec::new(TimerType::Cleanup, 20));
        timers.start();
        tokio::time::sleep(Duration::from_millis(60)).await;
        timers.stop();

        let after_stop = counter.ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(80)).await;
        // A tick already in flight may still land; no new ones after that
        assert!(counter.ticks.load(Ordering::SeqCst) <= after_stop + 1);
        bus.stop().await;
    }

    #[tokio::test]
    async fn test_empty_service() {
        let bus = EventBus::new(BusConfig::default());
        let timers = TimerService::new(bus);
        assert!(timers.is_empty());
        timers.start();
        timers.stop();
    }
}
