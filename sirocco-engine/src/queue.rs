//! Main priority queue with FIFO tie-breaking and load shedding.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use sirocco_core::event::Event;

/// Priority above which events are shed when the queue saturates.
const LOW_PRIORITY_THRESHOLD: u8 = 5;

/// Queue fill fraction (percent) at which low-priority shedding begins.
const SHED_FILL_PERCENT: usize = 90;

/// One queued event: min-ordered by priority, FIFO within equal priority
/// via the publish sequence number.
struct QueuedEvent {
    priority: u8,
    seq: u64,
    event: Arc<Event>,
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse both keys so the smallest
        // (priority, seq) pair surfaces first.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Outcome of offering an event to the main queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OfferOutcome {
    /// Event was enqueued
    Accepted,
    /// Event was shed by the low-priority back-pressure rule
    Shed,
}

/// The main priority queue. Not thread-safe by itself; the bus guards it
/// with a mutex so `publish` stays a short non-blocking insert.
pub(crate) struct MainQueue {
    heap: BinaryHeap<QueuedEvent>,
    capacity: usize,
    next_seq: u64,
}

impl MainQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity.min(4096)),
            capacity,
            next_seq: 0,
        }
    }

    /// Offers an event. Events with priority above 5 are shed once the
    /// queue is at or beyond 90% of capacity; urgent events always fit.
    pub(crate) fn offer(&mut self, event: Arc<Event>) -> OfferOutcome {
        let shed_watermark = self.capacity * SHED_FILL_PERCENT / 100;
        if self.heap.len() >= shed_watermark && event.priority > LOW_PRIORITY_THRESHOLD {
            return OfferOutcome::Shed;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedEvent {
            priority: event.priority,
            seq,
            event,
        });
        OfferOutcome::Accepted
    }

    /// Pops the most urgent event, FIFO within equal priority.
    pub(crate) fn pop(&mut self) -> Option<Arc<Event>> {
        self.heap.pop().map(|q| q.event)
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}
