//! Event delivery.
//!
//! Every [`SimEvent`] the simulation produces goes through the
//! [`EventBus`]: registered [`EventSubscriber`]s see it immediately, and
//! it is appended to a bounded buffer that pollers drain at their own
//! pace. When the buffer is full the oldest events are discarded.

use std::collections::VecDeque;
use std::fmt;

use civitas_types::SimEvent;

/// Default number of buffered events.
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

/// Receives every event as it is published.
pub trait EventSubscriber: Send {
    /// Called once per event, in publication order.
    fn on_event(&mut self, event: &SimEvent);
}

impl<F> EventSubscriber for F
where
    F: FnMut(&SimEvent) + Send,
{
    fn on_event(&mut self, event: &SimEvent) {
        self(event);
    }
}

/// Subscriber list plus a pollable buffer.
pub struct EventBus {
    subscribers: Vec<Box<dyn EventSubscriber>>,
    buffer: VecDeque<SimEvent>,
    capacity: usize,
    published: u64,
    discarded: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("buffered", &self.buffer.len())
            .field("capacity", &self.capacity)
            .field("published", &self.published)
            .field("discarded", &self.discarded)
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }
}

impl EventBus {
    /// A bus buffering at most `capacity` events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            buffer: VecDeque::new(),
            capacity: capacity.max(1),
            published: 0,
            discarded: 0,
        }
    }

    /// Register a subscriber.
    pub fn subscribe(&mut self, subscriber: Box<dyn EventSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver one event.
    pub fn publish(&mut self, event: SimEvent) {
        for subscriber in &mut self.subscribers {
            subscriber.on_event(&event);
        }
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
            self.discarded = self.discarded.saturating_add(1);
        }
        self.buffer.push_back(event);
        self.published = self.published.saturating_add(1);
    }

    /// Deliver events in order.
    pub fn publish_all(&mut self, events: impl IntoIterator<Item = SimEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    /// Take every buffered event, oldest first.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        if self.discarded > 0 {
            tracing::warn!(discarded = self.discarded, "event buffer overflowed since last drain");
            self.discarded = 0;
        }
        self.buffer.drain(..).collect()
    }

    /// Number of buffered events.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Events published since creation.
    pub const fn published(&self) -> u64 {
        self.published
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use civitas_types::{CivId, CycleKind};

    use super::*;

    fn cycle(n: u64) -> SimEvent {
        SimEvent::CycleCompleted {
            kind: CycleKind::Economic,
            cycle: n,
        }
    }

    #[test]
    fn subscribers_and_buffer_both_see_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut bus = EventBus::default();
        bus.subscribe(Box::new(move |event: &SimEvent| {
            sink.lock().unwrap().push(event.clone());
        }));

        let civ = CivId::new();
        bus.publish(SimEvent::CivilizationRemoved { civ });
        bus.publish_all([cycle(1), cycle(2)]);

        assert_eq!(seen.lock().unwrap().len(), 3);
        let drained = bus.drain();
        assert_eq!(drained.first(), Some(&SimEvent::CivilizationRemoved { civ }));
        assert_eq!(drained.len(), 3);
        assert_eq!(bus.pending(), 0);
        assert_eq!(bus.published(), 3);
    }

    #[test]
    fn full_buffer_drops_oldest() {
        let mut bus = EventBus::with_capacity(2);
        bus.publish_all([cycle(1), cycle(2), cycle(3)]);
        assert_eq!(bus.drain(), vec![cycle(2), cycle(3)]);
    }
}
