//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Pools, limiters,
//! actors and tickers publish to it; the [`Coordinator`](crate::Coordinator)
//! forwards everything to its [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! Publishers (many):                    Subscriber (one):
//!   WorkerPool ──┐
//!   Limiter    ──┼────► Bus ─────► coordinator listener ────► SubscriberSet
//!   StateActor ──┤  (broadcast chan)
//!   Ticker     ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits.
//! - **Bounded capacity**: one ring buffer is shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if nobody is subscribed at send time, which
//!   is what a standalone component (built without a coordinator) relies on.

use tokio::sync::broadcast;

use super::event::Event;
use crate::config::clamp_capacity;

/// Capacity used by components that are built without a shared bus.
const DETACHED_CAPACITY: usize = 16;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to `1..=MAX_CAPACITY`).
    pub fn new(capacity: usize) -> Self {
        let capacity = clamp_capacity(capacity);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Returns the number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Bus {
    /// A small private bus for components used without a coordinator.
    fn default() -> Self {
        Self::new(DETACHED_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_without_receivers_is_silent() {
        let bus = Bus::new(0);
        assert_eq!(bus.receiver_count(), 0);
        bus.publish(Event::new(EventKind::ShutdownRequested));
    }

    #[tokio::test]
    async fn test_subscriber_sees_later_events_only() {
        let bus = Bus::default();
        bus.publish(Event::new(EventKind::ShutdownRequested));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ShutdownComplete));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::ShutdownComplete);
    }
}
