//! # Metrics: in-memory event counters.
//!
//! Counts every event by [`EventKind`] and accumulates the counters some
//! kinds carry (permits dropped, ticks emitted, requests rejected).
//!
//! ```text
//! on_event(ev):
//!   ├─ by_kind[ev.kind] += 1
//!   ├─ LimiterStopped  => permits_dropped  += ev.count
//!   ├─ TickerStopped   => ticks_emitted    += ev.count
//!   └─ RequestRejected => requests_rejected += ev.count
//!
//! snapshot() -> MetricsSnapshot (point-in-time copy)
//! ```
//!
//! Share one instance between the coordinator and the code that reads it:
//! ```rust
//! use std::sync::Arc;
//! use corral::{Config, Coordinator, Metrics, Subscribe};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let metrics = Arc::new(Metrics::new());
//! let coord = Coordinator::builder(Config::default())
//!     .with_subscribers(vec![metrics.clone() as Arc<dyn Subscribe>])
//!     .build();
//! coord.shutdown().await.unwrap();
//! assert_eq!(metrics.snapshot().shutdowns, 1);
//! # }
//! ```

use async_trait::async_trait;

use crate::config::clamp_capacity;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use crate::sync::OpCounter;

const KINDS: usize = EventKind::ALL.len();

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Jobs that produced an `Ok` outcome.
    pub jobs_completed: u64,
    /// Jobs that failed or panicked.
    pub jobs_failed: u64,
    /// Workers started across all pools.
    pub workers_started: u64,
    /// Workers that exited after their pool drained.
    pub workers_stopped: u64,
    /// Refills discarded by stopped limiters.
    pub permits_dropped: u64,
    /// Ticks emitted by stopped tickers.
    pub ticks_emitted: u64,
    /// Requests rejected by stopped actors.
    pub requests_rejected: u64,
    /// Events some subscriber had to drop.
    pub subscriber_overflows: u64,
    /// Subscriber panics caught by the fan-out.
    pub subscriber_panics: u64,
    /// Completed coordinator shutdowns.
    pub shutdowns: u64,
}

/// Event-counting subscriber.
pub struct Metrics {
    by_kind: [OpCounter; KINDS],
    permits_dropped: OpCounter,
    ticks_emitted: OpCounter,
    requests_rejected: OpCounter,
    capacity: usize,
}

impl Metrics {
    /// Creates a [`Metrics`] subscriber with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_kind: [const { OpCounter::new() }; KINDS],
            permits_dropped: OpCounter::new(),
            ticks_emitted: OpCounter::new(),
            requests_rejected: OpCounter::new(),
            capacity: 4096,
        }
    }

    /// Configure the queue capacity for this subscriber.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = clamp_capacity(capacity);
        self
    }

    /// Returns how many events of `kind` were observed.
    pub fn count(&self, kind: EventKind) -> u64 {
        self.by_kind[kind as usize].get()
    }

    /// Returns a point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_completed: self.count(EventKind::JobCompleted),
            jobs_failed: self.count(EventKind::JobFailed),
            workers_started: self.count(EventKind::WorkerStarted),
            workers_stopped: self.count(EventKind::WorkerStopped),
            permits_dropped: self.permits_dropped.get(),
            ticks_emitted: self.ticks_emitted.get(),
            requests_rejected: self.requests_rejected.get(),
            subscriber_overflows: self.count(EventKind::SubscriberOverflow),
            subscriber_panics: self.count(EventKind::SubscriberPanicked),
            shutdowns: self.count(EventKind::ShutdownComplete),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscribe for Metrics {
    async fn on_event(&self, ev: &Event) {
        self.by_kind[ev.kind as usize].incr();

        let n = ev.count.unwrap_or(0);
        match ev.kind {
            EventKind::LimiterStopped => self.permits_dropped.add(n),
            EventKind::TickerStopped => self.ticks_emitted.add(n),
            EventKind::RequestRejected => self.requests_rejected.add(n),
            _ => 0,
        };
    }

    fn name(&self) -> &'static str {
        "metrics"
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}
