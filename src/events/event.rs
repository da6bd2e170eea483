//! # Runtime events emitted by the coordination primitives.
//!
//! The [`EventKind`] enum classifies events into groups:
//! - **Subscriber events**: delivery problems inside the fan-out layer
//! - **Coordinator events**: shutdown flow
//! - **Pool events**: worker and job lifecycle
//! - **Component events**: limiter, actor and ticker lifecycle
//!
//! The [`Event`] struct carries metadata such as timestamps, the emitting
//! component, worker and job ids, and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use corral::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::JobFailed)
//!     .with_source("resize-pool")
//!     .with_worker(2)
//!     .with_job(17)
//!     .with_reason("decode error");
//!
//! assert_eq!(ev.kind, EventKind::JobFailed);
//! assert_eq!(ev.source.as_deref(), Some("resize-pool"));
//! assert_eq!(ev.job, Some(17));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Coordinator events ===
    /// [`Coordinator::shutdown`](crate::Coordinator::shutdown) was called.
    ShutdownRequested,

    /// Every component owned by the coordinator was told to stop.
    ShutdownComplete,

    // === Pool events ===
    /// Worker task started and is waiting for jobs.
    ///
    /// Sets:
    /// - `source`: pool name
    /// - `worker`: worker id (0-based)
    WorkerStarted,

    /// Worker saw the job queue closed and drained, and exited.
    ///
    /// Sets:
    /// - `source`: pool name
    /// - `worker`: worker id
    /// - `count`: number of jobs this worker processed
    WorkerStopped,

    /// Worker claimed a job.
    ///
    /// Sets:
    /// - `source`, `worker`, `job`
    JobStarted,

    /// Job finished successfully and its result was published.
    ///
    /// Sets:
    /// - `source`, `worker`, `job`
    JobCompleted,

    /// Job failed (or panicked); the failure was published as its result.
    ///
    /// Sets:
    /// - `source`, `worker`, `job`
    /// - `reason`: failure message
    JobFailed,

    /// Job queue was closed; no further submissions are accepted.
    ///
    /// Sets:
    /// - `source`: pool name
    /// - `count`: number of jobs submitted before closing
    PoolClosed,

    // === Component events ===
    /// Rate limiter stopped generating permits.
    ///
    /// Sets:
    /// - `source`: limiter name
    /// - `period_ms`: permit interval
    /// - `count`: permits dropped because the buffer was full
    LimiterStopped,

    /// Owned-state actor started its request loop.
    ///
    /// Sets:
    /// - `source`: actor name
    ActorStarted,

    /// Owned-state actor stopped; later requests are rejected.
    ///
    /// Sets:
    /// - `source`: actor name
    /// - `count`: requests applied over the actor's lifetime
    ActorStopped,

    /// Requests still queued when the actor stopped were rejected.
    ///
    /// Sets:
    /// - `source`: actor name
    /// - `count`: number of rejected requests
    RequestRejected,

    /// Ticker stopped emitting ticks.
    ///
    /// Sets:
    /// - `source`: ticker name
    /// - `period_ms`: tick period
    /// - `count`: ticks emitted
    TickerStopped,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 15] = [
        EventKind::SubscriberPanicked,
        EventKind::SubscriberOverflow,
        EventKind::ShutdownRequested,
        EventKind::ShutdownComplete,
        EventKind::WorkerStarted,
        EventKind::WorkerStopped,
        EventKind::JobStarted,
        EventKind::JobCompleted,
        EventKind::JobFailed,
        EventKind::PoolClosed,
        EventKind::LimiterStopped,
        EventKind::ActorStarted,
        EventKind::ActorStopped,
        EventKind::RequestRejected,
        EventKind::TickerStopped,
    ];

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::SubscriberPanicked => "subscriber_panicked",
            EventKind::SubscriberOverflow => "subscriber_overflow",
            EventKind::ShutdownRequested => "shutdown_requested",
            EventKind::ShutdownComplete => "shutdown_complete",
            EventKind::WorkerStarted => "worker_started",
            EventKind::WorkerStopped => "worker_stopped",
            EventKind::JobStarted => "job_started",
            EventKind::JobCompleted => "job_completed",
            EventKind::JobFailed => "job_failed",
            EventKind::PoolClosed => "pool_closed",
            EventKind::LimiterStopped => "limiter_stopped",
            EventKind::ActorStarted => "actor_started",
            EventKind::ActorStopped => "actor_stopped",
            EventKind::RequestRejected => "request_rejected",
            EventKind::TickerStopped => "ticker_stopped",
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the emitting component (pool, limiter, actor, ticker, subscriber).
    pub source: Option<Arc<str>>,
    /// Worker id inside a pool.
    pub worker: Option<usize>,
    /// Job sequence number inside a pool.
    pub job: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Period or interval in milliseconds (compact).
    pub period_ms: Option<u32>,
    /// Kind-specific counter (jobs processed, permits dropped, ticks emitted...).
    pub count: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            worker: None,
            job: None,
            reason: None,
            period_ms: None,
            count: None,
        }
    }

    /// Attaches the emitting component's name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a worker id.
    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Attaches a job sequence number.
    #[inline]
    pub fn with_job(mut self, job: u64) -> Self {
        self.job = Some(job);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a period (stored as milliseconds).
    #[inline]
    pub fn with_period(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.period_ms = Some(ms);
        self
    }

    /// Attaches a counter value.
    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::WorkerStarted);
        let b = Event::new(EventKind::WorkerStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_period_is_saturated() {
        let ev = Event::new(EventKind::TickerStopped).with_period(Duration::from_secs(u64::MAX));
        assert_eq!(ev.period_ms, Some(u32::MAX));
    }

    #[test]
    fn test_all_kinds_are_listed_in_order() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i, "{}", kind.as_label());
        }
    }

    #[test]
    fn test_overflow_helper() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.source.as_deref(), Some("metrics"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=metrics reason=full"));
    }
}
