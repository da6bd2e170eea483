//! # LogWriter: structured `tracing` output for runtime events.
//!
//! Emits one record per event under the `corral` target. Failures and
//! delivery problems are `warn`, per-job chatter is `debug`, lifecycle
//! transitions are `info`.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO corral: worker started source="resize" worker=0
//! WARN corral: job failed source="resize" worker=2 job=17 reason="decode error"
//! INFO corral: limiter stopped source="api" period_ms=200 dropped=4
//! INFO corral: shutdown complete
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let source = e.source.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::SubscriberPanicked => {
                warn!(target: "corral", subscriber = source, info = reason, "subscriber panicked");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "corral", subscriber = source, reason, "subscriber overflow");
            }
            EventKind::ShutdownRequested => {
                info!(target: "corral", "shutdown requested");
            }
            EventKind::ShutdownComplete => {
                info!(target: "corral", "shutdown complete");
            }
            EventKind::WorkerStarted => {
                info!(target: "corral", source, worker = ?e.worker, "worker started");
            }
            EventKind::WorkerStopped => {
                info!(target: "corral", source, worker = ?e.worker, processed = ?e.count, "worker stopped");
            }
            EventKind::JobStarted => {
                debug!(target: "corral", source, worker = ?e.worker, job = ?e.job, "job started");
            }
            EventKind::JobCompleted => {
                debug!(target: "corral", source, worker = ?e.worker, job = ?e.job, "job completed");
            }
            EventKind::JobFailed => {
                warn!(target: "corral", source, worker = ?e.worker, job = ?e.job, reason, "job failed");
            }
            EventKind::PoolClosed => {
                info!(target: "corral", source, submitted = ?e.count, "pool closed");
            }
            EventKind::LimiterStopped => {
                info!(target: "corral", source, period_ms = ?e.period_ms, dropped = ?e.count, "limiter stopped");
            }
            EventKind::ActorStarted => {
                info!(target: "corral", source, "actor started");
            }
            EventKind::ActorStopped => {
                info!(target: "corral", source, applied = ?e.count, "actor stopped");
            }
            EventKind::RequestRejected => {
                warn!(target: "corral", source, rejected = ?e.count, "requests rejected after stop");
            }
            EventKind::TickerStopped => {
                info!(target: "corral", source, period_ms = ?e.period_ms, ticks = ?e.count, "ticker stopped");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
