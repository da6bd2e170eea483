//! # Ticker: periodic signals until stopped.
//!
//! A background task emits a [`Tick`] every `period` into a one-slot buffer.
//! A consumer that falls behind loses ticks instead of accumulating them.
//!
//! ## Architecture
//! ```text
//! interval (Skip) ──► try_send(Tick) ──► [slot: 1] ──► Ticks::recv / Stream
//!        │                  │
//!        │                  └─ slot full: tick dropped
//!        └─ StopHandle::stop / coordinator shutdown ──► loop exits, TickerStopped
//! ```
//!
//! ## Rules
//! - The first tick arrives one `period` after start.
//! - After `stop()` at most one more tick (the one already buffered) is received,
//!   then [`Ticks::recv`] returns `None`.
//! - Dropping [`Ticks`] stops the ticker as well.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    config::clamp_period,
    coordinator::Scope,
    events::{Event, EventKind},
};

/// One periodic signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 0-based sequence of emitted ticks. Gaps mean ticks were dropped.
    pub seq: u64,
    /// Scheduled instant of this tick.
    pub at: Instant,
}

/// Periodic tick source.
pub struct Ticker;

impl Ticker {
    /// Starts a standalone ticker.
    ///
    /// `period` is clamped to at least 1ms. Must be called inside a tokio runtime.
    pub fn start(period: Duration) -> (Ticks, StopHandle) {
        Self::start_with(period, "ticker", Scope::detached())
    }

    pub(crate) fn start_with(
        period: Duration,
        name: impl Into<Arc<str>>,
        scope: Scope,
    ) -> (Ticks, StopHandle) {
        let period = clamp_period(period);
        let (tx, rx) = mpsc::channel(1);
        let stop = scope.stop.clone();

        tokio::spawn(run(tx, period, name.into(), scope));
        (Ticks { rx }, StopHandle { stop })
    }
}

async fn run(tx: mpsc::Sender<Tick>, period: Duration, name: Arc<str>, scope: Scope) {
    let Scope { bus, stop, guard } = scope;
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut seq: u64 = 0;
    let mut emitted: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            at = interval.tick() => {
                match tx.try_send(Tick { seq, at }) {
                    Ok(()) => emitted += 1,
                    Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Closed(_)) => break,
                }
                seq += 1;
            }
        }
    }

    drop(tx);
    bus.publish(
        Event::new(EventKind::TickerStopped)
            .with_source(name)
            .with_period(period)
            .with_count(emitted),
    );
    drop(guard);
}

/// Receiving side of a [`Ticker`].
#[derive(Debug)]
pub struct Ticks {
    rx: mpsc::Receiver<Tick>,
}

impl Ticks {
    /// Waits for the next tick. Returns `None` once the ticker stopped and
    /// the buffered tick (if any) was taken.
    pub async fn recv(&mut self) -> Option<Tick> {
        self.rx.recv().await
    }
}

impl Stream for Ticks {
    type Item = Tick;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Tick>> {
        self.rx.poll_recv(cx)
    }
}

/// Stops a [`Ticker`]. Cloneable; stopping is idempotent.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stop: CancellationToken,
}

impl StopHandle {
    /// Stops tick emission.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Returns `true` once the ticker was told to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}
