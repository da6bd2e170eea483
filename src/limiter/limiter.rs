//! # RateLimiter: interval-paced admission with a bounded burst.
//!
//! A background refill task adds one permit per `interval` to a permit buffer
//! of capacity `burst`. A refill that finds the buffer full is dropped, so
//! unused permits never accumulate beyond `burst`.
//!
//! ## Architecture
//! ```text
//!              interval tick (MissedTickBehavior::Skip)
//!                        │
//!   refill task ─────────┼──► available < burst ? add_permits(1) : dropped += 1
//!   (single producer)    │
//!                        ▼
//!                Semaphore (permit buffer, capacity = burst)
//!                        │
//!      ┌─────────────────┼──────────────────┐
//!      ▼                 ▼                  ▼
//!   acquire()        acquire()         try_acquire()
//!   (waits)          (waits)           (never waits)
//! ```
//!
//! ## Rules
//! - Only the refill task adds permits, consumers only take them, so the
//!   buffer can never exceed `burst`.
//! - `burst = 1` is strict periodic pacing.
//! - `stop()` ends permit generation. Permits already buffered stay valid;
//!   once they are gone `acquire()` returns [`LimiterError::Stopped`] instead
//!   of waiting forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    config::LimiterConfig,
    coordinator::Scope,
    error::LimiterError,
    events::{Bus, Event, EventKind},
    sync::{DoneGuard, OpCounter},
};

/// Permit accounting for one limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LimiterStats {
    /// Permits handed out by `acquire`/`try_acquire`.
    pub granted: u64,
    /// Refills discarded because the buffer was full.
    pub dropped: u64,
    /// Permits currently buffered.
    pub available: usize,
}

struct Shared {
    name: Arc<str>,
    permits: Semaphore,
    burst: usize,
    interval: Duration,
    granted: OpCounter,
    dropped: OpCounter,
    stop: CancellationToken,
    bus: Bus,
}

/// Interval-paced admission gate.
///
/// Cloning shares the same permit buffer and refill task.
#[derive(Clone)]
pub struct RateLimiter {
    shared: Arc<Shared>,
}

impl RateLimiter {
    /// Starts a standalone limiter with a private bus.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(cfg: LimiterConfig) -> Self {
        Self::start_with(cfg, "limiter", Scope::detached())
    }

    /// Starts a limiter that publishes to the scope's bus and stops with its token.
    pub(crate) fn start_with(cfg: LimiterConfig, name: impl Into<Arc<str>>, scope: Scope) -> Self {
        let Scope { bus, stop, guard } = scope;
        let burst = cfg.burst_clamped();
        let interval = cfg.interval_clamped();
        let initial = if cfg.prefill { burst } else { 0 };

        let shared = Arc::new(Shared {
            name: name.into(),
            permits: Semaphore::new(initial),
            burst,
            interval,
            granted: OpCounter::new(),
            dropped: OpCounter::new(),
            stop,
            bus,
        });

        tokio::spawn(refill(Arc::clone(&shared), guard));
        Self { shared }
    }

    /// Waits for a permit.
    ///
    /// Returns [`LimiterError::Stopped`] only when the limiter was stopped and
    /// no buffered permit is left.
    pub async fn acquire(&self) -> Result<(), LimiterError> {
        let s = &self.shared;
        tokio::select! {
            biased;
            permit = s.permits.acquire() => match permit {
                Ok(permit) => {
                    permit.forget();
                    s.granted.incr();
                    Ok(())
                }
                Err(_closed) => Err(LimiterError::Stopped),
            },
            _ = s.stop.cancelled() => {
                if self.try_acquire() { Ok(()) } else { Err(LimiterError::Stopped) }
            }
        }
    }

    /// Takes a permit if one is buffered; never waits.
    pub fn try_acquire(&self) -> bool {
        match self.shared.permits.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.shared.granted.incr();
                true
            }
            Err(_) => false,
        }
    }

    /// Stops permit generation. Buffered permits remain valid.
    pub fn stop(&self) {
        self.shared.stop.cancel();
    }

    /// Returns `true` once [`stop`](Self::stop) was called (or the owning coordinator shut down).
    pub fn is_stopped(&self) -> bool {
        self.shared.stop.is_cancelled()
    }

    /// Returns the configured permit interval.
    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    /// Returns the configured burst size.
    pub fn burst(&self) -> usize {
        self.shared.burst
    }

    /// Returns a snapshot of permit accounting.
    pub fn stats(&self) -> LimiterStats {
        LimiterStats {
            granted: self.shared.granted.get(),
            dropped: self.shared.dropped.get(),
            available: self.shared.permits.available_permits(),
        }
    }
}

/// Refill loop: one permit per interval until stopped.
async fn refill(s: Arc<Shared>, guard: DoneGuard) {
    let mut ticker = time::interval_at(Instant::now() + s.interval, s.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = s.stop.cancelled() => break,
            _ = ticker.tick() => {
                if s.permits.available_permits() < s.burst {
                    s.permits.add_permits(1);
                } else {
                    s.dropped.incr();
                }
            }
        }
    }

    s.bus.publish(
        Event::new(EventKind::LimiterStopped)
            .with_source(Arc::clone(&s.name))
            .with_period(s.interval)
            .with_count(s.dropped.get()),
    );
    drop(guard);
}
