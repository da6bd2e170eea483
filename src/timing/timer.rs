//! # Timer: one delayed firing, cancellable until it fires.
//!
//! ```text
//!              ┌──── delay elapsed ────► Fired (resolves Some(at))
//! Pending ─────┤
//!              └──── stop() ───────────► Stopped (Fired resolves None)
//! ```
//!
//! Exactly one transition out of `Pending` wins, so [`TimerHandle::stop`]
//! returns `true` only when it actually prevented the firing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::coordinator::Scope;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const STOPPED: u8 = 2;

/// One-shot delayed signal.
pub struct Timer;

impl Timer {
    /// Starts a standalone timer. Must be called inside a tokio runtime.
    pub fn start(delay: Duration) -> (Fired, TimerHandle) {
        Self::start_with(delay, Scope::detached())
    }

    pub(crate) fn start_with(delay: Duration, scope: Scope) -> (Fired, TimerHandle) {
        let Scope { stop, guard, .. } = scope;
        let state = Arc::new(AtomicU8::new(PENDING));
        let (tx, rx) = oneshot::channel();

        let handle = TimerHandle {
            state: Arc::clone(&state),
            stop: stop.clone(),
        };
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    transition(&state, STOPPED);
                }
                _ = tokio::time::sleep(delay) => {
                    if transition(&state, FIRED) {
                        let _ = tx.send(Instant::now());
                    }
                }
            }
            drop(guard);
        });

        (Fired { rx }, handle)
    }
}

fn transition(state: &AtomicU8, to: u8) -> bool {
    state
        .compare_exchange(PENDING, to, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

/// Cancels a [`Timer`] that has not fired yet.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    state: Arc<AtomicU8>,
    stop: CancellationToken,
}

impl TimerHandle {
    /// Prevents the firing.
    ///
    /// Returns `true` if the timer was pending and is now stopped; `false` if
    /// it already fired or was already stopped.
    pub fn stop(&self) -> bool {
        let stopped = transition(&self.state, STOPPED);
        if stopped {
            self.stop.cancel();
        }
        stopped
    }

    /// Returns `true` once the timer fired.
    pub fn has_fired(&self) -> bool {
        self.state.load(Ordering::Acquire) == FIRED
    }
}

/// Resolves with the firing instant, or `None` if the timer was stopped.
#[derive(Debug)]
pub struct Fired {
    rx: oneshot::Receiver<Instant>,
}

impl Future for Fired {
    type Output = Option<Instant>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let start = Instant::now();
        let (fired, handle) = Timer::start(Duration::from_secs(2));

        let at = fired.await.expect("fired");
        assert!(at - start >= Duration::from_secs(2));
        assert!(handle.has_fired());
        assert!(!handle.stop(), "stop after firing reports false");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_firing() {
        let (fired, handle) = Timer::start(Duration::from_secs(1));
        assert!(handle.stop());
        assert!(!handle.stop(), "second stop reports false");

        assert_eq!(fired.await, None);
        assert!(!handle.has_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_token_stops_pending_timer() {
        let scope = Scope::detached();
        let token = scope.stop.clone();
        let (fired, handle) = Timer::start_with(Duration::from_secs(1), scope);

        token.cancel();
        assert_eq!(fired.await, None);
        assert!(!handle.stop());
    }
}
