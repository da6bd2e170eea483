//! # Deadline races.
//!
//! A caller waits for whichever comes first: the operation's result or the
//! deadline. Losing the race is a normal outcome ([`Raced::TimedOut`]), not
//! an error, and it never blocks or leaks the operation.
//!
//! ## Completion signals
//! [`signal`] splits a one-shot completion into a [`Completer`] (kept by the
//! operation) and a [`Signal`] (awaited by the caller). The slot holds one
//! value, so completing never waits even when the caller already gave up:
//!
//! ```text
//! operation ──► Completer::complete(v) ──► [slot: 1] ──► Signal ──► race_signal
//!                   │                                                  │
//!                   └─ caller gone? value dropped, returns Err(v)      └─ deadline
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use corral::{Raced, race, spawn_signal, race_signal};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let quick = race(async { 7 }, Duration::from_secs(1)).await;
//! assert_eq!(quick, Raced::Completed(7));
//!
//! let slow = spawn_signal(async {
//!     tokio::time::sleep(Duration::from_secs(2)).await;
//!     "late"
//! });
//! let outcome = race_signal(slow, Duration::from_secs(1)).await;
//! assert!(outcome.is_timed_out());
//! # }
//! ```

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::SignalError;

/// Outcome of racing an operation against a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Raced<T> {
    /// The operation finished first.
    Completed(T),
    /// The deadline elapsed first; carries the deadline that was used.
    TimedOut(Duration),
}

impl<T> Raced<T> {
    /// Returns `true` if the deadline won.
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Raced::TimedOut(_))
    }

    /// Returns the value if the operation won.
    pub fn completed(self) -> Option<T> {
        match self {
            Raced::Completed(v) => Some(v),
            Raced::TimedOut(_) => None,
        }
    }

    /// Splits into `(value, timed_out)`.
    pub fn into_parts(self) -> (Option<T>, bool) {
        match self {
            Raced::Completed(v) => (Some(v), false),
            Raced::TimedOut(_) => (None, true),
        }
    }
}

/// Waits for `op` or `timeout`, whichever comes first.
///
/// `op` is dropped if the deadline wins. A zero timeout still polls `op`
/// once, so an already-complete operation wins.
pub async fn race<F>(op: F, timeout: Duration) -> Raced<F::Output>
where
    F: IntoFuture,
{
    match tokio::time::timeout(timeout, op).await {
        Ok(v) => Raced::Completed(v),
        Err(_elapsed) => Raced::TimedOut(timeout),
    }
}

/// Waits for `signal` or `timeout`, whichever comes first.
///
/// The operation behind the signal keeps running after a timeout; its late
/// completion is discarded without blocking it.
pub async fn race_signal<T>(signal: Signal<T>, timeout: Duration) -> Raced<Result<T, SignalError>> {
    race(signal, timeout).await
}

/// Creates a one-value completion channel.
pub fn signal<T>() -> (Completer<T>, Signal<T>) {
    let (tx, rx) = oneshot::channel();
    (Completer { tx }, Signal { rx })
}

/// Runs `fut` on its own task and returns the signal it completes.
///
/// Must be called inside a tokio runtime.
pub fn spawn_signal<F>(fut: F) -> Signal<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let (done, signal) = signal();
    tokio::spawn(async move {
        let _ = done.complete(fut.await);
    });
    signal
}

/// Sending half of a completion signal.
#[derive(Debug)]
pub struct Completer<T> {
    tx: oneshot::Sender<T>,
}

impl<T> Completer<T> {
    /// Delivers the value. Never waits.
    ///
    /// Returns `Err(value)` if the waiting side is gone (it timed out or was dropped).
    pub fn complete(self, value: T) -> Result<(), T> {
        self.tx.send(value)
    }

    /// Returns `true` if nobody is waiting for the value anymore.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of a completion signal. Resolves once.
#[derive(Debug)]
pub struct Signal<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for Signal<T> {
    type Output = Result<T, SignalError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map_err(|_| SignalError::Dropped)
    }
}
