//! # Completion barrier: wait for a group of concurrent units to finish.
//!
//! [`CompletionBarrier`] counts outstanding units of work. `add(n)` registers
//! units, `done()` retires one, and `wait()` suspends until the count is back
//! at zero. Waiting on an idle barrier returns immediately, and every waiter
//! (current or future) is released once the count reaches zero.
//!
//! ## Architecture
//! ```text
//! add(n) ──┐
//! done() ──┼──► watch::Sender<usize>  (updates serialized by the channel)
//!          │            │
//!          │            └──► wait(): subscribe → wait_for(count == 0)
//! guard() ─┘  add(1) + DoneGuard (done() on drop)
//! ```
//!
//! ## Rules
//! - Finish all `add` calls before any `wait` starts observing zero.
//! - Calling `done()` more often than units were added is a caller bug; it
//!   panics at the call site and leaves the count untouched.
//!
//! ## Example
//! ```rust
//! use corral::CompletionBarrier;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let barrier = CompletionBarrier::new();
//! for id in 0..5 {
//!     let guard = barrier.guard();
//!     tokio::spawn(async move {
//!         let _guard = guard;
//!         let _ = id; // work
//!     });
//! }
//! barrier.wait().await;
//! assert_eq!(barrier.count(), 0);
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::watch;

/// Counting barrier that releases waiters when the outstanding count reaches zero.
///
/// Cloning shares the same counter.
#[derive(Clone, Debug)]
pub struct CompletionBarrier {
    count: Arc<watch::Sender<usize>>,
}

impl CompletionBarrier {
    /// Creates an idle barrier (count = 0).
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0usize);
        Self {
            count: Arc::new(tx),
        }
    }

    /// Registers `n` additional outstanding units.
    pub fn add(&self, n: usize) {
        if n == 0 {
            return;
        }
        self.count.send_modify(|c| *c += n);
    }

    /// Retires one outstanding unit.
    ///
    /// # Panics
    /// Panics if the count is already zero (more `done()` calls than added units).
    pub fn done(&self) {
        let retired = self.count.send_if_modified(|c| {
            if *c == 0 {
                return false;
            }
            *c -= 1;
            true
        });
        assert!(
            retired,
            "CompletionBarrier::done called with no outstanding units"
        );
    }

    /// Registers one unit and returns a guard that retires it on drop.
    pub fn guard(&self) -> DoneGuard {
        self.add(1);
        DoneGuard {
            barrier: self.clone(),
        }
    }

    /// Returns the current outstanding count.
    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Suspends until the outstanding count is zero.
    pub async fn wait(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|c| *c == 0).await;
    }
}

impl Default for CompletionBarrier {
    fn default() -> Self {
        Self::new()
    }
}

/// Retires one unit of a [`CompletionBarrier`] when dropped.
#[must_use = "dropping the guard immediately retires the unit"]
#[derive(Debug)]
pub struct DoneGuard {
    barrier: CompletionBarrier,
}

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.barrier.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_on_idle_returns_immediately() {
        let barrier = CompletionBarrier::new();
        tokio::time::timeout(Duration::from_millis(100), barrier.wait())
            .await
            .expect("idle barrier must not block");
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_released_after_all_done() {
        let barrier = CompletionBarrier::new();
        let finished = Arc::new(AtomicUsize::new(0));
        barrier.add(5);

        for i in 0..5u64 {
            let barrier = barrier.clone();
            let finished = finished.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10 * (i + 1))).await;
                finished.fetch_add(1, Ordering::SeqCst);
                barrier.done();
            });
        }

        barrier.wait().await;
        assert_eq!(finished.load(Ordering::SeqCst), 5);
        assert_eq!(barrier.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_released_early() {
        let barrier = CompletionBarrier::new();
        barrier.add(2);
        barrier.done();

        let waiting = tokio::time::timeout(Duration::from_secs(1), barrier.wait()).await;
        assert!(waiting.is_err(), "one unit is still outstanding");

        barrier.done();
        barrier.wait().await;
    }

    #[tokio::test]
    async fn test_all_waiters_released() {
        let barrier = CompletionBarrier::new();
        barrier.add(1);

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let b = barrier.clone();
                tokio::spawn(async move { b.wait().await })
            })
            .collect();

        barrier.done();
        for w in waiters {
            w.await.expect("waiter");
        }
        // Later waiters pass straight through.
        barrier.wait().await;
    }

    #[tokio::test]
    async fn test_guard_retires_on_drop() {
        let barrier = CompletionBarrier::new();
        let guard = barrier.guard();
        assert_eq!(barrier.count(), 1);
        drop(guard);
        assert_eq!(barrier.count(), 0);
    }

    #[test]
    #[should_panic(expected = "no outstanding units")]
    fn test_done_without_add_panics() {
        CompletionBarrier::new().done();
    }
}
