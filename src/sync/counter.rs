//! # Atomic operation counter.
//!
//! [`OpCounter`] is a process-lifetime counter shared by many concurrent
//! writers: increments are `fetch_add`, reads are `load`. Components use it for
//! accounting (actor reads/writes, limiter grants/drops) without routing every
//! increment through a lock or a channel.
//!
//! ```rust
//! use std::sync::Arc;
//! use corral::OpCounter;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ops = Arc::new(OpCounter::new());
//! let mut handles = Vec::new();
//! for _ in 0..8 {
//!     let ops = ops.clone();
//!     handles.push(tokio::spawn(async move {
//!         for _ in 0..1000 {
//!             ops.incr();
//!         }
//!     }));
//! }
//! for h in handles {
//!     h.await.unwrap();
//! }
//! assert_eq!(ops.get(), 8000);
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter updated with atomic fetch-add.
#[derive(Debug, Default)]
pub struct OpCounter {
    value: AtomicU64,
}

impl OpCounter {
    /// Creates a counter starting at zero.
    pub const fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Adds one and returns the previous value.
    #[inline]
    pub fn incr(&self) -> u64 {
        self.value.fetch_add(1, Ordering::Relaxed)
    }

    /// Adds `n` and returns the previous value.
    #[inline]
    pub fn add(&self, n: u64) -> u64 {
        self.value.fetch_add(n, Ordering::Relaxed)
    }

    /// Returns the current value.
    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_incr_returns_previous() {
        let c = OpCounter::new();
        assert_eq!(c.incr(), 0);
        assert_eq!(c.incr(), 1);
        assert_eq!(c.add(10), 2);
        assert_eq!(c.get(), 12);
    }

    #[test]
    fn test_concurrent_threads() {
        let c = Arc::new(OpCounter::new());
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || {
                    for _ in 0..10_000 {
                        c.incr();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(c.get(), 40_000);
    }
}
