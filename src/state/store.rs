//! # Read/write contract shared by the owned-state actor and the locked map.
//!
//! Both implementations give the same guarantees:
//! - a read issued after a write's acknowledgment observes that write
//! - a read of a key that was never written returns `V::default()`
//!
//! Callers that only need these guarantees should depend on
//! `Arc<dyn StateStore<K, V>>` and pick the implementation at wiring time.

use async_trait::async_trait;

use crate::error::StateError;

/// Key/value access with read-after-write visibility.
#[async_trait]
pub trait StateStore<K, V>: Send + Sync {
    /// Returns the current value for `key`, or `V::default()` if absent.
    async fn read(&self, key: K) -> Result<V, StateError>;

    /// Stores `value` under `key`; returns once the write is visible to later reads.
    async fn write(&self, key: K, value: V) -> Result<(), StateError>;
}
