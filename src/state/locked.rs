//! # LockedStore: the mutual-exclusion alternative to [`StateActor`](crate::StateActor).
//!
//! Same [`StateStore`] contract, implemented as a `HashMap` behind a
//! `tokio::sync::RwLock`. Reads share the lock, writes take it exclusively;
//! a write returns only after the guard is released, so later reads observe it.
//!
//! Prefer the actor when the state must be combined with other channels or
//! several locks would otherwise be juggled; prefer this when message-passing
//! overhead matters.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{error::StateError, state::actor::ActorStats, state::store::StateStore, sync::OpCounter};

/// Lock-guarded key/value map with the same visibility guarantees as the actor.
pub struct LockedStore<K, V> {
    map: Arc<RwLock<HashMap<K, V>>>,
    reads: Arc<OpCounter>,
    writes: Arc<OpCounter>,
}

impl<K, V> Clone for LockedStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: Arc::clone(&self.map),
            reads: Arc::clone(&self.reads),
            writes: Arc::clone(&self.writes),
        }
    }
}

impl<K, V> Default for LockedStore<K, V> {
    fn default() -> Self {
        Self {
            map: Arc::new(RwLock::new(HashMap::new())),
            reads: Arc::new(OpCounter::new()),
            writes: Arc::new(OpCounter::new()),
        }
    }
}

impl<K, V> LockedStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Default,
{
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, or `V::default()` if absent.
    pub async fn read(&self, key: &K) -> V {
        let v = self.map.read().await.get(key).cloned().unwrap_or_default();
        self.reads.incr();
        v
    }

    /// Stores `value` under `key`.
    pub async fn write(&self, key: K, value: V) {
        self.map.write().await.insert(key, value);
        self.writes.incr();
    }

    /// Removes `key`, returning the previous value if there was one.
    pub async fn remove(&self, key: &K) -> Option<V> {
        let prev = self.map.write().await.remove(key);
        self.writes.incr();
        prev
    }

    /// Returns a copy of the whole map.
    pub async fn snapshot(&self) -> HashMap<K, V> {
        let snap = self.map.read().await.clone();
        self.reads.incr();
        snap
    }

    /// Returns applied-operation counts.
    pub fn stats(&self) -> ActorStats {
        ActorStats {
            reads: self.reads.get(),
            writes: self.writes.get(),
        }
    }
}

#[async_trait]
impl<K, V> StateStore<K, V> for LockedStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Default + Send + Sync + 'static,
{
    async fn read(&self, key: K) -> Result<V, StateError> {
        Ok(LockedStore::read(self, &key).await)
    }

    async fn write(&self, key: K, value: V) -> Result<(), StateError> {
        LockedStore::write(self, key, value).await;
        Ok(())
    }
}
