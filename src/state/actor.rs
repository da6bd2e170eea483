//! # StateActor: single owner of a key/value map.
//!
//! The map lives inside one spawned task. Every other unit talks to it by
//! sending a [`Request`] over the actor's mailbox; each request carries a
//! `oneshot` reply sender that the actor uses exactly once.
//!
//! ## Architecture
//! ```text
//! handle.read(k) ──┐
//! handle.write(k,v)┼──► mpsc mailbox (MPSC, FIFO) ──► actor loop ──► HashMap<K, V>
//! handle.remove(k) ┤                                     │
//! handle.snapshot()┘                                     └──► oneshot reply (once per request)
//! ```
//!
//! ## Rules
//! - Requests are applied one at a time, strictly in mailbox order, for all keys.
//! - A write is acknowledged only after it has been applied, so any read that
//!   starts after the acknowledgment sees it.
//! - Reading an absent key is not an error: it yields `V::default()`.
//! - After shutdown, queued and future requests fail with [`StateError::Closed`];
//!   nothing hangs.
//!
//! ## Shutdown
//! The loop exits when [`StateActor::shutdown`] is called, when the owning
//! coordinator shuts down, or when every handle was dropped. Requests still in
//! the mailbox are rejected (their reply senders are dropped) and counted in a
//! `RequestRejected` event.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ActorConfig,
    coordinator::Scope,
    error::StateError,
    events::{Bus, Event, EventKind},
    state::store::StateStore,
    sync::{DoneGuard, OpCounter},
};

/// Messages understood by the actor loop.
///
/// Exhaustively matched; the reply type is fixed per variant.
enum Request<K, V> {
    Read {
        key: K,
        reply: oneshot::Sender<V>,
    },
    Write {
        key: K,
        value: V,
        reply: oneshot::Sender<()>,
    },
    Remove {
        key: K,
        reply: oneshot::Sender<Option<V>>,
    },
    Snapshot {
        reply: oneshot::Sender<HashMap<K, V>>,
    },
}

/// Operation counts for one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActorStats {
    /// Reads applied (including snapshots).
    pub reads: u64,
    /// Writes applied (including removals).
    pub writes: u64,
}

struct Shared {
    name: Arc<str>,
    reads: OpCounter,
    writes: OpCounter,
    stop: CancellationToken,
}

/// Handle to an owned-state actor.
///
/// Cheap to clone; all clones talk to the same owner.
pub struct StateActor<K, V> {
    tx: mpsc::Sender<Request<K, V>>,
    shared: Arc<Shared>,
}

impl<K, V> Clone for StateActor<K, V> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, V> StateActor<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Default + Send + 'static,
{
    /// Spawns a standalone actor with a private bus.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(cfg: ActorConfig) -> Self {
        Self::spawn_with(cfg, "state", Scope::detached())
    }

    /// Spawns an actor that publishes to the scope's bus and stops with its token.
    pub(crate) fn spawn_with(cfg: ActorConfig, name: impl Into<Arc<str>>, scope: Scope) -> Self {
        let Scope { bus, stop, guard } = scope;
        let (tx, rx) = mpsc::channel(cfg.mailbox_capacity_clamped());
        let shared = Arc::new(Shared {
            name: name.into(),
            reads: OpCounter::new(),
            writes: OpCounter::new(),
            stop,
        });

        tokio::spawn(run(rx, Arc::clone(&shared), bus, guard));
        Self { tx, shared }
    }

    /// Returns the current value for `key`, or `V::default()` if it was never written.
    pub async fn read(&self, key: K) -> Result<V, StateError> {
        self.call(|reply| Request::Read { key, reply }).await
    }

    /// Stores `value` under `key` and waits for the acknowledgment.
    pub async fn write(&self, key: K, value: V) -> Result<(), StateError> {
        self.call(|reply| Request::Write { key, value, reply }).await
    }

    /// Removes `key`, returning the previous value if there was one.
    pub async fn remove(&self, key: K) -> Result<Option<V>, StateError> {
        self.call(|reply| Request::Remove { key, reply }).await
    }

    /// Returns a copy of the whole map as of the moment the request is applied.
    pub async fn snapshot(&self) -> Result<HashMap<K, V>, StateError> {
        self.call(|reply| Request::Snapshot { reply }).await
    }

    /// One request/reply round-trip.
    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Request<K, V>,
    ) -> Result<T, StateError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| StateError::Closed)?;
        rx.await.map_err(|_| StateError::Closed)
    }
}

impl<K, V> StateActor<K, V> {
    /// Asks the actor to stop. Queued and future requests fail with [`StateError::Closed`].
    pub fn shutdown(&self) {
        self.shared.stop.cancel();
    }

    /// Returns `true` once the actor loop has exited.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Returns the actor's name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Returns applied-operation counts.
    pub fn stats(&self) -> ActorStats {
        ActorStats {
            reads: self.shared.reads.get(),
            writes: self.shared.writes.get(),
        }
    }
}

#[async_trait]
impl<K, V> StateStore<K, V> for StateActor<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Default + Send + Sync + 'static,
{
    async fn read(&self, key: K) -> Result<V, StateError> {
        StateActor::read(self, key).await
    }

    async fn write(&self, key: K, value: V) -> Result<(), StateError> {
        StateActor::write(self, key, value).await
    }
}

/// Actor loop: owns the map for its whole lifetime.
async fn run<K, V>(
    mut rx: mpsc::Receiver<Request<K, V>>,
    shared: Arc<Shared>,
    bus: Bus,
    guard: DoneGuard,
) where
    K: Eq + Hash + Clone,
    V: Clone + Default,
{
    let mut state: HashMap<K, V> = HashMap::new();
    bus.publish(Event::new(EventKind::ActorStarted).with_source(Arc::clone(&shared.name)));

    loop {
        let req = tokio::select! {
            biased;
            _ = shared.stop.cancelled() => break,
            req = rx.recv() => match req {
                Some(req) => req,
                None => break,
            },
        };
        apply(&mut state, req, &shared);
    }

    rx.close();
    let mut rejected: u64 = 0;
    while let Ok(req) = rx.try_recv() {
        drop(req);
        rejected += 1;
    }

    let applied = shared.reads.get() + shared.writes.get();
    bus.publish(
        Event::new(EventKind::ActorStopped)
            .with_source(Arc::clone(&shared.name))
            .with_count(applied),
    );
    if rejected > 0 {
        bus.publish(
            Event::new(EventKind::RequestRejected)
                .with_source(Arc::clone(&shared.name))
                .with_count(rejected),
        );
    }
    drop(guard);
}

/// Applies one request and replies. A caller that stopped listening is ignored.
fn apply<K, V>(state: &mut HashMap<K, V>, req: Request<K, V>, shared: &Shared)
where
    K: Eq + Hash + Clone,
    V: Clone + Default,
{
    match req {
        Request::Read { key, reply } => {
            shared.reads.incr();
            let _ = reply.send(state.get(&key).cloned().unwrap_or_default());
        }
        Request::Write { key, value, reply } => {
            state.insert(key, value);
            shared.writes.incr();
            let _ = reply.send(());
        }
        Request::Remove { key, reply } => {
            let prev = state.remove(&key);
            shared.writes.incr();
            let _ = reply.send(prev);
        }
        Request::Snapshot { reply } => {
            shared.reads.incr();
            let _ = reply.send(state.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_read_of_absent_key_is_default() {
        let actor: StateActor<u32, u64> = StateActor::spawn(ActorConfig::default());
        assert_eq!(actor.read(7).await, Ok(0));

        let names: StateActor<&'static str, String> = StateActor::spawn(ActorConfig::default());
        assert_eq!(names.read("missing").await, Ok(String::new()));
    }

    #[tokio::test]
    async fn test_read_after_write() {
        let actor: StateActor<u32, u64> = StateActor::spawn(ActorConfig::default());
        actor.write(1, 10).await.expect("write");
        assert_eq!(actor.read(1).await, Ok(10));

        actor.write(1, 11).await.expect("overwrite");
        assert_eq!(actor.read(1).await, Ok(11));
        assert_eq!(actor.stats(), ActorStats { reads: 2, writes: 2 });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_acknowledged_write_visible_to_other_handles() {
        let actor: StateActor<u32, u32> = StateActor::spawn(ActorConfig { mailbox_capacity: 4 });

        let writers: Vec<_> = (0..16u32)
            .map(|k| {
                let a = actor.clone();
                tokio::spawn(async move {
                    a.write(k, k * 100).await.expect("write");
                    k
                })
            })
            .collect();

        for w in writers {
            let k = w.await.expect("join");
            let reader = actor.clone();
            let seen = tokio::spawn(async move { reader.read(k).await })
                .await
                .expect("join");
            assert_eq!(seen, Ok(k * 100));
        }
    }

    #[tokio::test]
    async fn test_remove_and_snapshot() {
        let actor: StateActor<&'static str, i32> = StateActor::spawn(ActorConfig::default());
        actor.write("a", 1).await.unwrap();
        actor.write("b", 2).await.unwrap();

        assert_eq!(actor.remove("a").await, Ok(Some(1)));
        assert_eq!(actor.remove("a").await, Ok(None));

        let snap = actor.snapshot().await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get("b"), Some(&2));
    }

    #[tokio::test]
    async fn test_requests_after_shutdown_are_rejected() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let actor: StateActor<u32, u32> =
            StateActor::spawn_with(ActorConfig::default(), "cache", Scope::on(bus));
        actor.write(1, 1).await.unwrap();

        actor.shutdown();
        loop {
            let ev = events.recv().await.expect("event");
            if ev.kind == EventKind::ActorStopped {
                assert_eq!(ev.source.as_deref(), Some("cache"));
                assert_eq!(ev.count, Some(1));
                break;
            }
        }

        assert!(actor.is_closed());
        assert_eq!(actor.read(1).await, Err(StateError::Closed));
        assert_eq!(actor.write(2, 2).await, Err(StateError::Closed));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_queued_requests_are_rejected_on_shutdown() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let actor: StateActor<u32, u32> =
            StateActor::spawn_with(ActorConfig::default(), "queue", Scope::on(bus));

        // The actor task has not been polled yet, so these sit in the mailbox.
        let mut replies = Vec::new();
        for key in 0..3 {
            let (reply, rx) = oneshot::channel();
            actor
                .tx
                .try_send(Request::Read { key, reply })
                .unwrap_or_else(|_| panic!("mailbox has room"));
            replies.push(rx);
        }
        actor.shutdown();

        for rx in replies {
            assert_eq!(rx.await.map_err(|_| StateError::Closed), Err(StateError::Closed));
        }
        assert_eq!(actor.stats(), ActorStats::default());

        let mut seen = Vec::new();
        while seen.last().map(|(k, _)| *k) != Some(EventKind::RequestRejected) {
            let ev = events.recv().await.expect("event");
            seen.push((ev.kind, ev.count));
        }
        assert_eq!(
            seen,
            vec![
                (EventKind::ActorStarted, None),
                (EventKind::ActorStopped, Some(0)),
                (EventKind::RequestRejected, Some(3)),
            ]
        );
    }

    #[tokio::test]
    async fn test_dropping_caller_does_not_stall_actor() {
        let actor: StateActor<u32, u32> = StateActor::spawn(ActorConfig::default());

        // Abandon a request mid-flight; the actor must keep serving others.
        let abandoned = tokio::time::timeout(Duration::ZERO, actor.write(1, 5)).await;
        drop(abandoned);

        actor.write(2, 6).await.unwrap();
        assert_eq!(actor.read(2).await, Ok(6));
    }

    #[tokio::test]
    async fn test_usable_through_store_trait() {
        let store: Arc<dyn StateStore<u8, u8>> =
            Arc::new(StateActor::<u8, u8>::spawn(ActorConfig::default()));
        store.write(3, 9).await.unwrap();
        assert_eq!(store.read(3).await, Ok(9));
    }
}
