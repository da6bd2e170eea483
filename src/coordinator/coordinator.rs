//! # Coordinator: builds components on a shared bus and shuts them down together.
//!
//! ## Architecture
//! ```text
//! Coordinator::builder(cfg).with_subscribers(subs).build()
//!     │
//!     ├─ Bus ─────────► listener ─────────► SubscriberSet ──► Subscribe::on_event
//!     │
//!     ├─ worker_pool(h) ──► WorkerPool       (publishes to Bus, closed on shutdown)
//!     ├─ rate_limiter(n) ─► RateLimiter      ┐
//!     ├─ state_actor(n) ──► StateActor       │ child token of root,
//!     ├─ ticker(n, p) ────► Ticks + StopHandle│ DoneGuard in component tasks
//!     └─ timer(d) ────────► Fired + TimerHandle┘
//!
//! shutdown():
//!   publish(ShutdownRequested)
//!   close every pool built here (queued jobs still run)
//!   root.cancel() ──► limiters, actors, tickers, timers stop
//!   wait for component tasks (bounded by cfg.grace)
//!   publish(ShutdownComplete) ──► listener forwards it and exits
//!   SubscriberSet::shutdown() (subscriber queues drained)
//! ```
//!
//! ## Rules
//! - Stopping one component (e.g. `RateLimiter::stop`) never affects the others.
//! - Pool workers are not awaited by `shutdown`; use
//!   [`Results::stopped`](crate::Results::stopped) to wait for them.
//! - Every event published before `ShutdownComplete` reaches the subscribers.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use corral::{Config, Coordinator, HandlerFn, JobError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let coord = Coordinator::builder(Config::default()).build();
//!
//! let limiter = coord.rate_limiter("api");
//! let pool = coord.worker_pool(HandlerFn::arc("echo", |s: String| async move {
//!     Ok::<_, JobError>(s)
//! }));
//!
//! limiter.acquire().await?;
//! pool.submit("hello".to_string()).await?;
//!
//! let mut results = pool.collect();
//! coord.shutdown().await?;
//! let outcome = results.recv().await.expect("one outcome");
//! assert_eq!(outcome.result, Ok("hello".to_string()));
//! assert!(results.recv().await.is_none());
//! # Ok(())
//! # }
//! ```

use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{builder::CoordinatorBuilder, scope::Scope};
use crate::{
    config::{Config, LimiterConfig, PoolConfig},
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    limiter::RateLimiter,
    pool::{HandlerRef, WorkerPool},
    state::StateActor,
    subscribers::SubscriberSet,
    sync::CompletionBarrier,
    timing::{Fired, Raced, StopHandle, Ticker, Ticks, Timer, TimerHandle, race},
};

type Closer = Box<dyn Fn() + Send + Sync>;

/// Owns the event plumbing and the lifetime of every component it builds.
pub struct Coordinator {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    listener: JoinHandle<()>,
    root: CancellationToken,
    tasks: CompletionBarrier,
    pools: Mutex<Vec<Closer>>,
}

impl Coordinator {
    /// Returns a builder for a coordinator with the given configuration.
    pub fn builder(cfg: Config) -> CoordinatorBuilder {
        CoordinatorBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        listener: JoinHandle<()>,
        root: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs,
            listener,
            root,
            tasks: CompletionBarrier::new(),
            pools: Mutex::new(Vec::new()),
        }
    }

    /// Returns the configuration this coordinator was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the shared event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Returns a token cancelled when [`shutdown`](Self::shutdown) begins.
    ///
    /// Handlers can watch it and give up with [`JobError::Canceled`](crate::JobError::Canceled).
    pub fn cancellation(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Number of limiter, actor, ticker and timer tasks still running.
    pub fn running_components(&self) -> usize {
        self.tasks.count()
    }

    fn scope(&self) -> Scope {
        Scope {
            bus: self.bus.clone(),
            stop: self.root.child_token(),
            guard: self.tasks.guard(),
        }
    }

    /// Starts a worker pool sized by `cfg.pool`.
    pub fn worker_pool<J, R>(&self, handler: HandlerRef<J, R>) -> WorkerPool<J, R>
    where
        J: Send + 'static,
        R: Send + 'static,
    {
        self.worker_pool_with(self.cfg.pool.clone(), handler)
    }

    /// Starts a worker pool with its own sizing.
    pub fn worker_pool_with<J, R>(&self, cfg: PoolConfig, handler: HandlerRef<J, R>) -> WorkerPool<J, R>
    where
        J: Send + 'static,
        R: Send + 'static,
    {
        let pool = WorkerPool::start_with(cfg, handler, self.bus.clone());
        self.pools
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(pool.submitter().closer());
        pool
    }

    /// Starts a rate limiter paced by `cfg.limiter`.
    pub fn rate_limiter(&self, name: &str) -> RateLimiter {
        self.rate_limiter_with(name, self.cfg.limiter.clone())
    }

    /// Starts a rate limiter with its own pacing.
    pub fn rate_limiter_with(&self, name: &str, cfg: LimiterConfig) -> RateLimiter {
        RateLimiter::start_with(cfg, name, self.scope())
    }

    /// Spawns an owned-state actor with a `cfg.actor` mailbox.
    pub fn state_actor<K, V>(&self, name: &str) -> StateActor<K, V>
    where
        K: Eq + Hash + Clone + Send + 'static,
        V: Clone + Default + Send + 'static,
    {
        StateActor::spawn_with(self.cfg.actor.clone(), name, self.scope())
    }

    /// Starts a ticker.
    pub fn ticker(&self, name: &str, period: Duration) -> (Ticks, StopHandle) {
        Ticker::start_with(period, name, self.scope())
    }

    /// Starts a one-shot timer.
    pub fn timer(&self, delay: Duration) -> (Fired, TimerHandle) {
        Timer::start_with(delay, self.scope())
    }

    /// Stops everything this coordinator built and drains the subscribers.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] if component tasks did not exit
    /// within `cfg.grace`; subscribers are drained either way.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));

        let pools = std::mem::take(&mut *self.pools.lock().unwrap_or_else(PoisonError::into_inner));
        for close in pools {
            close();
        }
        self.root.cancel();

        let grace = self.cfg.grace;
        let res = match race(self.tasks.wait(), grace).await {
            Raced::Completed(()) => {
                self.bus.publish(Event::new(EventKind::ShutdownComplete));
                Ok(())
            }
            Raced::TimedOut(_) => {
                let running = self.tasks.count();
                self.bus.publish(
                    Event::new(EventKind::ShutdownComplete)
                        .with_reason("grace exceeded")
                        .with_count(running as u64),
                );
                Err(RuntimeError::GraceExceeded { grace, running })
            }
        };

        let _ = self.listener.await;
        if let Ok(subs) = Arc::try_unwrap(self.subs) {
            subs.shutdown().await;
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{LimiterError, StateError},
        pool::HandlerFn,
        subscribers::Subscribe,
    };
    use async_trait::async_trait;

    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    fn kinds(rec: &Recorder) -> Vec<EventKind> {
        rec.0.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_shutdown_stops_components_and_reports_in_order() {
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        let coord = Coordinator::builder(Config::default())
            .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
            .build();

        let limiter = coord.rate_limiter("api");
        let actor: StateActor<u8, u8> = coord.state_actor("cache");
        let (mut ticks, _stop) = coord.ticker("flush", Duration::from_secs(3600));
        actor.write(1, 1).await.unwrap();

        coord.shutdown().await.expect("clean shutdown");

        assert!(limiter.is_stopped());
        assert!(actor.is_closed());
        assert_eq!(actor.read(1).await, Err(StateError::Closed));
        assert!(ticks.recv().await.is_none());

        let seen = kinds(&rec);
        assert_eq!(seen.first(), Some(&EventKind::ActorStarted));
        assert_eq!(seen.last(), Some(&EventKind::ShutdownComplete));
        for kind in [
            EventKind::ShutdownRequested,
            EventKind::LimiterStopped,
            EventKind::ActorStopped,
            EventKind::TickerStopped,
        ] {
            assert!(seen.contains(&kind), "missing {}", kind.as_label());
        }
    }

    #[tokio::test]
    async fn test_stopping_one_component_leaves_others_running() {
        let coord = Coordinator::builder(Config::default()).build();
        let a = coord.rate_limiter("a");
        let b = coord.rate_limiter("b");

        a.stop();
        assert!(a.is_stopped());
        assert!(!b.is_stopped());
        assert_eq!(b.acquire().await, Ok(()));

        coord.shutdown().await.unwrap();
        assert!(b.is_stopped());
    }

    #[tokio::test]
    async fn test_shutdown_closes_pools_but_finishes_queued_jobs() {
        let coord = Coordinator::builder(Config::default()).build();
        let pool = coord.worker_pool(HandlerFn::arc("inc", |n: u32| async move {
            Ok::<_, crate::JobError>(n + 1)
        }));
        let submitter = pool.submitter();
        for n in 0..10 {
            submitter.submit(n).await.unwrap();
        }
        let results = pool.collect();

        coord.shutdown().await.unwrap();
        assert!(submitter.is_closed());

        let mut got: Vec<u32> = futures::StreamExt::collect::<Vec<_>>(results)
            .await
            .into_iter()
            .filter_map(|o| o.result.ok())
            .collect();
        got.sort_unstable();
        assert_eq!(got, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_token_follows_shutdown() {
        let coord = Coordinator::builder(Config::default()).build();
        let token = coord.cancellation();
        let limiter = coord.rate_limiter_with(
            "slow",
            LimiterConfig::every(Duration::from_secs(60)).with_prefill(false),
        );
        let waiter = tokio::spawn(async move { limiter.acquire().await });

        assert!(!token.is_cancelled());
        coord.shutdown().await.unwrap();
        assert!(token.is_cancelled());
        assert_eq!(waiter.await.unwrap(), Err(LimiterError::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_is_cancelled_by_shutdown() {
        let coord = Coordinator::builder(Config::default()).build();
        let (fired, _handle) = coord.timer(Duration::from_secs(10));
        assert_eq!(coord.running_components(), 1);

        coord.shutdown().await.unwrap();
        assert_eq!(fired.await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_component_outliving_grace_is_reported() {
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        let mut cfg = Config::default();
        cfg.grace = Duration::from_secs(2);
        let coord = Coordinator::builder(cfg)
            .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
            .build();

        // A component task that ignores its stop token keeps its guard alive.
        let stuck = coord.scope();
        let _limiter = coord.rate_limiter("api");
        assert_eq!(coord.running_components(), 2);

        let started = tokio::time::Instant::now();
        let err = coord.shutdown().await.expect_err("grace must run out");
        assert_eq!(
            err,
            RuntimeError::GraceExceeded {
                grace: Duration::from_secs(2),
                running: 1,
            }
        );
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(kinds(&rec).last(), Some(&EventKind::ShutdownComplete));
        drop(stuck);
    }
}
