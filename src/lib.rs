//! # corral
//!
//! **Corral** is a small toolkit of in-process concurrency coordination
//! primitives built on tokio: a worker pool with bounded queues, an
//! interval-paced rate limiter, an owned-state actor, a completion barrier,
//! deadline races, tickers and timers.
//!
//! Every primitive works standalone. A [`Coordinator`] ties them to one event
//! bus and one shutdown.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producers                     ┌────────────────────┐
//!   ─ submit(job) ──────────────► │     WorkerPool     │ ──► Results (Stream of JobOutcome)
//!       ▲                         │ jobs ─► N workers  │
//!       │ acquire()               └─────────┬──────────┘
//!   ┌───┴─────────┐                         │ handler talks to shared state
//!   │ RateLimiter │                         ▼
//!   └─────────────┘               ┌────────────────────┐
//!                                 │ StateActor / Locked│  read / write / remove / snapshot
//!   ┌─────────────┐               └────────────────────┘
//!   │   Ticker    │ ─► Ticks ─► periodic maintenance
//!   └─────────────┘
//!   race(op, timeout) ─► Raced::{Completed, TimedOut}
//!   CompletionBarrier ─► wait for N units of work
//!
//!   every component ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                              ┌─────┼─────┐
//!                                                              ▼     ▼     ▼
//!                                                          Metrics LogWriter custom
//! ```
//!
//! ### Shutdown
//! ```text
//! Coordinator::shutdown()
//!   ├─► publish ShutdownRequested
//!   ├─► close pools (queued jobs still run, Results ends after the last worker)
//!   ├─► cancel root token ─► limiters, actors, tickers, timers stop
//!   ├─► wait for their tasks (bounded by Config::grace)
//!   ├─► publish ShutdownComplete
//!   └─► drain subscriber queues
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Worker pool**   | Fixed workers, bounded job and result queues.            | [`WorkerPool`], [`Handler`], [`HandlerFn`]  |
//! | **Rate limiting** | One permit per interval with a bounded burst.            | [`RateLimiter`], [`LimiterConfig`]          |
//! | **Owned state**   | One task owns a map; everyone else sends requests.       | [`StateActor`], [`LockedStore`], [`StateStore`] |
//! | **Completion**    | Count outstanding work and wait for it.                  | [`CompletionBarrier`], [`OpCounter`]        |
//! | **Time**          | Deadline races, periodic ticks, one-shot timers.         | [`race`], [`Ticker`], [`Timer`]             |
//! | **Events**        | Lifecycle events fanned out to subscribers.              | [`Subscribe`], [`Metrics`], [`Event`]       |
//! | **Errors**        | Typed errors per primitive.                              | [`SubmitError`], [`JobError`], [`StateError`] |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that emits `tracing` records.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use corral::{Config, Coordinator, HandlerFn, JobError, Metrics, StateActor, Subscribe};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metrics = Arc::new(Metrics::new());
//!     let coord = Coordinator::builder(Config::default())
//!         .with_subscribers(vec![metrics.clone() as Arc<dyn Subscribe>])
//!         .build();
//!
//!     let hits: StateActor<String, u64> = coord.state_actor("hits");
//!     let limiter = coord.rate_limiter("ingest");
//!
//!     let store = hits.clone();
//!     let pool = coord.worker_pool(HandlerFn::arc("count", move |page: String| {
//!         let store = store.clone();
//!         async move {
//!             let n = store.read(page.clone()).await.map_err(|e| JobError::fail(e.to_string()))?;
//!             store.write(page, n + 1).await.map_err(|e| JobError::fail(e.to_string()))?;
//!             Ok::<_, JobError>(n + 1)
//!         }
//!     }));
//!
//!     limiter.acquire().await?;
//!     pool.submit("/index".to_string()).await?;
//!     pool.close();
//!
//!     let outcomes: Vec<_> = pool.collect().collect().await;
//!     assert_eq!(outcomes.len(), 1);
//!     assert_eq!(hits.read("/index".to_string()).await?, 1);
//!
//!     coord.shutdown().await?;
//!     assert_eq!(metrics.snapshot().jobs_completed, 1);
//!     Ok(())
//! }
//! ```

mod config;
mod coordinator;
mod error;
mod events;
mod limiter;
mod pool;
mod state;
mod subscribers;
mod sync;
mod timing;

// ---- Public re-exports ----

pub use config::{ActorConfig, Config, LimiterConfig, MAX_CAPACITY, PoolConfig};
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::{JobError, LimiterError, RuntimeError, SignalError, StateError, SubmitError};
pub use events::{Bus, Event, EventKind};
pub use limiter::{LimiterStats, RateLimiter};
pub use pool::{
    BoxJobFuture, Handler, HandlerFn, HandlerRef, JobId, JobOutcome, Results, Submitter, WorkerPool,
};
pub use state::{ActorStats, LockedStore, StateActor, StateStore};
pub use subscribers::{Metrics, MetricsSnapshot, Subscribe, SubscriberSet};
pub use sync::{CompletionBarrier, DoneGuard, OpCounter};
pub use timing::{
    Completer, Fired, Raced, Signal, StopHandle, Tick, Ticker, Ticks, Timer, TimerHandle, race,
    race_signal, signal, spawn_signal,
};

// Optional: structured logging subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
