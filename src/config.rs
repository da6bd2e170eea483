//! # Explicit configuration for the coordination primitives.
//!
//! Provides [`Config`], grouping the per-component settings consumed by the
//! [`Coordinator`](crate::Coordinator). Each component can also be built
//! standalone from its own section ([`PoolConfig`], [`LimiterConfig`],
//! [`ActorConfig`]).
//!
//! Nothing here reads the environment or global state: callers construct
//! every value explicitly (or start from [`Default`]).
//!
//! ## Clamping
//! - capacities and worker counts of `0` are raised to `1`
//! - `burst = 0` is raised to `1` (a limiter always holds at least one permit slot)
//! - capacities, worker counts and `burst` are capped at [`MAX_CAPACITY`]
//!   (tokio's semaphore and bounded channels reject anything larger)
//! - `interval = 0s` is raised to 1ms (`tokio::time::interval` rejects zero periods)

use std::time::Duration;

use tokio::sync::Semaphore;

/// Largest queue capacity, worker count or burst any component accepts.
pub const MAX_CAPACITY: usize = Semaphore::MAX_PERMITS;

/// Clamps a capacity into `1..=MAX_CAPACITY`.
#[inline]
pub(crate) fn clamp_capacity(n: usize) -> usize {
    n.clamp(1, MAX_CAPACITY)
}

/// Smallest interval a limiter or ticker will run with.
pub(crate) const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Clamps a period to [`MIN_PERIOD`].
#[inline]
pub(crate) fn clamp_period(period: Duration) -> Duration {
    period.max(MIN_PERIOD)
}

/// Worker pool sizing.
///
/// ## Field semantics
/// - `workers`: number of concurrent workers started with the pool
/// - `job_capacity`: bound of the shared job queue (`submit` waits when full)
/// - `result_capacity`: bound of the shared result queue (workers wait when full)
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of workers started at construction.
    pub workers: usize,
    /// Capacity of the job queue.
    pub job_capacity: usize,
    /// Capacity of the result queue.
    pub result_capacity: usize,
}

impl PoolConfig {
    /// Returns the worker count clamped to `1..=MAX_CAPACITY`.
    #[inline]
    pub fn workers_clamped(&self) -> usize {
        clamp_capacity(self.workers)
    }

    /// Returns the job queue capacity clamped to `1..=MAX_CAPACITY`.
    #[inline]
    pub fn job_capacity_clamped(&self) -> usize {
        clamp_capacity(self.job_capacity)
    }

    /// Returns the result queue capacity clamped to `1..=MAX_CAPACITY`.
    #[inline]
    pub fn result_capacity_clamped(&self) -> usize {
        clamp_capacity(self.result_capacity)
    }
}

impl Default for PoolConfig {
    /// `workers = 4`, `job_capacity = 64`, `result_capacity = 64`.
    fn default() -> Self {
        Self {
            workers: 4,
            job_capacity: 64,
            result_capacity: 64,
        }
    }
}

/// Rate limiter pacing.
///
/// ## Field semantics
/// - `interval`: one permit is generated per interval
/// - `burst`: maximum number of unused permits that may accumulate
/// - `prefill`: start with `burst` permits already available; when `false`
///   the first permit appears one `interval` after start
#[derive(Clone, Debug)]
pub struct LimiterConfig {
    /// Minimum spacing between generated permits.
    pub interval: Duration,
    /// Permit buffer capacity.
    pub burst: usize,
    /// Whether the permit buffer starts full.
    pub prefill: bool,
}

impl LimiterConfig {
    /// Creates a limiter config with `burst = 1` and a prefilled bucket.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Sets the burst size.
    #[must_use]
    pub fn with_burst(mut self, burst: usize) -> Self {
        self.burst = burst;
        self
    }

    /// Sets whether the permit buffer starts full.
    #[must_use]
    pub fn with_prefill(mut self, prefill: bool) -> Self {
        self.prefill = prefill;
        self
    }

    /// Returns the interval clamped to at least 1ms.
    #[inline]
    pub fn interval_clamped(&self) -> Duration {
        clamp_period(self.interval)
    }

    /// Returns the burst clamped to `1..=MAX_CAPACITY`.
    #[inline]
    pub fn burst_clamped(&self) -> usize {
        clamp_capacity(self.burst)
    }
}

impl Default for LimiterConfig {
    /// `interval = 200ms`, `burst = 1`, `prefill = true`.
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            burst: 1,
            prefill: true,
        }
    }
}

/// Owned-state actor mailbox sizing.
#[derive(Clone, Debug)]
pub struct ActorConfig {
    /// Capacity of the request mailbox (senders wait when full).
    pub mailbox_capacity: usize,
}

impl ActorConfig {
    /// Returns the mailbox capacity clamped to `1..=MAX_CAPACITY`.
    #[inline]
    pub fn mailbox_capacity_clamped(&self) -> usize {
        clamp_capacity(self.mailbox_capacity)
    }
}

impl Default for ActorConfig {
    /// `mailbox_capacity = 64`.
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
        }
    }
}

/// Configuration for a [`Coordinator`](crate::Coordinator) and everything it builds.
///
/// ## Field semantics
/// - `pool`: defaults for [`Coordinator::worker_pool`](crate::Coordinator::worker_pool)
/// - `limiter`: defaults for [`Coordinator::rate_limiter`](crate::Coordinator::rate_limiter)
/// - `actor`: defaults for [`Coordinator::state_actor`](crate::Coordinator::state_actor)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `grace`: how long `shutdown` waits for component tasks (`0s` = don't wait)
#[derive(Clone, Debug)]
pub struct Config {
    /// Worker pool sizing.
    pub pool: PoolConfig,
    /// Rate limiter pacing.
    pub limiter: LimiterConfig,
    /// Actor mailbox sizing.
    pub actor: ActorConfig,
    /// Capacity of the event bus broadcast channel.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` events skip
    /// the oldest ones.
    pub bus_capacity: usize,
    /// Maximum time [`Coordinator::shutdown`](crate::Coordinator::shutdown)
    /// waits for limiters, actors, tickers and timers to exit.
    pub grace: Duration,
}

impl Config {
    /// Returns a bus capacity clamped to `1..=MAX_CAPACITY`.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        clamp_capacity(self.bus_capacity)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            limiter: LimiterConfig::default(),
            actor: ActorConfig::default(),
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}
