//! # WorkerPool: bounded job queue, fixed workers, bounded result queue.
//!
//! ## Architecture
//! ```text
//! Submitter::submit(job) ──► [job queue, cap = job_capacity] ──┬──► worker 0 ─┐
//!   (many producers)          (shared receiver behind a lock)  ├──► worker 1 ─┼──► [result queue] ──► Results
//!                                                              └──► worker N ─┘    cap = result_capacity
//!                                                                    │
//!                                                         DoneGuard per worker ──► CompletionBarrier
//! ```
//!
//! ## Lifecycle
//! 1. `start` spawns `workers` tasks; they block until jobs arrive.
//! 2. `submit` waits while the job queue is full; `try_submit` fails fast with `Full`.
//! 3. `close` (or dropping every [`Submitter`]) stops intake; queued jobs still run.
//! 4. Each worker exits once the queue is closed **and** drained.
//! 5. [`Results`] yields one [`JobOutcome`] per accepted job, in completion
//!    order, and ends after the last worker exits.
//!
//! ## Rules
//! - A job is claimed by exactly one worker; an outcome belongs to exactly one job.
//! - Failures and panics become `Err(JobError)` outcomes, never a dead pool.
//! - Drain the results concurrently with submitting when more jobs than
//!   `job_capacity + result_capacity` are in flight, otherwise producers and
//!   workers wait on each other.
//!
//! ## Example
//! ```rust
//! use futures::StreamExt;
//! use corral::{HandlerFn, JobError, PoolConfig, WorkerPool};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pool = WorkerPool::start(
//!     PoolConfig { workers: 3, job_capacity: 5, result_capacity: 5 },
//!     HandlerFn::arc("double", |n: u64| async move { Ok::<_, JobError>(n * 2) }),
//! );
//! for n in 1..=5 {
//!     pool.submit(n).await.unwrap();
//! }
//! pool.close();
//!
//! let mut doubled: Vec<u64> = pool
//!     .collect()
//!     .filter_map(|o| async move { o.result.ok() })
//!     .collect()
//!     .await;
//! doubled.sort_unstable();
//! assert_eq!(doubled, vec![2, 4, 6, 8, 10]);
//! # }
//! ```

use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{Mutex, mpsc};

use crate::{
    config::PoolConfig,
    error::{JobError, SubmitError},
    events::{Bus, Event, EventKind},
    pool::handler::HandlerRef,
    pool::worker::Worker,
    sync::{CompletionBarrier, OpCounter},
};

/// Sequence number assigned to each accepted job (0-based, per pool).
pub type JobId = u64;

/// Result of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome<R> {
    /// Id returned by `submit` for this job.
    pub job: JobId,
    /// Worker that processed the job.
    pub worker: usize,
    /// Handler result (or the failure/panic that replaced it).
    pub result: Result<R, JobError>,
}

impl<R> JobOutcome<R> {
    /// Returns `true` if the job succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// A queued job with its id.
pub(crate) struct Envelope<J> {
    pub id: JobId,
    pub job: J,
}

/// Intake side shared by every [`Submitter`] clone.
struct Intake<J> {
    name: Arc<str>,
    /// `None` once closed. Senders are cloned out, never held across an await under the lock.
    tx: StdMutex<Option<mpsc::Sender<Envelope<J>>>>,
    next_id: OpCounter,
    accepted: OpCounter,
    bus: Bus,
}

impl<J> Intake<J> {
    fn sender(&self) -> Result<mpsc::Sender<Envelope<J>>, SubmitError> {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SubmitError::Closed)
    }
}

/// Cloneable handle for feeding jobs into a pool.
///
/// The pool closes automatically when every submitter (including the one
/// inside [`WorkerPool`]) has been dropped.
pub struct Submitter<J> {
    intake: Arc<Intake<J>>,
}

impl<J> Clone for Submitter<J> {
    fn clone(&self) -> Self {
        Self {
            intake: Arc::clone(&self.intake),
        }
    }
}

impl<J> Submitter<J> {
    /// Enqueues `job`, waiting while the queue is full.
    pub async fn submit(&self, job: J) -> Result<JobId, SubmitError> {
        let tx = self.intake.sender()?;
        let id = self.intake.next_id.incr();
        tx.send(Envelope { id, job })
            .await
            .map_err(|_| SubmitError::Closed)?;
        self.intake.accepted.incr();
        Ok(id)
    }

    /// Enqueues `job` without waiting.
    pub fn try_submit(&self, job: J) -> Result<JobId, SubmitError> {
        let tx = self.intake.sender()?;
        let id = self.intake.next_id.incr();
        tx.try_send(Envelope { id, job }).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })?;
        self.intake.accepted.incr();
        Ok(id)
    }

    /// Stops accepting jobs. Already queued jobs are still processed.
    ///
    /// Idempotent; a submit racing with `close` either lands before it or
    /// fails with [`SubmitError::Closed`].
    pub fn close(&self) {
        let taken = self
            .intake
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if taken.is_some() {
            self.intake.bus.publish(
                Event::new(EventKind::PoolClosed)
                    .with_source(Arc::clone(&self.intake.name))
                    .with_count(self.intake.accepted.get()),
            );
        }
    }

    /// Returns `true` once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.intake
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Number of jobs accepted so far.
    pub fn accepted(&self) -> u64 {
        self.intake.accepted.get()
    }
}

impl<J: Send + 'static> Submitter<J> {
    /// Returns a callback that closes the pool if it is still alive.
    ///
    /// The callback holds no strong reference, so it never keeps intake open.
    pub(crate) fn closer(&self) -> Box<dyn Fn() + Send + Sync> {
        let intake = Arc::downgrade(&self.intake);
        Box::new(move || {
            if let Some(intake) = intake.upgrade() {
                Submitter { intake }.close();
            }
        })
    }
}

/// Fixed-size pool of workers sharing one job queue and one result queue.
pub struct WorkerPool<J, R> {
    submitter: Submitter<J>,
    results: Results<R>,
}

impl<J, R> WorkerPool<J, R>
where
    J: Send + 'static,
    R: Send + 'static,
{
    /// Starts a standalone pool with a private bus. The handler's name names the pool.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(cfg: PoolConfig, handler: HandlerRef<J, R>) -> Self {
        Self::start_with(cfg, handler, Bus::default())
    }

    /// Starts a pool that publishes lifecycle events to `bus`.
    pub(crate) fn start_with(cfg: PoolConfig, handler: HandlerRef<J, R>, bus: Bus) -> Self {
        let name: Arc<str> = Arc::from(handler.name());
        let (job_tx, job_rx) = mpsc::channel(cfg.job_capacity_clamped());
        let (res_tx, res_rx) = mpsc::channel(cfg.result_capacity_clamped());
        let jobs = Arc::new(Mutex::new(job_rx));
        let workers = CompletionBarrier::new();

        for id in 0..cfg.workers_clamped() {
            let worker = Worker {
                id,
                pool: Arc::clone(&name),
                handler: Arc::clone(&handler),
                jobs: Arc::clone(&jobs),
                results: res_tx.clone(),
                bus: bus.clone(),
                guard: workers.guard(),
            };
            tokio::spawn(worker.run());
        }

        let intake = Arc::new(Intake {
            name,
            tx: StdMutex::new(Some(job_tx)),
            next_id: OpCounter::new(),
            accepted: OpCounter::new(),
            bus,
        });

        Self {
            submitter: Submitter { intake },
            results: Results {
                rx: res_rx,
                workers,
            },
        }
    }
}

impl<J, R> WorkerPool<J, R> {
    /// Enqueues `job`, waiting while the queue is full.
    pub async fn submit(&self, job: J) -> Result<JobId, SubmitError> {
        self.submitter.submit(job).await
    }

    /// Enqueues `job` without waiting.
    pub fn try_submit(&self, job: J) -> Result<JobId, SubmitError> {
        self.submitter.try_submit(job)
    }

    /// Stops accepting jobs; workers exit after draining the queue.
    pub fn close(&self) {
        self.submitter.close();
    }

    /// Returns a cloneable submit handle (e.g. for a producer task).
    pub fn submitter(&self) -> Submitter<J> {
        self.submitter.clone()
    }

    /// Returns the pool's name.
    pub fn name(&self) -> &str {
        &self.submitter.intake.name
    }

    /// Consumes the pool and returns the stream of outcomes.
    ///
    /// The stream ends once the pool is closed, the queue drained, and every
    /// worker exited. Outstanding [`Submitter`] clones keep it open.
    pub fn collect(self) -> Results<R> {
        self.results
    }
}

/// Outcomes of a pool, in completion order.
///
/// Implements [`Stream`]; also usable directly through [`Results::recv`].
pub struct Results<R> {
    rx: mpsc::Receiver<JobOutcome<R>>,
    workers: CompletionBarrier,
}

impl<R> Results<R> {
    /// Receives the next outcome; `None` after the last worker exited.
    pub async fn recv(&mut self) -> Option<JobOutcome<R>> {
        self.rx.recv().await
    }

    /// Waits until every worker has exited.
    ///
    /// Workers only exit after the pool is closed and drained; keep reading
    /// outcomes (or drop this stream) or workers stay blocked on a full result queue.
    pub async fn stopped(&self) {
        self.workers.wait().await;
    }

    /// Number of workers still running.
    pub fn running_workers(&self) -> usize {
        self.workers.count()
    }
}

impl<R> Stream for Results<R> {
    type Item = JobOutcome<R>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::HandlerFn;
    use futures::StreamExt;
    use std::collections::HashSet;
    use std::time::Duration;

    fn cfg(workers: usize, cap: usize) -> PoolConfig {
        PoolConfig {
            workers,
            job_capacity: cap,
            result_capacity: cap,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_job_yields_exactly_one_outcome() {
        for workers in [1, 3, 8] {
            let pool = WorkerPool::start(
                cfg(workers, 4),
                HandlerFn::arc("square", |n: u64| async move { Ok::<_, JobError>(n * n) }),
            );
            let submitter = pool.submitter();
            let producer = tokio::spawn(async move {
                let mut ids = Vec::new();
                for n in 0..50u64 {
                    ids.push(submitter.submit(n).await.expect("submit"));
                }
                submitter.close();
                ids
            });

            let outcomes: Vec<_> = pool.collect().collect().await;
            let ids = producer.await.expect("producer");

            assert_eq!(outcomes.len(), 50);
            let seen: HashSet<JobId> = outcomes.iter().map(|o| o.job).collect();
            let submitted: HashSet<JobId> = ids.into_iter().collect();
            assert_eq!(seen, submitted, "outcomes must map 1:1 onto submitted jobs");
            for o in &outcomes {
                assert_eq!(o.result, Ok(o.job * o.job));
                assert!(o.worker < workers);
            }
        }
    }

    #[tokio::test]
    async fn test_failures_and_panics_become_outcomes() {
        let pool = WorkerPool::start(
            cfg(2, 8),
            HandlerFn::arc("picky", |n: u32| async move {
                match n {
                    3 => Err(JobError::fail("three is unlucky")),
                    5 => panic!("five is worse"),
                    n => Ok(n),
                }
            }),
        );
        for n in 0..8 {
            pool.submit(n).await.unwrap();
        }
        pool.close();

        let mut outcomes: Vec<_> = pool.collect().collect().await;
        outcomes.sort_by_key(|o| o.job);
        assert_eq!(outcomes.len(), 8);
        assert_eq!(outcomes[3].result, Err(JobError::fail("three is unlucky")));
        assert_eq!(
            outcomes[5].result,
            Err(JobError::Panicked {
                info: "five is worse".into()
            })
        );
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 6);
    }

    #[tokio::test]
    async fn test_submit_after_close_is_rejected() {
        let pool: WorkerPool<u8, u8> =
            WorkerPool::start(cfg(1, 1), HandlerFn::arc("id", |n: u8| async move { Ok::<_, JobError>(n) }));
        pool.close();
        pool.close();
        assert_eq!(pool.submit(1).await, Err(SubmitError::Closed));
        assert_eq!(pool.try_submit(1), Err(SubmitError::Closed));

        let results = pool.collect();
        results.stopped().await;
        assert_eq!(results.running_workers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_submit_reports_full_queue() {
        let pool = WorkerPool::start(
            cfg(1, 1),
            HandlerFn::arc("slow", |n: u8| async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, JobError>(n)
            }),
        );
        // Let the worker claim the first job so the queue slot is free again.
        pool.submit(0).await.unwrap();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        pool.try_submit(1).expect("one free slot");
        assert_eq!(pool.try_submit(2), Err(SubmitError::Full));
        pool.close();

        let outcomes: Vec<_> = pool.collect().collect().await;
        assert_eq!(outcomes.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_arrive_in_completion_order() {
        let pool = WorkerPool::start(
            cfg(3, 3),
            HandlerFn::arc("sleepy", |ms: u64| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok::<_, JobError>(ms)
            }),
        );
        for ms in [300, 100, 200] {
            pool.submit(ms).await.unwrap();
        }
        pool.close();

        let order: Vec<u64> = pool
            .collect()
            .filter_map(|o| async move { o.result.ok() })
            .collect()
            .await;
        assert_eq!(order, vec![100, 200, 300]);
    }

    #[tokio::test]
    async fn test_dropping_all_submitters_closes_pool() {
        let pool = WorkerPool::start(cfg(2, 4), HandlerFn::arc("id", |n: u8| async move { Ok::<_, JobError>(n) }));
        pool.submit(9).await.unwrap();

        let results = pool.collect();
        let outcomes: Vec<_> = results.collect().await;
        assert_eq!(outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let pool = WorkerPool::start_with(
            cfg(1, 2),
            HandlerFn::arc("events", |n: u8| async move {
                if n == 0 { Err(JobError::fail("zero")) } else { Ok(n) }
            }),
            bus,
        );
        pool.submit(0).await.unwrap();
        pool.submit(1).await.unwrap();
        pool.close();
        let _: Vec<_> = pool.collect().collect().await;

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev.source.as_deref(), Some("events"));
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::WorkerStarted));
        assert!(kinds.contains(&EventKind::PoolClosed));
        assert!(kinds.contains(&EventKind::JobFailed));
        assert!(kinds.contains(&EventKind::JobCompleted));
        assert_eq!(kinds.last(), Some(&EventKind::WorkerStopped));
    }
}
