//! # One pool worker.
//!
//! ```text
//! loop {
//!   ├─► lock shared job receiver, recv()     (None ⇒ closed and drained ⇒ exit)
//!   ├─► publish JobStarted
//!   ├─► handler.handle(job)  (panic caught ⇒ JobError::Panicked)
//!   ├─► publish JobCompleted / JobFailed
//!   └─► results.send(outcome)                (reader gone ⇒ exit)
//! }
//! publish WorkerStopped; DoneGuard retires this worker from the pool barrier
//! ```
//!
//! ## Rules
//! - Exactly one outcome per claimed job, published before the next claim.
//! - A failing or panicking job never ends the worker.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{Mutex, mpsc};

use crate::{
    error::JobError,
    events::{Bus, Event, EventKind},
    pool::handler::HandlerRef,
    pool::core::{Envelope, JobOutcome},
    subscribers::panic_message,
    sync::DoneGuard,
};

/// Receiver shared by all workers of a pool (multi-consumer).
pub(crate) type SharedJobs<J> = Arc<Mutex<mpsc::Receiver<Envelope<J>>>>;

pub(crate) struct Worker<J, R> {
    pub id: usize,
    pub pool: Arc<str>,
    pub handler: HandlerRef<J, R>,
    pub jobs: SharedJobs<J>,
    pub results: mpsc::Sender<JobOutcome<R>>,
    pub bus: Bus,
    pub guard: DoneGuard,
}

impl<J, R> Worker<J, R>
where
    J: Send + 'static,
    R: Send + 'static,
{
    /// Runs until the job queue is closed and drained, or the result reader is gone.
    pub async fn run(self) {
        self.publish(Event::new(EventKind::WorkerStarted));
        let mut processed: u64 = 0;

        loop {
            let next = {
                let mut rx = self.jobs.lock().await;
                rx.recv().await
            };
            let Some(Envelope { id, job }) = next else {
                break;
            };

            self.publish(Event::new(EventKind::JobStarted).with_job(id));
            let handler = Arc::clone(&self.handler);
            let result = match AssertUnwindSafe(async move { handler.handle(job).await })
                .catch_unwind()
                .await
            {
                Ok(res) => res,
                Err(panic_err) => Err(JobError::Panicked {
                    info: panic_message(panic_err.as_ref()),
                }),
            };

            match &result {
                Ok(_) => self.publish(Event::new(EventKind::JobCompleted).with_job(id)),
                Err(e) => self.publish(
                    Event::new(EventKind::JobFailed)
                        .with_job(id)
                        .with_reason(e.to_string()),
                ),
            }
            processed += 1;

            let outcome = JobOutcome {
                job: id,
                worker: self.id,
                result,
            };
            if self.results.send(outcome).await.is_err() {
                break;
            }
        }

        self.publish(Event::new(EventKind::WorkerStopped).with_count(processed));
        // Close our half of the result queue before the barrier can reach zero.
        drop(self.results);
        drop(self.guard);
    }

    fn publish(&self, ev: Event) {
        self.bus
            .publish(ev.with_source(Arc::clone(&self.pool)).with_worker(self.id));
    }
}
