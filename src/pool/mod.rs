//! Bounded worker pools.
//!
//! ## Contents
//! - [`WorkerPool`] fixed workers over a bounded job queue and a bounded result queue
//! - [`Submitter`] cloneable intake handle (`submit`, `try_submit`, `close`)
//! - [`Results`] completion-ordered outcome stream
//! - [`Handler`], [`HandlerFn`], [`HandlerRef`] the per-job work
//!
//! ## Quick wiring
//! ```text
//! HandlerFn::arc(name, |job| async { .. })
//!      └─► WorkerPool::start(PoolConfig, handler)
//!           ├─► submit / try_submit / close
//!           └─► collect() ─► Results (Stream<Item = JobOutcome<R>>)
//! ```

mod core;
mod handler;
mod worker;

pub use self::core::{JobId, JobOutcome, Results, Submitter, WorkerPool};
pub use handler::{BoxJobFuture, Handler, HandlerFn, HandlerRef};
