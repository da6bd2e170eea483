//! # Job handlers and the function-backed implementation.
//!
//! A [`Handler`] turns one job `J` into either a result `R` or a [`JobError`].
//! [`HandlerFn`] wraps a closure `Fn(J) -> Fut`, producing a fresh future per
//! job; [`HandlerRef`] is the shared `Arc<dyn Handler>` handed to every worker.
//!
//! ## Example
//! ```rust
//! use corral::{HandlerFn, HandlerRef, JobError};
//!
//! let double: HandlerRef<u64, u64> = HandlerFn::arc("double", |n: u64| async move {
//!     n.checked_mul(2).ok_or_else(|| JobError::fail("overflow"))
//! });
//! assert_eq!(double.name(), "double");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::JobError;

/// Boxed future returned by [`Handler::handle`].
pub type BoxJobFuture<R> = Pin<Box<dyn Future<Output = Result<R, JobError>> + Send + 'static>>;

/// Shared handle to a handler.
pub type HandlerRef<J, R> = Arc<dyn Handler<J, R>>;

/// Processes one job.
///
/// Called concurrently from every worker of a pool; keep shared state behind
/// `Arc` (or talk to a [`StateActor`](crate::StateActor)).
pub trait Handler<J, R>: Send + Sync + 'static {
    /// Returns a stable, human-readable name (used as the pool name).
    fn name(&self) -> &str;

    /// Creates the future that processes `job`.
    fn handle(&self, job: J) -> BoxJobFuture<R>;
}

/// Function-backed handler.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared `Arc`.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut, J, R> Handler<J, R> for HandlerFn<F>
where
    F: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, JobError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, job: J) -> BoxJobFuture<R> {
        Box::pin((self.f)(job))
    }
}
