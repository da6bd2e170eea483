//! Error types used by the coordination primitives.
//!
//! - [`SubmitError`]: a job could not be enqueued into a worker pool.
//! - [`JobError`]: a single job failed; reported inside its result, never fatal to the pool.
//! - [`StateError`]: a request reached an owned-state actor that is no longer running.
//! - [`LimiterError`]: a rate limiter was stopped with no buffered permit left.
//! - [`SignalError`]: an operation dropped its completion signal without completing.
//! - [`RuntimeError`]: coordinator shutdown did not finish within its grace period.
//!
//! Every enum provides `as_label` (stable snake_case, for logs/metrics).
//! Timeouts are deliberately absent: a lost deadline race is an outcome
//! ([`Raced::TimedOut`](crate::Raced::TimedOut)), not an error.

use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the coordinator itself.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some component tasks were still running.
    #[error("shutdown timeout {grace:?} exceeded; {running} component task(s) still running")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Component tasks that had not exited yet.
        running: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use corral::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), running: 2 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// Error returned when submitting a job to a [`WorkerPool`](crate::WorkerPool).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The job queue is full (only returned by `try_submit`).
    #[error("job queue full")]
    Full,

    /// The pool was closed; no further jobs are accepted.
    #[error("job queue closed")]
    Closed,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Full => "submit_full",
            SubmitError::Closed => "submit_closed",
        }
    }
}

/// # Failure of one job.
///
/// Produced by a handler (or by the worker when the handler panics) and
/// delivered as the `Err` side of a [`JobOutcome`](crate::JobOutcome).
/// A failing job never affects other jobs or workers.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Handler reported a failure.
    #[error("job failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Handler panicked; the worker caught it and kept running.
    #[error("job panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Handler gave up because it observed a cancellation signal.
    #[error("job cancelled")]
    Canceled,
}

impl JobError {
    /// Shorthand for [`JobError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        JobError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use corral::JobError;
    ///
    /// assert_eq!(JobError::fail("boom").as_label(), "job_failed");
    /// assert_eq!(JobError::Canceled.as_label(), "job_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::Fail { .. } => "job_failed",
            JobError::Panicked { .. } => "job_panicked",
            JobError::Canceled => "job_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            JobError::Fail { error } => format!("error: {error}"),
            JobError::Panicked { info } => format!("panic: {info}"),
            JobError::Canceled => "cancelled".to_string(),
        }
    }
}

/// Error returned by owned-state requests.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// The owner stopped; the request was rejected instead of being applied.
    #[error("state owner closed")]
    Closed,
}

impl StateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StateError::Closed => "state_closed",
        }
    }
}

/// Error returned by [`RateLimiter::acquire`](crate::RateLimiter::acquire).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterError {
    /// Permit generation stopped and every buffered permit was already taken.
    #[error("rate limiter stopped")]
    Stopped,
}

impl LimiterError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LimiterError::Stopped => "limiter_stopped",
        }
    }
}

/// Error returned by a [`Signal`](crate::Signal) whose completer went away.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    /// The [`Completer`](crate::Completer) was dropped without completing.
    #[error("completion signal dropped")]
    Dropped,
}

impl SignalError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SignalError::Dropped => "signal_dropped",
        }
    }
}
