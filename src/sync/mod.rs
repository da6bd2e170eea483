//! Shared-counter primitives.
//!
//! ## Contents
//! - [`CompletionBarrier`] / [`DoneGuard`] fan-out/fan-in completion tracking
//! - [`OpCounter`] atomic operation accounting

mod barrier;
mod counter;

pub use barrier::{CompletionBarrier, DoneGuard};
pub use counter::OpCounter;
