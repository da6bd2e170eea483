//! # Time-driven coordination.
//!
//! - [`race`] / [`race_signal`]: bound how long a caller waits for an operation
//! - [`Ticker`]: periodic ticks until stopped
//! - [`Timer`]: one delayed firing that can be cancelled

mod deadline;
mod ticker;
mod timer;

pub use deadline::{Completer, Raced, Signal, race, race_signal, signal, spawn_signal};
pub use ticker::{StopHandle, Tick, Ticker, Ticks};
pub use timer::{Fired, Timer, TimerHandle};
