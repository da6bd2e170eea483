//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: pool workers, `RateLimiter`, `StateActor`, `Ticker`,
//!   `Coordinator`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the coordinator's listener, which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
