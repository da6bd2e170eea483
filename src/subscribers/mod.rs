//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out and the built-in subscribers fed by a
//! [`Coordinator`](crate::Coordinator)'s [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   pool / limiter / actor / ticker ── publish(Event) ──► Bus
//!                                                          │
//!                                                coordinator listener
//!                                                          │
//!                                                   SubscriberSet::emit
//!                                                          │
//!                                     ┌────────────────────┼───────────────┐
//!                                     ▼                    ▼               ▼
//!                                  Metrics            LogWriter        Custom ...
//! ```
//!
//! ## Built-ins
//! - [`Metrics`]: per-kind counters, readable at any time through [`Metrics::snapshot`]
//! - [`LogWriter`] (feature `logging`): one `tracing` record per event

mod metrics;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use metrics::{Metrics, MetricsSnapshot};
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;

pub(crate) use subscriber_set::panic_message;
