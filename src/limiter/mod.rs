//! Rate limiting.
//!
//! - [`RateLimiter`] interval-paced permits with a bounded burst buffer
//! - [`LimiterStats`] granted/dropped/available accounting

mod limiter;

pub use limiter::{LimiterStats, RateLimiter};
