//! # Example: rate_limit
//!
//! Two limiters over the same five requests:
//! - steady: one request every 200ms
//! - bursty: three requests at once, then one every 200ms
//!
//! ## Run
//! ```bash
//! cargo run --example rate_limit
//! ```

use std::time::{Duration, Instant};

use corral::{LimiterConfig, RateLimiter};

async fn serve(label: &str, limiter: &RateLimiter) -> anyhow::Result<()> {
    let start = Instant::now();
    for req in 1..=5 {
        limiter.acquire().await?;
        println!("[{label}] request {req} at {:?}", start.elapsed());
    }
    limiter.stop();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let every = Duration::from_millis(200);

    let steady = RateLimiter::start(LimiterConfig::every(every).with_prefill(false));
    serve("steady", &steady).await?;

    let bursty = RateLimiter::start(LimiterConfig::every(every).with_burst(3));
    serve("bursty", &bursty).await?;

    println!("[stats] steady={:?}", steady.stats());
    println!("[stats] bursty={:?}", bursty.stats());
    Ok(())
}
