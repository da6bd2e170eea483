//! # Example: pipeline
//!
//! Everything wired through one [`Coordinator`]:
//! - a rate limiter paces a producer
//! - a worker pool fetches "pages"; handlers count hits in a state actor
//! - a ticker flushes metrics every second
//! - the caller waits for results under a deadline
//! - `LogWriter` turns every runtime event into a `tracing` record
//!
//! ## Flow
//! ```text
//! producer ─ acquire() ─► RateLimiter
//!     └─ submit(url) ─► WorkerPool("fetch") ─► StateActor("hits")
//!                            └─► Results ─► race(recv, 500ms)
//! Ticker("flush") ─► Metrics::snapshot()
//! every component ─► Bus ─► LogWriter + Metrics
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example pipeline --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use corral::{
    Config, Coordinator, HandlerFn, JobError, LimiterConfig, LogWriter, Metrics, PoolConfig,
    Raced, StateActor, Subscribe, race,
};

const PAGES: [&str; 4] = ["/", "/about", "/blog", "/missing"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut cfg = Config::default();
    cfg.pool = PoolConfig {
        workers: 3,
        job_capacity: 8,
        result_capacity: 8,
    };
    cfg.limiter = LimiterConfig::every(Duration::from_millis(100)).with_burst(3);
    cfg.grace = Duration::from_secs(2);

    let metrics = Arc::new(Metrics::new());
    let subs: Vec<Arc<dyn Subscribe>> = vec![
        Arc::new(LogWriter::new()) as Arc<dyn Subscribe>,
        metrics.clone(),
    ];
    let coord = Coordinator::builder(cfg).with_subscribers(subs).build();

    let hits: StateActor<&'static str, u64> = coord.state_actor("hits");
    let limiter = coord.rate_limiter("producer");
    let cancel = coord.cancellation();

    let store = hits.clone();
    let pool = coord.worker_pool(HandlerFn::arc("fetch", move |page: &'static str| {
        let store = store.clone();
        let cancel = cancel.clone();
        async move {
            if page == "/missing" {
                return Err(JobError::fail("404"));
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(JobError::Canceled),
                _ = tokio::time::sleep(Duration::from_millis(150)) => {}
            }
            let n = store
                .read(page)
                .await
                .map_err(|e| JobError::fail(e.to_string()))?;
            store
                .write(page, n + 1)
                .await
                .map_err(|e| JobError::fail(e.to_string()))?;
            Ok::<_, JobError>(page.len())
        }
    }));

    let (mut ticks, flush_stop) = coord.ticker("flush", Duration::from_secs(1));
    let flusher = {
        let metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            while let Some(tick) = ticks.recv().await {
                println!("[flush #{}] {:?}", tick.seq, metrics.snapshot());
            }
        })
    };

    let submitter = pool.submitter();
    let producer = tokio::spawn(async move {
        for i in 0..20 {
            if limiter.acquire().await.is_err() {
                break;
            }
            if submitter.submit(PAGES[i % PAGES.len()]).await.is_err() {
                break;
            }
        }
        submitter.close();
    });

    let mut results = pool.collect();
    let mut done = 0usize;
    loop {
        match race(results.recv(), Duration::from_millis(500)).await {
            Raced::Completed(Some(outcome)) => {
                done += 1;
                println!(
                    "[result] job={} worker={} -> {:?}",
                    outcome.job, outcome.worker, outcome.result
                );
            }
            Raced::Completed(None) => break,
            Raced::TimedOut(after) => println!("[result] nothing for {after:?}, still waiting"),
        }
    }
    producer.await?;

    println!("[hits] {:?}", hits.snapshot().await?);
    println!("[done] {done} outcomes");

    flush_stop.stop();
    flusher.await?;
    coord.shutdown().await?;
    println!("[metrics] {:?}", metrics.snapshot());
    Ok(())
}
