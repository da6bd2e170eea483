//! # Example: worker_pool
//!
//! Three workers process five jobs that each take one second. The whole batch
//! finishes in about two seconds instead of five.
//!
//! ## Flow
//! ```text
//! submit(1..=5) ──► [job queue] ──► worker 0..2 ──► [result queue] ──► Results
//! close()                                                   └─ ends after the last worker exits
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example worker_pool
//! ```

use std::time::{Duration, Instant};

use futures::StreamExt;

use corral::{HandlerFn, JobError, PoolConfig, WorkerPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let pool = WorkerPool::start(
        PoolConfig {
            workers: 3,
            job_capacity: 5,
            result_capacity: 5,
        },
        HandlerFn::arc("double", |n: u64| async move {
            println!("[job] started  {n}");
            tokio::time::sleep(Duration::from_secs(1)).await;
            println!("[job] finished {n}");
            Ok::<_, JobError>(n * 2)
        }),
    );

    let start = Instant::now();
    for n in 1..=5 {
        pool.submit(n).await?;
    }
    pool.close();

    let mut results = pool.collect();
    while let Some(outcome) = results.next().await {
        println!(
            "[result] job={} worker={} -> {:?}",
            outcome.job, outcome.worker, outcome.result
        );
    }

    println!("[done] 5 jobs in {:?}", start.elapsed());
    Ok(())
}
