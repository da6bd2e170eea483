//! End-to-end coordination: a paced producer feeds a worker pool whose handler
//! updates owned state, a ticker drives periodic flushes, and a deadline race
//! bounds how long the caller waits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;

use corral::{
    CompletionBarrier, Config, Coordinator, HandlerFn, JobError, LimiterConfig, LockedStore,
    Metrics, OpCounter, PoolConfig, Raced, StateActor, StateStore, Subscribe, race, spawn_signal,
};

fn coordinator_with_metrics(cfg: Config) -> (Coordinator, Arc<Metrics>) {
    let metrics = Arc::new(Metrics::new());
    let coord = Coordinator::builder(cfg)
        .with_subscribers(vec![metrics.clone() as Arc<dyn Subscribe>])
        .build();
    (coord, metrics)
}

#[tokio::test(start_paused = true)]
async fn paced_jobs_update_owned_state_exactly_once() {
    let mut cfg = Config::default();
    cfg.pool = PoolConfig {
        workers: 3,
        job_capacity: 4,
        result_capacity: 4,
    };
    cfg.limiter = LimiterConfig::every(Duration::from_millis(100)).with_burst(2);
    let (coord, metrics) = coordinator_with_metrics(cfg);

    let totals: StateActor<&'static str, u64> = coord.state_actor("totals");
    let limiter = coord.rate_limiter("producer");

    let store = totals.clone();
    let pool = coord.worker_pool(HandlerFn::arc("tally", move |n: u64| {
        let store = store.clone();
        async move {
            let key = if n % 2 == 0 { "even" } else { "odd" };
            let cur = store
                .read(key)
                .await
                .map_err(|e| JobError::fail(e.to_string()))?;
            store
                .write(key, cur + n)
                .await
                .map_err(|e| JobError::fail(e.to_string()))?;
            Ok::<_, JobError>(n)
        }
    }));

    let submitter = pool.submitter();
    let start = Instant::now();
    let producer = tokio::spawn(async move {
        for n in 1..=10u64 {
            limiter.acquire().await.expect("limiter running");
            submitter.submit(n).await.expect("pool open");
        }
        submitter.close();
    });

    let outcomes: Vec<_> = pool.collect().collect().await;
    producer.await.expect("producer");

    // 2 prefilled permits, then one per 100ms for the remaining 8.
    assert!(Instant::now() - start >= Duration::from_millis(800));

    let mut jobs: Vec<u64> = outcomes.iter().map(|o| o.job).collect();
    jobs.sort_unstable();
    assert_eq!(jobs, (0..10).collect::<Vec<_>>());
    assert!(outcomes.iter().all(|o| o.is_ok()));

    // The handler's read-modify-write is not atomic across jobs, so only the
    // per-request guarantees are checked: every value the actor holds is a
    // sum of some subset of inputs and the map has exactly the two keys.
    let snap = totals.snapshot().await.expect("actor running");
    assert_eq!(snap.len(), 2);
    assert!(snap["even"] <= 2 + 4 + 6 + 8 + 10);
    assert!(snap["odd"] <= 1 + 3 + 5 + 7 + 9);

    coord.shutdown().await.expect("clean shutdown");
    let m = metrics.snapshot();
    assert_eq!(m.jobs_completed, 10);
    assert_eq!(m.workers_started, 3);
    assert_eq!(m.workers_stopped, 3);
    assert_eq!(m.shutdowns, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_through_both_stores() {
    async fn hammer(store: Arc<dyn StateStore<u8, u64>>, ops: &OpCounter) {
        let barrier = CompletionBarrier::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let guard = barrier.guard();
            tokio::spawn(async move {
                let _guard = guard;
                for k in 0..4u8 {
                    let v = store.read(k).await.expect("read");
                    store.write(k, v).await.expect("write");
                }
            });
            ops.add(8);
        }
        barrier.wait().await;
    }

    let coord = Coordinator::builder(Config::default()).build();
    let actor: StateActor<u8, u64> = coord.state_actor("kv");
    let locked: LockedStore<u8, u64> = LockedStore::new();
    let ops = OpCounter::new();

    hammer(Arc::new(actor.clone()), &ops).await;
    hammer(Arc::new(locked.clone()), &ops).await;

    assert_eq!(ops.get(), 2 * 8 * 8);
    assert_eq!(actor.stats().reads, 32);
    assert_eq!(actor.stats().writes, 32);
    assert_eq!(locked.stats().reads, 32);
    assert_eq!(locked.stats().writes, 32);

    coord.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn ticker_drives_periodic_flush_until_shutdown() {
    let (coord, metrics) = coordinator_with_metrics(Config::default());
    let counts: StateActor<&'static str, u64> = coord.state_actor("counts");
    let (mut ticks, stop) = coord.ticker("flush", Duration::from_secs(1));

    let flusher = {
        let counts = counts.clone();
        tokio::spawn(async move {
            let mut flushed = HashMap::new();
            while let Some(tick) = ticks.recv().await {
                let n = counts.read("hits").await.unwrap_or_default();
                flushed.insert(tick.seq, n);
            }
            flushed
        })
    };

    for _ in 0..3 {
        let n = counts.read("hits").await.expect("read");
        counts.write("hits", n + 1).await.expect("write");
        tokio::time::sleep(Duration::from_millis(1500)).await;
    }

    stop.stop();
    let flushed = flusher.await.expect("flusher");
    assert!(flushed.len() >= 3, "flushed {} times", flushed.len());
    assert_eq!(flushed.values().max().copied(), Some(3));

    coord.shutdown().await.expect("clean shutdown");
    assert!(metrics.snapshot().ticks_emitted >= 3);
}

#[tokio::test(start_paused = true)]
async fn slow_job_loses_deadline_race_without_blocking() {
    let coord = Coordinator::builder(Config::default()).build();
    let pool = coord.worker_pool(HandlerFn::arc("slow", |d: u64| async move {
        tokio::time::sleep(Duration::from_secs(d)).await;
        Ok::<_, JobError>(d)
    }));
    pool.submit(5).await.expect("submit");
    pool.close();
    let mut results = pool.collect();

    let first = race(results.recv(), Duration::from_secs(1)).await;
    assert!(first.is_timed_out());

    // The job keeps running and its outcome is still delivered.
    let outcome = results.recv().await.expect("outcome");
    assert_eq!(outcome.result, Ok(5));

    let quick = spawn_signal(async { "pong" });
    assert_eq!(
        race(quick, Duration::from_secs(1)).await,
        Raced::Completed(Ok("pong"))
    );

    coord.shutdown().await.expect("clean shutdown");
}
