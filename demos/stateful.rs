//! # Example: stateful
//!
//! 100 readers and 10 writers share a map owned by one actor task, then do the
//! same against a lock-based store. Each side counts its operations.
//!
//! ## Flow
//! ```text
//! reader ×100 ──┐
//!               ├──► StateActor mailbox ──► owner task ──► HashMap
//! writer ×10 ───┘
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example stateful
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use corral::{ActorConfig, LockedStore, OpCounter, StateActor, StateStore};

const READERS: usize = 100;
const WRITERS: usize = 10;

async fn drive(
    store: Arc<dyn StateStore<u8, u32>>,
    run_for: Duration,
) -> anyhow::Result<(u64, u64)> {
    let reads = Arc::new(OpCounter::new());
    let writes = Arc::new(OpCounter::new());
    let deadline = tokio::time::Instant::now() + run_for;

    let mut handles = Vec::with_capacity(READERS + WRITERS);
    for _ in 0..READERS {
        let (store, reads) = (Arc::clone(&store), Arc::clone(&reads));
        handles.push(tokio::spawn(async move {
            while tokio::time::Instant::now() < deadline {
                let key = rand::rng().random_range(0..5u8);
                if store.read(key).await.is_err() {
                    break;
                }
                reads.incr();
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }));
    }
    for _ in 0..WRITERS {
        let (store, writes) = (Arc::clone(&store), Arc::clone(&writes));
        handles.push(tokio::spawn(async move {
            while tokio::time::Instant::now() < deadline {
                let (key, val) = {
                    let mut rng = rand::rng();
                    (rng.random_range(0..5u8), rng.random_range(0..100u32))
                };
                if store.write(key, val).await.is_err() {
                    break;
                }
                writes.incr();
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }));
    }

    for h in handles {
        h.await?;
    }
    Ok((reads.get(), writes.get()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let run_for = Duration::from_secs(1);

    let actor: StateActor<u8, u32> = StateActor::spawn(ActorConfig::default());
    let (reads, writes) = drive(Arc::new(actor.clone()), run_for).await?;
    println!("[actor]  reads={reads} writes={writes}");
    println!("[actor]  final={:?}", actor.snapshot().await?);
    actor.shutdown();

    let locked: LockedStore<u8, u32> = LockedStore::new();
    let (reads, writes) = drive(Arc::new(locked.clone()), run_for).await?;
    println!("[locked] reads={reads} writes={writes}");
    println!("[locked] final={:?}", locked.snapshot().await);
    Ok(())
}
