//! # Example: keyed_lock
//!
//! Serializes access to named resources with a [`KeyedMutex`].
//!
//! - Five writers share the key `"ledger"` and run one at a time.
//! - Six readers share `"cache"` with 3 slots and run three at a time.
//! - The two keys never block each other.
//!
//! ## Run
//! ```bash
//! cargo run --example keyed_lock
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use workvisor::KeyedMutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("workvisor=trace").init();

    let locks = Arc::new(KeyedMutex::new());
    let inside = Arc::new(AtomicUsize::new(0));
    let started = Instant::now();

    let mut handles = Vec::new();
    for i in 0..5 {
        let locks = Arc::clone(&locks);
        let inside = Arc::clone(&inside);
        handles.push(tokio::spawn(async move {
            locks
                .run_exclusive("ledger", || async {
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    println!("[writer {i}] holding ledger ({now} inside)");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
                .await;
        }));
    }

    for i in 0..6 {
        let locks = Arc::clone(&locks);
        handles.push(tokio::spawn(async move {
            let guard = locks.lock_with_slots("cache", 3).await;
            println!("[reader {i}] holding {}", guard.key());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }));
    }

    for h in handles {
        h.await?;
    }

    // Operation errors pass through unchanged.
    let res: Result<(), std::io::Error> = locks
        .run_exclusive("ledger", || async {
            Err(std::io::Error::other("ledger is read-only"))
        })
        .await;
    println!("failed op -> {:?}", res.err().map(|e| e.to_string()));

    println!(
        "done in {:?}; keys={} ledger free slots={:?}",
        started.elapsed(),
        locks.len(),
        locks.available("ledger")
    );
    Ok(())
}
