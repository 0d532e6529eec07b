//! # Example: basic_worker
//!
//! Starts, stops and restarts a polling worker.
//!
//! Shows how to:
//! - Wrap a closure as a [`Worker`] with [`WorkerFn`]
//! - Observe idempotent `start()`/`stop()` results
//! - Route lifecycle events to `tracing` through [`LogWriter`]
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Supervisor::builder(cfg).with_subscribers([LogWriter]).build()
//!   ├─► sup.worker(ticker)                → key = "single-worker-<uuid>"
//!   ├─► start() → true, start() → false  (already running)
//!   ├─► stop()  → true                   (body observed cancellation)
//!   ├─► stop()  → false                  (already idle)
//!   └─► start() → true, stop() → true    (restart)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=workvisor=trace cargo run --example basic_worker
//! ```

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use workvisor::{Config, Subscribe, Supervisor, WorkerError, WorkerFn, WorkerRef};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("workvisor=trace")),
        )
        .init();

    // 1. Optional: forward events to tracing (requires "logging" feature)
    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(workvisor::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();

    let sup = Supervisor::builder(Config::default())
        .with_subscribers(subs)
        .build();

    // 2. A body that ticks until its token is cancelled
    let ticker: WorkerRef = WorkerFn::arc("ticker", |ctx: CancellationToken| async move {
        let mut n = 0u32;
        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    println!("[ticker] cancelled after {n} ticks");
                    return Err::<(), _>(WorkerError::Canceled);
                }
                _ = tokio::time::sleep(Duration::from_millis(100)) => {
                    n += 1;
                    println!("[ticker] tick #{n}");
                }
            }
        }
    });

    let worker = sup.worker(ticker);
    println!("worker '{}' uses key {}", worker.worker_name(), worker.lock_key());

    // 3. Idempotent start
    println!("start -> {}", worker.start().await);
    println!("start again -> {}", worker.start().await);
    tokio::time::sleep(Duration::from_millis(350)).await;

    // 4. Stop waits for the body (StopMode::Wait)
    println!("stop -> {}", worker.stop().await);
    println!("stop again -> {}", worker.stop().await);
    println!("state: {}", worker.state().as_label());

    // 5. Restart
    println!("restart -> {}", worker.start().await);
    tokio::time::sleep(Duration::from_millis(150)).await;
    println!("stop -> {}", worker.stop().await);

    // Let subscribers drain.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
