//! # Example: failing_worker
//!
//! A worker whose body fails or panics never takes the caller down.
//!
//! The failure is reported once as a `WorkerFailed` event (logged at ERROR by
//! [`LogWriter`]), the worker returns to idle and can be started again.
//!
//! ## Run
//! ```bash
//! cargo run --example failing_worker
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use tokio_util::sync::CancellationToken;
use workvisor::{Config, EventKind, Subscribe, Supervisor, WorkerError, WorkerFn, WorkerRef};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("workvisor=info").init();

    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(workvisor::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();

    let sup = Supervisor::builder(Config::default())
        .with_subscribers(subs)
        .build();
    let mut events = sup.subscribe();

    // Odd runs fail, even runs panic.
    let attempts = Arc::new(AtomicU32::new(0));
    let a = Arc::clone(&attempts);
    let flaky: WorkerRef = WorkerFn::arc("flaky", move |_ctx: CancellationToken| {
        let n = a.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if n % 2 == 0 {
                panic!("run {n} hit an invariant violation");
            }
            Err::<(), _>(WorkerError::fail(format!("run {n} could not reach upstream")))
        }
    });

    let worker = sup.worker(flaky);
    for _ in 0..2 {
        println!("start -> {}", worker.start().await);
        let finished = worker.wait_finished(Some(Duration::from_secs(5)), None).await?;
        println!("finished -> {finished}, running -> {}", worker.is_running());
    }

    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::WorkerFailed {
            println!(
                "contained failure of '{}': {}",
                ev.worker.as_deref().unwrap_or("?"),
                ev.error.as_deref().unwrap_or("")
            );
        }
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
