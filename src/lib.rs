//! # workvisor
//!
//! **Workvisor** provides keyed async mutual exclusion and a restartable,
//! single-instance background worker built on top of it.
//!
//! - [`KeyedMutex`] guarantees that work identified by a key is never executed by
//!   more than N concurrent callers.
//! - [`SingleWorker`] starts, stops and restarts a long-running [`Worker`] body
//!   exactly once at a time, from any task or thread, and contains every failure
//!   of the detached body.
//! - [`wait_handle`] turns a blocking [`WaitHandle`] (such as [`ManualResetEvent`])
//!   into an awaitable with an optional timeout and cancellation.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Worker    │   │    Worker    │   │    Worker    │
//!     │  (user #1)   │   │  (user #2)   │   │  (user #3)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - Bus (broadcast events)                                         │
//! │  - KeyedMutex (one semaphore per lock key, never evicted)         │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │ SingleWorker │   │ SingleWorker │   │ SingleWorker │   │
//!     │ key = uuid#1 │   │ key = uuid#2 │   │ key = "grp"  │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ Publishes:       │                  │                 │
//!      │ - StartRequested │                  │                 │
//!      │ - Starting       │                  │                 │
//!      │ - TaskStarted    │                  │                 │
//!      │ - WorkerFailed   │                  │                 │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                    LogWriter   Metrics    Custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! start():  lock(key) ─► Idle? ─► new token + finished signal ─► spawn body ─► true
//!                     └► busy  ─► StartIgnored ─► false
//!
//! body:     run(ctx) (panics caught)
//!             ├─ Ok / Canceled by our token ─► TaskFinished
//!             └─ failure or panic            ─► WorkerFailed ─► TaskFinished
//!           finally: state = Idle, finished signal set
//!
//! stop():   lock(key) ─► Idle? ─► StopIgnored ─► false
//!                     └► cancel token ─► wait finished (StopMode) ─► Stopped ─► finished?
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Keyed locking** | Per-key semaphores with 1..N slots, FIFO waiters.            | [`KeyedMutex`], [`KeyGuard`]                |
//! | **Workers**       | Restartable single-instance lifecycle with failure isolation.| [`SingleWorker`], [`Worker`], [`WorkerFn`]  |
//! | **Wait bridge**   | Await blocking handles with timeout and cancellation.        | [`wait_handle`], [`ManualResetEvent`]       |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom).       | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors for worker bodies and waits.                    | [`WorkerError`], [`WaitError`]              |
//! | **Configuration** | Centralize runtime settings.                                 | [`Config`], [`StopMode`]                    |
//!
//! ## Optional features
//! - `logging` (default): exports a built-in [`LogWriter`] that forwards events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use workvisor::{Config, Supervisor, WorkerError, WorkerFn, WorkerRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn workvisor::Subscribe>> = vec![Arc::new(workvisor::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn workvisor::Subscribe>> = Vec::new();
//!
//!     let sup = Supervisor::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let ticker: WorkerRef = WorkerFn::arc("ticker", |ctx: CancellationToken| async move {
//!         while !ctx.is_cancelled() {
//!             tokio::time::sleep(Duration::from_millis(10)).await;
//!         }
//!         Err::<(), _>(WorkerError::Canceled)
//!     });
//!
//!     let worker = sup.worker(ticker);
//!     assert!(worker.start().await);
//!     assert!(worker.stop().await);
//!     assert!(!worker.is_running());
//!
//!     let n = sup.locks().run_exclusive("report.csv", || async { 7 }).await;
//!     assert_eq!(n, 7);
//! }
//! ```
mod core;
mod error;
mod events;
mod subscribers;
mod sync;
mod workers;

// ---- Public re-exports ----

pub use crate::core::{Config, SingleWorker, StopMode, Supervisor, SupervisorBuilder, WorkerState};
pub use error::{WaitError, WorkerError};
pub use events::{Bus, Event, EventKind, Severity};
pub use subscribers::{Subscribe, SubscriberSet};
pub use sync::{
    KeyGuard, KeyedMutex, ManualResetEvent, RegistrationKey, SignalCallback, WaitHandle,
    wait_handle,
};
pub use workers::{Worker, WorkerFn, WorkerRef};

// Optional: expose the built-in tracing subscriber.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
