//! # Worker abstraction.
//!
//! This module defines the [`Worker`] trait, the body a
//! [`SingleWorker`](crate::SingleWorker) runs detached on every `start()`.
//! The common handle type is [`WorkerRef`], an `Arc<dyn Worker>` suitable for sharing across the runtime.
//!
//! A worker receives a [`CancellationToken`] and should periodically check it to
//! stop cooperatively once `stop()` is called.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;

/// Shared handle to a worker.
pub type WorkerRef = Arc<dyn Worker>;

/// # Asynchronous, cancelable worker body.
///
/// A `Worker` has a stable [`name`](Worker::name) and an async [`run`](Worker::run)
/// method that receives a fresh [`CancellationToken`] per start.
///
/// The default `run` completes immediately.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use workvisor::{Worker, WorkerError};
///
/// struct Poller;
///
/// #[async_trait]
/// impl Worker for Poller {
///     fn name(&self) -> &str { "poller" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), WorkerError> {
///         while !ctx.is_cancelled() {
///             tokio::select! {
///                 _ = ctx.cancelled() => break,
///                 _ = tokio::time::sleep(Duration::from_millis(250)) => { /* poll */ }
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Returns a stable, human-readable worker name used in diagnostics.
    fn name(&self) -> &str;

    /// Executes the worker body until completion or cancellation.
    ///
    /// Return `Err(WorkerError::Canceled)` (or `Ok(())`) once `ctx` is cancelled.
    /// Any other error, and any panic, is contained and reported as
    /// [`EventKind::WorkerFailed`](crate::EventKind::WorkerFailed).
    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkerError> {
        let _ = ctx;
        Ok(())
    }
}
