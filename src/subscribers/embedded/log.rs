//! # LogWriter: forward events to `tracing`
//!
//! A subscriber that turns every [`Event`] into a `tracing` event at the level
//! matching its [`Severity`], with the payload as structured fields.
//!
//! | Severity   | tracing level |
//! |------------|---------------|
//! | `Trace`    | `TRACE`       |
//! | `Debug`    | `DEBUG`       |
//! | `Warning`  | `WARN`        |
//! | `Critical` | `ERROR`       |
//!
//! ## Example output (fmt subscriber)
//! ```text
//! TRACE workvisor: start-requested origin="start" worker="indexer" key="single-worker-6f1c…"
//! TRACE workvisor: task-started origin="worker_task" worker="indexer"
//! DEBUG workvisor: stopped origin="stop" worker="indexer" message="finished"
//! ERROR workvisor: worker-failed origin="worker_task" worker="indexer" error="execution failed: disk full" message="unhandled failure in worker 'indexer'"
//! ```

use async_trait::async_trait;

use crate::events::{Event, Severity};
use crate::subscribers::Subscribe;

/// Event writer subscriber backed by `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let kind = e.kind.as_label();
        let worker = e.worker.as_deref().unwrap_or("");
        let key = e.key.as_deref().unwrap_or("");
        let message = e.message.as_deref().unwrap_or("");
        let error = e.error.as_deref().unwrap_or("");

        match e.severity() {
            Severity::Critical => {
                tracing::error!(target: "workvisor", seq = e.seq, origin = e.origin, worker, key, message, error, "{kind}")
            }
            Severity::Warning => {
                tracing::warn!(target: "workvisor", seq = e.seq, origin = e.origin, worker, key, message, error, "{kind}")
            }
            Severity::Debug => {
                tracing::debug!(target: "workvisor", seq = e.seq, origin = e.origin, worker, key, message, "{kind}")
            }
            Severity::Trace => {
                tracing::trace!(target: "workvisor", seq = e.seq, origin = e.origin, worker, key, message, "{kind}")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
