//! # Diagnostics events emitted by the worker lifecycle.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Control events**: `start`/`stop` calls and their outcome
//! - **Task events**: the detached worker body (started, finished, failed)
//! - **Subscriber events**: delivery problems inside the fan-out
//!
//! The [`Event`] struct carries the structured payload: origin label, worker name,
//! lock key, message and optional failure detail.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use workvisor::{Event, EventKind, Severity};
//!
//! let ev = Event::new(EventKind::WorkerFailed)
//!     .with_origin("worker_task")
//!     .with_worker("indexer")
//!     .with_error("disk full");
//!
//! assert_eq!(ev.severity(), Severity::Critical);
//! assert_eq!(ev.worker.as_deref(), Some("indexer"));
//! assert_eq!(ev.error.as_deref(), Some("disk full"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Severity of an event, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Verbose lifecycle tracing.
    Trace,
    /// Diagnostic detail.
    Debug,
    /// Something was dropped or misbehaved but the runtime is fine.
    Warning,
    /// A worker failure was contained; needs attention.
    Critical,
}

impl Severity {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Control events ===
    /// `start()` was called.
    ///
    /// Sets:
    /// - `worker`, `key`
    StartRequested,

    /// `start()` found the worker already running and did nothing.
    ///
    /// Sets:
    /// - `worker`, `key`
    StartIgnored,

    /// `start()` is launching a new run.
    ///
    /// Sets:
    /// - `worker`, `key`
    Starting,

    /// `stop()` is cancelling the current run.
    ///
    /// Sets:
    /// - `worker`, `key`
    StopRequested,

    /// `stop()` found the worker idle and did nothing.
    ///
    /// Sets:
    /// - `worker`, `key`
    StopIgnored,

    /// `stop()` returned. Reported at [`Severity::Debug`].
    ///
    /// Sets:
    /// - `worker`, `key`
    /// - `message`: `"finished"` or `"still running"`
    Stopped,

    // === Task events ===
    /// The detached worker body started.
    ///
    /// Sets:
    /// - `worker`
    TaskStarted,

    /// The detached worker body returned (normally, cancelled or failed).
    ///
    /// Sets:
    /// - `worker`
    /// - `message`: outcome label
    TaskFinished,

    /// The worker body failed or panicked; the failure was contained.
    ///
    /// Sets:
    /// - `worker`
    /// - `message`: summary naming the worker
    /// - `error`: failure detail
    WorkerFailed,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `worker`: subscriber name
    /// - `error`: panic info
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `worker`: subscriber name
    /// - `message`: reason (`"full"`, `"closed"`)
    SubscriberOverflow,
}

impl EventKind {
    /// Returns the severity of this kind.
    pub fn severity(&self) -> Severity {
        match self {
            EventKind::WorkerFailed => Severity::Critical,
            EventKind::Stopped => Severity::Debug,
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => Severity::Warning,
            _ => Severity::Trace,
        }
    }

    /// Returns a short stable label (kebab-case).
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::StartRequested => "start-requested",
            EventKind::StartIgnored => "start-ignored",
            EventKind::Starting => "starting",
            EventKind::StopRequested => "stop-requested",
            EventKind::StopIgnored => "stop-ignored",
            EventKind::Stopped => "stopped",
            EventKind::TaskStarted => "task-started",
            EventKind::TaskFinished => "task-finished",
            EventKind::WorkerFailed => "worker-failed",
            EventKind::SubscriberPanicked => "subscriber-panicked",
            EventKind::SubscriberOverflow => "subscriber-overflow",
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Label of the emitting operation (`start`, `stop`, `worker_task`, `subscriber`).
    pub origin: &'static str,
    /// Name of the worker (or subscriber), if applicable.
    pub worker: Option<Arc<str>>,
    /// Lock key of the worker, if applicable.
    pub key: Option<Arc<str>>,
    /// Human-readable message.
    pub message: Option<Arc<str>>,
    /// Failure detail.
    pub error: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            origin: "",
            worker: None,
            key: None,
            message: None,
            error: None,
        }
    }

    /// Returns the severity of this event.
    #[inline]
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Attaches the origin label.
    #[inline]
    pub fn with_origin(mut self, origin: &'static str) -> Self {
        self.origin = origin;
        self
    }

    /// Attaches a worker name.
    #[inline]
    pub fn with_worker(mut self, worker: impl Into<Arc<str>>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    /// Attaches a lock key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a human-readable message.
    #[inline]
    pub fn with_message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches failure detail.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_origin("subscriber")
            .with_worker(subscriber)
            .with_message(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_origin("subscriber")
            .with_worker(subscriber)
            .with_error(info)
    }

    /// Returns `true` for [`EventKind::SubscriberOverflow`] events.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::Starting);
        let b = Event::new(EventKind::Starting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(EventKind::WorkerFailed.severity(), Severity::Critical);
        assert_eq!(EventKind::SubscriberOverflow.severity(), Severity::Warning);
        assert_eq!(EventKind::StartIgnored.severity(), Severity::Trace);
        assert_eq!(EventKind::Stopped.severity(), Severity::Debug);
        assert!(Severity::Critical > Severity::Warning);
    }

    #[test]
    fn test_subscriber_helpers() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.origin, "subscriber");
        assert_eq!(ev.message.as_deref(), Some("full"));

        let ev = Event::subscriber_panicked("audit", "oops".into());
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.error.as_deref(), Some("oops"));
    }
}
