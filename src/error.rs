//! Error types used by workers and the wait bridge.
//!
//! This module defines two error enums:
//!
//! - [`WorkerError`] - errors returned by a worker body.
//! - [`WaitError`] - errors raised while awaiting a bridged [`WaitHandle`](crate::WaitHandle).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! Unhandled worker failures are **not** an error type: they are contained by the
//! supervisor and surface only as [`EventKind::WorkerFailed`](crate::EventKind::WorkerFailed).

use std::fmt::Display;

use thiserror::Error;

/// # Errors produced by a worker body.
///
/// A worker returns [`WorkerError::Canceled`] when it stops because its
/// cancellation token fired. Anything else is a failure.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker observed its cancellation token and exited early.
    #[error("context cancelled")]
    Canceled,

    /// Worker failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl WorkerError {
    /// Builds a [`WorkerError::Fail`] from any displayable error.
    ///
    /// # Example
    /// ```
    /// use workvisor::WorkerError;
    ///
    /// let err = WorkerError::fail("disk full");
    /// assert_eq!(err.to_string(), "execution failed: disk full");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        WorkerError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use workvisor::WorkerError;
    ///
    /// assert_eq!(WorkerError::Canceled.as_label(), "worker_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Canceled => "worker_canceled",
            WorkerError::Fail { .. } => "worker_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkerError::Canceled => "context cancelled".to_string(),
            WorkerError::Fail { error } => format!("error: {error}"),
        }
    }

    /// Returns `true` for [`WorkerError::Canceled`].
    pub fn is_canceled(&self) -> bool {
        matches!(self, WorkerError::Canceled)
    }
}

/// # Errors produced while awaiting a wait handle.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The caller's cancellation token fired before the handle was signaled
    /// or the timeout elapsed.
    #[error("wait cancelled")]
    Canceled,
}

impl WaitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WaitError::Canceled => "wait_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WaitError::Canceled => "wait cancelled by caller".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_keeps_message() {
        let err = WorkerError::fail(std::io::Error::other("boom"));
        assert_eq!(err.as_label(), "worker_failed");
        assert_eq!(err.as_message(), "error: boom");
        assert!(!err.is_canceled());
    }

    #[test]
    fn test_canceled_labels() {
        assert!(WorkerError::Canceled.is_canceled());
        assert_eq!(WaitError::Canceled.as_label(), "wait_canceled");
        assert_eq!(WaitError::Canceled.to_string(), "wait cancelled");
    }
}
