//! # Runtime configuration.
//!
//! Provides [`Config`] centralized settings for the supervisor and the workers it creates.
//!
//! ## Sentinel values
//! - `stop_timeout = 0s` → `stop()` waits indefinitely (in [`StopMode::Wait`])
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// How [`SingleWorker::stop`](crate::SingleWorker::stop) waits for the worker body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopMode {
    /// Cancel, then wait until the body finishes (bounded by `stop_timeout`).
    ///
    /// `stop()` returns `true` once the worker is idle again.
    #[default]
    Wait,

    /// Cancel, then report whether the body has already finished (zero timeout).
    ///
    /// The body usually winds down after `stop()` returned `false`; use
    /// [`SingleWorker::is_running`](crate::SingleWorker::is_running) or
    /// [`SingleWorker::wait_finished`](crate::SingleWorker::wait_finished) to observe completion.
    Poll,
}

/// Configuration shared by a [`Supervisor`](crate::Supervisor) and its workers.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `stop_mode`: Whether `stop()` waits for the body or only polls once
/// - `stop_timeout`: Upper bound for `StopMode::Wait` (`0s` = no bound)
/// - `lock_prefix`: Prefix of generated per-instance lock keys
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages skip older items.
    pub bus_capacity: usize,

    /// Waiting behavior of `stop()`.
    pub stop_mode: StopMode,

    /// Maximum time `stop()` waits for the body in [`StopMode::Wait`].
    ///
    /// - `Duration::ZERO` = wait until the body finishes
    /// - `> 0` = give up after this long and return `false`
    ///
    /// The keyed lock of the worker is held while waiting, so concurrent
    /// `start()`/`stop()` calls on the same instance queue behind it.
    pub stop_timeout: Duration,

    /// Prefix for lock keys generated by [`Supervisor::worker`](crate::Supervisor::worker).
    pub lock_prefix: String,
}

impl Config {
    /// Returns the timeout passed to the wait bridge by `stop()`.
    ///
    /// - `None` → wait indefinitely
    /// - `Some(Duration::ZERO)` → immediate check (`StopMode::Poll`)
    /// - `Some(d)` → bounded wait
    #[inline]
    pub fn stop_wait(&self) -> Option<Duration> {
        match self.stop_mode {
            StopMode::Poll => Some(Duration::ZERO),
            StopMode::Wait if self.stop_timeout == Duration::ZERO => None,
            StopMode::Wait => Some(self.stop_timeout),
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `stop_mode = StopMode::Wait`
    /// - `stop_timeout = 0s` (wait until finished)
    /// - `lock_prefix = "single-worker"`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            stop_mode: StopMode::default(),
            stop_timeout: Duration::ZERO,
            lock_prefix: "single-worker".to_string(),
        }
    }
}
