//! # Worker lifecycle state.
//!
//! ```text
//!            start()                 stop()
//!   Idle ───────────► Running ───────────────► StopRequested
//!    ▲                   │                          │
//!    └───────────────────┴──── body returns ◄───────┘
//!                          (completion guard)
//! ```
//!
//! `Idle → Running` and `Running → StopRequested` are written under the worker's
//! keyed lock. `→ Idle` is written by the run's completion guard without the lock,
//! because `stop()` may hold the lock while waiting for exactly that transition.

use std::sync::atomic::{AtomicU8, Ordering};

/// Observable state of a [`SingleWorker`](crate::SingleWorker).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// No body is executing. Initial and resting state.
    Idle,
    /// The body is executing.
    Running,
    /// Cancellation was signaled; the body has not returned yet.
    StopRequested,
}

impl WorkerState {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerState::Idle => "idle",
            WorkerState::Running => "running",
            WorkerState::StopRequested => "stop_requested",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => WorkerState::Running,
            2 => WorkerState::StopRequested,
            _ => WorkerState::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            WorkerState::Idle => 0,
            WorkerState::Running => 1,
            WorkerState::StopRequested => 2,
        }
    }
}

/// Atomic cell holding a [`WorkerState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: WorkerState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    pub(crate) fn load(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: WorkerState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }

    /// Moves `from → to`; returns `false` if the current state is not `from`.
    pub(crate) fn transition(&self, from: WorkerState, to: WorkerState) -> bool {
        self.0
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_only_from_expected_state() {
        let cell = StateCell::new(WorkerState::Idle);
        assert!(!cell.transition(WorkerState::Running, WorkerState::StopRequested));
        assert!(cell.transition(WorkerState::Idle, WorkerState::Running));
        assert!(cell.transition(WorkerState::Running, WorkerState::StopRequested));
        assert_eq!(cell.load(), WorkerState::StopRequested);

        cell.store(WorkerState::Idle);
        assert_eq!(cell.load().as_label(), "idle");
    }
}
