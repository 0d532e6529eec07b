//! # Run a worker body detached, with total failure containment.
//!
//! [`spawn_supervised`] launches one run of a [`Worker`] on the tokio runtime and
//! never hands a join handle back, so nothing is left to observe a failure. The
//! wrapper therefore owns every outcome:
//!
//! ```text
//! tokio::spawn ─► publish TaskStarted
//!              ─► worker.run(ctx) (panics caught)
//!                     ├─ Ok(())                      → Completed
//!                     ├─ Err(Canceled), ctx cancelled → Canceled   (silent)
//!                     ├─ Err(Canceled), ctx live      → Failed     (not ours)
//!                     ├─ Err(Fail)                    → Failed     → publish WorkerFailed
//!                     └─ panic                        → Panicked   → publish WorkerFailed
//!              ─► publish TaskFinished
//!              ─► Completion dropped: state = Idle, finished signal set
//! ```
//!
//! ## Rules
//! - Failures are reported **exactly once** and never rethrown.
//! - [`Completion`] is a drop guard, so the finished signal is set on every exit
//!   path, including the spawned future being dropped on runtime shutdown.
//! - The body runs inside a task-local scope naming its instance, so
//!   [`inside_own_run`] can tell a body apart from outside callers.

use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::core::state::{StateCell, WorkerState};
use crate::error::WorkerError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::panic_message;
use crate::sync::ManualResetEvent;
use crate::workers::{Worker, WorkerRef};

const ORIGIN: &str = "worker_task";

tokio::task_local! {
    /// Instance whose body is executing on the current task.
    static RUNNING_INSTANCE: usize;
}

/// Returns `true` when called from the body of `instance` (see [`Completion::instance`]).
///
/// Tasks spawned by the body do not inherit the scope.
pub(crate) fn inside_own_run(instance: usize) -> bool {
    RUNNING_INSTANCE.try_with(|id| *id == instance).unwrap_or(false)
}

/// Marks a run finished when dropped.
pub(crate) struct Completion {
    state: Arc<StateCell>,
    finished: Arc<ManualResetEvent>,
}

impl Completion {
    pub(crate) fn new(state: Arc<StateCell>, finished: Arc<ManualResetEvent>) -> Self {
        Self { state, finished }
    }

    /// Identity of the owning instance: the address of its state cell.
    pub(crate) fn instance(&self) -> usize {
        instance_id(&self.state)
    }
}

/// Identity of the instance owning `state`; stable while the cell is alive.
pub(crate) fn instance_id(state: &Arc<StateCell>) -> usize {
    Arc::as_ptr(state) as usize
}

impl Drop for Completion {
    fn drop(&mut self) {
        // State first: once the signal is observed, `start()` must see Idle.
        self.state.store(WorkerState::Idle);
        self.finished.set();
    }
}

/// Terminal outcome of one run.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Completed,
    Canceled,
    Failed(String),
    Panicked(String),
}

impl Outcome {
    fn as_label(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Canceled => "canceled",
            Outcome::Failed(_) => "failed",
            Outcome::Panicked(_) => "panicked",
        }
    }
}

/// Launches one supervised run of `worker`; the run is never awaited by the caller.
pub(crate) fn spawn_supervised(
    worker: WorkerRef,
    ctx: CancellationToken,
    completion: Completion,
    bus: Bus,
) {
    let instance = completion.instance();
    tokio::spawn(async move {
        let _completion = completion;
        let name: Arc<str> = Arc::from(worker.name());

        bus.publish(
            Event::new(EventKind::TaskStarted)
                .with_origin(ORIGIN)
                .with_worker(name.clone()),
        );

        let outcome = RUNNING_INSTANCE
            .scope(instance, run_contained(worker.as_ref(), &ctx))
            .await;
        match &outcome {
            Outcome::Failed(detail) | Outcome::Panicked(detail) => {
                publish_failed(&bus, &name, detail);
            }
            Outcome::Completed | Outcome::Canceled => {}
        }

        bus.publish(
            Event::new(EventKind::TaskFinished)
                .with_origin(ORIGIN)
                .with_worker(name)
                .with_message(outcome.as_label()),
        );
    });
}

/// Runs the body to completion and classifies the result; never panics.
async fn run_contained(worker: &dyn Worker, ctx: &CancellationToken) -> Outcome {
    let fut = worker.run(ctx.clone());

    match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => Outcome::Completed,
        Ok(Err(WorkerError::Canceled)) if ctx.is_cancelled() => Outcome::Canceled,
        Ok(Err(e)) => Outcome::Failed(e.to_string()),
        Err(panic_err) => Outcome::Panicked(format!(
            "panicked: {}",
            panic_message(panic_err.as_ref())
        )),
    }
}

/// Publishes `WorkerFailed` at critical severity.
fn publish_failed(bus: &Bus, name: &Arc<str>, detail: &str) {
    bus.publish(
        Event::new(EventKind::WorkerFailed)
            .with_origin(ORIGIN)
            .with_worker(name.clone())
            .with_message(format!("unhandled failure in worker '{name}'"))
            .with_error(detail),
    );
}
