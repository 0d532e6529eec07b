//! # SingleWorker: restartable, single-instance worker lifecycle.
//!
//! A [`SingleWorker`] runs at most one instance of its [`Worker`] body at a time,
//! no matter how many callers invoke [`start`](SingleWorker::start) /
//! [`stop`](SingleWorker::stop) concurrently or from which thread.
//!
//! ## Architecture
//! ```text
//! start() ──► publish StartRequested
//!         └─► KeyedMutex::run_exclusive(lock_key)
//!               ├─ state != Idle ─► publish StartIgnored, return false
//!               └─ state == Idle ─► fresh CancellationToken + finished signal
//!                                   state = Running, publish Starting
//!                                   spawn_supervised(body)   (detached)
//!                                   return true
//!
//! stop()  ──► called from own body? ─► cancel, publish Stopped, return false
//!         └─► KeyedMutex::run_exclusive(lock_key)
//!               ├─ state == Idle ─► publish StopIgnored, return false
//!               └─ otherwise     ─► publish StopRequested
//!                                   token.cancel(), state = StopRequested
//!                                   wait_handle(finished, cfg.stop_wait())
//!                                   publish Stopped, return finished
//! ```
//!
//! ## Rules
//! - `start`/`stop` on one instance are totally ordered by its lock key.
//! - Two instances with different keys never block each other.
//! - `start` returns as soon as the body is launched, never when it completes.
//! - Neither call ever observes a failure of the body; see [`spawn_supervised`].
//! - Cancellation is cooperative: the body must watch its token.
//!
//! [`spawn_supervised`]: crate::core::runner

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::runner::{Completion, inside_own_run, instance_id, spawn_supervised};
use crate::core::state::{StateCell, WorkerState};
use crate::error::WaitError;
use crate::events::{Bus, Event, EventKind};
use crate::sync::{KeyedMutex, ManualResetEvent, wait_handle};
use crate::workers::WorkerRef;

/// Handles of one run: its cancellation source and its finished signal.
#[derive(Clone)]
struct Run {
    cancel: CancellationToken,
    finished: Arc<ManualResetEvent>,
}

impl Run {
    fn idle() -> Self {
        Self {
            cancel: CancellationToken::new(),
            finished: Arc::new(ManualResetEvent::new(true)),
        }
    }

    fn fresh() -> Self {
        Self {
            cancel: CancellationToken::new(),
            finished: Arc::new(ManualResetEvent::new(false)),
        }
    }
}

struct Inner {
    worker: WorkerRef,
    name: Arc<str>,
    key: Arc<str>,
    locks: Arc<KeyedMutex>,
    bus: Bus,
    stop_wait: Option<Duration>,
    state: Arc<StateCell>,
    run: Mutex<Run>,
}

impl Inner {
    fn publish(&self, kind: EventKind, origin: &'static str) {
        self.bus.publish(self.event(kind, origin));
    }

    fn event(&self, kind: EventKind, origin: &'static str) -> Event {
        Event::new(kind)
            .with_origin(origin)
            .with_worker(self.name.clone())
            .with_key(self.key.clone())
    }

    fn current_run(&self) -> Run {
        self.run.lock().clone()
    }
}

/// Supervises start/stop of a single [`Worker`](crate::Worker) instance.
///
/// Cheap to clone; clones drive the same instance.
///
/// Created by [`Supervisor::worker`](crate::Supervisor::worker) or
/// [`Supervisor::worker_with_key`](crate::Supervisor::worker_with_key).
#[derive(Clone)]
pub struct SingleWorker {
    inner: Arc<Inner>,
}

impl SingleWorker {
    pub(crate) fn new(
        worker: WorkerRef,
        key: Arc<str>,
        locks: Arc<KeyedMutex>,
        bus: Bus,
        stop_wait: Option<Duration>,
    ) -> Self {
        let name: Arc<str> = Arc::from(worker.name());
        Self {
            inner: Arc::new(Inner {
                worker,
                name,
                key,
                locks,
                bus,
                stop_wait,
                state: Arc::new(StateCell::new(WorkerState::Idle)),
                run: Mutex::new(Run::idle()),
            }),
        }
    }

    /// Returns the worker name used in diagnostics.
    pub fn worker_name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the key serializing this instance's `start`/`stop` calls.
    pub fn lock_key(&self) -> &str {
        &self.inner.key
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.inner.state.load()
    }

    /// Returns `true` while a body is executing (including while it winds down after `stop`).
    pub fn is_running(&self) -> bool {
        self.state() != WorkerState::Idle
    }

    /// Returns `true` once cancellation was requested for the latest run.
    ///
    /// Stays `true` after the body finished, until the next successful `start`.
    pub fn is_stopping(&self) -> bool {
        self.inner.current_run().cancel.is_cancelled()
    }

    /// Launches the body unless it is already running.
    ///
    /// Returns `true` if a new run was launched, `false` if one was already in progress.
    /// Returns as soon as the body is spawned.
    pub async fn start(&self) -> bool {
        let inner = self.inner.as_ref();
        inner.publish(EventKind::StartRequested, "start");

        inner
            .locks
            .run_exclusive(&inner.key, || async {
                if inner.state.load() != WorkerState::Idle {
                    inner.publish(EventKind::StartIgnored, "start");
                    return false;
                }

                let run = Run::fresh();
                *inner.run.lock() = run.clone();
                inner.state.store(WorkerState::Running);
                inner.publish(EventKind::Starting, "start");

                spawn_supervised(
                    Arc::clone(&inner.worker),
                    run.cancel,
                    Completion::new(Arc::clone(&inner.state), run.finished),
                    inner.bus.clone(),
                );
                true
            })
            .await
    }

    /// Requests cancellation of the running body and waits according to [`Config::stop_mode`](crate::Config::stop_mode).
    ///
    /// Returns `false` if the worker was idle. Otherwise returns whether the body had
    /// finished when the wait ended (`StopMode::Wait` without timeout always yields `true`).
    ///
    /// Called from the worker's own body, `stop` requests cancellation and returns
    /// `false` at once, without taking the lock. Tasks spawned by the body are not
    /// recognized as the body; use [`stop_detached`](Self::stop_detached) there.
    pub async fn stop(&self) -> bool {
        let inner = self.inner.as_ref();

        if inside_own_run(instance_id(&inner.state)) {
            return self.stop_from_body();
        }

        inner
            .locks
            .run_exclusive(&inner.key, || async {
                if inner.state.load() == WorkerState::Idle {
                    inner.publish(EventKind::StopIgnored, "stop");
                    return false;
                }
                inner.publish(EventKind::StopRequested, "stop");

                let run = inner.current_run();
                run.cancel.cancel();
                inner
                    .state
                    .transition(WorkerState::Running, WorkerState::StopRequested);

                let finished = matches!(
                    wait_handle(run.finished.as_ref(), inner.stop_wait, None).await,
                    Ok(true)
                );
                inner.bus.publish(
                    inner
                        .event(EventKind::Stopped, "stop")
                        .with_message(if finished { "finished" } else { "still running" }),
                );
                finished
            })
            .await
    }

    /// Cancels the run executing the caller. The run is live, so it is the current one.
    fn stop_from_body(&self) -> bool {
        let inner = self.inner.as_ref();
        inner.publish(EventKind::StopRequested, "stop");

        inner.current_run().cancel.cancel();
        inner
            .state
            .transition(WorkerState::Running, WorkerState::StopRequested);

        inner.bus.publish(
            inner
                .event(EventKind::Stopped, "stop")
                .with_message("still running"),
        );
        false
    }

    /// Runs [`stop`](Self::stop) in the background.
    ///
    /// The returned handle may be dropped; the stop still completes.
    pub fn stop_detached(&self) -> JoinHandle<bool> {
        let me = self.clone();
        tokio::spawn(async move { me.stop().await })
    }

    /// Waits for the latest run to finish, without taking the lock.
    ///
    /// Returns `Ok(true)` immediately when idle, `Ok(false)` on timeout
    /// (`None` = wait indefinitely), `Err(WaitError::Canceled)` if `cancel` fires first.
    pub async fn wait_finished(
        &self,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool, WaitError> {
        let run = self.inner.current_run();
        wait_handle(run.finished.as_ref(), timeout, cancel).await
    }
}

impl std::fmt::Debug for SingleWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleWorker")
            .field("name", &self.inner.name)
            .field("key", &self.inner.key)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, StopMode, Supervisor};
    use crate::error::WorkerError;
    use crate::workers::WorkerFn;
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::broadcast;

    const BOUND: Duration = Duration::from_secs(5);

    fn supervisor(cfg: Config) -> Arc<Supervisor> {
        Supervisor::builder(cfg).build()
    }

    /// Body that counts runs and returns once cancelled.
    fn until_cancelled(runs: Arc<AtomicUsize>, observed: Arc<AtomicBool>) -> WorkerRef {
        WorkerFn::arc("looper", move |ctx: CancellationToken| {
            let runs = runs.clone();
            let observed = observed.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                ctx.cancelled().await;
                observed.store(true, Ordering::SeqCst);
                Err::<(), _>(WorkerError::Canceled)
            }
        })
    }

    /// Collects events until `TaskFinished` for `worker` is seen.
    async fn events_until_finished(rx: &mut broadcast::Receiver<Event>, worker: &str) -> Vec<Event> {
        let collect = async {
            let mut out = Vec::new();
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let done = ev.kind == EventKind::TaskFinished
                            && ev.worker.as_deref() == Some(worker);
                        out.push(ev);
                        if done {
                            return out;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return out,
                }
            }
        };
        tokio::time::timeout(BOUND, collect).await.unwrap()
    }

    #[tokio::test]
    async fn test_start_twice_runs_one_body() {
        let sup = supervisor(Config::default());
        let runs = Arc::new(AtomicUsize::new(0));
        let w = sup.worker(until_cancelled(runs.clone(), Arc::new(AtomicBool::new(false))));

        assert!(w.start().await);
        assert!(!w.start().await);
        assert!(w.is_running());

        assert!(w.stop().await);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_on_idle_returns_false() {
        let sup = supervisor(Config::default());
        let mut rx = sup.subscribe();
        let w = sup.worker(until_cancelled(
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicBool::new(false)),
        ));

        assert_eq!(w.state(), WorkerState::Idle);
        assert!(!w.stop().await);
        assert!(!w.is_stopping());

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::StopIgnored);
        assert_eq!(ev.key.as_deref(), Some(w.lock_key()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_delivers_cancellation_and_waits() {
        let sup = supervisor(Config::default());
        let observed = Arc::new(AtomicBool::new(false));
        let w = sup.worker(until_cancelled(Arc::new(AtomicUsize::new(0)), observed.clone()));

        assert!(w.start().await);
        let stopped = tokio::time::timeout(BOUND, w.stop()).await.unwrap();

        assert!(stopped);
        assert!(observed.load(Ordering::SeqCst));
        assert!(!w.is_running());
        assert!(w.is_stopping());
    }

    #[tokio::test]
    async fn test_poll_mode_reports_current_state() {
        let cfg = Config {
            stop_mode: StopMode::Poll,
            ..Config::default()
        };
        let sup = supervisor(cfg);
        let w = sup.worker(WorkerFn::arc("slow-exit", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<(), WorkerError>(())
        }));

        assert!(w.start().await);
        assert!(!w.stop().await, "poll mode must not wait for the body");
        assert_eq!(w.state(), WorkerState::StopRequested);
        assert!(!w.start().await, "still winding down");

        assert_eq!(w.wait_finished(Some(BOUND), None).await, Ok(true));
        assert!(!w.is_running());
        assert!(w.start().await);
        w.stop().await;
        assert_eq!(w.wait_finished(Some(BOUND), None).await, Ok(true));
    }

    #[tokio::test]
    async fn test_failure_is_contained_and_logged_once() {
        let sup = supervisor(Config::default());
        let mut rx = sup.subscribe();
        let w = sup.worker(WorkerFn::arc("crasher", |_ctx: CancellationToken| async {
            Err::<(), _>(WorkerError::fail("disk full"))
        }));

        assert!(w.start().await);
        let events = events_until_finished(&mut rx, "crasher").await;

        let failures: Vec<&Event> = events
            .iter()
            .filter(|e| e.kind == EventKind::WorkerFailed)
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].worker.as_deref(), Some("crasher"));
        assert_eq!(failures[0].error.as_deref(), Some("execution failed: disk full"));

        assert_eq!(w.wait_finished(Some(BOUND), None).await, Ok(true));
        assert!(!w.is_running());
        assert!(!w.stop().await);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let sup = supervisor(Config::default());
        let mut rx = sup.subscribe();
        let w = sup.worker(WorkerFn::arc("panicker", |_ctx: CancellationToken| async {
            if true {
                panic!("worker exploded");
            }
            Ok::<(), WorkerError>(())
        }));

        assert!(w.start().await);
        let events = events_until_finished(&mut rx, "panicker").await;
        let failed = events
            .iter()
            .find(|e| e.kind == EventKind::WorkerFailed)
            .unwrap();
        assert_eq!(failed.error.as_deref(), Some("panicked: worker exploded"));

        assert_eq!(w.wait_finished(Some(BOUND), None).await, Ok(true));
        assert!(w.start().await, "a crashed worker can be restarted");
    }

    #[tokio::test]
    async fn test_cancellation_is_not_a_failure() {
        let sup = supervisor(Config::default());
        let mut rx = sup.subscribe();
        let w = sup.worker(until_cancelled(
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicBool::new(false)),
        ));

        assert!(w.start().await);
        assert!(w.stop().await);

        let events = events_until_finished(&mut rx, "looper").await;
        assert!(events.iter().all(|e| e.kind != EventKind::WorkerFailed));
        let finished = events.last().unwrap();
        assert_eq!(finished.message.as_deref(), Some("canceled"));
    }

    #[tokio::test]
    async fn test_restart_cycles() {
        let sup = supervisor(Config::default());
        let runs = Arc::new(AtomicUsize::new(0));
        let w = sup.worker(until_cancelled(runs.clone(), Arc::new(AtomicBool::new(false))));

        for _ in 0..3 {
            assert!(w.start().await);
            assert!(w.stop().await);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_launch_once() {
        let sup = supervisor(Config::default());
        let runs = Arc::new(AtomicUsize::new(0));
        let w = sup.worker(until_cancelled(runs.clone(), Arc::new(AtomicBool::new(false))));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let w = w.clone();
            handles.push(tokio::spawn(async move { w.start().await }));
        }
        let mut launched = 0;
        for h in handles {
            if h.await.unwrap() {
                launched += 1;
            }
        }
        assert_eq!(launched, 1);

        assert!(w.stop().await);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_timeout_bounds_wait() {
        let cfg = Config {
            stop_timeout: Duration::from_millis(20),
            ..Config::default()
        };
        let sup = supervisor(cfg);
        let release = CancellationToken::new();
        let r = release.clone();
        let w = sup.worker(WorkerFn::arc("stubborn", move |_ctx: CancellationToken| {
            let r = r.clone();
            async move {
                r.cancelled().await;
                Ok::<(), WorkerError>(())
            }
        }));

        assert!(w.start().await);
        assert!(!w.stop().await, "body ignores cancellation");
        assert!(w.is_running());

        release.cancel();
        assert_eq!(w.wait_finished(Some(BOUND), None).await, Ok(true));
        assert!(!w.is_running());
    }

    #[tokio::test]
    async fn test_wait_finished_cancellable() {
        let sup = supervisor(Config::default());
        let w = sup.worker(until_cancelled(
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicBool::new(false)),
        ));
        assert_eq!(w.wait_finished(Some(Duration::ZERO), None).await, Ok(true));

        assert!(w.start().await);
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            w.wait_finished(None, Some(&token)).await,
            Err(WaitError::Canceled)
        );
        assert!(w.stop().await);
    }

    /// Body that calls `stop()` on its own worker and records `(returned, cancelled)`.
    fn self_stopping(
        me: Arc<OnceLock<SingleWorker>>,
        result: Arc<Mutex<Option<(bool, bool)>>>,
        wait_for_cancel: bool,
    ) -> WorkerRef {
        WorkerFn::arc("self-stopping", move |ctx: CancellationToken| {
            let me = me.clone();
            let result = result.clone();
            async move {
                if wait_for_cancel {
                    ctx.cancelled().await;
                }
                if let Some(w) = me.get().cloned() {
                    let stopped = w.stop().await;
                    *result.lock() = Some((stopped, ctx.is_cancelled()));
                }
                Ok::<(), WorkerError>(())
            }
        })
    }

    #[tokio::test]
    async fn test_body_stopping_itself_does_not_deadlock() {
        let sup = supervisor(Config::default());
        let me = Arc::new(OnceLock::new());
        let result = Arc::new(Mutex::new(None));
        let w = sup.worker(self_stopping(me.clone(), result.clone(), false));
        assert!(me.set(w.clone()).is_ok());

        assert!(w.start().await);
        assert_eq!(w.wait_finished(Some(BOUND), None).await, Ok(true));

        // Cancellation requested, body still running at that point.
        assert_eq!(*result.lock(), Some((false, true)));
        assert!(w.is_stopping());
        assert!(!w.is_running());

        let cycle = async {
            assert!(w.start().await);
            assert!(w.stop().await);
        };
        tokio::time::timeout(BOUND, cycle).await.unwrap();
    }

    #[tokio::test]
    async fn test_body_stopping_itself_while_outside_stop_waits() {
        let sup = supervisor(Config::default());
        let me = Arc::new(OnceLock::new());
        let result = Arc::new(Mutex::new(None));
        let w = sup.worker(self_stopping(me.clone(), result.clone(), true));
        assert!(me.set(w.clone()).is_ok());

        assert!(w.start().await);
        let stopped = tokio::time::timeout(BOUND, w.stop()).await.unwrap();
        assert!(stopped);
        assert_eq!(*result.lock(), Some((false, true)));
    }

    #[tokio::test]
    async fn test_instances_do_not_block_each_other() {
        let sup = supervisor(Config::default());
        let release = CancellationToken::new();
        let r = release.clone();
        let slow = sup.worker(WorkerFn::arc("slow", move |_ctx: CancellationToken| {
            let r = r.clone();
            async move {
                r.cancelled().await;
                Ok::<(), WorkerError>(())
            }
        }));
        let fast = sup.worker(until_cancelled(
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicBool::new(false)),
        ));
        assert_ne!(slow.lock_key(), fast.lock_key());

        assert!(slow.start().await);
        // Holds slow's lock until released.
        let pending_stop = slow.stop_detached();
        tokio::task::yield_now().await;

        let fast_cycle = async {
            assert!(fast.start().await);
            assert!(fast.stop().await);
        };
        tokio::time::timeout(BOUND, fast_cycle).await.unwrap();

        release.cancel();
        assert!(pending_stop.await.unwrap());
    }

    #[tokio::test]
    async fn test_shared_key_serializes_group() {
        let sup = supervisor(Config::default());
        let a = sup.worker_with_key(
            until_cancelled(Arc::new(AtomicUsize::new(0)), Arc::new(AtomicBool::new(false))),
            "group",
        );
        let b = sup.worker_with_key(
            WorkerFn::arc("other", |ctx: CancellationToken| async move {
                ctx.cancelled().await;
                Ok::<(), WorkerError>(())
            }),
            "group",
        );
        assert_eq!(a.lock_key(), b.lock_key());

        // The key serializes transitions only; both bodies may run.
        assert!(a.start().await);
        assert!(b.start().await);
        assert!(a.stop().await);
        assert!(b.stop().await);
        assert_eq!(sup.locks().len(), 1);
    }
}
