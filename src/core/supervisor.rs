//! # Supervisor: owns the bus, the lock registry and subscriber fan-out.
//!
//! The [`Supervisor`] is the factory for [`SingleWorker`]s. Every worker it creates
//! shares its [`Bus`], its [`KeyedMutex`] registry and its [`Config`].
//!
//! ## High-level architecture
//! ```text
//! Supervisor::builder(cfg).with_subscribers(..).build()
//!   ├─ Bus::new(cfg.bus_capacity)
//!   ├─ SubscriberSet::new(subs, bus)           (one queue + worker per subscriber)
//!   └─ subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&ev)
//!
//! sup.worker(w)            → SingleWorker { key = "<lock_prefix>-<uuid v4>" }
//! sup.worker_with_key(w,k) → SingleWorker { key = k }   (group serialization)
//!
//! Event flow:
//!   SingleWorker / worker task ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                  ┌─────────┼─────────┐
//!                                                                  ▼         ▼         ▼
//!                                                            [queue S1] [queue S2] [queue SN]
//! ```
//!
//! Dropping the supervisor stops event delivery to subscribers; workers already
//! created keep working and keep publishing to the bus.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use workvisor::{Config, Supervisor, WorkerError, WorkerFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sup = Supervisor::builder(Config::default()).build();
//!
//!     let worker = sup.worker(WorkerFn::arc("poller", |ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Err::<(), _>(WorkerError::Canceled)
//!     }));
//!
//!     assert!(worker.start().await);
//!     assert!(!worker.start().await);
//!     assert!(worker.stop().await);
//! }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::builder::SupervisorBuilder;
use crate::core::config::Config;
use crate::core::lifecycle::SingleWorker;
use crate::events::{Bus, Event};
use crate::subscribers::SubscriberSet;
use crate::sync::KeyedMutex;
use crate::workers::WorkerRef;

/// Creates [`SingleWorker`]s and delivers their events to subscribers.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    locks: Arc<KeyedMutex>,
    runtime_token: CancellationToken,
}

impl Supervisor {
    /// Returns a builder for a supervisor with the given configuration.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        locks: Arc<KeyedMutex>,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            locks,
            runtime_token,
        }
    }

    /// Wraps `worker` with its own, freshly generated lock key.
    pub fn worker(&self, worker: WorkerRef) -> SingleWorker {
        let key = format!("{}-{}", self.cfg.lock_prefix, Uuid::new_v4());
        self.worker_with_key(worker, key)
    }

    /// Wraps `worker` using `key` as its lock key.
    ///
    /// Instances sharing a key have their `start`/`stop` transitions serialized
    /// against each other. Each instance still tracks its own run.
    pub fn worker_with_key(&self, worker: WorkerRef, key: impl Into<Arc<str>>) -> SingleWorker {
        SingleWorker::new(
            worker,
            key.into(),
            Arc::clone(&self.locks),
            self.bus.clone(),
            self.cfg.stop_wait(),
        )
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the lock registry shared by this supervisor's workers.
    pub fn locks(&self) -> &Arc<KeyedMutex> {
        &self.locks
    }

    /// Returns the event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Subscribes directly to the event bus.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    ///
    /// On exit the set is shut down, draining subscriber queues, once no other
    /// handle to it remains.
    pub(crate) fn subscriber_listener(&self, set: Arc<SubscriberSet>) {
        let mut rx = self.bus.subscribe();
        let token = self.runtime_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            if let Ok(set) = Arc::try_unwrap(set) {
                set.shutdown().await;
            }
        });
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("cfg", &self.cfg)
            .field("locks", &self.locks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;
    use crate::events::EventKind;
    use crate::subscribers::Subscribe;
    use crate::workers::WorkerFn;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Recorder {
        kinds: Mutex<Vec<EventKind>>,
        notify: Notify,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.kinds.lock().push(ev.kind);
            self.notify.notify_one();
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    impl Recorder {
        async fn wait_for(&self, kind: EventKind) {
            loop {
                if self.kinds.lock().contains(&kind) {
                    return;
                }
                self.notify.notified().await;
            }
        }
    }

    fn pending_worker() -> WorkerRef {
        WorkerFn::arc("pending", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Ok::<(), WorkerError>(())
        })
    }

    #[tokio::test]
    async fn test_generated_keys_are_unique_and_prefixed() {
        let cfg = Config {
            lock_prefix: "job".into(),
            ..Config::default()
        };
        let sup = Supervisor::builder(cfg).build();

        let a = sup.worker(pending_worker());
        let b = sup.worker(pending_worker());
        assert_ne!(a.lock_key(), b.lock_key());
        assert!(a.lock_key().starts_with("job-"));
        assert_eq!(a.worker_name(), "pending");
    }

    #[tokio::test]
    async fn test_subscribers_receive_worker_events() {
        let rec = Arc::new(Recorder::default());
        let sup = Supervisor::builder(Config::default())
            .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
            .build();

        let w = sup.worker(pending_worker());
        assert!(w.start().await);
        assert!(w.stop().await);

        tokio::time::timeout(Duration::from_secs(5), rec.wait_for(EventKind::TaskFinished))
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(5), rec.wait_for(EventKind::Stopped))
            .await
            .unwrap();
        assert!(rec.kinds.lock().contains(&EventKind::StartRequested));
    }

    #[tokio::test]
    async fn test_shared_registry_across_supervisors() {
        let locks = Arc::new(KeyedMutex::new());
        let a = Supervisor::builder(Config::default())
            .with_locks(locks.clone())
            .build();
        let b = Supervisor::builder(Config::default())
            .with_locks(locks.clone())
            .build();

        let wa = a.worker_with_key(pending_worker(), "shared");
        let wb = b.worker_with_key(pending_worker(), "shared");
        assert!(wa.start().await);
        assert!(wb.start().await);
        assert!(wa.stop().await);
        assert!(wb.stop().await);

        assert!(Arc::ptr_eq(a.locks(), b.locks()));
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_workers_outlive_supervisor() {
        let sup = Supervisor::builder(Config::default()).build();
        let w = sup.worker(pending_worker());
        drop(sup);

        assert!(w.start().await);
        assert!(w.stop().await);
    }
}
