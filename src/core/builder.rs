use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::supervisor::Supervisor;
use crate::{
    core::Config,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
    sync::KeyedMutex,
};

/// Builder for constructing a Supervisor with optional features.
pub struct SupervisorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    locks: Option<Arc<KeyedMutex>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            locks: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (start/stop transitions, failures, etc.)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Uses an existing lock registry instead of a private one.
    ///
    /// Workers of different supervisors sharing a registry and a lock key are
    /// serialized against each other.
    pub fn with_locks(mut self, locks: Arc<KeyedMutex>) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Builds and returns the Supervisor instance.
    ///
    /// Must be called from within a tokio runtime: subscriber workers and the
    /// bus listener are spawned here.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let locks = self.locks.unwrap_or_default();
        let runtime_token = CancellationToken::new();

        let sup = Arc::new(Supervisor::new_internal(self.cfg, bus, locks, runtime_token));
        sup.subscriber_listener(subs);
        sup
    }
}
