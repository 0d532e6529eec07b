//! # Keyed async mutex.
//!
//! [`KeyedMutex`] is a registry of named [`Semaphore`]s. Every key grants at most
//! `slots` concurrent holders (default 1); other callers queue in arrival order.
//! Callers using different keys never block each other.
//!
//! ## Architecture
//! ```text
//! run_exclusive(key, op)
//!     │
//!     ├─► meta-lock ──► get or create Semaphore(slots) for key ──► meta-lock released
//!     ├─► semaphore.acquire_owned().await      (FIFO queue if at capacity)
//!     ├─► op().await                           (slot held by KeyGuard)
//!     └─► KeyGuard dropped                     (slot released on every exit path)
//! ```
//!
//! ## Rules
//! - The meta-lock guards the map only and is never held across an `.await`.
//! - A key's capacity is fixed when it is first used; later `slots` values are ignored.
//! - `slots` is clamped to `1..=Semaphore::MAX_PERMITS`.
//! - Entries are **never evicted**. Minting an unbounded number of distinct keys
//!   grows the registry by one semaphore per key; intended use is a small, stable
//!   key set. Evicting would let two callers hold different semaphores for the
//!   same key.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Registry of per-key semaphores.
#[derive(Default)]
pub struct KeyedMutex {
    semaphores: Mutex<HashMap<String, Arc<Semaphore>>>,
}

/// A held slot of one key; the slot is released when dropped.
#[must_use = "the slot is released as soon as the guard is dropped"]
pub struct KeyGuard {
    key: Arc<str>,
    _permit: OwnedSemaphorePermit,
}

impl KeyGuard {
    /// Returns the key this guard holds a slot of.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for KeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGuard").field("key", &self.key).finish()
    }
}

impl KeyedMutex {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `op` while holding the only slot of `key`.
    ///
    /// The output of `op` (including any `Err`) is returned unchanged after the slot is released.
    ///
    /// # Example
    /// ```rust
    /// use workvisor::KeyedMutex;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let locks = KeyedMutex::new();
    /// let n = locks.run_exclusive("config-file", || async { 42 }).await;
    /// assert_eq!(n, 42);
    /// assert!(locks.contains("config-file"));
    /// # }
    /// ```
    pub async fn run_exclusive<F, Fut, T>(&self, key: &str, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.run_exclusive_with_slots(key, 1, op).await
    }

    /// Runs `op` while holding one of the `slots` slots of `key`.
    pub async fn run_exclusive_with_slots<F, Fut, T>(&self, key: &str, slots: usize, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.lock_with_slots(key, slots).await;
        op().await
    }

    /// Acquires the only slot of `key`.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        self.lock_with_slots(key, 1).await
    }

    /// Acquires one of the `slots` slots of `key`, creating the key on first use.
    ///
    /// `slots` is clamped to `1..=Semaphore::MAX_PERMITS`. Dropping the returned future before it
    /// completes gives up the place in the queue without taking a slot.
    pub async fn lock_with_slots(&self, key: &str, slots: usize) -> KeyGuard {
        let semaphore = self.semaphore(key, slots);
        let permit = match semaphore.acquire_owned().await {
            Ok(permit) => permit,
            Err(_closed) => unreachable!("keyed semaphores are never closed"),
        };
        KeyGuard {
            key: Arc::from(key),
            _permit: permit,
        }
    }

    /// Returns the number of keys ever used.
    pub fn len(&self) -> usize {
        self.semaphores.lock().len()
    }

    /// Returns `true` if no key has been used yet.
    pub fn is_empty(&self) -> bool {
        self.semaphores.lock().is_empty()
    }

    /// Returns `true` if `key` has been used.
    pub fn contains(&self, key: &str) -> bool {
        self.semaphores.lock().contains_key(key)
    }

    /// Returns the number of free slots of `key`, or `None` for an unknown key.
    pub fn available(&self, key: &str) -> Option<usize> {
        self.semaphores
            .lock()
            .get(key)
            .map(|s| s.available_permits())
    }

    /// Gets or creates the semaphore of `key` under the meta-lock.
    fn semaphore(&self, key: &str, slots: usize) -> Arc<Semaphore> {
        let mut map = self.semaphores.lock();
        if let Some(existing) = map.get(key) {
            return Arc::clone(existing);
        }

        let slots = slots.clamp(1, Semaphore::MAX_PERMITS);
        let created = Arc::new(Semaphore::new(slots));
        map.insert(key.to_owned(), Arc::clone(&created));
        tracing::trace!(key, slots, "created keyed semaphore");
        created
    }
}
