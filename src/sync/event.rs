//! # Blocking manual-reset event.
//!
//! [`ManualResetEvent`] is a classic thread-blocking signal: once [`set`](ManualResetEvent::set)
//! it stays signaled (waking every waiter) until [`reset`](ManualResetEvent::reset).
//!
//! Besides the blocking `wait*` methods it implements [`WaitHandle`], a callback
//! registration interface that lets [`wait_handle`](crate::sync::wait_handle) bridge
//! the event into async code without parking a thread.
//!
//! ## Rules
//! - Callbacks run **once**, outside the internal lock.
//! - Registering on an already-set event fires the callback immediately.
//! - `set()` drains all registrations; `unregister` of a fired key is a no-op.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Callback fired when a [`WaitHandle`] becomes signaled.
pub type SignalCallback = Box<dyn FnOnce() + Send + 'static>;

/// Opaque key identifying one registration on a [`WaitHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationKey(u64);

/// A blocking synchronization handle that can notify async waiters.
///
/// Implementors must fire each registered callback at most once, and must not
/// hold internal locks while doing so.
pub trait WaitHandle: Send + Sync {
    /// Registers `callback` to be invoked once the handle is signaled.
    ///
    /// If the handle is already signaled the callback is invoked before returning.
    fn register(&self, callback: SignalCallback) -> RegistrationKey;

    /// Removes a registration. Unknown or already fired keys are ignored.
    fn unregister(&self, key: RegistrationKey);
}

struct Inner {
    signaled: bool,
    next_key: u64,
    callbacks: HashMap<u64, SignalCallback>,
}

/// Thread-blocking event that stays signaled until reset.
pub struct ManualResetEvent {
    inner: Mutex<Inner>,
    cond: Condvar,
}

impl ManualResetEvent {
    /// Creates a new event in the given state.
    pub fn new(signaled: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                signaled,
                next_key: 0,
                callbacks: HashMap::new(),
            }),
            cond: Condvar::new(),
        }
    }

    /// Signals the event, waking blocked threads and firing registered callbacks.
    pub fn set(&self) {
        let fired: Vec<SignalCallback> = {
            let mut inner = self.inner.lock();
            inner.signaled = true;
            inner.callbacks.drain().map(|(_, cb)| cb).collect()
        };
        self.cond.notify_all();

        for cb in fired {
            cb();
        }
    }

    /// Returns the event to the non-signaled state.
    pub fn reset(&self) {
        self.inner.lock().signaled = false;
    }

    /// Returns `true` if the event is currently signaled.
    pub fn is_set(&self) -> bool {
        self.inner.lock().signaled
    }

    /// Blocks the calling thread until the event is signaled.
    pub fn wait(&self) {
        let mut inner = self.inner.lock();
        while !inner.signaled {
            self.cond.wait(&mut inner);
        }
    }

    /// Blocks the calling thread until the event is signaled or `timeout` elapses.
    ///
    /// Returns `true` if the event was signaled. A timeout too large to form a
    /// deadline (e.g. `Duration::MAX`) waits indefinitely.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut inner = self.inner.lock();
        while !inner.signaled {
            if self.cond.wait_until(&mut inner, deadline).timed_out() {
                return inner.signaled;
            }
        }
        true
    }

    /// Returns the number of pending registrations.
    pub fn registrations(&self) -> usize {
        self.inner.lock().callbacks.len()
    }
}

impl Default for ManualResetEvent {
    fn default() -> Self {
        Self::new(false)
    }
}

impl WaitHandle for ManualResetEvent {
    fn register(&self, callback: SignalCallback) -> RegistrationKey {
        let mut inner = self.inner.lock();
        let key = inner.next_key;
        inner.next_key += 1;

        if inner.signaled {
            drop(inner);
            callback();
        } else {
            inner.callbacks.insert(key, callback);
        }
        RegistrationKey(key)
    }

    fn unregister(&self, key: RegistrationKey) {
        self.inner.lock().callbacks.remove(&key.0);
    }
}
