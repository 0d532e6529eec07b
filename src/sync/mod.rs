//! # Synchronization primitives.
//!
//! - [`KeyedMutex`] registry of per-key semaphores (`run_exclusive`, `lock`);
//! - [`ManualResetEvent`] blocking signal implementing [`WaitHandle`];
//! - [`wait_handle`] bridges a [`WaitHandle`] into an awaitable, cancellable future.
//!
//! These types do not depend on the supervisor and can be used on their own.

mod bridge;
mod event;
mod keyed;

pub use bridge::wait_handle;
pub use event::{ManualResetEvent, RegistrationKey, SignalCallback, WaitHandle};
pub use keyed::{KeyGuard, KeyedMutex};
