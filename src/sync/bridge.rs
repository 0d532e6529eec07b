//! # Await a blocking wait handle.
//!
//! [`wait_handle`] turns any [`WaitHandle`] into a future resolving to:
//! - `Ok(true)` if the handle became signaled,
//! - `Ok(false)` if the timeout elapsed first,
//! - `Err(WaitError::Canceled)` if the caller's token fired first.
//!
//! ## Flow
//! ```text
//! register(callback ─► oneshot::Sender::send)   (first writer wins)
//!     │
//!     ├─► select! (biased)
//!     │     ├─ oneshot received   ─► Ok(true)
//!     │     ├─ token.cancelled()  ─► Err(Canceled)
//!     │     └─ sleep(timeout)     ─► Ok(false)
//!     │
//!     └─► Registration dropped on every exit path ─► unregister(key)
//! ```
//!
//! ## Rules
//! - When several outcomes are ready in the same poll the order above wins,
//!   so a zero timeout on an already signaled handle reports `true`.
//! - Across polls, whichever outcome happens first wins; both are valid terminal states.
//! - Dropping the returned future (e.g. the caller is cancelled) unregisters as well.

use std::future::{self, Future};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::WaitError;
use crate::sync::event::{RegistrationKey, WaitHandle};

/// Unregisters from the handle when dropped.
struct Registration<'a, H: WaitHandle + ?Sized> {
    handle: &'a H,
    key: RegistrationKey,
}

impl<H: WaitHandle + ?Sized> Drop for Registration<'_, H> {
    fn drop(&mut self) {
        self.handle.unregister(self.key);
    }
}

/// Waits asynchronously for `handle` to become signaled.
///
/// - `timeout = None` waits indefinitely; `Some(Duration::ZERO)` checks the current state.
/// - `cancel = None` makes the wait non-cancellable (apart from dropping the future).
///
/// # Example
/// ```rust
/// use std::{sync::Arc, time::Duration};
/// use workvisor::{ManualResetEvent, wait_handle};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ev = Arc::new(ManualResetEvent::new(false));
/// let setter = ev.clone();
/// std::thread::spawn(move || setter.set());
///
/// let signaled = wait_handle(ev.as_ref(), Some(Duration::from_secs(5)), None).await;
/// assert_eq!(signaled, Ok(true));
/// # }
/// ```
pub async fn wait_handle<H>(
    handle: &H,
    timeout: Option<Duration>,
    cancel: Option<&CancellationToken>,
) -> Result<bool, WaitError>
where
    H: WaitHandle + ?Sized,
{
    let (tx, rx) = oneshot::channel::<()>();
    let key = handle.register(Box::new(move || {
        let _ = tx.send(());
    }));
    let _registration = Registration { handle, key };

    select_outcome(rx, timeout, cancel).await
}

async fn select_outcome(
    signaled: oneshot::Receiver<()>,
    timeout: Option<Duration>,
    cancel: Option<&CancellationToken>,
) -> Result<bool, WaitError> {
    let cancelled = or_pending(cancel.map(|t| t.cancelled()));
    let expired = or_pending(timeout.map(tokio::time::sleep));

    tokio::select! {
        biased;

        res = signaled => match res {
            Ok(()) => Ok(true),
            // Sender dropped unfired: the handle went away without signaling.
            Err(_) => Ok(false),
        },
        _ = cancelled => Err(WaitError::Canceled),
        _ = expired => Ok(false),
    }
}

/// Awaits `fut` if present, otherwise never resolves.
async fn or_pending<F: Future>(fut: Option<F>) {
    match fut {
        Some(f) => {
            f.await;
        }
        None => future::pending::<()>().await,
    }
}
