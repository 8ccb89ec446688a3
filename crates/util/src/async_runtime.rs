//! Async runtime helpers for blocking callers.
//!
//! The workflow engine is synchronous while the HTTP client is async. These
//! helpers run futures to completion from synchronous code, reusing the
//! current Tokio runtime when one is available.

use std::future::Future;
use std::time::Duration;

use anyhow::anyhow;
use tokio::{runtime::Handle, task};
use tokio_util::sync::CancellationToken;

/// Execute an async future from synchronous code.
///
/// # Arguments
/// - `future`: The future to run to completion.
///
/// # Returns
/// Returns the future's output or an error if a Tokio runtime cannot be created.
///
/// # Notes
/// - Reuses the current runtime when available (multi-threaded runtimes only).
/// - Falls back to a single-threaded runtime for call sites outside Tokio.
pub fn block_on_future<F, T>(future: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        task::block_in_place(|| handle.block_on(future))
    } else {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| anyhow!(error))?
            .block_on(future)
    }
}

/// Block the calling thread for `duration`, waking early if `cancel` fires.
///
/// Returns `true` when the full duration elapsed and `false` when the wait was
/// cut short by cancellation (including a token that was already cancelled).
pub fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationToken) -> anyhow::Result<bool> {
    if cancel.is_cancelled() {
        return Ok(false);
    }
    let cancel = cancel.clone();
    block_on_future(async move {
        tokio::select! {
            _ = cancel.cancelled() => Ok(false),
            _ = tokio::time::sleep(duration) => Ok(true),
        }
    })
}
