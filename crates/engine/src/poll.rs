//! Completion polling.
//!
//! The poller asks the server for an execution's state until it sees a
//! terminal one or gives up. The deadline is checked after each sleep, so a
//! poll can overrun the timeout by up to one interval plus one request; an
//! attempt is never started once the deadline has been observed.

use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vro_api::{StatusCode, Transport};
use vro_types::{ExecutionHandle, ExecutionState};
use vro_util::sleep_unless_cancelled;

use crate::error::WorkflowError;

/// Default time to wait for an execution to finish.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(600);
/// Default pause between state requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_POLL_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Time source for the poll loop.
pub trait PollClock {
    fn now(&self) -> Instant;

    /// Sleep for `duration`. Returns `false` if `cancel` fired first.
    fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> bool;
}

/// Wall clock; sleeps block the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl PollClock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        match sleep_unless_cancelled(duration, cancel) {
            Ok(completed) => completed,
            Err(error) => {
                warn!(error = %error, "cancellable sleep unavailable; sleeping without cancellation");
                thread::sleep(duration);
                !cancel.is_cancelled()
            }
        }
    }
}

/// Final state observed by the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// Always terminal.
    pub state: ExecutionState,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Read the current state of an execution once.
pub fn execution_state(transport: &dyn Transport, handle: &ExecutionHandle) -> Result<ExecutionState, WorkflowError> {
    let response = transport.get(&handle.state_path())?;
    if response.status != StatusCode::OK {
        return Err(WorkflowError::StatePoll {
            workflow_id: handle.workflow_id.clone(),
            execution_id: handle.execution_id.clone(),
            status: response.status,
        });
    }

    response
        .body
        .as_ref()
        .and_then(|body| body.get("value"))
        .and_then(|value| value.as_str())
        .map(ExecutionState::from_server)
        .ok_or_else(|| WorkflowError::malformed("execution state", "response has no string 'value'"))
}

/// Poll until the execution reaches a terminal state or `settings.timeout` elapses.
///
/// Unknown server states are treated as still running. Cancellation is
/// checked before every attempt and interrupts the sleep between attempts.
pub fn poll_execution(
    transport: &dyn Transport,
    handle: &ExecutionHandle,
    settings: PollSettings,
    clock: &dyn PollClock,
    cancel: &CancellationToken,
) -> Result<PollOutcome, WorkflowError> {
    let started = clock.now();
    let mut attempts = 0u32;
    let cancelled = || WorkflowError::Cancelled {
        execution_id: handle.execution_id.clone(),
    };

    loop {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        attempts += 1;
        let state = execution_state(transport, handle)?;
        debug!(execution_id = %handle.execution_id, attempts, state = %state, "execution state polled");

        if state.is_terminal() {
            let elapsed = clock.now().saturating_duration_since(started);
            info!(execution_id = %handle.execution_id, attempts, state = %state, "execution finished");
            return Ok(PollOutcome { state, attempts, elapsed });
        }
        if let ExecutionState::Unknown(raw) = &state {
            debug!(execution_id = %handle.execution_id, state = %raw, "unrecognised state; still waiting");
        }

        if !clock.sleep(settings.interval, cancel) {
            return Err(cancelled());
        }

        let elapsed = clock.now().saturating_duration_since(started);
        if elapsed >= settings.timeout {
            warn!(
                execution_id = %handle.execution_id,
                attempts,
                elapsed_ms = elapsed.as_millis(),
                "gave up waiting for execution"
            );
            return Ok(PollOutcome {
                state: ExecutionState::Timeout,
                attempts,
                elapsed,
            });
        }
    }
}
