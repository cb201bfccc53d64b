//! Polling a launched task until it runs

use std::time::Duration;

use rshell_core::config::WaitConfig;
use rshell_core::traits::ComputeOrchestrator;
use rshell_core::types::{TaskHandle, TaskState};

use crate::backoff::ExponentialBackoff;

/// How the wait ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The task reported RUNNING
    Running,
    /// The task reached a state it cannot leave
    Stopped(TaskState),
    /// The time limit passed first
    TimedOut {
        /// Last status observed, if any poll succeeded
        last_status: Option<TaskState>,
    },
}

/// Poll `handle` until it is RUNNING, terminally stopped, or the wait
/// times out.
///
/// Neither a timeout nor a failed poll is an error here; the caller takes a
/// fresh snapshot afterwards and judges that.
pub async fn await_running(
    orchestrator: &dyn ComputeOrchestrator,
    handle: &TaskHandle,
    config: &WaitConfig,
) -> WaitOutcome {
    let deadline = tokio::time::Instant::now() + config.timeout;
    let mut backoff = ExponentialBackoff::from_config(config);
    let mut last_status = None;

    tracing::info!("Waiting for task {} to start", handle);

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            tracing::warn!(
                "Task {} did not reach RUNNING within {:?} (last status: {})",
                handle,
                config.timeout,
                last_status
                    .as_ref()
                    .map(TaskState::as_str)
                    .unwrap_or("unknown")
            );
            return WaitOutcome::TimedOut { last_status };
        }

        let delay: Duration = std::cmp::min(backoff.next_delay(), remaining);
        tokio::time::sleep(delay).await;

        match orchestrator.describe_task(handle).await {
            Ok(status) => {
                tracing::debug!("Task {} is {}", handle, status.last_status);
                match status.last_status {
                    TaskState::Running => return WaitOutcome::Running,
                    state if state.is_terminal() => {
                        tracing::warn!("Task {} stopped while starting", handle);
                        return WaitOutcome::Stopped(state);
                    }
                    state => last_status = Some(state),
                }
            }
            Err(e) => tracing::warn!("Failed to poll task {}: {}", handle, e),
        }
    }
}
