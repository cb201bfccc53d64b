//! Task teardown obligation
//!
//! Every task handle returned by a launch is wrapped in a
//! [`TeardownObligation`] the moment it exists. Discharging consumes the
//! obligation, so a task can be stopped at most once through it.

use rshell_core::traits::ComputeOrchestrator;
use rshell_core::types::TaskHandle;

/// Reason recorded on every task this client stops
pub const TEARDOWN_REASON: &str = "finished with remote shell";

/// An outstanding duty to stop a launched task
#[must_use = "a launched task must be stopped by discharging its obligation"]
#[derive(Debug)]
pub struct TeardownObligation {
    handle: TaskHandle,
    discharged: bool,
}

impl TeardownObligation {
    /// Take on the obligation for a freshly launched task
    pub fn new(handle: TaskHandle) -> Self {
        tracing::debug!("Registered teardown for task {}", handle);
        Self {
            handle,
            discharged: false,
        }
    }

    /// The task this obligation covers
    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    /// Stop the task.
    ///
    /// Failures are logged and swallowed; they never replace the error that
    /// led here.
    pub async fn discharge(mut self, orchestrator: &dyn ComputeOrchestrator) {
        self.discharged = true;

        tracing::info!("Terminating task {}", self.handle);
        match orchestrator.stop_task(&self.handle, TEARDOWN_REASON).await {
            Ok(()) => tracing::debug!("Stop requested for task {}", self.handle),
            Err(e) => tracing::warn!("Failed to terminate task {}: {}", self.handle, e),
        }
    }
}

impl Drop for TeardownObligation {
    fn drop(&mut self) {
        if !self.discharged {
            tracing::error!(
                "Task {} in cluster {} was never terminated",
                self.handle,
                self.handle.cluster
            );
        }
    }
}
