//! Compute orchestration API

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{LaunchOutcome, LaunchRequest, TaskHandle, TaskStatus, TaskTemplate};

/// Abstraction over a cloud task-orchestration API
#[async_trait]
pub trait ComputeOrchestrator: Send + Sync {
    /// Fetch a task template by name; `None` when nothing matches
    async fn describe_task_template(&self, name: &str) -> Result<Option<TaskTemplate>, ApiError>;

    /// Submit a run request.
    ///
    /// An `Err` means the request was rejected outright and no task exists.
    /// Partial failures are reported inside the outcome.
    async fn run_task(&self, request: &LaunchRequest) -> Result<LaunchOutcome, ApiError>;

    /// Take a status snapshot of a launched task
    async fn describe_task(&self, handle: &TaskHandle) -> Result<TaskStatus, ApiError>;

    /// Ask the orchestrator to stop a task
    async fn stop_task(&self, handle: &TaskHandle, reason: &str) -> Result<(), ApiError>;
}
