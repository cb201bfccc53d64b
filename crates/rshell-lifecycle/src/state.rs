//! Lifecycle states

use std::fmt;

/// Stage of the task lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Fetching the template and extracting its descriptor
    Resolving,
    /// Submitting the run request
    Launching,
    /// Polling until the task runs
    AwaitingRunning,
    /// Classifying the latest status snapshot
    HealthChecking,
    /// Determining the reachable address
    AddressResolving,
    /// Endpoint known, session not yet started
    Ready,
    /// Session bridge running
    Interactive,
    /// Stopping the task
    Terminating,
    /// Nothing left to do
    Terminated,
}

impl LifecycleState {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn allows(self, next: LifecycleState) -> bool {
        use LifecycleState::*;

        match (self, next) {
            (Terminated, _) => false,
            (Terminating, Terminated) => true,
            (Terminating, _) => false,
            // Any live state may abort into teardown
            (_, Terminating) => self != Resolving,
            // No handle exists yet, so nothing is owed
            (Resolving, Terminated) | (Launching, Terminated) => true,
            (Resolving, Launching)
            | (Launching, AwaitingRunning)
            | (AwaitingRunning, HealthChecking)
            | (HealthChecking, AddressResolving)
            | (AddressResolving, Ready)
            | (Ready, Interactive) => true,
            _ => false,
        }
    }

    /// Returns true once the lifecycle is finished
    pub fn is_terminal(self) -> bool {
        self == LifecycleState::Terminated
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Resolving => "resolving",
            LifecycleState::Launching => "launching",
            LifecycleState::AwaitingRunning => "awaiting-running",
            LifecycleState::HealthChecking => "health-checking",
            LifecycleState::AddressResolving => "address-resolving",
            LifecycleState::Ready => "ready",
            LifecycleState::Interactive => "interactive",
            LifecycleState::Terminating => "terminating",
            LifecycleState::Terminated => "terminated",
        };
        write!(f, "{}", name)
    }
}
