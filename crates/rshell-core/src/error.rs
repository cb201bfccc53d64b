//! Core error types for rshell
//!
//! Each stage of the task lifecycle has its own error enum. They all fold
//! into [`RshellError`], which is what the lifecycle returns to the
//! top-level boundary.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::TaskHandle;

/// Top-level error type for an rshell invocation
#[derive(Error, Debug)]
pub enum RshellError {
    /// Configuration file or option error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task template could not be turned into a descriptor
    #[error("Invalid task template: {0}")]
    Descriptor(#[from] DescriptorError),

    /// Task could not be launched
    #[error("Launch error: {0}")]
    Launch(#[from] LaunchError),

    /// Task is not healthy enough to connect to
    #[error("Task unhealthy: {0}")]
    Health(#[from] HealthError),

    /// Reachable address could not be determined
    #[error("Address unavailable: {0}")]
    Address(#[from] AddressError),

    /// Interactive session failed
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Remote API call failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Local interrupt received before the interactive phase
    #[error("Interrupted before the session started")]
    Interrupted,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RshellError {
    /// Exit status the process should report for this error.
    ///
    /// A remote shell's own non-zero status is passed through; everything
    /// else is a generic failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            RshellError::Session(SessionError::RemoteExit { code }) => {
                (*code).clamp(1, 255) as u8
            }
            _ => 1,
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Errors raised while extracting a descriptor from a task template
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// No task template matches the requested name
    #[error("Task template not found: {0}")]
    TemplateNotFound(String),

    /// No container carries a parseable descriptor label
    #[error("Task template {template} has no usable '{label}' configuration label")]
    MissingLabel { template: String, label: String },

    /// The chosen container exposes no ports at all
    #[error("Container '{container}' has no open ports")]
    NoOpenPorts { container: String },

    /// The chosen container exposes ports, but none over TCP
    #[error("Container '{container}' has no open TCP ports")]
    NoTcpPort { container: String },
}

/// Errors raised while launching a task
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The run request itself was rejected
    #[error("Run request rejected: {0}")]
    Rejected(String),

    /// The API accepted the request but reported failures.
    ///
    /// A handle may still have been produced and must then be torn down.
    #[error("Launch reported failure: {reason}: {detail}")]
    Failures {
        reason: String,
        detail: String,
        handle: Option<TaskHandle>,
    },

    /// The API returned neither a task nor a failure
    #[error("Run request returned no task")]
    NoTask,
}

impl LaunchError {
    /// Handle produced alongside the failure, if any
    pub fn handle(&self) -> Option<&TaskHandle> {
        match self {
            LaunchError::Failures { handle, .. } => handle.as_ref(),
            _ => None,
        }
    }
}

/// Health check failures for a launched task
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HealthError {
    /// A container inside the task reported a stop reason
    #[error("Container '{container}' stopped: {reason}")]
    ContainerStopped { container: String, reason: String },

    /// The task as a whole reported a stop code
    #[error("Task stopped ({code}): {reason}")]
    TaskStopped { code: String, reason: String },

    /// The orchestrator wants the task stopped
    #[error("Task desired status is STOPPED")]
    DesiredStopped,

    /// The task never reached RUNNING
    #[error("Task is not running (last status: {last_status})")]
    NotRunning { last_status: String },
}

/// Address resolution failures
#[derive(Error, Debug)]
pub enum AddressError {
    /// The container has no network interface attached
    #[error("Container '{container}' has no network interface")]
    NoNetworkInterface { container: String },

    /// The network interface has no private address
    #[error("Container '{container}' has no private address")]
    NoPrivateAddress { container: String },

    /// The interface's attachment was not found on the task
    #[error("No task attachment matches '{attachment_id}'")]
    NoAttachment { attachment_id: String },

    /// The attachment does not name a network interface id
    #[error("Attachment '{attachment_id}' does not name a network interface")]
    NoInterfaceId { attachment_id: String },

    /// The interface has no public address
    #[error("Network interface '{interface_id}' has no public address")]
    NoPublicAddress { interface_id: String },
}

/// Interactive session errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// Transport connection could not be established
    #[error("Failed to connect to {address}: {message}")]
    Connect { address: String, message: String },

    /// Transport connection timed out
    #[error("Connection to {address} timed out")]
    Timeout { address: String },

    /// No identity is available to authenticate with
    #[error("No identities available for authentication")]
    NoIdentities,

    /// Every identity was rejected
    #[error("Authentication failed: all {tried} identities were rejected")]
    AuthenticationFailed { tried: usize },

    /// Remote side refused the PTY request
    #[error("PTY request refused: {0}")]
    Pty(String),

    /// Remote side refused to start a shell
    #[error("Shell request refused: {0}")]
    Shell(String),

    /// Transport dropped before the shell exited
    #[error("Connection closed before the remote shell exited")]
    TransportClosed,

    /// Remote shell exited with a non-zero status
    #[error("Remote shell exited with status {code}")]
    RemoteExit { code: u32 },

    /// Remote shell was killed by a signal
    #[error("Remote shell terminated by signal {signal}")]
    RemoteSignal { signal: String },

    /// Protocol-level failure on an established connection
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Local terminal I/O failure
    #[error("Terminal I/O error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Failures of the remote orchestration or identity-resolution APIs
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request failed
    #[error("{operation} failed: {message}")]
    Request { operation: String, message: String },

    /// The response did not contain what was asked for
    #[error("{operation} returned no {what}")]
    Missing { operation: String, what: String },
}

impl ApiError {
    /// Create a request error for an operation
    pub fn request(operation: impl Into<String>, message: impl ToString) -> Self {
        ApiError::Request {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Create an error for an empty response
    pub fn missing(operation: impl Into<String>, what: impl Into<String>) -> Self {
        ApiError::Missing {
            operation: operation.into(),
            what: what.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_exit_code_is_propagated() {
        let err = RshellError::from(SessionError::RemoteExit { code: 130 });
        assert_eq!(err.exit_code(), 130);

        let err = RshellError::from(SessionError::RemoteExit { code: 4096 });
        assert_eq!(err.exit_code(), 255);
    }

    #[test]
    fn test_other_errors_exit_one() {
        assert_eq!(RshellError::Interrupted.exit_code(), 1);
        let err = RshellError::from(HealthError::DesiredStopped);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_launch_error_handle() {
        let handle = TaskHandle::new("c1", "arn:task/1");
        let err = LaunchError::Failures {
            reason: "RESOURCE:MEMORY".into(),
            detail: "none".into(),
            handle: Some(handle.clone()),
        };
        assert_eq!(err.handle(), Some(&handle));
        assert!(LaunchError::NoTask.handle().is_none());
    }
}
