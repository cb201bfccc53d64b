//! Launch request construction and outcome interpretation

use rshell_core::config::{RemoteConfig, SessionConfig};
use rshell_core::duration::format_go_duration;
use rshell_core::error::LaunchError;
use rshell_core::types::{LaunchOutcome, LaunchRequest, TaskDescriptor, TaskHandle};

/// Build the run request for a descriptor.
///
/// The remote shell is started as
/// `<path> -port <port> -maxtime <max> -idletime <idle>` and receives the
/// authorized key through its environment.
pub fn build_launch_request(
    descriptor: &TaskDescriptor,
    remote: &RemoteConfig,
    session: &SessionConfig,
) -> LaunchRequest {
    let command_path = descriptor
        .command_path
        .clone()
        .unwrap_or_else(|| remote.command_path.clone());

    let command = vec![
        command_path,
        "-port".to_string(),
        descriptor.port.to_string(),
        "-maxtime".to_string(),
        format_go_duration(session.max_time),
        "-idletime".to_string(),
        format_go_duration(session.idle_time),
    ];

    LaunchRequest {
        template_id: descriptor.template_id.clone(),
        cluster: descriptor.cluster.clone(),
        container_name: descriptor.container_name.clone(),
        command,
        environment: vec![(
            remote.authorized_key_env.clone(),
            session.authorized_key.clone(),
        )],
        network: descriptor.network.clone(),
        started_by: remote.started_by.clone(),
        platform_version: remote.platform_version.clone(),
    }
}

/// Turn the raw run response into a task handle.
///
/// Reported failures win over a returned task. The task id, when present,
/// is carried inside the error so the caller can still tear it down.
pub fn interpret_outcome(outcome: LaunchOutcome, cluster: &str) -> Result<TaskHandle, LaunchError> {
    let handle = outcome
        .task_id
        .filter(|id| !id.is_empty())
        .map(|id| TaskHandle::new(cluster, id));

    if let Some(failure) = outcome.failures.into_iter().next() {
        return Err(LaunchError::Failures {
            reason: failure.reason,
            detail: failure.detail,
            handle,
        });
    }

    handle.ok_or(LaunchError::NoTask)
}
