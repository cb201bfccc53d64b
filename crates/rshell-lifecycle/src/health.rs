//! Health classification of a task snapshot

use rshell_core::error::HealthError;
use rshell_core::types::{TaskState, TaskStatus};

/// Decide whether a status snapshot is healthy enough to connect to.
///
/// Checks run in order and the first hit wins: a container stop reason, a
/// task stop code, a desired status of STOPPED, then anything but RUNNING.
pub fn check_health(status: &TaskStatus) -> Result<(), HealthError> {
    for container in &status.containers {
        if let Some(reason) = non_empty(&container.reason) {
            return Err(HealthError::ContainerStopped {
                container: container.name.clone(),
                reason: reason.to_string(),
            });
        }
    }

    if let Some(code) = non_empty(&status.stop_code) {
        return Err(HealthError::TaskStopped {
            code: code.to_string(),
            reason: non_empty(&status.stopped_reason).unwrap_or_default().to_string(),
        });
    }

    if status.desired_status == TaskState::Stopped {
        return Err(HealthError::DesiredStopped);
    }

    if status.last_status != TaskState::Running {
        return Err(HealthError::NotRunning {
            last_status: status.last_status.to_string(),
        });
    }

    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rshell_core::types::ContainerStatus;

    fn running() -> TaskStatus {
        TaskStatus {
            last_status: TaskState::Running,
            desired_status: TaskState::Running,
            containers: vec![ContainerStatus {
                name: "svc".to_string(),
                last_status: Some(TaskState::Running),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_running_is_healthy() {
        assert_eq!(check_health(&running()), Ok(()));
    }

    #[test]
    fn test_container_reason_wins() {
        let mut status = running();
        status.containers[0].reason = Some("OutOfMemory".to_string());
        status.stop_code = Some("EssentialContainerExited".to_string());

        assert_eq!(
            check_health(&status),
            Err(HealthError::ContainerStopped {
                container: "svc".to_string(),
                reason: "OutOfMemory".to_string(),
            })
        );
    }

    #[test]
    fn test_task_stop_code() {
        let mut status = running();
        status.stop_code = Some("TaskFailedToStart".to_string());
        status.stopped_reason = Some("CannotPullContainerError".to_string());

        assert_eq!(
            check_health(&status),
            Err(HealthError::TaskStopped {
                code: "TaskFailedToStart".to_string(),
                reason: "CannotPullContainerError".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_reason_is_ignored() {
        let mut status = running();
        status.containers[0].reason = Some(String::new());
        status.stop_code = Some(String::new());
        assert_eq!(check_health(&status), Ok(()));
    }

    #[test]
    fn test_desired_stopped() {
        let mut status = running();
        status.desired_status = TaskState::Stopped;
        assert_eq!(check_health(&status), Err(HealthError::DesiredStopped));
    }

    #[test]
    fn test_still_pending() {
        let mut status = running();
        status.last_status = TaskState::Pending;
        assert_eq!(
            check_health(&status),
            Err(HealthError::NotRunning {
                last_status: "PENDING".to_string()
            })
        );
    }
}
