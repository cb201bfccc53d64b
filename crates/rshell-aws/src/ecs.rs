//! Task orchestration through ECS

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::operation::describe_task_definition::DescribeTaskDefinitionError;
use aws_sdk_ecs::types::{
    AssignPublicIp, AwsVpcConfiguration, ContainerOverride, KeyValuePair, LaunchType,
    NetworkConfiguration, TaskOverride,
};

use rshell_core::error::ApiError;
use rshell_core::traits::ComputeOrchestrator;
use rshell_core::types::{LaunchOutcome, LaunchRequest, TaskHandle, TaskStatus, TaskTemplate};

use crate::convert;

/// [`ComputeOrchestrator`] running tasks on ECS Fargate
#[derive(Debug, Clone)]
pub struct EcsOrchestrator {
    client: aws_sdk_ecs::Client,
}

impl EcsOrchestrator {
    /// Create an orchestrator from shared SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ecs::Client::new(config),
        }
    }
}

/// Message ECS attaches to the client exception for an unknown family or revision
const UNKNOWN_TEMPLATE_MESSAGE: &str = "Unable to describe task definition";

fn is_unknown_template(error: &DescribeTaskDefinitionError) -> bool {
    match error {
        DescribeTaskDefinitionError::ClientException(e) => e
            .message()
            .map(|message| message.contains(UNKNOWN_TEMPLATE_MESSAGE))
            .unwrap_or(false),
        _ => false,
    }
}

fn network_configuration(request: &LaunchRequest) -> Result<NetworkConfiguration, ApiError> {
    let assign_public_ip = if request.network.assign_public_ip {
        AssignPublicIp::Enabled
    } else {
        AssignPublicIp::Disabled
    };

    let awsvpc = AwsVpcConfiguration::builder()
        .set_subnets(Some(request.network.subnets.clone()))
        .set_security_groups(Some(request.network.security_groups.clone()))
        .assign_public_ip(assign_public_ip)
        .build()
        .map_err(|e| ApiError::request("RunTask", e))?;

    Ok(NetworkConfiguration::builder()
        .awsvpc_configuration(awsvpc)
        .build())
}

fn task_override(request: &LaunchRequest) -> TaskOverride {
    let environment = request
        .environment
        .iter()
        .map(|(name, value)| KeyValuePair::builder().name(name).value(value).build())
        .collect();

    TaskOverride::builder()
        .container_overrides(
            ContainerOverride::builder()
                .name(&request.container_name)
                .set_command(Some(request.command.clone()))
                .set_environment(Some(environment))
                .build(),
        )
        .build()
}

#[async_trait]
impl ComputeOrchestrator for EcsOrchestrator {
    async fn describe_task_template(&self, name: &str) -> Result<Option<TaskTemplate>, ApiError> {
        let output = match self
            .client
            .describe_task_definition()
            .task_definition(name)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                if e.as_service_error().map(is_unknown_template).unwrap_or(false) {
                    tracing::debug!("Task definition {} not found: {}", name, DisplayErrorContext(&e));
                    return Ok(None);
                }
                return Err(ApiError::request("DescribeTaskDefinition", DisplayErrorContext(&e)));
            }
        };

        Ok(output.task_definition().map(convert::task_template))
    }

    async fn run_task(&self, request: &LaunchRequest) -> Result<LaunchOutcome, ApiError> {
        let output = self
            .client
            .run_task()
            .cluster(&request.cluster)
            .task_definition(&request.template_id)
            .launch_type(LaunchType::Fargate)
            .platform_version(&request.platform_version)
            .started_by(&request.started_by)
            .count(1)
            .network_configuration(network_configuration(request)?)
            .overrides(task_override(request))
            .send()
            .await
            .map_err(|e| ApiError::request("RunTask", DisplayErrorContext(&e)))?;

        Ok(LaunchOutcome {
            task_id: output
                .tasks()
                .first()
                .and_then(|task| task.task_arn())
                .map(str::to_string),
            failures: output.failures().iter().map(convert::launch_failure).collect(),
        })
    }

    async fn describe_task(&self, handle: &TaskHandle) -> Result<TaskStatus, ApiError> {
        let output = self
            .client
            .describe_tasks()
            .cluster(&handle.cluster)
            .tasks(&handle.task_id)
            .send()
            .await
            .map_err(|e| ApiError::request("DescribeTasks", DisplayErrorContext(&e)))?;

        if let Some(failure) = output.failures().first() {
            tracing::debug!(
                "DescribeTasks reported {} for {}",
                failure.reason().unwrap_or("a failure"),
                handle
            );
        }

        output
            .tasks()
            .first()
            .map(convert::task_status)
            .ok_or_else(|| ApiError::missing("DescribeTasks", "task"))
    }

    async fn stop_task(&self, handle: &TaskHandle, reason: &str) -> Result<(), ApiError> {
        self.client
            .stop_task()
            .cluster(&handle.cluster)
            .task(&handle.task_id)
            .reason(reason)
            .send()
            .await
            .map_err(|e| ApiError::request("StopTask", DisplayErrorContext(&e)))?;
        Ok(())
    }
}
