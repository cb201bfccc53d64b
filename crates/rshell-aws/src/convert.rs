//! Conversions from ECS wire types into rshell types

use std::collections::BTreeMap;

use aws_sdk_ecs::types as ecs;

use rshell_core::types::{
    ContainerStatus, ContainerTemplate, LaunchFailure, NetworkInterface, PortMapping,
    TaskAttachment, TaskState, TaskStatus, TaskTemplate, TransportProtocol,
};

pub(crate) fn task_template(definition: &ecs::TaskDefinition) -> TaskTemplate {
    TaskTemplate {
        id: definition
            .task_definition_arn()
            .unwrap_or_default()
            .to_string(),
        containers: definition
            .container_definitions()
            .iter()
            .map(container_template)
            .collect(),
    }
}

fn container_template(definition: &ecs::ContainerDefinition) -> ContainerTemplate {
    ContainerTemplate {
        name: definition.name().unwrap_or_default().to_string(),
        port_mappings: definition
            .port_mappings()
            .iter()
            .filter_map(port_mapping)
            .collect(),
        labels: definition
            .docker_labels()
            .map(|labels| {
                labels
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn port_mapping(mapping: &ecs::PortMapping) -> Option<PortMapping> {
    let port = u16::try_from(mapping.container_port()?).ok()?;
    let protocol = match mapping.protocol() {
        Some(ecs::TransportProtocol::Udp) => TransportProtocol::Udp,
        // The API default for a mapping without a protocol is TCP
        _ => TransportProtocol::Tcp,
    };
    Some(PortMapping {
        container_port: port,
        protocol,
    })
}

fn state(value: Option<&str>) -> TaskState {
    value.map(TaskState::from).unwrap_or_default()
}

pub(crate) fn task_status(task: &ecs::Task) -> TaskStatus {
    TaskStatus {
        last_status: state(task.last_status()),
        desired_status: state(task.desired_status()),
        stop_code: task.stop_code().map(|code| code.as_str().to_string()),
        stopped_reason: task.stopped_reason().map(str::to_string),
        containers: task.containers().iter().map(container_status).collect(),
        attachments: task.attachments().iter().map(attachment).collect(),
    }
}

fn container_status(container: &ecs::Container) -> ContainerStatus {
    ContainerStatus {
        name: container.name().unwrap_or_default().to_string(),
        last_status: container.last_status().map(TaskState::from),
        reason: container.reason().map(str::to_string),
        exit_code: container.exit_code(),
        network_interfaces: container
            .network_interfaces()
            .iter()
            .map(|ni| NetworkInterface {
                attachment_id: ni.attachment_id().map(str::to_string),
                private_ipv4_address: ni.private_ipv4_address().map(str::to_string),
            })
            .collect(),
    }
}

fn attachment(attachment: &ecs::Attachment) -> TaskAttachment {
    let details: BTreeMap<String, String> = attachment
        .details()
        .iter()
        .filter_map(|kv| Some((kv.name()?.to_string(), kv.value()?.to_string())))
        .collect();
    TaskAttachment {
        id: attachment.id().unwrap_or_default().to_string(),
        details,
    }
}

pub(crate) fn launch_failure(failure: &ecs::Failure) -> LaunchFailure {
    LaunchFailure {
        reason: failure.reason().unwrap_or("unknown").to_string(),
        detail: failure.detail().unwrap_or_default().to_string(),
    }
}
