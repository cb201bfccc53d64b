//! Task descriptor extraction
//!
//! Finds the container carrying the remote shell label in a task template,
//! parses the label and picks the port the remote shell will listen on.

use crate::config::RemoteConfig;
use crate::error::DescriptorError;
use crate::types::{
    ContainerTemplate, NetworkPlacement, RemoteShellLabel, TaskDescriptor, TaskTemplate,
    TransportProtocol,
};

/// Extracts a [`TaskDescriptor`] from a [`TaskTemplate`]
#[derive(Debug, Clone)]
pub struct DescriptorExtractor {
    label_key: String,
    preferred_ports: Vec<u16>,
}

impl DescriptorExtractor {
    /// Create an extractor for a label key and port preference order
    pub fn new(label_key: impl Into<String>, preferred_ports: Vec<u16>) -> Self {
        Self {
            label_key: label_key.into(),
            preferred_ports,
        }
    }

    /// Create an extractor from the remote conventions in the config
    pub fn from_config(config: &RemoteConfig) -> Self {
        Self::new(config.label_key.clone(), config.preferred_ports.clone())
    }

    /// Build the descriptor for a template.
    ///
    /// The first container whose label parses wins. Containers with a
    /// malformed label are skipped.
    pub fn extract(&self, template: &TaskTemplate) -> Result<TaskDescriptor, DescriptorError> {
        let (container, label) = template
            .containers
            .iter()
            .find_map(|container| {
                let raw = container.labels.get(&self.label_key)?;
                match serde_json::from_str::<RemoteShellLabel>(raw) {
                    Ok(label) => Some((container, label)),
                    Err(e) => {
                        tracing::warn!(
                            "Ignoring malformed '{}' label on container '{}': {}",
                            self.label_key,
                            container.name,
                            e
                        );
                        None
                    }
                }
            })
            .ok_or_else(|| DescriptorError::MissingLabel {
                template: template.id.clone(),
                label: self.label_key.clone(),
            })?;

        let port = self.select_port(container)?;
        if label.port != 0 && label.port != port {
            tracing::debug!(
                "Label declares port {} but container exposes {}; using {}",
                label.port,
                port,
                port
            );
        }

        Ok(TaskDescriptor {
            template_id: template.id.clone(),
            container_name: container.name.clone(),
            port,
            cluster: label.cluster,
            network: NetworkPlacement {
                subnets: label.subnet_ids,
                security_groups: label.security_group_ids,
                assign_public_ip: label.assign_public_ip,
            },
            command_path: label.path.filter(|p| !p.is_empty()),
        })
    }

    /// Pick the remote shell port of a container.
    ///
    /// Preferred ports are tried in order; otherwise the first TCP mapping
    /// is used.
    pub fn select_port(&self, container: &ContainerTemplate) -> Result<u16, DescriptorError> {
        if container.port_mappings.is_empty() {
            return Err(DescriptorError::NoOpenPorts {
                container: container.name.clone(),
            });
        }

        let mut tcp_ports = container
            .port_mappings
            .iter()
            .filter(|m| m.protocol == TransportProtocol::Tcp)
            .map(|m| m.container_port);

        for preferred in &self.preferred_ports {
            if tcp_ports.clone().any(|port| port == *preferred) {
                return Ok(*preferred);
            }
        }

        let fallback = tcp_ports.next().ok_or_else(|| DescriptorError::NoTcpPort {
            container: container.name.clone(),
        })?;
        tracing::warn!(
            "No preferred remote shell port on '{}', falling back to {}",
            container.name,
            fallback
        );
        Ok(fallback)
    }
}

impl Default for DescriptorExtractor {
    fn default() -> Self {
        Self::from_config(&RemoteConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortMapping;
    use std::collections::BTreeMap;

    const LABEL: &str = r#"{"cluster":"c1","subnets":["s1"],"security_groups":["g1"],"public":false,"port":8722}"#;

    fn container(name: &str, label: Option<&str>, ports: Vec<PortMapping>) -> ContainerTemplate {
        let mut labels = BTreeMap::new();
        if let Some(label) = label {
            labels.insert("cloud87.rshell".to_string(), label.to_string());
        }
        ContainerTemplate {
            name: name.to_string(),
            port_mappings: ports,
            labels,
        }
    }

    fn template(containers: Vec<ContainerTemplate>) -> TaskTemplate {
        TaskTemplate {
            id: "arn:aws:ecs:task-definition/svc-console:3".to_string(),
            containers,
        }
    }

    #[test]
    fn test_prefers_first_well_known_port() {
        let extractor = DescriptorExtractor::default();
        let c = container(
            "app",
            Some(LABEL),
            vec![PortMapping::tcp(80), PortMapping::tcp(22), PortMapping::tcp(8722)],
        );
        assert_eq!(extractor.select_port(&c).unwrap(), 8722);
    }

    #[test]
    fn test_falls_back_to_secondary_port() {
        let extractor = DescriptorExtractor::default();
        let c = container("app", None, vec![PortMapping::tcp(80), PortMapping::tcp(22)]);
        assert_eq!(extractor.select_port(&c).unwrap(), 22);
    }

    #[test]
    fn test_falls_back_to_first_tcp_port() {
        let extractor = DescriptorExtractor::default();
        let c = container(
            "app",
            None,
            vec![PortMapping::udp(8722), PortMapping::tcp(9000), PortMapping::tcp(9001)],
        );
        assert_eq!(extractor.select_port(&c).unwrap(), 9000);
    }

    #[test]
    fn test_udp_only_fails() {
        let extractor = DescriptorExtractor::default();
        let c = container("app", None, vec![PortMapping::udp(8722), PortMapping::udp(22)]);
        assert!(matches!(
            extractor.select_port(&c),
            Err(DescriptorError::NoTcpPort { .. })
        ));
    }

    #[test]
    fn test_no_ports_fails() {
        let extractor = DescriptorExtractor::default();
        let c = container("app", None, vec![]);
        assert!(matches!(
            extractor.select_port(&c),
            Err(DescriptorError::NoOpenPorts { .. })
        ));
    }

    #[test]
    fn test_extracts_labelled_container() {
        let extractor = DescriptorExtractor::default();
        let t = template(vec![
            container("sidecar", None, vec![PortMapping::tcp(22)]),
            container("svc", Some(LABEL), vec![PortMapping::tcp(8722)]),
        ]);

        let descriptor = extractor.extract(&t).unwrap();
        assert_eq!(descriptor.container_name, "svc");
        assert_eq!(descriptor.port, 8722);
        assert_eq!(descriptor.cluster, "c1");
        assert_eq!(descriptor.network.subnets, vec!["s1"]);
        assert_eq!(descriptor.network.security_groups, vec!["g1"]);
        assert!(!descriptor.network.assign_public_ip);
        assert_eq!(descriptor.command_path, None);
    }

    #[test]
    fn test_malformed_label_is_skipped() {
        let extractor = DescriptorExtractor::default();
        let t = template(vec![
            container("broken", Some("{not json"), vec![PortMapping::tcp(8722)]),
            container(
                "svc",
                Some(r#"{"cluster":"c2","public":true,"path":"/opt/rshell"}"#),
                vec![PortMapping::tcp(22)],
            ),
        ]);

        let descriptor = extractor.extract(&t).unwrap();
        assert_eq!(descriptor.container_name, "svc");
        assert_eq!(descriptor.port, 22);
        assert!(descriptor.network.assign_public_ip);
        assert_eq!(descriptor.command_path.as_deref(), Some("/opt/rshell"));
    }

    #[test]
    fn test_missing_label_fails() {
        let extractor = DescriptorExtractor::default();
        let t = template(vec![container("svc", None, vec![PortMapping::tcp(8722)])]);
        assert!(matches!(
            extractor.extract(&t),
            Err(DescriptorError::MissingLabel { .. })
        ));
    }

    #[test]
    fn test_custom_label_key_and_ports() {
        let extractor = DescriptorExtractor::new("cloud87.rshell", vec![2222]);
        let t = template(vec![container(
            "svc",
            Some(LABEL),
            vec![PortMapping::tcp(8722), PortMapping::tcp(2222)],
        )]);
        assert_eq!(extractor.extract(&t).unwrap().port, 2222);
    }
}
