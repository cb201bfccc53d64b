//! Core domain types
//!
//! Provider-neutral views of task templates, launched tasks and their
//! status snapshots. The provider client converts its own wire types into
//! these.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Transport protocol of a port mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportProtocol {
    Tcp,
    Udp,
}

/// A container port exposed by a task template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// Port inside the container
    pub container_port: u16,
    /// Protocol of the mapping
    pub protocol: TransportProtocol,
}

impl PortMapping {
    /// Convenience constructor for a TCP mapping
    pub fn tcp(container_port: u16) -> Self {
        Self {
            container_port,
            protocol: TransportProtocol::Tcp,
        }
    }

    /// Convenience constructor for a UDP mapping
    pub fn udp(container_port: u16) -> Self {
        Self {
            container_port,
            protocol: TransportProtocol::Udp,
        }
    }
}

/// A container definition inside a task template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerTemplate {
    /// Container name
    pub name: String,
    /// Exposed ports
    pub port_mappings: Vec<PortMapping>,
    /// Free-form labels
    pub labels: BTreeMap<String, String>,
}

/// Immutable description of a deployable unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    /// Fully qualified template identifier (ARN)
    pub id: String,
    /// Container definitions
    pub containers: Vec<ContainerTemplate>,
}

/// The configuration label embedded in a task template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteShellLabel {
    /// Cluster to run the task in
    pub cluster: String,
    /// Subnets for the task's network interface
    #[serde(default, rename = "subnets")]
    pub subnet_ids: Vec<String>,
    /// Security groups for the task's network interface
    #[serde(default, rename = "security_groups")]
    pub security_group_ids: Vec<String>,
    /// Whether the task gets a public address
    #[serde(default, rename = "public")]
    pub assign_public_ip: bool,
    /// Port the remote shell listens on, as declared by the template author
    #[serde(default)]
    pub port: u16,
    /// Override for the remote shell executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Network placement of a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkPlacement {
    /// Subnet identifiers
    pub subnets: Vec<String>,
    /// Security group identifiers
    pub security_groups: Vec<String>,
    /// Whether a public address is assigned
    pub assign_public_ip: bool,
}

/// Everything the lifecycle needs to know about a template, extracted once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    /// Identifier of the template the descriptor was extracted from
    pub template_id: String,
    /// Container that runs the remote shell
    pub container_name: String,
    /// Port the remote shell listens on
    pub port: u16,
    /// Cluster identity
    pub cluster: String,
    /// Network placement
    pub network: NetworkPlacement,
    /// Override for the remote shell executable
    pub command_path: Option<String>,
}

/// Opaque identifier of one launched task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Cluster the task runs in
    pub cluster: String,
    /// Task identifier (ARN)
    pub task_id: String,
}

impl TaskHandle {
    /// Create a new task handle
    pub fn new(cluster: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            task_id: task_id.into(),
        }
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.task_id)
    }
}

/// Lifecycle status reported for a task or container
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TaskState {
    Provisioning,
    #[default]
    Pending,
    Activating,
    Running,
    Deactivating,
    Stopping,
    Deprovisioning,
    Stopped,
    Deleted,
    /// A status this client does not know about
    Other(String),
}

impl TaskState {
    /// Returns true once the task can no longer become RUNNING
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Deleted)
    }

    /// Wire representation of the state
    pub fn as_str(&self) -> &str {
        match self {
            Self::Provisioning => "PROVISIONING",
            Self::Pending => "PENDING",
            Self::Activating => "ACTIVATING",
            Self::Running => "RUNNING",
            Self::Deactivating => "DEACTIVATING",
            Self::Stopping => "STOPPING",
            Self::Deprovisioning => "DEPROVISIONING",
            Self::Stopped => "STOPPED",
            Self::Deleted => "DELETED",
            Self::Other(s) => s,
        }
    }
}

impl FromStr for TaskState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "PROVISIONING" => Self::Provisioning,
            "PENDING" => Self::Pending,
            "ACTIVATING" => Self::Activating,
            "RUNNING" => Self::Running,
            "DEACTIVATING" => Self::Deactivating,
            "STOPPING" => Self::Stopping,
            "DEPROVISIONING" => Self::Deprovisioning,
            "STOPPED" => Self::Stopped,
            "DELETED" => Self::Deleted,
            _ => Self::Other(s.to_string()),
        })
    }
}

impl From<&str> for TaskState {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(state) => state,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A network interface attached to a running container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInterface {
    /// Attachment this interface belongs to
    pub attachment_id: Option<String>,
    /// Private IPv4 address
    pub private_ipv4_address: Option<String>,
}

/// Point-in-time status of one container in a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStatus {
    /// Container name
    pub name: String,
    /// Last reported status
    pub last_status: Option<TaskState>,
    /// Stop reason, if the container stopped
    pub reason: Option<String>,
    /// Exit code, if the container exited
    pub exit_code: Option<i32>,
    /// Attached network interfaces
    pub network_interfaces: Vec<NetworkInterface>,
}

/// A resource attached to a task (e.g. an elastic network interface)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskAttachment {
    /// Attachment identifier
    pub id: String,
    /// Key/value details
    pub details: BTreeMap<String, String>,
}

/// Point-in-time snapshot of a launched task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStatus {
    /// Last reported status
    pub last_status: TaskState,
    /// Status the orchestrator is driving towards
    pub desired_status: TaskState,
    /// Stop code, if the task is stopping
    pub stop_code: Option<String>,
    /// Human-readable stop reason
    pub stopped_reason: Option<String>,
    /// Per-container status
    pub containers: Vec<ContainerStatus>,
    /// Attachments
    pub attachments: Vec<TaskAttachment>,
}

impl TaskStatus {
    /// Find a container by name
    pub fn container(&self, name: &str) -> Option<&ContainerStatus> {
        self.containers.iter().find(|c| c.name == name)
    }

    /// Find an attachment by id
    pub fn attachment(&self, id: &str) -> Option<&TaskAttachment> {
        self.attachments.iter().find(|a| a.id == id)
    }
}

/// Container and task overrides submitted with a run request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Template to launch
    pub template_id: String,
    /// Cluster to launch into
    pub cluster: String,
    /// Container whose command and environment are overridden
    pub container_name: String,
    /// Command override
    pub command: Vec<String>,
    /// Environment override
    pub environment: Vec<(String, String)>,
    /// Network placement
    pub network: NetworkPlacement,
    /// Tag naming who started the task
    pub started_by: String,
    /// Platform version to request
    pub platform_version: String,
}

/// A failure entry reported alongside a run request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchFailure {
    /// Short failure reason
    pub reason: String,
    /// Longer failure detail
    pub detail: String,
}

/// Raw result of a run request as reported by the orchestration API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOutcome {
    /// Task identifier, if one was created
    pub task_id: Option<String>,
    /// Failures reported by the API
    pub failures: Vec<LaunchFailure>,
}

/// A resolved `(address, port)` pair the session bridge connects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Terminal dimensions in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    /// Number of columns
    pub cols: u16,
    /// Number of rows
    pub rows: u16,
}

impl TerminalSize {
    /// Create a new terminal size
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}
