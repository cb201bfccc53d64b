//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::{duration_secs, option_duration_secs};

/// Label key that carries the remote shell descriptor on a container
pub const DEFAULT_LABEL_KEY: &str = "cloud87.rshell";

/// Environment variable the remote shell reads its authorized key from
pub const DEFAULT_AUTHORIZED_KEY_ENV: &str = "C87_RSHELL_AUTHORIZED_KEY";

/// Configuration for one rshell invocation, as read from `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Named cloud credentials profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_profile: Option<String>,

    /// Remote task conventions
    pub remote: RemoteConfig,

    /// Poll policy while the task starts
    pub wait: WaitConfig,

    /// Session defaults
    pub session: SessionDefaults,
}

/// Conventions shared with the remote shell image
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Container label holding the descriptor JSON
    pub label_key: String,

    /// Remote shell executable, unless the label overrides it
    pub command_path: String,

    /// Environment variable carrying the authorized public key
    pub authorized_key_env: String,

    /// User name presented to the remote shell
    pub ssh_user: String,

    /// `startedBy` tag recorded on launched tasks
    pub started_by: String,

    /// Ports tried in order before falling back to the first TCP port
    pub preferred_ports: Vec<u16>,

    /// Suffix appended to application names unless an exact match is asked for
    pub console_suffix: String,

    /// Platform version requested for the task
    pub platform_version: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            label_key: DEFAULT_LABEL_KEY.to_string(),
            command_path: "/cloud87/remote-shell".to_string(),
            authorized_key_env: DEFAULT_AUTHORIZED_KEY_ENV.to_string(),
            ssh_user: "cloud87".to_string(),
            started_by: "cloud87/remoteshell-client".to_string(),
            preferred_ports: vec![8722, 22],
            console_suffix: "-console".to_string(),
            platform_version: "LATEST".to_string(),
        }
    }
}

impl RemoteConfig {
    /// Resolve the template name for an application
    pub fn template_name(&self, application: &str, exact: bool) -> String {
        if exact {
            application.to_string()
        } else {
            format!("{}{}", application, self.console_suffix)
        }
    }
}

/// Poll policy for waiting until a launched task runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Total time to wait for RUNNING
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// First poll delay
    #[serde(with = "duration_secs")]
    pub initial_delay: Duration,

    /// Ceiling for a single poll delay
    #[serde(with = "duration_secs")]
    pub max_delay: Duration,

    /// Multiplier for each poll
    pub multiplier: f64,

    /// Jitter factor (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            initial_delay: Duration::from_secs(6),
            max_delay: Duration::from_secs(15),
            multiplier: 1.5,
            jitter: 0.0,
        }
    }
}

/// Defaults for the interactive session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    /// Connection timeout
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Idle limit enforced by the remote shell (zero disables it)
    #[serde(with = "duration_secs")]
    pub idle_time: Duration,

    /// Maximum session length enforced by the remote shell
    #[serde(with = "duration_secs")]
    pub max_time: Duration,

    /// Directory scanned for fallback private keys (defaults to `~/.ssh`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_dir: Option<PathBuf>,

    /// Whether local private keys are offered after the generated one
    pub load_local_keys: bool,

    /// Keepalive interval for the SSH transport
    #[serde(
        default,
        with = "option_duration_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub keepalive_interval: Option<Duration>,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            idle_time: Duration::ZERO,
            max_time: Duration::from_secs(12 * 60 * 60),
            key_dir: None,
            load_local_keys: true,
            keepalive_interval: None,
        }
    }
}

impl SessionDefaults {
    /// Directory scanned for fallback keys
    pub fn key_dir(&self) -> Option<PathBuf> {
        self.key_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".ssh")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_name_suffix() {
        let remote = RemoteConfig::default();
        assert_eq!(remote.template_name("svc", false), "svc-console");
        assert_eq!(remote.template_name("svc", true), "svc");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            aws_profile = "prod"

            [remote]
            ssh_user = "ops"

            [wait]
            max_delay = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.aws_profile.as_deref(), Some("prod"));
        assert_eq!(config.remote.ssh_user, "ops");
        assert_eq!(config.remote.label_key, DEFAULT_LABEL_KEY);
        assert_eq!(config.wait.max_delay, Duration::from_secs(10));
        assert_eq!(config.wait.timeout, Duration::from_secs(600));
        assert!(config.session.load_local_keys);
    }
}
