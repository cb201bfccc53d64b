//! Session configuration

use std::fmt;
use std::time::Duration;

use crate::identity::Identity;

/// Parameters of the interactive session, fixed for its whole lifetime.
///
/// Built once by the binary and handed to both the lifecycle (which bakes
/// the limits and the authorized key into the launch request) and the
/// session bridge (which authenticates with the identities).
#[derive(Clone)]
pub struct SessionConfig {
    /// User name presented to the remote shell
    pub user: String,
    /// Idle limit enforced remotely (zero disables it)
    pub idle_time: Duration,
    /// Maximum session length enforced remotely
    pub max_time: Duration,
    /// Terminal type requested for the remote PTY
    pub term: String,
    /// Candidate identities, tried in order
    pub identities: Vec<Identity>,
    /// Public key line the remote shell must accept
    pub authorized_key: String,
    /// Transport connect timeout
    pub connect_timeout: Duration,
    /// Keepalive interval for the transport
    pub keepalive_interval: Option<Duration>,
}

impl SessionConfig {
    /// Terminal type from `$TERM`, falling back to `xterm`
    pub fn term_from_env() -> String {
        std::env::var("TERM")
            .ok()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "xterm".to_string())
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("user", &self.user)
            .field("idle_time", &self.idle_time)
            .field("max_time", &self.max_time)
            .field("term", &self.term)
            .field("identities", &self.identities)
            .field("connect_timeout", &self.connect_timeout)
            .field("keepalive_interval", &self.keepalive_interval)
            .finish_non_exhaustive()
    }
}
