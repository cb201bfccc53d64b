//! Session parameter assembly

use std::path::PathBuf;
use std::time::Duration;

use rshell_core::config::{ClientConfig, SessionConfig};
use rshell_core::identity::{generate_identity, load_identity, load_local_identities, IdentityError};
use rshell_core::Identity;

/// Command-line overrides of the session defaults
#[derive(Debug, Clone, Default)]
pub struct SessionOverrides {
    /// Idle limit enforced remotely
    pub idle_time: Option<Duration>,
    /// Maximum session length enforced remotely
    pub max_time: Option<Duration>,
    /// Single key file to offer after the generated key
    pub identity: Option<PathBuf>,
    /// Offer only the generated key
    pub no_local_keys: bool,
}

/// Generate the per-run identity and gather fallback keys.
///
/// The generated identity always comes first. Returns the identities and
/// the authorized-key line of the generated one.
pub fn collect_identities(
    config: &ClientConfig,
    overrides: &SessionOverrides,
) -> Result<(Vec<Identity>, String), IdentityError> {
    let (generated, authorized_key) = generate_identity()?;
    let mut identities = vec![generated];

    if let Some(path) = &overrides.identity {
        identities.push(load_identity(path)?);
    } else if config.session.load_local_keys && !overrides.no_local_keys {
        if let Some(dir) = config.session.key_dir() {
            identities.extend(load_local_identities(&dir));
        }
    }

    tracing::debug!("{} identities available", identities.len());
    Ok((identities, authorized_key))
}

/// Combine file configuration, flags and identities into session parameters
pub fn build_session_config(
    config: &ClientConfig,
    overrides: &SessionOverrides,
    identities: Vec<Identity>,
    authorized_key: String,
) -> SessionConfig {
    SessionConfig {
        user: config.remote.ssh_user.clone(),
        idle_time: overrides.idle_time.unwrap_or(config.session.idle_time),
        max_time: overrides.max_time.unwrap_or(config.session.max_time),
        term: SessionConfig::term_from_env(),
        identities,
        authorized_key,
        connect_timeout: config.session.connect_timeout,
        keepalive_interval: config.session.keepalive_interval,
    }
}
