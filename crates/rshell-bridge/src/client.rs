//! SSH transport setup

use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Config, Handle};
use russh_keys::key::PublicKey;

use rshell_core::config::SessionConfig;
use rshell_core::error::SessionError;
use rshell_core::types::Endpoint;

/// Transport event handler.
///
/// The remote task is created for this session only and has no stable host
/// key, so every host key is accepted and its fingerprint logged.
#[derive(Debug, Default)]
pub struct ClientHandler;

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        tracing::debug!("Server host key: {}", server_public_key.fingerprint());
        Ok(true)
    }
}

/// Open a transport connection to the endpoint
pub async fn connect(
    endpoint: &Endpoint,
    config: &SessionConfig,
) -> Result<Handle<ClientHandler>, SessionError> {
    let ssh_config = Arc::new(Config {
        keepalive_interval: config.keepalive_interval,
        ..Default::default()
    });

    let address = endpoint.to_string();
    tracing::debug!("Connecting to {}", address);

    tokio::time::timeout(
        config.connect_timeout,
        client::connect(ssh_config, (endpoint.host.as_str(), endpoint.port), ClientHandler),
    )
    .await
    .map_err(|_| SessionError::Timeout {
        address: address.clone(),
    })?
    .map_err(|e| SessionError::Connect {
        address,
        message: e.to_string(),
    })
}

/// Try each identity in order until one is accepted
pub async fn authenticate(
    handle: &mut Handle<ClientHandler>,
    config: &SessionConfig,
) -> Result<(), SessionError> {
    if config.identities.is_empty() {
        return Err(SessionError::NoIdentities);
    }

    for identity in &config.identities {
        tracing::debug!(
            "Authenticating as '{}' with {} key",
            config.user,
            identity.source()
        );
        let accepted = handle
            .authenticate_publickey(config.user.clone(), identity.key())
            .await
            .map_err(|e| SessionError::Protocol(format!("Authentication error: {}", e)))?;
        if accepted {
            tracing::debug!("Authenticated with {} key", identity.source());
            return Ok(());
        }
    }

    Err(SessionError::AuthenticationFailed {
        tried: config.identities.len(),
    })
}
