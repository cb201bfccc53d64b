//! Interactive session hand-off

use async_trait::async_trait;

use crate::error::SessionError;
use crate::types::Endpoint;

/// The interactive phase of the lifecycle.
///
/// Implementors own the local terminal for the duration of `run` and must
/// restore it before returning.
#[async_trait]
pub trait InteractiveSession: Send + Sync {
    /// Connect to `endpoint` and run until the remote shell exits.
    ///
    /// Returns `Ok` only on a clean (zero) remote exit.
    async fn run(&self, endpoint: &Endpoint) -> Result<(), SessionError>;
}
