//! Network identity resolution API

use async_trait::async_trait;

use crate::error::ApiError;

/// Resolves a network interface to its public address
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Public address of the given interface; `None` if it has none
    async fn resolve_public_address(&self, interface_id: &str) -> Result<Option<String>, ApiError>;
}
