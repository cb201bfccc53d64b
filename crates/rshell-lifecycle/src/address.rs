//! Reachable address resolution

use rshell_core::error::{AddressError, RshellError};
use rshell_core::traits::AddressResolver;
use rshell_core::types::{Endpoint, TaskDescriptor, TaskStatus};

/// Attachment detail naming the attached network interface
pub const NETWORK_INTERFACE_DETAIL: &str = "networkInterfaceId";

/// Work out where the remote shell can be reached.
///
/// Private placements use the container's first interface address. Public
/// placements follow that interface's attachment to a network interface id
/// and ask the resolver for its public address.
pub async fn resolve_endpoint(
    status: &TaskStatus,
    descriptor: &TaskDescriptor,
    resolver: &dyn AddressResolver,
) -> Result<Endpoint, RshellError> {
    let container_name = &descriptor.container_name;
    let interface = status
        .container(container_name)
        .and_then(|c| c.network_interfaces.first())
        .ok_or_else(|| AddressError::NoNetworkInterface {
            container: container_name.clone(),
        })?;

    let host = if descriptor.network.assign_public_ip {
        let attachment_id = interface
            .attachment_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AddressError::NoNetworkInterface {
                container: container_name.clone(),
            })?;

        let interface_id = status
            .attachment(attachment_id)
            .ok_or_else(|| AddressError::NoAttachment {
                attachment_id: attachment_id.to_string(),
            })?
            .details
            .get(NETWORK_INTERFACE_DETAIL)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AddressError::NoInterfaceId {
                attachment_id: attachment_id.to_string(),
            })?;

        tracing::debug!("Resolving public address of {}", interface_id);
        resolver
            .resolve_public_address(interface_id)
            .await?
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| AddressError::NoPublicAddress {
                interface_id: interface_id.clone(),
            })?
    } else {
        interface
            .private_ipv4_address
            .clone()
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| AddressError::NoPrivateAddress {
                container: container_name.clone(),
            })?
    };

    Ok(Endpoint {
        host,
        port: descriptor.port,
    })
}
