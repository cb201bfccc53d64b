//! Public address lookup through EC2

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::error::DisplayErrorContext;

use rshell_core::error::ApiError;
use rshell_core::traits::AddressResolver;

/// [`AddressResolver`] backed by `DescribeNetworkInterfaces`
#[derive(Debug, Clone)]
pub struct Ec2AddressResolver {
    client: aws_sdk_ec2::Client,
}

impl Ec2AddressResolver {
    /// Create a resolver from shared SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ec2::Client::new(config),
        }
    }
}

#[async_trait]
impl AddressResolver for Ec2AddressResolver {
    async fn resolve_public_address(&self, interface_id: &str) -> Result<Option<String>, ApiError> {
        let output = self
            .client
            .describe_network_interfaces()
            .network_interface_ids(interface_id)
            .send()
            .await
            .map_err(|e| ApiError::request("DescribeNetworkInterfaces", DisplayErrorContext(&e)))?;

        Ok(output
            .network_interfaces()
            .iter()
            .find_map(|ni| ni.association().and_then(|a| a.public_ip()))
            .map(str::to_string))
    }
}
