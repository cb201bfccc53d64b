//! rshell-aws: AWS implementations of the rshell collaborators
//!
//! [`EcsOrchestrator`] runs tasks on ECS Fargate and [`Ec2AddressResolver`]
//! looks up public addresses of their network interfaces.

mod convert;
pub mod ec2;
pub mod ecs;

pub use ec2::Ec2AddressResolver;
pub use ecs::EcsOrchestrator;

use aws_config::{BehaviorVersion, SdkConfig};

/// Load shared SDK configuration, optionally from a named profile
pub async fn load_sdk_config(profile: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = profile {
        tracing::debug!("Using credentials profile '{}'", profile);
        loader = loader.profile_name(profile);
    }
    loader.load().await
}
