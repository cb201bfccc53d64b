//! rshell-core: Core abstractions and configuration for rshell
//!
//! This crate provides the shared domain types, error taxonomy,
//! configuration structures, identities and collaborator traits used by
//! the lifecycle, the session bridge and the CLI.

pub mod config;
pub mod descriptor;
pub mod duration;
pub mod error;
pub mod identity;
pub mod traits;
pub mod types;

pub use descriptor::DescriptorExtractor;
pub use error::RshellError;
pub use identity::Identity;
pub use types::{Endpoint, TaskDescriptor, TaskHandle, TaskStatus, TaskTemplate, TerminalSize};
