//! Collaborator trait definitions

mod orchestrator;
mod resolver;
mod session;

pub use orchestrator::ComputeOrchestrator;
pub use resolver::AddressResolver;
pub use session::InteractiveSession;
