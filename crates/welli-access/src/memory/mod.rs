//! In-memory implementations for testing and single-process deployments

mod events;
mod permissions;
mod registry;

pub use events::InMemoryEventLog;
pub use permissions::InMemoryPermissionStore;
pub use registry::{InMemoryIdentityRegistry, InMemoryResourceRegistry};
