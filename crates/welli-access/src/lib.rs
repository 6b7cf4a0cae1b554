//! welli-access: scoped, time-bounded data-sharing permissions
//!
//! A data owner grants a requester access to content-addressed resources
//! (CIDs) for a scope and until an expiry. Grants are checked against an
//! identity registry (is the owner registered and not revoked?) and a
//! resource registry (does the owner own the CID?) before they are
//! committed. Revocation is explicit; expiry is evaluated lazily on read.
//!
//! ## Features
//!
//! | Feature  | Description                    |
//! |----------|--------------------------------|
//! | (none)   | In-memory backends only        |
//! | `sqlite` | SQLite permission store        |
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use welli_access::{
//!     AccessControlEngine, InMemoryEventLog, InMemoryIdentityRegistry,
//!     InMemoryResourceRegistry, Identity,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let identities = Arc::new(InMemoryIdentityRegistry::new());
//!     let resources = Arc::new(InMemoryResourceRegistry::new());
//!     identities.register(patient)?;
//!     resources.register("ipfs://doc1", patient)?;
//!
//!     let engine = AccessControlEngine::builder(admin, identities, resources)
//!         .events(Arc::new(InMemoryEventLog::new()))
//!         .build();
//!
//!     engine
//!         .grant_access(&patient, &requester, "ipfs://doc1", "read:fhir:lab", expiry)
//!         .await?;
//!     assert!(engine.has_access(&patient, &requester, "ipfs://doc1").await?);
//!
//!     Ok(())
//! }
//! ```

mod clock;
mod engine;
mod error;
mod events;
mod identity;
mod permission;
mod registry;
mod store;

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{AccessControlEngine, EngineBuilder};
pub use error::{AccessError, AccessResult, InfrastructureError};
pub use events::{AccessEvent, EventSink, NoopEventSink, TracingEventSink};
pub use identity::{IDENTITY_LEN, Identity};
pub use permission::{Cid, Permission, PermissionKey, PermissionState};
pub use registry::{IdentityStatusProvider, ResourceOwnershipProvider};
pub use store::{CommitOutcome, PermissionChange, PermissionStore};

pub use memory::{
    InMemoryEventLog, InMemoryIdentityRegistry, InMemoryPermissionStore, InMemoryResourceRegistry,
};

#[cfg(feature = "sqlite")]
pub use sqlite::SqlitePermissionStore;
