//! External registries consulted on the grant path

use async_trait::async_trait;

use crate::error::AccessResult;
use crate::identity::Identity;

/// Answers whether an owner identity is currently registered and not revoked
#[async_trait]
pub trait IdentityStatusProvider: Send + Sync {
    async fn is_valid(&self, identity: &Identity) -> AccessResult<bool>;
}

/// Answers who currently owns a content-addressed resource
///
/// Only grants consult this. Revocation authorizes from the stored
/// permission, so a transfer after granting never blocks a revoke.
#[async_trait]
pub trait ResourceOwnershipProvider: Send + Sync {
    async fn owner_of(&self, cid: &str) -> AccessResult<Option<Identity>>;
}
