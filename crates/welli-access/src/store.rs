//! Permission storage: the durable table behind the engine

use async_trait::async_trait;

use crate::error::AccessResult;
use crate::identity::Identity;
use crate::permission::{Permission, PermissionKey};

/// A guarded write against one key
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PermissionChange {
    /// Insert or overwrite; applies only when the key has no active record
    Grant(Permission),
    /// Clear `active`; applies only when the key has an active record
    Revoke(PermissionKey),
}

impl PermissionChange {
    pub fn key(&self) -> PermissionKey {
        match self {
            PermissionChange::Grant(p) => p.key(),
            PermissionChange::Revoke(key) => key.clone(),
        }
    }
}

/// Result of a guarded commit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Nothing was written; `index` is the first change whose guard failed
    Conflict { index: usize },
}

/// Keyed permission storage with compare-and-set commits
///
/// The engine is the only writer. Each implementation must make
/// [`PermissionStore::commit`] indivisible: either every change is applied
/// or none is.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Point lookup by exact key
    async fn get(&self, key: &PermissionKey) -> AccessResult<Option<Permission>>;

    /// Apply all changes atomically if every guard holds
    ///
    /// Guards are evaluated in order, each one seeing the effect of the
    /// earlier changes in the same call.
    async fn commit(&self, changes: &[PermissionChange]) -> AccessResult<CommitOutcome>;

    /// Every record (active or not) whose owner is `owner`
    async fn list_by_owner(&self, owner: &Identity) -> AccessResult<Vec<Permission>>;

    /// Every record (active or not) granted to `requester`
    async fn list_by_requester(&self, requester: &Identity) -> AccessResult<Vec<Permission>>;
}
