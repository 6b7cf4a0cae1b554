//! In-memory permission store

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::{AccessError, AccessResult};
use crate::identity::Identity;
use crate::permission::{Permission, PermissionKey};
use crate::store::{CommitOutcome, PermissionChange, PermissionStore};

type Rows = HashMap<PermissionKey, Permission>;

/// In-memory permission store
///
/// A commit holds the write lock for the whole batch, so guards and writes
/// are indivisible. Lookups hold the read lock for a single row.
#[derive(Default)]
pub struct InMemoryPermissionStore {
    /// (owner, requester, cid) -> Permission
    rows: RwLock<Rows>,
}

impl InMemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, revoked ones included
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> AccessResult<RwLockReadGuard<'_, Rows>> {
        self.rows
            .read()
            .map_err(|_| AccessError::storage("permission table lock poisoned"))
    }

    fn write(&self) -> AccessResult<RwLockWriteGuard<'_, Rows>> {
        self.rows
            .write()
            .map_err(|_| AccessError::storage("permission table lock poisoned"))
    }

    fn sorted(mut rows: Vec<Permission>) -> Vec<Permission> {
        rows.sort_by(|a, b| a.key().cmp(&b.key()));
        rows
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn get(&self, key: &PermissionKey) -> AccessResult<Option<Permission>> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn commit(&self, changes: &[PermissionChange]) -> AccessResult<CommitOutcome> {
        let mut rows = self.write()?;
        let mut staged: Rows = HashMap::new();

        for (index, change) in changes.iter().enumerate() {
            let key = change.key();
            let current = staged.get(&key).or_else(|| rows.get(&key));

            let next = match (change, current) {
                (PermissionChange::Grant(p), current)
                    if !current.is_some_and(|c| c.active) =>
                {
                    p.clone()
                }
                (PermissionChange::Revoke(_), Some(current)) if current.active => Permission {
                    active: false,
                    ..current.clone()
                },
                _ => return Ok(CommitOutcome::Conflict { index }),
            };

            staged.insert(key, next);
        }

        rows.extend(staged);
        Ok(CommitOutcome::Committed)
    }

    async fn list_by_owner(&self, owner: &Identity) -> AccessResult<Vec<Permission>> {
        let rows = self.read()?;
        Ok(Self::sorted(
            rows.values().filter(|p| p.owner == *owner).cloned().collect(),
        ))
    }

    async fn list_by_requester(&self, requester: &Identity) -> AccessResult<Vec<Permission>> {
        let rows = self.read()?;
        Ok(Self::sorted(
            rows.values()
                .filter(|p| p.requester == *requester)
                .cloned()
                .collect(),
        ))
    }
}
