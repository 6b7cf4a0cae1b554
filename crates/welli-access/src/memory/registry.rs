//! In-memory identity and resource registries

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{AccessError, AccessResult};
use crate::identity::Identity;
use crate::permission::Cid;
use crate::registry::{IdentityStatusProvider, ResourceOwnershipProvider};

/// Identity registry: registered identities and whether they were revoked
#[derive(Default)]
pub struct InMemoryIdentityRegistry {
    /// identity -> revoked
    entries: RwLock<HashMap<Identity, bool>>,
}

impl InMemoryIdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity, or re-register one that was revoked
    pub fn register(&self, identity: Identity) -> AccessResult<()> {
        let mut entries = self.lock_write()?;
        if entries.get(&identity) == Some(&false) {
            return Err(AccessError::IdentityAlreadyRegistered(identity.to_hex()));
        }
        entries.insert(identity, false);
        Ok(())
    }

    /// Mark the identity's registration as revoked
    pub fn revoke(&self, identity: &Identity) -> AccessResult<()> {
        let mut entries = self.lock_write()?;
        match entries.get_mut(identity) {
            Some(revoked) if *revoked => Err(AccessError::IdentityAlreadyRevoked(identity.to_hex())),
            Some(revoked) => {
                *revoked = true;
                Ok(())
            }
            None => Err(AccessError::IdentityNotRegistered(identity.to_hex())),
        }
    }

    fn lock_write(&self) -> AccessResult<std::sync::RwLockWriteGuard<'_, HashMap<Identity, bool>>> {
        self.entries
            .write()
            .map_err(|_| AccessError::storage("identity registry lock poisoned"))
    }
}

#[async_trait]
impl IdentityStatusProvider for InMemoryIdentityRegistry {
    async fn is_valid(&self, identity: &Identity) -> AccessResult<bool> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AccessError::provider("identity registry lock poisoned"))?;
        Ok(entries.get(identity) == Some(&false))
    }
}

/// Resource registry: the owner of record for each cid
#[derive(Default)]
pub struct InMemoryResourceRegistry {
    /// cid -> owner
    owners: RwLock<HashMap<Cid, Identity>>,
}

impl InMemoryResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `owner` as the owner of `cid`, replacing any previous owner
    pub fn register(&self, cid: impl Into<Cid>, owner: Identity) -> AccessResult<()> {
        self.owners
            .write()
            .map_err(|_| AccessError::storage("resource registry lock poisoned"))?
            .insert(cid.into(), owner);
        Ok(())
    }

    /// Forget a cid entirely
    pub fn unregister(&self, cid: &str) -> AccessResult<()> {
        self.owners
            .write()
            .map_err(|_| AccessError::storage("resource registry lock poisoned"))?
            .remove(cid);
        Ok(())
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.owners.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResourceOwnershipProvider for InMemoryResourceRegistry {
    async fn owner_of(&self, cid: &str) -> AccessResult<Option<Identity>> {
        let owners = self
            .owners
            .read()
            .map_err(|_| AccessError::provider("resource registry lock poisoned"))?;
        Ok(owners.get(cid).copied())
    }
}
