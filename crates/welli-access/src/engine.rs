//! Access control engine: validates, consults the registries, commits
//!
//! Every mutating operation runs in two phases. Validation reads the
//! registries and the store without holding any engine lock, checking each
//! item in input order so the first failure reported is the one a
//! sequential pass would hit. The commit phase hands the whole change set
//! to [`PermissionStore::commit`], whose guards re-check the active flag
//! atomically; a guard failure there means a concurrent call won the key.
//!
//! Commits and event publication share one gate, so the event sink sees
//! changes in commit order.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::clock::{Clock, SystemClock};
use crate::error::{AccessError, AccessResult};
use crate::events::{AccessEvent, EventSink, NoopEventSink};
use crate::identity::Identity;
use crate::memory::InMemoryPermissionStore;
use crate::permission::{Cid, Permission, PermissionKey, PermissionState};
use crate::registry::{IdentityStatusProvider, ResourceOwnershipProvider};
use crate::store::{CommitOutcome, PermissionChange, PermissionStore};

/// Grants, revokes and answers queries over owner → requester permissions
pub struct AccessControlEngine {
    administrator: Identity,
    identity_status: RwLock<Arc<dyn IdentityStatusProvider>>,
    resource_owners: RwLock<Arc<dyn ResourceOwnershipProvider>>,
    store: Arc<dyn PermissionStore>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    commit_gate: Mutex<()>,
}

/// Builder for [`AccessControlEngine`]
pub struct EngineBuilder {
    administrator: Identity,
    identity_status: Arc<dyn IdentityStatusProvider>,
    resource_owners: Arc<dyn ResourceOwnershipProvider>,
    store: Option<Arc<dyn PermissionStore>>,
    events: Option<Arc<dyn EventSink>>,
    clock: Option<Arc<dyn Clock>>,
}

impl EngineBuilder {
    /// Permission store (defaults to [`InMemoryPermissionStore`])
    pub fn store(mut self, store: Arc<dyn PermissionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Audit sink (defaults to discarding events)
    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Time source (defaults to the system clock)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> AccessControlEngine {
        AccessControlEngine {
            administrator: self.administrator,
            identity_status: RwLock::new(self.identity_status),
            resource_owners: RwLock::new(self.resource_owners),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryPermissionStore::new())),
            events: self.events.unwrap_or_else(|| Arc::new(NoopEventSink)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            commit_gate: Mutex::new(()),
        }
    }
}

impl AccessControlEngine {
    /// Start building an engine
    ///
    /// `administrator` is the only identity allowed to replace the registries
    /// later. [`Identity::ZERO`] disables replacement entirely.
    pub fn builder(
        administrator: Identity,
        identity_status: Arc<dyn IdentityStatusProvider>,
        resource_owners: Arc<dyn ResourceOwnershipProvider>,
    ) -> EngineBuilder {
        EngineBuilder {
            administrator,
            identity_status,
            resource_owners,
            store: None,
            events: None,
            clock: None,
        }
    }

    pub fn administrator(&self) -> Identity {
        self.administrator
    }

    /// Grant `requester` access to `cid` until `expiry` (Unix seconds)
    pub async fn grant_access(
        &self,
        owner: &Identity,
        requester: &Identity,
        cid: &str,
        scope: &str,
        expiry: u64,
    ) -> AccessResult<()> {
        self.grant(owner, requester, &[cid], scope, expiry)
            .await
            .inspect_err(|err| log_rejection("grant_access", owner, requester, err))
    }

    /// Grant access to every cid, or to none of them
    pub async fn grant_batch_access(
        &self,
        owner: &Identity,
        requester: &Identity,
        cids: &[Cid],
        scope: &str,
        expiry: u64,
    ) -> AccessResult<()> {
        let result = if cids.is_empty() {
            Err(AccessError::EmptyCidList)
        } else {
            let cids: Vec<&str> = cids.iter().map(String::as_str).collect();
            self.grant(owner, requester, &cids, scope, expiry).await
        };
        result.inspect_err(|err| log_rejection("grant_batch_access", owner, requester, err))
    }

    /// Revoke the permission `owner` gave `requester` over `cid`
    pub async fn revoke_access(
        &self,
        owner: &Identity,
        requester: &Identity,
        cid: &str,
    ) -> AccessResult<()> {
        self.revoke(owner, requester, &[cid])
            .await
            .inspect_err(|err| log_rejection("revoke_access", owner, requester, err))
    }

    /// Revoke every listed permission, or none of them
    pub async fn revoke_batch_access(
        &self,
        owner: &Identity,
        requester: &Identity,
        cids: &[Cid],
    ) -> AccessResult<()> {
        let result = if cids.is_empty() {
            Err(AccessError::EmptyCidList)
        } else {
            let cids: Vec<&str> = cids.iter().map(String::as_str).collect();
            self.revoke(owner, requester, &cids).await
        };
        result.inspect_err(|err| log_rejection("revoke_batch_access", owner, requester, err))
    }

    /// Whether `requester` currently holds effective access
    ///
    /// Pure read. Only infrastructure failures are returned as errors; a
    /// missing, revoked or expired record is simply `false`.
    pub async fn has_access(
        &self,
        owner: &Identity,
        requester: &Identity,
        cid: &str,
    ) -> AccessResult<bool> {
        let key = PermissionKey::new(*owner, *requester, cid);
        let now = self.clock.now();
        Ok(self
            .store
            .get(&key)
            .await?
            .is_some_and(|p| p.is_effective(now)))
    }

    /// The stored record, or [`Permission::empty`] when there is none
    pub async fn get_permission(
        &self,
        owner: &Identity,
        requester: &Identity,
        cid: &str,
    ) -> AccessResult<Permission> {
        let key = PermissionKey::new(*owner, *requester, cid);
        Ok(self.store.get(&key).await?.unwrap_or_else(Permission::empty))
    }

    /// Logical state of a key right now
    pub async fn permission_state(
        &self,
        owner: &Identity,
        requester: &Identity,
        cid: &str,
    ) -> AccessResult<PermissionState> {
        let permission = self.get_permission(owner, requester, cid).await?;
        Ok(permission.state(self.clock.now()))
    }

    /// Every record `owner` has granted, revoked ones included
    pub async fn permissions_granted_by(&self, owner: &Identity) -> AccessResult<Vec<Permission>> {
        self.store.list_by_owner(owner).await
    }

    /// Every record granted to `requester`, revoked ones included
    pub async fn permissions_granted_to(
        &self,
        requester: &Identity,
    ) -> AccessResult<Vec<Permission>> {
        self.store.list_by_requester(requester).await
    }

    /// Replace the identity registry; takes effect for subsequent calls
    pub async fn set_identity_registry(
        &self,
        caller: &Identity,
        provider: Arc<dyn IdentityStatusProvider>,
    ) -> AccessResult<()> {
        self.ensure_administrator(caller)?;
        *self.identity_status.write().await = provider;
        tracing::info!(%caller, "identity registry replaced");
        Ok(())
    }

    /// Replace the resource registry; takes effect for subsequent calls
    pub async fn set_resource_registry(
        &self,
        caller: &Identity,
        provider: Arc<dyn ResourceOwnershipProvider>,
    ) -> AccessResult<()> {
        self.ensure_administrator(caller)?;
        *self.resource_owners.write().await = provider;
        tracing::info!(%caller, "resource registry replaced");
        Ok(())
    }

    fn ensure_administrator(&self, caller: &Identity) -> AccessResult<()> {
        if self.administrator.is_zero() || *caller != self.administrator {
            return Err(AccessError::NotAdministrator);
        }
        Ok(())
    }

    async fn grant(
        &self,
        owner: &Identity,
        requester: &Identity,
        cids: &[&str],
        scope: &str,
        expiry: u64,
    ) -> AccessResult<()> {
        let identity_status = self.identity_status.read().await.clone();
        let resource_owners = self.resource_owners.read().await.clone();
        let now = self.clock.now();

        let mut owner_valid = None;
        let mut seen = HashSet::new();
        let mut changes = Vec::with_capacity(cids.len());

        for &cid in cids {
            if requester.is_zero() {
                return Err(AccessError::InvalidRequester);
            }
            if cid.is_empty() {
                return Err(AccessError::MissingCid);
            }
            if scope.is_empty() {
                return Err(AccessError::MissingScope);
            }
            if expiry <= now {
                return Err(AccessError::ExpiryNotInFuture);
            }

            if owner_valid.is_none() {
                owner_valid = Some(identity_status.is_valid(owner).await?);
            }
            if owner_valid != Some(true) {
                return Err(AccessError::OwnerNotRegisteredOrRevoked);
            }

            if resource_owners.owner_of(cid).await? != Some(*owner) {
                return Err(AccessError::CallerNotResourceOwner);
            }

            let key = PermissionKey::new(*owner, *requester, cid);
            let already_active = !seen.insert(cid)
                || self.store.get(&key).await?.is_some_and(|p| p.active);
            if already_active {
                return Err(AccessError::PermissionAlreadyActive);
            }

            changes.push(PermissionChange::Grant(Permission::granted(
                *owner, *requester, cid, scope, expiry,
            )));
        }

        let _gate = self.commit_gate.lock().await;
        match self.store.commit(&changes).await? {
            CommitOutcome::Committed => {
                for change in changes {
                    if let PermissionChange::Grant(p) = change {
                        tracing::info!(owner = %p.owner, requester = %p.requester, cid = %p.cid, expiry = p.expiry, "access granted");
                        self.events.publish(AccessEvent::Granted {
                            owner: p.owner,
                            requester: p.requester,
                            cid: p.cid,
                            scope: p.scope,
                            expiry: p.expiry,
                        });
                    }
                }
                Ok(())
            }
            CommitOutcome::Conflict { index } => {
                tracing::warn!(%owner, %requester, cid = cids[index], "grant lost a concurrent race");
                Err(AccessError::PermissionAlreadyActive)
            }
        }
    }

    async fn revoke(&self, owner: &Identity, requester: &Identity, cids: &[&str]) -> AccessResult<()> {
        let mut seen = HashSet::new();
        let mut changes = Vec::with_capacity(cids.len());

        for &cid in cids {
            let key = PermissionKey::new(*owner, *requester, cid);

            // A missing record reads as the zero-owner sentinel
            let record = self
                .store
                .get(&key)
                .await?
                .unwrap_or_else(Permission::empty);
            if record.owner != *owner {
                return Err(AccessError::OnlyOwnerCanRevoke);
            }
            if !seen.insert(cid) || !record.active {
                return Err(AccessError::PermissionNotActive);
            }

            changes.push(PermissionChange::Revoke(key));
        }

        let _gate = self.commit_gate.lock().await;
        match self.store.commit(&changes).await? {
            CommitOutcome::Committed => {
                for change in changes {
                    if let PermissionChange::Revoke(key) = change {
                        tracing::info!(owner = %key.owner, requester = %key.requester, cid = %key.cid, "access revoked");
                        self.events.publish(AccessEvent::Revoked {
                            owner: key.owner,
                            requester: key.requester,
                            cid: key.cid,
                        });
                    }
                }
                Ok(())
            }
            CommitOutcome::Conflict { index } => {
                tracing::warn!(%owner, %requester, cid = cids[index], "revoke lost a concurrent race");
                Err(AccessError::PermissionNotActive)
            }
        }
    }
}

fn log_rejection(operation: &str, owner: &Identity, requester: &Identity, err: &AccessError) {
    if err.is_infrastructure() {
        tracing::error!(operation, %owner, %requester, error = %err, "access operation failed");
    } else {
        tracing::debug!(operation, %owner, %requester, code = err.code(), "access operation rejected");
    }
}
