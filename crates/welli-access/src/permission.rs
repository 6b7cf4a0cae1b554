//! Permissions: scoped, time-bounded access from an owner to a requester

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Content identifier of a protected resource
pub type Cid = String;

/// The triple that names at most one permission record
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionKey {
    pub owner: Identity,
    pub requester: Identity,
    pub cid: Cid,
}

impl PermissionKey {
    pub fn new(owner: Identity, requester: Identity, cid: impl Into<Cid>) -> Self {
        Self {
            owner,
            requester,
            cid: cid.into(),
        }
    }
}

/// A permission record as held by the store
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Who owns the resource
    pub owner: Identity,
    /// Who has been granted access
    pub requester: Identity,
    /// Resource being shared
    pub cid: Cid,
    /// Opaque operation class, e.g. `read:fhir:lab`
    pub scope: String,
    /// Unix seconds after which the permission no longer applies
    pub expiry: u64,
    /// Cleared only by an explicit revoke; expiry leaves it set
    pub active: bool,
}

/// Logical state of a key at a point in time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PermissionState {
    None,
    Active,
    Expired,
    Revoked,
}

impl Permission {
    /// A freshly granted, active permission
    pub fn granted(
        owner: Identity,
        requester: Identity,
        cid: impl Into<Cid>,
        scope: impl Into<String>,
        expiry: u64,
    ) -> Self {
        Self {
            owner,
            requester,
            cid: cid.into(),
            scope: scope.into(),
            expiry,
            active: true,
        }
    }

    /// The "not found" shape returned for keys that were never granted
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    pub fn key(&self) -> PermissionKey {
        PermissionKey::new(self.owner, self.requester, self.cid.clone())
    }

    /// Whether access is effective at `now`
    pub fn is_effective(&self, now: u64) -> bool {
        self.active && now < self.expiry
    }

    pub fn state(&self, now: u64) -> PermissionState {
        if self.is_empty() {
            PermissionState::None
        } else if !self.active {
            PermissionState::Revoked
        } else if now >= self.expiry {
            PermissionState::Expired
        } else {
            PermissionState::Active
        }
    }
}
