//! Access control error types

use thiserror::Error;

pub type AccessResult<T> = Result<T, AccessError>;

/// Every way an access-control operation can be rejected.
///
/// Policy variants are caller-input or precondition failures and are never
/// retried by the engine. [`AccessError::Infrastructure`] is the only
/// category that says nothing about the request itself.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("invalid requester")]
    InvalidRequester,

    #[error("cid required")]
    MissingCid,

    #[error("scope required")]
    MissingScope,

    #[error("no cids provided")]
    EmptyCidList,

    #[error("expiry must be in future")]
    ExpiryNotInFuture,

    #[error("user not registered or revoked")]
    OwnerNotRegisteredOrRevoked,

    #[error("caller not owner of record")]
    CallerNotResourceOwner,

    #[error("permission already active")]
    PermissionAlreadyActive,

    #[error("permission not active")]
    PermissionNotActive,

    #[error("only patient can revoke")]
    OnlyOwnerCanRevoke,

    #[error("caller is not the administrator")]
    NotAdministrator,

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("identity {0} already registered and active")]
    IdentityAlreadyRegistered(String),

    #[error("identity {0} already revoked")]
    IdentityAlreadyRevoked(String),

    #[error("identity {0} has no registration")]
    IdentityNotRegistered(String),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

/// Failures of the store or of an external provider.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl AccessError {
    /// Stable machine-readable name, suitable for branching in clients.
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::InvalidRequester => "InvalidRequester",
            AccessError::MissingCid => "MissingCid",
            AccessError::MissingScope => "MissingScope",
            AccessError::EmptyCidList => "EmptyCidList",
            AccessError::ExpiryNotInFuture => "ExpiryNotInFuture",
            AccessError::OwnerNotRegisteredOrRevoked => "OwnerNotRegisteredOrRevoked",
            AccessError::CallerNotResourceOwner => "CallerNotResourceOwner",
            AccessError::PermissionAlreadyActive => "PermissionAlreadyActive",
            AccessError::PermissionNotActive => "PermissionNotActive",
            AccessError::OnlyOwnerCanRevoke => "OnlyOwnerCanRevoke",
            AccessError::NotAdministrator => "NotAdministrator",
            AccessError::InvalidIdentity(_) => "InvalidIdentity",
            AccessError::IdentityAlreadyRegistered(_) => "IdentityAlreadyRegistered",
            AccessError::IdentityAlreadyRevoked(_) => "IdentityAlreadyRevoked",
            AccessError::IdentityNotRegistered(_) => "IdentityNotRegistered",
            AccessError::Infrastructure(_) => "InfrastructureError",
        }
    }

    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AccessError::Infrastructure(_))
    }

    pub(crate) fn storage(msg: impl Into<String>) -> Self {
        AccessError::Infrastructure(InfrastructureError::Storage(msg.into()))
    }

    pub(crate) fn provider(msg: impl Into<String>) -> Self {
        AccessError::Infrastructure(InfrastructureError::Provider(msg.into()))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for AccessError {
    fn from(err: rusqlite::Error) -> Self {
        AccessError::Infrastructure(InfrastructureError::Database(err))
    }
}
