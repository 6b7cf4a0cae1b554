use crate::error::ServerResult;
use crate::middleware::Caller;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Deserializer, Serialize};
use welli_access::{AccessError, Cid, Identity, Permission};

#[derive(Deserialize)]
pub struct GrantRequest {
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default, deserialize_with = "expiry_from_json")]
    pub expiry: u64, // Unix seconds, number or decimal string
}

#[derive(Deserialize)]
pub struct GrantBatchRequest {
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub cids: Vec<Cid>,
    #[serde(default)]
    pub scope: String,
    #[serde(default, deserialize_with = "expiry_from_json")]
    pub expiry: u64,
}

#[derive(Deserialize)]
pub struct RevokeRequest {
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub cid: String,
}

#[derive(Deserialize)]
pub struct RevokeBatchRequest {
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub cids: Vec<Cid>,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cids: Option<Vec<Cid>>,
}

#[derive(Serialize)]
pub struct HasAccessResponse {
    pub success: bool,
    #[serde(rename = "hasAccess")]
    pub has_access: bool,
}

#[derive(Serialize)]
pub struct PermissionResponse {
    pub success: bool,
    pub patient: Identity,
    pub requester: Identity,
    pub cid: Cid,
    pub scope: String,
    pub expiry: String,
    pub active: bool,
}

impl From<Permission> for PermissionResponse {
    fn from(p: Permission) -> Self {
        Self {
            success: true,
            patient: p.owner,
            requester: p.requester,
            cid: p.cid,
            scope: p.scope,
            expiry: p.expiry.to_string(),
            active: p.active,
        }
    }
}

fn expiry_from_json<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Requester of a grant: absent or malformed text becomes the null identity,
/// which the engine rejects as `InvalidRequester` before any other check
fn grant_requester(raw: &str) -> Identity {
    raw.trim().parse().unwrap_or(Identity::ZERO)
}

/// Requester of a revoke: absent is the null identity, malformed is rejected
fn parse_requester(raw: &str) -> Result<Identity, AccessError> {
    if raw.trim().is_empty() {
        return Ok(Identity::ZERO);
    }
    raw.trim().parse()
}

/// POST /grantAccess
pub async fn grant_access(
    State(state): State<AppState>,
    Caller(owner): Caller,
    Json(body): Json<GrantRequest>,
) -> ServerResult<Json<SuccessResponse>> {
    let requester = grant_requester(&body.requester);

    state
        .engine
        .grant_access(&owner, &requester, &body.cid, &body.scope, body.expiry)
        .await?;

    Ok(Json(SuccessResponse {
        success: true,
        cids: None,
    }))
}

/// POST /grantBatchAccess
pub async fn grant_batch_access(
    State(state): State<AppState>,
    Caller(owner): Caller,
    Json(body): Json<GrantBatchRequest>,
) -> ServerResult<Json<SuccessResponse>> {
    let requester = grant_requester(&body.requester);

    state
        .engine
        .grant_batch_access(&owner, &requester, &body.cids, &body.scope, body.expiry)
        .await?;

    Ok(Json(SuccessResponse {
        success: true,
        cids: Some(body.cids),
    }))
}

/// POST /revokeAccess
pub async fn revoke_access(
    State(state): State<AppState>,
    Caller(owner): Caller,
    Json(body): Json<RevokeRequest>,
) -> ServerResult<Json<SuccessResponse>> {
    let requester = parse_requester(&body.requester)?;

    state
        .engine
        .revoke_access(&owner, &requester, &body.cid)
        .await?;

    Ok(Json(SuccessResponse {
        success: true,
        cids: None,
    }))
}

/// POST /revokeBatchAccess
pub async fn revoke_batch_access(
    State(state): State<AppState>,
    Caller(owner): Caller,
    Json(body): Json<RevokeBatchRequest>,
) -> ServerResult<Json<SuccessResponse>> {
    let requester = parse_requester(&body.requester)?;

    state
        .engine
        .revoke_batch_access(&owner, &requester, &body.cids)
        .await?;

    Ok(Json(SuccessResponse {
        success: true,
        cids: Some(body.cids),
    }))
}

/// GET /hasAccess/{patient}/{requester}/{cid}
pub async fn has_access(
    State(state): State<AppState>,
    Path((patient, requester, cid)): Path<(String, String, String)>,
) -> ServerResult<Json<HasAccessResponse>> {
    let patient: Identity = patient.parse()?;
    let requester: Identity = requester.parse()?;

    let has_access = state.engine.has_access(&patient, &requester, &cid).await?;

    Ok(Json(HasAccessResponse {
        success: true,
        has_access,
    }))
}

/// GET /getPermission/{patient}/{requester}/{cid}
pub async fn get_permission(
    State(state): State<AppState>,
    Path((patient, requester, cid)): Path<(String, String, String)>,
) -> ServerResult<Json<PermissionResponse>> {
    let patient: Identity = patient.parse()?;
    let requester: Identity = requester.parse()?;

    let permission = state
        .engine
        .get_permission(&patient, &requester, &cid)
        .await?;

    Ok(Json(permission.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_accepts_number_or_string() {
        let body: GrantRequest =
            serde_json::from_str(r#"{"requester":"","cid":"c","scope":"s","expiry":"1700000000"}"#)
                .unwrap();
        assert_eq!(body.expiry, 1_700_000_000);

        let body: GrantRequest =
            serde_json::from_str(r#"{"cid":"c","scope":"s","expiry":42}"#).unwrap();
        assert_eq!(body.expiry, 42);
        assert!(body.requester.is_empty());
    }

    #[test]
    fn test_malformed_grant_requester_is_zero() {
        assert_eq!(grant_requester(""), Identity::ZERO);
        assert_eq!(grant_requester("0xnotanaddress"), Identity::ZERO);

        let id = Identity::from_bytes([3; 20]);
        assert_eq!(grant_requester(&format!(" {id} ")), id);
    }

    #[test]
    fn test_missing_revoke_requester_is_zero() {
        assert_eq!(parse_requester("").unwrap(), Identity::ZERO);
        assert!(matches!(
            parse_requester("bogus"),
            Err(AccessError::InvalidIdentity(_))
        ));
    }
}
