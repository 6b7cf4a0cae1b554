use crate::error::ServerResult;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use welli_access::{AccessEvent, Identity, Permission};

#[derive(Serialize)]
pub struct PermissionListResponse {
    pub success: bool,
    pub permissions: Vec<Permission>,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub success: bool,
    pub events: Vec<AccessEvent>,
}

/// GET /permissions/{owner}
pub async fn list_granted(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> ServerResult<Json<PermissionListResponse>> {
    let owner: Identity = owner.parse()?;
    let permissions = state.engine.permissions_granted_by(&owner).await?;

    Ok(Json(PermissionListResponse {
        success: true,
        permissions,
    }))
}

/// GET /shared/{requester}
pub async fn list_received(
    State(state): State<AppState>,
    Path(requester): Path<String>,
) -> ServerResult<Json<PermissionListResponse>> {
    let requester: Identity = requester.parse()?;
    let permissions = state.engine.permissions_granted_to(&requester).await?;

    Ok(Json(PermissionListResponse {
        success: true,
        permissions,
    }))
}

/// GET /events
pub async fn list_events(State(state): State<AppState>) -> Json<EventsResponse> {
    Json(EventsResponse {
        success: true,
        events: state.audit.events(),
    })
}
