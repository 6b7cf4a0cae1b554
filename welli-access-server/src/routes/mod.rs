use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

mod access;
mod audit;
mod health;

pub fn router(state: AppState) -> Router {
    // Mutations act on behalf of the X-Caller identity
    let mutations = Router::new()
        .route("/grantAccess", post(access::grant_access))
        .route("/grantBatchAccess", post(access::grant_batch_access))
        .route("/revokeAccess", post(access::revoke_access))
        .route("/revokeBatchAccess", post(access::revoke_batch_access));

    let queries = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/hasAccess/{patient}/{requester}/{cid}",
            get(access::has_access),
        )
        .route(
            "/getPermission/{patient}/{requester}/{cid}",
            get(access::get_permission),
        )
        .route("/permissions/{owner}", get(audit::list_granted))
        .route("/shared/{requester}", get(audit::list_received))
        .route("/events", get(audit::list_events));

    Router::new()
        .merge(mutations)
        .merge(queries)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
