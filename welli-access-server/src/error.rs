use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use welli_access::AccessError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Access(err) => match err {
                AccessError::InvalidRequester
                | AccessError::MissingCid
                | AccessError::MissingScope
                | AccessError::EmptyCidList
                | AccessError::ExpiryNotInFuture
                | AccessError::InvalidIdentity(_) => StatusCode::BAD_REQUEST,
                AccessError::OwnerNotRegisteredOrRevoked
                | AccessError::CallerNotResourceOwner
                | AccessError::OnlyOwnerCanRevoke
                | AccessError::NotAdministrator => StatusCode::FORBIDDEN,
                AccessError::PermissionAlreadyActive
                | AccessError::PermissionNotActive
                | AccessError::IdentityAlreadyRegistered(_)
                | AccessError::IdentityAlreadyRevoked(_) => StatusCode::CONFLICT,
                AccessError::IdentityNotRegistered(_) => StatusCode::NOT_FOUND,
                AccessError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ServerError::Unauthorized(_) => "Unauthorized",
            ServerError::BadRequest(_) => "BadRequest",
            ServerError::Internal(_) => "InternalError",
            ServerError::Access(err) => err.code(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({ "error": message, "code": self.code() })),
        )
            .into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
