use crate::error::{ServerError, ServerResult};
use axum::extract::FromRequestParts;
use axum::http::{header::HeaderMap, request::Parts};
use welli_access::Identity;

/// Header carrying the identity of the owner acting on the request
///
/// The gateway in front of this service authenticates the caller and sets
/// the header; this service only parses it.
pub const CALLER_HEADER: &str = "X-Caller";

/// Identity of the caller, extracted from [`CALLER_HEADER`]
#[derive(Clone, Copy, Debug)]
pub struct Caller(pub Identity);

/// Extract and parse the caller header
pub fn extract_caller(headers: &HeaderMap) -> ServerResult<Identity> {
    let raw = headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServerError::Unauthorized(format!("Missing {CALLER_HEADER} header")))?;

    let caller = Identity::parse(raw.trim())
        .ok_or_else(|| ServerError::BadRequest(format!("Invalid identity in {CALLER_HEADER}")))?;

    if caller.is_zero() {
        return Err(ServerError::Unauthorized("Caller cannot be the zero identity".into()));
    }

    Ok(caller)
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_caller(&parts.headers).map(Caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_caller() {
        let id = Identity::from_bytes([7; 20]);
        let mut headers = HeaderMap::new();

        assert!(matches!(
            extract_caller(&headers),
            Err(ServerError::Unauthorized(_))
        ));

        headers.insert(CALLER_HEADER, HeaderValue::from_static("0x1234"));
        assert!(matches!(
            extract_caller(&headers),
            Err(ServerError::BadRequest(_))
        ));

        headers.insert(CALLER_HEADER, HeaderValue::from_str(&id.to_hex()).unwrap());
        assert_eq!(extract_caller(&headers).unwrap(), id);

        headers.insert(
            CALLER_HEADER,
            HeaderValue::from_str(&Identity::ZERO.to_hex()).unwrap(),
        );
        assert!(matches!(
            extract_caller(&headers),
            Err(ServerError::Unauthorized(_))
        ));
    }
}
