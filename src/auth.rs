//! Bearer-token authentication for API handlers.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::Json,
};
use service::Claims;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{service_error, ApiError};
use crate::schemas::{AppState, ErrorResponse};

/// Identity of the caller, taken from a valid access token.
///
/// Only the token is checked here. Whether the account still exists, is
/// active, or holds the admin role is decided by the service operation the
/// handler calls, against the stored user rather than the token's claims.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i32,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
enum BearerError {
    #[error("Missing Authorization header")]
    Missing,
    #[error("Authorization header must use Bearer token format")]
    NotBearer,
    #[error("Empty bearer token")]
    Empty,
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(BearerError::Missing)?
        .to_str()
        .map_err(|_| BearerError::NotBearer)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(BearerError::NotBearer)?
        .trim();
    if token.is_empty() {
        return Err(BearerError::Empty);
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).map_err(|e| {
            warn!(error = %e, path = %parts.uri.path(), "Rejected request without usable bearer token");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("UNAUTHORIZED", e.to_string())),
            )
        })?;

        let claims = state.tokens.validate_access_token(token).map_err(|e| {
            warn!(error = %e, path = %parts.uri.path(), "Rejected bearer token");
            service_error(e)
        })?;

        debug!(
            user_id = claims.user_id,
            username = %claims.username,
            role = %claims.role,
            "Authenticated request"
        );
        Ok(AuthUser::from(claims))
    }
}
