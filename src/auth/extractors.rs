//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::bearer::bearer_token;
use super::errors::{ApiAuthError, AuthErrorKind};
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;
use crate::jwt::JwtError;

/// Verify the bearer access token and resolve the user it names.
/// Never touches the refresh cookie.
async fn authenticate_request<S>(
    parts: &Parts,
    state: &S,
) -> Result<AuthenticatedUser, AuthErrorKind>
where
    S: HasAuthBackend + Send + Sync,
{
    let token = bearer_token(&parts.headers)?;

    let claims = state
        .jwt()
        .validate_access_token(token)
        .map_err(|e| match e {
            JwtError::Expired => AuthErrorKind::ExpiredToken,
            _ => AuthErrorKind::InvalidToken,
        })?;

    let user = state
        .db()
        .users()
        .get_by_email(&claims.email)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get user: {}", e);
            AuthErrorKind::Internal
        })?
        .ok_or_else(|| {
            tracing::warn!("Access token for unknown user {}", claims.email);
            AuthErrorKind::InvalidToken
        })?;

    Ok(AuthenticatedUser { claims, user })
}

/// Extractor for API endpoints that require authentication.
/// Rejects with 406 when the token is missing or expired (refresh and retry)
/// and 403 when it is not genuine.
pub struct ApiAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for ApiAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate_request(parts, state)
            .await
            .map(ApiAuth)
            .map_err(ApiAuthError::from)
    }
}
