//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::{ErrorBody, ErrorKind};

/// Internal auth error kind used by the core authentication logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// No credential was presented at all
    NoToken,
    /// Credential was genuine but is past its expiry
    ExpiredToken,
    /// Bad signature, malformed, wrong kind, or the user no longer exists
    InvalidToken,
    Internal,
}

/// Authentication errors, rendered as tagged JSON.
///
/// Missing and expired credentials share status 406, which tells a client to
/// refresh; everything else about the credential is a 403.
#[derive(Debug)]
pub struct ApiAuthError {
    kind: AuthErrorKind,
}

impl ApiAuthError {
    pub(super) fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    fn status_code(&self) -> StatusCode {
        match self.kind {
            AuthErrorKind::NoToken | AuthErrorKind::ExpiredToken => StatusCode::NOT_ACCEPTABLE,
            AuthErrorKind::InvalidToken => StatusCode::FORBIDDEN,
            AuthErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::NoToken => "Unauthorized",
            AuthErrorKind::ExpiredToken => "Session Expired",
            AuthErrorKind::InvalidToken => "Invalid token",
            AuthErrorKind::Internal => "Internal server error",
        }
    }

    fn wire_kind(&self) -> ErrorKind {
        match self.kind {
            AuthErrorKind::NoToken => ErrorKind::NoToken,
            AuthErrorKind::ExpiredToken => ErrorKind::ExpiredToken,
            AuthErrorKind::InvalidToken => ErrorKind::InvalidToken,
            AuthErrorKind::Internal => ErrorKind::Internal,
        }
    }
}

impl From<AuthErrorKind> for ApiAuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self::new(kind)
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorBody {
                error: self.message().to_string(),
                kind: self.wire_kind(),
            }),
        )
            .into_response()
    }
}
