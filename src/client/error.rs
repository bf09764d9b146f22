use crate::api::ErrorKind;

/// Errors returned by [`AuthClient`](super::AuthClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The refresh cookie is missing or no longer accepted; log in again.
    #[error("Login required")]
    LoginRequired,

    /// The server still rejected the request after one refresh and retry.
    #[error("Session expired")]
    SessionExpired,

    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        /// None when the response body was not a tagged error
        kind: Option<ErrorKind>,
        message: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Tagged kind of an API error, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Api { kind, .. } => *kind,
            _ => None,
        }
    }

    /// HTTP status of an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
