//! JWT token generation and validation.
//!
//! Access and refresh tokens are signed with two distinct secrets, so holding
//! one secret never lets a caller mint the other kind of token.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token, sent as a bearer credential
    Access,
    /// Long-lived refresh token, only ever sent as an HTTP-only cookie
    Refresh,
}

/// JWT claims shared by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User email (the identity claim)
    pub email: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Default access token duration: 10 minutes
pub const DEFAULT_ACCESS_TOKEN_DURATION_SECS: u64 = 10 * 60;

/// Refresh token duration: 7 days
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// The two signing secrets, loaded once at startup.
#[derive(Clone)]
pub struct TokenSecrets {
    pub access: Vec<u8>,
    pub refresh: Vec<u8>,
}

impl std::fmt::Debug for TokenSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenSecrets { .. }")
    }
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_duration: u64,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct TokenResult {
    /// The JWT token string
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

/// Access and refresh token minted together at signup or login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: TokenResult,
    pub refresh: TokenResult,
}

impl JwtConfig {
    /// Create a JWT configuration from the two secrets and the access token lifetime.
    pub fn new(secrets: &TokenSecrets, access_duration: u64) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(&secrets.access),
            access_decoding: DecodingKey::from_secret(&secrets.access),
            refresh_encoding: EncodingKey::from_secret(&secrets.refresh),
            refresh_decoding: DecodingKey::from_secret(&secrets.refresh),
            access_duration,
        }
    }

    /// Mint both tokens for a user. Stateless: nothing is stored.
    pub fn issue_tokens(&self, email: &str) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access: self.generate_access_token(email)?,
            refresh: self.generate_refresh_token(email)?,
        })
    }

    /// Generate an access token signed with the access secret.
    pub fn generate_access_token(&self, email: &str) -> Result<TokenResult, JwtError> {
        sign(
            email,
            TokenType::Access,
            self.access_duration,
            &self.access_encoding,
        )
    }

    /// Generate a refresh token signed with the refresh secret.
    pub fn generate_refresh_token(&self, email: &str) -> Result<TokenResult, JwtError> {
        sign(
            email,
            TokenType::Refresh,
            REFRESH_TOKEN_DURATION_SECS,
            &self.refresh_encoding,
        )
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        validate(token, &self.access_decoding, TokenType::Access)
    }

    /// Validate and decode a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        validate(token, &self.refresh_decoding, TokenType::Refresh)
    }
}

fn now_secs() -> Result<u64, JwtError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| JwtError::TimeError)?
        .as_secs())
}

fn sign(
    email: &str,
    token_type: TokenType,
    duration: u64,
    key: &EncodingKey,
) -> Result<TokenResult, JwtError> {
    let now = now_secs()?;

    let claims = Claims {
        email: email.to_string(),
        token_type,
        iat: now,
        exp: now + duration,
    };

    let token =
        jsonwebtoken::encode(&Header::default(), &claims, key).map_err(JwtError::Encoding)?;

    Ok(TokenResult { token, duration })
}

fn validate(token: &str, key: &DecodingKey, expected: TokenType) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    // The signature is checked before the expiry, so a tampered token that is
    // also past its expiry reports as invalid, not expired.
    let token_data =
        jsonwebtoken::decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e),
        })?;

    if token_data.claims.token_type != expected {
        return Err(JwtError::WrongTokenType);
    }

    Ok(token_data.claims)
}

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
    #[error("System time error")]
    TimeError,
    /// e.g. a refresh token presented where an access token is expected
    #[error("Wrong token type")]
    WrongTokenType,
}
