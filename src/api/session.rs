//! Session endpoints.
//!
//! - POST `/signup` - Create an account and start a session
//! - POST `/login` - Check credentials and start a session
//! - GET `/refresh` - Exchange the refresh cookie for a new access token
//! - GET `/logout` - Clear the refresh cookie

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::UserResponse;
use super::error::{ApiError, JsonBody, ResultExt};
use crate::auth::{
    ApiAuth, ApiAuthError, AuthErrorKind, REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie,
    refresh_cookie,
};
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::{JwtConfig, TokenPair};
use crate::password;

/// Minimum accepted password length, in characters.
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone)]
pub struct SessionState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
}

impl_has_auth_backend!(SessionState);

pub fn router(state: SessionState) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh", get(refresh))
        .route("/logout", get(logout))
        .with_state(state)
}

#[derive(Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
    name: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct SignupResponse {
    message: &'static str,
    user: UserResponse,
    access_token: String,
}

#[derive(Serialize)]
struct LoginResponse {
    message: &'static str,
    access_token: String,
}

#[derive(Serialize)]
struct RefreshResponse {
    access_token: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// A plausible address: exactly one `@` with something on both sides.
fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

fn validate_signup(payload: &SignupRequest) -> Result<(), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    if !is_valid_email(payload.email.trim()) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if payload.password.len() > password::MAX_PASSWORD_BYTES {
        return Err(ApiError::bad_request(format!(
            "Password must be at most {} bytes",
            password::MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

fn issue(jwt: &JwtConfig, email: &str) -> Result<TokenPair, ApiError> {
    jwt.issue_tokens(email).map_err(|e| {
        error!("Failed to generate tokens: {}", e);
        ApiError::internal("Failed to generate token")
    })
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

async fn signup(
    State(state): State<SessionState>,
    JsonBody(payload): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_signup(&payload)?;
    let email = payload.email.trim().to_string();
    let name = payload.name.trim().to_string();

    let available = state
        .db
        .users()
        .is_email_available(&email)
        .await
        .db_err("Failed to check email")?;
    if !available {
        return Err(ApiError::conflict("User already exists"));
    }

    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::internal("Failed to hash password")
        })?;

    let user_id = match state.db.users().create(&email, &name, &password_hash).await {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("User already exists"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to create user", e)),
    };

    let user = state
        .db
        .users()
        .get_by_id(user_id)
        .await
        .db_err("Failed to load user")?
        .ok_or_else(|| ApiError::internal("User vanished after creation"))?;

    let tokens = issue(&state.jwt, &user.email)?;
    info!("User signed up: {}", user.email);

    Ok((
        [(
            SET_COOKIE,
            refresh_cookie(&tokens.refresh.token, state.secure_cookies),
        )],
        Json(SignupResponse {
            message: "Sign Up Successful",
            user: UserResponse::from(&user),
            access_token: tokens.access.token,
        }),
    ))
}

async fn login(
    State(state): State<SessionState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim().to_string();
    let user = state
        .db
        .users()
        .get_by_email(&email)
        .await
        .db_err("Failed to get user")?;

    let password = payload.password;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let verified = tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => password::verify_password(&password, &hash),
        None => {
            password::verify_dummy(&password);
            false
        }
    })
    .await
    .map_err(|e| ApiError::internal(format!("Hashing task failed: {}", e)))?;

    let user = match user {
        Some(user) if verified => user,
        _ => {
            warn!("Rejected login for {}", email);
            return Err(ApiError::InvalidCredentials);
        }
    };

    let tokens = issue(&state.jwt, &user.email)?;
    info!("User logged in: {}", user.email);

    Ok((
        [(
            SET_COOKIE,
            refresh_cookie(&tokens.refresh.token, state.secure_cookies),
        )],
        Json(LoginResponse {
            message: "Login Successful",
            access_token: tokens.access.token,
        }),
    ))
}

/// Mint a new access token from the refresh cookie.
/// Stateless: the refresh token is neither rotated nor looked up.
async fn refresh(
    State(state): State<SessionState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, ApiAuthError> {
    let token = get_cookie(&headers, REFRESH_COOKIE_NAME).ok_or(AuthErrorKind::NoToken)?;
    if token.is_empty() {
        return Err(AuthErrorKind::NoToken.into());
    }

    let claims = state.jwt.validate_refresh_token(token).map_err(|e| {
        warn!("Rejected refresh token: {}", e);
        AuthErrorKind::InvalidToken
    })?;

    let access = state.jwt.generate_access_token(&claims.email).map_err(|e| {
        error!("Failed to generate access token: {}", e);
        AuthErrorKind::Internal
    })?;

    Ok(Json(RefreshResponse {
        access_token: access.token,
    }))
}

async fn logout(State(state): State<SessionState>, ApiAuth(auth): ApiAuth) -> impl IntoResponse {
    info!("User logged out: {}", auth.user.email);
    (
        [(SET_COOKIE, clear_refresh_cookie(state.secure_cookies))],
        Json(MessageResponse {
            message: "Logged Out",
        }),
    )
}
