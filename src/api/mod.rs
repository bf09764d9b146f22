mod error;
mod posts;
mod session;

use axum::Router;
use serde::Serialize;
use std::sync::Arc;

use crate::db::{Database, User};
use crate::jwt::JwtConfig;

pub use error::{ApiError, ErrorBody, ErrorKind, JsonBody, ResultExt, validate_uuid};

/// Public view of a user. The password hash has no field here.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

/// Create the API router.
pub fn create_api_router(db: Database, jwt: Arc<JwtConfig>, secure_cookies: bool) -> Router {
    let session_state = session::SessionState {
        db: db.clone(),
        jwt: jwt.clone(),
        secure_cookies,
    };

    let posts_state = posts::PostsState { db, jwt };

    Router::new()
        .merge(session::router(session_state))
        .nest("/posts", posts::router(posts_state))
}
