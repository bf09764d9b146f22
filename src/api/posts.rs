//! Posts API.
//!
//! All endpoints require a bearer access token. A post is only ever visible to
//! and changeable by the user who wrote it.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::UserResponse;
use super::error::{ApiError, JsonBody, ResultExt, validate_uuid};
use crate::auth::ApiAuth;
use crate::db::{Database, Post};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for posts endpoints.
#[derive(Clone)]
pub struct PostsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(PostsState);

pub fn router(state: PostsState) -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{uuid}", put(update_post).delete(delete_post))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct PostRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct PostResponse {
    id: String,
    title: String,
    content: String,
    created_at: String,
    updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            id: p.uuid,
            title: p.title,
            content: p.content,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Serialize)]
struct ListPostsResponse {
    message: &'static str,
    user: UserResponse,
    posts: Vec<PostResponse>,
}

#[derive(Serialize)]
struct PostMessageResponse {
    message: &'static str,
    post: PostResponse,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

// --- Helpers ---

/// Trimmed title and content, both required.
fn validate_post(payload: &PostRequest) -> Result<(&str, &str), ApiError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(ApiError::bad_request("Content is required"));
    }
    Ok((title, content))
}

/// Load a post and check the caller owns it.
async fn owned_post(db: &Database, uuid: &str, user_id: i64) -> Result<Post, ApiError> {
    validate_uuid(uuid)?;

    let post = db
        .posts()
        .get_by_uuid(uuid)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if post.user_id != user_id {
        warn!("User {} tried to modify post {} of another user", user_id, uuid);
        return Err(ApiError::forbidden("Not your post"));
    }
    Ok(post)
}

// --- Handlers ---

async fn list_posts(
    State(state): State<PostsState>,
    ApiAuth(auth): ApiAuth,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state
        .db
        .posts()
        .list_by_user(auth.user.id)
        .await
        .db_err("Failed to list posts")?;

    Ok(Json(ListPostsResponse {
        message: "Posts fetched",
        user: UserResponse::from(&auth.user),
        posts: posts.into_iter().map(PostResponse::from).collect(),
    }))
}

async fn create_post(
    State(state): State<PostsState>,
    ApiAuth(auth): ApiAuth,
    JsonBody(payload): JsonBody<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (title, content) = validate_post(&payload)?;

    let uuid = state
        .db
        .posts()
        .create(auth.user.id, title, content)
        .await
        .db_err("Failed to create post")?;

    let post = state
        .db
        .posts()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::internal("Post vanished after creation"))?;

    info!("Post {} created by {}", uuid, auth.user.email);
    Ok(Json(PostMessageResponse {
        message: "Post Created",
        post: post.into(),
    }))
}

async fn update_post(
    State(state): State<PostsState>,
    ApiAuth(auth): ApiAuth,
    Path(uuid): Path<String>,
    JsonBody(payload): JsonBody<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    owned_post(&state.db, &uuid, auth.user.id).await?;
    let (title, content) = validate_post(&payload)?;

    let updated = state
        .db
        .posts()
        .update(&uuid, auth.user.id, title, content)
        .await
        .db_err("Failed to update post")?;
    if !updated {
        return Err(ApiError::not_found("Post not found"));
    }

    let post = state
        .db
        .posts()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(PostMessageResponse {
        message: "Post Updated",
        post: post.into(),
    }))
}

async fn delete_post(
    State(state): State<PostsState>,
    ApiAuth(auth): ApiAuth,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    owned_post(&state.db, &uuid, auth.user.id).await?;

    let deleted = state
        .db
        .posts()
        .delete(&uuid, auth.user.id)
        .await
        .db_err("Failed to delete post")?;
    if !deleted {
        return Err(ApiError::not_found("Post not found"));
    }

    info!("Post {} deleted by {}", uuid, auth.user.email);
    Ok(Json(MessageResponse {
        message: "Post Deleted",
    }))
}
