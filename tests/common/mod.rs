#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use quillpost::{
    ServerConfig, create_app,
    db::Database,
    jwt::{DEFAULT_ACCESS_TOKEN_DURATION_SECS, JwtConfig, TokenSecrets},
};
use serde_json::Value;
use tower::ServiceExt;

pub const ACCESS_SECRET: &str = "test-access-secret-that-is-long-enough";
pub const REFRESH_SECRET: &str = "test-refresh-secret-that-is-long-enough";

pub const PASSWORD: &str = "correct-horse";

pub fn test_secrets() -> TokenSecrets {
    TokenSecrets {
        access: ACCESS_SECRET.as_bytes().to_vec(),
        refresh: REFRESH_SECRET.as_bytes().to_vec(),
    }
}

pub fn test_config(db: Database) -> ServerConfig {
    ServerConfig {
        db,
        secrets: test_secrets(),
        access_token_ttl: DEFAULT_ACCESS_TOKEN_DURATION_SECS,
        secure_cookies: false,
        allowed_origins: vec!["http://localhost:5173".to_string()],
    }
}

/// Create a test app and return (app, db, jwt_config).
pub async fn create_test_app() -> (Router, Database, JwtConfig) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = test_config(db.clone());
    let jwt = JwtConfig::new(&config.secrets, config.access_token_ttl);
    (create_app(&config), db, jwt)
}

/// Build a request with an optional bearer token and JSON body.
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and return status, headers and the JSON body (Null if empty or not JSON).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, headers, json)
}

/// The Set-Cookie header value, if any.
pub fn set_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

/// The refresh token carried by a Set-Cookie header.
pub fn refresh_token_from(headers: &HeaderMap) -> String {
    let cookie = set_cookie(headers).expect("Set-Cookie header missing");
    let first = cookie.split(';').next().unwrap();
    first
        .strip_prefix("jwt=")
        .expect("refresh cookie should be named jwt")
        .to_string()
}

/// Sign up through the API and return (access_token, refresh_token).
pub async fn signup(app: &Router, email: &str, name: &str) -> (String, String) {
    let (status, headers, json) = send(
        app,
        request(
            "POST",
            "/api/signup",
            None,
            Some(serde_json::json!({"email": email, "password": PASSWORD, "name": name})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "signup failed: {}", json);
    let access = json["access_token"].as_str().unwrap().to_string();
    (access, refresh_token_from(&headers))
}

/// Create a post through the API and return its id.
pub async fn create_post(app: &Router, token: &str, title: &str, content: &str) -> String {
    let (status, _, json) = send(
        app,
        request(
            "POST",
            "/api/posts",
            Some(token),
            Some(serde_json::json!({"title": title, "content": content})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", json);
    json["post"]["id"].as_str().unwrap().to_string()
}

fn expired_token(email: &str, typ: &str, secret: &str) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = serde_json::json!({
        "email": email,
        "typ": typ,
        "iat": now - 700,
        "exp": now - 60,
    });
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// An access token for `email` that expired a minute ago, signed with the real key.
pub fn expired_access_token(email: &str) -> String {
    expired_token(email, "access", ACCESS_SECRET)
}

/// A refresh token for `email` that expired a minute ago, signed with the real key.
pub fn expired_refresh_token(email: &str) -> String {
    expired_token(email, "refresh", REFRESH_SECRET)
}
