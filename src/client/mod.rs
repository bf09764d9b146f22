//! HTTP client for the quillpost API.
//!
//! [`AuthClient`] keeps the access token in memory and lets its cookie jar hold
//! the HTTP-only refresh cookie. Protected calls that come back with a
//! "refresh and retry" signal trigger one call to `/api/refresh` and exactly one
//! retry; a second signal ends the session instead of looping.

mod error;

pub use error::ClientError;

use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::api::ErrorBody;

/// A user as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub email: String,
    pub name: String,
    pub created_at: String,
}

/// A post as returned by the API. `id` is the public UUID.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Result of listing posts: the caller and their posts, newest first.
#[derive(Debug, Clone, Deserialize)]
pub struct PostList {
    pub user: UserInfo,
    pub posts: Vec<Post>,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PostPayload<'a> {
    title: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct SignupResponse {
    user: UserInfo,
    access_token: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct PostResponse {
    post: Post,
}

/// A non-success response, read once.
struct Failure {
    status: StatusCode,
    body: Option<ErrorBody>,
    text: String,
}

impl Failure {
    async fn read(response: Response) -> Self {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&text).ok();
        Self { status, body, text }
    }

    /// Whether the server is asking for a refresh and retry.
    /// Untagged bodies fall back to the bare 406 status.
    fn needs_refresh(&self) -> bool {
        match &self.body {
            Some(body) => body.kind.needs_refresh(),
            None => self.status == StatusCode::NOT_ACCEPTABLE,
        }
    }
}

impl From<Failure> for ClientError {
    fn from(failure: Failure) -> Self {
        match failure.body {
            Some(body) => ClientError::Api {
                status: failure.status.as_u16(),
                kind: Some(body.kind),
                message: body.error,
            },
            None => ClientError::Api {
                status: failure.status.as_u16(),
                kind: None,
                message: failure.text,
            },
        }
    }
}

/// API client with automatic access token refresh.
pub struct AuthClient {
    http: reqwest::Client,
    base: Url,
    token: RwLock<Option<String>>,
}

impl AuthClient {
    /// Create a client for the server at `base_url`, e.g. `http://localhost:7291`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            http,
            base,
            token: RwLock::new(None),
        })
    }

    /// The access token currently held, if any.
    pub fn access_token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the held access token.
    pub fn set_access_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(Failure::read(response).await.into())
        }
    }

    /// Create an account. The client is logged in afterwards.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<UserInfo, ClientError> {
        let response = self
            .http
            .post(self.url("api/signup")?)
            .json(&SignupRequest {
                email,
                password,
                name,
            })
            .send()
            .await?;

        let body: SignupResponse = Self::decode(response).await?;
        self.set_access_token(Some(body.access_token));
        Ok(body.user)
    }

    /// Log in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("api/login")?)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let body: TokenResponse = Self::decode(response).await?;
        self.set_access_token(Some(body.access_token));
        Ok(())
    }

    /// Exchange the refresh cookie for a new access token and store it.
    pub async fn refresh(&self) -> Result<String, ClientError> {
        let response = self.http.get(self.url("api/refresh")?).send().await?;

        let body: TokenResponse = Self::decode(response).await?;
        self.set_access_token(Some(body.access_token.clone()));
        Ok(body.access_token)
    }

    /// End the session. The held token is dropped even if the server call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.send_authed(Method::GET, "api/logout", None).await;
        self.set_access_token(None);
        result.map(|_| ())
    }

    pub async fn list_posts(&self) -> Result<PostList, ClientError> {
        let response = self.send_authed(Method::GET, "api/posts", None).await?;
        Ok(response.json().await?)
    }

    pub async fn create_post(&self, title: &str, content: &str) -> Result<Post, ClientError> {
        let payload = PostPayload { title, content };
        let response = self
            .send_authed(Method::POST, "api/posts", Some(&payload))
            .await?;
        let body: PostResponse = response.json().await?;
        Ok(body.post)
    }

    pub async fn update_post(
        &self,
        id: &str,
        title: &str,
        content: &str,
    ) -> Result<Post, ClientError> {
        let payload = PostPayload { title, content };
        let response = self
            .send_authed(Method::PUT, &format!("api/posts/{}", id), Some(&payload))
            .await?;
        let body: PostResponse = response.json().await?;
        Ok(body.post)
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), ClientError> {
        self.send_authed(Method::DELETE, &format!("api/posts/{}", id), None)
            .await?;
        Ok(())
    }

    /// Send a protected request, refreshing and retrying at most once.
    async fn send_authed(
        &self,
        method: Method,
        path: &str,
        payload: Option<&PostPayload<'_>>,
    ) -> Result<Response, ClientError> {
        let url = self.url(path)?;
        let mut retried = false;

        loop {
            let mut request = self.http.request(method.clone(), url.clone());
            if let Some(token) = self.access_token() {
                request = request.bearer_auth(token);
            }
            if let Some(payload) = payload {
                request = request.json(payload);
            }

            let response = request.send().await?;
            if response.status().is_success() {
                return Ok(response);
            }

            let failure = Failure::read(response).await;
            if !failure.needs_refresh() {
                return Err(failure.into());
            }

            if retried {
                warn!(path = %path, "Still rejected after refresh");
                self.set_access_token(None);
                return Err(ClientError::SessionExpired);
            }
            retried = true;

            debug!(path = %path, status = %failure.status, "Refreshing access token");
            match self.refresh().await {
                Ok(_) => {}
                Err(ClientError::Http(e)) => return Err(ClientError::Http(e)),
                Err(e) => {
                    debug!(error = %e, "Refresh rejected");
                    self.set_access_token(None);
                    return Err(ClientError::LoginRequired);
                }
            }
        }
    }
}
