//! API client for communicating with the social network REST API.
//!
//! This module provides the `ApiClient` struct for login, token validation,
//! and the authenticated feed and profile calls.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::{Clock, CredentialStore, ExpiryPolicy};
use crate::models::{
    LoginRequest, LoginResponse, NewPost, Post, ProfileUpdate, RegisterRequest, User,
};

use super::{ApiError, InvalidationReason, SessionEvent};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Shown when the server rejects a login without a usable message
const LOGIN_REJECTED_MESSAGE: &str = "Incorrect email or password";

/// Whether a request carries the stored bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Login and registration; no token is attached or checked
    Public,
    Bearer,
}

/// Local view of the stored credential, without touching the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Missing,
    Expired,
    Fresh { remaining: ChronoDuration },
}

/// Gateway to the REST API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling,
/// and clones share the credential store and event channel.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: CredentialStore,
    policy: ExpiryPolicy,
    events: Option<mpsc::Sender<SessionEvent>>,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://localhost:8000/api`)
    pub fn new(base_url: &str, credentials: CredentialStore) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, credentials, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        credentials: CredentialStore,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            policy: ExpiryPolicy::default(),
            events: None,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Deliver session invalidations to `events`
    pub fn with_events(mut self, events: mpsc::Sender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the first rate-limit backoff delay (doubles on each retry)
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    fn clock(&self) -> &Arc<dyn Clock> {
        self.credentials.clock()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn credential_status(&self) -> Result<CredentialStatus, ApiError> {
        let now = self.clock().now();
        Ok(match self.credentials.load()? {
            None => CredentialStatus::Missing,
            Some(cred) if self.policy.is_expired(&cred, now) => CredentialStatus::Expired,
            Some(cred) => CredentialStatus::Fresh {
                remaining: self.policy.time_until_expiry(&cred, now),
            },
        })
    }

    // ===== Interception =====

    /// Clear the stored credential and tell whoever listens
    fn invalidate(&self, reason: InvalidationReason) {
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "Failed to clear stored credential");
        }
        if let Some(ref events) = self.events {
            if let Err(e) = events.try_send(SessionEvent::Invalidated(reason)) {
                warn!(error = %e, ?reason, "Dropped session event");
            }
        }
    }

    /// Outbound interception: attach the bearer token, or stop an expired one
    /// before it reaches the server.
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        match self.credentials.load()? {
            Some(cred) if self.policy.is_expired(&cred, self.clock().now()) => {
                warn!("Stored token expired, aborting request");
                self.invalidate(InvalidationReason::Expired);
                Err(ApiError::ExpiredSession)
            }
            Some(cred) => Ok(request.bearer_auth(cred.token)),
            None => Ok(request),
        }
    }

    /// Inbound interception. Returns Ok(Some(response)) for success,
    /// Ok(None) for rate limit (should retry), or Err for other errors.
    async fn check_response_for_retry(
        &self,
        response: Response,
    ) -> Result<Option<Response>, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(Some(response));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED {
            warn!(url = %response.url(), "Server rejected credentials");
            self.invalidate(InvalidationReason::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    async fn send<F>(&self, access: Access, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let request = match access {
                Access::Bearer => self.authorize(build())?,
                Access::Public => build(),
            };
            let response = request.send().await?;

            match self.check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(
                        retry = retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| {
                ApiError::InvalidResponse(format!(
                    "Failed to parse JSON response from {}: {}",
                    url, e
                ))
            })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.send(Access::Bearer, || self.client.get(&url)).await?;
        Self::parse(response, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        access: Access,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self.send(access, || self.client.post(&url).json(body)).await?;
        Self::parse(response, &url).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "PUT");
        let response = self.send(Access::Bearer, || self.client.put(&url).json(body)).await?;
        Self::parse(response, &url).await
    }

    // ===== Session Methods =====

    /// Exchange email and password for a token, and persist it
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { email, password };
        let auth: LoginResponse = match self.post(Access::Public, "/auth/login", &body).await {
            Ok(auth) => auth,
            Err(ApiError::Unauthorized) => {
                return Err(ApiError::Authentication(LOGIN_REJECTED_MESSAGE.to_string()))
            }
            Err(
                ApiError::AccessDenied(msg)
                | ApiError::NotFound(msg)
                | ApiError::Validation(msg)
                | ApiError::ServerError(msg),
            ) => {
                let msg = if msg.trim().is_empty() {
                    LOGIN_REJECTED_MESSAGE.to_string()
                } else {
                    msg
                };
                return Err(ApiError::Authentication(msg));
            }
            Err(e) => return Err(e),
        };

        self.credentials.save(&auth.token)?;
        info!(user_id = %auth.user.id, "Login successful");
        Ok(auth)
    }

    /// Prove the stored token still works by fetching the current user.
    /// Fails without a network call if there is no fresh token to prove.
    pub async fn validate_token(&self) -> Result<User, ApiError> {
        let Some(cred) = self.credentials.load()? else {
            return Err(ApiError::NoValidCredential);
        };
        if self.policy.is_expired(&cred, self.clock().now()) {
            debug!("Stored token expired before validation");
            return Err(ApiError::NoValidCredential);
        }

        match self.get("/users/profile").await {
            Ok(user) => Ok(user),
            Err(ApiError::Unauthorized) => {
                Err(ApiError::InvalidCredential("Token rejected by server".to_string()))
            }
            Err(ApiError::AccessDenied(msg)) => Err(ApiError::InvalidCredential(msg)),
            Err(e) => Err(e),
        }
    }

    /// Forget the stored token. No network call.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.credentials.clear()?;
        info!("Logged out");
        Ok(())
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let body = RegisterRequest { username, email, password };
        let user: User = self.post(Access::Public, "/auth/register", &body).await?;
        info!(user_id = %user.id, "Registered account");
        Ok(user)
    }

    // ===== Feed & Profile =====

    pub async fn fetch_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.get("/posts").await
    }

    pub async fn create_post(&self, content: &str) -> Result<Post, ApiError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ApiError::Validation("Post content cannot be empty".to_string()));
        }
        self.post(Access::Bearer, "/posts", &NewPost { content }).await
    }

    pub async fn fetch_profile(&self) -> Result<User, ApiError> {
        self.get("/users/profile").await
    }

    pub async fn update_profile(&self, bio: &str) -> Result<User, ApiError> {
        self.put("/users/profile", &ProfileUpdate { bio }).await
    }
}
