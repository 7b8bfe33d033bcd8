//! Session controller: the only writer of the in-memory session.
//!
//! Views observe the session through `subscribe()` or `snapshot()`; every
//! transition goes through this type. Mutations are applied synchronously
//! through the watch channel, so no lock is ever held across an `.await`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError, SessionEvent};
use crate::models::{LoginResponse, User};

use super::{AuthStatus, Session};

/// Clone is cheap; clones drive the same session.
#[derive(Clone)]
pub struct AuthController {
    api: ApiClient,
    state: Arc<watch::Sender<Session>>,
    active: Arc<AtomicBool>,
}

impl AuthController {
    /// Create a controller whose session starts idle, with the token
    /// hydrated from the credential store but not yet trusted.
    pub fn new(api: ApiClient) -> Self {
        let token = match api.credentials().load() {
            Ok(cred) => cred.map(|c| c.token),
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                None
            }
        };
        debug!(has_token = token.is_some(), "Session hydrated");
        let (state, _) = watch::channel(Session::hydrated(token));

        Self {
            api,
            state: Arc::new(state),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop applying results. Calls still in flight finish, but their
    /// outcome no longer touches the session.
    pub fn teardown(&self) {
        self.active.store(false, Ordering::SeqCst);
        debug!("Session controller torn down");
    }

    fn apply(&self, f: impl FnOnce(&mut Session)) {
        if !self.is_active() {
            debug!("Controller torn down, dropping session update");
            return;
        }
        self.state.send_modify(f);
    }

    /// Validate the stored token once. Later calls are no-ops, even while
    /// the first is still waiting on the server.
    pub async fn initialize(&self) -> Result<(), ApiError> {
        if !self.is_active() || !self.api.credentials().has_token() {
            return Ok(());
        }

        // Check-and-set in one synchronous step
        let started = self.state.send_if_modified(|s| {
            if s.validation_attempted || s.is_authenticated() || s.is_loading() {
                return false;
            }
            s.validation_attempted = true;
            s.status = AuthStatus::Loading;
            s.error_message = None;
            true
        });
        if !started {
            debug!("Token validation already attempted, skipping");
            return Ok(());
        }

        match self.api.validate_token().await {
            Ok(user) => {
                let stored = self.api.credentials().load().ok().flatten().map(|c| c.token);
                info!(user_id = %user.id, "Stored token validated");
                self.apply(|s| {
                    let token = stored.or_else(|| s.token.take());
                    s.authenticate(user, token);
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token validation failed");
                // The gateway may already have cleared it; clear again regardless
                if let Err(clear_err) = self.api.logout() {
                    warn!(error = %clear_err, "Failed to clear credential after failed validation");
                }
                self.apply(|s| s.fail(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            let err = ApiError::Authentication("Email and password required".to_string());
            self.apply(|s| s.fail(err.user_message()));
            return Err(err);
        }

        self.apply(|s| {
            s.status = AuthStatus::Loading;
            s.error_message = None;
        });

        match self.api.login(email, password).await {
            Ok(LoginResponse { user, token }) => {
                let result = user.clone();
                self.apply(|s| s.authenticate(user, Some(token)));
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.apply(|s| s.fail(e.user_message()));
                Err(e)
            }
        }
    }

    /// Forget the credential and reset the session. Idempotent.
    pub fn logout(&self) -> Result<(), ApiError> {
        let cleared = self.api.logout();
        self.apply(Session::reset);
        cleared
    }

    pub fn clear_error(&self) {
        self.apply(|s| s.error_message = None);
    }

    /// React to a gateway signal; the stored credential is already gone
    pub fn handle_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Invalidated(reason) => {
                info!(?reason, "Session invalidated");
                self.apply(Session::reset);
            }
        }
    }
}
