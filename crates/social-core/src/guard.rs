//! Route protection for views that require a signed-in user.
//!
//! The decision itself is a pure function of the session snapshot and
//! whether a token is stored. `RouteGuard` wraps it with the one side
//! effect it is allowed: kicking off startup validation.

use tokio::sync::watch;
use tracing::debug;

use crate::session::{AuthController, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Send the user to the login view
    RedirectToLogin,
    /// Validation in flight; show a progress indicator only
    Waiting,
    /// Show the protected content
    Render,
}

pub fn evaluate(session: &Session, token_present: bool) -> GuardDecision {
    if !token_present {
        return GuardDecision::RedirectToLogin;
    }
    if session.is_loading() {
        return GuardDecision::Waiting;
    }
    if session.validation_attempted && !session.is_authenticated() {
        return GuardDecision::RedirectToLogin;
    }
    GuardDecision::Render
}

/// Whether the guard should start validation for this snapshot
pub fn needs_validation(session: &Session, token_present: bool) -> bool {
    token_present
        && !session.is_authenticated()
        && !session.is_loading()
        && !session.validation_attempted
}

pub struct RouteGuard {
    controller: AuthController,
    changes: watch::Receiver<Session>,
    stored: watch::Receiver<u64>,
}

impl RouteGuard {
    pub fn new(controller: AuthController) -> Self {
        let changes = controller.subscribe();
        let stored = controller.api().credentials().watch();
        Self {
            controller,
            changes,
            stored,
        }
    }

    fn token_present(&self) -> bool {
        self.controller.api().credentials().has_token()
    }

    /// Current decision, without side effects
    pub fn decide(&self) -> GuardDecision {
        evaluate(&self.changes.borrow(), self.token_present())
    }

    /// Start validation if this snapshot calls for it, then decide.
    /// Validation failures are not returned; they show up as a redirect.
    pub async fn resolve(&self) -> GuardDecision {
        let token_present = self.token_present();
        let should_validate = needs_validation(&self.changes.borrow(), token_present);
        if should_validate {
            if let Err(e) = self.controller.initialize().await {
                debug!(error = %e, "Startup validation failed");
            }
        }
        self.decide()
    }

    /// Wait for the next session change, or for the stored token to appear
    /// or disappear, and decide again. Returns None once the controller is gone.
    pub async fn changed(&mut self) -> Option<GuardDecision> {
        tokio::select! {
            res = self.changes.changed() => res.ok()?,
            res = self.stored.changed() => res.ok()?,
        }
        Some(self.decide())
    }
}
