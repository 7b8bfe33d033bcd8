use serde::Serialize;

use crate::models::User;

/// Lifecycle of the in-memory session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AuthStatus {
    #[default]
    Idle,
    Loading,
    Authenticated,
    /// Last login or validation failed. Not terminal.
    Error,
}

impl AuthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AuthStatus::Idle => "idle",
            AuthStatus::Loading => "loading",
            AuthStatus::Authenticated => "authenticated",
            AuthStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the client's view of who is signed in
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub status: AuthStatus,
    pub error_message: Option<String>,
    /// Set once startup validation has been started for this controller.
    /// Never reset while the controller lives.
    pub validation_attempted: bool,
}

impl Session {
    /// Empty session with the token hydrated from storage
    pub fn hydrated(token: Option<String>) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.status == AuthStatus::Loading
    }

    /// Drop user and token, keeping the validation guard
    pub(crate) fn reset(&mut self) {
        *self = Session {
            validation_attempted: self.validation_attempted,
            ..Session::default()
        };
    }

    pub(crate) fn authenticate(&mut self, user: User, token: Option<String>) {
        self.user = Some(user);
        self.token = token;
        self.status = AuthStatus::Authenticated;
        self.error_message = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.user = None;
        self.token = None;
        self.status = AuthStatus::Error;
        self.error_message = Some(message);
    }
}
