//! Turns gateway session events into navigation.
//!
//! The gateway only reports that a credential died; the `Navigator` owns
//! the receiving end of that channel, demotes the session, and moves the
//! current route to the login view with the expired notice.

use tokio::sync::mpsc;
use tracing::debug;

use crate::api::SessionEvent;
use crate::session::AuthController;

/// Notice shown on the login view after an invalidation
pub const EXPIRED_NOTICE: &str = "Your session has expired. Please log in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login { expired: bool },
    Register,
    Home,
    Profile,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login { expired: false } => "/login",
            Route::Login { expired: true } => "/login?expired=true",
            Route::Register => "/register",
            Route::Home => "/",
            Route::Profile => "/profile",
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Home | Route::Profile)
    }

    /// Notice to show above the login form, if any
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Route::Login { expired: true } => Some(EXPIRED_NOTICE),
            _ => None,
        }
    }
}

pub struct Navigator {
    controller: AuthController,
    events: mpsc::Receiver<SessionEvent>,
    current: Route,
}

impl Navigator {
    pub fn new(
        controller: AuthController,
        events: mpsc::Receiver<SessionEvent>,
        start: Route,
    ) -> Self {
        Self {
            controller,
            events,
            current: start,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    pub fn navigate(&mut self, route: Route) {
        debug!(from = self.current.path(), to = route.path(), "Navigate");
        self.current = route;
    }

    fn apply(&mut self, event: SessionEvent) {
        self.controller.handle_event(event);
        match event {
            SessionEvent::Invalidated(_) => self.navigate(Route::Login { expired: true }),
        }
    }

    /// Drain pending events without blocking.
    /// Returns the new route if any event moved it.
    pub fn process_pending_events(&mut self) -> Option<Route> {
        let before = self.current;
        let mut handled = false;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            handled = true;
        }
        (handled && self.current != before).then_some(self.current)
    }

    /// Wait for the next event and apply it.
    /// Returns None once every sender is gone.
    pub async fn next_event(&mut self) -> Option<Route> {
        let event = self.events.recv().await?;
        self.apply(event);
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(Route::Login { expired: false }.path(), "/login");
        assert_eq!(Route::Login { expired: true }.path(), "/login?expired=true");
        assert_eq!(Route::Home.path(), "/");
    }

    #[test]
    fn test_notice_only_when_expired() {
        assert_eq!(Route::Login { expired: true }.notice(), Some(EXPIRED_NOTICE));
        assert_eq!(Route::Login { expired: false }.notice(), None);
        assert_eq!(Route::Profile.notice(), None);
    }

    #[test]
    fn test_protected_routes() {
        assert!(Route::Home.is_protected());
        assert!(Route::Profile.is_protected());
        assert!(!Route::Register.is_protected());
        assert!(!Route::Login { expired: true }.is_protected());
    }
}
