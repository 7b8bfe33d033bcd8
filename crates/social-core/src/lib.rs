//! Core library for the social client.
//!
//! Everything between the views and the REST API lives here:
//!
//! - `auth`: persisted credentials, storage backends and the expiry policy
//! - `api`: the HTTP gateway that attaches and revokes bearer tokens
//! - `session`: the session controller and its observable state
//! - `guard`: route protection for views that need a signed-in user
//! - `navigation`: turns gateway invalidation signals into redirects
//! - `config`: on-disk configuration and directory layout
//! - `models`: wire types shared with the server

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;
pub mod navigation;
pub mod session;

pub use api::{ApiClient, ApiError, SessionEvent};
pub use auth::{CredentialStore, StoredCredential};
pub use config::Config;
pub use guard::{GuardDecision, RouteGuard};
pub use navigation::{Navigator, Route};
pub use session::{AuthController, AuthStatus, Session};
