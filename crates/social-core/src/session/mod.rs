//! Session management: who is signed in, and how that changes.
//!
//! - `Session`: the observable snapshot (user, token, status, error)
//! - `AuthController`: login, logout, and one-shot startup validation

pub mod controller;
pub mod state;

pub use controller::AuthController;
pub use state::{AuthStatus, Session};
