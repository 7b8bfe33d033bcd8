//! REST API gateway for the social network server.
//!
//! This module provides the `ApiClient`, the single path every network call
//! takes. It attaches the stored bearer token on the way out and tears the
//! credential down when the server answers 401. It never navigates by itself.
//! Instead it emits `SessionEvent`s on a channel for a coordinator to act on.

pub mod client;
pub mod error;

use tokio::sync::mpsc;

pub use client::{ApiClient, CredentialStatus};
pub use error::ApiError;

/// Buffer size for the session event channel.
/// Invalidations are rare; 32 leaves headroom for a burst of failing calls.
pub const EVENT_BUFFER_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    /// The locally stored token outlived the validity window
    Expired,
    /// The server answered 401
    Unauthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The stored credential was cleared; the user has to log in again
    Invalidated(InvalidationReason),
}

/// Create the channel that carries gateway events to the navigator
pub fn session_channel() -> (mpsc::Sender<SessionEvent>, mpsc::Receiver<SessionEvent>) {
    mpsc::channel(EVENT_BUFFER_SIZE)
}
