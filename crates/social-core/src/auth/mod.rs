//! Authentication module for persisting and judging access tokens.
//!
//! This module provides:
//! - `KeyValueStore`: durable string slots (file, OS keychain, or memory)
//! - `CredentialStore`: the token + issuance timestamp pair on top of a slot
//! - `ExpiryPolicy`: the client-side validity window (3 hours)

pub mod credentials;
pub mod expiry;
pub mod storage;

pub use credentials::{CredentialStore, StoredCredential};
pub use expiry::{Clock, ExpiryPolicy, FixedClock, SystemClock, VALIDITY_WINDOW_HOURS};
pub use storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
