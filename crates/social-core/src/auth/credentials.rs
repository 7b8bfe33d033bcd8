use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::{Clock, KeyValueStore, SystemClock};

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "token";

/// Storage key for the issuance timestamp (epoch millis, decimal string)
pub const TIMESTAMP_KEY: &str = "tokenTimestamp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub token: String,
    pub issued_at_epoch_millis: Option<i64>,
}

/// The persisted token + issuance timestamp pair.
/// Clone is cheap; clones share the same backend slot and change signal.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    // Bumped after every save or clear made through any clone
    revision: Arc<watch::Sender<u64>>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            backend,
            clock,
            revision: Arc::new(revision),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Notified whenever a token is stored or removed through this store
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    /// Persist a token stamped with the current time.
    /// Token and timestamp are written back to back with nothing in between.
    pub fn save(&self, token: &str) -> Result<StoredCredential> {
        let issued_at = self.clock.now_millis();
        self.backend.set(TOKEN_KEY, token)?;
        self.backend.set(TIMESTAMP_KEY, &issued_at.to_string())?;
        self.bump();
        debug!(issued_at, "Stored credential");
        Ok(StoredCredential {
            token: token.to_string(),
            issued_at_epoch_millis: Some(issued_at),
        })
    }

    pub fn load(&self) -> Result<Option<StoredCredential>> {
        let Some(token) = self.backend.get(TOKEN_KEY)? else {
            return Ok(None);
        };
        let issued_at_epoch_millis = match self.backend.get(TIMESTAMP_KEY)? {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(millis) => Some(millis),
                Err(_) => {
                    warn!("Unparseable credential timestamp, treating token as expired");
                    None
                }
            },
            None => None,
        };
        Ok(Some(StoredCredential {
            token,
            issued_at_epoch_millis,
        }))
    }

    /// True if a token is persisted, regardless of its age
    pub fn has_token(&self) -> bool {
        match self.backend.get(TOKEN_KEY) {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "Failed to read credential store");
                false
            }
        }
    }

    /// Remove both fields. Safe to call when nothing is stored.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove(TOKEN_KEY)?;
        self.backend.remove(TIMESTAMP_KEY)?;
        self.bump();
        debug!("Cleared stored credential");
        Ok(())
    }
}
