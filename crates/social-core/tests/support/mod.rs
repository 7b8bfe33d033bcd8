#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use social_core::api::{session_channel, SessionEvent};
use social_core::auth::{FixedClock, KeyValueStore, MemoryStore};
use social_core::{ApiClient, CredentialStore};
use tokio::sync::mpsc;
use wiremock::MockServer;

pub const TOKEN: &str = "T";

pub struct Harness {
    pub server: MockServer,
    pub backend: MemoryStore,
    pub clock: FixedClock,
    pub api: ApiClient,
    pub events: mpsc::Receiver<SessionEvent>,
}

impl Harness {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let backend = MemoryStore::new();
        let clock = FixedClock::new(Utc::now());
        let store = CredentialStore::with_clock(Arc::new(backend.clone()), Arc::new(clock.clone()));
        let (tx, events) = session_channel();
        let api = ApiClient::new(&format!("{}/api", server.uri()), store)
            .unwrap()
            .with_events(tx)
            .with_initial_backoff(Duration::from_millis(5));

        Self {
            server,
            backend,
            clock,
            api,
            events,
        }
    }

    /// Persist a fresh token as if a login had just happened
    pub fn seed_token(&self) {
        self.api.credentials().save(TOKEN).unwrap();
    }

    pub fn stored_token(&self) -> Option<String> {
        self.backend.get("token").unwrap()
    }

    pub fn stored_timestamp(&self) -> Option<String> {
        self.backend.get("tokenTimestamp").unwrap()
    }

    pub fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }
}

pub fn user_json() -> Value {
    json!({
        "id": 1,
        "username": "a",
        "email": "a@b.com",
        "bio": null,
        "created_at": "2024-05-01T12:00:00.000000"
    })
}

pub fn login_json() -> Value {
    json!({ "token": TOKEN, "user": user_json() })
}

pub fn post_json(id: i64, content: &str) -> Value {
    json!({
        "id": id,
        "content": content,
        "created_at": "2024-05-01T12:00:00",
        "author_id": 1,
        "likes": 0,
        "comments": 0,
        "author": user_json()
    })
}
