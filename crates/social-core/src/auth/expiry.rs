use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::StoredCredential;

/// Token validity window in hours, counted from issuance.
/// Client-side heuristic only; the server may revoke tokens sooner.
pub const VALIDITY_WINDOW_HOURS: i64 = 3;

/// Source of "now" for expiry checks and credential timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to an instant. Clones share the instant, so a test can
/// advance time under a gateway that already holds the clock.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn at_millis(millis: i64) -> Self {
        let now = Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now);
        Self::new(now)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|guard| *guard).unwrap_or_else(|_| Utc::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    validity_window: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(Duration::hours(VALIDITY_WINDOW_HOURS))
    }
}

impl ExpiryPolicy {
    pub fn new(validity_window: Duration) -> Self {
        Self { validity_window }
    }

    pub fn validity_window(&self) -> Duration {
        self.validity_window
    }

    /// Age of the credential in millis. None when there is no timestamp,
    /// the timestamp lies in the future, or the difference overflows.
    fn age_millis(credential: &StoredCredential, now: DateTime<Utc>) -> Option<i64> {
        let issued_at = credential.issued_at_epoch_millis?;
        let now = now.timestamp_millis();
        if issued_at > now {
            return None;
        }
        now.checked_sub(issued_at)
    }

    /// A credential whose age cannot be established is always expired.
    pub fn is_expired(&self, credential: &StoredCredential, now: DateTime<Utc>) -> bool {
        match Self::age_millis(credential, now) {
            Some(age) => age > self.validity_window.num_milliseconds(),
            None => true,
        }
    }

    /// Remaining validity, floored at zero
    pub fn time_until_expiry(&self, credential: &StoredCredential, now: DateTime<Utc>) -> Duration {
        match Self::age_millis(credential, now) {
            Some(age) => {
                let remaining = self.validity_window.num_milliseconds().saturating_sub(age);
                Duration::milliseconds(remaining.max(0))
            }
            None => Duration::zero(),
        }
    }
}
