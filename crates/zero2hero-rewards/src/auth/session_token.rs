/*
[INPUT]:  Provider session tokens and their lifetime
[OUTPUT]: Token retrieval and expiration status
[POS]:    Auth layer - provider session token lifecycle
[UPDATE]: When adding token refresh or changing storage strategy
*/

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Default provider session lifetime (24 hours)
pub const DEFAULT_SESSION_SECONDS: u64 = 24 * 60 * 60;

/// Stored session token with metadata
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Thread-safe provider session token holder
#[derive(Debug, Clone, Default)]
pub struct SessionTokenManager {
    data: Arc<RwLock<Option<SessionToken>>>,
}

impl SessionTokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new token valid for `expires_seconds`
    pub fn set_token(&self, token: String, expires_seconds: u64) {
        let expires_at = Utc::now() + Duration::seconds(expires_seconds as i64);
        *self.write() = Some(SessionToken { token, expires_at });
    }

    /// Current token, or `None` if absent or expired
    pub fn get_token(&self) -> Option<String> {
        let guard = self.read();
        guard
            .as_ref()
            .filter(|data| Utc::now() <= data.expires_at)
            .map(|data| data.token.clone())
    }

    pub fn is_expired(&self) -> bool {
        match self.read().as_ref() {
            Some(data) => Utc::now() > data.expires_at,
            None => true,
        }
    }

    pub fn token_data(&self) -> Option<SessionToken> {
        self.read().clone()
    }

    pub fn clear(&self) {
        *self.write() = None;
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<SessionToken>> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<SessionToken>> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
