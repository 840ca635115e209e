//! Bearer token session store
//!
//! Sessions are issued for a user, carried as `Authorization: Bearer <token>`
//! headers, and resolved on every request. Expired tokens are dropped on
//! first use after their deadline.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use faultline_core::UserId;
use uuid::Uuid;

/// Identity attached to a request after session authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthedUser(pub UserId);

#[derive(Debug, Clone)]
struct Session {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

/// In-memory session store keyed by bearer token
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store with the default 12 hour session lifetime
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(12))
    }

    /// Create a store with a custom session lifetime
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Issue a fresh token for the given user
    pub fn issue(&self, user_id: UserId) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                user_id,
                expires_at: Utc::now() + self.ttl,
            },
        );
        token
    }

    /// Resolve a token to its user, discarding it if expired
    pub fn resolve(&self, token: &str) -> Option<UserId> {
        let (user_id, expired) = {
            let session = self.sessions.get(token)?;
            (session.user_id, session.expires_at <= Utc::now())
        };

        if expired {
            self.sessions.remove(token);
            return None;
        }
        Some(user_id)
    }

    /// Revoke a token, returning whether it existed
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Number of live sessions (including not-yet-reaped expired ones)
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_resolve() {
        let store = SessionStore::new();
        let user_id = Uuid::new_v4();

        let token = store.issue(user_id);
        assert_eq!(store.resolve(&token), Some(user_id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_token() {
        let store = SessionStore::new();
        assert_eq!(store.resolve("not-a-token"), None);
    }

    #[test]
    fn test_expired_token_is_dropped() {
        let store = SessionStore::with_ttl(Duration::zero());
        let token = store.issue(Uuid::new_v4());

        assert_eq!(store.resolve(&token), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_revoke() {
        let store = SessionStore::new();
        let token = store.issue(Uuid::new_v4());

        assert!(store.revoke(&token));
        assert!(!store.revoke(&token));
        assert_eq!(store.resolve(&token), None);
    }

    #[test]
    fn test_tokens_are_distinct() {
        let store = SessionStore::new();
        let user_id = Uuid::new_v4();

        let a = store.issue(user_id);
        let b = store.issue(user_id);
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }
}
