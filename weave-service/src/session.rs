//! Per-token session store.
//!
//! Maps opaque session tokens to user ids. Each successful login
//! mints a fresh token; concurrent logins from the same user coexist
//! as independent sessions.

use dashmap::DashMap;
use weave_types::{SessionToken, UserId};

/// The session store: token -> authenticated user id.
#[derive(Debug, Default)]
pub struct SessionStore {
    tokens: DashMap<SessionToken, UserId>,
}

impl SessionStore {
    /// Create an empty session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a token for a freshly authenticated user.
    pub fn login(&self, user_id: UserId) -> SessionToken {
        let token = SessionToken::random();
        self.tokens.insert(token, user_id);
        tracing::debug!("session opened for user {} ({:?})", user_id, token);
        token
    }

    /// Resolve a token to its user id. Read-only; this is the lookup
    /// the auth gate performs on every call.
    pub fn resolve(&self, token: &SessionToken) -> Option<UserId> {
        self.tokens.get(token).map(|entry| *entry.value())
    }

    /// Destroy a session. Returns false (and is a no-op) when the
    /// token was not active.
    pub fn logout(&self, token: &SessionToken) -> bool {
        let removed = self.tokens.remove(token).is_some();
        if removed {
            tracing::debug!("session closed ({:?})", token);
        }
        removed
    }

    /// Revoke every session of one user (account deletion).
    ///
    /// Returns how many sessions were dropped.
    pub fn revoke_user(&self, user_id: UserId) -> usize {
        // Counted inside the sweep; comparing map lengths taken
        // before and after would race with concurrent logins.
        let mut revoked = 0;
        self.tokens.retain(|_, uid| {
            if *uid == user_id {
                revoked += 1;
                false
            } else {
                true
            }
        });
        revoked
    }

    /// Number of active sessions.
    pub fn active_sessions(&self) -> usize {
        self.tokens.len()
    }
}
