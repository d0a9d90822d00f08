//! The user data model.

use crate::{IdSet, UserId};
use serde::{Deserialize, Serialize};

/// A user account with its relationship edges.
///
/// The relationship sets always travel together with the record: a
/// transition reads both endpoint records, computes the new sets, and
/// persists the changed fields of both as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Immutable account id, assigned by the store at registration.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// One-way credential digest (PHC string). Never the plaintext.
    pub password_hash: String,
    /// Whether this account can perform admin-only operations.
    pub is_admin: bool,
    /// Users this account follows.
    pub following: IdSet,
    /// Users following this account.
    pub followers: IdSet,
    /// Symmetric friendship edges.
    pub friends: IdSet,
    /// Outgoing pending friend requests.
    pub requests_sent: IdSet,
    /// Incoming pending friend requests.
    pub requests_received: IdSet,
    /// Users this account has blocked (one-directional).
    pub blocked: IdSet,
    /// Users this account has muted (one-directional, no reciprocal
    /// effect).
    pub muted: IdSet,
    /// Derived counter; equals `friends.len()` at all times.
    pub total_friends: u32,
    /// Unix timestamp of account creation.
    pub created_at: i64,
}

impl UserRecord {
    /// Whether this record's derived friend counter matches the
    /// friends set.
    pub fn counter_consistent(&self) -> bool {
        self.total_friends as usize == self.friends.len()
    }
}

/// Input for creating a user. All relationship sets start empty.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Unique login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// One-way credential digest (PHC string).
    pub password_hash: String,
    /// Whether the account is created as an admin.
    pub is_admin: bool,
}
