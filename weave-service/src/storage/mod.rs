//! Storage layer for weave-service.
//!
//! Keyed CRUD over user records plus atomic application of
//! relationship transitions.

mod sqlite;

pub use sqlite::SqliteUserStore;

use crate::error::StorageResult;
use async_trait::async_trait;
use weave_graph::TransitionEffect;
use weave_types::{NewUser, UserId, UserRecord};

/// Trait for user storage backends.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user with empty relationship sets and return the
    /// stored record with its assigned id.
    ///
    /// Fails with `UsernameTaken` when the username exists.
    async fn insert_user(&self, new: NewUser) -> StorageResult<UserRecord>;

    /// Look up a user by id.
    async fn find_by_id(&self, id: UserId) -> StorageResult<Option<UserRecord>>;

    /// Look up a user by username.
    async fn find_by_username(&self, username: &str) -> StorageResult<Option<UserRecord>>;

    /// All users, ordered by id.
    async fn list_all(&self) -> StorageResult<Vec<UserRecord>>;

    /// Update a user's display name.
    async fn update_name(&self, id: UserId, name: &str) -> StorageResult<()>;

    /// Replace a user's credential digest.
    async fn update_password(&self, id: UserId, password_hash: &str) -> StorageResult<()>;

    /// Delete a user. Returns false when no such row existed.
    async fn delete_user(&self, id: UserId) -> StorageResult<bool>;

    /// Persist every dirty field of a transition's deltas as one
    /// logical unit: all fields across both affected users are
    /// written, or none are.
    async fn apply_effect(&self, effect: &TransitionEffect) -> StorageResult<()>;
}
