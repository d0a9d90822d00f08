//! SQLite storage backend for weave-service.

use super::UserStore;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use weave_graph::{TransitionEffect, UserDelta, UserField};
use weave_types::{IdSet, NewUser, UserId, UserRecord};

/// SQLite-based user storage.
///
/// Uses WAL mode for concurrent reads/writes. Relationship sets are
/// stored as simple-array TEXT columns (comma-joined decimal ids).
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Create a new SQLite store from a database path.
    ///
    /// Creates the database file if it doesn't exist.
    pub async fn new(path: &Path, max_connections: u32) -> StorageResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(":memory:")
            .map_err(StorageError::Database)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                following TEXT NOT NULL DEFAULT '',
                followers TEXT NOT NULL DEFAULT '',
                friends TEXT NOT NULL DEFAULT '',
                requests_sent TEXT NOT NULL DEFAULT '',
                requests_received TEXT NOT NULL DEFAULT '',
                blocked TEXT NOT NULL DEFAULT '',
                muted TEXT NOT NULL DEFAULT '',
                total_friends INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        Ok(())
    }

    fn current_timestamp() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Column name for a relationship field. The mapping is the single
/// source of truth for the dynamic UPDATE built in `apply_effect`.
fn column(field: UserField) -> &'static str {
    match field {
        UserField::Following => "following",
        UserField::Followers => "followers",
        UserField::Friends => "friends",
        UserField::RequestsSent => "requests_sent",
        UserField::RequestsReceived => "requests_received",
        UserField::Blocked => "blocked",
        UserField::Muted => "muted",
        UserField::TotalFriends => "total_friends",
    }
}

const SELECT_COLUMNS: &str = "id, name, username, email, password_hash, is_admin, \
     following, followers, friends, requests_sent, requests_received, \
     blocked, muted, total_friends, created_at";

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn insert_user(&self, new: NewUser) -> StorageResult<UserRecord> {
        let created_at = Self::current_timestamp();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, username, email, password_hash, is_admin, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(&new.name)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.is_admin)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false)
            {
                StorageError::UsernameTaken {
                    username: new.username.clone(),
                }
            } else {
                StorageError::Database(e)
            }
        })?;

        tracing::debug!("created user {} ({})", id, new.username);

        Ok(UserRecord {
            id: UserId::new(id),
            name: new.name,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            is_admin: new.is_admin,
            following: IdSet::new(),
            followers: IdSet::new(),
            friends: IdSet::new(),
            requests_sent: IdSet::new(),
            requests_received: IdSet::new(),
            blocked: IdSet::new(),
            muted: IdSet::new(),
            total_friends: 0,
            created_at,
        })
    }

    async fn find_by_id(&self, id: UserId) -> StorageResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_by_username(&self, username: &str) -> StorageResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        Ok(row.map(UserRecord::from))
    }

    async fn list_all(&self) -> StorageResult<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn update_name(&self, id: UserId, name: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE users SET name = ?1 WHERE id = ?2")
            .bind(name)
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(StorageError::Database)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::UserMissing { user_id: id });
        }
        Ok(())
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?1 WHERE id = ?2")
            .bind(password_hash)
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(StorageError::Database)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::UserMissing { user_id: id });
        }
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(StorageError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn apply_effect(&self, effect: &TransitionEffect) -> StorageResult<()> {
        let dirty: Vec<&UserDelta> = effect.dirty_deltas().collect();
        if dirty.is_empty() {
            return Ok(());
        }

        // One transaction for the whole transition: both records or
        // neither. An abandoned caller can therefore never observe a
        // half-applied pair.
        let mut tx = self.pool.begin().await.map_err(StorageError::Database)?;

        for delta in dirty {
            let assignments: Vec<String> = delta
                .fields
                .iter()
                .map(|field| format!("{} = ?", column(*field)))
                .collect();
            let sql = format!("UPDATE users SET {} WHERE id = ?", assignments.join(", "));

            let mut query = sqlx::query(&sql);
            for field in &delta.fields {
                query = match field {
                    UserField::Following => query.bind(delta.user.following.to_simple_array()),
                    UserField::Followers => query.bind(delta.user.followers.to_simple_array()),
                    UserField::Friends => query.bind(delta.user.friends.to_simple_array()),
                    UserField::RequestsSent => {
                        query.bind(delta.user.requests_sent.to_simple_array())
                    }
                    UserField::RequestsReceived => {
                        query.bind(delta.user.requests_received.to_simple_array())
                    }
                    UserField::Blocked => query.bind(delta.user.blocked.to_simple_array()),
                    UserField::Muted => query.bind(delta.user.muted.to_simple_array()),
                    UserField::TotalFriends => query.bind(delta.user.total_friends as i64),
                };
            }

            let result = query
                .bind(delta.user.id.value())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Database)?;

            // Early return drops the transaction, rolling back the
            // other side's update.
            if result.rows_affected() == 0 {
                return Err(StorageError::UserMissing {
                    user_id: delta.user.id,
                });
            }
        }

        tx.commit().await.map_err(StorageError::Database)?;
        Ok(())
    }
}

/// Internal row type for SQLite queries.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    username: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    following: String,
    followers: String,
    friends: String,
    requests_sent: String,
    requests_received: String,
    blocked: String,
    muted: String,
    total_friends: i64,
    created_at: i64,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            name: row.name,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            following: IdSet::from_simple_array(&row.following),
            followers: IdSet::from_simple_array(&row.followers),
            friends: IdSet::from_simple_array(&row.friends),
            requests_sent: IdSet::from_simple_array(&row.requests_sent),
            requests_received: IdSet::from_simple_array(&row.requests_received),
            blocked: IdSet::from_simple_array(&row.blocked),
            muted: IdSet::from_simple_array(&row.muted),
            total_friends: row.total_friends as u32,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_graph::RelationshipPolicy;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            name: format!("Name {username}"),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$stub".into(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = SqliteUserStore::in_memory().await.unwrap();

        let ann = store.insert_user(new_user("ann")).await.unwrap();
        let bob = store.insert_user(new_user("bob")).await.unwrap();

        assert!(ann.id < bob.id);
        assert!(ann.friends.is_empty());
        assert_eq!(ann.total_friends, 0);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = SqliteUserStore::in_memory().await.unwrap();
        store.insert_user(new_user("ann")).await.unwrap();

        let err = store.insert_user(new_user("ann")).await.unwrap_err();
        assert!(matches!(err, StorageError::UsernameTaken { username } if username == "ann"));
    }

    #[tokio::test]
    async fn find_by_id_and_username() {
        let store = SqliteUserStore::in_memory().await.unwrap();
        let ann = store.insert_user(new_user("ann")).await.unwrap();

        let by_id = store.find_by_id(ann.id).await.unwrap().unwrap();
        assert_eq!(by_id, ann);

        let by_name = store.find_by_username("ann").await.unwrap().unwrap();
        assert_eq!(by_name.id, ann.id);

        assert!(store.find_by_username("nobody").await.unwrap().is_none());
        assert!(store
            .find_by_id(UserId::new(9999))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn relationship_sets_roundtrip_through_columns() {
        let store = SqliteUserStore::in_memory().await.unwrap();
        let ann = store.insert_user(new_user("ann")).await.unwrap();
        let bob = store.insert_user(new_user("bob")).await.unwrap();

        let effect = weave_graph::toggle_follow(&ann, &bob).unwrap();
        store.apply_effect(&effect).await.unwrap();

        let ann_after = store.find_by_id(ann.id).await.unwrap().unwrap();
        let bob_after = store.find_by_id(bob.id).await.unwrap().unwrap();
        assert!(ann_after.following.contains(bob.id));
        assert!(bob_after.followers.contains(ann.id));
    }

    #[tokio::test]
    async fn apply_effect_writes_both_sides_of_accept() {
        let store = SqliteUserStore::in_memory().await.unwrap();
        let ann = store.insert_user(new_user("ann")).await.unwrap();
        let bob = store.insert_user(new_user("bob")).await.unwrap();

        let request = weave_graph::send_friend_request(&ann, &bob).unwrap();
        store.apply_effect(&request).await.unwrap();

        let ann_mid = store.find_by_id(ann.id).await.unwrap().unwrap();
        let bob_mid = store.find_by_id(bob.id).await.unwrap().unwrap();
        let accept = weave_graph::accept_friend_request(
            &RelationshipPolicy::default(),
            &bob_mid,
            &ann_mid,
        )
        .unwrap();
        store.apply_effect(&accept).await.unwrap();

        let ann_after = store.find_by_id(ann.id).await.unwrap().unwrap();
        let bob_after = store.find_by_id(bob.id).await.unwrap().unwrap();
        assert!(ann_after.friends.contains(bob.id));
        assert!(bob_after.friends.contains(ann.id));
        assert_eq!(ann_after.total_friends, 1);
        assert_eq!(bob_after.total_friends, 1);
        assert!(ann_after.requests_sent.is_empty());
        assert!(bob_after.requests_received.is_empty());
    }

    #[tokio::test]
    async fn apply_effect_rolls_back_when_one_side_vanished() {
        let store = SqliteUserStore::in_memory().await.unwrap();
        let ann = store.insert_user(new_user("ann")).await.unwrap();
        let bob = store.insert_user(new_user("bob")).await.unwrap();

        let effect = weave_graph::send_friend_request(&ann, &bob).unwrap();

        // Bob's row disappears between compute and persist.
        assert!(store.delete_user(bob.id).await.unwrap());
        let err = store.apply_effect(&effect).await.unwrap_err();
        assert!(matches!(err, StorageError::UserMissing { user_id } if user_id == bob.id));

        // Ann's side must not have been half-applied.
        let ann_after = store.find_by_id(ann.id).await.unwrap().unwrap();
        assert!(ann_after.requests_sent.is_empty());
    }

    #[tokio::test]
    async fn apply_effect_with_no_dirty_fields_is_noop() {
        let store = SqliteUserStore::in_memory().await.unwrap();
        let ann = store.insert_user(new_user("ann")).await.unwrap();

        // Unblocking an id that was never blocked changes nothing.
        let effect = weave_graph::unblock_user(&ann, UserId::new(42));
        store.apply_effect(&effect).await.unwrap();
    }

    #[tokio::test]
    async fn update_name_and_password() {
        let store = SqliteUserStore::in_memory().await.unwrap();
        let ann = store.insert_user(new_user("ann")).await.unwrap();

        store.update_name(ann.id, "Ann Renamed").await.unwrap();
        store.update_password(ann.id, "$argon2id$new").await.unwrap();

        let after = store.find_by_id(ann.id).await.unwrap().unwrap();
        assert_eq!(after.name, "Ann Renamed");
        assert_eq!(after.password_hash, "$argon2id$new");
    }

    #[tokio::test]
    async fn update_missing_user_reports_missing_row() {
        let store = SqliteUserStore::in_memory().await.unwrap();
        let err = store.update_name(UserId::new(404), "x").await.unwrap_err();
        assert!(matches!(err, StorageError::UserMissing { .. }));
    }

    #[tokio::test]
    async fn delete_user_reports_whether_row_existed() {
        let store = SqliteUserStore::in_memory().await.unwrap();
        let ann = store.insert_user(new_user("ann")).await.unwrap();

        assert!(store.delete_user(ann.id).await.unwrap());
        assert!(!store.delete_user(ann.id).await.unwrap());
    }

    #[tokio::test]
    async fn file_backed_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weave.db");

        {
            let store = SqliteUserStore::new(&path, 2).await.unwrap();
            store.insert_user(new_user("ann")).await.unwrap();
        }

        let store = SqliteUserStore::new(&path, 2).await.unwrap();
        assert!(store.find_by_username("ann").await.unwrap().is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_backed_store_accepts_non_utf8_paths() {
        use std::os::unix::ffi::OsStringExt;

        let dir = tempfile::tempdir().unwrap();
        let name = std::ffi::OsString::from_vec(vec![b'w', 0xff, b'.', b'd', b'b']);
        let path = dir.path().join(name);

        let store = SqliteUserStore::new(&path, 1).await.unwrap();
        store.insert_user(new_user("ann")).await.unwrap();
        // The database landed at the configured path, not a fallback.
        assert!(path.exists());
    }

    #[tokio::test]
    async fn list_all_is_ordered_by_id() {
        let store = SqliteUserStore::in_memory().await.unwrap();
        store.insert_user(new_user("ann")).await.unwrap();
        store.insert_user(new_user("bob")).await.unwrap();
        store.insert_user(new_user("cat")).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].id < all[1].id && all[1].id < all[2].id);
    }
}
