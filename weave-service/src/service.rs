//! The social service: auth gate, mutation coordinator and the full
//! public operation surface.
//!
//! Every operation resolves the caller through the session store
//! first. Relationship mutations then take the per-user locks, load
//! fresh records, run the pure transition from `weave-graph`, and
//! persist the resulting deltas in one storage transaction. A
//! transient storage failure during persistence is retried a bounded
//! number of times before surfacing.

use crate::config::Config;
use crate::credentials;
use crate::error::{ServiceError, ServiceResult};
use crate::locks::PairLocks;
use crate::session::SessionStore;
use crate::storage::UserStore;
use std::sync::atomic::{AtomicU64, Ordering};
use weave_graph::{TransitionEffect, TransitionError};
use weave_types::{IdSet, NewUser, SessionToken, UserId, UserRecord};

/// Operation counters, updated with relaxed atomics.
#[derive(Debug, Default)]
struct ServiceMetrics {
    registrations: AtomicU64,
    logins: AtomicU64,
    mutations: AtomicU64,
    rejections: AtomicU64,
    storage_retries: AtomicU64,
}

/// Point-in-time copy of the service counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Accounts created.
    pub registrations: u64,
    /// Successful logins.
    pub logins: u64,
    /// Relationship transitions persisted.
    pub mutations: u64,
    /// Transitions refused by a business rule.
    pub rejections: u64,
    /// Transient storage failures that were retried.
    pub storage_retries: u64,
}

/// The service facade over one user store.
///
/// Cheap to share behind an `Arc`; all interior state is concurrent.
pub struct SocialService<S> {
    config: Config,
    store: S,
    sessions: SessionStore,
    locks: PairLocks,
    metrics: ServiceMetrics,
}

impl<S: UserStore> SocialService<S> {
    /// Create a service over the given store.
    pub fn new(config: Config, store: S) -> Self {
        Self {
            config,
            store,
            sessions: SessionStore::new(),
            locks: PairLocks::new(),
            metrics: ServiceMetrics::default(),
        }
    }

    /// Snapshot the operation counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            registrations: self.metrics.registrations.load(Ordering::Relaxed),
            logins: self.metrics.logins.load(Ordering::Relaxed),
            mutations: self.metrics.mutations.load(Ordering::Relaxed),
            rejections: self.metrics.rejections.load(Ordering::Relaxed),
            storage_retries: self.metrics.storage_retries.load(Ordering::Relaxed),
        }
    }

    /// Number of currently active sessions.
    pub fn active_sessions(&self) -> usize {
        self.sessions.active_sessions()
    }

    // ---- account lifecycle -------------------------------------------------

    /// Create an account.
    ///
    /// The only hard input rule is that not all four fields may be
    /// empty at once. Usernames longer than the configured limit are
    /// rejected; display names longer than theirs are silently
    /// truncated.
    pub async fn register(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> ServiceResult<UserRecord> {
        if name.is_empty() && username.is_empty() && email.is_empty() && password.is_empty() {
            return Err(ServiceError::Validation {
                reason: "all registration fields are empty".into(),
            });
        }
        if username.chars().count() > self.config.limits.max_username_len {
            return Err(ServiceError::Validation {
                reason: format!(
                    "username longer than {} characters",
                    self.config.limits.max_username_len
                ),
            });
        }
        let name: String = name.chars().take(self.config.limits.max_name_len).collect();

        // Friendly pre-check; the UNIQUE constraint still backstops
        // a racing duplicate insert.
        if self.store.find_by_username(username).await?.is_some() {
            return Err(ServiceError::UsernameTaken {
                username: username.to_string(),
            });
        }

        let password_hash = credentials::hash_password(password)?;
        let record = self
            .store
            .insert_user(NewUser {
                name,
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                is_admin,
            })
            .await?;

        self.metrics.registrations.fetch_add(1, Ordering::Relaxed);
        tracing::info!("registered user {} ({})", record.id, record.username);
        Ok(record)
    }

    /// Authenticate and open a session. Returns the fresh token and
    /// the authenticated record.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> ServiceResult<(SessionToken, UserRecord)> {
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation {
                reason: "username and password are required".into(),
            });
        }
        let user = self.store.find_by_username(username).await?.ok_or_else(|| {
            ServiceError::UsernameNotFound {
                username: username.to_string(),
            }
        })?;
        if !credentials::verify_password(&user.password_hash, password) {
            return Err(ServiceError::InvalidCredentials);
        }

        self.metrics.logins.fetch_add(1, Ordering::Relaxed);
        tracing::info!("user {} logged in", user.id);
        Ok((self.sessions.login(user.id), user))
    }

    /// Close a session. Returns false when the token was not active.
    pub fn logout(&self, token: &SessionToken) -> bool {
        self.sessions.logout(token)
    }

    /// The caller's own record, or `None` when the token carries no
    /// session (or the account has since been deleted).
    pub async fn me(&self, token: &SessionToken) -> ServiceResult<Option<UserRecord>> {
        match self.sessions.resolve(token) {
            None => Ok(None),
            Some(id) => Ok(self.store.find_by_id(id).await?),
        }
    }

    /// Replace the caller's password after verifying the current one.
    pub async fn change_password(
        &self,
        token: &SessionToken,
        old_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        if new_password.is_empty() {
            return Err(ServiceError::Validation {
                reason: "password must not be empty".into(),
            });
        }
        let caller = self.resolve_caller(token).await?;
        if !credentials::verify_password(&caller.password_hash, old_password) {
            return Err(ServiceError::InvalidCredentials);
        }
        let password_hash = credentials::hash_password(new_password)?;
        self.store.update_password(caller.id, &password_hash).await?;
        Ok(())
    }

    /// Rename an account. Callers may rename themselves; admins may
    /// rename anyone.
    pub async fn update_user(
        &self,
        token: &SessionToken,
        target_id: UserId,
        name: &str,
    ) -> ServiceResult<UserRecord> {
        let caller = self.resolve_caller(token).await?;
        if caller.id != target_id && !caller.is_admin {
            return Err(ServiceError::Forbidden {
                reason: "only admins may update other users".into(),
            });
        }
        let name: String = name.chars().take(self.config.limits.max_name_len).collect();
        self.store.update_name(target_id, &name).await?;
        self.load_user(target_id).await
    }

    /// Delete an account. Admin-only, including self-deletion; every
    /// session of the deleted user is revoked.
    pub async fn delete_user(&self, token: &SessionToken, target_id: UserId) -> ServiceResult<bool> {
        let caller = self.resolve_caller(token).await?;
        if !caller.is_admin {
            return Err(ServiceError::Forbidden {
                reason: "only admins may delete users".into(),
            });
        }
        let deleted = self.store.delete_user(target_id).await?;
        if deleted {
            let revoked = self.sessions.revoke_user(target_id);
            tracing::info!(
                "deleted user {} ({} sessions revoked)",
                target_id,
                revoked
            );
        }
        Ok(deleted)
    }

    // ---- reads -------------------------------------------------------------

    /// Look up a user by id.
    pub async fn get_user(&self, token: &SessionToken, id: UserId) -> ServiceResult<UserRecord> {
        self.auth(token)?;
        self.load_user(id).await
    }

    /// Look up a user by username. Absence is not an error here.
    pub async fn find_user_by_username(
        &self,
        token: &SessionToken,
        username: &str,
    ) -> ServiceResult<Option<UserRecord>> {
        self.auth(token)?;
        Ok(self.store.find_by_username(username).await?)
    }

    /// All users, ordered by id.
    pub async fn get_all_users(&self, token: &SessionToken) -> ServiceResult<Vec<UserRecord>> {
        self.auth(token)?;
        Ok(self.store.list_all().await?)
    }

    /// The caller's followers, as full records.
    pub async fn show_followers(&self, token: &SessionToken) -> ServiceResult<Vec<UserRecord>> {
        let caller = self.resolve_caller(token).await?;
        self.resolve_members(&caller.followers).await
    }

    /// The users the caller follows.
    pub async fn show_following(&self, token: &SessionToken) -> ServiceResult<Vec<UserRecord>> {
        let caller = self.resolve_caller(token).await?;
        self.resolve_members(&caller.following).await
    }

    /// The caller's friends.
    pub async fn show_friends(&self, token: &SessionToken) -> ServiceResult<Vec<UserRecord>> {
        let caller = self.resolve_caller(token).await?;
        self.resolve_members(&caller.friends).await
    }

    /// Pending requests the caller has sent.
    pub async fn show_requests_sent(&self, token: &SessionToken) -> ServiceResult<Vec<UserRecord>> {
        let caller = self.resolve_caller(token).await?;
        self.resolve_members(&caller.requests_sent).await
    }

    /// Pending requests waiting on the caller.
    pub async fn show_requests_received(
        &self,
        token: &SessionToken,
    ) -> ServiceResult<Vec<UserRecord>> {
        let caller = self.resolve_caller(token).await?;
        self.resolve_members(&caller.requests_received).await
    }

    /// The users the caller has blocked.
    pub async fn show_blocked(&self, token: &SessionToken) -> ServiceResult<Vec<UserRecord>> {
        let caller = self.resolve_caller(token).await?;
        self.resolve_members(&caller.blocked).await
    }

    // ---- relationship transitions ------------------------------------------

    /// Follow or unfollow the target. Returns the target's updated
    /// record.
    pub async fn toggle_follow(
        &self,
        token: &SessionToken,
        target_id: UserId,
    ) -> ServiceResult<UserRecord> {
        let actor_id = self.auth(token)?;
        let _guard = self.locks.lock_pair(actor_id, target_id).await;
        let actor = self.load_user(actor_id).await?;
        let target = self.load_user(target_id).await?;
        let effect =
            weave_graph::toggle_follow(&actor, &target).map_err(|e| self.reject(e))?;
        self.persist(&effect).await?;
        Ok(other_side(effect, target))
    }

    /// Send a friend request. Returns the target's updated record.
    pub async fn send_friend_request(
        &self,
        token: &SessionToken,
        target_id: UserId,
    ) -> ServiceResult<UserRecord> {
        let actor_id = self.auth(token)?;
        let _guard = self.locks.lock_pair(actor_id, target_id).await;
        let actor = self.load_user(actor_id).await?;
        let target = self.load_user(target_id).await?;
        let effect =
            weave_graph::send_friend_request(&actor, &target).map_err(|e| self.reject(e))?;
        self.persist(&effect).await?;
        Ok(other_side(effect, target))
    }

    /// Accept a pending friend request from `requester_id`. Returns
    /// the requester's updated record.
    pub async fn accept_friend_request(
        &self,
        token: &SessionToken,
        requester_id: UserId,
    ) -> ServiceResult<UserRecord> {
        let actor_id = self.auth(token)?;
        let _guard = self.locks.lock_pair(actor_id, requester_id).await;
        let actor = self.load_user(actor_id).await?;
        let requester = self.load_user(requester_id).await?;
        let effect =
            weave_graph::accept_friend_request(&self.config.policy, &actor, &requester)
                .map_err(|e| self.reject(e))?;
        self.persist(&effect).await?;
        Ok(other_side(effect, requester))
    }

    /// Reject a pending friend request from `requester_id`. Returns
    /// the requester's updated record.
    pub async fn reject_friend_request(
        &self,
        token: &SessionToken,
        requester_id: UserId,
    ) -> ServiceResult<UserRecord> {
        let actor_id = self.auth(token)?;
        let _guard = self.locks.lock_pair(actor_id, requester_id).await;
        let actor = self.load_user(actor_id).await?;
        let requester = self.load_user(requester_id).await?;
        let effect = weave_graph::reject_friend_request(&actor, &requester)
            .map_err(|e| self.reject(e))?;
        self.persist(&effect).await?;
        Ok(other_side(effect, requester))
    }

    /// Block the target. Returns the caller's updated record.
    pub async fn block_user(
        &self,
        token: &SessionToken,
        target_id: UserId,
    ) -> ServiceResult<UserRecord> {
        let actor_id = self.auth(token)?;
        let _guard = self.locks.lock_pair(actor_id, target_id).await;
        let actor = self.load_user(actor_id).await?;
        // The target record is needed even under the one-directional
        // default policy: blocking a deleted account must still fail
        // with a clean not-found.
        let target = self.load_user(target_id).await?;
        let effect = weave_graph::block_user(&self.config.policy, &actor, &target)
            .map_err(|e| self.reject(e))?;
        self.persist(&effect).await?;
        Ok(effect.actor.user)
    }

    /// Unblock the target. Idempotent; returns the caller's updated
    /// record.
    pub async fn unblock_user(
        &self,
        token: &SessionToken,
        target_id: UserId,
    ) -> ServiceResult<UserRecord> {
        let actor_id = self.auth(token)?;
        let _guard = self.locks.lock_single(actor_id).await;
        let actor = self.load_user(actor_id).await?;
        let effect = weave_graph::unblock_user(&actor, target_id);
        self.persist(&effect).await?;
        Ok(effect.actor.user)
    }

    /// Mute the target. Idempotent; returns the caller's updated
    /// record.
    pub async fn mute_user(
        &self,
        token: &SessionToken,
        target_id: UserId,
    ) -> ServiceResult<UserRecord> {
        let actor_id = self.auth(token)?;
        let _guard = self.locks.lock_single(actor_id).await;
        let actor = self.load_user(actor_id).await?;
        let effect = weave_graph::mute_user(&actor, target_id);
        self.persist(&effect).await?;
        Ok(effect.actor.user)
    }

    /// Unmute the target. Idempotent; returns the caller's updated
    /// record.
    pub async fn unmute_user(
        &self,
        token: &SessionToken,
        target_id: UserId,
    ) -> ServiceResult<UserRecord> {
        let actor_id = self.auth(token)?;
        let _guard = self.locks.lock_single(actor_id).await;
        let actor = self.load_user(actor_id).await?;
        let effect = weave_graph::unmute_user(&actor, target_id);
        self.persist(&effect).await?;
        Ok(effect.actor.user)
    }

    // ---- internals ---------------------------------------------------------

    /// The auth gate: token to user id, or `Unauthenticated`.
    fn auth(&self, token: &SessionToken) -> ServiceResult<UserId> {
        self.sessions
            .resolve(token)
            .ok_or(ServiceError::Unauthenticated)
    }

    async fn resolve_caller(&self, token: &SessionToken) -> ServiceResult<UserRecord> {
        let id = self.auth(token)?;
        self.load_user(id).await
    }

    async fn load_user(&self, id: UserId) -> ServiceResult<UserRecord> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::UserNotFound { user_id: id })
    }

    fn reject(&self, err: TransitionError) -> ServiceError {
        self.metrics.rejections.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("transition rejected: {err}");
        ServiceError::Rejected(err)
    }

    /// Persist a transition's deltas, retrying transient storage
    /// failures up to the configured bound.
    async fn persist(&self, effect: &TransitionEffect) -> ServiceResult<()> {
        let mut attempt = 0;
        loop {
            match self.store.apply_effect(effect).await {
                Ok(()) => {
                    self.metrics.mutations.fetch_add(1, Ordering::Relaxed);
                    return Ok(());
                }
                Err(e) if e.is_transient() && attempt < self.config.limits.storage_retries => {
                    attempt += 1;
                    self.metrics.storage_retries.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("transient storage failure (attempt {attempt}): {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Resolve a relationship set to full records, in set order.
    /// Dangling ids (deleted accounts still referenced) are skipped.
    async fn resolve_members(&self, set: &IdSet) -> ServiceResult<Vec<UserRecord>> {
        let mut members = Vec::with_capacity(set.len());
        for id in set.iter() {
            match self.store.find_by_id(id).await? {
                Some(user) => members.push(user),
                None => tracing::debug!("skipping dangling relationship id {id}"),
            }
        }
        Ok(members)
    }
}

/// The updated other-side record of a pair effect, falling back to
/// the pre-transition record when the transition left it untouched.
fn other_side(effect: TransitionEffect, loaded: UserRecord) -> UserRecord {
    effect.target.map(|delta| delta.user).unwrap_or(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteUserStore;

    async fn service() -> SocialService<SqliteUserStore> {
        SocialService::new(Config::default(), SqliteUserStore::in_memory().await.unwrap())
    }

    async fn user(
        svc: &SocialService<SqliteUserStore>,
        username: &str,
    ) -> (UserId, SessionToken) {
        let record = svc
            .register(&format!("Name {username}"), username, "u@example.com", "pw", false)
            .await
            .unwrap();
        let (token, _) = svc.login(username, "pw").await.unwrap();
        (record.id, token)
    }

    #[tokio::test]
    async fn register_rejects_all_empty_fields() {
        let svc = service().await;
        let err = svc.register("", "", "", "", false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let svc = service().await;
        svc.register("Ann", "ann", "a@x", "pw", false).await.unwrap();
        let err = svc.register("Ann 2", "ann", "b@x", "pw", false).await.unwrap_err();
        assert!(matches!(err, ServiceError::UsernameTaken { username } if username == "ann"));
    }

    #[tokio::test]
    async fn register_truncates_long_names() {
        let mut config = Config::default();
        config.limits.max_name_len = 4;
        let svc = SocialService::new(config, SqliteUserStore::in_memory().await.unwrap());

        let record = svc
            .register("Annabelle", "ann", "a@x", "pw", false)
            .await
            .unwrap();
        assert_eq!(record.name, "Anna");
    }

    #[tokio::test]
    async fn register_rejects_oversized_username() {
        let mut config = Config::default();
        config.limits.max_username_len = 3;
        let svc = SocialService::new(config, SqliteUserStore::in_memory().await.unwrap());

        let err = svc.register("Ann", "annabelle", "a@x", "pw", false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[tokio::test]
    async fn login_failures_are_distinguished() {
        let svc = service().await;
        svc.register("Ann", "ann", "a@x", "pw", false).await.unwrap();

        assert!(matches!(
            svc.login("", "pw").await.unwrap_err(),
            ServiceError::Validation { .. }
        ));
        assert!(matches!(
            svc.login("nobody", "pw").await.unwrap_err(),
            ServiceError::UsernameNotFound { .. }
        ));
        assert!(matches!(
            svc.login("ann", "wrong").await.unwrap_err(),
            ServiceError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn me_reflects_session_state() {
        let svc = service().await;
        let (ann, token) = user(&svc, "ann").await;

        let current = svc.me(&token).await.unwrap().unwrap();
        assert_eq!(current.id, ann);

        assert!(svc.logout(&token));
        assert!(svc.me(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unauthenticated_calls_are_refused() {
        let svc = service().await;
        let (bob, _) = user(&svc, "bob").await;
        let stale = SessionToken::random();

        let err = svc.toggle_follow(&stale, bob).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated));
        let err = svc.get_all_users(&stale).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated));
    }

    #[tokio::test]
    async fn change_password_verifies_the_old_secret() {
        let svc = service().await;
        let (_, token) = user(&svc, "ann").await;

        assert!(matches!(
            svc.change_password(&token, "wrong", "new-pw").await.unwrap_err(),
            ServiceError::InvalidCredentials
        ));

        svc.change_password(&token, "pw", "new-pw").await.unwrap();
        assert!(matches!(
            svc.login("ann", "pw").await.unwrap_err(),
            ServiceError::InvalidCredentials
        ));
        svc.login("ann", "new-pw").await.unwrap();
    }

    #[tokio::test]
    async fn follow_then_unfollow_roundtrips() {
        let svc = service().await;
        let (ann, ann_token) = user(&svc, "ann").await;
        let (bob, _) = user(&svc, "bob").await;

        let bob_after = svc.toggle_follow(&ann_token, bob).await.unwrap();
        assert!(bob_after.followers.contains(ann));

        let bob_again = svc.toggle_follow(&ann_token, bob).await.unwrap();
        assert!(!bob_again.followers.contains(ann));
        assert_eq!(svc.metrics().mutations, 2);
    }

    #[tokio::test]
    async fn request_accept_flow_updates_both_records() {
        let svc = service().await;
        let (ann, ann_token) = user(&svc, "ann").await;
        let (bob, bob_token) = user(&svc, "bob").await;

        svc.send_friend_request(&ann_token, bob).await.unwrap();
        let requests = svc.show_requests_received(&bob_token).await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, ann);

        let ann_after = svc.accept_friend_request(&bob_token, ann).await.unwrap();
        assert!(ann_after.friends.contains(bob));
        assert_eq!(ann_after.total_friends, 1);

        let friends_of_bob = svc.show_friends(&bob_token).await.unwrap();
        assert_eq!(friends_of_bob.len(), 1);
        assert_eq!(friends_of_bob[0].id, ann);
    }

    #[tokio::test]
    async fn blocked_sender_is_refused_and_counted() {
        let svc = service().await;
        let (ann, ann_token) = user(&svc, "ann").await;
        let (_, bob_token) = user(&svc, "bob").await;

        let bob_id = svc.me(&bob_token).await.unwrap().unwrap().id;
        svc.block_user(&ann_token, bob_id).await.unwrap();

        let err = svc.send_friend_request(&bob_token, ann).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(TransitionError::Blocked)));
        assert_eq!(svc.metrics().rejections, 1);
    }

    #[tokio::test]
    async fn unblock_and_mute_are_idempotent() {
        let svc = service().await;
        let (_, ann_token) = user(&svc, "ann").await;
        let (bob, _) = user(&svc, "bob").await;

        let after = svc.unblock_user(&ann_token, bob).await.unwrap();
        assert!(after.blocked.is_empty());

        let muted = svc.mute_user(&ann_token, bob).await.unwrap();
        assert!(muted.muted.contains(bob));
        let muted_again = svc.mute_user(&ann_token, bob).await.unwrap();
        assert!(muted_again.muted.contains(bob));
        let unmuted = svc.unmute_user(&ann_token, bob).await.unwrap();
        assert!(unmuted.muted.is_empty());
    }

    #[tokio::test]
    async fn mutation_against_missing_user_is_not_found() {
        let svc = service().await;
        let (_, token) = user(&svc, "ann").await;

        let err = svc
            .send_friend_request(&token, UserId::new(9999))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound { .. }));
    }

    #[tokio::test]
    async fn update_user_is_self_or_admin() {
        let svc = service().await;
        let (ann, ann_token) = user(&svc, "ann").await;
        let (bob, bob_token) = user(&svc, "bob").await;

        let renamed = svc.update_user(&ann_token, ann, "Ann Prime").await.unwrap();
        assert_eq!(renamed.name, "Ann Prime");

        let err = svc.update_user(&bob_token, ann, "Hijacked").await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }));

        svc.register("Root", "root", "r@x", "pw", true).await.unwrap();
        let (root_token, _) = svc.login("root", "pw").await.unwrap();
        let renamed_bob = svc.update_user(&root_token, bob, "Bob Prime").await.unwrap();
        assert_eq!(renamed_bob.name, "Bob Prime");
    }

    #[tokio::test]
    async fn delete_user_is_admin_only_and_revokes_sessions() {
        let svc = service().await;
        let (bob, bob_token) = user(&svc, "bob").await;

        let err = svc.delete_user(&bob_token, bob).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }));

        svc.register("Root", "root", "r@x", "pw", true).await.unwrap();
        let (root_token, _) = svc.login("root", "pw").await.unwrap();

        assert!(svc.delete_user(&root_token, bob).await.unwrap());
        assert!(svc.me(&bob_token).await.unwrap().is_none());
        // Second delete finds nothing.
        assert!(!svc.delete_user(&root_token, bob).await.unwrap());
    }

    #[tokio::test]
    async fn listings_skip_dangling_ids() {
        let svc = service().await;
        let (ann, ann_token) = user(&svc, "ann").await;
        let (bob, bob_token) = user(&svc, "bob").await;
        let (cat, _) = user(&svc, "cat").await;

        svc.toggle_follow(&bob_token, ann).await.unwrap();
        let (cat_token, _) = svc.login("cat", "pw").await.unwrap();
        svc.toggle_follow(&cat_token, ann).await.unwrap();

        svc.register("Root", "root", "r@x", "pw", true).await.unwrap();
        let (root_token, _) = svc.login("root", "pw").await.unwrap();
        svc.delete_user(&root_token, cat).await.unwrap();

        // Ann's follower set still references cat; the listing hides
        // the dangling id instead of failing.
        let followers = svc.show_followers(&ann_token).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].id, bob);
    }
}
