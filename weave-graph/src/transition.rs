//! The relationship transitions.
//!
//! Every function here is pure: it borrows the current endpoint
//! records, validates the requested transition, and returns the
//! mutated records as field deltas. Precondition order matters and is
//! part of the contract (a request that is both blocked and duplicate
//! reports `Blocked`).

use crate::delta::{TransitionEffect, UserDelta, UserField};
use crate::error::TransitionError;
use crate::policy::RelationshipPolicy;
use weave_types::{UserId, UserRecord};

/// Tracks mutations to one record and the fields they touched.
struct Draft {
    user: UserRecord,
    fields: Vec<UserField>,
}

impl Draft {
    fn new(user: &UserRecord) -> Self {
        Self {
            user: user.clone(),
            fields: Vec::new(),
        }
    }

    fn mark(&mut self, changed: bool, field: UserField) {
        if changed && !self.fields.contains(&field) {
            self.fields.push(field);
        }
    }

    /// Recompute the derived counter from the friends set.
    fn sync_friend_counter(&mut self) {
        let count = self.user.friends.len() as u32;
        if self.user.total_friends != count {
            self.user.total_friends = count;
            self.mark(true, UserField::TotalFriends);
        }
    }

    fn finish(self) -> UserDelta {
        UserDelta {
            user: self.user,
            fields: self.fields,
        }
    }
}

/// Follow or unfollow: one call toggles the directed follow edge.
///
/// Preconditions are checked against the target before either
/// direction of the toggle runs: a blocked actor can neither follow
/// nor unfollow, and a pair with a pending request or an existing
/// friendship uses the request lifecycle instead of raw follows.
pub fn toggle_follow(
    actor: &UserRecord,
    target: &UserRecord,
) -> Result<TransitionEffect, TransitionError> {
    if actor.id == target.id {
        return Err(TransitionError::SelfRequest);
    }
    if target.blocked.contains(actor.id) {
        return Err(TransitionError::Blocked);
    }
    if actor.requests_sent.contains(target.id) || actor.requests_received.contains(target.id) {
        return Err(TransitionError::RequestPending);
    }
    if target.friends.contains(actor.id) {
        return Err(TransitionError::AlreadyFriends);
    }

    let mut actor_draft = Draft::new(actor);
    let mut target_draft = Draft::new(target);

    if actor.following.contains(target.id) {
        let changed = actor_draft.user.following.remove(target.id);
        actor_draft.mark(changed, UserField::Following);
        let changed = target_draft.user.followers.remove(actor.id);
        target_draft.mark(changed, UserField::Followers);
    } else {
        let changed = actor_draft.user.following.insert(target.id);
        actor_draft.mark(changed, UserField::Following);
        let changed = target_draft.user.followers.insert(actor.id);
        target_draft.mark(changed, UserField::Followers);
    }

    Ok(TransitionEffect::pair(
        actor_draft.finish(),
        target_draft.finish(),
    ))
}

/// Send a friend request from actor to target.
pub fn send_friend_request(
    actor: &UserRecord,
    target: &UserRecord,
) -> Result<TransitionEffect, TransitionError> {
    if actor.id == target.id {
        return Err(TransitionError::SelfRequest);
    }
    if target.blocked.contains(actor.id) {
        return Err(TransitionError::Blocked);
    }
    if actor.requests_received.contains(target.id) {
        return Err(TransitionError::RequestAlreadyReceived);
    }
    if target.friends.contains(actor.id) {
        return Err(TransitionError::AlreadyFriends);
    }
    if actor.requests_sent.contains(target.id) {
        return Err(TransitionError::DuplicateRequest);
    }

    let mut actor_draft = Draft::new(actor);
    let mut target_draft = Draft::new(target);

    let changed = actor_draft.user.requests_sent.insert(target.id);
    actor_draft.mark(changed, UserField::RequestsSent);
    let changed = target_draft.user.requests_received.insert(actor.id);
    target_draft.mark(changed, UserField::RequestsReceived);

    Ok(TransitionEffect::pair(
        actor_draft.finish(),
        target_draft.finish(),
    ))
}

/// Accept a pending friend request. `actor` is the receiver,
/// `requester` the user whose request is being accepted.
///
/// Removes the pending entries on both sides, forms the symmetric
/// friendship, recomputes both derived counters, and - when the
/// policy couples requests to follows - adds the mutual follow edges.
pub fn accept_friend_request(
    policy: &RelationshipPolicy,
    actor: &UserRecord,
    requester: &UserRecord,
) -> Result<TransitionEffect, TransitionError> {
    if actor.id == requester.id {
        return Err(TransitionError::SelfRequest);
    }
    if !actor.requests_received.contains(requester.id) {
        return Err(TransitionError::NoSuchRequest);
    }

    let mut actor_draft = Draft::new(actor);
    let mut requester_draft = Draft::new(requester);

    let changed = actor_draft.user.requests_received.remove(requester.id);
    actor_draft.mark(changed, UserField::RequestsReceived);
    let changed = requester_draft.user.requests_sent.remove(actor.id);
    requester_draft.mark(changed, UserField::RequestsSent);

    let changed = actor_draft.user.friends.insert(requester.id);
    actor_draft.mark(changed, UserField::Friends);
    let changed = requester_draft.user.friends.insert(actor.id);
    requester_draft.mark(changed, UserField::Friends);
    actor_draft.sync_friend_counter();
    requester_draft.sync_friend_counter();

    if policy.follow_on_accept {
        let changed = actor_draft.user.following.insert(requester.id);
        actor_draft.mark(changed, UserField::Following);
        let changed = actor_draft.user.followers.insert(requester.id);
        actor_draft.mark(changed, UserField::Followers);
        let changed = requester_draft.user.following.insert(actor.id);
        requester_draft.mark(changed, UserField::Following);
        let changed = requester_draft.user.followers.insert(actor.id);
        requester_draft.mark(changed, UserField::Followers);
    }

    Ok(TransitionEffect::pair(
        actor_draft.finish(),
        requester_draft.finish(),
    ))
}

/// Reject a pending friend request. `actor` is the receiver.
///
/// Removes the pending entries on both sides without forming a
/// friendship. Follow edges are untouched: sending a request never
/// creates one, so a follow the requester established beforehand
/// survives the rejection.
pub fn reject_friend_request(
    actor: &UserRecord,
    requester: &UserRecord,
) -> Result<TransitionEffect, TransitionError> {
    if !actor.requests_received.contains(requester.id) {
        return Err(TransitionError::NoSuchRequest);
    }

    let mut actor_draft = Draft::new(actor);
    let mut requester_draft = Draft::new(requester);

    let changed = actor_draft.user.requests_received.remove(requester.id);
    actor_draft.mark(changed, UserField::RequestsReceived);
    let changed = requester_draft.user.requests_sent.remove(actor.id);
    requester_draft.mark(changed, UserField::RequestsSent);

    Ok(TransitionEffect::pair(
        actor_draft.finish(),
        requester_draft.finish(),
    ))
}

/// Block a user.
///
/// Clears any pending request between the two from the actor's sets
/// and records the block. With the default policy the target's record
/// is left untouched and existing friend/follow edges survive; with
/// `dissolve_on_block` the pair's pending entries, friendship and
/// follow edges are removed on both records.
pub fn block_user(
    policy: &RelationshipPolicy,
    actor: &UserRecord,
    target: &UserRecord,
) -> Result<TransitionEffect, TransitionError> {
    if actor.id == target.id {
        return Err(TransitionError::SelfRequest);
    }

    let mut actor_draft = Draft::new(actor);

    let changed = actor_draft.user.requests_sent.remove(target.id);
    actor_draft.mark(changed, UserField::RequestsSent);
    let changed = actor_draft.user.requests_received.remove(target.id);
    actor_draft.mark(changed, UserField::RequestsReceived);
    let changed = actor_draft.user.blocked.insert(target.id);
    actor_draft.mark(changed, UserField::Blocked);

    if !policy.dissolve_on_block {
        return Ok(TransitionEffect::actor_only(actor_draft.finish()));
    }

    let mut target_draft = Draft::new(target);

    let changed = target_draft.user.requests_sent.remove(actor.id);
    target_draft.mark(changed, UserField::RequestsSent);
    let changed = target_draft.user.requests_received.remove(actor.id);
    target_draft.mark(changed, UserField::RequestsReceived);

    let changed = actor_draft.user.friends.remove(target.id);
    actor_draft.mark(changed, UserField::Friends);
    let changed = target_draft.user.friends.remove(actor.id);
    target_draft.mark(changed, UserField::Friends);
    actor_draft.sync_friend_counter();
    target_draft.sync_friend_counter();

    let changed = actor_draft.user.following.remove(target.id);
    actor_draft.mark(changed, UserField::Following);
    let changed = actor_draft.user.followers.remove(target.id);
    actor_draft.mark(changed, UserField::Followers);
    let changed = target_draft.user.following.remove(actor.id);
    target_draft.mark(changed, UserField::Following);
    let changed = target_draft.user.followers.remove(actor.id);
    target_draft.mark(changed, UserField::Followers);

    Ok(TransitionEffect::pair(
        actor_draft.finish(),
        target_draft.finish(),
    ))
}

/// Unblock a user. Absent entries are a no-op, not an error.
pub fn unblock_user(actor: &UserRecord, target_id: UserId) -> TransitionEffect {
    let mut draft = Draft::new(actor);
    let changed = draft.user.blocked.remove(target_id);
    draft.mark(changed, UserField::Blocked);
    TransitionEffect::actor_only(draft.finish())
}

/// Mute a user. Purely local; idempotent.
pub fn mute_user(actor: &UserRecord, target_id: UserId) -> TransitionEffect {
    let mut draft = Draft::new(actor);
    let changed = draft.user.muted.insert(target_id);
    draft.mark(changed, UserField::Muted);
    TransitionEffect::actor_only(draft.finish())
}

/// Unmute a user. Absent entries are a no-op, not an error.
pub fn unmute_user(actor: &UserRecord, target_id: UserId) -> TransitionEffect {
    let mut draft = Draft::new(actor);
    let changed = draft.user.muted.remove(target_id);
    draft.mark(changed, UserField::Muted);
    TransitionEffect::actor_only(draft.finish())
}
